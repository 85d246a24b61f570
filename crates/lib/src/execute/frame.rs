//! Per-script execution state.
//!
//! A [`Frame`] is one logical script instance. It owns the compiled chunk and
//! everything that must survive between attempts: the import cache, the
//! resolution tasks started so far and the flags that decide whether another
//! attempt is needed.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{LocalBoxFuture, Shared, try_join_all};
use mlua::prelude::*;

use super::sandbox::Scope;
use super::types::{ExecuteError, FrameInfo, FrameState};

/// Outcome of a resolution task, cloneable so several frames can await it.
pub type TaskResult = Result<(), Arc<ExecuteError>>;

/// A resolution task registered on a frame.
pub type ResolutionTask = Shared<LocalBoxFuture<'static, TaskResult>>;

/// Cached state of one import request.
#[derive(Debug, Clone)]
pub enum Resolution {
  /// Requested, not resolved yet. Scripts observe this as `nil`.
  Pending,
  /// Resolved to a value, which may itself be `nil`.
  Ready(LuaValue),
}

impl Resolution {
  /// The value handed back to the script for this request.
  pub fn value(&self) -> LuaValue {
    match self {
      Resolution::Pending => LuaValue::Nil,
      Resolution::Ready(value) => value.clone(),
    }
  }
}

pub struct Frame {
  unit: LuaFunction,
  identifier: String,
  depth: usize,
  resolved: RefCell<HashMap<String, Resolution>>,
  pending: RefCell<Vec<ResolutionTask>>,
  requested_new_work: Cell<bool>,
  unsettled: Cell<bool>,
  requested: Cell<usize>,
  completed: Cell<usize>,
  attempts: Cell<usize>,
  state: Cell<FrameState>,
}

impl Frame {
  /// Compile `code` once; every attempt reuses the resulting chunk.
  pub fn compile(lua: &Lua, code: &str, identifier: String, depth: usize) -> Result<Self, ExecuteError> {
    let unit = lua
      .load(code)
      .set_name(format!("@{}", identifier))
      .into_function()
      .map_err(|source| ExecuteError::Compile {
        identifier: identifier.clone(),
        source,
      })?;

    Ok(Self {
      unit,
      identifier,
      depth,
      resolved: RefCell::new(HashMap::new()),
      pending: RefCell::new(Vec::new()),
      requested_new_work: Cell::new(false),
      unsettled: Cell::new(false),
      requested: Cell::new(0),
      completed: Cell::new(0),
      attempts: Cell::new(0),
      state: Cell::new(FrameState::Idle),
    })
  }

  pub fn identifier(&self) -> &str {
    &self.identifier
  }

  pub fn depth(&self) -> usize {
    self.depth
  }

  pub fn attempts(&self) -> usize {
    self.attempts.get()
  }

  pub fn state(&self) -> FrameState {
    self.state.get()
  }

  pub fn set_state(&self, state: FrameState) {
    self.state.set(state);
  }

  /// Whether the latest attempt issued a previously unseen import.
  pub fn requested_new_work(&self) -> bool {
    self.requested_new_work.get()
  }

  /// True while this frame has outstanding imports or its latest attempt raised.
  pub fn is_unsettled(&self) -> bool {
    self.unsettled.get()
  }

  pub fn info(&self) -> FrameInfo {
    FrameInfo {
      identifier: self.identifier.clone(),
      depth: self.depth,
      attempts: self.attempts(),
      state: self.state(),
    }
  }

  /// Cached value for `request`, or `None` if it was never requested.
  ///
  /// Key presence decides, so a pending request yields `Some(nil)`.
  pub fn lookup(&self, request: &str) -> Option<LuaValue> {
    self.resolved.borrow().get(request).map(Resolution::value)
  }

  /// Record a newly dispatched import.
  pub fn register(&self, request: String, task: ResolutionTask) {
    self.resolved.borrow_mut().insert(request, Resolution::Pending);
    self.pending.borrow_mut().push(task);
    self.requested.set(self.requested.get() + 1);
    self.requested_new_work.set(true);
    self.unsettled.set(true);
  }

  /// Store the value of a completed import.
  pub fn settle(&self, request: String, value: LuaValue) {
    self.resolved.borrow_mut().insert(request, Resolution::Ready(value));
    self.completed.set(self.completed.get() + 1);
    if self.completed.get() >= self.requested.get() {
      self.unsettled.set(false);
    }
  }

  /// Every task this frame has started, in dispatch order.
  pub fn tasks(&self) -> Vec<ResolutionTask> {
    self.pending.borrow().clone()
  }

  /// Wait until every task this frame has started completes.
  pub async fn settled(&self) -> TaskResult {
    try_join_all(self.tasks()).await.map(drop)
  }

  /// Reset per-attempt flags and return the 1-based attempt number.
  pub fn begin_attempt(&self) -> usize {
    self.requested_new_work.set(false);
    self.unsettled.set(false);
    self.state.set(FrameState::Attempting);
    let attempt = self.attempts.get() + 1;
    self.attempts.set(attempt);
    attempt
  }

  /// Run the compiled chunk once against `scope`.
  pub fn run(&self, scope: &Scope) -> LuaResult<()> {
    self.unit.set_environment(scope.env().clone())?;
    let result = self.unit.call::<()>(());
    if result.is_err() {
      self.unsettled.set(true);
    }
    result
  }
}
