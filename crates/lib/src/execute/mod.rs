//! Script execution engine.
//!
//! This module provides [`Executor`], the entry point for running scripts whose
//! `require` calls are served asynchronously. It handles:
//! - One [`Frame`](frame::Frame) per script instance, including nested imports
//! - Re-running a frame in fresh scopes until it stops requesting new imports
//! - Depth and retry bounds
//! - Synchronizing top-level frames with work started anywhere in the tree
//!
//! # Example
//! ```ignore
//! use relua_lib::{Executor, ExecutorConfig};
//!
//! let executor = Executor::with_filesystem("/project/main.lua", ExecutorConfig::default())?;
//! let output = executor.execute("module.exports = require('./greet')('world')", None, None).await?;
//! ```

pub mod frame;
pub mod sandbox;
pub mod types;

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use futures::future::try_join_all;
use mlua::prelude::*;
use tracing::{debug, trace};

use crate::lua::runtime;
use crate::resolve::{ContentLoader, FsLoader, FsLocator, Locator};

use frame::Frame;
use sandbox::Scope;

pub use types::{ExecuteError, ExecutorConfig, FrameInfo, FrameState};

/// Runs scripts to a fixed point over their asynchronously resolved imports.
///
/// An executor is scoped to one outer invocation. Every frame it creates, at any
/// depth, stays registered for aggregate checks.
pub struct Executor {
  config: ExecutorConfig,
  root: String,
  locator: Rc<dyn Locator>,
  loader: Rc<dyn ContentLoader>,
  children: RefCell<Vec<Rc<Frame>>>,
  shared: LuaTable,
  lua: Lua,
}

impl Executor {
  /// Create an executor over `lua`.
  ///
  /// `shared` is bound as `shared` in every scope. `root` is the identifier used
  /// when `execute` is called without one.
  pub fn new(
    lua: Lua,
    shared: LuaTable,
    root: impl Into<String>,
    locator: Rc<dyn Locator>,
    loader: Rc<dyn ContentLoader>,
    config: ExecutorConfig,
  ) -> LuaResult<Rc<Self>> {
    Ok(Rc::new(Self {
      config,
      root: root.into(),
      locator,
      loader,
      children: RefCell::new(Vec::new()),
      shared,
      lua,
    }))
  }

  /// Create an executor that locates and loads scripts from the filesystem.
  pub fn with_filesystem(root: impl Into<String>, config: ExecutorConfig) -> LuaResult<Rc<Self>> {
    let lua = runtime::create_runtime(&config.modules_dir)?;
    let shared = lua.create_table()?;
    let locator = Rc::new(FsLocator::new(config.modules_dir.clone()));
    Self::new(lua, shared, root, locator, Rc::new(FsLoader), config)
  }

  pub fn lua(&self) -> &Lua {
    &self.lua
  }

  /// The table bound as `shared` in every scope.
  pub fn shared(&self) -> &LuaTable {
    &self.shared
  }

  pub fn config(&self) -> &ExecutorConfig {
    &self.config
  }

  pub fn root(&self) -> &str {
    &self.root
  }

  pub(crate) fn locator(&self) -> &dyn Locator {
    self.locator.as_ref()
  }

  pub(crate) fn loader(&self) -> Rc<dyn ContentLoader> {
    Rc::clone(&self.loader)
  }

  /// Snapshots of every frame created so far, in creation order.
  pub fn frames(&self) -> Vec<FrameInfo> {
    self.children.borrow().iter().map(|frame| frame.info()).collect()
  }

  /// True if any registered frame still has outstanding work.
  pub fn has_unsettled_frames(&self) -> bool {
    self.children.borrow().iter().any(|frame| frame.is_unsettled())
  }

  /// Wait until every task started by any registered frame completes.
  pub async fn settled(&self) -> Result<(), Arc<ExecuteError>> {
    let tasks: Vec<_> = self.children.borrow().iter().flat_map(|frame| frame.tasks()).collect();
    try_join_all(tasks).await.map(drop)
  }

  /// Execute `code` until its imports reach a fixed point and return its output.
  ///
  /// `identifier` defaults to the executor's root and `depth` to 0. The output is
  /// `module.exports` if the final attempt assigned it, otherwise `exports`.
  pub async fn execute(
    self: &Rc<Self>,
    code: &str,
    identifier: Option<&str>,
    depth: Option<usize>,
  ) -> Result<LuaValue, ExecuteError> {
    let identifier = identifier.unwrap_or(self.root.as_str()).to_string();
    let depth = depth.unwrap_or(0);

    if depth > self.config.max_depth {
      return Err(ExecuteError::DepthExceeded { identifier, depth });
    }

    let frame = Rc::new(Frame::compile(&self.lua, code, identifier, depth)?);
    self.children.borrow_mut().push(Rc::clone(&frame));
    debug!(identifier = %frame.identifier(), depth, "frame created");

    let result = self.run(&frame).await;
    frame.set_state(if result.is_ok() {
      FrameState::Stable
    } else {
      FrameState::Failed
    });
    result
  }

  /// Drive the retry loop of `frame`.
  async fn run(self: &Rc<Self>, frame: &Rc<Frame>) -> Result<LuaValue, ExecuteError> {
    loop {
      frame.set_state(FrameState::Waiting);
      self
        .wait_for(frame)
        .await
        .map_err(|source| ExecuteError::Dependency {
          identifier: frame.identifier().to_string(),
          source,
        })?;

      let attempt = frame.begin_attempt();
      let scope = Scope::build(self, frame)?;
      let outcome = frame.run(&scope);
      trace!(
        identifier = %frame.identifier(),
        attempt,
        raised = outcome.is_err(),
        requested_new_work = frame.requested_new_work(),
        "attempt finished"
      );

      if outcome.is_ok() && !self.should_continue(frame) {
        debug!(identifier = %frame.identifier(), attempts = attempt, "frame stable");
        return Ok(scope.output()?);
      }

      if attempt > self.config.max_retry {
        return Err(ExecuteError::RetryExhausted {
          identifier: frame.identifier().to_string(),
          attempts: attempt,
          last_error: outcome.err(),
        });
      }
    }
  }

  /// Wait for the frame's own tasks; top-level frames also wait for the whole tree.
  async fn wait_for(&self, frame: &Frame) -> Result<(), Arc<ExecuteError>> {
    frame.settled().await?;
    if frame.depth() == 0 {
      self.settled().await?;
    }
    Ok(())
  }

  fn should_continue(&self, frame: &Frame) -> bool {
    if frame.depth() == 0 {
      self.has_unsettled_frames()
    } else {
      frame.is_unsettled()
    }
  }
}
