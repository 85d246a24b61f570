//! Fresh, isolated scopes for script attempts.
//!
//! Every attempt of a frame runs against a new environment table. The table
//! holds the intercepted `require`, the `module`/`exports` capture slots, the
//! executor's `shared` table and fresh copies of the sandbox helpers. Reads
//! fall through to the Lua globals; writes stay in the scope, so one attempt
//! never sees globals assigned by a previous one.

use std::path::Path;
use std::rc::{Rc, Weak};

use mlua::prelude::*;
use tracing::trace;

use super::Executor;
use super::frame::Frame;
use crate::lua::helpers;
use crate::resolve::{self, ResolveError};

pub struct Scope {
  env: LuaTable,
}

impl Scope {
  /// Build the scope for the next attempt of `frame`.
  pub fn build(executor: &Rc<Executor>, frame: &Rc<Frame>) -> LuaResult<Self> {
    let lua = executor.lua();
    let env = lua.create_table()?;

    env.set("require", create_require(lua, Rc::downgrade(executor), Rc::clone(frame))?)?;
    env.set("module", lua.create_table()?)?;
    env.set("exports", lua.create_table()?)?;
    env.set("shared", executor.shared().clone())?;

    // Helper tables are rebuilt per scope so writes to them die with the attempt.
    for pair in helpers::create_helpers(lua)?.pairs::<String, LuaValue>() {
      let (name, helper) = pair?;
      env.set(name, helper)?;
    }

    let dir = Path::new(frame.identifier())
      .parent()
      .map(|p| p.to_string_lossy().into_owned())
      .unwrap_or_default();
    env.set("__dir", dir)?;

    let mt = lua.create_table()?;
    mt.set("__index", lua.globals())?;
    env.set_metatable(Some(mt))?;

    Ok(Self { env })
  }

  pub fn env(&self) -> &LuaTable {
    &self.env
  }

  /// The captured output: `module.exports` when set, otherwise `exports`.
  pub fn output(&self) -> LuaResult<LuaValue> {
    if let LuaValue::Table(module) = self.env.raw_get::<LuaValue>("module")? {
      let exports: LuaValue = module.raw_get("exports")?;
      if !exports.is_nil() {
        return Ok(exports);
      }
    }
    self.env.raw_get("exports")
  }
}

/// Create the intercepted `require` for one attempt of `frame`.
///
/// Known requests return their cached value (`nil` while pending). A new request
/// dispatches the resolution service, registers the task and returns `nil`.
fn create_require(lua: &Lua, executor: Weak<Executor>, frame: Rc<Frame>) -> LuaResult<LuaFunction> {
  lua.create_function(move |_, request: String| {
    if let Some(value) = frame.lookup(&request) {
      return Ok(value);
    }

    let executor = executor
      .upgrade()
      .ok_or_else(|| LuaError::external(ResolveError::Detached { request: request.clone() }))?;

    trace!(request = %request, from = %frame.identifier(), "dispatching import");
    let task = resolve::dispatch(&executor, &frame, request.clone());
    frame.register(request, task);
    Ok(LuaValue::Nil)
  })
}
