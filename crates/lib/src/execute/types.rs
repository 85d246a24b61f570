//! Types for script execution.
//!
//! This module defines the error type, frame lifecycle states and configuration
//! used by the [`Executor`](super::Executor).

use std::fmt;
use std::sync::Arc;

use mlua::prelude::*;
use serde::Deserialize;
use thiserror::Error;

use crate::consts::{MAX_DEPTH, MAX_RETRY, MODULES_DIR};
use crate::resolve::ResolveError;

/// Errors that can occur while executing a script.
#[derive(Debug, Error)]
pub enum ExecuteError {
  /// The script would run deeper than `max_depth`; no attempt was made.
  #[error("max depth reached: {depth} ({identifier})")]
  DepthExceeded { identifier: String, depth: usize },

  /// The script kept requesting new work or failing past `max_retry`.
  #[error("max retry reached for {identifier} after {attempts} attempts{}", describe_last(.last_error))]
  RetryExhausted {
    identifier: String,
    attempts: usize,
    /// Error raised by the final attempt, if it raised one.
    #[source]
    last_error: Option<LuaError>,
  },

  /// The script text could not be compiled.
  #[error("failed to compile {identifier}: {source}")]
  Compile {
    identifier: String,
    #[source]
    source: LuaError,
  },

  /// An import request could not be resolved.
  #[error(transparent)]
  Resolution(#[from] ResolveError),

  /// A resolution task started by this script failed.
  #[error("dependency of {identifier} failed: {source}")]
  Dependency {
    identifier: String,
    #[source]
    source: Arc<ExecuteError>,
  },

  /// The VM failed while preparing a scope or reading its output.
  #[error("lua error: {0}")]
  Lua(#[from] LuaError),
}

fn describe_last(last_error: &Option<LuaError>) -> String {
  match last_error {
    Some(err) => format!(": {}", err),
    None => String::new(),
  }
}

impl ExecuteError {
  /// Follow `Dependency` links down to the failure that started the chain.
  pub fn root_cause(&self) -> &ExecuteError {
    match self {
      ExecuteError::Dependency { source, .. } => source.root_cause(),
      other => other,
    }
  }
}

/// Lifecycle of a frame's retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
  /// Created, no attempt scheduled yet.
  Idle,
  /// Running the script synchronously.
  Attempting,
  /// Suspended until pending resolution tasks settle.
  Waiting,
  /// The latest attempt requested no new imports.
  Stable,
  /// The loop ended with an error.
  Failed,
}

impl fmt::Display for FrameState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      FrameState::Idle => "idle",
      FrameState::Attempting => "attempting",
      FrameState::Waiting => "waiting",
      FrameState::Stable => "stable",
      FrameState::Failed => "failed",
    };
    f.write_str(name)
  }
}

/// Snapshot of a frame registered on an executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameInfo {
  pub identifier: String,
  pub depth: usize,
  pub attempts: usize,
  pub state: FrameState,
}

/// Configuration for script execution.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
  /// Deepest nesting level allowed for recursively required scripts.
  pub max_depth: usize,

  /// Retries allowed after the first attempt of a frame.
  pub max_retry: usize,

  /// Directory name that marks platform modules, which are loaded
  /// directly instead of being executed as nested frames.
  pub modules_dir: String,
}

impl Default for ExecutorConfig {
  fn default() -> Self {
    Self {
      max_depth: MAX_DEPTH,
      max_retry: MAX_RETRY,
      modules_dir: MODULES_DIR.to_string(),
    }
  }
}
