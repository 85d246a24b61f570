//! Two-phase render pipeline.
//!
//! A template script is executed to obtain a render function. The function and
//! a deep copy of the caller's locals are stored in the executor's shared table,
//! and a fixed glue script calls one with the other. Both phases go through the
//! executor, so imports made while rendering are resolved the same way as
//! imports made while defining the template.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use mlua::prelude::*;
use thiserror::Error;
use tracing::debug;

use crate::execute::{ExecuteError, Executor, ExecutorConfig};

/// Script run in the second phase.
pub const RENDER_GLUE: &str = "module.exports = shared.template(shared.locals)";

/// Errors that can occur while rendering.
#[derive(Debug, Error)]
pub enum RenderError {
  #[error(transparent)]
  Execute(#[from] ExecuteError),

  #[error("lua error: {0}")]
  Lua(#[from] LuaError),

  /// The template script produced something other than a function.
  #[error("template must export a function, got {0}")]
  NotAFunction(String),

  /// The render function returned something other than a string.
  #[error("template must render to a string, got {0}")]
  InvalidOutput(String),

  #[error("failed to read template '{}': {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Execute `source` as a template and render it with `locals`.
pub async fn render_template(
  executor: &Rc<Executor>,
  source: &str,
  locals: &serde_json::Value,
) -> Result<String, RenderError> {
  let template = executor.execute(source, None, None).await?;
  if !template.is_function() {
    return Err(RenderError::NotAFunction(template.type_name().to_string()));
  }

  let locals = executor.lua().to_value(locals)?;
  let shared = executor.shared();
  shared.set("template", template)?;
  shared.set("locals", locals)?;

  debug!(root = %executor.root(), "rendering template");
  match executor.execute(RENDER_GLUE, None, None).await? {
    LuaValue::String(text) => Ok(text.to_str()?.to_string()),
    other => Err(RenderError::InvalidOutput(other.type_name().to_string())),
  }
}

/// Render the template file at `path` with a filesystem executor.
pub async fn render_file(
  path: &Path,
  locals: &serde_json::Value,
  config: ExecutorConfig,
) -> Result<String, RenderError> {
  let io_error = |source| RenderError::Io {
    path: path.to_path_buf(),
    source,
  };
  let location = dunce::canonicalize(path).map_err(io_error)?;
  let source = tokio::fs::read_to_string(&location).await.map_err(io_error)?;

  let executor = Executor::with_filesystem(location.to_string_lossy(), config)?;
  render_template(&executor, &source, locals).await
}
