//! Import resolution.
//!
//! Turns an import request into a `(request, value)` pair:
//! - marker characters are stripped and the request is located relative to
//!   the importing script
//! - locations inside the platform modules area are evaluated directly
//! - anything else is loaded as text and executed as a nested frame one level
//!   deeper
//!
//! # Submodules
//!
//! - [`locator`] - Request to location mapping (`Locator`, `FsLocator`)
//! - [`loader`] - Asynchronous content loading (`ContentLoader`, `FsLoader`)

pub mod loader;
pub mod locator;

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{self, LocalBoxFuture};
use mlua::prelude::*;
use thiserror::Error;
use tracing::debug;

use crate::consts::REQUEST_MARKERS;
use crate::execute::frame::{Frame, ResolutionTask};
use crate::execute::{ExecuteError, Executor};
use crate::lua::loaders;

pub use loader::{ContentLoader, FsLoader};
pub use locator::{FsLocator, Locator};

/// Errors that can occur while resolving an import request.
#[derive(Debug, Error)]
pub enum ResolveError {
  /// The request could not be mapped to a location.
  #[error("cannot resolve '{request}' from '{base}'")]
  NotFound { request: String, base: String },

  /// The content loader failed.
  #[error("failed to load '{}': {source}", location.display())]
  Load {
    location: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// A platform module raised while being evaluated.
  #[error("failed to evaluate platform module '{}': {source}", location.display())]
  Platform {
    location: PathBuf,
    #[source]
    source: LuaError,
  },

  /// The executor was dropped before the request could be served.
  #[error("executor dropped before '{request}' was resolved")]
  Detached { request: String },
}

/// Remove sandbox marker characters from a request.
pub fn strip_markers(request: &str) -> String {
  request.replace(REQUEST_MARKERS, "")
}

/// Whether `location` lies inside the platform modules area.
pub fn is_platform_module(location: &Path, modules_dir: &str) -> bool {
  location.components().any(|c| c.as_os_str() == OsStr::new(modules_dir))
}

/// Resolve `request` as imported by a script at `base` running at `depth`.
///
/// Location lookup and platform module evaluation happen synchronously; only
/// content loading and nested execution are deferred to the returned future.
pub fn resolve(
  executor: &Rc<Executor>,
  request: String,
  base: String,
  depth: usize,
) -> LocalBoxFuture<'static, Result<(String, LuaValue), ExecuteError>> {
  let clean = strip_markers(&request);
  let Some(location) = executor.locator().locate(&clean, &base) else {
    let err = ExecuteError::from(ResolveError::NotFound { request, base });
    return future::ready(Err(err)).boxed_local();
  };

  if is_platform_module(&location, &executor.config().modules_dir) {
    debug!(request = %request, location = %location.display(), "loading platform module");
    let result = match loaders::require_platform(executor.lua(), &location) {
      Ok(value) => Ok((request, value)),
      Err(source) => Err(ExecuteError::from(ResolveError::Platform { location, source })),
    };
    return future::ready(result).boxed_local();
  }

  let loader = executor.loader();
  let executor = Rc::downgrade(executor);
  async move {
    let content = loader.load(&location).await.map_err(|source| ResolveError::Load {
      location: location.clone(),
      source,
    })?;
    let executor = executor
      .upgrade()
      .ok_or_else(|| ResolveError::Detached { request: request.clone() })?;

    let identifier = location.to_string_lossy().into_owned();
    debug!(request = %request, identifier = %identifier, depth = depth + 1, "executing nested script");
    let value = executor.execute(&content, Some(&identifier), Some(depth + 1)).await?;
    Ok::<_, ExecuteError>((request, value))
  }
  .boxed_local()
}

/// Start resolving `request` for `frame` and return the task to register.
///
/// The task stores the resolved value on the frame when it completes. Failures
/// are kept in the task so every frame waiting on it observes them.
pub fn dispatch(executor: &Rc<Executor>, frame: &Rc<Frame>, request: String) -> ResolutionTask {
  let resolution = resolve(executor, request, frame.identifier().to_string(), frame.depth());
  let frame = Rc::downgrade(frame);
  async move {
    let (request, value) = resolution.await.map_err(Arc::new)?;
    if let Some(frame) = frame.upgrade() {
      frame.settle(request, value);
    }
    Ok::<_, Arc<ExecuteError>>(())
  }
  .boxed_local()
  .shared()
}
