//! relua-lib: re-entrant Lua script execution
//!
//! This crate runs Lua scripts written against a synchronous `require` in a
//! sandbox whose modules are fetched asynchronously:
//! - `Executor`: re-runs each script in fresh scopes until its imports settle
//! - `resolve`: maps import requests to platform modules or nested scripts
//! - `render`: two-phase "evaluate a template, then call it with locals" pipeline
//! - `lua`: VM setup, platform module loading and sandbox helpers

pub mod consts;
pub mod execute;
pub mod lua;
pub mod render;
pub mod resolve;
pub mod util;

pub use mlua;

pub use execute::{ExecuteError, Executor, ExecutorConfig, FrameInfo, FrameState};
pub use render::{RenderError, render_file, render_template};
pub use resolve::{ContentLoader, FsLoader, FsLocator, Locator, ResolveError};
