//! Implementation of the `relua exec` command.
//!
//! Runs a script with a filesystem executor and prints what it exported.

use std::fs;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, info};

use relua_lib::mlua::Value;
use relua_lib::{Executor, ExecutorConfig};

use crate::output::{OutputFormat, format_duration, print_info, print_stat};

/// Format an exported value for stdout.
///
/// Text mode prints strings verbatim and nothing for `nil`; everything else is
/// printed as JSON.
pub fn format_value(value: &Value, format: OutputFormat) -> Result<String> {
  if !format.is_json() {
    match value {
      Value::Nil => return Ok(String::new()),
      Value::String(text) => return Ok(text.to_str()?.to_string()),
      _ => {}
    }
  }
  serde_json::to_string_pretty(value).context("Exported value cannot be represented as JSON")
}

pub fn cmd_exec(file: &Path, format: OutputFormat, config: ExecutorConfig, verbose: bool) -> Result<()> {
  let started = Instant::now();
  let location = dunce::canonicalize(file).with_context(|| format!("Script not found: {}", file.display()))?;
  let source = fs::read_to_string(&location).with_context(|| format!("Failed to read script: {}", file.display()))?;

  debug!(path = %location.display(), "running script");

  let executor = Executor::with_filesystem(location.to_string_lossy(), config).context("Failed to create Lua runtime")?;
  let value = super::runtime()?
    .block_on(executor.execute(&source, None, None))
    .with_context(|| format!("Failed to execute {}", file.display()))?;

  info!(frames = executor.frames().len(), "script converged");

  let rendered = format_value(&value, format)?;
  if !rendered.is_empty() {
    println!("{}", rendered);
  }

  if verbose {
    let frames = executor.frames();
    print_info(&format!(
      "Executed {} in {} ({} frame(s))",
      file.display(),
      format_duration(started.elapsed()),
      frames.len()
    ));
    for frame in frames {
      print_stat(
        &frame.identifier,
        &format!("depth {}, {} attempt(s), {}", frame.depth, frame.attempts, frame.state),
      );
    }
  }

  Ok(())
}
