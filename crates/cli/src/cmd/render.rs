//! Implementation of the `relua render` command.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, info};

use relua_lib::{ExecutorConfig, render_file};

use crate::output::{format_duration, print_success};

/// Where template locals come from.
#[derive(Debug)]
pub enum LocalsSource {
  Empty,
  File(PathBuf),
  Inline(String),
}

impl LocalsSource {
  pub fn load(&self) -> Result<serde_json::Value> {
    match self {
      LocalsSource::Empty => Ok(serde_json::json!({})),
      LocalsSource::File(path) => {
        let text = fs::read_to_string(path).with_context(|| format!("Failed to read locals: {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("Invalid locals JSON: {}", path.display()))
      }
      LocalsSource::Inline(json) => serde_json::from_str(json).context("Invalid --locals-json"),
    }
  }
}

pub fn cmd_render(
  file: &Path,
  locals: LocalsSource,
  output: Option<&Path>,
  config: ExecutorConfig,
  verbose: bool,
) -> Result<()> {
  let started = Instant::now();
  let locals = locals.load()?;
  debug!(path = %file.display(), "rendering template");

  let html = super::runtime()?
    .block_on(render_file(file, &locals, config))
    .with_context(|| format!("Failed to render {}", file.display()))?;

  match output {
    Some(path) => {
      fs::write(path, &html).with_context(|| format!("Failed to write output: {}", path.display()))?;
      info!(path = %path.display(), bytes = html.len(), "output written");
      print_success(&format!("Rendered {} to {}", file.display(), path.display()));
    }
    None => print!("{}", html),
  }

  if verbose {
    print_success(&format!("Rendered in {}", format_duration(started.elapsed())));
  }

  Ok(())
}
