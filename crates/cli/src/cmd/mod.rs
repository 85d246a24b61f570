mod exec;
mod render;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

use relua_lib::ExecutorConfig;

pub use exec::cmd_exec;
pub use render::{LocalsSource, cmd_render};

/// Executor settings from `--config` plus individual flag overrides.
#[derive(Debug, Default)]
pub struct ConfigOverrides {
  pub file: Option<PathBuf>,
  pub max_depth: Option<usize>,
  pub max_retry: Option<usize>,
  pub modules_dir: Option<String>,
}

impl ConfigOverrides {
  pub fn load(self) -> Result<ExecutorConfig> {
    let mut config = match &self.file {
      Some(path) => {
        debug!(path = %path.display(), "loading config file");
        let text = fs::read_to_string(path).with_context(|| format!("Failed to read config: {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("Invalid config: {}", path.display()))?
      }
      None => ExecutorConfig::default(),
    };

    if let Some(max_depth) = self.max_depth {
      config.max_depth = max_depth;
    }
    if let Some(max_retry) = self.max_retry {
      config.max_retry = max_retry;
    }
    if let Some(modules_dir) = self.modules_dir {
      config.modules_dir = modules_dir;
    }
    debug!(
      max_depth = config.max_depth,
      max_retry = config.max_retry,
      modules_dir = %config.modules_dir,
      "executor config"
    );
    Ok(config)
  }
}

/// Scripts and their imports run on a single thread.
fn runtime() -> Result<Runtime> {
  Builder::new_current_thread()
    .enable_all()
    .build()
    .context("Failed to create async runtime")
}
