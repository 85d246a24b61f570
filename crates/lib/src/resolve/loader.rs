//! Asynchronous content loading.

use std::io;
use std::path::Path;

use async_trait::async_trait;

/// Fetches the raw text of a located script.
///
/// Failures are reported as-is and never retried by the executor.
#[async_trait(?Send)]
pub trait ContentLoader {
  async fn load(&self, location: &Path) -> io::Result<String>;
}

/// Reads scripts from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

#[async_trait(?Send)]
impl ContentLoader for FsLoader {
  async fn load(&self, location: &Path) -> io::Result<String> {
    tokio::fs::read_to_string(location).await
  }
}
