//! Mapping import requests to locations.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::consts::MODULES_DIR;
use crate::lua::helpers::path::normalize;

/// Maps an import request to a concrete location.
///
/// `base` is the identifier of the importing script. Returning `None` means the
/// request cannot be resolved.
pub trait Locator {
  fn locate(&self, request: &str, base: &str) -> Option<PathBuf>;
}

/// Filesystem locator.
///
/// - `./x`, `../x` and absolute requests resolve against the directory of `base`
/// - bare requests search `<dir>/<modules_dir>/x`, walking up from that directory
///
/// `.` and `..` are resolved lexically before probing. Each candidate path is
/// tried as-is, then with `.lua` appended, then as a directory containing
/// `init.lua`. Results are canonicalized.
#[derive(Debug, Clone)]
pub struct FsLocator {
  modules_dir: String,
}

impl FsLocator {
  pub fn new(modules_dir: impl Into<String>) -> Self {
    Self {
      modules_dir: modules_dir.into(),
    }
  }

  fn find_candidate(path: &Path) -> Option<PathBuf> {
    let mut with_ext = OsString::from(path.as_os_str());
    with_ext.push(".lua");

    [path.to_path_buf(), PathBuf::from(with_ext), path.join("init.lua")]
      .into_iter()
      .find(|candidate| candidate.is_file())
      .and_then(|found| dunce::canonicalize(found).ok())
  }
}

impl Default for FsLocator {
  fn default() -> Self {
    Self::new(MODULES_DIR)
  }
}

fn is_relative_request(request: &str) -> bool {
  request == "." || request == ".." || request.starts_with("./") || request.starts_with("../")
}

impl Locator for FsLocator {
  fn locate(&self, request: &str, base: &str) -> Option<PathBuf> {
    if request.is_empty() {
      return None;
    }

    let base_dir = Path::new(base).parent().unwrap_or(Path::new(""));
    let path = Path::new(request);

    // `..` is resolved lexically so missing intermediate directories do not matter.
    if path.is_absolute() {
      return Self::find_candidate(&normalize(path));
    }
    if is_relative_request(request) {
      return Self::find_candidate(&normalize(&base_dir.join(path)));
    }

    base_dir
      .ancestors()
      .find_map(|dir| Self::find_candidate(&dir.join(&self.modules_dir).join(path)))
  }
}
