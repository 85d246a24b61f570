//! `path` helper table.
//!
//! Pure string manipulation; nothing here touches the filesystem, so results
//! are identical across attempts.

use std::path::{Component, Path, PathBuf};

use mlua::prelude::*;

/// Resolve `.` and `..` lexically.
pub fn normalize(path: &Path) -> PathBuf {
  let mut normalized = PathBuf::new();
  for component in path.components() {
    match component {
      Component::ParentDir => {
        normalized.pop();
      }
      Component::CurDir => {}
      other => normalized.push(other),
    }
  }
  normalized
}

/// Lexical path from `from` to `to`, `.` when they are equal.
pub fn relative(from: &Path, to: &Path) -> PathBuf {
  let from: Vec<_> = normalize(from).components().map(|c| c.as_os_str().to_owned()).collect();
  let to: Vec<_> = normalize(to).components().map(|c| c.as_os_str().to_owned()).collect();
  let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

  let mut relative = PathBuf::new();
  for _ in common..from.len() {
    relative.push("..");
  }
  for component in &to[common..] {
    relative.push(component);
  }

  if relative.as_os_str().is_empty() {
    PathBuf::from(".")
  } else {
    relative
  }
}

fn lossy(path: &Path) -> String {
  path.to_string_lossy().into_owned()
}

/// Create the `path` table exposed to scripts.
pub fn create_path_helpers(lua: &Lua) -> LuaResult<LuaTable> {
  let path = lua.create_table()?;

  path.set(
    "join",
    lua.create_function(|_, segments: LuaVariadic<String>| {
      let joined: PathBuf = segments.iter().collect();
      Ok(lossy(&joined))
    })?,
  )?;

  path.set(
    "dirname",
    lua.create_function(|_, p: String| Ok(Path::new(&p).parent().map(lossy).unwrap_or_default()))?,
  )?;

  path.set(
    "basename",
    lua.create_function(|_, p: String| {
      Ok(
        Path::new(&p)
          .file_name()
          .map(|name| name.to_string_lossy().into_owned())
          .unwrap_or_default(),
      )
    })?,
  )?;

  path.set(
    "extname",
    lua.create_function(|_, p: String| {
      Ok(
        Path::new(&p)
          .extension()
          .map(|ext| format!(".{}", ext.to_string_lossy()))
          .unwrap_or_default(),
      )
    })?,
  )?;

  path.set(
    "is_absolute",
    lua.create_function(|_, p: String| Ok(Path::new(&p).is_absolute()))?,
  )?;

  path.set(
    "normalize",
    lua.create_function(|_, p: String| Ok(lossy(&normalize(Path::new(&p)))))?,
  )?;

  path.set(
    "relative",
    lua.create_function(|_, (from, to): (String, String)| Ok(lossy(&relative(Path::new(&from), Path::new(&to)))))?,
  )?;

  Ok(path)
}
