use mlua::prelude::*;

use crate::lua::loaders;

/// Create a new Lua runtime for an executor.
///
/// `package.path` is extended so the global `require` finds platform modules in
/// `./<modules_dir>`, and file loading goes through the platform module cache.
pub fn create_runtime(modules_dir: &str) -> LuaResult<Lua> {
  let lua = Lua::new();
  let package = lua.globals().get::<LuaTable>("package")?;
  let package_path = package.get::<String>("path")?;
  let new_package_path = format!("./{dir}/?.lua;./{dir}/?/init.lua;{}", package_path, dir = modules_dir);
  package.set("path", new_package_path)?;

  loaders::install_loaders(&lua)?;

  Ok(lua)
}
