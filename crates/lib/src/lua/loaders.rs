//! Platform module loading with per-file `__dir` injection.
//!
//! Platform modules live in the shared modules area and are evaluated directly
//! instead of going through the executor's retry loop. Each one:
//! 1. Runs once per Lua state; later loads return the cached value
//! 2. Sees `__dir` set to its own directory
//! 3. Reads globals through its environment's metatable, while its own
//!    top-level assignments stay local to the module
//!
//! The global `require` (used by platform modules themselves) is routed through
//! the same loader by replacing `package.searchers[2]`.

use std::fs;
use std::path::Path;

use mlua::prelude::*;

use crate::consts::PLATFORM_CACHE_KEY;

/// Evaluate a Lua file in a fresh environment containing `__dir`.
pub fn load_file_with_dir(lua: &Lua, path: &Path) -> LuaResult<LuaValue> {
  let content = fs::read_to_string(path)
    .map_err(|e| LuaError::external(format!("cannot read '{}': {}", path.display(), e)))?;

  let dir = path.parent().unwrap_or(Path::new(".")).to_string_lossy().into_owned();

  let env = lua.create_table()?;
  env.set("__dir", dir)?;

  let mt = lua.create_table()?;
  mt.set("__index", lua.globals())?;
  env.set_metatable(Some(mt))?;

  lua
    .load(&content)
    .set_name(format!("@{}", path.display()))
    .set_environment(env)
    .eval::<LuaValue>()
}

fn platform_cache(lua: &Lua) -> LuaResult<LuaTable> {
  if let Some(cache) = lua.named_registry_value::<Option<LuaTable>>(PLATFORM_CACHE_KEY)? {
    return Ok(cache);
  }
  let cache = lua.create_table()?;
  lua.set_named_registry_value(PLATFORM_CACHE_KEY, cache.clone())?;
  Ok(cache)
}

/// Load the platform module at `path`, evaluating it at most once per Lua state.
///
/// A module that returns nothing is recorded (and returned) as `true`.
pub fn require_platform(lua: &Lua, path: &Path) -> LuaResult<LuaValue> {
  let canonical = dunce::canonicalize(path)
    .map_err(|e| LuaError::external(format!("cannot resolve '{}': {}", path.display(), e)))?;
  let key = canonical.to_string_lossy().into_owned();

  let cache = platform_cache(lua)?;
  let cached: LuaValue = cache.get(key.as_str())?;
  if !cached.is_nil() {
    return Ok(cached);
  }

  let value = match load_file_with_dir(lua, &canonical)? {
    LuaValue::Nil => LuaValue::Boolean(true),
    other => other,
  };
  cache.set(key, value.clone())?;
  Ok(value)
}

/// Searcher for `package.searchers[2]` that loads files through [`require_platform`].
fn create_lua_searcher(lua: &Lua) -> LuaResult<LuaFunction> {
  lua.create_function(|lua, modname: String| {
    let package: LuaTable = lua.globals().get("package")?;
    let search_path: String = package.get("path")?;
    let searchpath: LuaFunction = package.get("searchpath")?;

    let (found, _): (Option<String>, Option<String>) = searchpath.call((modname.as_str(), search_path))?;
    match found {
      Some(filepath) => {
        let location = filepath.clone();
        let loader = lua.create_function(move |lua, _: LuaMultiValue| require_platform(lua, Path::new(&location)))?;
        Ok((LuaValue::Function(loader), filepath))
      }
      None => {
        let errmsg = format!("\n\tno platform module '{}'", modname);
        Ok((LuaValue::Nil, errmsg))
      }
    }
  })
}

/// Route the global `require` through the platform module loader.
pub fn install_loaders(lua: &Lua) -> LuaResult<()> {
  let package: LuaTable = lua.globals().get("package")?;
  let searchers: LuaTable = package.get("searchers")?;
  searchers.set(2, create_lua_searcher(lua)?)?;
  Ok(())
}
