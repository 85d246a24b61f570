//! Helper tables bound into every sandbox scope.
//!
//! - [`path`] - Lexical path manipulation (`path.join`, `path.dirname`, ...)
//! - [`template`] - Escaping, interpolation and class-list helpers

pub mod path;
pub mod template;

use mlua::prelude::*;

/// Build the table of helpers, keyed by the name each one is bound to.
pub fn create_helpers(lua: &Lua) -> LuaResult<LuaTable> {
  let helpers = lua.create_table()?;
  helpers.set("path", path::create_path_helpers(lua)?)?;
  helpers.set("template", template::create_template_helpers(lua)?)?;
  Ok(helpers)
}
