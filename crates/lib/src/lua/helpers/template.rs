//! `template` helper table.
//!
//! Small, deterministic text helpers for scripts that render markup:
//! - `template.escape(s)` HTML-escapes a value
//! - `template.interpolate(text, vars)` substitutes `{{a.b}}` (escaped) and
//!   `{{{a.b}}}` (raw) placeholders from a table
//! - `template.classes(list_or_map)` builds a class attribute value

use std::ops::Range;

use mlua::prelude::*;

/// A parsed template fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
  /// Literal text, as a range into the original string.
  Literal(Range<usize>),
  /// `{{path}}`, HTML-escaped on output.
  Escaped(String),
  /// `{{{path}}}`, inserted as-is.
  Raw(String),
}

/// Escape the five HTML-significant characters.
pub fn escape(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for ch in text.chars() {
    match ch {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      other => out.push(other),
    }
  }
  out
}

/// Split `text` into literal and placeholder tokens.
pub fn tokenize(text: &str) -> LuaResult<Vec<Token>> {
  let mut tokens = Vec::new();
  let mut literal_start = 0;
  let mut pos = 0;

  while let Some(offset) = text[pos..].find("{{") {
    let open = pos + offset;
    let (raw, inner_start, close_tag) = if text[open..].starts_with("{{{") {
      (true, open + 3, "}}}")
    } else {
      (false, open + 2, "}}")
    };

    let Some(len) = text[inner_start..].find(close_tag) else {
      return Err(LuaError::runtime(format!("unterminated placeholder at byte {}", open)));
    };

    if open > literal_start {
      tokens.push(Token::Literal(literal_start..open));
    }
    let key = text[inner_start..inner_start + len].trim().to_string();
    tokens.push(if raw { Token::Raw(key) } else { Token::Escaped(key) });

    pos = inner_start + len + close_tag.len();
    literal_start = pos;
  }

  if literal_start < text.len() {
    tokens.push(Token::Literal(literal_start..text.len()));
  }
  Ok(tokens)
}

/// Look up a dotted `path` in `vars`; missing segments yield `nil`.
fn lookup(vars: &LuaTable, path: &str) -> LuaResult<LuaValue> {
  let mut current = LuaValue::Table(vars.clone());
  for segment in path.split('.') {
    current = match current {
      LuaValue::Table(table) => table.get(segment)?,
      _ => return Ok(LuaValue::Nil),
    };
  }
  Ok(current)
}

fn display(value: &LuaValue) -> LuaResult<String> {
  match value {
    LuaValue::Nil => Ok(String::new()),
    other => other.to_string(),
  }
}

/// Substitute placeholders in `text` from `vars`.
pub fn interpolate(text: &str, vars: &LuaTable) -> LuaResult<String> {
  let mut out = String::with_capacity(text.len());
  for token in tokenize(text)? {
    match token {
      Token::Literal(range) => out.push_str(&text[range]),
      Token::Escaped(path) => out.push_str(&escape(&display(&lookup(vars, &path)?)?)),
      Token::Raw(path) => out.push_str(&display(&lookup(vars, &path)?)?),
    }
  }
  Ok(out)
}

/// Join class names from a sequence, or from the keys of a map whose value is truthy.
pub fn classes(value: &LuaTable) -> LuaResult<String> {
  let mut names = Vec::new();
  for item in value.clone().sequence_values::<LuaValue>() {
    match item? {
      LuaValue::String(name) => names.push(name.to_str()?.to_string()),
      LuaValue::Nil | LuaValue::Boolean(false) => {}
      other => names.push(other.to_string()?),
    }
  }

  let mut keyed = Vec::new();
  for pair in value.pairs::<LuaValue, LuaValue>() {
    let (key, enabled) = pair?;
    if let LuaValue::String(name) = key
      && !matches!(enabled, LuaValue::Nil | LuaValue::Boolean(false))
    {
      keyed.push(name.to_str()?.to_string());
    }
  }
  // Table iteration order is unspecified.
  keyed.sort();
  names.extend(keyed);

  Ok(names.join(" "))
}

/// Create the `template` table exposed to scripts.
pub fn create_template_helpers(lua: &Lua) -> LuaResult<LuaTable> {
  let template = lua.create_table()?;

  template.set(
    "escape",
    lua.create_function(|_, value: LuaValue| Ok(escape(&display(&value)?)))?,
  )?;
  template.set(
    "interpolate",
    lua.create_function(|_, (text, vars): (String, LuaTable)| interpolate(&text, &vars))?,
  )?;
  template.set(
    "classes",
    lua.create_function(|_, value: LuaTable| classes(&value))?,
  )?;

  Ok(template)
}
