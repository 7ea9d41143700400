//! Script file loading with per-file `__dir` injection.
//!
//! Each loaded file runs in an environment table that carries `__dir`, the
//! directory of the file itself, and falls through to the globals for
//! everything else. Scripts can use `__dir` to refer to siblings without
//! caring where the tool was invoked from.

use mlua::prelude::*;

use crate::path::parent_dir;

/// Load and execute a Lua file with `__dir` set in its environment.
pub fn load_file(lua: &Lua, path: &str) -> LuaResult<()> {
  let content = std::fs::read_to_string(path)
    .map_err(|e| LuaError::external(format!("cannot read '{}': {}", path, e)))?;

  let dir = parent_dir(path).unwrap_or(".").to_string();

  let env = lua.create_table()?;
  env.set("__dir", dir)?;
  let mt = lua.create_table()?;
  mt.set("__index", lua.globals())?;
  mt.set("__newindex", lua.globals())?;
  env.set_metatable(Some(mt))?;

  lua
    .load(&content)
    .set_name(format!("@{}", path))
    .set_environment(env)
    .exec()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn injects_the_file_directory() {
    let dir = tempfile::tempdir().unwrap();
    let sub = dir.path().join("scripts");
    std::fs::create_dir(&sub).unwrap();
    let script = sub.join("probe.lua");
    std::fs::write(&script, "captured = __dir").unwrap();

    let lua = Lua::new();
    load_file(&lua, script.to_str().unwrap()).unwrap();
    let captured: String = lua.globals().get("captured").unwrap();
    assert!(captured.ends_with("scripts"), "{captured}");
  }

  #[test]
  fn assignments_land_in_the_globals() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("g.lua");
    std::fs::write(&script, "shared_value = 42").unwrap();

    let lua = Lua::new();
    load_file(&lua, script.to_str().unwrap()).unwrap();
    let value: i64 = lua.globals().get("shared_value").unwrap();
    assert_eq!(value, 42);
  }

  #[test]
  fn missing_file_reports_the_path() {
    let lua = Lua::new();
    let err = load_file(&lua, "does/not/exist.lua").unwrap_err();
    assert!(err.to_string().contains("does/not/exist.lua"), "{err}");
  }
}
