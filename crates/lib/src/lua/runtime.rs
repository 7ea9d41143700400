use std::cell::RefCell;
use std::rc::Rc;

use mlua::prelude::*;

use crate::lua::globals;
use crate::project::Project;

/// Create a Lua runtime with the `mk` global registered.
pub fn create_runtime(project: Rc<RefCell<Project>>) -> LuaResult<Lua> {
  let lua = Lua::new();
  globals::register_globals(&lua, project)?;
  Ok(lua)
}
