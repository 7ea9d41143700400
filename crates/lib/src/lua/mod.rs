//! The embedded Lua front-end.
//!
//! A rules script is plain Lua evaluated against a global `mk` table whose
//! functions mutate a shared [`Project`]. The project is held as
//! `Rc<RefCell<Project>>` and cloned into each registered closure; the Lua
//! state is dropped before the project is unwrapped again.

pub mod globals;
pub mod loaders;
pub mod runtime;

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::project::Project;

/// Evaluate the entry script against `project` and hand the mutated
/// project back. Any Lua failure surfaces as a script error carrying the
/// script name and the original message.
pub fn evaluate_script(project: Project, script: &str) -> Result<Project> {
  let shared = Rc::new(RefCell::new(project));

  {
    let lua = runtime::create_runtime(shared.clone()).map_err(|e| Error::script(script, e))?;
    loaders::load_file(&lua, script).map_err(|e| Error::script(script, e))?;
    // lua drops here, releasing its references to the project
  }

  match Rc::try_unwrap(shared) {
    Ok(cell) => Ok(cell.into_inner()),
    Err(_) => Err(Error::script(script, "script retained internal references")),
  }
}
