//! Implementation of the `show-vars` subcommand.

use anyhow::Result;
use serde_json::json;

use mklua_lib::Project;

use crate::output;

/// Evaluate the rules script and print the final variable values, with
/// `user-set` and `directory` annotations (or as a JSON object).
pub fn cmd_show_vars(project: Project, as_json: bool) -> Result<()> {
  let project = super::evaluate(project)?;

  if as_json {
    let mut map = serde_json::Map::new();
    for (name, value) in project.vars.iter() {
      map.insert(
        name.to_string(),
        json!({
          "value": value,
          "user_set": project.vars.is_user_set(name),
          "directory": project.vars.is_directory_name(name),
        }),
      );
    }
    println!("{}", serde_json::to_string_pretty(&serde_json::Value::Object(map))?);
    return Ok(());
  }

  for (name, value) in project.vars.iter() {
    let mut labels: Vec<&str> = Vec::new();
    if project.vars.is_user_set(name) {
      labels.push("user-set");
    }
    if project.vars.is_directory_name(name) {
      labels.push("directory");
    }
    println!("{}={}{}", name, value, output::annotation(&labels));
  }
  Ok(())
}
