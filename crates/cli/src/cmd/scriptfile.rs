//! Implementation of the `scriptfile` subcommand.

use anyhow::{Context, Result};

use mklua_lib::Project;
use mklua_lib::bootstrap;
use mklua_lib::emit::{script, write_atomic};

use crate::output;

/// Evaluate the rules script and write a linear shell script building the
/// requested targets.
pub fn cmd_scriptfile(project: Project, targets: &[String]) -> Result<()> {
  let mut project = super::evaluate(project)?;
  let (artifact, cfg) = super::bootstrap_config(&project, "scriptfile", targets)?;

  bootstrap::inject(&mut project, &cfg)?;
  bootstrap::verify_inputs(&project);

  let text = script::emit(&mut project, targets)?;
  write_atomic(&artifact, &text).context("failed to write the shell script")?;

  output::status(
    "wrote",
    &format!("{} ({} targets)", artifact, targets.len()),
  );
  Ok(())
}
