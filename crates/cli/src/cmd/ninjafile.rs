//! Implementation of the `ninjafile` subcommand.

use anyhow::{Context, Result};

use mklua_lib::Project;
use mklua_lib::bootstrap;
use mklua_lib::emit::{ninja, write_atomic};

use crate::output;

/// Evaluate the rules script and write the build.ninja artifact.
pub fn cmd_ninjafile(project: Project) -> Result<()> {
  let mut project = super::evaluate(project)?;
  let (artifact, cfg) = super::bootstrap_config(&project, "ninjafile", &[])?;

  bootstrap::inject(&mut project, &cfg)?;
  bootstrap::verify_inputs(&project);

  let text = ninja::emit(&mut project)?;
  write_atomic(&artifact, &text).context("failed to write the ninja file")?;

  output::status("wrote", &format!("{} ({} rules)", artifact, project.rules.len()));
  Ok(())
}
