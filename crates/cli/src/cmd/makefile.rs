//! Implementation of the default `makefile` subcommand.

use anyhow::{Context, Result};

use mklua_lib::Project;
use mklua_lib::bootstrap;
use mklua_lib::emit::{makefile, write_atomic};

use crate::output;

/// Evaluate the rules script and write the Makefile artifact.
pub fn cmd_makefile(project: Project) -> Result<()> {
  let mut project = super::evaluate(project)?;
  let (artifact, cfg) = super::bootstrap_config(&project, "makefile", &[])?;

  bootstrap::inject(&mut project, &cfg)?;
  bootstrap::verify_inputs(&project);

  let text = makefile::emit(&mut project)?;
  write_atomic(&artifact, &text).context("failed to write the Makefile")?;

  output::status("wrote", &format!("{} ({} rules)", artifact, project.rules.len()));
  Ok(())
}
