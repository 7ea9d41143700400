mod makefile;
mod ninjafile;
mod scriptfile;
mod show_vars;

pub use makefile::cmd_makefile;
pub use ninjafile::cmd_ninjafile;
pub use scriptfile::cmd_scriptfile;
pub use show_vars::cmd_show_vars;

use anyhow::{Context, Result};
use tracing::debug;

use mklua_lib::Project;
use mklua_lib::bootstrap::BootstrapConfig;
use mklua_lib::lua::evaluate_script;
use mklua_lib::path::normalize_filename;

/// Evaluate the entry script named by `IN`/`INFILE` against the seeded
/// project.
fn evaluate(mut project: Project) -> Result<Project> {
  let script = normalize_filename(&[&project.vars.get("IN"), &project.vars.get("INFILE")]);
  project.register_input(&script);
  debug!(script = %script, "evaluating rules script");
  evaluate_script(project, &script).context("failed to evaluate the rules script")
}

/// The artifact path and the self-rebuild configuration for a subcommand.
/// The artifact lands where the tool was invoked; `OUTFILE` may carry a
/// path of its own.
fn bootstrap_config(project: &Project, subcommand: &str, targets: &[String]) -> Result<(String, BootstrapConfig)> {
  let artifact = normalize_filename(&[&project.vars.get("OUTFILE")]);
  let driver = std::env::current_exe()
    .map(|p| p.to_string_lossy().into_owned())
    .context("cannot determine the driver executable path")?;
  let cfg = BootstrapConfig {
    artifact: artifact.clone(),
    driver,
    subcommand: subcommand.to_string(),
    targets: targets.to_vec(),
  };
  Ok((artifact, cfg))
}
