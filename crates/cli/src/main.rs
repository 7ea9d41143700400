//! mklua: Command-line interface for mklua
//!
//! Provides the `mklua` command with subcommands:
//! - `mklua [makefile]` - Generate a Makefile from Rules.lua
//! - `mklua ninjafile` - Generate a build.ninja file
//! - `mklua scriptfile TARGET...` - Generate a plain shell script
//! - `mklua show-vars` - Print the final variable values

use anyhow::{Result, bail};
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use mklua_lib::Project;
use mklua_lib::path::normalize_filename;
use mklua_lib::vars::recognize_assignment;

mod cmd;
mod output;

#[derive(Parser)]
#[command(name = "mklua")]
#[command(version, about = "Generate Makefiles, ninja files, and shell scripts from Lua rules")]
#[command(after_help = "Subcommands:
  makefile            Write a Makefile (the default)
  ninjafile           Write a build.ninja file
  scriptfile TARGET…  Write a shell script building the given targets
  show-vars           Print the final variable values")]
struct Cli {
  /// Source root containing the rules script
  #[arg(long = "in", value_name = "PATH", default_value = ".")]
  in_dir: String,

  /// Output root for generated files
  #[arg(long = "out", value_name = "PATH", default_value = ".")]
  out_dir: String,

  /// Entry script name, relative to the source root
  #[arg(long, value_name = "NAME", default_value = "Rules.lua")]
  infile: String,

  /// Artifact name; defaults to Makefile, build.ninja, or build.sh per
  /// subcommand
  #[arg(long, value_name = "NAME")]
  outfile: Option<String>,

  /// Machine-readable output (show-vars only)
  #[arg(long)]
  json: bool,

  /// Enable debug logging
  #[arg(short, long)]
  verbose: bool,

  /// `KEY=VALUE` assignments and `--with-FOO`/`--without-FOO` toggles,
  /// followed by an optional subcommand and its targets
  #[arg(value_name = "ARG", allow_hyphen_values = true)]
  args: Vec<String>,
}

enum Command {
  Makefile,
  Ninjafile,
  Scriptfile,
  ShowVars,
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  // Artifact bytes and show-vars listings go to stdout; diagnostics stay
  // on stderr.
  let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
  FmtSubscriber::builder()
    .with_max_level(level)
    .with_target(false)
    .without_time()
    .with_writer(std::io::stderr)
    .init();

  let mut project = Project::new();
  project.vars.set("IN", &normalize_filename(&[&cli.in_dir]));
  project.vars.set("OUT", &normalize_filename(&[&cli.out_dir]));
  let out_dir = project.vars.get("OUT");
  project.vars.add("TMP", &out_dir);
  project.vars.set("INFILE", &cli.infile);

  let (command, targets) = parse_words(&mut project, &cli.args)?;

  let default_outfile = match command {
    Command::Ninjafile => "build.ninja",
    Command::Scriptfile => "build.sh",
    _ => "Makefile",
  };
  let outfile = cli.outfile.as_deref().unwrap_or(default_outfile);
  project.vars.set("OUTFILE", outfile);

  match command {
    Command::Makefile => cmd::cmd_makefile(project),
    Command::Ninjafile => cmd::cmd_ninjafile(project),
    Command::Scriptfile => cmd::cmd_scriptfile(project, &targets),
    Command::ShowVars => cmd::cmd_show_vars(project, cli.json),
  }
}

/// Split the trailing words into variable assignments, the subcommand, and
/// its targets. Unknown flags are fatal.
fn parse_words(project: &mut Project, words: &[String]) -> Result<(Command, Vec<String>)> {
  let mut subcommand: Option<String> = None;
  let mut targets: Vec<String> = Vec::new();

  for word in words {
    if subcommand.is_some() {
      targets.push(word.clone());
      continue;
    }
    if let Some((name, value)) = recognize_assignment(word) {
      project.vars.set_user(&name, &value);
      continue;
    }
    if word.starts_with('-') {
      bail!("unrecognized argument '{}'", word);
    }
    subcommand = Some(word.clone());
  }

  let command = match subcommand.as_deref() {
    None | Some("makefile") => Command::Makefile,
    Some("ninjafile") => Command::Ninjafile,
    Some("scriptfile") => {
      if targets.is_empty() {
        bail!("scriptfile requires at least one target");
      }
      Command::Scriptfile
    }
    Some("show-vars") => Command::ShowVars,
    Some(other) => bail!("unknown subcommand '{}'", other),
  };

  if !matches!(command, Command::Scriptfile) && !targets.is_empty() {
    bail!("unexpected argument '{}'", targets[0]);
  }

  Ok((command, targets))
}
