//! Modern-runner (ninja) emitter.
//!
//! One shared `generic` rule carries the per-build `command` binding;
//! command-less phony rules use ninja's built-in `phony`. Dependency files
//! become `depfile` bindings.

use crate::emit::{effective_inputs, join_commands};
use crate::error::Result;
use crate::project::Project;

/// `$`, space, and `:` are significant in ninja paths.
fn escape_path(path: &str) -> String {
  path.replace('$', "$$").replace(' ', "$ ").replace(':', "$:")
}

fn escape_text(text: &str) -> String {
  text.replace('$', "$$")
}

/// Render the whole store as a `build.ninja` file.
pub fn emit(project: &mut Project) -> Result<String> {
  let mut out = String::from("rule generic\n  command = $command\n\n");
  project.rules.reset_emitted();

  for name in project.rules.sorted_output_names() {
    let Some(id) = project.rules.lookup(&name) else {
      continue;
    };
    if project.rules.rule(id).emitted {
      continue;
    }
    project.rules.rule_mut(id).emitted = true;

    let deps = effective_inputs(project, id);
    let rule = project.rules.rule(id);

    for comment in &rule.comments {
      out.push_str("# ");
      out.push_str(comment);
      out.push('\n');
    }

    if rule.is_phony && rule.commands.is_empty() {
      out.push_str("build ");
      out.push_str(
        &rule
          .outputs
          .iter()
          .map(|o| escape_path(o))
          .collect::<Vec<_>>()
          .join(" "),
      );
      out.push_str(": phony");
      for dep in &deps {
        out.push(' ');
        out.push_str(&escape_path(dep));
      }
      out.push_str("\n\n");
      continue;
    }

    let file_outputs: Vec<&String> = rule.outputs.iter().filter(|o| !o.ends_with(".d")).collect();
    let targets: Vec<&String> = if file_outputs.is_empty() {
      rule.outputs.iter().collect()
    } else {
      file_outputs
    };

    out.push_str("build ");
    out.push_str(
      &targets
        .iter()
        .map(|t| escape_path(t))
        .collect::<Vec<_>>()
        .join(" "),
    );
    out.push_str(": generic");
    for dep in &deps {
      out.push(' ');
      out.push_str(&escape_path(dep));
    }
    out.push('\n');

    out.push_str("  command = ");
    out.push_str(&escape_text(&join_commands(&rule.commands)));
    out.push('\n');
    if let Some(info) = &rule.info {
      out.push_str("  description = ");
      out.push_str(info);
      out.push('\n');
    }
    if let Some(depfile) = rule.outputs.iter().find(|o| o.ends_with(".d")) {
      out.push_str("  depfile = ");
      out.push_str(depfile);
      out.push('\n');
    }
    out.push('\n');
  }

  out.push_str("default all\n");
  Ok(out)
}
