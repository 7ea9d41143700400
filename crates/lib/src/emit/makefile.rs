//! Classic-runner (Makefile) emitter.
//!
//! The artifact is deliberately dumb: no make variables, functions,
//! pattern rules, or conditionals. Every command starts with a tab,
//! dependency files are pulled in with `-include`, and literal `$` is
//! doubled so the shell sees what the rule stored.

use crate::consts::MAKEFILE_LINE_MAX;
use crate::emit::{effective_inputs, split_command};
use crate::error::Result;
use crate::project::Project;

fn make_escape(text: &str) -> String {
  text.replace('$', "$$")
}

/// Render the whole store as a Makefile.
pub fn emit(project: &mut Project) -> Result<String> {
  let mut out = String::new();
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

    let file_outputs: Vec<&String> = rule.outputs.iter().filter(|o| !o.ends_with(".d")).collect();
    let targets: Vec<&String> = if file_outputs.is_empty() {
      rule.outputs.iter().collect()
    } else {
      file_outputs
    };

    let mut line = format!(
      "{} :",
      targets.iter().map(|t| make_escape(t)).collect::<Vec<_>>().join(" ")
    );
    for dep in &deps {
      let dep = make_escape(dep);
      if line.len() + 1 + dep.len() > MAKEFILE_LINE_MAX {
        out.push_str(&line);
        out.push_str(" \\\n");
        line = String::from(" ");
      }
      line.push(' ');
      line.push_str(&dep);
    }
    out.push_str(&line);
    out.push('\n');

    if let Some(info) = &rule.info {
      out.push_str("\t@echo \"\t");
      out.push_str(info);
      out.push_str("...\"\n");
    }
    for cmd in &rule.commands {
      let flags = split_command(cmd);
      out.push('\t');
      if flags.ignore_errors {
        out.push('-');
      }
      if flags.silent || rule.info.is_some() {
        out.push('@');
      }
      out.push_str(&make_escape(&flags.text));
      out.push('\n');
    }

    for depfile in rule.outputs.iter().filter(|o| o.ends_with(".d")) {
      out.push_str("-include ");
      out.push_str(depfile);
      out.push('\n');
    }
    out.push('\n');
  }

  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn strs(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
  }

  fn project() -> Project {
    let mut p = Project::new();
    p.vars.set("TMP", "out");
    p
  }

  #[test]
  fn renders_a_plain_rule() {
    let mut p = project();
    p.generate(&strs(&["a.o"]), &strs(&["a.c"]), &strs(&["cc -c a.c -o a.o"]))
      .unwrap();
    let text = emit(&mut p).unwrap();
    assert!(text.contains("a.o : a.c\n\tcc -c a.c -o a.o\n"), "{text}");
  }

  #[test]
  fn rules_are_ordered_by_priority_then_name_and_emitted_once() {
    let mut p = project();
    p.generate(&strs(&["zz", "aa"]), &[], &strs(&["echo both"])).unwrap();
    p.generate(&strs(&[".PHONY"]), &strs(&["zz"]), &[]).unwrap();
    let text = emit(&mut p).unwrap();
    let phony_pos = text.find(".PHONY :").unwrap();
    let rule_pos = text.find("zz aa :").unwrap();
    assert!(phony_pos < rule_pos, "{text}");
    assert_eq!(text.matches("echo both").count(), 1);
  }

  #[test]
  fn info_makes_commands_silent_and_echoes() {
    let mut p = project();
    p.generate(&strs(&["a.o"]), &strs(&["a.c"]), &strs(&["cc -c a.c"])).unwrap();
    p.rule_set_info("a.o", "CC a.c").unwrap();
    let text = emit(&mut p).unwrap();
    assert!(text.contains("\t@echo \"\tCC a.c...\"\n\t@cc -c a.c\n"), "{text}");
  }

  #[test]
  fn ignore_errors_marker_is_preserved() {
    let mut p = project();
    p.generate_directory("out/sub").unwrap();
    let text = emit(&mut p).unwrap();
    assert!(text.contains("\t-@mkdir -p out/sub\n\t@touch out/sub/.mark\n"), "{text}");
  }

  #[test]
  fn comments_precede_the_rule() {
    let mut p = project();
    p.generate(&strs(&["a"]), &[], &strs(&["touch a"])).unwrap();
    p.rule_add_comment("a", "built for the demo").unwrap();
    let text = emit(&mut p).unwrap();
    assert!(text.contains("# built for the demo\na :\n"), "{text}");
  }

  #[test]
  fn dep_files_are_included_not_targeted() {
    let mut p = project();
    p.generate(
      &strs(&["a.o", "a.d"]),
      &strs(&["a.c"]),
      &strs(&["cc -MD -c a.c -o a.o"]),
    )
    .unwrap();
    let text = emit(&mut p).unwrap();
    assert!(text.contains("a.o : a.c\n"), "{text}");
    assert!(!text.contains("a.d :"), "{text}");
    assert!(text.contains("-include a.d\n"), "{text}");
  }

  #[test]
  fn linker_switches_are_not_dependencies() {
    let mut p = project();
    p.generate(&strs(&["libfoo"]), &strs(&["libfoo.a"]), &[]).unwrap();
    p.rule_set_phony("libfoo").unwrap();
    p.rule_add_link("libfoo", &strs(&["libfoo.a", "-lpthread"])).unwrap();
    p.generate(
      &strs(&["prog"]),
      &strs(&["main.o", "libfoo"]),
      &strs(&["cc -o $@ main.o libfoo"]),
    )
    .unwrap();
    let text = emit(&mut p).unwrap();
    assert!(text.contains("prog : main.o libfoo.a\n"), "{text}");
    assert!(!text.contains("prog : main.o libfoo.a -lpthread"), "{text}");
  }

  #[test]
  fn long_dependency_lists_wrap_with_continuations() {
    let mut p = project();
    let inputs: Vec<String> = (0..40).map(|i| format!("dir/input_file_number_{:02}.o", i)).collect();
    p.generate(&strs(&["prog"]), &inputs, &strs(&["link"])).unwrap();
    let text = emit(&mut p).unwrap();
    assert!(text.contains(" \\\n  "), "{text}");
    for line in text.lines() {
      assert!(line.len() <= MAKEFILE_LINE_MAX + 40, "{line}");
    }
  }

  #[test]
  fn dollars_are_doubled() {
    let mut p = project();
    p.generate(&strs(&["a"]), &[], &strs(&["echo $$HOME"])).unwrap();
    let text = emit(&mut p).unwrap();
    assert!(text.contains("\techo $$HOME\n"), "{text}");
  }

  #[test]
  fn emission_is_deterministic() {
    let build = || {
      let mut p = project();
      p.generate(&strs(&["out/a.o"]), &strs(&["a.c"]), &strs(&["cc -c a.c"])).unwrap();
      p.generate(&strs(&["all"]), &strs(&["out/a.o"]), &[]).unwrap();
      p.rule_set_phony("all").unwrap();
      emit(&mut p).unwrap()
    };
    assert_eq!(build(), build());
  }
}
