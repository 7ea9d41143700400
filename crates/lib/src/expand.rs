//! One-shot variable expansion of command strings.
//!
//! Expansion happens exactly once, at rule-construction time, against the
//! canonicalized outputs and inputs of the constructing call. The emitted
//! artifacts never contain placeholders.

use crate::vars::VarStore;

/// Expand `$$`, `$@`, `$<`, `$(NAME)` and single-character `$X` in `cmd`.
///
/// `$@` is the first output of the rule under construction (empty if none),
/// `$<` the first input. Every other name is looked up in `vars`. A lone
/// trailing `$` and an unterminated `$(` are kept literal.
pub fn expand_command(cmd: &str, vars: &VarStore, outputs: &[String], inputs: &[String]) -> String {
  let mut result = String::with_capacity(cmd.len());
  let mut chars = cmd.chars().peekable();

  while let Some(c) = chars.next() {
    if c != '$' {
      result.push(c);
      continue;
    }
    match chars.next() {
      Some('$') => result.push('$'),
      Some('@') => {
        if let Some(first) = outputs.first() {
          result.push_str(first);
        }
      }
      Some('<') => {
        if let Some(first) = inputs.first() {
          result.push_str(first);
        }
      }
      Some('(') => {
        let mut name = String::new();
        let mut closed = false;
        for c in chars.by_ref() {
          if c == ')' {
            closed = true;
            break;
          }
          name.push(c);
        }
        if closed {
          result.push_str(&vars.get(&name));
        } else {
          result.push_str("$(");
          result.push_str(&name);
        }
      }
      Some(other) => result.push_str(&vars.get(&other.to_string())),
      None => result.push('$'),
    }
  }

  result
}

#[cfg(test)]
mod tests {
  use super::*;

  fn store() -> VarStore {
    let mut vars = VarStore::new();
    vars.set("CC", "gcc");
    vars.set("V", "verbose");
    vars
  }

  #[test]
  fn expands_output_input_and_literal_dollar() {
    let out = vec!["o".to_string()];
    let inp = vec!["i".to_string()];
    assert_eq!(expand_command("echo $$ $@ $<", &store(), &out, &inp), "echo $ o i");
  }

  #[test]
  fn expands_named_and_single_char_variables() {
    let vars = store();
    assert_eq!(expand_command("$(CC) -c $V", &vars, &[], &[]), "gcc -c verbose");
    assert_eq!(expand_command("$(MISSING)x", &vars, &[], &[]), "x");
  }

  #[test]
  fn empty_rule_context_expands_empty() {
    assert_eq!(expand_command("a$@b$<c", &store(), &[], &[]), "abc");
  }

  #[test]
  fn keeps_malformed_references_literal() {
    let vars = store();
    assert_eq!(expand_command("tail$", &vars, &[], &[]), "tail$");
    assert_eq!(expand_command("x$(OOPS", &vars, &[], &[]), "x$(OOPS");
  }
}
