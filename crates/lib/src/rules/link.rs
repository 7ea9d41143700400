//! Link-alias resolution and rule attribute setters.
//!
//! A library alias is a phony rule carrying `link_inputs`: dependents that
//! name the alias are redirected to that list at emission time, so a
//! program links against `libfoo.a -lpthread` while only depending on the
//! archive file. Ordering is last-wins throughout, matching how linkers
//! resolve references.

use crate::error::Result;
use crate::project::Project;
use crate::rules::{RuleId, push_unique, push_unique_last};

impl Project {
  /// Designate the rule producing `name` as a library alias whose
  /// effective linker inputs are `items` (file paths or raw `-l`/`-L`
  /// switches). Repeated items move to the end.
  pub fn rule_add_link(&mut self, name: &str, items: &[String]) -> Result<()> {
    let id = self.rules.require(name)?;
    let rule = self.rules.rule_mut(id);
    let link_inputs = rule.link_inputs.get_or_insert_with(Vec::new);
    for item in items {
      push_unique_last(link_inputs, item);
    }
    Ok(())
  }

  /// Expand every phony, non-alias rule among `items` to its inputs,
  /// recursively. Non-rule items pass through. Cycle-safe.
  pub fn rule_flatten_aliases(&self, items: &[String]) -> Vec<String> {
    let mut visited: Vec<RuleId> = Vec::new();
    let mut flat: Vec<String> = Vec::new();
    for item in items {
      self.flatten_one(item, &mut visited, &mut flat);
    }
    flat
  }

  fn flatten_one(&self, item: &str, visited: &mut Vec<RuleId>, flat: &mut Vec<String>) {
    if let Some(id) = self.rules.lookup(item) {
      let rule = self.rules.rule(id);
      if rule.is_phony && rule.link_inputs.is_none() {
        if !visited.contains(&id) {
          visited.push(id);
          for input in rule.inputs.clone() {
            self.flatten_one(&input, visited, flat);
          }
        }
        return;
      }
    }
    push_unique(flat, item);
  }

  /// Replace alias names among `items` with their `link_inputs`, in order,
  /// de-duplicated keeping the last occurrence.
  pub fn rule_get_link_inputs(&self, items: &[String]) -> Vec<String> {
    let mut result: Vec<String> = Vec::new();
    for item in items {
      match self.rules.lookup(item).map(|id| self.rules.rule(id)) {
        Some(rule) if rule.link_inputs.is_some() => {
          if let Some(link_inputs) = &rule.link_inputs {
            for li in link_inputs {
              push_unique_last(&mut result, li);
            }
          }
        }
        _ => push_unique_last(&mut result, item),
      }
    }
    result
  }

  /// The inputs of the rule producing `name`, run through
  /// [`Project::rule_get_link_inputs`].
  pub fn rule_get_inputs(&self, name: &str) -> Result<Vec<String>> {
    let id = self.rules.require(name)?;
    Ok(self.rule_get_link_inputs(&self.rules.rule(id).inputs))
  }

  pub fn rule_set_phony(&mut self, name: &str) -> Result<()> {
    let id = self.rules.require(name)?;
    self.rules.rule_mut(id).is_phony = true;
    Ok(())
  }

  pub fn rule_set_precious(&mut self, name: &str) -> Result<()> {
    let id = self.rules.require(name)?;
    self.rules.rule_mut(id).is_precious = true;
    Ok(())
  }

  pub fn rule_set_priority(&mut self, name: &str, priority: i32) -> Result<()> {
    let id = self.rules.require(name)?;
    self.rules.rule_mut(id).priority = priority;
    Ok(())
  }

  pub fn rule_set_info(&mut self, name: &str, info: &str) -> Result<()> {
    let id = self.rules.require(name)?;
    self.rules.rule_mut(id).info = Some(info.to_string());
    Ok(())
  }

  pub fn rule_add_comment(&mut self, name: &str, comment: &str) -> Result<()> {
    let id = self.rules.require(name)?;
    self.rules.rule_mut(id).comments.push(comment.to_string());
    Ok(())
  }
}
