//! The rule store: an arena of rules plus an output-name index.
//!
//! Rules are owned by a `Vec` and addressed by [`RuleId`]; every output
//! path maps to the id of the rule producing it, so a rule reached through
//! any of its outputs is the same object. Merging and extension happen at
//! rule identity level, never per output.

mod construct;
mod link;

use std::collections::HashMap;

use crate::error::RuleError;

/// Index of a rule in the owning arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(usize);

/// One node of the build graph: a set of outputs produced from a set of
/// inputs by a sequence of already-expanded command strings.
#[derive(Debug, Default, Clone)]
pub struct Rule {
  pub outputs: Vec<String>,
  pub inputs: Vec<String>,
  pub commands: Vec<String>,
  /// Directory-creation rule; excluded from hash tracking.
  pub is_directory: bool,
  /// Higher first in emission order.
  pub priority: i32,
  /// Free-form comment lines emitted above the rule.
  pub comments: Vec<String>,
  /// Status string displayed when the rule runs.
  pub info: Option<String>,
  /// Outputs are labels, not files.
  pub is_phony: bool,
  /// Exempt from the generated clean rule.
  pub is_precious: bool,
  /// When present the rule is a library alias: dependents link against
  /// this list instead of the rule's own outputs.
  pub link_inputs: Option<Vec<String>>,
  /// Transient emission guard; reset before every walk.
  pub emitted: bool,
}

#[derive(Debug, Default)]
pub struct RuleStore {
  rules: Vec<Rule>,
  by_output: HashMap<String, RuleId>,
}

impl RuleStore {
  pub fn new() -> Self {
    RuleStore::default()
  }

  pub fn len(&self) -> usize {
    self.rules.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rules.is_empty()
  }

  pub fn ids(&self) -> impl Iterator<Item = RuleId> + use<> {
    (0..self.rules.len()).map(RuleId)
  }

  pub fn rule(&self, id: RuleId) -> &Rule {
    &self.rules[id.0]
  }

  pub fn rule_mut(&mut self, id: RuleId) -> &mut Rule {
    &mut self.rules[id.0]
  }

  pub fn lookup(&self, output: &str) -> Option<RuleId> {
    self.by_output.get(output).copied()
  }

  /// Like [`RuleStore::lookup`] but a missing rule is a fatal diagnostic.
  pub fn require(&self, output: &str) -> Result<RuleId, RuleError> {
    self
      .lookup(output)
      .ok_or_else(|| RuleError::NoSuchRule(output.to_string()))
  }

  /// Add a rule to the arena and bind all of its outputs.
  pub(crate) fn insert(&mut self, rule: Rule) -> RuleId {
    let id = RuleId(self.rules.len());
    for output in &rule.outputs {
      self.by_output.insert(output.clone(), id);
    }
    self.rules.push(rule);
    id
  }

  pub(crate) fn bind(&mut self, output: &str, id: RuleId) {
    self.by_output.insert(output.to_string(), id);
  }

  /// Output names sorted for emission: descending priority, then lexical.
  pub fn sorted_output_names(&self) -> Vec<String> {
    let mut names: Vec<&String> = self.by_output.keys().collect();
    names.sort_by(|a, b| {
      let pa = self.rules[self.by_output[*a].0].priority;
      let pb = self.rules[self.by_output[*b].0].priority;
      pb.cmp(&pa).then_with(|| a.cmp(b))
    });
    names.into_iter().cloned().collect()
  }

  pub fn reset_emitted(&mut self) {
    for rule in &mut self.rules {
      rule.emitted = false;
    }
  }
}

/// Insertion-ordered de-dup: append `item` unless it is already present.
pub fn push_unique(list: &mut Vec<String>, item: &str) {
  if !list.iter().any(|existing| existing == item) {
    list.push(item.to_string());
  }
}

/// Remove-then-append: a duplicate moves to the end. This is the linker
/// ordering discipline (later duplicates satisfy earlier references) and
/// must not be confused with [`push_unique`].
pub fn push_unique_last(list: &mut Vec<String>, item: &str) {
  list.retain(|existing| existing != item);
  list.push(item.to_string());
}
