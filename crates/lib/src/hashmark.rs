//! Per-rule content-hash marker files.
//!
//! Timestamp-only runners rebuild when inputs are newer than outputs, but
//! not when the command line itself changes. The marker mechanism closes
//! that gap: every buildable rule depends on a zero-content file whose name
//! encodes a hash of the rule's inputs and commands. Editing the command
//! moves the marker path; the marker rule removes the stale sibling *and*
//! the stale output, touches the new marker, and the runner rebuilds.

use tracing::debug;

use crate::consts::{HASH_DIR, HASH_RULE_PRIORITY};
use crate::error::Result;
use crate::path::normalize_filename;
use crate::project::Project;
use crate::rules::push_unique;
use crate::util::hash::md5_hex;

/// The marker path for a rule, as
/// `<TMP>/.hash/<name_hash[0..2]>/<name_hash[2..]>_<code_hash>`.
pub fn marker_path(tmp: &str, first_output: &str, inputs: &[String], commands: &[String]) -> String {
  let code_hash = md5_hex(&format!("{}\n{}", inputs.join(" "), commands.join("\n")));
  let name_hash = md5_hex(first_output);
  normalize_filename(&[
    tmp,
    HASH_DIR,
    &name_hash[..2],
    &format!("{}_{}", &name_hash[2..], code_hash),
  ])
}

/// Attach a hash-marker rule to every rule that can go stale: not a
/// directory, not phony, and actually running commands (a bare stand-in
/// rule has nothing to rebuild, and its first output may well be a source
/// file the marker rule must never remove).
pub fn add_hash_markers(project: &mut Project) -> Result<()> {
  let tmp = project.tmp_dir();
  let ids: Vec<_> = project.rules.ids().collect();

  for id in ids {
    let (first_output, inputs, commands) = {
      let rule = project.rules.rule(id);
      if rule.is_directory || rule.is_phony || rule.commands.is_empty() {
        continue;
      }
      let Some(first) = rule.outputs.first() else {
        continue;
      };
      (first.clone(), rule.inputs.clone(), rule.commands.clone())
    };

    let marker = marker_path(&tmp, &first_output, &inputs, &commands);
    if project.rules.lookup(&marker).is_none() {
      let stale_glob = match marker.rsplit_once('/') {
        Some((dir, file)) => {
          let prefix = file.split_once('_').map(|(p, _)| p).unwrap_or(file);
          format!("{}/{}_*", dir, prefix)
        }
        None => format!("{}_*", marker),
      };
      debug!(rule = %first_output, marker = %marker, "hash marker");
      let commands = vec![
        format!("-@rm -f {} {}", stale_glob, first_output),
        format!("@touch {}", marker),
      ];
      project.generate(&[marker.clone()], &[], &commands)?;
      let marker_id = project.rules.require(&marker)?;
      project.rules.rule_mut(marker_id).priority = HASH_RULE_PRIORITY;
    }

    let rule = project.rules.rule_mut(id);
    push_unique(&mut rule.inputs, &marker);
  }

  Ok(())
}
