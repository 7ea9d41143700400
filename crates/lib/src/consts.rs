//! Shared constants for the on-disk layout and emission limits.

/// Directory under `$(TMP)` holding rule-content hash markers.
pub const HASH_DIR: &str = ".hash";

/// Directory under `$(TMP)` holding anonymous-rule outputs.
pub const ANON_DIR: &str = ".anon";

/// Directory under `$(TMP)` holding generated temp filenames.
pub const TEMP_DIR: &str = ".tmp";

/// Marker file created inside every generated directory.
pub const DIR_MARK: &str = ".mark";

/// Priority of directory-creation rules.
pub const DIR_RULE_PRIORITY: i32 = -99;

/// Priority of hash-marker rules.
pub const HASH_RULE_PRIORITY: i32 = -100;

/// Default priority of rules with an output name starting with `.`.
pub const DOT_RULE_PRIORITY: i32 = 2;

/// Soft limit for a single batched `rm` line in the clean rule.
pub const CLEAN_LINE_MAX: usize = 120;

/// A progress echo is interleaved after this many clean batches.
pub const CLEAN_ECHO_EVERY: usize = 100;

/// Soft limit for a Makefile target line before `\` continuations kick in.
pub const MAKEFILE_LINE_MAX: usize = 140;
