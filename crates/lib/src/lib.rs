//! mklua-lib: Rule graph engine and build-artifact generators for mklua
//!
//! This crate turns a Lua rules script into a flat, standalone build
//! artifact. The pieces, leaves first:
//! - `path`: canonicalize and split path strings without touching the disk
//! - `vars`: the layered variable store (defaults, user overrides, scopes)
//! - `expand`: one-shot `$VAR`/`$(VAR)`/`$@`/`$<` substitution
//! - `rules`: the rule store, constructors, and link-alias resolution
//! - `hashmark`: per-rule content-hash markers that force reruns on
//!   command changes
//! - `bootstrap`: self-rebuild, clean, and phony housekeeping rules
//! - `emit`: Makefile, ninja, and shell-script writers
//! - `lua`: the embedded Lua runtime exposing the `mk` global
//!
//! The `Project` type in `project` aggregates the mutable state the Lua
//! layer operates on. All variable substitution is baked in at generation
//! time; the emitted artifacts contain no placeholders.

pub mod bootstrap;
pub mod consts;
pub mod emit;
pub mod error;
pub mod expand;
pub mod hashmark;
pub mod lua;
pub mod path;
pub mod project;
pub mod rules;
pub mod util;
pub mod vars;

pub use error::{Error, Result, RuleError};
pub use project::Project;
