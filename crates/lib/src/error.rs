//! Error types for mklua-lib.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for mklua-lib operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal diagnostics. Each is reported once at its origin; there is no
/// rollback beyond the atomic write-rename of the emitters.
#[derive(Error, Debug)]
pub enum Error {
  #[error("{path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error(transparent)]
  Rule(#[from] RuleError),

  #[error("{0}")]
  Usage(String),

  #[error("script '{script}': {message}")]
  Script { script: String, message: String },
}

impl Error {
  pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    Error::Io {
      path: path.into(),
      source,
    }
  }

  pub fn usage(message: impl Into<String>) -> Self {
    Error::Usage(message.into())
  }

  pub fn script(script: impl Into<String>, message: impl std::fmt::Display) -> Self {
    Error::Script {
      script: script.into(),
      message: message.to_string(),
    }
  }
}

/// Violations of the rule-store model.
#[derive(Error, Debug)]
pub enum RuleError {
  #[error("cannot merge: outputs '{first}' and '{second}' belong to different rules")]
  CannotMerge { first: String, second: String },

  #[error("'{0}' is produced by a directory rule and cannot be redeclared as a file")]
  DirectoryCollision(String),

  #[error("'{0}' is produced by a file rule and cannot be redeclared as a directory")]
  FileCollision(String),

  #[error("no rule produces '{0}'")]
  NoSuchRule(String),

  #[error("a rule must declare at least one output")]
  NoOutputs,

  #[error("load_directory path '{0}' must be relative and stay inside the source tree")]
  EscapingDirectory(String),
}
