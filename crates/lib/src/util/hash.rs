//! Content hashing for rule markers and anonymous outputs.
//!
//! MD5 is used as a content fingerprint, never for security; the 32 hex
//! characters are what the on-disk marker layout is shaped around.

use md5::{Digest, Md5};

/// Lowercase hex MD5 of `data`.
pub fn md5_hex(data: &str) -> String {
  let mut hasher = Md5::new();
  hasher.update(data.as_bytes());
  format!("{:x}", hasher.finalize())
}
