pub mod hash;

/// Quote a string for inclusion in a shell command line. Plain
/// path/assignment characters pass through; anything else is wrapped in
/// single quotes with embedded quotes escaped.
pub fn shell_quote(word: &str) -> String {
  let plain = !word.is_empty()
    && word
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || "_-./=+:@%,".contains(c));
  if plain {
    word.to_string()
  } else {
    format!("'{}'", word.replace('\'', "'\\''"))
  }
}
