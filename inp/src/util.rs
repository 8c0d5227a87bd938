//! This module implements small parsing helpers shared by the normalizer
//! and the model builder.

/// Splits a comma-separated data line into trimmed fields, dropping a
/// trailing empty field left by a dangling comma.
pub fn split_fields(line: &str) -> Vec<&str> {
  let mut fields: Vec<&str> = line.split(',').map(str::trim).collect();
  if fields.last() == Some(&"") {
    fields.pop();
  }
  return fields;
}

/// Parses an id field. Lenient about surrounding whitespace.
pub fn parse_id(s: &str) -> Option<u64> {
  return s.trim().parse::<u64>().ok();
}

/// Parses a float field. Empty fields read as zero, which is what the
/// dialect means by them.
pub fn parse_float(s: &str) -> Option<f64> {
  let t = s.trim();
  if t.is_empty() {
    return Some(0.0);
  }
  return t.parse::<f64>().ok();
}

/// Canonicalizes a keyword: uppercase, inner whitespace runs collapsed to
/// one space.
pub fn canon_keyword(s: &str) -> String {
  return s
    .trim()
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
    .to_uppercase();
}

/// Uppercases a name for case-insensitive table keys.
pub fn name_key(s: &str) -> String {
  return s.trim().to_uppercase();
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fields_drop_dangling_comma() {
    assert_eq!(split_fields("1, 2, 3,"), vec!["1", "2", "3"]);
    assert_eq!(split_fields("a,,b"), vec!["a", "", "b"]);
  }

  #[test]
  fn floats_empty_is_zero() {
    assert_eq!(parse_float("  "), Some(0.0));
    assert_eq!(parse_float("2.5e3"), Some(2500.0));
    assert_eq!(parse_float("x"), None);
  }

  #[test]
  fn keywords_canonicalize() {
    assert_eq!(canon_keyword("Solid   Section"), "SOLID SECTION");
    assert_eq!(canon_keyword(" nset "), "NSET");
  }
}
