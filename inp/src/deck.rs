//! This module groups normalized deck lines into keyword blocks: one
//! keyword line plus its data lines, terminated by the next keyword line.

use serde::{Deserialize, Serialize};

use crate::lines::DeckLine;
use crate::util::canon_keyword;

/// One `KEY=VALUE` or bare parameter on a keyword line.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Param {
  /// The canonical (upper-case) key.
  pub key: String,
  /// The value, verbatim, if the parameter had one.
  pub value: Option<String>,
}

/// A keyword block: canonical keyword, parameters and data lines.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Block {
  /// The canonical keyword, upper-case, inner whitespace collapsed.
  pub keyword: String,
  /// The parameters from the keyword line.
  pub params: Vec<Param>,
  /// The data lines, continuations already joined.
  pub data: Vec<String>,
  /// The line the keyword appeared on.
  pub line: usize,
}

impl Block {
  /// Fetches a parameter value by canonical key.
  pub fn get(&self, key: &str) -> Option<&str> {
    return self
      .params
      .iter()
      .find(|p| p.key == key)
      .and_then(|p| p.value.as_deref());
  }

  /// Checks a bare or valued parameter is present.
  pub fn has(&self, key: &str) -> bool {
    return self.params.iter().any(|p| p.key == key);
  }
}

/// Breaks a keyword line into its canonical keyword and parameter list.
/// Keys are canonicalized; values keep their case (they are matched
/// case-insensitively where it matters).
pub(crate) fn parse_keyword_line(text: &str) -> (String, Vec<(String, Option<String>)>) {
  let body = text.trim_start().trim_start_matches('*');
  let mut parts = body.split(',');
  let keyword = canon_keyword(parts.next().unwrap_or(""));
  let params = parts
    .filter(|p| !p.trim().is_empty())
    .map(|p| match p.split_once('=') {
      Some((k, v)) => (canon_keyword(k), Some(v.trim().to_string())),
      None => (canon_keyword(p), None),
    })
    .collect();
  return (keyword, params);
}

/// Groups deck lines into blocks. Data lines ending in a comma continue on
/// the next line; the pieces are joined before the block sees them.
pub fn split_blocks(lines: &[DeckLine]) -> Vec<Block> {
  let mut blocks: Vec<Block> = Vec::new();
  for dl in lines {
    let trimmed = dl.text.trim_start();
    if trimmed.starts_with('*') {
      let (keyword, raw_params) = parse_keyword_line(trimmed);
      let params = raw_params
        .into_iter()
        .map(|(key, value)| Param { key, value })
        .collect();
      blocks.push(Block { keyword, params, data: Vec::new(), line: dl.line });
      continue;
    }
    if let Some(block) = blocks.last_mut() {
      let continued = block
        .data
        .last()
        .is_some_and(|prev| prev.trim_end().ends_with(','));
      if continued {
        let prev = block.data.last_mut().unwrap();
        prev.push(' ');
        prev.push_str(dl.text.trim());
      } else {
        block.data.push(dl.text.trim().to_string());
      }
    }
    // data before any keyword line is dropped on the floor
  }
  return blocks;
}

#[cfg(test)]
mod tests {
  use super::*;

  /// Shorthand to build deck lines for block tests.
  fn lines_of(text: &str) -> Vec<DeckLine> {
    return text
      .lines()
      .map(|l| DeckLine { text: l.to_string(), line: 1 })
      .collect();
  }

  #[test]
  fn blocks_split_on_keywords() {
    let src = "*NODE\n1, 0.0, 0.0, 0.0\n*ELEMENT, TYPE=C3D4, ELSET=E1\n\
               1, 1, 2, 3, 4";
    let blocks = split_blocks(&lines_of(src));
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].keyword, "NODE");
    assert_eq!(blocks[1].get("TYPE"), Some("C3D4"));
    assert_eq!(blocks[1].get("ELSET"), Some("E1"));
  }

  #[test]
  fn continuations_join() {
    let src = "*ELEMENT, TYPE=C3D10, ELSET=E1\n1, 1, 2, 3, 4, 5, 6, 7,\n8, 9, 10";
    let blocks = split_blocks(&lines_of(src));
    assert_eq!(blocks[0].data.len(), 1);
    assert!(blocks[0].data[0].ends_with("8, 9, 10"));
  }

  #[test]
  fn bare_params_are_seen() {
    let src = "*NSET, NSET=FIXED, GENERATE";
    let blocks = split_blocks(&lines_of(src));
    assert!(blocks[0].has("GENERATE"));
    assert!(!blocks[0].has("INTERNAL"));
  }
}
