//! This module implements the first pass over a raw deck: comment
//! stripping, include splicing, generate-range expansion and placeholder
//! set names for element blocks that declared none.

use std::fs;
use std::path::Path;

use log::{debug, warn};

use crate::deck::parse_keyword_line;
use crate::errors::DeckError;
use crate::util::*;

/// How many expanded range ids go on one synthesized data line.
const IDS_PER_LINE: usize = 8;

/// One normalized deck line and the source line it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeckLine {
  /// The line text, comment-free and trimmed on the right.
  pub text: String,
  /// 1-based line number in the file that carried it.
  pub line: usize,
}

/// Include nesting depth past which a directive is kept instead of
/// followed, so an include cycle cannot recurse forever.
const MAX_INCLUDE_DEPTH: usize = 16;

/// Reads a deck file, drops comments and blank lines, and splices include
/// directives in place. A missing include file is only a warning; the
/// directive line is kept verbatim so the output still records it.
pub fn read_deck<P: AsRef<Path>>(path: P) -> Result<Vec<DeckLine>, DeckError> {
  return read_deck_depth(path.as_ref(), 0);
}

/// Depth-tracked body of `read_deck`.
fn read_deck_depth(path: &Path, depth: usize) -> Result<Vec<DeckLine>, DeckError> {
  let raw = fs::read_to_string(path)?;
  let base = path.parent().unwrap_or_else(|| Path::new("."));
  let mut out: Vec<DeckLine> = Vec::new();
  for (i, line) in raw.lines().enumerate() {
    let text = line.trim_end().to_string();
    let trimmed = text.trim_start();
    if trimmed.is_empty() || trimmed.starts_with("**") {
      continue;
    }
    if trimmed.starts_with('*') {
      let (kw, params) = parse_keyword_line(trimmed);
      if kw == "INCLUDE" {
        let target = params
          .iter()
          .find(|(k, _)| k == "INPUT")
          .and_then(|(_, v)| v.clone());
        if let Some(rel) = target {
          let inc = base.join(rel.trim());
          if depth >= MAX_INCLUDE_DEPTH {
            warn!(
              "Include nesting deeper than {}, keeping {} as a directive.",
              MAX_INCLUDE_DEPTH,
              inc.display()
            );
            out.push(DeckLine { text, line: i + 1 });
            continue;
          }
          if inc.is_file() {
            debug!("Splicing include file {}...", inc.display());
            out.extend(read_deck_depth(&inc, depth + 1)?);
          } else {
            warn!(
              "Include file {} not found, keeping the directive as-is.",
              inc.display()
            );
            out.push(DeckLine { text, line: i + 1 });
          }
          continue;
        }
        warn!("Include directive on line {} has no INPUT path.", i + 1);
      }
    }
    out.push(DeckLine { text, line: i + 1 });
  }
  return Ok(out);
}

/// What the preprocessor is doing with data lines right now.
enum DataMode {
  /// Pass data lines through untouched.
  Verbatim,
  /// Expand each data line as a generate-style range.
  Generate,
}

/// Second half of normalization: expands generate-style set ranges into
/// plain id lists and gives an owning set name to element blocks that have
/// none, so that everything downstream can assume both.
pub fn preprocess(lines: Vec<DeckLine>) -> Result<Vec<DeckLine>, DeckError> {
  let mut out: Vec<DeckLine> = Vec::with_capacity(lines.len());
  let mut mode = DataMode::Verbatim;
  let mut orphans: usize = 0;
  for dl in lines {
    let trimmed = dl.text.trim_start();
    if trimmed.starts_with('*') {
      let (kw, params) = parse_keyword_line(trimmed);
      let is_set = kw == "ELSET" || kw == "NSET";
      if is_set && params.iter().any(|(k, _)| k == "GENERATE") {
        mode = DataMode::Generate;
        let kept = params
          .into_iter()
          .filter(|(k, _)| k != "GENERATE")
          .collect::<Vec<_>>();
        out.push(DeckLine {
          text: rebuild_keyword_line(&kw, &kept),
          line: dl.line,
        });
        continue;
      }
      mode = DataMode::Verbatim;
      if kw == "ELEMENT" && !params.iter().any(|(k, _)| k == "ELSET") {
        orphans += 1;
        let mut with_set = params;
        with_set.push(("ELSET".to_string(), Some(format!("__ORPHAN_{}", orphans))));
        debug!(
          "Element block on line {} has no set, naming it __ORPHAN_{}.",
          dl.line, orphans
        );
        out.push(DeckLine {
          text: rebuild_keyword_line(&kw, &with_set),
          line: dl.line,
        });
        continue;
      }
      out.push(dl);
      continue;
    }
    match mode {
      DataMode::Verbatim => out.push(dl),
      DataMode::Generate => expand_range(&dl, &mut out)?,
    }
  }
  return Ok(out);
}

/// Expands one `start, end[, step]` range line into id-list data lines.
fn expand_range(dl: &DeckLine, out: &mut Vec<DeckLine>) -> Result<(), DeckError> {
  let fields = split_fields(dl.text.trim());
  let nums: Vec<u64> = fields.iter().filter_map(|f| parse_id(f)).collect();
  if nums.len() != fields.len() || !(nums.len() == 2 || nums.len() == 3) {
    return Err(DeckError::MalformedRangeSpec {
      line: dl.line,
      text: dl.text.trim().to_string(),
    });
  }
  let (start, end) = (nums[0], nums[1]);
  let step = if nums.len() == 3 { nums[2].max(1) } else { 1 };
  let ids: Vec<u64> = (start..=end).step_by(step as usize).collect();
  for chunk in ids.chunks(IDS_PER_LINE) {
    let text = chunk
      .iter()
      .map(u64::to_string)
      .collect::<Vec<_>>()
      .join(", ");
    out.push(DeckLine { text, line: dl.line });
  }
  return Ok(());
}

/// Puts a keyword line back together after parameter edits.
fn rebuild_keyword_line(kw: &str, params: &[(String, Option<String>)]) -> String {
  let mut text = format!("*{}", kw);
  for (k, v) in params {
    match v {
      Some(v) => text.push_str(&format!(", {}={}", k, v)),
      None => text.push_str(&format!(", {}", k)),
    }
  }
  return text;
}

#[cfg(test)]
mod tests {
  use super::*;

  /// Turns raw text into deck lines the way `read_deck` numbers them.
  fn lines_of(text: &str) -> Vec<DeckLine> {
    return text
      .lines()
      .enumerate()
      .filter(|(_, l)| !l.trim().is_empty() && !l.trim_start().starts_with("**"))
      .map(|(i, l)| DeckLine { text: l.trim_end().to_string(), line: i + 1 })
      .collect();
  }

  #[test]
  fn generate_ranges_expand() {
    let src = "*NSET, NSET=SPAN, GENERATE\n1, 7, 2\n";
    let out = preprocess(lines_of(src)).unwrap();
    assert_eq!(out[0].text, "*NSET, NSET=SPAN");
    assert_eq!(out[1].text, "1, 3, 5, 7");
  }

  #[test]
  fn generate_step_defaults_to_one() {
    let src = "*ELSET, ELSET=ROW, GENERATE\n10, 12\n";
    let out = preprocess(lines_of(src)).unwrap();
    assert_eq!(out[1].text, "10, 11, 12");
  }

  #[test]
  fn bad_ranges_are_fatal() {
    for bad in ["1", "1, 2, 3, 4", "1, two"] {
      let src = format!("*NSET, NSET=X, GENERATE\n{}\n", bad);
      let err = preprocess(lines_of(&src)).unwrap_err();
      assert!(matches!(err, DeckError::MalformedRangeSpec { .. }));
    }
  }

  #[test]
  fn orphan_elements_get_a_set() {
    let src = "*ELEMENT, TYPE=C3D8\n1, 1, 2, 3, 4, 5, 6, 7, 8\n\
               *ELEMENT, TYPE=S4\n2, 1, 2, 3, 4\n";
    let out = preprocess(lines_of(src)).unwrap();
    assert!(out[0].text.contains("ELSET=__ORPHAN_1"));
    assert!(out[2].text.contains("ELSET=__ORPHAN_2"));
  }
}
