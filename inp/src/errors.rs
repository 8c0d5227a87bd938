//! Contains the error types raised while reading decks and building models.

use std::error::Error;
use std::fmt::Display;

/// Errors raised while normalizing a deck or building a model from it.
///
/// Resolution-category problems (missing properties, dangling references)
/// are not errors -- they degrade to warnings and placeholder ids further
/// down the pipeline. Everything in here aborts the conversion before any
/// output is written.
#[derive(Debug)]
pub enum DeckError {
  /// An element block declared a topology with no table entry.
  UnsupportedTopology {
    /// The topology keyword as it appeared in the deck.
    keyword: String,
    /// The line the element block started on.
    line: usize,
  },
  /// A generate-style range did not parse to 2 or 3 integers.
  MalformedRangeSpec {
    /// The line the range appeared on.
    line: usize,
    /// The offending range text.
    text: String,
  },
  /// A data field that had to be numeric was not.
  BadNumber {
    /// The line the field appeared on.
    line: usize,
    /// The offending field text.
    text: String,
  },
  /// An element carried the wrong number of nodes for its topology.
  WrongNodeCount {
    /// The element id.
    element: u64,
    /// The node count the topology declares.
    expected: usize,
    /// The node count the data line carried.
    got: usize,
  },
  /// The deck uses a structure the converter does not flatten.
  UnsupportedStructure(String),
  /// An underlying I/O error.
  Io(std::io::Error),
}

impl From<std::io::Error> for DeckError {
  fn from(e: std::io::Error) -> Self {
    return Self::Io(e);
  }
}

impl Display for DeckError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return match self {
      Self::UnsupportedTopology { keyword, line } => {
        write!(f, "unsupported element topology \"{}\" (line {})", keyword, line)
      },
      Self::MalformedRangeSpec { line, text } => {
        write!(f, "malformed range \"{}\" (line {})", text, line)
      },
      Self::BadNumber { line, text } => {
        write!(f, "bad numeric field \"{}\" (line {})", text, line)
      },
      Self::WrongNodeCount { element, expected, got } => {
        write!(
          f,
          "element {} has {} nodes, its topology takes {}",
          element, got, expected
        )
      },
      Self::UnsupportedStructure(s) => {
        write!(f, "unsupported deck structure: {}", s)
      },
      Self::Io(e) => e.fmt(f)
    };
  }
}

impl Error for DeckError {}
