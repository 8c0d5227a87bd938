//! This module implements the card writer: a pure projection of the
//! finished artifacts into the two output files. Nothing in here
//! resolves anything -- by the time a deck reaches the writer every id
//! is already allocated, and fatal paths never get this far.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engine::EngineDeck;
use crate::format::{int_field, Card, RULER};

/// The version year stamped on the begin and engine cards.
pub const FORMAT_YEAR: u32 = 2022;

/// Every model-deck artifact, one bucket per output section. Buckets are
/// filled in converter pass order but written in the fixed section order
/// below, which is part of the output contract.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ModelDeck {
  /// The job stem, written on the begin card.
  pub stem: String,
  /// The deck heading, written as a comment when present.
  pub title: Option<String>,
  /// Material cards.
  pub materials: Vec<Card>,
  /// Part cards.
  pub parts: Vec<Card>,
  /// Property cards.
  pub properties: Vec<Card>,
  /// Node blocks: the default block, then one sub-block per system.
  pub nodes: Vec<Card>,
  /// Element cards, except springs (those have their own section).
  pub elements: Vec<Card>,
  /// Added-mass cards.
  pub masses: Vec<Card>,
  /// Node and element group cards.
  pub groups: Vec<Card>,
  /// Constraint cards.
  pub constraints: Vec<Card>,
  /// Imposed displacement and velocity cards.
  pub motions: Vec<Card>,
  /// Point load cards.
  pub loads: Vec<Card>,
  /// Gravity cards with their skews.
  pub gravity: Vec<Card>,
  /// Function cards.
  pub functions: Vec<Card>,
  /// Rigid bodies from parts and sets.
  pub rigid_parts: Vec<Card>,
  /// Rigid bodies from kinematic couplings.
  pub rigid_couplings: Vec<Card>,
  /// Weighted multi-point constraint cards.
  pub weighted: Vec<Card>,
  /// Spring element cards.
  pub springs: Vec<Card>,
  /// Tied interface cards.
  pub ties: Vec<Card>,
  /// Contact interface cards.
  pub contacts: Vec<Card>,
  /// Surface cards.
  pub surfaces: Vec<Card>,
  /// Time-history group cards.
  pub histories: Vec<Card>,
  /// Position transform cards for the system sub-blocks.
  pub transforms: Vec<Card>,
}

impl ModelDeck {
  /// Makes an empty deck for a job stem.
  pub fn new<S: Into<String>>(stem: S, title: Option<String>) -> Self {
    return Self { stem: stem.into(), title, ..Self::default() };
  }

  /// The fixed section order, flattened for rendering.
  fn sections(&self) -> Vec<&Vec<Card>> {
    return vec![
      &self.materials,
      &self.parts,
      &self.properties,
      &self.nodes,
      &self.elements,
      &self.masses,
      &self.groups,
      &self.constraints,
      &self.motions,
      &self.loads,
      &self.gravity,
      &self.functions,
      &self.rigid_parts,
      &self.rigid_couplings,
      &self.weighted,
      &self.springs,
      &self.ties,
      &self.contacts,
      &self.surfaces,
      &self.histories,
      &self.transforms,
    ];
  }

  /// Renders the whole model deck.
  pub fn render(&self) -> String {
    let mut out = String::new();
    out.push_str("#RADIOSS STARTER\n");
    if let Some(ref title) = self.title {
      out.push_str(&format!("# {}\n", title));
    }
    let mut begin = Card::named("/BEGIN", self.stem.clone());
    begin.push_line(format!("{}{}", int_field(FORMAT_YEAR), int_field(0)));
    begin.push_line(unit_line());
    begin.push_line(unit_line());
    begin.render(&mut out);
    for section in self.sections() {
      for card in section {
        card.render(&mut out);
      }
    }
    out.push_str(RULER);
    out.push('\n');
    out.push_str("/END\n");
    return out;
  }
}

/// The input/work unit names line of the begin card.
fn unit_line() -> String {
  return format!("{:>20}{:>20}{:>20}", "kg", "m", "s");
}

/// Writes the model and run-control decks next to the input file as
/// `<stem>_0000.rad` and `<stem>_0001.rad`.
pub fn write_decks(
  deck: &ModelDeck,
  engine: &EngineDeck,
  input: &Path,
) -> io::Result<(PathBuf, PathBuf)> {
  let dir = input.parent().unwrap_or_else(|| Path::new("."));
  let model_path = dir.join(format!("{}_0000.rad", deck.stem));
  let engine_path = dir.join(format!("{}_0001.rad", deck.stem));
  fs::write(&model_path, deck.render())?;
  fs::write(&engine_path, engine.render())?;
  return Ok((model_path, engine_path));
}
