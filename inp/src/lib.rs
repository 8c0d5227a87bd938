//! This library implements types and functions to read keyword-block
//! finite-element decks: nodes, elements, materials, sets, surfaces,
//! contact and coupling definitions, boundary conditions and loads.
//!
//! It was created as the front half of a deck-to-deck converter that feeds
//! an explicit-dynamics solver, but the code is modular -- the normalizer,
//! the set resolver and the topology tables can be used on their own.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]
#![allow(clippy::needless_return)]

pub mod build;
pub mod deck;
pub mod errors;
pub mod lines;
pub mod model;
pub mod sets;
pub mod topology;
pub mod util;

/// Re-exports the types most users of this crate want in scope.
pub mod prelude {
  pub use crate::build::{build_model, BuildOptions};
  pub use crate::deck::{split_blocks, Block, Param};
  pub use crate::errors::DeckError;
  pub use crate::lines::{preprocess, read_deck, DeckLine};
  pub use crate::model::*;
  pub use crate::sets::{reconcile_placeholders, NamedSet, SetItem, SetTable};
  pub use crate::topology::{CardKind, Topology};
}

#[cfg(test)]
mod tests;
