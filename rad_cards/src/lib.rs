//! This library implements the back half of the deck converter: it turns
//! a parsed keyword-deck model into fixed-column solver cards -- a model
//! deck and a run-control deck -- with deterministic, byte-reproducible
//! output.
//!
//! Converters run in a fixed order and thread one mutable context through
//! every call; the order is part of the contract, because it decides how
//! the shared id spaces are handed out.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]
#![allow(clippy::needless_return)]

pub mod boundary;
pub mod context;
pub mod convert;
pub mod elements;
pub mod engine;
pub mod format;
pub mod groups;
pub mod interfaces;
pub mod materials;
pub mod nodes;
pub mod parts;
pub mod rigid;
pub mod segments;
pub mod surfaces;
pub mod writer;

/// Re-exports the types most users of this crate want in scope.
pub mod prelude {
  pub use crate::context::Context;
  pub use crate::convert::{convert, Conversion};
  pub use crate::engine::EngineDeck;
  pub use crate::format::{float_field, fmt_sig, int_field, str_field, Card, RULER};
  pub use crate::writer::{write_decks, ModelDeck};
}

#[cfg(test)]
mod tests;
