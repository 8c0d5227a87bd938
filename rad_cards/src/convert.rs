//! This module implements the top-level conversion: every converter in
//! its fixed order, one context threaded through all of them. The order
//! is load-bearing -- it decides how the shared id spaces are handed
//! out, so two runs over the same model always produce the same bytes.

use inp::model::Model;
use log::info;

use crate::boundary;
use crate::context::Context;
use crate::elements;
use crate::engine::{self, EngineDeck};
use crate::groups;
use crate::interfaces;
use crate::materials;
use crate::nodes;
use crate::parts;
use crate::rigid;
use crate::segments;
use crate::surfaces;
use crate::writer::ModelDeck;

/// Everything a finished conversion produced.
#[derive(Clone, Debug)]
pub struct Conversion {
  /// The model deck artifacts.
  pub deck: ModelDeck,
  /// The run-control deck.
  pub engine: EngineDeck,
  /// The final context: warnings, the incomplete flag, the counters.
  pub ctx: Context,
}

/// Runs the whole conversion. Infallible by construction: everything
/// structural was vetted while the model was built, and what remains
/// degrades to warnings and placeholder ids inside the context.
pub fn convert(model: &mut Model, stem: &str) -> Conversion {
  let mut ctx = Context::new();
  let mut deck = ModelDeck::new(stem, model.title.clone());
  info!("Converting nodes and coordinate systems...");
  nodes::convert_nodes(model, &mut ctx, &mut deck);
  info!("Converting materials...");
  let mat_ids = materials::convert_materials(model, &mut ctx, &mut deck);
  info!("Resolving parts and properties...");
  let part_table = parts::resolve_parts(model, &mut ctx, &mut deck, &mat_ids);
  info!("Converting elements...");
  elements::convert_elements(model, &mut ctx, &mut deck, &part_table);
  info!("Materializing groups...");
  let mut group_index = groups::materialize_groups(model, &mut ctx, &mut deck);
  let segment_table = segments::build_segments(model);
  info!("Materializing surfaces...");
  let mut surface_table = surfaces::materialize_surfaces(
    model,
    &mut ctx,
    &mut deck,
    &segment_table,
    &part_table,
    &group_index,
  );
  info!("Converting contacts and ties...");
  interfaces::convert_contacts(model, &mut ctx, &mut deck, &part_table, &mut surface_table);
  info!("Converting boundaries, loads and functions...");
  boundary::convert_boundary(model, &mut ctx, &mut deck, &mut group_index);
  info!("Converting rigid bodies and couplings...");
  rigid::convert_rigid(model, &mut ctx, &mut deck, &mut group_index, &mut surface_table);
  info!("Deriving engine controls...");
  let engine = engine::build_engine(model, stem, &mut ctx);
  return Conversion { deck, engine, ctx };
}
