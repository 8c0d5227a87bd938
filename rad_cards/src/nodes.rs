//! This module implements the node and coordinate-system converter.
//! Nodes under the default system go into one block; each declared
//! system gets its own named sub-block plus a position transform card
//! built from the system's three defining points.

use inp::model::Model;
use nalgebra::Vector3;

use crate::context::Context;
use crate::format::{float_field, int_field, Card};
use crate::writer::ModelDeck;

/// One fixed-column node line.
fn node_line(id: u64, coords: &Vector3<f64>) -> String {
  return format!(
    "{}{}{}{}",
    int_field(id),
    float_field(coords.x),
    float_field(coords.y),
    float_field(coords.z)
  );
}

/// One fixed-column point line, three 20-column floats.
fn point_line(p: &Vector3<f64>) -> String {
  return format!("{}{}{}", float_field(p.x), float_field(p.y), float_field(p.z));
}

/// Emits the node blocks and the transform cards. Transform ids come out
/// of the group space, so this pass has to run before anything else that
/// allocates groups.
pub fn convert_nodes(model: &Model, ctx: &mut Context, deck: &mut ModelDeck) {
  let mut default_block = Card::bare("/NODE");
  for node in model.nodes.iter().filter(|n| n.system.is_none()) {
    default_block.push_line(node_line(node.id, &node.coords));
  }
  if !default_block.lines.is_empty() {
    deck.nodes.push(default_block);
  }
  for system in &model.systems {
    let label = format!("SYSTEM_{}", system.id);
    let mut block = Card::bare("/NODE");
    for node in model.nodes.iter().filter(|n| n.system == Some(system.id)) {
      block.push_line(node_line(node.id, &node.coords));
    }
    if block.lines.is_empty() {
      continue;
    }
    deck.nodes.push(Card::named(format!("//SUBMODEL/{}", system.id), label.clone()));
    deck.nodes.push(block);
    deck.nodes.push(Card::bare("//ENDSUB"));
    let tid = ctx.next_group();
    let mut transform = Card::named(format!("/TRANSFORM/POSITION/{}", tid), label);
    transform.push_line(int_field(system.id));
    transform.push_line(point_line(&system.origin));
    transform.push_line(point_line(&system.x_point));
    transform.push_line(point_line(&system.plane_point));
    deck.transforms.push(transform);
  }
}
