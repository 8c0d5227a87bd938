//! This module implements the element topology converter: per-kind card
//! blocks grouped under their part ids, the per-topology output node
//! order (including the degenerate wedge re-indexing), and the added-mass
//! cards mass sections turn into.

use std::collections::BTreeMap;

use inp::model::{Element, Model, SectionKind};
use inp::topology::{CardKind, Topology};
use inp::util::name_key;
use itertools::Itertools;

use crate::context::Context;
use crate::format::{float_field, id_lines, int_field, Card};
use crate::parts::PartTable;
use crate::writer::ModelDeck;

/// Most node slots that fit on an element's first line after its id.
const FIRST_LINE_NODES: usize = 9;

/// Formats one element data line set: id plus its output-ordered nodes,
/// wrapping onto continuation lines when the slots run out.
fn element_lines(element: &Element) -> Vec<String> {
  let order = element.topology.out_order();
  let nodes: Vec<u64> = order.iter().map(|&ix| element.nodes[ix]).collect();
  let mut lines: Vec<String> = Vec::new();
  let mut first = int_field(element.id);
  for node in nodes.iter().take(FIRST_LINE_NODES) {
    first.push_str(&int_field(*node));
  }
  lines.push(first);
  if nodes.len() > FIRST_LINE_NODES {
    lines.extend(id_lines(&nodes[FIRST_LINE_NODES..]));
  }
  return lines;
}

/// Converts every element into its card block and every mass section
/// into an added-mass card. Seeds the element id space with the mesh
/// high-water mark so later artifacts can borrow above it.
pub fn convert_elements(
  model: &Model,
  ctx: &mut Context,
  deck: &mut ModelDeck,
  parts: &PartTable,
) {
  ctx.seed_elements(model.max_element_id);
  // (part id, card kind) -> data lines, ordered by part then kind
  let mut blocks: BTreeMap<(u32, CardKind), Vec<String>> = BTreeMap::new();
  for element in &model.elements {
    let kind = element.topology.card();
    if kind == CardKind::Mass {
      continue;
    }
    blocks
      .entry((element.property, kind))
      .or_default()
      .extend(element_lines(element));
  }
  for ((part, kind), lines) in blocks {
    let mut card = Card::bare(format!("/{}/{}", kind.keyword(), part));
    card.lines = lines;
    if kind == CardKind::Spring {
      deck.springs.push(card);
    } else {
      deck.elements.push(card);
    }
  }
  // mass sections, in declaration order
  let mut admas_count: u32 = 0;
  for section in &model.sections {
    let SectionKind::Mass { value } = section.kind else {
      continue;
    };
    let key = name_key(&section.elset);
    let nodes: Vec<u64> = model
      .elements
      .iter()
      .filter(|e| e.topology == Topology::Mass && name_key(&e.set) == key)
      .flat_map(|e| e.nodes.iter().copied())
      .sorted()
      .dedup()
      .collect();
    if nodes.is_empty() {
      ctx.warn(format!(
        "Mass section on set \"{}\" matches no mass elements, skipped.",
        section.elset
      ));
      continue;
    }
    let gid = ctx.next_group();
    let mut group = Card::named(format!("/GRNOD/NODE/{}", gid), section.elset.clone());
    group.lines = id_lines(&nodes);
    deck.groups.push(group);
    admas_count += 1;
    let mut admas = Card::named(format!("/ADMAS/{}", admas_count), section.elset.clone());
    admas.push_line(format!("{}{}", int_field(gid), float_field(value)));
    deck.masses.push(admas);
  }
}
