//! This module implements the rigid-body and coupling converter. Rigid
//! bodies borrow their ids from the element space, above the mesh
//! high-water mark; distributing couplings make a weighted constraint
//! card instead of a body.

use inp::model::{CouplingKind, Model};
use inp::util::parse_id;
use itertools::Itertools;

use crate::context::Context;
use crate::format::{float_field, id_lines, int_field, Card};
use crate::groups::GroupIndex;
use crate::surfaces::SurfaceTable;
use crate::writer::ModelDeck;

/// Resolves a reference node given as an id or as a set name; a set name
/// resolves to the set's first member.
fn resolve_ref_node(reference: &str, model: &Model, ctx: &mut Context) -> u64 {
  if let Some(id) = parse_id(reference) {
    return id;
  }
  if let Some(set) = model.nsets.get(reference) {
    if let Some(first) = set.ids().first() {
      return *first;
    }
  }
  ctx.warn(format!(
    "Reference node \"{}\" resolves to nothing, writing 0.",
    reference
  ));
  return 0;
}

/// The rigid-body card proper.
fn rbody_card(id: u64, name: String, ref_node: u64, grnod: u32) -> Card {
  let mut card = Card::named(format!("/RBODY/{}", id), name);
  card.push_line(format!(
    "{}{}{}{}",
    int_field(ref_node),
    int_field(grnod),
    int_field(0),
    int_field(0)
  ));
  return card;
}

/// Materializes the secondary node group of an element-set-based body.
fn elset_group(
  elset: &str,
  model: &Model,
  ctx: &mut Context,
  deck: &mut ModelDeck,
) -> u32 {
  let Some(set) = model.elsets.get(elset) else {
    ctx.warn(format!(
      "Rigid body references unknown element set \"{}\", writing group 0.",
      elset
    ));
    return 0;
  };
  let members = set.ids();
  let nodes: Vec<u64> = model
    .elements
    .iter()
    .filter(|e| members.contains(&e.id))
    .flat_map(|e| e.nodes.iter().copied())
    .sorted()
    .dedup()
    .collect();
  let gid = ctx.next_group();
  let mut card = Card::named(format!("/GRNOD/NODE/{}", gid), elset.to_string());
  card.lines = id_lines(&nodes);
  deck.groups.push(card);
  return gid;
}

/// Converts rigid bodies and couplings. Bodies from parts and sets come
/// first, then coupling bodies, matching the id allocation contract.
pub fn convert_rigid(
  model: &Model,
  ctx: &mut Context,
  deck: &mut ModelDeck,
  groups: &mut GroupIndex,
  surfs: &mut SurfaceTable,
) {
  for def in &model.rigid_bodies {
    let ref_node = resolve_ref_node(&def.ref_node, model, ctx);
    let (name, grnod) = if let Some(ref elset) = def.elset {
      // a rigid part, or a free element set; same card either way
      (elset.clone(), elset_group(elset, model, ctx, deck))
    } else if let Some(ref nset) = def.nset {
      let gid = match groups.set_group(nset) {
        Some(gid) => gid,
        None => {
          ctx.warn(format!(
            "Rigid body references unknown node set \"{}\", writing group 0.",
            nset
          ));
          0
        },
      };
      (nset.clone(), gid)
    } else {
      ctx.warn("Rigid body names neither an element nor a node set.".to_string());
      ("RIGID_BODY".to_string(), 0)
    };
    let id = ctx.next_element();
    deck.rigid_parts.push(rbody_card(id, name, ref_node, grnod));
  }
  let mut rbe3_count: u32 = 0;
  for coupling in &model.couplings {
    let ref_node = resolve_ref_node(&coupling.ref_node, model, ctx);
    match coupling.kind {
      CouplingKind::Kinematic => {
        // all six directions coupled: a rigid body on the surface nodes
        let grnod = match surfs.node_group(&coupling.surface, ctx, deck) {
          Some(gid) => gid,
          None => {
            ctx.warn(format!(
              "Coupling \"{}\" references unknown surface \"{}\", writing 0.",
              coupling.name, coupling.surface
            ));
            0
          },
        };
        let id = ctx.next_element();
        deck
          .rigid_couplings
          .push(rbody_card(id, coupling.name.clone(), ref_node, grnod));
      },
      CouplingKind::Distributing => {
        let weights: Vec<(u64, f64)> = if coupling.weights.is_empty() {
          match surfs.nodes_of(&coupling.surface) {
            Some(nodes) => nodes.iter().map(|&n| (n, 1.0)).collect(),
            None => {
              ctx.warn(format!(
                "Coupling \"{}\" references unknown surface \"{}\", no nodes.",
                coupling.name, coupling.surface
              ));
              Vec::new()
            },
          }
        } else {
          coupling.weights.clone()
        };
        rbe3_count += 1;
        let mut card =
          Card::named(format!("/RBE3/{}", rbe3_count), coupling.name.clone());
        card.push_line(int_field(ref_node));
        for (node, weight) in weights {
          card.push_line(format!("{}{}", int_field(node), float_field(weight)));
        }
        deck.weighted.push(card);
      },
    }
  }
}
