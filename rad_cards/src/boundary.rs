//! This module implements the boundary, load and function converter:
//! amplitudes become numbered functions, direction lists become
//! constraint or imposed-motion cards, point loads become their own
//! cards, and gravity builds a skew basis to act against.

use std::collections::BTreeMap;

use inp::model::{BoundaryKind, Model};
use inp::util::name_key;
use itertools::Itertools;
use nalgebra::Vector3;

use crate::context::Context;
use crate::format::{float_field, id_lines, int_field, str_field, Card};
use crate::groups::GroupIndex;
use crate::writer::ModelDeck;

/// Direction labels per degree of freedom, 1 through 6.
const DIR_LABELS: [&str; 6] = ["X", "Y", "Z", "XX", "YY", "ZZ"];

/// The end of time, as far as the constant function is concerned.
const FOREVER: f64 = 1.0e30;

/// How parallel the gravity direction must be to the preferred secondary
/// axis before the fallback axis is used instead.
const PARALLEL_LIMIT: f64 = 0.999;

/// Function ids handed out to amplitudes, plus the constant function.
struct FunctionIndex {
  /// The synthetic constant function id; always allocated first.
  constant: u32,
  /// Case-folded amplitude name to function id.
  by_name: BTreeMap<String, u32>,
}

impl FunctionIndex {
  /// Resolves an optional amplitude reference, falling back to the
  /// constant function.
  fn resolve(&self, amplitude: &Option<String>, ctx: &mut Context) -> u32 {
    let Some(name) = amplitude else {
      return self.constant;
    };
    return match self.by_name.get(&name_key(name)) {
      Some(&id) => id,
      None => {
        ctx.warn(format!(
          "Amplitude \"{}\" is not defined, using the constant function.",
          name
        ));
        self.constant
      },
    };
  }
}

/// Emits the function cards: the constant one first, then one per
/// amplitude, pairs preserved as given.
fn convert_functions(
  model: &Model,
  ctx: &mut Context,
  deck: &mut ModelDeck,
) -> FunctionIndex {
  let constant = ctx.next_function();
  let mut card = Card::named(format!("/FUNCT/{}", constant), "CONSTANT");
  card.push_line(format!("{}{}", float_field(0.0), float_field(1.0)));
  card.push_line(format!("{}{}", float_field(FOREVER), float_field(1.0)));
  deck.functions.push(card);
  let mut by_name: BTreeMap<String, u32> = BTreeMap::new();
  for amplitude in &model.amplitudes {
    let id = ctx.next_function();
    let mut card = Card::named(format!("/FUNCT/{}", id), amplitude.name.clone());
    for (x, y) in &amplitude.pairs {
      card.push_line(format!("{}{}", float_field(*x), float_field(*y)));
    }
    deck.functions.push(card);
    by_name.insert(name_key(&amplitude.name), id);
  }
  return FunctionIndex { constant, by_name };
}

/// Renders one three-bit direction field, e.g. "111" or "010".
fn bits(dofs: &[bool]) -> String {
  return dofs.iter().map(|&b| if b { '1' } else { '0' }).collect();
}

/// Converts boundaries, point loads, gravity and amplitudes. Prescribed
/// motion with magnitude exactly zero degrades to a plain constraint on
/// its directions, and no motion card is written for it.
pub fn convert_boundary(
  model: &Model,
  ctx: &mut Context,
  deck: &mut ModelDeck,
  groups: &mut GroupIndex,
) {
  let functions = convert_functions(model, ctx, deck);
  let mut bcs_count: u32 = 0;
  let mut motion_count: u32 = 0;
  for entry in &model.boundaries {
    let gid = groups.resolve_entity(&entry.entity, ctx, deck);
    let constraint = entry.kind == BoundaryKind::Fix || entry.magnitude == 0.0;
    if constraint {
      bcs_count += 1;
      let mut card = Card::named(format!("/BCS/{}", bcs_count), entry.entity.clone());
      card.push_line(format!(
        "{}{}{}{}",
        str_field(&bits(&entry.dofs[..3])),
        str_field(&bits(&entry.dofs[3..])),
        int_field(0),
        int_field(gid)
      ));
      deck.constraints.push(card);
      continue;
    }
    let funct = functions.resolve(&entry.amplitude, ctx);
    let kind = match entry.kind {
      BoundaryKind::Displacement => "IMPDISP",
      BoundaryKind::Velocity => "IMPVEL",
      BoundaryKind::Fix => unreachable!("constraints were handled above"),
    };
    for (dof, label) in DIR_LABELS.iter().enumerate() {
      if !entry.dofs[dof] {
        continue;
      }
      motion_count += 1;
      let mut card = Card::named(
        format!("/{}/{}", kind, motion_count),
        entry.entity.clone(),
      );
      card.push_line(format!(
        "{}{}{}{}",
        int_field(funct),
        str_field(label),
        int_field(0),
        int_field(gid)
      ));
      card.push_line(format!(
        "{}{}{}",
        float_field(entry.magnitude),
        float_field(0.0),
        float_field(FOREVER)
      ));
      deck.motions.push(card);
    }
  }
  let mut cload_count: u32 = 0;
  for load in &model.cloads {
    let gid = groups.resolve_entity(&load.entity, ctx, deck);
    let funct = functions.resolve(&load.amplitude, ctx);
    cload_count += 1;
    let mut card = Card::named(format!("/CLOAD/{}", cload_count), load.entity.clone());
    card.push_line(format!(
      "{}{}{}{}",
      int_field(funct),
      str_field(DIR_LABELS[load.dof - 1]),
      int_field(0),
      int_field(gid)
    ));
    card.push_line(float_field(load.magnitude));
    deck.loads.push(card);
  }
  let mut grav_count: u32 = 0;
  for load in &model.gravities {
    let Some((e1, e2)) = skew_basis(&load.direction) else {
      ctx.warn(format!(
        "Gravity on set \"{}\" has a zero direction, skipped.",
        load.elset
      ));
      continue;
    };
    let gid = elset_node_group(&load.elset, model, ctx, deck);
    let sid = ctx.next_group();
    let mut skew = Card::named(format!("/SKEW/FIX/{}", sid), load.elset.clone());
    skew.push_line(point_line(&Vector3::zeros()));
    skew.push_line(point_line(&e1));
    skew.push_line(point_line(&e2));
    deck.gravity.push(skew);
    let funct = functions.resolve(&load.amplitude, ctx);
    grav_count += 1;
    let mut card = Card::named(format!("/GRAV/{}", grav_count), load.elset.clone());
    card.push_line(format!(
      "{}{}{}{}",
      int_field(funct),
      str_field("Z"),
      int_field(sid),
      int_field(gid)
    ));
    card.push_line(float_field(load.magnitude));
    deck.gravity.push(card);
  }
}

/// One fixed-column point line, three 20-column floats.
fn point_line(p: &Vector3<f64>) -> String {
  return format!("{}{}{}", float_field(p.x), float_field(p.y), float_field(p.z));
}

/// Builds the two in-plane axes of the gravity skew. The load direction
/// is the skew's third axis; the secondary axis is global Y, or global Z
/// when the direction is all but parallel to Y.
fn skew_basis(direction: &Vector3<f64>) -> Option<(Vector3<f64>, Vector3<f64>)> {
  let norm = direction.norm();
  if norm == 0.0 {
    return None;
  }
  let e3 = direction / norm;
  let secondary = if e3.dot(&Vector3::y()).abs() > PARALLEL_LIMIT {
    Vector3::z()
  } else {
    Vector3::y()
  };
  let e1 = secondary.cross(&e3).normalize();
  let e2 = e3.cross(&e1);
  return Some((e1, e2));
}

/// Materializes the node group gravity acts on: every node of the
/// element set's members. Unknown sets degrade to group 0.
fn elset_node_group(
  elset: &str,
  model: &Model,
  ctx: &mut Context,
  deck: &mut ModelDeck,
) -> u32 {
  let Some(set) = model.elsets.get(elset) else {
    ctx.warn(format!(
      "Gravity references unknown element set \"{}\", writing group 0.",
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

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn skew_basis_is_orthonormal() {
    let (e1, e2) = skew_basis(&Vector3::new(0.0, 0.0, -9.81)).unwrap();
    assert!((e1.norm() - 1.0).abs() < 1e-12);
    assert!((e2.norm() - 1.0).abs() < 1e-12);
    assert!(e1.dot(&e2).abs() < 1e-12);
    // the third axis recovers the load direction
    let e3 = e1.cross(&e2);
    assert!((e3 - Vector3::new(0.0, 0.0, -1.0)).norm() < 1e-12);
  }

  #[test]
  fn parallel_direction_falls_back_to_z() {
    let (e1, e2) = skew_basis(&Vector3::new(0.0, -1.0, 0.0)).unwrap();
    let e3 = e1.cross(&e2);
    assert!((e3 - Vector3::new(0.0, -1.0, 0.0)).norm() < 1e-12);
    assert!(e1.dot(&e2).abs() < 1e-12);
  }

  #[test]
  fn zero_direction_is_rejected() {
    assert!(skew_basis(&Vector3::zeros()).is_none());
  }
}
