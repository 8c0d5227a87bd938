//! This module implements the property/part resolver: every non-mass
//! section becomes one part and one property card sharing an id, and
//! every element gets its owning part id stamped on it -- or 0 plus the
//! incomplete flag when nothing binds its set.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use inp::model::{Model, SectionKind};
use inp::topology::Topology;
use inp::util::name_key;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::format::{float_field, int_field, Card};
use crate::writer::ModelDeck;

/// Shell property default integration point count.
const SHELL_POINTS: u32 = 5;

/// What the part resolver hands the later passes.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PartTable {
  /// Case-folded element set name to shared part/property id.
  pub ids: BTreeMap<String, u32>,
  /// Case-folded element set name to nodal mass value, for mass sections
  /// (they make added-mass cards, not parts).
  pub masses: BTreeMap<String, f64>,
}

/// Resolves sections into parts and properties and stamps the resolved
/// property id on every element. Elements of rigid sets keep id 0
/// quietly; anything else unbound keeps id 0 and flips the incomplete
/// flag, which the caller reports as a partial success.
pub fn resolve_parts(
  model: &mut Model,
  ctx: &mut Context,
  deck: &mut ModelDeck,
  mat_ids: &BTreeMap<String, u32>,
) -> PartTable {
  let mut table = PartTable::default();
  let rigid_sets: BTreeSet<String> = model
    .rigid_bodies
    .iter()
    .filter_map(|r| r.elset.as_ref().map(|s| name_key(s)))
    .collect();
  let mut next_id: u32 = 0;
  for section in &model.sections {
    let key = name_key(&section.elset);
    if let SectionKind::Mass { value } = section.kind {
      table.masses.insert(key, value);
      continue;
    }
    next_id += 1;
    let mat_id = match section.material {
      Some(ref name) => match mat_ids.get(&name_key(name)) {
        Some(&id) => id,
        None => {
          ctx.warn(format!(
            "Section on set \"{}\" names unknown material \"{}\", writing 0.",
            section.elset, name
          ));
          0
        },
      },
      None => 0,
    };
    let prop = match section.kind {
      SectionKind::Shell { thickness } => {
        let mut card = Card::named(
          format!("/PROP/TYPE1/{}", next_id),
          section.elset.clone(),
        );
        card.push_line(format!("{}{}", int_field(SHELL_POINTS), float_field(thickness)));
        card
      },
      SectionKind::Solid { area } => {
        if holds_trusses(model, &key) {
          let mut card = Card::named(
            format!("/PROP/TYPE2/{}", next_id),
            section.elset.clone(),
          );
          card.push_line(float_field(area.unwrap_or(1.0)));
          card
        } else {
          let mut card = Card::named(
            format!("/PROP/TYPE14/{}", next_id),
            section.elset.clone(),
          );
          card.push_line(format!("{}{}", int_field(0), int_field(0)));
          card
        }
      },
      SectionKind::Connector => {
        // synthetic spring scaled by the stiffest material seen so far
        let mut card = Card::named(
          format!("/PROP/TYPE4/{}", next_id),
          section.elset.clone(),
        );
        card.push_line(format!(
          "{}{}",
          float_field(ctx.max_density),
          float_field(ctx.max_young)
        ));
        card
      },
      SectionKind::Mass { .. } => unreachable!("mass sections return early"),
    };
    deck.properties.push(prop);
    let mut part = Card::named(format!("/PART/{}", next_id), section.elset.clone());
    part.push_line(format!(
      "{}{}{}",
      int_field(next_id),
      int_field(mat_id),
      int_field(0)
    ));
    deck.parts.push(part);
    table.ids.insert(key, next_id);
  }
  // stamp resolved property ids on the elements
  let mut flagged: BTreeSet<String> = BTreeSet::new();
  for element in model.elements.iter_mut() {
    let key = name_key(&element.set);
    if table.masses.contains_key(&key) {
      continue;
    }
    if let Some(&id) = table.ids.get(&key) {
      element.property = id;
      continue;
    }
    if rigid_sets.contains(&key) {
      debug!(
        "Set \"{}\" is rigid-body secondary only, elements keep part 0.",
        element.set
      );
      continue;
    }
    if flagged.insert(key) {
      ctx.warn(format!(
        "No property binds set \"{}\"; its elements keep part 0.",
        element.set
      ));
    }
    ctx.incomplete = true;
  }
  return table;
}

/// Whether a solid section's set holds two-node truss topology.
fn holds_trusses(model: &Model, key: &str) -> bool {
  return model
    .elements
    .iter()
    .find(|e| name_key(&e.set) == key)
    .map(|e| e.topology == Topology::Truss)
    .unwrap_or(false);
}
