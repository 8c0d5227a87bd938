//! This module implements the contact and tie converter. All three
//! source forms draw interface ids from one shared counter in source-scan
//! order; reordering them would renumber the output, so they are handled
//! in a single walk over the contact list.

use inp::model::{ContactDef, Model, SurfaceKind};
use inp::util::name_key;
use log::debug;

use crate::context::Context;
use crate::format::{float_field, int_field, Card};
use crate::parts::PartTable;
use crate::surfaces::SurfaceTable;
use crate::writer::ModelDeck;

/// The fixed flag written on every tied interface card.
pub const TIE_FLAG: u32 = 25;

/// Suffix of the swapped card a surface-to-surface tie expands into.
const SYMMETRIC_SUFFIX: &str = "_SYM";

/// Looks friction up by interaction name, case-insensitively, 0 when
/// absent.
fn friction_of(model: &Model, interaction: &Option<String>) -> f64 {
  let Some(name) = interaction else {
    return 0.0;
  };
  return match model.frictions.get(&name_key(name)) {
    Some(&mu) => mu,
    None => {
      debug!("Interaction \"{}\" has no friction entry, using 0.", name);
      0.0
    },
  };
}

/// One general or pair contact card.
fn contact_card(id: u32, name: String, surf1: u32, surf2: u32, fric: f64) -> Card {
  let mut card = Card::named(format!("/INTER/TYPE7/{}", id), name);
  card.push_line(format!("{}{}", int_field(surf1), int_field(surf2)));
  card.push_line(float_field(fric));
  return card;
}

/// One tied interface card: secondary node group against main surface.
fn tie_card(id: u32, name: String, grnod: u32, surf: u32) -> Card {
  let mut card = Card::named(format!("/INTER/TYPE2/{}", id), name);
  card.push_line(format!(
    "{}{}{}",
    int_field(grnod),
    int_field(surf),
    int_field(TIE_FLAG)
  ));
  return card;
}

/// Converts every contact and tie, in source-scan order.
pub fn convert_contacts(
  model: &Model,
  ctx: &mut Context,
  deck: &mut ModelDeck,
  parts: &PartTable,
  surfs: &mut SurfaceTable,
) {
  for def in &model.contacts {
    match def {
      ContactDef::General { interaction } => {
        let exterior = surfs.exterior_id(model, parts, ctx, deck);
        let id = ctx.next_interface();
        let name = interaction
          .clone()
          .unwrap_or_else(|| format!("GENERAL_CONTACT_{}", id));
        let fric = friction_of(model, interaction);
        deck.contacts.push(contact_card(id, name, exterior, exterior, fric));
      },
      ContactDef::Pair { interaction, secondary, main } => {
        let (s1, s2) = (surfs.id_of(secondary), surfs.id_of(main));
        let (Some(s1), Some(s2)) = (s1, s2) else {
          ctx.warn(format!(
            "Contact pair \"{}\"/\"{}\" has an unresolvable surface, skipped.",
            secondary, main
          ));
          continue;
        };
        let id = ctx.next_interface();
        let name = interaction
          .clone()
          .unwrap_or_else(|| format!("CONTACT_PAIR_{}", id));
        let fric = friction_of(model, interaction);
        deck.contacts.push(contact_card(id, name, s1, s2, fric));
      },
      ContactDef::Tie { name, secondary, main, surface_to_surface } => {
        let sec_group = match surfs.node_group(secondary, ctx, deck) {
          Some(gid) => gid,
          None => {
            ctx.warn(format!(
              "Tie \"{}\": secondary surface \"{}\" is unknown, writing 0.",
              name, secondary
            ));
            0
          },
        };
        let main_id = match surfs.id_of(main) {
          Some(id) => id,
          None => {
            ctx.warn(format!(
              "Tie \"{}\": main surface \"{}\" is unknown, writing 0.",
              name, main
            ));
            0
          },
        };
        let id = ctx.next_interface();
        deck.ties.push(tie_card(id, name.clone(), sec_group, main_id));
        let s2s = surface_to_surface.unwrap_or_else(|| {
          // absent a declared type, two element surfaces tie symmetrically
          model
            .surface(secondary)
            .map(|d| d.kind == SurfaceKind::Element)
            .unwrap_or(false)
        });
        if s2s {
          let main_group = surfs.node_group(main, ctx, deck).unwrap_or(0);
          let sec_id = surfs.id_of(secondary).unwrap_or(0);
          let id = ctx.next_interface();
          let swapped = format!("{}{}", name, SYMMETRIC_SUFFIX);
          deck.ties.push(tie_card(id, swapped, main_group, sec_id));
        }
      },
    }
  }
}
