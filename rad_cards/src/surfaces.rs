//! This module implements the surface materializer: element surfaces
//! expand through the segment table into segment cards, node surfaces
//! back-reference their node set's group, and an empty-bodied surface
//! becomes the wildcard exterior listing every part.

use std::collections::BTreeMap;

use inp::model::{Element, Model, SurfaceKind};
use inp::util::{name_key, parse_id};
use itertools::Itertools;

use crate::context::Context;
use crate::format::{id_lines, int_field, Card};
use crate::groups::GroupIndex;
use crate::parts::PartTable;
use crate::segments::SegmentTable;
use crate::writer::ModelDeck;

/// Name given to the exterior surface when general contact has to
/// synthesize one.
const EXTERIOR_NAME: &str = "ALL_EXTERIOR";

/// What later passes need to know about one materialized surface.
#[derive(Clone, Debug)]
pub struct SurfInfo {
  /// The surface id, from the group space.
  pub id: u32,
  /// Every node the surface touches, sorted and deduplicated.
  pub nodes: Vec<u64>,
  /// The derived node group, once something asked for it.
  pub group: Option<u32>,
}

/// The materialized surfaces, keyed case-insensitively by name.
#[derive(Clone, Debug, Default)]
pub struct SurfaceTable {
  /// Case-folded surface name to its info.
  map: BTreeMap<String, SurfInfo>,
  /// The exterior surface id, declared or synthesized.
  exterior: Option<u32>,
}

impl SurfaceTable {
  /// Looks a surface id up by name.
  pub fn id_of(&self, name: &str) -> Option<u32> {
    return self.map.get(&name_key(name)).map(|s| s.id);
  }

  /// Returns the node group derived from a surface, materializing it on
  /// first use. `None` means the surface name itself did not resolve.
  pub fn node_group(
    &mut self,
    name: &str,
    ctx: &mut Context,
    deck: &mut ModelDeck,
  ) -> Option<u32> {
    let key = name_key(name);
    let info = self.map.get_mut(&key)?;
    if let Some(gid) = info.group {
      return Some(gid);
    }
    let gid = ctx.next_group();
    let mut card = Card::named(
      format!("/GRNOD/NODE/{}", gid),
      format!("{}_NODES", name.trim()),
    );
    card.lines = id_lines(&info.nodes);
    deck.groups.push(card);
    info.group = Some(gid);
    return Some(gid);
  }

  /// The sorted node list a surface touches.
  pub fn nodes_of(&self, name: &str) -> Option<&[u64]> {
    return self.map.get(&name_key(name)).map(|s| s.nodes.as_slice());
  }

  /// Returns the exterior surface id, synthesizing the part-listing card
  /// when no empty-bodied surface declared one.
  pub fn exterior_id(
    &mut self,
    model: &Model,
    parts: &PartTable,
    ctx: &mut Context,
    deck: &mut ModelDeck,
  ) -> u32 {
    if let Some(id) = self.exterior {
      return id;
    }
    let id = push_exterior(EXTERIOR_NAME, model, parts, ctx, deck, &mut self.map);
    self.exterior = Some(id);
    return id;
  }
}

/// Emits the part-listing exterior surface card and indexes it.
fn push_exterior(
  name: &str,
  model: &Model,
  parts: &PartTable,
  ctx: &mut Context,
  deck: &mut ModelDeck,
  map: &mut BTreeMap<String, SurfInfo>,
) -> u32 {
  let id = ctx.next_group();
  let part_ids: Vec<u32> = parts.ids.values().copied().sorted().collect();
  let mut card = Card::named(format!("/SURF/PART/EXT/{}", id), name.to_string());
  card.lines = id_lines(&part_ids);
  deck.surfaces.push(card);
  let nodes: Vec<u64> = model
    .elements
    .iter()
    .flat_map(|e| e.nodes.iter().copied())
    .sorted()
    .dedup()
    .collect();
  map.insert(name_key(name), SurfInfo { id, nodes, group: None });
  return id;
}

/// One segment data line: element id plus four node slots, zero-padded.
fn segment_line(eid: u64, nodes: &[u64]) -> String {
  let mut line = int_field(eid);
  for ix in 0..4 {
    line.push_str(&int_field(nodes.get(ix).copied().unwrap_or(0)));
  }
  return line;
}

/// Materializes every declared surface, in declaration order.
pub fn materialize_surfaces(
  model: &Model,
  ctx: &mut Context,
  deck: &mut ModelDeck,
  segments: &SegmentTable,
  parts: &PartTable,
  groups: &GroupIndex,
) -> SurfaceTable {
  let elements: BTreeMap<u64, &Element> =
    model.elements.iter().map(|e| (e.id, e)).collect();
  let mut table = SurfaceTable::default();
  for def in &model.surfaces {
    let key = name_key(&def.name);
    if def.exterior {
      let id = push_exterior(&def.name, model, parts, ctx, deck, &mut table.map);
      table.exterior.get_or_insert(id);
      continue;
    }
    if def.kind == SurfaceKind::Node {
      let id = ctx.next_group();
      let (nodes, group) = match def.nset.as_deref() {
        Some(nset) => match model.nsets.get(nset) {
          Some(set) => {
            let ids = set.ids().into_iter().sorted().dedup().collect();
            (ids, groups.set_group(nset))
          },
          None => {
            ctx.warn(format!(
              "Node surface \"{}\" references unknown set \"{}\".",
              def.name, nset
            ));
            (Vec::new(), None)
          },
        },
        None => (Vec::new(), None),
      };
      table.map.insert(key, SurfInfo { id, nodes, group });
      continue;
    }
    // element surface: expand each (reference, side) through the segments
    let id = ctx.next_group();
    let mut card = Card::named(format!("/SURF/SEG/{}", id), def.name.clone());
    let mut touched: Vec<u64> = Vec::new();
    for (reference, side) in &def.faces {
      let member_ids: Vec<u64> = match parse_id(reference) {
        Some(eid) => vec![eid],
        None => match model.elsets.get(reference) {
          Some(set) => set.ids(),
          None => {
            ctx.warn(format!(
              "Surface \"{}\" references unknown set \"{}\", entry skipped.",
              def.name, reference
            ));
            continue;
          },
        },
      };
      for eid in member_ids {
        let Some(element) = elements.get(&eid) else {
          ctx.warn(format!(
            "Surface \"{}\" references unknown element {}, entry skipped.",
            def.name, eid
          ));
          continue;
        };
        match side.as_deref() {
          Some(label) => match element.topology.face(label) {
            Some(ixs) => {
              let nodes: Vec<u64> = ixs.iter().map(|&ix| element.nodes[ix]).collect();
              touched.extend(nodes.iter().copied());
              card.push_line(segment_line(eid, &nodes));
            },
            None => {
              ctx.warn(format!(
                "Surface \"{}\": element {} has no face \"{}\", entry skipped.",
                def.name, eid, label
              ));
            },
          },
          None => {
            // no side: every face of the element goes in
            for (_, nodes) in segments.get(&eid).into_iter().flatten() {
              touched.extend(nodes.iter().copied());
              card.push_line(segment_line(eid, nodes));
            }
          },
        }
      }
    }
    deck.surfaces.push(card);
    let nodes = touched.into_iter().sorted().dedup().collect();
    table.map.insert(key, SurfInfo { id, nodes, group: None });
  }
  return table;
}
