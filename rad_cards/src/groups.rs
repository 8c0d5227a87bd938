//! This module implements the set/group materializer: node groups from
//! node sets, per-kind element subset groups for bound element sets,
//! time-history groups for sets that history output references, and the
//! entity-to-group index the boundary and rigid-body converters lean on.

use std::collections::BTreeMap;

use inp::model::{Model, SectionKind};
use inp::topology::CardKind;
use inp::util::{name_key, parse_id};
use itertools::Itertools;

use crate::context::Context;
use crate::format::{id_lines, str_field, Card};
use crate::writer::ModelDeck;

/// The variable-selection mnemonic on every time-history card.
const TH_VARS: &str = "DEF";

/// Group ids handed out so far, plus lazily created singleton groups for
/// bare node ids named where a set name was expected.
#[derive(Clone, Debug, Default)]
pub struct GroupIndex {
  /// Case-folded node set name to group id.
  by_set: BTreeMap<String, u32>,
  /// Node id to its singleton group id.
  singles: BTreeMap<u64, u32>,
}

impl GroupIndex {
  /// Looks a node set's group up by name.
  pub fn set_group(&self, name: &str) -> Option<u32> {
    return self.by_set.get(&name_key(name)).copied();
  }

  /// Resolves a boundary/load entity -- a node set name or a bare node
  /// id -- to a group id. Bare ids get a memoized singleton group;
  /// unresolvable names get id 0 and a warning, and the caller still
  /// writes its card.
  pub fn resolve_entity(
    &mut self,
    entity: &str,
    ctx: &mut Context,
    deck: &mut ModelDeck,
  ) -> u32 {
    if let Some(gid) = self.set_group(entity) {
      return gid;
    }
    if let Some(node) = parse_id(entity) {
      if let Some(&gid) = self.singles.get(&node) {
        return gid;
      }
      let gid = ctx.next_group();
      let mut card =
        Card::named(format!("/GRNOD/NODE/{}", gid), format!("NODE_{}", node));
      card.lines = id_lines(&[node]);
      deck.groups.push(card);
      self.singles.insert(node, gid);
      return gid;
    }
    ctx.warn(format!(
      "Entity \"{}\" is neither a node set nor a node id, writing group 0.",
      entity
    ));
    return 0;
  }
}

/// Materializes all groups: one node group per node set, per-kind subset
/// groups for every section-bound element set, and a time-history group
/// for every set flagged as referenced.
pub fn materialize_groups(
  model: &Model,
  ctx: &mut Context,
  deck: &mut ModelDeck,
) -> GroupIndex {
  let mut index = GroupIndex::default();
  for nset in model.nsets.iter() {
    let gid = ctx.next_group();
    let ids = nset.ids().into_iter().sorted().dedup().collect::<Vec<_>>();
    let mut card = Card::named(format!("/GRNOD/NODE/{}", gid), nset.name.clone());
    card.lines = id_lines(&ids);
    deck.groups.push(card);
    index.by_set.insert(name_key(&nset.name), gid);
  }
  // per-kind subsets of the bound element sets
  for section in &model.sections {
    if matches!(section.kind, SectionKind::Mass { .. }) {
      continue;
    }
    let key = name_key(&section.elset);
    let mut by_kind: BTreeMap<&'static str, Vec<u64>> = BTreeMap::new();
    for element in model.elements.iter().filter(|e| name_key(&e.set) == key) {
      let bucket = match element.topology.card() {
        CardKind::Shell => "GRSHEL/SHEL",
        CardKind::Sh3n => "GRSH3N/SH3N",
        CardKind::Brick | CardKind::Tetra4 | CardKind::Tetra10 => "GRBRIC/BRIC",
        _ => continue,
      };
      by_kind.entry(bucket).or_default().push(element.id);
    }
    for (bucket, mut ids) in by_kind {
      ids.sort_unstable();
      let gid = ctx.next_group();
      let mut card =
        Card::named(format!("/{}/{}", bucket, gid), section.elset.clone());
      card.lines = id_lines(&ids);
      deck.groups.push(card);
    }
  }
  // history groups for the referenced sets
  let mut th_count: u32 = 0;
  for nset in model.nsets.iter().filter(|s| s.is_referenced) {
    th_count += 1;
    let ids = nset.ids().into_iter().sorted().dedup().collect::<Vec<_>>();
    let mut card = Card::named(format!("/TH/NODE/{}", th_count), nset.name.clone());
    card.push_line(str_field(TH_VARS));
    card.lines.extend(id_lines(&ids));
    deck.histories.push(card);
  }
  return index;
}
