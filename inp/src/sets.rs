//! This module implements named id sets, the closure resolver that turns
//! set-to-set references into plain id lists, and the pass that folds
//! placeholder-owned elements back into the real sets that reference them.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::model::Model;
use crate::util::name_key;

/// Name prefix of the placeholder sets the normalizer synthesizes.
pub const PLACEHOLDER_PREFIX: &str = "__ORPHAN_";

/// A member of a named set before resolution: a plain id or a reference
/// to another set by name.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, derive_more::From)]
pub enum SetItem {
  /// A plain numeric id.
  Id(u64),
  /// A reference to another set of the same kind.
  Ref(String),
}

/// A named set of element or node ids. Sets keep growing after creation:
/// later element-creation passes append members when they discover them.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NamedSet {
  /// The set name as declared.
  pub name: String,
  /// The members; purely `Id` items after resolution.
  pub items: Vec<SetItem>,
  /// Whether a history-output request references this set; referenced
  /// sets also get a time-history group downstream.
  pub is_referenced: bool,
}

impl NamedSet {
  /// Whether this is a synthesized placeholder set.
  pub fn is_placeholder(&self) -> bool {
    return self.name.starts_with(PLACEHOLDER_PREFIX);
  }

  /// Returns the numeric members. Complete only after resolution.
  pub fn ids(&self) -> Vec<u64> {
    return self
      .items
      .iter()
      .filter_map(|i| match i {
        SetItem::Id(id) => Some(*id),
        SetItem::Ref(_) => None,
      })
      .collect();
  }
}

/// A declaration-ordered table of named sets with case-insensitive lookup.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SetTable {
  /// The sets, in declaration order.
  sets: Vec<NamedSet>,
  /// Case-folded name to position in `sets`.
  index: BTreeMap<String, usize>,
}

impl SetTable {
  /// Makes an empty table.
  pub fn new() -> Self {
    return Self::default();
  }

  /// Appends items to a set, creating it on first sight.
  pub fn add_items(&mut self, name: &str, items: Vec<SetItem>) {
    let key = name_key(name);
    if let Some(&ix) = self.index.get(&key) {
      self.sets[ix].items.extend(items);
      return;
    }
    self.index.insert(key, self.sets.len());
    self.sets.push(NamedSet {
      name: name.trim().to_string(),
      items,
      is_referenced: false,
    });
  }

  /// Looks a set up by name, case-insensitively.
  pub fn get(&self, name: &str) -> Option<&NamedSet> {
    return self.index.get(&name_key(name)).map(|&ix| &self.sets[ix]);
  }

  /// Flags a set as referenced by a history-output request.
  pub fn mark_referenced(&mut self, name: &str) {
    if let Some(&ix) = self.index.get(&name_key(name)) {
      self.sets[ix].is_referenced = true;
    } else {
      warn!("History output references unknown set \"{}\".", name);
    }
  }

  /// Iterates the sets in declaration order.
  pub fn iter(&self) -> impl Iterator<Item = &NamedSet> {
    return self.sets.iter();
  }

  /// The number of sets in the table.
  pub fn len(&self) -> usize {
    return self.sets.len();
  }

  /// Whether the table has no sets.
  pub fn is_empty(&self) -> bool {
    return self.sets.is_empty();
  }

  /// Resolves every set to its purely numeric closure. Self and cyclic
  /// references act as leaves; references that never reach numeric
  /// content are dropped with a warning.
  pub fn resolve(&mut self) {
    let mut memo: BTreeMap<String, Vec<u64>> = BTreeMap::new();
    let keys: Vec<String> = self.index.keys().cloned().collect();
    for key in &keys {
      let mut visiting: BTreeSet<String> = BTreeSet::new();
      self.closure_of(key, &mut visiting, &mut memo);
    }
    for set in self.sets.iter_mut() {
      let ids = memo.remove(&name_key(&set.name)).unwrap_or_default();
      set.items = ids.into_iter().map(SetItem::Id).collect();
    }
  }

  /// Computes one set's numeric closure, memoized.
  fn closure_of(
    &self,
    key: &str,
    visiting: &mut BTreeSet<String>,
    memo: &mut BTreeMap<String, Vec<u64>>,
  ) -> Vec<u64> {
    if let Some(hit) = memo.get(key) {
      return hit.clone();
    }
    if visiting.contains(key) {
      // a set reaching itself acts as a leaf
      debug!("Set \"{}\" reaches itself, treating as a leaf.", key);
      return Vec::new();
    }
    let Some(&ix) = self.index.get(key) else {
      return Vec::new();
    };
    visiting.insert(key.to_string());
    let mut out: Vec<u64> = Vec::new();
    for item in &self.sets[ix].items {
      match item {
        SetItem::Id(id) => out.push(*id),
        SetItem::Ref(name) => {
          let sub = self.closure_of(&name_key(name), visiting, memo);
          if sub.is_empty() && !self.index.contains_key(&name_key(name)) {
            warn!(
              "Reference \"{}\" in set \"{}\" has no numeric content, dropped.",
              name, key
            );
          }
          out.extend(sub);
        },
      }
    }
    visiting.remove(key);
    memo.insert(key.to_string(), out.clone());
    return out;
  }
}

/// Re-associates placeholder-owned elements with the first real set whose
/// resolved members contain them, then discards placeholder sets whose
/// members were all redistributed. Applies to ordinary and rigid element
/// kinds alike, since both live in the same element-set table.
pub fn reconcile_placeholders(model: &mut Model) {
  // resolved member lists of the real sets, in declaration order
  let real: Vec<(String, BTreeSet<u64>)> = model
    .elsets
    .iter()
    .filter(|s| !s.is_placeholder())
    .map(|s| (s.name.clone(), s.ids().into_iter().collect()))
    .collect();
  let mut moved: BTreeSet<u64> = BTreeSet::new();
  for element in model.elements.iter_mut() {
    if !element.set.starts_with(PLACEHOLDER_PREFIX) {
      continue;
    }
    if let Some((name, _)) = real.iter().find(|(_, ids)| ids.contains(&element.id)) {
      debug!("Element {} re-associated with set \"{}\".", element.id, name);
      element.set = name.clone();
      moved.insert(element.id);
    }
  }
  model.elsets.retain_sets(|s| {
    if !s.is_placeholder() {
      return true;
    }
    let emptied = s.ids().iter().all(|id| moved.contains(id));
    if emptied {
      debug!("Placeholder set \"{}\" fully redistributed, dropped.", s.name);
    }
    return !emptied;
  });
}

impl SetTable {
  /// Keeps only the sets the predicate accepts, rebuilding the index.
  pub fn retain_sets<F: FnMut(&NamedSet) -> bool>(&mut self, mut keep: F) {
    self.sets.retain(|s| keep(s));
    self.index = self
      .sets
      .iter()
      .enumerate()
      .map(|(ix, s)| (name_key(&s.name), ix))
      .collect();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  /// Builds a table from (name, items) pairs.
  fn table(defs: &[(&str, Vec<SetItem>)]) -> SetTable {
    let mut t = SetTable::new();
    for (name, items) in defs {
      t.add_items(name, items.clone());
    }
    return t;
  }

  #[test]
  fn closure_is_purely_numeric() {
    let mut t = table(&[
      ("A", vec![SetItem::Id(1), SetItem::Ref("B".into())]),
      ("B", vec![SetItem::Id(2), SetItem::Id(3)]),
    ]);
    t.resolve();
    for s in t.iter() {
      assert!(s.items.iter().all(|i| matches!(i, SetItem::Id(_))));
    }
    assert_eq!(t.get("a").unwrap().ids(), vec![1, 2, 3]);
  }

  #[test]
  fn self_reference_is_a_leaf() {
    let mut t = table(&[("LOOP", vec![SetItem::Id(7), SetItem::Ref("LOOP".into())])]);
    t.resolve();
    assert_eq!(t.get("LOOP").unwrap().ids(), vec![7]);
  }

  #[test]
  fn cycles_terminate() {
    let mut t = table(&[
      ("A", vec![SetItem::Id(1), SetItem::Ref("B".into())]),
      ("B", vec![SetItem::Id(2), SetItem::Ref("A".into())]),
    ]);
    t.resolve();
    assert_eq!(t.get("A").unwrap().ids(), vec![1, 2]);
  }

  #[test]
  fn dangling_refs_drop() {
    let mut t = table(&[("A", vec![SetItem::Id(4), SetItem::Ref("GONE".into())])]);
    t.resolve();
    assert_eq!(t.get("A").unwrap().ids(), vec![4]);
  }

  #[test]
  fn appending_after_creation_grows() {
    let mut t = table(&[("A", vec![SetItem::Id(1)])]);
    t.add_items("a", vec![SetItem::Id(2)]);
    assert_eq!(t.len(), 1);
    assert_eq!(t.get("A").unwrap().ids(), vec![1, 2]);
  }
}
