//! This module implements the segment deriver: for every element with a
//! face table, the mapping from face label to the ordered node tuple
//! that face cuts out of the element's node list. Surfaces and ties both
//! consume this table; nothing else re-derives faces.

use std::collections::BTreeMap;

use inp::model::Model;

/// Per element id: face label to ordered node tuple, in face-table order.
pub type SegmentTable = BTreeMap<u64, Vec<(&'static str, Vec<u64>)>>;

/// Builds the segment table once, straight off the topology face tables.
pub fn build_segments(model: &Model) -> SegmentTable {
  let mut table = SegmentTable::new();
  for element in &model.elements {
    let faces = element.topology.faces();
    if faces.is_empty() {
      continue;
    }
    let segs: Vec<(&'static str, Vec<u64>)> = faces
      .iter()
      .map(|(label, ixs)| {
        (*label, ixs.iter().map(|&ix| element.nodes[ix]).collect())
      })
      .collect();
    table.insert(element.id, segs);
  }
  return table;
}

#[cfg(test)]
mod tests {
  use inp::model::Element;
  use inp::topology::Topology;

  use super::*;

  #[test]
  fn tetra_segments_follow_the_face_table() {
    let mut model = Model::new();
    model.elements.push(Element {
      id: 9,
      topology: Topology::Tetra4,
      nodes: vec![11, 12, 13, 14],
      set: "T".to_string(),
      property: 0,
    });
    let table = build_segments(&model);
    let segs = table.get(&9).unwrap();
    assert_eq!(segs.len(), 4);
    assert_eq!(segs[0], ("s1", vec![11, 12, 13]));
    assert_eq!(segs[1], ("s2", vec![11, 14, 12]));
  }

  #[test]
  fn springs_have_no_segments() {
    let mut model = Model::new();
    model.elements.push(Element {
      id: 1,
      topology: Topology::Spring,
      nodes: vec![1, 2],
      set: "S".to_string(),
      property: 0,
    });
    assert!(build_segments(&model).is_empty());
  }
}
