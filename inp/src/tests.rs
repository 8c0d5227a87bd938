use crate::prelude::*;

/// Runs a deck source through the whole front half: normalization,
/// block splitting and model building.
fn model_of(src: &str) -> Result<Model, DeckError> {
  return model_with(src, &BuildOptions::default());
}

/// Same as `model_of` with explicit options.
fn model_with(src: &str, opts: &BuildOptions) -> Result<Model, DeckError> {
  let lines: Vec<DeckLine> = src
    .lines()
    .enumerate()
    .filter(|(_, l)| !l.trim().is_empty() && !l.trim_start().starts_with("**"))
    .map(|(i, l)| DeckLine { text: l.trim_end().to_string(), line: i + 1 })
    .collect();
  let lines = preprocess(lines)?;
  let blocks = split_blocks(&lines);
  return build_model(&blocks, opts);
}

/// A small but complete deck most tests start from.
const SMALL_DECK: &str = "\
*HEADING
one brick on a spring
*NODE
1, 0.0, 0.0, 0.0
2, 1.0, 0.0, 0.0
3, 1.0, 1.0, 0.0
4, 0.0, 1.0, 0.0
5, 0.0, 0.0, 1.0
6, 1.0, 0.0, 1.0
7, 1.0, 1.0, 1.0
8, 0.0, 1.0, 1.0
*ELEMENT, TYPE=C3D8, ELSET=CUBE
1, 1, 2, 3, 4, 5, 6, 7, 8
*NSET, NSET=BASE
1, 2, 3, 4
*MATERIAL, NAME=STEEL
*ELASTIC
210000.0, 0.3
*DENSITY
7.8e-9
*SOLID SECTION, ELSET=CUBE, MATERIAL=STEEL
*BOUNDARY
BASE, ENCASTRE
";

#[test]
fn small_deck_builds() {
  let model = model_of(SMALL_DECK).unwrap();
  assert_eq!(model.title.as_deref(), Some("one brick on a spring"));
  assert_eq!(model.nodes.len(), 8);
  assert_eq!(model.elements.len(), 1);
  assert_eq!(model.elements[0].topology, Topology::Hexa8);
  assert_eq!(model.max_element_id, 1);
  assert_eq!(model.materials[0].params.young, Some(210000.0));
  assert_eq!(model.sections.len(), 1);
  assert_eq!(model.boundaries[0].dofs, [true; 6]);
}

#[test]
fn sets_resolve_through_references() {
  let src = "\
*NSET, NSET=A
1, 2
*NSET, NSET=B
A, 3
*NSET, NSET=C
B, C
";
  let model = model_of(src).unwrap();
  assert_eq!(model.nsets.get("B").unwrap().ids(), vec![1, 2, 3]);
  // C references itself; the self-reference acts as a leaf
  assert_eq!(model.nsets.get("C").unwrap().ids(), vec![1, 2, 3]);
  for set in model.nsets.iter() {
    assert!(set.items.iter().all(|i| matches!(i, SetItem::Id(_))));
  }
}

#[test]
fn generated_ranges_reach_the_model() {
  let src = "\
*NSET, NSET=SPAN, GENERATE
2, 10, 4
";
  let model = model_of(src).unwrap();
  assert_eq!(model.nsets.get("SPAN").unwrap().ids(), vec![2, 6, 10]);
}

#[test]
fn orphan_elements_rejoin_real_sets() {
  let src = "\
*NODE
1, 0.0, 0.0, 0.0
2, 1.0, 0.0, 0.0
3, 1.0, 1.0, 0.0
4, 0.0, 1.0, 0.0
*ELEMENT, TYPE=S4
1, 1, 2, 3, 4
*ELSET, ELSET=SKIN
1
";
  let model = model_of(src).unwrap();
  assert_eq!(model.elements[0].set, "SKIN");
  assert!(model.elsets.get("__ORPHAN_1").is_none());
}

#[test]
fn orphans_without_a_home_stay_put() {
  let src = "\
*NODE
1, 0.0, 0.0, 0.0
2, 1.0, 0.0, 0.0
3, 1.0, 1.0, 0.0
4, 0.0, 1.0, 0.0
*ELEMENT, TYPE=S4
1, 1, 2, 3, 4
";
  let model = model_of(src).unwrap();
  assert_eq!(model.elements[0].set, "__ORPHAN_1");
  assert!(model.elsets.get("__ORPHAN_1").is_some());
}

#[test]
fn unknown_topology_is_fatal_by_default() {
  let src = "*ELEMENT, TYPE=B31, ELSET=BEAMS\n1, 1, 2\n";
  let err = model_of(src).unwrap_err();
  assert!(matches!(err, DeckError::UnsupportedTopology { .. }));
  // unless the operator elected to drop the block
  let opts = BuildOptions { drop_unsupported: true };
  let model = model_with(src, &opts).unwrap();
  assert!(model.elements.is_empty());
}

#[test]
fn short_element_lines_are_rejected() {
  let src = "*ELEMENT, TYPE=C3D4, ELSET=T\n1, 1, 2, 3\n";
  let err = model_of(src).unwrap_err();
  assert!(matches!(
    err,
    DeckError::WrongNodeCount { element: 1, expected: 4, got: 3 }
  ));
}

#[test]
fn boundary_range_sets_exact_dofs() {
  let src = "\
*NSET, NSET=N1
1, 2, 3
*BOUNDARY
N1, 1, 3
";
  let model = model_of(src).unwrap();
  let b = &model.boundaries[0];
  assert_eq!(b.dofs, [true, true, true, false, false, false]);
  assert_eq!(b.kind, BoundaryKind::Fix);
}

#[test]
fn boundary_op_new_clears_prior_entries() {
  let src = "\
*NSET, NSET=LID
9
*BOUNDARY
LID, 1, 2
*BOUNDARY, OP=NEW
LID, 3
";
  let model = model_of(src).unwrap();
  assert_eq!(model.boundaries.len(), 1);
  assert_eq!(model.boundaries[0].dofs, [false, false, true, false, false, false]);
}

#[test]
fn velocity_boundary_keeps_its_kind() {
  let src = "\
*AMPLITUDE, NAME=RAMP
0.0, 0.0, 1.0, 1.0
*BOUNDARY, TYPE=VELOCITY, AMPLITUDE=RAMP
7, 1, 1, 5.0
";
  let model = model_of(src).unwrap();
  let b = &model.boundaries[0];
  assert_eq!(b.kind, BoundaryKind::Velocity);
  assert_eq!(b.magnitude, 5.0);
  assert_eq!(b.amplitude.as_deref(), Some("RAMP"));
  assert_eq!(model.amplitudes[0].pairs, vec![(0.0, 0.0), (1.0, 1.0)]);
}

#[test]
fn contacts_keep_source_scan_order() {
  let src = "\
*SURFACE, NAME=TOP
*SURFACE, NAME=BOT
*CONTACT
*TIE, NAME=GLUE
TOP, BOT
*CONTACT PAIR, INTERACTION=FRIC
TOP, BOT
";
  let model = model_of(src).unwrap();
  assert!(matches!(model.contacts[0], ContactDef::General { .. }));
  assert!(matches!(model.contacts[1], ContactDef::Tie { .. }));
  assert!(matches!(model.contacts[2], ContactDef::Pair { .. }));
}

#[test]
fn assemblies_abort() {
  let err = model_of("*ASSEMBLY\n").unwrap_err();
  assert!(matches!(err, DeckError::UnsupportedStructure(_)));
}

#[test]
fn models_round_trip_through_json() {
  let model = model_of(SMALL_DECK).unwrap();
  let json = serde_json::to_string(&model).unwrap();
  let back: Model = serde_json::from_str(&json).unwrap();
  assert_eq!(back.nodes.len(), model.nodes.len());
  assert_eq!(back.elements, model.elements);
  assert_eq!(back.title, model.title);
}

#[test]
fn systems_tag_their_nodes() {
  let src = "\
*NODE
1, 0.0, 0.0, 0.0
*SYSTEM
10.0, 0.0, 0.0, 11.0, 0.0, 0.0
10.0, 1.0, 0.0
*NODE
2, 0.0, 0.0, 0.0
*SYSTEM
*NODE
3, 0.0, 0.0, 0.0
";
  let model = model_of(src).unwrap();
  assert_eq!(model.nodes[0].system, None);
  assert_eq!(model.nodes[1].system, Some(1));
  assert_eq!(model.nodes[2].system, None);
  assert_eq!(model.systems.len(), 1);
}
