use inp::prelude::*;

use crate::prelude::*;

/// Builds a model straight from deck source text.
fn model_of(src: &str) -> Model {
  let lines: Vec<DeckLine> = src
    .lines()
    .enumerate()
    .filter(|(_, l)| !l.trim().is_empty() && !l.trim_start().starts_with("**"))
    .map(|(i, l)| DeckLine { text: l.trim_end().to_string(), line: i + 1 })
    .collect();
  let lines = preprocess(lines).unwrap();
  let blocks = split_blocks(&lines);
  return build_model(&blocks, &BuildOptions::default()).unwrap();
}

/// Converts deck source text under a given job stem.
fn convert_src(src: &str) -> Conversion {
  let mut model = model_of(src);
  return convert(&mut model, "job");
}

/// Counts how many cards across the whole model deck open with a header
/// prefix.
fn count_headers(deck: &ModelDeck, prefix: &str) -> usize {
  return deck
    .render()
    .lines()
    .filter(|l| l.starts_with(prefix))
    .count();
}

/// An 8-node cube with a solid section, shared by several tests.
const CUBE: &str = "\
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
*MATERIAL, NAME=STEEL
*ELASTIC
210000.0, 0.3
*DENSITY
7.8e-9
*SOLID SECTION, ELSET=CUBE, MATERIAL=STEEL
";

#[test]
fn conversion_is_reproducible() {
  let a = convert_src(CUBE);
  let b = convert_src(CUBE);
  assert_eq!(a.deck.render(), b.deck.render());
  assert_eq!(a.engine.render(), b.engine.render());
}

#[test]
fn steel_gets_exactly_one_elastic_card() {
  let conv = convert_src(CUBE);
  assert_eq!(count_headers(&conv.deck, "/MAT/LAW1/"), 1);
  assert_eq!(count_headers(&conv.deck, "/MAT/PLAS_JOHNS/"), 0);
  assert_eq!(count_headers(&conv.deck, "/MAT/OGDEN/"), 0);
}

#[test]
fn cube_deck_has_its_basic_artifacts() {
  let conv = convert_src(CUBE);
  let out = conv.deck.render();
  assert!(out.contains("/PART/1"));
  assert!(out.contains("/PROP/TYPE14/1"));
  assert!(out.contains("/BRICK/1"));
  assert!(!conv.ctx.incomplete);
  // node line: id in 10 columns, coordinates in 20
  let node_line = out
    .lines()
    .find(|l| l.starts_with("         1") && l.len() == 70)
    .unwrap();
  assert!(node_line.ends_with("0.0"));
}

#[test]
fn unbound_elements_keep_part_zero_and_flag() {
  let src = "\
*NODE
1, 0.0, 0.0, 0.0
2, 1.0, 0.0, 0.0
3, 1.0, 1.0, 0.0
4, 0.0, 1.0, 0.0
*ELEMENT, TYPE=S4, ELSET=LOOSE
1, 1, 2, 3, 4
";
  let conv = convert_src(src);
  assert!(conv.ctx.incomplete);
  assert_eq!(count_headers(&conv.deck, "/SHELL/0"), 1);
}

#[test]
fn wedges_degenerate_into_brick_lines() {
  let src = "\
*NODE
1, 0.0, 0.0, 0.0
2, 1.0, 0.0, 0.0
3, 0.0, 1.0, 0.0
4, 0.0, 0.0, 1.0
5, 1.0, 0.0, 1.0
6, 0.0, 1.0, 1.0
*ELEMENT, TYPE=C3D6, ELSET=W
7, 1, 2, 3, 4, 5, 6
*MATERIAL, NAME=M
*ELASTIC
100.0, 0.3
*DENSITY
1.0
*SOLID SECTION, ELSET=W, MATERIAL=M
";
  let conv = convert_src(src);
  let out = conv.deck.render();
  let line = out
    .lines()
    .find(|l| l.trim_start().starts_with('7') && l.len() == 90)
    .unwrap();
  // node 3 and node 6 each doubled by the degenerate re-indexing
  let fields: Vec<&str> = line.split_whitespace().collect();
  assert_eq!(fields, vec!["7", "1", "2", "3", "3", "4", "5", "6", "6"]);
}

#[test]
fn surface_to_surface_tie_expands_symmetrically() {
  let src = "\
*NODE
1, 0.0, 0.0, 0.0
2, 1.0, 0.0, 0.0
3, 1.0, 1.0, 0.0
4, 0.0, 1.0, 0.0
5, 0.0, 0.0, 2.0
6, 1.0, 0.0, 2.0
7, 1.0, 1.0, 2.0
8, 0.0, 1.0, 2.0
*ELEMENT, TYPE=S4, ELSET=A
1, 1, 2, 3, 4
*ELEMENT, TYPE=S4, ELSET=B
2, 5, 6, 7, 8
*SURFACE, NAME=TOP, TYPE=ELEMENT
A, SPOS
*SURFACE, NAME=BOT, TYPE=ELEMENT
B, SPOS
*TIE, NAME=GLUE, TYPE=SURFACE TO SURFACE
TOP, BOT
";
  let conv = convert_src(src);
  assert_eq!(conv.deck.ties.len(), 2);
  assert_eq!(conv.deck.ties[0].header, "/INTER/TYPE2/1");
  assert_eq!(conv.deck.ties[0].name.as_deref(), Some("GLUE"));
  assert_eq!(conv.deck.ties[1].header, "/INTER/TYPE2/2");
  assert_eq!(conv.deck.ties[1].name.as_deref(), Some("GLUE_SYM"));
  // both tie cards carry the fixed tied-variant flag
  for tie in &conv.deck.ties {
    assert!(tie.lines[0].ends_with("        25"));
  }
}

#[test]
fn unresolvable_pairs_skip_without_cards() {
  let src = "\
*CONTACT PAIR, INTERACTION=FRIC
NO_SUCH_A, NO_SUCH_B
NO_SUCH_C, NO_SUCH_D
";
  let conv = convert_src(src);
  assert!(conv.deck.contacts.is_empty());
  let relevant = conv
    .ctx
    .warnings
    .iter()
    .filter(|w| w.contains("unresolvable surface"))
    .count();
  assert_eq!(relevant, 2);
}

#[test]
fn general_contact_synthesizes_the_exterior() {
  let src = "\
*NODE
1, 0.0, 0.0, 0.0
2, 1.0, 0.0, 0.0
3, 1.0, 1.0, 0.0
4, 0.0, 1.0, 0.0
*ELEMENT, TYPE=S4, ELSET=SKIN
1, 1, 2, 3, 4
*MATERIAL, NAME=M
*ELASTIC
100.0, 0.3
*DENSITY
1.0
*SHELL SECTION, ELSET=SKIN, MATERIAL=M
1.5
*SURFACE INTERACTION, NAME=SLIDE
*FRICTION
0.25
*CONTACT
*CONTACT INCLUSIONS
ALL EXTERIOR
*CONTACT PROPERTY ASSIGNMENT
, , SLIDE
";
  let conv = convert_src(src);
  let out = conv.deck.render();
  assert!(out.contains("/SURF/PART/EXT/"));
  assert_eq!(conv.deck.contacts.len(), 1);
  let contact = &conv.deck.contacts[0];
  assert!(contact.header.starts_with("/INTER/TYPE7/"));
  // friction came from the case-insensitive interaction lookup
  assert!(contact.lines[1].ends_with("0.25"));
  // the interface references the exterior surface against itself
  let fields: Vec<&str> = contact.lines[0].split_whitespace().collect();
  assert_eq!(fields[0], fields[1]);
}

#[test]
fn zero_magnitude_motion_degrades_to_constraint() {
  let src = "\
*NODE
1, 0.0, 0.0, 0.0
2, 0.0, 1.0, 0.0
3, 0.0, 2.0, 0.0
*NSET, NSET=N1
1, 2, 3
*BOUNDARY, TYPE=DISPLACEMENT
N1, 1, 3, 0.0
";
  let conv = convert_src(src);
  assert_eq!(conv.deck.constraints.len(), 1);
  assert!(conv.deck.motions.is_empty());
  let line = &conv.deck.constraints[0].lines[0];
  assert!(line.starts_with(&format!("{:>10}{:>10}", "111", "000")));
}

#[test]
fn nonzero_motion_writes_one_card_per_direction() {
  let src = "\
*NODE
9, 0.0, 0.0, 0.0
*AMPLITUDE, NAME=RAMP
0.0, 0.0, 0.01, 1.0
*BOUNDARY, TYPE=VELOCITY, AMPLITUDE=RAMP
9, 1, 2, 15.0
";
  let conv = convert_src(src);
  assert!(conv.deck.constraints.is_empty());
  assert_eq!(conv.deck.motions.len(), 2);
  assert_eq!(conv.deck.motions[0].header, "/IMPVEL/1");
  assert_eq!(conv.deck.motions[1].header, "/IMPVEL/2");
  // the ramp amplitude became function 2, after the constant function
  let first = &conv.deck.motions[0].lines[0];
  assert!(first.starts_with(&format!("{:>10}{:>10}", 2, "X")));
  assert!(conv.deck.motions[1].lines[0].contains(&format!("{:>10}", "Y")));
}

#[test]
fn interface_ids_share_one_increasing_space() {
  let src = "\
*NODE
1, 0.0, 0.0, 0.0
2, 1.0, 0.0, 0.0
3, 1.0, 1.0, 0.0
4, 0.0, 1.0, 0.0
*ELEMENT, TYPE=S4, ELSET=A
1, 1, 2, 3, 4
*SURFACE, NAME=TOP, TYPE=ELEMENT
A, SPOS
*SURFACE, NAME=BOT, TYPE=ELEMENT
A, SNEG
*CONTACT
*CONTACT PAIR, INTERACTION=F
TOP, BOT
*TIE, NAME=GLUE, TYPE=NODE TO SURFACE
TOP, BOT
";
  let conv = convert_src(src);
  assert_eq!(conv.deck.contacts[0].header, "/INTER/TYPE7/1");
  assert_eq!(conv.deck.contacts[1].header, "/INTER/TYPE7/2");
  assert_eq!(conv.deck.ties[0].header, "/INTER/TYPE2/3");
  assert_eq!(conv.deck.ties.len(), 1);
}

#[test]
fn rigid_bodies_borrow_element_ids() {
  let src = "\
*NODE
1, 0.0, 0.0, 0.0
2, 1.0, 0.0, 0.0
3, 1.0, 1.0, 0.0
4, 0.0, 1.0, 0.0
9, 0.5, 0.5, 1.0
*ELEMENT, TYPE=S4, ELSET=PLATE
40, 1, 2, 3, 4
*RIGID BODY, REF NODE=9, ELSET=PLATE
";
  let conv = convert_src(src);
  assert_eq!(conv.deck.rigid_parts.len(), 1);
  // borrowed the id right above the element high-water mark
  assert_eq!(conv.deck.rigid_parts[0].header, "/RBODY/41");
  let fields: Vec<&str> =
    conv.deck.rigid_parts[0].lines[0].split_whitespace().collect();
  assert_eq!(fields[0], "9");
}

#[test]
fn distributing_couplings_make_weighted_constraints() {
  let src = "\
*NODE
1, 0.0, 0.0, 0.0
2, 1.0, 0.0, 0.0
3, 1.0, 1.0, 0.0
4, 0.0, 1.0, 0.0
9, 0.5, 0.5, 1.0
*ELEMENT, TYPE=S4, ELSET=PLATE
1, 1, 2, 3, 4
*SURFACE, NAME=FACE, TYPE=ELEMENT
PLATE, SPOS
*COUPLING, CONSTRAINT NAME=SPIDER, REF NODE=9, SURFACE=FACE
*DISTRIBUTING
";
  let conv = convert_src(src);
  assert!(conv.deck.rigid_couplings.is_empty());
  assert_eq!(conv.deck.weighted.len(), 1);
  let card = &conv.deck.weighted[0];
  assert_eq!(card.header, "/RBE3/1");
  // reference node line plus one weighted line per surface node
  assert_eq!(card.lines.len(), 5);
  assert!(card.lines[1].ends_with("1.0"));
}

#[test]
fn springs_and_trusses_take_their_own_props() {
  let src = "\
*NODE
1, 0.0, 0.0, 0.0
2, 1.0, 0.0, 0.0
3, 2.0, 0.0, 0.0
4, 3.0, 0.0, 0.0
*ELEMENT, TYPE=T3D2, ELSET=RODS
1, 1, 2
*ELEMENT, TYPE=CONN3D2, ELSET=LINKS
2, 3, 4
*MATERIAL, NAME=AL
*ELASTIC
70000.0, 0.33
*DENSITY
2.7e-9
*SOLID SECTION, ELSET=RODS, MATERIAL=AL
50.0
*CONNECTOR SECTION, ELSET=LINKS
";
  let conv = convert_src(src);
  let out = conv.deck.render();
  // the solid section on a two-node set becomes a truss property
  assert!(out.contains("/PROP/TYPE2/1"));
  assert!(out.contains(&float_field(50.0)));
  assert!(out.contains("/TRUSS/1"));
  // the connector becomes a synthetic spring scaled by the law globals
  assert!(out.contains("/PROP/TYPE4/2"));
  assert_eq!(conv.deck.springs.len(), 1);
  assert_eq!(conv.deck.springs[0].header, "/SPRING/2");
  let prop = conv
    .deck
    .properties
    .iter()
    .find(|c| c.header == "/PROP/TYPE4/2")
    .unwrap();
  assert_eq!(
    prop.lines[0],
    format!("{}{}", float_field(2.7e-9), float_field(70000.0))
  );
}

#[test]
fn group_ids_are_distinct_and_increasing() {
  let src = "\
*NODE
1, 0.0, 0.0, 0.0
2, 1.0, 0.0, 0.0
*NSET, NSET=A
1
*NSET, NSET=B
2
*NSET, NSET=C
1, 2
";
  let conv = convert_src(src);
  let mut seen: Vec<u32> = Vec::new();
  for card in &conv.deck.groups {
    let id: u32 = card.header.rsplit('/').next().unwrap().parse().unwrap();
    seen.push(id);
  }
  assert_eq!(seen.len(), 3);
  let mut sorted = seen.clone();
  sorted.sort_unstable();
  sorted.dedup();
  assert_eq!(seen, sorted);
}

#[test]
fn referenced_sets_get_history_groups() {
  let src = "\
*NODE
1, 0.0, 0.0, 0.0
*NSET, NSET=WATCH
1
*STEP
*DYNAMIC, EXPLICIT
1.0e-6, 0.01
*OUTPUT, HISTORY
*NODE OUTPUT, NSET=WATCH
*END STEP
";
  let conv = convert_src(src);
  assert_eq!(conv.deck.histories.len(), 1);
  assert_eq!(conv.deck.histories[0].header, "/TH/NODE/1");
  assert_eq!(conv.deck.histories[0].name.as_deref(), Some("WATCH"));
}

#[test]
fn gravity_builds_a_skew_and_group() {
  let src = "\
*NODE
1, 0.0, 0.0, 0.0
2, 1.0, 0.0, 0.0
3, 1.0, 1.0, 0.0
4, 0.0, 1.0, 0.0
*ELEMENT, TYPE=S4, ELSET=PLATE
1, 1, 2, 3, 4
*DLOAD
PLATE, GRAV, 9810.0, 0.0, 0.0, -1.0
";
  let conv = convert_src(src);
  assert_eq!(conv.deck.gravity.len(), 2);
  assert!(conv.deck.gravity[0].header.starts_with("/SKEW/FIX/"));
  assert!(conv.deck.gravity[1].header.starts_with("/GRAV/"));
  assert!(conv.deck.gravity[1].lines[1].ends_with("9810.0"));
}
