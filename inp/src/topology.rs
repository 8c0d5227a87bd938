//! This module defines the supported element topologies, their node
//! counts, their output card kinds and their face tables. The face table
//! is the single source of truth for everything segment-shaped: surface
//! expansion, tie node harvesting and the degenerate wedge re-indexing.

use core::str::FromStr;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Face table of an 8-node hexahedron. Winding fixes the outward normal.
const HEXA8_FACES: &[(&str, &[usize])] = &[
  ("s1", &[0, 1, 2, 3]),
  ("s2", &[4, 7, 6, 5]),
  ("s3", &[0, 4, 5, 1]),
  ("s4", &[1, 5, 6, 2]),
  ("s5", &[2, 6, 7, 3]),
  ("s6", &[3, 7, 4, 0]),
];

/// Face table of a 6-node wedge.
const PENTA6_FACES: &[(&str, &[usize])] = &[
  ("s1", &[0, 1, 2]),
  ("s2", &[3, 5, 4]),
  ("s3", &[0, 3, 4, 1]),
  ("s4", &[1, 4, 5, 2]),
  ("s5", &[2, 5, 3, 0]),
];

/// Face table of a 4-node tetrahedron.
const TETRA4_FACES: &[(&str, &[usize])] = &[
  ("s1", &[0, 1, 2]),
  ("s2", &[0, 3, 1]),
  ("s3", &[1, 3, 2]),
  ("s4", &[2, 3, 0]),
];

/// Corner faces of a 10-node tetrahedron (segments use corners only).
const TETRA10_FACES: &[(&str, &[usize])] = TETRA4_FACES;

/// Face table of a 3-node shell: both sides.
const TRIA3_FACES: &[(&str, &[usize])] =
  &[("spos", &[0, 1, 2]), ("sneg", &[2, 1, 0])];

/// Face table of a 4-node shell: both sides.
const QUAD4_FACES: &[(&str, &[usize])] =
  &[("spos", &[0, 1, 2, 3]), ("sneg", &[3, 2, 1, 0])];

/// Point, spring and truss topologies have no faces.
const NO_FACES: &[(&str, &[usize])] = &[];

/// Identity output orders per node count.
const ORDER_1: &[usize] = &[0];
/// Two-node identity order.
const ORDER_2: &[usize] = &[0, 1];
/// Three-node identity order.
const ORDER_3: &[usize] = &[0, 1, 2];
/// Four-node identity order.
const ORDER_4: &[usize] = &[0, 1, 2, 3];
/// Wedge re-indexed into the 8-slot brick card by doubling two nodes.
const ORDER_PENTA6: &[usize] = &[0, 1, 2, 2, 3, 4, 5, 5];
/// Eight-node identity order.
const ORDER_8: &[usize] = &[0, 1, 2, 3, 4, 5, 6, 7];
/// Ten-node identity order.
const ORDER_10: &[usize] = &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9];

/// The card kind a topology's elements are written as.
#[derive(
  Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord
)]
pub enum CardKind {
  /// Solid brick card (8 node slots).
  Brick,
  /// Four-node shell card.
  Shell,
  /// Three-node shell card.
  Sh3n,
  /// Four-node tetrahedron card.
  Tetra4,
  /// Ten-node tetrahedron card.
  Tetra10,
  /// Two-node spring card.
  Spring,
  /// Two-node truss card.
  Truss,
  /// Point mass; becomes an added-mass card, not an element card.
  Mass,
}

impl CardKind {
  /// Returns the card mnemonic this kind is written under.
  pub const fn keyword(&self) -> &'static str {
    return match self {
      Self::Brick => "BRICK",
      Self::Shell => "SHELL",
      Self::Sh3n => "SH3N",
      Self::Tetra4 => "TETRA4",
      Self::Tetra10 => "TETRA10",
      Self::Spring => "SPRING",
      Self::Truss => "TRUSS",
      Self::Mass => "ADMAS",
    };
  }
}

impl Display for CardKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return write!(f, "{}", self.keyword());
  }
}

/// Generates the Topology enum and its dispatch tables.
macro_rules! gen_topologies {
  (
    $(($vn:ident, $aliases:expr, $nodes:literal, $card:ident, $faces:expr, $order:expr),)*
  ) => {
    /// Known element topologies.
    #[derive(
      Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd,
      Ord
    )]
    #[allow(missing_docs)]
    #[non_exhaustive]
    pub enum Topology {
      $($vn,)*
    }

    impl Topology {
      /// Returns a static slice with all known topologies.
      pub const fn all() -> &'static [Self] {
        return &[
          $(Self::$vn,)*
        ];
      }

      /// Returns the deck keywords that mean this topology.
      pub const fn aliases(&self) -> &'static [&'static str] {
        return match self {
          $(Self::$vn => &$aliases,)*
        };
      }

      /// Returns the number of nodes the topology takes.
      pub const fn nodes(&self) -> usize {
        return match self {
          $(Self::$vn => $nodes,)*
        };
      }

      /// Returns the card kind elements of this topology are written as.
      pub const fn card(&self) -> CardKind {
        return match self {
          $(Self::$vn => CardKind::$card,)*
        };
      }

      /// Returns the face table: label plus node-index permutation, in
      /// the winding that fixes the outward normal.
      pub const fn faces(&self) -> &'static [(&'static str, &'static [usize])] {
        return match self {
          $(Self::$vn => $faces,)*
        };
      }

      /// Returns the node-index order used when writing the element card.
      /// Longer than `nodes()` for degenerate re-indexings.
      pub const fn out_order(&self) -> &'static [usize] {
        return match self {
          $(Self::$vn => $order,)*
        };
      }
    }
  };
}

gen_topologies!(
  // point
  (Mass, ["MASS"], 1, Mass, NO_FACES, ORDER_1),
  // two-node
  (Spring, ["CONN3D2", "SPRINGA", "SPRING2"], 2, Spring, NO_FACES, ORDER_2),
  (Truss, ["T3D2"], 2, Truss, NO_FACES, ORDER_2),
  // shells
  (Tria3, ["S3", "S3R"], 3, Sh3n, TRIA3_FACES, ORDER_3),
  (Quad4, ["S4", "S4R"], 4, Shell, QUAD4_FACES, ORDER_4),
  // solids
  (Tetra4, ["C3D4"], 4, Tetra4, TETRA4_FACES, ORDER_4),
  (Penta6, ["C3D6"], 6, Brick, PENTA6_FACES, ORDER_PENTA6),
  (Hexa8, ["C3D8", "C3D8R", "C3D8I"], 8, Brick, HEXA8_FACES, ORDER_8),
  (Tetra10, ["C3D10", "C3D10M"], 10, Tetra10, TETRA10_FACES, ORDER_10),
);

impl FromStr for Topology {
  type Err = ();

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let upper = s.trim().to_uppercase();
    return Self::all()
      .iter()
      .find(|t| t.aliases().contains(&upper.as_str()))
      .copied()
      .ok_or(());
  }
}

impl Display for Topology {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return write!(f, "{}", self.aliases()[0]);
  }
}

impl Topology {
  /// Looks a face up by its label, case-insensitively.
  pub fn face(&self, label: &str) -> Option<&'static [usize]> {
    let lower = label.trim().to_lowercase();
    return self
      .faces()
      .iter()
      .find(|(l, _)| *l == lower)
      .map(|(_, ixs)| *ixs);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn aliases_resolve() {
    assert_eq!("C3D8R".parse::<Topology>(), Ok(Topology::Hexa8));
    assert_eq!("s4r".parse::<Topology>(), Ok(Topology::Quad4));
    assert!("B31".parse::<Topology>().is_err());
  }

  #[test]
  fn node_counts_span_one_to_ten() {
    let counts: Vec<usize> = Topology::all().iter().map(|t| t.nodes()).collect();
    assert!(counts.contains(&1));
    assert!(counts.contains(&10));
    for t in Topology::all() {
      // every output order slot points inside the node list
      assert!(t.out_order().iter().all(|&i| i < t.nodes()));
    }
  }

  #[test]
  fn face_windings_close() {
    // each hexa face has 4 distinct nodes, each tetra face 3
    for (_, ixs) in Topology::Hexa8.faces() {
      assert_eq!(ixs.len(), 4);
    }
    for (_, ixs) in Topology::Tetra4.faces() {
      assert_eq!(ixs.len(), 3);
    }
    assert_eq!(Topology::Hexa8.face("S3"), Some(&[0, 4, 5, 1][..]));
    assert_eq!(Topology::Quad4.face("SPOS"), Some(&[0, 1, 2, 3][..]));
    assert_eq!(Topology::Tetra4.face("s9"), None);
  }

  #[test]
  fn wedge_degenerates_into_brick() {
    assert_eq!(Topology::Penta6.card(), CardKind::Brick);
    assert_eq!(Topology::Penta6.out_order(), &[0, 1, 2, 2, 3, 4, 5, 5]);
  }
}
