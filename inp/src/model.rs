//! This module implements the in-memory model a deck builds into: the
//! geometry, the material and section tables, and the boundary, load,
//! contact and coupling definitions the converters consume.

use std::collections::BTreeMap;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::sets::SetTable;
use crate::topology::Topology;
use crate::util::name_key;

/// One mesh node.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Node {
  /// The node id.
  pub id: u64,
  /// The coordinates as given.
  pub coords: Vector3<f64>,
  /// The owning coordinate system, if the node was declared under one.
  pub system: Option<u32>,
}

/// A local coordinate system: origin plus two basis-defining points.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CoordinateSystem {
  /// Sequentially assigned id, 1-based in declaration order.
  pub id: u32,
  /// The origin.
  pub origin: Vector3<f64>,
  /// A point on the local X axis.
  pub x_point: Vector3<f64>,
  /// A point in the local XY plane.
  pub plane_point: Vector3<f64>,
}

/// One element: topology, ordered nodes, owning set and resolved property.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Element {
  /// The element id.
  pub id: u64,
  /// The topology.
  pub topology: Topology,
  /// The node list, exactly `topology.nodes()` long.
  pub nodes: Vec<u64>,
  /// The owning set name.
  pub set: String,
  /// The resolved property id; 0 until property resolution, and 0 after
  /// it when no property could be bound.
  pub property: u32,
}

/// The sparse parameter bag a material accumulates from its sub-blocks.
/// Law selection downstream matches on which of these are present.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct MatParams {
  /// Mass density.
  pub density: Option<f64>,
  /// Elastic modulus.
  pub young: Option<f64>,
  /// Poisson ratio.
  pub poisson: Option<f64>,
  /// Yield curve as (stress, plastic strain) pairs.
  pub plastic: Vec<(f64, f64)>,
  /// First reduced-polynomial hyperelastic coefficient.
  pub c10: Option<f64>,
  /// Hyperelastic incompressibility coefficient.
  pub d1: Option<f64>,
}

impl MatParams {
  /// The set of present parameter keys, for exact-match law selection.
  pub fn present(&self) -> Vec<&'static str> {
    let mut keys: Vec<&'static str> = Vec::new();
    if self.density.is_some() {
      keys.push("density");
    }
    if self.young.is_some() {
      keys.push("young");
    }
    if self.poisson.is_some() {
      keys.push("poisson");
    }
    if !self.plastic.is_empty() {
      keys.push("plastic");
    }
    if self.c10.is_some() {
      keys.push("c10");
    }
    if self.d1.is_some() {
      keys.push("d1");
    }
    return keys;
  }
}

/// One material: name, 1-based id in declaration order, parameter bag.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Material {
  /// The material name.
  pub name: String,
  /// The 1-based id.
  pub id: u32,
  /// The accumulated parameters.
  pub params: MatParams,
}

/// What kind of section binds an element set.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum SectionKind {
  /// A solid section. The data value doubles as the cross area when the
  /// bound set turns out to hold two-node truss topology.
  Solid {
    /// The first data field, if the block carried one.
    area: Option<f64>,
  },
  /// A shell section with its thickness.
  Shell {
    /// The shell thickness.
    thickness: f64,
  },
  /// A connector section; becomes a synthetic spring property.
  Connector,
  /// A nodal mass assignment; becomes an added-mass card, not a part.
  Mass {
    /// The mass value per node.
    value: f64,
  },
}

/// A section: element set binding, material, kind.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Section {
  /// The bound element set name.
  pub elset: String,
  /// The material name, when the kind takes one.
  pub material: Option<String>,
  /// The section kind.
  pub kind: SectionKind,
}

/// Whether a surface is element-face based or node based.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum SurfaceKind {
  /// Built from (element-or-set, side) pairs.
  Element,
  /// A back-reference to a node set.
  Node,
}

/// A named surface definition.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SurfaceDef {
  /// The surface name.
  pub name: String,
  /// Element-face based or node based.
  pub kind: SurfaceKind,
  /// For element surfaces: (element-id-or-set-name, optional side label).
  pub faces: Vec<(String, Option<String>)>,
  /// For node surfaces: the referenced node set.
  pub nset: Option<String>,
  /// An element surface with no body at all: the wildcard exterior.
  pub exterior: bool,
}

/// One contact or tie definition, in source-scan order.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum ContactDef {
  /// General contact over all exterior faces.
  General {
    /// Interaction name for the friction lookup.
    interaction: Option<String>,
  },
  /// A contact pair between two named surfaces.
  Pair {
    /// Interaction name for the friction lookup.
    interaction: Option<String>,
    /// The secondary surface name.
    secondary: String,
    /// The main surface name.
    main: String,
  },
  /// A tied interface between two surfaces.
  Tie {
    /// The tie name.
    name: String,
    /// The secondary surface name.
    secondary: String,
    /// The main surface name.
    main: String,
    /// Surface-to-surface ties expand into a symmetric pair of cards.
    surface_to_surface: Option<bool>,
  },
}

/// How a boundary line constrains or drives its directions.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum BoundaryKind {
  /// A plain constraint.
  Fix,
  /// A prescribed displacement.
  Displacement,
  /// A prescribed velocity.
  Velocity,
}

/// One accumulated boundary entry.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BoundarySpec {
  /// The constrained entity: a node set name or a bare node id.
  pub entity: String,
  /// Active degrees of freedom, dofs 1..=6.
  pub dofs: [bool; 6],
  /// The magnitude; exactly 0.0 degrades the entry to a constraint.
  pub magnitude: f64,
  /// Constraint or prescribed-motion flavor.
  pub kind: BoundaryKind,
  /// The amplitude active when the entry was defined.
  pub amplitude: Option<String>,
}

/// One accumulated point load entry.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PointLoad {
  /// The loaded entity: a node set name or a bare node id.
  pub entity: String,
  /// The loaded degree of freedom, 1..=6.
  pub dof: usize,
  /// The load magnitude.
  pub magnitude: f64,
  /// The amplitude active when the entry was defined.
  pub amplitude: Option<String>,
}

/// One gravity load.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GravityLoad {
  /// The element set the load was declared on.
  pub elset: String,
  /// The magnitude.
  pub magnitude: f64,
  /// The direction vector as given, not necessarily unit.
  pub direction: Vector3<f64>,
  /// The amplitude active when the entry was defined.
  pub amplitude: Option<String>,
}

/// A named amplitude curve.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Amplitude {
  /// The amplitude name.
  pub name: String,
  /// The (x, y) pairs, preserved as given.
  pub pairs: Vec<(f64, f64)>,
}

/// A rigid-body definition. Whether the element set makes it a rigid part
/// or a free set depends on property resolution downstream.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RigidBodyDef {
  /// The reference node: a bare id or a set name (first member wins).
  pub ref_node: String,
  /// The secondary element set, if the body was declared on one.
  pub elset: Option<String>,
  /// The secondary node set, if the body was declared on one.
  pub nset: Option<String>,
}

/// Kinematic couplings slave all six directions; distributing couplings
/// become a weighted constraint instead of a rigid body.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum CouplingKind {
  /// All six directions coupled rigidly.
  Kinematic,
  /// Weighted load distribution.
  Distributing,
}

/// A coupling definition.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CouplingDef {
  /// The constraint name.
  pub name: String,
  /// The reference node: a bare id or a set name (first member wins).
  pub ref_node: String,
  /// The coupled surface name.
  pub surface: String,
  /// Kinematic or distributing.
  pub kind: CouplingKind,
  /// Per-node weights for the distributing kind; one entry per coupled
  /// node, copied verbatim into the constraint card.
  pub weights: Vec<(u64, f64)>,
}

/// Run-control data scraped from the step keywords.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct StepControl {
  /// The suggested initial time step.
  pub dt_initial: Option<f64>,
  /// The final time.
  pub t_final: Option<f64>,
  /// Requested field-output interval count.
  pub field_intervals: Option<u32>,
  /// Node sets named by history-output requests.
  pub history_nsets: Vec<String>,
}

/// The whole parsed model, the single input of the conversion passes.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Model {
  /// The model title from the heading block, if any.
  pub title: Option<String>,
  /// All nodes, in declaration order.
  pub nodes: Vec<Node>,
  /// All coordinate systems, in declaration order.
  pub systems: Vec<CoordinateSystem>,
  /// All elements, in declaration order.
  pub elements: Vec<Element>,
  /// The element-set table.
  pub elsets: SetTable,
  /// The node-set table.
  pub nsets: SetTable,
  /// All materials, in declaration order.
  pub materials: Vec<Material>,
  /// All sections, in declaration order.
  pub sections: Vec<Section>,
  /// All surface definitions, in declaration order.
  pub surfaces: Vec<SurfaceDef>,
  /// Friction per upper-cased interaction name.
  pub frictions: BTreeMap<String, f64>,
  /// Contacts and ties, in source-scan order across all kinds.
  pub contacts: Vec<ContactDef>,
  /// Accumulated boundary entries.
  pub boundaries: Vec<BoundarySpec>,
  /// Accumulated point loads.
  pub cloads: Vec<PointLoad>,
  /// Gravity loads.
  pub gravities: Vec<GravityLoad>,
  /// Amplitude curves, in declaration order.
  pub amplitudes: Vec<Amplitude>,
  /// Rigid-body definitions, in declaration order.
  pub rigid_bodies: Vec<RigidBodyDef>,
  /// Coupling definitions, in declaration order.
  pub couplings: Vec<CouplingDef>,
  /// Run control.
  pub step: StepControl,
  /// High-water mark of element ids; later artifacts borrow ids above it.
  pub max_element_id: u64,
}

impl Model {
  /// Makes an empty model.
  pub fn new() -> Self {
    return Self::default();
  }

  /// Looks a material up by name, case-insensitively.
  pub fn material(&self, name: &str) -> Option<&Material> {
    let key = name_key(name);
    return self.materials.iter().find(|m| name_key(&m.name) == key);
  }

  /// Finds the section bound to an element set, case-insensitively.
  pub fn section_for(&self, elset: &str) -> Option<&Section> {
    let key = name_key(elset);
    return self.sections.iter().find(|s| name_key(&s.elset) == key);
  }

  /// Finds a surface definition by name, case-insensitively.
  pub fn surface(&self, name: &str) -> Option<&SurfaceDef> {
    let key = name_key(name);
    return self.surfaces.iter().find(|s| name_key(&s.name) == key);
  }

  /// Looks an amplitude up by name, case-insensitively.
  pub fn amplitude(&self, name: &str) -> Option<&Amplitude> {
    let key = name_key(name);
    return self.amplitudes.iter().find(|a| name_key(&a.name) == key);
  }
}
