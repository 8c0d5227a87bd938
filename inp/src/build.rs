//! This module implements the block-to-model builder: one pass over the
//! keyword blocks, dispatching on the canonical keyword, followed by set
//! resolution and placeholder reconciliation.

use itertools::Itertools;
use log::{debug, warn};
use nalgebra::Vector3;

use crate::deck::Block;
use crate::errors::DeckError;
use crate::model::*;
use crate::sets::{reconcile_placeholders, SetItem};
use crate::topology::Topology;
use crate::util::*;

/// Options controlling how strict the builder is.
#[derive(Copy, Clone, Debug, Default)]
pub struct BuildOptions {
  /// Drop element blocks with unsupported topology instead of aborting.
  /// Only ever set after an interactive operator elected to continue.
  pub drop_unsupported: bool,
}

/// Keywords that structurally cannot be flattened by this converter.
const UNSUPPORTED_STRUCTURE: &[&str] =
  &["PART", "END PART", "ASSEMBLY", "END ASSEMBLY", "INSTANCE", "END INSTANCE"];

/// Material sub-block keywords; they bind to the open material.
const MATERIAL_SUBS: &[&str] = &["ELASTIC", "DENSITY", "PLASTIC", "HYPERELASTIC"];

/// Maps a symbolic boundary condition name to its six-direction list.
fn symbolic_dofs(name: &str) -> Option<[bool; 6]> {
  return match name_key(name).as_str() {
    "ENCASTRE" => Some([true, true, true, true, true, true]),
    "PINNED" => Some([true, true, true, false, false, false]),
    "XSYMM" => Some([true, false, false, false, true, true]),
    "YSYMM" => Some([false, true, false, true, false, true]),
    "ZSYMM" => Some([false, false, true, true, true, false]),
    "XASYMM" => Some([false, true, true, true, false, false]),
    "YASYMM" => Some([true, false, true, false, true, false]),
    "ZASYMM" => Some([true, true, false, false, false, true]),
    _ => None,
  };
}

/// Parses a float or raises the fatal bad-number error.
fn want_float(s: &str, line: usize) -> Result<f64, DeckError> {
  return parse_float(s).ok_or_else(|| DeckError::BadNumber {
    line,
    text: s.to_string(),
  });
}

/// Parses an id or raises the fatal bad-number error.
fn want_id(s: &str, line: usize) -> Result<u64, DeckError> {
  return parse_id(s).ok_or_else(|| DeckError::BadNumber {
    line,
    text: s.to_string(),
  });
}

/// Builds a model from keyword blocks. Structural problems abort here,
/// before any conversion state exists; resolution-category problems are
/// deferred to the converters, which degrade them to warnings.
pub fn build_model(blocks: &[Block], opts: &BuildOptions) -> Result<Model, DeckError> {
  let mut model = Model::new();
  // builder state: the open material, system, interaction and coupling
  let mut current_material: Option<usize> = None;
  let mut current_system: Option<u32> = None;
  let mut current_interaction: Option<String> = None;
  let mut pending_coupling: Option<CouplingDef> = None;
  let mut history_output = false;
  for block in blocks {
    let kw = block.keyword.as_str();
    if kw != "MATERIAL" && !MATERIAL_SUBS.contains(&kw) {
      current_material = None;
    }
    if UNSUPPORTED_STRUCTURE.contains(&kw) {
      return Err(DeckError::UnsupportedStructure(format!(
        "*{} (line {}); flatten the deck before converting",
        kw, block.line
      )));
    }
    match kw {
      "HEADING" => {
        model.title = block.data.first().cloned();
      },
      "SYSTEM" => {
        current_system = read_system(block, &mut model)?;
      },
      "NODE" => {
        read_nodes(block, current_system, &mut model)?;
      },
      "ELEMENT" => {
        read_elements(block, opts, &mut model)?;
      },
      "ELSET" => {
        if let Some(name) = block.get("ELSET") {
          let name = name.to_string();
          model.elsets.add_items(&name, read_set_items(block));
        }
      },
      "NSET" => {
        if let Some(name) = block.get("NSET") {
          let name = name.to_string();
          model.nsets.add_items(&name, read_set_items(block));
        }
      },
      "MATERIAL" => {
        let name = block.get("NAME").unwrap_or("").to_string();
        let id = model.materials.len() as u32 + 1;
        model.materials.push(Material { name, id, params: MatParams::default() });
        current_material = Some(model.materials.len() - 1);
      },
      "ELASTIC" => {
        if let Some(ix) = current_material {
          if let Some(line) = block.data.first() {
            let f = split_fields(line);
            let params = &mut model.materials[ix].params;
            params.young = Some(want_float(f.first().unwrap_or(&""), block.line)?);
            params.poisson = Some(want_float(f.get(1).unwrap_or(&""), block.line)?);
          }
        }
      },
      "DENSITY" => {
        if let Some(ix) = current_material {
          if let Some(line) = block.data.first() {
            let f = split_fields(line);
            let rho = want_float(f.first().unwrap_or(&""), block.line)?;
            model.materials[ix].params.density = Some(rho);
          }
        }
      },
      "PLASTIC" => {
        if let Some(ix) = current_material {
          for line in &block.data {
            let f = split_fields(line);
            let stress = want_float(f.first().unwrap_or(&""), block.line)?;
            let strain = want_float(f.get(1).unwrap_or(&""), block.line)?;
            model.materials[ix].params.plastic.push((stress, strain));
          }
        }
      },
      "HYPERELASTIC" => {
        if let Some(ix) = current_material {
          if let Some(line) = block.data.first() {
            let f = split_fields(line);
            let params = &mut model.materials[ix].params;
            params.c10 = Some(want_float(f.first().unwrap_or(&""), block.line)?);
            params.d1 = Some(want_float(f.get(1).unwrap_or(&""), block.line)?);
          }
        }
      },
      "SOLID SECTION" => {
        let area = block
          .data
          .first()
          .and_then(|l| split_fields(l).first().and_then(|s| parse_float(s)));
        push_section(block, SectionKind::Solid { area }, &mut model);
      },
      "SHELL SECTION" => {
        let thickness = block
          .data
          .first()
          .and_then(|l| split_fields(l).first().and_then(|s| parse_float(s)))
          .unwrap_or(1.0);
        push_section(block, SectionKind::Shell { thickness }, &mut model);
      },
      "CONNECTOR SECTION" => {
        push_section(block, SectionKind::Connector, &mut model);
      },
      "MASS" => {
        let value = block
          .data
          .first()
          .and_then(|l| split_fields(l).first().and_then(|s| parse_float(s)))
          .unwrap_or(0.0);
        push_section(block, SectionKind::Mass { value }, &mut model);
      },
      "SURFACE" => {
        read_surface(block, &mut model);
      },
      "SURFACE INTERACTION" => {
        current_interaction = block.get("NAME").map(str::to_string);
      },
      "FRICTION" => {
        if let Some(ref name) = current_interaction {
          if let Some(line) = block.data.first() {
            let f = split_fields(line);
            let mu = want_float(f.first().unwrap_or(&""), block.line)?;
            model.frictions.insert(name_key(name), mu);
          }
        }
      },
      "CONTACT" => {
        model.contacts.push(ContactDef::General { interaction: None });
      },
      "CONTACT INCLUSIONS" => {
        // general contact already spans all exterior faces
        debug!("Contact inclusions on line {} noted.", block.line);
      },
      "CONTACT PROPERTY ASSIGNMENT" => {
        let name = block
          .data
          .first()
          .and_then(|l| split_fields(l).get(2).map(|s| s.to_string()));
        if let Some(ContactDef::General { interaction }) = model
          .contacts
          .iter_mut()
          .rev()
          .find(|c| matches!(c, ContactDef::General { .. }))
        {
          *interaction = name;
        }
      },
      "CONTACT PAIR" => {
        let interaction = block.get("INTERACTION").map(str::to_string);
        for line in &block.data {
          let f = split_fields(line);
          if f.len() < 2 {
            warn!("Contact pair line {} is short, skipped.", block.line);
            continue;
          }
          model.contacts.push(ContactDef::Pair {
            interaction: interaction.clone(),
            secondary: f[0].to_string(),
            main: f[1].to_string(),
          });
        }
      },
      "TIE" => {
        let name = block.get("NAME").unwrap_or("TIE").to_string();
        let s2s = block.get("TYPE").map(|t| name_key(t) == "SURFACE TO SURFACE");
        if let Some(line) = block.data.first() {
          let f = split_fields(line);
          if f.len() >= 2 {
            model.contacts.push(ContactDef::Tie {
              name,
              secondary: f[0].to_string(),
              main: f[1].to_string(),
              surface_to_surface: s2s,
            });
          } else {
            warn!("Tie block on line {} has no surface pair, skipped.", block.line);
          }
        }
      },
      "BOUNDARY" => {
        read_boundary(block, &mut model)?;
      },
      "CLOAD" => {
        read_cload(block, &mut model)?;
      },
      "DLOAD" => {
        read_dload(block, &mut model)?;
      },
      "AMPLITUDE" => {
        read_amplitude(block, &mut model)?;
      },
      "RIGID BODY" => {
        let nset = block
          .get("NSET")
          .or_else(|| block.get("PIN NSET"))
          .or_else(|| block.get("TIE NSET"))
          .map(str::to_string);
        model.rigid_bodies.push(RigidBodyDef {
          ref_node: block.get("REF NODE").unwrap_or("0").to_string(),
          elset: block.get("ELSET").map(str::to_string),
          nset,
        });
      },
      "COUPLING" => {
        pending_coupling = Some(CouplingDef {
          name: block.get("CONSTRAINT NAME").unwrap_or("COUPLING").to_string(),
          ref_node: block.get("REF NODE").unwrap_or("0").to_string(),
          surface: block.get("SURFACE").unwrap_or("").to_string(),
          kind: CouplingKind::Kinematic,
          weights: Vec::new(),
        });
      },
      "KINEMATIC" => {
        if let Some(mut c) = pending_coupling.take() {
          c.kind = CouplingKind::Kinematic;
          model.couplings.push(c);
        }
      },
      "DISTRIBUTING" => {
        if let Some(mut c) = pending_coupling.take() {
          c.kind = CouplingKind::Distributing;
          model.couplings.push(c);
        }
      },
      "STEP" | "END STEP" => {},
      "DYNAMIC" => {
        if let Some(line) = block.data.first() {
          let f = split_fields(line);
          if let Some(s) = f.first() {
            if !s.is_empty() {
              model.step.dt_initial = Some(want_float(s, block.line)?);
            }
          }
          if let Some(s) = f.get(1) {
            if !s.is_empty() {
              model.step.t_final = Some(want_float(s, block.line)?);
            }
          }
        }
      },
      "OUTPUT" => {
        history_output = block.has("HISTORY");
        if block.has("FIELD") {
          if let Some(n) = block.get("NUMBER INTERVAL") {
            model.step.field_intervals = parse_id(n).map(|v| v as u32);
          }
        }
      },
      "NODE OUTPUT" => {
        if history_output {
          if let Some(nset) = block.get("NSET") {
            model.step.history_nsets.push(nset.to_string());
          }
        }
      },
      "INCLUDE" => {
        // an include the normalizer could not find; already warned there
        debug!("Unresolved include directive on line {} ignored.", block.line);
      },
      other => {
        debug!("Keyword *{} (line {}) is outside the subset, skipped.", other, block.line);
      },
    }
  }
  if pending_coupling.is_some() {
    warn!("A coupling block was never followed by kinematic/distributing.");
  }
  model.elsets.resolve();
  model.nsets.resolve();
  for nset in model.step.history_nsets.clone() {
    model.nsets.mark_referenced(&nset);
  }
  reconcile_placeholders(&mut model);
  return Ok(model);
}

/// Reads a system block; empty data resets to the global system.
fn read_system(block: &Block, model: &mut Model) -> Result<Option<u32>, DeckError> {
  if block.data.is_empty() {
    return Ok(None);
  }
  let first = split_fields(&block.data[0]);
  let mut nums: Vec<f64> = Vec::new();
  for s in &first {
    nums.push(want_float(s, block.line)?);
  }
  let origin = Vector3::new(
    nums.first().copied().unwrap_or(0.0),
    nums.get(1).copied().unwrap_or(0.0),
    nums.get(2).copied().unwrap_or(0.0),
  );
  let x_point = if nums.len() >= 6 {
    Vector3::new(nums[3], nums[4], nums[5])
  } else {
    origin + Vector3::x()
  };
  let plane_point = match block.data.get(1) {
    Some(line) => {
      let f = split_fields(line);
      Vector3::new(
        want_float(f.first().unwrap_or(&""), block.line)?,
        want_float(f.get(1).unwrap_or(&""), block.line)?,
        want_float(f.get(2).unwrap_or(&""), block.line)?,
      )
    },
    None => origin + Vector3::y(),
  };
  let id = model.systems.len() as u32 + 1;
  model.systems.push(CoordinateSystem { id, origin, x_point, plane_point });
  return Ok(Some(id));
}

/// Reads a node block under the active system.
fn read_nodes(
  block: &Block,
  system: Option<u32>,
  model: &mut Model,
) -> Result<(), DeckError> {
  for line in &block.data {
    let f = split_fields(line);
    let id = want_id(f.first().unwrap_or(&""), block.line)?;
    let coords = Vector3::new(
      want_float(f.get(1).unwrap_or(&""), block.line)?,
      want_float(f.get(2).unwrap_or(&""), block.line)?,
      want_float(f.get(3).unwrap_or(&""), block.line)?,
    );
    model.nodes.push(Node { id, coords, system });
  }
  return Ok(());
}

/// Reads an element block, enforcing the topology's node count.
fn read_elements(
  block: &Block,
  opts: &BuildOptions,
  model: &mut Model,
) -> Result<(), DeckError> {
  let type_kw = block.get("TYPE").unwrap_or("");
  let topology = match type_kw.parse::<Topology>() {
    Ok(t) => t,
    Err(()) => {
      if opts.drop_unsupported {
        warn!(
          "Dropping element block of unsupported topology \"{}\" (line {}).",
          type_kw, block.line
        );
        return Ok(());
      }
      return Err(DeckError::UnsupportedTopology {
        keyword: type_kw.to_string(),
        line: block.line,
      });
    },
  };
  let set = block.get("ELSET").unwrap_or("__ORPHAN_0").to_string();
  for line in &block.data {
    let f = split_fields(line);
    let id = want_id(f.first().unwrap_or(&""), block.line)?;
    let mut nodes: Vec<u64> = Vec::with_capacity(topology.nodes());
    for s in &f[1..] {
      nodes.push(want_id(s, block.line)?);
    }
    if nodes.len() != topology.nodes() {
      return Err(DeckError::WrongNodeCount {
        element: id,
        expected: topology.nodes(),
        got: nodes.len(),
      });
    }
    model.elsets.add_items(&set, vec![SetItem::Id(id)]);
    model.max_element_id = model.max_element_id.max(id);
    model.elements.push(Element { id, topology, nodes, set: set.clone(), property: 0 });
  }
  return Ok(());
}

/// Reads set data lines into tagged items.
fn read_set_items(block: &Block) -> Vec<SetItem> {
  let mut items: Vec<SetItem> = Vec::new();
  for line in &block.data {
    for field in split_fields(line) {
      if field.is_empty() {
        continue;
      }
      match parse_id(field) {
        Some(id) => items.push(SetItem::Id(id)),
        None => items.push(SetItem::Ref(field.to_string())),
      }
    }
  }
  return items;
}

/// Pushes a section from its block parameters.
fn push_section(block: &Block, kind: SectionKind, model: &mut Model) {
  let Some(elset) = block.get("ELSET") else {
    warn!("Section on line {} names no element set, skipped.", block.line);
    return;
  };
  model.sections.push(Section {
    elset: elset.to_string(),
    material: block.get("MATERIAL").map(str::to_string),
    kind,
  });
}

/// Reads a surface block of either kind.
fn read_surface(block: &Block, model: &mut Model) {
  let name = block.get("NAME").unwrap_or("").to_string();
  let kind = match block.get("TYPE").map(name_key).as_deref() {
    Some("NODE") => SurfaceKind::Node,
    _ => SurfaceKind::Element,
  };
  match kind {
    SurfaceKind::Node => {
      let nset = block
        .data
        .first()
        .and_then(|l| split_fields(l).first().map(|s| s.to_string()));
      model.surfaces.push(SurfaceDef {
        name,
        kind,
        faces: Vec::new(),
        nset,
        exterior: false,
      });
    },
    SurfaceKind::Element => {
      let mut faces: Vec<(String, Option<String>)> = Vec::new();
      for line in &block.data {
        let f = split_fields(line);
        if f.is_empty() || f[0].is_empty() {
          continue;
        }
        let side = f.get(1).filter(|s| !s.is_empty()).map(|s| s.to_string());
        faces.push((f[0].to_string(), side));
      }
      let exterior = faces.is_empty();
      model.surfaces.push(SurfaceDef { name, kind, faces, nset: None, exterior });
    },
  }
}

/// Reads a boundary block, honoring the op-new clearing rule.
fn read_boundary(block: &Block, model: &mut Model) -> Result<(), DeckError> {
  let amplitude = block.get("AMPLITUDE").map(str::to_string);
  let type_param = block.get("TYPE").map(name_key);
  if block.get("OP").map(name_key).as_deref() == Some("NEW") {
    let names: Vec<String> = block
      .data
      .iter()
      .filter_map(|l| split_fields(l).first().map(|s| name_key(s)))
      .collect();
    model.boundaries.retain(|b| !names.contains(&name_key(&b.entity)));
  }
  for line in &block.data {
    let f = split_fields(line);
    if f.len() < 2 {
      warn!("Boundary line {} is short, skipped.", block.line);
      continue;
    }
    let entity = f[0].to_string();
    if let Some(dofs) = symbolic_dofs(f[1]) {
      model.boundaries.push(BoundarySpec {
        entity,
        dofs,
        magnitude: 0.0,
        kind: BoundaryKind::Fix,
        amplitude: amplitude.clone(),
      });
      continue;
    }
    let dof1 = want_id(f[1], block.line)? as usize;
    let dof2 = f
      .get(2)
      .filter(|s| !s.is_empty())
      .map(|s| want_id(s, block.line))
      .transpose()?
      .map(|d| d as usize)
      .unwrap_or(dof1);
    let magnitude = f
      .get(3)
      .map(|s| want_float(s, block.line))
      .transpose()?
      .unwrap_or(0.0);
    let mut dofs = [false; 6];
    for d in dof1.max(1)..=dof2.min(6) {
      dofs[d - 1] = true;
    }
    let kind = match type_param.as_deref() {
      Some("VELOCITY") => BoundaryKind::Velocity,
      Some("DISPLACEMENT") => BoundaryKind::Displacement,
      _ if f.len() >= 4 => BoundaryKind::Displacement,
      _ => BoundaryKind::Fix,
    };
    model.boundaries.push(BoundarySpec {
      entity,
      dofs,
      magnitude,
      kind,
      amplitude: amplitude.clone(),
    });
  }
  return Ok(());
}

/// Reads a point-load block, honoring the op-new clearing rule.
fn read_cload(block: &Block, model: &mut Model) -> Result<(), DeckError> {
  let amplitude = block.get("AMPLITUDE").map(str::to_string);
  if block.get("OP").map(name_key).as_deref() == Some("NEW") {
    let names: Vec<String> = block
      .data
      .iter()
      .filter_map(|l| split_fields(l).first().map(|s| name_key(s)))
      .collect();
    model.cloads.retain(|c| !names.contains(&name_key(&c.entity)));
  }
  for line in &block.data {
    let f = split_fields(line);
    if f.len() < 3 {
      warn!("Point load line {} is short, skipped.", block.line);
      continue;
    }
    model.cloads.push(PointLoad {
      entity: f[0].to_string(),
      dof: (want_id(f[1], block.line)? as usize).clamp(1, 6),
      magnitude: want_float(f[2], block.line)?,
      amplitude: amplitude.clone(),
    });
  }
  return Ok(());
}

/// Reads a distributed-load block; only the gravity label is in the
/// supported subset.
fn read_dload(block: &Block, model: &mut Model) -> Result<(), DeckError> {
  let amplitude = block.get("AMPLITUDE").map(str::to_string);
  for line in &block.data {
    let f = split_fields(line);
    if f.len() < 6 || name_key(f.get(1).unwrap_or(&"")) != "GRAV" {
      warn!("Distributed load on line {} is not gravity, skipped.", block.line);
      continue;
    }
    model.gravities.push(GravityLoad {
      elset: f[0].to_string(),
      magnitude: want_float(f[2], block.line)?,
      direction: Vector3::new(
        want_float(f[3], block.line)?,
        want_float(f[4], block.line)?,
        want_float(f[5], block.line)?,
      ),
      amplitude: amplitude.clone(),
    });
  }
  return Ok(());
}

/// Reads an amplitude block; pairs are preserved exactly as given.
fn read_amplitude(block: &Block, model: &mut Model) -> Result<(), DeckError> {
  let name = block.get("NAME").unwrap_or("").to_string();
  let mut values: Vec<f64> = Vec::new();
  for line in &block.data {
    for s in split_fields(line) {
      if s.is_empty() {
        continue;
      }
      values.push(want_float(s, block.line)?);
    }
  }
  if values.len() % 2 != 0 {
    return Err(DeckError::BadNumber {
      line: block.line,
      text: format!("amplitude \"{}\" has an odd value count", name),
    });
  }
  let pairs = values.into_iter().tuples().collect();
  model.amplitudes.push(Amplitude { name, pairs });
  return Ok(());
}
