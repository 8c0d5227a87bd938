//! This module implements the conversion context: the four shared id
//! spaces, the law-selection globals and the warning sink. One value of
//! it is threaded mutably through every converter call -- there are no
//! process-wide counters anywhere.

use log::warn;
use serde::{Deserialize, Serialize};

/// The mutable state every converter shares. Allocation order out of the
/// four counters is a pure function of converter call order, which is why
/// that order is fixed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Context {
  /// The group space: node groups, element groups, surfaces, skews and
  /// transforms all draw from it.
  group_id: u32,
  /// The function space.
  function_id: u32,
  /// The interface space, shared by contacts and ties of every kind.
  interface_id: u32,
  /// The element space; seeded with the element high-water mark so rigid
  /// bodies can borrow ids above it.
  element_id: u64,
  /// Largest elastic modulus seen; scales synthetic spring stiffness.
  pub max_young: f64,
  /// Largest density seen; scales synthetic spring mass.
  pub max_density: f64,
  /// Set when any element kept property id 0; turns the run into a
  /// partial success the caller reports distinctly.
  pub incomplete: bool,
  /// Every downgraded problem, in the order it surfaced.
  pub warnings: Vec<String>,
}

impl Default for Context {
  fn default() -> Self {
    return Self::new();
  }
}

impl Context {
  /// Makes a fresh context with all spaces empty.
  pub fn new() -> Self {
    return Self {
      group_id: 0,
      function_id: 0,
      interface_id: 0,
      element_id: 0,
      max_young: 0.0,
      max_density: 0.0,
      incomplete: false,
      warnings: Vec::new(),
    };
  }

  /// Allocates the next group id.
  pub fn next_group(&mut self) -> u32 {
    self.group_id += 1;
    return self.group_id;
  }

  /// Allocates the next function id.
  pub fn next_function(&mut self) -> u32 {
    self.function_id += 1;
    return self.function_id;
  }

  /// Allocates the next interface id.
  pub fn next_interface(&mut self) -> u32 {
    self.interface_id += 1;
    return self.interface_id;
  }

  /// Seeds the element space with the mesh high-water mark.
  pub fn seed_elements(&mut self, max_element_id: u64) {
    self.element_id = self.element_id.max(max_element_id);
  }

  /// Borrows the next id from the element space.
  pub fn next_element(&mut self) -> u64 {
    self.element_id += 1;
    return self.element_id;
  }

  /// Notes a new elastic modulus and density sighting.
  pub fn note_material(&mut self, young: Option<f64>, density: Option<f64>) {
    if let Some(e) = young {
      self.max_young = self.max_young.max(e);
    }
    if let Some(rho) = density {
      self.max_density = self.max_density.max(rho);
    }
  }

  /// Logs and records a downgraded problem.
  pub fn warn<S: Into<String>>(&mut self, msg: S) {
    let msg = msg.into();
    warn!("{}", msg);
    self.warnings.push(msg);
  }
}
