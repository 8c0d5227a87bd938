//! This module implements material law selection and the material cards.
//! Each parameter bag is matched against candidate laws in priority
//! order; the first law whose required key set is *exactly* the present
//! key set wins -- extra keys disqualify a candidate just like missing
//! ones, so a plastic material never degrades silently to elastic.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use inp::model::{MatParams, Model};
use inp::util::name_key;
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::format::{float_field, Card};
use crate::writer::ModelDeck;

/// One output material law, carrying only the fields its card writes.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum MatLaw {
  /// Johnson-type elastoplastic law.
  PlasJohns {
    /// Density.
    rho: f64,
    /// Elastic modulus.
    young: f64,
    /// Poisson ratio.
    poisson: f64,
    /// Initial yield stress.
    a: f64,
    /// Hardening modulus.
    b: f64,
    /// Hardening exponent.
    n: f64,
  },
  /// One-term Ogden hyperelastic law.
  Ogden {
    /// Density.
    rho: f64,
    /// Shear modulus, twice the first reduced-polynomial coefficient.
    mu: f64,
    /// The fixed Ogden exponent for that mapping.
    alpha: f64,
    /// Incompressibility coefficient.
    d1: f64,
  },
  /// Linear-elastic law.
  Elastic {
    /// Density.
    rho: f64,
    /// Elastic modulus.
    young: f64,
    /// Poisson ratio.
    poisson: f64,
  },
}

impl MatLaw {
  /// The card mnemonic of the law.
  pub const fn keyword(&self) -> &'static str {
    return match self {
      Self::PlasJohns { .. } => "PLAS_JOHNS",
      Self::Ogden { .. } => "OGDEN",
      Self::Elastic { .. } => "LAW1",
    };
  }
}

/// The candidate laws in priority order, each with its required key set.
const CANDIDATES: &[(&str, &[&str])] = &[
  ("PLAS_JOHNS", &["density", "plastic", "poisson", "young"]),
  ("OGDEN", &["c10", "d1", "density"]),
  ("LAW1", &["density", "poisson", "young"]),
];

/// Picks the output law for one parameter bag. `None` means no candidate
/// matched exactly.
pub fn select_law(params: &MatParams) -> Option<MatLaw> {
  let present: BTreeSet<&str> = params.present().into_iter().collect();
  for (law, required) in CANDIDATES {
    let wanted: BTreeSet<&str> = required.iter().copied().collect();
    if present != wanted {
      continue;
    }
    return Some(match *law {
      "PLAS_JOHNS" => {
        let (a, b) = johnson_coefficients(&params.plastic);
        MatLaw::PlasJohns {
          rho: params.density.unwrap_or(0.0),
          young: params.young.unwrap_or(0.0),
          poisson: params.poisson.unwrap_or(0.0),
          a,
          b,
          n: 1.0,
        }
      },
      "OGDEN" => MatLaw::Ogden {
        rho: params.density.unwrap_or(0.0),
        mu: 2.0 * params.c10.unwrap_or(0.0),
        alpha: 2.0,
        d1: params.d1.unwrap_or(0.0),
      },
      _ => MatLaw::Elastic {
        rho: params.density.unwrap_or(0.0),
        young: params.young.unwrap_or(0.0),
        poisson: params.poisson.unwrap_or(0.0),
      },
    });
  }
  return None;
}

/// Yield-curve reduction: initial yield from the first point, hardening
/// modulus from the slope between the first two.
fn johnson_coefficients(curve: &[(f64, f64)]) -> (f64, f64) {
  let a = curve.first().map(|p| p.0).unwrap_or(0.0);
  let b = match (curve.first(), curve.get(1)) {
    (Some(p0), Some(p1)) if p1.1 > p0.1 => (p1.0 - p0.0) / (p1.1 - p0.1),
    _ => 0.0,
  };
  return (a, b);
}

/// Converts every material: one card per name, ids in declaration order.
/// Returns the case-folded name to id map. Also feeds the law globals.
pub fn convert_materials(
  model: &Model,
  ctx: &mut Context,
  deck: &mut ModelDeck,
) -> BTreeMap<String, u32> {
  let mut ids: BTreeMap<String, u32> = BTreeMap::new();
  for material in &model.materials {
    ctx.note_material(material.params.young, material.params.density);
    let law = match select_law(&material.params) {
      Some(law) => law,
      None => {
        ctx.warn(format!(
          "Material \"{}\" matches no law exactly, writing a zeroed elastic card.",
          material.name
        ));
        MatLaw::Elastic {
          rho: material.params.density.unwrap_or(0.0),
          young: material.params.young.unwrap_or(0.0),
          poisson: material.params.poisson.unwrap_or(0.0),
        }
      },
    };
    let header = format!("/MAT/{}/{}", law.keyword(), material.id);
    let mut card = Card::named(header, material.name.clone());
    match law {
      MatLaw::PlasJohns { rho, young, poisson, a, b, n } => {
        card.push_line(float_field(rho));
        card.push_line(format!("{}{}", float_field(young), float_field(poisson)));
        card.push_line(format!(
          "{}{}{}{}{}",
          float_field(a),
          float_field(b),
          float_field(n),
          float_field(0.0),
          float_field(0.0)
        ));
      },
      MatLaw::Ogden { rho, mu, alpha, d1 } => {
        card.push_line(float_field(rho));
        card.push_line(format!(
          "{}{}{}",
          float_field(mu),
          float_field(alpha),
          float_field(d1)
        ));
      },
      MatLaw::Elastic { rho, young, poisson } => {
        card.push_line(float_field(rho));
        card.push_line(format!("{}{}", float_field(young), float_field(poisson)));
      },
    }
    deck.materials.push(card);
    ids.insert(name_key(&material.name), material.id);
  }
  return ids;
}

#[cfg(test)]
mod tests {
  use super::*;

  /// Bag with just elastic constants and a density.
  fn steel() -> MatParams {
    return MatParams {
      density: Some(7.8e-9),
      young: Some(210000.0),
      poisson: Some(0.3),
      ..MatParams::default()
    };
  }

  #[test]
  fn elastic_only_picks_the_elastic_law() {
    let law = select_law(&steel()).unwrap();
    assert!(matches!(law, MatLaw::Elastic { .. }));
  }

  #[test]
  fn a_yield_curve_promotes_to_plastic() {
    let mut params = steel();
    params.plastic = vec![(200.0, 0.0), (300.0, 0.5)];
    let law = select_law(&params).unwrap();
    match law {
      MatLaw::PlasJohns { a, b, n, .. } => {
        assert_eq!(a, 200.0);
        assert_eq!(b, 200.0);
        assert_eq!(n, 1.0);
      },
      other => panic!("wrong law: {:?}", other),
    }
  }

  #[test]
  fn hyperelastic_is_its_own_exact_match() {
    let params = MatParams {
      density: Some(1.0e-9),
      c10: Some(0.5),
      d1: Some(0.01),
      ..MatParams::default()
    };
    match select_law(&params).unwrap() {
      MatLaw::Ogden { mu, alpha, .. } => {
        assert_eq!(mu, 1.0);
        assert_eq!(alpha, 2.0);
      },
      other => panic!("wrong law: {:?}", other),
    }
  }

  #[test]
  fn extra_keys_disqualify() {
    // elastic constants plus a stray hyperelastic coefficient: nothing
    // matches exactly
    let mut params = steel();
    params.c10 = Some(1.0);
    assert_eq!(select_law(&params), None);
  }

  #[test]
  fn density_alone_matches_nothing() {
    let params = MatParams { density: Some(1.0), ..MatParams::default() };
    assert_eq!(select_law(&params), None);
  }
}
