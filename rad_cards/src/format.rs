//! This module implements the fixed-column field formats and the card
//! shape every artifact serializes through. The column constants are a
//! compatibility surface: integers sit right-justified in 10-character
//! slots, floats in 20-character slots with up to 7 significant digits
//! and a guaranteed decimal point.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// The decorative ruler line written above every card, 100 columns.
pub const RULER: &str = "#---1----|----2----|----3----|----4----|----5----|\
----6----|----7----|----8----|----9----|---10----|";

/// Renders a float with up to 7 significant digits, always keeping a
/// decimal point so the field reads as a real downstream.
pub fn fmt_sig(x: f64) -> String {
  if x == 0.0 {
    return "0.0".to_string();
  }
  let mag = x.abs().log10().floor() as i32;
  if (-4..7).contains(&mag) {
    let decimals = (6 - mag).max(0) as usize;
    let mut s = format!("{:.*}", decimals, x);
    if s.contains('.') {
      while s.ends_with('0') {
        s.pop();
      }
      if s.ends_with('.') {
        s.push('0');
      }
    } else {
      s.push_str(".0");
    }
    return s;
  }
  let sci = format!("{:.6E}", x);
  let (mant, exp) = sci.split_once('E').unwrap_or((sci.as_str(), "0"));
  let mut mant = mant.to_string();
  if mant.contains('.') {
    while mant.ends_with('0') {
      mant.pop();
    }
    if mant.ends_with('.') {
      mant.push('0');
    }
  } else {
    mant.push_str(".0");
  }
  let exp: i32 = exp.parse().unwrap_or(0);
  return format!("{}E{:+}", mant, exp);
}

/// A right-justified 10-column integer (or flag) field.
pub fn int_field<T: Display>(x: T) -> String {
  return format!("{:>10}", x);
}

/// A right-justified 10-column string field.
pub fn str_field(s: &str) -> String {
  return format!("{:>10}", s);
}

/// A right-justified 20-column float field.
pub fn float_field(x: f64) -> String {
  return format!("{:>20}", fmt_sig(x));
}

/// One output card: a typed header, an optional name line and data lines.
/// The writer puts the ruler above each one.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Card {
  /// The slash-path header, e.g. a card type plus its id.
  pub header: String,
  /// The name line, when the card kind carries one.
  pub name: Option<String>,
  /// The data lines, already fixed-column formatted.
  pub lines: Vec<String>,
}

impl Card {
  /// Makes a card with no name line.
  pub fn bare<S: Into<String>>(header: S) -> Self {
    return Self { header: header.into(), name: None, lines: Vec::new() };
  }

  /// Makes a named card.
  pub fn named<S: Into<String>, N: Into<String>>(header: S, name: N) -> Self {
    return Self {
      header: header.into(),
      name: Some(name.into()),
      lines: Vec::new(),
    };
  }

  /// Appends one data line.
  pub fn push_line<S: Into<String>>(&mut self, line: S) {
    self.lines.push(line.into());
  }

  /// Renders the card, ruler first, into a buffer.
  pub fn render(&self, out: &mut String) {
    out.push_str(RULER);
    out.push('\n');
    out.push_str(&self.header);
    out.push('\n');
    if let Some(ref name) = self.name {
      out.push_str(name);
      out.push('\n');
    }
    for line in &self.lines {
      out.push_str(line);
      out.push('\n');
    }
  }
}

/// Writes ids ten per line, each in a 10-column slot.
pub fn id_lines<T: Display + Copy>(ids: &[T]) -> Vec<String> {
  return ids
    .chunks(10)
    .map(|chunk| chunk.iter().map(|id| int_field(*id)).collect::<String>())
    .collect();
}
