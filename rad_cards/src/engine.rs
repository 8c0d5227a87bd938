//! This module implements the engine control generator: run time,
//! output intervals and the timestep card, derived from the step
//! keywords of the input deck.

use inp::model::Model;
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::format::{float_field, Card, RULER};
use crate::writer::FORMAT_YEAR;

/// Final time used when the deck never declared a dynamic step.
const DEFAULT_T_FINAL: f64 = 1.0;

/// Animation interval count used when the deck never asked for one.
const DEFAULT_INTERVALS: u32 = 20;

/// Time-history sampling density relative to the final time.
const HISTORY_STEPS: f64 = 1000.0;

/// Scale factor on the nodal timestep card.
const DT_SCALE: f64 = 0.9;

/// The run-control deck: a flat card list under the engine banner.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineDeck {
  /// The cards, in output order.
  pub cards: Vec<Card>,
}

impl EngineDeck {
  /// Renders the whole run-control deck.
  pub fn render(&self) -> String {
    let mut out = String::new();
    out.push_str("#RADIOSS ENGINE\n");
    for card in &self.cards {
      card.render(&mut out);
    }
    out.push_str(RULER);
    out.push('\n');
    return out;
  }
}

/// Builds the run-control deck from the step keywords.
pub fn build_engine(model: &Model, stem: &str, ctx: &mut Context) -> EngineDeck {
  let t_final = match model.step.t_final {
    Some(t) => t,
    None => {
      ctx.warn(format!(
        "No dynamic step in the deck; final time defaults to {}.",
        DEFAULT_T_FINAL
      ));
      DEFAULT_T_FINAL
    },
  };
  let intervals = model.step.field_intervals.unwrap_or(DEFAULT_INTERVALS).max(1);
  let anim_dt = t_final / intervals as f64;
  let history_dt = t_final / HISTORY_STEPS;
  let dt_floor = model.step.dt_initial.unwrap_or(0.0);
  let mut cards: Vec<Card> = Vec::new();
  cards.push(Card::bare(format!("/VERS/{}", FORMAT_YEAR)));
  let mut run = Card::bare(format!("/RUN/{}/1", stem));
  run.push_line(float_field(t_final));
  cards.push(run);
  let mut tfile = Card::bare("/TFILE");
  tfile.push_line(float_field(history_dt));
  cards.push(tfile);
  let mut anim = Card::bare("/ANIM/DT");
  anim.push_line(format!("{}{}", float_field(0.0), float_field(anim_dt)));
  cards.push(anim);
  cards.push(Card::bare("/ANIM/VECT/DISP"));
  cards.push(Card::bare("/ANIM/VECT/VEL"));
  cards.push(Card::bare("/ANIM/ELEM/VONM"));
  let mut dt = Card::bare("/DT/NODA/CST");
  dt.push_line(format!("{}{}", float_field(DT_SCALE), float_field(dt_floor)));
  cards.push(dt);
  return EngineDeck { cards };
}
