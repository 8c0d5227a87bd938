//! A command-line application to convert a keyword-block finite-element
//! deck into the two fixed-column card decks an explicit-dynamics solver
//! consumes: a model deck and a run-control deck.

#![allow(clippy::needless_return)]
#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use inp::prelude::*;
use log::*;
use rad_cards::prelude::*;

/// Exit code when a fatal error aborted the run before any output.
const EXIT_FATAL: i32 = 1;

/// Exit code when output was written but some element kept property id 0
/// and the source set/property bindings need fixing.
const EXIT_PARTIAL: i32 = 2;

/// The arguments passed to the converter.
#[derive(Clone, Debug, Parser)]
#[command(version, about)]
struct Cli {
  /// Never prompt; unsupported element topologies are always fatal.
  #[arg(short = 'b', long = "batch")]
  batch: bool,
  /// Print the elapsed conversion time at the end.
  #[arg(long = "timer")]
  timer: bool,
  /// Output extra/debug info while parsing and converting.
  #[arg(short = 'v', long = "verbose")]
  verbose: bool,
  /// Also write the parsed model as JSON next to the outputs.
  #[arg(long = "dump-model")]
  dump_model: bool,
  /// The input deck. Prompted for interactively when absent.
  input: Option<PathBuf>,
}

/// Asks for the input path on standard input.
fn prompt_for_path() -> Option<PathBuf> {
  print!("Input deck path: ");
  io::stdout().flush().ok()?;
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line).ok()?;
  let trimmed = line.trim();
  if trimmed.is_empty() {
    return None;
  }
  return Some(PathBuf::from(trimmed));
}

/// Asks the operator whether to drop an unsupported element block.
fn confirm_drop(err: &DeckError) -> bool {
  println!("{}", err);
  print!("Drop the offending block and continue? [y/N] ");
  if io::stdout().flush().is_err() {
    return false;
  }
  let mut line = String::new();
  if io::stdin().lock().read_line(&mut line).is_err() {
    return false;
  }
  return line.trim().eq_ignore_ascii_case("y");
}

/// Builds the model, re-running once with the drop option if the
/// operator elects to continue past an unsupported topology.
fn build(blocks: &[Block], batch: bool) -> Result<Model, DeckError> {
  match build_model(blocks, &BuildOptions::default()) {
    Ok(model) => return Ok(model),
    Err(err @ DeckError::UnsupportedTopology { .. }) if !batch => {
      if confirm_drop(&err) {
        let opts = BuildOptions { drop_unsupported: true };
        return build_model(blocks, &opts);
      }
      return Err(err);
    },
    Err(err) => return Err(err),
  }
}

/// Runs the conversion end to end; the exit code is the return value.
fn run(args: &Cli) -> i32 {
  let input = match args.input.clone().or_else(|| {
    if args.batch {
      None
    } else {
      prompt_for_path()
    }
  }) {
    Some(p) => p,
    None => {
      error!("No input deck supplied!");
      return EXIT_FATAL;
    },
  };
  if !input.is_file() {
    error!("Provided path either does not exist or is not a file!");
    return EXIT_FATAL;
  }
  let stem = input
    .file_stem()
    .and_then(|s| s.to_str())
    .unwrap_or("model")
    .to_string();
  info!("Reading {}...", input.display());
  let started = Instant::now();
  let deck_lines = match read_deck(&input).and_then(preprocess) {
    Ok(lines) => lines,
    Err(e) => {
      error!("{}", e);
      return EXIT_FATAL;
    },
  };
  let blocks = split_blocks(&deck_lines);
  let mut model = match build(&blocks, args.batch) {
    Ok(model) => model,
    Err(e) => {
      error!("{}", e);
      return EXIT_FATAL;
    },
  };
  info!(
    "Model: {} nodes, {} elements, {} element sets, {} node sets.",
    model.nodes.len(),
    model.elements.len(),
    model.elsets.len(),
    model.nsets.len()
  );
  let conversion = convert(&mut model, &stem);
  if args.dump_model {
    let dump_path = input.with_file_name(format!("{}_model.json", stem));
    match serde_json::to_string_pretty(&model) {
      Ok(json) => {
        if let Err(e) = std::fs::write(&dump_path, json) {
          warn!("Could not write {}: {}", dump_path.display(), e);
        } else {
          info!("Model dump written to {}.", dump_path.display());
        }
      },
      Err(e) => warn!("Model dump failed: {}", e),
    }
  }
  let (model_path, engine_path) =
    match write_decks(&conversion.deck, &conversion.engine, &input) {
      Ok(paths) => paths,
      Err(e) => {
        error!("{}", e);
        return EXIT_FATAL;
      },
    };
  info!("Wrote {}.", model_path.display());
  info!("Wrote {}.", engine_path.display());
  if !conversion.ctx.warnings.is_empty() {
    info!("{} warning(s) surfaced; see above.", conversion.ctx.warnings.len());
  }
  if args.timer {
    println!("Conversion took {:.3} s.", started.elapsed().as_secs_f64());
  }
  if conversion.ctx.incomplete {
    println!(
      "Some elements kept property id 0 -- fix the set/property bindings \
       in the source deck."
    );
    return EXIT_PARTIAL;
  }
  println!("All done.");
  return 0;
}

fn main() {
  let args = Cli::parse();
  let log_level = if args.verbose {
    LevelFilter::Debug
  } else {
    LevelFilter::Info
  };
  env_logger::builder().filter_level(log_level).init();
  std::process::exit(run(&args));
}
