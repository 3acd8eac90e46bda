//! Hex Marbles entry point
//!
//! Headless demo: builds a board, lets the autoplay driver play one session
//! and prints what the HUD would show.
//!
//! Usage: `hex-marbles [board.json] [settings.json]`
//! Set `HEX_MARBLES_SEED` to replay a specific board.

use std::error::Error;

use rand::SeedableRng;
use rand_pcg::Pcg32;

use hex_marbles::events::TextDisplay;
use hex_marbles::sim::{AutoplayLimits, AutoplayOutcome, GameBoard, autoplay};
use hex_marbles::{BoardConfig, Command, Settings};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    log::info!("Hex Marbles (headless) starting...");

    let mut args = std::env::args().skip(1);
    let mut config = match args.next() {
        Some(path) => BoardConfig::load(path)?,
        None => BoardConfig::default(),
    };
    if let Ok(seed) = std::env::var("HEX_MARBLES_SEED") {
        config.seed = Some(seed.trim().parse()?);
    }
    let seed = config.seed.unwrap_or_else(rand::random);
    config.seed = Some(seed);
    let settings = args.next().map(Settings::load).unwrap_or_default();

    let mut board = GameBoard::with_settings(config, settings)?;
    board.begin_game();

    let mut rng = Pcg32::seed_from_u64(seed.wrapping_add(1));
    let report = autoplay::play(&mut board, AutoplayLimits::default(), &mut rng);

    // Keep only the latest value of each HUD text
    let mut play_time = String::new();
    let mut counter = String::new();
    let mut win_text = None;
    let mut issued = 0usize;
    for command in board.drain_commands() {
        issued += 1;
        if let Command::SetText { display, text } = command {
            match display {
                TextDisplay::PlayTime => play_time = text,
                TextDisplay::CaughtCounter => counter = text,
                TextDisplay::WinTime => win_text = Some(text),
            }
        }
    }

    let layout = board.layout();
    println!("Board {}x{} (seed {})", layout.width, layout.height, seed);
    let buckets: Vec<&str> = layout
        .buckets
        .iter()
        .map(|b| if b.has_caught() { "[o]" } else { "[ ]" })
        .collect();
    println!("Buckets  {}", buckets.join(" "));
    println!("Caught   {}", counter);
    println!("Time     {}", play_time);
    println!(
        "Drops {}, rotations {}, bucket landings {}, floor landings {}, {} host commands",
        report.drops, report.rotations, report.bucket_landings, report.floor_landings, issued
    );

    match report.outcome {
        AutoplayOutcome::Won { .. } => {
            println!("{}", win_text.unwrap_or_else(|| "You have won!".to_string()));
        }
        AutoplayOutcome::OutOfDrops => println!("Gave up after {} drops", report.drops),
        AutoplayOutcome::Jammed => println!("A marble got jammed for good"),
        AutoplayOutcome::NotRunning => println!("The game never started"),
    }

    Ok(())
}
