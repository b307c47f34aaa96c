//! paydirt - headless simulation CLI.
//!
//! Runs complete games against the built-in catalog (or JSON config) and
//! prints outcome summaries. Useful for balance smoke-testing.
//!
//! ## Usage
//!
//! ```
//! paydirt [OPTIONS]
//!
//! Options:
//!   --games N          Number of games to simulate (default 10)
//!   --seed N           Base RNG seed (default 1; game i uses seed + i)
//!   --symbols PATH     Symbol catalog JSON (default: built-in roster)
//!   --bonds PATH       Bond catalog JSON (default: built-in roster)
//!   --verbose          Print the per-spin event counts of each game
//! ```

use std::env;
use std::path::PathBuf;

use paydirt::catalog::{definitions, loader};
use paydirt::decision::RandomChoice;
use paydirt::round::{GameOutcome, Tuning};
use paydirt::{Catalog, GameSession};

struct Options {
    games: u64,
    seed: u64,
    symbols: Option<PathBuf>,
    bonds: Option<PathBuf>,
    verbose: bool,
}

fn parse_options() -> Options {
    let mut options = Options {
        games: 10,
        seed: 1,
        symbols: None,
        bonds: None,
        verbose: false,
    };
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--games" => {
                options.games = args
                    .next()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(options.games);
            }
            "--seed" => {
                options.seed = args
                    .next()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(options.seed);
            }
            "--symbols" => options.symbols = args.next().map(PathBuf::from),
            "--bonds" => options.bonds = args.next().map(PathBuf::from),
            "--verbose" => options.verbose = true,
            other => {
                eprintln!("unknown option: {other}");
                std::process::exit(2);
            }
        }
    }
    options
}

fn build_catalog(options: &Options) -> Catalog {
    match (&options.symbols, &options.bonds) {
        (Some(symbols), Some(bonds)) => loader::load_catalog_from_files(symbols, bonds),
        (Some(symbols), None) => Catalog::new(
            loader::load_symbols(
                &std::fs::read_to_string(symbols).unwrap_or_else(|_| "[]".into()),
            ),
            Vec::new(),
        ),
        _ => definitions::builtin(),
    }
}

fn main() {
    env_logger::init();
    let options = parse_options();
    let catalog = build_catalog(&options);
    if catalog.symbol_count() == 0 {
        eprintln!("catalog is empty; nothing to simulate");
        std::process::exit(1);
    }
    println!(
        "simulating {} game(s), {} symbols, {} bonds",
        options.games,
        catalog.symbol_count(),
        catalog.bonds().len()
    );

    let mut victories = 0u64;
    let mut total_rounds = 0u64;
    let mut best_coins = 0i64;
    for i in 0..options.games {
        let seed = options.seed + i;
        let mut session = GameSession::new(catalog.clone(), Tuning::default(), seed);
        let mut chooser = RandomChoice::new(seed.wrapping_mul(0x9E37_79B9));
        let outcome = session.run_to_completion(&mut chooser, 10_000);

        match outcome {
            Some(GameOutcome::Victory { rounds, coins }) => {
                victories += 1;
                total_rounds += rounds as u64;
                println!("game {i:>3} (seed {seed}): VICTORY after {rounds} rounds, {coins} coins");
            }
            Some(GameOutcome::Defeat {
                round,
                rent_due,
                coins,
            }) => {
                total_rounds += round as u64;
                println!(
                    "game {i:>3} (seed {seed}): defeat in round {round} ({coins}/{rent_due} rent)"
                );
            }
            None => println!("game {i:>3} (seed {seed}): step budget exhausted"),
        }
        best_coins = best_coins.max(session.best_score().best_coins);
        if options.verbose {
            println!("          {} events logged", session.events().len());
        }
    }

    let games = options.games.max(1);
    println!(
        "{victories}/{games} victories, avg round reached {:.1}, best coin peak {best_coins}",
        total_rounds as f64 / games as f64
    );
}
