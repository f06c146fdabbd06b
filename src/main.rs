//! wallrave: a Monte Carlo Tree Search player for the 5x5 wall-placement game.
//!
//! ## Usage
//!
//! - `wallrave` or `wallrave play` - Play against a referee on stdin/stdout
//! - `wallrave debug <walls>...` - Inspect the search at a position
//! - `wallrave arena` - Play two configurations against each other
//! - `wallrave opening --depth <n>` - Generate opening book entries
//! - `wallrave bench-playout` / `bench-simulation` - Throughput benchmarks
//! - `wallrave bench-random-move --turns <n>` - Check random move uniformity

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use log::info;

use wallrave::arena::play_match;
use wallrave::board::{parse_wall, str_wall};
use wallrave::book::{self, OpeningBook};
use wallrave::constants::NUM_WALLS;
use wallrave::mcts::{Engine, SearchConfig};
use wallrave::playout::{AmafStats, mcplayout, random_move_histogram, sample_playouts};
use wallrave::position::{Color, Position};
use wallrave::protocol::{Session, inspect};

/// wallrave: MCTS+RAVE engine for the wall-placement game
#[derive(Parser)]
#[command(name = "wallrave")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    search: SearchArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Clone)]
struct SearchArgs {
    /// Random seed (default: from the system)
    #[arg(long, global = true)]
    seed: Option<u64>,
    /// Time per move before move 18, in milliseconds
    #[arg(long, global = true)]
    move_time_ms: Option<u64>,
    /// Time for the whole game, in milliseconds
    #[arg(long, global = true)]
    total_time_ms: Option<u64>,
    /// Playouts per evaluated leaf
    #[arg(long, global = true)]
    samples: Option<usize>,
    /// Simulations per move
    #[arg(long, global = true)]
    max_iterations: Option<usize>,
    /// Search until the iteration cap regardless of time
    #[arg(long, global = true)]
    no_time_limit: bool,
    /// Opening book file
    #[arg(long, global = true)]
    book: Option<PathBuf>,
}

impl SearchArgs {
    fn config(&self) -> SearchConfig {
        let mut config = SearchConfig {
            seed: self.seed,
            ..SearchConfig::default()
        };
        if let Some(ms) = self.move_time_ms {
            config.default_move_time = Duration::from_millis(ms);
        }
        if let Some(ms) = self.total_time_ms {
            config.total_time = Duration::from_millis(ms);
        }
        if let Some(samples) = self.samples {
            config.samples = samples;
        }
        if let Some(iterations) = self.max_iterations {
            config.max_iterations = iterations;
        }
        config
    }

    fn book(&self) -> anyhow::Result<OpeningBook> {
        match &self.book {
            Some(path) => {
                let book = OpeningBook::load(path)
                    .with_context(|| format!("loading opening book {}", path.display()))?;
                info!("loaded {} opening book entries", book.len());
                Ok(book)
            }
            None => Ok(OpeningBook::default()),
        }
    }

    fn engine(&self) -> anyhow::Result<Engine> {
        Ok(Engine::with_book(self.config(), self.book()?))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Play a game against a referee over stdin/stdout
    Play,
    /// Search a position and browse the statistics interactively
    Debug {
        /// Walls leading to the position, e.g. C3h B2v
        walls: Vec<String>,
        /// Simulations per inspected position
        #[arg(long, default_value_t = 100_000)]
        iterations: usize,
    },
    /// Play the configuration against a variant of itself
    Arena {
        #[arg(long, default_value_t = 10)]
        games: usize,
        /// Playouts per leaf for the second player
        #[arg(long)]
        opponent_samples: Option<usize>,
        /// Simulations per move for the second player
        #[arg(long)]
        opponent_max_iterations: Option<usize>,
    },
    /// Generate opening book entries
    Opening {
        #[arg(long, default_value_t = 2)]
        depth: usize,
        /// Write entries here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Measure random playout throughput
    BenchPlayout {
        #[arg(long, default_value_t = 100_000)]
        count: usize,
    },
    /// Measure search simulation throughput from the empty board
    BenchSimulation {
        #[arg(long, default_value_t = 100_000)]
        count: usize,
    },
    /// Print how often each legal wall is drawn as a random move
    BenchRandomMove {
        /// Random walls played before sampling
        #[arg(long, default_value_t = 0)]
        turns: usize,
        #[arg(long, default_value_t = 1_000_000)]
        count: usize,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();
    let args = &cli.search;

    match cli.command.unwrap_or(Commands::Play) {
        Commands::Play => {
            let mut session = Session::new(args.engine()?, !args.no_time_limit);
            session.run(io::stdin().lock(), io::stdout().lock())?;
        }
        Commands::Debug { walls, iterations } => {
            let walls = walls
                .iter()
                .map(|w| parse_wall(w))
                .collect::<Result<Vec<_>, _>>()?;
            let pos = Position::from_walls(&walls).context("replaying walls")?;
            let mut engine = args.engine()?;
            inspect(&mut engine, &pos, iterations, io::stdin().lock(), io::stdout().lock())?;
        }
        Commands::Arena {
            games,
            opponent_samples,
            opponent_max_iterations,
        } => {
            let first = args.config();
            let mut second = first.reseeded(1_000_003);
            if let Some(samples) = opponent_samples {
                second.samples = samples;
            }
            if let Some(iterations) = opponent_max_iterations {
                second.max_iterations = iterations;
            }
            let summary = play_match(&first, &second, games, !args.no_time_limit);
            println!(
                "{}-{} score={:.3} plies={:.1}",
                summary.first_wins,
                summary.second_wins,
                summary.score(),
                summary.average_length
            );
        }
        Commands::Opening { depth, output } => {
            let config = SearchConfig {
                transformation: Some(0),
                ..args.config()
            };
            let mut engine = Engine::new(config);
            let entries = book::generate(&mut engine, depth);
            let text: String = entries.iter().map(|e| format!("{e}\n")).collect();
            match output {
                Some(path) => std::fs::write(&path, text)
                    .with_context(|| format!("writing {}", path.display()))?,
                None => io::stdout().write_all(text.as_bytes())?,
            }
            info!("{} entries generated", entries.len());
        }
        Commands::BenchPlayout { count } => bench_playout(args.seed, count),
        Commands::BenchSimulation { count } => bench_simulation(Engine::new(args.config()), count),
        Commands::BenchRandomMove { turns, count } => bench_random_move(args.seed, turns, count),
    }
    Ok(())
}

fn bench_playout(seed: Option<u64>, count: usize) {
    let mut rng = seed.map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);
    let start = Instant::now();
    let mut white_wins = 0;
    for _ in 0..count {
        let mut pos = Position::new();
        if mcplayout(&mut pos, &mut rng, None) == Color::White.sign() {
            white_wins += 1;
        }
    }
    let dt = start.elapsed().as_secs_f64();
    println!(
        "{count} playouts in {dt:.2}s: {:.1}k/s, white wins {:.1}%",
        0.001 * count as f64 / dt.max(1e-9),
        100.0 * white_wins as f64 / count.max(1) as f64
    );

    // Leaf evaluation with AMAF collection, as the search runs it.
    let mut amaf = [AmafStats::default(); NUM_WALLS];
    let start = Instant::now();
    let value = sample_playouts(&Position::new(), count, &mut rng, &mut amaf);
    let dt = start.elapsed().as_secs_f64();
    println!("sampled value {value:.3} in {dt:.2}s");
}

fn bench_simulation(mut engine: Engine, count: usize) {
    let pos = Position::new();
    let start = Instant::now();
    for _ in 0..count {
        engine.simulate(&pos);
    }
    let dt = start.elapsed().as_secs_f64();
    println!(
        "{count} simulations in {dt:.2}s: {:.1}k/s, {} nodes",
        0.001 * count as f64 / dt.max(1e-9),
        engine.table_len()
    );
}

fn bench_random_move(seed: Option<u64>, turns: usize, count: usize) {
    let mut rng = seed.map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);
    let mut pos = Position::new();
    while pos.turns < turns {
        let Some(mv) = pos.random_move(&mut rng) else {
            break;
        };
        pos.apply_move(&mv);
    }
    println!("{pos}");

    let counts = random_move_histogram(&pos, count, &mut rng);
    for (wall, &n) in counts.iter().enumerate().filter(|&(_, &n)| n > 0) {
        println!(
            "{} => {:.3}%",
            str_wall(wall),
            100.0 * n as f64 / count.max(1) as f64
        );
    }
    let legal = pos.legal_move_count();
    println!(
        "{legal} legal moves, expecting {:.3}% each",
        100.0 / legal.max(1) as f64
    );
}
