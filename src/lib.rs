//! wallrave: a Monte Carlo Tree Search engine for a 5x5 wall-placement game.
//!
//! Two players alternately place walls on the 60 unit segments of a 5x5
//! grid. A wall that seals a region off from the board edge closes a zone;
//! zone sizes must all differ, and the player left without a legal wall
//! loses.
//!
//! ## Modules
//!
//! - [`constants`] - Board geometry and search parameters
//! - [`board`] - Wall/square indexing, bitmask helpers, wall notation
//! - [`position`] - Game state, zone detection and move execution
//! - [`symmetry`] - The eight board symmetries
//! - [`playout`] - Random game simulation for leaf evaluation
//! - [`solver`] - Exact search of nearly finished games
//! - [`mcts`] - Monte Carlo Tree Search with RAVE and proof propagation
//! - [`book`] - Opening book lookup, loading and generation
//! - [`arena`] - Parallel engine-versus-engine matches
//! - [`protocol`] - Referee session and interactive inspection
//!
//! ## Example
//!
//! ```
//! use wallrave::board::parse_wall;
//! use wallrave::mcts::{Engine, SearchConfig};
//! use wallrave::position::Position;
//!
//! // Create a new game and play a wall
//! let mut pos = Position::new();
//! pos.play(parse_wall("C3h").unwrap()).unwrap();
//!
//! // Search for a reply
//! let config = SearchConfig {
//!     max_iterations: 100,
//!     ..SearchConfig::default()
//! };
//! let mut engine = Engine::new(config);
//! let (_claim, reply) = engine.choose_move(&pos, false);
//! println!("Best move: {reply}");
//! ```

pub mod arena;
pub mod board;
pub mod book;
pub mod constants;
pub mod mcts;
pub mod playout;
pub mod position;
pub mod protocol;
pub mod solver;
pub mod symmetry;
