//! Constants for board dimensions and search parameters.
//!
//! The board is a 5x5 grid of squares surrounded by 60 wall slots:
//! 30 horizontal walls in 6 rows of 5, and 30 vertical walls in 5 rows of 6.
//! The perimeter slots are ordinary walls, not pre-placed borders.

use std::time::Duration;

// =============================================================================
// Board Geometry
// =============================================================================

/// Number of squares along one side of the board.
pub const N: usize = 5;

/// Total number of squares.
pub const NUM_SQUARES: usize = N * N;

/// Number of horizontal wall slots. Horizontal walls come first in the index space.
pub const NUM_HORIZONTAL: usize = (N + 1) * N;

/// Total number of wall slots.
pub const NUM_WALLS: usize = 2 * NUM_HORIZONTAL;

/// Number of distinct zone sizes tracked (0 = "closes nothing", 1..=25).
pub const NUM_SIZES: usize = NUM_SQUARES + 1;

/// Sentinel neighbour used for squares on the board edge.
pub const OUTSIDE: usize = NUM_SQUARES;

// =============================================================================
// MCTS Parameters
// =============================================================================

/// Number of random rollouts run from each expanded leaf.
pub const SAMPLES: usize = 10;

/// Leaves with at most this many legal moves are solved exactly.
pub const SOLVER_THRESHOLD: usize = 5;

/// Maximum number of live states in the transposition table.
pub const MAX_NODES: usize = 120_000;

/// Hard cap on simulations per decision.
pub const MAX_ITERATIONS: usize = 200_000;

/// Cap on a node's visit counter.
pub const MAX_NODE_VISITS: u32 = 200_000;

/// Opponent plies pick a uniformly random action one time in this many.
pub const OPPONENT_RANDOM_ONE_IN: u32 = 10;

/// Below this turn, the searching side only instantiates known opening moves.
pub const OPENING_TURNS: usize = 20;

// =============================================================================
// Time Management
// =============================================================================

/// Soft per-move budget before time trouble.
pub const DEFAULT_MOVE_TIME: Duration = Duration::from_millis(2000);

/// Per-move ceiling once the game reaches [`TIME_TROUBLE_TURN`].
pub const MAX_MOVE_TIME: Duration = Duration::from_millis(2750);

/// Extra time allowed past the soft budget waiting for the decision to settle.
pub const CHECK_TIME: Duration = Duration::from_millis(250);

/// Whole-game budget shared by all decisions.
pub const TOTAL_TIME: Duration = Duration::from_secs(30);

/// Time charged up front for reading and writing moves.
pub const IO_OVERHEAD: Duration = Duration::from_millis(100);

/// Turn from which the per-move budget is derived from the remaining game budget.
pub const TIME_TROUBLE_TURN: usize = 18;

// =============================================================================
// Claiming a Win
// =============================================================================

/// Earliest turn at which a statistical (unproven) win may be claimed.
pub const CLAIM_TURN: usize = 18;

/// Minimum direct value of the chosen action for a statistical claim.
pub const CLAIM_VALUE: f32 = 0.34;
