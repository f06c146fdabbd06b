//! Monte Carlo playouts (random game simulation).
//!
//! A playout plays uniformly random legal walls until the player to move has
//! none left. Outcomes are scored from White's point of view: `+1.0` when
//! White wins, `-1.0` when Black wins.

use crate::board::Wall;
use crate::constants::NUM_WALLS;
use crate::mcts::Stats;
use crate::position::{Color, Position};

/// All-moves-as-first observations for one wall, split by who played it.
#[derive(Copy, Clone, Debug, Default)]
pub struct AmafStats {
    pub white: Stats,
    pub black: Stats,
    pub any: Stats,
}

impl AmafStats {
    /// True if any playout played this wall.
    #[inline]
    pub fn is_observed(&self) -> bool {
        self.white.visits > 0 || self.black.visits > 0 || self.any.visits > 0
    }

    fn record(&mut self, color: Color, value: f32) {
        match color {
            Color::White => self.white.update(value, 1),
            Color::Black => self.black.update(value, 1),
        }
        self.any.update(value, 1);
    }
}

/// Play random moves until the game ends.
///
/// Every move played is appended to `history` when given.
/// Returns the outcome from White's point of view.
pub fn mcplayout(
    pos: &mut Position,
    rng: &mut fastrand::Rng,
    mut history: Option<&mut Vec<(Color, Wall)>>,
) -> f32 {
    while let Some(mv) = pos.random_move(rng) {
        if let Some(history) = history.as_deref_mut() {
            history.push((pos.to_move(), mv.wall));
        }
        pos.apply_move(&mv);
    }
    // The player left without a move loses.
    pos.to_move().opponent().sign()
}

/// Run `samples` independent playouts from `pos` and average their outcomes.
///
/// Each wall played in any playout is recorded in `amaf` with that playout's outcome.
pub fn sample_playouts(
    pos: &Position,
    samples: usize,
    rng: &mut fastrand::Rng,
    amaf: &mut [AmafStats; NUM_WALLS],
) -> f32 {
    if samples == 0 {
        return 0.0;
    }
    let mut total = 0.0;
    let mut history = Vec::with_capacity(NUM_WALLS);

    for _ in 0..samples {
        history.clear();
        let mut tmp = pos.clone();
        let value = mcplayout(&mut tmp, rng, Some(&mut history));
        total += value;
        for &(color, wall) in &history {
            amaf[wall].record(color, value);
        }
    }

    total / samples as f32
}

/// Count how often `random_move` picks each wall over `samples` draws from `pos`.
pub fn random_move_histogram(
    pos: &Position,
    samples: usize,
    rng: &mut fastrand::Rng,
) -> [usize; NUM_WALLS] {
    let mut counts = [0; NUM_WALLS];
    for _ in 0..samples {
        if let Some(mv) = pos.random_move(rng) {
            counts[mv.wall] += 1;
        }
    }
    counts
}
