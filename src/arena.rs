//! Engine-versus-engine matches.
//!
//! Games are independent, so a match runs them in parallel with rayon. Each
//! game gets fresh engines with per-game seeds, and colors alternate so
//! neither configuration always moves first.

use log::{debug, info};
use rayon::prelude::*;

use crate::board::Wall;
use crate::mcts::{Engine, SearchConfig};
use crate::position::{Color, Position};

/// A finished game.
#[derive(Clone, Debug)]
pub struct GameRecord {
    pub winner: Color,
    pub moves: Vec<Wall>,
}

/// Play one game between two configurations.
pub fn play_game(white: &SearchConfig, black: &SearchConfig, use_time_constraint: bool) -> GameRecord {
    let mut engines = [Engine::new(white.clone()), Engine::new(black.clone())];
    let mut pos = Position::new();
    let mut moves = Vec::new();

    while !pos.is_end_game() {
        let engine = &mut engines[pos.to_move().index()];
        let (claim, mv) = engine.choose_move(&pos, use_time_constraint);
        debug!("{}{} {mv}", pos.turns, if claim { "!" } else { "" });
        pos.apply_move(&mv);
        moves.push(mv.wall);
    }

    let winner = pos.to_move().opponent();
    GameRecord { winner, moves }
}

/// Outcome of a match, from the first configuration's side.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MatchSummary {
    pub games: usize,
    pub first_wins: usize,
    pub second_wins: usize,
    pub average_length: f64,
}

impl MatchSummary {
    /// Fraction of games won by the first configuration.
    pub fn score(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.first_wins as f64 / self.games as f64
        }
    }
}

/// Play `games` games between `first` and `second`.
///
/// The first configuration takes White in even-numbered games.
pub fn play_match(
    first: &SearchConfig,
    second: &SearchConfig,
    games: usize,
    use_time_constraint: bool,
) -> MatchSummary {
    let results: Vec<(bool, GameRecord)> = (0..games)
        .into_par_iter()
        .map(|g| {
            let offset = g as u64;
            let (a, b) = (first.reseeded(offset), second.reseeded(offset));
            let first_is_white = g % 2 == 0;
            let record = if first_is_white {
                play_game(&a, &b, use_time_constraint)
            } else {
                play_game(&b, &a, use_time_constraint)
            };
            let first_won = (record.winner == Color::White) == first_is_white;
            (first_won, record)
        })
        .collect();

    let first_wins = results.iter().filter(|(won, _)| *won).count();
    let total_length: usize = results.iter().map(|(_, r)| r.moves.len()).sum();
    let summary = MatchSummary {
        games,
        first_wins,
        second_wins: games - first_wins,
        average_length: if games == 0 {
            0.0
        } else {
            total_length as f64 / games as f64
        },
    };
    info!(
        "match over: {}-{} ({:.1}%), {:.1} plies per game",
        summary.first_wins,
        summary.second_wins,
        100.0 * summary.score(),
        summary.average_length
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::NUM_WALLS;

    fn quick_config(seed: u64) -> SearchConfig {
        SearchConfig {
            seed: Some(seed),
            transformation: Some(0),
            max_iterations: 20,
            samples: 2,
            max_nodes: 2_000,
            ..SearchConfig::default()
        }
    }

    #[test]
    fn test_game_is_replayable() {
        let record = play_game(&quick_config(1), &quick_config(2), false);
        assert!(!record.moves.is_empty());
        assert!(record.moves.len() <= NUM_WALLS);

        let pos = Position::from_walls(&record.moves).unwrap();
        assert!(pos.is_end_game());
        assert_eq!(pos.winner(), Some(record.winner));
    }

    #[test]
    fn test_match_counts_games() {
        let summary = play_match(&quick_config(3), &quick_config(4), 2, false);
        assert_eq!(summary.games, 2);
        assert_eq!(summary.first_wins + summary.second_wins, 2);
        assert!(summary.average_length > 0.0);
        assert!((0.0..=1.0).contains(&summary.score()));
    }
}
