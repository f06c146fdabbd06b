//! Exact win/loss search for nearly finished games.
//!
//! Every move only shrinks the set of legal moves, so a position with a
//! handful of legal moves has a tiny game tree and can be searched completely.

use crate::board::Wall;
use crate::position::Position;

/// Find a move after which the opponent has no winning reply.
///
/// Returns `None` when every move loses against best play, including when
/// there is no legal move at all.
pub fn winning_action(pos: &Position) -> Option<Wall> {
    pos.legal_moves()
        .find(|mv| {
            let mut next = pos.clone();
            next.apply_move(mv);
            winning_action(&next).is_none()
        })
        .map(|mv| mv.wall)
}
