//! Game state and move execution.
//!
//! A move places one wall. When the new wall seals off a region of squares
//! from the board edge, that region becomes a zone: every wall touching it
//! becomes unplayable, and no later zone may have the same size. A player
//! with no legal wall left loses.
//!
//! Besides the exact history of placed walls, the position keeps a
//! canonical `state` in which each sealed zone is reduced to its border.
//! Different move orders producing the same sealed geometry share one state,
//! which is what the search uses as its transposition key.

use std::fmt;

use thiserror::Error;

use crate::board::{
    ALL_SIZES, ALL_WALLS, Bitmask, ENDPOINTS, NEIGHBORS, SIDES, Square, WALLS_OF_SQUARE, Wall,
    add, contains, flag, horizontal, intersects, remove, str_wall, vertical,
};
use crate::constants::{N, NUM_SQUARES, NUM_WALLS, OUTSIDE};

/// The two players. White moves on even turns.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    #[inline]
    pub fn opponent(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Sign of an outcome favourable to this color, from White's point of view.
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Color::White => 1.0,
            Color::Black => -1.0,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// A region sealed off by a wall placement.
///
/// A zone of size 0 means the move closes nothing.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Zone {
    /// Enclosed squares
    pub squares: Bitmask,
    /// Every wall touching an enclosed square
    pub walls: Bitmask,
    /// Walls separating the zone from the rest of the board
    pub border: Bitmask,
    /// Number of enclosed squares
    pub size: usize,
}

impl Zone {
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.size > 0
    }

    /// Add a square. Walls shared by two enclosed squares cancel out of the border.
    #[inline]
    fn enter(&mut self, square: Square) {
        self.size += 1;
        add(&mut self.squares, square);
        self.walls |= WALLS_OF_SQUARE[square];
        self.border ^= WALLS_OF_SQUARE[square];
    }
}

/// A wall together with the zone it closes.
#[derive(Copy, Clone, Debug)]
pub struct Move {
    pub wall: Wall,
    pub zone: Zone,
}

impl PartialEq for Move {
    fn eq(&self, other: &Self) -> bool {
        self.wall == other.wall
    }
}

impl Eq for Move {}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&str_wall(self.wall))
    }
}

/// Result of attempting to play an externally supplied wall.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("illegal move {}: wall already placed or inside a zone", notation(.0))]
    Unavailable(Wall),
    #[error("illegal move {}: a zone of size {size} already exists", notation(.wall))]
    SizeTaken { wall: Wall, size: usize },
    #[error("illegal move: wall index {0} out of range")]
    OutOfRange(Wall),
}

fn notation(wall: &Wall) -> String {
    str_wall(*wall)
}

/// The authoritative game state.
#[derive(Clone, Debug)]
pub struct Position {
    /// Every wall placed so far
    pub placed: Bitmask,
    /// Canonical key: placed walls with each zone collapsed to its border
    pub state: Bitmask,
    /// Walls neither placed nor swallowed by a zone
    pub possible_walls: Bitmask,
    /// Zone sizes still available; bit 0 is never cleared
    pub possible_sizes: Bitmask,
    /// Squares inside closed zones
    pub closed: Bitmask,
    /// Number of moves played
    pub turns: usize,
    /// Compacted list of possible walls, in increasing order
    candidates: [u8; NUM_WALLS],
    candidates_len: usize,
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

impl Position {
    pub fn new() -> Self {
        Self {
            placed: 0,
            state: 0,
            possible_walls: ALL_WALLS,
            possible_sizes: ALL_SIZES,
            closed: 0,
            turns: 0,
            candidates: std::array::from_fn(|w| w as u8),
            candidates_len: NUM_WALLS,
        }
    }

    /// Build a position by playing a sequence of walls.
    pub fn from_walls(walls: &[Wall]) -> Result<Self, MoveError> {
        let mut pos = Self::new();
        for &wall in walls {
            pos.play(wall)?;
        }
        Ok(pos)
    }

    /// The player whose turn it is.
    #[inline]
    pub fn to_move(&self) -> Color {
        if self.turns % 2 == 0 {
            Color::White
        } else {
            Color::Black
        }
    }

    #[inline]
    pub fn is_possible_wall(&self, wall: Wall) -> bool {
        contains(self.possible_walls, wall)
    }

    #[inline]
    pub fn is_possible_size(&self, size: usize) -> bool {
        contains(self.possible_sizes, size)
    }

    /// Walls that are still candidates, in increasing order.
    #[inline]
    pub fn candidates(&self) -> impl Iterator<Item = Wall> + '_ {
        self.candidates[..self.candidates_len].iter().map(|&w| w as Wall)
    }

    /// Pair a wall with the zone it would close.
    pub fn get_move(&self, wall: Wall) -> Move {
        Move {
            wall,
            zone: self.find_zone(wall),
        }
    }

    /// All legal moves, in wall-index order.
    ///
    /// A wall is legal if it is still possible and the size of the zone it
    /// closes (0 for none) has not been used yet.
    pub fn legal_moves(&self) -> impl Iterator<Item = Move> + '_ {
        self.candidates().filter_map(move |wall| {
            let zone = self.find_zone(wall);
            self.is_possible_size(zone.size)
                .then_some(Move { wall, zone })
        })
    }

    pub fn legal_move_count(&self) -> usize {
        self.legal_moves().count()
    }

    /// The game ends when the player to move has no legal wall; that player loses.
    pub fn is_end_game(&self) -> bool {
        self.legal_moves().next().is_none()
    }

    /// Winner of a finished game.
    pub fn winner(&self) -> Option<Color> {
        self.is_end_game().then(|| self.to_move().opponent())
    }

    /// Apply a move produced by this position (see [`Position::get_move`]).
    pub fn apply_move(&mut self, mv: &Move) {
        debug_assert!(self.is_possible_wall(mv.wall), "wall {} unavailable", mv.wall);
        debug_assert!(self.is_possible_size(mv.zone.size), "size {} taken", mv.zone.size);

        add(&mut self.placed, mv.wall);
        add(&mut self.state, mv.wall);
        remove(&mut self.possible_walls, mv.wall);

        if mv.zone.is_closed() {
            self.possible_walls &= !mv.zone.walls;
            self.state &= !mv.zone.walls;
            self.state |= mv.zone.border;
            self.closed |= mv.zone.squares;
            remove(&mut self.possible_sizes, mv.zone.size);
        }
        self.turns += 1;

        let mut len = 0;
        for i in 0..self.candidates_len {
            let wall = self.candidates[i];
            if self.is_possible_wall(wall as Wall) {
                self.candidates[len] = wall;
                len += 1;
            }
        }
        self.candidates_len = len;
    }

    /// Check and play a wall supplied from outside the engine.
    pub fn play(&mut self, wall: Wall) -> Result<Move, MoveError> {
        if wall >= NUM_WALLS {
            return Err(MoveError::OutOfRange(wall));
        }
        if !self.is_possible_wall(wall) {
            return Err(MoveError::Unavailable(wall));
        }
        let mv = self.get_move(wall);
        if !self.is_possible_size(mv.zone.size) {
            return Err(MoveError::SizeTaken {
                wall,
                size: mv.zone.size,
            });
        }
        self.apply_move(&mv);
        Ok(mv)
    }

    /// Find the zone that placing `wall` would close.
    ///
    /// Both endpoints of the wall must already touch placed walls, otherwise
    /// the wall cannot complete an enclosure. Each side of the wall is then
    /// flood filled; the first side that does not reach the edge is the zone.
    pub fn find_zone(&self, wall: Wall) -> Zone {
        let (a, b) = ENDPOINTS[wall];
        if !intersects(self.placed, a) || !intersects(self.placed, b) {
            return Zone::default();
        }

        SIDES[wall]
            .iter()
            .filter(|&&square| square != OUTSIDE)
            .find_map(|&square| self.try_close(wall, square))
            .unwrap_or_default()
    }

    /// Flood fill from `start` through unplaced walls, treating `wall` as placed.
    ///
    /// Returns `None` as soon as the fill reaches the board edge.
    fn try_close(&self, wall: Wall, start: Square) -> Option<Zone> {
        let blocked = self.placed | flag(wall);
        let mut zone = Zone::default();
        let mut stack = [0; NUM_SQUARES];
        let mut len = 0;

        zone.enter(start);
        stack[len] = start;
        len += 1;

        while len > 0 {
            len -= 1;
            let square = stack[len];
            for &(w, next) in &NEIGHBORS[square] {
                if contains(blocked, w) {
                    continue;
                }
                if next == OUTSIDE {
                    return None;
                }
                if contains(zone.squares, next) {
                    continue;
                }
                zone.enter(next);
                stack[len] = next;
                len += 1;
            }
        }

        Some(zone)
    }

    /// Draw a uniformly random legal move.
    ///
    /// Candidates are sampled without replacement: a rejected slot is swapped
    /// to the back of a local copy of the candidate list and the range shrinks.
    pub fn random_move(&self, rng: &mut fastrand::Rng) -> Option<Move> {
        let mut walls = self.candidates;
        let mut len = self.candidates_len;
        while len > 0 {
            let r = rng.usize(..len);
            let wall = walls[r] as Wall;
            let zone = self.find_zone(wall);
            if self.is_possible_size(zone.size) {
                return Some(Move { wall, zone });
            }
            len -= 1;
            walls.swap(r, len);
        }
        None
    }

    /// Number of still-possible walls the move removes by sealing its zone.
    #[inline]
    pub fn impact(&self, mv: &Move) -> u32 {
        (self.possible_walls & mv.zone.walls).count_ones()
    }

    /// The canonical state the move would produce, without playing it.
    pub fn state_after_move(&self, mv: &Move) -> Bitmask {
        let mut result = self.state;
        add(&mut result, mv.wall);
        if mv.zone.is_closed() {
            result &= !mv.zone.walls;
            result |= mv.zone.border;
        }
        result
    }
}

impl fmt::Display for Position {
    /// Draw the grid: `-` and `|` for placed walls, `#` for squares inside zones.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "   ")?;
        for col in 0..N {
            write!(f, " {} ", col + 1)?;
        }
        writeln!(f)?;
        for row in 0..=N {
            write!(f, "{}  ", (b'A' + row as u8) as char)?;
            for col in 0..N {
                let h = if contains(self.placed, horizontal(row, col)) { "--" } else { "  " };
                write!(f, "+{h}")?;
            }
            writeln!(f, "+")?;
            if row == N {
                break;
            }
            write!(f, "   ")?;
            for col in 0..=N {
                let v = if contains(self.placed, vertical(row, col)) { '|' } else { ' ' };
                write!(f, "{v}")?;
                if col < N {
                    let square = row * N + col;
                    let c = if contains(self.closed, square) { "##" } else { "  " };
                    write!(f, "{c}")?;
                }
            }
            writeln!(f)?;
        }
        write!(f, "turn {} ({:?} to move)", self.turns, self.to_move())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::parse_wall;

    fn walls(notation: &[&str]) -> Vec<Wall> {
        notation.iter().map(|s| parse_wall(s).unwrap()).collect()
    }

    #[test]
    fn test_empty_position() {
        let pos = Position::new();
        assert_eq!(pos.turns, 0);
        assert_eq!(pos.to_move(), Color::White);
        assert_eq!(pos.possible_walls, ALL_WALLS);
        assert_eq!(pos.candidates().count(), NUM_WALLS);
    }

    #[test]
    fn test_corner_pocket() {
        // Square A1 is surrounded by A1h, A1v, B1h; A2v closes it.
        let pos = Position::from_walls(&walls(&["A1h", "A1v", "B1h"])).unwrap();
        let closing = parse_wall("A2v").unwrap();
        let zone = pos.find_zone(closing);
        assert_eq!(zone.size, 1);
        assert_eq!(zone.squares, flag(0));
        assert_eq!(zone.walls, WALLS_OF_SQUARE[0]);
        assert_eq!(zone.border, WALLS_OF_SQUARE[0]);
    }

    #[test]
    fn test_two_square_zone_border_excludes_interior() {
        // Squares A1 and A2 enclosed together; A2v between them stays open.
        let pos =
            Position::from_walls(&walls(&["A1h", "A2h", "A1v", "A3v", "B1h"])).unwrap();
        let zone = pos.find_zone(parse_wall("B2h").unwrap());
        assert_eq!(zone.size, 2);
        assert_eq!(zone.squares, flag(0) | flag(1));
        let interior = parse_wall("A2v").unwrap();
        assert!(contains(zone.walls, interior));
        assert!(!contains(zone.border, interior));
        assert_eq!(zone.border.count_ones(), 6);
    }

    #[test]
    fn test_apply_zone_move() {
        let mut pos = Position::from_walls(&walls(&["A1h", "A1v", "B1h"])).unwrap();
        let mv = pos.play(parse_wall("A2v").unwrap()).unwrap();
        assert!(mv.zone.is_closed());
        assert!(!pos.is_possible_size(1));
        assert!(pos.is_possible_size(0));
        assert_eq!(pos.possible_walls & WALLS_OF_SQUARE[0], 0);
        assert_eq!(pos.closed, flag(0));
        assert_eq!(pos.turns, 4);
        assert!(pos.candidates().all(|w| pos.is_possible_wall(w)));
    }

    #[test]
    fn test_second_zone_of_same_size_is_illegal() {
        let mut pos =
            Position::from_walls(&walls(&["A1h", "A1v", "B1h", "A2v", "A5h", "A6v", "B5h"]))
                .unwrap();
        let closing = parse_wall("A5v").unwrap();
        assert_eq!(pos.find_zone(closing).size, 1);
        assert_eq!(
            pos.play(closing),
            Err(MoveError::SizeTaken {
                wall: closing,
                size: 1
            })
        );
        assert!(pos.legal_moves().all(|mv| mv.wall != closing));
    }

    #[test]
    fn test_play_rejects_placed_wall() {
        let mut pos = Position::new();
        pos.play(7).unwrap();
        assert_eq!(pos.play(7), Err(MoveError::Unavailable(7)));
        assert_eq!(pos.play(60), Err(MoveError::OutOfRange(60)));
    }

    #[test]
    fn test_state_after_move_matches_apply() {
        let mut rng = fastrand::Rng::with_seed(7);
        let mut pos = Position::new();
        while let Some(mv) = pos.random_move(&mut rng) {
            let predicted = pos.state_after_move(&mv);
            pos.apply_move(&mv);
            assert_eq!(pos.state, predicted);
        }
    }

    #[test]
    fn test_impact_counts_swallowed_walls() {
        let pos = Position::from_walls(&walls(&["A1h", "A1v", "B1h"])).unwrap();
        let mv = pos.get_move(parse_wall("A2v").unwrap());
        // The three placed walls are gone already; only A2v itself remains possible.
        assert_eq!(pos.impact(&mv), 1);
    }

    #[test]
    fn test_random_move_is_legal() {
        let mut rng = fastrand::Rng::with_seed(3);
        for _ in 0..20 {
            let mut pos = Position::new();
            while let Some(mv) = pos.random_move(&mut rng) {
                assert!(pos.legal_moves().any(|m| m == mv));
                pos.apply_move(&mv);
            }
            assert!(pos.is_end_game());
            assert!(pos.turns <= NUM_WALLS);
        }
    }

    #[test]
    fn test_display() {
        let pos = Position::from_walls(&walls(&["A1h", "A1v", "B1h", "A2v"])).unwrap();
        let text = pos.to_string();
        assert!(text.contains("|##|"));
        assert!(text.contains("White to move"));
    }
}
