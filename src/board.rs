//! Board geometry: bitmasks, wall and square indexing, and wall notation.
//!
//! Squares are numbered row-major, `5 * row + col`. Horizontal wall `(row, col)`
//! runs along the top of square `(row, col)` and has index `5 * row + col`
//! (`row` in `0..=5`). Vertical wall `(row, col)` runs along the left of square
//! `(row, col)` and has index `30 + 6 * row + col` (`col` in `0..=5`).
//!
//! All adjacency tables are generated at compile time from these formulas.

use thiserror::Error;

use crate::constants::{N, NUM_HORIZONTAL, NUM_SIZES, NUM_SQUARES, NUM_WALLS, OUTSIDE};

/// A set of walls, squares or sizes packed into a `u64`.
pub type Bitmask = u64;

/// A wall slot in `0..60`.
pub type Wall = usize;

/// A square in `0..25`, or [`OUTSIDE`].
pub type Square = usize;

/// Every wall slot.
pub const ALL_WALLS: Bitmask = (1 << NUM_WALLS) - 1;

/// Every zone size, including the size-0 "no zone" marker.
pub const ALL_SIZES: Bitmask = (1 << NUM_SIZES) - 1;

#[inline]
pub const fn flag(i: usize) -> Bitmask {
    1 << i
}

#[inline]
pub const fn contains(b: Bitmask, i: usize) -> bool {
    b & flag(i) != 0
}

#[inline]
pub const fn intersects(a: Bitmask, b: Bitmask) -> bool {
    a & b != 0
}

#[inline]
pub fn add(b: &mut Bitmask, i: usize) {
    *b |= flag(i);
}

#[inline]
pub fn remove(b: &mut Bitmask, i: usize) {
    *b &= !flag(i);
}

/// Iterate over the indices of the set bits, lowest first.
pub fn bits(mut b: Bitmask) -> impl Iterator<Item = usize> {
    std::iter::from_fn(move || {
        if b == 0 {
            return None;
        }
        let i = b.trailing_zeros() as usize;
        b &= b - 1;
        Some(i)
    })
}

/// Index of the horizontal wall on top of square `(row, col)`; `row` may be `N`.
#[inline]
pub const fn horizontal(row: usize, col: usize) -> Wall {
    row * N + col
}

/// Index of the vertical wall left of square `(row, col)`; `col` may be `N`.
#[inline]
pub const fn vertical(row: usize, col: usize) -> Wall {
    NUM_HORIZONTAL + row * (N + 1) + col
}

#[inline]
pub const fn is_horizontal(wall: Wall) -> bool {
    wall < NUM_HORIZONTAL
}

// =============================================================================
// Adjacency Tables
// =============================================================================

/// The four walls around each square.
pub static WALLS_OF_SQUARE: [Bitmask; NUM_SQUARES] = walls_of_square_table();

/// For each square, the wall crossed and the square reached going east, west,
/// south and north. Edge squares reach [`OUTSIDE`].
pub static NEIGHBORS: [[(Wall, Square); 4]; NUM_SQUARES] = neighbors_table();

/// The squares on either side of each wall, south/east side first.
/// Perimeter walls have [`OUTSIDE`] on one side.
pub static SIDES: [[Square; 2]; NUM_WALLS] = sides_table();

/// For each wall, the other walls meeting it at each of its two endpoints.
/// A wall can only close a zone if both endpoints touch a placed wall.
pub static ENDPOINTS: [(Bitmask, Bitmask); NUM_WALLS] = endpoints_table();

const fn walls_of_square_table() -> [Bitmask; NUM_SQUARES] {
    let mut table = [0; NUM_SQUARES];
    let mut s = 0;
    while s < NUM_SQUARES {
        let (row, col) = (s / N, s % N);
        table[s] = flag(horizontal(row, col))
            | flag(vertical(row, col + 1))
            | flag(horizontal(row + 1, col))
            | flag(vertical(row, col));
        s += 1;
    }
    table
}

const fn neighbors_table() -> [[(Wall, Square); 4]; NUM_SQUARES] {
    let mut table = [[(0, OUTSIDE); 4]; NUM_SQUARES];
    let mut s = 0;
    while s < NUM_SQUARES {
        let (row, col) = (s / N, s % N);
        table[s] = [
            (vertical(row, col + 1), if col + 1 < N { s + 1 } else { OUTSIDE }),
            (vertical(row, col), if col > 0 { s - 1 } else { OUTSIDE }),
            (horizontal(row + 1, col), if row + 1 < N { s + N } else { OUTSIDE }),
            (horizontal(row, col), if row > 0 { s - N } else { OUTSIDE }),
        ];
        s += 1;
    }
    table
}

const fn sides_table() -> [[Square; 2]; NUM_WALLS] {
    let mut table = [[OUTSIDE; 2]; NUM_WALLS];
    let mut w = 0;
    while w < NUM_WALLS {
        if is_horizontal(w) {
            let (row, col) = (w / N, w % N);
            let below = if row < N { row * N + col } else { OUTSIDE };
            let above = if row > 0 { (row - 1) * N + col } else { OUTSIDE };
            table[w] = [below, above];
        } else {
            let v = w - NUM_HORIZONTAL;
            let (row, col) = (v / (N + 1), v % (N + 1));
            let right = if col < N { row * N + col } else { OUTSIDE };
            let left = if col > 0 { row * N + col - 1 } else { OUTSIDE };
            table[w] = [right, left];
        }
        w += 1;
    }
    table
}

/// Walls meeting at lattice corner `(row, col)`, both in `0..=N`.
const fn corner_walls(row: usize, col: usize) -> Bitmask {
    let mut b = 0;
    if col > 0 {
        b |= flag(horizontal(row, col - 1));
    }
    if col < N {
        b |= flag(horizontal(row, col));
    }
    if row > 0 {
        b |= flag(vertical(row - 1, col));
    }
    if row < N {
        b |= flag(vertical(row, col));
    }
    b
}

const fn endpoints_table() -> [(Bitmask, Bitmask); NUM_WALLS] {
    let mut table = [(0, 0); NUM_WALLS];
    let mut w = 0;
    while w < NUM_WALLS {
        let (a, b) = if is_horizontal(w) {
            let (row, col) = (w / N, w % N);
            (corner_walls(row, col), corner_walls(row, col + 1))
        } else {
            let v = w - NUM_HORIZONTAL;
            let (row, col) = (v / (N + 1), v % (N + 1));
            (corner_walls(row, col), corner_walls(row + 1, col))
        };
        table[w] = (a & !flag(w), b & !flag(w));
        w += 1;
    }
    table
}

// =============================================================================
// Wall Notation
// =============================================================================

/// Reasons a wall notation string is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WallParseError {
    #[error("wall notation must have 3 characters: {0:?}")]
    Length(String),
    #[error("unknown orientation in {0:?} (expected 'h' or 'v')")]
    Orientation(String),
    #[error("row out of range in {0:?}")]
    Row(String),
    #[error("column out of range in {0:?}")]
    Column(String),
}

/// Parse a wall in `<row letter><column digit><h|v>` notation, e.g. `"A1h"`.
///
/// Horizontal walls use rows `A`-`F` and columns `1`-`5`; vertical walls use
/// rows `A`-`E` and columns `1`-`6`.
pub fn parse_wall(s: &str) -> Result<Wall, WallParseError> {
    let bytes = s.as_bytes();
    if bytes.len() != 3 {
        return Err(WallParseError::Length(s.to_string()));
    }

    let (rows, cols) = match bytes[2].to_ascii_lowercase() {
        b'h' => (N + 1, N),
        b'v' => (N, N + 1),
        _ => return Err(WallParseError::Orientation(s.to_string())),
    };

    let row = bytes[0].to_ascii_uppercase().wrapping_sub(b'A') as usize;
    if row >= rows {
        return Err(WallParseError::Row(s.to_string()));
    }
    let col = bytes[1].wrapping_sub(b'1') as usize;
    if col >= cols {
        return Err(WallParseError::Column(s.to_string()));
    }

    Ok(if rows > N {
        horizontal(row, col)
    } else {
        vertical(row, col)
    })
}

/// Format a wall in the notation accepted by [`parse_wall`].
pub fn str_wall(wall: Wall) -> String {
    let (row, col, orientation) = if is_horizontal(wall) {
        (wall / N, wall % N, 'h')
    } else {
        let v = wall - NUM_HORIZONTAL;
        (v / (N + 1), v % (N + 1), 'v')
    };
    let r = (b'A' + row as u8) as char;
    let c = (b'1' + col as u8) as char;
    format!("{r}{c}{orientation}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walls_of_corner_square() {
        // A1h on top, B1v on the right, B1h below, A1v on the left.
        let expected = flag(0) | flag(31) | flag(5) | flag(30);
        assert_eq!(WALLS_OF_SQUARE[0], expected);
        assert_eq!(WALLS_OF_SQUARE[24].count_ones(), 4);
    }

    #[test]
    fn test_every_wall_borders_its_sides() {
        for w in 0..NUM_WALLS {
            for &s in &SIDES[w] {
                if s != OUTSIDE {
                    assert!(contains(WALLS_OF_SQUARE[s], w), "wall {w} square {s}");
                }
            }
            let inside = SIDES[w].iter().filter(|&&s| s != OUTSIDE).count();
            assert!(inside >= 1);
        }
    }

    #[test]
    fn test_neighbors_are_symmetric() {
        for s in 0..NUM_SQUARES {
            for &(w, t) in &NEIGHBORS[s] {
                assert!(contains(WALLS_OF_SQUARE[s], w));
                if t != OUTSIDE {
                    assert!(NEIGHBORS[t].contains(&(w, s)));
                }
            }
        }
    }

    #[test]
    fn test_endpoints() {
        // A1h: left end meets A1v, right end meets A2h and A2v.
        assert_eq!(ENDPOINTS[0], (flag(30), flag(1) | flag(31)));
        // A1v: top end meets A1h, bottom end meets B1h and B1v.
        assert_eq!(ENDPOINTS[30], (flag(0), flag(5) | flag(36)));
    }

    #[test]
    fn test_parse_wall_examples() {
        assert_eq!(parse_wall("A1h"), Ok(0));
        assert_eq!(parse_wall("F5h"), Ok(29));
        assert_eq!(parse_wall("A1v"), Ok(30));
        assert_eq!(parse_wall("E6v"), Ok(59));
        assert_eq!(parse_wall("b2H"), Ok(6));
    }

    #[test]
    fn test_parse_wall_rejects_malformed() {
        assert!(matches!(parse_wall(""), Err(WallParseError::Length(_))));
        assert!(matches!(parse_wall("A1hh"), Err(WallParseError::Length(_))));
        assert!(matches!(parse_wall("A1x"), Err(WallParseError::Orientation(_))));
        assert!(matches!(parse_wall("G1h"), Err(WallParseError::Row(_))));
        assert!(matches!(parse_wall("F1v"), Err(WallParseError::Row(_))));
        assert!(matches!(parse_wall("A6h"), Err(WallParseError::Column(_))));
        assert!(matches!(parse_wall("A0v"), Err(WallParseError::Column(_))));
        assert!(matches!(parse_wall("é"), Err(WallParseError::Length(_))));
    }

    #[test]
    fn test_bits() {
        let b = flag(3) | flag(17) | flag(59);
        assert_eq!(bits(b).collect::<Vec<_>>(), vec![3, 17, 59]);
        assert_eq!(bits(0).count(), 0);
    }
}
