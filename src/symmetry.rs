//! The eight symmetries of the square board.
//!
//! Each wall is identified with its midpoint on a doubled lattice, where
//! corners have even coordinates in `0..=10`: horizontal wall `(row, col)`
//! sits at `(2 * col + 1, 2 * row)` and vertical wall `(row, col)` at
//! `(2 * col, 2 * row + 1)`. Square centres sit at odd coordinates. The
//! symmetries are then plain coordinate maps on that lattice.
//!
//! | index | map                 |
//! |-------|---------------------|
//! | 0     | identity            |
//! | 1     | quarter turn        |
//! | 2     | half turn           |
//! | 3     | three-quarter turn  |
//! | 4     | left-right mirror   |
//! | 5     | top-bottom mirror   |
//! | 6     | anti-diagonal flip  |
//! | 7     | main-diagonal flip  |

use crate::board::{Bitmask, Square, Wall, add, bits, horizontal, is_horizontal, vertical};
use crate::constants::{N, NUM_HORIZONTAL, NUM_SQUARES, NUM_WALLS};

pub const NUM_TRANSFORMATIONS: usize = 8;

/// `INVERSE[i]` undoes transformation `i`.
pub const INVERSE: [usize; NUM_TRANSFORMATIONS] = [0, 3, 2, 1, 4, 5, 6, 7];

/// `TRANSFORMATIONS[i][w]` is the image of wall `w` under transformation `i`.
pub static TRANSFORMATIONS: [[Wall; NUM_WALLS]; NUM_TRANSFORMATIONS] = wall_table();

/// `SQUARE_TRANSFORMATIONS[i][s]` is the image of square `s` under transformation `i`.
pub static SQUARE_TRANSFORMATIONS: [[Square; NUM_SQUARES]; NUM_TRANSFORMATIONS] = square_table();

const EXTENT: usize = 2 * N;

const fn map_point(i: usize, x: usize, y: usize) -> (usize, usize) {
    match i {
        0 => (x, y),
        1 => (y, EXTENT - x),
        2 => (EXTENT - x, EXTENT - y),
        3 => (EXTENT - y, x),
        4 => (EXTENT - x, y),
        5 => (x, EXTENT - y),
        6 => (EXTENT - y, EXTENT - x),
        _ => (y, x),
    }
}

const fn wall_midpoint(wall: Wall) -> (usize, usize) {
    if is_horizontal(wall) {
        let (row, col) = (wall / N, wall % N);
        (2 * col + 1, 2 * row)
    } else {
        let v = wall - NUM_HORIZONTAL;
        let (row, col) = (v / (N + 1), v % (N + 1));
        (2 * col, 2 * row + 1)
    }
}

const fn wall_at(x: usize, y: usize) -> Wall {
    if y % 2 == 0 {
        horizontal(y / 2, (x - 1) / 2)
    } else {
        vertical((y - 1) / 2, x / 2)
    }
}

const fn wall_table() -> [[Wall; NUM_WALLS]; NUM_TRANSFORMATIONS] {
    let mut table = [[0; NUM_WALLS]; NUM_TRANSFORMATIONS];
    let mut i = 0;
    while i < NUM_TRANSFORMATIONS {
        let mut w = 0;
        while w < NUM_WALLS {
            let (x, y) = wall_midpoint(w);
            let (tx, ty) = map_point(i, x, y);
            table[i][w] = wall_at(tx, ty);
            w += 1;
        }
        i += 1;
    }
    table
}

const fn square_table() -> [[Square; NUM_SQUARES]; NUM_TRANSFORMATIONS] {
    let mut table = [[0; NUM_SQUARES]; NUM_TRANSFORMATIONS];
    let mut i = 0;
    while i < NUM_TRANSFORMATIONS {
        let mut s = 0;
        while s < NUM_SQUARES {
            let (x, y) = (2 * (s % N) + 1, 2 * (s / N) + 1);
            let (tx, ty) = map_point(i, x, y);
            table[i][s] = (ty - 1) / 2 * N + (tx - 1) / 2;
            s += 1;
        }
        i += 1;
    }
    table
}

#[inline]
pub fn transform_wall(wall: Wall, i: usize) -> Wall {
    TRANSFORMATIONS[i][wall]
}

#[inline]
pub fn transform_square(square: Square, i: usize) -> Square {
    SQUARE_TRANSFORMATIONS[i][square]
}

/// Remap every wall in `state` through transformation `i`.
pub fn transform(state: Bitmask, i: usize) -> Bitmask {
    let mut result = 0;
    for wall in bits(state) {
        add(&mut result, TRANSFORMATIONS[i][wall]);
    }
    result
}

/// Remap every square in `squares` through transformation `i`.
pub fn transform_squares(squares: Bitmask, i: usize) -> Bitmask {
    let mut result = 0;
    for square in bits(squares) {
        add(&mut result, SQUARE_TRANSFORMATIONS[i][square]);
    }
    result
}

/// All distinct images of `state`. Symmetric states have fewer than eight.
pub fn all_transformations(state: Bitmask) -> Vec<Bitmask> {
    let mut result: Vec<Bitmask> = (0..NUM_TRANSFORMATIONS)
        .map(|i| transform(state, i))
        .collect();
    result.sort_unstable();
    result.dedup();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{WALLS_OF_SQUARE, flag};

    #[test]
    fn test_transformations_are_permutations() {
        for i in 0..NUM_TRANSFORMATIONS {
            let mut seen = [false; NUM_WALLS];
            for w in 0..NUM_WALLS {
                seen[transform_wall(w, i)] = true;
            }
            assert!(seen.iter().all(|&s| s), "transformation {i}");
        }
    }

    #[test]
    fn test_inverse() {
        for i in 0..NUM_TRANSFORMATIONS {
            for w in 0..NUM_WALLS {
                assert_eq!(transform_wall(transform_wall(w, i), INVERSE[i]), w);
            }
            for s in 0..NUM_SQUARES {
                assert_eq!(transform_square(transform_square(s, i), INVERSE[i]), s);
            }
        }
    }

    #[test]
    fn test_known_images() {
        // A1h under the quarter turn lands on E1v; under the diagonal flip on A1v.
        assert_eq!(transform_wall(0, 1), 54);
        assert_eq!(transform_wall(0, 2), 29);
        assert_eq!(transform_wall(0, 7), 30);
        assert_eq!(transform_square(0, 2), 24);
    }

    #[test]
    fn test_square_walls_follow_square() {
        for i in 0..NUM_TRANSFORMATIONS {
            for s in 0..NUM_SQUARES {
                assert_eq!(
                    transform(WALLS_OF_SQUARE[s], i),
                    WALLS_OF_SQUARE[transform_square(s, i)]
                );
            }
        }
    }

    #[test]
    fn test_all_transformations_dedups() {
        assert_eq!(all_transformations(0), vec![0]);
        // The four walls of the centre square are fixed by every symmetry.
        assert_eq!(all_transformations(WALLS_OF_SQUARE[12]).len(), 1);
        assert_eq!(all_transformations(flag(0)).len(), 8);
    }
}
