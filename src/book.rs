//! Opening book: precomputed replies keyed by the exact set of placed walls.
//!
//! The book is stored in one fixed orientation. At lookup time the engine
//! maps the position through its chosen symmetry, looks the result up, and
//! maps the stored reply back through the inverse symmetry, so one book
//! covers all eight orientations of a line.
//!
//! ## Text format
//!
//! One entry per line: the placed walls as a hexadecimal mask, then the reply
//! in wall notation. `#` starts a comment.
//!
//! ```text
//! # placed             reply
//! 0x0000000000000000   C3h
//! 0x0000000000001000   C3v   # 0.512
//! ```

use std::fmt;
use std::path::Path;

use log::info;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::board::{ALL_WALLS, Bitmask, Wall, WallParseError, parse_wall, str_wall};
use crate::mcts::Engine;
use crate::position::Position;
use crate::symmetry::{INVERSE, transform, transform_wall};

#[derive(Debug, Error)]
pub enum BookError {
    #[error("cannot read opening book: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: expected `<placed> <wall>`")]
    Format { line: usize },
    #[error("line {line}: invalid wall mask {text:?}")]
    Mask { line: usize, text: String },
    #[error("line {line}: {source}")]
    Wall {
        line: usize,
        #[source]
        source: WallParseError,
    },
}

#[derive(Clone, Debug, Default)]
pub struct OpeningBook {
    entries: FxHashMap<Bitmask, Wall>,
}

impl OpeningBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (Bitmask, Wall)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reply stored for `placed`, in book orientation.
    pub fn get(&self, placed: Bitmask) -> Option<Wall> {
        self.entries.get(&placed).copied()
    }

    /// Reply for `placed` seen through symmetry `transformation`,
    /// mapped back to the real board.
    pub fn lookup(&self, placed: Bitmask, transformation: usize) -> Option<Wall> {
        let key = transform(placed, transformation);
        self.get(key)
            .map(|wall| transform_wall(wall, INVERSE[transformation]))
    }

    pub fn parse(text: &str) -> Result<Self, BookError> {
        let mut entries = FxHashMap::default();
        for (i, raw) in text.lines().enumerate() {
            let line = i + 1;
            let content = raw.split('#').next().unwrap_or_default().trim();
            if content.is_empty() {
                continue;
            }

            let mut fields = content.split_whitespace();
            let (Some(mask), Some(wall), None) = (fields.next(), fields.next(), fields.next())
            else {
                return Err(BookError::Format { line });
            };

            let digits = mask.trim_start_matches("0x").trim_start_matches("0X");
            let placed = Bitmask::from_str_radix(digits, 16)
                .ok()
                .filter(|&p| p & !ALL_WALLS == 0)
                .ok_or_else(|| BookError::Mask {
                    line,
                    text: mask.to_string(),
                })?;
            let wall = parse_wall(wall).map_err(|source| BookError::Wall { line, source })?;
            entries.insert(placed, wall);
        }
        Ok(Self { entries })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, BookError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Entries sorted by mask, one per line, in the format [`OpeningBook::parse`] reads.
    pub fn to_text(&self) -> String {
        let mut entries: Vec<_> = self.entries.iter().collect();
        entries.sort_unstable();
        entries
            .into_iter()
            .map(|(&placed, &wall)| format!("0x{placed:016x} {}\n", str_wall(wall)))
            .collect()
    }
}

/// A generated book line with the search's evaluation of the reply.
#[derive(Clone, Debug)]
pub struct BookEntry {
    pub placed: Bitmask,
    pub wall: Wall,
    pub value: f32,
}

impl fmt::Display for BookEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "0x{:016x} {} # {:.3}",
            self.placed,
            str_wall(self.wall),
            self.value
        )
    }
}

impl FromIterator<BookEntry> for OpeningBook {
    fn from_iter<I: IntoIterator<Item = BookEntry>>(iter: I) -> Self {
        Self::from_entries(iter.into_iter().map(|e| (e.placed, e.wall)))
    }
}

/// Search the opening tree `depth` plies deep.
///
/// Plies an even distance from `depth` are the book side's: the engine picks
/// one reply. On the other plies every legal move is expanded. One entry is
/// produced for each book-side position at depth `depth`.
///
/// The engine should carry an empty book so it actually searches.
pub fn generate(engine: &mut Engine, depth: usize) -> Vec<BookEntry> {
    let mut entries = Vec::new();
    extend(engine, &Position::new(), 0, depth, &mut entries);
    entries
}

fn extend(engine: &mut Engine, pos: &Position, ply: usize, depth: usize, out: &mut Vec<BookEntry>) {
    if pos.is_end_game() {
        return;
    }

    if (depth - ply) % 2 == 0 {
        let (_, best) = engine.choose_move(pos, false);
        if ply == depth {
            let value = engine.evaluate(pos, &best).unwrap_or_default();
            let entry = BookEntry {
                placed: pos.placed,
                wall: best.wall,
                value,
            };
            info!("book entry {entry}");
            out.push(entry);
        } else {
            let mut next = pos.clone();
            next.apply_move(&best);
            extend(engine, &next, ply + 1, depth, out);
        }
    } else {
        for mv in pos.legal_moves() {
            let mut next = pos.clone();
            next.apply_move(&mv);
            extend(engine, &next, ply + 1, depth, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::flag;
    use crate::symmetry::NUM_TRANSFORMATIONS;

    #[test]
    fn test_parse_entries_and_comments() {
        let text = "# header\n\n0x0 C3h\n0x0000000000000001 B1h   # reply to A1h\n";
        let book = OpeningBook::parse(text).unwrap();
        assert_eq!(book.len(), 2);
        assert_eq!(book.get(0), Some(12));
        assert_eq!(book.get(flag(0)), Some(5));
    }

    #[test]
    fn test_parse_errors_carry_line() {
        assert!(matches!(
            OpeningBook::parse("0x0 C3h\n0x0\n"),
            Err(BookError::Format { line: 2 })
        ));
        assert!(matches!(
            OpeningBook::parse("zz C3h"),
            Err(BookError::Mask { line: 1, .. })
        ));
        assert!(matches!(
            OpeningBook::parse("0xf000000000000000 C3h"),
            Err(BookError::Mask { line: 1, .. })
        ));
        assert!(matches!(
            OpeningBook::parse("0x0 Z9q"),
            Err(BookError::Wall { line: 1, .. })
        ));
    }

    #[test]
    fn test_text_round_trip() {
        let book = OpeningBook::from_entries([(0, 12), (flag(0) | flag(59), 31)]);
        let parsed = OpeningBook::parse(&book.to_text()).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.get(0), Some(12));
        assert_eq!(parsed.get(flag(0) | flag(59)), Some(31));
    }

    #[test]
    fn test_lookup_undoes_transformation() {
        // Book says: after A1h, reply B1h.
        let book = OpeningBook::from_entries([(flag(0), 5)]);
        for t in 0..NUM_TRANSFORMATIONS {
            // The real position is the preimage of the book position.
            let real = transform(flag(0), INVERSE[t]);
            let reply = book.lookup(real, t).unwrap();
            assert_eq!(reply, transform_wall(5, INVERSE[t]));
        }
        assert_eq!(book.lookup(flag(1), 0), None);
    }
}
