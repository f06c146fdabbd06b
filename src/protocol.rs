//! Referee protocol and interactive inspection.
//!
//! The referee talks in whitespace-separated tokens:
//!
//! - `Start` - the engine moves first
//! - `<wall>` - the opponent's move in wall notation (e.g. `C3h`); the engine replies
//! - `Quit` - end the session
//!
//! Each engine reply is one line holding a wall, followed by `!` when the
//! engine claims the game is won.
//!
//! ## Example
//!
//! ```ignore
//! use wallrave::mcts::{Engine, SearchConfig};
//! use wallrave::protocol::Session;
//! let mut session = Session::new(Engine::new(SearchConfig::default()), true);
//! session.run(std::io::stdin().lock(), std::io::stdout())?;
//! ```

use std::fmt;
use std::io::{BufRead, Write};

use anyhow::Context;
use log::{info, warn};
use thiserror::Error;

use crate::board::{WallParseError, parse_wall};
use crate::mcts::Engine;
use crate::position::{Move, MoveError, Position};

/// Why a token from the referee was rejected.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error(transparent)]
    Parse(#[from] WallParseError),
    #[error(transparent)]
    Illegal(#[from] MoveError),
}

/// What the session does after a token.
#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
    /// The engine played `mv`.
    Move { mv: Move, claim: bool },
    /// No legal move is left for the engine.
    GameOver,
    Quit,
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Move { mv, claim } => write!(f, "{mv}{}", if *claim { "!" } else { "" }),
            Reply::GameOver => write!(f, "game over"),
            Reply::Quit => write!(f, "quit"),
        }
    }
}

/// A game against the referee.
pub struct Session {
    pos: Position,
    engine: Engine,
    use_time_constraint: bool,
}

impl Session {
    pub fn new(engine: Engine, use_time_constraint: bool) -> Self {
        Self {
            pos: Position::new(),
            engine,
            use_time_constraint,
        }
    }

    pub fn position(&self) -> &Position {
        &self.pos
    }

    /// Read tokens until `Quit`, end of input, or the engine has no move left.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> anyhow::Result<()> {
        for line in input.lines() {
            let line = line.context("reading referee input")?;
            for token in line.split_whitespace() {
                match self.execute(token) {
                    Ok(reply @ Reply::Move { .. }) => {
                        writeln!(output, "{reply}").context("writing reply")?;
                        output.flush().context("flushing reply")?;
                    }
                    Ok(Reply::GameOver) => {
                        info!("no legal move left, game over");
                        return Ok(());
                    }
                    Ok(Reply::Quit) => return Ok(()),
                    Err(e) => warn!("rejected {token:?}: {e}"),
                }
            }
        }
        Ok(())
    }

    /// Handle one token.
    pub fn execute(&mut self, token: &str) -> Result<Reply, ProtocolError> {
        match token {
            "Quit" => Ok(Reply::Quit),
            "Start" => Ok(self.respond()),
            _ => {
                let wall = parse_wall(token)?;
                self.pos.play(wall)?;
                Ok(self.respond())
            }
        }
    }

    fn respond(&mut self) -> Reply {
        if self.pos.is_end_game() {
            return Reply::GameOver;
        }
        let (claim, mv) = self.engine.choose_move(&self.pos, self.use_time_constraint);
        if claim {
            info!("claiming the win with {mv}");
        }
        self.pos.apply_move(&mv);
        Reply::Move { mv, claim }
    }
}

/// Study a position interactively.
///
/// Runs up to `iterations` simulations from `pos`, then reads commands:
/// `c` lists the legal moves with their statistics, a wall descends into
/// that move (searching again from there), `q` quits.
pub fn inspect<R: BufRead, W: Write>(
    engine: &mut Engine,
    pos: &Position,
    iterations: usize,
    input: R,
    mut output: W,
) -> anyhow::Result<()> {
    let mut cursor = pos.clone();
    search_and_show(engine, &cursor, iterations, &mut output)?;

    for line in input.lines() {
        let line = line.context("reading inspection input")?;
        let command = line.trim();
        match command {
            "" => continue,
            "q" => break,
            "c" => {
                for report in engine.report(&cursor) {
                    writeln!(output, "{report}")?;
                }
            }
            _ => match parse_wall(command)
                .map_err(ProtocolError::from)
                .and_then(|wall| cursor.play(wall).map_err(ProtocolError::from))
            {
                Ok(_) => search_and_show(engine, &cursor, iterations, &mut output)?,
                Err(e) => writeln!(output, "{e}")?,
            },
        }
        output.flush()?;
    }
    Ok(())
}

fn search_and_show<W: Write>(
    engine: &mut Engine,
    pos: &Position,
    iterations: usize,
    output: &mut W,
) -> anyhow::Result<()> {
    let done = engine.inspect(pos, iterations);
    writeln!(output, "{pos}")?;
    writeln!(output, "i={done} nodes={}", engine.table_len())?;
    if let Some(info) = engine.state_info(pos.state) {
        if info.is_winning() {
            writeln!(output, "proven win")?;
        } else if info.is_losing() {
            writeln!(output, "proven loss")?;
        }
    }
    output.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcts::SearchConfig;

    fn quick_engine() -> Engine {
        Engine::new(SearchConfig {
            seed: Some(7),
            transformation: Some(0),
            max_iterations: 30,
            samples: 2,
            max_nodes: 2_000,
            ..SearchConfig::default()
        })
    }

    #[test]
    fn test_start_makes_engine_move() {
        let mut session = Session::new(quick_engine(), false);
        let reply = session.execute("Start").unwrap();
        assert!(matches!(reply, Reply::Move { claim: false, .. }));
        assert_eq!(session.position().turns, 1);
    }

    #[test]
    fn test_opponent_move_gets_reply() {
        let mut session = Session::new(quick_engine(), false);
        let reply = session.execute("C3h").unwrap();
        let Reply::Move { mv, .. } = reply else {
            panic!("expected a move, got {reply:?}");
        };
        assert_ne!(mv.wall, 12);
        assert_eq!(session.position().turns, 2);
    }

    #[test]
    fn test_bad_tokens_are_rejected() {
        let mut session = Session::new(quick_engine(), false);
        assert!(matches!(session.execute("X9z"), Err(ProtocolError::Parse(_))));
        session.execute("C3h").unwrap();
        assert!(matches!(session.execute("C3h"), Err(ProtocolError::Illegal(_))));
        assert_eq!(session.execute("Quit").unwrap(), Reply::Quit);
    }

    #[test]
    fn test_run_writes_one_line_per_reply() {
        let mut session = Session::new(quick_engine(), false);
        let mut output = Vec::new();
        session
            .run("Start\nbogus\nQuit\nC3h\n".as_bytes(), &mut output)
            .unwrap();
        let text = String::from_utf8(output).unwrap();
        assert_eq!(text.lines().count(), 1);
        let line = text.lines().next().unwrap();
        assert!(parse_wall(line.trim_end_matches('!')).is_ok());
    }

    #[test]
    fn test_reply_display_marks_claim() {
        let pos = Position::new();
        let reply = Reply::Move {
            mv: pos.get_move(0),
            claim: true,
        };
        assert_eq!(reply.to_string(), "A1h!");
    }

    #[test]
    fn test_inspect_lists_children() {
        let mut engine = quick_engine();
        let mut output = Vec::new();
        inspect(&mut engine, &Position::new(), 20, "c\nq\n".as_bytes(), &mut output).unwrap();
        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("i=20"));
        assert!(text.contains("(most visited one)"));
    }
}
