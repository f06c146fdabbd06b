//! Monte Carlo Tree Search with RAVE and exact proof propagation.
//!
//! This module implements MCTS with:
//! - a transposition table keyed by the canonical position state, so move
//!   orders reaching the same sealed geometry share statistics
//! - three statistics channels per action: direct visits, same-color AMAF and
//!   any-color AMAF, blended during selection
//! - exact solving of nearly finished leaves and backward induction of
//!   proven wins and losses
//! - per-move and whole-game time budgets with an early exit once the
//!   decision has settled
//!
//! One node is expanded per simulation. Leaves are evaluated with a batch of
//! random playouts whose moves also feed the AMAF channels.

use std::fmt;
use std::ops::{AddAssign, SubAssign};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use rustc_hash::FxHashMap;

use crate::board::{ALL_WALLS, Bitmask, Wall, contains};
use crate::book::OpeningBook;
use crate::constants::{
    CHECK_TIME, CLAIM_TURN, CLAIM_VALUE, DEFAULT_MOVE_TIME, IO_OVERHEAD, MAX_ITERATIONS,
    MAX_MOVE_TIME, MAX_NODE_VISITS, MAX_NODES, NUM_WALLS, OPENING_TURNS, OPPONENT_RANDOM_ONE_IN,
    SAMPLES, SOLVER_THRESHOLD, TIME_TROUBLE_TURN, TOTAL_TIME,
};
use crate::playout::{AmafStats, sample_playouts};
use crate::position::{Color, Move, Position};
use crate::solver::winning_action;
use crate::symmetry::NUM_TRANSFORMATIONS;

/// Walls that make reasonable openings, for White and Black.
///
/// While the game is young the searching side only considers these, which
/// keeps the early tree narrow.
const GOOD_OPENING_MOVES: [Bitmask; 2] = [0x0792_4927_81f8_c7e0, 0x04ad_fed4_9d57_3aae];

/// Largest value an action's impact can hold.
const MAX_IMPACT: u8 = 63;

// =============================================================================
// Statistics
// =============================================================================

/// A running average.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Stats {
    pub value: f32,
    pub visits: u32,
}

impl Stats {
    /// Fold in `count` observations of `value`.
    #[inline]
    pub fn update(&mut self, value: f32, count: u32) {
        if count == 0 {
            return;
        }
        let total = self.visits + count;
        self.value = (self.value * self.visits as f32 + value * count as f32) / total as f32;
        self.visits = total;
    }
}

impl AddAssign for Stats {
    fn add_assign(&mut self, other: Stats) {
        self.update(other.value, other.visits);
    }
}

/// Merge with the sign flipped: the other side's observations.
impl SubAssign for Stats {
    fn sub_assign(&mut self, other: Stats) {
        self.update(-other.value, other.visits);
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.visits < 1000 {
            write!(f, "({:.3}, {})", self.value, self.visits)
        } else {
            write!(f, "({:.3}, {:.1}k)", self.value, self.visits as f32 / 1000.0)
        }
    }
}

/// Proof status of a node or an action.
///
/// `Invalid` marks an action slot that was never instantiated.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Status {
    #[default]
    Invalid,
    Unknown,
    Win,
    Loss,
}

/// Per-action statistics.
#[derive(Copy, Clone, Debug, Default)]
pub struct ActionInfo {
    /// Outcomes of simulations that took this action here
    pub direct: Stats,
    /// Outcomes of simulations where the same player played it later
    pub same_color: Stats,
    /// Outcomes of simulations where anyone played it later
    pub any_color: Stats,
    pub status: Status,
    /// Static bias, at most 63
    pub impact: u8,
}

impl ActionInfo {
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.status != Status::Invalid
    }

    #[inline]
    pub fn is_winning(&self) -> bool {
        self.status == Status::Win
    }

    #[inline]
    pub fn is_losing(&self) -> bool {
        self.status == Status::Loss
    }
}

/// Transposition table entry for one canonical state.
#[derive(Clone, Debug)]
pub struct StateInfo {
    pub actions: [ActionInfo; NUM_WALLS],
    /// Walls already unplayable without having been placed when the node was created
    pub invalid: Bitmask,
    /// `Unknown`, `Win` or `Loss`
    pub status: Status,
    pub winning_action: u8,
    /// Number of legal moves when the node was created
    pub actions_count: u8,
    pub visits: u32,
}

impl StateInfo {
    pub fn new(invalid: Bitmask) -> Self {
        Self {
            actions: [ActionInfo::default(); NUM_WALLS],
            invalid,
            status: Status::Unknown,
            winning_action: 0,
            actions_count: 0,
            visits: 0,
        }
    }

    #[inline]
    pub fn is_winning(&self) -> bool {
        self.status == Status::Win
    }

    #[inline]
    pub fn is_losing(&self) -> bool {
        self.status == Status::Loss
    }

    fn instantiate(&mut self, action: Wall, impact: u32) {
        let slot = &mut self.actions[action];
        slot.status = Status::Unknown;
        slot.impact = impact.min(MAX_IMPACT as u32) as u8;
    }

    pub fn mark_winning(&mut self, action: Wall) {
        self.status = Status::Win;
        self.winning_action = action as u8;
        self.actions[action].status = Status::Win;
    }

    pub fn mark_losing(&mut self, action: Wall) {
        self.actions[action].status = Status::Loss;
    }

    /// True when every instantiated action is a proven loss.
    pub fn all_actions_losing(&self) -> bool {
        self.actions.iter().all(|a| !a.is_valid() || a.is_losing())
    }

    /// Instantiated actions in wall order.
    pub fn valid_actions(&self) -> impl Iterator<Item = Wall> + '_ {
        (0..NUM_WALLS).filter(|&a| self.actions[a].is_valid())
    }

    /// Selection score of an action.
    ///
    /// Before any AMAF statistics exist, actions rank by impact with a little
    /// jitter to break ties. Afterwards the three channels are blended, with
    /// the AMAF averages never allowed below the direct average.
    pub fn eval(&self, action: Wall, rng: &mut fastrand::Rng) -> f32 {
        let info = &self.actions[action];
        match info.status {
            Status::Win => return f32::INFINITY,
            Status::Loss => return f32::NEG_INFINITY,
            _ => {}
        }

        let bias = info.impact as f32;
        if info.any_color.visits == 0 {
            return 1000.0 * bias + rng.u32(0..=60) as f32;
        }

        let (v1, n1) = (info.direct.value, info.direct.visits as f32);
        let (v2, n2) = (info.same_color.value.max(v1), info.same_color.visits as f32);
        let (v3, n3) = (info.any_color.value.max(v1), info.any_color.visits as f32);
        let n = n1 + n2 + n3;
        let value = (n1 * v1 + n2 * v2 + n3 * v3) / n;
        value + bias * (self.visits as f32).sqrt() / n
    }

    /// The winning action if proven, otherwise the best-scoring action.
    pub fn select(&self, rng: &mut fastrand::Rng) -> Option<Wall> {
        if self.is_winning() {
            return Some(self.winning_action as Wall);
        }
        let mut best: Option<(Wall, f32)> = None;
        for a in self.valid_actions() {
            let value = self.eval(a, rng);
            if best.is_none_or(|(_, v)| value > v) {
                best = Some((a, value));
            }
        }
        best.map(|(a, _)| a)
    }

    pub fn select_random(&self, rng: &mut fastrand::Rng) -> Option<Wall> {
        let count = self.valid_actions().count();
        if count == 0 {
            return None;
        }
        self.valid_actions().nth(rng.usize(..count))
    }

    /// The action with the most direct visits; the first one on ties.
    pub fn most_visited(&self) -> Option<Wall> {
        let mut best: Option<(Wall, u32)> = None;
        for a in self.valid_actions() {
            let visits = self.actions[a].direct.visits;
            if best.is_none_or(|(_, v)| visits > v) {
                best = Some((a, visits));
            }
        }
        best.map(|(a, _)| a)
    }

    fn update_direct(&mut self, action: Wall, value: f32, count: u32) {
        if self.visits < MAX_NODE_VISITS {
            self.visits += 1;
        }
        self.actions[action].direct.update(value, count);
    }

    fn update_same_color(&mut self, action: Wall, value: f32, count: u32) {
        let info = &mut self.actions[action];
        if info.is_valid() {
            info.same_color.update(value, count);
        }
    }

    fn update_any_color(&mut self, action: Wall, value: f32, count: u32) {
        let info = &mut self.actions[action];
        if info.is_valid() {
            info.any_color.update(value, count);
        }
    }
}

// =============================================================================
// Simulation Results
// =============================================================================

/// Outcome carried up the tree by a simulation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Value {
    /// The game is decided: this color wins with best play.
    Proven(Color),
    /// Average playout outcome from White's point of view, in `[-1, 1]`.
    Estimated(f32),
}

impl Value {
    /// Turn a proof that only covers part of a node into an ordinary estimate.
    ///
    /// The damped value is worth one decisive playout for the proven winner.
    fn damped(self) -> Value {
        match self {
            Value::Proven(winner) => Value::Estimated(winner.sign()),
            estimated => estimated,
        }
    }

    /// The value as seen by `color`.
    fn for_color(self, color: Color) -> f32 {
        let white = match self {
            Value::Proven(winner) => winner.sign(),
            Value::Estimated(v) => v,
        };
        white * color.sign()
    }
}

/// The record of one simulation, consumed by [`Engine::backup`].
#[derive(Clone, Debug)]
pub struct Iteration {
    /// (state, action) pairs from the root down
    pub transitions: Vec<(Bitmask, Wall)>,
    pub value: Value,
    /// Player to move at the root
    pub first_mover: Color,
    /// Walls played by the leaf playouts
    pub amaf: [AmafStats; NUM_WALLS],
}

impl Iteration {
    pub fn new(first_mover: Color) -> Self {
        Self {
            transitions: Vec::with_capacity(NUM_WALLS),
            value: Value::Estimated(0.0),
            first_mover,
            amaf: [AmafStats::default(); NUM_WALLS],
        }
    }

    fn record(&mut self, state: Bitmask, action: Wall) {
        debug_assert!(self.transitions.len() < NUM_WALLS);
        self.transitions.push((state, action));
    }

    /// Player who took the `t`-th transition.
    #[inline]
    pub fn mover(&self, t: usize) -> Color {
        if t % 2 == 0 {
            self.first_mover
        } else {
            self.first_mover.opponent()
        }
    }
}

// =============================================================================
// Configuration
// =============================================================================

#[derive(Clone, Debug)]
pub struct SearchConfig {
    /// Playouts per evaluated leaf
    pub samples: usize,
    /// Leaves with at most this many legal moves are solved exactly
    pub solver_threshold: usize,
    /// Transposition table size beyond which no node is created
    pub max_nodes: usize,
    /// Simulations per decision
    pub max_iterations: usize,
    pub default_move_time: Duration,
    pub max_move_time: Duration,
    pub check_time: Duration,
    pub total_time: Duration,
    pub io_overhead: Duration,
    pub time_trouble_turn: usize,
    pub opening_turns: usize,
    pub opponent_random_one_in: u32,
    pub claim_turn: usize,
    pub claim_value: f32,
    /// Random seed; `None` seeds from the system
    pub seed: Option<u64>,
    /// Symmetry used for opening book lookups; `None` picks one at random
    pub transformation: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            samples: SAMPLES,
            solver_threshold: SOLVER_THRESHOLD,
            max_nodes: MAX_NODES,
            max_iterations: MAX_ITERATIONS,
            default_move_time: DEFAULT_MOVE_TIME,
            max_move_time: MAX_MOVE_TIME,
            check_time: CHECK_TIME,
            total_time: TOTAL_TIME,
            io_overhead: IO_OVERHEAD,
            time_trouble_turn: TIME_TROUBLE_TURN,
            opening_turns: OPENING_TURNS,
            opponent_random_one_in: OPPONENT_RANDOM_ONE_IN,
            claim_turn: CLAIM_TURN,
            claim_value: CLAIM_VALUE,
            seed: None,
            transformation: None,
        }
    }
}

impl SearchConfig {
    /// Same settings with the seed shifted by `offset`, for independent games.
    pub fn reseeded(&self, offset: u64) -> Self {
        Self {
            seed: self.seed.map(|s| s.wrapping_add(offset)),
            ..self.clone()
        }
    }
}

/// Statistics of one legal move, for inspection.
#[derive(Clone, Debug)]
pub struct ActionReport {
    pub mv: Move,
    pub info: ActionInfo,
    pub eval: f32,
    pub most_visited: bool,
    pub best: bool,
}

impl fmt::Display for ActionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} e={:.3}",
            self.mv, self.info.direct, self.info.same_color, self.info.any_color, self.eval
        )?;
        match self.info.status {
            Status::Win => write!(f, " (winning)")?,
            Status::Loss => write!(f, " (losing)")?,
            _ => {}
        }
        if self.most_visited {
            write!(f, " (most visited one)")?;
        }
        if self.best {
            write!(f, " (best one)")?;
        }
        Ok(())
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Search state for one game.
pub struct Engine {
    table: FxHashMap<Bitmask, StateInfo>,
    config: SearchConfig,
    rng: fastrand::Rng,
    book: OpeningBook,
    transformation: usize,
    time_spent: Duration,
    can_claim_win: bool,
    /// The side the engine is searching for
    me: Color,
}

impl Engine {
    pub fn new(config: SearchConfig) -> Self {
        Self::with_book(config, OpeningBook::default())
    }

    pub fn with_book(config: SearchConfig, book: OpeningBook) -> Self {
        let mut rng = config.seed.map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);
        let transformation = config
            .transformation
            .unwrap_or_else(|| rng.usize(..NUM_TRANSFORMATIONS))
            % NUM_TRANSFORMATIONS;
        debug!("using transformation {transformation}");
        Self {
            table: FxHashMap::default(),
            time_spent: config.io_overhead,
            config,
            rng,
            book,
            transformation,
            can_claim_win: true,
            me: Color::White,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Number of states in the transposition table.
    pub fn table_len(&self) -> usize {
        self.table.len()
    }

    pub fn state_info(&self, state: Bitmask) -> Option<&StateInfo> {
        self.table.get(&state)
    }

    /// Wall-clock time charged to this game so far.
    pub fn time_spent(&self) -> Duration {
        self.time_spent
    }

    /// Forget everything and start a new game.
    pub fn new_game(&mut self) {
        self.table.clear();
        self.time_spent = self.config.io_overhead;
        self.can_claim_win = true;
    }

    /// Run one simulation from `pos`.
    pub fn simulate(&mut self, pos: &Position) {
        let iteration = self.descend(pos);
        self.backup(&iteration);
    }

    /// Run the tree and leaf phases of a simulation without backing up.
    pub fn descend(&mut self, pos: &Position) -> Iteration {
        let mut leaf = pos.clone();
        let mut iteration = Iteration::new(pos.to_move());
        let remaining = self.simulate_tree(&mut leaf, &mut iteration);
        let mover = leaf.to_move();

        iteration.value = if remaining == 0 || leaf.is_end_game() {
            Value::Proven(mover.opponent())
        } else if remaining <= self.config.solver_threshold
            && leaf.legal_move_count() <= self.config.solver_threshold
        {
            match winning_action(&leaf) {
                None => Value::Proven(mover.opponent()),
                Some(action) => {
                    if !self.table.contains_key(&leaf.state)
                        && self.table.len() < self.config.max_nodes
                    {
                        self.new_node(&leaf);
                    }
                    // Past the node cap the proof still reaches the parent.
                    if self.table.contains_key(&leaf.state) {
                        iteration.record(leaf.state, action);
                    }
                    Value::Proven(mover)
                }
            }
        } else {
            Value::Estimated(sample_playouts(
                &leaf,
                self.config.samples,
                &mut self.rng,
                &mut iteration.amaf,
            ))
        };
        iteration
    }

    /// Walk down the tree, expanding at most one node.
    ///
    /// Returns the number of legal moves at the leaf (an estimate when the
    /// table is full), or 0 when the leaf is lost for the player to move.
    fn simulate_tree(&mut self, pos: &mut Position, iteration: &mut Iteration) -> usize {
        let mut parent: Option<(Bitmask, Wall)> = None;
        loop {
            if pos.is_end_game() {
                return 0;
            }

            let state = pos.state;
            let Some(info) = self.table.get(&state) else {
                if self.table.len() < self.config.max_nodes {
                    let count = self.new_node(pos);
                    let mv = pos
                        .random_move(&mut self.rng)
                        .expect("unfinished game has a legal move");
                    pos.apply_move(&mv);
                    iteration.record(state, mv.wall);
                    return count;
                }
                return parent
                    .and_then(|(s, _)| self.table.get(&s))
                    .map_or(NUM_WALLS, |p| p.actions_count as usize);
            };

            let count = info.actions_count;
            let losing = info.is_losing();
            if let Some((s, a)) = parent
                && let Some(p) = self.table.get_mut(&s)
            {
                p.actions[a].impact = p.actions_count.saturating_sub(count).min(MAX_IMPACT);
            }
            if losing {
                return 0;
            }

            let mv = self.select(pos);
            pos.apply_move(&mv);
            iteration.record(state, mv.wall);
            parent = Some((state, mv.wall));
        }
    }

    /// Create the node for `pos` and return its number of legal moves.
    ///
    /// During the opening, the searching side only instantiates known good
    /// opening walls (all legal walls if none of them is legal).
    fn new_node(&mut self, pos: &Position) -> usize {
        let mover = pos.to_move();
        let restricted = pos.turns < self.config.opening_turns && mover == self.me;
        let openings = GOOD_OPENING_MOVES[mover.index()];

        let mut info = StateInfo::new(!pos.placed & !pos.possible_walls & ALL_WALLS);
        for mv in pos.legal_moves() {
            info.actions_count += 1;
            if !restricted || contains(openings, mv.wall) {
                info.instantiate(mv.wall, pos.impact(&mv));
            }
        }
        if restricted && info.valid_actions().next().is_none() {
            for mv in pos.legal_moves() {
                info.instantiate(mv.wall, pos.impact(&mv));
            }
        }

        let count = info.actions_count as usize;
        self.table.insert(pos.state, info);
        count
    }

    /// Pick the next action at a known node.
    ///
    /// Proven wins are always followed. Our own plies are greedy; opponent
    /// plies are occasionally random to diversify the simulated opposition.
    fn select(&mut self, pos: &Position) -> Move {
        let info = &self.table[&pos.state];
        let rng = &mut self.rng;
        let action = if info.is_winning() {
            Some(info.winning_action as Wall)
        } else if pos.to_move() != self.me
            && rng.u32(..self.config.opponent_random_one_in.max(1)) == 0
        {
            info.select_random(rng)
        } else {
            info.select(rng)
        };
        pos.get_move(action.expect("node has at least one action"))
    }

    fn select_most_visited(&self, pos: &Position) -> Move {
        let action = self.table[&pos.state]
            .most_visited()
            .expect("node has at least one action");
        pos.get_move(action)
    }

    /// Propagate a simulation's outcome from the leaf back to the root.
    pub fn backup(&mut self, iteration: &Iteration) {
        let samples = self.config.samples.max(1) as u32;
        let observed: Vec<Wall> = (0..NUM_WALLS)
            .filter(|&a| iteration.amaf[a].is_observed())
            .collect();
        let mut value = iteration.value;

        for (t, &(state, action)) in iteration.transitions.iter().enumerate().rev() {
            let mover = iteration.mover(t);
            let info = self
                .table
                .get_mut(&state)
                .expect("recorded state is in the table");

            if let Value::Proven(winner) = value {
                if winner == mover {
                    info.mark_winning(action);
                    continue;
                }
                info.mark_losing(action);
                if info.all_actions_losing() {
                    info.status = Status::Loss;
                    continue;
                }
                value = value.damped();
            }
            let v = value.for_color(mover);

            info.update_direct(action, v, samples);

            let mut same_color = true;
            for &(_, a) in &iteration.transitions[t..] {
                info.update_any_color(a, v, samples);
                if same_color {
                    info.update_same_color(a, v, samples);
                }
                same_color = !same_color;
            }

            for &a in &observed {
                let amaf = &iteration.amaf[a];
                let slot = &mut info.actions[a];
                if !slot.is_valid() {
                    continue;
                }
                match mover {
                    Color::White => {
                        slot.same_color += amaf.white;
                        slot.any_color += amaf.any;
                    }
                    Color::Black => {
                        slot.same_color -= amaf.black;
                        slot.any_color -= amaf.any;
                    }
                }
            }
        }
    }

    /// Drop states that can no longer be reached from `pos`.
    ///
    /// A cached state survives if every wall set in the live state but not in
    /// the cached one was already unplayable when the cached node was created.
    pub fn clean(&mut self, pos: &Position) {
        let before = self.table.len();
        let live = pos.state;
        self.table.retain(|&state, info| {
            let diff = live & !state;
            diff & info.invalid == diff
        });
        debug!("pruned table {before} -> {}", self.table.len());
    }

    /// Per-move budget: fixed early on, then half of what is left of the game budget.
    fn move_budget(&self, pos: &Position) -> Duration {
        if pos.turns >= self.config.time_trouble_turn {
            let remaining = self.config.total_time.saturating_sub(self.time_spent);
            self.config.max_move_time.min(remaining / 2)
        } else {
            self.config.default_move_time
        }
    }

    /// Choose a move for the player to move in `pos`.
    ///
    /// Returns whether to claim the win together with the move. A claim is
    /// granted at most once per game.
    pub fn choose_move(&mut self, pos: &Position, use_time_constraint: bool) -> (bool, Move) {
        assert!(!pos.is_end_game(), "no legal move in a finished game");
        let start = Instant::now();
        self.me = pos.to_move();

        if let Some(wall) = self.book.lookup(pos.placed, self.transformation) {
            let mv = pos.get_move(wall);
            if pos.is_possible_wall(wall) && pos.is_possible_size(mv.zone.size) {
                info!("from opening book: {mv}");
                return (false, mv);
            }
            warn!("opening book move {mv} is illegal here, searching instead");
        }

        let max_time = self.move_budget(pos);
        if use_time_constraint {
            info!("max-time={:.2}s", max_time.as_secs_f64());
        }

        self.clean(pos);
        if !self.table.contains_key(&pos.state) {
            self.new_node(pos);
        }

        let mut iterations = 0;
        while iterations < self.config.max_iterations {
            self.simulate(pos);
            iterations += 1;

            let root = &self.table[&pos.state];
            if root.is_winning() {
                let mv = pos.get_move(root.winning_action as Wall);
                self.charge(start, iterations);
                info!("win found at turn {}", pos.turns + 1);
                let claim = self.can_claim_win;
                self.can_claim_win = false;
                return (claim, mv);
            }
            if root.is_losing() {
                let mv = self.select_most_visited(pos);
                self.charge(start, iterations);
                info!("game lost, playing most visited anyway");
                return (false, mv);
            }

            if use_time_constraint {
                let elapsed = start.elapsed();
                if elapsed >= max_time + self.config.check_time {
                    break;
                }
                if elapsed >= max_time && self.select(pos) == self.select_most_visited(pos) {
                    break;
                }
            }
        }

        let mut best = self.select_most_visited(pos);
        if self.table[&pos.state].actions[best.wall].is_losing() {
            best = self.select(pos);
            info!("most visited is losing, switching to best selection");
        }

        self.log_choice(pos, &best);
        match self.principal_variation_depth(pos) {
            Some(depth) => info!("depth={depth}"),
            None => info!("depth=solved"),
        }
        self.charge(start, iterations);

        let info = &self.table[&pos.state].actions[best.wall];
        debug!("impact={}", info.impact);
        let claim = self.can_claim_win
            && pos.turns >= self.config.claim_turn
            && info.direct.value >= self.config.claim_value;
        if claim {
            self.can_claim_win = false;
        }
        (claim, best)
    }

    /// Add the decision's time to the game total and report speed.
    fn charge(&mut self, start: Instant, iterations: usize) {
        let dt = start.elapsed();
        self.time_spent += dt;
        let speed = 0.001 * iterations as f64 / dt.as_secs_f64().max(1e-9);
        info!(
            "i={iterations} dt={:.2} tt={:.2} {speed:.2}k it/s",
            dt.as_secs_f64(),
            self.time_spent.as_secs_f64()
        );
    }

    fn log_choice(&mut self, pos: &Position, mv: &Move) {
        let info = &self.table[&pos.state];
        let action = &info.actions[mv.wall];
        if action.is_winning() {
            info!("winning move!");
        } else if action.is_losing() {
            info!("losing move!");
        } else {
            let eval = info.eval(mv.wall, &mut self.rng);
            info!(
                "{mv}: w={:.2}% e={:.2}%",
                50.0 * (1.0 + action.direct.value),
                50.0 * (1.0 + eval)
            );
        }
    }

    /// Selection score of `mv` at `pos`.
    ///
    /// Returns `None` when `pos` has no node in the table, either because it
    /// was never searched or because it was pruned since.
    pub fn evaluate(&mut self, pos: &Position, mv: &Move) -> Option<f32> {
        let info = self.table.get(&pos.state)?;
        Some(info.eval(mv.wall, &mut self.rng))
    }

    /// Length of the line obtained by following the most visited actions.
    ///
    /// Returns `None` when the line reaches a proven node.
    pub fn principal_variation_depth(&mut self, pos: &Position) -> Option<usize> {
        let mut tmp = pos.clone();
        let mut depth = 0;
        while !tmp.is_end_game() {
            let Some(info) = self.table.get(&tmp.state) else {
                break;
            };
            if info.is_winning() || info.is_losing() {
                return None;
            }
            let Some(mut next) = info.most_visited() else {
                break;
            };
            if info.actions[next].is_losing() {
                match info.select(&mut self.rng) {
                    Some(a) => next = a,
                    None => break,
                }
            }
            if !tmp.is_possible_wall(next) {
                break;
            }
            let mv = tmp.get_move(next);
            tmp.apply_move(&mv);
            depth += 1;
        }
        Some(depth)
    }

    /// Run up to `iterations` simulations from `pos`, stopping early once
    /// the position is solved. Returns the number run.
    pub fn inspect(&mut self, pos: &Position, iterations: usize) -> usize {
        if pos.is_end_game() {
            return 0;
        }
        self.me = pos.to_move();
        for i in 0..iterations {
            self.simulate(pos);
            if let Some(root) = self.table.get(&pos.state)
                && (root.is_winning() || root.is_losing())
            {
                return i + 1;
            }
        }
        iterations
    }

    /// Statistics of every legal move at `pos`; empty if `pos` was never reached.
    pub fn report(&mut self, pos: &Position) -> Vec<ActionReport> {
        let Some(info) = self.table.get(&pos.state) else {
            return Vec::new();
        };
        let most_visited = info.most_visited();
        let best = info.select(&mut self.rng);
        pos.legal_moves()
            .map(|mv| ActionReport {
                mv,
                info: info.actions[mv.wall],
                eval: info.eval(mv.wall, &mut self.rng),
                most_visited: most_visited == Some(mv.wall),
                best: best == Some(mv.wall),
            })
            .collect()
    }
}
