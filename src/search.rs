//! Iterative-deepening negamax alpha-beta with quiescence search,
//! transposition caching, null-move pruning, check extension and
//! mate-distance pruning. Cancellation is cooperative: the node counter
//! polls the clock and an external stop flag at a bounded interval and the
//! recursion unwinds cleanly, keeping the last fully completed depth.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::{
    constants::{
        CANDIDATE_DEPTH, DEFAULT_MAX_DEPTH, DELTA_MARGIN, DRAW_SCORE, INFINITY_SCORE, MATE_BOUND,
        MATE_SCORE, MAX_PLY, NODE_POLL_INTERVAL, NULL_MOVE_MATERIAL_FLOOR, NULL_MOVE_MIN_DEPTH,
        NULL_MOVE_REDUCTION, NUM_SQUARES, SEE_PRUNE_MARGIN,
    },
    eval,
    hash::{Bound, HashTable},
    ordering::{self, HistoryTable, KillerSlots},
    position::Position,
    time::TimeManager,
    types::Move,
};

/// Plain-scalar knobs for one search invocation. The protocol layer maps
/// its configuration onto this; the core never parses anything.
#[cfg_attr(feature = "api", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug)]
pub struct SearchLimits {
    pub time_budget: Option<Duration>,
    pub max_depth: u8,
    pub max_nodes: Option<u64>,
    pub null_move: bool,
    pub check_extension: bool,
    pub see_filter: bool,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            time_budget: None,
            max_depth: DEFAULT_MAX_DEPTH,
            max_nodes: None,
            null_move: true,
            check_extension: true,
            see_filter: true,
        }
    }
}

impl SearchLimits {
    pub fn depth(max_depth: u8) -> Self {
        Self {
            max_depth,
            ..Self::default()
        }
    }

    pub fn budget(time_budget: Duration) -> Self {
        Self {
            time_budget: Some(time_budget),
            max_depth: MAX_PLY as u8,
            ..Self::default()
        }
    }
}

/// Advisory per-search counters. They never influence search decisions.
#[cfg_attr(feature = "api", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default)]
pub struct Diagnostics {
    pub nodes: u64,
    pub qnodes: u64,
    pub tt_probes: u64,
    pub tt_hits: u64,
    pub tt_stores: u64,
    pub tt_collisions: u64,
    pub beta_cutoffs: u64,
    pub q_delta_pruned: u64,
    pub q_see_skipped: u64,
    pub q_evasions: u64,
}

/// One scored root move, as handed to the root selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RootCandidate {
    pub mv: Move,
    pub score: i32,
}

/// The outcome of a search. `best_move` is `None` only when the side to
/// move has no legal move at all (mate or stalemate on entry).
#[derive(Clone, Debug, Default)]
pub struct SearchReport {
    pub best_move: Option<Move>,
    pub score: i32,
    pub depth: u8,
    pub nodes: u64,
    pub pv: Vec<Move>,
    pub candidates: Vec<RootCandidate>,
    pub elapsed: Duration,
}

impl SearchReport {
    pub fn is_mate_score(&self) -> bool {
        self.score.abs() > MATE_BOUND
    }
}

/// The search context: transposition table, killer and history tables,
/// the repetition path and diagnostics, owned by one engine instance for
/// its lifetime. Passing it explicitly (rather than via globals) keeps
/// instances independent and testable.
pub struct Searcher {
    tt: HashTable,
    killers: [KillerSlots; MAX_PLY],
    history: HistoryTable,
    pv_table: [[Option<Move>; MAX_PLY]; MAX_PLY],
    pv_length: [usize; MAX_PLY],
    /// Hashes of ancestors on the current search path, seeded with the
    /// game history, for repetition detection.
    path: Vec<u64>,
    pub diag: Diagnostics,
    clock: TimeManager,
    limits: SearchLimits,
    stop_flag: Arc<AtomicBool>,
    stopped: bool,
}

impl Searcher {
    pub fn new() -> Self {
        Self::with_table(HashTable::new())
    }

    /// A searcher over a caller-sized transposition table. Small tables
    /// are useful in tests to force index collisions.
    pub fn with_table(tt: HashTable) -> Self {
        Self {
            tt,
            killers: [[None; 2]; MAX_PLY],
            history: [[0; NUM_SQUARES]; NUM_SQUARES],
            pv_table: [[None; MAX_PLY]; MAX_PLY],
            pv_length: [0; MAX_PLY],
            path: Vec::with_capacity(MAX_PLY + 64),
            diag: Diagnostics::default(),
            clock: TimeManager::unlimited(),
            limits: SearchLimits::default(),
            stop_flag: Arc::new(AtomicBool::new(false)),
            stopped: false,
        }
    }

    /// A handle an embedder may set from elsewhere to request a
    /// cooperative stop. Polled, never preemptive.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop_flag)
    }

    pub fn clear_tables(&mut self) {
        self.tt.clear();
        self.killers = [[None; 2]; MAX_PLY];
        self.history = [[0; NUM_SQUARES]; NUM_SQUARES];
    }

    /// Searches `position` within `limits`. `history` holds the hashes of
    /// earlier game positions so lines that repeat one of them score as
    /// drawn. Blocks for at most (slightly over) the time budget.
    pub fn search(
        &mut self,
        position: &Position,
        limits: &SearchLimits,
        history: &[u64],
    ) -> SearchReport {
        self.search_with(position, limits, history, |_| {})
    }

    /// Like [`search`], invoking `on_depth` after every fully completed
    /// deepening pass with the report so far.
    ///
    /// [`search`]: Searcher::search
    pub fn search_with(
        &mut self,
        position: &Position,
        limits: &SearchLimits,
        history: &[u64],
        mut on_depth: impl FnMut(&SearchReport),
    ) -> SearchReport {
        self.diag = Diagnostics::default();
        self.limits = limits.clone();
        self.clock = TimeManager::from_budget(limits.time_budget);
        self.stopped = false;
        self.stop_flag.store(false, Ordering::Relaxed);
        self.path.clear();
        self.path.extend_from_slice(history);

        let mut report = SearchReport::default();
        let root_moves = position.legal_moves();

        if root_moves.is_empty() {
            // Game over on entry; the caller owns reporting the outcome.
            report.elapsed = self.clock.elapsed();
            return report;
        }

        let max_depth = limits.max_depth.clamp(1, MAX_PLY as u8 - 1);

        for depth in 1..=max_depth {
            if depth > 1 && self.clock.soft_expired() {
                break;
            }

            self.pv_length[0] = 0;
            let score = self.negamax(position, depth as i32, 0, -INFINITY_SCORE, INFINITY_SCORE, true);

            if self.stopped {
                // A pass interrupted mid-node proves nothing; keep the
                // last completed depth's result.
                break;
            }

            report.depth = depth;
            report.score = score;
            report.pv = self.collect_pv();
            report.best_move = report.pv.first().copied();
            report.nodes = self.diag.nodes + self.diag.qnodes;
            report.elapsed = self.clock.elapsed();

            log::debug!(
                "depth {} score {} nodes {} pv {}",
                depth,
                score,
                report.nodes,
                report
                    .pv
                    .iter()
                    .map(Move::to_string)
                    .collect::<Vec<_>>()
                    .join(" ")
            );

            on_depth(&report);

            if report.is_mate_score() {
                break;
            }
        }

        // A budget so small that not even depth 1 finished still owes the
        // caller a legal move.
        if report.best_move.is_none() {
            report.best_move = Some(root_moves[0]);
            report.depth = 0;
        }

        report.candidates = self.collect_candidates(position, &root_moves, &report);
        report.nodes = self.diag.nodes + self.diag.qnodes;
        report.elapsed = self.clock.elapsed();

        report
    }

    /// Scores every root move with a shallow full-window search, giving
    /// the selector comparable numbers (deep alpha-beta scores for non-PV
    /// moves are only bounds). Skipped entirely once the clock has fired.
    fn collect_candidates(
        &mut self,
        position: &Position,
        root_moves: &[Move],
        report: &SearchReport,
    ) -> Vec<RootCandidate> {
        let mut candidates = Vec::with_capacity(root_moves.len());

        if !self.stopped {
            let shallow = report.depth.clamp(1, CANDIDATE_DEPTH) as i32;

            for &mv in root_moves {
                let next = position.apply(mv);
                self.path.push(position.hash);
                let score = -self.negamax(&next, shallow - 1, 1, -INFINITY_SCORE, INFINITY_SCORE, true);
                self.path.pop();

                if self.stopped {
                    break;
                }

                candidates.push(RootCandidate { mv, score });
            }
        }

        if let Some(best) = report.best_move {
            if !candidates.iter().any(|c| c.mv == best) {
                candidates.push(RootCandidate {
                    mv: best,
                    score: report.score,
                });
            }
        }

        candidates.sort_by(|a, b| b.score.cmp(&a.score));
        candidates
    }

    fn negamax(
        &mut self,
        position: &Position,
        depth: i32,
        ply: usize,
        mut alpha: i32,
        mut beta: i32,
        allow_null: bool,
    ) -> i32 {
        self.diag.nodes += 1;

        if self.should_stop() {
            return 0;
        }

        self.pv_length[ply] = ply;

        if ply >= MAX_PLY - 1 {
            return eval::side_relative(position);
        }

        let root = ply == 0;

        if !root {
            if position.fifty >= 100
                || position.insufficient_material()
                || self.path.contains(&position.hash)
            {
                return DRAW_SCORE;
            }

            // Mate-distance pruning: a mate further away than this ply
            // cannot beat one already found closer to the root.
            alpha = alpha.max(-MATE_SCORE + ply as i32);
            beta = beta.min(MATE_SCORE - ply as i32 - 1);
            if alpha >= beta {
                return alpha;
            }
        }

        if depth <= 0 {
            return self.quiescence(position, ply, alpha, beta);
        }

        let pseudo = position.pseudo_legal_moves();

        // Transposition probe. The stored move may belong to a colliding
        // or stale entry, so it must prove itself legal before the entry
        // is trusted at all.
        self.diag.tt_probes += 1;
        let mut hash_move: Option<Move> = None;

        if let Some(entry) = self.tt.probe(position.hash) {
            let entry = *entry;
            self.diag.tt_hits += 1;

            let move_trusted = match entry.best_move {
                Some(mv) => {
                    if pseudo.contains(&mv) && !position.apply(mv).in_check(position.side) {
                        hash_move = Some(mv);
                        true
                    } else {
                        false
                    }
                }
                None => true,
            };

            if move_trusted && !root && i32::from(entry.depth) >= depth {
                let score = score_from_tt(entry.score, ply);

                match entry.bound {
                    Bound::Exact => return score,
                    Bound::Lower if score >= beta => return score,
                    Bound::Upper if score <= alpha => return score,
                    _ => {}
                }
            }
        }

        let in_check = position.in_check(position.side);

        let depth = if in_check && self.limits.check_extension {
            depth + 1
        } else {
            depth
        };

        // Null move: hand the opponent a free move at reduced depth; if we
        // still beat beta the real search would too. Unsound in zugzwang;
        // the material floor is the only safeguard, as in the original
        // single-threaded design, so low-material endgames keep it off.
        if self.limits.null_move
            && allow_null
            && !root
            && !in_check
            && depth >= NULL_MOVE_MIN_DEPTH
            && position.non_pawn_material(position.side) > NULL_MOVE_MATERIAL_FLOOR
        {
            let null_position = position.make_null();
            self.path.push(position.hash);
            let score = -self.negamax(
                &null_position,
                depth - 1 - NULL_MOVE_REDUCTION,
                ply + 1,
                -beta,
                -beta + 1,
                false,
            );
            self.path.pop();

            if self.stopped {
                return 0;
            }

            if score >= beta {
                self.diag.beta_cutoffs += 1;
                return beta;
            }
        }

        let mut moves = pseudo;
        ordering::order_moves(&mut moves, position, hash_move, &self.killers[ply], &self.history);

        let mut legal = 0u32;
        let mut best_score = -INFINITY_SCORE;
        let mut best_move: Option<Move> = None;
        let mut bound = Bound::Upper;

        for mv in moves {
            let next = position.apply(mv);

            if next.in_check(position.side) {
                continue;
            }

            legal += 1;
            self.path.push(position.hash);
            let score = -self.negamax(&next, depth - 1, ply + 1, -beta, -alpha, true);
            self.path.pop();

            if self.stopped {
                return 0;
            }

            if score > best_score {
                best_score = score;
                best_move = Some(mv);
            }

            if score > alpha {
                alpha = score;
                bound = Bound::Exact;
                self.store_pv(ply, mv);

                if alpha >= beta {
                    bound = Bound::Lower;
                    self.diag.beta_cutoffs += 1;

                    if !position.is_tactical(mv) {
                        let slots = &mut self.killers[ply];
                        if slots[0] != Some(mv) {
                            slots[1] = slots[0];
                            slots[0] = Some(mv);
                        }

                        ordering::update_history(&mut self.history, mv, depth);
                    }

                    break;
                }
            }
        }

        if legal == 0 {
            // No legal moves is not an error: it is mate or stalemate.
            // Mate scores are offset by ply so shallower mates win.
            return if in_check {
                -(MATE_SCORE - ply as i32)
            } else {
                DRAW_SCORE
            };
        }

        self.diag.tt_stores += 1;
        if self.tt.store(
            position.hash,
            depth.clamp(0, u8::MAX as i32) as u8,
            score_to_tt(best_score, ply),
            best_move,
            bound,
        ) {
            self.diag.tt_collisions += 1;
        }

        best_score
    }

    /// Horizon search over tactical moves only, so the scorer is never
    /// asked to judge a position mid-exchange. In check there is no
    /// standing pat: every evasion is searched, and none means mate.
    fn quiescence(&mut self, position: &Position, ply: usize, mut alpha: i32, beta: i32) -> i32 {
        self.diag.qnodes += 1;

        if self.should_stop() {
            return 0;
        }

        self.pv_length[ply] = ply;

        if ply >= MAX_PLY - 1 {
            return eval::side_relative(position);
        }

        let in_check = position.in_check(position.side);

        if !in_check {
            let stand_pat = eval::side_relative(position);

            if stand_pat >= beta {
                return beta;
            }

            if stand_pat > alpha {
                alpha = stand_pat;
            }

            // Delta pruning: even the biggest plausible capture gain
            // cannot lift this position back to alpha.
            if stand_pat < alpha - DELTA_MARGIN {
                self.diag.q_delta_pruned += 1;
                return alpha;
            }
        }

        let mut moves = if in_check {
            position.pseudo_legal_moves()
        } else {
            position.tactical_moves()
        };

        ordering::order_tactical(&mut moves, position);

        let mut legal = 0u32;

        for mv in moves {
            if !in_check && self.limits.see_filter && ordering::see(position, mv) < SEE_PRUNE_MARGIN
            {
                self.diag.q_see_skipped += 1;
                continue;
            }

            let next = position.apply(mv);

            if next.in_check(position.side) {
                continue;
            }

            legal += 1;
            if in_check {
                self.diag.q_evasions += 1;
            }

            let score = -self.quiescence(&next, ply + 1, -beta, -alpha);

            if self.stopped {
                return 0;
            }

            if score > alpha {
                alpha = score;
                self.store_pv(ply, mv);

                if alpha >= beta {
                    return beta;
                }
            }
        }

        if in_check && legal == 0 {
            return -(MATE_SCORE - ply as i32);
        }

        alpha
    }

    /// Cooperative cancellation: cheap counter check every node, the
    /// actual clock/flag reads only at the poll interval.
    fn should_stop(&mut self) -> bool {
        if self.stopped {
            return true;
        }

        let visited = self.diag.nodes + self.diag.qnodes;

        if visited % NODE_POLL_INTERVAL == 0 {
            if self.stop_flag.load(Ordering::Relaxed) || self.clock.hard_expired() {
                self.stopped = true;
            }

            if let Some(max_nodes) = self.limits.max_nodes {
                if visited >= max_nodes {
                    self.stopped = true;
                }
            }
        }

        self.stopped
    }

    fn store_pv(&mut self, ply: usize, mv: Move) {
        self.pv_table[ply][ply] = Some(mv);

        let child_length = self.pv_length[ply + 1];
        for i in (ply + 1)..child_length {
            self.pv_table[ply][i] = self.pv_table[ply + 1][i];
        }

        self.pv_length[ply] = child_length.max(ply + 1);
    }

    fn collect_pv(&self) -> Vec<Move> {
        (0..self.pv_length[0])
            .map_while(|i| self.pv_table[0][i])
            .collect()
    }
}

impl Default for Searcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Mate scores are stored root-relative in the table and converted back on
/// probe, so an entry found at a different ply still means the same
/// distance to mate.
fn score_to_tt(score: i32, ply: usize) -> i32 {
    if score > MATE_BOUND {
        score + ply as i32
    } else if score < -MATE_BOUND {
        score - ply as i32
    } else {
        score
    }
}

fn score_from_tt(score: i32, ply: usize) -> i32 {
    if score > MATE_BOUND {
        score - ply as i32
    } else if score < -MATE_BOUND {
        score + ply as i32
    } else {
        score
    }
}
