//! The root selector: instead of always playing the single best move, it
//! samples among near-best root candidates with a temperature-weighted
//! distribution, under guardrails that forbid outright blunders. The draw
//! is seeded, so the same inputs always produce the same pick.

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    position::Position,
    search::RootCandidate,
    types::{Move, Piece},
};

/// Tuning knobs for the selector. All neutral-at-100 percentages follow
/// the personality-file convention of the protocol layer.
#[cfg_attr(feature = "api", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug)]
pub struct SelectorParams {
    pub enabled: bool,
    /// Higher spreads probability toward weaker candidates; 0 is greedy.
    pub temperature: i32,
    /// Per-candidate random score wobble, in centipawns.
    pub noise_cp: i32,
    /// Above 100 boosts candidates that score below best; below 100
    /// suppresses them.
    pub risk_appetite: i32,
    /// Above 100 suppresses candidates clearly worse than best.
    pub simplicity_bias: i32,
    /// Candidates worse than best by more than this are discarded outright.
    pub hard_floor_cp: i32,
    /// Penalty weight for edge moves in the opening; 0 disables.
    pub opening_sanity: i32,
    /// Keep only the K best candidates before sampling; 0 disables.
    pub top_k: usize,
    pub candidate_margin_cp: i32,
    pub candidate_moves_max: usize,
    pub seed: u64,
}

impl Default for SelectorParams {
    fn default() -> Self {
        Self {
            enabled: true,
            temperature: 100,
            noise_cp: 0,
            risk_appetite: 100,
            simplicity_bias: 100,
            hard_floor_cp: 200,
            opening_sanity: 120,
            top_k: 0,
            candidate_margin_cp: 200,
            candidate_moves_max: 10,
            seed: 0,
        }
    }
}

/// Picks the move to play from the search's ranked root candidates.
///
/// `fallback` is the search engine's own best move; it is returned
/// whenever sampling is disabled, filtered down to nothing, or produces a
/// move that fails the final legality check. The returned move is always
/// verified legal in `position` — an unverified move never reaches the
/// caller.
pub fn pick(
    position: &Position,
    candidates: &[RootCandidate],
    fallback: Option<Move>,
    params: &SelectorParams,
) -> Option<Move> {
    let fallback = fallback.filter(|&mv| position.is_legal(mv));

    if candidates.is_empty() {
        return fallback;
    }

    if !params.enabled || candidates.len() == 1 {
        return finish(position, candidates[0].mv, fallback);
    }

    let mut pool = candidates.to_vec();
    pool.sort_by(|a, b| b.score.cmp(&a.score));
    let best_score = pool[0].score;

    // Guardrail 1: hard floor. Nothing catastrophically worse than best
    // may survive into the sampling pool.
    pool.retain(|c| c.score >= best_score - params.hard_floor_cp);

    // Guardrail 2: opening sanity. Edge moves in the first dozen plies
    // take a score penalty before the pool is re-ranked.
    if params.opening_sanity > 0 && position.fullmove <= 6 {
        let penalty = params.opening_sanity * 5;

        for candidate in &mut pool {
            if is_edge_move(position, candidate.mv) {
                candidate.score -= penalty;
            }
        }

        pool.sort_by(|a, b| b.score.cmp(&a.score));
    }

    // Guardrail 3: optional top-K truncation.
    if params.top_k > 0 && params.top_k < pool.len() {
        pool.truncate(params.top_k);
    }

    // Secondary margin and candidate-count cap.
    pool.retain(|c| c.score >= best_score - params.candidate_margin_cp);
    let max_candidates = params.candidate_moves_max.max(1);
    if pool.len() > max_candidates {
        pool.truncate(max_candidates);
    }

    let Some(&front) = pool.first() else {
        return fallback;
    };

    if pool.len() == 1 {
        return finish(position, front.mv, fallback);
    }

    let temperature = f64::from(params.temperature.max(0)) / 100.0;
    let mut weights = Vec::with_capacity(pool.len());

    for candidate in &pool {
        let score_diff = f64::from(candidate.score - best_score) / 100.0;
        let mut weight = (score_diff / (temperature + 0.01)).exp();

        if params.noise_cp > 0 {
            let mut rng = StdRng::seed_from_u64(params.seed ^ move_key(candidate.mv));
            let noise: f64 =
                (rng.gen_range(0.0..1.0) - 0.5) * 2.0 * f64::from(params.noise_cp) / 100.0;
            weight *= noise.exp();
        }

        if candidate.score < best_score {
            if params.risk_appetite > 100 {
                weight *= 1.0 + f64::from(params.risk_appetite - 100) / 100.0 * 0.3;
            } else if params.risk_appetite < 100 {
                weight *= 1.0 - f64::from(100 - params.risk_appetite) / 100.0 * 0.5;
            }
        }

        if params.simplicity_bias > 100 && candidate.score < best_score - 50 {
            weight *= 1.0 - f64::from(params.simplicity_bias - 100) / 100.0 * 0.3;
        }

        weights.push(weight.max(0.0));
    }

    let total: f64 = weights.iter().sum();
    if total <= f64::EPSILON {
        return finish(position, front.mv, fallback);
    }

    let mut rng = StdRng::seed_from_u64(params.seed);
    let draw: f64 = rng.gen_range(0.0..1.0);

    let mut chosen = front.mv;
    let mut cumulative = 0.0;

    for (candidate, weight) in pool.iter().zip(&weights) {
        cumulative += weight / total;

        if draw <= cumulative {
            chosen = candidate.mv;
            break;
        }
    }

    log::debug!(
        "selector pool={} best={} chosen={} seed={}",
        pool.len(),
        best_score,
        chosen,
        params.seed
    );

    finish(position, chosen, fallback)
}

/// The final safety gate: only a verified-legal move leaves the selector.
fn finish(position: &Position, chosen: Move, fallback: Option<Move>) -> Option<Move> {
    if position.is_legal(chosen) {
        Some(chosen)
    } else {
        log::warn!("selector picked illegal move {chosen}; falling back to search best");
        fallback
    }
}

/// Opening moves a coach would wince at: knights headed for the rim and
/// quiet rook-pawn pushes.
fn is_edge_move(position: &Position, mv: Move) -> bool {
    match position.kind_at(mv.from) {
        Piece::Knight => {
            let file = mv.to.file();
            file == 0 || file == 7
        }
        Piece::Pawn => {
            let file = mv.from.file();
            (file == 0 || file == 7) && !position.is_tactical(mv)
        }
        _ => false,
    }
}

/// A stable per-move mixing key for the noise stream.
fn move_key(mv: Move) -> u64 {
    let promo = match mv.promotion() {
        Some(piece) => piece as u64 + 1,
        None => 0,
    };

    (mv.from as u64) | (mv.to as u64) << 6 | promo << 12
}
