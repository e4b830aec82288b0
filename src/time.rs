use std::time::{Duration, Instant};

use crate::constants::SOFT_TO_HARD_LIMIT_RATIO;

/// Wall-clock bookkeeping for one search.
///
/// The hard limit is the caller's whole budget and aborts the search
/// wherever it is; the soft limit fires earlier and only stops new
/// iterative-deepening passes from starting, since a pass begun near the
/// budget's end rarely finishes.
#[derive(Debug, Clone, Copy)]
pub struct TimeManager {
    start: Instant,
    soft_limit: Option<Duration>,
    hard_limit: Option<Duration>,
}

impl TimeManager {
    pub fn unlimited() -> Self {
        Self {
            start: Instant::now(),
            soft_limit: None,
            hard_limit: None,
        }
    }

    pub fn from_budget(budget: Option<Duration>) -> Self {
        match budget {
            Some(budget) => Self {
                start: Instant::now(),
                soft_limit: Some(budget.mul_f64(SOFT_TO_HARD_LIMIT_RATIO)),
                hard_limit: Some(budget),
            },
            None => Self::unlimited(),
        }
    }

    /// Converts UCI clock state into a single move budget: an explicit
    /// movetime wins; otherwise take 1/30 of the remaining time plus the
    /// increment, but never more than a quarter of what is left.
    pub fn allocate(
        movetime: Option<u64>,
        time_left_ms: u64,
        increment_ms: u64,
    ) -> Duration {
        let budget_ms = match movetime {
            Some(ms) => ms,
            None => (time_left_ms / 30 + increment_ms).min(time_left_ms / 4).max(1),
        };

        Duration::from_millis(budget_ms)
    }

    /// Time since search began
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Whether starting another deepening pass is still worthwhile.
    pub fn soft_expired(&self) -> bool {
        self.soft_limit
            .is_some_and(|limit| self.elapsed() >= limit)
    }

    /// Whether the search must unwind now.
    pub fn hard_expired(&self) -> bool {
        self.hard_limit
            .is_some_and(|limit| self.elapsed() >= limit)
    }
}

impl Default for TimeManager {
    fn default() -> Self {
        Self::unlimited()
    }
}
