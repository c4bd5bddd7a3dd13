//! Counters describing one engine run.

use std::fmt;
use std::time::{Duration, Instant};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    #[default]
    Pending,
    Solved {
        moves: usize,
    },
    /// Every reachable board was explored without meeting the goal.
    Exhausted,
    /// The expansion budget ran out first. Says nothing about solvability.
    BudgetExceeded,
}

/// Metrics of the last run of an engine.
///
/// Engines update it at fixed call sites: every frontier insertion and removal,
/// and every expansion. Nothing in a search reads it back except the budget
/// check, so leaving it out would not change the returned node.
#[derive(Debug, Clone)]
pub struct Report {
    label: String,
    expansions: u64,
    frontier: usize,
    max_frontier: usize,
    started: Option<Instant>,
    finished: Option<Instant>,
    outcome: Outcome,
}

impl Report {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            expansions: 0,
            frontier: 0,
            max_frontier: 0,
            started: None,
            finished: None,
            outcome: Outcome::Pending,
        }
    }

    pub(crate) fn start(&mut self) {
        *self = Self {
            started: Some(Instant::now()),
            ..Self::new(std::mem::take(&mut self.label))
        };
    }

    pub(crate) fn push(&mut self) {
        self.frontier += 1;
        self.max_frontier = self.max_frontier.max(self.frontier);
    }

    pub(crate) fn pop(&mut self) {
        debug_assert!(self.frontier > 0, "frontier removal without insertion");
        self.frontier -= 1;
    }

    pub(crate) fn expand(&mut self) {
        self.expansions += 1;
    }

    pub(crate) fn finish(&mut self, outcome: Outcome) {
        self.finished = Some(Instant::now());
        self.outcome = outcome;
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Nodes dequeued and expanded.
    pub fn expansions(&self) -> u64 {
        self.expansions
    }

    pub fn frontier(&self) -> usize {
        self.frontier
    }

    /// High-water mark of the frontier.
    pub fn max_frontier(&self) -> usize {
        self.max_frontier
    }

    pub fn started(&self) -> Option<Instant> {
        self.started
    }

    pub fn finished(&self) -> Option<Instant> {
        self.finished
    }

    pub fn elapsed(&self) -> Option<Duration> {
        Some(self.finished?.duration_since(self.started?))
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Moves in the solution, `None` when the run found none.
    pub fn result_size(&self) -> Option<usize> {
        match self.outcome {
            Outcome::Solved { moves } => Some(moves),
            Outcome::Pending | Outcome::Exhausted | Outcome::BudgetExceeded => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Pending => f.write_str("pending"),
            Outcome::Solved { moves } => write!(f, "solved in {moves} moves"),
            Outcome::Exhausted => f.write_str("no solution"),
            Outcome::BudgetExceeded => f.write_str("no solution within budget"),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.label)?;
        writeln!(f, "  result:           {}", self.outcome)?;
        writeln!(f, "  time complexity:  {}", self.expansions)?;
        writeln!(f, "  size complexity:  {}", self.max_frontier)?;
        match self.elapsed() {
            Some(elapsed) => writeln!(f, "  time taken:       {elapsed:.3?}"),
            None => writeln!(f, "  time taken:       -"),
        }
    }
}
