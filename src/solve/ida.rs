use arrayvec::ArrayVec;
use fxhash::FxHashSet;

use super::{check_sizes, conclude, Budget, Engine, Halt, Solution};
use crate::{HeuristicKind, NodeId, PuzzleState, Report, SearchNode, SearchTree};

/// Result of one bounded depth-first probe.
enum Probe {
    Found,
    /// Smallest `f` that went over the threshold.
    Exceeded(u32),
    /// Nothing went over the threshold and the goal was not met.
    Exhausted,
}

/// Iterative-deepening A*.
///
/// Each iteration is a depth-first search cut off at an `f` threshold. The
/// threshold starts at `h(start)` and rises to the smallest `f` that overflowed
/// the previous iteration. Only the current path is kept, both as a stack and as
/// a set so a path never revisits one of its own boards.
#[derive(Debug, Clone)]
pub struct IdaStar {
    heuristic: HeuristicKind,
    budget: Budget,
    report: Report,
}

impl IdaStar {
    pub fn new(heuristic: HeuristicKind) -> Self {
        Self {
            heuristic,
            budget: Budget::default(),
            report: Report::new(format!("IdaStar({heuristic})")),
        }
    }

    pub fn with_expansion_limit(self, limit: u64) -> Self {
        self.with_budget(Budget(Some(limit)))
    }

    pub(crate) fn with_budget(mut self, budget: Budget) -> Self {
        self.budget = budget;
        self
    }

    fn search(
        &mut self,
        start: &PuzzleState,
        goal: &PuzzleState,
        on_expand: &mut dyn FnMut(&Report),
    ) -> Result<Solution, Halt> {
        check_sizes(start, goal)?;
        let h = self.heuristic.estimate(start, goal);
        let mut path = vec![SearchNode {
            h,
            ..SearchNode::new(start.clone())
        }];
        let mut on_path = FxHashSet::default();
        on_path.insert(start.clone());
        self.report.push();

        let mut threshold = h;
        loop {
            tracing::debug!(engine = self.report.label(), threshold, "deepening");
            match self.probe(&mut path, &mut on_path, goal, threshold, on_expand)? {
                Probe::Found => break,
                Probe::Exceeded(next) => threshold = next,
                Probe::Exhausted => return Err(Halt::Exhausted),
            }
        }

        match SearchTree::from_path(path) {
            (tree, Some(terminal)) => Ok(Solution::new(tree, terminal)),
            (_, None) => Err(Halt::Exhausted),
        }
    }

    fn probe(
        &mut self,
        path: &mut Vec<SearchNode>,
        on_path: &mut FxHashSet<PuzzleState>,
        goal: &PuzzleState,
        threshold: u32,
        on_expand: &mut dyn FnMut(&Report),
    ) -> Result<Probe, Halt> {
        let Some(node) = path.last() else {
            return Ok(Probe::Exhausted);
        };
        let f = node.f();
        if f > threshold {
            return Ok(Probe::Exceeded(f));
        }
        if node.state == *goal {
            return Ok(Probe::Found);
        }
        if !self.budget.allows(&self.report) {
            tracing::trace!(engine = self.report.label(), "expansion budget spent");
            return Err(Halt::OutOfBudget);
        }

        #[cfg(feature = "coz")]
        coz::progress!("Expand");

        self.report.expand();
        on_expand(&self.report);

        let g = node.g + 1;
        let parent = NodeId(path.len() - 1);
        let children = node.successors().collect::<ArrayVec<_, 4>>();

        let mut next = None::<u32>;
        for child in children {
            if on_path.contains(&child.state) {
                continue;
            }
            let h = self.heuristic.estimate(&child.state, goal);
            on_path.insert(child.state.clone());
            path.push(SearchNode {
                g,
                h,
                parent: Some(parent),
                ..child
            });
            self.report.push();

            match self.probe(path, on_path, goal, threshold, on_expand)? {
                Probe::Found => return Ok(Probe::Found),
                Probe::Exceeded(f) => next = Some(next.map_or(f, |min| min.min(f))),
                Probe::Exhausted => {}
            }

            if let Some(done) = path.pop() {
                on_path.remove(&done.state);
            }
            self.report.pop();
        }

        Ok(next.map_or(Probe::Exhausted, Probe::Exceeded))
    }
}

impl Engine for IdaStar {
    fn run_observed(
        &mut self,
        start: &PuzzleState,
        goal: &PuzzleState,
        on_expand: &mut dyn FnMut(&Report),
    ) -> Option<Solution> {
        self.report.start();
        tracing::debug!(engine = self.report.label(), "search started");
        let result = self.search(start, goal, on_expand);
        conclude(&mut self.report, result)
    }

    fn report(&self) -> &Report {
        &self.report
    }
}
