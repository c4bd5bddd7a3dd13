//! The search engines.
//!
//! Every engine owns its frontier, closed set and [`Report`]; nothing is shared
//! between instances, so independent runs may proceed on separate threads.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{
    Direction, HeuristicKind, NodeId, NodeRef, Outcome, PuzzleState, Report, SearchTree,
    UnknownName,
};

mod best_first;
mod blind;
mod ida;
mod open_list;

pub use best_first::BestFirst;
pub use blind::{BreadthFirst, DepthFirst};
pub use ida::IdaStar;

pub trait Engine {
    /// Searches from `start` to `goal`, calling `on_expand` after each expansion.
    fn run_observed(
        &mut self,
        start: &PuzzleState,
        goal: &PuzzleState,
        on_expand: &mut dyn FnMut(&Report),
    ) -> Option<Solution>;

    /// Metrics of the most recent run.
    fn report(&self) -> &Report;

    fn run(&mut self, start: &PuzzleState, goal: &PuzzleState) -> Option<Solution> {
        self.run_observed(start, goal, &mut |_| {})
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    AStar,
    Dijkstra,
    Greedy,
    BreadthFirst,
    DepthFirst,
    IdaStar,
}

impl Strategy {
    pub const ALL: [Self; 6] = [
        Self::AStar,
        Self::Dijkstra,
        Self::Greedy,
        Self::BreadthFirst,
        Self::DepthFirst,
        Self::IdaStar,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::AStar => "AStar",
            Strategy::Dijkstra => "Dijkstra",
            Strategy::Greedy => "Greedy",
            Strategy::BreadthFirst => "BreadthFirst",
            Strategy::DepthFirst => "DepthFirst",
            Strategy::IdaStar => "IdaStar",
        }
    }

    /// Whether the strategy consults a heuristic at all.
    pub fn is_informed(self) -> bool {
        matches!(self, Self::AStar | Self::Greedy | Self::IdaStar)
    }

    /// A fresh engine. `heuristic` is ignored by uninformed strategies.
    pub fn build(self, heuristic: HeuristicKind, limit: Option<u64>) -> Box<dyn Engine + Send> {
        let budget = Budget(limit);
        match self {
            Strategy::AStar => Box::new(BestFirst::astar(heuristic).with_budget(budget)),
            Strategy::Dijkstra => Box::new(BestFirst::dijkstra().with_budget(budget)),
            Strategy::Greedy => Box::new(BestFirst::greedy(heuristic).with_budget(budget)),
            Strategy::BreadthFirst => Box::new(BreadthFirst::new().with_budget(budget)),
            Strategy::DepthFirst => Box::new(DepthFirst::new().with_budget(budget)),
            Strategy::IdaStar => Box::new(IdaStar::new(heuristic).with_budget(budget)),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownName {
                kind: "solver",
                name: s.to_owned(),
                expected: Self::ALL.map(Self::name).join(", "),
            })
    }
}

/// Optional cap on the number of expansions of one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Budget(pub(crate) Option<u64>);

impl Budget {
    fn allows(self, report: &Report) -> bool {
        self.0.map_or(true, |limit| report.expansions() < limit)
    }
}

/// Why a search stopped without reaching the goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Halt {
    Exhausted,
    OutOfBudget,
}

/// Boards of different sizes never meet. Checked before any estimate is taken.
fn check_sizes(start: &PuzzleState, goal: &PuzzleState) -> Result<(), Halt> {
    if start.n() == goal.n() {
        return Ok(());
    }
    tracing::debug!(start = start.n(), goal = goal.n(), "board sizes differ");
    Err(Halt::Exhausted)
}

/// Records the outcome of a finished search in `report` and logs it.
fn conclude(report: &mut Report, result: Result<Solution, Halt>) -> Option<Solution> {
    let outcome = match &result {
        Ok(solution) => Outcome::Solved {
            moves: solution.len(),
        },
        Err(Halt::Exhausted) => Outcome::Exhausted,
        Err(Halt::OutOfBudget) => Outcome::BudgetExceeded,
    };
    report.finish(outcome);
    tracing::debug!(
        engine = report.label(),
        expansions = report.expansions(),
        max_frontier = report.max_frontier(),
        %outcome,
        "search finished"
    );
    result.ok()
}

/// The tree a search built and the node where it met the goal.
#[derive(Debug, Clone)]
pub struct Solution {
    tree: SearchTree,
    terminal: NodeId,
    len: usize,
}

impl Solution {
    pub(crate) fn new(tree: SearchTree, terminal: NodeId) -> Self {
        let depth = std::iter::successors(tree.get(terminal), NodeRef::parent).count();
        debug_assert!(depth > 0, "terminal node belongs to its tree");
        Self {
            len: depth.saturating_sub(1),
            tree,
            terminal,
        }
    }

    pub fn tree(&self) -> &SearchTree {
        &self.tree
    }

    /// The node holding the goal board.
    pub fn terminal(&self) -> NodeRef<'_> {
        self.tree
            .get(self.terminal)
            .expect("terminal node belongs to its tree")
    }

    /// Boards from the start to the goal, both included.
    pub fn states(&self) -> Vec<&PuzzleState> {
        self.tree
            .genealogy(self.terminal)
            .into_iter()
            .filter_map(|id| self.tree.get(id))
            .map(|node| node.state())
            .collect()
    }

    /// Blank moves leading from the start to the goal.
    pub fn moves(&self) -> Vec<Direction> {
        self.states()
            .windows(2)
            .filter_map(|w| w[0].direction_to(w[1]))
            .collect()
    }

    /// Number of moves.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
