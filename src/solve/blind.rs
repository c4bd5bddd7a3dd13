use arrayvec::ArrayVec;

use super::{check_sizes, conclude, Budget, Engine, Halt, Solution};
use crate::{NodeId, PuzzleState, Report, SearchNode, SearchTree};

/// Breadth-first search.
///
/// The tree is the queue: nodes are appended when discovered and expanded in
/// insertion order, so a board is marked visited the moment it is enqueued and
/// can never be enqueued twice.
#[derive(Debug, Clone)]
pub struct BreadthFirst {
    budget: Budget,
    report: Report,
}

impl Default for BreadthFirst {
    fn default() -> Self {
        Self::new()
    }
}

impl BreadthFirst {
    pub fn new() -> Self {
        Self {
            budget: Budget::default(),
            report: Report::new("BreadthFirst"),
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
        let mut tree = SearchTree::new();
        let (root, _) = tree.insert(SearchNode::new(start.clone()));
        self.report.push();
        if start == goal {
            return Ok(Solution::new(tree, root));
        }

        let mut cursor = 0;
        while cursor < tree.len() {
            let current = NodeId(cursor);
            cursor += 1;
            self.report.pop();

            if !self.budget.allows(&self.report) {
                tracing::trace!(engine = self.report.label(), "expansion budget spent");
                return Err(Halt::OutOfBudget);
            }
            let Some(node) = tree.get(current) else { continue };

            #[cfg(feature = "coz")]
            coz::progress!("Expand");

            self.report.expand();
            on_expand(&self.report);

            let g = node.g() + 1;
            let children = node.successors().collect::<ArrayVec<_, 4>>();
            for child in children {
                let is_goal = child.state == *goal;
                let (id, inserted) = tree.insert(SearchNode {
                    g,
                    parent: Some(current),
                    ..child
                });
                if !inserted {
                    continue;
                }
                self.report.push();
                if is_goal {
                    return Ok(Solution::new(tree, id));
                }
            }
        }

        Err(Halt::Exhausted)
    }
}

impl Engine for BreadthFirst {
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

/// Depth-first search.
///
/// Boards are marked visited when expanded, so the stack may briefly hold several
/// copies of one board; the later ones are dropped when popped. The tree only
/// receives expanded nodes and the goal, and serves as the closed set.
#[derive(Debug, Clone)]
pub struct DepthFirst {
    budget: Budget,
    report: Report,
}

impl Default for DepthFirst {
    fn default() -> Self {
        Self::new()
    }
}

impl DepthFirst {
    pub fn new() -> Self {
        Self {
            budget: Budget::default(),
            report: Report::new("DepthFirst"),
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
        let mut tree = SearchTree::new();
        let mut stack = vec![SearchNode::new(start.clone())];
        self.report.push();

        while let Some(node) = stack.pop() {
            self.report.pop();
            if tree.find(&node.state).is_some() {
                continue;
            }
            if node.state == *goal {
                let (id, _) = tree.insert(node);
                return Ok(Solution::new(tree, id));
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
            let children = node.successors().collect::<ArrayVec<_, 4>>();
            let (current, _) = tree.insert(node);

            // Reversed so the first direction is explored first.
            for child in children.into_iter().rev() {
                if tree.find(&child.state).is_some() {
                    continue;
                }
                stack.push(SearchNode {
                    g,
                    parent: Some(current),
                    ..child
                });
                self.report.push();
            }
        }

        Err(Halt::Exhausted)
    }
}

impl Engine for DepthFirst {
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
