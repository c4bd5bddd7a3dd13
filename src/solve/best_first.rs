use arrayvec::ArrayVec;
use fxhash::FxHashSet;

use super::open_list::{OpenList, Priority};
use super::{check_sizes, conclude, Budget, Engine, Halt, Solution};
use crate::{HeuristicKind, NodeId, PuzzleState, Report, SearchNode, SearchTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Policy {
    /// Order by `g + h`, re-parent queued nodes reached more cheaply.
    AStar(HeuristicKind),
    /// Order by `g` alone.
    Dijkstra,
    /// Order by `h` alone, every board queued at most once.
    Greedy(HeuristicKind),
}

/// Priority-queue graph search: A*, Dijkstra and greedy best-first.
#[derive(Debug, Clone)]
pub struct BestFirst {
    policy: Policy,
    budget: Budget,
    report: Report,
}

impl BestFirst {
    pub fn astar(heuristic: HeuristicKind) -> Self {
        Self::with_policy(Policy::AStar(heuristic), format!("AStar({heuristic})"))
    }

    pub fn dijkstra() -> Self {
        Self::with_policy(Policy::Dijkstra, "Dijkstra".into())
    }

    pub fn greedy(heuristic: HeuristicKind) -> Self {
        Self::with_policy(Policy::Greedy(heuristic), format!("Greedy({heuristic})"))
    }

    fn with_policy(policy: Policy, label: String) -> Self {
        Self {
            policy,
            budget: Budget::default(),
            report: Report::new(label),
        }
    }

    pub fn with_expansion_limit(self, limit: u64) -> Self {
        self.with_budget(Budget(Some(limit)))
    }

    pub(crate) fn with_budget(mut self, budget: Budget) -> Self {
        self.budget = budget;
        self
    }

    fn estimate(&self, state: &PuzzleState, goal: &PuzzleState) -> u32 {
        match self.policy {
            Policy::AStar(heuristic) | Policy::Greedy(heuristic) => {
                heuristic.estimate(state, goal)
            }
            Policy::Dijkstra => 0,
        }
    }

    fn key(&self, g: u32, h: u32) -> u32 {
        match self.policy {
            Policy::AStar(_) => g + h,
            Policy::Dijkstra => g,
            Policy::Greedy(_) => h,
        }
    }

    fn search(
        &mut self,
        start: &PuzzleState,
        goal: &PuzzleState,
        on_expand: &mut dyn FnMut(&Report),
    ) -> Result<Solution, Halt> {
        check_sizes(start, goal)?;

        // Every node in `tree` is either queued in `open` or listed in `closed`.
        let mut tree = SearchTree::new();
        let mut open = OpenList::default();
        let mut closed = FxHashSet::<NodeId>::default();
        let mut seq = 0u64;
        let mut next_priority = |key| {
            seq += 1;
            Priority { key, seq }
        };

        let h = self.estimate(start, goal);
        let (root, _) = tree.insert(SearchNode {
            h,
            ..SearchNode::new(start.clone())
        });
        open.push(root, next_priority(self.key(0, h)));
        self.report.push();

        while let Some(current) = open.pop() {
            self.report.pop();
            debug_assert_eq!(open.len(), self.report.frontier());

            let Some(node) = tree.get(current) else { continue };
            if node.state() == goal {
                return Ok(Solution::new(tree, current));
            }
            if !self.budget.allows(&self.report) {
                tracing::trace!(engine = self.report.label(), "expansion budget spent");
                return Err(Halt::OutOfBudget);
            }

            #[cfg(feature = "coz")]
            coz::progress!("Expand");

            self.report.expand();
            on_expand(&self.report);
            closed.insert(current);

            let g = node.g() + 1;
            let children = node.successors().collect::<ArrayVec<_, 4>>();
            for child in children {
                match tree.find(&child.state) {
                    Some(id) if closed.contains(&id) => {}
                    Some(_) if matches!(self.policy, Policy::Greedy(_)) => {}
                    Some(id) => {
                        let Some(queued) = tree.get(id) else { continue };
                        if g < queued.g() {
                            let key = self.key(g, queued.h());
                            tree.relink(id, g, current);
                            open.reprioritize(id, next_priority(key));
                        }
                    }
                    None => {
                        let h = self.estimate(&child.state, goal);
                        let key = self.key(g, h);
                        let (id, _) = tree.insert(SearchNode {
                            g,
                            h,
                            parent: Some(current),
                            ..child
                        });
                        open.push(id, next_priority(key));
                        self.report.push();
                    }
                }
            }
        }

        Err(Halt::Exhausted)
    }
}

impl Engine for BestFirst {
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
