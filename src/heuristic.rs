//! Distance estimates between two boards of the same size.
//!
//! All of them ignore the blank and never overestimate the number of slides left.

use std::fmt;
use std::str::FromStr;

use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

use crate::{PuzzleState, UnknownName, EMPTY_TILE, MAX_N};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeuristicKind {
    Manhattan,
    TilesOutOfPlace,
    TilesOutOfRowCol,
    LinearConflict,
}

impl HeuristicKind {
    pub const ALL: [Self; 4] = [
        Self::Manhattan,
        Self::TilesOutOfPlace,
        Self::TilesOutOfRowCol,
        Self::LinearConflict,
    ];

    pub fn name(self) -> &'static str {
        match self {
            HeuristicKind::Manhattan => "Manhattan",
            HeuristicKind::TilesOutOfPlace => "TilesOutOfPlace",
            HeuristicKind::TilesOutOfRowCol => "TilesOutOfRowCol",
            HeuristicKind::LinearConflict => "LinearConflict",
        }
    }

    /// Both boards must have the same size.
    pub fn estimate(self, state: &PuzzleState, goal: &PuzzleState) -> u32 {
        debug_assert_eq!(state.n(), goal.n());
        match self {
            HeuristicKind::Manhattan => manhattan(state, goal),
            HeuristicKind::TilesOutOfPlace => tiles_out_of_place(state, goal),
            HeuristicKind::TilesOutOfRowCol => tiles_out_of_row_col(state, goal),
            HeuristicKind::LinearConflict => linear_conflict(state, goal),
        }
    }
}

impl fmt::Display for HeuristicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HeuristicKind {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownName {
                kind: "heuristic",
                name: s.to_owned(),
                expected: Self::ALL.map(Self::name).join(", "),
            })
    }
}

/// `(cell, goal cell)` of every non-blank tile.
fn placements<'a>(
    state: &'a PuzzleState,
    goal: &PuzzleState,
) -> impl Iterator<Item = (usize, usize)> + 'a {
    let target = goal.positions();
    state
        .tiles()
        .iter()
        .enumerate()
        .filter(|&(_, &tile)| tile != EMPTY_TILE)
        .map(move |(idx, &tile)| (idx, target[tile as usize] as usize))
}

pub fn manhattan(state: &PuzzleState, goal: &PuzzleState) -> u32 {
    placements(state, goal)
        .map(|(idx, dst)| state.distance(idx, dst))
        .sum()
}

pub fn tiles_out_of_place(state: &PuzzleState, goal: &PuzzleState) -> u32 {
    placements(state, goal)
        .filter(|&(idx, dst)| idx != dst)
        .count() as u32
}

pub fn tiles_out_of_row_col(state: &PuzzleState, goal: &PuzzleState) -> u32 {
    placements(state, goal)
        .map(|(idx, dst)| {
            let (row, col) = state.coords(idx);
            let (goal_row, goal_col) = state.coords(dst);
            u32::from(row != goal_row) + u32::from(col != goal_col)
        })
        .sum()
}

/// Manhattan distance plus two slides for every tile that has to step out of its
/// goal row (or column) so the tiles left in that line can pass each other.
///
/// Per line, the tiles that may stay form the longest run already in goal order;
/// every other tile of the line is in conflict with at least one of them.
pub fn linear_conflict(state: &PuzzleState, goal: &PuzzleState) -> u32 {
    let n = state.n();
    let target = goal.positions();
    let mut extra = 0;
    let mut line = ArrayVec::<usize, MAX_N>::new();

    for transpose in [false, true] {
        for i in 0..n {
            line.clear();
            for j in 0..n {
                let (row, col) = if transpose { (j, i) } else { (i, j) };
                let tile = state[(row, col)];
                if tile == EMPTY_TILE {
                    continue;
                }
                let (goal_row, goal_col) = state.coords(target[tile as usize] as usize);
                match transpose {
                    false if goal_row == row => line.push(goal_col),
                    true if goal_col == col => line.push(goal_row),
                    _ => {}
                }
            }
            extra += line_conflicts(&line);
        }
    }

    manhattan(state, goal) + 2 * extra
}

/// Number of tiles to remove from `goals` so the rest is strictly increasing.
fn line_conflicts(goals: &[usize]) -> u32 {
    let mut longest = ArrayVec::<usize, MAX_N>::new();
    for (i, &goal) in goals.iter().enumerate() {
        let best = (0..i)
            .filter(|&j| goals[j] < goal)
            .map(|j| longest[j])
            .max()
            .unwrap_or(0);
        longest.push(best + 1);
    }
    let kept = longest.iter().copied().max().unwrap_or(0);
    (goals.len() - kept) as u32
}
