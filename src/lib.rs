use std::ops::Index;
use std::str::FromStr;

use arrayvec::ArrayVec;
use rand::seq::SliceRandom;
use rand::Rng;

mod fmt;
pub mod heuristic;
pub mod node;
mod parse;
pub mod report;
pub mod solve;

pub use heuristic::HeuristicKind;
pub use node::{NodeId, NodeRef, SearchNode, SearchTree};
pub use report::{Outcome, Report};
pub use solve::{Engine, Solution, Strategy};

/// Tile value of the blank cell.
pub const EMPTY_TILE: u8 = 0;
pub const MIN_N: usize = 2;
pub const MAX_N: usize = 10;
/// Upper bound on `n * n` for any supported board.
pub const MAX_CELLS: usize = MAX_N * MAX_N;

/// Why a board could not be constructed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PuzzleError {
    #[error("grid size {n} is outside the supported range {MIN_N}..={MAX_N}")]
    Range { n: usize },
    #[error(transparent)]
    Format(#[from] FormatError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("expected {expected} tiles, found {found}")]
    TileCount { expected: usize, found: usize },
    #[error("tile {0} appears more than once")]
    Duplicate(usize),
    #[error("tile {tile} is outside the range 0..={max}")]
    OutOfRange { tile: usize, max: usize },
}

/// A name token that matches no known solver, heuristic or goal layout.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} {name:?}, expected one of: {expected}")]
pub struct UnknownName {
    pub kind: &'static str,
    pub name: String,
    pub expected: String,
}

/// Direction the blank travels. The tile sitting there slides the opposite way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up = 0,
    Right,
    Down,
    Left,
}

impl Direction {
    pub const ALL: [Self; 4] = [Self::Up, Self::Right, Self::Down, Self::Left];

    pub fn reversed(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
        }
    }

    fn clockwise(self) -> Self {
        match self {
            Direction::Up => Direction::Right,
            Direction::Right => Direction::Down,
            Direction::Down => Direction::Left,
            Direction::Left => Direction::Up,
        }
    }
}

/// Cell next to `idx` on an `n * n` grid, if it exists.
fn neighbor(n: usize, idx: usize, dir: Direction) -> Option<usize> {
    const DIRECTIONS: [(isize, isize); 4] = [(-1, 0), (0, 1), (1, 0), (0, -1)];
    let (dx, dy) = DIRECTIONS[dir as usize];
    let x = (idx / n).checked_add_signed(dx)?;
    let y = (idx % n).checked_add_signed(dy)?;
    if n <= x || n <= y {
        return None;
    }
    Some(x * n + y)
}

fn check_size(n: usize) -> Result<(), PuzzleError> {
    if (MIN_N..=MAX_N).contains(&n) {
        Ok(())
    } else {
        Err(PuzzleError::Range { n })
    }
}

/// A square board holding each of `0..n*n` exactly once, `0` being the blank.
///
/// Equality and hashing cover every cell including the blank, which is what
/// goal detection and duplicate detection rely on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PuzzleState {
    n: u8,
    blank: u8,
    tiles: Box<[u8]>,
}

impl Index<(usize, usize)> for PuzzleState {
    type Output = u8;
    fn index(&self, (row, col): (usize, usize)) -> &Self::Output {
        &self.tiles[row * self.n() + col]
    }
}

impl PuzzleState {
    pub fn new(n: usize, tiles: &[usize]) -> Result<Self, PuzzleError> {
        check_size(n)?;
        let cells = n * n;
        if tiles.len() != cells {
            return Err(FormatError::TileCount {
                expected: cells,
                found: tiles.len(),
            }
            .into());
        }

        let mut seen = [false; MAX_CELLS];
        for &tile in tiles {
            if tile >= cells {
                return Err(FormatError::OutOfRange {
                    tile,
                    max: cells - 1,
                }
                .into());
            }
            if std::mem::replace(&mut seen[tile], true) {
                return Err(FormatError::Duplicate(tile).into());
            }
        }

        let tiles = tiles.iter().map(|&tile| tile as u8).collect();
        Ok(Self::from_permutation(n, tiles))
    }

    /// Callers guarantee `tiles` is a permutation of `0..n*n`.
    fn from_permutation(n: usize, tiles: Box<[u8]>) -> Self {
        let blank = tiles
            .iter()
            .position(|&tile| tile == EMPTY_TILE)
            .unwrap_or_default();
        Self {
            n: n as u8,
            blank: blank as u8,
            tiles,
        }
    }

    /// `1, 2, .., n*n - 1` in reading order with the blank in the bottom-right corner.
    pub fn ordered(n: usize) -> Result<Self, PuzzleError> {
        check_size(n)?;
        let cells = n * n;
        let tiles = (1..cells).chain([0]).map(|tile| tile as u8).collect();
        Ok(Self::from_permutation(n, tiles))
    }

    /// Tiles laid out clockwise from the top-left corner, spiralling inwards.
    /// The blank takes the last cell of the spiral.
    pub fn snail(n: usize) -> Result<Self, PuzzleError> {
        check_size(n)?;
        let cells = n * n;
        let mut tiles = vec![EMPTY_TILE; cells].into_boxed_slice();
        let mut pos = 0;
        let mut dir = Direction::Right;
        for value in 1..cells {
            tiles[pos] = value as u8;
            let ahead = neighbor(n, pos, dir).filter(|&next| tiles[next] == EMPTY_TILE);
            pos = match ahead {
                Some(next) => next,
                None => {
                    dir = dir.clockwise();
                    let Some(next) = neighbor(n, pos, dir) else { break };
                    next
                }
            };
        }
        Ok(Self::from_permutation(n, tiles))
    }

    /// Uniformly shuffled board with the requested solvability relative to `goal`.
    ///
    /// When the shuffle lands on the wrong side, the first two non-blank tiles are
    /// swapped. That single transposition flips the permutation parity and so the
    /// solvability, without reshuffling.
    pub fn random(goal: &PuzzleState, solvable: bool, rng: &mut impl Rng) -> Self {
        let n = goal.n();
        let mut tiles = (0..n * n).map(|tile| tile as u8).collect::<Box<[u8]>>();
        tiles.shuffle(rng);
        let mut state = Self::from_permutation(n, tiles);

        if state.is_solvable(goal) != solvable {
            let blank = state.blank();
            let mut movable = (0..n * n).filter(|&idx| idx != blank);
            if let (Some(a), Some(b)) = (movable.next(), movable.next()) {
                state.tiles.swap(a, b);
            }
        }
        state
    }

    pub fn n(&self) -> usize {
        self.n as usize
    }

    pub fn tiles(&self) -> &[u8] {
        &self.tiles
    }

    /// Index of the blank cell.
    pub fn blank(&self) -> usize {
        self.blank as usize
    }

    /// `(row, col)` of a cell index.
    pub fn coords(&self, idx: usize) -> (usize, usize) {
        (idx / self.n(), idx % self.n())
    }

    /// Manhattan distance between two cell indices.
    pub fn distance(&self, a: usize, b: usize) -> u32 {
        let (ax, ay) = self.coords(a);
        let (bx, by) = self.coords(b);
        (ax.abs_diff(bx) + ay.abs_diff(by)) as u32
    }

    /// Cell index of every tile, indexed by tile value.
    pub fn positions(&self) -> ArrayVec<u8, MAX_CELLS> {
        let mut positions = ArrayVec::new();
        positions.extend(std::iter::repeat(0).take(self.tiles.len()));
        for (idx, &tile) in self.tiles.iter().enumerate() {
            positions[tile as usize] = idx as u8;
        }
        positions
    }

    /// Whether `goal` is reachable from this board.
    ///
    /// Every slide is a transposition of the blank with a neighbour, so it flips both
    /// the parity of the cell permutation mapping this board onto `goal` and the
    /// parity of the blank's distance to its goal cell. The board is solvable iff the
    /// two parities agree.
    pub fn is_solvable(&self, goal: &PuzzleState) -> bool {
        if self.n != goal.n {
            return false;
        }
        let target = goal.positions();
        let seq = self
            .tiles
            .iter()
            .map(|&tile| target[tile as usize])
            .collect::<ArrayVec<u8, MAX_CELLS>>();
        let inversions = seq
            .iter()
            .enumerate()
            .map(|(i, &a)| seq[i + 1..].iter().filter(|&&b| b < a).count())
            .sum::<usize>();
        let blank_distance = self.distance(self.blank(), goal.blank()) as usize;
        inversions % 2 == blank_distance % 2
    }

    /// Slides the neighbouring tile into the blank. Returns `false` and leaves the
    /// board untouched when the blank would leave the grid.
    pub fn make_move(&mut self, dir: Direction) -> bool {
        let Some(dst) = neighbor(self.n(), self.blank(), dir) else {
            return false;
        };
        self.tiles.swap(self.blank(), dst);
        self.blank = dst as u8;
        true
    }

    pub fn with_move(&self, dir: Direction) -> Option<Self> {
        let mut next = self.clone();
        next.make_move(dir).then_some(next)
    }

    pub fn legal_moves(&self) -> ArrayVec<Direction, 4> {
        Direction::ALL
            .into_iter()
            .filter(|&dir| neighbor(self.n(), self.blank(), dir).is_some())
            .collect()
    }

    /// Boards one slide away, each an independent copy.
    pub fn successors(&self) -> impl Iterator<Item = PuzzleState> + '_ {
        self.legal_moves()
            .into_iter()
            .filter_map(move |dir| self.with_move(dir))
    }

    /// The blank move turning `self` into `next`, if they are one slide apart.
    pub fn direction_to(&self, next: &PuzzleState) -> Option<Direction> {
        self.legal_moves()
            .into_iter()
            .find(|&dir| self.with_move(dir).as_ref() == Some(next))
    }
}

/// Layout of the target board.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Goal {
    Ordered,
    #[default]
    Snail,
}

impl Goal {
    pub const ALL: [Self; 2] = [Self::Ordered, Self::Snail];

    pub fn name(self) -> &'static str {
        match self {
            Goal::Ordered => "ordered",
            Goal::Snail => "snail",
        }
    }

    pub fn build(self, n: usize) -> Result<PuzzleState, PuzzleError> {
        match self {
            Goal::Ordered => PuzzleState::ordered(n),
            Goal::Snail => PuzzleState::snail(n),
        }
    }
}

impl FromStr for Goal {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|goal| goal.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownName {
                kind: "goal",
                name: s.to_owned(),
                expected: Self::ALL.map(Self::name).join(", "),
            })
    }
}
