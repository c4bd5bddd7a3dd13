use std::collections::VecDeque;
use std::sync::OnceLock;

use fxhash::FxHashMap;
use npuzzle_solver::heuristic::{linear_conflict, manhattan};
use npuzzle_solver::solve::{BestFirst, BreadthFirst};
use npuzzle_solver::{
    Direction, Engine, FormatError, Goal, HeuristicKind, Outcome, PuzzleError, PuzzleState,
    Solution, Strategy, MAX_N, MIN_N,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

type Distances = FxHashMap<PuzzleState, u32>;

fn board(n: usize, tiles: &[usize]) -> PuzzleState {
    PuzzleState::new(n, tiles).unwrap()
}

/// Shortest distance to `goal` of every board that can reach it.
fn distances(goal: &PuzzleState) -> Distances {
    let mut dist = Distances::default();
    dist.insert(goal.clone(), 0);
    let mut queue = VecDeque::from([goal.clone()]);
    while let Some(state) = queue.pop_front() {
        let d = dist[&state];
        for next in state.successors() {
            if !dist.contains_key(&next) {
                dist.insert(next.clone(), d + 1);
                queue.push_back(next);
            }
        }
    }
    dist
}

fn ordered_3x3() -> &'static (PuzzleState, Distances) {
    static CELL: OnceLock<(PuzzleState, Distances)> = OnceLock::new();
    CELL.get_or_init(|| {
        let goal = PuzzleState::ordered(3).unwrap();
        let dist = distances(&goal);
        (goal, dist)
    })
}

fn snail_3x3() -> &'static (PuzzleState, Distances) {
    static CELL: OnceLock<(PuzzleState, Distances)> = OnceLock::new();
    CELL.get_or_init(|| {
        let goal = PuzzleState::snail(3).unwrap();
        let dist = distances(&goal);
        (goal, dist)
    })
}

/// Every permutation of `0..k`, decoded from its factorial-base rank.
fn permutations(k: usize) -> impl Iterator<Item = Vec<usize>> {
    let total = (1..=k).product::<usize>();
    (0..total).map(move |mut code| {
        let mut pool = (0..k).collect::<Vec<_>>();
        let mut perm = Vec::with_capacity(k);
        for radix in (1..=k).rev() {
            let fact = (1..radix).product::<usize>();
            perm.push(pool.remove(code / fact));
            code %= fact;
        }
        perm
    })
}

#[test]
fn construction_rejects_bad_input() {
    assert_eq!(
        PuzzleState::new(1, &[0]),
        Err(PuzzleError::Range { n: 1 })
    );
    assert_eq!(
        PuzzleState::new(MAX_N + 1, &[]),
        Err(PuzzleError::Range { n: MAX_N + 1 })
    );
    assert_eq!(
        PuzzleState::new(2, &[0, 1, 2]),
        Err(FormatError::TileCount {
            expected: 4,
            found: 3
        }
        .into())
    );
    assert_eq!(
        PuzzleState::new(2, &[0, 1, 1, 2]),
        Err(FormatError::Duplicate(1).into())
    );
    assert_eq!(
        PuzzleState::new(2, &[0, 1, 2, 4]),
        Err(FormatError::OutOfRange { tile: 4, max: 3 }.into())
    );

    let state = board(2, &[3, 1, 0, 2]);
    assert_eq!(state.n(), 2);
    assert_eq!(state.tiles(), [3, 1, 0, 2]);
    assert_eq!(state.blank(), 2);
    assert_eq!(state[(1, 1)], 2);
}

#[test]
fn goal_layouts() {
    assert_eq!(
        PuzzleState::ordered(3).unwrap().tiles(),
        [1, 2, 3, 4, 5, 6, 7, 8, 0]
    );
    assert_eq!(PuzzleState::snail(2).unwrap().tiles(), [1, 2, 0, 3]);
    assert_eq!(
        PuzzleState::snail(3).unwrap().tiles(),
        [1, 2, 3, 8, 0, 4, 7, 6, 5]
    );
    assert_eq!(
        PuzzleState::snail(4).unwrap().tiles(),
        [1, 2, 3, 4, 12, 13, 14, 5, 11, 0, 15, 6, 10, 9, 8, 7]
    );
    for n in MIN_N..=MAX_N {
        for goal in Goal::ALL {
            let state = goal.build(n).unwrap();
            assert_eq!(state.tiles().len(), n * n);
        }
    }
    assert_eq!("Ordered".parse(), Ok(Goal::Ordered));
    assert!("spiral".parse::<Goal>().is_err());
}

#[test]
fn solvability_matches_reachability_on_every_3x3_board() {
    for (goal, dist) in [ordered_3x3(), snail_3x3()] {
        assert_eq!(dist.len(), 181_440);
        let mut solvable = 0;
        for tiles in permutations(9) {
            let state = board(3, &tiles);
            assert_eq!(
                state.is_solvable(goal),
                dist.contains_key(&state),
                "{state}"
            );
            solvable += usize::from(state.is_solvable(goal));
        }
        assert_eq!(solvable, 181_440);
    }
}

#[test]
fn solvability_matches_reachability_on_every_2x2_board() {
    let goal = PuzzleState::ordered(2).unwrap();
    let dist = distances(&goal);
    assert_eq!(dist.len(), 12);
    for tiles in permutations(4) {
        let state = board(2, &tiles);
        assert_eq!(state.is_solvable(&goal), dist.contains_key(&state));
    }
    assert!(!goal.is_solvable(&PuzzleState::ordered(3).unwrap()));
}

#[test]
fn heuristics_never_overestimate() {
    for (goal, dist) in [ordered_3x3(), snail_3x3()] {
        for (state, &d) in dist {
            let manhattan = HeuristicKind::Manhattan.estimate(state, goal);
            for kind in HeuristicKind::ALL {
                let h = kind.estimate(state, goal);
                assert!(h <= d, "{kind} gives {h} > {d} for\n{state}");
            }
            assert!(HeuristicKind::TilesOutOfPlace.estimate(state, goal) <= manhattan);
            assert!(HeuristicKind::TilesOutOfRowCol.estimate(state, goal) <= manhattan);
            assert!(HeuristicKind::LinearConflict.estimate(state, goal) >= manhattan);
        }
        for kind in HeuristicKind::ALL {
            assert_eq!(kind.estimate(goal, goal), 0);
        }
    }
}

#[test]
fn heuristic_values() {
    let goal = PuzzleState::ordered(3).unwrap();

    let state = board(3, &[1, 2, 5, 3, 0, 6, 7, 4, 8]);
    assert_eq!(manhattan(&state, &goal), 8);
    assert_eq!(HeuristicKind::TilesOutOfPlace.estimate(&state, &goal), 4);
    assert_eq!(HeuristicKind::TilesOutOfRowCol.estimate(&state, &goal), 7);

    // One swapped pair in the top row.
    let state = board(3, &[2, 1, 3, 4, 5, 6, 7, 8, 0]);
    assert_eq!(manhattan(&state, &goal), 2);
    assert_eq!(linear_conflict(&state, &goal), 4);

    // A fully reversed row only needs two of its three tiles to step aside.
    let state = board(3, &[3, 2, 1, 4, 5, 6, 7, 8, 0]);
    assert_eq!(manhattan(&state, &goal), 4);
    assert_eq!(linear_conflict(&state, &goal), 8);

    assert_eq!("linearconflict".parse(), Ok(HeuristicKind::LinearConflict));
    assert!("Euclid".parse::<HeuristicKind>().is_err());
}

#[test]
fn moves_are_undone_by_their_reverse() {
    let (_, dist) = ordered_3x3();
    for state in dist.keys().take(2000) {
        for dir in Direction::ALL {
            let mut moved = state.clone();
            if moved.make_move(dir) {
                assert_ne!(&moved, state);
                assert!(moved.make_move(dir.reversed()));
                assert_eq!(&moved, state);
            } else {
                assert_eq!(&moved, state);
            }
        }
    }
}

#[test]
fn blocked_moves_leave_the_board_untouched() {
    let mut state = PuzzleState::ordered(3).unwrap();
    let before = state.clone();
    assert!(!state.make_move(Direction::Down));
    assert!(!state.make_move(Direction::Right));
    assert_eq!(state, before);
    assert_eq!(state.with_move(Direction::Down), None);
}

#[test]
fn successor_count_follows_blank_position() {
    for n in [2, 3, 4, 5] {
        for blank in 0..n * n {
            let mut tiles = (1..n * n).collect::<Vec<_>>();
            tiles.insert(blank, 0);
            let state = board(n, &tiles);

            let (row, col) = state.coords(blank);
            let borders = usize::from(row == 0)
                + usize::from(row == n - 1)
                + usize::from(col == 0)
                + usize::from(col == n - 1);
            let successors = state.successors().collect::<Vec<_>>();
            assert_eq!(successors.len(), 4 - borders);
            assert_eq!(state.legal_moves().len(), successors.len());
            assert!(!successors.contains(&state));
            for next in &successors {
                assert!(state.direction_to(next).is_some());
            }
        }
    }
}

#[test]
fn text_round_trip() {
    let mut rng = StdRng::seed_from_u64(7);
    for n in MIN_N..=MAX_N {
        let goal = PuzzleState::snail(n).unwrap();
        for solvable in [true, false] {
            let state = PuzzleState::random(&goal, solvable, &mut rng);
            let text = state.to_text();
            assert_eq!(text.parse::<PuzzleState>().unwrap(), state, "{text}");
        }
    }

    let text = "# a comment\n\n3 # size\n1 2 3\n4 5 6 # tiles\n7 8 0\n";
    assert_eq!(
        text.parse::<PuzzleState>().unwrap(),
        PuzzleState::ordered(3).unwrap()
    );
    assert_eq!(
        PuzzleState::ordered(3).unwrap().to_text(),
        "3\n1 2 3\n4 5 6\n7 8 0\n"
    );

    assert!("".parse::<PuzzleState>().is_err());
    assert!("3\n1 2 3\n4 5 6\n7 8".parse::<PuzzleState>().is_err());
    assert!("3\n1 2 3\n4 5 6\n7 8 0 9".parse::<PuzzleState>().is_err());
    assert!("2\n1 2\n3 x".parse::<PuzzleState>().is_err());
    assert!("2\n1 2\n3 3".parse::<PuzzleState>().is_err());
    let err = "11\n".parse::<PuzzleState>().unwrap_err();
    assert_eq!(
        err.downcast_ref::<PuzzleError>(),
        Some(&PuzzleError::Range { n: 11 })
    );
}

#[test]
fn random_boards_have_the_requested_solvability() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..50 {
        let n = rng.gen_range(MIN_N..=6);
        for goal in [PuzzleState::ordered(n), PuzzleState::snail(n)] {
            let goal = goal.unwrap();
            for solvable in [true, false] {
                let state = PuzzleState::random(&goal, solvable, &mut rng);
                assert_eq!(state.is_solvable(&goal), solvable);

                let tiles = state.tiles().iter().map(|&t| t as usize).collect::<Vec<_>>();
                assert_eq!(PuzzleState::new(n, &tiles).as_ref(), Ok(&state));
            }
        }
    }
}

#[test]
fn optimal_engines_match_exhaustive_distances() {
    let (goal, dist) = ordered_3x3();
    let mut rng = StdRng::seed_from_u64(2024);
    let engines = [
        (Strategy::AStar, HeuristicKind::Manhattan),
        (Strategy::AStar, HeuristicKind::LinearConflict),
        (Strategy::AStar, HeuristicKind::TilesOutOfRowCol),
        (Strategy::Dijkstra, HeuristicKind::Manhattan),
        (Strategy::BreadthFirst, HeuristicKind::Manhattan),
        (Strategy::IdaStar, HeuristicKind::Manhattan),
        (Strategy::IdaStar, HeuristicKind::LinearConflict),
    ];

    for _ in 0..6 {
        let start = PuzzleState::random(goal, true, &mut rng);
        let expected = dist[&start] as usize;
        for (strategy, heuristic) in engines {
            let mut engine = strategy.build(heuristic, None);
            let solution = engine.run(&start, goal).unwrap();
            assert_eq!(solution.len(), expected, "{}", engine.report().label());

            let states = solution.states();
            assert_eq!(states.first(), Some(&&start));
            assert_eq!(states.last(), Some(&goal));
            assert_eq!(solution.moves().len(), expected);
            assert_eq!(solution.terminal().state(), goal);
        }
    }
}

#[test]
fn sample_board_bfs_and_astar_agree() {
    let goal = PuzzleState::ordered(3).unwrap();
    let start = board(3, &[1, 2, 5, 3, 0, 6, 7, 4, 8]);
    assert!(start.is_solvable(&goal));

    let astar = BestFirst::astar(HeuristicKind::Manhattan).run(&start, &goal).unwrap();
    let bfs = BreadthFirst::new().run(&start, &goal).unwrap();
    assert_eq!(astar.len(), bfs.len());
    assert_eq!(astar.len() as u32, ordered_3x3().1[&start]);
    assert_eq!(astar.terminal().g() as usize, astar.len());
}

#[test]
fn suboptimal_engines_still_reach_the_goal() {
    let (goal, dist) = ordered_3x3();
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..3 {
        let start = PuzzleState::random(goal, true, &mut rng);
        for strategy in [Strategy::Greedy, Strategy::DepthFirst] {
            let mut engine = strategy.build(HeuristicKind::Manhattan, None);
            let solution = engine.run(&start, goal).unwrap();
            assert!(solution.len() >= dist[&start] as usize);

            let mut state = start.clone();
            for dir in solution.moves() {
                assert!(state.make_move(dir));
            }
            assert_eq!(&state, goal);
        }
    }
}

#[test]
fn genealogy_walks_parent_links() {
    let goal = PuzzleState::ordered(3).unwrap();
    let start = board(3, &[4, 1, 3, 7, 0, 5, 8, 2, 6]);
    let solution = BestFirst::astar(HeuristicKind::Manhattan)
        .run(&start, &goal)
        .unwrap();

    let terminal = solution.terminal();
    let ancestors = std::iter::successors(Some(terminal), |node| node.parent())
        .map(|node| node.state().clone())
        .collect::<Vec<_>>();
    assert_eq!(ancestors.len(), 9);
    assert_eq!(ancestors[0], goal);
    assert_eq!(ancestors[8], start);

    let ids = solution.tree().genealogy(terminal.id());
    assert_eq!(ids.len(), 9);
    for (depth, &id) in ids.iter().enumerate() {
        let node = solution.tree().get(id).unwrap();
        assert_eq!(node.g() as usize, depth);
        assert_eq!(node.f(), node.g() + node.h());
    }
}

#[test]
fn report_tracks_the_run() {
    let goal = PuzzleState::ordered(3).unwrap();
    let start = board(3, &[4, 1, 3, 7, 0, 5, 8, 2, 6]);

    for strategy in Strategy::ALL {
        let mut engine = strategy.build(HeuristicKind::Manhattan, None);
        assert_eq!(engine.report().outcome(), Outcome::Pending);
        assert_eq!(engine.report().elapsed(), None);

        let mut observed = 0;
        let mut max_seen = 0;
        let solution = engine
            .run_observed(&start, &goal, &mut |report| {
                observed += 1;
                assert_eq!(report.expansions(), observed);
                max_seen = max_seen.max(report.max_frontier());
            })
            .unwrap();

        let report = engine.report();
        assert_eq!(report.expansions(), observed);
        assert!(report.expansions() > 0);
        assert!(report.max_frontier() >= max_seen);
        assert!(report.max_frontier() >= report.frontier());
        assert!(report.elapsed().is_some());
        assert_eq!(report.result_size(), Some(solution.len()));
        assert_eq!(report.outcome(), Outcome::Solved { moves: solution.len() });
        assert!(report.to_string().starts_with(report.label()));
    }
}

fn moves(solution: Option<Solution>) -> Option<Vec<Direction>> {
    solution.map(|solution| solution.moves())
}

#[test]
fn runs_are_reproducible() {
    let (goal, _) = ordered_3x3();
    let mut rng = StdRng::seed_from_u64(11);
    let start = PuzzleState::random(goal, true, &mut rng);

    for strategy in Strategy::ALL {
        let first = strategy.build(HeuristicKind::Manhattan, None).run(&start, goal);
        let mut engine = strategy.build(HeuristicKind::Manhattan, None);
        let second = engine.run_observed(&start, goal, &mut |_| {});
        let third = engine.run(&start, goal);
        let first = moves(first);
        assert_eq!(first, moves(second), "{strategy}");
        assert_eq!(first, moves(third), "{strategy}");
    }
}

#[test]
fn unsolvable_boards_exhaust_every_engine() {
    let goal = PuzzleState::ordered(2).unwrap();
    let start = board(2, &[2, 1, 3, 0]);
    assert!(!start.is_solvable(&goal));

    for strategy in Strategy::ALL {
        let mut engine = strategy.build(HeuristicKind::Manhattan, None);
        assert!(engine.run(&start, &goal).is_none(), "{strategy}");
        assert_eq!(engine.report().outcome(), Outcome::Exhausted, "{strategy}");
        assert_eq!(engine.report().result_size(), None);
    }
}

#[test]
fn budget_cutoff_is_not_exhaustion() {
    let (goal, dist) = ordered_3x3();
    let start = board(3, &[8, 6, 7, 2, 5, 4, 3, 0, 1]);
    assert!(start.is_solvable(goal));

    for strategy in Strategy::ALL {
        let mut engine = strategy.build(HeuristicKind::Manhattan, Some(10));
        assert!(engine.run(&start, goal).is_none(), "{strategy}");
        assert_eq!(engine.report().outcome(), Outcome::BudgetExceeded);
        assert_eq!(engine.report().expansions(), 10);
    }

    // More expansions than there are boards: the cap can no longer bite.
    let mut engine = BestFirst::astar(HeuristicKind::Manhattan).with_expansion_limit(200_000);
    let solution = engine.run(&start, goal).unwrap();
    assert_eq!(solution.len() as u32, dist[&start]);
}

#[test]
fn engines_run_independently_in_parallel() {
    let (goal, dist) = ordered_3x3();
    let mut rng = StdRng::seed_from_u64(5);
    let starts = (0..4)
        .map(|_| PuzzleState::random(goal, true, &mut rng))
        .collect::<Vec<_>>();
    let jobs = starts
        .iter()
        .flat_map(|start| {
            [Strategy::AStar, Strategy::BreadthFirst, Strategy::IdaStar].map(|s| (start, s))
        })
        .collect::<Vec<_>>();

    let lengths = jobs
        .par_iter()
        .map(|&(start, strategy)| {
            let mut engine = strategy.build(HeuristicKind::LinearConflict, None);
            engine.run(start, goal).map(|s| s.len())
        })
        .collect::<Vec<_>>();

    for (&(start, _), len) in jobs.iter().zip(lengths) {
        assert_eq!(len, Some(dist[start] as usize));
    }
}

#[test]
fn names_resolve_to_strategies() {
    for strategy in Strategy::ALL {
        assert_eq!(strategy.name().parse(), Ok(strategy));
        assert_eq!(strategy.to_string(), strategy.name());
    }
    assert!("astar".parse::<Strategy>().is_ok());
    let err = "Bogo".parse::<Strategy>().unwrap_err();
    assert!(err.to_string().contains("AStar"));
    assert!(Strategy::IdaStar.is_informed());
    assert!(!Strategy::BreadthFirst.is_informed());
}

#[test]
fn mismatched_sizes_exhaust_without_searching() {
    let start = PuzzleState::ordered(3).unwrap();
    let goal = PuzzleState::ordered(2).unwrap();

    for strategy in Strategy::ALL {
        for heuristic in HeuristicKind::ALL {
            let mut engine = strategy.build(heuristic, None);
            assert!(engine.run(&start, &goal).is_none(), "{strategy}");
            let report = engine.report();
            assert_eq!(report.outcome(), Outcome::Exhausted, "{}", report.label());
            assert_eq!(report.expansions(), 0);
            assert_eq!(report.max_frontier(), 0);

            // The other way round too.
            assert!(engine.run(&goal, &start).is_none(), "{strategy}");
            assert_eq!(engine.report().outcome(), Outcome::Exhausted);
        }
    }
}

#[test]
fn solution_length_counts_parent_links() {
    let goal = PuzzleState::ordered(3).unwrap();
    let start = board(3, &[4, 1, 3, 7, 0, 5, 8, 2, 6]);

    for strategy in Strategy::ALL {
        let mut engine = strategy.build(HeuristicKind::Manhattan, None);
        let solution = engine.run(&start, &goal).unwrap();
        let len = solution.len();
        assert_eq!(len, solution.states().len() - 1, "{strategy}");
        assert_eq!(len, solution.moves().len(), "{strategy}");
        assert_eq!(len, solution.tree().genealogy(solution.terminal().id()).len() - 1);
        assert_eq!(len, solution.len());
    }

    let solution = BreadthFirst::new().run(&goal, &goal).unwrap();
    assert!(solution.is_empty());
    assert_eq!(solution.states(), [&goal]);
}
