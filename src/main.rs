use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use npuzzle_solver::{Goal, HeuristicKind, PuzzleState, Report, Strategy, MAX_N, MIN_N};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

/// Solve sliding-tile puzzles with a choice of search strategies.
#[derive(Debug, Parser)]
#[command(name = "npuzzle", version)]
struct Args {
    /// Puzzle file to load.
    #[arg(short, long, value_name = "FILENAME", conflicts_with = "random")]
    file: Option<PathBuf>,

    /// Generate a random puzzle of size N.
    #[arg(short, long, value_name = "N", default_value_t = 3)]
    random: usize,

    /// Generate an unsolvable puzzle. Ignored with --file.
    #[arg(short, long)]
    unsolvable: bool,

    /// Seed for the random puzzle.
    #[arg(long)]
    seed: Option<u64>,

    /// Search strategy.
    #[arg(short, long, value_name = "NAME", default_value_t = Strategy::AStar)]
    solver: Strategy,

    /// Distance estimate for informed strategies.
    #[arg(short = 'H', long, value_name = "NAME", default_value_t = HeuristicKind::Manhattan)]
    heuristic: HeuristicKind,

    /// Goal layout: snail or ordered.
    #[arg(short, long, value_name = "LAYOUT", default_value = "snail")]
    goal: Goal,

    /// Stop after this many expansions.
    #[arg(long, value_name = "N")]
    limit: Option<u64>,

    /// Save the puzzle to a new file.
    #[arg(short, long, value_name = "FILENAME")]
    output: Option<PathBuf>,

    /// Run every configured solver/heuristic pair and print their reports.
    #[arg(short = 'k', long)]
    compare: bool,

    /// JSON file listing the solvers and heuristics to compare.
    #[arg(short, long, value_name = "FILENAME", requires = "compare")]
    config: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct CompareConfig {
    solvers: Vec<Strategy>,
    heuristics: Vec<HeuristicKind>,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            solvers: Strategy::ALL.to_vec(),
            heuristics: HeuristicKind::ALL.to_vec(),
        }
    }
}

impl CompareConfig {
    fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = serde_json::from_str::<Self>(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        ensure!(
            !config.solvers.is_empty() && !config.heuristics.is_empty(),
            "The config must list some solvers and heuristics"
        );
        Ok(config)
    }

    /// Uninformed solvers appear once, whatever the heuristics.
    fn pairs(&self) -> Vec<(Strategy, HeuristicKind)> {
        let mut pairs = Vec::new();
        for &solver in &self.solvers {
            if solver.is_informed() {
                pairs.extend(self.heuristics.iter().map(|&heuristic| (solver, heuristic)));
            } else {
                pairs.push((solver, self.heuristics[0]));
            }
        }
        pairs
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let (puzzle, goal) = match &args.file {
        Some(path) => {
            let puzzle = PuzzleState::load(path).context("Failed to load the puzzle")?;
            let goal = args.goal.build(puzzle.n())?;
            (puzzle, goal)
        }
        None => {
            ensure!(
                (MIN_N..=MAX_N).contains(&args.random),
                "The size of a random puzzle must be in {MIN_N}..={MAX_N} ({} here)",
                args.random
            );
            let goal = args.goal.build(args.random)?;
            let mut rng = match args.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            (PuzzleState::random(&goal, !args.unsolvable, &mut rng), goal)
        }
    };

    if let Some(path) = &args.output {
        puzzle.save(path)?;
        println!("The puzzle has been saved in {}.", path.display());
    }

    if !puzzle.is_solvable(&goal) {
        println!("{}\n{puzzle}", style("This puzzle can't be solved.").red().bold());
        return Ok(());
    }

    if args.compare {
        let config = match &args.config {
            Some(path) => CompareConfig::load(path)?,
            None => CompareConfig::default(),
        };
        for report in compare(&config, &puzzle, &goal, args.limit) {
            println!("{report}");
        }
        return Ok(());
    }

    solve(&args, &puzzle, &goal)
}

fn solve(args: &Args, puzzle: &PuzzleState, goal: &PuzzleState) -> Result<()> {
    let mut engine = args.solver.build(args.heuristic, args.limit);

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner} [{elapsed}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    let solution = engine.run_observed(puzzle, goal, &mut |report| {
        if report.expansions() % 1024 == 0 {
            pb.set_message(format!(
                "{} expanded, {} queued",
                report.expansions(),
                report.frontier()
            ));
        }
    });
    pb.finish_and_clear();

    match &solution {
        None => println!("{}", style("No solution found.").red().bold()),
        Some(solution) => {
            let states = solution.states();
            println!("{}\n{}", style("Start").bold(), states[0]);
            for (state, dir) in states[1..].iter().zip(solution.moves()) {
                println!("{}\n{state}", style(dir).cyan());
            }
        }
    }
    println!("{}", engine.report());
    Ok(())
}

/// Solves the puzzle once per pair, each on its own engine instance.
fn compare(
    config: &CompareConfig,
    puzzle: &PuzzleState,
    goal: &PuzzleState,
    limit: Option<u64>,
) -> Vec<Report> {
    config
        .pairs()
        .into_par_iter()
        .map(|(solver, heuristic)| {
            let mut engine = solver.build(heuristic, limit);
            engine.run(puzzle, goal);
            engine.report().clone()
        })
        .collect()
}
