use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

use crate::{PuzzleError, PuzzleState, MAX_N, MIN_N};

impl FromStr for PuzzleState {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tokens = s.lines().zip(1..).flat_map(|(line, line_no)| {
            let content = line.split_once('#').map_or(line, |(content, _)| content);
            content.split_whitespace().map(move |token| (line_no, token))
        });

        let (line_no, size) = tokens.next().context("Missing puzzle size")?;
        let n = size
            .parse::<usize>()
            .with_context(|| format!("Invalid puzzle size {size:?} on line {line_no}"))?;
        if !(MIN_N..=MAX_N).contains(&n) {
            return Err(PuzzleError::Range { n }.into());
        }

        let tiles = tokens
            .by_ref()
            .take(n * n)
            .map(|(line_no, token)| {
                token
                    .parse::<usize>()
                    .with_context(|| format!("Invalid tile {token:?} on line {line_no}"))
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some((line_no, token)) = tokens.next() {
            bail!("Unexpected token {token:?} on line {line_no}");
        }

        Ok(PuzzleState::new(n, &tiles)?)
    }
}

impl PuzzleState {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        content
            .parse()
            .with_context(|| format!("Failed to parse {}", path.display()))
    }
}
