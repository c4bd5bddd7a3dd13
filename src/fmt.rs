use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::{Direction, PuzzleState, EMPTY_TILE};

fn tile_width(state: &PuzzleState) -> usize {
    let max = state.tiles().len() - 1;
    max.to_string().len()
}

impl fmt::Display for PuzzleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = tile_width(self);
        for row in self.tiles().chunks(self.n()) {
            f.write_str("|")?;
            for &tile in row {
                if tile == EMPTY_TILE {
                    write!(f, " {:width$} |", "")?;
                } else {
                    write!(f, " {tile:>width$} |")?;
                }
            }
            f.write_str("\n")?;
        }
        Ok(())
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => f.write_str("Up"),
            Direction::Right => f.write_str("Right"),
            Direction::Down => f.write_str("Down"),
            Direction::Left => f.write_str("Left"),
        }
    }
}

impl PuzzleState {
    /// Serialises the board in the text format read by [`str::parse`]: the size on
    /// its own line, then one line of right-aligned tiles per row.
    pub fn to_text(&self) -> String {
        let width = tile_width(self);
        let mut out = format!("{}\n", self.n());
        for row in self.tiles().chunks(self.n()) {
            let line = row
                .iter()
                .map(|tile| format!("{tile:>width$}"))
                .collect::<Vec<_>>()
                .join(" ");
            out.push_str(&line);
            out.push('\n');
        }
        out
    }

    /// Writes [`Self::to_text`] to a new file. Existing files are never overwritten.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        file.write_all(self.to_text().as_bytes())
            .with_context(|| format!("Failed to write {}", path.display()))
    }
}
