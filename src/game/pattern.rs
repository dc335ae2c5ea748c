//! Starting patterns.

use serde::{Deserialize, Serialize};

/// A pattern that cannot be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    /// The pattern has no live cells.
    #[error("pattern is empty")]
    Empty,
    /// The same offset appears twice.
    #[error("duplicate cell ({x}, {y})")]
    Duplicate {
        /// Column offset.
        x: usize,
        /// Row offset.
        y: usize,
    },
    /// An offset lies outside the allowed pattern box.
    #[error("cell ({x}, {y}) outside the {width}x{height} pattern box")]
    OutOfBounds {
        /// Column offset.
        x: usize,
        /// Row offset.
        y: usize,
        /// Box width.
        width: usize,
        /// Box height.
        height: usize,
    },
}

/// Live-cell offsets a player starts with, relative to its placement corner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pattern {
    cells: Vec<(usize, usize)>,
}

impl Pattern {
    /// Pattern from `(x, y)` offsets.
    #[must_use]
    pub fn new(cells: impl IntoIterator<Item = (usize, usize)>) -> Self {
        Self {
            cells: cells.into_iter().collect(),
        }
    }

    /// Pattern drawn as text, one string per row starting at `y = 0`.
    ///
    /// `#`, `O` and `o` mark live cells; anything else is empty.
    #[must_use]
    pub fn from_rows(rows: &[&str]) -> Self {
        Self::new(rows.iter().enumerate().flat_map(|(y, row)| {
            row.chars()
                .enumerate()
                .filter(|(_, c)| matches!(c, '#' | 'O' | 'o'))
                .map(move |(x, _)| (x, y))
        }))
    }

    /// Offsets of the live cells.
    #[must_use]
    pub fn cells(&self) -> &[(usize, usize)] {
        &self.cells
    }

    /// Number of live cells (the token cost of the pattern).
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the pattern has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Bounding box `(width, height)` measured from the origin.
    #[must_use]
    pub fn extent(&self) -> (usize, usize) {
        self.cells
            .iter()
            .fold((0, 0), |(w, h), &(x, y)| (w.max(x + 1), h.max(y + 1)))
    }

    /// Check that the pattern is non-empty, has no duplicates and fits in a
    /// `max.0 × max.1` box.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self, max: (usize, usize)) -> Result<(), PatternError> {
        if self.cells.is_empty() {
            return Err(PatternError::Empty);
        }
        if let Some(&(x, y)) = self.cells.iter().find(|&&(x, y)| x >= max.0 || y >= max.1) {
            return Err(PatternError::OutOfBounds {
                x,
                y,
                width: max.0,
                height: max.1,
            });
        }
        let mut sorted = self.cells.clone();
        sorted.sort_unstable();
        if let Some(w) = sorted.windows(2).find(|w| w[0] == w[1]) {
            return Err(PatternError::Duplicate { x: w[0].0, y: w[0].1 });
        }
        Ok(())
    }
}
