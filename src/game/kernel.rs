//! Ownership-aware Life kernel.
//!
//! One step of the rule, for every cell:
//!
//! - a live cell with 2 or 3 live neighbours survives and keeps its owner;
//! - an empty cell with exactly 3 live neighbours is born;
//! - every other cell is empty in the next state.
//!
//! A newborn cell's owner is chosen from the first three live neighbours met in
//! [`NEIGHBOR_OFFSETS`] order: the first if it matches the second or the third,
//! otherwise the second.
//!
//! Rows are independent, so the step runs in parallel across rows on a rayon
//! pool. Each output row is written by exactly one task and the scratch state
//! lives on the stack, so steady-state steps do not allocate.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::ConfigError;
use crate::game::{Board, EMPTY, PlayerId};

/// Neighbour offsets `(dx, dy)` in scan order.
pub const NEIGHBOR_OFFSETS: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Resolve the owner of a newborn cell from the first three live neighbours.
#[must_use]
#[inline]
pub const fn birth_owner(buffer: [PlayerId; 3]) -> PlayerId {
    if buffer[0] == buffer[1] || buffer[0] == buffer[2] {
        buffer[0]
    } else {
        buffer[1]
    }
}

/// Next state of a single cell given its current value and its neighbours in
/// scan order.
#[must_use]
#[inline]
pub fn next_cell(current: PlayerId, neighbors: [PlayerId; 8]) -> PlayerId {
    let mut count = 0usize;
    let mut buffer = [EMPTY; 3];
    for n in neighbors {
        if n != EMPTY {
            if count < 3 {
                buffer[count] = n;
            }
            count += 1;
        }
    }

    if current != EMPTY && (count == 2 || count == 3) {
        current
    } else if current == EMPTY && count == 3 {
        birth_owner(buffer)
    } else {
        EMPTY
    }
}

/// Compute one output row from the previous board.
#[inline]
fn evolve_row(old: &[PlayerId], nx: usize, ny: usize, y: usize, out: &mut [PlayerId]) {
    let up = ((y + ny - 1) % ny) * nx;
    let mid = y * nx;
    let down = ((y + 1) % ny) * nx;

    for (x, cell) in out.iter_mut().enumerate() {
        let left = (x + nx - 1) % nx;
        let right = (x + 1) % nx;
        let neighbors = [
            old[up + left],
            old[up + x],
            old[up + right],
            old[mid + left],
            old[mid + right],
            old[down + left],
            old[down + x],
            old[down + right],
        ];
        *cell = next_cell(old[mid + x], neighbors);
    }
}

/// Fill `counts[k]` with the number of cells owned by player `k`.
///
/// `counts[0]` receives the number of empty cells. Owners beyond the end of
/// `counts` are ignored.
pub fn histogram(board: &Board, counts: &mut [u32]) {
    counts.fill(0);
    for &cell in board.cells() {
        if let Some(slot) = counts.get_mut(usize::from(cell)) {
            *slot += 1;
        }
    }
}

/// Runs the evolution step, optionally on a dedicated worker pool.
#[derive(Debug)]
pub struct Kernel {
    /// Worker pool; `None` runs rows sequentially on the caller's thread.
    pool: Option<ThreadPool>,
}

impl Kernel {
    /// Kernel that evolves rows on the calling thread.
    #[must_use]
    pub const fn sequential() -> Self {
        Self { pool: None }
    }

    /// Kernel backed by a pool of `threads` workers.
    ///
    /// `threads == 1` evolves sequentially; `threads == 0` lets rayon size the
    /// pool from the number of cores.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker pool cannot be created.
    pub fn new(threads: usize) -> Result<Self, ConfigError> {
        if threads == 1 {
            return Ok(Self::sequential());
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("kernel-{i}"))
            .build()
            .map_err(|e| ConfigError::ThreadPool(e.to_string()))?;
        Ok(Self { pool: Some(pool) })
    }

    /// Number of threads rows are spread over.
    #[must_use]
    pub fn threads(&self) -> usize {
        self.pool.as_ref().map_or(1, ThreadPool::current_num_threads)
    }

    /// Advance `old` into `new` and record per-player live-cell counts.
    ///
    /// Both boards must share the same dimensions; `new` is fully overwritten.
    pub fn evolve(&self, old: &Board, new: &mut Board, counts: &mut [u32]) {
        debug_assert_eq!(old.width(), new.width());
        debug_assert_eq!(old.height(), new.height());

        let nx = old.width();
        let ny = old.height();
        let src = old.cells();

        match &self.pool {
            Some(pool) => pool.install(|| {
                new.cells_mut()
                    .par_chunks_mut(nx)
                    .enumerate()
                    .for_each(|(y, row)| evolve_row(src, nx, ny, y, row));
            }),
            None => {
                for (y, row) in new.cells_mut().chunks_mut(nx).enumerate() {
                    evolve_row(src, nx, ny, y, row);
                }
            }
        }

        histogram(new, counts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_with(nx: usize, ny: usize, cells: &[(i64, i64, PlayerId)]) -> Board {
        let mut board = Board::new(nx, ny).unwrap();
        for &(x, y, p) in cells {
            board.set(x, y, p);
        }
        board
    }

    #[test]
    fn test_birth_tie_break() {
        assert_eq!(birth_owner([1, 1, 2]), 1);
        assert_eq!(birth_owner([1, 2, 1]), 1);
        assert_eq!(birth_owner([1, 2, 3]), 2);
        assert_eq!(birth_owner([2, 1, 1]), 1);
    }

    #[test]
    fn test_birth_uses_scan_order() {
        // Neighbours of (1, 1) in scan order: (0,0)=A, (1,0)=B, (2,0)=A.
        let old = board_with(5, 5, &[(0, 0, 1), (1, 0, 2), (2, 0, 1)]);
        let mut new = Board::new(5, 5).unwrap();
        let mut counts = [0u32; 3];
        Kernel::sequential().evolve(&old, &mut new, &mut counts);
        assert_eq!(new.get(1, 1), 1);

        // A, B, C all distinct: the second one wins.
        let old = board_with(5, 5, &[(0, 0, 1), (1, 0, 2), (2, 0, 3)]);
        let mut counts = [0u32; 4];
        Kernel::sequential().evolve(&old, &mut new, &mut counts);
        assert_eq!(new.get(1, 1), 2);
    }

    #[test]
    fn test_survival_keeps_owner() {
        // 2x2 block is a still life.
        let old = board_with(6, 6, &[(2, 2, 4), (3, 2, 4), (2, 3, 4), (3, 3, 4)]);
        let mut new = Board::new(6, 6).unwrap();
        let mut counts = [0u32; 5];
        Kernel::sequential().evolve(&old, &mut new, &mut counts);
        assert_eq!(old, new);
        assert_eq!(counts[4], 4);
        assert_eq!(counts[0], 32);
    }

    #[test]
    fn test_isolated_cell_dies() {
        let old = board_with(4, 4, &[(1, 1, 1)]);
        let mut new = Board::new(4, 4).unwrap();
        let mut counts = [0u32; 2];
        Kernel::sequential().evolve(&old, &mut new, &mut counts);
        assert_eq!(counts[1], 0);
    }

    #[test]
    fn test_wraps_vertically() {
        // Horizontal blinker on row 0 of a 5x5 board: its vertical phase
        // needs the cell at row ny - 1.
        let old = board_with(5, 5, &[(1, 0, 1), (2, 0, 1), (3, 0, 1)]);
        let mut new = Board::new(5, 5).unwrap();
        let mut counts = [0u32; 2];
        Kernel::sequential().evolve(&old, &mut new, &mut counts);
        assert_eq!(new.get(2, 4), 1);
        assert_eq!(new.get(2, 0), 1);
        assert_eq!(new.get(2, 1), 1);
        assert_eq!(counts[1], 3);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut old = Board::new(33, 17).unwrap();
        let mut state = 0x9e37_79b9_7f4a_7c15_u64;
        for cell in old.cells_mut() {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            *cell = if state % 3 == 0 { (state % 4) as PlayerId } else { 0 };
        }

        let mut seq = Board::new(33, 17).unwrap();
        let mut par = Board::new(33, 17).unwrap();
        let mut seq_counts = [0u32; 4];
        let mut par_counts = [0u32; 4];
        Kernel::sequential().evolve(&old, &mut seq, &mut seq_counts);
        Kernel::new(4).unwrap().evolve(&old, &mut par, &mut par_counts);

        assert_eq!(seq, par);
        assert_eq!(seq_counts, par_counts);
    }

    #[test]
    fn test_kernel_threads() {
        assert_eq!(Kernel::sequential().threads(), 1);
        assert_eq!(Kernel::new(1).unwrap().threads(), 1);
        assert_eq!(Kernel::new(3).unwrap().threads(), 3);
    }
}
