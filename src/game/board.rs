//! Toroidal board of cell owners.

use serde::{Deserialize, Serialize};

/// Owner id stored in a board cell. `0` is empty, `k > 0` belongs to player `k`.
pub type PlayerId = u8;

/// Value of an empty cell.
pub const EMPTY: PlayerId = 0;

/// Wrap a signed coordinate onto `0..size`.
#[must_use]
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap, clippy::cast_sign_loss)]
pub fn wrap(coord: i64, size: usize) -> usize {
    coord.rem_euclid(size as i64) as usize
}

/// A player's home region on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Patch {
    /// Column of the patch origin.
    pub x: usize,
    /// Row of the patch origin.
    pub y: usize,
    /// Width in cells.
    pub width: usize,
    /// Height in cells.
    pub height: usize,
}

impl Patch {
    /// Create a patch.
    #[must_use]
    pub const fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Split an `nx × ny` board into a `rows × cols` grid of equal patches,
    /// returned in row-major order.
    ///
    /// Cells left over when the board does not divide evenly belong to no patch.
    #[must_use]
    pub fn grid(nx: usize, ny: usize, rows: usize, cols: usize) -> Vec<Self> {
        if rows == 0 || cols == 0 {
            return Vec::new();
        }
        let width = nx / cols;
        let height = ny / rows;
        (0..rows)
            .flat_map(|row| {
                (0..cols).map(move |col| Self::new(col * width, row * height, width, height))
            })
            .collect()
    }

    /// Map a patch-local coordinate onto the board, wrapping inside the patch first.
    #[must_use]
    pub fn to_board(&self, x: i64, y: i64, nx: usize, ny: usize) -> (usize, usize) {
        let lx = wrap(x, self.width.max(1));
        let ly = wrap(y, self.height.max(1));
        ((self.x + lx) % nx, (self.y + ly) % ny)
    }

    /// Check whether a board coordinate lies inside this patch.
    #[must_use]
    pub const fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// The game board: `nx × ny` owner ids in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    /// Number of columns.
    nx: usize,
    /// Number of rows.
    ny: usize,
    /// Cells stored in row-major order.
    cells: Vec<PlayerId>,
}

impl Board {
    /// Create an empty board.
    ///
    /// Returns `None` if either dimension is zero.
    #[must_use]
    pub fn new(nx: usize, ny: usize) -> Option<Self> {
        if nx == 0 || ny == 0 {
            return None;
        }
        Some(Self {
            nx,
            ny,
            cells: vec![EMPTY; nx * ny],
        })
    }

    /// Build a board from existing row-major cells.
    ///
    /// Returns `None` if the cell count does not match the dimensions.
    #[must_use]
    pub fn from_cells(nx: usize, ny: usize, cells: Vec<PlayerId>) -> Option<Self> {
        if nx == 0 || ny == 0 || cells.len() != nx * ny {
            return None;
        }
        Some(Self { nx, ny, cells })
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.nx
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.ny
    }

    /// Raw cells in row-major order.
    #[must_use]
    #[inline]
    pub fn cells(&self) -> &[PlayerId] {
        &self.cells
    }

    /// Mutable raw cells in row-major order.
    #[must_use]
    #[inline]
    pub fn cells_mut(&mut self) -> &mut [PlayerId] {
        &mut self.cells
    }

    /// Row-major index of a wrapped coordinate.
    #[must_use]
    #[inline]
    pub fn index(&self, x: i64, y: i64) -> usize {
        wrap(y, self.ny) * self.nx + wrap(x, self.nx)
    }

    /// Owner at a coordinate; coordinates wrap in both axes.
    #[must_use]
    #[inline]
    pub fn get(&self, x: i64, y: i64) -> PlayerId {
        self.cells[self.index(x, y)]
    }

    /// Set the owner at a coordinate; coordinates wrap in both axes.
    #[inline]
    pub fn set(&mut self, x: i64, y: i64, owner: PlayerId) {
        let idx = self.index(x, y);
        self.cells[idx] = owner;
    }

    /// Number of cells owned by `player`.
    #[must_use]
    pub fn count(&self, player: PlayerId) -> usize {
        self.cells.iter().filter(|&&c| c == player).count()
    }

    /// Read-only view of the whole board.
    #[must_use]
    pub fn view(&self) -> BoardView<'_> {
        BoardView {
            cells: &self.cells,
            nx: self.nx,
            ny: self.ny,
            origin: (0, 0),
            size: (self.nx, self.ny),
        }
    }

    /// Read-only view restricted to a patch.
    #[must_use]
    pub fn patch_view(&self, patch: &Patch) -> BoardView<'_> {
        BoardView {
            cells: &self.cells,
            nx: self.nx,
            ny: self.ny,
            origin: (patch.x % self.nx, patch.y % self.ny),
            size: (patch.width.max(1), patch.height.max(1)),
        }
    }
}

/// Immutable window onto a board.
///
/// Coordinates are local to the window and wrap inside it. Bots only ever see
/// the board through this type.
#[derive(Debug, Clone, Copy)]
pub struct BoardView<'a> {
    cells: &'a [PlayerId],
    nx: usize,
    ny: usize,
    origin: (usize, usize),
    size: (usize, usize),
}

impl BoardView<'_> {
    /// Window width.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.size.0
    }

    /// Window height.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.size.1
    }

    /// Board coordinate of the window's `(0, 0)` cell.
    #[must_use]
    pub const fn origin(&self) -> (usize, usize) {
        self.origin
    }

    /// Owner at a local coordinate.
    #[must_use]
    #[inline]
    pub fn get(&self, x: i64, y: i64) -> PlayerId {
        let bx = (self.origin.0 + wrap(x, self.size.0)) % self.nx;
        let by = (self.origin.1 + wrap(y, self.size.1)) % self.ny;
        self.cells[by * self.nx + bx]
    }

    /// Owners along local row `y`, left to right.
    pub fn row(&self, y: i64) -> impl Iterator<Item = PlayerId> {
        let by = (self.origin.1 + wrap(y, self.size.1)) % self.ny;
        let row = &self.cells[by * self.nx..(by + 1) * self.nx];
        let (ox, nx) = (self.origin.0, self.nx);
        (0..self.size.0).map(move |x| row[(ox + x) % nx])
    }

    /// Number of cells in the window owned by `player`.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn count(&self, player: PlayerId) -> usize {
        let mut n = 0;
        for y in 0..self.size.1 {
            for x in 0..self.size.0 {
                if self.get(x as i64, y as i64) == player {
                    n += 1;
                }
            }
        }
        n
    }

    /// Lower-left corners of every fully empty `width × height` block, scanning
    /// the window on a lattice of step `skip`.
    ///
    /// Blocks never wrap past the window edge. A larger `skip` is faster but
    /// finds fewer candidates.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn find_empty_regions(&self, width: usize, height: usize, skip: usize) -> Vec<(usize, usize)> {
        let skip = skip.max(1);
        if width == 0 || height == 0 || width > self.size.0 || height > self.size.1 {
            return Vec::new();
        }
        let mut corners = Vec::new();
        for y0 in (0..=self.size.1 - height).step_by(skip) {
            for x0 in (0..=self.size.0 - width).step_by(skip) {
                let empty = (y0..y0 + height)
                    .all(|y| (x0..x0 + width).all(|x| self.get(x as i64, y as i64) == EMPTY));
                if empty {
                    corners.push((x0, y0));
                }
            }
        }
        corners
    }
}
