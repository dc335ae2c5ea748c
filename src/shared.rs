//! Memory shared between the match process and a viewer.
//!
//! A region is a file-backed mapping with a header describing its arrays, so
//! any process can reattach by path and get typed handles back. Bulk arrays
//! have a single writer (the engine) and are copied in and out element by
//! element with volatile reads and writes. Control flags are atomics accessed with acquire/release ordering.
//! Nobody blocks: both sides poll.

mod array;
mod region;

pub use array::{Element, ElementType, SharedArray};
pub use region::{ArrayLayout, RegionLayout, SharedRegion};

use std::path::Path;
use std::sync::atomic::Ordering;

use crate::game::{Board, Player, PlayerId};

/// Array holding the board before the latest step.
pub const BOARD_OLD: &str = "board_old";
/// Array holding the board after the latest step.
pub const BOARD_NEW: &str = "board_new";
/// Live cells per player per step, `[players, iterations + 1]`.
pub const PLAYER_HISTORIES: &str = "player_histories";
/// Token balance per player.
pub const PLAYER_TOKENS: &str = "player_tokens";
/// Control flags, see [`GameFlow`].
pub const GAME_FLOW: &str = "game_flow";
/// Steps completed so far.
pub const PROGRESS: &str = "progress";

/// Errors creating, attaching or using a shared region.
#[derive(Debug, thiserror::Error)]
pub enum SharedError {
    /// The backing file could not be used.
    #[error("shared region I/O: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not a shared region.
    #[error("not a shared region (bad magic)")]
    BadMagic,
    /// The region was written by an incompatible version.
    #[error("unsupported shared region version {0}")]
    UnsupportedVersion(u8),
    /// The layout header could not be encoded or decoded.
    #[error("invalid region layout: {0}")]
    Layout(#[from] serde_json::Error),
    /// The layout header does not fit its length field.
    #[error("region layout too large ({0} bytes)")]
    HeaderTooLarge(usize),
    /// A size computed from the layout does not fit in the address space.
    #[error("shared region size overflows for {0}")]
    Oversized(String),
    /// The file is shorter than its layout requires.
    #[error("region truncated: need {expected} bytes, have {actual}")]
    Truncated {
        /// Bytes required.
        expected: usize,
        /// Bytes present.
        actual: u64,
    },
    /// An array offset is not aligned to its element size.
    #[error("array offset {offset} is misaligned")]
    Misaligned {
        /// Offending byte offset.
        offset: usize,
    },
    /// No array with this name.
    #[error("no shared array named {0:?}")]
    MissingArray(String),
    /// The array holds a different element type.
    #[error("shared array {name:?} holds {found:?}, not {expected:?}")]
    ElementMismatch {
        /// Array name.
        name: String,
        /// Requested type.
        expected: ElementType,
        /// Type in the layout.
        found: ElementType,
    },
    /// The array has an unexpected shape.
    #[error("shared array {name:?} has shape {found:?}")]
    ShapeMismatch {
        /// Array name.
        name: String,
        /// Shape in the layout.
        found: Vec<usize>,
    },
    /// A bulk copy had the wrong length.
    #[error("length mismatch: expected {expected}, got {actual}")]
    LengthMismatch {
        /// Array length.
        expected: usize,
        /// Buffer length.
        actual: usize,
    },
    /// An element index is past the end.
    #[error("index {index} out of range for length {len}")]
    OutOfRange {
        /// Requested index.
        index: usize,
        /// Array length.
        len: usize,
    },
}

/// Control flags shared with a viewer.
///
/// The viewer may only write these; everything else in the region is written
/// by the engine alone.
#[derive(Debug, Clone)]
pub struct GameFlow {
    flags: SharedArray<u8>,
}

impl GameFlow {
    const PAUSED: usize = 0;
    const EXIT_REQUESTED: usize = 1;
    const FINISHED: usize = 2;

    /// Number of flag slots.
    pub const LEN: usize = 3;

    fn load(&self, slot: usize) -> bool {
        self.flags
            .atomic(slot)
            .is_some_and(|flag| flag.load(Ordering::Acquire) != 0)
    }

    fn store(&self, slot: usize, value: bool) {
        if let Some(flag) = self.flags.atomic(slot) {
            flag.store(u8::from(value), Ordering::Release);
        }
    }

    /// Whether the match is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.load(Self::PAUSED)
    }

    /// Pause or resume the match.
    pub fn set_paused(&self, paused: bool) {
        self.store(Self::PAUSED, paused);
    }

    /// Whether someone asked the match to stop.
    #[must_use]
    pub fn exit_requested(&self) -> bool {
        self.load(Self::EXIT_REQUESTED)
    }

    /// Ask the match to stop after the current step.
    pub fn request_exit(&self) {
        self.store(Self::EXIT_REQUESTED, true);
    }

    /// Whether the engine has finished and published its final state.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.load(Self::FINISHED)
    }

    /// Mark the match as finished.
    pub fn set_finished(&self) {
        self.store(Self::FINISHED, true);
    }
}

/// All buffers a match shares with a viewer.
#[derive(Debug)]
pub struct SharedState {
    region: SharedRegion,
    board_old: SharedArray<u8>,
    board_new: SharedArray<u8>,
    histories: SharedArray<u32>,
    tokens: SharedArray<u32>,
    progress: SharedArray<u32>,
    flow: GameFlow,
    nx: usize,
    ny: usize,
    players: usize,
    iterations: u32,
}

impl SharedState {
    /// Layout for a match on an `nx × ny` board.
    #[must_use]
    pub fn layout(nx: usize, ny: usize, players: usize, iterations: u32) -> RegionLayout {
        RegionLayout::new()
            .with_array(BOARD_OLD, ElementType::U8, &[ny, nx])
            .with_array(BOARD_NEW, ElementType::U8, &[ny, nx])
            .with_array(PLAYER_HISTORIES, ElementType::U32, &[players, iterations as usize + 1])
            .with_array(PLAYER_TOKENS, ElementType::U32, &[players])
            .with_array(GAME_FLOW, ElementType::U8, &[GameFlow::LEN])
            .with_array(PROGRESS, ElementType::U32, &[1])
    }

    /// Create a fresh region at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the region cannot be created.
    pub fn create(path: &Path, nx: usize, ny: usize, players: usize, iterations: u32) -> Result<Self, SharedError> {
        Self::from_region(SharedRegion::create(path, Self::layout(nx, ny, players, iterations))?)
    }

    /// Attach to a region created by another process.
    ///
    /// # Errors
    ///
    /// Returns an error if the region is missing or does not hold match state.
    pub fn attach(path: &Path) -> Result<Self, SharedError> {
        Self::from_region(SharedRegion::attach(path)?)
    }

    fn from_region(region: SharedRegion) -> Result<Self, SharedError> {
        let board_old = region.array::<u8>(BOARD_OLD)?;
        let board_new = region.array::<u8>(BOARD_NEW)?;
        let histories = region.array::<u32>(PLAYER_HISTORIES)?;
        let tokens = region.array::<u32>(PLAYER_TOKENS)?;
        let progress = region.array::<u32>(PROGRESS)?;
        let flags = region.array::<u8>(GAME_FLOW)?;

        let &[ny, nx] = board_old.shape() else {
            return Err(shape_mismatch(BOARD_OLD, board_old.shape()));
        };
        if board_new.shape() != board_old.shape() {
            return Err(shape_mismatch(BOARD_NEW, board_new.shape()));
        }
        let &[players, columns] = histories.shape() else {
            return Err(shape_mismatch(PLAYER_HISTORIES, histories.shape()));
        };
        let iterations = columns
            .checked_sub(1)
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| shape_mismatch(PLAYER_HISTORIES, histories.shape()))?;
        if tokens.len() != players {
            return Err(shape_mismatch(PLAYER_TOKENS, tokens.shape()));
        }
        if flags.len() != GameFlow::LEN {
            return Err(shape_mismatch(GAME_FLOW, flags.shape()));
        }
        if progress.is_empty() {
            return Err(shape_mismatch(PROGRESS, progress.shape()));
        }

        Ok(Self {
            region,
            board_old,
            board_new,
            histories,
            tokens,
            progress,
            flow: GameFlow { flags },
            nx,
            ny,
            players,
            iterations,
        })
    }

    /// Backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.region.path()
    }

    /// Board dimensions `(nx, ny)`.
    #[must_use]
    pub const fn dimensions(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    /// Number of player slots.
    #[must_use]
    pub const fn players(&self) -> usize {
        self.players
    }

    /// Steps the match was configured for.
    #[must_use]
    pub const fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Control flags.
    #[must_use]
    pub const fn flow(&self) -> &GameFlow {
        &self.flow
    }

    /// Copy both boards into the region.
    ///
    /// # Errors
    ///
    /// Returns an error if the boards do not match the region's dimensions.
    pub fn publish_boards(&self, old: &Board, new: &Board) -> Result<(), SharedError> {
        self.board_old.write_from(old.cells())?;
        self.board_new.write_from(new.cells())
    }

    /// Record every player's live cells for history column `step` and their
    /// balances, then advance the progress counter to `step`.
    ///
    /// # Errors
    ///
    /// Returns an error if `step` or a player number is outside the region.
    pub fn publish_step(&self, step: u32, players: &[Player]) -> Result<(), SharedError> {
        for player in players {
            let row = usize::from(player.number) - 1;
            let index = self
                .histories
                .index_of(&[row, step as usize])
                .ok_or(SharedError::OutOfRange {
                    index: step as usize,
                    len: self.iterations as usize + 1,
                })?;
            self.histories.set(index, player.ncells())?;
            self.tokens.set(row, player.ledger.balance())?;
        }
        if let Some(progress) = self.progress.atomic(0) {
            progress.store(step, Ordering::Release);
        }
        Ok(())
    }

    /// Steps published so far.
    #[must_use]
    pub fn progress(&self) -> u32 {
        self.progress
            .atomic(0)
            .map_or(0, |progress| progress.load(Ordering::Acquire))
    }

    /// Copy of the latest board.
    #[must_use]
    pub fn board(&self) -> Vec<PlayerId> {
        self.board_new.to_vec()
    }

    /// History of one player (0-based slot), up to the published progress.
    #[must_use]
    pub fn history(&self, slot: usize) -> Vec<u32> {
        let last = self.progress() as usize;
        (0..=last)
            .map_while(|step| self.histories.index_of(&[slot, step]))
            .filter_map(|index| self.histories.get(index))
            .collect()
    }

    /// Live cells of every player at the published progress.
    #[must_use]
    pub fn live_cells(&self) -> Vec<u32> {
        let step = self.progress() as usize;
        (0..self.players)
            .map(|slot| {
                self.histories
                    .index_of(&[slot, step])
                    .and_then(|index| self.histories.get(index))
                    .unwrap_or(0)
            })
            .collect()
    }

    /// Token balances of every player.
    #[must_use]
    pub fn tokens(&self) -> Vec<u32> {
        self.tokens.to_vec()
    }

    /// Write the mapped pages back to the backing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    pub fn flush(&self) -> Result<(), SharedError> {
        self.region.flush()
    }

    /// Unmap and delete the backing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be removed.
    pub fn remove(self) -> Result<(), SharedError> {
        let Self {
            region,
            board_old,
            board_new,
            histories,
            tokens,
            progress,
            flow,
            ..
        } = self;
        drop((board_old, board_new, histories, tokens, progress, flow));
        region.remove()
    }
}

fn shape_mismatch(name: &str, shape: &[usize]) -> SharedError {
    SharedError::ShapeMismatch {
        name: name.to_string(),
        found: shape.to_vec(),
    }
}
