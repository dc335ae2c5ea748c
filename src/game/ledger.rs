//! Token economy for a single player.
//!
//! A player starts with `initial_tokens` minus the size of its starting pattern
//! and earns one token per accrual tick while it still has live cells. Each
//! injected cell costs one token. Balances are unsigned and a charge that would
//! overdraw the balance is refused as a whole.

/// A charge larger than the available balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("insufficient tokens: requested {requested}, balance {balance}")]
pub struct InsufficientTokens {
    /// Tokens the charge asked for.
    pub requested: u32,
    /// Tokens available at the time.
    pub balance: u32,
}

/// Economy state for one player: balance, live cells and peak live cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenLedger {
    /// Current token balance.
    tokens: u32,
    /// Live cells after the last step.
    ncells: u32,
    /// Highest `ncells` seen so far.
    peak: u32,
}

impl TokenLedger {
    /// Open a ledger by paying for a starting pattern of `pattern_cells` cells.
    ///
    /// # Errors
    ///
    /// Returns [`InsufficientTokens`] if the pattern costs more than
    /// `initial_tokens`.
    pub const fn with_pattern(initial_tokens: u32, pattern_cells: u32) -> Result<Self, InsufficientTokens> {
        if pattern_cells > initial_tokens {
            return Err(InsufficientTokens {
                requested: pattern_cells,
                balance: initial_tokens,
            });
        }
        Ok(Self {
            tokens: initial_tokens - pattern_cells,
            ncells: pattern_cells,
            peak: pattern_cells,
        })
    }

    /// Current token balance.
    #[must_use]
    pub const fn balance(&self) -> u32 {
        self.tokens
    }

    /// Live cells after the last step.
    #[must_use]
    pub const fn ncells(&self) -> u32 {
        self.ncells
    }

    /// Highest live-cell count seen so far.
    #[must_use]
    pub const fn peak(&self) -> u32 {
        self.peak
    }

    /// Whether the player still has live cells (and so earns tokens and plays).
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.ncells > 0
    }

    /// Add one token.
    pub const fn grant(&mut self) {
        self.tokens = self.tokens.saturating_add(1);
    }

    /// Spend `n` tokens.
    ///
    /// # Errors
    ///
    /// Returns [`InsufficientTokens`] and leaves the balance untouched if `n`
    /// exceeds the balance.
    pub const fn charge(&mut self, n: u32) -> Result<(), InsufficientTokens> {
        if n > self.tokens {
            return Err(InsufficientTokens {
                requested: n,
                balance: self.tokens,
            });
        }
        self.tokens -= n;
        Ok(())
    }

    /// Record the live-cell count for the latest step and update the peak.
    pub fn record_cells(&mut self, ncells: u32) {
        self.ncells = ncells;
        self.peak = self.peak.max(ncells);
    }
}
