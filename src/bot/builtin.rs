//! Built-in bots for demos, benchmarks and tests.

use crate::bot::{Bot, BotContext, BotError, Placement};
use crate::game::Pattern;
use crate::rng::Rng;

/// Plays its starting pattern and never places cells.
#[derive(Debug, Clone)]
pub struct IdleBot {
    name: String,
    pattern: Pattern,
    color: Option<String>,
}

impl IdleBot {
    /// Create an idle bot.
    #[must_use]
    pub fn new(name: impl Into<String>, pattern: Pattern) -> Self {
        Self {
            name: name.into(),
            pattern,
            color: None,
        }
    }

    /// Use a fixed display colour instead of the palette.
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

impl Bot for IdleBot {
    fn name(&self) -> &str {
        &self.name
    }

    fn pattern(&self) -> Pattern {
        self.pattern.clone()
    }

    fn color(&self) -> Option<String> {
        self.color.clone()
    }

    fn decide(&mut self, _ctx: &BotContext<'_>) -> Result<Option<Placement>, BotError> {
        Ok(None)
    }
}

/// Seeds gliders into empty corners of its own patch.
///
/// Starts from a random 12x12 blob and, whenever it can afford a glider,
/// drops one into a random empty 3x3 block of its patch.
#[derive(Debug, Clone)]
pub struct GermBot {
    name: String,
    rng: Rng,
    pattern: Pattern,
    glider: Pattern,
}

impl GermBot {
    /// Side of the random starting blob.
    pub const BLOB: usize = 12;

    /// Lattice step when scanning the patch for empty blocks.
    const SKIP: usize = 2;

    /// Create a germ bot. The seed fixes both its pattern and its moves.
    #[must_use]
    pub fn new(name: impl Into<String>, seed: u64) -> Self {
        let mut rng = Rng::new(seed);
        let pattern = Pattern::new(
            (0..Self::BLOB)
                .flat_map(|y| (0..Self::BLOB).map(move |x| (x, y)))
                .filter(|_| rng.below(4) == 0)
                .collect::<Vec<_>>(),
        );
        Self {
            name: name.into(),
            rng,
            pattern,
            glider: Pattern::from_rows(&[".#.", "..#", "###"]),
        }
    }
}

impl Bot for GermBot {
    fn name(&self) -> &str {
        &self.name
    }

    fn pattern(&self) -> Pattern {
        self.pattern.clone()
    }

    #[allow(clippy::cast_possible_wrap)]
    fn decide(&mut self, ctx: &BotContext<'_>) -> Result<Option<Placement>, BotError> {
        let cost = self.glider.len();
        if (ctx.tokens as usize) < cost {
            return Ok(None);
        }

        let (w, h) = self.glider.extent();
        let corners = ctx.patch.find_empty_regions(w, h, Self::SKIP);
        if corners.is_empty() {
            return Ok(None);
        }
        let (cx, cy) = corners[self.rng.below(corners.len())];
        let (ox, oy) = ctx.patch.origin();

        Ok(Some(Placement::from_cells(self.glider.cells().iter().map(|&(x, y)| {
            ((ox + cx + x) as i64, (oy + cy + y) as i64)
        }))))
    }
}
