#![no_main]

use arbitrary::Arbitrary;
use cholerama::bot::{Bot, BotContext, BotError, Placement};
use cholerama::config::MatchConfig;
use cholerama::engine::Match;
use cholerama::game::Pattern;
use libfuzzer_sys::fuzz_target;

/// Fuzzer-chosen pattern and placements for one bot.
#[derive(Arbitrary, Debug, Clone)]
struct BotPlan {
    /// Starting pattern offsets (wrapped into the pattern box).
    pattern: Vec<(u8, u8)>,
    /// One optional placement per step.
    script: Vec<Option<Vec<(i16, i16)>>>,
    /// Fail instead of deciding on this step.
    fail_at: Option<u8>,
}

struct Scripted {
    name: String,
    plan: BotPlan,
}

impl Bot for Scripted {
    fn name(&self) -> &str {
        &self.name
    }

    fn pattern(&self) -> Pattern {
        let mut cells: Vec<(usize, usize)> = self
            .plan
            .pattern
            .iter()
            .map(|&(x, y)| (usize::from(x % 6), usize::from(y % 6)))
            .collect();
        cells.sort_unstable();
        cells.dedup();
        Pattern::new(cells)
    }

    fn decide(&mut self, ctx: &BotContext<'_>) -> Result<Option<Placement>, BotError> {
        if self.plan.fail_at.map(u32::from) == Some(ctx.iteration) {
            return Err(BotError::Failed("scripted failure".to_string()));
        }
        let step = ctx.iteration as usize;
        Ok(self.plan.script.get(step).cloned().flatten().map(|cells| {
            Placement::from_cells(cells.into_iter().map(|(x, y)| (i64::from(x), i64::from(y))))
        }))
    }
}

/// Structured input for whole-match fuzzing.
#[derive(Arbitrary, Debug)]
struct MatchInput {
    bots: Vec<BotPlan>,
    iterations: u8,
    additional_tokens: u8,
    seed: u64,
    confine: bool,
}

fuzz_target!(|input: MatchInput| {
    let bots: Vec<Box<dyn Bot>> = input
        .bots
        .into_iter()
        .take(4)
        .enumerate()
        .map(|(i, plan)| Box::new(Scripted { name: format!("bot{i}"), plan }) as Box<dyn Bot>)
        .collect();
    let config = MatchConfig {
        nx: 24,
        ny: 24,
        npatches: (2, 2),
        pattern_size: (6, 6),
        iterations: u32::from(input.iterations % 32),
        initial_tokens: 40,
        additional_tokens: u32::from(input.additional_tokens),
        threads: 1,
        safe: true,
        seed: input.seed,
        confine_to_patch: input.confine,
        ..MatchConfig::default()
    };

    // Empty patterns and rosters are rejected at setup
    let Ok(game) = Match::new(config, bots, 0) else {
        return;
    };
    let result = game
        .run_with(|game| {
            for player in game.players() {
                assert_eq!(player.ncells() as usize, game.board().count(player.number));
            }
        })
        .expect("safe mode never faults");

    for player in &result.players {
        assert_eq!(player.history.len(), result.steps as usize + 1);
        assert_eq!(Some(&player.score), player.history.last());
        assert_eq!(Some(player.peak), player.history.iter().copied().max());
    }
});
