//! Watch command implementation - read-only progress viewer.

use super::CliError;
use cholerama::shared::SharedState;
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt::Write;
use std::path::Path;
use std::thread;
use std::time::Duration;

/// Execute the watch command.
///
/// Polls the region until the engine marks the match finished.
///
/// # Errors
///
/// Returns an error if the region cannot be attached.
pub(crate) fn execute(region: &Path, interval: u64) -> Result<(), CliError> {
    let shared = SharedState::attach(region)?;
    let (nx, ny) = shared.dimensions();
    println!(
        "Watching {} ({nx}x{ny}, {} players, {} steps)",
        region.display(),
        shared.players(),
        shared.iterations()
    );

    let pb = ProgressBar::new(u64::from(shared.iterations()));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} steps {msg}")?
            .progress_chars("=>-"),
    );

    let delay = Duration::from_millis(interval.max(1));
    loop {
        pb.set_position(u64::from(shared.progress()));
        let mut msg = live_summary(&shared.live_cells());
        if shared.flow().is_paused() {
            msg.push_str(" (paused)");
        }
        pb.set_message(msg);

        if shared.flow().is_finished() {
            break;
        }
        thread::sleep(delay);
    }
    pb.finish_with_message("finished");

    let tokens = shared.tokens();
    for (slot, cells) in shared.live_cells().iter().enumerate() {
        let balance = tokens.get(slot).copied().unwrap_or(0);
        println!("  Player {}: {cells} cells, {balance} tokens", slot + 1);
    }
    Ok(())
}

/// `1:120 2:87 ...`
fn live_summary(cells: &[u32]) -> String {
    let mut out = String::new();
    for (slot, n) in cells.iter().enumerate() {
        if slot > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{}:{n}", slot + 1);
    }
    out
}
