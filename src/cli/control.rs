//! Control command implementation.

use super::{CliError, ControlAction};
use cholerama::shared::SharedState;
use std::path::Path;
use tracing::info;

/// Execute the control command.
///
/// # Errors
///
/// Returns an error if the region cannot be attached or the match is over.
pub(crate) fn execute(region: &Path, action: ControlAction) -> Result<(), CliError> {
    let shared = SharedState::attach(region)?;
    let flow = shared.flow();
    if flow.is_finished() {
        return Err(CliError::new(format!("match in {} has already finished", region.display())));
    }

    match action {
        ControlAction::Pause => flow.set_paused(true),
        ControlAction::Resume => flow.set_paused(false),
        ControlAction::Stop => flow.request_exit(),
    }
    info!(region = %region.display(), ?action, step = shared.progress(), "flag raised");
    println!("{action:?} sent at step {}", shared.progress());
    Ok(())
}
