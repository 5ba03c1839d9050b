//! Clean command - remove checkpoint records for a topic.

use crate::checkpoint::{Checkpointer, FsCheckpointStore};
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;
use std::sync::Arc;

/// Run the clean command.
pub async fn run_clean(topic: &str, qa_rounds: Option<usize>, settings: Settings) -> Result<()> {
    let qa_rounds = qa_rounds.unwrap_or(settings.script.qa_rounds);
    let store = Arc::new(FsCheckpointStore::new(settings.checkpoint_dir()));
    let checkpointer = Checkpointer::new(store, topic, qa_rounds);

    let removed = checkpointer.clean().await?;

    if removed == 0 {
        Output::info(&format!(
            "No checkpoint records found for \"{}\" ({} rounds)",
            topic, qa_rounds
        ));
    } else {
        Output::success(&format!(
            "Removed {} checkpoint record(s) for \"{}\" ({} rounds)",
            removed, topic, qa_rounds
        ));
    }

    Ok(())
}
