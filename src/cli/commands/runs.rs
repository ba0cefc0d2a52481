//! `foreman runs` - list recorded runs.

use anyhow::Result;
use std::path::Path;

use crate::cli::output::runs_table;
use crate::cli::types::RunsArgs;
use crate::domain::models::config::Config;
use crate::domain::models::run::RunState;
use crate::services::journal::STATE_FILE;

pub async fn execute(args: RunsArgs, json: bool, config: Config) -> Result<()> {
    let mut runs = collect_runs(Path::new(&config.storage.root)).await?;

    if let Some(status) = &args.status {
        runs.retain(|run| run.status.as_str() == status.to_lowercase());
    }
    runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
    runs.truncate(args.limit);

    if json {
        println!("{}", serde_json::to_string_pretty(&runs)?);
    } else if runs.is_empty() {
        println!("no runs recorded");
    } else {
        println!("{}", runs_table(&runs));
    }
    Ok(())
}

/// Read every `<root>/<run_id>/state.json`, skipping unreadable entries.
async fn collect_runs(root: &Path) -> Result<Vec<RunState>> {
    let mut runs = Vec::new();
    let mut entries = match tokio::fs::read_dir(root).await {
        Ok(entries) => entries,
        // No storage root yet simply means no runs.
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(runs),
        Err(err) => return Err(err.into()),
    };

    while let Some(entry) = entries.next_entry().await? {
        let state_path = entry.path().join(STATE_FILE);
        let Ok(raw) = tokio::fs::read(&state_path).await else {
            continue;
        };
        match serde_json::from_slice::<RunState>(&raw) {
            Ok(state) => runs.push(state),
            Err(err) => {
                tracing::warn!(
                    path = %state_path.display(),
                    error = %err,
                    "skipping unparseable run state"
                );
            }
        }
    }
    Ok(runs)
}
