//! `foreman show` - display one run's state and journal tail.

use anyhow::{bail, Context, Result};
use console::style;
use std::path::Path;

use crate::cli::output::styled_status;
use crate::cli::types::ShowArgs;
use crate::domain::models::config::Config;
use crate::domain::models::event::JournalEntry;
use crate::domain::models::run::RunState;
use crate::services::journal::{JOURNAL_FILE, STATE_FILE};

pub async fn execute(args: ShowArgs, json: bool, config: Config) -> Result<()> {
    let run_dir = Path::new(&config.storage.root).join(args.run_id.to_string());
    if !run_dir.is_dir() {
        bail!("no run directory for {}", args.run_id);
    }

    let state: RunState = serde_json::from_slice(
        &tokio::fs::read(run_dir.join(STATE_FILE))
            .await
            .context("failed to read run state")?,
    )
    .context("failed to parse run state")?;

    let journal = read_journal_tail(&run_dir, args.tail).await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "state": state,
                "journal": journal,
            }))?
        );
        return Ok(());
    }

    println!("{} {}", style("run").bold(), state.run_id);
    println!("{} {}", style("process").bold(), state.process_id);
    println!("{} {}", style("status").bold(), styled_status(state.status));
    println!("{} {}", style("started").bold(), state.started_at);
    println!("{} {}", style("updated").bold(), state.updated_at);

    if !journal.is_empty() {
        println!("\n{}", style("journal").bold());
        for entry in &journal {
            println!(
                "  {} {} {} {}",
                style(&entry.id).dim(),
                entry.timestamp.format("%H:%M:%S"),
                entry.event,
                style(entry.data.to_string()).dim(),
            );
        }
    }
    Ok(())
}

async fn read_journal_tail(run_dir: &Path, tail: usize) -> Result<Vec<JournalEntry>> {
    let raw = match tokio::fs::read_to_string(run_dir.join(JOURNAL_FILE)).await {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };

    let entries: Vec<JournalEntry> = raw
        .lines()
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect();
    let skip = entries.len().saturating_sub(tail);
    Ok(entries.into_iter().skip(skip).collect())
}
