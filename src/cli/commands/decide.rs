//! `foreman decide` - record a breakpoint decision for a suspended run.

use anyhow::{bail, Context, Result};
use std::path::Path;
use uuid::Uuid;

use crate::adapters::decisions::file::{decision_path, request_path};
use crate::adapters::store::FsArtifactStore;
use crate::cli::types::DecideArgs;
use crate::domain::models::breakpoint::Decision;
use crate::domain::models::config::Config;
use crate::domain::ports::store::ArtifactStore;

pub async fn execute(args: DecideArgs, json: bool, config: Config) -> Result<()> {
    let run_dir = Path::new(&config.storage.root).join(args.run_id.to_string());
    if !run_dir.is_dir() {
        bail!("no run directory for {}", args.run_id);
    }
    let store = FsArtifactStore::open(run_dir);

    let breakpoint_id = match args.breakpoint {
        Some(id) => id,
        None => sole_pending_breakpoint(&store).await?,
    };
    if !store.exists(&request_path(breakpoint_id)).await {
        bail!("run {} has no breakpoint {}", args.run_id, breakpoint_id);
    }
    if store.exists(&decision_path(breakpoint_id)).await {
        bail!("breakpoint {breakpoint_id} already has a decision");
    }

    let mut decision = if args.approve {
        Decision::approve()
    } else if args.reject {
        Decision::reject(args.note.clone().unwrap_or_default())
    } else {
        let payload = args
            .amend
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .context("--amend payload must be valid JSON")?
            .unwrap_or(serde_json::Value::Null);
        Decision::amend(payload)
    };
    if let Some(note) = args.note {
        decision = decision.with_note(note);
    }

    store
        .write_json(
            &decision_path(breakpoint_id),
            &serde_json::to_value(&decision)?,
        )
        .await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "run_id": args.run_id,
                "breakpoint_id": breakpoint_id,
                "decision": decision,
            }))?
        );
    } else {
        println!(
            "recorded {} for breakpoint {breakpoint_id}",
            decision.verdict.as_str()
        );
    }
    Ok(())
}

/// Find the single undecided breakpoint, or fail with guidance.
async fn sole_pending_breakpoint(store: &FsArtifactStore) -> Result<Uuid> {
    let breakpoints_dir = store.root().join("breakpoints");
    let mut pending = Vec::new();

    let mut entries = tokio::fs::read_dir(&breakpoints_dir)
        .await
        .context("run has no breakpoints")?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let Some(stem) = name.strip_suffix(".json") else {
            continue;
        };
        if stem.ends_with(".decision") {
            continue;
        }
        let Ok(id) = stem.parse::<Uuid>() else {
            continue;
        };
        if !store.exists(&decision_path(id)).await {
            pending.push(id);
        }
    }

    match pending.as_slice() {
        [] => bail!("no pending breakpoints"),
        [only] => Ok(*only),
        many => bail!(
            "multiple pending breakpoints; specify one of: {}",
            many.iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}
