//! Terminal output helpers: tables, spinners, status styling.

use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::domain::models::run::{RunState, RunStatus};

/// Spinner shown while a run is in flight. Hidden when stderr is not a
/// terminal so piped output stays clean.
pub fn create_spinner(message: impl Into<String>) -> ProgressBar {
    if !console::Term::stderr().is_term() {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .expect("static template is valid"),
    );
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Render run states as a table, newest first.
pub fn runs_table(runs: &[RunState]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["RUN ID", "PROCESS", "STATUS", "STARTED", "UPDATED"]);

    for run in runs {
        table.add_row(vec![
            Cell::new(run.run_id),
            Cell::new(&run.process_id),
            Cell::new(styled_status(run.status)),
            Cell::new(run.started_at.format("%Y-%m-%d %H:%M:%S")),
            Cell::new(run.updated_at.format("%Y-%m-%d %H:%M:%S")),
        ]);
    }
    table
}

/// Status string with terminal coloring.
pub fn styled_status(status: RunStatus) -> String {
    let text = status.as_str();
    match status {
        RunStatus::Completed => style(text).green().to_string(),
        RunStatus::Failed => style(text).red().to_string(),
        RunStatus::Canceled => style(text).dim().to_string(),
        RunStatus::Suspended => style(text).yellow().to_string(),
        RunStatus::Running => style(text).cyan().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_runs_table_has_all_rows() {
        let runs = vec![
            RunState::new(Uuid::new_v4(), "air-permit-application"),
            RunState::new(Uuid::new_v4(), "proteomics-pipeline"),
        ];
        let rendered = runs_table(&runs).to_string();
        assert!(rendered.contains("air-permit-application"));
        assert!(rendered.contains("proteomics-pipeline"));
        assert!(rendered.contains("RUN ID"));
    }
}
