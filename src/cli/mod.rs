//! Command-line interface.

pub mod commands;
pub mod output;
pub mod types;

pub use types::{Cli, Commands};

/// Print a top-level error and exit nonzero.
pub fn handle_error(err: anyhow::Error, json: bool) -> ! {
    if json {
        eprintln!(
            "{}",
            serde_json::json!({"success": false, "error": err.to_string()})
        );
    } else {
        eprintln!("{} {err:#}", console::style("error:").red().bold());
    }
    std::process::exit(1);
}
