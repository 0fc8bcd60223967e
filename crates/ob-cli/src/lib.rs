//! # ob-cli: Operator CLI for the Publication Stack
//!
//! Provides the `obctl` command-line interface for work that happens next
//! to the API rather than through it.
//!
//! ## Subcommands
//!
//! - `obctl state upgrade`: Walk a stored environment state up to the current schema.
//! - `obctl state inspect`: Summarise the acts and announcements in a stored state.
//! - `obctl report parse`: Parse LVBB reports and fold them into a package status.
//!
//! ```bash
//! obctl state upgrade state-v3.json --out state-v5.json
//! obctl state inspect state-v5.json --format yaml
//! obctl report parse --current pending report-1.xml report-2.xml
//! ```

pub mod report;
pub mod state;

use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;

/// Output format for commands that print a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

/// Render `value` in the requested format.
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(value).context("failed to render JSON output")
        }
        OutputFormat::Yaml => serde_yaml::to_string(value).context("failed to render YAML output"),
    }
}

/// Read a file to a string, naming the path on failure.
pub fn read_input(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_input_names_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.json");
        let err = read_input(&missing).unwrap_err();
        assert!(format!("{err:#}").contains("absent.json"));
    }

    #[test]
    fn render_yaml_and_json() {
        let value = serde_json::json!({"schema_version": 5});
        assert!(render(&value, OutputFormat::Json)
            .unwrap()
            .contains("\"schema_version\": 5"));
        assert!(render(&value, OutputFormat::Yaml)
            .unwrap()
            .contains("schema_version: 5"));
    }
}
