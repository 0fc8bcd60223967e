//! # Report Subcommand
//!
//! Parses LVBB report files the same way the API does on upload, so an
//! operator can see what a report would do to a package before sending it.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand, ValueEnum};
use serde::Serialize;

use ob_publication::parse_report;
use ob_state::{resolve_report_status, ReportOutcome, ReportStatus, RunningStatus};

use crate::{read_input, render, OutputFormat};

#[derive(Args, Debug)]
pub struct ReportArgs {
    #[command(subcommand)]
    pub command: ReportCommand,
}

#[derive(Subcommand, Debug)]
pub enum ReportCommand {
    /// Parse one or more reports and fold them into a package status.
    Parse {
        /// LVBB report XML files, in upload order.
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Report status of the package before these reports.
        #[arg(long, value_enum, default_value_t = CurrentStatus::Pending)]
        current: CurrentStatus,
        /// Delivery id the reports must carry.
        #[arg(long)]
        delivery_id: Option<String>,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CurrentStatus {
    Pending,
    Valid,
    Failed,
}

impl From<CurrentStatus> for ReportStatus {
    fn from(value: CurrentStatus) -> Self {
        match value {
            CurrentStatus::Pending => ReportStatus::Pending,
            CurrentStatus::Valid => ReportStatus::Valid,
            CurrentStatus::Failed => ReportStatus::Failed,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ParsedReports {
    pub reports: Vec<ParsedReport>,
    pub running: RunningStatus,
}

#[derive(Debug, Serialize)]
pub struct ParsedReport {
    pub file: String,
    #[serde(flatten)]
    pub outcome: ReportOutcome,
}

/// Execute a report subcommand.
///
/// Exits 0 when the folded status is not failed, 2 when it is.
pub fn run_report(args: &ReportArgs) -> Result<u8> {
    match &args.command {
        ReportCommand::Parse {
            files,
            current,
            delivery_id,
            format,
        } => {
            let parsed = parse_files(files, (*current).into(), delivery_id.as_deref())?;
            println!("{}", render(&parsed, *format)?);
            Ok(if parsed.running.status == ReportStatus::Failed {
                2
            } else {
                0
            })
        }
    }
}

pub fn parse_files(
    files: &[PathBuf],
    current: ReportStatus,
    delivery_id: Option<&str>,
) -> Result<ParsedReports> {
    let mut reports = Vec::with_capacity(files.len());
    for path in files {
        let content = read_input(path)?;
        let outcome = parse_report(&content)
            .with_context(|| format!("failed to parse report {}", path.display()))?;
        if let Some(expected) = delivery_id {
            if outcome.sub_delivery_id != expected {
                anyhow::bail!(
                    "report {} is for delivery {}, expected {expected}",
                    path.display(),
                    outcome.sub_delivery_id
                );
            }
        }
        tracing::debug!(file = %path.display(), status = %outcome.status, "report parsed");
        reports.push(ParsedReport {
            file: path.display().to_string(),
            outcome,
        });
    }

    let outcomes: Vec<ReportOutcome> = reports.iter().map(|r| r.outcome.clone()).collect();
    let running = resolve_report_status(current, &outcomes);
    Ok(ParsedReports { reports, running })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ob_publication::report::{LVBB_NS, STOP_NS};

    fn report(outcome: &str, delivery_id: &str, published: bool) -> String {
        let code = if published { "DL-0005" } else { "DL-0001" };
        format!(
            r#"<lvbb:verwerkingsverslag xmlns:lvbb="{LVBB_NS}" xmlns:stop="{STOP_NS}">
  <lvbb:uitkomst>{outcome}</lvbb:uitkomst>
  <lvbb:verslag>
    <lvbb:idLevering>{delivery_id}</lvbb:idLevering>
    <lvbb:voortgang>afgerond</lvbb:voortgang>
  </lvbb:verslag>
  <stop:meldingen><stop:melding><stop:code>{code}</stop:code></stop:melding></stop:meldingen>
</lvbb:verwerkingsverslag>"#
        )
    }

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn published_report_settles_valid() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(&dir, "r1.xml", &report("succes", "OZON-1", true));
        let parsed = parse_files(&[file], ReportStatus::Pending, Some("OZON-1")).unwrap();
        assert_eq!(parsed.running.status, ReportStatus::Valid);
        assert!(parsed.running.is_conclusive);
    }

    #[test]
    fn success_without_sub_outcome_stays_pending() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(&dir, "r1.xml", &report("succes", "OZON-1", false));
        let parsed = parse_files(&[file], ReportStatus::Pending, None).unwrap();
        assert_eq!(parsed.running.status, ReportStatus::Pending);
        assert!(!parsed.running.is_conclusive);
    }

    #[test]
    fn failure_exits_two() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(&dir, "r1.xml", &report("fout", "OZON-1", false));
        let args = ReportArgs {
            command: ReportCommand::Parse {
                files: vec![file],
                current: CurrentStatus::Pending,
                delivery_id: None,
                format: OutputFormat::Json,
            },
        };
        assert_eq!(run_report(&args).unwrap(), 2);
    }

    #[test]
    fn delivery_mismatch_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(&dir, "r1.xml", &report("succes", "OZON-2", true));
        let err = parse_files(&[file], ReportStatus::Pending, Some("OZON-1")).unwrap_err();
        assert!(err.to_string().contains("expected OZON-1"));
    }

    #[test]
    fn malformed_xml_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(&dir, "broken.xml", "<lvbb:uitkomst>");
        let err = parse_files(&[file], ReportStatus::Pending, None).unwrap_err();
        assert!(err.to_string().contains("broken.xml"));
    }
}
