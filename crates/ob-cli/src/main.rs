//! # obctl entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ob_cli::report::{run_report, ReportArgs};
use ob_cli::state::{run_state, StateArgs};

/// Omgevingsbeleid publication toolchain.
///
/// Upgrades and inspects stored environment states and parses LVBB
/// reports without going through the API.
#[derive(Parser, Debug)]
#[command(name = "obctl", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upgrade or inspect a stored environment state.
    State(StateArgs),

    /// Parse LVBB reports.
    Report(ReportArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::State(args) => run_state(&args),
        Commands::Report(args) => run_report(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use ob_cli::report::{CurrentStatus, ReportCommand};
    use ob_cli::state::StateCommand;
    use ob_cli::OutputFormat;

    #[test]
    fn cli_parse_state_upgrade() {
        let cli = Cli::try_parse_from([
            "obctl", "state", "upgrade", "state.json", "--out", "v5.json",
        ])
        .unwrap();
        let Commands::State(args) = cli.command else {
            panic!("expected state command");
        };
        let StateCommand::Upgrade { input, out, environment } = args.command else {
            panic!("expected upgrade");
        };
        assert_eq!(input, PathBuf::from("state.json"));
        assert_eq!(out, Some(PathBuf::from("v5.json")));
        assert!(environment.is_none());
    }

    #[test]
    fn cli_parse_state_inspect_yaml() {
        let cli =
            Cli::try_parse_from(["obctl", "state", "inspect", "s.json", "--format", "yaml"])
                .unwrap();
        let Commands::State(args) = cli.command else {
            panic!("expected state command");
        };
        assert!(matches!(
            args.command,
            StateCommand::Inspect { format: OutputFormat::Yaml, .. }
        ));
    }

    #[test]
    fn cli_parse_report_defaults_to_pending() {
        let cli = Cli::try_parse_from(["obctl", "report", "parse", "a.xml", "b.xml"]).unwrap();
        let Commands::Report(args) = cli.command else {
            panic!("expected report command");
        };
        let ReportCommand::Parse { files, current, .. } = args.command;
        assert_eq!(files.len(), 2);
        assert_eq!(current, CurrentStatus::Pending);
    }

    #[test]
    fn cli_parse_report_requires_files() {
        assert!(Cli::try_parse_from(["obctl", "report", "parse"]).is_err());
    }

    #[test]
    fn cli_parse_verbose_levels() {
        let cli = Cli::try_parse_from(["obctl", "-vv", "report", "parse", "a.xml"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn cli_parse_no_subcommand_errors() {
        assert!(Cli::try_parse_from(["obctl"]).is_err());
    }
}
