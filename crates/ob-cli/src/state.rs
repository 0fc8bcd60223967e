//! # State Subcommand
//!
//! Offline work on stored environment states. A stored state is the JSON
//! document the API persists: `{"schema_version": n, "data": {...}}`.
//!
//! ## Subcommands
//!
//! - `upgrade`: Load a stored state of any schema version from 2 upwards
//!   and write it back at the current schema version.
//! - `inspect`: Print the acts, announcements and purposes of a state.
//!
//! Schema version 1 states need the original publication data to upgrade
//! and are refused here; the API upgrades them on load.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;
use uuid::Uuid;

use ob_core::{EnvironmentId, WorkKind};
use ob_publication::{StateLoader, StateV5, StateVersionFactory, StoredState};

use crate::{read_input, render, OutputFormat};

/// Arguments for the `obctl state` subcommand.
#[derive(Args, Debug)]
pub struct StateArgs {
    #[command(subcommand)]
    pub command: StateCommand,
}

#[derive(Subcommand, Debug)]
pub enum StateCommand {
    /// Upgrade a stored state to the current schema version.
    Upgrade {
        /// Stored state JSON file.
        input: PathBuf,
        /// Write the upgraded state here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Environment the state belongs to, for log context.
        #[arg(long)]
        environment: Option<Uuid>,
    },

    /// Summarise a stored state.
    Inspect {
        /// Stored state JSON file.
        input: PathBuf,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
}

#[derive(Debug, Serialize, PartialEq)]
pub struct StateSummary {
    pub stored_schema_version: u32,
    pub purposes: Vec<String>,
    pub acts: Vec<ActSummary>,
    pub announcements: Vec<AnnouncementSummary>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ActSummary {
    pub key: String,
    pub expression: String,
    pub bill_expression: String,
    pub werkingsgebieden: usize,
    pub documents: usize,
    pub assets: usize,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct AnnouncementSummary {
    pub key: String,
    pub expression: String,
    pub about_act: String,
}

/// Execute a state subcommand. Returns the process exit code.
pub fn run_state(args: &StateArgs) -> Result<u8> {
    match &args.command {
        StateCommand::Upgrade {
            input,
            out,
            environment,
        } => {
            let stored = read_stored(input)?;
            let environment = environment.map(EnvironmentId::from).unwrap_or_default();
            let upgraded = upgrade_stored(environment, &stored)?;
            let rendered = serde_json::to_string_pretty(&upgraded)?;
            match out {
                Some(path) => {
                    std::fs::write(path, rendered)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    tracing::info!(
                        from = stored.schema_version,
                        to = upgraded.schema_version,
                        out = %path.display(),
                        "state upgraded"
                    );
                }
                None => println!("{rendered}"),
            }
            Ok(0)
        }
        StateCommand::Inspect { input, format } => {
            let stored = read_stored(input)?;
            let state = load(EnvironmentId::new(), &stored)?;
            let summary = summarise(stored.schema_version, &state);
            println!("{}", render(&summary, *format)?);
            Ok(0)
        }
    }
}

fn read_stored(path: &std::path::Path) -> Result<StoredState> {
    let content = read_input(path)?;
    serde_json::from_str(&content)
        .with_context(|| format!("{} is not a stored environment state", path.display()))
}

fn load(environment: EnvironmentId, stored: &StoredState) -> Result<StateV5> {
    let loader = StateLoader::new(StateVersionFactory::offline());
    loader
        .load(environment, stored)
        .with_context(|| format!("failed to load state at schema version {}", stored.schema_version))
}

/// Load `stored` and re-serialise it at the current schema version.
pub fn upgrade_stored(environment: EnvironmentId, stored: &StoredState) -> Result<StoredState> {
    let state = load(environment, stored)?;
    Ok(state.to_stored()?)
}

pub fn summarise(stored_schema_version: u32, state: &StateV5) -> StateSummary {
    StateSummary {
        stored_schema_version,
        purposes: state.purposes.keys().cloned().collect(),
        acts: state
            .acts
            .iter()
            .map(|(key, act)| ActSummary {
                key: key.clone(),
                expression: act.act_frbr.expression(WorkKind::Act),
                bill_expression: act.bill_frbr.expression(WorkKind::Bill),
                werkingsgebieden: act.werkingsgebieden.len(),
                documents: act.documents.len(),
                assets: act.assets.len(),
            })
            .collect(),
        announcements: state
            .announcements
            .iter()
            .map(|(key, announcement)| AnnouncementSummary {
                key: key.clone(),
                expression: announcement.doc_frbr.expression(WorkKind::Doc),
                about_act: announcement.about_act_frbr.expression(WorkKind::Act),
            })
            .collect(),
    }
}
