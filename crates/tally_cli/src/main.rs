//! Command-line entry point for the local tracker store.
//!
//! # Responsibility
//! - Wire config, logging and the local store together.
//! - Run one tracker operation per invocation and print the result as JSON.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tally_core::{
    init_logging, open_local_store, CompleteEventInput, CompleteRecordInput, CreateEventInput,
    CreateRecordInput, FallbackDispatcher, NoSession, OfflineRemote, TrackerConfig,
};

#[derive(Parser)]
#[command(name = "tally", version, about = "Track events and their counted records")]
struct Cli {
    /// YAML config file (store path and logging).
    #[arg(global = true, long = "config")]
    config: Option<PathBuf>,

    /// Store file; overrides `store_path` from the config.
    #[arg(global = true, long = "store")]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List events, newest first
    List,
    /// Show one event with its record history
    Show { event_id: String },
    /// Create an event with its first record
    Create {
        title: String,
        #[arg(allow_negative_numbers = true)]
        count: f64,
    },
    /// Mark an event as completed
    Complete { event_id: String },
    /// Open a new record on an event without an active one
    Record {
        event_id: String,
        #[arg(allow_negative_numbers = true)]
        count: f64,
    },
    /// Complete the active record
    Finish {
        event_id: String,
        #[arg(
            long = "next",
            allow_negative_numbers = true,
            help = "Open a successor record with this count"
        )]
        next: Option<f64>,
    },
    /// Delete an event and its records
    Delete { event_id: String },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let mut config = match cli.config.as_ref() {
        Some(path) => TrackerConfig::load(path).map_err(|err| err.to_string())?,
        None => TrackerConfig::default(),
    };
    if let Some(store) = cli.store {
        config.store_path = Some(store);
    }
    if let Some(log) = config.log.as_ref() {
        init_logging(log).map_err(|err| err.to_string())?;
    }

    let local = open_local_store(&config).map_err(|err| err.to_string())?;
    let mut tracker = FallbackDispatcher::new(NoSession, OfflineRemote, local);

    match cli.command {
        Command::List => print_json(&tracker.list_events()),
        Command::Show { event_id } => print_json(&tracker.get_event(&event_id)),
        Command::Create { title, count } => {
            print_json(&tracker.create_event(&CreateEventInput::new(title, count)))
        }
        Command::Complete { event_id } => {
            print_json(&tracker.complete_event(&CompleteEventInput { event_id }))
        }
        Command::Record { event_id, count } => {
            print_json(&tracker.create_record(&CreateRecordInput { event_id, count }))
        }
        Command::Finish { event_id, next } => {
            print_json(&tracker.complete_record(&CompleteRecordInput {
                event_id,
                create_next: next.is_some(),
                next_count: next,
            }))
        }
        Command::Delete { event_id } => tracker
            .delete_event(&event_id)
            .map(|()| println!("deleted {event_id}"))
            .map_err(|err| err.to_string()),
    }
}

fn print_json<T: Serialize, E: std::fmt::Display>(result: &Result<T, E>) -> Result<(), String> {
    let value = result.as_ref().map_err(|err| err.to_string())?;
    let text = serde_json::to_string_pretty(value).map_err(|err| err.to_string())?;
    println!("{text}");
    Ok(())
}
