//! Arborist: the care journal for a garden's cutting and watering robots.
//!
//! Robots ask the journal how much care is still due, act, and append what they
//! did. Operators audit the same journal for entries written out of time order
//! and for days or weeks whose totals left the allowed range.
//!
//! # Architecture
//!
//! - **Store**: one directory holding `journal.db`, the broker trail
//!   `journal.events.jsonl` and an optional `arborist.toml`.
//! - **Gateway**: the only code that speaks SQL; sums, per-day and per-week
//!   grouping, inserts and sorted scans over the `CutJournal` and `WaterJournal`
//!   collections.
//! - **Journal**: facade composing the gateway with the quota and audit engines.
//! - **Agents**: `WaterAgent` and `CutAgent`, driven one cycle per invocation.
//!
//! Days are UTC calendar dates. Weeks start on Monday 00:00 UTC.
//!
//! # Concurrency
//!
//! A quota check and the insert that follows it are separate calls. Two robots
//! running at once can both see quota left and both record, overshooting the cap.
//! The journal reports such overshoots through `audit water` / `audit cuts`; it
//! does not prevent them.
//!
//! # Examples
//!
//! ```bash
//! arborist init
//! arborist water --robot-id w1 --capacity 5
//! arborist cut --robot-id c1
//! arborist audit ordering --format json
//! arborist last --action water -n 5
//! ```

pub mod core;
pub mod plugins;

use crate::core::{
    broker, config, db,
    entry::JournalEntry,
    error,
    store::Store,
    time,
};
use crate::plugins::{
    agents::{CutOutcome, WaterAgent, WaterOutcome},
    audit::{self, AuditCli, AuditCommand},
    cycles,
    journal::{self, Journal},
};

use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "arborist",
    version = env!("CARGO_PKG_VERSION"),
    about = "Care journal for the cutting and watering robots"
)]
struct Cli {
    /// Store root (defaults to $ARBORIST_HOME, then ./.arborist).
    #[clap(long, global = true)]
    root: Option<PathBuf>,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the store, its journal tables and a default arborist.toml
    Init,

    /// Run one cut cycle
    Cut {
        #[clap(long)]
        robot_id: String,
    },

    /// Run one water cycle (refills once if the tank runs short)
    Water {
        #[clap(long)]
        robot_id: String,
        /// Tank capacity in liters.
        #[clap(long)]
        capacity: f64,
    },

    /// Show what is still due today and this week
    Quota {
        /// Output format: 'text' or 'json'.
        #[clap(long, default_value = "text")]
        format: String,
    },

    /// Ordering and range audits
    Audit(AuditCli),

    /// Show the most recent journal entries for one action
    Last {
        /// Action: 'cut' or 'water'.
        #[clap(long)]
        action: String,
        #[clap(short, long, default_value_t = journal::DEFAULT_LAST_N)]
        n: usize,
        /// Output format: 'text' or 'json'.
        #[clap(long, default_value = "text")]
        format: String,
    },

    /// Show the journal write trail
    Trail {
        #[clap(short, long, default_value_t = 20)]
        n: usize,
    },

    /// Print the command schemas as JSON
    Schema,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

fn parse_format(raw: &str) -> Result<OutputFormat, error::ArboristError> {
    match raw {
        "text" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        other => Err(error::ArboristError::InvalidConfiguration(format!(
            "Unknown format '{}'. Should be one of text, json",
            other
        ))),
    }
}

pub fn run() -> Result<(), error::ArboristError> {
    let cli = Cli::parse();
    let current_dir = std::env::current_dir()?;
    let store = Store::resolve(cli.root.as_deref(), &current_dir);

    match cli.command {
        Command::Init => run_init(&store),
        Command::Schema => {
            let schemas = serde_json::json!([
                broker::schema(),
                cycles::schema(),
                audit::schema(),
            ]);
            println!("{}", serde_json::to_string_pretty(&schemas)?);
            Ok(())
        }
        Command::Trail { n } => {
            let events = broker::read_events(&store.root)?;
            let skip = events.len().saturating_sub(n);
            for ev in events.iter().skip(skip) {
                println!("{} {} {} {} {}", ev.ts, ev.actor, ev.op, ev.db_id, ev.status);
            }
            Ok(())
        }
        Command::Cut { robot_id } => run_cut(&Journal::open(&store)?, &robot_id),
        Command::Water { robot_id, capacity } => {
            run_water(&Journal::open(&store)?, &robot_id, capacity)
        }
        Command::Quota { format } => run_quota(&Journal::open(&store)?, parse_format(&format)?),
        Command::Audit(audit_cli) => run_audit(&Journal::open(&store)?, audit_cli),
        Command::Last { action, n, format } => run_last(
            &Journal::open(&store)?,
            &action,
            n,
            parse_format(&format)?,
        ),
    }
}

fn run_init(store: &Store) -> Result<(), error::ArboristError> {
    let db_path = db::initialize_journal_db(&store.root)?;
    let wrote_config = config::write_default_config(&store.root)?;
    println!(
        "{} Journal ready at {}",
        "✓".bright_green(),
        db_path.display()
    );
    if wrote_config {
        println!(
            "  {} default limits written to {}",
            "▸".bright_cyan(),
            config::config_path(&store.root).display()
        );
    }
    Ok(())
}

fn run_cut(journal: &Journal, robot_id: &str) -> Result<(), error::ArboristError> {
    match cycles::run_cut_cycle(journal, robot_id, Utc::now())? {
        CutOutcome::Cut { entry } => println!(
            "{} {} cut {} branches",
            "✓".bright_green(),
            entry.robot_id,
            entry.amount
        ),
        CutOutcome::NothingToDo => println!("{} No branches to cut", "▸".bright_cyan()),
    }
    Ok(())
}

fn run_water(
    journal: &Journal,
    robot_id: &str,
    capacity: f64,
) -> Result<(), error::ArboristError> {
    let mut agent = WaterAgent::new(robot_id, capacity)?;
    let report = cycles::run_water_cycle(journal, &mut agent, Utc::now())?;
    if report.refilled {
        eprintln!(
            "{} tank ran short, refilled to {}l",
            "⚠".bright_yellow(),
            agent.tank_capacity()
        );
    }
    match report.outcome {
        WaterOutcome::Watered { entry } => println!(
            "{} {} poured {}l, {}l left in tank",
            "✓".bright_green(),
            entry.robot_id,
            entry.amount,
            agent.water_level()
        ),
        WaterOutcome::AlreadySatisfied => {
            println!("{} Tree is already watered", "▸".bright_cyan())
        }
        WaterOutcome::InsufficientSupply {
            required,
            available,
        } => {
            return Err(error::ArboristError::InsufficientSupply {
                required,
                available,
            });
        }
    }
    Ok(())
}

fn run_quota(journal: &Journal, format: OutputFormat) -> Result<(), error::ArboristError> {
    let now = Utc::now();
    let water = journal.water_quota(now)?;
    let cuts = journal.cut_quota(now)?;
    match format {
        OutputFormat::Json => {
            let envelope = time::command_envelope(
                "quota",
                "ok",
                serde_json::json!({ "water_remaining": water, "cuts_remaining": cuts }),
            );
            println!("{}", serde_json::to_string_pretty(&envelope)?);
        }
        OutputFormat::Text => {
            println!("Water still due today: {}l", water);
            println!("Branches still due this week: {}", cuts);
        }
    }
    Ok(())
}

fn run_audit(journal: &Journal, cli: AuditCli) -> Result<(), error::ArboristError> {
    let format = parse_format(&cli.format)?;
    let (cmd, extra, lines) = match cli.command {
        AuditCommand::Ordering => {
            let report = journal.audit_ordering()?;
            let lines = report
                .iter()
                .flat_map(|(collection, ids)| {
                    ids.iter().map(move |id| format!("{}: {}", collection, id))
                })
                .collect::<Vec<_>>();
            (
                "audit.ordering",
                serde_json::json!({ "anomalies": report }),
                lines,
            )
        }
        AuditCommand::Water => {
            let anomalies = journal.audit_water()?;
            let lines = anomalies
                .iter()
                .map(|day| format!("{}: {}l", day.date, day.amount))
                .collect::<Vec<_>>();
            (
                "audit.water",
                serde_json::json!({ "anomalies": anomalies }),
                lines,
            )
        }
        AuditCommand::Cuts => {
            let anomalies = journal.audit_cuts()?;
            let lines = anomalies
                .iter()
                .map(|week| {
                    format!(
                        "week {} (from {}): {} branches",
                        week.week_number, week.week_start, week.amount
                    )
                })
                .collect::<Vec<_>>();
            (
                "audit.cuts",
                serde_json::json!({ "anomalies": anomalies }),
                lines,
            )
        }
    };

    match format {
        OutputFormat::Json => {
            let status = if lines.is_empty() { "ok" } else { "anomalies" };
            let envelope = time::command_envelope(cmd, status, extra);
            println!("{}", serde_json::to_string_pretty(&envelope)?);
        }
        OutputFormat::Text if lines.is_empty() => {
            println!("{} No anomalies", "✓".bright_green());
        }
        OutputFormat::Text => {
            for line in lines {
                println!("{} {}", "✗".bright_red(), line);
            }
        }
    }
    Ok(())
}

fn run_last(
    journal: &Journal,
    action: &str,
    n: usize,
    format: OutputFormat,
) -> Result<(), error::ArboristError> {
    let entries: Vec<JournalEntry> = journal.last_n_by_name(action, n)?;
    match format {
        OutputFormat::Json => {
            let envelope = time::command_envelope(
                "last",
                "ok",
                serde_json::json!({
                    "action": action.to_ascii_lowercase(),
                    "entries": entries
                }),
            );
            println!("{}", serde_json::to_string_pretty(&envelope)?);
        }
        OutputFormat::Text => {
            for entry in &entries {
                println!("{}", entry);
            }
        }
    }
    Ok(())
}
