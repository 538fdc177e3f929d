//! claims-sim - command line front end for the claims simulator
//!
//! Each invocation builds a fresh (seeded) simulator, runs one command and
//! prints JSON to stdout. Diagnostic headers and logs go to stderr.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use claims_bridge::config::{ENV_DOCUMENT_DIR, ENV_STORE_PATH};
use claims_bridge::{
    parse_payload, BridgeConfig, ClaimStore, ClaimUpdate, Gateway, GatewayReply, JsonDirSource, NewClaimRecord,
    ReplyStatus,
};
use claims_engine::{ClaimsSimulator, RuleDraft, SimulatorConfig, Stage};

/// Command-line arguments for claims-sim
#[derive(Parser, Debug)]
#[command(name = "claims-sim")]
#[command(about = "Deterministic healthcare claims lifecycle simulator")]
#[command(version)]
struct Args {
    /// Claim tracking database
    #[arg(long, global = true, env = ENV_STORE_PATH)]
    store: Option<PathBuf>,

    /// Directory of `<collection>.json` exports
    #[arg(long, global = true, env = ENV_DOCUMENT_DIR)]
    documents: Option<PathBuf>,

    /// Start with an empty rule store
    #[arg(long, global = true)]
    no_seed: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a JSON or CSV payload (single or batch) at a stage
    Resolve {
        #[arg(long)]
        stage: Stage,
        /// Payload file; stdin when omitted
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Fetch a stored document and resolve it at eligibility
    Fetch {
        #[arg(long)]
        collection: Option<String>,
        #[arg(long, requires = "value")]
        field: Option<String>,
        #[arg(long, requires = "field")]
        value: Option<String>,
    },
    /// Remittance status for a claim reference
    Remittance { claim_ref_id: String },
    /// Dump the unique index
    Index,
    /// List rules
    Rules {
        #[arg(long)]
        stage: Option<Stage>,
    },
    /// List rule reference examples
    ReferenceExamples {
        #[arg(long)]
        stage: Option<Stage>,
    },
    /// Create a rule from a JSON draft and resolve its reference example
    AddRule {
        /// Draft file; stdin when omitted
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Most recent audit events
    Events {
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Show how a document's composite key is computed
    Composite {
        #[arg(long)]
        stage: Stage,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Claim tracking records
    Track {
        #[command(subcommand)]
        action: TrackAction,
    },
}

#[derive(Subcommand, Debug)]
enum TrackAction {
    Create {
        #[arg(long)]
        id: String,
        #[arg(long)]
        member_id: Option<String>,
        #[arg(long)]
        claim_id: Option<String>,
        #[arg(long)]
        stage: Option<String>,
        /// JSON file stored as the last payload
        #[arg(long)]
        payload: Option<PathBuf>,
    },
    Get {
        #[arg(long)]
        id: String,
    },
    Update {
        #[arg(long)]
        id: String,
        #[arg(long)]
        stage: Option<String>,
        #[arg(long)]
        payload: Option<PathBuf>,
        #[arg(long)]
        note: Option<String>,
    },
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();

    let mut config = BridgeConfig::from_env().context("Failed to read bridge configuration")?;
    if let Some(store) = args.store {
        config.store_path = store;
    }
    if let Some(dir) = args.documents {
        config.document_dir = dir;
    }
    if args.no_seed {
        config.seed_on_start = false;
    }

    let simulator = Arc::new(ClaimsSimulator::new(SimulatorConfig::default()));
    if config.seed_on_start {
        let installed = simulator.seed_all();
        info!("Seeded {} rules", installed);
    }

    let gateway = Gateway::new(
        Arc::clone(&simulator),
        Box::new(JsonDirSource::new(config.document_dir.clone())),
        config.clone(),
    );

    match args.command {
        Command::Resolve { stage, file } => {
            let body = read_input(file.as_deref())?;
            let reply = gateway.submit(stage, &body)?;
            emit_reply(&reply)
        }
        Command::Fetch { collection, field, value } => {
            let reply = gateway.fetch_eligibility(collection.as_deref(), field.as_deref(), value.as_deref());
            emit_reply(&reply)
        }
        Command::Remittance { claim_ref_id } => emit_reply(&gateway.remittance(&claim_ref_id)),
        Command::Index => print_json(&simulator.list_index_entries()),
        Command::Rules { stage } => print_json(&simulator.list_rules(stage)),
        Command::ReferenceExamples { stage } => print_json(&simulator.list_reference_examples(stage)),
        Command::AddRule { file } => {
            let draft = RuleDraft::from_json(read_json(file.as_deref())?)?;
            let rule = simulator.create_rule(draft);
            let check = simulator.resolve(rule.stage, &rule.reference_example);
            print_json(&serde_json::json!({
                "rule": rule,
                "reference_example_resolves": check.rule_id.as_ref() == Some(&rule.id),
            }))
        }
        Command::Events { limit } => print_json(&simulator.tail_events(limit)),
        Command::Composite { stage, file } => {
            let document = read_json(file.as_deref())?;
            print_json(&simulator.compute_composite(stage, &document)?)
        }
        Command::Track { action } => run_track(&config, action),
    }
}

fn run_track(config: &BridgeConfig, action: TrackAction) -> Result<ExitCode> {
    let store = ClaimStore::open(&config.store_path)
        .with_context(|| format!("Failed to open claim store at {}", config.store_path.display()))?;

    match action {
        TrackAction::Create { id, member_id, claim_id, stage, payload } => {
            let last_payload = payload.as_deref().map(|p| read_json(Some(p))).transpose()?;
            let record = store.create(NewClaimRecord {
                id,
                member_id,
                claim_id,
                current_stage: stage,
                last_payload,
            })?;
            print_json(&record)
        }
        TrackAction::Get { id } => match store.resume(&id)? {
            Some(record) => print_json(&record),
            None => {
                eprintln!("claim record not found: {}", id);
                Ok(ExitCode::FAILURE)
            }
        },
        TrackAction::Update { id, stage, payload, note } => {
            let last_payload = payload.as_deref().map(|p| read_json(Some(p))).transpose()?;
            let record = store.update(
                &id,
                ClaimUpdate {
                    current_stage: stage,
                    last_payload,
                    note,
                },
            )?;
            print_json(&record)
        }
    }
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut body = String::new();
            io::stdin().read_to_string(&mut body).context("Failed to read stdin")?;
            Ok(body)
        }
    }
}

/// Input parsed the same way request bodies are.
fn read_json(file: Option<&Path>) -> Result<Value> {
    Ok(parse_payload(&read_input(file)?)?)
}

fn emit_reply(reply: &GatewayReply) -> Result<ExitCode> {
    eprintln!("status: {}", reply.status.http_code());
    if let Some((name, value)) = &reply.header {
        eprintln!("{}: {}", name, value);
    }
    print_json(&reply.body)?;
    Ok(match reply.status {
        ReplyStatus::Ok => ExitCode::SUCCESS,
        ReplyStatus::NotFound => ExitCode::FAILURE,
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(ExitCode::SUCCESS)
}
