//! Parley CLI - replay a recorded vendor stream through a token-budgeted session.
//!
//! ```text
//! parley [--config <path>] [--role <role>] <capture.jsonl> <message...>
//! ```
//!
//! The message is appended to a fresh ledger, the capture is replayed as the
//! vendor's reply, and each classified chunk is printed as it arrives: answer text
//! to stdout, reasoning and tool-call fragments to stderr. A summary of the commit
//! and the ledger's token usage follows.

mod replay;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use parley_config::SessionSettings;
use parley_context::{HistoryLedger, TiktokenCounter};
use parley_engine::{CommitOutcome, Session, TurnReport};
use parley_providers::{FixedParams, RequestParams};
use parley_types::{Role, StreamChunk};

use crate::replay::ReplayTransport;

const CHUNK_CHANNEL_CAPACITY: usize = 256;

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter)
        .init();
}

#[derive(Debug, Parser)]
#[command(
    name = "parley",
    about = "Replay a recorded vendor stream through a token-budgeted session",
    version
)]
struct Args {
    /// Config file to use instead of ~/.parley/config.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Role of the message being sent (user or system)
    #[arg(long, default_value = "user")]
    role: Role,

    /// Recorded chunk capture, one JSON object or SSE `data:` line per line
    capture: PathBuf,

    /// Message text; multiple words are joined with spaces
    #[arg(required = true)]
    message: Vec<String>,
}

impl Args {
    /// The message words joined, rejecting whitespace-only input.
    fn message(&self) -> Result<String> {
        let message = self.message.join(" ");
        if message.trim().is_empty() {
            bail!("message must not be empty");
        }
        Ok(message)
    }
}

fn load_settings(explicit: Option<&Path>) -> Result<SessionSettings> {
    if let Some(path) = explicit {
        return SessionSettings::load_from(path)?
            .with_context(|| format!("config file not found: {}", path.display()));
    }

    Ok(SessionSettings::load()?.unwrap_or_default())
}

fn request_params(settings: &SessionSettings) -> RequestParams {
    let mut params = RequestParams::new();
    if let Some(model) = &settings.model {
        params.insert("model".to_string(), Value::String(model.clone()));
    }
    params.insert("stream".to_string(), Value::Bool(true));
    params
}

/// Drains the chunk channel, answer text to `stdout`. Stops at the first failed
/// write, which closes the channel and cancels the turn.
async fn print_chunks(mut rx: mpsc::Receiver<StreamChunk>, mut stdout: impl Write) {
    while let Some(chunk) = rx.recv().await {
        let written = match chunk {
            StreamChunk::Content(text) => write!(stdout, "{text}").and_then(|()| stdout.flush()),
            StreamChunk::Reasoning(text) => {
                eprint!("{text}");
                Ok(())
            }
            StreamChunk::ToolCalls(fragments) => {
                for fragment in fragments {
                    let name = fragment.function.as_ref().and_then(|f| f.name.as_deref());
                    eprintln!(
                        "[tool call {} {}]",
                        fragment.index.map_or_else(|| "-".to_string(), |i| i.to_string()),
                        name.unwrap_or("...")
                    );
                }
                Ok(())
            }
            StreamChunk::End | StreamChunk::Empty => Ok(()),
        };

        if let Err(err) = written {
            tracing::debug!(%err, "stdout closed; stopping output");
            return;
        }
    }
    let _ = writeln!(stdout);
}

fn print_summary(report: &TurnReport, ledger: &HistoryLedger) {
    let outcome = match &report.commit.outcome {
        CommitOutcome::Appended { id, tokens } => format!("appended #{id} ({tokens} tokens)"),
        CommitOutcome::Skipped => "nothing to commit".to_string(),
        CommitOutcome::Rejected(err) => format!("rejected: {err}"),
    };
    eprintln!("turn {}: {outcome}", report.end().as_str());

    for call in report.tool_calls() {
        eprintln!("tool call {} {}({})", call.id, call.name, call.arguments);
    }

    eprintln!(
        "ledger: {} messages, {}/{} tokens",
        ledger.message_count(),
        ledger.total_tokens(),
        ledger.max_tokens()
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();
    let message = args.message()?;

    let settings = load_settings(args.config.as_deref())?;
    let counter = TiktokenCounter::with_encoding(settings.encoding);
    let ledger = HistoryLedger::new(settings.system_prompt.clone(), settings.max_tokens, counter)?;
    let params = FixedParams::from(request_params(&settings));

    let mut session = Session::new(
        ledger,
        settings.vendor,
        ReplayTransport::new(args.capture),
        params,
    );
    tracing::info!(session = %session.id(), vendor = %session.vendor(), "Starting turn");

    let (tx, rx) = mpsc::channel(CHUNK_CHANNEL_CAPACITY);
    let printer = tokio::spawn(print_chunks(rx, io::stdout()));

    let result = session.send(args.role, &message, &tx).await;
    drop(tx);
    printer.await?;

    let report = result?;
    print_summary(&report, session.ledger());
    Ok(())
}
