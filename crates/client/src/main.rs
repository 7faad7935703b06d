// twodays: terminal front end for the ephemeral presence client.
//
// Lines typed on stdin are submitted as chat. `/log` throws a log on the
// fire; `/online` and `/offline` toggle the connection flag.

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};
use twodays_client::client::Frame;
use twodays_client::config::ClientConfig;
use twodays_client::runtime::{self, Channels, Inbound};

#[derive(Debug, Parser)]
#[command(name = "twodays", version, about = "Messages that fade after two days")]
struct Args {
    /// Config file (defaults to ~/.twodays/config.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Workspace to join, overriding the config file.
    #[arg(long)]
    workspace: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => ClientConfig::load_from(path)
            .with_context(|| format!("failed to load config `{}`", path.display()))?,
        None => ClientConfig::load(),
    };
    if let Some(workspace) = args.workspace {
        config.workspace = workspace;
    }

    let (inbound_tx, inbound) = mpsc::channel(64);
    let (frames, frames_rx) = watch::channel(None);
    let (shutdown_tx, shutdown) = watch::channel(false);

    tokio::spawn(async move {
        if let Err(error) = tokio::signal::ctrl_c().await {
            warn!(%error, "ctrl-c handler failed; shutting down");
        }
        shutdown_tx.send_replace(true);
    });
    tokio::spawn(read_stdin(inbound_tx));
    tokio::spawn(print_frames(frames_rx));

    info!(workspace = %config.workspace, "starting twodays");
    runtime::run(config, Channels { inbound, frames, shutdown })
        .await
        .context("client loop terminated unexpectedly")
}

async fn read_stdin(inbound: mpsc::Sender<Inbound>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let event = match line.trim() {
            "/log" => Inbound::ThrowLog,
            "/online" => Inbound::Online(true),
            "/offline" => Inbound::Online(false),
            _ => Inbound::Submit(line),
        };
        if inbound.send(event).await.is_err() {
            break;
        }
    }
}

async fn print_frames(mut frames: watch::Receiver<Option<Frame>>) {
    let mut printed = HashSet::new();
    let mut fire = "";

    while frames.changed().await.is_ok() {
        let Some(frame) = frames.borrow_and_update().clone() else {
            continue;
        };
        for record in &frame.messages {
            if printed.insert(record.path.clone()) {
                if let Some(line) = record.line() {
                    println!("{line}");
                }
            }
        }
        if frame.fireplace.description != fire {
            fire = frame.fireplace.description;
            println!("* {fire}");
        }
    }
}
