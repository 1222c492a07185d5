//! Serve command - host the chunked-transfer protocol on stdin/stdout.
//!
//! One JSON message per line in each direction. Logging goes to stderr so the
//! stdout stream stays pure protocol.

use std::path::PathBuf;

use clap::Args;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use szamla_core::transfer::{DocumentReply, TransferReply, TransferRequest, TransferService};

/// Arguments for the serve command.
#[derive(Args)]
pub struct ServeArgs {
    /// Extra pattern files to load on top of the built-in presets
    #[arg(short, long)]
    patterns: Vec<PathBuf>,
}

pub async fn run(args: ServeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let orchestrator = super::build_orchestrator(&config, &args.patterns)?;

    let service = TransferService::new(
        orchestrator,
        config.transfer.clone(),
        config.extraction.timeout_ms,
    );

    let (req_tx, req_rx) = mpsc::channel::<TransferRequest>(32);
    let (reply_tx, mut reply_rx) = mpsc::channel::<TransferReply>(32);
    let service_task = tokio::spawn(service.run(req_rx, reply_tx.clone()));

    info!("serving transfer protocol on stdin/stdout");

    let reader_task = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<TransferRequest>(line) {
                Ok(request) => {
                    if req_tx.send(request).await.is_err() {
                        break;
                    }
                }
                Err(err) => {
                    warn!(%err, "unparseable request line");
                    // A malformed line gets an error reply so the producer is
                    // never left waiting on it.
                    let reply = TransferReply::Document(DocumentReply::failure(format!(
                        "unparseable request: {err}"
                    )));
                    if reply_tx.send(reply).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    let mut stdout = tokio::io::stdout();
    while let Some(reply) = reply_rx.recv().await {
        let mut line = serde_json::to_string(&reply)?;
        line.push('\n');
        stdout.write_all(line.as_bytes()).await?;
        stdout.flush().await?;
    }

    reader_task.await?;
    service_task.await?;
    info!("producer disconnected, shutting down");
    Ok(())
}
