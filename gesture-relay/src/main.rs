//! Gesture Relay - CLI
//!
//! `run` reads landmark frames from a detector feed, classifies gestures and
//! relays the index fingertip to the control service as cursor moves.
//! `serve` runs the control service itself, driving a virtual cursor.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use gesture_relay::{
    config::{Overrides, RelayConfig},
    feed::LandmarkFeed,
    publisher::StatePublisher,
    relay::{ControlRelayClient, WsConnector},
    server::{self, VirtualCursor},
    tracker::{GestureTracker, TrackerOptions},
};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tokio::io::AsyncRead;

// ── CLI Arguments ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "gesture-relay", about = "Hand gesture cursor relay")]
struct Args {
    /// Debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Relay landmark frames to the control service
    Run {
        /// YAML file with `endpoint`, `sensitivity` and `mirrored`
        #[arg(long)]
        config: Option<PathBuf>,

        /// Control service URL [default: ws://localhost:8765]
        #[arg(long)]
        endpoint: Option<String>,

        /// Forward one move every N hand frames, 1-10 [default: 3]
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=10))]
        sensitivity: Option<u8>,

        /// Mirror the horizontal axis
        #[arg(long, conflicts_with = "no_mirrored")]
        mirrored: bool,

        /// Do not mirror, even if the config file asks for it
        #[arg(long)]
        no_mirrored: bool,

        /// Newline-delimited JSON landmark frames; stdin when omitted
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Run the control service with a virtual cursor
    Serve {
        /// Port to listen on
        #[arg(long, default_value_t = 8765)]
        port: u16,

        /// Screen width in pixels
        #[arg(long, default_value_t = 1920)]
        width: u32,

        /// Screen height in pixels
        #[arg(long, default_value_t = 1080)]
        height: u32,
    },
}

// ── Main ───────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match args.command {
        Command::Run {
            config,
            endpoint,
            sensitivity,
            mirrored,
            no_mirrored,
            input,
        } => {
            let overrides = Overrides {
                endpoint,
                sensitivity,
                mirrored: (mirrored || no_mirrored).then_some(mirrored),
            };
            let config = RelayConfig::resolve(config.as_deref(), overrides)?;
            match input {
                // a recorded feed would otherwise race the handshake
                Some(path) => relay(config, LandmarkFeed::open(&path).await?, true).await,
                None => relay(config, LandmarkFeed::stdin(), false).await,
            }
        }
        Command::Serve {
            port,
            width,
            height,
        } => {
            let addr = SocketAddr::from(([0, 0, 0, 0], port));
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("failed to bind {addr}"))?;
            log::info!("Screen: {width}x{height}");
            server::serve(listener, VirtualCursor::shared(width, height)).await
        }
    }
}

async fn relay<R: AsyncRead + Unpin>(
    config: RelayConfig,
    mut feed: LandmarkFeed<R>,
    wait_connected: bool,
) -> Result<()> {
    log::info!("Gesture relay starting...");
    log::info!("Endpoint: {}", config.endpoint);
    log::info!(
        "Sensitivity: {}, mirrored: {}",
        config.sensitivity,
        config.mirrored
    );

    let publisher = StatePublisher::new();
    let client = Arc::new(ControlRelayClient::new(
        config.endpoint.clone(),
        WsConnector,
        publisher.clone(),
    ));
    client.connect();

    let status_task = tokio::spawn({
        let mut states = publisher.connection_stream();
        async move {
            while let Some(state) = states.next().await {
                log::debug!("connection state: {state:?}");
            }
        }
    });

    let options = TrackerOptions {
        sensitivity: config.sensitivity,
        mirrored: config.mirrored,
        ..Default::default()
    };
    let mut tracker = GestureTracker::new(options, publisher.clone(), Arc::clone(&client));

    let work = async {
        if wait_connected {
            log::info!("waiting for the control service...");
            publisher.connected().await;
        }
        tracker.track(&mut feed).await
    };
    let result = tokio::select! {
        result = work => result,
        _ = tokio::signal::ctrl_c() => {
            log::info!("interrupted");
            Ok(())
        }
    };

    log::info!("shutting down");
    client.disconnect().await;
    status_task.abort();
    result
}
