//! Connection to the remote input-control service.

use anyhow::{Context, Error, Result};
use futures::{future, future::BoxFuture, Sink, SinkExt, Stream, StreamExt};
use log::debug;
use serde::Serialize;
use std::{pin::Pin, time::Duration};
use tokio_tungstenite::{connect_async, tungstenite::Message};

mod client;
pub use client::*;

pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8765";

/// Delay before every reconnect attempt; fixed, no backoff.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

pub type TextSink = Pin<Box<dyn Sink<String, Error = Error> + Send>>;
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// An open, message-oriented text transport
pub struct Connection {
    pub sink: TextSink,
    pub stream: TextStream,
}

/// Opens transports to the control service.
pub trait Connector: Send + Sync + 'static {
    fn connect<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Connection>>;
}

/// WebSocket transport; text frames carry one message each.
pub struct WsConnector;

impl Connector for WsConnector {
    fn connect<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Connection>> {
        Box::pin(async move {
            let (ws, _) = connect_async(url)
                .await
                .with_context(|| format!("failed to connect to {url}"))?;
            let (ws_tx, ws_rx) = ws.split();

            let sink = ws_tx
                .sink_map_err(Error::from)
                .with(|text: String| future::ready(Ok::<_, Error>(Message::Text(text))));
            let stream = ws_rx.filter_map(|msg| {
                future::ready(match msg {
                    Ok(Message::Text(text)) => Some(Ok(text)),
                    Ok(other) => {
                        debug!("ignoring non-text frame: {other:?}");
                        None
                    }
                    Err(e) => Some(Err(Error::from(e))),
                })
            });

            Ok(Connection {
                sink: Box::pin(sink),
                stream: Box::pin(stream),
            })
        })
    }
}
