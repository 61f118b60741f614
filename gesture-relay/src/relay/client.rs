use super::{Connection, ConnectionState, Connector, RECONNECT_DELAY};
use crate::{publisher::StatePublisher, utils::lock};
use anyhow::Result;
use futures::{SinkExt, StreamExt};
use gesture_common::protocol::{InboundNotification, MousePosition, OutboundCommand, ScreenInfo};
use log::{debug, error, info, trace, warn};
use std::sync::{Arc, Mutex};
use tokio::{sync::mpsc, task::JoinHandle, time};
use tokio_util::sync::CancellationToken;

/// Accepts outbound commands without blocking the caller
pub trait CommandSink: Send + Sync {
    /// Returns whether the command was accepted for delivery
    fn send_command(&self, cmd: &OutboundCommand) -> bool;
}

impl<T: CommandSink + ?Sized> CommandSink for Arc<T> {
    fn send_command(&self, cmd: &OutboundCommand) -> bool {
        (**self).send_command(cmd)
    }
}

struct RelayState {
    publisher: StatePublisher,
    /// Present only while connected
    outbound: Mutex<Option<mpsc::UnboundedSender<String>>>,
}

impl RelayState {
    fn send(&self, cmd: &OutboundCommand) -> bool {
        let text = match cmd.to_json() {
            Ok(text) => text,
            Err(e) => {
                error!("{e:#}");
                return false;
            }
        };
        let state = self.publisher.connection();
        match lock(&self.outbound).as_ref() {
            Some(tx) if tx.send(text).is_ok() => {
                trace!("queued command: {cmd:?}");
                true
            }
            _ => {
                error!("control service not connected ({state:?}), dropping {cmd:?}");
                false
            }
        }
    }

    fn handle_inbound(&self, text: &str) {
        match InboundNotification::parse(text) {
            Ok(InboundNotification::Position { x, y, .. }) => {
                self.publisher.publish_mouse_position(MousePosition { x, y });
            }
            Ok(InboundNotification::ScreenInfo { width, height }) => {
                info!("remote screen is {width}x{height}");
                self.publisher.publish_screen_info(ScreenInfo { width, height });
            }
            Err(e) => debug!("ignoring message: {e:#}"),
        }
    }
}

struct Running {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Keeps one connection to the control service open, reconnecting after
/// [`RECONNECT_DELAY`] whenever it drops.
pub struct ControlRelayClient {
    state: Arc<RelayState>,
    connector: Arc<dyn Connector>,
    url: String,
    running: Mutex<Option<Running>>,
}

impl ControlRelayClient {
    pub fn new(
        url: impl Into<String>,
        connector: impl Connector,
        publisher: StatePublisher,
    ) -> Self {
        Self {
            state: Arc::new(RelayState {
                publisher,
                outbound: Mutex::default(),
            }),
            connector: Arc::new(connector),
            url: url.into(),
            running: Mutex::default(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.state.publisher.connection()
    }

    /// Start the connection task. No-op while it is already running.
    ///
    /// Must be called within a tokio runtime.
    pub fn connect(&self) {
        let mut running = lock(&self.running);
        if running.as_ref().is_some_and(|r| !r.handle.is_finished()) {
            return;
        }
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(
            Arc::clone(&self.state),
            Arc::clone(&self.connector),
            self.url.clone(),
            cancel.clone(),
        ));
        *running = Some(Running { cancel, handle });
    }

    /// Close the connection and stop reconnecting.
    pub async fn disconnect(&self) {
        let running = lock(&self.running).take();
        if let Some(Running { cancel, handle }) = running {
            cancel.cancel();
            let _ = handle
                .await
                .inspect_err(|e| warn!("connection task failed: {e}"));
        }
    }

    pub fn move_absolute(&self, x: f32, y: f32, is_percentage: bool) -> bool {
        self.send_command(&OutboundCommand::MoveAbsolute { x, y, is_percentage })
    }

    pub fn move_relative(&self, x: f32, y: f32, is_percentage: bool) -> bool {
        self.send_command(&OutboundCommand::MoveRelative { x, y, is_percentage })
    }

    pub fn request_screen_info(&self) -> bool {
        self.send_command(&OutboundCommand::GetScreenInfo)
    }
}

impl CommandSink for ControlRelayClient {
    fn send_command(&self, cmd: &OutboundCommand) -> bool {
        self.state.send(cmd)
    }
}

impl Drop for ControlRelayClient {
    fn drop(&mut self) {
        if let Some(running) = lock(&self.running).take() {
            running.cancel.cancel();
        }
    }
}

async fn run(
    state: Arc<RelayState>,
    connector: Arc<dyn Connector>,
    url: String,
    cancel: CancellationToken,
) {
    loop {
        state.publisher.publish_connection(ConnectionState::Connecting);
        info!("connecting to control service at {url}");

        let attempt = tokio::select! {
            res = connector.connect(&url) => res,
            _ = cancel.cancelled() => break,
        };
        match attempt {
            Ok(conn) => match serve(&state, conn, &cancel).await {
                Ok(()) => info!("control service connection closed"),
                Err(e) => warn!("control service connection lost: {e:#}"),
            },
            Err(e) => warn!("{e:#}"),
        }
        state.publisher.publish_connection(ConnectionState::Disconnected);
        if cancel.is_cancelled() {
            break;
        }

        info!("reconnecting in {RECONNECT_DELAY:?}");
        tokio::select! {
            _ = time::sleep(RECONNECT_DELAY) => {}
            _ = cancel.cancelled() => break,
        }
    }
    state.publisher.publish_connection(ConnectionState::Disconnected);
    info!("control relay stopped");
}

async fn serve(state: &RelayState, conn: Connection, cancel: &CancellationToken) -> Result<()> {
    let Connection {
        mut sink,
        mut stream,
    } = conn;
    let (tx, mut rx) = mpsc::unbounded_channel();
    *lock(&state.outbound) = Some(tx);
    state.publisher.publish_connection(ConnectionState::Connected);
    info!("connected to control service");
    // screen bounds are needed before absolute moves make sense
    state.send(&OutboundCommand::GetScreenInfo);

    let result = loop {
        tokio::select! {
            Some(text) = rx.recv() => {
                if let Err(e) = sink.send(text).await {
                    break Err(e);
                }
            }
            msg = stream.next() => match msg {
                Some(Ok(text)) => state.handle_inbound(&text),
                Some(Err(e)) => break Err(e),
                None => break Ok(()),
            },
            _ = cancel.cancelled() => {
                // deliver what was queued before the disconnect
                while let Ok(text) = rx.try_recv() {
                    if let Err(e) = sink.feed(text).await {
                        debug!("dropping queued commands: {e:#}");
                        break;
                    }
                }
                let _ = sink
                    .close()
                    .await
                    .inspect_err(|e| debug!("error closing connection: {e:#}"));
                break Ok(());
            }
        }
    };
    lock(&state.outbound).take();
    result
}
