//! Input-control service speaking the relay protocol.
//!
//! Moves a virtual cursor confined to a screen of fixed size and reports the
//! resulting position after every move.

use crate::utils::lock;
use anyhow::Result;
use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use gesture_common::protocol::{InboundNotification, OutboundCommand};
use log::{debug, error, info};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

pub type SharedCursor = Arc<Mutex<VirtualCursor>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualCursor {
    width: u32,
    height: u32,
    x: i64,
    y: i64,
}

impl VirtualCursor {
    /// A cursor centered on a `width`x`height` screen
    pub fn new(width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            x: i64::from(width / 2),
            y: i64::from(height / 2),
        }
    }

    pub fn shared(width: u32, height: u32) -> SharedCursor {
        Arc::new(Mutex::new(Self::new(width, height)))
    }

    pub fn position(&self) -> (i64, i64) {
        (self.x, self.y)
    }

    /// Apply a command and build the reply for it
    pub fn apply(&mut self, cmd: &OutboundCommand) -> InboundNotification {
        match *cmd {
            OutboundCommand::MoveAbsolute { x, y, is_percentage } => {
                let (x, y) = self.to_pixels(x, y, is_percentage);
                self.move_to(x, y);
            }
            OutboundCommand::MoveRelative { x, y, is_percentage } => {
                let (dx, dy) = self.to_pixels(x, y, is_percentage);
                self.move_to(self.x + dx, self.y + dy);
            }
            OutboundCommand::GetScreenInfo => {
                return InboundNotification::ScreenInfo {
                    width: f64::from(self.width),
                    height: f64::from(self.height),
                };
            }
        }
        InboundNotification::Position {
            x: self.x as f64,
            y: self.y as f64,
            screen_width: Some(f64::from(self.width)),
            screen_height: Some(f64::from(self.height)),
        }
    }

    fn to_pixels(&self, x: f32, y: f32, is_percentage: bool) -> (i64, i64) {
        if is_percentage {
            (
                (f64::from(self.width) * f64::from(x) / 100.0) as i64,
                (f64::from(self.height) * f64::from(y) / 100.0) as i64,
            )
        } else {
            (x as i64, y as i64)
        }
    }

    fn move_to(&mut self, x: i64, y: i64) {
        self.x = x.clamp(0, i64::from(self.width) - 1);
        self.y = y.clamp(0, i64::from(self.height) - 1);
    }
}

pub fn router(cursor: SharedCursor) -> Router {
    Router::new().route("/", get(control_ws)).with_state(cursor)
}

pub async fn serve(listener: TcpListener, cursor: SharedCursor) -> Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("control server running on ws://{addr}");
    }
    axum::serve(listener, router(cursor)).await?;
    Ok(())
}

async fn control_ws(
    State(cursor): State<SharedCursor>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(cursor, socket))
}

async fn handle_ws(cursor: SharedCursor, socket: WebSocket) {
    info!("relay connected");
    let (mut ws_tx, mut ws_rx) = socket.split();

    while let Some(Ok(msg)) = ws_rx.next().await {
        let text = match msg {
            WsMessage::Text(text) => text,
            WsMessage::Close(_) => break,
            _ => continue,
        };
        debug!("received message: {}", text.as_str());
        let reply = match OutboundCommand::parse(text.as_str()) {
            Ok(cmd) => lock(&cursor).apply(&cmd),
            Err(e) => {
                error!("{e:#}");
                continue;
            }
        };
        let json = match reply.to_json() {
            Ok(json) => json,
            Err(e) => {
                error!("{e:#}");
                continue;
            }
        };
        if ws_tx.send(WsMessage::Text(json.into())).await.is_err() {
            break;
        }
    }
    info!("relay disconnected");
}
