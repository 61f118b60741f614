//! Observable tracker and connection state.
//!
//! Each value lives in its own `watch` channel: observers always see the
//! latest value and are woken on change. Every value has exactly one writer.

use crate::relay::ConnectionState;
use gesture_common::{
    gesture::GestureLabel,
    hand::LandmarkSet,
    pointer::Pointer,
    protocol::{MousePosition, ScreenInfo},
};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

struct Channels {
    gesture: watch::Sender<GestureLabel>,
    landmarks: watch::Sender<Option<LandmarkSet>>,
    pointer: watch::Sender<Option<Pointer>>,
    connection: watch::Sender<ConnectionState>,
    mouse_position: watch::Sender<Option<MousePosition>>,
    screen_info: watch::Sender<Option<ScreenInfo>>,
}

#[derive(Clone)]
pub struct StatePublisher(Arc<Channels>);

impl Default for StatePublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl StatePublisher {
    pub fn new() -> Self {
        Self(Arc::new(Channels {
            gesture: watch::channel(GestureLabel::None).0,
            landmarks: watch::channel(None).0,
            pointer: watch::channel(None).0,
            connection: watch::channel(ConnectionState::Disconnected).0,
            mouse_position: watch::channel(None).0,
            screen_info: watch::channel(None).0,
        }))
    }

    // ── Writers ────────────────────────────────────────────────────────────────

    /// Returns the previous label if it changed
    pub fn publish_gesture(&self, gesture: GestureLabel) -> Option<GestureLabel> {
        let mut previous = None;
        self.0.gesture.send_if_modified(|current| {
            if *current == gesture {
                return false;
            }
            previous = Some(std::mem::replace(current, gesture));
            true
        });
        previous
    }

    pub fn publish_landmarks(&self, landmarks: Option<LandmarkSet>) {
        self.0.landmarks.send_replace(landmarks);
    }

    pub fn publish_pointer(&self, pointer: Option<Pointer>) {
        self.0.pointer.send_replace(pointer);
    }

    pub(crate) fn publish_connection(&self, state: ConnectionState) {
        self.0.connection.send_if_modified(|current| {
            let changed = *current != state;
            *current = state;
            changed
        });
    }

    pub(crate) fn publish_mouse_position(&self, position: MousePosition) {
        self.0.mouse_position.send_replace(Some(position));
    }

    pub(crate) fn publish_screen_info(&self, info: ScreenInfo) {
        self.0.screen_info.send_replace(Some(info));
    }

    // ── Readers ────────────────────────────────────────────────────────────────

    pub fn gesture(&self) -> GestureLabel {
        *self.0.gesture.borrow()
    }

    pub fn landmarks(&self) -> Option<LandmarkSet> {
        self.0.landmarks.borrow().clone()
    }

    pub fn pointer(&self) -> Option<Pointer> {
        *self.0.pointer.borrow()
    }

    pub fn connection(&self) -> ConnectionState {
        *self.0.connection.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.connection() == ConnectionState::Connected
    }

    pub fn mouse_position(&self) -> Option<MousePosition> {
        *self.0.mouse_position.borrow()
    }

    pub fn screen_info(&self) -> Option<ScreenInfo> {
        *self.0.screen_info.borrow()
    }

    /// Resolves once the relay client is connected
    pub async fn connected(&self) {
        let mut rx = self.subscribe_connection();
        // never fails: `self` keeps the sender alive
        let _ = rx.wait_for(|s| *s == ConnectionState::Connected).await;
    }

    // ── Subscriptions ──────────────────────────────────────────────────────────

    pub fn subscribe_gesture(&self) -> watch::Receiver<GestureLabel> {
        self.0.gesture.subscribe()
    }

    pub fn subscribe_landmarks(&self) -> watch::Receiver<Option<LandmarkSet>> {
        self.0.landmarks.subscribe()
    }

    pub fn subscribe_pointer(&self) -> watch::Receiver<Option<Pointer>> {
        self.0.pointer.subscribe()
    }

    pub fn subscribe_connection(&self) -> watch::Receiver<ConnectionState> {
        self.0.connection.subscribe()
    }

    pub fn subscribe_mouse_position(&self) -> watch::Receiver<Option<MousePosition>> {
        self.0.mouse_position.subscribe()
    }

    pub fn subscribe_screen_info(&self) -> watch::Receiver<Option<ScreenInfo>> {
        self.0.screen_info.subscribe()
    }

    /// Gesture labels as a stream, starting with the current one
    pub fn gesture_stream(&self) -> WatchStream<GestureLabel> {
        WatchStream::new(self.subscribe_gesture())
    }

    /// Connection states as a stream, starting with the current one
    pub fn connection_stream(&self) -> WatchStream<ConnectionState> {
        WatchStream::new(self.subscribe_connection())
    }
}
