//! Gesture Relay
//!
//! Classifies hand gestures from detector landmarks and relays the index
//! fingertip as cursor moves to a remote input-control service.

pub mod config;
pub mod feed;
pub mod publisher;
pub mod relay;
pub mod server;
pub mod tracker;
mod utils;

pub use gesture_common as common;
