//! Gesture Relay - Common Types & Logic
//!
//! Runtime-free pieces shared by the relay service and its tests:
//! hand landmarks, the gesture classifier, pointer mapping and throttling,
//! and the control protocol wire types.

pub mod gesture;
pub mod hand;
pub mod pointer;
pub mod protocol;
