//! Observer fan-out.
//!
//! The broadcast hub owns the live observer set; no other module touches
//! the raw registry.

pub mod broadcast;

pub use broadcast::{BroadcastHub, ObserverId};
