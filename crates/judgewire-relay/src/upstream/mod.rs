//! Upstream link (persistent WS connection to the game server).
//!
//! Exposes the link state machine and the single shared connection handle;
//! no other module touches the raw socket.

pub mod link;

pub use link::{LinkState, UpstreamLink};
