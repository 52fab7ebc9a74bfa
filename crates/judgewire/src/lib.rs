//! Top-level facade crate for judgewire.
//!
//! Re-exports core types and the relay library so users can depend on a single crate.

pub mod core {
    pub use judgewire_core::*;
}

pub mod relay {
    pub use judgewire_relay::*;
}
