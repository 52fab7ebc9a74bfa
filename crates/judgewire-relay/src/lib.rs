//! judgewire relay library entry.
//!
//! This crate wires the upstream link, scoring client, broadcast hub, and
//! dispatch into a cohesive relay process. It is intended to be consumed by
//! the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod dispatch;
pub mod hub;
pub mod obs;
pub mod ops;
pub mod router;
pub mod scoring;
pub mod transport;
pub mod upstream;
