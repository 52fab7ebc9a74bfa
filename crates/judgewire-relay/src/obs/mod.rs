//! Lightweight in-process metrics (dependency-free).
//!
//! Counters are stored as atomics and rendered by the `/metrics` handler;
//! single-value series come in through the render call's extra lines.

pub mod metrics;
