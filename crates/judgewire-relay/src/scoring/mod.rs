//! Scoring collaborator client (request/response over HTTP).

pub mod client;

pub use client::{ScoringBackend, ScoringClient};
