//! Protocol modules (envelope + task kinds).
//!
//! Every link in the relay speaks the same flat JSON envelope; this module
//! hosts that contract plus the pure classification of envelope kinds into
//! scoring tasks.
//!
//! Parsing is panic-free: malformed input is reported as `JudgewireError`
//! instead of panicking, keeping the relay resilient to hostile traffic.

pub mod envelope;
pub mod kinds;

pub use envelope::Envelope;
pub use kinds::TaskKind;
