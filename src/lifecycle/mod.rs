//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain in-flight requests → Exit
//! ```
//!
//! # Design Decisions
//! - Shutdown is a broadcast so every holder of a receiver drains
//!   independently

pub mod shutdown;

pub use shutdown::Shutdown;
