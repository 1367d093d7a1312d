//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, shutdown)
//!     → dispatch subsystem (match procedure, run handler)
//!     → Send JSON response to client
//! ```

pub mod server;

pub use server::GatewayServer;
