//! Rust client SDK for the RPC gateway.

pub mod client;

pub use client::{ErrorBody, GatewayClient, Issue, SdkError};
