//! # HTTP handlers
//!
//! Thin adapters between axum extractors and the services. Each handler
//! parses its inputs, calls one service operation, and records metrics on
//! success.

pub mod answers;
pub mod auth;
pub mod notifications;
pub mod questions;
pub mod system;
