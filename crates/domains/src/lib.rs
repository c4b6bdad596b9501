//! # domains
//!
//! The central domain logic and interface definitions for StackIt:
//! entity models, the vote/reputation/acceptance rules, and the ports
//! every adapter implements.

pub mod acceptance;
pub mod error;
pub mod models;
pub mod notification;
pub mod policy;
pub mod reputation;
pub mod traits;
pub mod vote;

// Re-exporting for easier access in other crates
pub use acceptance::*;
pub use error::*;
pub use models::*;
pub use policy::*;
pub use reputation::*;
pub use traits::*;
pub use vote::*;
