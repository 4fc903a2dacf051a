//! Bookguard Core - Payload measurement and neutralization policy
//!
//! This crate defines the host-independent half of the guard:
//! - Payloads (the ordered text pages of a book item)
//! - Text encodings used to size a payload the way the host persists it
//! - The neutralization policy and its configuration
//! - Error types

pub mod encoding;
pub mod payload;
pub mod config;
pub mod policy;
pub mod error;

pub use encoding::*;
pub use payload::*;
pub use config::*;
pub use policy::*;
pub use error::*;
