//! Bookguard Host - Binding the payload policy to a game server
//!
//! This crate implements the host-facing side of the guard:
//! - Item and book metadata traits the host implements
//! - Event traits for book edits, container opens and item transfers
//! - Interceptors that enforce the policy at each of those events
//! - Plugin lifecycle (activate / deactivate on an event bus)
//! - Per-interception-point statistics

pub mod error;
pub mod item;
pub mod event;
pub mod stats;
pub mod interceptor;
pub mod plugin;

pub use error::*;
pub use item::*;
pub use event::*;
pub use stats::*;
pub use interceptor::*;
pub use plugin::*;
