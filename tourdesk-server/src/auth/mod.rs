//! Caller identity and request limiting
//!
//! Authentication happens upstream; the gateway forwards the caller as
//! headers and this module only reads and checks them.

pub mod actor;
pub mod rate_limit;

pub use actor::Actor;
