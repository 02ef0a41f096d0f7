//! Domain objects and the operation catalog
//!
//! Provides the transport-independent result envelope, boundary validation
//! helpers, and the fixed registry of user-directory operations.

pub mod envelope;
pub mod registry;
pub mod utils;
