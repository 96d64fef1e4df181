//! Marketscope CLI library.
//!
//! Admin and history-browsing commands over the persistent store. The
//! command handlers live here, separated from main.rs, so integration
//! tests can drive them directly.

pub mod commands;
pub mod config;
pub mod logging;
