//! Command handlers.

pub mod cache;
pub mod history;
pub mod maintenance;
pub mod stats;
pub mod usage;
