//! Shared types for the Marketscope research store.

mod cache;
mod document;
mod interaction;
mod maintenance;
mod search;
mod telemetry;

pub use cache::*;
pub use document::*;
pub use interaction::*;
pub use maintenance::*;
pub use search::*;
pub use telemetry::*;
