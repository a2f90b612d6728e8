//! Combat reporting
//!
//! - Battle events produced by each tick
//! - The combat log that records them for display and post-battle analysis

pub mod events;
pub mod log;
