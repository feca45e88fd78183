//! Inbound message model and the ports the dispatch loop talks through.

pub mod port;
pub mod types;
