//! Core of the Telegram message monitor.
//!
//! This crate knows nothing about MTProto or the Bot API. The listening
//! session and the relay bot live behind ports (traits) implemented in the
//! adapter crates.

pub mod app;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod errors;
pub mod filter;
pub mod formatting;
pub mod logging;
pub mod messaging;

pub use errors::{Error, Result};
