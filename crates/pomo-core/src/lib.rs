//! Core domain + application logic for the pomodoro study bot.
//!
//! This crate is intentionally framework-agnostic. The chat platform lives
//! behind the messaging port (trait) implemented in adapter crates.

pub mod command;
pub mod config;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod pomodoro;

pub use errors::{Error, Result};
