//! Process bootstrap.
//!
//! This module contains functionality for:
//! - Mode detection from raw arguments (`cli`)
//! - Exit hooks that survive signals, panics and `process::exit` (`exit_hooks`)
//! - The CLI launch phases (`lifecycle`)
//! - Launch sequencing for both modes (`init`)

pub mod cli;
pub mod exit_hooks;
pub mod init;
pub mod lifecycle;
