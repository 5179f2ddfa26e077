//! CLI-specific functionality for the persona engine binary
//!
//! This module contains argument parsing for the companion binary; the
//! engine itself is consumed as a library.

pub mod args;

pub use args::{Args, Command};
