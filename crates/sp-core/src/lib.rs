//! CLI support for the survey pipeline publishing commands.
//!
//! The binary lives in `main.rs`; this library holds the pieces worth
//! testing on their own: logging initialization and the stable exit
//! code contract.

pub mod exit_codes;
pub mod logging;
