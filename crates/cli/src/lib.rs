//! Library surface of the `rw` binary, split out so integration tests
//! can exercise argument parsing and command plumbing.

pub mod cli;
pub mod commands;
pub mod logging;
