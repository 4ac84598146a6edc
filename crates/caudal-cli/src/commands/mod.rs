//! CLI command implementations.

pub mod effects;
pub mod info;
pub mod process;
