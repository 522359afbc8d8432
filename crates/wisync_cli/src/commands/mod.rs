//! CLI command implementations.

pub mod describe;
pub mod load;
pub mod project;
pub mod set;
pub mod show;
