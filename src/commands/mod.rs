//! Command implementations for the Falcon installer CLI

pub mod completions;
pub mod install;
pub mod version;
