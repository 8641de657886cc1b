pub mod config;
pub mod execution;
pub mod patches;
