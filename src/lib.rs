pub mod benchmark;
pub mod cli;
pub mod config;
pub mod parser;
pub mod remote;
pub mod types;

// Re-export main types
pub use types::*;
