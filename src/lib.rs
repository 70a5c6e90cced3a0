pub mod cli;
pub mod fedora_client;
pub mod load_config;

pub use cli::{execute, run, Cli, Commands};
