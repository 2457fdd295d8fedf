pub mod cli;
pub mod config;

pub use cli::{BatchArgs, Cli, Commands, FollowerArgs, InputArgs, SearchArgs, SolveArgs};
pub use config::MillConfig;
