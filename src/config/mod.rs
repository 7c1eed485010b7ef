#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::{CalendarAction, Cli, Command, SearchArgs};
pub use toml_config::AppConfig;
