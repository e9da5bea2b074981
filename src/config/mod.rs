#[cfg(feature = "cli")]
pub mod cli;
pub mod refresh_config;
pub mod storage;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use refresh_config::RefreshConfig;
pub use storage::LocalStorage;
