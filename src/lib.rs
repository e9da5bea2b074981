pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;
pub use crate::config::{LocalStorage, RefreshConfig};

pub use crate::core::assembler::{generate, ProfileParams};
pub use crate::core::refresher::{Decision, RefreshOutcome, Refresher};
pub use crate::domain::model::{PortRequest, Profile};
pub use crate::utils::error::{ComposeError, Result};
