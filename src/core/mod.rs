pub mod assembler;
pub mod ledger;
pub mod refresher;
pub mod services;

pub use crate::domain::model::{Document, Fragment, PortRequest, Profile};
pub use crate::domain::ports::{ContainerRuntime, Orchestrator, Registry, Storage};
pub use crate::utils::error::Result;
