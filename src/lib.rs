pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::adapters::storage::LocalStorage;
pub use crate::app::{run_import, ImportJob};
pub use crate::config::{Environment, Settings};
pub use crate::core::{engine::ImportEngine, pipeline::UserImportPipeline};
pub use crate::utils::error::{ImportError, Result};
