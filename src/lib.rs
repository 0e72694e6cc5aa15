pub mod config;
pub mod core;
pub mod domain;
pub mod server;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::{cli::LocalStorage, toml_config::DashboardConfig};
pub use core::dashboard::Dashboard;
pub use utils::error::{DashboardError, Result};
