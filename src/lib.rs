pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{cli::LocalStorage, toml_config::TomlConfig};

pub use app::commands::{Command, CommandExecutor, CommandOutcome};
pub use core::{store::UniqueModuleList, transcript::Transcript};
pub use utils::error::{CapError, Result};
