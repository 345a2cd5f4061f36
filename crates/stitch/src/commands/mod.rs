//! CLI command implementations.

pub(crate) mod build;
pub(crate) mod resolve;
pub(crate) mod validate;

use std::path::PathBuf;

use clap::Args;
use stitch_config::{CliSettings, Config, ConfigError};

pub(crate) use build::BuildArgs;
pub(crate) use resolve::ResolveArgs;
pub(crate) use validate::ValidateArgs;

/// Options shared by every command.
#[derive(Args)]
pub(crate) struct ConfigArgs {
    /// Path to configuration file (default: auto-discover stitch.toml).
    #[arg(short, long, env = "STITCH_CONFIG")]
    config: Option<PathBuf>,

    /// Navigation declaration (overrides config).
    #[arg(short, long)]
    navigation: Option<PathBuf>,
}

impl ConfigArgs {
    /// Load the config with `settings` applied on top of this command's
    /// navigation override.
    pub(crate) fn load(&self, settings: CliSettings) -> Result<Config, ConfigError> {
        let settings = CliSettings {
            navigation_file: self.navigation.clone(),
            ..settings
        };
        Config::load(self.config.as_deref(), Some(&settings))
    }
}
