pub mod types;

pub use types::{ChangeRules, Config, Grouping, LabelGroup, Selection};

use std::path::Path;
use tracing::debug;

use crate::error::Result;

pub const DEFAULT_CONFIG_FILE: &str = "changelog.toml";

impl Config {
    /// Loads the config file if it exists, falling back to defaults otherwise.
    pub fn load(path: &Path) -> Result<Config> {
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::parse(&content)?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Config> {
        Ok(toml::from_str(content)?)
    }
}
