pub mod config;
pub mod run;
pub mod summarize;

use std::path::PathBuf;

use anyhow::Result;
use booknotes::config::{self as app_config, Settings};

/// Options shared by every subcommand.
pub struct Globals {
    pub config: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
}

impl Globals {
    pub fn settings(&self) -> Settings {
        Settings::load(self.config.as_deref())
    }

    /// Seed the process environment from the env file, if any.
    pub fn load_env(&self) -> Result<()> {
        app_config::load_dotenv(self.env_file.as_deref())?;
        Ok(())
    }
}
