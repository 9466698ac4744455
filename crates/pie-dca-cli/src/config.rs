//! Layered settings.
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/pie-dca/pie.toml`
//! 3. File passed with `--config`
//! 4. Environment variables: `PIE_*` prefix, `__` between sections
//!    (`PIE_DATA_DIR`, `PIE_RECALC__NEW_FUNDS`)

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use directories::ProjectDirs;
use pie_dca_core::allocation::ReallocationInput;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory holding `<name>.json` portfolio files.
    pub data_dir: PathBuf,
    /// Defaults for `pie recalc` when flags are omitted.
    #[serde(default)]
    pub recalc: ReallocationInput,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            recalc: ReallocationInput::default(),
        }
    }
}

pub fn global_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "pie-dca").map(|dirs| dirs.config_dir().join("pie.toml"))
}

impl Settings {
    /// Load defaults, the global file, `explicit` and `PIE_*` variables.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_from(global_config_path().as_deref(), explicit)
    }

    fn load_from(global: Option<&Path>, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(global, explicit, environment())
    }

    fn load_with_env(
        global: Option<&Path>,
        explicit: Option<&Path>,
        env: Environment,
    ) -> Result<Self, ConfigError> {
        let defaults = Settings::default();
        let mut builder = Config::builder()
            .set_default("data_dir", defaults.data_dir.to_string_lossy().to_string())?
            .set_default("recalc.new_funds", defaults.recalc.new_funds.to_string())?
            .set_default(
                "recalc.new_ticker_count",
                i64::from(defaults.recalc.new_ticker_count),
            )?
            .set_default(
                "recalc.percent_to_new",
                defaults.recalc.percent_to_new.to_string(),
            )?
            .set_default("recalc.mock_prefix", defaults.recalc.mock_prefix.clone())?;

        if let Some(path) = global {
            if path.exists() {
                debug!(path = %path.display(), "loading global config");
                builder = builder.add_source(File::from(path).required(false));
            }
        }
        if let Some(path) = explicit {
            debug!(path = %path.display(), "loading config file");
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(env);

        builder.build()?.try_deserialize()
    }
}

/// `PIE_DATA_DIR` for top-level keys, `PIE_RECALC__NEW_FUNDS` for nested ones.
fn environment() -> Environment {
    Environment::with_prefix("PIE")
        .prefix_separator("_")
        .separator("__")
}
