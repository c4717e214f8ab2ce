//! Environment-derived configuration, consumed once at startup.
//!
//! The core has exactly two knobs: whether the shell should run as a
//! background utility (no dock presence), and where note data lives on disk.
//! Both come from the environment; there is no config file and no CLI flags.

use std::env;
use std::path::PathBuf;

use tracing::info;

/// Set to `1` to run without dock/taskbar presence (menu-bar only).
pub const ENV_MENU_BAR_ONLY: &str = "STICKY_NOTES_MENU_BAR_ONLY";

/// Overrides the data directory (blob store and logs).
pub const ENV_DATA_DIR: &str = "STICKY_NOTES_DIR";

/// Name of the default data directory under the home directory.
const DEFAULT_DIR_NAME: &str = ".sticky-notes";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Background-utility mode: the shell skips dock/taskbar registration.
    pub background_utility: bool,
    /// Where the blob store and logs live.
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            background_utility: false,
            data_dir: default_data_dir(),
        }
    }
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        let background_utility = flag_enabled(env::var(ENV_MENU_BAR_ONLY).ok().as_deref());
        let data_dir = env::var(ENV_DATA_DIR)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        let config = Config {
            background_utility,
            data_dir,
        };
        info!(
            background_utility = config.background_utility,
            data_dir = %config.data_dir.display(),
            "Configuration loaded"
        );
        config
    }
}

/// `~/.sticky-notes`, falling back to a relative path when the home
/// directory cannot be resolved.
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(DEFAULT_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DIR_NAME))
}

/// `1` is the documented value; `true` is accepted as well. Anything else,
/// including an unset variable, means off.
fn flag_enabled(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some("1") | Some("true"))
}
