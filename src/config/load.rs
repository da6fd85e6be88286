use std::env;
use std::path::PathBuf;

use super::schema::Settings;

const APP_DIR: &str = "hearth";
const ENV_PREFIX: &str = "HEARTH";
const CONFIG_PATH_VAR: &str = "HEARTH_CONFIG_PATH";

/// Layered loading: struct defaults, then the config file if one exists,
/// then `HEARTH__SECTION__KEY` environment variables on top.
impl Settings {
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = resolve_config_path() {
            builder = builder.add_source(::config::File::from(path).required(false));
        }
        builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Reject values the player cannot work with.
    pub fn validate(&self) -> Result<(), String> {
        let checks = [
            (
                (0.0..=1.0).contains(&self.audio.volume),
                "audio.volume must be within 0.0..=1.0",
            ),
            (
                self.controls.volume_step > 0.0 && self.controls.volume_step <= 1.0,
                "controls.volume_step must be within (0.0, 1.0]",
            ),
            (
                self.library.extensions.iter().any(|e| !e.trim().is_empty()),
                "library.extensions must name at least one extension",
            ),
        ];
        match checks.iter().find(|(ok, _)| !ok) {
            Some((_, msg)) => Err((*msg).to_string()),
            None => Ok(()),
        }
    }

    /// `library.database_path`, or `library.db` in the data directory.
    pub fn database_path(&self) -> Option<PathBuf> {
        match &self.library.database_path {
            Some(path) => Some(path.clone()),
            None => default_data_dir().map(|dir| dir.join("library.db")),
        }
    }

    /// `logging.file`, or `hearth.log` next to the database.
    pub fn log_path(&self) -> Option<PathBuf> {
        if let Some(file) = &self.logging.file {
            return Some(file.clone());
        }
        let db = self.database_path()?;
        Some(db.parent()?.join("hearth.log"))
    }
}

/// `$HEARTH_CONFIG_PATH` when set, else the XDG location.
pub fn resolve_config_path() -> Option<PathBuf> {
    env::var_os(CONFIG_PATH_VAR)
        .map(PathBuf::from)
        .or_else(default_config_path)
}

/// `$XDG_CONFIG_HOME/hearth/config.toml`, or `~/.config/hearth/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    xdg_home("XDG_CONFIG_HOME", &[".config"]).map(|d| d.join(APP_DIR).join("config.toml"))
}

/// `$XDG_DATA_HOME/hearth`, or `~/.local/share/hearth`.
pub fn default_data_dir() -> Option<PathBuf> {
    xdg_home("XDG_DATA_HOME", &[".local", "share"]).map(|d| d.join(APP_DIR))
}

fn xdg_home(var: &str, under_home: &[&str]) -> Option<PathBuf> {
    if let Some(dir) = env::var_os(var) {
        return Some(PathBuf::from(dir));
    }
    let mut dir = PathBuf::from(env::var_os("HOME")?);
    dir.extend(under_home);
    Some(dir)
}
