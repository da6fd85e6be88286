use crate::config::Settings;

/// Settings to run with, plus why the defaults were used instead of the
/// user's file, if they were.
pub struct LoadedSettings {
    pub settings: Settings,
    pub fallback_reason: Option<String>,
}

/// Read the config file and environment. A missing or broken config never
/// stops startup; the defaults take over and the reason is kept for the log.
pub fn load_settings() -> LoadedSettings {
    let outcome = Settings::load()
        .map_err(|e| format!("failed to load config: {e}"))
        .and_then(|s| match s.validate() {
            Ok(()) => Ok(s),
            Err(msg) => Err(format!("invalid config: {msg}")),
        });

    match outcome {
        Ok(settings) => LoadedSettings {
            settings,
            fallback_reason: None,
        },
        Err(reason) => {
            eprintln!("hearth: {reason}; using defaults");
            LoadedSettings {
                settings: Settings::default(),
                fallback_reason: Some(reason),
            }
        }
    }
}
