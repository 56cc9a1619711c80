pub mod capability;
pub mod conversation;
pub mod events;
pub mod session;
pub mod store;

pub mod settings {
    use serde::{Deserialize, Serialize};
    use std::path::{Path, PathBuf};

    use crate::session::ModelOption;

    fn default_log_filter() -> String {
        "info".to_string()
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct ProviderAuth {
        pub api_key: Option<String>,
    }

    /// Missing keys take their default, so a partial file still loads.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(default)]
    pub struct AppSettings {
        pub gemini_auth: ProviderAuth,
        /// Model catalog; the first entry is the session default
        pub models: Vec<ModelOption>,
        pub image_model: String,
        pub image_edit_model: String,
        pub video_model: String,
        pub request_timeout_secs: u64,
        pub video_poll_interval_secs: u64,
        pub video_timeout_secs: u64,
        pub log_filter: String,
    }

    impl Default for AppSettings {
        fn default() -> Self {
            Self {
                gemini_auth: ProviderAuth::default(),
                models: vec![
                    ModelOption::new("gemini-2.5-flash", "AIVAN 1"),
                    ModelOption::new("gemini-2.5-flash", "AIVAN Pro"),
                ],
                image_model: "imagen-4.0-generate-001".into(),
                image_edit_model: "gemini-2.5-flash-image-preview".into(),
                video_model: "veo-2.0-generate-001".into(),
                request_timeout_secs: 120,
                video_poll_interval_secs: 10,
                video_timeout_secs: 600,
                log_filter: default_log_filter(),
            }
        }
    }

    impl AppSettings {
        /// First catalog entry, or the built-in default if the catalog is empty.
        pub fn default_model(&self) -> ModelOption {
            self.models
                .first()
                .cloned()
                .unwrap_or_else(|| ModelOption::new("gemini-2.5-flash", "AIVAN 1"))
        }
    }

    /// `<config dir>/settings.json`
    pub fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com.local", "AIVAN", "Aivan")
            .map(|proj| proj.config_dir().join("settings.json"))
    }

    /// Read settings from `path`; a missing or unreadable file yields the defaults.
    pub fn load_from(path: &Path) -> (AppSettings, bool) {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<AppSettings>(&contents) {
                Ok(settings) => (settings, true),
                Err(e) => {
                    tracing::warn!("ignoring invalid settings at {}: {}", path.display(), e);
                    (AppSettings::default(), false)
                }
            },
            Err(_) => (AppSettings::default(), false),
        }
    }

    pub fn load_settings_or_default() -> (AppSettings, bool) {
        match config_path() {
            Some(path) => load_from(&path),
            None => (AppSettings::default(), false),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_missing_file_gives_defaults() {
            let dir = tempfile::tempdir().unwrap();
            let (settings, loaded) = load_from(&dir.path().join("nope.json"));
            assert!(!loaded);
            assert_eq!(settings.default_model().name, "AIVAN 1");
            assert_eq!(settings.video_poll_interval_secs, 10);
        }

        #[test]
        fn test_load_full_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("settings.json");
            let mut settings = AppSettings::default();
            settings.video_timeout_secs = 30;
            settings.gemini_auth.api_key = Some("key".into());
            std::fs::write(&path, serde_json::to_string_pretty(&settings).unwrap()).unwrap();

            let (loaded, ok) = load_from(&path);
            assert!(ok);
            assert_eq!(loaded.video_timeout_secs, 30);
            assert_eq!(loaded.gemini_auth.api_key.as_deref(), Some("key"));
        }

        #[test]
        fn test_invalid_file_gives_defaults() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("settings.json");
            std::fs::write(&path, "{ not json").unwrap();
            let (settings, ok) = load_from(&path);
            assert!(!ok);
            assert_eq!(settings.models.len(), 2);
        }

        #[test]
        fn test_partial_file_keeps_defaults() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("settings.json");
            std::fs::write(&path, r#"{"gemini_auth":{"api_key":"k"}}"#).unwrap();

            let (settings, ok) = load_from(&path);
            assert!(ok);
            assert_eq!(settings.gemini_auth.api_key.as_deref(), Some("k"));
            assert_eq!(settings.models.len(), 2);
            assert_eq!(settings.video_model, "veo-2.0-generate-001");
            assert_eq!(settings.log_filter, "info");
        }
    }
}
