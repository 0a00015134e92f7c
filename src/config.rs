use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{MeetscribeError, Result};
use crate::models::WhisperModel;

/// Config file name searched for in the working and install directories.
pub const CONFIG_FILE_NAME: &str = "meetscribe.json";

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub model: WhisperModel,
    pub huggingface_token: Option<String>,
    pub min_speakers: u32,
    pub max_speakers: u32,
    pub paths: PathsConfig,
    pub cleanup: CleanupConfig,
}

/// Locations of external tools and output, all optional.
///
/// Anything left unset is resolved at run time: environment variable first,
/// then the platform default (see the `paths` module).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct PathsConfig {
    pub whisper_cpp_exe: Option<PathBuf>,
    pub whisper_cpp_models: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub oneapi_bin: Option<PathBuf>,
}

/// Transcript cleanup configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CleanupConfig {
    pub remove_duplicates: bool,
    pub remove_fillers: bool,
    pub remove_hallucinations: bool,
    pub remove_non_english: bool,
    pub min_segment_length: usize,
    pub similarity_threshold: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: WhisperModel::default(),
            huggingface_token: None,
            min_speakers: crate::defaults::MIN_SPEAKERS,
            max_speakers: crate::defaults::MAX_SPEAKERS,
            paths: PathsConfig::default(),
            cleanup: CleanupConfig::default(),
        }
    }
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            remove_duplicates: true,
            remove_fillers: true,
            remove_hallucinations: true,
            remove_non_english: true,
            min_segment_length: crate::defaults::MIN_SEGMENT_LENGTH,
            similarity_threshold: crate::defaults::SIMILARITY_THRESHOLD,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// Missing fields use default values; unknown fields are ignored. The
    /// loaded configuration is validated before it is returned.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => MeetscribeError::InvalidConfig {
                message: format!("Configuration file not found: {}", path.display()),
            },
            _ => MeetscribeError::InvalidConfig {
                message: format!("Cannot read config file: {e}"),
            },
        })?;
        let config: Config =
            serde_json::from_str(&contents).map_err(|e| MeetscribeError::InvalidConfig {
                message: format!("Invalid JSON in config file: {e}"),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the first location that has one.
    ///
    /// Search order:
    /// 1. `explicit`, when given (a missing file is then an error)
    /// 2. `meetscribe.json` in the current directory
    /// 3. `meetscribe.json` next to the executable
    /// 4. the per-user config file (see [`Config::default_path`])
    /// 5. built-in defaults
    pub fn load_search(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let cwd_file = Path::new(CONFIG_FILE_NAME);
        if cwd_file.is_file() {
            return Self::load(cwd_file);
        }

        if let Ok(exe) = std::env::current_exe()
            && let Some(dir) = exe.parent()
        {
            let candidate = dir.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                return Self::load(&candidate);
            }
        }

        let default = Self::default_path();
        if default.is_file() {
            return Self::load(&default);
        }

        Ok(Self::default())
    }

    /// Check the invariants a usable configuration must hold.
    pub fn validate(&self) -> Result<()> {
        if self.min_speakers < 1 {
            return Err(MeetscribeError::InvalidConfig {
                message: "min_speakers must be at least 1".to_string(),
            });
        }
        if self.max_speakers < self.min_speakers {
            return Err(MeetscribeError::InvalidConfig {
                message: "max_speakers must be >= min_speakers".to_string(),
            });
        }
        Ok(())
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - MEETSCRIBE_MODEL → model
    /// - MEETSCRIBE_HF_TOKEN → huggingface_token
    /// - MEETSCRIBE_OUTPUT_DIR → paths.output_dir
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(model) = std::env::var("MEETSCRIBE_MODEL")
            && !model.is_empty()
        {
            self.model = model.parse()?;
        }

        if let Ok(token) = std::env::var("MEETSCRIBE_HF_TOKEN")
            && !token.is_empty()
        {
            self.huggingface_token = Some(token);
        }

        if let Ok(dir) = std::env::var("MEETSCRIBE_OUTPUT_DIR")
            && !dir.is_empty()
        {
            self.paths.output_dir = Some(PathBuf::from(dir));
        }

        Ok(self)
    }

    /// Resolve the Hugging Face token: explicit config value first, then the
    /// conventional `HF_TOKEN` environment variable. Empty values count as
    /// absent either way.
    pub fn huggingface_token(&self) -> Option<String> {
        if let Some(token) = &self.huggingface_token
            && !token.is_empty()
        {
            return Some(token.clone());
        }
        std::env::var("HF_TOKEN").ok().filter(|t| !t.is_empty())
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/meetscribe/config.json on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .expect("Could not determine config directory")
            .join("meetscribe")
            .join("config.json")
    }

    /// Render the effective configuration as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| MeetscribeError::InvalidConfig {
            message: format!("Cannot serialize config: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to serialize tests that modify environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    // SAFETY: These helpers are only used in tests with ENV_LOCK held,
    // ensuring no concurrent access to environment variables.
    fn set_env(key: &str, value: &str) {
        unsafe { std::env::set_var(key, value) }
    }

    fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) }
    }

    fn clear_meetscribe_env() {
        remove_env("MEETSCRIBE_MODEL");
        remove_env("MEETSCRIBE_HF_TOKEN");
        remove_env("MEETSCRIBE_OUTPUT_DIR");
        remove_env("HF_TOKEN");
    }

    #[test]
    fn test_default_config_has_correct_values() {
        let config = Config::default();

        assert_eq!(config.model, WhisperModel::LargeV3);
        assert_eq!(config.huggingface_token, None);
        assert_eq!(config.min_speakers, 2);
        assert_eq!(config.max_speakers, 6);

        // Paths all unset: resolved at run time
        assert_eq!(config.paths.whisper_cpp_exe, None);
        assert_eq!(config.paths.whisper_cpp_models, None);
        assert_eq!(config.paths.output_dir, None);
        assert_eq!(config.paths.oneapi_bin, None);

        // Cleanup defaults
        assert!(config.cleanup.remove_duplicates);
        assert!(config.cleanup.remove_fillers);
        assert!(config.cleanup.remove_hallucinations);
        assert!(config.cleanup.remove_non_english);
        assert_eq!(config.cleanup.min_segment_length, 3);
        assert_eq!(config.cleanup.similarity_threshold, 0.9);
    }

    #[test]
    fn test_load_from_json_file() {
        let json_content = r#"
            {
                "model": "small",
                "huggingface_token": "hf_test",
                "min_speakers": 3,
                "max_speakers": 8,
                "paths": {
                    "whisper_cpp_exe": "/opt/whisper/whisper-cli",
                    "output_dir": "/data/captures"
                },
                "cleanup": {
                    "remove_fillers": false,
                    "min_segment_length": 5
                }
            }
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(json_content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.model, WhisperModel::Small);
        assert_eq!(config.huggingface_token, Some("hf_test".to_string()));
        assert_eq!(config.min_speakers, 3);
        assert_eq!(config.max_speakers, 8);
        assert_eq!(
            config.paths.whisper_cpp_exe,
            Some(PathBuf::from("/opt/whisper/whisper-cli"))
        );
        assert_eq!(config.paths.output_dir, Some(PathBuf::from("/data/captures")));
        assert_eq!(config.paths.whisper_cpp_models, None);

        assert!(!config.cleanup.remove_fillers);
        assert_eq!(config.cleanup.min_segment_length, 5);
        // Untouched cleanup fields stay at defaults
        assert!(config.cleanup.remove_duplicates);
        assert_eq!(config.cleanup.similarity_threshold, 0.9);
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let json_content = r#"{ "model": "tiny" }"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(json_content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.model, WhisperModel::Tiny);
        assert_eq!(config.min_speakers, 2);
        assert_eq!(config.max_speakers, 6);
        assert!(config.cleanup.remove_hallucinations);
    }

    #[test]
    fn test_load_ignores_unknown_keys() {
        let json_content = r#"{ "model": "base", "future_option": true }"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(json_content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.model, WhisperModel::Base);
    }

    #[test]
    fn test_load_missing_file_names_the_path() {
        let err = Config::load(Path::new("/no/such/meetscribe.json")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid configuration: Configuration file not found: /no/such/meetscribe.json"
        );
    }

    #[test]
    fn test_load_invalid_json_returns_error() {
        let invalid_json = r#"{ "model": "tiny", "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(invalid_json.as_bytes()).unwrap();

        let err = Config::load(temp_file.path()).unwrap_err();
        assert!(
            err.to_string().contains("Invalid JSON in config file:"),
            "message was: {err}"
        );
    }

    #[test]
    fn test_load_unknown_model_returns_error() {
        let json_content = r#"{ "model": "huge" }"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(json_content.as_bytes()).unwrap();

        let err = Config::load(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid model: huge"), "message was: {err}");
    }

    #[test]
    fn test_validate_rejects_zero_min_speakers() {
        let config = Config {
            min_speakers: 0,
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid configuration: min_speakers must be at least 1"
        );
    }

    #[test]
    fn test_validate_rejects_inverted_speaker_bounds() {
        let config = Config {
            min_speakers: 5,
            max_speakers: 2,
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid configuration: max_speakers must be >= min_speakers"
        );
    }

    #[test]
    fn test_validate_accepts_equal_bounds() {
        let config = Config {
            min_speakers: 4,
            max_speakers: 4,
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_rejects_invalid_speaker_bounds() {
        let json_content = r#"{ "min_speakers": 0 }"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(json_content.as_bytes()).unwrap();

        assert!(Config::load(temp_file.path()).is_err());
    }

    #[test]
    fn test_env_override_model() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_meetscribe_env();

        set_env("MEETSCRIBE_MODEL", "medium");
        let config = Config::default().with_env_overrides().unwrap();

        assert_eq!(config.model, WhisperModel::Medium);

        clear_meetscribe_env();
    }

    #[test]
    fn test_env_override_invalid_model_is_an_error() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_meetscribe_env();

        set_env("MEETSCRIBE_MODEL", "gigantic");
        let result = Config::default().with_env_overrides();
        assert!(result.is_err());

        clear_meetscribe_env();
    }

    #[test]
    fn test_env_override_all() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_meetscribe_env();

        set_env("MEETSCRIBE_MODEL", "base");
        set_env("MEETSCRIBE_HF_TOKEN", "hf_env");
        set_env("MEETSCRIBE_OUTPUT_DIR", "/tmp/captures");

        let config = Config::default().with_env_overrides().unwrap();

        assert_eq!(config.model, WhisperModel::Base);
        assert_eq!(config.huggingface_token, Some("hf_env".to_string()));
        assert_eq!(config.paths.output_dir, Some(PathBuf::from("/tmp/captures")));

        clear_meetscribe_env();
    }

    #[test]
    fn test_env_override_empty_string_ignored() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_meetscribe_env();

        set_env("MEETSCRIBE_MODEL", "");
        let config = Config::default().with_env_overrides().unwrap();

        // Empty string should not override default
        assert_eq!(config.model, WhisperModel::LargeV3);

        clear_meetscribe_env();
    }

    #[test]
    fn test_token_prefers_config_over_env() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_meetscribe_env();

        set_env("HF_TOKEN", "hf_from_env");
        let config = Config {
            huggingface_token: Some("hf_from_config".to_string()),
            ..Config::default()
        };

        assert_eq!(config.huggingface_token(), Some("hf_from_config".to_string()));

        clear_meetscribe_env();
    }

    #[test]
    fn test_token_falls_back_to_env() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_meetscribe_env();

        set_env("HF_TOKEN", "hf_from_env");
        let config = Config::default();

        assert_eq!(config.huggingface_token(), Some("hf_from_env".to_string()));

        clear_meetscribe_env();
    }

    #[test]
    fn test_token_absent_everywhere() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_meetscribe_env();

        let config = Config::default();
        assert_eq!(config.huggingface_token(), None);

        // Empty config value does not mask the absence
        let config = Config {
            huggingface_token: Some(String::new()),
            ..Config::default()
        };
        assert_eq!(config.huggingface_token(), None);
    }

    #[test]
    fn test_load_search_explicit_missing_is_an_error() {
        let result = Config::load_search(Some(Path::new("/no/such/file.json")));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_search_explicit_file_wins() {
        let json_content = r#"{ "model": "turbo" }"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(json_content.as_bytes()).unwrap();

        let config = Config::load_search(Some(temp_file.path())).unwrap();
        assert_eq!(config.model, WhisperModel::Turbo);
    }

    #[test]
    fn test_default_path_is_xdg_compliant() {
        let path = Config::default_path();
        let path_str = path.to_string_lossy();

        assert!(path_str.contains("meetscribe"));
        assert!(path_str.ends_with("config.json"));
    }

    #[test]
    fn test_to_json_pretty_round_trips() {
        let config = Config {
            model: WhisperModel::Small,
            min_speakers: 3,
            ..Config::default()
        };

        let json = config.to_json_pretty().unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
