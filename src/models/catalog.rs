//! Whisper model metadata catalog.
//!
//! The model set is closed: configuration and CLI flags can only name one of
//! the variants here, so an unknown model is rejected before any file lookup
//! happens.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MeetscribeError;

/// The Whisper models this tool knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum WhisperModel {
    Tiny,
    Base,
    Small,
    Medium,
    #[default]
    LargeV3,
    Turbo,
}

/// All models, in size order. Drives CLI listings and error messages.
pub const ALL_MODELS: &[WhisperModel] = &[
    WhisperModel::Tiny,
    WhisperModel::Base,
    WhisperModel::Small,
    WhisperModel::Medium,
    WhisperModel::LargeV3,
    WhisperModel::Turbo,
];

impl WhisperModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tiny => "tiny",
            Self::Base => "base",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::LargeV3 => "large-v3",
            Self::Turbo => "turbo",
        }
    }

    /// The ggml weights file whisper.cpp loads for this model.
    ///
    /// `large-v3` and `turbo` share the turbo weights: the distilled model
    /// matches large-v3 quality on meeting audio at a fraction of the decode
    /// time, so there is no reason to ship both files.
    pub fn ggml_file(&self) -> &'static str {
        match self {
            Self::Tiny => "ggml-tiny.bin",
            Self::Base => "ggml-base.bin",
            Self::Small => "ggml-small.bin",
            Self::Medium => "ggml-medium.bin",
            Self::LargeV3 | Self::Turbo => "ggml-large-v3-turbo.bin",
        }
    }

    /// Full path of this model's weights inside a models directory.
    pub fn path_in(&self, models_dir: &Path) -> PathBuf {
        models_dir.join(self.ggml_file())
    }
}

impl fmt::Display for WhisperModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WhisperModel {
    type Err = MeetscribeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_MODELS
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| MeetscribeError::InvalidConfig {
                message: format!(
                    "Invalid model: {s}. Valid options: {}",
                    ALL_MODELS
                        .iter()
                        .map(|m| m.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            })
    }
}

impl TryFrom<String> for WhisperModel {
    type Error = MeetscribeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<WhisperModel> for String {
    fn from(model: WhisperModel) -> Self {
        model.as_str().to_string()
    }
}

/// Metadata for a Whisper model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    /// Model identifier as used in config files and on the command line
    pub name: &'static str,
    /// ggml weights file name
    pub file: &'static str,
    /// Approximate weights size in megabytes
    pub size_mb: u32,
    /// One-line description for CLI listings
    pub description: &'static str,
}

/// Catalog of available Whisper models.
///
/// Models range from tiny (75 MB, fast, lower accuracy) to large-v3
/// (highest accuracy, served by the turbo weights).
pub const MODELS: &[ModelInfo] = &[
    ModelInfo {
        name: "tiny",
        file: "ggml-tiny.bin",
        size_mb: 75,
        description: "Fastest, rough drafts only",
    },
    ModelInfo {
        name: "base",
        file: "ggml-base.bin",
        size_mb: 142,
        description: "Fast, acceptable for clear single-speaker audio",
    },
    ModelInfo {
        name: "small",
        file: "ggml-small.bin",
        size_mb: 466,
        description: "Good balance for short meetings",
    },
    ModelInfo {
        name: "medium",
        file: "ggml-medium.bin",
        size_mb: 1533,
        description: "High accuracy, slower",
    },
    ModelInfo {
        name: "large-v3",
        file: "ggml-large-v3-turbo.bin",
        size_mb: 1624,
        description: "Best accuracy (served by the turbo weights)",
    },
    ModelInfo {
        name: "turbo",
        file: "ggml-large-v3-turbo.bin",
        size_mb: 1624,
        description: "Large-v3 quality at several times the speed",
    },
];

/// Find catalog metadata by model name.
pub fn get_model(name: &str) -> Option<&'static ModelInfo> {
    MODELS.iter().find(|m| m.name == name)
}

/// Get all available models.
pub fn list_models() -> &'static [ModelInfo] {
    MODELS
}

/// Catalog metadata for a model variant.
pub fn model_info(model: WhisperModel) -> &'static ModelInfo {
    get_model(model.as_str()).expect("every model variant has a catalog entry")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_model_exists() {
        let model = get_model("tiny");
        assert!(model.is_some());
        let model = model.unwrap();
        assert_eq!(model.name, "tiny");
        assert_eq!(model.size_mb, 75);
    }

    #[test]
    fn test_get_model_not_found() {
        let model = get_model("nonexistent");
        assert!(model.is_none());
    }

    #[test]
    fn test_list_models_count() {
        let models = list_models();
        assert_eq!(models.len(), 6);
        assert_eq!(models.len(), ALL_MODELS.len());
    }

    #[test]
    fn test_default_model_is_large_v3() {
        assert_eq!(WhisperModel::default(), WhisperModel::LargeV3);
        assert_eq!(WhisperModel::default().as_str(), "large-v3");
    }

    #[test]
    fn test_large_v3_and_turbo_share_weights() {
        assert_eq!(WhisperModel::LargeV3.ggml_file(), "ggml-large-v3-turbo.bin");
        assert_eq!(WhisperModel::Turbo.ggml_file(), "ggml-large-v3-turbo.bin");
    }

    #[test]
    fn test_ggml_file_mapping() {
        let expected = [
            (WhisperModel::Tiny, "ggml-tiny.bin"),
            (WhisperModel::Base, "ggml-base.bin"),
            (WhisperModel::Small, "ggml-small.bin"),
            (WhisperModel::Medium, "ggml-medium.bin"),
            (WhisperModel::LargeV3, "ggml-large-v3-turbo.bin"),
            (WhisperModel::Turbo, "ggml-large-v3-turbo.bin"),
        ];
        for (model, file) in expected {
            assert_eq!(model.ggml_file(), file, "wrong file for {model}");
        }
    }

    #[test]
    fn test_path_in_joins_models_dir() {
        let path = WhisperModel::Base.path_in(Path::new("/opt/whisper/models"));
        assert_eq!(path, PathBuf::from("/opt/whisper/models/ggml-base.bin"));
    }

    #[test]
    fn test_from_str_valid_names() {
        for model in ALL_MODELS {
            let parsed: WhisperModel = model.as_str().parse().unwrap();
            assert_eq!(parsed, *model);
        }
    }

    #[test]
    fn test_from_str_invalid_name() {
        let err = "huge".parse::<WhisperModel>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid configuration: Invalid model: huge. Valid options: tiny, base, small, medium, large-v3, turbo"
        );
    }

    #[test]
    fn test_from_str_case_sensitive() {
        assert!("tiny".parse::<WhisperModel>().is_ok());
        assert!("Tiny".parse::<WhisperModel>().is_err());
        assert!("TINY".parse::<WhisperModel>().is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        for model in ALL_MODELS {
            let json = serde_json::to_string(model).unwrap();
            let back: WhisperModel = serde_json::from_str(&json).unwrap();
            assert_eq!(back, *model);
        }
        assert_eq!(
            serde_json::to_string(&WhisperModel::LargeV3).unwrap(),
            "\"large-v3\""
        );
    }

    #[test]
    fn test_serde_rejects_unknown_model() {
        let result = serde_json::from_str::<WhisperModel>("\"huge\"");
        assert!(result.is_err());
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("Invalid model: huge"), "message was: {msg}");
    }

    #[test]
    fn test_catalog_names_match_enum() {
        for (model, info) in ALL_MODELS.iter().zip(list_models()) {
            assert_eq!(model.as_str(), info.name);
            assert_eq!(model.ggml_file(), info.file);
        }
    }

    #[test]
    fn test_model_names_are_unique() {
        let names: Vec<_> = list_models().iter().map(|m| m.name).collect();
        let mut unique_names = names.clone();
        unique_names.sort_unstable();
        unique_names.dedup();
        assert_eq!(names.len(), unique_names.len(), "Model names are not unique");
    }

    #[test]
    fn test_model_sizes_are_correct() {
        let sizes = [
            ("tiny", 75),
            ("base", 142),
            ("small", 466),
            ("medium", 1533),
            ("large-v3", 1624),
            ("turbo", 1624),
        ];

        for (name, expected_size) in sizes {
            let model = get_model(name).unwrap_or_else(|| panic!("Model {} not found", name));
            assert_eq!(model.size_mb, expected_size, "Model {} has wrong size", name);
        }
    }
}
