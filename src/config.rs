use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::domain::DatasetHandle;
use crate::error::VocError;

pub const EXPECTED_FILES: [&str; 3] = [
    "pascal_train2007.json",
    "pascal_val2007.json",
    "pascal_test2007.json",
];

/// Knobs for a single fetch. `Default` is the PASCAL VOC 2007 setup.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub dataset: DatasetHandle,
    pub target_subdir: PathBuf,
    pub expected_files: Vec<String>,
    pub force_download: bool,
    pub start_dir: Option<PathBuf>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            dataset: DatasetHandle::pascal_voc_2007(),
            target_subdir: default_target_subdir(),
            expected_files: default_expected_files(),
            force_download: false,
            start_dir: None,
        }
    }
}

pub fn default_target_subdir() -> PathBuf {
    PathBuf::from("data").join("processed")
}

pub fn default_expected_files() -> Vec<String> {
    EXPECTED_FILES.iter().map(|name| name.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct KaggleCredentials {
    pub username: String,
    pub key: String,
}

pub struct CredentialsLoader;

impl CredentialsLoader {
    /// Environment first, then `kaggle.json`. Missing credentials are not an
    /// error; public datasets may still download anonymously.
    pub fn resolve() -> Result<Option<KaggleCredentials>, VocError> {
        if let Some(credentials) = Self::from_env() {
            return Ok(Some(credentials));
        }
        match Self::config_path() {
            Some(path) if path.exists() => Self::load(path).map(Some),
            _ => Ok(None),
        }
    }

    pub fn from_env() -> Option<KaggleCredentials> {
        let username = std::env::var("KAGGLE_USERNAME").ok()?;
        let key = std::env::var("KAGGLE_KEY").ok()?;
        if username.trim().is_empty() || key.trim().is_empty() {
            return None;
        }
        Some(KaggleCredentials {
            username: username.trim().to_string(),
            key: key.trim().to_string(),
        })
    }

    pub fn config_path() -> Option<PathBuf> {
        if let Ok(dir) = std::env::var("KAGGLE_CONFIG_DIR") {
            if !dir.trim().is_empty() {
                return Some(PathBuf::from(dir).join("kaggle.json"));
            }
        }
        BaseDirs::new().map(|dirs| dirs.home_dir().join(".kaggle").join("kaggle.json"))
    }

    pub fn load(path: PathBuf) -> Result<KaggleCredentials, VocError> {
        let content =
            fs::read_to_string(&path).map_err(|_| VocError::CredentialsRead(path.clone()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<KaggleCredentials, VocError> {
        serde_json::from_str(content).map_err(|err| VocError::CredentialsParse(err.to_string()))
    }
}

/// Root of the local hub cache: `$KAGGLEHUB_CACHE`, else `~/.cache/kagglehub`.
pub fn cache_root() -> Result<Utf8PathBuf, VocError> {
    if let Ok(dir) = std::env::var("KAGGLEHUB_CACHE") {
        if !dir.trim().is_empty() {
            return Ok(Utf8PathBuf::from(dir));
        }
    }
    BaseDirs::new()
        .and_then(|dirs| {
            Utf8PathBuf::from_path_buf(dirs.home_dir().join(".cache").join("kagglehub")).ok()
        })
        .ok_or_else(|| VocError::Filesystem("unable to resolve cache directory".to_string()))
}
