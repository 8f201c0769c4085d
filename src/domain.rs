use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::VocError;

pub const PASCAL_VOC_2007: &str = "zaraks/pascal-voc-2007";

static HANDLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9][A-Za-z0-9_.-]*)/([A-Za-z0-9][A-Za-z0-9_.-]*)(?:/versions/(\d+))?$")
        .unwrap()
});

/// A Kaggle dataset reference: `owner/name`, optionally pinned with
/// `/versions/N`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetHandle {
    owner: String,
    name: String,
    version: Option<u32>,
}

impl DatasetHandle {
    pub(crate) fn from_parts(owner: &str, name: &str) -> Self {
        Self {
            owner: owner.to_string(),
            name: name.to_string(),
            version: None,
        }
    }

    pub fn pascal_voc_2007() -> Self {
        Self::from_parts("zaraks", "pascal-voc-2007")
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<u32> {
        self.version
    }
}

impl fmt::Display for DatasetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.version {
            Some(version) => write!(f, "{}/{}/versions/{version}", self.owner, self.name),
            None => write!(f, "{}/{}", self.owner, self.name),
        }
    }
}

impl FromStr for DatasetHandle {
    type Err = VocError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim().trim_end_matches('/');
        let captures = HANDLE_RE
            .captures(trimmed)
            .ok_or_else(|| VocError::InvalidHandle(value.to_string()))?;
        let version = match captures.get(3) {
            Some(raw) => Some(
                raw.as_str()
                    .parse::<u32>()
                    .map_err(|_| VocError::InvalidHandle(value.to_string()))?,
            ),
            None => None,
        };
        Ok(Self {
            owner: captures[1].to_string(),
            name: captures[2].to_string(),
            version,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArchiveFormat {
    Zip,
    Tar,
    TarGz,
    TarBz2,
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveFormat::Zip => write!(f, "zip"),
            ArchiveFormat::Tar => write!(f, "tar"),
            ArchiveFormat::TarGz => write!(f, "tar.gz"),
            ArchiveFormat::TarBz2 => write!(f, "tar.bz2"),
        }
    }
}
