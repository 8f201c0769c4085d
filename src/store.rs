use std::fs;
use std::io;
use std::path::Path;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config;
use crate::domain::DatasetHandle;
use crate::error::VocError;

/// Copies every top-level entry of `source` into `destination` unless an
/// entry with the same name is already there. Existing entries, including
/// existing directories, are never touched.
pub fn merge_into(source: &Path, destination: &Path) -> Result<(), VocError> {
    fs::create_dir_all(destination).map_err(|err| VocError::Filesystem(err.to_string()))?;

    let entries = fs::read_dir(source)
        .map_err(|err| VocError::Filesystem(format!("read {}: {err}", source.display())))?;
    for entry in entries {
        let entry = entry.map_err(|err| VocError::Filesystem(err.to_string()))?;
        let item = entry.path();
        let dest_item = destination.join(entry.file_name());

        // symlink_metadata so that a dangling link also counts as present
        if fs::symlink_metadata(&dest_item).is_ok() {
            debug!(path = %dest_item.display(), "already present, skipping");
            continue;
        }

        if item.is_dir() {
            copy_tree(&item, &dest_item)?;
        } else {
            copy_file_preserving(&item, &dest_item)?;
        }
    }
    Ok(())
}

pub fn copy_tree(source: &Path, dest: &Path) -> Result<(), VocError> {
    fs::create_dir_all(dest).map_err(|err| VocError::Filesystem(err.to_string()))?;
    let entries = fs::read_dir(source)
        .map_err(|err| VocError::Filesystem(format!("read {}: {err}", source.display())))?;
    for entry in entries {
        let entry = entry.map_err(|err| VocError::Filesystem(err.to_string()))?;
        let path = entry.path();
        let target = dest.join(entry.file_name());
        if path.is_dir() {
            copy_tree(&path, &target)?;
        } else {
            copy_file_preserving(&path, &target)?;
        }
    }
    copy_times(source, dest);
    Ok(())
}

/// `fs::copy` carries permissions; access and modification times are copied
/// afterwards where the platform reports them.
pub fn copy_file_preserving(source: &Path, dest: &Path) -> Result<(), VocError> {
    fs::copy(source, dest).map_err(|err| {
        VocError::Filesystem(format!(
            "copy {} -> {}: {err}",
            source.display(),
            dest.display()
        ))
    })?;
    copy_times(source, dest);
    Ok(())
}

fn copy_times(source: &Path, dest: &Path) {
    let Ok(metadata) = fs::metadata(source) else {
        return;
    };
    let mut times = fs::FileTimes::new();
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }
    if let Ok(modified) = metadata.modified() {
        times = times.set_modified(modified);
    }
    let applied = fs::File::options()
        .write(true)
        .open(dest)
        .or_else(|_| fs::File::open(dest))
        .and_then(|file| file.set_times(times));
    if let Err(err) = applied {
        debug!(path = %dest.display(), %err, "timestamps not preserved");
    }
}

pub fn atomic_rename_dir(from: &Path, to: &Path) -> io::Result<()> {
    if to.exists() {
        fs::remove_dir_all(to)?;
    }
    fs::rename(from, to)
}

/// On-disk layout of the local hub cache.
#[derive(Debug, Clone)]
pub struct HubCache {
    root: Utf8PathBuf,
}

impl HubCache {
    pub fn new() -> Result<Self, VocError> {
        Ok(Self {
            root: config::cache_root()?,
        })
    }

    pub fn new_with_root(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    pub fn dataset_dir(&self, dataset: &DatasetHandle) -> Utf8PathBuf {
        let base = self
            .root
            .join("datasets")
            .join(dataset.owner())
            .join(dataset.name());
        match dataset.version() {
            Some(version) => base.join("versions").join(version.to_string()),
            None => base.join("latest"),
        }
    }

    pub fn completion_marker(&self, dataset: &DatasetHandle) -> Utf8PathBuf {
        let dir = self.dataset_dir(dataset);
        dir.with_extension("complete")
    }

    /// A dataset is complete when its marker parses and points at the
    /// directory that is actually present.
    pub fn is_complete(&self, dataset: &DatasetHandle) -> bool {
        let dir = self.dataset_dir(dataset);
        match Self::read_marker(&self.completion_marker(dataset)) {
            Ok(marker) => marker.resolved_path == dir.as_str() && dir.as_std_path().is_dir(),
            Err(_) => false,
        }
    }

    pub fn write_marker(path: &Utf8Path, marker: &CacheMarker) -> Result<(), VocError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent.as_std_path())
                .map_err(|err| VocError::Filesystem(err.to_string()))?;
        }
        let tmp_path = path.with_extension("complete.tmp");
        let content = serde_json::to_vec_pretty(marker)
            .map_err(|err| VocError::Filesystem(err.to_string()))?;
        fs::write(tmp_path.as_std_path(), &content)
            .map_err(|err| VocError::Filesystem(err.to_string()))?;
        fs::rename(tmp_path.as_std_path(), path.as_std_path())
            .map_err(|err| VocError::Filesystem(err.to_string()))?;
        Ok(())
    }

    pub fn read_marker(path: &Utf8Path) -> Result<CacheMarker, VocError> {
        let content = fs::read_to_string(path.as_std_path())
            .map_err(|err| VocError::Filesystem(err.to_string()))?;
        serde_json::from_str(&content).map_err(|err| VocError::Filesystem(err.to_string()))
    }

    pub fn remove_marker(&self, dataset: &DatasetHandle) -> Result<(), VocError> {
        let marker = self.completion_marker(dataset);
        if marker.as_std_path().exists() {
            fs::remove_file(marker.as_std_path())
                .map_err(|err| VocError::Filesystem(err.to_string()))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMarker {
    pub dataset: String,
    pub downloaded_at: String,
    pub tool: String,
    pub resolved_path: String,
}
