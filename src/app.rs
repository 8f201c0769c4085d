use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::FetchSettings;
use crate::error::VocError;
use crate::fs_util::{self, Extraction};
use crate::kaggle::DatasetProvider;
use crate::paths;
use crate::store;

#[derive(Debug, Clone, Serialize)]
pub struct FetchReport {
    pub repo_root: PathBuf,
    pub target_dir: PathBuf,
    pub download_path: PathBuf,
    pub extraction: Option<Extraction>,
    pub expected_files: Vec<String>,
    pub missing_files: Vec<String>,
}

impl FetchReport {
    pub fn is_complete(&self) -> bool {
        self.missing_files.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLevel {
    Info,
    Warn,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub level: EventLevel,
    pub message: String,
    pub elapsed: Option<Duration>,
}

impl ProgressEvent {
    fn info(message: String) -> Self {
        Self {
            level: EventLevel::Info,
            message,
            elapsed: None,
        }
    }
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

#[derive(Clone)]
pub struct Fetcher<P: DatasetProvider> {
    provider: P,
    settings: FetchSettings,
}

impl<P: DatasetProvider> Fetcher<P> {
    pub fn new(provider: P, settings: FetchSettings) -> Self {
        Self { provider, settings }
    }

    /// Downloads the dataset and merges it into `<repo root>/data/processed`
    /// without overwriting anything already there.
    pub fn fetch_and_place(&self, sink: &dyn ProgressSink) -> Result<FetchReport, VocError> {
        let settings = &self.settings;
        let repo_root =
            paths::locate_repo_root_with(settings.start_dir.as_deref(), &settings.target_subdir)?;
        let target_dir = paths::target_dir(&repo_root, &settings.target_subdir);
        fs::create_dir_all(&target_dir).map_err(|err| VocError::Filesystem(err.to_string()))?;

        sink.event(ProgressEvent::info(format!(
            "Repo root: {}",
            repo_root.display()
        )));
        sink.event(ProgressEvent::info(format!(
            "Target dir: {}",
            target_dir.display()
        )));

        let start = Instant::now();
        let download_path = self
            .provider
            .download(&settings.dataset, settings.force_download)?;
        sink.event(ProgressEvent {
            level: EventLevel::Info,
            message: format!("Downloaded to: {}", download_path.display()),
            elapsed: Some(start.elapsed()),
        });

        let extraction = if download_path.is_file() {
            let extraction = fs_util::extract_if_archive(&download_path)?;
            if let Extraction::Extracted { format, .. } = &extraction {
                sink.event(ProgressEvent::info(format!("Extracted {format} archive")));
            }
            store::merge_into(extraction.base(), &target_dir)?;
            Some(extraction)
        } else if download_path.is_dir() {
            store::merge_into(&download_path, &target_dir)?;
            None
        } else {
            return Err(VocError::Filesystem(format!(
                "download path is neither a file nor a directory: {}",
                download_path.display()
            )));
        };

        let missing_files = missing_files(&target_dir, &settings.expected_files);
        if missing_files.is_empty() {
            sink.event(ProgressEvent::info(format!(
                "All expected JSON files present: {}",
                settings.expected_files.join(", ")
            )));
        } else {
            sink.event(ProgressEvent {
                level: EventLevel::Warn,
                message: format!("Warning: missing files after copy: {missing_files:?}"),
                elapsed: None,
            });
        }

        Ok(FetchReport {
            repo_root,
            target_dir,
            download_path,
            extraction,
            expected_files: settings.expected_files.clone(),
            missing_files,
        })
    }
}

/// Names from `expected` with no entry directly under `target_dir`, in the
/// order given. Nested copies are not searched.
pub fn missing_files(target_dir: &Path, expected: &[String]) -> Vec<String> {
    expected
        .iter()
        .filter(|name| !target_dir.join(name.as_str()).exists())
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DatasetHandle;
    use std::sync::Mutex;

    struct FileProvider {
        path: PathBuf,
        calls: Mutex<Vec<(String, bool)>>,
    }

    impl DatasetProvider for FileProvider {
        fn download(
            &self,
            dataset: &DatasetHandle,
            force_download: bool,
        ) -> Result<PathBuf, VocError> {
            self.calls
                .lock()
                .unwrap()
                .push((dataset.to_string(), force_download));
            Ok(self.path.clone())
        }
    }

    struct NoopSink;

    impl ProgressSink for NoopSink {
        fn event(&self, _event: ProgressEvent) {}
    }

    #[test]
    fn missing_files_keeps_expected_order() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("pascal_train2007.json"), b"{}").unwrap();

        let missing = missing_files(temp.path(), &crate::config::default_expected_files());
        assert_eq!(missing, vec!["pascal_val2007.json", "pascal_test2007.json"]);
    }

    #[test]
    fn non_archive_file_merges_its_parent() {
        let temp = tempfile::tempdir().unwrap();
        let download_dir = temp.path().join("download");
        fs::create_dir_all(&download_dir).unwrap();
        let blob = download_dir.join("blob.bin");
        fs::write(&blob, b"not an archive").unwrap();

        let repo = temp.path().join("repo");
        fs::create_dir_all(repo.join("data").join("processed")).unwrap();

        let provider = FileProvider {
            path: blob,
            calls: Mutex::new(Vec::new()),
        };
        let settings = FetchSettings {
            start_dir: Some(repo.clone()),
            ..FetchSettings::default()
        };
        let fetcher = Fetcher::new(provider, settings);
        let report = fetcher.fetch_and_place(&NoopSink).unwrap();

        assert!(matches!(
            report.extraction,
            Some(Extraction::NotAnArchive { .. })
        ));
        assert!(report.target_dir.join("blob.bin").is_file());
        assert_eq!(report.missing_files.len(), 3);
        assert_eq!(
            fetcher.provider.calls.lock().unwrap().as_slice(),
            &[("zaraks/pascal-voc-2007".to_string(), false)]
        );
    }
}
