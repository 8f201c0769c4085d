use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::info;

use crate::config::{CredentialsLoader, KaggleCredentials};
use crate::domain::DatasetHandle;
use crate::error::VocError;
use crate::fs_util;
use crate::store::{CacheMarker, HubCache, atomic_rename_dir};

pub const DEFAULT_BASE_URL: &str = "https://www.kaggle.com/api/v1";

/// Source of a dataset on local disk. The returned path is either an archive
/// file or a directory of already extracted files.
pub trait DatasetProvider: Send + Sync {
    fn download(&self, dataset: &DatasetHandle, force_download: bool)
    -> Result<PathBuf, VocError>;
}

#[derive(Clone)]
pub struct KaggleHttpClient {
    client: Client,
    base_url: String,
    credentials: Option<KaggleCredentials>,
    cache: HubCache,
}

impl KaggleHttpClient {
    pub fn new() -> Result<Self, VocError> {
        let credentials = CredentialsLoader::resolve()?;
        Self::with_parts(DEFAULT_BASE_URL.to_string(), credentials, HubCache::new()?)
    }

    pub fn with_parts(
        base_url: String,
        credentials: Option<KaggleCredentials>,
        cache: HubCache,
    ) -> Result<Self, VocError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("pascal-voc-fetch/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| VocError::KaggleHttp(err.to_string()))?,
        );

        // The archive is large; only bound the connect phase.
        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(30))
            .timeout(None::<Duration>)
            .build()
            .map_err(|err| VocError::KaggleHttp(err.to_string()))?;

        Ok(Self {
            client,
            base_url,
            credentials,
            cache,
        })
    }

    pub fn download_url(&self, dataset: &DatasetHandle) -> String {
        let url = format!(
            "{}/datasets/download/{}/{}",
            self.base_url.trim_end_matches('/'),
            dataset.owner(),
            dataset.name()
        );
        match dataset.version() {
            Some(version) => format!("{url}?datasetVersionNumber={version}"),
            None => url,
        }
    }

    pub fn cache(&self) -> &HubCache {
        &self.cache
    }

    fn write_response_to_file(
        &self,
        mut response: reqwest::blocking::Response,
        destination: &Path,
    ) -> Result<u64, VocError> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "Kaggle request failed".to_string());
            return Err(VocError::KaggleStatus { status, message });
        }

        let mut file =
            File::create(destination).map_err(|err| VocError::Filesystem(err.to_string()))?;
        std::io::copy(&mut response, &mut file).map_err(|err| VocError::KaggleHttp(err.to_string()))
    }
}

impl DatasetProvider for KaggleHttpClient {
    fn download(
        &self,
        dataset: &DatasetHandle,
        force_download: bool,
    ) -> Result<PathBuf, VocError> {
        let dataset_dir = self.cache.dataset_dir(dataset);
        if !force_download && self.cache.is_complete(dataset) {
            info!(dataset = %dataset, path = %dataset_dir, "using cached dataset");
            return Ok(dataset_dir.into_std_path_buf());
        }
        self.cache.remove_marker(dataset)?;

        let parent = dataset_dir
            .parent()
            .ok_or_else(|| VocError::Filesystem("invalid cache path".to_string()))?;
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| VocError::Filesystem(err.to_string()))?;
        let temp_dir = tempfile::Builder::new()
            .prefix("voc-fetch-download")
            .tempdir_in(parent.as_std_path())
            .map_err(|err| VocError::Filesystem(err.to_string()))?;
        let zip_path = temp_dir.path().join("archive.zip");

        let url = self.download_url(dataset);
        info!(dataset = %dataset, %url, "kaggle.request");
        let mut request = self.client.get(&url);
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.username, Some(&credentials.key));
        }
        let response = request
            .send()
            .map_err(|err| VocError::KaggleHttp(err.to_string()))?;
        let bytes = self.write_response_to_file(response, &zip_path)?;
        info!(bytes, "kaggle.response");

        let extract_dir = temp_dir.path().join("extract");
        fs::create_dir_all(&extract_dir).map_err(|err| VocError::Filesystem(err.to_string()))?;
        fs_util::extract_zip(&zip_path, &extract_dir)?;
        atomic_rename_dir(&extract_dir, dataset_dir.as_std_path())
            .map_err(|err| VocError::Filesystem(err.to_string()))?;

        let marker = CacheMarker {
            dataset: dataset.to_string(),
            downloaded_at: chrono::Utc::now().to_rfc3339(),
            tool: format!("pascal-voc-fetch/{}", env!("CARGO_PKG_VERSION")),
            resolved_path: dataset_dir.to_string(),
        };
        HubCache::write_marker(&self.cache.completion_marker(dataset), &marker)?;

        Ok(dataset_dir.into_std_path_buf())
    }
}
