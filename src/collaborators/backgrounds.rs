/*!
 * Background video assets.
 *
 * `BackgroundPool` picks one video from the background directory;
 * `BackgroundFetcher` fills that directory from the Pixabay video API.
 */

use log::{debug, info, warn};
use rand::seq::IndexedRandom;
use rand::Rng;
use reqwest::Client;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{CollaboratorError, ProviderError};
use crate::file_utils::FileManager;
use crate::generation::workspace::ArtifactDir;

/// Directory of candidate background videos
#[derive(Debug, Clone)]
pub struct BackgroundPool {
    dir: PathBuf,
}

impl BackgroundPool {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Every video file currently in the pool
    pub fn list(&self) -> Result<Vec<PathBuf>, CollaboratorError> {
        FileManager::list_videos(&self.dir).map_err(|source| CollaboratorError::AssetListing {
            dir: self.dir.clone(),
            source,
        })
    }

    /// Pick a video uniformly at random
    pub fn select(&self) -> Result<PathBuf, CollaboratorError> {
        self.select_with(&mut rand::rng())
    }

    /// `select` on the blocking pool, for use from async code
    pub async fn select_async(&self) -> Result<PathBuf, CollaboratorError> {
        let pool = self.clone();
        tokio::task::spawn_blocking(move || pool.select())
            .await
            .map_err(|e| CollaboratorError::Io(std::io::Error::other(format!("Background selection task failed: {}", e))))?
    }

    /// Pick a video uniformly at random using `rng`
    pub fn select_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<PathBuf, CollaboratorError> {
        let videos = self.list()?;
        let chosen = videos
            .choose(rng)
            .cloned()
            .ok_or_else(|| CollaboratorError::NoBackgrounds(self.dir.clone()))?;
        debug!("Selected background {} out of {}", chosen.display(), videos.len());
        Ok(chosen)
    }
}

#[derive(Debug, Deserialize)]
struct VideoSearchResponse {
    #[serde(default)]
    hits: Vec<VideoHit>,
}

#[derive(Debug, Deserialize)]
struct VideoHit {
    #[serde(default)]
    id: u64,
    videos: VideoRenditions,
}

#[derive(Debug, Deserialize)]
struct VideoRenditions {
    medium: VideoFile,
}

#[derive(Debug, Deserialize)]
struct VideoFile {
    url: String,
}

/// Downloads vertical background videos for a topic from Pixabay
#[derive(Debug, Clone)]
pub struct BackgroundFetcher {
    client: Client,
    // @field: API base, e.g. https://pixabay.com/api
    endpoint: String,
    api_key: String,
    per_page: u32,
}

impl BackgroundFetcher {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>, per_page: u32, timeout: Duration) -> Self {
        Self {
            client: Client::builder().timeout(timeout).build().unwrap_or_default(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            per_page: per_page.max(3),
        }
    }

    /// Search URL for `topic`
    pub fn search_url(&self, topic: &str) -> Result<url::Url, ProviderError> {
        let per_page = self.per_page.to_string();
        url::Url::parse_with_params(
            &format!("{}/videos/", self.endpoint),
            &[
                ("key", self.api_key.as_str()),
                ("q", topic),
                ("orientation", "vertical"),
                ("per_page", per_page.as_str()),
                ("min_width", "720"),
                ("min_height", "1280"),
            ],
        )
        .map_err(|e| ProviderError::RequestFailed(format!("Invalid video search URL: {}", e)))
    }

    /// Download the medium rendition of every hit for `topic` into `dest`
    pub async fn fetch(&self, topic: &str, dest: &ArtifactDir) -> Result<Vec<PathBuf>, CollaboratorError> {
        let url = self.search_url(topic)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to reach video search API: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message,
            }
            .into());
        }

        let search: VideoSearchResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Invalid video search response: {}", e)))?;

        if search.hits.is_empty() {
            warn!("No background videos found for '{}'", topic);
            return Err(CollaboratorError::EmptyOutput("video search result"));
        }

        FileManager::ensure_dir(dest.path())?;
        let mut saved = Vec::with_capacity(search.hits.len());

        for hit in search.hits {
            let target = dest.artifact_path("mp4");
            debug!("Downloading video {} to {}", hit.id, target.display());

            let video = self
                .client
                .get(&hit.videos.medium.url)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| ProviderError::RequestFailed(format!("Failed to download video {}: {}", hit.id, e)))?
                .bytes()
                .await
                .map_err(|e| ProviderError::RequestFailed(format!("Failed to read video {}: {}", hit.id, e)))?;

            FileManager::write_bytes(&target, &video)?;
            saved.push(target);
        }

        info!("Downloaded {} background videos for '{}'", saved.len(), topic);
        Ok(saved)
    }
}
