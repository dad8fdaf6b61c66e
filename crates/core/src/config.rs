use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::{BaseDirs, ProjectDirs};
use once_cell::sync::Lazy;

static STORAGE_FILE_NAME: &str = "storage.json";
static ENV_DATA_DIR: &str = "TASKBOARD_DATA_DIR";
static ENV_API_URL: &str = "TASKBOARD_API_URL";
static DEFAULT_API_URL: &str = "http://localhost:5000";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

static PROJECT_DIRS: Lazy<Option<ProjectDirs>> =
    Lazy::new(|| ProjectDirs::from("dev", "taskboard", "taskboard"));

#[derive(Debug, Clone)]
pub struct AppConfig {
    data_dir: PathBuf,
    storage_path: PathBuf,
    api_url: String,
    request_timeout: Duration,
}

impl AppConfig {
    /// Construct [`AppConfig`] by resolving the data directory and API base URL from the
    /// provided overrides, environment variables, and platform defaults.
    pub fn discover(
        data_dir_override: Option<PathBuf>,
        api_url_override: Option<String>,
    ) -> Result<Self> {
        let data_dir = resolve_data_dir(data_dir_override)?;
        if !data_dir.exists() {
            fs::create_dir_all(&data_dir).with_context(|| {
                format!("Failed to create data directory at {}", data_dir.display())
            })?;
        }
        let config = Self::from_data_dir(data_dir)?;
        Ok(config.with_api_url(resolve_api_url(api_url_override)))
    }

    /// Construct [`AppConfig`] directly from a resolved data directory.
    pub fn from_data_dir(data_dir: PathBuf) -> Result<Self> {
        let storage_path = data_dir.join(STORAGE_FILE_NAME);
        Ok(Self {
            data_dir,
            storage_path,
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = normalize_api_url(api_url.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn storage_path(&self) -> &Path {
        &self.storage_path
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

fn resolve_api_url(api_url_override: Option<String>) -> String {
    if let Some(url) = api_url_override {
        return url;
    }

    env::var(ENV_API_URL).unwrap_or_else(|_| DEFAULT_API_URL.to_string())
}

fn normalize_api_url(url: String) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        DEFAULT_API_URL.to_string()
    } else {
        trimmed.to_string()
    }
}

fn resolve_data_dir(data_dir_override: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = data_dir_override {
        return Ok(dir);
    }

    if let Ok(env_dir) = env::var(ENV_DATA_DIR) {
        return Ok(PathBuf::from(env_dir));
    }

    if cfg!(debug_assertions) {
        let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        let dev_dir = manifest_dir.join("..").join("tmp").join("dev-taskboard");
        return Ok(dev_dir);
    }

    if let Some(project) = &*PROJECT_DIRS {
        return Ok(project.data_dir().to_path_buf());
    }

    if let Some(base) = BaseDirs::new() {
        return Ok(base.home_dir().join(".taskboard"));
    }

    Ok(env::current_dir()?.join(".taskboard"))
}
