use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use grounding_core::CoreSettings;
use grounding_engine::{
    AtomicFileWriter, ClientSettings, EngineSettings, UploadSettings, DEFAULT_BASE_URL,
};
use serde::{Deserialize, Serialize};

use super::logging::LogDestination;

pub const DEFAULT_CONFIG_FILE: &str = "groundtruth.ron";

/// Settings read from `groundtruth.ron`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub connect_timeout_ms: u64,
    /// `None` waits for the backend as long as it takes.
    pub request_timeout_ms: Option<u64>,
    pub upload_concurrency: usize,
    pub search_results: usize,
    pub parse_dwell_ms: u64,
    pub index_dwell_ms: u64,
    pub cache_dir: PathBuf,
    pub log_destination: LogDestination,
    pub viewport_height_px: f64,
    /// Page height at 100% zoom for documents that cannot be measured.
    pub page_height_px: f64,
    pub validated_by: String,
    /// How long a command waits for outstanding backend work.
    pub settle_timeout_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout_ms: 10_000,
            request_timeout_ms: None,
            upload_concurrency: grounding_core::DEFAULT_UPLOAD_CONCURRENCY,
            search_results: grounding_core::DEFAULT_SEARCH_RESULTS,
            parse_dwell_ms: 1_000,
            index_dwell_ms: 2_000,
            cache_dir: PathBuf::from(".groundtruth-cache"),
            log_destination: LogDestination::File,
            viewport_height_px: 800.0,
            page_height_px: 1_056.0,
            validated_by: "current_user".to_string(),
            settle_timeout_ms: 300_000,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        ron::from_str(&content)
            .map(Some)
            .map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Defaults when the file is missing or unreadable; the error is handed
    /// back so it can be logged once logging is up.
    pub fn load_or_default(path: &Path) -> (Self, Option<ConfigError>) {
        match Self::load(path) {
            Ok(Some(config)) => (config, None),
            Ok(None) => (Self::default(), None),
            Err(err) => (Self::default(), Some(err)),
        }
    }

    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::new())
    }

    /// Write this configuration as `path`, replacing any existing file.
    pub fn save(&self, path: &Path) -> anyhow::Result<PathBuf> {
        let content = self.to_ron()?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());
        let written = AtomicFileWriter::new(dir).write(&filename, content.as_bytes())?;
        Ok(written)
    }

    pub fn core_settings(&self) -> CoreSettings {
        CoreSettings {
            upload_concurrency: self.upload_concurrency.max(1),
            search_results: self.search_results.max(1),
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            client: ClientSettings {
                base_url: self.base_url.clone(),
                connect_timeout: Duration::from_millis(self.connect_timeout_ms),
                request_timeout: self.request_timeout_ms.map(Duration::from_millis),
                validated_by: self.validated_by.clone(),
            },
            upload: UploadSettings {
                parse_dwell: Duration::from_millis(self.parse_dwell_ms),
                index_dwell: Duration::from_millis(self.index_dwell_ms),
            },
            cache_dir: self.cache_dir.clone(),
        }
    }

    pub fn settle_timeout(&self) -> Duration {
        Duration::from_millis(self.settle_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_means_defaults() {
        let temp = TempDir::new().unwrap();
        let (config, err) = AppConfig::load_or_default(&temp.path().join("absent.ron"));
        assert!(err.is_none());
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.upload_concurrency, 3);
        assert_eq!(config.search_results, 10);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("groundtruth.ron");
        fs::write(
            &path,
            r#"(base_url: "http://docs.internal:9000", request_timeout_ms: Some(5000), log_destination: Both)"#,
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap().unwrap();
        assert_eq!(config.base_url, "http://docs.internal:9000");
        assert_eq!(config.request_timeout_ms, Some(5000));
        assert_eq!(config.log_destination, LogDestination::Both);
        assert_eq!(config.parse_dwell_ms, 1_000);

        let engine = config.engine_settings();
        assert_eq!(
            engine.client.request_timeout,
            Some(Duration::from_millis(5000))
        );
    }

    #[test]
    fn malformed_file_falls_back_with_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("groundtruth.ron");
        fs::write(&path, "(base_url: 42").unwrap();

        let (config, err) = AppConfig::load_or_default(&path);
        assert_eq!(config, AppConfig::default());
        assert!(matches!(err, Some(ConfigError::Parse { .. })));
    }

    #[test]
    fn saved_config_reads_back() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("groundtruth.ron");
        let config = AppConfig {
            upload_concurrency: 5,
            ..AppConfig::default()
        };
        let written = config.save(&path).unwrap();
        assert_eq!(written, path);
        assert_eq!(AppConfig::load(&path).unwrap(), Some(config));
    }

    #[test]
    fn zero_concurrency_is_raised_to_one() {
        let config = AppConfig {
            upload_concurrency: 0,
            ..AppConfig::default()
        };
        assert_eq!(config.core_settings().upload_concurrency, 1);
    }
}
