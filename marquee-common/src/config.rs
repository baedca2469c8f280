//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration comes from a small TOML file. Every field has a
//! built-in default, so a missing file only produces a warning.
//!
//! Root folder priority:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`MARQUEE_ROOT_FOLDER`)
//! 3. TOML config file (`root_folder`)
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the root folder
pub const ROOT_FOLDER_ENV: &str = "MARQUEE_ROOT_FOLDER";

/// Default number of rows per flushed batch
pub const DEFAULT_BATCH_SIZE: usize = 2000;

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Folder holding the database and the default data directory
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// SQLite database file (default: `<root>/marquee.db`)
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub ingest: IngestConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Which stored counts decide whether a dataset is loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatePolicy {
    /// Any stored movie skips all five datasets
    #[default]
    PrimaryOnly,
    /// Each dataset is loaded only while its own table is empty
    PerDataset,
}

/// Bulk ingestion settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Directory holding the dataset exports (default: `<root>/data`)
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default)]
    pub gate: GatePolicy,

    /// Per-kind file name overrides, relative to `data_dir`
    #[serde(default)]
    pub files: DatasetFiles,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            batch_size: default_batch_size(),
            gate: GatePolicy::default(),
            files: DatasetFiles::default(),
        }
    }
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

/// Export file names, one per dataset kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetFiles {
    #[serde(default = "default_movie_file")]
    pub movie: String,
    #[serde(default = "default_person_file")]
    pub person: String,
    #[serde(default = "default_crew_credit_file")]
    pub crew_credit: String,
    #[serde(default = "default_external_review_file")]
    pub external_review: String,
    #[serde(default = "default_similar_movie_file")]
    pub similar_movie: String,
}

impl Default for DatasetFiles {
    fn default() -> Self {
        Self {
            movie: default_movie_file(),
            person: default_person_file(),
            crew_credit: default_crew_credit_file(),
            external_review: default_external_review_file(),
            similar_movie: default_similar_movie_file(),
        }
    }
}

impl DatasetFiles {
    pub fn file_name(&self, kind: crate::EntityKind) -> &str {
        use crate::EntityKind;
        match kind {
            EntityKind::Movie => &self.movie,
            EntityKind::Person => &self.person,
            EntityKind::CrewCredit => &self.crew_credit,
            EntityKind::ExternalReview => &self.external_review,
            EntityKind::SimilarMovie => &self.similar_movie,
        }
    }
}

fn default_movie_file() -> String {
    crate::EntityKind::Movie.default_file_name().to_string()
}

fn default_person_file() -> String {
    crate::EntityKind::Person.default_file_name().to_string()
}

fn default_crew_credit_file() -> String {
    crate::EntityKind::CrewCredit.default_file_name().to_string()
}

fn default_external_review_file() -> String {
    crate::EntityKind::ExternalReview.default_file_name().to_string()
}

fn default_similar_movie_file() -> String {
    crate::EntityKind::SimilarMovie.default_file_name().to_string()
}

impl TomlConfig {
    /// Parse a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
    }

    /// Load the config file, falling back to defaults when it does not exist
    ///
    /// An explicit path that exists but fails to parse is an error; a missing
    /// file is not. Nothing is logged here: the caller reports the returned
    /// [`ConfigSource`] once logging is up.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<(Self, ConfigSource)> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) => path,
                None => return Ok((Self::default(), ConfigSource::NoConfigDir)),
            },
        };

        if path.exists() {
            let config = Self::from_file(&path)?;
            Ok((config, ConfigSource::File(path)))
        } else {
            Ok((Self::default(), ConfigSource::Missing(path)))
        }
    }
}

/// Where the bootstrap configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    /// Expected file does not exist; built-in defaults are in use
    Missing(PathBuf),
    NoConfigDir,
}

impl ConfigSource {
    pub fn log(&self) {
        match self {
            ConfigSource::File(path) => info!("Loaded configuration from {}", path.display()),
            ConfigSource::Missing(path) => warn!(
                "Config file {} not found, using built-in defaults",
                path.display()
            ),
            ConfigSource::NoConfigDir => {
                warn!("Could not determine config directory, using built-in defaults")
            }
        }
    }
}

/// `<config_dir>/marquee/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("marquee").join("config.toml"))
}

/// Root folder resolution following the documented priority order
pub fn resolve_root_folder(cli_arg: Option<&Path>, toml_config: &TomlConfig) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = &toml_config.root_folder {
        return path.clone();
    }

    // Priority 4: OS-dependent compiled default
    get_default_root_folder()
}

/// Get OS-dependent default root folder path
pub fn get_default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/marquee
        dirs::data_local_dir()
            .map(|d| d.join("marquee"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/marquee"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/marquee
        dirs::data_dir()
            .map(|d| d.join("marquee"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/marquee"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\marquee
        dirs::data_local_dir()
            .map(|d| d.join("marquee"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\marquee"))
    } else {
        PathBuf::from("./marquee_data")
    }
}

/// Fully resolved paths and settings for one ingest run
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub root_folder: PathBuf,
    pub database_path: PathBuf,
    pub data_dir: PathBuf,
    pub ingest: IngestConfig,
    pub logging: LoggingConfig,
}

impl ResolvedConfig {
    /// Combine CLI overrides with the TOML config
    pub fn resolve(toml_config: TomlConfig, overrides: ConfigOverrides) -> Result<Self> {
        let root_folder = resolve_root_folder(overrides.root_folder.as_deref(), &toml_config);

        let database_path = overrides
            .database_path
            .or(toml_config.database_path)
            .unwrap_or_else(|| root_folder.join("marquee.db"));

        let mut ingest = toml_config.ingest;
        if let Some(batch_size) = overrides.batch_size {
            ingest.batch_size = batch_size;
        }
        if let Some(gate) = overrides.gate {
            ingest.gate = gate;
        }

        let data_dir = overrides
            .data_dir
            .or_else(|| ingest.data_dir.clone())
            .unwrap_or_else(|| root_folder.join("data"));

        let resolved = Self {
            root_folder,
            database_path,
            data_dir,
            ingest,
            logging: toml_config.logging,
        };

        if resolved.ingest.batch_size == 0 {
            return Err(Error::Config(
                "ingest.batch_size must be at least 1".to_string(),
            ));
        }

        Ok(resolved)
    }

    /// Path of the export file for one dataset kind
    pub fn dataset_path(&self, kind: crate::EntityKind) -> PathBuf {
        self.data_dir.join(self.ingest.files.file_name(kind))
    }
}

/// Command-line configuration overrides
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub root_folder: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub batch_size: Option<usize>,
    pub gate: Option<GatePolicy>,
}
