//! Configuration file loading with precedence handling.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during config loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Failed to read config file (file may not exist or have permission issues).
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError {
        /// Path that failed to read.
        path: PathBuf,
        /// Reason for failure.
        reason: String,
    },

    /// Config file contains invalid TOML syntax or unknown options.
    #[error("Invalid TOML in {path}: {reason}")]
    ParseError {
        /// Path with invalid TOML.
        path: PathBuf,
        /// Parse error details.
        reason: String,
    },

    /// A resolved value is unusable (e.g. an empty index name).
    #[error("Invalid value for {option}: {reason}")]
    InvalidValue {
        /// Option name as written in the config file.
        option: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

/// TOML configuration file structure.
///
/// All fields are optional - if not specified, hardcoded defaults are used.
/// Corresponds to `~/.config/rvt2-analyzer/config.toml`, the deployment-specific
/// override file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// ElasticSearch server URL.
    #[serde(default)]
    pub es_server: Option<String>,

    /// RVT2 daemon URL.
    #[serde(default)]
    pub rvt2_server: Option<String>,

    /// RVT2 file-serving URL (the "morgue").
    #[serde(default)]
    pub rvt2_files: Option<String>,

    /// Index holding source metadata.
    #[serde(default)]
    pub sources_index: Option<String>,

    /// Index holding case metadata.
    #[serde(default)]
    pub cases_index: Option<String>,

    /// Index receiving the query audit log.
    #[serde(default)]
    pub queries_index: Option<String>,

    /// Result page size.
    #[serde(default)]
    pub result_size: Option<usize>,

    /// Emit a debug notification for every request.
    #[serde(default)]
    pub es_debug: Option<bool>,

    /// Label vocabularies.
    #[serde(default)]
    pub labels: Option<LabelsSection>,

    /// Analyst name used when none was saved.
    #[serde(default)]
    pub default_analyst: Option<String>,

    /// Maximum number of sources listed for a case.
    #[serde(default)]
    pub max_number_sources: Option<usize>,

    /// Maximum number of cases listed.
    #[serde(default)]
    pub max_number_cases: Option<usize>,

    /// Document type path segment.
    #[serde(default)]
    pub doctype: Option<String>,

    /// Delay before reloading the source list after a change, in milliseconds.
    #[serde(default)]
    pub wait_reload_sources_ms: Option<u64>,

    /// Delay before reloading the case list after a change, in milliseconds.
    #[serde(default)]
    pub wait_reload_cases_ms: Option<u64>,

    /// Messages retained per notification kind.
    #[serde(default)]
    pub message_capacity: Option<usize>,

    /// HTTP timeout in seconds. Unset means no timeout.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Path to log file for tracing output.
    #[serde(default)]
    pub log_file_path: Option<PathBuf>,

    /// Path of the persisted client state file.
    #[serde(default)]
    pub state_file_path: Option<PathBuf>,
}

/// `[labels]` section.
///
/// ```toml
/// [labels]
/// important = ["important", "relevant"]
/// check = ["check", "warning"]
/// seen = ["seen", "unimportant"]
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LabelsSection {
    /// Labels marking important documents.
    #[serde(default)]
    pub important: Option<Vec<String>>,
    /// Labels marking documents to check.
    #[serde(default)]
    pub check: Option<Vec<String>>,
    /// Labels marking already-seen documents.
    #[serde(default)]
    pub seen: Option<Vec<String>>,
}

/// Category of a tag in the label vocabularies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelCategory {
    /// Important / relevant.
    Important,
    /// Needs checking.
    Check,
    /// Already seen.
    Seen,
}

/// Resolved label vocabularies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labels {
    /// Labels marking important documents.
    pub important: Vec<String>,
    /// Labels marking documents to check.
    pub check: Vec<String>,
    /// Labels marking already-seen documents.
    pub seen: Vec<String>,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            important: vec!["important".to_string(), "relevant".to_string()],
            check: vec!["check".to_string(), "warning".to_string()],
            seen: vec!["seen".to_string(), "unimportant".to_string()],
        }
    }
}

impl Labels {
    /// Category of `tag`, checking important, then check, then seen.
    pub fn category_of(&self, tag: &str) -> Option<LabelCategory> {
        if self.important.iter().any(|l| l == tag) {
            Some(LabelCategory::Important)
        } else if self.check.iter().any(|l| l == tag) {
            Some(LabelCategory::Check)
        } else if self.seen.iter().any(|l| l == tag) {
            Some(LabelCategory::Seen)
        } else {
            None
        }
    }
}

/// Resolved configuration after applying precedence rules.
///
/// Created by merging defaults, config file, env vars, and CLI args.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// ElasticSearch server URL.
    pub es_server: String,
    /// RVT2 daemon URL.
    pub rvt2_server: String,
    /// RVT2 file-serving URL.
    pub rvt2_files: String,
    /// Index holding source metadata.
    pub sources_index: String,
    /// Index holding case metadata.
    pub cases_index: String,
    /// Index receiving the query audit log.
    pub queries_index: String,
    /// Result page size.
    pub result_size: usize,
    /// Emit a debug notification for every request.
    pub es_debug: bool,
    /// Label vocabularies.
    pub labels: Labels,
    /// Analyst name used when none was saved.
    pub default_analyst: Option<String>,
    /// Maximum number of sources listed for a case.
    pub max_number_sources: usize,
    /// Maximum number of cases listed.
    pub max_number_cases: usize,
    /// Document type path segment.
    pub doctype: String,
    /// Delay before reloading the source list after a change.
    pub wait_reload_sources: Duration,
    /// Delay before reloading the case list after a change.
    pub wait_reload_cases: Duration,
    /// Messages retained per notification kind.
    pub message_capacity: usize,
    /// HTTP timeout. `None` waits forever.
    pub request_timeout: Option<Duration>,
    /// Path to log file for tracing output.
    pub log_file_path: PathBuf,
    /// Path of the persisted client state file.
    pub state_file_path: PathBuf,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            es_server: "http://localhost:9200".to_string(),
            rvt2_server: "http://localhost:5000".to_string(),
            rvt2_files: "http://localhost:5000/morgue".to_string(),
            sources_index: "rvtindexer".to_string(),
            cases_index: "rvtcases".to_string(),
            queries_index: "rvtindexer-queries".to_string(),
            result_size: 50,
            es_debug: true,
            labels: Labels::default(),
            default_analyst: None,
            max_number_sources: 100,
            max_number_cases: 100,
            doctype: "_doc".to_string(),
            wait_reload_sources: Duration::from_millis(2000),
            wait_reload_cases: Duration::from_millis(2000),
            message_capacity: 1000,
            request_timeout: None,
            log_file_path: default_log_path(),
            state_file_path: default_state_path(),
        }
    }
}

/// Resolve default log file path.
///
/// Returns `~/.local/state/rvt2-analyzer/rvt2-analyzer.log` on Unix-like systems,
/// or appropriate platform path on other systems.
///
/// If state directory cannot be determined, falls back to current directory.
pub fn default_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        state_dir.join("rvt2-analyzer").join("rvt2-analyzer.log")
    } else {
        PathBuf::from("rvt2-analyzer.log")
    }
}

/// Resolve default persisted client state path.
///
/// Returns `~/.local/share/rvt2-analyzer/state.toml` on Unix-like systems, falling back
/// to the current directory.
pub fn default_state_path() -> PathBuf {
    if let Some(data_dir) = dirs::data_dir() {
        data_dir.join("rvt2-analyzer").join("state.toml")
    } else {
        PathBuf::from("rvt2-analyzer-state.toml")
    }
}

/// Load configuration file from a specific path.
///
/// Returns `Ok(None)` if file doesn't exist (not an error - use defaults).
/// Returns `Err` if file exists but cannot be read or parsed.
pub fn load_config_file(path: impl Into<PathBuf>) -> Result<Option<ConfigFile>, ConfigError> {
    let path = path.into();

    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let config: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    Ok(Some(config))
}

/// Resolve default config file path.
///
/// Returns `~/.config/rvt2-analyzer/config.toml` on Unix, appropriate path on other
/// platforms. Returns `None` if home directory cannot be determined.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("rvt2-analyzer").join("config.toml"))
}

/// Load configuration with precedence handling.
///
/// Precedence (highest to lowest):
/// 1. Explicit `config_path` argument (like CLI `--config`)
/// 2. `RVT2_ANALYZER_CONFIG` environment variable
/// 3. Default path `~/.config/rvt2-analyzer/config.toml`
///
/// Missing config files are NOT errors - defaults are used.
pub fn load_config_with_precedence(
    config_path: Option<PathBuf>,
) -> Result<Option<ConfigFile>, ConfigError> {
    if let Some(path) = config_path {
        return load_config_file(path);
    }

    if let Ok(env_path) = std::env::var("RVT2_ANALYZER_CONFIG") {
        return load_config_file(PathBuf::from(env_path));
    }

    if let Some(default_path) = default_config_path() {
        return load_config_file(default_path);
    }

    Ok(None)
}

/// Apply environment variable overrides to resolved config.
///
/// Checks for:
/// - `RVT2_ESSERVER`: ElasticSearch server
/// - `RVT2_SERVER`: RVT2 daemon
/// - `RVT2_FILES`: RVT2 file server
pub fn apply_env_overrides(mut config: ResolvedConfig) -> ResolvedConfig {
    if let Ok(server) = std::env::var("RVT2_ESSERVER") {
        config.es_server = server;
    }
    if let Ok(server) = std::env::var("RVT2_SERVER") {
        config.rvt2_server = server;
    }
    if let Ok(files) = std::env::var("RVT2_FILES") {
        config.rvt2_files = files;
    }

    config
}

/// Merge config file into defaults to create resolved config.
///
/// For each field in `ConfigFile`, if `Some(value)`, use it; otherwise use default.
pub fn merge_config(config_file: Option<ConfigFile>) -> ResolvedConfig {
    let defaults = ResolvedConfig::default();

    let Some(config) = config_file else {
        return defaults;
    };

    let labels = match config.labels {
        Some(section) => Labels {
            important: section.important.unwrap_or(defaults.labels.important),
            check: section.check.unwrap_or(defaults.labels.check),
            seen: section.seen.unwrap_or(defaults.labels.seen),
        },
        None => defaults.labels,
    };

    ResolvedConfig {
        es_server: config.es_server.unwrap_or(defaults.es_server),
        rvt2_server: config.rvt2_server.unwrap_or(defaults.rvt2_server),
        rvt2_files: config.rvt2_files.unwrap_or(defaults.rvt2_files),
        sources_index: config.sources_index.unwrap_or(defaults.sources_index),
        cases_index: config.cases_index.unwrap_or(defaults.cases_index),
        queries_index: config.queries_index.unwrap_or(defaults.queries_index),
        result_size: config.result_size.unwrap_or(defaults.result_size),
        es_debug: config.es_debug.unwrap_or(defaults.es_debug),
        labels,
        default_analyst: config.default_analyst.or(defaults.default_analyst),
        max_number_sources: config
            .max_number_sources
            .unwrap_or(defaults.max_number_sources),
        max_number_cases: config.max_number_cases.unwrap_or(defaults.max_number_cases),
        doctype: config.doctype.unwrap_or(defaults.doctype),
        wait_reload_sources: config
            .wait_reload_sources_ms
            .map(Duration::from_millis)
            .unwrap_or(defaults.wait_reload_sources),
        wait_reload_cases: config
            .wait_reload_cases_ms
            .map(Duration::from_millis)
            .unwrap_or(defaults.wait_reload_cases),
        message_capacity: config.message_capacity.unwrap_or(defaults.message_capacity),
        request_timeout: config
            .request_timeout_secs
            .map(Duration::from_secs)
            .or(defaults.request_timeout),
        log_file_path: config.log_file_path.unwrap_or(defaults.log_file_path),
        state_file_path: config.state_file_path.unwrap_or(defaults.state_file_path),
    }
}

/// Apply CLI argument overrides to resolved config.
///
/// CLI args have the highest precedence and override all other sources.
/// Only applies overrides for flags that were explicitly set by the user.
///
/// Precedence chain: Defaults → Config File → Env Vars → CLI Args (highest)
pub fn apply_cli_overrides(
    mut config: ResolvedConfig,
    es_server_override: Option<String>,
    page_size_override: Option<usize>,
    debug_override: Option<bool>,
) -> ResolvedConfig {
    if let Some(server) = es_server_override {
        config.es_server = server;
    }

    if let Some(size) = page_size_override {
        config.result_size = size;
    }

    if let Some(debug) = debug_override {
        config.es_debug = debug;
    }

    config
}

/// Reject resolved values the stores cannot work with.
pub fn validate(config: &ResolvedConfig) -> Result<(), ConfigError> {
    if config.result_size == 0 {
        return Err(ConfigError::InvalidValue {
            option: "result_size",
            reason: "must be at least 1".to_string(),
        });
    }
    for (option, value) in [
        ("sources_index", &config.sources_index),
        ("cases_index", &config.cases_index),
        ("queries_index", &config.queries_index),
        ("doctype", &config.doctype),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                option,
                reason: "must not be empty".to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;

#[cfg(test)]
mod log_path_tests {
    use super::*;

    #[test]
    fn default_log_path_ends_with_log_file_name() {
        let path = default_log_path();
        assert!(
            path.to_string_lossy().ends_with("rvt2-analyzer.log"),
            "Default log path should end with 'rvt2-analyzer.log', got: {:?}",
            path
        );
    }

    #[test]
    fn resolved_config_default_includes_log_path() {
        let config = ResolvedConfig::default();
        assert!(
            !config.log_file_path.as_os_str().is_empty(),
            "Default config should have non-empty log_file_path"
        );
    }

    #[test]
    fn config_file_log_path_overrides_default() {
        let custom_path = PathBuf::from("/custom/path/to/app.log");
        let config_file = ConfigFile {
            log_file_path: Some(custom_path.clone()),
            ..ConfigFile::default()
        };

        let resolved = merge_config(Some(config_file));
        assert_eq!(
            resolved.log_file_path, custom_path,
            "Config file log_file_path should override default"
        );
    }

    #[test]
    fn default_state_path_ends_with_state_toml() {
        let path = default_state_path();
        assert!(path.to_string_lossy().contains("state"));
    }
}
