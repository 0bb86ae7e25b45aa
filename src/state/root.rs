//! Root state: which servers to talk to, who is analysing, and what is selected.

use crate::config::persisted::{LocalStore, StateFileError, KEY_ANALYST, KEY_ESSERVER};
use crate::config::ResolvedConfig;
use tracing::info;

/// Session-wide state shared by every store.
#[derive(Debug, Clone)]
pub struct RootState {
    esserver: String,
    rvt2server: String,
    rvt2files: String,
    analyst: Option<String>,
    casename: Option<String>,
    source: Option<String>,
    persisted: LocalStore,
}

impl RootState {
    /// Start from the persisted values, falling back to configuration.
    pub fn load(config: &ResolvedConfig, persisted: LocalStore) -> Self {
        let esserver = persisted
            .get(KEY_ESSERVER)
            .map(str::to_string)
            .unwrap_or_else(|| config.es_server.clone());
        let analyst = persisted
            .get(KEY_ANALYST)
            .map(str::to_string)
            .or_else(|| config.default_analyst.clone());
        Self {
            esserver,
            rvt2server: config.rvt2_server.clone(),
            rvt2files: config.rvt2_files.clone(),
            analyst,
            casename: None,
            source: None,
            persisted,
        }
    }

    /// ElasticSearch server URL.
    pub fn esserver(&self) -> &str {
        &self.esserver
    }

    /// RVT2 daemon URL.
    pub fn rvt2server(&self) -> &str {
        &self.rvt2server
    }

    /// RVT2 file-serving URL.
    pub fn rvt2files(&self) -> &str {
        &self.rvt2files
    }

    /// Analyst name, if known.
    pub fn analyst(&self) -> Option<&str> {
        self.analyst.as_deref()
    }

    /// Selected case.
    pub fn casename(&self) -> Option<&str> {
        self.casename.as_deref()
    }

    /// Selected source.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Choose another ElasticSearch server and remember it.
    pub fn set_esserver(&mut self, server: impl Into<String>) -> Result<(), StateFileError> {
        let server = server.into();
        info!(server = %server, "ElasticSearch server changed");
        self.persisted.set(KEY_ESSERVER, server.as_str())?;
        self.esserver = server;
        Ok(())
    }

    /// Set the analyst name and remember it.
    pub fn set_analyst(&mut self, analyst: impl Into<String>) -> Result<(), StateFileError> {
        let analyst = analyst.into();
        self.persisted.set(KEY_ANALYST, analyst.as_str())?;
        self.analyst = Some(analyst);
        Ok(())
    }

    /// Select a case.
    pub fn set_casename(&mut self, casename: Option<String>) {
        self.casename = casename;
    }

    /// Select a source.
    pub fn set_source(&mut self, source: Option<String>) {
        self.source = source;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_values_are_used_when_nothing_was_saved() {
        let config = ResolvedConfig {
            default_analyst: Some("ana".to_string()),
            ..ResolvedConfig::default()
        };

        let root = RootState::load(&config, LocalStore::in_memory());

        assert_eq!(root.esserver(), "http://localhost:9200");
        assert_eq!(root.rvt2server(), "http://localhost:5000");
        assert_eq!(root.rvt2files(), "http://localhost:5000/morgue");
        assert_eq!(root.analyst(), Some("ana"));
        assert_eq!(root.casename(), None);
    }

    #[test]
    fn saved_values_win_over_config() {
        let mut store = LocalStore::in_memory();
        store.set(KEY_ESSERVER, "http://saved:9200").expect("in memory");
        store.set(KEY_ANALYST, "saved").expect("in memory");
        let config = ResolvedConfig {
            default_analyst: Some("ana".to_string()),
            ..ResolvedConfig::default()
        };

        let root = RootState::load(&config, store);

        assert_eq!(root.esserver(), "http://saved:9200");
        assert_eq!(root.analyst(), Some("saved"));
    }

    #[test]
    fn setters_write_through_to_the_state_file() {
        let path = std::env::temp_dir()
            .join("rvt2_analyzer_root_state")
            .join("state.toml");
        let _ = std::fs::remove_file(&path);
        let store = LocalStore::open(&path).expect("open");
        let mut root = RootState::load(&ResolvedConfig::default(), store);

        root.set_esserver("http://other:9200").expect("write");
        root.set_analyst("jdoe").expect("write");

        let reloaded = RootState::load(
            &ResolvedConfig::default(),
            LocalStore::open(&path).expect("reopen"),
        );
        assert_eq!(reloaded.esserver(), "http://other:9200");
        assert_eq!(reloaded.analyst(), Some("jdoe"));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn selection_is_informational() {
        let mut root = RootState::load(&ResolvedConfig::default(), LocalStore::in_memory());

        root.set_casename(Some("case-1".to_string()));
        root.set_source(Some("disk-a".to_string()));

        assert_eq!(root.casename(), Some("case-1"));
        assert_eq!(root.source(), Some("disk-a"));
    }
}
