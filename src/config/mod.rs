//! Configuration module.
//!
//! Static options (servers, index names, page size, label vocabularies, list limits,
//! reload delays) resolved from defaults, a TOML override file, environment variables and
//! command-line flags, plus the persisted client state.

pub mod loader;
pub mod persisted;

pub use loader::{
    apply_cli_overrides, apply_env_overrides, default_config_path, default_log_path,
    default_state_path, load_config_file, load_config_with_precedence, merge_config, validate,
    ConfigError, ConfigFile, LabelCategory, Labels, LabelsSection, ResolvedConfig,
};
pub use persisted::{LocalStore, StateFileError};
