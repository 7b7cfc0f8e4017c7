//! Reading, parsing and locating config layers.

use super::{ConfigLayerSource, DEFAULT_CONFIG_DIR, DEFAULT_CONFIG_FILE, schema};
use crate::ConfigError;
use directories::UserDirs;
use log::debug;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

pub(super) fn read_text(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse JSON5 text and check it against the schema. `label` names the layer
/// in error messages.
pub(super) fn parse_layer(contents: &str, label: &str) -> Result<Map<String, Value>, ConfigError> {
    let value: Value = json5::from_str(contents).map_err(|source| ConfigError::Syntax {
        layer: label.to_string(),
        source,
    })?;
    schema::validate_layer_schema(&value, label)?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ConfigError::Invalid(format!("{label}: expected an object"))),
    }
}

pub(super) fn load_layer(
    source: ConfigLayerSource,
    path: &Path,
) -> Result<Map<String, Value>, ConfigError> {
    debug!(
        "reading config layer (source={source:?}, path={})",
        path.display()
    );
    parse_layer(&read_text(path)?, &layer_label(source, path))
}

/// `user(/home/me/.callhistory/callhistory.json5)` and the like.
fn layer_label(source: ConfigLayerSource, path: &Path) -> String {
    let name = match source {
        ConfigLayerSource::User => "user",
        ConfigLayerSource::Cwd => "cwd",
        ConfigLayerSource::Runtime => "runtime",
    };
    format!("{name}({})", path.display())
}

/// `~/.callhistory/callhistory.json5`, when a home directory exists.
pub(super) fn default_user_config_path() -> Option<PathBuf> {
    UserDirs::new().map(|dirs| {
        dirs.home_dir()
            .join(DEFAULT_CONFIG_DIR)
            .join(DEFAULT_CONFIG_FILE)
    })
}

/// Canonical form of `path` for spotting the same file listed twice. Paths
/// that do not exist yet are kept as given.
pub(super) fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
