//! Config discovery: the user file, then `./callhistory.json5`, then any
//! explicit override files, each schema-checked and folded over the last.

mod layer_io;
mod merge;
mod schema;


use crate::{CallHistoryConfig, ConfigError};
use log::{debug, info};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// File name looked up in the home config dir and the working directory.
const DEFAULT_CONFIG_FILE: &str = "callhistory.json5";
const DEFAULT_CONFIG_DIR: &str = ".callhistory";
/// A longer quiet period would make typed digits look ignored.
const MAX_DEBOUNCE_MS: u64 = 10_000;

/// Merged config and the files it came from.
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub config: CallHistoryConfig,
    /// In precedence order, lowest first.
    pub layers: Vec<ConfigLayer>,
}

/// Where a layer was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayerSource {
    /// `~/.callhistory/callhistory.json5`.
    User,
    /// `callhistory.json5` in the working directory.
    Cwd,
    /// A file named on the command line; must exist.
    Runtime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLayer {
    pub source: ConfigLayerSource,
    pub path: PathBuf,
}

/// Where to look for layers.
#[derive(Debug, Clone)]
pub struct LayeredConfigOptions {
    /// Directory searched for `callhistory.json5`.
    pub cwd: PathBuf,
    /// `None` skips the user layer.
    pub user_config_path: Option<PathBuf>,
    /// Override files, applied last in the given order.
    pub runtime_paths: Vec<PathBuf>,
}

impl LayeredConfigOptions {
    /// Default user location, no overrides.
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
            user_config_path: layer_io::default_user_config_path(),
            runtime_paths: Vec::new(),
        }
    }

    pub fn with_user_path(mut self, path: Option<PathBuf>) -> Self {
        self.user_config_path = path;
        self
    }

    /// Add an override file. Missing override files are an error.
    pub fn with_runtime_path(mut self, path: impl AsRef<Path>) -> Self {
        self.runtime_paths.push(path.as_ref().to_path_buf());
        self
    }
}

impl CallHistoryConfig {
    /// Load a single config file, ignoring every other layer.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!("loading config (path={})", path.display());
        let label = path.display().to_string();
        let layer = layer_io::parse_layer(&layer_io::read_text(path)?, &label)?;
        config_from_layer(layer)
    }

    /// Parse a config from JSON5 text.
    pub fn load_from_str(contents: &str) -> Result<Self, ConfigError> {
        debug!("loading config from text (len={})", contents.len());
        config_from_layer(layer_io::parse_layer(contents, "config")?)
    }

    /// Layered load with the default user location.
    pub fn load_layered(cwd: impl AsRef<Path>) -> Result<LayeredConfig, ConfigError> {
        info!(
            "loading layered config (cwd={})",
            cwd.as_ref().display()
        );
        Self::load_layered_with_options(LayeredConfigOptions::new(cwd))
    }

    /// Layered load from explicit locations. Later layers win; a file reached
    /// twice (e.g. cwd is home) is only applied once.
    pub fn load_layered_with_options(
        options: LayeredConfigOptions,
    ) -> Result<LayeredConfig, ConfigError> {
        let cwd = layer_io::canonical(&options.cwd);
        let mut candidates = Vec::new();
        if let Some(path) = options.user_config_path {
            candidates.push((ConfigLayerSource::User, path, false));
        }
        candidates.push((ConfigLayerSource::Cwd, cwd.join(DEFAULT_CONFIG_FILE), false));
        candidates.extend(
            options
                .runtime_paths
                .into_iter()
                .map(|path| (ConfigLayerSource::Runtime, path, true)),
        );

        let mut layers = Vec::new();
        let mut merged = Map::new();
        let mut seen = HashSet::new();
        for (source, path, required) in candidates {
            if !required && !path.exists() {
                debug!(
                    "config layer absent (source={source:?}, path={})",
                    path.display()
                );
                continue;
            }
            if !seen.insert(layer_io::canonical(&path)) {
                debug!(
                    "config layer listed twice (source={source:?}, path={})",
                    path.display()
                );
                continue;
            }
            merge::overlay(&mut merged, layer_io::load_layer(source, &path)?);
            layers.push(ConfigLayer { source, path });
        }

        let config = config_from_layer(merged)?;
        info!("layered config loaded (layers={})", layers.len());
        Ok(LayeredConfig { config, layers })
    }

    /// Validate configuration invariants that cannot be expressed in serde.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.paging.page_size == 0 {
            return Err(ConfigError::InvalidField {
                path: "paging.page_size".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.suggestions.max_recent == 0 || self.suggestions.max_search == 0 {
            return Err(ConfigError::Invalid(
                "suggestion limits must be greater than zero".to_string(),
            ));
        }
        if self.suggestions.debounce_ms > MAX_DEBOUNCE_MS {
            return Err(ConfigError::InvalidField {
                path: "suggestions.debounce_ms".to_string(),
                message: format!("must be at most {MAX_DEBOUNCE_MS}"),
            });
        }
        if let Some(offset) = self.display.utc_offset_minutes
            && offset.abs() >= 24 * 60
        {
            return Err(ConfigError::InvalidField {
                path: "display.utc_offset_minutes".to_string(),
                message: "offset must be within one day".to_string(),
            });
        }
        Ok(())
    }
}

/// Layers are schema-checked on the way in, so only the model and the
/// semantic rules are left.
fn config_from_layer(layer: Map<String, Value>) -> Result<CallHistoryConfig, ConfigError> {
    let config: CallHistoryConfig = serde_json::from_value(Value::Object(layer))?;
    config.validate()?;
    Ok(config)
}
