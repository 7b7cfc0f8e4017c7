//! Settings for paging, suggestions, display formatting and refresh timing,
//! read from layered JSON5 files.

mod error;
mod loader;
mod model;

pub use error::ConfigError;
pub use loader::{ConfigLayer, ConfigLayerSource, LayeredConfig, LayeredConfigOptions};
pub use model::*;
