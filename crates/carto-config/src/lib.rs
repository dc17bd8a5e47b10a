//! Configuration for Carto binaries and the tracing setup shared by them.
//!
//! Configuration is read from TOML:
//!
//! ```toml
//! [symbol_index]
//! extent = 8192
//! tile_size = 512
//! cell_size_px = 2.0
//!
//! [logging]
//! level = "info,carto=debug"
//! json = false
//! ```

use carto_symbol_index::QuantizationGrid;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Once;

use thiserror::Error;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CartoConfig {
    /// Quantization grid used to match symbols across tiles.
    #[serde(default)]
    pub symbol_index: SymbolIndexConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SymbolIndexConfig {
    /// Fixed-point units per tile edge used by symbol anchors.
    #[serde(default = "SymbolIndexConfig::default_extent")]
    pub extent: u32,

    /// Rendered size of a tile in pixels.
    #[serde(default = "SymbolIndexConfig::default_tile_size")]
    pub tile_size: u32,

    /// Width of one matching cell in rendered pixels at the tile's own zoom.
    ///
    /// Larger cells tolerate more anchor drift between layouts but merge
    /// nearby labels that share a key.
    #[serde(default = "SymbolIndexConfig::default_cell_size_px")]
    pub cell_size_px: f64,
}

impl SymbolIndexConfig {
    fn default_extent() -> u32 {
        carto_symbol_index::EXTENT
    }

    fn default_tile_size() -> u32 {
        QuantizationGrid::DEFAULT_TILE_SIZE
    }

    fn default_cell_size_px() -> f64 {
        QuantizationGrid::DEFAULT_CELL_SIZE_PX
    }

    pub fn grid(&self) -> Result<QuantizationGrid, ConfigError> {
        QuantizationGrid::new(self.extent, self.tile_size, self.cell_size_px).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "symbol_index: extent ({}) and tile_size ({}) must be non-zero and cell_size_px ({}) \
                 finite, positive and at least tile_size / {}",
                self.extent,
                self.tile_size,
                self.cell_size_px,
                QuantizationGrid::MAX_CELLS_PER_TILE
            ))
        })
    }
}

impl Default for SymbolIndexConfig {
    fn default() -> Self {
        Self {
            extent: Self::default_extent(),
            tile_size: Self::default_tile_size(),
            cell_size_px: Self::default_cell_size_px(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// A level (`info`, `debug`, ...) or a full `EnvFilter` directive string.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit logs as JSON lines.
    #[serde(default)]
    pub json: bool,

    /// Write logs to stderr. When disabled, logs are discarded.
    #[serde(default = "LoggingConfig::default_stderr")]
    pub stderr: bool,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_owned()
    }

    fn default_stderr() -> bool {
        true
    }

    /// Bare level names (plus the `warning` synonym) become lowercase
    /// levels; anything else is passed through as `EnvFilter` directives.
    pub(crate) fn normalize_level_directives(input: &str) -> String {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Self::default_level();
        }
        let level = if trimmed.eq_ignore_ascii_case("warning") {
            "warn"
        } else {
            trimmed
        };
        match level.parse::<LevelFilter>() {
            Ok(filter) => filter.to_string().to_ascii_lowercase(),
            Err(_) => trimmed.to_owned(),
        }
    }

    fn config_env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(Self::normalize_level_directives(&self.level))
            .unwrap_or_else(|_| EnvFilter::default().add_directive(LevelFilter::INFO.into()))
    }

    /// The effective filter: the configured level, with `RUST_LOG` appended
    /// when set. An unparsable combination falls back to `RUST_LOG` alone,
    /// then to the configured level.
    pub fn env_filter(&self) -> EnvFilter {
        let Some(from_env) = std::env::var("RUST_LOG")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
        else {
            return self.config_env_filter();
        };

        let configured = Self::normalize_level_directives(&self.level);
        [format!("{configured},{from_env}"), from_env]
            .into_iter()
            .find_map(|directives| EnvFilter::try_new(directives).ok())
            .unwrap_or_else(|| self.config_env_filter())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
            stderr: Self::default_stderr(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // The default `Display` embeds a snippet of the input; keep only the message.
        ConfigError::Toml(err.message().to_owned())
    }
}

impl CartoConfig {
    /// Load and validate a TOML config file.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::load_from_str(&text)?;
        tracing::debug!(target: "carto.config", path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Parse and validate a TOML config string.
    pub fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        let config: CartoConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.symbol_index.grid().map(|_| ())
    }
}

static TRACING_INIT: Once = Once::new();

/// Installs the global `tracing` subscriber described by `config`.
///
/// Only the first call has an effect; later calls (and calls made after some
/// other subscriber was installed) are ignored.
pub fn init_tracing(config: &LoggingConfig) {
    TRACING_INIT.call_once(|| {
        let filter = config.env_filter();
        let writer = if config.stderr {
            BoxMakeWriter::new(std::io::stderr)
        } else {
            BoxMakeWriter::new(std::io::sink)
        };

        let layer = if config.json {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(filter)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_filter(filter)
                .boxed()
        };

        let _ = tracing_subscriber::registry().with(layer).try_init();
    });
}
