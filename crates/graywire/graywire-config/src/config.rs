use graywire_cdc::{ConfigError as GeometryError, RingConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GraywireConfig {
    #[serde(default = "defaults::depth")]
    pub depth: usize,
    #[serde(default = "defaults::width")]
    pub width: usize,
    #[serde(default = "defaults::sync_stages")]
    pub sync_stages: usize,
    /// Items the soak driver pushes through the fifo.
    #[serde(default = "defaults::items")]
    pub items: u64,
    #[serde(default = "defaults::log_level")]
    pub log_level: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot open {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed graywire config")]
    Parse(#[from] toml::de::Error),

    #[error("bad fifo geometry: {0}")]
    Geometry(#[from] GeometryError),
}

mod defaults {
    pub fn depth() -> usize {
        1 << 10
    }

    pub fn width() -> usize {
        64
    }

    pub fn sync_stages() -> usize {
        2
    }

    pub fn items() -> u64 {
        1_000_000
    }

    pub fn log_level() -> String {
        "info".into()
    }
}

impl Default for GraywireConfig {
    fn default() -> Self {
        Self {
            depth: defaults::depth(),
            width: defaults::width(),
            sync_stages: defaults::sync_stages(),
            items: defaults::items(),
            log_level: defaults::log_level(),
        }
    }
}

impl GraywireConfig {
    /// Reads a config file and checks that its geometry is one the fifo accepts.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(text)?;
        cfg.ring_config()?;
        Ok(cfg)
    }

    /// Fifo geometry for the configured width, depth and relay stages.
    pub fn ring_config(&self) -> Result<RingConfig, ConfigError> {
        let ring = RingConfig::new(self.width, self.depth)?.with_sync_stages(self.sync_stages)?;
        Ok(ring)
    }
}
