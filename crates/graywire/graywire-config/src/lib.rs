mod config;

pub use config::{ConfigError, GraywireConfig};
