pub mod config;

pub use self::config::{load_config, load_default_config, AppConfig, CliOverrides, ConfigError};
