use crate::bitmap::FilterKind;
use ::config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_TOML: &str = include_str!("default.toml");
pub const ENV_PREFIX: &str = "NNHOST";

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("config file not found: {}", .0.display())]
  NotFound(PathBuf),

  #[error("failed to load configuration: {0}")]
  Load(#[from] ::config::ConfigError),

  #[error("failed to render configuration: {0}")]
  Render(#[from] toml::ser::Error),
}

/// Training artifact section
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ModelSection {
  pub artifact: PathBuf,
}

/// Memory image output section
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OutputSection {
  pub dir: PathBuf,
  #[serde(default)]
  pub extended: bool,
}

/// Drawing canvas section
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CanvasSection {
  pub size: u32,
  pub target: u32,
  pub scale: u32,
  pub brush: u32,
  pub save_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DownsampleSection {
  pub filter: FilterKind,
}

/// UART section. A port of the form `tcp://host:port` uses a TCP bridge.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SerialSection {
  pub port: String,
  pub baud: u32,
  pub timeout_ms: u64,
}

impl SerialSection {
  pub fn timeout(&self) -> Duration {
    Duration::from_millis(self.timeout_ms)
  }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
  pub model: ModelSection,
  pub output: OutputSection,
  pub canvas: CanvasSection,
  pub downsample: DownsampleSection,
  pub serial: SerialSection,
}

/// Values given on the command line; `None` leaves the loaded value alone.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
  pub model: Option<PathBuf>,
  pub out_dir: Option<PathBuf>,
  pub extended: bool,
  pub port: Option<String>,
  pub baud: Option<u32>,
  pub filter: Option<FilterKind>,
}

/// Built-in defaults only.
pub fn load_default_config() -> Result<AppConfig, ConfigError> {
  let cfg = Config::builder()
    .add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml))
    .build()?;
  Ok(cfg.try_deserialize()?)
}

/// Defaults, then the optional user file, then `NNHOST_*` environment
/// variables (`NNHOST_SERIAL__PORT=/dev/ttyACM0`).
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
  let mut builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));

  if let Some(path) = path {
    if !path.exists() {
      return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    log::info!("Loading configuration from {}", path.display());
    builder = builder.add_source(File::from(path).format(FileFormat::Toml));
  }

  let cfg = builder
    .add_source(
      Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true),
    )
    .build()?;
  Ok(cfg.try_deserialize()?)
}

impl AppConfig {
  pub fn apply_cli_overrides(&mut self, cli: &CliOverrides) {
    if let Some(model) = &cli.model {
      self.model.artifact = model.clone();
    }
    if let Some(dir) = &cli.out_dir {
      self.output.dir = dir.clone();
    }
    if cli.extended {
      self.output.extended = true;
    }
    if let Some(port) = &cli.port {
      self.serial.port = port.clone();
    }
    if let Some(baud) = cli.baud {
      self.serial.baud = baud;
    }
    if let Some(filter) = cli.filter {
      self.downsample.filter = filter;
    }
  }

  pub fn to_toml(&self) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(self)?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use std::sync::Mutex;

  // environment variables are process-wide
  static ENV_MUTEX: Mutex<()> = Mutex::new(());

  #[test]
  fn test_defaults() {
    let cfg = load_default_config().unwrap();
    assert_eq!(cfg.canvas.size, 112);
    assert_eq!(cfg.canvas.target, 28);
    assert_eq!(cfg.canvas.brush, 5);
    assert_eq!(cfg.serial.baud, 115_200);
    assert_eq!(cfg.serial.timeout(), Duration::from_secs(1));
    assert_eq!(cfg.downsample.filter, FilterKind::Lanczos);
    assert!(!cfg.output.extended);
  }

  #[test]
  fn test_user_file_overrides_defaults() {
    let _guard = ENV_MUTEX.lock().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nnhost.toml");
    fs::write(&path, "[serial]\nport = \"tcp://127.0.0.1:7000\"\n\n[downsample]\nfilter = \"area\"\n").unwrap();

    let cfg = load_config(Some(path.as_path())).unwrap();
    assert_eq!(cfg.serial.port, "tcp://127.0.0.1:7000");
    assert_eq!(cfg.serial.baud, 115_200);
    assert_eq!(cfg.downsample.filter, FilterKind::Area);
  }

  #[test]
  fn test_missing_user_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
      load_config(Some(dir.path().join("missing.toml").as_path())),
      Err(ConfigError::NotFound(_))
    ));
  }

  #[test]
  fn test_environment_overrides_file() {
    let _guard = ENV_MUTEX.lock().unwrap();
    std::env::set_var("NNHOST_SERIAL__BAUD", "9600");
    let cfg = load_config(None);
    std::env::remove_var("NNHOST_SERIAL__BAUD");
    assert_eq!(cfg.unwrap().serial.baud, 9600);
  }

  #[test]
  fn test_cli_overrides() {
    let mut cfg = load_default_config().unwrap();
    cfg.apply_cli_overrides(&CliOverrides {
      out_dir: Some(PathBuf::from("out")),
      extended: true,
      baud: Some(57_600),
      ..Default::default()
    });
    assert_eq!(cfg.output.dir, PathBuf::from("out"));
    assert!(cfg.output.extended);
    assert_eq!(cfg.serial.baud, 57_600);
    assert_eq!(cfg.model.artifact, PathBuf::from("mnist_model.json"));
  }

  #[test]
  fn test_to_toml_round_trips() {
    let cfg = load_default_config().unwrap();
    let text = cfg.to_toml().unwrap();
    let back: AppConfig = toml::from_str(&text).unwrap();
    assert_eq!(back, cfg);
  }
}
