use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use nnhost::bitmap::{downsampler, load_image, CanvasSession, FilterKind};
use nnhost::codec::{self, ExportMode, MemoryImageWriter};
use nnhost::config::{load_config, AppConfig, CliOverrides};
use nnhost::model::load_artifact;
use nnhost::shell::run_shell;
use nnhost::transmit::open_transmitter;
use nnhost::utils::log::init_log_with;
use std::path::{Path, PathBuf};

/// nnhost - host tooling for the FPGA MNIST accelerator
#[derive(Parser, Debug)]
#[command(name = "nnhost")]
#[command(version)]
#[command(about = "Generate BRAM memory images and upload digits over UART", long_about = None)]
struct Cli {
  /// Configuration file layered over the built-in defaults
  #[arg(short, long, value_name = "FILE", global = true)]
  config: Option<PathBuf>,

  /// Quiet mode (warnings and errors only)
  #[arg(short, long, global = true)]
  quiet: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
  /// Convert a trained model into .mem files
  Memgen {
    #[command(flatten)]
    model: ModelArgs,

    /// Also write the _wide weight copies and zeroed bias stubs
    #[arg(short, long)]
    extended: bool,

    /// Print the file manifest as JSON
    #[arg(long)]
    json: bool,
  },

  /// Check existing .mem files against a trained model
  Verify {
    #[command(flatten)]
    model: ModelArgs,
  },

  /// Interactive drawing session
  Draw {
    #[command(flatten)]
    link: LinkArgs,
  },

  /// Downsample an image file and transmit it
  Send {
    /// Grayscale or color image; ink must be bright on a dark background
    image: PathBuf,

    #[command(flatten)]
    link: LinkArgs,
  },

  /// Print the effective configuration
  Config,
}

#[derive(Args, Debug)]
struct ModelArgs {
  /// Training artifact (JSON with w1, w2, shift_l1, shift_l2)
  #[arg(short, long, value_name = "FILE")]
  model: Option<PathBuf>,

  /// Directory holding the .mem files
  #[arg(short, long, value_name = "DIR")]
  out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct LinkArgs {
  /// Serial device, or tcp://host:port for a TCP bridge
  #[arg(short, long)]
  port: Option<String>,

  #[arg(short, long)]
  baud: Option<u32>,

  /// Resampling filter
  #[arg(short, long, value_enum)]
  filter: Option<FilterKind>,
}

impl Commands {
  fn overrides(&self) -> CliOverrides {
    match self {
      Commands::Memgen { model, extended, .. } => CliOverrides {
        model: model.model.clone(),
        out_dir: model.out.clone(),
        extended: *extended,
        ..Default::default()
      },
      Commands::Verify { model } => CliOverrides {
        model: model.model.clone(),
        out_dir: model.out.clone(),
        ..Default::default()
      },
      Commands::Draw { link } | Commands::Send { link, .. } => CliOverrides {
        port: link.port.clone(),
        baud: link.baud,
        filter: link.filter,
        ..Default::default()
      },
      Commands::Config => CliOverrides::default(),
    }
  }
}

fn memgen(cfg: &AppConfig, json: bool) -> Result<()> {
  let weights = load_artifact(&cfg.model.artifact)?;
  let mode = if cfg.output.extended {
    ExportMode::Extended
  } else {
    ExportMode::Canonical
  };
  let manifest = MemoryImageWriter::new(&cfg.output.dir).with_mode(mode).write(&weights)?;

  if json {
    println!("{}", serde_json::to_string_pretty(&manifest)?);
  } else {
    for f in &manifest.files {
      println!("{:<22} {:>5} lines x {:>3} chars", f.name, f.lines, f.chars_per_line);
    }
  }
  Ok(())
}

fn verify(cfg: &AppConfig) -> Result<()> {
  let weights = load_artifact(&cfg.model.artifact)?;
  codec::verify_dir(&cfg.output.dir, &weights)
    .with_context(|| format!("verification of {} failed", cfg.output.dir.display()))?;
  println!("{}: all memory images match", cfg.output.dir.display());
  Ok(())
}

fn draw(cfg: &AppConfig) -> Result<()> {
  let mut session = CanvasSession::new(
    cfg.canvas.size,
    cfg.canvas.target,
    cfg.canvas.scale,
    cfg.canvas.brush,
    downsampler(cfg.downsample.filter),
  );
  let mut transmitter = open_transmitter(&cfg.serial.port, cfg.serial.baud, cfg.serial.timeout());
  run_shell(&mut session, transmitter.as_mut(), &cfg.canvas.save_dir)?;
  Ok(())
}

fn send(cfg: &AppConfig, image: &Path) -> Result<()> {
  let raw = load_image(image)?;
  let target = (cfg.canvas.target, cfg.canvas.target);
  let bitmap = downsampler(cfg.downsample.filter)
    .downsample(&raw, target)
    .with_context(|| format!("cannot downsample {}", image.display()))?;
  let mut transmitter = open_transmitter(&cfg.serial.port, cfg.serial.baud, cfg.serial.timeout());
  let n = transmitter.send(bitmap.as_bytes())?;
  println!("Sent {} bytes to {}.", n, transmitter.target());
  Ok(())
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_log_with(cli.quiet);

  let mut cfg = load_config(cli.config.as_deref())?;
  cfg.apply_cli_overrides(&cli.command.overrides());

  match &cli.command {
    Commands::Memgen { json, .. } => memgen(&cfg, *json),
    Commands::Verify { .. } => verify(&cfg),
    Commands::Draw { .. } => draw(&cfg),
    Commands::Send { image, .. } => send(&cfg, image),
    Commands::Config => {
      print!("{}", cfg.to_toml()?);
      Ok(())
    },
  }
}
