// SPDX-License-Identifier: GPL-3.0-only

use camera_controls::backends::camera::Parameter;
use camera_controls::config::Config;
use camera_controls::constants::{APP_NAME, DEFAULT_LOG_FILTER, LOG_FILE_NAME};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cli;

#[derive(Parser)]
#[command(name = "camera-controls")]
#[command(about = "Pick a camera and tune its brightness, contrast, saturation and sharpness")]
#[command(version = env!("GIT_VERSION"))]
#[command(subcommand_required = false)]
struct Cli {
    /// Device id to open (a V4L2 node path such as /dev/video0)
    #[arg(short, long, global = true)]
    device: Option<String>,

    /// Use the in-memory demo cameras instead of V4L2
    #[arg(long, global = true)]
    mock: bool,

    /// Configuration file (default: ~/.config/camera-controls/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive terminal UI (default)
    Tui,

    /// List video input devices
    List {
        /// Include output, metadata and other nodes
        #[arg(short, long)]
        all: bool,
    },

    /// Open the stream and print its controls and raw descriptors
    Controls,

    /// Write one control value
    Set {
        /// brightness, contrast, saturation or sharpness
        parameter: Parameter,
        value: f64,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if cli.device.is_some() {
        config.device = cli.device.clone();
    }

    let tui = matches!(cli.command, None | Some(Commands::Tui));
    init_logging(&config, tui);

    let backends = if cli.mock {
        cli::Backends::mock()
    } else {
        cli::Backends::v4l2(&config)
    };

    match cli.command {
        None | Some(Commands::Tui) => camera_controls::terminal::run(
            backends.inventory,
            backends.provider,
            &config,
        )?,
        Some(Commands::List { all }) => cli::list_devices(&backends, all)?,
        Some(Commands::Controls) => cli::show_controls(backends, &config)?,
        Some(Commands::Set { parameter, value }) => {
            cli::set_control(backends, &config, parameter, value)?
        }
    }
    Ok(())
}

/// Initialize logging
///
/// RUST_LOG wins over the config's `log_filter`. The terminal UI owns the
/// screen, so in that mode logs go to a file in the cache directory.
fn init_logging(config: &Config, tui: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directive = config.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER);
        EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true);

    if !tui {
        builder.with_writer(std::io::stderr).init();
        return;
    }

    let log_file = dirs::cache_dir()
        .map(|dir| dir.join(APP_NAME))
        .and_then(|dir| std::fs::create_dir_all(&dir).ok().map(|_| dir))
        .and_then(|dir| std::fs::File::create(dir.join(LOG_FILE_NAME)).ok());

    match log_file {
        Some(file) => builder
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .init(),
        // Nowhere safe to write; stay silent rather than draw over the UI
        None => builder.with_writer(std::io::sink).init(),
    }
}
