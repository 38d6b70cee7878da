use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use focus_guardian::agent::FocusAgent;
use focus_guardian::config::{self, GuardianConfig};
use focus_guardian::feed::FrameFeed;
use focus_guardian::scheduler::Scheduler;

/// Reads per-frame face/eye detections as JSON lines and reports attention.
#[derive(Parser, Debug)]
#[command(name = "focus-guardian", version, about)]
struct Cli {
    /// Config file (default: ~/.focus-guardian/config.toml)
    #[arg(short, long, env = "FOCUS_GUARDIAN_CONFIG")]
    config: Option<PathBuf>,

    /// Detection stream, one JSON object per frame (default: stdin)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Media played when focus is lost
    #[arg(long)]
    media: Option<PathBuf>,

    /// Frames per second
    #[arg(long)]
    fps: Option<u32>,

    /// Seconds of drift before focus counts as lost
    #[arg(long)]
    delay: Option<f64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "focus_guardian=info".into()),
        )
        .with_writer(io::stderr)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(config::config_path);
    let mut config = GuardianConfig::load(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    if let Some(media) = cli.media {
        config.countermeasure.media_path = media;
    }
    if let Some(fps) = cli.fps {
        config.scheduler.fps = fps;
    }
    if let Some(delay) = cli.delay {
        config.attention.delay_secs = delay;
    }

    let agent = FocusAgent::from_config(&config).context("Invalid configuration")?;
    let mut scheduler = Scheduler::new(agent, config.scheduler.fps);

    let reader: Box<dyn BufRead + Send> = match &cli.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open {:?}", path))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    // SIGINT/SIGTERM end the frame loop so the countermeasure is shut down
    let stop = Arc::new(AtomicBool::new(false));
    let handler_flag = stop.clone();
    ctrlc::set_handler(move || {
        info!("Shutdown signal received");
        handler_flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to install signal handler")?;

    let mut feed = FrameFeed::spawn(reader, stop);

    info!(
        fps = config.scheduler.fps,
        media = ?config.countermeasure.media_path,
        "Focus Guardian running"
    );

    scheduler.run(
        || feed.next_frame(),
        |output| println!("{}", output.status_line()),
    );

    Ok(())
}
