use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use lumina_player::config::PlayerConfig;
use lumina_player::OutputMode;

#[derive(Parser)]
#[command(name = "lumina-player")]
#[command(about = "Terminal music player with a spectrum visualizer")]
#[command(version)]
struct Cli {
    /// Playlist file (defaults to <config dir>/lumina/playlist.json)
    #[arg(short, long)]
    playlist: Option<PathBuf>,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Print notifications as JSON lines instead of the panel
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // stderr keeps the panel on stdout clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let path = match cli.playlist {
        Some(path) => path,
        None => PlayerConfig::default_path()?,
    };

    let settings = PlayerConfig::load(&path)
        .and_then(PlayerConfig::into_settings)
        .map_err(|e| {
            log::error!("Cannot load playlist {}: {}", path.display(), e);
            e
        })?;

    let mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Panel
    };

    lumina_player::run(settings, mode).map_err(|e| {
        log::error!("Player failed: {}", e);
        e
    })?;
    Ok(())
}
