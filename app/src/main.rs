mod config;
mod probe;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use hls_client::HlsClientFactory;
use platform_dirs::AppDirs;
use playback::{PlaybackKind, PlaybackStatus, PlayerEvent, StreamSession};
use simplelog::{ColorChoice, CombinedLogger, Config as LogConfig, TermLogger, TerminalMode};

use config::Config;
use probe::ProbeSurface;

#[derive(Parser, Debug)]
#[command(name = "matchstream", about = "Bind a stream locator and watch it")]
struct Args {
    /// Stream locator: HLS manifest, direct file URL or embed page.
    url: String,
    /// Start playback immediately once the stream is ready.
    #[arg(long)]
    autoplay: bool,
    /// Initial volume in [0, 1]; overrides the configured value.
    #[arg(long)]
    volume: Option<f64>,
    /// Alternative config file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Log at debug level.
    #[arg(long)]
    verbose: bool,
}

fn setup_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    let mut loggers: Vec<Box<dyn simplelog::SharedLogger>> = vec![TermLogger::new(
        level,
        LogConfig::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if let Some(dirs) = AppDirs::new(Some("matchstream"), false) {
        std::fs::create_dir_all(&dirs.data_dir)?;
        let file = std::fs::File::create(dirs.data_dir.join("matchstream.log"))?;
        loggers.push(simplelog::WriteLogger::new(
            log::LevelFilter::Debug,
            LogConfig::default(),
            file,
        ));
    }
    CombinedLogger::init(loggers)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    setup_logging(args.verbose)?;

    let config = Config::load(args.config.as_deref());
    let mut options = config.session_options();
    if args.autoplay {
        options.autoplay = true;
    }
    if let Some(volume) = args.volume {
        options.volume = volume;
    }

    let http = reqwest::Client::new();
    let surface = Arc::new(ProbeSurface::new(http.clone()));
    let factory = Arc::new(HlsClientFactory::new(http));
    let mut session = StreamSession::new(surface, Some(factory), options);
    let mut updates = session.subscribe();

    session.bind_locator(&args.url);

    if session.kind() == Some(PlaybackKind::ExternalEmbed) {
        // Embeds are delegated wholesale to the external provider; nothing
        // to drive here.
        println!("delegating to external embed: {}", args.url);
        return Ok(());
    }

    if let Some(reason) = settled_error(&mut session) {
        return Err(reason.into());
    }

    loop {
        tokio::select! {
            _ = session.drive_once() => {}
            update = updates.recv() => {
                if let Ok(event) = update {
                    report(&event);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("interrupted, tearing down");
                session.teardown();
                return Ok(());
            }
        }

        if let Some(reason) = settled_error(&mut session) {
            return Err(reason.into());
        }
    }
}

/// When the session has settled in `Error`, tear it down and return the
/// reason.
fn settled_error(session: &mut StreamSession) -> Option<String> {
    if session.status() != PlaybackStatus::Error {
        return None;
    }
    let reason = session
        .error_reason()
        .unwrap_or("unknown failure")
        .to_string();
    session.teardown();
    Some(reason)
}

fn report(event: &PlayerEvent) {
    match event {
        PlayerEvent::StatusChanged {
            status,
            reason: Some(reason),
            ..
        } => log::info!("status: {status:?} ({reason})"),
        PlayerEvent::StatusChanged { status, .. } => log::info!("status: {status:?}"),
        PlayerEvent::VolumeChanged { volume, muted } => {
            log::info!("volume: {volume:.2} (muted: {muted})");
        }
        PlayerEvent::RecoveryStarted { category, attempt } => {
            log::info!("recovering from {category:?} failure (attempt {attempt})");
        }
    }
}
