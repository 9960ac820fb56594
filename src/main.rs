//! Eos GW - MIDI fader gateway for ETC Eos consoles
//!
//! Wires the fader store, MIDI adapter, OSC transport, and UI server
//! together and runs the single event loop that serializes every source.

use anyhow::Result;
use clap::Parser;
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use eos_gw::api::{self, ApiState, DEFAULT_API_PORT};
use eos_gw::config::AppConfig;
use eos_gw::events::{EventBus, LogCategory};
use eos_gw::midi::MidiAdapter;
use eos_gw::osc::OscTransport;
use eos_gw::paths::AppPaths;
use eos_gw::router::Router;
use eos_gw::state::{JsonStorage, ProfileStore, Storage};

/// Eos Gateway - drive ETC Eos submasters, faders, and channels from a MIDI surface
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Data directory override (config, profiles, logs)
    #[arg(short, long, env = "EOS_GW_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Directory with the static UI bundle to serve
    #[arg(long)]
    ui_dir: Option<PathBuf>,

    /// UI/API port
    #[arg(short, long, default_value_t = DEFAULT_API_PORT)]
    port: u16,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// List available MIDI input devices and exit
    #[arg(long)]
    list_devices: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let paths = AppPaths::detect(args.data_dir.as_deref());
    let _log_guard = init_logging(&args.log_level, &paths)?;

    info!("Starting Eos GW...");

    if args.list_devices {
        list_devices_formatted();
        return Ok(());
    }

    let events = EventBus::new();
    let storage = JsonStorage::new(&paths, events.clone());
    storage.ensure_dirs().await?;

    // A structurally invalid config keeps the defaults, never a partial merge
    let config = match storage.load_config().await {
        Ok(Some(config)) => config,
        Ok(None) => {
            info!("No config file found, using defaults");
            AppConfig::default()
        }
        Err(e) => {
            events.log(
                LogCategory::Error,
                format!("Incorrect config file structure, using defaults: {e}"),
            );
            AppConfig::default()
        }
    };
    let config = Arc::new(parking_lot::Mutex::new(config));

    let store = Arc::new(ProfileStore::new(config.clone(), events.clone()));
    match storage.load_profiles().await {
        Ok(profiles) => {
            info!("Loaded {} fader profile(s)", profiles.len());
            store.load(profiles);
        }
        Err(e) => events.log(
            LogCategory::Error,
            format!("Failed to load fader profiles: {e}"),
        ),
    }

    let (midi_tx, mut midi_rx) = mpsc::channel(256);
    let adapter = MidiAdapter::new(midi_tx, config.clone(), events.clone());

    let (osc_tx, mut osc_rx) = mpsc::channel(256);
    let transport = OscTransport::new(osc_tx, events.clone());

    let mut router = Router::new(
        store.clone(),
        config.clone(),
        adapter,
        transport,
        events.clone(),
    );
    router.startup().await;

    let (cmd_tx, mut cmd_rx) = mpsc::channel(64);
    let api_state = Arc::new(ApiState {
        events: events.clone(),
        cmd_tx,
    });
    tokio::spawn({
        let ui_dir = args.ui_dir.clone();
        let port = args.port;
        async move {
            if let Err(e) = api::start_server(api_state, port, ui_dir).await {
                tracing::error!("UI server failed: {e:#}");
            }
        }
    });

    info!("Ready to process MIDI events!");

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    // Main event loop: every source is serialized here, so each handler runs
    // to completion before the next is dispatched
    loop {
        tokio::select! {
            Some(event) = midi_rx.recv() => {
                router.on_midi_event(event).await;
            }
            Some(event) = osc_rx.recv() => {
                router.on_osc_event(event).await;
            }
            Some(cmd) = cmd_rx.recv() => {
                router.handle_command(cmd).await;
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received, stopping event loop");
                break;
            }
        }
    }

    info!("Shutting down...");
    router.shutdown().await;

    let config_snapshot = config.lock().clone();
    if let Err(e) = storage.save_config(&config_snapshot).await {
        tracing::error!("Failed to write config: {e}");
    }
    if let Err(e) = storage.save_profiles(&store.profiles()).await {
        tracing::error!("Failed to write fader profiles: {e}");
    }

    info!("Eos GW shutdown complete");
    Ok(())
}

fn init_logging(
    level: &str,
    paths: &AppPaths,
) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    std::fs::create_dir_all(&paths.logs_dir)?;
    let file_appender = tracing_appender::rolling::daily(&paths.logs_dir, "eos-gw.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false),
        )
        .init();

    Ok(guard)
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
}

fn list_devices_formatted() {
    println!("\n{}", "=== MIDI Input Devices ===".bold().cyan());
    match MidiAdapter::list_devices() {
        Ok(devices) if devices.is_empty() => {
            println!("  {}", "(none found)".yellow());
        }
        Ok(devices) => {
            for (i, name) in devices.iter().enumerate() {
                println!("  {}: {}", i, name.green());
            }
        }
        Err(e) => println!("  {}", format!("Failed to list devices: {e}").red()),
    }
    println!();
}
