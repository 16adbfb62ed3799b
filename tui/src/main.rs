//! Checksync Terminal Device Entry Point
//!
//! Shows a checklist on the terminal as the watch would, fed by an
//! in-process phone that reads the list from a markdown file or a WebDAV
//! resource.
//!
//! # Usage
//!
//! ```bash
//! # Local document
//! checksync-tui --document ~/todo.md
//!
//! # WebDAV document
//! checksync-tui --webdav-url https://dav.example.org/todo.md --user me --password secret
//!
//! # Lossy link, logs to a file
//! checksync-tui -d todo.md --drop-rate 0.1 --fail-rate 0.05 --log-file /tmp/checksync.log
//! ```
//!
//! Logging follows `RUST_LOG`. Without `--log-file` nothing is written,
//! since the terminal belongs to the UI.

use std::io::{self, IsTerminal, Stdout};
use std::panic;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use checksync_companion::{Companion, StoreSettings};
use checksync_core::{default_config_path, load_config_from_path, ConfigOverrides, DeviceConfig};
use checksync_tui::{run_peer, App, Link, LinkFaults};

/// Pending resend requests
const REQUEST_QUEUE: usize = 4;

/// Checksync terminal device - a watch checklist in your terminal
#[derive(Parser, Debug)]
#[command(name = "checksync-tui")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Markdown checklist on the local disk
    #[arg(short = 'd', long, env = "CHECKSYNC_DOCUMENT", value_name = "FILE")]
    document: Option<PathBuf>,

    /// WebDAV URL of the markdown checklist
    #[arg(long, env = "CHECKSYNC_WEBDAV_URL", value_name = "URL")]
    webdav_url: Option<String>,

    /// WebDAV user name
    #[arg(short = 'u', long, env = "CHECKSYNC_WEBDAV_USER", value_name = "USER")]
    user: Option<String>,

    /// WebDAV password
    #[arg(long, env = "CHECKSYNC_WEBDAV_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Device configuration file
    #[arg(short = 'c', long, env = "CHECKSYNC_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Chance (0.0-1.0) that a message to the device is lost
    #[arg(long, default_value_t = 0.0, value_parser = parse_rate)]
    drop_rate: f64,

    /// Chance (0.0-1.0) that a send in either direction fails
    #[arg(long, default_value_t = 0.0, value_parser = parse_rate)]
    fail_rate: f64,

    /// Write logs to this file
    #[arg(short = 'l', long, env = "CHECKSYNC_LOG_FILE", value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Progress sweep duration override (milliseconds)
    #[arg(long, value_name = "MS")]
    sweep_ms: Option<u64>,

    /// Status hide delay override (milliseconds)
    #[arg(long, value_name = "MS")]
    hide_delay_ms: Option<u64>,

    /// Maximum number of list items
    #[arg(long, value_name = "N")]
    max_items: Option<usize>,

    /// Largest outbound message (bytes)
    #[arg(long, value_name = "BYTES")]
    outbox_size: Option<usize>,
}

fn parse_rate(s: &str) -> Result<f64, String> {
    let rate: f64 = s.parse().map_err(|_| format!("`{s}` is not a number"))?;
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(format!("{rate} is not between 0.0 and 1.0"))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.log_file.as_deref())?;
    let config = load_device_config(&args)?;
    let store = store_settings(&args)?
        .open()
        .context("Cannot open checklist store")?;

    require_tty()?;

    let Link {
        device_outbox,
        device_events,
        companion,
        from_device,
    } = Link::new(
        LinkFaults {
            drop_rate: args.drop_rate,
            fail_rate: args.fail_rate,
        },
        config.inbox_size,
        config.outbox_size,
    );
    let (request_tx, request_rx) = mpsc::channel(REQUEST_QUEUE);

    let peer = tokio::spawn(run_peer(
        Companion::new(store),
        companion,
        from_device,
        request_rx,
    ));
    let mut app = App::new(&config, device_outbox, device_events, request_tx);

    install_panic_hook();
    let mut terminal = setup_terminal()?;

    let result = app.run(&mut terminal).await;

    restore_terminal(&mut terminal)?;
    peer.abort();

    result
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let writer = match log_file {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Cannot create log file {}", path.display()))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(io::sink),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer),
        )
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    Ok(())
}

fn load_device_config(args: &Args) -> Result<DeviceConfig> {
    let path = args.config.clone().or_else(default_config_path);
    let mut config = load_config_from_path(path).context("Invalid device configuration")?;

    config_overrides(args)
        .apply(&mut config)
        .context("Invalid command line override")?;

    tracing::info!(source = %config.source(), "Device configuration loaded");
    Ok(config)
}

fn config_overrides(args: &Args) -> ConfigOverrides {
    let mut overrides = ConfigOverrides::new();
    if let Some(ms) = args.sweep_ms {
        overrides = overrides.with_sweep_ms(ms);
    }
    if let Some(ms) = args.hide_delay_ms {
        overrides = overrides.with_hide_delay_ms(ms);
    }
    if let Some(max) = args.max_items {
        overrides = overrides.with_max_items(max);
    }
    if let Some(size) = args.outbox_size {
        overrides = overrides.with_outbox_size(size);
    }
    overrides
}

fn store_settings(args: &Args) -> Result<StoreSettings> {
    if let Some(path) = &args.document {
        return Ok(StoreSettings::File(path.clone()));
    }
    if let Some(url) = &args.webdav_url {
        return Ok(StoreSettings::webdav(
            url,
            args.user.as_deref().unwrap_or_default(),
            args.password.as_deref().unwrap_or_default(),
        )?);
    }
    bail!("No checklist given: pass --document or --webdav-url")
}

fn require_tty() -> Result<()> {
    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        bail!("checksync-tui requires a terminal (TTY); for SSH use `ssh -t`");
    }
    Ok(())
}

fn install_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Restore terminal before printing panic
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
