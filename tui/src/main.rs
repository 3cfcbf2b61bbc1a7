//! termshell Demo Entry Point
//!
//! Two panes side by side: an event log on the left and a small editor on
//! the right. A background thread appends a tick to the log every second.
//!
//! # Usage
//!
//! ```bash
//! # Defaults
//! termshell-demo
//!
//! # Mouse support, logs to a file
//! termshell-demo --mouse --log-file /tmp/termshell.log
//!
//! # Custom config file
//! termshell-demo --config ./shell.toml
//! ```
//!
//! # Keys
//!
//! - `Tab`: move focus to the other pane
//! - `Ctrl-Z`: drop to `$SHELL`; exit it to come back
//! - `Ctrl-C`: quit

use std::fs::File;
use std::io::{self, IsTerminal};
use std::panic;
use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::tick;
use termshell_core::{
    default_config_path, load_config_from_path, Application, ConfigSource, Gesture, KeyCode,
    KeyModifiers, Lifecycle, ShellConfig,
};
use termshell_tui::{application, restore_terminal, SplitPane, TextBlock};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// termshell demo - a two-pane terminal application
#[derive(Parser, Debug)]
#[command(name = "termshell-demo")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "TERMSHELL_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable mouse reporting
    #[arg(short = 'm', long)]
    mouse: bool,

    /// Double-click window in milliseconds (0 disables double clicks)
    #[arg(long, value_name = "MS")]
    double_click_ms: Option<u64>,

    /// Minimum interval between processed resizes in milliseconds
    #[arg(long, value_name = "MS")]
    resize_throttle_ms: Option<u64>,

    /// Write logs to this file (stdout belongs to the UI)
    #[arg(long, env = "TERMSHELL_LOG_FILE", value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "TERMSHELL_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

/// Initialize logging into `path`; without a path nothing is logged
fn init_logging(path: Option<&PathBuf>, level: &str) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file =
        File::create(path).with_context(|| format!("Failed to create log file: {path:?}"))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "termshell_demo={level},termshell_core={level},termshell_tui={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .with_target(true)
        .with_thread_names(true)
        .init();

    Ok(())
}

/// Load the config file, then apply command-line overrides
fn load_settings(args: &Args) -> Result<ShellConfig> {
    let path = args.config.clone().or_else(default_config_path);
    let mut config = load_config_from_path(path).context("Failed to load configuration")?;

    if args.mouse {
        config.enable_mouse = true;
        config.set_source(ConfigSource::Cli);
    }
    if let Some(ms) = args.double_click_ms {
        config.double_click_window = Duration::from_millis(ms);
        config.set_source(ConfigSource::Cli);
    }
    if let Some(ms) = args.resize_throttle_ms {
        config.resize_throttle = Duration::from_millis(ms);
        config.set_source(ConfigSource::Cli);
    }

    Ok(config)
}

/// Hand the terminal to an interactive shell until it exits
fn shell_out(app: &Application) {
    let shell = std::env::var("SHELL").unwrap_or_else(|_| "sh".to_string());
    let result = app.suspend(|| {
        println!("termshell suspended; exit the shell to return");
        if let Err(e) = Command::new(&shell).status() {
            eprintln!("failed to start {shell}: {e}");
        }
    });
    if let Err(e) = result {
        warn!(error = %e, "suspend failed");
    }
}

fn install_hooks(app: &Application, split: &Arc<SplitPane>, log: &Arc<TextBlock>) {
    let weak = app.downgrade();
    let pane = Arc::clone(split);
    app.set_input_interceptor(move |key| {
        let Some(app) = weak.upgrade() else {
            return Some(key);
        };
        match key.code {
            KeyCode::Tab => {
                app.set_focus(pane.cycle());
                None
            }
            KeyCode::Char('z') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                shell_out(&app);
                None
            }
            _ => Some(key),
        }
    });

    let clicks = Arc::clone(log);
    app.set_pointer_interceptor(move |gesture, sample| {
        if matches!(gesture, Gesture::Click(_) | Gesture::DoubleClick(_)) {
            clicks.push_line(&format!("{gesture:?} at {},{}", sample.x, sample.y));
        }
        Some((gesture, sample))
    });

    let resizes = Arc::clone(log);
    app.set_after_resize(move |width, height| {
        resizes.push_line(&format!("resized to {width}x{height}"));
    });
}

/// Append a tick to the log every second until the application stops
fn spawn_ticker(app: &Application, log: &Arc<TextBlock>) -> Result<thread::JoinHandle<()>> {
    let weak = app.downgrade();
    let log = Arc::clone(log);
    thread::Builder::new()
        .name("termshell-ticker".to_string())
        .spawn(move || {
            let ticks = tick(Duration::from_secs(1));
            for (n, _) in ticks.iter().enumerate() {
                let Some(app) = weak.upgrade() else {
                    break;
                };
                if app.lifecycle() == Lifecycle::Stopped {
                    break;
                }
                let target = Arc::clone(&log);
                app.queue_update_draw(
                    move || target.push_line(&format!("tick {}", n + 1)),
                    &[log.component()],
                );
            }
        })
        .context("Failed to spawn ticker thread")
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_ref(), &args.log_level)?;

    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        eprintln!("Error: termshell-demo requires a terminal (TTY)");
        std::process::exit(1);
    }

    let config = load_settings(&args)?;
    info!(source = %config.source(), "configuration loaded");

    // Restore the terminal before the panic message prints
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        restore_terminal();
        original_hook(panic_info);
    }));

    let app = application(&config);
    let log = TextBlock::new("events");
    log.push_line("Tab switches panes, Ctrl-Z opens a shell, Ctrl-C quits");
    let editor = TextBlock::editable("editor");
    let split = SplitPane::new(log.component(), editor.component());

    app.set_root(split.component(), true);
    install_hooks(&app, &split, &log);
    let ticker = spawn_ticker(&app, &log)?;

    let result = app.run();
    if ticker.join().is_err() {
        warn!("ticker thread panicked");
    }
    result?;

    info!("termshell demo exited");
    Ok(())
}
