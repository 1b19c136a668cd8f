//! CLI entrypoint and subcommand orchestration.

mod config;
mod sound;
#[cfg(test)]
mod test_support;
mod tui;

use clap::{Parser, Subcommand};
use games::bridge::{self, BridgeRow};
use games::lucky_box::{self, LuckyBox};

#[cfg(not(test))]
use std::io::Write;
#[cfg(not(test))]
use std::sync::Arc;

#[cfg(not(test))]
use coach::{ChatTransport, CredentialStore, persona};
#[cfg(not(test))]
use config::Config;
#[cfg(not(test))]
use futures_util::StreamExt;
#[cfg(not(test))]
use tracing::{info, warn};
#[cfg(not(test))]
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};
#[cfg(not(test))]
use tui::Screen;

/// Top-level command-line arguments for Chance Champions.
#[derive(Parser)]
#[command(name = "chance-champions")]
#[command(about = "Probability mini-games with an AI coach", version = "0.1.0")]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Enable debug logging to ~/.chance-champions/logs/debug.log
    #[arg(long, default_value_t = false)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// CLI subcommands available in the application.
#[derive(Subcommand)]
enum Commands {
    /// Start the full-screen TUI on the home screen (default when no subcommand is given)
    Play,

    /// Start the full-screen TUI directly in the AI coach
    Coach,

    /// Print the Lucky Box prize tables with their expected values
    Boxes,

    /// Print the Survival Bridge odds table with expected values
    Bridge,

    /// Ask the coach one question and stream the answer to stdout
    Ask {
        /// Question to send to the coach
        #[arg(short = 'm', long)]
        message: String,
    },
}

impl Commands {
    fn label(&self) -> &'static str {
        match self {
            Commands::Play => "play",
            Commands::Coach => "coach",
            Commands::Boxes => "boxes",
            Commands::Bridge => "bridge",
            Commands::Ask { .. } => "ask",
        }
    }

    fn is_tui(&self) -> bool {
        matches!(self, Commands::Play | Commands::Coach)
    }
}

#[cfg(not(test))]
#[tokio::main]
/// Program entrypoint.
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let command = cli.command.unwrap_or(Commands::Play);
    let is_tui = command.is_tui();

    // Console output is suppressed in TUI mode so it cannot corrupt the display.
    // --debug writes debug-level logs to ~/.chance-champions/logs/debug.YYYY-MM-DD.log.
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    // WorkerGuard must outlive main() so buffered file writes are flushed on exit.
    let _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>;

    let debug_writer = if cli.debug {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        let log_dir = std::path::PathBuf::from(home)
            .join(".chance-champions")
            .join("logs");
        std::fs::create_dir_all(&log_dir).ok();
        let appender = tracing_appender::rolling::daily(&log_dir, "debug.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        _file_guard = Some(guard);
        Some(writer)
    } else {
        _file_guard = None;
        None
    };

    match (is_tui, debug_writer) {
        (true, Some(writer)) => {
            let console = fmt::layer()
                .with_writer(std::io::sink)
                .with_target(false)
                .with_filter(console_filter);
            let file = fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_ansi(false)
                .with_filter(EnvFilter::new("debug,hyper_util=info,rustls=info,reqwest=info"));
            tracing_subscriber::registry()
                .with(console)
                .with(file)
                .init();
        }
        (true, None) => {
            fmt()
                .with_env_filter(console_filter)
                .with_writer(std::io::sink)
                .with_target(false)
                .init();
        }
        (false, Some(writer)) => {
            let console = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(console_filter);
            let file = fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_ansi(false)
                .with_filter(EnvFilter::new("debug,hyper_util=info,rustls=info,reqwest=info"));
            tracing_subscriber::registry()
                .with(console)
                .with(file)
                .init();
        }
        (false, None) => {
            fmt()
                .with_env_filter(console_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
    }

    if cli.debug {
        info!(
            version = env!("CARGO_PKG_VERSION"),
            command = command.label(),
            log_level = %cli.log_level,
            "========== chance-champions session start =========="
        );
    }

    let config = Config::load(cli.config.as_deref()).unwrap_or_else(|e| {
        warn!("Failed to load config ({e}), using defaults");
        Config::default()
    });
    sound::set_muted(config.ui.muted);

    match command {
        Commands::Play => tui::run_tui(config, Screen::Home).await,
        Commands::Coach => tui::run_tui(config, Screen::Coach).await,
        Commands::Boxes => {
            for line in box_report() {
                println!("{line}");
            }
            Ok(())
        }
        Commands::Bridge => {
            for line in bridge_report() {
                println!("{line}");
            }
            Ok(())
        }
        Commands::Ask { message } => cmd_ask(config, message).await,
    }
}

#[cfg(not(test))]
/// Sends one question to the coach and streams the reply.
async fn cmd_ask(config: Config, message: String) -> anyhow::Result<()> {
    if message.trim().is_empty() {
        eprintln!("Error: message must not be empty");
        std::process::exit(1);
    }

    let store = Arc::new(CredentialStore::with_key(config.coach.api_key()));
    let transport = config.coach.gemini_transport(store);

    println!("{}", format_ask_header(&message));

    let session = match transport
        .create_session(&persona::coach_session_config())
        .await
    {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Set GEMINI_API_KEY or coach.api_key in config.toml.");
            std::process::exit(1);
        }
    };

    let mut fragments = match transport.send(&session, &message).await {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let mut stdout = std::io::stdout();
    while let Some(fragment) = fragments.next().await {
        match fragment {
            Ok(text) => {
                print!("{text}");
                stdout.flush()?;
            }
            Err(e) => {
                println!();
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
    }
    println!();
    Ok(())
}

/// Formats ask mode header text.
fn format_ask_header(message: &str) -> String {
    format!("You: {message}\n")
}

/// One box's prize table followed by its price and expected value.
fn format_box(lucky_box: &LuckyBox, best: bool) -> Vec<String> {
    let marker = if best { "  ★ best value" } else { "" };
    let mut lines = vec![format!(
        "{} (id {}, price {} PP){marker}",
        lucky_box.name, lucky_box.id, lucky_box.price
    )];
    for item in lucky_box.items {
        lines.push(format!(
            "  {:<16} {:>5} PP  {:>5.1}%  {}",
            item.name,
            item.value,
            item.probability * 100.0,
            item.rarity
        ));
    }
    let ev = lucky_box::expected_value(lucky_box);
    lines.push(format!(
        "  expected value {ev:.1} PP, net {:+.1} PP per open",
        ev - f64::from(lucky_box.price)
    ));
    lines
}

fn box_report() -> Vec<String> {
    let best = lucky_box::best_box();
    let mut lines = Vec::new();
    for lucky_box in lucky_box::LUCKY_BOXES.iter() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.extend(format_box(lucky_box, lucky_box.id == best.id));
    }
    lines
}

fn format_bridge_row(row: &BridgeRow) -> String {
    format!(
        "{:>6}  {:>8.0}%  {:>+7}  {:>+8}  {:>+8.1}",
        row.count,
        row.probability * 100.0,
        row.reward,
        row.penalty,
        row.expected_value()
    )
}

fn bridge_report() -> Vec<String> {
    let mut lines = vec![format!(
        "{:>6}  {:>9}  {:>7}  {:>8}  {:>8}",
        "Group", "Survival", "Reward", "Penalty", "EV"
    )];
    lines.extend(bridge::SURVIVAL_BRIDGE.iter().map(format_bridge_row));
    lines.push(format!(
        "{} adventurers in total; larger groups pay more but fall more often.",
        bridge::TOTAL_ADVENTURERS
    ));
    lines
}
