// SPDX-FileCopyrightText: 2026 Mamachat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mamachat - clinic chat from the command line.
//!
//! This is the binary entry point for the Mamachat client.

mod chat;
mod check;
mod render;
mod shutdown;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use mamachat_backend::HttpBackend;
use mamachat_config::MamachatConfig;
use mamachat_core::{ChatBackend, MamachatError};
use mamachat_sync::{ChatSync, SyncOptions};

use crate::render::Style;

/// Mamachat - clinic chat from the command line.
#[derive(Parser, Debug)]
#[command(name = "mamachat", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Disable colored output.
    #[arg(long, global = true)]
    plain: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// List chat threads, newest first.
    Threads {
        /// Print the thread list as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the messages of a thread.
    Show {
        /// Thread id.
        thread: String,
    },
    /// Follow a thread (or the thread list) until interrupted.
    ///
    /// While following a thread, each line typed on stdin is sent as a reply.
    Watch {
        /// Thread id. Omit to follow the thread list.
        thread: Option<String>,
    },
    /// Reply in a thread.
    Send {
        /// Thread id.
        thread: String,
        /// Message text. Multiple words are joined with spaces.
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },
    /// Check configuration and backend reachability.
    Check,
    /// Print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => mamachat_config::load_and_validate_path(path),
        None => mamachat_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            mamachat_config::render_errors(&errors);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.client.log_level);
    let style = Style::detect(cli.plain);

    match run(cli.command, &config, style).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("mamachat: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(
    command: Commands,
    config: &MamachatConfig,
    style: Style,
) -> Result<ExitCode, MamachatError> {
    if let Commands::Config = command {
        let rendered = config
            .to_toml_string()
            .map_err(|e| MamachatError::Config(format!("cannot render configuration: {e}")))?;
        print!("{rendered}");
        return Ok(ExitCode::SUCCESS);
    }

    let backend: Arc<dyn ChatBackend> = Arc::new(HttpBackend::from_config(config)?);
    if let Commands::Check = command {
        let failures = check::run_check(config, backend.as_ref(), style).await;
        return Ok(if failures == 0 {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    let sync = Arc::new(ChatSync::new(backend, sync_options(config)));
    let mut stdout = std::io::stdout();
    match command {
        Commands::Threads { json } => chat::list_threads(&sync, json, style, &mut stdout).await?,
        Commands::Show { thread } => chat::show_thread(&sync, &thread, style, &mut stdout).await?,
        Commands::Watch { thread } => {
            let cancel = shutdown::install_signal_handler();
            chat::watch(sync, thread.as_deref(), style, cancel).await?;
        }
        Commands::Send { thread, message } => {
            let text = message.join(" ");
            if let Err(e) = chat::send_reply(&sync, &thread, &text, &mut stdout).await {
                eprintln!("Error sending reply: {e}");
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Check | Commands::Config => {}
    }
    Ok(ExitCode::SUCCESS)
}

fn sync_options(config: &MamachatConfig) -> SyncOptions {
    SyncOptions {
        current_user_id: config.client.current_user_id.clone(),
        poll_interval: config.sync.poll_interval(),
    }
}

/// Initialize tracing subscriber with the configured log level.
///
/// `RUST_LOG` takes precedence when set. Logs go to stderr so command
/// output stays clean.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mamachat={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
