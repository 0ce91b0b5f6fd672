//! # rbx-cli
//!
//! Command line front end for the rbxapi request engine.
//!
//! Parses commands, sets up logging and error reporting, loads the layered
//! configuration and dispatches to the command handlers.

use std::collections::HashMap;
use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand, ValueEnum};
use rbx_core::error::{RbxError, RbxResult};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::call::CallArgs;
use commands::CommandContext;
use output::errors::ErrorFormatter;

/// Call Roblox web API endpoints from the command line
#[derive(Parser)]
#[command(name = "rbx", version, about = "Call Roblox web API endpoints")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log line format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Configuration file to use instead of searching for rbx.toml / rbx.json
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Session cookie (.ROBLOSECURITY value)
    #[arg(long, global = true, env = "RBX_COOKIE", hide_env_values = true)]
    pub cookie: Option<String>,

    /// Open Cloud API key
    #[arg(long, global = true, env = "RBX_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Anti-forgery attempt bound, first attempt included
    #[arg(long, global = true)]
    pub csrf_retries: Option<u32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Execute one endpoint call and print the result envelope
    Call(CallArgs),
    /// Validate configuration and show how caching resolves
    Check {
        /// API group to resolve cache settings for
        #[arg(long)]
        group: Option<String>,
        /// Endpoint name to resolve cache settings for
        #[arg(long)]
        endpoint: Option<String>,
    },
}

impl Cli {
    /// Flags that override every configuration file and environment value
    fn overrides(&self) -> HashMap<String, String> {
        let mut overrides = HashMap::new();
        if let Some(cookie) = &self.cookie {
            overrides.insert("cookie".to_string(), cookie.clone());
        }
        if let Some(api_key) = &self.api_key {
            overrides.insert("api-key".to_string(), api_key.clone());
        }
        if let Some(retries) = self.csrf_retries {
            overrides.insert("csrf-retries".to_string(), retries.to_string());
        }
        overrides
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.log_format);
    setup_panic_handler();

    info!("Starting rbx v{}", env!("CARGO_PKG_VERSION"));

    match run_cli(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", ErrorFormatter::new().format_error(&err));
            ExitCode::FAILURE
        }
    }
}

fn run_cli(cli: Cli) -> RbxResult<()> {
    // Create Tokio runtime for async operations
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| RbxError::io("Failed to create async runtime".to_string(), e))?;

    let overrides = cli.overrides();
    let Cli { command, config, .. } = cli;

    rt.block_on(async move {
        let ctx = CommandContext::new(overrides, config)?;
        commands::dispatch_command(command, &ctx).await
    })
}

fn setup_logging(verbose: bool, format: LogFormat) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "rbx_cli={level},rbx_client={level},rbx_cache={level},rbx_config={level}"
        ))
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("rbx encountered an unexpected error: {}", panic_info);
        eprintln!("rbx crashed! This is a bug.");
        eprintln!("Please report this at: https://github.com/rbxapi/rbxapi/issues");
        eprintln!("Error: {}", panic_info);
    }));
}
