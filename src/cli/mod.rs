//! Command-line interface for panemux.
//!
//! This module handles CLI argument parsing and the informational
//! subcommands. Parsing of the interactive `:` commands lives in
//! [`commands`].

pub mod commands;

use clap::{Parser, Subcommand};
use panemux_config::Config;
use std::path::PathBuf;

/// panemux - split-panel client for remote terminal sessions
#[derive(Parser)]
#[command(name = "panemux")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Attach server base URL (overrides config)
    #[arg(long, value_name = "URL")]
    pub server: Option<String>,

    /// Session to attach to on startup
    #[arg(short, long, value_name = "NAME")]
    pub session: Option<String>,

    /// Window index to attach to on startup
    #[arg(short, long, value_name = "INDEX", default_value_t = 0)]
    pub window: u32,

    /// Use this config file instead of ~/.config/panemux/config.yaml
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set debug log level (overrides config and RUST_LOG)
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevelArg>,
}

/// Log level argument for CLI
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum LogLevelArg {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevelArg {
    /// Convert to `log::LevelFilter`
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevelArg::Off => log::LevelFilter::Off,
            LogLevelArg::Error => log::LevelFilter::Error,
            LogLevelArg::Warn => log::LevelFilter::Warn,
            LogLevelArg::Info => log::LevelFilter::Info,
            LogLevelArg::Debug => log::LevelFilter::Debug,
            LogLevelArg::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the effective configuration as YAML
    ShowConfig,

    /// Print the config, state, and debug log file locations
    Paths,
}

/// Runtime options passed from CLI to the controller
#[derive(Clone, Debug, Default)]
pub struct RuntimeOptions {
    /// Server URL override
    pub server_url: Option<String>,
    /// Session to resume on startup
    pub session: Option<String>,
    /// Window index for the startup session
    pub window: u32,
    /// Explicit config file
    pub config_path: Option<PathBuf>,
    /// Log level override from CLI
    pub log_level: Option<log::LevelFilter>,
}

impl RuntimeOptions {
    /// Load the config file these options point at
    pub fn load_config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config_path {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };
        if let Some(url) = &self.server_url {
            config.server_url = url.clone();
            config.validate()?;
        }
        Ok(config)
    }
}

/// Result of CLI processing
pub enum CliResult {
    /// Continue with normal startup
    Continue(RuntimeOptions),
    /// Exit with the given code (subcommand completed)
    Exit(i32),
}

/// Process CLI arguments and handle subcommands
pub fn process_cli() -> CliResult {
    let cli = Cli::parse();

    let options = RuntimeOptions {
        server_url: cli.server,
        session: cli.session,
        window: cli.window,
        config_path: cli.config,
        log_level: cli.log_level.map(LogLevelArg::to_level_filter),
    };

    match cli.command {
        Some(Commands::ShowConfig) => {
            let result = options
                .load_config()
                .and_then(|config| Ok(serde_yaml_ng::to_string(&config)?));
            match result {
                Ok(yaml) => {
                    print!("{yaml}");
                    CliResult::Exit(0)
                }
                Err(e) => {
                    eprintln!("panemux: error: {e:#}");
                    CliResult::Exit(1)
                }
            }
        }
        Some(Commands::Paths) => {
            println!("config: {}", Config::config_path().display());
            println!("state:  {}", Config::state_path().display());
            println!("log:    {}", crate::debug::log_path().display());
            CliResult::Exit(0)
        }
        None => CliResult::Continue(options),
    }
}
