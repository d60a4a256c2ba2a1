//! lamco-login - text-mode login manager
//!
//! Entry point for the login binary.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lamco_login::auth::{audit_log_from_config, create_backend, TerminalPrompt};
use lamco_login::config::{BackendKind, LoginConfig, DEFAULT_CONFIG_PATH};
use lamco_login::desktop::{DesktopCatalog, DesktopSelector, TerminalMenu, UserDesktopStore};
use lamco_login::session::{CommandRunner, LoginLifecycle};

/// Command-line arguments for lamco-login
#[derive(Parser, Debug)]
#[command(name = "lamco-login")]
#[command(version, about = "Text-mode login manager", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, env = "LAMCO_LOGIN_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Virtual terminal number (overrides session.tty)
    #[arg(short, long, env = "LAMCO_LOGIN_TTY")]
    pub tty: Option<u32>,

    /// Authentication backend (pam|shadow)
    #[arg(short, long)]
    pub backend: Option<BackendKind>,

    /// Ignore auth.autologin for this start
    #[arg(long)]
    pub no_autologin: bool,

    /// Verbose logging (can be specified multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log format (json|pretty|compact)
    #[arg(long, default_value = "compact")]
    pub log_format: String,

    /// Write logs to file instead of stderr
    #[arg(long)]
    pub log_file: Option<String>,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    init_logging(&args)?;

    info!("════════════════════════════════════════════════════════");
    info!("  lamco-login v{}", env!("CARGO_PKG_VERSION"));
    info!("  Built: {}", env!("BUILD_DATE"));
    info!("  Commit: {}", env!("GIT_HASH"));
    info!("  Profile: {}", if cfg!(debug_assertions) { "debug" } else { "release" });
    info!("════════════════════════════════════════════════════════");

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", lamco_login::utils::format_user_error(&e));
            return Ok(ExitCode::FAILURE);
        }
    };

    let tty = lamco_login::utils::detect_tty(&config);
    lamco_login::utils::log_startup_diagnostics(&config, &tty);

    loop {
        let backend = match create_backend(
            &config,
            Box::new(TerminalPrompt::new()),
            audit_log_from_config(&config.auth),
            &tty,
        ) {
            Ok(backend) => backend,
            Err(e) => {
                eprintln!("{}", lamco_login::utils::format_user_error(&e));
                return Ok(ExitCode::FAILURE);
            }
        };

        let selector = DesktopSelector::new(
            DesktopCatalog::scan(&config.desktop),
            Box::new(UserDesktopStore),
            Box::new(TerminalMenu::stdio()),
        );

        let mut lifecycle = LoginLifecycle::new(
            &config,
            backend,
            selector,
            Box::new(CommandRunner::new()),
            Box::new(std::io::stdout()),
        );

        match lifecycle.run() {
            Ok(()) => return Ok(ExitCode::SUCCESS),
            // Interactive logins go back to the prompt after a rejected password
            Err(e) if e.is_retryable() && config.auth.autologin_user().is_none() => continue,
            Err(_) => return Ok(ExitCode::FAILURE),
        }
    }
}

fn load_config(args: &Args) -> Result<LoginConfig> {
    let config = match LoginConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) if !std::path::Path::new(&args.config).exists() => {
            tracing::warn!("Failed to load config: {:#}, using defaults", e);
            LoginConfig::default()
        }
        Err(e) => return Err(e),
    };

    // Override config with CLI args
    let config = config.with_overrides(args.tty, args.backend, args.no_autologin);
    config.validate()?;

    info!("Configuration loaded successfully");
    tracing::debug!("Config: {:?}", config);

    Ok(config)
}

fn init_logging(args: &Args) -> Result<()> {
    use std::fs::OpenOptions;

    let log_level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("lamco_login={level},warn", level = log_level))
    });

    // The terminal belongs to the login prompt, so a log file replaces stderr
    if let Some(log_file_path) = &args.log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file_path)?;

        match args.log_format.as_str() {
            "json" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_writer(file)
                            .with_ansi(false),
                    )
                    .init();
            }
            "pretty" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .pretty()
                            .with_writer(file)
                            .with_ansi(false),
                    )
                    .init();
            }
            _ => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .compact()
                            .with_writer(file)
                            .with_ansi(false),
                    )
                    .init();
            }
        }
        info!("Logging to file: {}", log_file_path);
    } else {
        match args.log_format.as_str() {
            "json" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                    .init();
            }
            "pretty" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                    .init();
            }
            _ => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
                    .init();
            }
        }
    }

    Ok(())
}
