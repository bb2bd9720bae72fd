//! Relay Bot entry point.
//!
//! Startup sequence:
//!   1. Load .env (or the file given with `-e`)
//!   2. Load config
//!   3. Resolve effective log level (CLI `-v` flags > env > config)
//!   4. Init logger once
//!   5. Build LLM provider and Telegram client
//!   6. Spawn Ctrl-C → shutdown signal watcher
//!   7. Run the relay loop until shutdown

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use relay_bot::error::AppError;
use relay_bot::llm::providers;
use relay_bot::relay::Relay;
use relay_bot::telegram::TelegramClient;
use relay_bot::{config, logger};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let args = parse_cli_args();

    match &args.env_file {
        Some(path) => {
            dotenvy::from_filename(path)
                .map_err(|e| AppError::Config(format!("cannot load env file {path}: {e}")))?;
        }
        // Default .env is optional; ignore errors.
        None => {
            let _ = dotenvy::dotenv();
        }
    }

    let config = config::load(args.config_path.as_deref())?;

    let effective_log_level = args.log_level.unwrap_or(config.log_level.as_str());
    logger::init(effective_log_level)?;

    info!(
        provider = %config.llm.provider,
        model = %config.llm.openai.model,
        export_path = %config.relay.export_path.display(),
        effective_log_level = %effective_log_level,
        "config loaded"
    );

    let token = config
        .telegram_token
        .clone()
        .ok_or_else(|| AppError::Config("TELEGRAM_API_KEY is not set".into()))?;

    if config.llm.provider != "dummy" && config.llm_api_key.is_none() {
        warn!("OPENAI_API_KEY not set, completion requests will be sent without authorization");
    }

    let llm = providers::build(&config.llm, config.llm_api_key.clone())?;
    let telegram = TelegramClient::new(&config.telegram, &token)?;

    // Ctrl-C handler cancels the token so the loop stops between turns.
    let shutdown = CancellationToken::new();
    let ctrlc_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, initiating shutdown");
            ctrlc_token.cancel();
        }
    });

    let mut relay = Relay::new(telegram, llm, config.relay);
    relay.run(shutdown).await;

    Ok(())
}

struct CliArgs {
    log_level: Option<&'static str>,
    config_path: Option<String>,
    env_file: Option<String>,
}

fn parse_cli_args() -> CliArgs {
    let mut verbosity = 0u8;
    let mut config_path = None;
    let mut env_file = None;

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "--" {
            break;
        }

        match arg.as_str() {
            "-h" | "--help" => {
                println!("Usage: relay-bot [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -h, --help                 Print help");
                println!("  -f, --config <PATH>        Path to configuration file (default: config/default.toml)");
                println!("  -e, --env-file <PATH>      Load environment from this file instead of .env");
                println!("  -v, -vv, -vvv, -vvvv       Increase logging verbosity");
                std::process::exit(0);
            }
            "-f" | "--config" => match iter.next() {
                Some(path) => config_path = Some(path),
                None => {
                    eprintln!("error: -f/--config requires a path argument");
                    std::process::exit(1);
                }
            },
            "-e" | "--env-file" => match iter.next() {
                Some(path) => env_file = Some(path),
                None => {
                    eprintln!("error: -e/--env-file requires a path argument");
                    std::process::exit(1);
                }
            },
            "--verbose" => verbosity = verbosity.saturating_add(1),
            a if a.starts_with('-') && a.len() > 1 && a.chars().skip(1).all(|c| c == 'v') => {
                verbosity = verbosity.saturating_add((a.len() - 1) as u8);
            }
            _ => {}
        }
    }

    CliArgs {
        log_level: logger::level_for_verbosity(verbosity),
        config_path,
        env_file,
    }
}
