use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use map_core::MapResult;
use serde_json::Value;
use std::path::PathBuf;
use std::process;
use tracing::Level;

mod commands;

/// Exit codes.
/// 0 = success, 1 = provider error, 2 = input error, 5 = rate limited, 70 = adapter defect.
const EXIT_OK: i32 = 0;
const EXIT_DOMAIN: i32 = 1;
const EXIT_INPUT: i32 = 2;
const EXIT_RATE: i32 = 5;
const EXIT_DEFECT: i32 = 70;

#[derive(Parser)]
#[command(name = "mapx", version, about = "Perform provider usecases through their maps")]
struct Cli {
    /// JSON config file (default: $MAPX_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Log level when no -v is given (error, warn, info, debug, trace)
    #[arg(long = "log", env = "MAPX_LOG", global = true, hide = true)]
    log_level: Option<Level>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Perform one usecase of a provider
    Perform {
        /// Provider name, e.g. slack
        provider: String,
        /// Usecase name, e.g. SendMessage
        usecase: String,
        /// Input JSON file (or - for stdin)
        #[arg(long)]
        input: Option<String>,
        /// Parameters JSON file
        #[arg(long)]
        parameters: Option<String>,
        /// Security JSON file, keyed by scheme id
        #[arg(long)]
        security: Option<String>,
        /// Security JSON given inline
        #[arg(long, env = "MAPX_SECURITY", hide_env_values = true)]
        security_json: Option<String>,
    },
    /// List providers and their usecases
    Providers,
}

/// Exit code for a finished usecase.
fn exit_code_for(outcome: &MapResult<Value>) -> i32 {
    match outcome {
        Ok(Ok(_)) => EXIT_OK,
        Ok(Err(e)) if e.is_rate_limited() => EXIT_RATE,
        Ok(Err(_)) => EXIT_DOMAIN,
        Err(_) => EXIT_DEFECT,
    }
}

fn init_logging(verbose: u8, fallback: Option<Level>) {
    let level = match verbose {
        0 => fallback.unwrap_or(Level::WARN),
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_level);

    let result = match cli.command {
        Commands::Perform {
            provider,
            usecase,
            input,
            parameters,
            security,
            security_json,
        } => commands::perform(&commands::PerformArgs {
            config: cli.config.as_deref(),
            provider: &provider,
            usecase: &usecase,
            input: input.as_deref(),
            parameters: parameters.as_deref(),
            security: security.as_deref(),
            security_json: security_json.as_deref(),
        }),
        Commands::Providers => commands::providers(cli.config.as_deref()).map(|()| EXIT_OK),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            process::exit(EXIT_INPUT);
        }
    }
}
