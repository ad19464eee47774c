// Entrypoint for the CLI application.
// - Parses flags, sets up logging, loads the config.
// - Builds the HTTP client and hands it to the workflow.
// - Exits with 0 on success, 1 on configuration errors, 2 on failures and
//   3 when the operator aborts.

use anyhow::Context;
use clap::Parser;
use hello_pr::{config, ApiClient, ChangePlan, HttpTransport, TerminalConsole, Workflow};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const EXIT_CONFIG: u8 = 1;
const EXIT_FAILURE: u8 = 2;

/// Open a pull request that adds Hello.txt to one of your GitHub repositories.
#[derive(Parser, Debug)]
#[command(name = "hello-pr", version, about)]
struct Cli {
    /// Path to the JSON config holding gitHubToken and gitHubUsername
    #[arg(short, long, env = "HELLO_PR_CONFIG")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let path = cli.config.unwrap_or_else(config::default_path);
    let config = match config::load(&path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Configuration error: {}", err);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    match run(&config) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Unexpected error: {:#}", err);
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn run(config: &config::Config) -> anyhow::Result<ExitCode> {
    let transport = HttpTransport::new(&config.api).context("Failed to build HTTP client")?;
    let api = ApiClient::new(transport, &config.credentials)
        .context("GitHub token contains characters not allowed in a header")?;

    let mut console = TerminalConsole::new();
    let outcome = Workflow::new(
        &api,
        config.credentials.account(),
        &mut console,
        ChangePlan::hello(),
    )
    .run();
    Ok(ExitCode::from(outcome.exit_code()))
}
