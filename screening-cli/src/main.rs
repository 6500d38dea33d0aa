//! Main entry point for the screening CLI.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use dotenv::dotenv;
use shared::config::ClientConfig;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{AppContext, assess, history, session};

/// Screening CLI
#[derive(Parser)]
#[command(name = "screening")]
#[command(about = "Command-line client for the screening questionnaire", long_about = None)]
struct Cli {
    /// Path to the configuration file (optional)
    #[arg(
        long,
        short,
        global = true,
        help = "Path to the configuration file (e.g., config.yaml or config.json). If not provided, defaults will be used."
    )]
    config: Option<PathBuf>,

    /// API base URL, overriding the configuration file and environment
    #[arg(
        long,
        global = true,
        help = "API base URL (e.g., http://localhost:8080). Overrides the configuration file and SCREENING_API_URL."
    )]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Subcommands for the screening CLI
#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the access token
    Login(session::LoginArgs),

    /// Create an account
    Signup(session::SignupArgs),

    /// Forget the stored access token
    Logout,

    /// Take an assessment: age, questionnaire, submission and result
    Assess(assess::AssessArgs),

    /// Show the result of the last submitted assessment
    Result(assess::LocationArgs),

    /// List previously submitted assessments
    History,

    /// Print tab completion for the screening commands
    Completion {
        /// Shell to complete in: bash, zsh, fish, elvish or powershell
        #[arg(long, short, value_enum)]
        shell: Shell,
    },

    /// Generate a configuration file
    Config {
        /// Format of the configuration file to generate (yaml or json). Defaults to yaml.
        #[arg(
            long,
            short,
            help = "Format of the configuration file to generate (yaml or json). Defaults to yaml."
        )]
        format: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Completion { shell } => {
            commands::completion::print_script(*shell);
            return Ok(());
        }
        Commands::Config { format } => {
            return commands::config::generate_config(format.as_deref().unwrap_or("yaml"));
        }
        _ => {}
    }

    let config = ClientConfig::load_config(cli.config.as_deref(), cli.server.as_deref())
        .context("failed to load configuration")?;
    init_tracing(&config.log_level);
    let ctx = AppContext::new(config);

    match cli.command {
        Commands::Login(args) => session::login(&ctx, args).await,
        Commands::Signup(args) => session::signup(&ctx, args).await,
        Commands::Logout => session::logout(&ctx).await,
        Commands::Assess(args) => assess::run(&ctx, args).await,
        Commands::Result(args) => assess::show_result(&ctx, &args).await,
        Commands::History => history::list(&ctx).await,
        Commands::Completion { .. } | Commands::Config { .. } => Ok(()),
    }
}

/// Logs go to stderr so command output stays clean; `RUST_LOG` beats the configured level.
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .ok();
}
