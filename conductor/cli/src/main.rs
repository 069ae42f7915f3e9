//! doi-finder - Resolve Free-Text Citations to DOIs
//!
//! Terminal surface over the DOI conductor. Paste a bibliographic citation in
//! any style and get back its Digital Object Identifier, the title the
//! service matched, and the web sources it grounded the answer on.
//!
//! # Usage
//!
//! ```bash
//! # One-shot lookup
//! doi-finder resolve "Smith, J. (2020). Title. Journal, 1(1), 1-10."
//!
//! # Machine-readable output
//! doi-finder resolve --json "Smith 2020 Journal"
//!
//! # Interactive session with history (default)
//! doi-finder
//!
//! # Use a local Ollama model instead of Gemini
//! doi-finder --provider ollama --model llama3.2
//!
//! # Verbose logging (to stderr)
//! RUST_LOG=debug doi-finder resolve "..."
//! ```

mod render;
mod repl;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use doi_conductor::{
    backend, config, Conductor, ConfigOverrides, OrchestratorState, Provider, ResolutionBackend,
};
use tracing::{info, warn};

use render::render_view;

/// doi-finder - Look up the DOI of a free-text citation
#[derive(Parser, Debug)]
#[command(name = "doi-finder")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "DOI_FINDER_CONFIG", value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Resolution provider (gemini, ollama)
    #[arg(short = 'p', long, value_name = "NAME", global = true)]
    provider: Option<Provider>,

    /// Model identifier
    #[arg(short = 'm', long, value_name = "MODEL", global = true)]
    model: Option<String>,

    /// Backend request timeout in seconds
    #[arg(long, value_name = "SECS", global = true)]
    timeout: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "DOI_FINDER_LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve one citation and exit
    Resolve {
        /// The citation text (words are joined with spaces)
        #[arg(required = true, num_args = 1..)]
        citation: Vec<String>,

        /// Print the final state as JSON
        #[arg(long)]
        json: bool,
    },
    /// Interactive session with search history
    Interactive,
}

/// Initialize logging with the specified level
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("doi_finder={level},doi_conductor={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

/// Build a Conductor from the layered configuration
fn build_conductor(args: &Args) -> Result<Conductor<Box<dyn ResolutionBackend>>> {
    let mut settings = match &args.config {
        Some(path) => config::load_config_from_path(Some(path.clone())),
        None => config::load_config(),
    }
    .context("Failed to load configuration")?;

    let mut overrides = ConfigOverrides::new();
    if let Some(provider) = args.provider {
        overrides = overrides.with_provider(provider);
    }
    if let Some(model) = &args.model {
        overrides = overrides.with_model(model.clone());
    }
    if let Some(secs) = args.timeout {
        overrides = overrides.with_timeout_secs(secs);
    }
    overrides.apply(&mut settings);

    info!(
        provider = %settings.provider,
        model = settings.effective_model(),
        source = %settings.source(),
        "Configuration loaded"
    );

    let backend = backend::from_config(&settings.backend_config(), settings.request_timeout)
        .context("Failed to create resolution backend")?;

    Ok(Conductor::new(backend, settings.conductor_config()))
}

async fn run_resolve(
    conductor: &mut Conductor<Box<dyn ResolutionBackend>>,
    citation: &str,
    json: bool,
) -> Result<ExitCode> {
    conductor
        .submit(citation)
        .context("Citation not accepted")?;
    if !json {
        eprintln!("{}", render_view(&conductor.view()));
    }
    conductor.wait_for_resolution().await;

    if json {
        let out = serde_json::to_string_pretty(conductor.state())
            .context("Failed to serialize result")?;
        println!("{out}");
    } else {
        println!("{}", render_view(&conductor.view()));
    }

    Ok(match conductor.state() {
        OrchestratorState::Failed { .. } => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    })
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    init_logging(&args.log_level);
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut conductor = build_conductor(&args)?;

    match &args.command {
        Some(Command::Resolve { citation, json }) => {
            run_resolve(&mut conductor, &citation.join(" "), *json).await
        }
        Some(Command::Interactive) | None => {
            if !conductor.check_backend().await {
                warn!("Continuing anyway; searches will report errors until the backend is reachable");
            }
            repl::run(&mut conductor).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
