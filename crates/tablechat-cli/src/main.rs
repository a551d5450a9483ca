//! tablechat CLI: entry point.
//!
//! # Commands
//!
//! - `tablechat ask [-p PROVIDER] PROMPT`: one prompt, one answer
//! - `tablechat chat [-p PROVIDER]`: interactive REPL
//! - `tablechat status`: show settings and provider status
//! - `tablechat init`: write a default config file

mod helpers;
mod init;
mod intent;
mod repl;
mod status;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use tablechat_core::config::{get_settings, init_settings, load_settings, AppSettings};
use tablechat_providers::{CompletionOptions, LlmClient, LlmFactory, ProviderRegistry};

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// Ask questions about tabular data through a configurable LLM provider
#[derive(Parser)]
#[command(name = "tablechat", version, about, long_about = None)]
struct Cli {
    /// Config file to load instead of ~/.tablechat/config.json
    #[arg(long, global = true)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true, default_value_t = false)]
    logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a single prompt and print the answer
    Ask {
        /// The prompt to send
        prompt: String,

        /// Provider to use (defaults to `defaultProvider` from settings)
        #[arg(short, long)]
        provider: Option<String>,

        /// Maximum tokens for the answer
        #[arg(long)]
        max_tokens: Option<u32>,

        /// First ask the model whether the prompt requests a plot
        #[arg(long, default_value_t = false)]
        detect_plot: bool,
    },

    /// Interactive chat session
    Chat {
        /// Provider to use (defaults to `defaultProvider` from settings)
        #[arg(short, long)]
        provider: Option<String>,
    },

    /// Show settings and provider status
    Status,

    /// Write a default config file
    Init {
        /// Overwrite an existing config file
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.logs);

    let config_path = cli.config.as_deref().map(helpers::expand_tilde);
    let settings = settings_for(config_path.clone());
    let registry = ProviderRegistry::with_builtin_clients();

    match cli.command {
        Commands::Ask {
            prompt,
            provider,
            max_tokens,
            detect_plot,
        } => {
            let client = build_client(provider.as_deref(), settings, &registry)?;
            run_ask(client, &prompt, max_tokens, detect_plot).await
        }
        Commands::Chat { provider } => {
            let client = build_client(provider.as_deref(), settings, &registry)?;
            repl::run(client).await
        }
        Commands::Status => status::run(settings, &registry, config_path.as_deref()),
        Commands::Init { force } => init::run(config_path.as_deref(), force),
    }
}

/// Settings for this process: the given file if `--config` was passed,
/// otherwise the default locations.
fn settings_for(config_path: Option<PathBuf>) -> &'static AppSettings {
    match config_path {
        Some(path) => init_settings(load_settings(Some(&path))),
        None => get_settings(),
    }
}

/// Build the client for `provider`, or for the configured default.
fn build_client(
    provider: Option<&str>,
    settings: &AppSettings,
    registry: &ProviderRegistry,
) -> Result<Arc<dyn LlmClient>> {
    let provider = provider.unwrap_or(settings.default_provider.as_str());
    let factory = LlmFactory::new(provider, settings, registry)
        .with_context(|| format!("failed to create LLM client for '{provider}'"))?;
    info!(provider = %factory.provider, model = factory.client.model(), "using LLM client");
    Ok(factory.client)
}

// ─────────────────────────────────────────────
// Ask command
// ─────────────────────────────────────────────

async fn run_ask(
    client: Arc<dyn LlmClient>,
    prompt: &str,
    max_tokens: Option<u32>,
    detect_plot: bool,
) -> Result<()> {
    if detect_plot {
        let wants_plot = intent::detect_plot_request(client.as_ref(), prompt)
            .await
            .context("plot detection failed")?;
        helpers::print_plot_intent(wants_plot);
    }

    let options = CompletionOptions {
        max_tokens,
        ..Default::default()
    };
    let answer = client
        .complete(prompt, &options)
        .await
        .with_context(|| format!("{} request failed", client.display_name()))?;
    helpers::print_response(client.display_name(), &answer);

    Ok(())
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("tablechat=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
