mod repl;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use chatflow_core::{ChatConfig, StreamingChatClient};

#[derive(Parser)]
#[command(name = "chatflow")]
#[command(version, about = "Chatflow - streaming chat in your terminal")]
struct Cli {
    /// Model identifier sent with every request
    #[arg(long)]
    model: Option<String>,

    /// Base URL of an OpenAI-compatible completion endpoint
    #[arg(long)]
    base_url: Option<String>,

    /// Bearer credential for the completion endpoint
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so they never interleave with streamed chat output.
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .init();

    let mut config = ChatConfig::default();
    if let Some(model) = cli.model {
        config = config.with_model(model);
    }
    if let Some(base_url) = cli.base_url {
        config = config.with_base_url(base_url);
    }

    // The credential is read once here and held immutably for the whole
    // process lifetime.
    let client = StreamingChatClient::new(cli.api_key).with_config(config);
    tracing::debug!(
        model = %client.config().model,
        base_url = %client.config().base_url,
        "starting chat session"
    );

    repl::run(client).await
}
