use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use makershub_agent::{Agent, AnthropicProvider};
use makershub_flow::FlowEngine;
use makershub_server::config::{Backend, ServerConfig};
use makershub_server::state::{AppState, ChatBackend};
use makershub_store::{ContentStore, FileStorage, MemoryStore, Notifier, SupabaseStore};

#[derive(Parser)]
#[command(name = "makershub-server", version, about = "Community assistant API server")]
struct Cli {
    #[arg(long, default_value = "makershub.yaml", help = "Path to the YAML config file")]
    config: PathBuf,

    #[arg(long, help = "Override the configured bind address")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = if cli.config.is_file() {
        ServerConfig::load(&cli.config)?
    } else {
        tracing::warn!(path = %cli.config.display(), "config file not found, using defaults");
        let mut config = ServerConfig::default();
        config.apply_env();
        config
    };

    type Collaborators = (Arc<dyn ContentStore>, Arc<dyn FileStorage>, Arc<dyn Notifier>);
    let (store, storage, notifier): Collaborators = match &config.supabase {
        Some(supabase) => {
            let store = Arc::new(SupabaseStore::new(&supabase.url, &supabase.service_key));
            (store.clone(), store.clone(), store)
        }
        None => {
            tracing::warn!("no supabase config, content lives in memory only");
            let store = Arc::new(MemoryStore::new());
            (store.clone(), store.clone(), store)
        }
    };

    let backend = match config.backend {
        Backend::Flow => ChatBackend::Flow(FlowEngine::new(store, notifier)),
        Backend::Agent => {
            let Some(anthropic) = &config.anthropic else {
                bail!("backend is 'agent' but no anthropic section is configured");
            };
            let provider = Arc::new(AnthropicProvider::new(
                &anthropic.api_key,
                &anthropic.api_base,
            ));
            ChatBackend::Agent(Agent::new(provider, store, notifier).with_model(&anthropic.model))
        }
    };

    let addr = cli.bind.unwrap_or_else(|| config.bind_addr.clone());
    makershub_server::serve(AppState::new(backend, storage), &addr).await
}
