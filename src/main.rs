use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use triagent::classify::Classifier;
use triagent::config::Config;
use triagent::engine::Engine;
use triagent::llm::generator_from_config;
use triagent::orders::InMemoryOrderStore;
use triagent::policy::TermOverlapPolicyIndex;
use triagent::server::{self, AppState};
use triagent::store::InMemoryThreadStore;
use triagent::templates::TemplateTable;

/// Support-ticket triage engine with human-in-the-loop admin review.
#[derive(Parser, Debug)]
#[command(name = "triagent", version, about)]
struct Args {
    /// Address to bind the HTTP server to.
    #[arg(long, env = "TRIAGENT_BIND")]
    bind: Option<SocketAddr>,

    /// Directory holding orders.json, issues.json, replies.json and policies/.
    #[arg(long, env = "TRIAGENT_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("triagent=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();
    let mut config = Config::from_env().context("loading configuration")?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(data_dir) = args.data_dir {
        config.data.data_dir = data_dir;
    }

    let tables = triagent::data::load(&config.data.data_dir)
        .with_context(|| format!("loading data from {}", config.data.data_dir.display()))?;

    let orders = Arc::new(InMemoryOrderStore::new(tables.orders));
    let generator = generator_from_config(&config.llm).context("building text generator")?;
    let policies = Arc::new(TermOverlapPolicyIndex::new(tables.policies));

    let engine = Arc::new(Engine::new(
        Arc::new(InMemoryThreadStore::new()),
        orders.clone(),
        generator,
        policies,
        Classifier::new(tables.rules),
        TemplateTable::new(tables.templates),
        config.engine.clone(),
    ));

    let state = Arc::new(AppState {
        engine,
        orders,
    });

    server::serve(state, config.server.bind)
        .await
        .context("HTTP server failed")?;
    Ok(())
}
