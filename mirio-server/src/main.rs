mod config;
mod server;

use clap::{Parser, Subcommand};
use config::Config;
use mirio_core::{Gateway, NodeRegistry, NodeStore, S3NodeStore};
use server::run_server;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "mirio")]
#[command(about = "Replicating gateway over S3-compatible storage nodes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway server
    Server {
        /// Path to configuration file
        #[arg(short, long, default_value = "config.yaml")]
        config: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mirio=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Server { config } => {
            tracing::info!("Starting Mirio gateway with config: {}", config);

            let cfg = match Config::from_file(&config) {
                Ok(c) => c,
                Err(e) => {
                    tracing::error!("Failed to load config: {}", e);
                    std::process::exit(1);
                }
            };

            let registry = match build_registry(&cfg) {
                Ok(registry) => registry,
                Err(e) => {
                    tracing::error!("Failed to build node registry: {}", e);
                    std::process::exit(1);
                }
            };

            // Bucket bootstrap runs on every node before traffic is accepted.
            if let Err(e) = registry.ensure_bucket(&cfg.region).await {
                tracing::error!("Bucket bootstrap failed: {}", e);
                std::process::exit(1);
            }

            tracing::info!(
                "Gateway ready: {} nodes, bucket '{}', bind {}",
                registry.len(),
                registry.bucket(),
                cfg.bind_addr
            );

            let gateway = Arc::new(Gateway::new(registry));

            if let Err(e) = run_server(&cfg, gateway).await {
                tracing::error!("Server error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn build_registry(cfg: &Config) -> mirio_core::Result<Arc<NodeRegistry>> {
    // One parametrized adapter constructor, invoked once per configured node.
    let nodes: Vec<Arc<dyn NodeStore>> = cfg
        .nodes
        .iter()
        .map(|node| {
            Arc::new(S3NodeStore::new(
                &node.endpoint,
                &node.access_key,
                &node.secret_key,
                &cfg.region,
            )) as Arc<dyn NodeStore>
        })
        .collect();

    Ok(Arc::new(NodeRegistry::new(nodes, cfg.bucket.clone())?))
}
