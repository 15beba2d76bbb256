use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use doc_collector::{BatchRunner, CollectorConfig, SourceRegistry};

#[derive(Parser)]
#[command(name = "doc-collector")]
#[command(about = "Collect and index public economic documents", long_about = None)]
struct Cli {
    /// Data root (overrides DOC_COLLECTOR_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Registry file (overrides DOC_COLLECTOR_REGISTRY)
    #[arg(long, global = true)]
    registry: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect every registered source, then rebuild the index (default)
    Run {
        /// Run source discovery after collection
        #[arg(long)]
        discover: bool,
    },
    /// Rebuild the master index from stored records only
    RebuildIndex,
    /// Ask the model for new sources and add them to the registry
    Discover,
    /// Print the registry
    Sources,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,doc_collector=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let cli = Cli::parse();

    let mut config = CollectorConfig::from_env().context("Failed to load configuration")?;
    if let Some(dir) = cli.data_dir {
        config = config.with_data_dir(dir);
    }
    if let Some(path) = cli.registry {
        config = config.with_registry_path(path);
    }

    match cli.command.unwrap_or(Commands::Run { discover: false }) {
        Commands::Run { discover } => {
            if discover {
                config.discovery.enabled = true;
            }
            let runner = BatchRunner::from_config(config).context("Failed to build HTTP client")?;
            let status = runner.run_batch().await.context("Batch run failed")?;
            println!(
                "processed {} sources, {} new documents, {} duplicates, {} failed, index size {}{}",
                status.summary.sources_processed,
                status.summary.documents_added,
                status.summary.duplicates_skipped,
                status.summary.failed_sources,
                status.index_size,
                if status.summary.quota_exhausted {
                    " (AI quota exhausted)"
                } else {
                    ""
                }
            );
        }
        Commands::RebuildIndex => {
            let runner = BatchRunner::from_config(config).context("Failed to build HTTP client")?;
            let count = runner
                .rebuild_index()
                .await
                .context("Failed to rebuild index")?;
            println!("index rebuilt with {count} documents");
        }
        Commands::Discover => {
            let runner = BatchRunner::from_config(config).context("Failed to build HTTP client")?;
            let added = runner.discover_sources().await;
            println!("{added} new sources added");
        }
        Commands::Sources => {
            let sources = SourceRegistry::new(&config.registry_path).load().await;
            let json = serde_json::to_string_pretty(&sources).context("Failed to render registry")?;
            println!("{json}");
        }
    }

    Ok(())
}
