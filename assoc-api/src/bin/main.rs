use std::sync::Arc;
use anyhow::{Context, anyhow};
use arc_swap::ArcSwap;
use tracing_subscriber::EnvFilter;
use assoc::{DataLayout, GeneSearch, Metadata};

use assoc_api::app::{Config, AppData, server};

fn main() {
    if let Err(e) = run() {
        eprintln!("{:?}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()
        .ok_or_else(|| anyhow!("RESULTS_DATA_DIRECTORY and BROWSER must be set"))?;
    let layout = DataLayout::new(&config.data_directory);

    let metadata_file = std::fs::File::open(layout.metadata())
        .with_context(|| format!("failed to open {}", layout.metadata().display()))?;
    let metadata = Metadata::from_reader(std::io::BufReader::new(metadata_file))
        .context("failed to parse metadata")?;
    let engine_config = metadata.dataset_config(&config.dataset)?;
    tracing::info!("serving dataset {}", engine_config.dataset_id);

    let terms_file = std::fs::File::open(layout.search_terms())
        .with_context(|| format!("failed to open {}", layout.search_terms().display()))?;
    let search = GeneSearch::from_reader(std::io::BufReader::new(terms_file))
        .context("failed to build gene search index")?;

    let appdata = AppData {
        search: Arc::new(search),
        config: Arc::new(engine_config),
        layout,
    };
    let swap = ArcSwap::new(Arc::new(appdata));
    actix_web::rt::System::new().block_on(server(swap, &config.host, config.port))?;
    Ok(())
}
