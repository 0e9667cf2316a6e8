//! # Search Server - Entry Point
//! src/main.rs
//!
//! Parsea la configuración, inicializa el logging y arranca el servidor (o
//! construye un índice con `--build-index`).

use anyhow::{bail, Context};
use search_server::config::Config;
use search_server::search::{InvertedIndex, QueryProcessor};
use search_server::server::Server;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let config = Config::new();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log level")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = config.validate() {
        bail!("invalid configuration: {}", e);
    }

    if config.is_build_mode() {
        let source = config.build_index.as_deref().context("--build-index requires a directory")?;
        let out = config.out.as_deref().context("--build-index requires --out")?;
        return build_index(source, out);
    }

    config.print_summary();

    let engine = QueryProcessor::load(&config.indices).context("couldn't load search indices")?;
    info!(indices = engine.index_count(), "search engine ready");
    let server = Server::bind(config, Arc::new(engine)).context("couldn't start the server")?;
    server.run()?;

    Ok(())
}

fn build_index(source: &Path, out: &Path) -> anyhow::Result<()> {
    info!(source = %source.display(), "building index");

    let index = InvertedIndex::build_from_dir(source)
        .with_context(|| format!("couldn't index {}", source.display()))?;
    index
        .save(out)
        .with_context(|| format!("couldn't write {}", out.display()))?;

    info!(
        out = %out.display(),
        words = index.word_count(),
        documents = index.document_count(),
        "index written"
    );
    Ok(())
}
