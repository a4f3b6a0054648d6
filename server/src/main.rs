use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};
use vsir_core::corpus::load_directory;
use vsir_core::EngineConfig;
use vsir_server::build_app;

#[derive(Parser)]
struct Args {
    /// Corpus directory, one document per file
    #[arg(long, default_value = "./corpus")]
    corpus: PathBuf,
    /// JSON engine config
    #[arg(long)]
    config: Option<PathBuf>,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
            EngineConfig::from_json_str(&json)?
        }
        None => EngineConfig::default(),
    };
    // Sampling is a CLI concern; the server always indexes the whole corpus.
    let mut rng = StdRng::from_entropy();
    let corpus = args.corpus.clone();
    let engine = tokio::task::spawn_blocking(move || load_directory(&corpus, None, &config, &mut rng)).await??;
    tracing::info!(docs = engine.documents().len(), terms = engine.vocabulary_size(), "index ready");

    let app = build_app(engine);
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
