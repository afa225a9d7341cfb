use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use lodestar_core::{create_vector_store, Config, RagEngine, WireFormat};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lodestar")]
#[command(about = "Retrieval-augmented question answering over your documents", long_about = None)]
#[command(version)]
struct Cli {
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Create the collection if it does not exist yet")]
    Init,

    #[command(about = "Chunk, embed and store every supported file under DIR")]
    Ingest {
        dir: PathBuf,

        #[arg(long, help = "Words per chunk")]
        chunk_size: Option<usize>,

        #[arg(long, help = "Words shared between neighboring chunks")]
        overlap: Option<usize>,
    },

    #[command(about = "Answer a question from the stored chunks")]
    Ask {
        question: String,

        #[arg(short = 'k', long, help = "How many chunks to retrieve")]
        top_k: Option<usize>,
    },

    #[command(about = "Show the resolved configuration")]
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Init => init(&config).await,
        Commands::Ingest {
            dir,
            chunk_size,
            overlap,
        } => ingest(config, &dir, chunk_size, overlap).await,
        Commands::Ask { question, top_k } => ask(&config, &question, top_k).await,
        Commands::Show => show_config(&config),
    }
}

fn load_config(config_path: &Path) -> Result<Config> {
    let config = if config_path.exists() {
        Config::load(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        Config::default()
    };
    Ok(config.with_env_api_key())
}

fn require_api_key(config: &Config) -> Result<()> {
    if config.provider.api_key.is_empty() {
        anyhow::bail!(
            "An API key is required: set GEMINI_API_KEY or provider.api_key in the config file"
        );
    }
    Ok(())
}

async fn init(config: &Config) -> Result<()> {
    let store = create_vector_store(&config.store)?;
    store
        .ensure_collection()
        .await
        .context("Failed to reach the vector store")?;

    println!(
        "{} Collection {} is ready at {}",
        "✓".green().bold(),
        config.store.collection.cyan(),
        config.store.host
    );
    Ok(())
}

async fn ingest(
    mut config: Config,
    dir: &Path,
    chunk_size: Option<usize>,
    overlap: Option<usize>,
) -> Result<()> {
    require_api_key(&config)?;
    if let Some(chunk_size) = chunk_size {
        config.ingest.chunk_size = chunk_size;
    }
    if let Some(overlap) = overlap {
        config.ingest.chunk_overlap = overlap;
    }

    let engine = RagEngine::connect(&config)
        .await
        .context("Failed to connect to the configured services")?;

    println!("{} Ingesting {}...", "→".blue(), dir.display());
    let report = engine
        .ingest_dir(dir)
        .await
        .with_context(|| format!("Ingestion of {} failed", dir.display()))?;

    println!(
        "{} Stored {} chunks from {} documents",
        "✓".green().bold(),
        report.chunks.to_string().bold(),
        report.documents
    );
    Ok(())
}

async fn ask(config: &Config, question: &str, top_k: Option<usize>) -> Result<()> {
    require_api_key(config)?;
    let top_k = top_k.unwrap_or(config.retrieval.top_k);

    let engine = RagEngine::connect(config)
        .await
        .context("Failed to connect to the configured services")?;

    let answer = engine
        .ask(question, top_k)
        .await
        .context("Failed to answer the question")?;

    println!("{}", answer.body);
    println!();
    println!("{}", "Sources:".bold().green());
    for source in &answer.sources {
        println!("{source}");
    }
    Ok(())
}

fn show_config(config: &Config) -> Result<()> {
    let wire = match config.store.wire_format {
        WireFormat::V1Records => "v1-records",
        WireFormat::V1Arrays => "v1-arrays",
        WireFormat::V2 => "v2",
    };
    let api_key = if config.provider.api_key.is_empty() {
        "(unset)".yellow()
    } else {
        "(set)".green()
    };

    println!("{}", "Current Configuration:".bold().green());
    println!();
    println!("{}", "Provider:".bold());
    println!("  Base URL:         {}", config.provider.base_url);
    println!("  Embedding Model:  {}", config.provider.embedding_model.cyan());
    println!("  Generation Model: {}", config.provider.generation_model.cyan());
    println!("  API Key:          {api_key}");
    println!();
    println!("{}", "Store:".bold());
    println!("  Host:             {}", config.store.host);
    println!("  Collection:       {}", config.store.collection.cyan());
    println!("  Wire Format:      {wire}");
    println!();
    println!("{}", "Ingest:".bold());
    println!("  Chunk Size:       {}", config.ingest.chunk_size);
    println!("  Chunk Overlap:    {}", config.ingest.chunk_overlap);
    println!("  Batch Size:       {}", config.ingest.batch_size);
    println!("  Dimension:        {}", config.ingest.dimension);
    println!();
    println!("{}", "Retrieval:".bold());
    println!("  Top K:            {}", config.retrieval.top_k);

    Ok(())
}
