use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use embedding_engine::TextEmbedder;
use llm_interface::{ChatAssistant, GeminiProvider};
use pose_store::{CorpusBuilder, CorpusCache, PoseStore};
use recommender::{build_engine, ContextRetriever};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use yogamatch_core::{AppConfig, CoreError, StrategyKind, UserProfile};

const DEFAULT_LOG_FILTER: &str = "yogamatch=info,recommender=info,pose_store=info";

#[derive(Debug, Parser)]
#[command(name = "yogamatch", version, about = "Yoga pose recommendations and instructor chat")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rank poses for a user profile (JSON file, or stdin when omitted)
    Recommend {
        #[arg(long)]
        profile: Option<PathBuf>,
    },
    /// Print the pose knowledge retrieved for a question
    Context {
        #[arg(long)]
        query: String,
        #[arg(long)]
        k: Option<usize>,
    },
    /// Ask the yoga instructor a question
    Chat {
        #[arg(long)]
        message: String,
    },
    /// Embed a text-only pose file and write a corpus
    BuildCorpus {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Report corpus and model status as JSON
    Health,
}

#[derive(Debug, Serialize)]
struct HealthReport {
    status: &'static str,
    poses_loaded: usize,
    dimension: usize,
    embedder_loaded: bool,
    strategy: StrategyKind,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let cache = CorpusCache::new();

    match cli.command {
        Command::Recommend { profile } => {
            let profile = read_profile(profile.as_deref())?;
            let store = load_corpus(&cache, &config)?;
            let embedder = match config.scoring.strategy {
                StrategyKind::Semantic => Some(load_embedder(&config)?),
                StrategyKind::Lexical => None,
            };

            let engine = build_engine(store, embedder, &config.scoring)?;
            let recommendations = engine.recommend_or_empty(&profile);
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "recommended_asanas": recommendations
                }))?
            );
        }
        Command::Context { query, k } => {
            let retriever = build_retriever(&cache, &config)?;
            let context = retriever.retrieve_context(&query, k.unwrap_or(config.retrieval.top_k))?;
            println!("{}", context);
        }
        Command::Chat { message } => {
            let provider = GeminiProvider::new(&config.generation)?;
            let assistant = ChatAssistant::new(
                provider,
                build_retriever(&cache, &config)?,
                config.retrieval.top_k,
                &config.generation,
            );
            println!("{}", assistant.respond(&message).await);
        }
        Command::BuildCorpus { input, output } => {
            let embedder = load_embedder(&config)?;
            let raw = CorpusBuilder::read_raw(&input)
                .map_err(CoreError::from)
                .with_context(|| format!("Failed to read poses from {}", input.display()))?;
            let store = CorpusBuilder::new(&*embedder).build(raw)?;
            store
                .save(&output)
                .with_context(|| format!("Failed to write corpus to {}", output.display()))?;
        }
        Command::Health => {
            let store = load_corpus(&cache, &config)?;
            let health = store.health();
            let report = HealthReport {
                status: "ok",
                poses_loaded: health.poses_loaded,
                dimension: health.dimension,
                embedder_loaded: load_embedder(&config).is_ok(),
                strategy: config.scoring.strategy,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn load_corpus(cache: &CorpusCache, config: &AppConfig) -> Result<Arc<PoseStore>> {
    cache
        .get_or_load(&config.corpus.path)
        .map_err(CoreError::from)
        .with_context(|| {
            format!(
                "Failed to load pose corpus from {}",
                config.corpus.path.display()
            )
        })
}

fn load_embedder(config: &AppConfig) -> Result<Arc<dyn TextEmbedder>> {
    embedding_engine::load_embedder(&config.model)
        .map_err(CoreError::from)
        .with_context(|| {
            format!(
                "Failed to load {:?} embedder from {}",
                config.model.kind,
                config.model.dir.display()
            )
        })
}

fn build_retriever(
    cache: &CorpusCache,
    config: &AppConfig,
) -> Result<ContextRetriever<Arc<dyn TextEmbedder>>> {
    let store = load_corpus(cache, config)?;
    let embedder = load_embedder(config)?;
    ContextRetriever::new(store, embedder, config.retrieval.min_similarity)
        .map_err(CoreError::from)
        .context("Embedding model does not match the pose corpus")
}

fn read_profile(path: Option<&Path>) -> Result<UserProfile> {
    let contents = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read profile {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read profile from stdin")?;
            buffer
        }
    };
    serde_json::from_str(&contents).context("Profile is not valid JSON")
}
