use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ragvec_common::{logger, AppConfig};
use ragvec_embed::HashEmbedder;
use ragvec_vector::{read_corpus, ArtifactStore, IndexBuilder, IndexKind, IndexParams};
use std::path::PathBuf;
use std::sync::Arc;

/// Find project root by looking for .git directory
fn find_project_root() -> Option<PathBuf> {
    let mut current_dir = std::env::current_dir().ok()?;

    loop {
        if current_dir.join(".git").exists() {
            return Some(current_dir);
        }

        if !current_dir.pop() {
            break;
        }
    }

    None
}

/// Load .env file from project root
fn load_dotenv_from_project_root() {
    match find_project_root().map(|root| root.join(".env")) {
        Some(env_path) if env_path.exists() => {
            dotenv::from_path(&env_path).ok();
        }
        _ => {
            dotenv::dotenv().ok();
        }
    }
}

#[derive(Parser)]
#[command(name = "ragvec")]
#[command(about = "ragvec - versioned vector index builder and search server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an index version from a JSONL corpus
    Build {
        /// Corpus file, one {chunk_id, doc_id, text} record per line
        #[arg(long)]
        input: PathBuf,

        /// Version id to publish
        #[arg(long)]
        version: String,

        /// Point CURRENT at the new version
        #[arg(long)]
        activate: bool,

        /// Index kind (hnsw or flat)
        #[arg(long)]
        kind: Option<IndexKind>,
    },

    /// Start the HTTP server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long)]
        port: Option<u16>,

        /// Version to load instead of CURRENT
        #[arg(long)]
        version: Option<String>,
    },

    /// List published versions
    Versions,

    /// Point CURRENT at a published version
    Activate {
        /// Version id
        version: String,
    },
}

fn index_params(config: &AppConfig, kind: Option<IndexKind>) -> Result<IndexParams> {
    let kind = match kind {
        Some(kind) => kind,
        None => config.index_kind.parse()?,
    };

    Ok(IndexParams {
        kind,
        max_neighbors: config.hnsw_max_neighbors,
        ef_construction: config.hnsw_ef_construction,
        ef_search: config.hnsw_ef_search,
        seed: config.build_seed,
    })
}

fn build(
    config: &AppConfig,
    input: PathBuf,
    version: String,
    activate: bool,
    kind: Option<IndexKind>,
) -> Result<()> {
    let params = index_params(config, kind)?;
    let store = ArtifactStore::new(&config.artifact_root);

    let chunks = read_corpus(&input)?;
    let builder = IndexBuilder::new(Arc::new(HashEmbedder::new(config.embedding_dim)), params);
    let report = builder.build_and_publish(&store, &version, &chunks)?;

    if activate {
        store.activate(&version)?;
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load .env early so CLI overrides below win over it
    load_dotenv_from_project_root();

    match cli.command {
        Some(Commands::Build {
            input,
            version,
            activate,
            kind,
        }) => {
            let config = AppConfig::from_env()?;
            config.validate()?;
            logger::setup_logging(&config.log_dir, &config.log_level)?;

            build(&config, input, version, activate, kind)
                .context("Index build failed")?;
        }
        Some(Commands::Serve {
            host,
            port,
            version,
        }) => {
            // Override with CLI arguments
            if let Some(host) = &host {
                std::env::set_var("SERVER_HOST", host);
            }
            if let Some(port) = port {
                std::env::set_var("SERVER_PORT", port.to_string());
            }
            if let Some(version) = &version {
                std::env::set_var("INDEX_VERSION", version);
            }

            let config = AppConfig::from_env()?;
            config.validate()?;
            logger::setup_logging(&config.log_dir, &config.log_level)?;

            tracing::info!("ragvec starting...");
            tracing::info!("  Bind: {}", config.server_bind_address());
            tracing::info!("  Artifacts: {}", config.artifact_root.display());

            println!("Server listening on http://{}", config.server_bind_address());
            ragvec_server::start_server(config).await?;
        }
        Some(Commands::Versions) => {
            let config = AppConfig::from_env()?;
            logger::setup_console_logging(&config.log_level)?;

            let store = ArtifactStore::new(&config.artifact_root);
            let current = store.current()?;
            for version in store.list_versions()? {
                let marker = if current.as_deref() == Some(version.as_str()) {
                    "*"
                } else {
                    " "
                };
                println!("{} {}", marker, version);
            }
        }
        Some(Commands::Activate { version }) => {
            let config = AppConfig::from_env()?;
            logger::setup_console_logging(&config.log_level)?;

            ArtifactStore::new(&config.artifact_root).activate(&version)?;
            println!("CURRENT -> {}", version);
        }
        None => {
            // Default: serve with configuration from the environment
            let config = AppConfig::from_env()?;
            config.validate()?;
            logger::setup_logging(&config.log_dir, &config.log_level)?;

            tracing::info!("ragvec starting with default configuration...");

            println!("Server listening on http://{}", config.server_bind_address());
            ragvec_server::start_server(config).await?;
        }
    }

    Ok(())
}
