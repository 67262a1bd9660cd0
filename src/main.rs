use std::sync::Arc;

use clap::Parser;
use clap::Subcommand;
use deskrag::chat::{ChatConnection, PgLiveFeed, RoomId};
use deskrag::config::AppConfig;
use deskrag::database::Database;
use deskrag::embeddings::{BackfillQueue, EmbeddingService};
use deskrag::models::Session;
use deskrag::rag::QueryEnhancer;
use deskrag::Result;
use tracing::info;

#[derive(Parser)]
#[command(name = "deskrag")]
#[command(about = "DeskRAG CLI tool for query enhancement, embedding backfill, and chat")]
#[command(version)]
struct Cli {
    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enhance a query with matched document context
    Enhance {
        /// The user query to enhance
        query: String,
        /// Print the full enhanced prompt instead of a summary
        #[arg(long)]
        full: bool,
    },
    /// Enqueue active documents missing embeddings and drain the queue
    Backfill {
        /// Maximum number of documents to scan
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Send a chat message to a room
    Send {
        /// Room id (`dm-<a>-<b>` for a direct pair, anything else is a channel)
        room: String,
        /// Message content
        message: String,
        /// Sender user id
        #[arg(long)]
        as_user: String,
        /// Sender display name
        #[arg(long)]
        as_name: String,
    },
    /// Apply pending database migrations
    Migrate,
    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load()?;
    if cli.verbose {
        deskrag::logging::init_logging_with_level("debug")?;
    } else {
        deskrag::logging::init_logging_with_config(Some(&config))?;
    }

    match cli.command {
        Commands::Enhance { query, full } => {
            let database = Arc::new(Database::from_config(&config).await?);
            let embedder = Arc::new(EmbeddingService::new(&config)?);
            let enhancer = QueryEnhancer::from_config(&config, embedder, database);

            let enhanced = enhancer.enhance(&query).await;

            println!("Documents found: {}", enhanced.documents_found);
            println!("Has context:     {}", enhanced.has_context);
            if let Some(error) = &enhanced.error {
                println!("Degraded:        {error}");
            }
            if full {
                println!("\n{}", enhanced.enhanced_prompt);
            }
        }
        Commands::Backfill { limit } => {
            let database = Arc::new(Database::from_config(&config).await?);
            let embedder = Arc::new(EmbeddingService::new(&config)?);
            let queue = BackfillQueue::from_config(&config, embedder, database);

            let limit = limit.unwrap_or_else(|| config.backfill_scan_limit());
            let enqueued = queue.scan_for_missing(limit).await?;
            info!("Enqueued {} documents for backfill", enqueued);

            queue.wait_idle().await;
            let stats = queue.stats();
            println!(
                "Backfill complete: {} processed, {} skipped, {} failed",
                stats.processed, stats.skipped, stats.failed
            );
        }
        Commands::Send {
            room,
            message,
            as_user,
            as_name,
        } => {
            let database = Database::from_config(&config).await?;
            let feed = PgLiveFeed::from_config(&config, database.clone());
            let session = Session::authenticated(as_user, as_name);
            let room = RoomId::parse(&room);

            let mut connection = ChatConnection::open(
                room,
                &session,
                Arc::new(database),
                &feed,
                config.chat_history_limit(),
            )
            .await;

            let sent = connection.send(&message).await?;
            println!("Sent message {} to {}", sent.id, connection.room());
            connection.close().await;
        }
        Commands::Migrate => {
            let database = Database::from_config(&config).await?;
            database.migrate().await?;
            println!("Migrations applied");
        }
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config).map_err(|e| {
                deskrag::DeskRagError::ConfigError(e.to_string())
            })?);
        }
    }

    Ok(())
}
