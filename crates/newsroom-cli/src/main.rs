mod ingest;
mod staged;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::staged::StagedCommands;

#[derive(Debug, Parser)]
#[command(name = "newsroom-cli")]
#[command(about = "News ingestion and moderation command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// List configured sources and check their selectors
    Sources,
    /// Run one ingestion pass over every enabled source
    Ingest {
        /// Fetch and extract without writing to the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Inspect staged articles
    Staged {
        #[command(subcommand)]
        command: StagedCommands,
    },
    /// Approve a pending staged article and publish it
    Approve { id: i64 },
    /// Reject a staged article
    Reject { id: i64 },
    /// Staged-article counts by status and source
    Stats,
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
    /// Insert any missing canonical categories
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("newsroom-cli ready; run with --help for commands");
        return Ok(());
    };

    let config = newsroom_core::load_app_config_from_env()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match command {
        Commands::Sources => ingest::list_sources(&config),
        Commands::Ingest { dry_run: true } => ingest::run_dry(&config).await,
        Commands::Ingest { dry_run: false } => {
            let pool = connect(&config).await?;
            ingest::run(pool, &config).await
        }
        Commands::Db { command } => run_db_command(&connect(&config).await?, command).await,
        Commands::Staged { command } => staged::run(&connect(&config).await?, command).await,
        Commands::Approve { id } => {
            let pool = connect(&config).await?;
            staged::approve(pool, &config.default_author, id).await
        }
        Commands::Reject { id } => staged::reject(connect(&config).await?, id).await,
        Commands::Stats => staged::stats(connect(&config).await?).await,
    }
}

async fn connect(config: &newsroom_core::AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool_config = newsroom_db::PoolConfig::from_app_config(config);
    let pool = newsroom_db::connect_pool(&config.database_url, pool_config).await?;
    Ok(pool)
}

async fn run_db_command(pool: &sqlx::PgPool, command: DbCommands) -> anyhow::Result<()> {
    match command {
        DbCommands::Ping => {
            newsroom_db::health_check(pool).await?;
            println!("database ok");
        }
        DbCommands::Migrate => {
            let applied = newsroom_db::run_migrations(pool).await?;
            println!("applied {applied} migration(s)");
        }
        DbCommands::Seed => {
            newsroom_db::run_migrations(pool).await?;
            let inserted = newsroom_db::seed_categories(pool).await?;
            println!("seeded {inserted} categor(ies)");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests;
