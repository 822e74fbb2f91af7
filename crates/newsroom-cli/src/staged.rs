use clap::Subcommand;
use newsroom_core::StagedStatus;
use newsroom_db::{RejectOutcome, StagedFilter};
use newsroom_ingest::PgArticleStore;
use sqlx::PgPool;

#[derive(Debug, Subcommand)]
pub(crate) enum StagedCommands {
    /// List staged articles, newest first
    List {
        /// Only rows in this status (pending, approved, rejected)
        #[arg(long)]
        status: Option<StagedStatus>,
        /// Only rows from this source id
        #[arg(long)]
        source: Option<String>,
        #[arg(long, default_value_t = 50)]
        limit: i64,
    },
}

pub(crate) async fn run(pool: &PgPool, command: StagedCommands) -> anyhow::Result<()> {
    match command {
        StagedCommands::List {
            status,
            source,
            limit,
        } => {
            let filter = StagedFilter {
                status,
                source_id: source.as_deref(),
            };
            let rows =
                newsroom_db::list_staged_articles(pool, &filter, limit.clamp(1, 200)).await?;
            for row in &rows {
                println!(
                    "{:>6}  {:<8}  {:<16}  {:<14}  {}",
                    row.id, row.status, row.source_id, row.category, row.title
                );
            }
            println!("{} row(s)", rows.len());
        }
    }
    Ok(())
}

pub(crate) async fn approve(pool: PgPool, author: &str, id: i64) -> anyhow::Result<()> {
    let store = PgArticleStore::new(pool);
    let article = newsroom_ingest::approve(&store, id, author).await?;
    println!(
        "approved staged {id} as article {} ({})",
        article.id, article.slug
    );
    Ok(())
}

pub(crate) async fn reject(pool: PgPool, id: i64) -> anyhow::Result<()> {
    let store = PgArticleStore::new(pool);
    match newsroom_ingest::reject(&store, id).await? {
        RejectOutcome::Rejected => println!("rejected staged {id}"),
        RejectOutcome::AlreadyRejected => println!("staged {id} was already rejected"),
    }
    Ok(())
}

pub(crate) async fn stats(pool: PgPool) -> anyhow::Result<()> {
    let store = PgArticleStore::new(pool);
    let stats = newsroom_ingest::stats(&store).await?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
