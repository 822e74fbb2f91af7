//! Live integration tests for newsroom-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/newsroom-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use chrono::Utc;
use newsroom_core::{NewPublishedArticle, NewStagedArticle, StagedStatus};
use newsroom_db::{
    complete_ingest_run, create_ingest_run, fail_ingest_run, get_published_by_staged_id,
    get_staged_article, insert_ingest_run_source, insert_staged_article, list_categories,
    list_ingest_run_sources, list_ingest_runs, list_staged_articles, promote_staged_article,
    reject_staged_article, seed_categories, staged_stats, staged_url_exists, DbError,
    RejectOutcome, StagedFilter,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_staged(source_id: &str, url: &str, title: &str) -> NewStagedArticle {
    NewStagedArticle {
        source_id: source_id.to_string(),
        title: title.to_string(),
        content: title.to_string(),
        excerpt: title.to_string(),
        image_url: Some(format!("{url}.jpg")),
        category: "Política".to_string(),
        original_url: url.to_string(),
        published_at: Utc::now(),
    }
}

fn make_draft(staged_id: i64, slug: &str, category: &str) -> NewPublishedArticle {
    NewPublishedArticle {
        staged_id,
        title: "Congreso aprueba reforma".to_string(),
        slug: slug.to_string(),
        excerpt: "Congreso aprueba reforma".to_string(),
        content: "Congreso aprueba reforma".to_string(),
        image_url: None,
        category_name: category.to_string(),
        author: "Redacción".to_string(),
    }
}

async fn stage(pool: &sqlx::PgPool, url: &str) -> i64 {
    insert_staged_article(pool, &make_staged("diario-uno", url, "Nota"))
        .await
        .expect("insert failed")
        .expect("expected a fresh row")
}

// ---------------------------------------------------------------------------
// Staging and dedup
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn insert_is_pending_and_deduplicated_by_url(pool: sqlx::PgPool) {
    let url = "https://diariouno.example.com/a";
    let first = insert_staged_article(&pool, &make_staged("diario-uno", url, "Primero"))
        .await
        .expect("first insert");
    let second = insert_staged_article(&pool, &make_staged("diario-uno", url, "Segundo"))
        .await
        .expect("second insert");

    let id = first.expect("first insert should create a row");
    assert!(second.is_none(), "duplicate url must not insert");
    assert!(staged_url_exists(&pool, url).await.expect("exists"));

    let row = get_staged_article(&pool, id)
        .await
        .expect("get")
        .expect("row exists");
    assert_eq!(row.title, "Primero");
    assert_eq!(row.staged_status(), StagedStatus::Pending);
    assert!(row.approved_at.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_filters_by_status_and_source(pool: sqlx::PgPool) {
    let a = stage(&pool, "https://diariouno.example.com/a").await;
    stage(&pool, "https://diariouno.example.com/b").await;
    insert_staged_article(
        &pool,
        &make_staged("diario-dos", "https://diariodos.example.com/c", "Otra"),
    )
    .await
    .expect("insert");
    reject_staged_article(&pool, a).await.expect("reject");

    let all = list_staged_articles(&pool, &StagedFilter::default(), 50)
        .await
        .expect("list");
    assert_eq!(all.len(), 3);

    let pending_uno = StagedFilter {
        status: Some(StagedStatus::Pending),
        source_id: Some("diario-uno"),
    };
    let rows = list_staged_articles(&pool, &pending_uno, 50)
        .await
        .expect("list");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].original_url, "https://diariouno.example.com/b");

    let limited = list_staged_articles(&pool, &StagedFilter::default(), 1)
        .await
        .expect("list");
    assert_eq!(limited.len(), 1);
}

// ---------------------------------------------------------------------------
// Moderation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn promote_creates_one_article_and_marks_approved(pool: sqlx::PgPool) {
    let id = stage(&pool, "https://diariouno.example.com/reforma").await;

    let draft = make_draft(id, "congreso-aprueba-reforma", "Política");
    let article = promote_staged_article(&pool, &draft)
        .await
        .expect("promote");
    assert_eq!(article.status, "published");
    assert_eq!(article.slug, "congreso-aprueba-reforma");
    assert_eq!(article.source_staged_id, Some(id));
    assert!(article.published_at.is_some());

    let staged = get_staged_article(&pool, id).await.expect("get").expect("row");
    assert_eq!(staged.staged_status(), StagedStatus::Approved);
    assert!(staged.approved_at.is_some());

    let again = promote_staged_article(&pool, &draft).await;
    assert!(
        matches!(again, Err(DbError::InvalidTransition { ref status, .. }) if status == "approved"),
        "got: {again:?}"
    );

    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM articles WHERE source_staged_id = $1")
            .bind(id)
            .fetch_one(&pool)
            .await
            .expect("count");
    assert_eq!(count, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn promote_unknown_id_is_not_found(pool: sqlx::PgPool) {
    let result = promote_staged_article(&pool, &make_draft(9_999, "x", "General")).await;
    assert!(matches!(result, Err(DbError::NotFound)), "got: {result:?}");
}

#[sqlx::test(migrations = "../../migrations")]
async fn promote_suffixes_colliding_slug(pool: sqlx::PgPool) {
    let first = stage(&pool, "https://diariouno.example.com/1").await;
    let second = stage(&pool, "https://diariouno.example.com/2").await;

    promote_staged_article(&pool, &make_draft(first, "paro-agrario", "Economía"))
        .await
        .expect("first promote");
    let article = promote_staged_article(&pool, &make_draft(second, "paro-agrario", "Economía"))
        .await
        .expect("second promote");

    assert_eq!(article.slug, format!("paro-agrario-{second}"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn promote_skips_a_suffixed_slug_that_is_also_taken(pool: sqlx::PgPool) {
    let first = stage(&pool, "https://diariouno.example.com/1").await;
    let second = stage(&pool, "https://diariouno.example.com/2").await;
    let third = stage(&pool, "https://diariouno.example.com/3").await;

    promote_staged_article(&pool, &make_draft(first, "nota", "Sociedad"))
        .await
        .expect("first promote");
    let plain = format!("nota-{third}");
    promote_staged_article(&pool, &make_draft(second, &plain, "Sociedad"))
        .await
        .expect("second promote");

    let article = promote_staged_article(&pool, &make_draft(third, "nota", "Sociedad"))
        .await
        .expect("third promote must find a free slug");
    assert_eq!(article.slug, format!("nota-{third}-2"));

    let staged = get_staged_article(&pool, third)
        .await
        .expect("get")
        .expect("row");
    assert_eq!(staged.status, "approved");
}

#[sqlx::test(migrations = "../../migrations")]
async fn promote_creates_unknown_category(pool: sqlx::PgPool) {
    let id = stage(&pool, "https://diariouno.example.com/viral").await;
    let article = promote_staged_article(&pool, &make_draft(id, "viral", "Virales"))
        .await
        .expect("promote");

    let categories = list_categories(&pool).await.expect("categories");
    let created = categories
        .iter()
        .find(|c| c.name == "Virales")
        .expect("category created");
    assert_eq!(article.category_id, created.id);
    assert_eq!(created.slug, "virales");
}

#[sqlx::test(migrations = "../../migrations")]
async fn promote_without_any_usable_category_rolls_back(pool: sqlx::PgPool) {
    let id = stage(&pool, "https://diariouno.example.com/1").await;
    sqlx::query("DELETE FROM categories WHERE name = 'General'")
        .execute(&pool)
        .await
        .expect("delete default category");

    // "Politica" slugifies onto the seeded "Política" row.
    let err = promote_staged_article(&pool, &make_draft(id, "nota", "Politica"))
        .await
        .expect_err("no category can be attached");
    assert!(
        matches!(err, DbError::CategoryUnavailable(ref name) if name == "Politica"),
        "got: {err:?}"
    );

    let staged = get_staged_article(&pool, id)
        .await
        .expect("get")
        .expect("row");
    assert_eq!(staged.status, "pending");
    assert!(get_published_by_staged_id(&pool, id)
        .await
        .expect("lookup")
        .is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn reject_is_idempotent_and_creates_nothing(pool: sqlx::PgPool) {
    let id = stage(&pool, "https://diariouno.example.com/rechazo").await;
    let before = get_staged_article(&pool, id).await.expect("get").expect("row");

    assert_eq!(
        reject_staged_article(&pool, id).await.expect("reject"),
        RejectOutcome::Rejected
    );
    assert_eq!(
        reject_staged_article(&pool, id).await.expect("reject again"),
        RejectOutcome::AlreadyRejected
    );

    let after = get_staged_article(&pool, id).await.expect("get").expect("row");
    assert_eq!(after.staged_status(), StagedStatus::Rejected);
    assert_eq!(after.title, before.title);
    assert_eq!(after.content, before.content);
    assert!(after.rejected_at.is_some());
    assert!(get_published_by_staged_id(&pool, id)
        .await
        .expect("lookup")
        .is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn reject_after_approve_is_invalid(pool: sqlx::PgPool) {
    let id = stage(&pool, "https://diariouno.example.com/aprobada").await;
    promote_staged_article(&pool, &make_draft(id, "aprobada", "General"))
        .await
        .expect("promote");

    let result = reject_staged_article(&pool, id).await;
    assert!(
        matches!(result, Err(DbError::InvalidTransition { .. })),
        "got: {result:?}"
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn reject_unknown_id_is_not_found(pool: sqlx::PgPool) {
    let result = reject_staged_article(&pool, 4_242).await;
    assert!(matches!(result, Err(DbError::NotFound)), "got: {result:?}");
}

// ---------------------------------------------------------------------------
// Stats and categories
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn stats_group_by_status_and_source(pool: sqlx::PgPool) {
    let a = stage(&pool, "https://diariouno.example.com/a").await;
    stage(&pool, "https://diariouno.example.com/b").await;
    insert_staged_article(
        &pool,
        &make_staged("diario-dos", "https://diariodos.example.com/c", "Otra"),
    )
    .await
    .expect("insert");
    reject_staged_article(&pool, a).await.expect("reject");

    let stats = staged_stats(&pool).await.expect("stats");
    assert_eq!(stats.pending, 2);
    assert_eq!(stats.rejected, 1);
    assert_eq!(stats.approved, 0);
    assert_eq!(stats.by_source["diario-uno"].pending, 1);
    assert_eq!(stats.by_source["diario-uno"].rejected, 1);
    assert_eq!(stats.by_source["diario-dos"].pending, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn seed_categories_is_idempotent(pool: sqlx::PgPool) {
    // The migration already seeds the taxonomy.
    assert_eq!(seed_categories(&pool).await.expect("seed"), 0);
    let names: Vec<String> = list_categories(&pool)
        .await
        .expect("list")
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert!(names.contains(&"Política".to_string()));
    assert!(names.contains(&"General".to_string()));
}

// ---------------------------------------------------------------------------
// Run history
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn ingest_run_lifecycle(pool: sqlx::PgPool) {
    let run = create_ingest_run(&pool, "cli").await.expect("create");
    assert_eq!(run.status, "running");

    insert_ingest_run_source(&pool, run.id, "diario-uno", 5, 3, None)
        .await
        .expect("source ok");
    insert_ingest_run_source(&pool, run.id, "diario-dos", 0, 0, Some("timeout"))
        .await
        .expect("source failed");
    complete_ingest_run(&pool, run.id, 5, 3).await.expect("complete");

    let runs = list_ingest_runs(&pool, 10).await.expect("list");
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, "succeeded");
    assert_eq!(runs[0].total_saved, 3);

    let sources = list_ingest_run_sources(&pool, run.id).await.expect("sources");
    assert_eq!(sources.len(), 2);
    assert_eq!(sources[0].status, "succeeded");
    assert_eq!(sources[1].status, "failed");
    assert_eq!(sources[1].error_message.as_deref(), Some("timeout"));

    let closed_again = fail_ingest_run(&pool, run.id, 0, 0, "late").await;
    assert!(matches!(closed_again, Err(DbError::NotFound)));
}
