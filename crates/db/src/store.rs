//! Relational store over PostgreSQL: idempotent schema provisioning, and
//! the atomic upsert + children-replace that processing an item requires.

use sentiment_core::config::DatabaseConfig;
use sentiment_core::ProcessedItem;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::error::DbError;

const SCHEMA_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS processed_items (
    id TEXT PRIMARY KEY,
    source_type TEXT NOT NULL,
    source_name TEXT NOT NULL,
    external_id TEXT NOT NULL,
    url TEXT NOT NULL,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    author TEXT,
    published_at TIMESTAMPTZ NOT NULL,
    collected_at TIMESTAMPTZ NOT NULL,
    search_phrase TEXT NOT NULL,
    processed_at TIMESTAMPTZ NOT NULL,
    sentiment TEXT NOT NULL,
    sentiment_score DOUBLE PRECISION NOT NULL,
    summary TEXT NOT NULL,
    analysis JSONB NOT NULL,
    raw_storage_path TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_processed_items_search_phrase ON processed_items (search_phrase);
CREATE INDEX IF NOT EXISTS idx_processed_items_published_at ON processed_items (published_at);
CREATE INDEX IF NOT EXISTS idx_processed_items_sentiment ON processed_items (sentiment);
CREATE INDEX IF NOT EXISTS idx_processed_items_source_type ON processed_items (source_type);

CREATE TABLE IF NOT EXISTS themes (
    id BIGSERIAL PRIMARY KEY,
    item_id TEXT NOT NULL REFERENCES processed_items(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    confidence DOUBLE PRECISION NOT NULL,
    keywords TEXT[] NOT NULL DEFAULT '{}'
);

CREATE INDEX IF NOT EXISTS idx_themes_item_id ON themes (item_id);
CREATE INDEX IF NOT EXISTS idx_themes_name ON themes (name);

CREATE TABLE IF NOT EXISTS entities (
    id BIGSERIAL PRIMARY KEY,
    item_id TEXT NOT NULL REFERENCES processed_items(id) ON DELETE CASCADE,
    name TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_entities_item_id ON entities (item_id);
CREATE INDEX IF NOT EXISTS idx_entities_name ON entities (name);
"#;

/// Upsert the parent row: insert on a fresh `id`, update only the
/// analysis-derived columns (plus `processed_at`/`raw_storage_path`) on
/// conflict — collection-time fields are never touched by a reprocess.
const UPSERT_ITEM_SQL: &str = r#"
            INSERT INTO processed_items (
                id, source_type, source_name, external_id, url, title, content, author,
                published_at, collected_at, search_phrase, processed_at,
                sentiment, sentiment_score, summary, analysis, raw_storage_path
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            ON CONFLICT (id) DO UPDATE SET
                sentiment = excluded.sentiment,
                sentiment_score = excluded.sentiment_score,
                summary = excluded.summary,
                analysis = excluded.analysis,
                processed_at = excluded.processed_at,
                raw_storage_path = excluded.raw_storage_path
            "#;

const DELETE_THEMES_SQL: &str = "DELETE FROM themes WHERE item_id = $1";
const DELETE_ENTITIES_SQL: &str = "DELETE FROM entities WHERE item_id = $1";
const INSERT_THEME_SQL: &str = "INSERT INTO themes (item_id, name, confidence, keywords) VALUES ($1, $2, $3, $4)";
const INSERT_ENTITY_SQL: &str = "INSERT INTO entities (item_id, name) VALUES ($1, $2)";

pub struct RelationalStore {
    pool: PgPool,
}

impl RelationalStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DbError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await?;
        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Run the idempotent `CREATE TABLE/INDEX IF NOT EXISTS` DDL. Safe to
    /// call on every startup, including against an already-provisioned
    /// database.
    pub async fn ensure_schema(&self) -> Result<(), DbError> {
        sqlx::raw_sql(SCHEMA_DDL).execute(&self.pool).await?;
        info!("relational store schema provisioned");
        Ok(())
    }

    /// True when a row with this id already exists — used for the
    /// `skip_existing` dedup check.
    pub async fn exists(&self, id: &str) -> Result<bool, DbError> {
        let row: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM processed_items WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    /// Upsert the parent row and fully replace its themes/entities, all in
    /// one transaction. On conflict, only the analysis-derived columns and
    /// `processed_at` are updated — collection-time fields are left alone.
    pub async fn insert(&self, item: &ProcessedItem) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        let analysis_json = serde_json::to_value(&item.analysis)?;
        let sentiment = item.analysis.sentiment.to_string();

        sqlx::query(UPSERT_ITEM_SQL)
        .bind(&item.id)
        .bind(item.source_type.to_string())
        .bind(&item.source_name)
        .bind(&item.external_id)
        .bind(&item.url)
        .bind(&item.title)
        .bind(&item.content)
        .bind(&item.author)
        .bind(item.published_at)
        .bind(item.collected_at)
        .bind(&item.search_phrase)
        .bind(item.processed_at)
        .bind(&sentiment)
        .bind(item.analysis.sentiment_score)
        .bind(&item.analysis.summary)
        .bind(&analysis_json)
        .bind(&item.raw_storage_path)
        .execute(&mut *tx)
        .await?;

        sqlx::query(DELETE_THEMES_SQL)
            .bind(&item.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(DELETE_ENTITIES_SQL)
            .bind(&item.id)
            .execute(&mut *tx)
            .await?;

        for theme in &item.analysis.themes {
            sqlx::query(INSERT_THEME_SQL)
                .bind(&item.id)
                .bind(&theme.name)
                .bind(theme.confidence)
                .bind(&theme.keywords)
                .execute(&mut *tx)
                .await?;
        }

        for entity in &item.analysis.entities {
            sqlx::query(INSERT_ENTITY_SQL)
                .bind(&item.id)
                .bind(entity)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_ddl_declares_all_three_tables() {
        assert!(SCHEMA_DDL.contains("CREATE TABLE IF NOT EXISTS processed_items"));
        assert!(SCHEMA_DDL.contains("CREATE TABLE IF NOT EXISTS themes"));
        assert!(SCHEMA_DDL.contains("CREATE TABLE IF NOT EXISTS entities"));
    }

    #[test]
    fn schema_ddl_cascades_children_on_parent_delete() {
        assert!(SCHEMA_DDL.contains("REFERENCES processed_items(id) ON DELETE CASCADE"));
    }

    #[test]
    fn upsert_conflicts_on_id_and_updates_only_analysis_derived_columns() {
        assert!(UPSERT_ITEM_SQL.contains("ON CONFLICT (id) DO UPDATE SET"));
        for column in ["sentiment", "sentiment_score", "summary", "analysis", "processed_at", "raw_storage_path"] {
            assert!(
                UPSERT_ITEM_SQL.contains(&format!("{column} = excluded.{column}")),
                "missing conflict clause for {column}"
            );
        }
        // collection-time fields must never be touched by a reprocess
        for untouched in ["source_type", "source_name", "external_id", "url", "collected_at", "search_phrase"] {
            assert!(
                !UPSERT_ITEM_SQL.contains(&format!("{untouched} = excluded.{untouched}")),
                "{untouched} should not be overwritten on conflict"
            );
        }
    }

    #[test]
    fn upsert_binds_one_placeholder_per_inserted_column() {
        let column_count = UPSERT_ITEM_SQL
            .lines()
            .find(|l| l.trim_start().starts_with("id, source_type"))
            .expect("column list line")
            .split(',')
            .count();
        assert_eq!(column_count, 17);
        assert!(UPSERT_ITEM_SQL.contains("$17"));
        assert!(!UPSERT_ITEM_SQL.contains("$18"));
    }

    #[test]
    fn children_are_deleted_before_being_reinserted() {
        assert!(DELETE_THEMES_SQL.contains("DELETE FROM themes WHERE item_id = $1"));
        assert!(DELETE_ENTITIES_SQL.contains("DELETE FROM entities WHERE item_id = $1"));
        assert!(INSERT_THEME_SQL.contains("INSERT INTO themes"));
        assert!(INSERT_ENTITY_SQL.contains("INSERT INTO entities"));
    }
}
