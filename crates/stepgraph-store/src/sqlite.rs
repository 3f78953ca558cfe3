use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::types::Json;
use stepgraph_config::WorkflowDocument;
use tracing::debug;

use crate::{Error, StoredWorkflow, WorkflowStore, WorkflowSummary};

/// SQLite-based store implementation.
pub struct SqliteStore {
  pool: SqlitePool,
}

impl SqliteStore {
  /// Create a new SQLite store with the given connection pool.
  pub fn new(pool: SqlitePool) -> Self {
    Self { pool }
  }

  /// Open (creating if needed) a database file and run migrations.
  pub async fn open(path: &Path) -> Result<Self, Error> {
    let options = SqliteConnectOptions::new()
      .filename(path)
      .create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;

    let store = Self::new(pool);
    store.migrate().await?;
    Ok(store)
  }

  /// A private in-memory database. Limited to one connection, since every
  /// connection to `:memory:` sees its own database.
  pub async fn in_memory() -> Result<Self, Error> {
    let pool = SqlitePoolOptions::new()
      .max_connections(1)
      .connect("sqlite::memory:")
      .await?;

    let store = Self::new(pool);
    store.migrate().await?;
    Ok(store)
  }

  /// Run database migrations.
  pub async fn migrate(&self) -> Result<(), Error> {
    sqlx::migrate!("./migrations").run(&self.pool).await?;
    Ok(())
  }
}

#[async_trait]
impl WorkflowStore for SqliteStore {
  async fn load(&self, workflow_id: &str) -> Result<Option<StoredWorkflow>, Error> {
    let stored = sqlx::query_as(
      r#"
            SELECT workflow_id, document, updated_at
            FROM workflows
            WHERE workflow_id = ?
            "#,
    )
    .bind(workflow_id)
    .fetch_optional(&self.pool)
    .await?;

    Ok(stored)
  }

  async fn save(&self, workflow_id: &str, document: &WorkflowDocument) -> Result<(), Error> {
    let document = Json(serde_json::to_value(document)?);

    sqlx::query(
      r#"
            INSERT INTO workflows (workflow_id, document, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT (workflow_id) DO UPDATE
            SET document = excluded.document, updated_at = excluded.updated_at
            "#,
    )
    .bind(workflow_id)
    .bind(&document)
    .bind(Utc::now())
    .execute(&self.pool)
    .await?;

    debug!(workflow_id, "stored workflow document");
    Ok(())
  }

  async fn list(&self) -> Result<Vec<WorkflowSummary>, Error> {
    let summaries = sqlx::query_as(
      r#"
            SELECT workflow_id, updated_at
            FROM workflows
            ORDER BY updated_at DESC
            "#,
    )
    .fetch_all(&self.pool)
    .await?;

    Ok(summaries)
  }

  async fn delete(&self, workflow_id: &str) -> Result<(), Error> {
    let result = sqlx::query("DELETE FROM workflows WHERE workflow_id = ?")
      .bind(workflow_id)
      .execute(&self.pool)
      .await?;

    if result.rows_affected() == 0 {
      return Err(Error::NotFound(workflow_id.to_string()));
    }
    Ok(())
  }
}
