//! PostgreSQL-based index store implementation.

use crate::error::{StoreError, StoreResult};
use crate::models::*;
use crate::repos::articles::check_replacement;
use crate::repos::{ArticleRepo, ChainRepo, ChainTx, ListRepo, PageRepo};
use crate::store::IndexStore;
use async_trait::async_trait;
use pagechain_core::NewArticle;
use pagechain_core::config::PgSslMode;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode as SqlxPgSslMode};
use sqlx::{PgConnection, Pool, Postgres, Transaction};
use std::str::FromStr;
use time::OffsetDateTime;

/// PostgreSQL schema (embedded).
const POSTGRES_SCHEMA: &str = include_str!("postgres_schema.sql");

fn postgres_schema_statements(schema: &str) -> Vec<&str> {
    schema
        .split(';')
        .filter_map(|statement| {
            let trimmed = statement.trim();
            if trimmed.is_empty() {
                return None;
            }
            let has_sql = trimmed.lines().any(|line| {
                let line = line.trim();
                !line.is_empty() && !line.starts_with("--")
            });
            has_sql.then_some(trimmed)
        })
        .collect()
}

/// PostgreSQL-based index store.
pub struct PostgresStore {
    pool: Pool<Postgres>,
}

impl PostgresStore {
    /// Create a new PostgreSQL store from a connection URL.
    pub async fn from_url(
        url: &str,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> StoreResult<Self> {
        let opts = PgConnectOptions::from_str(url)?;
        Self::connect(opts, max_connections, statement_timeout_ms).await
    }

    /// Create a new PostgreSQL store from individual connection parameters,
    /// so the password can come from the environment instead of a URL.
    #[allow(clippy::too_many_arguments)]
    pub async fn from_params(
        host: &str,
        port: u16,
        username: Option<&str>,
        password: Option<&str>,
        database: &str,
        ssl_mode: Option<PgSslMode>,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> StoreResult<Self> {
        let mut opts = PgConnectOptions::new()
            .host(host)
            .port(port)
            .database(database);

        if let Some(user) = username {
            opts = opts.username(user);
        }

        if let Some(pass) = password {
            opts = opts.password(pass);
        }

        if let Some(mode) = ssl_mode {
            let sqlx_mode = match mode {
                PgSslMode::Disable => SqlxPgSslMode::Disable,
                PgSslMode::Prefer => SqlxPgSslMode::Prefer,
                PgSslMode::Require => SqlxPgSslMode::Require,
            };
            opts = opts.ssl_mode(sqlx_mode);
        }

        // Log connection info without password
        tracing::info!(
            host = host,
            port = port,
            database = database,
            username = username.unwrap_or("<none>"),
            ssl_mode = ?ssl_mode,
            "Connecting to PostgreSQL with individual parameters"
        );

        Self::connect(opts, max_connections, statement_timeout_ms).await
    }

    async fn connect(
        mut opts: PgConnectOptions,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> StoreResult<Self> {
        if let Some(timeout_ms) = statement_timeout_ms {
            opts = opts.options([("statement_timeout", format!("{}ms", timeout_ms))]);
            tracing::info!("PostgreSQL statement_timeout set to {}ms", timeout_ms);
        }

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;

        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

#[async_trait]
impl IndexStore for PostgresStore {
    async fn migrate(&self) -> StoreResult<()> {
        // PostgreSQL doesn't allow multiple statements in a single prepared statement.
        for statement in postgres_schema_statements(POSTGRES_SCHEMA) {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

mod queries {
    use super::*;

    /// Transaction-scoped advisory lock keyed by list id.
    pub async fn lock_list(conn: &mut PgConnection, list_id: i64) -> StoreResult<()> {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(list_id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    pub async fn fetch_list(conn: &mut PgConnection, list_id: i64) -> StoreResult<Option<ListRow>> {
        let row = sqlx::query_as::<_, ListRow>("SELECT * FROM lists WHERE id = $1")
            .bind(list_id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row)
    }

    pub async fn insert_list(
        conn: &mut PgConnection,
        list_id: i64,
        head_page_id: i64,
    ) -> StoreResult<Option<ListRow>> {
        let row = sqlx::query_as::<_, ListRow>(
            r#"
            INSERT INTO lists (id, head_pointer, tail_page_id, created_at)
            VALUES ($1, $2, $2, $3)
            ON CONFLICT (id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(list_id)
        .bind(head_page_id)
        .bind(OffsetDateTime::now_utc())
        .fetch_optional(&mut *conn)
        .await?;
        Ok(row)
    }

    pub async fn fetch_page(conn: &mut PgConnection, page_id: i64) -> StoreResult<Option<PageRow>> {
        let row = sqlx::query_as::<_, PageRow>("SELECT * FROM pages WHERE id = $1")
            .bind(page_id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row)
    }

    pub async fn insert_page(
        conn: &mut PgConnection,
        list_id: i64,
        page_id: Option<i64>,
    ) -> StoreResult<PageRow> {
        let now = OffsetDateTime::now_utc();
        let Some(id) = page_id else {
            let row = sqlx::query_as::<_, PageRow>(
                "INSERT INTO pages (list_id, next_page_id, created_at) \
                 VALUES ($1, NULL, $2) RETURNING *",
            )
            .bind(list_id)
            .bind(now)
            .fetch_one(&mut *conn)
            .await?;
            return Ok(row);
        };

        let result = sqlx::query_as::<_, PageRow>(
            "INSERT INTO pages (id, list_id, next_page_id, created_at) \
             VALUES ($1, $2, NULL, $3) RETURNING *",
        )
        .bind(id)
        .bind(list_id)
        .bind(now)
        .fetch_one(&mut *conn)
        .await;

        let row = match result {
            Ok(row) => row,
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(StoreError::Conflict(format!("page id {id} already exists")));
            }
            Err(e) => return Err(e.into()),
        };

        // An explicit id does not advance the sequence. Move the sequence
        // forward past it, never backward.
        sqlx::query("SELECT setval('pages_id_seq', GREATEST(last_value, $1)) FROM pages_id_seq")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(row)
    }

    pub async fn count_articles(conn: &mut PgConnection, page_id: i64) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles WHERE page_id = $1")
            .bind(page_id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(count)
    }

    pub async fn link_successor(
        conn: &mut PgConnection,
        page_id: i64,
        next_page_id: i64,
    ) -> StoreResult<()> {
        if page_id == next_page_id {
            return Err(StoreError::Conflict(format!(
                "page {page_id} cannot be its own successor"
            )));
        }

        let result = sqlx::query(
            "UPDATE pages SET next_page_id = $1 WHERE id = $2 AND next_page_id IS NULL",
        )
        .bind(next_page_id)
        .bind(page_id)
        .execute(&mut *conn)
        .await;

        let updated = match result {
            Ok(done) => done.rows_affected(),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(StoreError::Conflict(format!(
                    "page {next_page_id} is already the successor of another page"
                )));
            }
            Err(e) => return Err(e.into()),
        };

        if updated == 0 {
            let current: Option<Option<i64>> =
                sqlx::query_scalar("SELECT next_page_id FROM pages WHERE id = $1")
                    .bind(page_id)
                    .fetch_optional(&mut *conn)
                    .await?;
            return match current {
                None => Err(StoreError::NotFound(format!("page {page_id} not found"))),
                Some(existing) => Err(StoreError::Conflict(format!(
                    "page {page_id} already links to page {}",
                    existing.unwrap_or_default()
                ))),
            };
        }
        Ok(())
    }

    pub async fn advance_tail(
        conn: &mut PgConnection,
        list_id: i64,
        expected: Option<i64>,
        new_tail: i64,
    ) -> StoreResult<()> {
        let updated = sqlx::query(
            "UPDATE lists SET tail_page_id = $1 \
             WHERE id = $2 AND tail_page_id IS NOT DISTINCT FROM $3",
        )
        .bind(new_tail)
        .bind(list_id)
        .bind(expected)
        .execute(&mut *conn)
        .await?
        .rows_affected();

        if updated == 0 {
            return match fetch_list(conn, list_id).await? {
                None => Err(StoreError::NotFound(format!("list {list_id} not found"))),
                Some(list) => Err(StoreError::Conflict(format!(
                    "tail of list {list_id} moved: expected {expected:?}, found {:?}",
                    list.tail_page_id
                ))),
            };
        }
        Ok(())
    }

    pub async fn insert_article(
        conn: &mut PgConnection,
        page_id: i64,
        article: &NewArticle,
    ) -> StoreResult<ArticleRow> {
        let result = sqlx::query_as::<_, ArticleRow>(
            r#"
            INSERT INTO articles (page_id, title, author, content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(page_id)
        .bind(article.title())
        .bind(article.author())
        .bind(article.content())
        .bind(OffsetDateTime::now_utc())
        .fetch_one(&mut *conn)
        .await;

        match result {
            Ok(row) => Ok(row),
            Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => {
                Err(StoreError::NotFound(format!("page {page_id} not found")))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list_articles(conn: &mut PgConnection, page_id: i64) -> StoreResult<Vec<ArticleRow>> {
        let rows = sqlx::query_as::<_, ArticleRow>(
            "SELECT * FROM articles WHERE page_id = $1 ORDER BY id",
        )
        .bind(page_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(rows)
    }

    pub async fn delete_articles_by_page(conn: &mut PgConnection, page_id: i64) -> StoreResult<u64> {
        let deleted = sqlx::query("DELETE FROM articles WHERE page_id = $1")
            .bind(page_id)
            .execute(&mut *conn)
            .await?
            .rows_affected();
        Ok(deleted)
    }
}

#[async_trait]
impl ListRepo for PostgresStore {
    async fn get_list(&self, list_id: i64) -> StoreResult<Option<ListRow>> {
        let mut conn = self.pool.acquire().await?;
        queries::fetch_list(&mut conn, list_id).await
    }

    async fn get_head_pointer(&self, list_id: i64) -> StoreResult<i64> {
        let head: Option<i64> = sqlx::query_scalar("SELECT head_pointer FROM lists WHERE id = $1")
            .bind(list_id)
            .fetch_optional(&self.pool)
            .await?;
        head.ok_or_else(|| StoreError::NotFound(format!("list {list_id} not found")))
    }

    async fn list_lists(&self) -> StoreResult<Vec<ListRow>> {
        let rows = sqlx::query_as::<_, ListRow>("SELECT * FROM lists ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn delete_list_with_cascade(&self, list_id: i64) -> StoreResult<CascadeDeleteStats> {
        let mut tx = self.pool.begin().await?;

        queries::lock_list(&mut tx, list_id).await?;
        if queries::fetch_list(&mut tx, list_id).await?.is_none() {
            return Err(StoreError::NotFound(format!("list {list_id} not found")));
        }

        let articles = sqlx::query(
            "DELETE FROM articles WHERE page_id IN (SELECT id FROM pages WHERE list_id = $1)",
        )
        .bind(list_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let pages = sqlx::query("DELETE FROM pages WHERE list_id = $1")
            .bind(list_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("UPDATE lists SET tail_page_id = NULL WHERE id = $1")
            .bind(list_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(CascadeDeleteStats { pages, articles })
    }
}

#[async_trait]
impl PageRepo for PostgresStore {
    async fn get_page(&self, page_id: i64) -> StoreResult<Option<PageRow>> {
        let mut conn = self.pool.acquire().await?;
        queries::fetch_page(&mut conn, page_id).await
    }

    async fn create_page(&self, list_id: i64, page_id: Option<i64>) -> StoreResult<PageRow> {
        let mut conn = self.pool.acquire().await?;
        queries::insert_page(&mut conn, list_id, page_id).await
    }

    async fn set_successor(&self, page_id: i64, next_page_id: i64) -> StoreResult<()> {
        let mut conn = self.pool.acquire().await?;
        queries::link_successor(&mut conn, page_id, next_page_id).await
    }

    async fn find_tail(&self, list_id: i64) -> StoreResult<Option<PageRow>> {
        let row = sqlx::query_as::<_, PageRow>(
            r#"
            SELECT p.* FROM pages p
            INNER JOIN lists l ON l.tail_page_id = p.id
            WHERE l.id = $1
            "#,
        )
        .bind(list_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_last_page(&self, list_id: i64) -> StoreResult<Option<PageRow>> {
        let row = sqlx::query_as::<_, PageRow>(
            "SELECT * FROM pages WHERE list_id = $1 ORDER BY id DESC LIMIT 1",
        )
        .bind(list_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_pages(&self, list_id: i64) -> StoreResult<Vec<PageRow>> {
        let rows = sqlx::query_as::<_, PageRow>("SELECT * FROM pages WHERE list_id = $1 ORDER BY id")
            .bind(list_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

#[async_trait]
impl ArticleRepo for PostgresStore {
    async fn count_by_page(&self, page_id: i64) -> StoreResult<i64> {
        let mut conn = self.pool.acquire().await?;
        queries::count_articles(&mut conn, page_id).await
    }

    async fn list_by_page(&self, page_id: i64) -> StoreResult<Vec<ArticleRow>> {
        let mut conn = self.pool.acquire().await?;
        queries::list_articles(&mut conn, page_id).await
    }

    async fn create_article(&self, page_id: i64, article: &NewArticle) -> StoreResult<ArticleRow> {
        let mut conn = self.pool.acquire().await?;
        queries::insert_article(&mut conn, page_id, article).await
    }

    async fn delete_by_page(&self, page_id: i64) -> StoreResult<u64> {
        let mut conn = self.pool.acquire().await?;
        queries::delete_articles_by_page(&mut conn, page_id).await
    }

    async fn delete_by_page_ids(&self, page_ids: &[i64]) -> StoreResult<u64> {
        if page_ids.is_empty() {
            return Ok(0);
        }
        let deleted = sqlx::query("DELETE FROM articles WHERE page_id = ANY($1)")
            .bind(page_ids)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted)
    }

    async fn replace_page_articles(
        &self,
        page_id: i64,
        articles: &[NewArticle],
        capacity: u32,
    ) -> StoreResult<Vec<ArticleRow>> {
        let mut tx = self.pool.begin().await?;

        let list_id = queries::fetch_page(&mut tx, page_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("page {page_id} not found")))?
            .list_id;

        // Re-read under the list lock: an append may have closed the page.
        queries::lock_list(&mut tx, list_id).await?;
        let page = queries::fetch_page(&mut tx, page_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("page {page_id} not found")))?;
        check_replacement(&page, articles.len(), capacity)?;

        let removed = queries::delete_articles_by_page(&mut tx, page_id).await?;

        let mut rows = Vec::with_capacity(articles.len());
        for article in articles {
            rows.push(queries::insert_article(&mut tx, page_id, article).await?);
        }

        tx.commit().await?;

        tracing::debug!(
            page_id,
            removed,
            inserted = rows.len(),
            "Page articles replaced"
        );

        Ok(rows)
    }
}

/// Chain transaction on a pooled PostgreSQL connection.
pub struct PgChainTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl ChainRepo for PostgresStore {
    async fn begin_chain(&self) -> StoreResult<Box<dyn ChainTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgChainTx { tx }))
    }
}

#[async_trait]
impl ChainTx for PgChainTx {
    async fn lock_list(&mut self, list_id: i64) -> StoreResult<()> {
        queries::lock_list(&mut self.tx, list_id).await
    }

    async fn get_list(&mut self, list_id: i64) -> StoreResult<Option<ListRow>> {
        queries::fetch_list(&mut self.tx, list_id).await
    }

    async fn insert_list(
        &mut self,
        list_id: i64,
        head_page_id: i64,
    ) -> StoreResult<Option<ListRow>> {
        queries::insert_list(&mut self.tx, list_id, head_page_id).await
    }

    async fn get_page(&mut self, page_id: i64) -> StoreResult<Option<PageRow>> {
        queries::fetch_page(&mut self.tx, page_id).await
    }

    async fn insert_page(&mut self, list_id: i64, page_id: Option<i64>) -> StoreResult<PageRow> {
        queries::insert_page(&mut self.tx, list_id, page_id).await
    }

    async fn count_articles(&mut self, page_id: i64) -> StoreResult<i64> {
        queries::count_articles(&mut self.tx, page_id).await
    }

    async fn list_articles(&mut self, page_id: i64) -> StoreResult<Vec<ArticleRow>> {
        queries::list_articles(&mut self.tx, page_id).await
    }

    async fn set_successor(&mut self, page_id: i64, next_page_id: i64) -> StoreResult<()> {
        queries::link_successor(&mut self.tx, page_id, next_page_id).await
    }

    async fn advance_tail(
        &mut self,
        list_id: i64,
        expected: Option<i64>,
        new_tail: i64,
    ) -> StoreResult<()> {
        queries::advance_tail(&mut self.tx, list_id, expected, new_tail).await
    }

    async fn insert_article(
        &mut self,
        page_id: i64,
        article: &NewArticle,
    ) -> StoreResult<ArticleRow> {
        queries::insert_article(&mut self.tx, page_id, article).await
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
