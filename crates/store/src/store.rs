//! Index store trait and the SQLite implementation.

use crate::error::{StoreError, StoreResult};
use crate::repos::{ArticleRepo, ChainRepo, ListRepo, PageRepo};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Combined index store trait.
#[async_trait]
pub trait IndexStore: ListRepo + PageRepo + ArticleRepo + ChainRepo + Send + Sync {
    /// Create or upgrade the schema.
    async fn migrate(&self) -> StoreResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> StoreResult<()>;
}

/// SQLite-based index store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Open (creating if missing) a SQLite store and apply the schema.
    pub async fn new(
        path: impl AsRef<Path>,
        busy_timeout_secs: Option<u64>,
    ) -> StoreResult<Self> {
        let path = path.as_ref();
        let busy_timeout_secs = busy_timeout_secs.unwrap_or(5);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(busy_timeout_secs));

        let pool = SqlitePoolOptions::new()
            // One connection: every transaction, and so every chain mutation,
            // runs strictly after the previous one commits or rolls back.
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;

        tracing::debug!(path = %path.display(), "SQLite index store opened");

        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl IndexStore for SqliteStore {
    async fn migrate(&self) -> StoreResult<()> {
        // Databases created before the explicit tail pointer existed only have
        // (id, head_pointer). Add the column and backfill it from the
        // largest page id, which is the tail under the old allocation rule.
        let lists_exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='lists')",
        )
        .fetch_one(&self.pool)
        .await?;

        if lists_exists {
            let columns: Vec<(i32, String, String, i32, Option<String>, i32)> =
                sqlx::query_as("PRAGMA table_info(lists)")
                    .fetch_all(&self.pool)
                    .await?;

            let has_tail = columns
                .iter()
                .any(|(_, name, _, _, _, _)| name == "tail_page_id");

            if !has_tail {
                let mut tx = self.pool.begin().await?;
                sqlx::query("ALTER TABLE lists ADD COLUMN tail_page_id INTEGER")
                    .execute(&mut *tx)
                    .await?;
                let backfilled = sqlx::query(
                    "UPDATE lists SET tail_page_id = \
                     (SELECT MAX(id) FROM pages WHERE pages.list_id = lists.id)",
                )
                .execute(&mut *tx)
                .await?
                .rows_affected();
                tx.commit().await?;
                tracing::info!(lists = backfilled, "Backfilled list tail pointers");
            }
        }

        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;

        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Query helpers shared by pool-level methods and chain transactions.
mod queries {
    use crate::error::{StoreError, StoreResult};
    use crate::models::{ArticleRow, ListRow, PageRow};
    use pagechain_core::NewArticle;
    use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
    use time::OffsetDateTime;

    pub async fn fetch_list(
        conn: &mut SqliteConnection,
        list_id: i64,
    ) -> StoreResult<Option<ListRow>> {
        let row = sqlx::query_as::<_, ListRow>("SELECT * FROM lists WHERE id = ?")
            .bind(list_id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row)
    }

    pub async fn insert_list(
        conn: &mut SqliteConnection,
        list_id: i64,
        head_page_id: i64,
    ) -> StoreResult<Option<ListRow>> {
        let row = sqlx::query_as::<_, ListRow>(
            r#"
            INSERT INTO lists (id, head_pointer, tail_page_id, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(list_id)
        .bind(head_page_id)
        .bind(head_page_id)
        .bind(OffsetDateTime::now_utc())
        .fetch_optional(&mut *conn)
        .await?;
        Ok(row)
    }

    pub async fn fetch_page(
        conn: &mut SqliteConnection,
        page_id: i64,
    ) -> StoreResult<Option<PageRow>> {
        let row = sqlx::query_as::<_, PageRow>("SELECT * FROM pages WHERE id = ?")
            .bind(page_id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row)
    }

    pub async fn insert_page(
        conn: &mut SqliteConnection,
        list_id: i64,
        page_id: Option<i64>,
    ) -> StoreResult<PageRow> {
        let now = OffsetDateTime::now_utc();
        let result = match page_id {
            Some(id) => {
                sqlx::query_as::<_, PageRow>(
                    "INSERT INTO pages (id, list_id, next_page_id, created_at) \
                     VALUES (?, ?, NULL, ?) RETURNING *",
                )
                .bind(id)
                .bind(list_id)
                .bind(now)
                .fetch_one(&mut *conn)
                .await
            }
            None => {
                sqlx::query_as::<_, PageRow>(
                    "INSERT INTO pages (list_id, next_page_id, created_at) \
                     VALUES (?, NULL, ?) RETURNING *",
                )
                .bind(list_id)
                .bind(now)
                .fetch_one(&mut *conn)
                .await
            }
        };

        match result {
            Ok(row) => Ok(row),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(
                StoreError::Conflict(format!("page id {} already exists", page_id.unwrap_or(0))),
            ),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn count_articles(conn: &mut SqliteConnection, page_id: i64) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles WHERE page_id = ?")
            .bind(page_id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(count)
    }

    pub async fn link_successor(
        conn: &mut SqliteConnection,
        page_id: i64,
        next_page_id: i64,
    ) -> StoreResult<()> {
        if page_id == next_page_id {
            return Err(StoreError::Conflict(format!(
                "page {page_id} cannot be its own successor"
            )));
        }

        let result = sqlx::query(
            "UPDATE pages SET next_page_id = ? WHERE id = ? AND next_page_id IS NULL",
        )
        .bind(next_page_id)
        .bind(page_id)
        .execute(&mut *conn)
        .await;

        let updated = match result {
            Ok(done) => done.rows_affected(),
            // next_page_id is UNIQUE: another page already claims this successor.
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(StoreError::Conflict(format!(
                    "page {next_page_id} is already the successor of another page"
                )));
            }
            Err(e) => return Err(e.into()),
        };

        if updated == 0 {
            let current: Option<Option<i64>> =
                sqlx::query_scalar("SELECT next_page_id FROM pages WHERE id = ?")
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
        conn: &mut SqliteConnection,
        list_id: i64,
        expected: Option<i64>,
        new_tail: i64,
    ) -> StoreResult<()> {
        let updated = sqlx::query("UPDATE lists SET tail_page_id = ? WHERE id = ? AND tail_page_id IS ?")
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
        conn: &mut SqliteConnection,
        page_id: i64,
        article: &NewArticle,
    ) -> StoreResult<ArticleRow> {
        let result = sqlx::query_as::<_, ArticleRow>(
            r#"
            INSERT INTO articles (page_id, title, author, content, created_at)
            VALUES (?, ?, ?, ?, ?)
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

    pub async fn list_articles(
        conn: &mut SqliteConnection,
        page_id: i64,
    ) -> StoreResult<Vec<ArticleRow>> {
        let rows = sqlx::query_as::<_, ArticleRow>(
            "SELECT * FROM articles WHERE page_id = ? ORDER BY id",
        )
        .bind(page_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(rows)
    }

    pub async fn delete_articles_by_page(
        conn: &mut SqliteConnection,
        page_id: i64,
    ) -> StoreResult<u64> {
        let deleted = sqlx::query("DELETE FROM articles WHERE page_id = ?")
            .bind(page_id)
            .execute(&mut *conn)
            .await?
            .rows_affected();
        Ok(deleted)
    }

    pub async fn delete_articles_by_pages(
        conn: &mut SqliteConnection,
        page_ids: &[i64],
    ) -> StoreResult<u64> {
        if page_ids.is_empty() {
            return Ok(0);
        }
        let mut builder = QueryBuilder::<Sqlite>::new("DELETE FROM articles WHERE page_id IN (");
        let mut separated = builder.separated(", ");
        for page_id in page_ids {
            separated.push_bind(*page_id);
        }
        separated.push_unseparated(")");

        let deleted = builder
            .build()
            .execute(&mut *conn)
            .await?
            .rows_affected();
        Ok(deleted)
    }
}

// Implement all the repository traits for SqliteStore
mod sqlite_impl {
    use super::*;
    use crate::models::*;
    use crate::repos::ChainTx;
    use crate::repos::articles::check_replacement;
    use pagechain_core::NewArticle;
    use sqlx::Transaction;

    #[async_trait]
    impl ListRepo for SqliteStore {
        async fn get_list(&self, list_id: i64) -> StoreResult<Option<ListRow>> {
            let mut conn = self.pool.acquire().await?;
            queries::fetch_list(&mut conn, list_id).await
        }

        async fn get_head_pointer(&self, list_id: i64) -> StoreResult<i64> {
            let head: Option<i64> =
                sqlx::query_scalar("SELECT head_pointer FROM lists WHERE id = ?")
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

            if queries::fetch_list(&mut tx, list_id).await?.is_none() {
                return Err(StoreError::NotFound(format!("list {list_id} not found")));
            }

            // Articles first: articles.page_id references pages.id.
            let articles = sqlx::query(
                "DELETE FROM articles WHERE page_id IN (SELECT id FROM pages WHERE list_id = ?)",
            )
            .bind(list_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            let pages = sqlx::query("DELETE FROM pages WHERE list_id = ?")
                .bind(list_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();

            sqlx::query("UPDATE lists SET tail_page_id = NULL WHERE id = ?")
                .bind(list_id)
                .execute(&mut *tx)
                .await?;

            tx.commit().await?;

            Ok(CascadeDeleteStats { pages, articles })
        }
    }

    #[async_trait]
    impl PageRepo for SqliteStore {
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
                WHERE l.id = ?
                "#,
            )
            .bind(list_id)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row)
        }

        async fn find_last_page(&self, list_id: i64) -> StoreResult<Option<PageRow>> {
            let row = sqlx::query_as::<_, PageRow>(
                "SELECT * FROM pages WHERE list_id = ? ORDER BY id DESC LIMIT 1",
            )
            .bind(list_id)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row)
        }

        async fn list_pages(&self, list_id: i64) -> StoreResult<Vec<PageRow>> {
            let rows =
                sqlx::query_as::<_, PageRow>("SELECT * FROM pages WHERE list_id = ? ORDER BY id")
                    .bind(list_id)
                    .fetch_all(&self.pool)
                    .await?;
            Ok(rows)
        }
    }

    #[async_trait]
    impl ArticleRepo for SqliteStore {
        async fn count_by_page(&self, page_id: i64) -> StoreResult<i64> {
            let mut conn = self.pool.acquire().await?;
            queries::count_articles(&mut conn, page_id).await
        }

        async fn list_by_page(&self, page_id: i64) -> StoreResult<Vec<ArticleRow>> {
            let mut conn = self.pool.acquire().await?;
            queries::list_articles(&mut conn, page_id).await
        }

        async fn create_article(
            &self,
            page_id: i64,
            article: &NewArticle,
        ) -> StoreResult<ArticleRow> {
            let mut conn = self.pool.acquire().await?;
            queries::insert_article(&mut conn, page_id, article).await
        }

        async fn delete_by_page(&self, page_id: i64) -> StoreResult<u64> {
            let mut conn = self.pool.acquire().await?;
            queries::delete_articles_by_page(&mut conn, page_id).await
        }

        async fn delete_by_page_ids(&self, page_ids: &[i64]) -> StoreResult<u64> {
            let mut conn = self.pool.acquire().await?;
            queries::delete_articles_by_pages(&mut conn, page_ids).await
        }

        async fn replace_page_articles(
            &self,
            page_id: i64,
            articles: &[NewArticle],
            capacity: u32,
        ) -> StoreResult<Vec<ArticleRow>> {
            let mut tx = self.pool.begin().await?;

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

    /// Chain transaction over the store's single SQLite connection.
    pub struct SqliteChainTx {
        tx: Transaction<'static, Sqlite>,
    }

    #[async_trait]
    impl ChainRepo for SqliteStore {
        async fn begin_chain(&self) -> StoreResult<Box<dyn ChainTx>> {
            let tx = self.pool.begin().await?;
            Ok(Box::new(SqliteChainTx { tx }))
        }
    }

    #[async_trait]
    impl ChainTx for SqliteChainTx {
        async fn lock_list(&mut self, _list_id: i64) -> StoreResult<()> {
            // The pool has a single connection, so holding this transaction
            // already excludes every other writer.
            Ok(())
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

        async fn insert_page(
            &mut self,
            list_id: i64,
            page_id: Option<i64>,
        ) -> StoreResult<PageRow> {
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
}

pub use sqlite_impl::SqliteChainTx;

/// SQL schema for SQLite.
const SCHEMA_SQL: &str = r#"
-- Lists: one row per logical collection
CREATE TABLE IF NOT EXISTS lists (
    id INTEGER PRIMARY KEY,
    head_pointer INTEGER NOT NULL,
    tail_page_id INTEGER,
    created_at TEXT NOT NULL
);

-- Pages: AUTOINCREMENT never reuses ids, so page ids grow in chain order
CREATE TABLE IF NOT EXISTS pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    list_id INTEGER NOT NULL,
    next_page_id INTEGER UNIQUE,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_pages_list ON pages(list_id, id);

-- Articles
CREATE TABLE IF NOT EXISTS articles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    page_id INTEGER NOT NULL REFERENCES pages(id),
    title TEXT NOT NULL,
    author TEXT NOT NULL,
    content TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_articles_page ON articles(page_id, id);
"#;
