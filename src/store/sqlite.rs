use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::{Row, SqliteConnection};
use tracing::info;

use crate::error::StoreError;

use super::{Episode, EpisodeStore, Show};

/// SQLite-backed episode record store
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) the database file at `path` and apply migrations
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let location = path.display().to_string();
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| StoreError::ConnectionFailed {
                path: location,
                source: e,
            })?;

        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Open a private in-memory database, mostly useful for tests
    pub async fn in_memory() -> Result<Self, StoreError> {
        let connection_failed = |e: sqlx::Error| StoreError::ConnectionFailed {
            path: ":memory:".to_string(),
            source: e,
        };

        let options =
            SqliteConnectOptions::from_str("sqlite::memory:").map_err(connection_failed)?;

        // Every connection to :memory: is its own database, so pin a single
        // connection for the whole lifetime of the pool.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(connection_failed)?;

        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Close all connections. Pending queries finish first.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(StoreError::MigrationFailed)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY,
                applied_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&mut *conn)
        .await
        .map_err(StoreError::MigrationFailed)?;

        let current_version: Option<i64> =
            sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
                .fetch_one(&mut *conn)
                .await
                .map_err(StoreError::MigrationFailed)?;

        if current_version.unwrap_or(0) < 1 {
            Self::migrate_v1(&mut conn).await?;
        }

        Ok(())
    }

    /// Migration v1: shows and episodes
    async fn migrate_v1(conn: &mut SqliteConnection) -> Result<(), StoreError> {
        info!("Applying database migration v1");

        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS shows (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                subtitle TEXT NOT NULL,
                image TEXT NOT NULL
            )
            "#,
            // No uniqueness on (show_id, date), the sync engine's watermark
            // keeps episodes unique.
            r#"
            CREATE TABLE IF NOT EXISTS episodes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                link TEXT NOT NULL,
                image TEXT NOT NULL,
                date INTEGER NOT NULL,
                show_id TEXT NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_episodes_show_date ON episodes(show_id, date)",
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&mut *conn)
                .await
                .map_err(StoreError::MigrationFailed)?;
        }

        sqlx::query("INSERT INTO schema_version (version, applied_at) VALUES (1, ?)")
            .bind(chrono::Utc::now().timestamp())
            .execute(&mut *conn)
            .await
            .map_err(StoreError::MigrationFailed)?;

        Ok(())
    }
}

fn show_from_row(row: &SqliteRow) -> Result<Show, sqlx::Error> {
    Ok(Show {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        subtitle: row.try_get("subtitle")?,
        image: row.try_get("image")?,
    })
}

fn episode_from_row(row: &SqliteRow) -> Result<Episode, sqlx::Error> {
    Ok(Episode {
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        link: row.try_get("link")?,
        image: row.try_get("image")?,
        published: row.try_get("date")?,
        show_id: row.try_get("show_id")?,
    })
}

fn query_failed(operation: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |source| StoreError::QueryFailed { operation, source }
}

#[async_trait]
impl EpisodeStore for Database {
    async fn show(&self, id: &str) -> Result<Show, StoreError> {
        let row = sqlx::query("SELECT id, title, subtitle, image FROM shows WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_failed("get show"))?;

        match row {
            Some(row) => show_from_row(&row).map_err(query_failed("decode show")),
            None => Err(StoreError::ShowNotFound(id.to_string())),
        }
    }

    async fn shows(&self) -> Result<Vec<Show>, StoreError> {
        let rows = sqlx::query("SELECT id, title, subtitle, image FROM shows")
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed("list shows"))?;

        rows.iter()
            .map(show_from_row)
            .collect::<Result<_, _>>()
            .map_err(query_failed("decode show"))
    }

    async fn episodes(&self, show_id: &str) -> Result<Vec<Episode>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT title, description, link, image, date, show_id
            FROM episodes
            WHERE show_id = ?
            "#,
        )
        .bind(show_id)
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed("list episodes"))?;

        rows.iter()
            .map(episode_from_row)
            .collect::<Result<_, _>>()
            .map_err(query_failed("decode episode"))
    }

    async fn latest_episode_timestamp(&self, show_id: &str) -> Result<i64, StoreError> {
        let latest: Option<i64> =
            sqlx::query_scalar("SELECT MAX(date) FROM episodes WHERE show_id = ?")
                .bind(show_id)
                .fetch_one(&self.pool)
                .await
                .map_err(query_failed("read latest episode timestamp"))?;

        Ok(latest.unwrap_or(0))
    }

    async fn create_show(&self, show: &Show) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO shows (id, title, subtitle, image) VALUES (?, ?, ?, ?)")
            .bind(&show.id)
            .bind(&show.title)
            .bind(&show.subtitle)
            .bind(&show.image)
            .execute(&self.pool)
            .await
            .map_err(query_failed("create show"))?;

        Ok(())
    }

    async fn create_episode(&self, episode: &Episode) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO episodes (title, description, link, image, date, show_id)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&episode.title)
        .bind(&episode.description)
        .bind(&episode.link)
        .bind(&episode.image)
        .bind(episode.published)
        .bind(&episode.show_id)
        .execute(&self.pool)
        .await
        .map_err(query_failed("create episode"))?;

        Ok(())
    }
}
