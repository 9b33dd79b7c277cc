use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tracing::debug;

use super::PasteStore;
use crate::error::AppError;
use crate::models::Paste;

/// SQLite result codes for constraint violations (plain, primary key, unique).
const CONSTRAINT_VIOLATIONS: [&str; 3] = ["19", "1555", "2067"];

#[derive(Clone)]
pub struct SqlStore {
    pool: SqlitePool,
}

impl SqlStore {
    /// Connect to a database by URL and bring its schema up to date.
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new().connect(url).await?;
        sqlx::migrate!().run(&pool).await?;
        Ok(Self { pool })
    }
}

impl PasteStore for SqlStore {
    async fn create(&mut self, paste: &Paste) -> crate::AppResult<()> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query(
            "INSERT INTO paste (id, content, created_at, expire_at, salt) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&paste.id)
        .bind(&paste.content)
        .bind(paste.created_at)
        .bind(paste.expire_at)
        .bind(&paste.salt)
        .execute(&mut conn)
        .await
        .map_err(|err| {
            if is_constraint_violation(&err) {
                AppError::DuplicateId
            } else {
                AppError::from(err)
            }
        })?;
        Ok(())
    }

    async fn get(&mut self, id: &str) -> crate::AppResult<Paste> {
        let mut conn = self.pool.acquire().await?;
        let paste = sqlx::query_as::<_, Paste>(
            "SELECT id, content, created_at, expire_at, salt FROM paste WHERE id = ?",
        )
        .bind(id)
        .fetch_one(&mut conn)
        .await?;
        Ok(paste)
    }

    async fn delete(&mut self, id: &str) -> crate::AppResult<()> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query("DELETE FROM paste WHERE id = ?")
            .bind(id)
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    async fn delete_expired(&mut self, now: DateTime<Utc>) -> crate::AppResult<u64> {
        let mut tx = self.pool.begin().await?;

        // timestamps are stored as text, so compare them here rather than in SQL
        let candidates = sqlx::query_as::<_, (String, DateTime<Utc>)>(
            "SELECT id, expire_at FROM paste WHERE expire_at IS NOT NULL",
        )
        .fetch_all(&mut tx)
        .await?;

        let mut count = 0;
        for (id, expire_at) in candidates {
            if now >= expire_at {
                debug!("deleting expired paste: {id}");
                sqlx::query("DELETE FROM paste WHERE id = ?")
                    .bind(&id)
                    .execute(&mut tx)
                    .await?;
                count += 1;
            }
        }

        tx.commit().await?;
        Ok(count)
    }
}

fn is_constraint_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err
            .code()
            .map_or(false, |code| CONSTRAINT_VIOLATIONS.contains(&&*code)),
        _ => false,
    }
}
