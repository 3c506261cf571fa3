//! # hb-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `hb-core` domain models.

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hb_core::models::{ArchivedConfession, Confession, Stats};
use hb_core::traits::{BanRepo, ConfessionRepo};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

const CONFESSION_COLUMNS: &str = "id, content, created_at, is_read, ip_address, user_agent";
const ARCHIVE_COLUMNS: &str =
    "original_id, content, created_at, is_read, ip_address, user_agent, archived_at, archived_by";

pub struct SqliteConfessionRepo {
    pool: SqlitePool,
}

impl SqliteConfessionRepo {
    /// Connects and applies the embedded migrations.
    ///
    /// In-memory databases are limited to one connection, otherwise every
    /// pooled connection would see its own empty database.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        let max_connections = if url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .with_context(|| format!("failed to open database {url}"))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run migrations")?;

        tracing::info!(max_connections, "sqlite repository ready");
        Ok(Self { pool })
    }
}

fn parse_id(raw: &str) -> anyhow::Result<Uuid> {
    Uuid::parse_str(raw).with_context(|| format!("corrupt id in database: {raw}"))
}

fn row_to_confession(row: &SqliteRow) -> anyhow::Result<Confession> {
    Ok(Confession {
        id: parse_id(&row.try_get::<String, _>("id")?)?,
        content: row.try_get("content")?,
        created_at: row.try_get("created_at")?,
        is_read: row.try_get("is_read")?,
        ip_address: row.try_get("ip_address")?,
        user_agent: row.try_get("user_agent")?,
    })
}

fn row_to_archived(row: &SqliteRow) -> anyhow::Result<ArchivedConfession> {
    let original_id = parse_id(&row.try_get::<String, _>("original_id")?)?;
    Ok(ArchivedConfession {
        confession: Confession {
            id: original_id,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
            is_read: row.try_get("is_read")?,
            ip_address: row.try_get("ip_address")?,
            user_agent: row.try_get("user_agent")?,
        },
        original_id,
        archived_at: row.try_get("archived_at")?,
        archived_by: row.try_get("archived_by")?,
    })
}

#[async_trait]
impl ConfessionRepo for SqliteConfessionRepo {
    async fn create_confession(&self, confession: Confession) -> anyhow::Result<()> {
        sqlx::query(&format!(
            "INSERT INTO confessions ({CONFESSION_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?)"
        ))
        .bind(confession.id.to_string())
        .bind(confession.content)
        .bind(confession.created_at)
        .bind(confession.is_read)
        .bind(confession.ip_address)
        .bind(confession.user_agent)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_confessions(&self) -> anyhow::Result<Vec<Confession>> {
        sqlx::query(&format!(
            "SELECT {CONFESSION_COLUMNS} FROM confessions ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(row_to_confession)
        .collect()
    }

    async fn get_confession(&self, id: Uuid) -> anyhow::Result<Option<Confession>> {
        let row = sqlx::query(&format!(
            "SELECT {CONFESSION_COLUMNS} FROM confessions WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_confession).transpose()
    }

    async fn set_read(&self, id: Uuid, is_read: bool) -> anyhow::Result<Option<Confession>> {
        let updated = sqlx::query("UPDATE confessions SET is_read = ? WHERE id = ?")
            .bind(is_read)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?
            .rows_affected();

        if updated == 0 {
            return Ok(None);
        }
        self.get_confession(id).await
    }

    async fn delete_confession(&self, id: Uuid) -> anyhow::Result<bool> {
        let deleted = sqlx::query("DELETE FROM confessions WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted > 0)
    }

    async fn delete_by_ip(&self, ip: &str) -> anyhow::Result<u64> {
        let deleted = sqlx::query("DELETE FROM confessions WHERE ip_address = ?")
            .bind(ip)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted)
    }

    async fn stats(&self, day_start: DateTime<Utc>) -> anyhow::Result<Stats> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS total,
                    COALESCE(SUM(CASE WHEN is_read = 0 THEN 1 ELSE 0 END), 0) AS unread,
                    COALESCE(SUM(CASE WHEN created_at >= ? THEN 1 ELSE 0 END), 0) AS today
             FROM confessions",
        )
        .bind(day_start)
        .fetch_one(&self.pool)
        .await?;

        Ok(Stats {
            total: row.try_get("total")?,
            unread: row.try_get("unread")?,
            today: row.try_get("today")?,
        })
    }

    /// Copy-then-delete inside one transaction so an id never sits in both tables.
    async fn archive_confession(
        &self,
        id: Uuid,
        archived_by: &str,
    ) -> anyhow::Result<Option<ArchivedConfession>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {CONFESSION_COLUMNS} FROM confessions WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let archived = ArchivedConfession::from_confession(row_to_confession(&row)?, archived_by);

        sqlx::query(&format!(
            "INSERT INTO archives ({ARCHIVE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(archived.original_id.to_string())
        .bind(&archived.confession.content)
        .bind(archived.confession.created_at)
        .bind(archived.confession.is_read)
        .bind(&archived.confession.ip_address)
        .bind(&archived.confession.user_agent)
        .bind(archived.archived_at)
        .bind(&archived.archived_by)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM confessions WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(archived))
    }

    async fn unarchive_confession(&self, id: Uuid) -> anyhow::Result<Option<Confession>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {ARCHIVE_COLUMNS} FROM archives WHERE original_id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let confession = row_to_archived(&row)?.restore();

        sqlx::query(&format!(
            "INSERT INTO confessions ({CONFESSION_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?)"
        ))
        .bind(confession.id.to_string())
        .bind(&confession.content)
        .bind(confession.created_at)
        .bind(confession.is_read)
        .bind(&confession.ip_address)
        .bind(&confession.user_agent)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM archives WHERE original_id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(confession))
    }

    async fn list_archived(&self) -> anyhow::Result<Vec<ArchivedConfession>> {
        sqlx::query(&format!(
            "SELECT {ARCHIVE_COLUMNS} FROM archives ORDER BY archived_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(row_to_archived)
        .collect()
    }

    async fn delete_archived(&self, id: Uuid) -> anyhow::Result<bool> {
        let deleted = sqlx::query("DELETE FROM archives WHERE original_id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted > 0)
    }
}

#[async_trait]
impl BanRepo for SqliteConfessionRepo {
    async fn ban_ip(&self, ip: &str) -> anyhow::Result<bool> {
        let inserted = sqlx::query("INSERT OR IGNORE INTO banned_ips (ip, created_at) VALUES (?, ?)")
            .bind(ip)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(inserted > 0)
    }

    async fn is_banned(&self, ip: &str) -> anyhow::Result<bool> {
        let row = sqlx::query("SELECT 1 FROM banned_ips WHERE ip = ?")
            .bind(ip)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }
}
