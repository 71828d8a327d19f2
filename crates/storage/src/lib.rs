use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::debug;

use shared::{
    domain::{Flower, FlowerId, FlowerStatus, FlowerType, VaseId},
    lifecycle::expires_at,
};

const FLOWER_COLUMNS: &str =
    "id, type, vase_id, status, trimmed_at, water_changed_at, created_at, expires_at";

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// Inserts a `new` flower whose expiry is fixed from `created_at` and the
    /// type's lifespan.
    pub async fn insert_flower(
        &self,
        flower_type: FlowerType,
        created_at: DateTime<Utc>,
    ) -> Result<Flower> {
        let expires_at = expires_at(flower_type, created_at);
        let row = sqlx::query(
            "INSERT INTO flowers (type, status, created_at, expires_at)
             VALUES (?, 'new', ?, ?)
             RETURNING id",
        )
        .bind(flower_type.as_str())
        .bind(created_at)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await
        .context("failed to insert flower")?;

        Ok(Flower {
            id: FlowerId(row.get::<i64, _>(0)),
            flower_type,
            vase_id: None,
            status: FlowerStatus::New,
            trimmed_at: None,
            water_changed_at: None,
            created_at,
            expires_at,
        })
    }

    pub async fn flower(&self, flower_id: FlowerId) -> Result<Option<Flower>> {
        let row = sqlx::query(&format!("SELECT {FLOWER_COLUMNS} FROM flowers WHERE id = ?"))
            .bind(flower_id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(flower_from_row).transpose()
    }

    /// Moves a `new` flower into a vase. Returns `false` when the flower is
    /// missing or no longer `new`; the row is left untouched in that case.
    pub async fn trim_flower(
        &self,
        flower_id: FlowerId,
        vase_id: VaseId,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let updated = sqlx::query(
            "UPDATE flowers
             SET status = 'trimmed', trimmed_at = ?, water_changed_at = ?, vase_id = ?
             WHERE id = ? AND status = 'new'",
        )
        .bind(now)
        .bind(now)
        .bind(vase_id.0)
        .bind(flower_id.0)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(updated > 0)
    }

    /// Refreshes the water of every trimmed flower in the vase and returns how
    /// many were touched.
    pub async fn change_water(&self, vase_id: VaseId, now: DateTime<Utc>) -> Result<u64> {
        let updated = sqlx::query(
            "UPDATE flowers SET water_changed_at = ? WHERE vase_id = ? AND status = 'trimmed'",
        )
        .bind(now)
        .bind(vase_id.0)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(updated)
    }

    pub async fn list_all(&self) -> Result<Vec<Flower>> {
        let rows = sqlx::query(&format!("SELECT {FLOWER_COLUMNS} FROM flowers ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(flower_from_row).collect()
    }

    /// Every flower not yet retired, whatever its expiry time.
    pub async fn list_unretired(&self) -> Result<Vec<Flower>> {
        let rows = sqlx::query(&format!(
            "SELECT {FLOWER_COLUMNS} FROM flowers WHERE status != 'expired' ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(flower_from_row).collect()
    }

    pub async fn list_active(&self, now: DateTime<Utc>) -> Result<Vec<Flower>> {
        let rows = sqlx::query(&format!(
            "SELECT {FLOWER_COLUMNS} FROM flowers
             WHERE julianday(expires_at) > julianday(?) AND status != 'expired'
             ORDER BY id"
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(flower_from_row).collect()
    }

    pub async fn list_untrimmed(&self, now: DateTime<Utc>) -> Result<Vec<Flower>> {
        let rows = sqlx::query(&format!(
            "SELECT {FLOWER_COLUMNS} FROM flowers
             WHERE status = 'new' AND julianday(expires_at) > julianday(?)
             ORDER BY id"
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(flower_from_row).collect()
    }

    /// Retires the given flowers. Flowers already `expired` are skipped, so
    /// replaying the same ids is harmless.
    pub async fn mark_expired(&self, flower_ids: &[FlowerId]) -> Result<u64> {
        if flower_ids.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut retired = 0;
        for flower_id in flower_ids {
            retired += sqlx::query(
                "UPDATE flowers SET status = 'expired' WHERE id = ? AND status != 'expired'",
            )
            .bind(flower_id.0)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }
        tx.commit().await.context("failed to commit expiry sweep")?;
        debug!(requested = flower_ids.len(), retired, "marked flowers expired");
        Ok(retired)
    }

    pub async fn count_flowers(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM flowers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count_active(&self, now: DateTime<Utc>) -> Result<i64> {
        let count = sqlx::query_scalar(
            "SELECT COUNT(*) FROM flowers
             WHERE julianday(expires_at) > julianday(?) AND status != 'expired'",
        )
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn count_in_vases(&self, now: DateTime<Utc>) -> Result<i64> {
        let count = sqlx::query_scalar(
            "SELECT COUNT(*) FROM flowers
             WHERE vase_id IS NOT NULL AND status = 'trimmed'
               AND julianday(expires_at) > julianday(?)",
        )
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}

fn flower_from_row(row: &SqliteRow) -> Result<Flower> {
    let raw_type: String = row.try_get("type")?;
    let raw_status: String = row.try_get("status")?;
    Ok(Flower {
        id: FlowerId(row.try_get("id")?),
        flower_type: raw_type
            .parse::<FlowerType>()
            .with_context(|| format!("flower row holds unknown type '{raw_type}'"))?,
        vase_id: row.try_get::<Option<i64>, _>("vase_id")?.map(VaseId),
        status: FlowerStatus::parse(&raw_status)
            .ok_or_else(|| anyhow!("flower row holds unknown status '{raw_status}'"))?,
        trimmed_at: row.try_get("trimmed_at")?,
        water_changed_at: row.try_get("water_changed_at")?,
        created_at: row.try_get("created_at")?,
        expires_at: row.try_get("expires_at")?,
    })
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
