use tracing::debug;

use crate::db::models::OddsRow;
use crate::error::Result;
use crate::types::SinkRow;

/// Appends extracted odds rows to SQLite and reads them back for the API.
#[derive(Clone)]
pub struct OddsWriter {
    pool: sqlx::SqlitePool,
}

impl OddsWriter {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert all rows in one transaction, in the given order. Returns the row count.
    pub async fn append(&self, rows: &[SinkRow]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO odds_rows (
                    observed_at, race_name, horse_number, horse_name,
                    win_odds, place_odds_min, place_odds_max
                ) VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(row.observed_at_ns)
            .bind(&row.race_name)
            .bind(&row.horse_number)
            .bind(&row.horse_name)
            .bind(&row.win_odds)
            .bind(&row.place_odds_min)
            .bind(&row.place_odds_max)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        debug!(rows = rows.len(), "Appended odds rows");
        Ok(rows.len())
    }

    /// Most recent rows, newest first.
    pub async fn recent(&self, limit: i64) -> Result<Vec<OddsRow>> {
        let rows = sqlx::query_as::<_, OddsRow>(
            r#"
            SELECT id, observed_at, race_name, horse_number, horse_name,
                   win_odds, place_odds_min, place_odds_max
            FROM odds_rows
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

/// In-memory database with migrations applied, for tests.
#[cfg(test)]
pub async fn test_pool() -> sqlx::SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}
