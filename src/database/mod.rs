use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, migrate::MigrateDatabase};
use tracing::{info, warn};

use crate::models::{ExtractedRecord, Field, StoredDraw};

/// Outcome of offering a scraped record to the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Inserted(StoredDraw),
    /// The draw is already stored: no new draw has happened since the last run
    SkippedDuplicate { existing_id: Option<i64> },
    RejectedIncomplete { missing: Vec<Field> },
}

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(db_url: &str) -> Result<Self> {
        if let Some(parent) = sqlite_file_parent(db_url) {
            std::fs::create_dir_all(parent)?;
        }

        // Create database file if it doesn't exist
        if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
            info!("Creating database file");
            Sqlite::create_database(db_url).await?;
        }

        let pool = SqlitePool::connect(db_url).await?;
        Self::from_pool(pool).await
    }

    #[cfg(test)]
    pub async fn in_memory() -> Result<Self> {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> Result<Self> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;

        info!("Database initialized successfully");
        Ok(Self { pool })
    }

    pub async fn find_draw(
        &self,
        lottery_name: &str,
        draw_number: u32,
    ) -> sqlx::Result<Option<StoredDraw>> {
        sqlx::query_as::<_, StoredDraw>(
            r"
            SELECT id, lottery_name, draw_no, draw_date, result_numbers, source_url, created_at
            FROM lottery_results
            WHERE lottery_name = ? AND draw_no = ?
            ",
        )
        .bind(lottery_name)
        .bind(i64::from(draw_number))
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn count_draws(&self, lottery_name: &str) -> sqlx::Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM lottery_results WHERE lottery_name = ?")
            .bind(lottery_name)
            .fetch_one(&self.pool)
            .await
    }

    /// Stores `record` unless it is incomplete or its draw is already stored.
    ///
    /// The lookup is only a fast path: the `(lottery_name, draw_no)` unique
    /// constraint decides, so two concurrent submissions of the same draw
    /// yield one `Inserted` and one `SkippedDuplicate`. Rows are never updated.
    pub async fn submit(&self, record: &ExtractedRecord) -> sqlx::Result<Submission> {
        let Some(draw) = record.complete() else {
            let missing = record.missing_fields();
            warn!(
                "Not storing {} from {}: missing {:?}",
                record.lottery_name, record.source_url, missing
            );
            return Ok(Submission::RejectedIncomplete { missing });
        };

        if let Some(existing) = self.find_draw(draw.lottery_name, draw.draw_number).await? {
            info!(
                "{} draw {} already stored (row {})",
                draw.lottery_name, draw.draw_number, existing.id
            );
            return Ok(Submission::SkippedDuplicate {
                existing_id: Some(existing.id),
            });
        }

        let created_at = Utc::now();
        let result = sqlx::query(
            r"
            INSERT INTO lottery_results
                (lottery_name, draw_no, draw_date, result_numbers, source_url, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (lottery_name, draw_no) DO NOTHING
            ",
        )
        .bind(draw.lottery_name)
        .bind(i64::from(draw.draw_number))
        .bind(draw.draw_date)
        .bind(&draw.result_numbers)
        .bind(draw.source_url)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            info!(
                "{} draw {} was stored concurrently",
                draw.lottery_name, draw.draw_number
            );
            return Ok(Submission::SkippedDuplicate { existing_id: None });
        }

        let stored = StoredDraw {
            id: result.last_insert_rowid(),
            lottery_name: draw.lottery_name.to_string(),
            draw_number: i64::from(draw.draw_number),
            draw_date: draw.draw_date,
            result_numbers: draw.result_numbers,
            source_url: Some(draw.source_url.to_string()),
            created_at,
        };
        info!(
            "Stored {} draw {} ({})",
            stored.lottery_name, stored.draw_number, stored.draw_date
        );
        Ok(Submission::Inserted(stored))
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
        }
    }
}

/// Directory of a file-backed `sqlite:` URL, if it has one.
fn sqlite_file_parent(db_url: &str) -> Option<&Path> {
    let path = db_url.strip_prefix("sqlite:")?;
    let path = path.trim_start_matches("//");
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path == ":memory:" {
        return None;
    }
    Path::new(path)
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn record() -> ExtractedRecord {
        ExtractedRecord {
            lottery_name: "Ada Kotipathi".into(),
            draw_number: Some(2888),
            draw_date: NaiveDate::from_ymd_opt(2026, 1, 28),
            numbers_or_codes: vec!["05".into(), "41".into(), "56".into(), "64".into()],
            source_url: "https://results.govdoc.lk/results/ada-kotipathi-2888".into(),
            title: Some("Ada Kotipathi 2888".into()),
        }
    }

    #[tokio::test]
    async fn resubmission_is_skipped() {
        let db = Database::in_memory().await.unwrap();

        let first = db.submit(&record()).await.unwrap();
        let stored = match first {
            Submission::Inserted(stored) => stored,
            other => panic!("expected insert, got {other:?}"),
        };
        assert_eq!(stored.result_numbers, "05 41 56 64");

        let second = db.submit(&record()).await.unwrap();
        assert_eq!(
            second,
            Submission::SkippedDuplicate {
                existing_id: Some(stored.id)
            }
        );
        assert_eq!(db.count_draws("Ada Kotipathi").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn stored_row_reads_back() {
        let db = Database::in_memory().await.unwrap();
        db.submit(&record()).await.unwrap();

        let row = db.find_draw("Ada Kotipathi", 2888).await.unwrap().unwrap();
        assert_eq!(row.draw_number, 2888);
        assert_eq!(row.draw_date, NaiveDate::from_ymd_opt(2026, 1, 28).unwrap());
        assert_eq!(
            row.source_url.as_deref(),
            Some("https://results.govdoc.lk/results/ada-kotipathi-2888")
        );
        assert!(db.find_draw("Ada Kotipathi", 2889).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn concurrent_submissions_store_one_row() {
        let db = Database::in_memory().await.unwrap();
        let draw = record();

        // both lookups run before either insert, so the constraint decides
        let (a, b) = tokio::join!(db.submit(&draw), db.submit(&draw));
        let (a, b) = (a.unwrap(), b.unwrap());

        assert!(matches!(a, Submission::Inserted(_)), "got {a:?}");
        assert_eq!(b, Submission::SkippedDuplicate { existing_id: None });
        assert_eq!(db.count_draws("Ada Kotipathi").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn incomplete_record_is_rejected_without_writing() {
        let db = Database::in_memory().await.unwrap();
        let mut incomplete = record();
        incomplete.draw_date = None;

        let outcome = db.submit(&incomplete).await.unwrap();
        assert_eq!(
            outcome,
            Submission::RejectedIncomplete {
                missing: vec![Field::DrawDate]
            }
        );
        assert_eq!(db.count_draws("Ada Kotipathi").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn empty_numbers_are_still_stored() {
        let db = Database::in_memory().await.unwrap();
        let mut no_numbers = record();
        no_numbers.numbers_or_codes.clear();

        match db.submit(&no_numbers).await.unwrap() {
            Submission::Inserted(stored) => assert_eq!(stored.result_numbers, ""),
            other => panic!("expected insert, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn same_draw_number_for_another_lottery_is_separate() {
        let db = Database::in_memory().await.unwrap();
        let mut other = record();
        other.lottery_name = "Govi Setha".into();

        assert!(matches!(
            db.submit(&record()).await.unwrap(),
            Submission::Inserted(_)
        ));
        assert!(matches!(
            db.submit(&other).await.unwrap(),
            Submission::Inserted(_)
        ));
    }

    #[tokio::test]
    async fn storage_enforces_uniqueness_on_its_own() {
        let db = Database::in_memory().await.unwrap();
        db.submit(&record()).await.unwrap();

        let duplicate = sqlx::query(
            "INSERT INTO lottery_results
                (lottery_name, draw_no, draw_date, result_numbers, source_url, created_at)
             VALUES ('Ada Kotipathi', 2888, '2026-01-28', '', NULL, '2026-01-28T00:00:00Z')",
        )
        .execute(&db.pool)
        .await;
        assert!(duplicate.is_err());
        assert_eq!(db.count_draws("Ada Kotipathi").await.unwrap(), 1);
    }

    #[test]
    fn sqlite_parent_directory() {
        assert_eq!(
            sqlite_file_parent("sqlite:database/lottery.db"),
            Some(Path::new("database"))
        );
        assert_eq!(sqlite_file_parent("sqlite://data/x.db?mode=rwc"), Some(Path::new("data")));
        assert_eq!(sqlite_file_parent("sqlite::memory:"), None);
        assert_eq!(sqlite_file_parent("sqlite:lottery.db"), None);
    }
}
