use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, error, info, warn};

use crate::config::{Catalog, Config};
use crate::database::{Database, Submission};
use crate::error::{ExtractionError, RecorderError};
use crate::models::{ExtractedRecord, LotteryDefinition};
use crate::scraper::Scraper;

/// Result of one successful fetch: what was scraped and what the database did with it.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub record: ExtractedRecord,
    pub submission: Submission,
}

impl RunOutcome {
    /// Human-readable report for the terminal.
    pub fn summary(&self) -> String {
        let record = &self.record;
        let status = match &self.submission {
            Submission::Inserted(stored) => format!("saved (row {})", stored.id),
            Submission::SkippedDuplicate { .. } => {
                "already saved (same lottery + draw), no new draw yet".to_string()
            }
            Submission::RejectedIncomplete { missing } => {
                let missing: Vec<String> = missing.iter().map(ToString::to_string).collect();
                format!("not saved, missing {}", missing.join(", "))
            }
        };
        let or_na = |value: Option<String>| value.unwrap_or_else(|| "N/A".to_string());
        let numbers = record.result_numbers();

        let mut lines = vec![format!("Lottery : {}", record.lottery_name)];
        if let Some(title) = &record.title {
            lines.push(format!("Title   : {title}"));
        }
        lines.push(format!(
            "Draw No : {}",
            or_na(record.draw_number.map(|n| n.to_string()))
        ));
        lines.push(format!(
            "Date    : {}",
            or_na(record.draw_date.map(|d| d.to_string()))
        ));
        lines.push(format!(
            "Numbers : {}",
            or_na(Some(numbers).filter(|n| !n.is_empty()))
        ));
        lines.push(format!("Status  : {status}"));
        lines.join("\n")
    }
}

#[derive(Clone)]
pub struct DrawRecorder {
    scraper: Scraper,
    database: Database,
    catalog: Arc<Catalog>,
}

impl DrawRecorder {
    pub async fn new(config: &Config) -> Result<Self> {
        let scraper = Scraper::new(&config.http)?;
        let database = Database::new(&config.database_url).await?;

        Ok(Self::from_parts(scraper, database, config.catalog.clone()))
    }

    pub fn from_parts(scraper: Scraper, database: Database, catalog: Catalog) -> Self {
        Self {
            scraper,
            database,
            catalog: Arc::new(catalog),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Runs the whole flow for a menu choice.
    ///
    /// An invalid choice fails before any network or database access.
    pub async fn record_selection(&self, choice: &str) -> Result<RunOutcome, RecorderError> {
        let lottery = self.catalog.select(choice)?;
        self.record(lottery).await
    }

    pub async fn record(&self, lottery: &LotteryDefinition) -> Result<RunOutcome, RecorderError> {
        let record = self.scraper.scrape(lottery).await?;
        self.store(record).await
    }

    /// Offers an already scraped record to the database. Incomplete records
    /// are refused here and never reach it.
    pub async fn store(&self, record: ExtractedRecord) -> Result<RunOutcome, RecorderError> {
        if !record.is_complete() {
            return Err(ExtractionError::incomplete(&record).into());
        }
        let submission = self.database.submit(&record).await?;
        if matches!(submission, Submission::Inserted(_)) {
            let total = self.database.count_draws(&record.lottery_name).await?;
            debug!("{} now has {} stored draws", record.lottery_name, total);
        }
        Ok(RunOutcome { record, submission })
    }

    /// Checks every lottery in the catalogue once; failures are logged and do
    /// not stop the remaining lotteries.
    pub async fn check_all(&self) -> Result<()> {
        let mut new_draws = 0;

        for lottery in self.catalog.iter() {
            match self.record(lottery).await {
                Ok(RunOutcome {
                    submission: Submission::Inserted(stored),
                    ..
                }) => {
                    info!(
                        "New draw stored: {} #{} ({})",
                        stored.lottery_name, stored.draw_number, stored.draw_date
                    );
                    new_draws += 1;
                }
                Ok(RunOutcome {
                    submission: Submission::SkippedDuplicate { .. },
                    record,
                }) => {
                    info!("{}: no new draw yet", record.lottery_name);
                }
                Ok(RunOutcome {
                    submission: Submission::RejectedIncomplete { missing },
                    record,
                }) => {
                    warn!("{}: rejected, missing {:?}", record.lottery_name, missing);
                }
                Err(e) => {
                    error!("{}: {}", lottery.display_name, e);
                }
            }
        }

        if new_draws > 0 {
            info!("Stored {} new draws", new_draws);
        } else {
            info!("No new draws found");
        }

        Ok(())
    }
}
