//! Data models for lottery definitions, scraped draws and stored rows

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// A lottery as it appears in the selection menu.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotteryDefinition {
    /// Menu key
    pub id: i64,
    pub display_name: String,
    pub source: SourceLocator,
}

/// Where and how a lottery's latest result is published.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceLocator {
    /// A full result page fetched with a single GET
    DirectPage {
        url: String,
        /// Replaces the default structured-pass selector
        #[serde(default)]
        numbers_selector: Option<String>,
        /// Also collect `A123456`-style winning codes
        #[serde(default)]
        with_codes: bool,
    },
    /// A table-row fragment served by the site's pagination endpoint
    FragmentApi {
        lottery_id: u32,
        result_id: u32,
        #[serde(default)]
        page_id: u32,
        last_segment: String,
        endpoint: FragmentEndpoint,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FragmentEndpoint {
    /// Human-facing result page, visited to obtain session cookies
    pub listing_url: String,
    /// Fallback for the cookie handshake
    pub site_root: String,
    /// POST target returning one table row
    pub pagination_url: String,
}

/// Response captured by a source adapter, consumed by its own extraction step.
#[derive(Debug, Clone)]
pub struct RawFetchResult {
    pub url: String,
    pub status: StatusCode,
    pub body: String,
}

/// The fields whose presence decides whether a record may be stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    LotteryName,
    DrawNumber,
    DrawDate,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::LotteryName => "lottery name",
            Self::DrawNumber => "draw number",
            Self::DrawDate => "draw date",
        })
    }
}

/// A normalized scrape result. It may still be incomplete; only
/// [`ExtractedRecord::complete`] yields something the database accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedRecord {
    pub lottery_name: String,
    pub draw_number: Option<u32>,
    pub draw_date: Option<NaiveDate>,
    /// Ball numbers and codes, deduplicated, in order of first appearance
    pub numbers_or_codes: Vec<String>,
    pub source_url: String,
    pub title: Option<String>,
}

/// Borrowed view of a record that has every required field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleteDraw<'a> {
    pub lottery_name: &'a str,
    pub draw_number: u32,
    pub draw_date: NaiveDate,
    pub result_numbers: String,
    pub source_url: &'a str,
}

impl ExtractedRecord {
    pub fn missing_fields(&self) -> Vec<Field> {
        let mut missing = Vec::new();
        if self.lottery_name.trim().is_empty() {
            missing.push(Field::LotteryName);
        }
        if self.draw_number.is_none() {
            missing.push(Field::DrawNumber);
        }
        if self.draw_date.is_none() {
            missing.push(Field::DrawDate);
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Space-joined tokens; empty when no numbers were found.
    pub fn result_numbers(&self) -> String {
        self.numbers_or_codes.join(" ")
    }

    pub fn complete(&self) -> Option<CompleteDraw<'_>> {
        if self.lottery_name.trim().is_empty() {
            return None;
        }
        Some(CompleteDraw {
            lottery_name: &self.lottery_name,
            draw_number: self.draw_number?,
            draw_date: self.draw_date?,
            result_numbers: self.result_numbers(),
            source_url: &self.source_url,
        })
    }
}

/// A row of `lottery_results`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct StoredDraw {
    pub id: i64,
    pub lottery_name: String,
    #[sqlx(rename = "draw_no")]
    pub draw_number: i64,
    pub draw_date: NaiveDate,
    pub result_numbers: String,
    pub source_url: Option<String>,
    pub created_at: DateTime<Utc>,
}
