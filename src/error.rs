//! Error types for fetching, extraction and the end-to-end recording flow

use reqwest::StatusCode;
use thiserror::Error;

use crate::models::{ExtractedRecord, Field};

/// Maximum number of characters of an unexpected response body kept for triage.
const PREVIEW_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned {status}: {preview:?}")]
    Status {
        url: String,
        status: StatusCode,
        preview: String,
    },
    #[error("no session cookies from {url} or the site root")]
    EmptySession { url: String },
}

impl FetchError {
    pub fn request(url: &str, source: reqwest::Error) -> Self {
        Self::Request {
            url: url.to_string(),
            source,
        }
    }

    pub fn status(url: &str, status: StatusCode, body: &str) -> Self {
        Self::Status {
            url: url.to_string(),
            status,
            preview: preview(body),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Request { source, .. } if source.is_timeout())
    }
}

/// Whitespace-collapsed, truncated body preview.
pub fn preview(body: &str) -> String {
    let collapsed = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= PREVIEW_CHARS {
        return collapsed;
    }
    let mut short: String = collapsed.chars().take(PREVIEW_CHARS).collect();
    short.push_str("...");
    short
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("{lottery}: could not extract {}", join_fields(.missing))]
    Incomplete { lottery: String, missing: Vec<Field> },
    #[error("malformed {field}: `{raw}`")]
    Malformed { field: Field, raw: String },
    #[error("invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },
}

impl ExtractionError {
    pub fn incomplete(record: &ExtractedRecord) -> Self {
        Self::Incomplete {
            lottery: record.lottery_name.clone(),
            missing: record.missing_fields(),
        }
    }
}

fn join_fields(fields: &[Field]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("invalid selection `{0}`")]
    Selection(String),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
