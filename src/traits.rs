//! Traits and interfaces for per-source result adapters

use async_trait::async_trait;

use crate::error::{ExtractionError, FetchError};
use crate::models::RawFetchResult;
use crate::normalizer::RawExtraction;

/// One way of obtaining and reading a lottery's latest result.
///
/// Fetching and extraction are split so that extraction stays a pure function
/// of the captured response and can be exercised against canned HTML.
#[async_trait]
pub trait ResultSource: Send + Sync {
    /// Short label for logs
    fn kind(&self) -> &'static str;

    /// URL recorded as the origin of the stored draw
    fn source_url(&self) -> &str;

    /// Retrieve the raw response
    ///
    /// # Returns
    /// * `Result<RawFetchResult, FetchError>` - The successful response or the
    ///   failed step with URL, status and body preview
    async fn fetch(&self) -> Result<RawFetchResult, FetchError>;

    /// Run the field extractors over a fetched response
    fn extract(&self, raw: &RawFetchResult) -> Result<RawExtraction, ExtractionError>;
}
