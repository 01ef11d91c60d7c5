use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use reqwest::cookie::Jar;
use reqwest::{Client, Response};
use tracing::{debug, info};

use crate::config::HttpSettings;
use crate::error::{FetchError, RecorderError};
use crate::models::{
    ExtractedRecord, FragmentEndpoint, LotteryDefinition, RawFetchResult, SourceLocator,
};
use crate::normalizer::normalize;
use crate::scrapers::{DirectPageSource, FragmentApiSource, FragmentForm, SessionCache};
use crate::traits::ResultSource;

/// Builds the right adapter for a lottery and runs fetch, extract and normalize.
///
/// Owns the HTTP client, its cookie jar and the per-site session caches, so
/// sessions live as long as the scraper (and its clones) rather than in a global.
pub struct Scraper {
    client: Client,
    cookies: Arc<Jar>,
    sessions: Arc<Mutex<HashMap<String, Arc<SessionCache>>>>,
}

impl Scraper {
    pub fn new(settings: &HttpSettings) -> Result<Self, FetchError> {
        let cookies = Arc::new(Jar::default());
        let client = Client::builder()
            .user_agent(&settings.user_agent)
            .timeout(settings.timeout)
            .cookie_provider(cookies.clone())
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client,
            cookies,
            sessions: Arc::default(),
        })
    }

    pub fn source_for(&self, lottery: &LotteryDefinition) -> Box<dyn ResultSource> {
        match &lottery.source {
            SourceLocator::DirectPage {
                url,
                numbers_selector,
                with_codes,
            } => Box::new(DirectPageSource::new(
                self.client.clone(),
                url.clone(),
                numbers_selector.clone(),
                *with_codes,
            )),
            SourceLocator::FragmentApi {
                lottery_id,
                result_id,
                page_id,
                last_segment,
                endpoint,
            } => Box::new(FragmentApiSource::new(
                self.client.clone(),
                self.session_for(endpoint),
                endpoint.clone(),
                FragmentForm {
                    page_id: *page_id,
                    result_id: *result_id,
                    lottery_id: *lottery_id,
                    last_segment: last_segment.clone(),
                },
            )),
        }
    }

    /// One session per site; lotteries on the same site share cookies.
    fn session_for(&self, endpoint: &FragmentEndpoint) -> Arc<SessionCache> {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions
            .entry(endpoint.site_root.clone())
            .or_insert_with(|| {
                Arc::new(SessionCache::new(
                    endpoint.listing_url.clone(),
                    endpoint.site_root.clone(),
                    self.cookies.clone(),
                ))
            })
            .clone()
    }

    pub async fn scrape(
        &self,
        lottery: &LotteryDefinition,
    ) -> Result<ExtractedRecord, RecorderError> {
        let source = self.source_for(lottery);
        info!("Scraping {} via {}", lottery.display_name, source.kind());

        let raw = source.fetch().await?;
        debug!("{} answered {} ({} bytes)", raw.url, raw.status, raw.body.len());
        let extraction = source.extract(&raw)?;
        let record = normalize(lottery, source.source_url(), extraction)?;

        info!(
            "{}: draw {:?} on {:?} with {} numbers",
            record.lottery_name,
            record.draw_number,
            record.draw_date,
            record.numbers_or_codes.len()
        );
        Ok(record)
    }
}

impl Clone for Scraper {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            cookies: self.cookies.clone(),
            sessions: self.sessions.clone(),
        }
    }
}

/// Reads the body and turns a non-success status into a [`FetchError`].
pub(crate) async fn read_response(
    url: &str,
    response: Response,
) -> Result<RawFetchResult, FetchError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(FetchError::status(url, status, &body));
    }

    let body = response
        .text()
        .await
        .map_err(|e| FetchError::request(url, e))?;

    Ok(RawFetchResult {
        url: url.to_string(),
        status,
        body,
    })
}
