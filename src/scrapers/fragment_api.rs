//! Results served one table row at a time by a site's pagination endpoint.
//!
//! The endpoint only answers requests that carry the cookies handed out by the
//! human-facing result page, so every fetch first goes through the shared
//! [`SessionCache`]; the client's cookie jar then attaches them. The response
//! is a bare `<tr>` fragment.

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::{Client, header};
use scraper::{Html, Selector};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{ExtractionError, FetchError};
use crate::extract::{
    DrawNumberHint, element_text, extract_draw_date, extract_draw_number, extract_mixed_tokens,
};
use crate::models::{FragmentEndpoint, RawFetchResult};
use crate::normalizer::RawExtraction;
use crate::scraper::read_response;
use crate::scrapers::session::SessionCache;
use crate::traits::ResultSource;

static CELLS: Lazy<Selector> = Lazy::new(|| Selector::parse("td").unwrap());
static LIST_ITEMS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("ol li, ol li *, ul li, ul li *").unwrap());

/// Form body expected by the pagination endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FragmentForm {
    #[serde(rename = "pageId")]
    pub page_id: u32,
    #[serde(rename = "resultID")]
    pub result_id: u32,
    #[serde(rename = "lotteryID")]
    pub lottery_id: u32,
    #[serde(rename = "lastsegment")]
    pub last_segment: String,
}

pub struct FragmentApiSource {
    client: Client,
    session: Arc<SessionCache>,
    endpoint: FragmentEndpoint,
    form: FragmentForm,
}

impl FragmentApiSource {
    pub fn new(
        client: Client,
        session: Arc<SessionCache>,
        endpoint: FragmentEndpoint,
        form: FragmentForm,
    ) -> Self {
        Self {
            client,
            session,
            endpoint,
            form,
        }
    }
}

/// A `<tr>` on its own is dropped by the HTML parser; give it a table.
fn wrap_row(body: &str) -> String {
    format!("<table>{}</table>", body.trim())
}

#[async_trait]
impl ResultSource for FragmentApiSource {
    fn kind(&self) -> &'static str {
        "fragment api"
    }

    fn source_url(&self) -> &str {
        &self.endpoint.listing_url
    }

    async fn fetch(&self) -> Result<RawFetchResult, FetchError> {
        if !self.session.is_acquired() {
            debug!("No session yet for {}", self.endpoint.site_root);
        }
        self.session.ensure(&self.client).await?;
        let url = &self.endpoint.pagination_url;

        info!(
            "Fetching result row for lottery {} (result set {}) from {}",
            self.form.lottery_id, self.form.result_id, url
        );

        let response = self
            .client
            .post(url)
            .header(header::REFERER, &self.endpoint.listing_url)
            .form(&self.form)
            .send()
            .await
            .map_err(|e| FetchError::request(url, e))?;

        read_response(url, response).await
    }

    fn extract(&self, raw: &RawFetchResult) -> Result<RawExtraction, ExtractionError> {
        let fragment = Html::parse_fragment(&wrap_row(&raw.body));

        let cell = fragment
            .select(&CELLS)
            .map(element_text)
            .find(|text| text.contains('|'));

        let (draw_number, draw_date) = match cell.as_deref() {
            Some(cell) => (
                extract_draw_number(&[DrawNumberHint::PipeCell(cell)]),
                extract_draw_date(cell),
            ),
            None => (None, None),
        };

        Ok(RawExtraction {
            tokens: extract_mixed_tokens(fragment.select(&LIST_ITEMS)),
            title: cell,
            draw_number,
            draw_date,
        })
    }
}
