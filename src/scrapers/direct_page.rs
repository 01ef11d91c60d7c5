//! Result pages fetched whole with a single GET

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, info};

use crate::error::{ExtractionError, FetchError};
use crate::extract::{
    DEFAULT_NUMBERS_SELECTOR, DrawNumberHint, extract_alphanumeric_codes, extract_draw_date,
    extract_draw_number, extract_numeric_tokens, page_heading, visible_text,
};
use crate::models::RawFetchResult;
use crate::normalizer::RawExtraction;
use crate::scraper::read_response;
use crate::traits::ResultSource;

pub struct DirectPageSource {
    client: Client,
    url: String,
    numbers_selector: Option<String>,
    with_codes: bool,
}

impl DirectPageSource {
    pub fn new(
        client: Client,
        url: impl Into<String>,
        numbers_selector: Option<String>,
        with_codes: bool,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            numbers_selector,
            with_codes,
        }
    }

    fn numbers_selector(&self) -> Result<Selector, ExtractionError> {
        let selector = self
            .numbers_selector
            .as_deref()
            .unwrap_or(DEFAULT_NUMBERS_SELECTOR);
        Selector::parse(selector).map_err(|e| ExtractionError::Selector {
            selector: selector.to_string(),
            reason: format!("{e:?}"),
        })
    }
}

#[async_trait]
impl ResultSource for DirectPageSource {
    fn kind(&self) -> &'static str {
        "direct page"
    }

    fn source_url(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> Result<RawFetchResult, FetchError> {
        info!("Fetching result page {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FetchError::request(&self.url, e))?;

        read_response(&self.url, response).await
    }

    fn extract(&self, raw: &RawFetchResult) -> Result<RawExtraction, ExtractionError> {
        let selector = self.numbers_selector()?;
        let document = Html::parse_document(&raw.body);

        let title = page_heading(&document);
        let text = visible_text(&document);

        let mut hints = vec![DrawNumberHint::UrlSuffix(&self.url)];
        if let Some(title) = title.as_deref() {
            hints.push(DrawNumberHint::Title(title));
        }
        let draw_number = extract_draw_number(&hints);

        let mut tokens = if self.with_codes {
            extract_alphanumeric_codes(&text)
        } else {
            Vec::new()
        };
        let numbers = extract_numeric_tokens(&document, &selector);
        debug!(
            "{}: {} numbers from {:?} pass",
            self.url,
            numbers.tokens.len(),
            numbers.pass
        );
        tokens.extend(numbers.tokens);

        Ok(RawExtraction {
            draw_date: extract_draw_date(&text),
            title,
            draw_number,
            tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use reqwest::StatusCode;

    const PAGE: &str = r#"<!doctype html>
        <html>
          <head><title>Ada Kotipathi | GovDoc</title></head>
          <body>
            <nav><a href="/">Home</a></nav>
            <h1>Ada Kotipathi - Draw 2888</h1>
            <p class="meta">Draw date: 2026-01-28 (Wednesday)</p>
            <p>Special prize code: W 123456</p>
            <ul class="winning-numbers">
              <li>05</li><li>41</li><li>56</li><li>64</li><li>05</li>
            </ul>
            <footer>Page 1 of 12</footer>
          </body>
        </html>"#;

    fn raw(body: &str) -> RawFetchResult {
        RawFetchResult {
            url: "https://results.govdoc.lk/results/ada-kotipathi-2888".into(),
            status: StatusCode::OK,
            body: body.to_string(),
        }
    }

    fn source(with_codes: bool) -> DirectPageSource {
        DirectPageSource::new(
            Client::new(),
            "https://results.govdoc.lk/results/ada-kotipathi-2888",
            None,
            with_codes,
        )
    }

    #[test]
    fn extracts_all_fields_from_page() {
        let extraction = source(false).extract(&raw(PAGE)).unwrap();
        assert_eq!(extraction.title.as_deref(), Some("Ada Kotipathi - Draw 2888"));
        assert_eq!(extraction.draw_number.as_deref(), Some("2888"));
        assert_eq!(extraction.draw_date, NaiveDate::from_ymd_opt(2026, 1, 28));
        assert_eq!(extraction.tokens, vec!["05", "41", "56", "64", "05"]);
    }

    #[test]
    fn codes_precede_numbers_when_enabled() {
        let extraction = source(true).extract(&raw(PAGE)).unwrap();
        assert_eq!(extraction.tokens[0], "W123456");
        assert_eq!(&extraction.tokens[1..], ["05", "41", "56", "64", "05"]);
    }

    #[test]
    fn title_supplies_draw_number_when_url_has_none() {
        let source = DirectPageSource::new(
            Client::new(),
            "https://results.govdoc.lk/results/latest",
            None,
            false,
        );
        let extraction = source.extract(&raw(PAGE)).unwrap();
        assert_eq!(extraction.draw_number.as_deref(), Some("2888"));
    }

    #[test]
    fn changed_layout_degrades_to_absent_fields() {
        let source = DirectPageSource::new(
            Client::new(),
            "https://results.govdoc.lk/results/latest",
            None,
            false,
        );
        let extraction = source
            .extract(&raw("<html><body><p>Results unavailable</p></body></html>"))
            .unwrap();
        assert_eq!(extraction.draw_number, None);
        assert_eq!(extraction.draw_date, None);
        assert!(extraction.tokens.is_empty());
    }

    #[test]
    fn bad_selector_is_reported() {
        let source = DirectPageSource::new(
            Client::new(),
            "https://results.govdoc.lk/results/x-1",
            Some("li[[".into()),
            false,
        );
        assert!(matches!(
            source.extract(&raw(PAGE)),
            Err(ExtractionError::Selector { .. })
        ));
    }
}
