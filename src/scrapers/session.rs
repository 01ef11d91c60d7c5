//! Session cookies for sources whose fragment endpoint rejects anonymous requests

use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, Url};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::error::FetchError;

/// Lazily acquired, process-wide session for one site.
///
/// The cookies themselves live in the client's [`Jar`]; this only decides when
/// the handshake has produced a usable session. Concurrent callers share a
/// single in-flight handshake. A failed acquisition leaves the cache empty so
/// the next call tries again.
#[derive(Debug)]
pub struct SessionCache {
    listing_url: String,
    site_root: String,
    jar: Arc<Jar>,
    ready: OnceCell<()>,
}

impl SessionCache {
    /// `jar` must be the cookie provider of the client later passed to [`Self::ensure`].
    pub fn new(
        listing_url: impl Into<String>,
        site_root: impl Into<String>,
        jar: Arc<Jar>,
    ) -> Self {
        Self {
            listing_url: listing_url.into(),
            site_root: site_root.into(),
            jar,
            ready: OnceCell::new(),
        }
    }

    /// Runs the handshake once; afterwards the client sends the session cookies by itself.
    pub async fn ensure(&self, client: &Client) -> Result<(), FetchError> {
        self.ready
            .get_or_try_init(|| self.acquire(client))
            .await
            .map(|_| ())
    }

    pub fn is_acquired(&self) -> bool {
        self.ready.initialized()
    }

    /// Whether the jar holds live cookies for the listing page. Expired and
    /// deleted cookies are not counted.
    fn has_cookies(&self) -> bool {
        Url::parse(&self.listing_url)
            .ok()
            .and_then(|url| self.jar.cookies(&url))
            .is_some()
    }

    async fn acquire(&self, client: &Client) -> Result<(), FetchError> {
        info!("Acquiring session cookies from {}", self.listing_url);

        match handshake(client, &self.listing_url).await {
            Ok(()) if self.has_cookies() => return Ok(()),
            Ok(()) => warn!(
                "{} set no usable cookies, retrying with {}",
                self.listing_url, self.site_root
            ),
            Err(e) => warn!("Session handshake failed ({e}), retrying with {}", self.site_root),
        }

        handshake(client, &self.site_root).await?;
        if !self.has_cookies() {
            return Err(FetchError::EmptySession {
                url: self.listing_url.clone(),
            });
        }
        Ok(())
    }
}

async fn handshake(client: &Client, url: &str) -> Result<(), FetchError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| FetchError::request(url, e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(FetchError::status(url, status, &body));
    }

    debug!("{} answered {} with {} cookies", url, status, response.cookies().count());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(jar: &Arc<Jar>) -> SessionCache {
        SessionCache::new(
            "https://lottery.test/results/latest",
            "https://lottery.test/",
            jar.clone(),
        )
    }

    #[test]
    fn live_cookie_counts_as_session() {
        let jar = Arc::new(Jar::default());
        let root = Url::parse("https://lottery.test/").unwrap();
        jar.add_cookie_str("ASP.NET_SessionId=abc; Path=/", &root);

        assert!(cache(&jar).has_cookies());
    }

    #[test]
    fn deleted_cookie_does_not_count() {
        let jar = Arc::new(Jar::default());
        let root = Url::parse("https://lottery.test/").unwrap();
        jar.add_cookie_str("ASP.NET_SessionId=; Max-Age=0; Path=/", &root);

        assert!(!cache(&jar).has_cookies());
    }

    #[test]
    fn cookie_for_another_path_does_not_count() {
        let jar = Arc::new(Jar::default());
        let other = Url::parse("https://lottery.test/account/").unwrap();
        jar.add_cookie_str("token=abc; Path=/account", &other);

        assert!(!cache(&jar).has_cookies());
    }
}
