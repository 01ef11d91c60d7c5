//! Runtime configuration and the lottery catalogue.
//!
//! Settings come from the environment (a `.env` file is loaded first by
//! `main`). The catalogue defaults to the GovDoc result pages and can be
//! replaced by a JSON file named in `LOTTERY_CATALOG`.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::Url;
use scraper::Selector;
use tracing::info;

use crate::error::RecorderError;
use crate::models::{LotteryDefinition, SourceLocator};

pub const DEFAULT_DATABASE_URL: &str = "sqlite:database/lottery.db";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";
pub const DEFAULT_WATCH_SCHEDULE: &str = "0 0 */1 * * *";
const DEFAULT_TIMEOUT_SECS: u64 = 15;
const MAX_TIMEOUT_SECS: u64 = 120;

const GOVDOC_RESULTS: &str = "https://results.govdoc.lk/results/";

const GOVDOC_LOTTERIES: [(&str, &str); 7] = [
    ("Ada Kotipathi", "ada-kotipathi-2888"),
    ("Lagna Wasana", "lagna-wasana-4774"),
    ("Super Ball", "super-ball-3062"),
    ("Govi Setha", "govi-setha-4330"),
    ("Dhana Nidhanaya", "dhana-nidhanaya-2118"),
    ("Mahajana Sampatha", "mahajana-sampatha-6088"),
    ("Jaya Sampatha", "jaya-sampatha-270"),
];

/// Settings for outbound requests.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub http: HttpSettings,
    pub watch_schedule: String,
    pub catalog: Catalog,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        let timeout_secs = match std::env::var("HTTP_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("HTTP_TIMEOUT_SECS is not a number: {raw:?}"))?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        let user_agent =
            std::env::var("LOTTERY_USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string());
        let watch_schedule = std::env::var("WATCH_SCHEDULE")
            .unwrap_or_else(|_| DEFAULT_WATCH_SCHEDULE.to_string());

        let catalog = match std::env::var("LOTTERY_CATALOG") {
            Ok(path) => Catalog::load(Path::new(&path))?,
            Err(_) => Catalog::builtin(),
        };

        Ok(Self {
            database_url,
            http: HttpSettings {
                user_agent,
                timeout: Duration::from_secs(timeout_secs.clamp(1, MAX_TIMEOUT_SECS)),
            },
            watch_schedule,
            catalog,
        })
    }
}

/// The fixed list of lotteries offered in the menu, in menu order.
#[derive(Debug, Clone)]
pub struct Catalog {
    lotteries: Vec<LotteryDefinition>,
}

impl Catalog {
    pub fn builtin() -> Self {
        let lotteries = GOVDOC_LOTTERIES
            .iter()
            .zip(1..)
            .map(|((name, slug), id)| LotteryDefinition {
                id,
                display_name: (*name).to_string(),
                source: SourceLocator::DirectPage {
                    url: format!("{GOVDOC_RESULTS}{slug}"),
                    numbers_selector: None,
                    with_codes: false,
                },
            })
            .collect();
        Self { lotteries }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading lottery catalogue {}", path.display()))?;
        let catalog = Self::from_json(&raw)
            .with_context(|| format!("parsing lottery catalogue {}", path.display()))?;
        info!(
            "Loaded {} lotteries from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let lotteries: Vec<LotteryDefinition> = serde_json::from_str(raw)?;
        Self::new(lotteries)
    }

    pub fn new(lotteries: Vec<LotteryDefinition>) -> Result<Self> {
        if lotteries.is_empty() {
            bail!("lottery catalogue is empty");
        }

        let mut ids = HashSet::new();
        for lottery in &lotteries {
            if lottery.id <= 0 {
                bail!("lottery {:?} has non-positive id {}", lottery.display_name, lottery.id);
            }
            if !ids.insert(lottery.id) {
                bail!("duplicate lottery id {}", lottery.id);
            }
            if lottery.display_name.trim().is_empty() {
                bail!("lottery {} has an empty name", lottery.id);
            }
            validate_source(lottery)?;
        }

        Ok(Self { lotteries })
    }

    /// Resolves a menu choice.
    pub fn select(&self, choice: &str) -> Result<&LotteryDefinition, RecorderError> {
        let invalid = || RecorderError::Selection(choice.trim().to_string());
        let id: i64 = choice.trim().parse().map_err(|_| invalid())?;
        self.get(id).ok_or_else(invalid)
    }

    pub fn get(&self, id: i64) -> Option<&LotteryDefinition> {
        self.lotteries.iter().find(|lottery| lottery.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LotteryDefinition> {
        self.lotteries.iter()
    }

    pub fn len(&self) -> usize {
        self.lotteries.len()
    }
}

fn validate_source(lottery: &LotteryDefinition) -> Result<()> {
    let name = &lottery.display_name;
    match &lottery.source {
        SourceLocator::DirectPage {
            url,
            numbers_selector,
            ..
        } => {
            Url::parse(url).with_context(|| format!("{name}: invalid url {url:?}"))?;
            if let Some(selector) = numbers_selector {
                Selector::parse(selector).map_err(|e| {
                    anyhow::anyhow!("{name}: invalid numbers selector {selector:?}: {e:?}")
                })?;
            }
        }
        SourceLocator::FragmentApi {
            last_segment,
            endpoint,
            ..
        } => {
            for url in [
                &endpoint.listing_url,
                &endpoint.site_root,
                &endpoint.pagination_url,
            ] {
                Url::parse(url).with_context(|| format!("{name}: invalid url {url:?}"))?;
            }
            if last_segment.trim().is_empty() {
                bail!("{name}: fragment source needs a last_segment");
            }
        }
    }
    Ok(())
}
