use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, de::DeserializeOwned};
use url::Url;

use crate::ScrapeError;

pub const DELHI_HIGH_COURT_BASE_URL: &str = "https://delhihighcourt.nic.in";
const SEARCH_PAGE_PATH: &str = "app/get-case-type-status";
const ORDERS_TABLE_ID: &str = "caseTable";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                                  AppleWebKit/537.36 (KHTML, like Gecko) \
                                  Chrome/91.0.4472.124 Safari/537.36";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where and how to talk to the case-status portal.
///
/// The defaults describe the live Delhi High Court site. Tests build one with
/// [`ScrapingConfig::for_base_url`] pointing at a mock server instead.
#[derive(Debug, Clone)]
pub struct ScrapingConfig {
    /// Relative links found in case records are resolved against this.
    pub base_url: Url,
    /// Landing page for the cookie handshake, also the search endpoint.
    pub search_page_url: Url,
    /// `id` attribute of the table listing orders on the orders page.
    pub orders_table_id: String,
    pub user_agent: String,
    pub request_timeout: Duration,
}

impl ScrapingConfig {
    pub fn for_base_url(base_url: &str) -> Result<Self, ScrapeError> {
        let base_url = Url::parse(base_url).map_err(|source| ScrapeError::InvalidUrl {
            url: base_url.to_string(),
            source,
        })?;
        let search_page_url =
            base_url
                .join(SEARCH_PAGE_PATH)
                .map_err(|source| ScrapeError::InvalidUrl {
                    url: SEARCH_PAGE_PATH.to_string(),
                    source,
                })?;
        Ok(Self {
            base_url,
            search_page_url,
            orders_table_id: ORDERS_TABLE_ID.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        // Both constants are known-good URLs.
        Self::for_base_url(DELHI_HIGH_COURT_BASE_URL)
            .expect("built-in portal URL must parse")
    }
}

/// The env vars needed to run the API server.
#[derive(Debug, Deserialize)]
pub struct ServerEnv {
    /// Postgres connection string. Queries are only kept in memory without it.
    pub database_url: Option<String>,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    pub scrape_timeout_secs: Option<u64>,
    /// Every fetched page is written here when set.
    pub dump_dir: Option<String>,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8000".to_string()
}

impl ServerEnv {
    pub fn scraping_config(&self) -> ScrapingConfig {
        let config = ScrapingConfig::default();
        match self.scrape_timeout_secs {
            Some(secs) => config.with_timeout(Duration::from_secs(secs)),
            None => config,
        }
    }
}

// Extension trait.
pub trait LoadFromEnv: DeserializeOwned {
    fn load_from_env() -> anyhow::Result<Self> {
        // Don't throw an error if .env file doesn't exist.
        let _ = dotenv::dotenv();
        let config =
            envy::from_env::<Self>().context("failed to load env variables into config struct")?;
        Ok(config)
    }
}

impl<T: DeserializeOwned> LoadFromEnv for T {}
