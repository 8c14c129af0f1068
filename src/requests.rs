use std::sync::Arc;

use log::{info, warn};
use reqwest::{
    Client, ClientBuilder, RequestBuilder,
    cookie::{CookieStore, Jar},
};
use url::Url;

use crate::{
    ScrapeError,
    config::ScrapingConfig,
    diagnostics::{DiagnosticSink, Stage},
};

pub const XSRF_COOKIE: &str = "XSRF-TOKEN";
const ERROR_BODY_LIMIT: usize = 500;

/// A cookie-bearing session against the portal, good for one case fetch.
///
/// Created by [`SessionContext::establish`], dropped when the fetch ends.
/// Nothing about it is reused between fetches.
pub struct SessionContext {
    client: Client,
    // Held so the jar outlives every request issued through `client`.
    _cookie_jar: Arc<Jar>,
    /// Percent-decoded value of the `XSRF-TOKEN` cookie.
    pub xsrf_token: String,
    pub user_agent: String,
}

impl SessionContext {
    /// Loads the search landing page once to collect the session cookies, then
    /// pulls the XSRF token out of the jar.
    pub async fn establish(
        config: &ScrapingConfig,
        sink: &dyn DiagnosticSink,
    ) -> Result<Self, ScrapeError> {
        let landing_url = config.search_page_url.as_str();
        let cookie_jar = Arc::new(Jar::default());
        let client = ClientBuilder::new()
            .cookie_provider(Arc::clone(&cookie_jar))
            .user_agent(config.user_agent.as_str())
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ScrapeError::transport(landing_url, e))?;

        info!("Accessing search page to get cookies: {landing_url}");
        let body = fetch_url_body(client.get(landing_url), landing_url).await?;
        sink.capture(Stage::LandingPage, landing_url, &body);

        let xsrf_token = read_xsrf_token(&cookie_jar, &config.search_page_url).ok_or_else(|| {
            ScrapeError::MissingToken {
                url: landing_url.to_string(),
            }
        })?;
        info!("Found '{XSRF_COOKIE}' cookie");

        Ok(Self {
            client,
            _cookie_jar: cookie_jar,
            xsrf_token,
            user_agent: config.user_agent.clone(),
        })
    }

    pub(crate) fn get(&self, url: &str) -> RequestBuilder {
        self.client.get(url)
    }
}

/// Sends `request` and returns its body, turning non-2xx answers into
/// [`ScrapeError::HttpStatus`] with the start of the body attached.
pub(crate) async fn fetch_url_body(
    request: RequestBuilder,
    url: &str,
) -> Result<String, ScrapeError> {
    let response = request
        .send()
        .await
        .map_err(|e| ScrapeError::transport(url, e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ScrapeError::HttpStatus {
            url: url.to_string(),
            status,
            body: body.chars().take(ERROR_BODY_LIMIT).collect(),
        });
    }

    response
        .text()
        .await
        .map_err(|e| ScrapeError::transport(url, e))
}

fn read_xsrf_token(jar: &Jar, url: &Url) -> Option<String> {
    let cookies = jar.cookies(url)?;
    let cookies = cookies.to_str().ok()?;
    let raw = find_cookie(cookies, XSRF_COOKIE)?;
    Some(decode_token(raw))
}

/// Value of `name` in a `Cookie:` header string (`a=1; b=2`).
fn find_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

/// The portal percent-encodes the token in the cookie but expects it decoded
/// in the header.
fn decode_token(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            warn!("'{XSRF_COOKIE}' cookie is not valid percent-encoded UTF-8 ({e}), using it raw");
            raw.to_string()
        }
    }
}
