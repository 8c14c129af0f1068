use chrono::Utc;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    ScrapeError,
    config::ScrapingConfig,
    diagnostics::{DiagnosticSink, Stage},
    requests::{SessionContext, fetch_url_body},
};

// DataTables paging. Only the first row is ever read.
const DRAW: &str = "2";
const START: &str = "0";
const LENGTH: &str = "50";

/// The three identifiers a case is looked up by, e.g. `W.P.(C)` / `5595` / `2021`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub case_type: String,
    pub case_number: String,
    pub case_year: String,
}

impl SearchQuery {
    pub fn new(
        case_type: impl Into<String>,
        case_number: impl Into<String>,
        case_year: impl Into<String>,
    ) -> Self {
        Self {
            case_type: case_type.into(),
            case_number: case_number.into(),
            case_year: case_year.into(),
        }
    }

    /// Name of the first blank field, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("case_type", &self.case_type),
            ("case_number", &self.case_number),
            ("case_year", &self.case_year),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }
}

/// One row of the search endpoint's `data` array, as the portal sent it.
///
/// Several values are HTML fragments rather than plain text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCaseRecord(Map<String, Value>);

impl RawCaseRecord {
    /// A row counts only if it is a JSON object with at least one field.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) if !fields.is_empty() => Some(Self(fields)),
            _ => None,
        }
    }

    /// String value of `key`; numbers are rendered, anything else is absent.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Option<Vec<Value>>,
}

/// Runs the case-status search and returns the first matching row.
///
/// `Ok(None)` means the portal answered and had no such case.
pub async fn search_case(
    session: &SessionContext,
    config: &ScrapingConfig,
    query: &SearchQuery,
    sink: &dyn DiagnosticSink,
) -> Result<Option<RawCaseRecord>, ScrapeError> {
    let url = config.search_page_url.as_str();
    let cache_buster = Utc::now().timestamp_millis().to_string();
    let params = search_params(query, &cache_buster);

    info!("Sending search request to: {url}");
    let request = session
        .get(url)
        .query(&params)
        .header("Referer", url)
        .header("X-XSRF-TOKEN", session.xsrf_token.as_str())
        .header("X-Requested-With", "XMLHttpRequest");
    let body = fetch_url_body(request, url).await?;
    sink.capture(Stage::Search, url, &body);

    first_record(&body).map_err(|source| ScrapeError::Decode {
        url: url.to_string(),
        source,
    })
}

fn search_params<'a>(
    query: &'a SearchQuery,
    cache_buster: &'a str,
) -> [(&'static str, &'a str); 9] {
    [
        ("draw", DRAW),
        ("start", START),
        ("length", LENGTH),
        ("search[value]", ""),
        ("search[regex]", "false"),
        ("case_type", query.case_type.as_str()),
        ("case_number", query.case_number.as_str()),
        ("case_year", query.case_year.as_str()),
        ("_", cache_buster),
    ]
}

/// The first row of `data`. An empty, `null` or non-object first row is the
/// same as no rows at all.
fn first_record(body: &str) -> Result<Option<RawCaseRecord>, serde_json::Error> {
    let response: SearchResponse = serde_json::from_str(body)?;
    let rows = response.data.unwrap_or_default();
    debug!("Search returned {} row(s)", rows.len());
    Ok(rows.into_iter().next().and_then(RawCaseRecord::from_value))
}
