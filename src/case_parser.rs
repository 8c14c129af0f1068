use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    case_search::RawCaseRecord,
    orders_scraper::Order,
    text_manipulators::{extract_text, find_first_date, get_html_link_to_page, strip_html},
};

/// Placeholder for a field whose markup could not be read.
pub const NOT_FOUND: &str = "Not found";
/// Placeholder for a record without a `cyear`.
pub const NO_YEAR: &str = "N/A";

/// Everything known about one case. Every field is always populated, with
/// placeholders standing in for what the portal did not provide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseDetails {
    pub party_names: String,
    /// Only the registration year is published, shown as `Year: <cyear>`.
    pub filing_date: String,
    pub next_hearing_date: String,
    pub orders_link: String,
    pub orders: Vec<Order>,
}

/// The fields readable straight off a search row, before the orders page is
/// visited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseFields {
    pub party_names: String,
    pub filing_date: String,
    pub next_hearing_date: String,
    pub orders_link: String,
}

impl CaseFields {
    pub fn with_orders(self, orders: Vec<Order>) -> CaseDetails {
        CaseDetails {
            party_names: self.party_names,
            filing_date: self.filing_date,
            next_hearing_date: self.next_hearing_date,
            orders_link: self.orders_link,
            orders,
        }
    }
}

/// Reads each field independently; one field's bad markup never affects
/// another.
pub fn parse_case_fields(record: &RawCaseRecord, base_url: &Url) -> CaseFields {
    CaseFields {
        party_names: party_names(record),
        filing_date: filing_date(record),
        next_hearing_date: next_hearing_date(record),
        orders_link: orders_link(record, base_url),
    }
}

/// `pet` holds the parties as markup, e.g. `<span>A</span><br>VS.<br><span>B</span>`.
fn party_names(record: &RawCaseRecord) -> String {
    record
        .text("pet")
        .map(|pet| strip_html(&pet))
        .filter(|names| !names.is_empty())
        .unwrap_or_else(|| NOT_FOUND.to_string())
}

/// `orderdate` reads like `NEXT DATE: 15/03/2024 ...`; the first date in it wins.
fn next_hearing_date(record: &RawCaseRecord) -> String {
    record
        .text("orderdate")
        .as_deref()
        .and_then(find_first_date)
        .unwrap_or(NOT_FOUND)
        .to_string()
}

/// `ctype` carries the case-type label plus a few links; the one reading
/// `Orders` leads to the orders page.
fn orders_link(record: &RawCaseRecord, base_url: &Url) -> String {
    let Some(ctype) = record.text("ctype") else {
        return NOT_FOUND.to_string();
    };
    let fragment = Html::parse_fragment(&ctype);
    let anchor_selector = Selector::parse("a").unwrap();

    fragment
        .select(&anchor_selector)
        .find(|anchor| extract_text(*anchor) == "Orders")
        .and_then(|anchor| anchor.value().attr("href"))
        .and_then(|href| get_html_link_to_page(base_url, href))
        .unwrap_or_else(|| NOT_FOUND.to_string())
}

fn filing_date(record: &RawCaseRecord) -> String {
    let year = record.text("cyear").unwrap_or_else(|| NO_YEAR.to_string());
    format!("Year: {year}")
}
