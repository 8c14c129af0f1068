mod case_fetcher;
mod scrape_error;
mod scraping_context;
mod text_manipulators;

pub mod api;
pub mod case_parser;
pub mod case_search;
pub mod config;
pub mod diagnostics;
pub mod orders_scraper;
pub mod query_log;
pub mod requests;

pub use case_fetcher::{fetch_case_details, try_fetch_case_details};
pub use case_parser::{CaseDetails, NOT_FOUND};
pub use case_search::{RawCaseRecord, SearchQuery};
pub use config::ScrapingConfig;
pub use orders_scraper::Order;
pub use scrape_error::ScrapeError;
pub use scraping_context::ScrapingContext;
