use log::{error, info, warn};

use crate::{
    CaseDetails, ScrapeError, ScrapingContext, SearchQuery,
    case_parser::parse_case_fields,
    case_search::search_case,
    orders_scraper::scrape_orders,
    requests::SessionContext,
};

/// Looks a case up on the portal and returns everything that could be read
/// about it.
///
/// `None` covers every way the lookup can come up empty: the site was
/// unreachable, it handed out no XSRF token, or it has no such case. The
/// causes are told apart in the logs only.
pub async fn fetch_case_details(
    context: &ScrapingContext,
    query: &SearchQuery,
) -> Option<CaseDetails> {
    info!(
        "Fetching case {} {}/{}",
        query.case_type, query.case_number, query.case_year
    );
    match try_fetch_case_details(context, query).await {
        Ok(Some(details)) => Some(details),
        Ok(None) => {
            info!("No case data found in the response");
            None
        }
        Err(e @ ScrapeError::MissingToken { .. }) => {
            error!("Handshake incomplete: {e}");
            None
        }
        Err(e) => {
            warn!("Case fetch aborted: {e}");
            None
        }
    }
}

/// The pipeline with its abort reasons intact. `Ok(None)` is a search that
/// matched nothing.
pub async fn try_fetch_case_details(
    context: &ScrapingContext,
    query: &SearchQuery,
) -> Result<Option<CaseDetails>, ScrapeError> {
    let config = &context.scraping_config;
    let sink = context.diagnostics.as_ref();

    let session = SessionContext::establish(config, sink).await?;
    let Some(record) = search_case(&session, config, query, sink).await? else {
        return Ok(None);
    };

    let fields = parse_case_fields(&record, &config.base_url);
    let orders = scrape_orders(&session, config, &fields.orders_link, sink).await;
    Ok(Some(fields.with_orders(orders)))
}
