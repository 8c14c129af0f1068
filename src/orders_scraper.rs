use log::{info, warn};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use crate::{
    case_parser::NOT_FOUND,
    config::ScrapingConfig,
    diagnostics::{DiagnosticSink, Stage},
    requests::{SessionContext, fetch_url_body},
    text_manipulators::extract_stripped_text,
};

/// One downloadable order or judgment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub date: String,
    /// Document link exactly as the orders table gives it.
    pub url: String,
}

/// Follows the orders link of a case and lists its orders in table order.
///
/// Never fails: an unreachable page or a missing table yields no orders, and
/// a placeholder link is not fetched at all.
pub async fn scrape_orders(
    session: &SessionContext,
    config: &ScrapingConfig,
    orders_page_url: &str,
    sink: &dyn DiagnosticSink,
) -> Vec<Order> {
    if orders_page_url.is_empty() || orders_page_url == NOT_FOUND {
        return vec![];
    }

    info!("Scraping individual orders from: {orders_page_url}");
    let html = match fetch_url_body(session.get(orders_page_url), orders_page_url).await {
        Ok(html) => html,
        Err(e) => {
            warn!("Could not scrape orders page: {e}");
            return vec![];
        }
    };
    sink.capture(Stage::OrdersPage, orders_page_url, &html);

    let orders = parse_orders_table(&html, &config.orders_table_id);
    info!("Found {} orders", orders.len());
    orders
}

/// Pulls `(date, link)` pairs out of the body rows of the table with id
/// `table_id`: link from the second cell, date from the third. Rows with
/// fewer than three cells or without a link are skipped.
pub fn parse_orders_table(html: &str, table_id: &str) -> Vec<Order> {
    let document = Html::parse_document(html);
    let Ok(table_selector) = Selector::parse(&format!("table[id=\"{table_id}\"]")) else {
        warn!("Orders table id {table_id:?} does not form a valid selector");
        return vec![];
    };
    let body_selector = Selector::parse("tbody").unwrap();
    let row_selector = Selector::parse("tr").unwrap();
    let link_selector = Selector::parse("a[href]").unwrap();

    let Some(table) = document.select(&table_selector).next() else {
        warn!("Could not find the orders table with id='{table_id}'");
        return vec![];
    };
    let Some(body) = table.select(&body_selector).next() else {
        warn!("Could not find the 'tbody' of the orders table");
        return vec![];
    };

    body.select(&row_selector)
        .filter_map(|row| {
            let cells = cells_of(row);
            if cells.len() <= 2 {
                return None;
            }
            let url = cells[1]
                .select(&link_selector)
                .next()
                .and_then(|link| link.value().attr("href"))?;
            Some(Order {
                date: extract_stripped_text(cells[2]),
                url: url.to_string(),
            })
        })
        .collect()
}

// Direct `td` children only, so a table nested in a cell can't shift columns.
fn cells_of(row: ElementRef) -> Vec<ElementRef> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| cell.value().name() == "td")
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(date: &str, url: &str) -> Order {
        Order {
            date: date.to_string(),
            url: url.to_string(),
        }
    }

    fn orders_page(rows: &str) -> String {
        format!(
            r#"<html><body>
            <table id="otherTable"><tbody>
              <tr><td>1</td><td><a href="https://x/decoy.pdf">decoy</a></td><td>01/01/2000</td></tr>
            </tbody></table>
            <table id="caseTable" aria-describedby="caseTable_info">
              <thead><tr><th>S.No.</th><th>Case No.</th><th>Date</th></tr></thead>
              <tbody>{rows}</tbody>
            </table>
            </body></html>"#
        )
    }

    #[test]
    fn rows_keep_table_order() {
        let html = orders_page(
            r#"<tr><td>1</td><td><a href="https://dhc/r1.pdf">CRL.A. 100/2023</a></td><td> 15/03/2024 </td></tr>
               <tr><td>2</td><td><a href="https://dhc/r2.pdf">CRL.A. 100/2023</a></td><td>10/01/2024</td></tr>
               <tr><td>3</td><td><a href="https://dhc/r3.pdf">CRL.A. 100/2023</a></td><td>05/11/2023</td></tr>"#,
        );
        assert_eq!(
            parse_orders_table(&html, "caseTable"),
            vec![
                order("15/03/2024", "https://dhc/r1.pdf"),
                order("10/01/2024", "https://dhc/r2.pdf"),
                order("05/11/2023", "https://dhc/r3.pdf"),
            ]
        );
    }

    #[test]
    fn short_and_linkless_rows_are_skipped() {
        let html = orders_page(
            r#"<tr><td>1</td><td><a href="https://dhc/r1.pdf">x</a></td></tr>
               <tr><td>2</td><td>no link</td><td>10/01/2024</td></tr>
               <tr><td>3</td><td><a>no href</a></td><td>09/01/2024</td></tr>
               <tr><td colspan="3">No data available in table</td></tr>
               <tr><td>4</td><td><a href="https://dhc/r4.pdf">x</a></td><td>05/11/2023</td></tr>"#,
        );
        assert_eq!(
            parse_orders_table(&html, "caseTable"),
            vec![order("05/11/2023", "https://dhc/r4.pdf")]
        );
    }

    #[test]
    fn href_is_used_verbatim() {
        let html = orders_page(
            r#"<tr><td>1</td><td><a href="/relative/r1.pdf">x</a></td><td>01/02/2024</td></tr>"#,
        );
        assert_eq!(parse_orders_table(&html, "caseTable")[0].url, "/relative/r1.pdf");
    }

    #[test]
    fn date_cell_text_nodes_are_glued() {
        let html = orders_page(
            r#"<tr><td>1</td><td><a href="https://dhc/r1.pdf">x</a></td><td>15/03/2024<span>(F)</span></td></tr>"#,
        );
        assert_eq!(
            parse_orders_table(&html, "caseTable"),
            vec![order("15/03/2024(F)", "https://dhc/r1.pdf")]
        );
    }

    #[test]
    fn missing_table_gives_no_orders() {
        let html = "<html><body><p>Server busy</p></body></html>";
        assert!(parse_orders_table(html, "caseTable").is_empty());
    }

    #[test]
    fn same_page_parses_identically() {
        let html = orders_page(
            r#"<tr><td>1</td><td><a href="https://dhc/r1.pdf">x</a></td><td>01/02/2024</td></tr>"#,
        );
        assert_eq!(
            parse_orders_table(&html, "caseTable"),
            parse_orders_table(&html, "caseTable")
        );
    }
}
