#![allow(dead_code)]

use court_fetcher::{ScrapingConfig, ScrapingContext, SearchQuery};
use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, Request, ResponseTemplate,
    matchers::{header, header_exists, method, path, query_param, query_param_is_missing},
};

pub const SEARCH_PATH: &str = "/app/get-case-type-status";
pub const ORDERS_PATH: &str = "/app/case-orders/123";
pub const ENCODED_TOKEN: &str = "eyJpdiI6IkFCQyJ9%3D%3D";
pub const DECODED_TOKEN: &str = "eyJpdiI6IkFCQyJ9==";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn context_for(server: &MockServer) -> ScrapingContext {
    ScrapingContext::new(ScrapingConfig::for_base_url(&server.uri()).unwrap())
}

/// Landing page that sets the session cookies, token included.
pub async fn mount_landing_page(server: &MockServer) {
    let token_cookie = format!("XSRF-TOKEN={ENCODED_TOKEN}; Path=/");
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param_is_missing("draw"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("set-cookie", token_cookie.as_str())
                .append_header("set-cookie", "dhc_session=s3ss10n; Path=/; HttpOnly")
                .set_body_string("<html><body><form id=\"search\"></form></body></html>"),
        )
        .expect(1)
        .mount(server)
        .await;
}

/// Search endpoint answering the DataTables query for `query` with `rows`.
pub async fn mount_search(server: &MockServer, query: &SearchQuery, rows: Value) {
    let referer = format!("{}{SEARCH_PATH}", server.uri());
    let total = rows.as_array().map_or(0, Vec::len);
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("draw", "2"))
        .and(query_param("start", "0"))
        .and(query_param("length", "50"))
        .and(query_param("search[value]", ""))
        .and(query_param("search[regex]", "false"))
        .and(query_param("case_type", query.case_type.as_str()))
        .and(query_param("case_number", query.case_number.as_str()))
        .and(query_param("case_year", query.case_year.as_str()))
        .and(|request: &Request| {
            request
                .url
                .query_pairs()
                .any(|(key, value)| key == "_" && value.parse::<i64>().is_ok_and(|ms| ms > 0))
        })
        .and(header("X-XSRF-TOKEN", DECODED_TOKEN))
        .and(header("X-Requested-With", "XMLHttpRequest"))
        .and(header_exists("cookie"))
        .and(header("Referer", referer.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "draw": 2,
            "recordsTotal": total,
            "recordsFiltered": total,
            "data": rows,
        })))
        .expect(1)
        .mount(server)
        .await;
}

pub fn case_record(ctype: &str) -> Value {
    json!({
        "DT_RowIndex": 1,
        "pet": "<span>John Doe vs State</span>",
        "orderdate": "Next date 15/03/2024",
        "ctype": ctype,
        "cyear": "2023",
    })
}

pub fn orders_page() -> String {
    r#"<html><body>
    <table id="caseTable" class="table" aria-describedby="caseTable_info">
      <thead><tr><th>S.No.</th><th>Case No./Order Link</th><th>Date of Order</th></tr></thead>
      <tbody>
        <tr><td>1</td><td><a href="https://delhihighcourt.nic.in/app/showlogo/r1.pdf">CRL.A. 100/2023</a></td><td>15/03/2024</td></tr>
        <tr><td>2</td><td>pending upload</td></tr>
        <tr><td>3</td><td><a href="https://delhihighcourt.nic.in/app/showlogo/r3.pdf">CRL.A. 100/2023</a></td><td>10/01/2024</td></tr>
      </tbody>
    </table>
    </body></html>"#
        .to_string()
}
