use std::sync::Arc;

use anyhow::Context;
use court_fetcher::{
    ScrapingContext,
    api::{self, ApiState},
    config::{LoadFromEnv, ServerEnv},
    diagnostics::DumpDirSink,
    query_log::{InMemoryQueryLog, PgQueryLog, QueryLog},
};
use log::{LevelFilter, info, warn};

async fn open_query_log(server_env: &ServerEnv) -> anyhow::Result<Arc<dyn QueryLog>> {
    match &server_env.database_url {
        Some(database_url) => {
            let query_log = PgQueryLog::connect(database_url)
                .await
                .context("failed to connect to the query log database")?;
            query_log
                .migrate()
                .await
                .context("failed to create the query_logs table")?;
            Ok(Arc::new(query_log))
        }
        None => {
            warn!("DATABASE_URL is not set; recent queries are kept in memory only");
            Ok(Arc::new(InMemoryQueryLog::default()))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let server_env = ServerEnv::load_from_env()?;
    let mut scraping = ScrapingContext::new(server_env.scraping_config());
    if let Some(dump_dir) = &server_env.dump_dir {
        info!("Saving fetched pages to {dump_dir}");
        scraping = scraping.with_diagnostics(Arc::new(DumpDirSink::new(dump_dir)));
    }

    let state = Arc::new(ApiState {
        scraping,
        query_log: open_query_log(&server_env).await?,
    });
    api::serve(&server_env.bind_addr, state).await
}
