use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::{CaseDetails, SearchQuery};

const QUERY_LOGS_UP: &str = include_str!("../sql/QueryLogs/up.sql");
const IN_MEMORY_CAPACITY: usize = 1000;

/// One successful lookup, ready to be appended to the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryLogEntry {
    pub case_type: String,
    pub case_number: String,
    pub case_year: String,
    /// The returned [`CaseDetails`] as a JSON string.
    pub parsed_response_json: String,
}

impl QueryLogEntry {
    pub fn new(query: &SearchQuery, details: &CaseDetails) -> serde_json::Result<Self> {
        Ok(Self {
            case_type: query.case_type.clone(),
            case_number: query.case_number.clone(),
            case_year: query.case_year.clone(),
            parsed_response_json: serde_json::to_string(details)?,
        })
    }
}

/// A stored entry with the id and time the store gave it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryLogRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub entry: QueryLogEntry,
}

/// Append-only history of answered queries.
#[async_trait]
pub trait QueryLog: Send + Sync {
    /// Stores `entry` and returns its id.
    async fn record(&self, entry: &QueryLogEntry) -> anyhow::Result<i64>;
}

pub struct PgQueryLog {
    pool: PgPool,
}

impl PgQueryLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self::new(pool))
    }

    /// Creates the `query_logs` table if it is not there yet.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::raw_sql(QUERY_LOGS_UP).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl QueryLog for PgQueryLog {
    async fn record(&self, entry: &QueryLogEntry) -> anyhow::Result<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO query_logs (case_type, case_number, case_year, parsed_response_json) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(&entry.case_type)
        .bind(&entry.case_number)
        .bind(&entry.case_year)
        .bind(&entry.parsed_response_json)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }
}

/// Process-memory log for development runs without a database and for tests.
///
/// Holds at most `capacity` records; the oldest are dropped first. Ids keep
/// counting up across drops.
pub struct InMemoryQueryLog {
    capacity: usize,
    state: Mutex<InMemoryState>,
}

#[derive(Default)]
struct InMemoryState {
    next_id: i64,
    records: VecDeque<QueryLogRecord>,
}

impl InMemoryQueryLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::default(),
        }
    }

    /// Retained records, oldest first.
    pub fn records(&self) -> Vec<QueryLogRecord> {
        self.lock().records.iter().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, InMemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for InMemoryQueryLog {
    fn default() -> Self {
        Self::with_capacity(IN_MEMORY_CAPACITY)
    }
}

#[async_trait]
impl QueryLog for InMemoryQueryLog {
    async fn record(&self, entry: &QueryLogEntry) -> anyhow::Result<i64> {
        let mut state = self.lock();
        state.next_id += 1;
        let id = state.next_id;
        if state.records.len() == self.capacity {
            state.records.pop_front();
        }
        state.records.push_back(QueryLogRecord {
            id,
            timestamp: Utc::now(),
            entry: entry.clone(),
        });
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details() -> CaseDetails {
        CaseDetails {
            party_names: "John Doe vs State".into(),
            filing_date: "Year: 2023".into(),
            next_hearing_date: "15/03/2024".into(),
            orders_link: "Not found".into(),
            orders: vec![],
        }
    }

    #[test]
    fn entry_carries_query_and_serialized_details() {
        let query = SearchQuery::new("CRL.A.", "100", "2023");
        let entry = QueryLogEntry::new(&query, &details()).unwrap();
        assert_eq!(entry.case_type, "CRL.A.");
        let stored: CaseDetails = serde_json::from_str(&entry.parsed_response_json).unwrap();
        assert_eq!(stored, details());
    }

    #[tokio::test]
    async fn in_memory_log_appends_with_increasing_ids() {
        let log = InMemoryQueryLog::default();
        let first = QueryLogEntry::new(&SearchQuery::new("A", "1", "2020"), &details()).unwrap();
        let second = QueryLogEntry::new(&SearchQuery::new("B", "2", "2021"), &details()).unwrap();

        assert_eq!(log.record(&first).await.unwrap(), 1);
        assert_eq!(log.record(&second).await.unwrap(), 2);

        let records = log.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].entry, first);
        assert_eq!(records[1].entry, second);
        assert!(records[0].timestamp <= records[1].timestamp);
    }

    #[tokio::test]
    async fn in_memory_log_keeps_only_the_newest_records() {
        let log = InMemoryQueryLog::with_capacity(2);
        for case_number in ["1", "2", "3"] {
            let query = SearchQuery::new("W.P.(C)", case_number, "2021");
            log.record(&QueryLogEntry::new(&query, &details()).unwrap())
                .await
                .unwrap();
        }

        let kept: Vec<_> = log
            .records()
            .into_iter()
            .map(|record| (record.id, record.entry.case_number))
            .collect();
        assert_eq!(kept, vec![(2, "2".to_string()), (3, "3".to_string())]);
    }
}
