//! Paginated fetcher for the daily statistics endpoint
//!
//! Produces a lazy, ordered sequence of raw records drawn from the `items`
//! field of each page. The bearer token is re-resolved per page request, so
//! an expiry mid-sequence is transparent. A non-2xx response mid-pagination
//! fails the whole invocation; pages already yielded are not rolled back
//! (the warehouse's merge semantics handle replay safety).
//!
//! The sequence is finite and not restartable: once exhausted, a fresh
//! `pages()` call re-fetches from page one.

use crate::config::SourceConfig;
use crate::error::{Error, Result};
use crate::http::{HttpClient, RequestConfig};
use crate::pagination::{OffsetPaginator, PaginationState, Paginator};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Response body field holding the records of a page
pub const ITEMS_FIELD: &str = "items";

/// A single extraction request: study, subject, and date window
#[derive(Debug, Clone)]
pub struct DailyStatisticsRequest {
    /// CentrePoint study id
    pub study_id: u64,
    /// CentrePoint subject id
    pub subject_id: u64,
    /// ISO8601 calendar date, inclusive start
    pub from_date: String,
    /// ISO8601 calendar date, inclusive end
    pub to_date: String,
    /// Optional GUID of the daily statistics settings
    pub daily_statistics_setting_id: Option<String>,
}

impl DailyStatisticsRequest {
    /// Build a request from validated source configuration
    pub fn from_source(source: &SourceConfig) -> Result<Self> {
        source.validate()?;
        Ok(Self {
            study_id: source.study_id(),
            subject_id: source.subject_id(),
            from_date: source.from_date.clone().unwrap_or_default(),
            to_date: source.to_date.clone().unwrap_or_default(),
            daily_statistics_setting_id: source.daily_statistics_setting_id.clone(),
        })
    }

    /// Resource path for this request
    pub fn path(&self) -> String {
        format!(
            "/analytics/v3/Studies/{}/Subjects/{}/DailyStatistics",
            self.study_id, self.subject_id
        )
    }

    /// Fixed query parameters (date window, optional settings id)
    pub fn query_params(&self) -> HashMap<String, String> {
        let mut params = HashMap::new();
        params.insert("fromDate".to_string(), self.from_date.clone());
        params.insert("toDate".to_string(), self.to_date.clone());
        if let Some(id) = &self.daily_statistics_setting_id {
            params.insert("dailyStatisticsSettingId".to_string(), id.clone());
        }
        params
    }
}

/// Fetches daily statistics pages from the API
pub struct DailyStatisticsFetcher {
    client: HttpClient,
    page_limit: u32,
}

impl DailyStatisticsFetcher {
    /// Create a fetcher over an authenticated HTTP client
    pub fn new(client: HttpClient, page_limit: u32) -> Self {
        Self { client, page_limit }
    }

    /// Start a fresh page sequence for the given request
    pub fn pages(&self, request: DailyStatisticsRequest) -> RecordPages<'_> {
        RecordPages {
            client: &self.client,
            paginator: OffsetPaginator::new(self.page_limit),
            state: PaginationState::new(),
            request,
        }
    }
}

/// Lazy page walker; yields the `items` of each page in order
pub struct RecordPages<'a> {
    client: &'a HttpClient,
    request: DailyStatisticsRequest,
    paginator: OffsetPaginator,
    state: PaginationState,
}

impl RecordPages<'_> {
    /// Fetch the next page of records, or `None` when exhausted
    pub async fn next_page(&mut self) -> Result<Option<Vec<Value>>> {
        if self.state.done {
            return Ok(None);
        }

        let mut config = RequestConfig::new();
        for (key, value) in self.request.query_params() {
            config = config.query(key, value);
        }
        for (key, value) in self.paginator.request_params(&self.state) {
            config = config.query(key, value);
        }

        let page_number = self.state.pages + 1;
        let body: Value = match self.client.get_json(&self.request.path(), config).await {
            Ok(body) => body,
            Err(Error::HttpStatus { status, body }) => {
                return Err(Error::ApiRequestFailed {
                    page: page_number,
                    status,
                    body,
                });
            }
            Err(e) => return Err(e),
        };

        let items: Vec<Value> = body
            .get(ITEMS_FIELD)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        debug!(
            "Page {page_number}: {} records (offset {})",
            items.len(),
            self.state.offset
        );

        self.paginator
            .process_response(&body, items.len(), &mut self.state);

        Ok(Some(items))
    }

    /// Drain the whole sequence into one vector, preserving order
    pub async fn collect_all(&mut self) -> Result<Vec<Value>> {
        let mut records = Vec::new();
        while let Some(page) = self.next_page().await? {
            records.extend(page);
        }
        Ok(records)
    }

    /// Current pagination progress
    pub fn state(&self) -> &PaginationState {
        &self.state
    }
}
