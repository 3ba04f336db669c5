//! Pagination
//!
//! The daily statistics endpoint pages with `limit`/`offset` query parameters
//! and reports a `totalCount` in each response body. The paginator walks that
//! continuation until the API signals no more pages, falling back to an
//! empty-page stop when `totalCount` is absent.
//!
//! Pagination state lives only for one invocation. There is no persisted
//! cursor across restarts; a rerun fetches from page one and relies on the
//! warehouse's merge-by-key semantics for replay safety.

use serde_json::Value;
use std::collections::HashMap;

/// Result of the next page computation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    /// More pages available with these query parameters
    Continue {
        /// Query parameters to add/replace
        query_params: HashMap<String, String>,
    },
    /// No more pages
    Done,
}

impl NextPage {
    /// Create a continuation with query parameters
    pub fn with_params(params: HashMap<String, String>) -> Self {
        Self::Continue {
            query_params: params,
        }
    }

    /// Check if this is a done result
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

/// Tracks pagination progress during one invocation
#[derive(Debug, Clone, Default)]
pub struct PaginationState {
    /// Current offset
    pub offset: u64,
    /// Pages fetched so far
    pub pages: u32,
    /// Total records fetched so far
    pub total_fetched: u64,
    /// Is pagination complete?
    pub done: bool,
}

impl PaginationState {
    /// Create a new pagination state
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark pagination as complete
    pub fn mark_done(&mut self) {
        self.done = true;
    }

    /// Record a fetched page of `count` records
    pub fn add_page(&mut self, count: u64) {
        self.pages += 1;
        self.total_fetched += count;
    }
}

/// Core trait for pagination strategies
pub trait Paginator: Send + Sync {
    /// Query parameters for the next request
    fn request_params(&self, state: &PaginationState) -> HashMap<String, String>;

    /// Process a response body and decide whether there is a next page
    fn process_response(
        &self,
        body: &Value,
        records_count: usize,
        state: &mut PaginationState,
    ) -> NextPage;
}

/// Offset/limit pagination with a `totalCount` stop condition
#[derive(Debug, Clone)]
pub struct OffsetPaginator {
    /// Query parameter name for offset
    pub offset_param: String,
    /// Query parameter name for limit
    pub limit_param: String,
    /// Number of records requested per page
    pub limit_value: u32,
    /// Response body field holding the total record count
    pub total_count_field: String,
}

impl OffsetPaginator {
    /// Create an offset paginator with the CentrePoint parameter names
    pub fn new(limit_value: u32) -> Self {
        Self {
            offset_param: "offset".to_string(),
            limit_param: "limit".to_string(),
            limit_value,
            total_count_field: "totalCount".to_string(),
        }
    }

    fn params_at(&self, offset: u64) -> HashMap<String, String> {
        let mut params = HashMap::new();
        params.insert(self.offset_param.clone(), offset.to_string());
        params.insert(self.limit_param.clone(), self.limit_value.to_string());
        params
    }
}

impl Paginator for OffsetPaginator {
    fn request_params(&self, state: &PaginationState) -> HashMap<String, String> {
        self.params_at(state.offset)
    }

    fn process_response(
        &self,
        body: &Value,
        records_count: usize,
        state: &mut PaginationState,
    ) -> NextPage {
        state.add_page(records_count as u64);
        state.offset += records_count as u64;

        if records_count == 0 {
            state.mark_done();
            return NextPage::Done;
        }

        // Stop on totalCount when the API reports one
        if let Some(total) = body.get(&self.total_count_field).and_then(Value::as_u64) {
            if state.total_fetched >= total {
                state.mark_done();
                return NextPage::Done;
            }
        } else if records_count < self.limit_value as usize {
            // No totalCount: a short page means we are done
            state.mark_done();
            return NextPage::Done;
        }

        NextPage::with_params(self.params_at(state.offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_initial_params() {
        let paginator = OffsetPaginator::new(50);
        let params = paginator.request_params(&PaginationState::new());
        assert_eq!(params.get("offset"), Some(&"0".to_string()));
        assert_eq!(params.get("limit"), Some(&"50".to_string()));
    }

    #[test]
    fn test_continues_until_total_count_reached() {
        let paginator = OffsetPaginator::new(2);
        let mut state = PaginationState::new();

        let body = json!({ "totalCount": 3, "items": [{}, {}] });
        let next = paginator.process_response(&body, 2, &mut state);
        assert!(!next.is_done());
        if let NextPage::Continue { query_params } = &next {
            assert_eq!(query_params.get("offset"), Some(&"2".to_string()));
        }

        let body = json!({ "totalCount": 3, "items": [{}] });
        let next = paginator.process_response(&body, 1, &mut state);
        assert!(next.is_done());
        assert!(state.done);
        assert_eq!(state.total_fetched, 3);
        assert_eq!(state.pages, 2);
    }

    #[test]
    fn test_empty_page_stops() {
        let paginator = OffsetPaginator::new(10);
        let mut state = PaginationState::new();

        let body = json!({ "items": [] });
        let next = paginator.process_response(&body, 0, &mut state);
        assert!(next.is_done());
    }

    #[test]
    fn test_short_page_stops_without_total_count() {
        let paginator = OffsetPaginator::new(10);
        let mut state = PaginationState::new();

        let body = json!({ "items": [{}, {}, {}] });
        let next = paginator.process_response(&body, 3, &mut state);
        assert!(next.is_done());
    }

    #[test]
    fn test_full_page_continues_without_total_count() {
        let paginator = OffsetPaginator::new(2);
        let mut state = PaginationState::new();

        let body = json!({ "items": [{}, {}] });
        let next = paginator.process_response(&body, 2, &mut state);
        assert!(!next.is_done());
    }
}
