//! Mock CRM source
//!
//! In-memory pages and label payloads with failure injection, for tests
//! without network access.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use contracts::{
    ContractError, CrmSource, Deal, DealPage, DealSearchRequest, PipelineStages, PropertyOption,
};
use tracing::trace;

/// In-memory `CrmSource`
///
/// Pages are keyed by the `after` cursor that requests them. A cursor with
/// no registered page yields an empty page.
#[derive(Debug, Default)]
pub struct MockCrmSource {
    pipelines: Vec<PipelineStages>,
    options: HashMap<String, Vec<PropertyOption>>,
    pages: HashMap<Option<String>, DealPage>,
    fail_pipelines: bool,
    fail_options: bool,
    fail_search_on: Option<usize>,
    search_calls: AtomicUsize,
    requests: Mutex<Vec<DealSearchRequest>>,
}

impl MockCrmSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pipelines returned by `fetch_pipelines`
    pub fn with_pipelines(mut self, pipelines: Vec<PipelineStages>) -> Self {
        self.pipelines = pipelines;
        self
    }

    /// Options returned for `property`
    pub fn with_property_options(
        mut self,
        property: impl Into<String>,
        options: Vec<PropertyOption>,
    ) -> Self {
        self.options.insert(property.into(), options);
        self
    }

    /// Chain of pages linked by cursors "1", "2", ...; the last page has no cursor
    pub fn with_pages(mut self, pages: Vec<Vec<Deal>>) -> Self {
        let count = pages.len();
        for (idx, results) in pages.into_iter().enumerate() {
            let key = (idx > 0).then(|| idx.to_string());
            let next_after = (idx + 1 < count).then(|| (idx + 1).to_string());
            self.pages.insert(key, DealPage { results, next_after });
        }
        self
    }

    /// Single page served for the given cursor
    pub fn with_page(mut self, after: Option<&str>, page: DealPage) -> Self {
        self.pages.insert(after.map(str::to_string), page);
        self
    }

    /// Make `fetch_pipelines` fail
    pub fn fail_pipelines(mut self) -> Self {
        self.fail_pipelines = true;
        self
    }

    /// Make `fetch_property_options` fail
    pub fn fail_property_options(mut self) -> Self {
        self.fail_options = true;
        self
    }

    /// Make the `n`-th search call (1-based) fail
    pub fn fail_search_on_page(mut self, n: usize) -> Self {
        self.fail_search_on = Some(n);
        self
    }

    /// Number of search calls received
    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    /// Search requests received, in order
    pub fn search_requests(&self) -> Vec<DealSearchRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl CrmSource for MockCrmSource {
    async fn fetch_pipelines(&self) -> Result<Vec<PipelineStages>, ContractError> {
        if self.fail_pipelines {
            return Err(ContractError::crm_request(
                "/crm/v3/pipelines/deals",
                Some(500),
                "injected failure",
            ));
        }
        Ok(self.pipelines.clone())
    }

    async fn fetch_property_options(
        &self,
        property: &str,
    ) -> Result<Vec<PropertyOption>, ContractError> {
        if self.fail_options {
            return Err(ContractError::crm_request(
                format!("/crm/v3/properties/deals/{property}"),
                Some(404),
                "injected failure",
            ));
        }
        Ok(self.options.get(property).cloned().unwrap_or_default())
    }

    async fn search_deals(&self, request: &DealSearchRequest) -> Result<DealPage, ContractError> {
        let call = self.search_calls.fetch_add(1, Ordering::SeqCst) + 1;
        match self.requests.lock() {
            Ok(mut requests) => requests.push(request.clone()),
            Err(poisoned) => poisoned.into_inner().push(request.clone()),
        }
        trace!(call, after = ?request.after, "mock search");

        if self.fail_search_on == Some(call) {
            return Err(ContractError::crm_request(
                "/crm/v3/objects/deals/search",
                Some(429),
                "injected failure",
            ));
        }

        Ok(self.pages.get(&request.after).cloned().unwrap_or_default())
    }
}
