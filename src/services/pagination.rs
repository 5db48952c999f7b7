//! Filtered pagination over the document store.
//!
//! The store cannot order by one field while filtering on another without a
//! composite index. Lists with equality filters therefore fetch a bounded,
//! unordered window and sort it in memory; see [`PaginationStrategy`].

use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;

use crate::config::PaginationConfig;
use crate::database::models::timestamp;
use crate::database::{Document, DocumentStore, StoreError};
use crate::filter::path::lookup;
use crate::filter::{Filter, FilterError, FilterOrderInfo, SortDirection};

#[derive(Debug, thiserror::Error)]
pub enum PaginationError {
    #[error("Invalid {name} parameter '{value}': must be a positive integer")]
    InvalidParameter { name: &'static str, value: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<FilterError> for PaginationError {
    fn from(err: FilterError) -> Self {
        PaginationError::Store(err.into())
    }
}

/// Bounds for the in-memory sorting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowConfig {
    pub cap: usize,
    pub slack: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self { cap: 500, slack: 50 }
    }
}

impl WindowConfig {
    pub fn from_config(config: &PaginationConfig) -> Self {
        Self {
            cap: config.window_cap,
            slack: config.window_slack,
        }
    }

    /// `min(limit * page + slack, cap)`
    pub fn window(&self, page: &PageRequest) -> usize {
        page.limit
            .saturating_mul(page.page)
            .saturating_add(self.slack)
            .min(self.cap)
    }
}

/// Validated `page`/`limit` pair. Both are 1-based positive integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub limit: usize,
}

impl PageRequest {
    pub fn new(page: usize, limit: usize) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    /// Parses raw query values. Absent values take the defaults; anything
    /// that is not a positive integer is rejected; `limit` is clamped to
    /// `max_limit`. A page whose offset does not fit a signed 64-bit SQL
    /// parameter is rejected.
    pub fn parse(
        page: Option<&str>,
        limit: Option<&str>,
        default_limit: usize,
        max_limit: usize,
    ) -> Result<Self, PaginationError> {
        let raw_page = page;
        let page = parse_positive("page", page)?.unwrap_or(1);
        let limit = parse_positive("limit", limit)?
            .unwrap_or(default_limit)
            .min(max_limit.max(1));

        let offset = (page - 1).checked_mul(limit).and_then(|o| i64::try_from(o).ok());
        if offset.is_none() {
            return Err(PaginationError::InvalidParameter {
                name: "page",
                value: raw_page.unwrap_or_default().to_string(),
            });
        }
        Ok(Self { page, limit })
    }

    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.limit)
    }
}

fn parse_positive(name: &'static str, raw: Option<&str>) -> Result<Option<usize>, PaginationError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match raw.trim().parse::<usize>() {
        Ok(value) if value >= 1 => Ok(Some(value)),
        _ => Err(PaginationError::InvalidParameter {
            name,
            value: raw.to_string(),
        }),
    }
}

/// Case-insensitive "starts with" search on a lower-cased shadow field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSearch {
    pub field: String,
    pub prefix: String,
}

impl TextSearch {
    /// `None` when the raw term is blank.
    pub fn new(field: impl Into<String>, raw: &str) -> Option<Self> {
        let prefix = raw.trim().to_lowercase();
        if prefix.is_empty() {
            return None;
        }
        Some(Self {
            field: field.into(),
            prefix,
        })
    }
}

/// One list request against a collection.
#[derive(Debug, Clone)]
pub struct ListQuery {
    pub collection: String,
    pub equality_filters: Vec<(String, Value)>,
    pub text_search: Option<TextSearch>,
    pub sort: FilterOrderInfo,
    pub page: PageRequest,
}

impl ListQuery {
    pub fn new(collection: impl Into<String>, sort_field: impl Into<String>, page: PageRequest) -> Self {
        Self {
            collection: collection.into(),
            equality_filters: vec![],
            text_search: None,
            sort: FilterOrderInfo {
                field: sort_field.into(),
                sort: SortDirection::Asc,
            },
            page,
        }
    }

    pub fn sort_direction(mut self, sort: SortDirection) -> Self {
        self.sort.sort = sort;
        self
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: Value) -> Self {
        self.equality_filters.push((field.into(), value));
        self
    }

    /// Adds an equality filter only when a value is present.
    pub fn where_eq_opt(self, field: impl Into<String>, value: Option<&str>) -> Self {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(value) => self.where_eq(field, Value::String(value.to_string())),
            None => self,
        }
    }

    pub fn search(mut self, search: Option<TextSearch>) -> Self {
        self.text_search = search;
        self
    }

    /// Equality filters plus the search range; no order or paging.
    fn base_filter(&self) -> Result<Filter, FilterError> {
        let mut filter = Filter::new(self.collection.as_str())?;
        for (field, value) in &self.equality_filters {
            filter.where_eq(field, value.clone())?;
        }
        if let Some(search) = &self.text_search {
            filter.where_prefix(&search.field, &search.prefix)?;
        }
        Ok(filter)
    }
}

/// How a list query is evaluated against the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationStrategy {
    /// Search present: range on the search field, natively ordered by it.
    PrefixRange,
    /// No filters and no search: natively ordered by the sort field.
    NativeOrdered,
    /// Equality filters only: fetch `window` unordered records, sort and
    /// slice in memory. Pages past the window come back short or empty.
    BoundedWindow { window: usize },
}

impl PaginationStrategy {
    pub fn select(query: &ListQuery, window: &WindowConfig) -> Self {
        if query.text_search.is_some() {
            PaginationStrategy::PrefixRange
        } else if query.equality_filters.is_empty() {
            PaginationStrategy::NativeOrdered
        } else {
            PaginationStrategy::BoundedWindow {
                window: window.window(&query.page),
            }
        }
    }
}

/// Pagination metadata returned alongside list data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(page: &PageRequest, total: u64) -> Self {
        let limit = page.limit as u64;
        Self {
            page: page.page,
            limit: page.limit,
            total,
            total_pages: total.div_ceil(limit),
            has_next: (page.page as u64).saturating_mul(limit) < total,
            has_prev: page.page > 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: PageRequest,
}

impl<T> Page<T> {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(&self.page, self.total)
    }

    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        Ok(Page {
            items: self.items.into_iter().map(f).collect::<Result<_, _>>()?,
            total: self.total,
            page: self.page,
        })
    }
}

/// Evaluates [`ListQuery`] values against a store.
#[derive(Clone)]
pub struct PaginationEngine {
    store: Arc<dyn DocumentStore>,
    window: WindowConfig,
    debug_logging: bool,
}

impl PaginationEngine {
    pub fn new(store: Arc<dyn DocumentStore>, window: WindowConfig) -> Self {
        Self {
            store,
            window,
            debug_logging: false,
        }
    }

    pub fn with_debug_logging(mut self, enabled: bool) -> Self {
        self.debug_logging = enabled;
        self
    }

    pub fn window_config(&self) -> WindowConfig {
        self.window
    }

    pub async fn fetch(&self, query: &ListQuery) -> Result<Page<Document>, PaginationError> {
        let strategy = PaginationStrategy::select(query, &self.window);
        let base = query.base_filter()?;
        let total = self.store.count(&base).await?;

        let offset = query.page.offset();
        let limit = query.page.limit;

        let items = match strategy {
            PaginationStrategy::PrefixRange => {
                let mut filter = base;
                if let Some(search) = &query.text_search {
                    filter.order(&search.field, SortDirection::Asc)?;
                }
                filter.offset(offset).limit(limit);
                self.store.query(&filter).await?
            }
            PaginationStrategy::NativeOrdered => {
                let mut filter = base;
                filter.order(&query.sort.field, query.sort.sort)?.offset(offset).limit(limit);
                self.store.query(&filter).await?
            }
            PaginationStrategy::BoundedWindow { window } => {
                let mut filter = base;
                filter.limit(window);
                let mut documents = self.store.query(&filter).await?;
                sort_window(&mut documents, &query.sort);
                documents.into_iter().skip(offset).take(limit).collect()
            }
        };

        if self.debug_logging {
            debug!(
                "Paginated {} with {:?}: page={} limit={} returned={} total={}",
                query.collection,
                strategy,
                query.page.page,
                limit,
                items.len(),
                total
            );
        }

        Ok(Page {
            items,
            total,
            page: query.page,
        })
    }
}

/// In-memory sort key. Timestamps compare chronologically; anything missing
/// or unparseable is the minimum.
fn sort_key(document: &Document, field: &str) -> Option<f64> {
    match lookup(&document.data, field)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => timestamp::parse_millis(s).map(|ms| ms as f64),
        _ => None,
    }
}

/// Stable: equal keys keep their fetch order.
fn sort_window(documents: &mut [Document], order: &FilterOrderInfo) {
    documents.sort_by(|a, b| {
        let ordering = compare_keys(sort_key(a, &order.field), sort_key(b, &order.field));
        match order.sort {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

fn compare_keys(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use serde_json::json;

    async fn store_with(docs: Vec<(&str, Value)>) -> Arc<dyn DocumentStore> {
        let store = MemoryStore::new();
        for (id, data) in docs {
            store.insert("events", Document::new(id, data)).await.unwrap();
        }
        Arc::new(store)
    }

    fn ids(page: &Page<Document>) -> Vec<&str> {
        page.items.iter().map(|d| d.id.as_str()).collect()
    }

    #[test]
    fn parses_and_validates_page_params() {
        assert_eq!(PageRequest::parse(None, None, 50, 100).unwrap(), PageRequest { page: 1, limit: 50 });
        assert_eq!(PageRequest::parse(Some("3"), Some("500"), 50, 100).unwrap(), PageRequest { page: 3, limit: 100 });
        for bad in ["0", "-1", "abc", "1.5", ""] {
            assert!(PageRequest::parse(Some(bad), None, 50, 100).is_err(), "page={}", bad);
            assert!(PageRequest::parse(None, Some(bad), 50, 100).is_err(), "limit={}", bad);
        }
    }

    #[test]
    fn rejects_pages_past_the_addressable_offset() {
        let err = PageRequest::parse(Some("18446744073709551615"), Some("50"), 50, 100).unwrap_err();
        assert!(matches!(err, PaginationError::InvalidParameter { name: "page", .. }));
        assert!(PageRequest::parse(Some("200000000000000000"), None, 50, 100).is_err());

        let deep = PageRequest::parse(Some("1000000"), Some("100"), 50, 100).unwrap();
        assert_eq!(deep.offset(), 99_999_900);
    }

    #[test]
    fn selects_strategy_from_query_shape() {
        let window = WindowConfig::default();
        let page = PageRequest::new(2, 20);
        let plain = ListQuery::new("events", "startDate", page);
        assert_eq!(PaginationStrategy::select(&plain, &window), PaginationStrategy::NativeOrdered);

        let filtered = plain.clone().where_eq("status", json!("upcoming"));
        assert_eq!(
            PaginationStrategy::select(&filtered, &window),
            PaginationStrategy::BoundedWindow { window: 90 }
        );

        let searched = filtered.search(TextSearch::new("titleLower", " Rust "));
        assert_eq!(PaginationStrategy::select(&searched, &window), PaginationStrategy::PrefixRange);
    }

    #[test]
    fn window_is_capped() {
        let window = WindowConfig { cap: 500, slack: 50 };
        assert_eq!(window.window(&PageRequest::new(1, 10)), 60);
        assert_eq!(window.window(&PageRequest::new(10, 100)), 500);
    }

    #[test]
    fn blank_search_is_ignored() {
        assert_eq!(TextSearch::new("titleLower", "   "), None);
        assert_eq!(TextSearch::new("titleLower", " RuSt ").unwrap().prefix, "rust");
    }

    #[test]
    fn pagination_metadata() {
        let meta = Pagination::new(&PageRequest::new(2, 10), 25);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next);
        assert!(meta.has_prev);

        let empty = Pagination::new(&PageRequest::new(1, 10), 0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next);
        assert!(!empty.has_prev);
    }

    #[tokio::test]
    async fn unfiltered_pages_follow_start_date() {
        let store = store_with(vec![
            ("a", json!({ "startDate": "2024-01-01T00:00:00.000Z" })),
            ("b", json!({ "startDate": "2024-03-01T00:00:00.000Z" })),
            ("c", json!({ "startDate": "2024-02-01T00:00:00.000Z" })),
        ])
        .await;
        let engine = PaginationEngine::new(store, WindowConfig::default());

        let first = engine.fetch(&ListQuery::new("events", "startDate", PageRequest::new(1, 2))).await.unwrap();
        assert_eq!(ids(&first), vec!["a", "c"]);
        assert_eq!(first.total, 3);

        let second = engine.fetch(&ListQuery::new("events", "startDate", PageRequest::new(2, 2))).await.unwrap();
        assert_eq!(ids(&second), vec!["b"]);
    }

    #[tokio::test]
    async fn concatenated_pages_cover_collection_once() {
        let mut docs = Vec::new();
        let names: Vec<String> = (0..17).map(|i| format!("e{:02}", i)).collect();
        for (i, name) in names.iter().enumerate() {
            // Reverse date order relative to id order
            let day = 28 - i;
            docs.push((name.as_str(), json!({ "startDate": format!("2024-02-{:02}T00:00:00.000Z", day) })));
        }
        let engine = PaginationEngine::new(store_with(docs).await, WindowConfig::default());

        for limit in [1, 3, 5, 17, 20] {
            let mut seen = Vec::new();
            let mut page = 1;
            loop {
                let query = ListQuery::new("events", "startDate", PageRequest::new(page, limit));
                let result = engine.fetch(&query).await.unwrap();
                if result.items.is_empty() {
                    break;
                }
                seen.extend(result.items.into_iter().map(|d| d.id));
                page += 1;
            }
            let mut expected: Vec<String> = names.clone();
            expected.reverse();
            assert_eq!(seen, expected, "limit={}", limit);
        }
    }

    #[tokio::test]
    async fn filtered_total_ignores_paging() {
        let mut docs = Vec::new();
        let names: Vec<String> = (0..12).map(|i| format!("e{:02}", i)).collect();
        for (i, name) in names.iter().enumerate() {
            let status = if i % 3 == 0 { "cancelled" } else { "upcoming" };
            docs.push((name.as_str(), json!({ "status": status, "startDate": "2024-01-01T00:00:00.000Z" })));
        }
        let engine = PaginationEngine::new(store_with(docs).await, WindowConfig::default());

        for (page, limit) in [(1, 1), (2, 3), (5, 2), (40, 5)] {
            let query = ListQuery::new("events", "startDate", PageRequest::new(page, limit))
                .where_eq("status", json!("upcoming"));
            assert_eq!(engine.fetch(&query).await.unwrap().total, 8);
        }
    }

    #[tokio::test]
    async fn bounded_window_sorts_in_memory_with_missing_dates_first() {
        let store = store_with(vec![
            ("a", json!({ "status": "upcoming", "startDate": "2024-05-01T00:00:00.000Z" })),
            ("b", json!({ "status": "upcoming" })),
            ("c", json!({ "status": "upcoming", "startDate": "2024-01-01" })),
            ("d", json!({ "status": "completed", "startDate": "2023-01-01T00:00:00.000Z" })),
            ("e", json!({ "status": "upcoming", "startDate": "not a date" })),
        ])
        .await;
        let engine = PaginationEngine::new(store, WindowConfig::default());

        let query = ListQuery::new("events", "startDate", PageRequest::new(1, 10)).where_eq("status", json!("upcoming"));
        let page = engine.fetch(&query).await.unwrap();
        assert_eq!(ids(&page), vec!["b", "e", "c", "a"]);
        assert_eq!(page.total, 4);
    }

    #[tokio::test]
    async fn pages_past_the_window_come_back_short() {
        let mut docs = Vec::new();
        let names: Vec<String> = (0..10).map(|i| format!("e{:02}", i)).collect();
        for name in &names {
            docs.push((name.as_str(), json!({ "status": "upcoming", "startDate": "2024-01-01T00:00:00.000Z" })));
        }
        let engine = PaginationEngine::new(store_with(docs).await, WindowConfig { cap: 4, slack: 0 });

        let query = ListQuery::new("events", "startDate", PageRequest::new(2, 3)).where_eq("status", json!("upcoming"));
        let page = engine.fetch(&query).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total, 10);
    }

    #[tokio::test]
    async fn prefix_search_returns_matching_titles_in_order() {
        let store = store_with(vec![
            ("a", json!({ "titleLower": "rust workshop", "startDate": "2024-01-01T00:00:00.000Z" })),
            ("b", json!({ "titleLower": "go meetup", "startDate": "2024-01-02T00:00:00.000Z" })),
            ("c", json!({ "titleLower": "rust 101", "startDate": "2024-01-03T00:00:00.000Z" })),
            ("d", json!({ "titleLower": "rusty tools", "startDate": "2024-01-04T00:00:00.000Z" })),
            ("e", json!({ "titleLower": "trust issues", "startDate": "2024-01-05T00:00:00.000Z" })),
        ])
        .await;
        let engine = PaginationEngine::new(store, WindowConfig::default());

        let query = ListQuery::new("events", "startDate", PageRequest::new(1, 10))
            .search(TextSearch::new("titleLower", "RUST"));
        let page = engine.fetch(&query).await.unwrap();
        assert_eq!(ids(&page), vec!["c", "a", "d"]);
        assert_eq!(page.total, 3);
    }

    #[tokio::test]
    async fn descending_sort_for_filtered_lists() {
        let store = store_with(vec![
            ("a", json!({ "role": "student", "createdAt": "2024-01-01T00:00:00.000Z" })),
            ("b", json!({ "role": "student", "createdAt": "2024-03-01T00:00:00.000Z" })),
            ("c", json!({ "role": "admin", "createdAt": "2024-04-01T00:00:00.000Z" })),
        ])
        .await;
        let engine = PaginationEngine::new(store, WindowConfig::default());

        let query = ListQuery::new("events", "createdAt", PageRequest::new(1, 10))
            .sort_direction(SortDirection::Desc)
            .where_eq_opt("role", Some("student"));
        assert_eq!(ids(&engine.fetch(&query).await.unwrap()), vec!["b", "a"]);
    }
}
