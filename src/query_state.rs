//! Filter state of a listing page (category, search text, page) and its
//! two-way binding to the URL query string.
//!
//! The URL is the source of truth: state is always parsed from it on mount
//! and on history navigation, and every user change is written back with a
//! history *replace*, so filter changes never add back-button entries.
//! Parameters equal to their default are left out of the URL.

use crate::api::ListParams;
use crate::models::Category;
use serde::Serialize;
use std::borrow::Cow;

pub const ITEMS_PER_PAGE: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct QueryState {
    /// Category id, or `"all"`.
    pub category: String,
    pub search: String,
    pub page: u32,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            category: Category::ALL.to_string(),
            search: String::new(),
            page: 1,
        }
    }
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

fn normalize_category(category: &str) -> String {
    let category = category.trim();
    if category.is_empty() {
        Category::ALL.to_string()
    } else {
        category.to_string()
    }
}

impl QueryState {
    /// Parses `category`, `search` and `page`; unknown keys are ignored and
    /// the first occurrence of a repeated key wins. A page that is not a
    /// positive integer becomes 1.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut category: Option<String> = None;
        let mut search: Option<String> = None;
        let mut page: Option<u32> = None;

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            match decode_component(key).as_str() {
                "category" if category.is_none() => category = Some(decode_component(value)),
                "search" if search.is_none() => search = Some(decode_component(value)),
                "page" if page.is_none() => {
                    page = Some(
                        decode_component(value)
                            .trim()
                            .parse::<u32>()
                            .ok()
                            .filter(|p| *p >= 1)
                            .unwrap_or(1),
                    )
                }
                _ => {}
            }
        }

        Self {
            category: normalize_category(category.as_deref().unwrap_or("")),
            search: search.unwrap_or_default(),
            page: page.unwrap_or(1),
        }
    }

    pub fn to_query_string(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if self.category != Category::ALL {
            parts.push(format!("category={}", urlencoding::encode(&self.category)));
        }
        if !self.search.is_empty() {
            parts.push(format!("search={}", urlencoding::encode(&self.search)));
        }
        if self.page != 1 {
            parts.push(format!("page={}", self.page));
        }
        parts.join("&")
    }

    /// `route` plus the minimal query string, e.g. `/products?category=5`.
    pub fn href(&self, route: &str) -> String {
        let query = self.to_query_string();
        if query.is_empty() {
            route.to_string()
        } else {
            format!("{}?{}", route, query)
        }
    }

    pub fn with_category(&self, category: &str) -> Self {
        Self {
            category: normalize_category(category),
            search: self.search.clone(),
            page: 1,
        }
    }

    pub fn with_search(&self, search: &str) -> Self {
        Self {
            category: self.category.clone(),
            search: search.to_string(),
            page: 1,
        }
    }

    pub fn with_page(&self, page: u32) -> Self {
        Self {
            category: self.category.clone(),
            search: self.search.clone(),
            page: page.max(1),
        }
    }

    /// Request parameters: category only when not `all`, trimmed search only when non-empty.
    pub fn list_params(&self) -> ListParams {
        let search = self.search.trim();
        ListParams {
            page: self.page,
            category: (self.category != Category::ALL).then(|| self.category.clone()),
            search: (!search.is_empty()).then(|| search.to_string()),
        }
    }
}

/// Browser-history surface the query state needs.
pub trait History {
    fn location_query(&self) -> Cow<'_, str>;
    /// Rewrites the current entry without pushing a new one.
    fn replace_query(&mut self, query: &str);
}

/// History kept in memory; `push`, `back` and `forward` stand in for
/// navigation the page does not initiate itself.
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    entries: Vec<String>,
    index: usize,
}

impl MemoryHistory {
    pub fn new(initial_query: &str) -> Self {
        Self {
            entries: vec![initial_query.trim_start_matches('?').to_string()],
            index: 0,
        }
    }

    pub fn push(&mut self, query: &str) {
        self.entries.truncate(self.index + 1);
        self.entries.push(query.trim_start_matches('?').to_string());
        self.index = self.entries.len() - 1;
    }

    pub fn back(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    pub fn forward(&mut self) -> bool {
        if self.index + 1 >= self.entries.len() {
            return false;
        }
        self.index += 1;
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl History for MemoryHistory {
    fn location_query(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.entries[self.index])
    }

    fn replace_query(&mut self, query: &str) {
        self.entries[self.index] = query.to_string();
    }
}

/// Query state of one listing page instance, bound to a history.
pub struct CatalogQuery<H: History> {
    history: H,
    state: QueryState,
}

impl<H: History> CatalogQuery<H> {
    pub fn mount(history: H) -> Self {
        let state = QueryState::parse(&history.location_query());
        Self { history, state }
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut H {
        &mut self.history
    }

    pub fn set_category(&mut self, category: &str) -> &QueryState {
        let next = self.state.with_category(category);
        self.commit(next)
    }

    pub fn set_search(&mut self, search: &str) -> &QueryState {
        let next = self.state.with_search(search);
        self.commit(next)
    }

    pub fn set_page(&mut self, page: u32) -> &QueryState {
        let next = self.state.with_page(page);
        self.commit(next)
    }

    /// Re-derives state after back/forward or an external URL edit. Returns
    /// whether the state changed.
    pub fn on_navigation(&mut self) -> bool {
        let parsed = QueryState::parse(&self.history.location_query());
        if parsed == self.state {
            return false;
        }
        self.state = parsed;
        true
    }

    fn commit(&mut self, next: QueryState) -> &QueryState {
        let query = next.to_query_string();
        if self.history.location_query() != query {
            self.history.replace_query(&query);
        }
        self.state = next;
        &self.state
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub page_count: u32,
    pub has_previous: bool,
    pub has_next: bool,
}

impl Pagination {
    pub fn page_count(total_count: u64) -> u32 {
        let per_page = ITEMS_PER_PAGE as u64;
        ((total_count + per_page - 1) / per_page) as u32
    }

    pub fn new(page: u32, total_count: u64) -> Self {
        let page_count = Self::page_count(total_count);
        let page = page.max(1);
        Self {
            page,
            page_count,
            has_previous: page > 1,
            has_next: page < page_count,
        }
    }

    /// Target of the Previous control, clamped into `[1, page_count]`.
    pub fn previous(&self) -> Option<u32> {
        if !self.has_previous {
            return None;
        }
        Some((self.page - 1).min(self.page_count.max(1)))
    }

    pub fn next(&self) -> Option<u32> {
        self.has_next.then(|| self.page + 1)
    }

    pub fn pages(&self) -> impl Iterator<Item = u32> {
        1..=self.page_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(category: &str, search: &str, page: u32) -> QueryState {
        QueryState {
            category: category.to_string(),
            search: search.to_string(),
            page,
        }
    }

    #[test]
    fn test_parse_defaults() {
        assert_eq!(QueryState::parse(""), QueryState::default());
        assert_eq!(QueryState::parse("?"), QueryState::default());
        assert_eq!(QueryState::parse("foo=bar"), QueryState::default());
    }

    #[test]
    fn test_parse_invalid_page() {
        assert_eq!(QueryState::parse("page=abc").page, 1);
        assert_eq!(QueryState::parse("page=0").page, 1);
        assert_eq!(QueryState::parse("page=-3").page, 1);
        assert_eq!(QueryState::parse("page=").page, 1);
        assert_eq!(QueryState::parse("page=4").page, 4);
    }

    #[test]
    fn test_defaults_are_omitted() {
        assert_eq!(QueryState::default().to_query_string(), "");
        assert_eq!(state("all", "", 3).to_query_string(), "page=3");
        assert_eq!(state("5", "", 1).to_query_string(), "category=5");
        assert_eq!(
            state("5", "john deere", 2).to_query_string(),
            "category=5&search=john%20deere&page=2"
        );
    }

    #[test]
    fn test_round_trip() {
        let cases = [
            state("all", "", 1),
            state("12", "", 1),
            state("all", "traktor + plug", 7),
            state("3", "трактор", 2),
            state("all", "  ", 1),
            state("a&b=c", "x%y", 9),
        ];
        for case in cases {
            assert_eq!(QueryState::parse(&case.to_query_string()), case);
        }
    }

    #[test]
    fn test_parse_plus_and_percent() {
        let parsed = QueryState::parse("?search=disc+harrow&category=7");
        assert_eq!(parsed.search, "disc harrow");
        assert_eq!(parsed.category, "7");
    }

    #[test]
    fn test_page_resets_on_category_and_search() {
        let start = state("5", "mtz", 4);
        assert_eq!(start.with_category("6").page, 1);
        assert_eq!(start.with_search("belarus").page, 1);

        let paged = start.with_page(3);
        assert_eq!(paged, state("5", "mtz", 3));
    }

    #[test]
    fn test_page_reset_over_operation_sequences() {
        let mut current = QueryState::default();
        for step in 0..40u32 {
            current = match step % 4 {
                0 => current.with_page(step + 2),
                1 => {
                    let next = current.with_category(&format!("{}", step));
                    assert_eq!(next.page, 1);
                    next
                }
                2 => current.with_page(step),
                _ => {
                    let next = current.with_search(&format!("q{}", step));
                    assert_eq!(next.page, 1);
                    next
                }
            };
        }
    }

    #[test]
    fn test_list_params() {
        let params = state("all", "  mtz  ", 2).list_params();
        assert_eq!(params.category, None);
        assert_eq!(params.search.as_deref(), Some("mtz"));
        assert_eq!(params.page, 2);

        let params = state("5", "   ", 1).list_params();
        assert_eq!(params.category.as_deref(), Some("5"));
        assert_eq!(params.search, None);
    }

    #[test]
    fn test_catalog_query_replaces_without_pushing() {
        let mut query = CatalogQuery::mount(MemoryHistory::new("?category=5&page=2"));
        assert_eq!(query.state(), &state("5", "", 2));

        query.set_page(3);
        assert_eq!(query.history().location_query(), "category=5&page=3");
        query.set_search("mtz");
        assert_eq!(query.history().location_query(), "category=5&search=mtz");
        query.set_category("all");
        assert_eq!(query.history().location_query(), "search=mtz");
        query.set_search("");
        assert_eq!(query.history().location_query(), "");

        assert_eq!(query.history().len(), 1);
    }

    #[test]
    fn test_catalog_query_follows_back_and_forward() {
        let mut query = CatalogQuery::mount(MemoryHistory::new(""));
        query.history_mut().push("category=9&page=4");
        assert!(query.on_navigation());
        assert_eq!(query.state(), &state("9", "", 4));

        query.history_mut().back();
        assert!(query.on_navigation());
        assert_eq!(query.state(), &QueryState::default());
        assert!(!query.on_navigation());

        query.history_mut().forward();
        assert!(query.on_navigation());
        assert_eq!(query.state().page, 4);
    }

    #[test]
    fn test_href() {
        assert_eq!(QueryState::default().href("/products"), "/products");
        assert_eq!(state("5", "", 2).href("/services"), "/services?category=5&page=2");
    }

    #[test]
    fn test_pagination_math() {
        assert_eq!(Pagination::page_count(0), 0);
        assert_eq!(Pagination::page_count(1), 1);
        assert_eq!(Pagination::page_count(8), 1);
        assert_eq!(Pagination::page_count(9), 2);
        assert_eq!(Pagination::page_count(17), 3);

        let first = Pagination::new(1, 17);
        assert_eq!(first.previous(), None);
        assert_eq!(first.next(), Some(2));
        assert_eq!(first.pages().collect::<Vec<_>>(), vec![1, 2, 3]);

        let last = Pagination::new(3, 17);
        assert_eq!(last.previous(), Some(2));
        assert_eq!(last.next(), None);

        let beyond = Pagination::new(10, 17);
        assert_eq!(beyond.previous(), Some(3));
        assert_eq!(beyond.next(), None);

        let empty = Pagination::new(1, 0);
        assert_eq!(empty.previous(), None);
        assert_eq!(empty.next(), None);
        assert_eq!(empty.pages().count(), 0);
    }
}
