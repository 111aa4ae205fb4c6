//! Paginated listing fetches for the products and services pages.
//!
//! `CatalogFetcher` keeps at most one request in flight per page instance.
//! Each request gets a generation number; issuing a new one aborts the
//! previous task and any result that still arrives for an older generation
//! is dropped, so a slow superseded response can never overwrite newer
//! state. Search-only changes wait out a short debounce first.

use crate::api::{classify_error, error_summary, CatalogSource, FailureKind};
use crate::i18n::Language;
use crate::models::{CatalogItem, CatalogKind};
use crate::query_state::{Pagination, QueryState};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Everything a listing request depends on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchKey {
    pub language: Language,
    pub kind: CatalogKind,
    pub query: QueryState,
}

impl FetchKey {
    fn only_search_changed(&self, previous: &FetchKey) -> bool {
        self.language == previous.language
            && self.kind == previous.kind
            && self.query.category == previous.query.category
            && self.query.search != previous.query.search
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ListingState {
    pub items: Vec<CatalogItem>,
    pub total_count: u64,
    pub loading: bool,
    pub error: Option<String>,
    #[serde(skip)]
    pub failure: Option<FailureKind>,
}

impl ListingState {
    pub fn page_count(&self) -> u32 {
        Pagination::page_count(self.total_count)
    }

    /// Finished without error and nothing matched: the "not found" view, not the error view.
    pub fn is_empty_result(&self) -> bool {
        !self.loading && self.error.is_none() && self.items.is_empty()
    }
}

/**
 * load_listing
 * One listing request: failures become `error` with `items` cleared, never a propagated error.
 */
pub async fn load_listing<S: CatalogSource>(source: &S, key: &FetchKey) -> ListingState {
    let params = key.query.list_params();
    match source.catalog_page(key.kind, &params, key.language).await {
        Ok(page) => ListingState {
            items: page
                .results
                .into_iter()
                .map(|raw| CatalogItem::from_raw(raw, source.api_base()))
                .collect(),
            total_count: page.count,
            loading: false,
            error: None,
            failure: None,
        },
        Err(e) => {
            log::error!(
                "Failed to load {} page {} ({}): {:?}",
                key.kind.category_type(),
                key.query.page,
                key.language.code(),
                e
            );
            ListingState {
                items: Vec::new(),
                total_count: 0,
                loading: false,
                error: Some(error_summary(&e)),
                failure: Some(classify_error(&e)),
            }
        }
    }
}

pub struct CatalogFetcher<S: CatalogSource> {
    source: Arc<S>,
    state: Arc<watch::Sender<ListingState>>,
    generation: Arc<AtomicU64>,
    in_flight: Option<JoinHandle<()>>,
    last_key: Option<FetchKey>,
}

impl<S: CatalogSource> CatalogFetcher<S> {
    pub fn new(source: Arc<S>) -> Self {
        let (state, _) = watch::channel(ListingState::default());
        Self {
            source,
            state: Arc::new(state),
            generation: Arc::new(AtomicU64::new(0)),
            in_flight: None,
            last_key: None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ListingState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ListingState {
        self.state.borrow().clone()
    }

    /// Starts a fetch for `key` unless it equals the last requested key.
    /// Must be called from within a tokio runtime.
    pub fn request(&mut self, key: FetchKey) {
        if self.last_key.as_ref() == Some(&key) {
            return;
        }
        let debounce = self
            .last_key
            .as_ref()
            .map(|previous| key.only_search_changed(previous))
            .unwrap_or(false);
        self.spawn(key, debounce);
    }

    /// Re-issues the last request, e.g. from the error panel's retry action.
    pub fn retry(&mut self) {
        if let Some(key) = self.last_key.clone() {
            self.spawn(key, false);
        }
    }

    /// Aborts the in-flight request, if any, and invalidates its generation.
    /// The next `request` fetches even if its key matches the cancelled one.
    pub fn cancel(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.last_key = None;
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
            self.state.send_if_modified(|s| std::mem::replace(&mut s.loading, false));
        }
    }

    fn spawn(&mut self, key: FetchKey, debounce: bool) {
        self.cancel();
        let generation = self.generation.load(Ordering::SeqCst);
        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
            s.failure = None;
        });

        let source = Arc::clone(&self.source);
        let state = Arc::clone(&self.state);
        let current = Arc::clone(&self.generation);
        let task_key = key.clone();

        self.in_flight = Some(tokio::spawn(async move {
            if debounce {
                tokio::time::sleep(SEARCH_DEBOUNCE).await;
            }
            let next = load_listing(source.as_ref(), &task_key).await;
            if current.load(Ordering::SeqCst) != generation {
                log::debug!("Dropping superseded listing response for {:?}", task_key);
                return;
            }
            state.send_replace(next);
        }));
        self.last_key = Some(key);
    }
}

impl<S: CatalogSource> Drop for CatalogFetcher<S> {
    fn drop(&mut self) {
        self.cancel();
    }
}
