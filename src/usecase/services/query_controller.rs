use std::time::Duration;

use crate::domain::entities::page::RecordPage;
use crate::domain::entities::query::{toggle_sort, DebounceTicket, QueryState, SortSpec};
use crate::domain::entities::record::Record;
use crate::usecase::ports::collection::{ClientError, ListQuery};

pub const DEFAULT_PER_PAGE: u32 = 20;

/// How long free-text input settles before a fetch fires. One request per
/// keystroke is what this window exists to prevent.
pub const FILTER_DEBOUNCE: Duration = Duration::from_millis(500);

/// The page data a table renders from. Replaced wholesale on every
/// successful fetch; cleared to empty when a fetch fails so the renderer
/// shows its error state instead of stale rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageData {
    pub items: Vec<Record>,
    pub total_items: u64,
    pub total_pages: u32,
    pub loading: bool,
    pub error: Option<String>,
}

/// Snapshot of one in-flight fetch. The sequence number fences out stale
/// responses: a fetch that resolves after a newer one was issued is
/// discarded rather than cancelled.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    seq: u64,
    pub query: ListQuery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchApplied {
    /// A newer fetch was issued while this one was in flight.
    Stale,
    /// The outcome was applied. `needs_refetch` is set when the current page
    /// fell outside the fresh page count and was clamped.
    Applied { needs_refetch: bool },
}

/// Pagination/sort/filter state for one remote collection, plus the page
/// data the last settled fetch produced. UI-agnostic: the Dioxus hook owns
/// the debounce sleep and the actual network call.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryController {
    collection: String,
    state: QueryState,
    issued_seq: u64,
    data: PageData,
}

impl QueryController {
    pub fn new(collection: impl Into<String>, sort: Option<SortSpec>) -> Self {
        Self {
            collection: collection.into(),
            state: QueryState::new(DEFAULT_PER_PAGE, sort),
            issued_seq: 0,
            data: PageData::default(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    pub fn data(&self) -> &PageData {
        &self.data
    }

    /// Store the raw search input immediately (so a controlled input can
    /// echo it) and hand back the ticket the debounce sleep should try to
    /// commit once the window elapses.
    pub fn set_filter(&mut self, raw: impl Into<String>) -> DebounceTicket {
        self.state.filter.edit_search(raw)
    }

    /// Commit a debounced search edit. Returns false, without touching the
    /// query, when a newer edit superseded the ticket. Committing resets the
    /// page to 1.
    pub fn commit_filter(&mut self, ticket: DebounceTicket) -> bool {
        if !self.state.filter.commit_search(ticket) {
            return false;
        }
        self.state.page = 1;
        true
    }

    pub fn set_structured_filter(&mut self, expression: impl Into<String>) {
        self.state.filter.set_structured(expression);
        self.state.page = 1;
    }

    /// Clamped against the last known page count; never issues an
    /// out-of-range page.
    pub fn set_page(&mut self, page: u32) {
        self.state.page = page.clamp(1, self.data.total_pages.max(1));
    }

    pub fn set_per_page(&mut self, per_page: u32) {
        self.state.per_page = per_page.max(1);
        self.state.page = 1;
    }

    pub fn set_sort(&mut self, sort: Option<SortSpec>) {
        self.state.sort = sort;
    }

    pub fn toggle_sort(&mut self, field: &str) {
        self.state.sort = Some(toggle_sort(self.state.sort.as_ref(), field));
    }

    pub fn effective_filter(&self) -> String {
        self.state.filter.effective()
    }

    /// The query for the current page.
    pub fn list_query(&self) -> ListQuery {
        ListQuery {
            page: self.state.page,
            per_page: self.state.per_page,
            sort: self.state.sort_param(),
            filter: self.effective_filter(),
            ..ListQuery::default()
        }
    }

    /// The unpaginated query CSV export runs: current filter and sort, no
    /// page bounds.
    pub fn export_query(&self) -> ListQuery {
        ListQuery {
            sort: self.state.sort_param(),
            filter: self.effective_filter(),
            ..ListQuery::default()
        }
    }

    /// Issue a fetch: bump the fence sequence, mark the data loading, and
    /// snapshot the query the caller should run.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.issued_seq += 1;
        self.data.loading = true;
        FetchTicket {
            seq: self.issued_seq,
            query: self.list_query(),
        }
    }

    /// Apply a fetch outcome under the fence: outcomes of superseded tickets
    /// are discarded so the list always reflects the most recent query
    /// intent, even when responses resolve out of order.
    pub fn apply_fetch(
        &mut self,
        ticket: &FetchTicket,
        outcome: Result<RecordPage, ClientError>,
    ) -> FetchApplied {
        if ticket.seq != self.issued_seq {
            return FetchApplied::Stale;
        }
        self.data.loading = false;
        match outcome {
            Ok(page) => {
                self.data.items = page.items;
                self.data.total_items = page.total_items;
                self.data.total_pages = page.total_pages;
                self.data.error = None;

                let mut needs_refetch = false;
                let max_page = self.data.total_pages.max(1);
                if self.state.page > max_page {
                    self.state.page = max_page;
                    needs_refetch = true;
                }
                FetchApplied::Applied { needs_refetch }
            }
            Err(err) => {
                tracing::warn!(
                    collection = %self.collection,
                    error = %err,
                    "list fetch failed"
                );
                self.data.items = Vec::new();
                self.data.total_items = 0;
                self.data.total_pages = 0;
                self.data.error = Some(err.to_string());
                FetchApplied::Applied {
                    needs_refetch: false,
                }
            }
        }
    }
}
