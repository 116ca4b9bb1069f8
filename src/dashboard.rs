// 📊 Dashboard State - the explicit session state behind every screen
//
// Owns the bill store plus the query (filters, sort, page, page size) and
// re-derives filter -> sort -> paginate from scratch whenever it is asked.

use crate::bill::{Bill, BillStatus};
use crate::error::{BillError, Result};
use crate::export;
use crate::filter::{filter_bills, BillFilters};
use crate::paginate::{self, paginate, total_pages, DEFAULT_PAGE_SIZE};
use crate::sort::{sort_bills, SortField, SortSpec};
use crate::source::{BillSource, LoadReport};
use crate::store::BillStore;
use crate::validation::BillForm;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

// ============================================================================
// QUERY + DERIVED VIEW
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewQuery {
    pub filters: BillFilters,
    pub sort: SortSpec,
    /// 1-based
    pub page: usize,
    pub page_size: NonZeroUsize,
}

impl Default for ViewQuery {
    fn default() -> Self {
        ViewQuery {
            filters: BillFilters::default(),
            sort: SortSpec::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One rendered page plus the counters the header and pager need
#[derive(Debug, Clone, Serialize)]
pub struct PageView<'a> {
    pub bills: Vec<&'a Bill>,
    pub total_bills: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub page_size: usize,
    pub new_bills: usize,
}

/// Filter then sort; the pre-pagination set that export also uses
pub fn sorted_view<'a>(bills: &'a [Bill], filters: &BillFilters, sort: SortSpec) -> Vec<&'a Bill> {
    let mut view = filter_bills(bills, filters);
    sort_bills(&mut view, sort);
    tracing::debug!(total = bills.len(), matched = view.len(), sort = %sort.field, "view recomputed");
    view
}

pub fn page_view<'a>(bills: &'a [Bill], query: &ViewQuery) -> PageView<'a> {
    let sorted = sorted_view(bills, &query.filters, query.sort);
    let page = paginate(&sorted, query.page, query.page_size).to_vec();

    PageView {
        total_bills: sorted.len(),
        total_pages: total_pages(sorted.len(), query.page_size),
        current_page: query.page.max(1),
        page_size: query.page_size.get(),
        new_bills: bills.iter().filter(|b| b.is_new).count(),
        bills: page,
    }
}

// ============================================================================
// LOAD STATE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    NotLoaded,
    Loaded(LoadReport),
    Failed(String),
}

// ============================================================================
// DASHBOARD
// ============================================================================

pub struct Dashboard {
    store: BillStore,
    query: ViewQuery,
    last_updated: Option<DateTime<Utc>>,
    load_state: LoadState,
}

impl Dashboard {
    pub fn new(store: BillStore) -> Self {
        Dashboard {
            store,
            query: ViewQuery::default(),
            last_updated: None,
            load_state: LoadState::NotLoaded,
        }
    }

    pub fn with_page_size(mut self, page_size: NonZeroUsize) -> Self {
        self.query.page_size = page_size;
        self
    }

    // ------------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------------

    /// Replace the collection from the source. On failure the current
    /// collection is kept and the error is remembered for display.
    pub fn load_from(&mut self, source: &dyn BillSource) -> Result<LoadReport> {
        let now = self.store.now();
        self.apply_load(source.fetch(now), now)
    }

    /// Record the outcome of a fetch made at `fetched_at`. Split from
    /// `load_from` so callers sharing the dashboard can fetch without
    /// holding it.
    pub fn apply_load(
        &mut self,
        fetched: Result<(Vec<Bill>, LoadReport)>,
        fetched_at: DateTime<Utc>,
    ) -> Result<LoadReport> {
        match fetched {
            Ok((bills, report)) => {
                self.store.replace_all(bills);
                self.last_updated = Some(fetched_at);
                self.clamp_page();
                self.load_state = LoadState::Loaded(report.clone());
                Ok(report)
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to fetch bills");
                self.load_state = LoadState::Failed(err.to_string());
                Err(err)
            }
        }
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.store.now()
    }

    // ------------------------------------------------------------------------
    // Query state. Anything that changes what matches, or how it is ordered
    // or chunked, sends the user back to page 1.
    // ------------------------------------------------------------------------

    pub fn query(&self) -> &ViewQuery {
        &self.query
    }

    pub fn filters(&self) -> &BillFilters {
        &self.query.filters
    }

    pub fn set_filters(&mut self, filters: BillFilters) {
        self.query.filters = filters;
        self.query.page = 1;
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.query.filters.search = search.into();
        self.query.page = 1;
    }

    pub fn toggle_status_filter(&mut self, status: BillStatus) {
        self.query.filters.toggle_status(status);
        self.query.page = 1;
    }

    pub fn toggle_new_only(&mut self) {
        self.query.filters.show_new_only = !self.query.filters.show_new_only;
        self.query.page = 1;
    }

    pub fn clear_filters(&mut self) {
        self.query.filters.clear();
        self.query.page = 1;
    }

    pub fn sort(&self) -> SortSpec {
        self.query.sort
    }

    pub fn set_sort(&mut self, sort: SortSpec) {
        self.query.sort = sort;
        self.query.page = 1;
    }

    pub fn toggle_sort(&mut self, field: SortField) {
        self.query.sort.toggle(field);
        self.query.page = 1;
    }

    pub fn current_page(&self) -> usize {
        self.query.page
    }

    pub fn set_current_page(&mut self, page: usize) {
        self.query.page = page.max(1);
    }

    pub fn next_page(&mut self) {
        if self.query.page < self.total_pages() {
            self.query.page += 1;
        }
    }

    pub fn previous_page(&mut self) {
        if self.query.page > 1 {
            self.query.page -= 1;
        }
    }

    pub fn page_size(&self) -> NonZeroUsize {
        self.query.page_size
    }

    pub fn set_page_size(&mut self, page_size: NonZeroUsize) {
        self.query.page_size = page_size;
        self.query.page = 1;
    }

    fn clamp_page(&mut self) {
        let last = self.total_pages().max(1);
        if self.query.page > last {
            self.query.page = last;
        }
    }

    pub fn cycle_page_size(&mut self, forward: bool) {
        let next = if forward {
            paginate::next_page_size(self.query.page_size)
        } else {
            paginate::previous_page_size(self.query.page_size)
        };
        self.set_page_size(next);
    }

    // ------------------------------------------------------------------------
    // Derived views
    // ------------------------------------------------------------------------

    pub fn all_bills(&self) -> &[Bill] {
        self.store.all()
    }

    pub fn get(&self, id: &str) -> Option<&Bill> {
        self.store.get(id)
    }

    pub fn sorted_bills(&self) -> Vec<&Bill> {
        sorted_view(self.store.all(), &self.query.filters, self.query.sort)
    }

    pub fn page(&self) -> PageView<'_> {
        page_view(self.store.all(), &self.query)
    }

    pub fn total_bills(&self) -> usize {
        filter_bills(self.store.all(), &self.query.filters).len()
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.total_bills(), self.query.page_size)
    }

    pub fn new_count(&self) -> usize {
        self.store.new_count()
    }

    // ------------------------------------------------------------------------
    // Mutations (validated form in, store does the stamping)
    // ------------------------------------------------------------------------

    /// Validate and append. Returns the new bill's id.
    pub fn add_bill(&mut self, form: &BillForm) -> Result<String> {
        let draft = form.validate().map_err(BillError::Validation)?;
        Ok(self.store.create(draft).id.clone())
    }

    pub fn update_bill(&mut self, id: &str, form: &BillForm) -> Result<()> {
        let draft = form.validate().map_err(BillError::Validation)?;
        self.store.update(id, draft.into())?;
        Ok(())
    }

    /// Delete, then pull the page back if it just emptied the last one
    pub fn delete_bill(&mut self, id: &str) -> Result<Bill> {
        let removed = self.store.delete(id)?;
        self.clamp_page();
        Ok(removed)
    }

    pub fn mark_all_read(&mut self) -> usize {
        self.store.mark_all_read()
    }

    // ------------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------------

    pub fn export_csv_string(&self) -> Result<String> {
        export::to_csv_string(self.sorted_bills())
    }

    /// Write today's (UTC) export file into `dir`. Rows come out in the
    /// current sort order, the same order the table shows, rather than
    /// collection order.
    pub fn export_csv(&self, dir: &Path) -> Result<PathBuf> {
        let today = self.store.now().date_naive();
        export::export_to_dir(dir, today, self.sorted_bills())
    }

    pub fn export_filename(&self) -> String {
        export::export_filename(export::EXPORT_PREFIX, self.store.now().date_naive())
    }
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new(BillStore::new())
    }
}

// ============================================================================
// TESTS
// ============================================================================
