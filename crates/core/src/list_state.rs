//! State of a remote-backed, paginated, filterable, selectable table.
//!
//! [`ListState`] owns everything a dashboard table threads through its
//! render cycle. Mutations go through named methods; those that require a
//! fetch hand back a [`RequestTicket`] and the caller reports the outcome
//! with [`ListState::apply_page`] or [`ListState::apply_failure`].

use serde::{Deserialize, Serialize};

use crate::baseline::{BaselineCounts, BaselineTracker};
use crate::filter::FilterSet;
use crate::notice::{EmptyResultGuard, Notice, NO_RESULTS_MESSAGE};
use crate::query::{self, ListQuery, SortKey};
use crate::selection::SelectionSet;
use crate::sequence::{RequestSequencer, RequestTicket};
use crate::types::EntityId;

/// Rows shown in a list must expose their backend id.
pub trait Identified {
    fn id(&self) -> EntityId;
}

/// One page of rows as returned by the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub rows: Vec<T>,
    pub total_count: u64,
    pub page: u32,
    pub page_size: u32,
    #[serde(default)]
    pub counts: BaselineCounts,
}

/// Result of applying a response to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// A newer request was issued after this one; the response was dropped.
    Stale,
}

#[derive(Debug, Clone)]
pub struct ListState<T> {
    query: ListQuery,
    rows: Vec<T>,
    total_count: u64,
    selection: SelectionSet,
    empty_guard: EmptyResultGuard,
    baseline: BaselineTracker,
    sequencer: RequestSequencer,
    loading: bool,
    last_error: Option<String>,
    notices: Vec<Notice>,
}

impl<T: Identified + Clone> ListState<T> {
    pub fn new(query: ListQuery) -> Self {
        Self {
            query,
            rows: Vec::new(),
            total_count: 0,
            selection: SelectionSet::new(),
            empty_guard: EmptyResultGuard::new(),
            baseline: BaselineTracker::new(),
            sequencer: RequestSequencer::new(),
            loading: false,
            last_error: None,
            notices: Vec::new(),
        }
    }

    // ---- accessors ----

    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn total_pages(&self) -> u32 {
        query::total_pages(self.total_count, self.query.page_size())
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn baseline(&self) -> &BaselineCounts {
        self.baseline.counts()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Message for the error banner, if the latest request failed.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn visible_ids(&self) -> Vec<EntityId> {
        self.rows.iter().map(Identified::id).collect()
    }

    // ---- query mutations ----

    /// Replace the active filters. Returns `None` when the normalised
    /// filters are unchanged, so no request is needed.
    pub fn set_filters(&mut self, filters: &FilterSet) -> Option<RequestTicket> {
        if !self.query.set_filters(filters) {
            return None;
        }
        self.selection.clear();
        Some(self.begin_refetch())
    }

    pub fn set_sort(&mut self, sort: Option<SortKey>) -> Option<RequestTicket> {
        if !self.query.set_sort(sort) {
            return None;
        }
        self.selection.clear();
        Some(self.begin_refetch())
    }

    /// Move to page `n` (clamped) and clear the selection. Always refetches.
    pub fn set_page(&mut self, n: u32) -> RequestTicket {
        self.query.set_page(n, self.total_count);
        self.selection.clear();
        self.begin_refetch()
    }

    /// Issue a ticket for a refetch of the current query.
    pub fn begin_refetch(&mut self) -> RequestTicket {
        self.loading = true;
        self.sequencer.issue()
    }

    // ---- responses ----

    pub fn apply_page(&mut self, ticket: RequestTicket, page: Page<T>) -> ApplyOutcome {
        if !self.sequencer.is_current(ticket) {
            tracing::warn!(ticket = ticket.value(), "Discarding superseded list response");
            return ApplyOutcome::Stale;
        }

        self.loading = false;
        self.last_error = None;
        self.rows = page.rows;
        self.total_count = page.total_count;

        let visible = self.visible_ids();
        self.selection.retain_visible(&visible);
        self.baseline.offer(&page.counts, self.query.has_filters());

        let signature = self.query.filters().signature();
        if self.empty_guard.observe(&signature, self.rows.len()) {
            self.notices.push(Notice::info(NO_RESULTS_MESSAGE));
        }

        ApplyOutcome::Applied
    }

    /// Record a failed request. Rows from the last good response stay.
    pub fn apply_failure(&mut self, ticket: RequestTicket, message: &str) -> ApplyOutcome {
        if !self.sequencer.is_current(ticket) {
            tracing::warn!(ticket = ticket.value(), "Discarding superseded list failure");
            return ApplyOutcome::Stale;
        }
        self.loading = false;
        self.last_error = Some(message.to_string());
        self.notices.push(Notice::error(message));
        ApplyOutcome::Applied
    }

    // ---- selection ----

    pub fn toggle_select(&mut self, id: EntityId, checked: bool) -> bool {
        let visible = self.visible_ids();
        self.selection.toggle(id, checked, &visible)
    }

    pub fn select_all(&mut self, checked: bool) {
        let visible = self.visible_ids();
        self.selection.select_all(checked, &visible);
    }

    /// Clear the selection, e.g. when the bulk-action panel is closed.
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    // ---- optimistic row updates ----

    /// Apply `update` to the row with `id` and return its previous value so
    /// the caller can roll back. `None` if the row is not on this page.
    pub fn update_row<F>(&mut self, id: EntityId, update: F) -> Option<T>
    where
        F: FnOnce(&mut T),
    {
        let row = self.rows.iter_mut().find(|r| r.id() == id)?;
        let previous = row.clone();
        update(row);
        Some(previous)
    }

    /// Put a previously saved row back in place.
    pub fn restore_row(&mut self, previous: T) {
        let id = previous.id();
        if let Some(row) = self.rows.iter_mut().find(|r| r.id() == id) {
            *row = previous;
        }
    }

    // ---- notices ----

    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    /// Take all queued notices, oldest first.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterPredicate;
    use crate::notice::NoticeLevel;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: EntityId,
        active: bool,
    }

    impl Identified for Row {
        fn id(&self) -> EntityId {
            self.id
        }
    }

    fn page_of(ids: &[EntityId], total: u64) -> Page<Row> {
        Page {
            rows: ids.iter().map(|&id| Row { id, active: true }).collect(),
            total_count: total,
            page: 1,
            page_size: 15,
            counts: BaselineCounts::from_pairs([("total", total)]),
        }
    }

    fn filters(name: &str) -> FilterSet {
        FilterSet::new()
            .with("name", FilterPredicate::contains(name))
            .unwrap()
    }

    #[test]
    fn page_change_clears_selection() {
        let mut state = ListState::new(ListQuery::default());
        let t = state.begin_refetch();
        state.apply_page(t, page_of(&[1, 2, 3], 42));
        state.select_all(true);
        assert_eq!(state.selection().len(), 3);

        state.set_page(2);
        assert!(state.selection().is_empty());
    }

    #[test]
    fn refetch_drops_selected_ids_no_longer_shown() {
        let mut state = ListState::new(ListQuery::default());
        let t = state.begin_refetch();
        state.apply_page(t, page_of(&[1, 2, 3], 3));
        state.toggle_select(1, true);
        state.toggle_select(3, true);

        let t = state.begin_refetch();
        state.apply_page(t, page_of(&[2, 3], 2));
        assert_eq!(state.selection().ids(), vec![3]);
    }

    #[test]
    fn stale_response_is_discarded() {
        let mut state = ListState::new(ListQuery::default());
        let old = state.begin_refetch();
        let new = state.begin_refetch();

        assert_eq!(state.apply_page(new, page_of(&[7], 1)), ApplyOutcome::Applied);
        assert_eq!(state.apply_page(old, page_of(&[1, 2], 2)), ApplyOutcome::Stale);
        assert_eq!(state.visible_ids(), vec![7]);
    }

    #[test]
    fn failure_keeps_last_good_rows() {
        let mut state = ListState::new(ListQuery::default());
        let t = state.begin_refetch();
        state.apply_page(t, page_of(&[1, 2], 2));

        let t = state.begin_refetch();
        state.apply_failure(t, "Server unavailable");

        assert_eq!(state.visible_ids(), vec![1, 2]);
        assert_eq!(state.last_error(), Some("Server unavailable"));
        assert!(!state.is_loading());
        let notices = state.drain_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
    }

    #[test]
    fn same_filters_twice_issue_one_request() {
        let mut state: ListState<Row> = ListState::new(ListQuery::default());
        assert!(state.set_filters(&filters("pump")).is_some());
        assert!(state.set_filters(&filters("pump")).is_none());
    }

    #[test]
    fn empty_filtered_result_notifies_once() {
        let mut state = ListState::new(ListQuery::default());
        let t = state.set_filters(&filters("zzz")).unwrap();
        state.apply_page(t, page_of(&[], 0));
        let t = state.begin_refetch();
        state.apply_page(t, page_of(&[], 0));

        let notices = state.drain_notices();
        assert_eq!(notices, vec![Notice::info(NO_RESULTS_MESSAGE)]);
    }

    #[test]
    fn baseline_only_moves_when_unfiltered() {
        let mut state = ListState::new(ListQuery::default());
        let t = state.begin_refetch();
        state.apply_page(t, page_of(&[1, 2, 3], 42));
        assert_eq!(state.baseline().get("total"), Some(42));

        let t = state.set_filters(&filters("pump")).unwrap();
        state.apply_page(t, page_of(&[1], 1));
        assert_eq!(state.baseline().get("total"), Some(42));
        assert_eq!(state.total_count(), 1);
    }

    #[test]
    fn optimistic_update_and_rollback() {
        let mut state = ListState::new(ListQuery::default());
        let t = state.begin_refetch();
        state.apply_page(t, page_of(&[1, 2], 2));

        let previous = state.update_row(2, |row| row.active = false).unwrap();
        assert!(!state.rows()[1].active);

        state.restore_row(previous);
        assert!(state.rows()[1].active);
        assert!(state.update_row(99, |_| {}).is_none());
    }
}
