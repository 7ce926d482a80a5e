// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::rc::Rc;
use std::time::Instant;

use crate::debounce::{Debounced, FILTER_DEBOUNCE};
use crate::lifecycle::{EventHub, LoadTicket, LoadTracker, Subscription};
use crate::listing::{
    active_filter_chips, filter_employees, filter_values_equal, paginate, qualification_options,
    sort_employees, total_pages, visible_page_numbers,
};
use crate::persist::{
    KeyValueStore, PersistedOverviewState, load_persisted_overview_state,
    save_persisted_overview_state,
};
use crate::{
    Employee, EmployeeFilters, EmployeeId, FilterChip, FilterKey, Notification, Notifier,
    RepoResult, Repository, SortDirection, SortKey,
};

pub const DEFAULT_ITEMS_PER_PAGE: usize = 8;
pub const MIN_ITEMS_PER_PAGE: usize = 1;
pub const MOBILE_ITEMS_PER_PAGE: usize = 7;
pub const DESKTOP_ROW_FALLBACK_HEIGHT: f64 = 52.0;
pub const MAX_VISIBLE_PAGE_BUTTONS: usize = 5;
pub const MOBILE_VISIBLE_PAGE_BUTTONS: usize = 3;

pub const EMPTY_WITH_FILTERS: &str = "no employees match the current filters";
pub const EMPTY_WITHOUT_FILTERS: &str = "no employees found";

/// Rendered sizes reported by the view, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutMetrics {
    pub results_height: f64,
    pub header_height: f64,
    /// `None` while no row has rendered yet.
    pub first_row_height: Option<f64>,
}

impl LayoutMetrics {
    /// Rows that fit below the header; `None` when nothing is measurable yet.
    pub fn rows_that_fit(&self) -> Option<usize> {
        if self.results_height <= 0.0 {
            return None;
        }
        let row = self.first_row_height.unwrap_or(DESKTOP_ROW_FALLBACK_HEIGHT);
        let available = (self.results_height - self.header_height).max(row);
        let rows = (available / row.max(1.0)).floor() as usize;
        Some(rows.max(MIN_ITEMS_PER_PAGE))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OverviewCommand {
    SetFilter(FilterKey, String),
    ClearFilter(FilterKey),
    ResetFilters,
    /// Column header click: same key toggles, a new key starts ascending.
    Sort(SortKey),
    /// Mobile select: `None` clears the sort.
    SetSort(Option<SortKey>),
    GoToPage(usize),
    PrevPage,
    NextPage,
    SetMobileLayout(bool),
    Layout(LayoutMetrics),
    SetItemsPerPage(usize),
    Tick,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverviewEvent {
    FilterApplied(FilterKey),
    SortChanged(Option<SortKey>, SortDirection),
    PageChanged(usize),
    ItemsPerPageChanged(usize),
    LayoutModeChanged { mobile: bool },
    EmployeesLoaded(usize),
    LoadFailed(String),
    DeletePrompted { id: EmployeeId, name: String },
    DeleteCancelled,
    EmployeeDeleted(EmployeeId),
    Persisted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteTarget {
    pub id: EmployeeId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverviewView<'a> {
    pub rows: Vec<&'a Employee>,
    pub total_employees: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub items_per_page: usize,
    pub visible_pages: Vec<usize>,
    pub chips: Vec<FilterChip>,
    pub has_filters: bool,
    pub empty_message: Option<&'static str>,
    pub qualification_options: Vec<String>,
    pub can_go_prev: bool,
    pub can_go_next: bool,
    pub is_loading: bool,
    pub error: Option<&'a str>,
}

#[derive(Debug, Clone)]
struct TextFilters {
    first_name: Debounced<String>,
    last_name: Debounced<String>,
    city: Debounced<String>,
}

impl TextFilters {
    fn seeded(filters: &EmployeeFilters) -> Self {
        Self {
            first_name: Debounced::new(filters.first_name.clone(), FILTER_DEBOUNCE),
            last_name: Debounced::new(filters.last_name.clone(), FILTER_DEBOUNCE),
            city: Debounced::new(filters.city.clone(), FILTER_DEBOUNCE),
        }
    }

    fn get_mut(&mut self, key: FilterKey) -> Option<&mut Debounced<String>> {
        match key {
            FilterKey::FirstName => Some(&mut self.first_name),
            FilterKey::LastName => Some(&mut self.last_name),
            FilterKey::City => Some(&mut self.city),
            FilterKey::Qualification => None,
        }
    }

    fn deadline(&self) -> Option<Instant> {
        [&self.first_name, &self.last_name, &self.city]
            .into_iter()
            .filter_map(Debounced::deadline)
            .min()
    }

    fn cancel_all(&mut self) {
        self.first_name.cancel_pending();
        self.last_name.cancel_pending();
        self.city.cancel_pending();
    }
}

/// State machine behind the employee overview screen.
///
/// Raw filter input is persisted as typed; the applied filters trail it
/// through per-field debouncers (the qualification select applies at once).
/// Every transition ends by clamping the page and writing the snapshot
/// through to the store when it changed.
pub struct OverviewState {
    store: Rc<dyn KeyValueStore>,
    input: EmployeeFilters,
    applied: EmployeeFilters,
    text_filters: TextFilters,
    sort_key: Option<SortKey>,
    sort_direction: SortDirection,
    current_page: usize,
    items_per_page: usize,
    pinned_items_per_page: Option<usize>,
    mobile: bool,
    layout: Option<LayoutMetrics>,
    employees: Vec<Employee>,
    loaded: bool,
    load: LoadTracker,
    load_error: Option<String>,
    pending_delete: Option<DeleteTarget>,
    deleting: bool,
    last_persisted: Option<PersistedOverviewState>,
    events: EventHub<OverviewEvent>,
}

impl std::fmt::Debug for OverviewState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverviewState")
            .field("filters", &self.input)
            .field("sort_key", &self.sort_key)
            .field("sort_direction", &self.sort_direction)
            .field("current_page", &self.current_page)
            .field("items_per_page", &self.items_per_page)
            .field("employees", &self.employees.len())
            .finish_non_exhaustive()
    }
}

impl OverviewState {
    /// Seeds from the persisted snapshot when one is stored and well-formed.
    pub fn restore(store: Rc<dyn KeyValueStore>) -> Self {
        let persisted = load_persisted_overview_state(store.as_ref());
        let seed = persisted.clone().unwrap_or_default();
        tracing::debug!(restored = persisted.is_some(), "overview state initialized");
        Self {
            store,
            text_filters: TextFilters::seeded(&seed.filters),
            input: seed.filters.clone(),
            applied: seed.filters,
            sort_key: seed.sort_key,
            sort_direction: seed.sort_direction,
            current_page: seed.current_page,
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
            pinned_items_per_page: None,
            mobile: false,
            layout: None,
            employees: Vec::new(),
            loaded: false,
            load: LoadTracker::new(),
            load_error: None,
            pending_delete: None,
            deleting: false,
            last_persisted: persisted,
            events: EventHub::new(),
        }
    }

    pub fn filters(&self) -> &EmployeeFilters {
        &self.input
    }

    pub fn applied_filters(&self) -> &EmployeeFilters {
        &self.applied
    }

    pub fn sort_key(&self) -> Option<SortKey> {
        self.sort_key
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.sort_direction
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn items_per_page(&self) -> usize {
        self.items_per_page
    }

    pub fn is_mobile(&self) -> bool {
        self.mobile
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    pub fn snapshot(&self) -> PersistedOverviewState {
        PersistedOverviewState {
            filters: self.input.clone(),
            sort_key: self.sort_key,
            sort_direction: self.sort_direction,
            current_page: self.current_page,
        }
    }

    /// Earliest instant at which a pending filter will settle.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.text_filters.deadline()
    }

    pub fn subscribe(&self, listener: impl FnMut(&OverviewEvent) + 'static) -> Subscription {
        self.events.subscribe(listener)
    }

    pub fn sort_indicator(&self, key: SortKey) -> &'static str {
        if self.sort_key == Some(key) {
            self.sort_direction.indicator()
        } else {
            ""
        }
    }

    pub fn has_filters(&self) -> bool {
        self.input.has_active()
    }

    pub fn results(&self) -> Vec<&Employee> {
        let filtered = filter_employees(&self.employees, &self.applied);
        sort_employees(filtered, self.sort_key, self.sort_direction)
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.results().len(), self.items_per_page)
    }

    pub fn view(&self) -> OverviewView<'_> {
        let results = self.results();
        let total_employees = results.len();
        let pages = total_pages(total_employees, self.items_per_page);
        let window = if self.mobile {
            MOBILE_VISIBLE_PAGE_BUTTONS
        } else {
            MAX_VISIBLE_PAGE_BUTTONS
        };
        let has_filters = self.has_filters();
        let empty_message = (total_employees == 0).then_some(if has_filters {
            EMPTY_WITH_FILTERS
        } else {
            EMPTY_WITHOUT_FILTERS
        });

        OverviewView {
            rows: paginate(&results, self.current_page, self.items_per_page).to_vec(),
            total_employees,
            total_pages: pages,
            current_page: self.current_page,
            items_per_page: self.items_per_page,
            visible_pages: visible_page_numbers(pages, self.current_page, window),
            chips: active_filter_chips(&self.input),
            has_filters,
            empty_message,
            qualification_options: qualification_options(&self.employees),
            can_go_prev: self.current_page > 1,
            can_go_next: self.current_page < pages,
            is_loading: self.load.is_loading(),
            error: self.load_error.as_deref(),
        }
    }

    pub fn dispatch(&mut self, command: OverviewCommand, now: Instant) -> Vec<OverviewEvent> {
        if !self.load.is_active() {
            return Vec::new();
        }
        let before = (self.sort_key, self.sort_direction, self.mobile);
        let page_before = self.current_page;
        let mut events = Vec::new();

        match command {
            OverviewCommand::SetFilter(key, value) => {
                self.input.set(key, value.clone());
                if key.is_debounced()
                    && let Some(debounced) = self.text_filters.get_mut(key)
                {
                    debounced.schedule(value, now);
                } else {
                    self.apply_filter(key, value, &mut events);
                }
            }
            OverviewCommand::ClearFilter(key) => {
                self.clear_filter(key);
                self.current_page = 1;
            }
            OverviewCommand::ResetFilters => {
                for key in FilterKey::ALL {
                    self.clear_filter(key);
                }
                self.current_page = 1;
            }
            OverviewCommand::Sort(key) => {
                if self.sort_key == Some(key) {
                    self.sort_direction = self.sort_direction.toggled();
                } else {
                    self.sort_key = Some(key);
                    self.sort_direction = SortDirection::Asc;
                }
            }
            OverviewCommand::SetSort(None) => self.sort_key = None,
            OverviewCommand::SetSort(Some(key)) => {
                self.sort_key = Some(key);
                self.sort_direction = SortDirection::Asc;
            }
            OverviewCommand::GoToPage(page) => {
                self.current_page = page.clamp(1, self.total_pages());
            }
            OverviewCommand::PrevPage => {
                self.current_page = self.current_page.saturating_sub(1).max(1);
            }
            OverviewCommand::NextPage => {
                self.current_page = self.current_page.saturating_add(1).min(self.total_pages());
            }
            OverviewCommand::SetMobileLayout(mobile) => self.mobile = mobile,
            OverviewCommand::Layout(metrics) => self.layout = Some(metrics),
            OverviewCommand::SetItemsPerPage(rows) => {
                self.pinned_items_per_page = Some(rows.max(MIN_ITEMS_PER_PAGE));
            }
            OverviewCommand::Tick => self.settle_filters(now, &mut events),
        }

        if before.0 != self.sort_key || before.1 != self.sort_direction {
            events.push(OverviewEvent::SortChanged(self.sort_key, self.sort_direction));
        }
        if before.2 != self.mobile {
            events.push(OverviewEvent::LayoutModeChanged {
                mobile: self.mobile,
            });
        }
        self.finish_transition(page_before, events)
    }

    fn clear_filter(&mut self, key: FilterKey) {
        self.input.set(key, "");
        self.applied.set(key, "");
        if let Some(debounced) = self.text_filters.get_mut(key) {
            debounced.set_now(String::new());
        }
    }

    fn settle_filters(&mut self, now: Instant, events: &mut Vec<OverviewEvent>) {
        for key in FilterKey::ALL {
            let fired = self
                .text_filters
                .get_mut(key)
                .and_then(|debounced| debounced.poll(now).cloned());
            if let Some(value) = fired {
                self.apply_filter(key, value, events);
            }
        }
    }

    fn apply_filter(&mut self, key: FilterKey, value: String, events: &mut Vec<OverviewEvent>) {
        let effective = !filter_values_equal(self.applied.get(key), &value);
        self.applied.set(key, value);
        if effective {
            tracing::debug!(filter = key.as_str(), "filter applied");
            self.current_page = 1;
            events.push(OverviewEvent::FilterApplied(key));
        }
    }

    fn recompute_items_per_page(&mut self) {
        let next = if let Some(rows) = self.pinned_items_per_page {
            Some(rows)
        } else if self.mobile {
            Some(MOBILE_ITEMS_PER_PAGE)
        } else {
            self.layout.and_then(|metrics| metrics.rows_that_fit())
        };
        if let Some(next) = next {
            self.items_per_page = next;
        }
    }

    /// Shared tail of every transition: page size, clamp, persist, notify.
    fn finish_transition(
        &mut self,
        page_before: usize,
        mut events: Vec<OverviewEvent>,
    ) -> Vec<OverviewEvent> {
        let rows_before = self.items_per_page;

        self.recompute_items_per_page();
        if self.loaded {
            let pages = self.total_pages();
            if self.current_page > pages {
                self.current_page = pages;
            }
        }

        if rows_before != self.items_per_page {
            events.push(OverviewEvent::ItemsPerPageChanged(self.items_per_page));
        }
        if page_before != self.current_page {
            events.push(OverviewEvent::PageChanged(self.current_page));
        }
        if self.persist() {
            events.push(OverviewEvent::Persisted);
        }

        for event in &events {
            self.events.emit(event);
        }
        events
    }

    fn persist(&mut self) -> bool {
        let snapshot = self.snapshot();
        if self.last_persisted.as_ref() == Some(&snapshot) {
            return false;
        }
        match save_persisted_overview_state(self.store.as_ref(), &snapshot) {
            Ok(()) => {
                self.last_persisted = Some(snapshot);
                true
            }
            Err(error) => {
                tracing::warn!(error = %error, "overview state not persisted");
                false
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        self.load.is_loading()
    }

    pub fn begin_load(&mut self) -> LoadTicket {
        self.load.begin()
    }

    /// Applies a list response. Responses for superseded tickets, or that
    /// arrive after teardown, are dropped.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: RepoResult<Vec<Employee>>,
    ) -> Vec<OverviewEvent> {
        if !self.load.accept(ticket) {
            return Vec::new();
        }
        let page_before = self.current_page;
        let mut events = Vec::new();
        match result {
            Ok(employees) => {
                tracing::debug!(count = employees.len(), "employees loaded");
                events.push(OverviewEvent::EmployeesLoaded(employees.len()));
                self.employees = employees;
                self.loaded = true;
                self.load_error = None;
            }
            Err(error) => {
                tracing::warn!(error = %error, "employee list failed to load");
                let message = error.to_string();
                events.push(OverviewEvent::LoadFailed(message.clone()));
                self.load_error = Some(message);
            }
        }
        self.finish_transition(page_before, events)
    }

    pub fn refresh(&mut self, repo: &dyn Repository) -> Vec<OverviewEvent> {
        let ticket = self.begin_load();
        let result = repo.list_employees();
        self.finish_load(ticket, result)
    }

    pub fn pending_delete(&self) -> Option<&DeleteTarget> {
        self.pending_delete.as_ref()
    }

    pub fn is_deleting(&self) -> bool {
        self.deleting
    }

    pub fn request_delete(&mut self, id: &EmployeeId) -> Vec<OverviewEvent> {
        let Some(employee) = self.employees.iter().find(|employee| &employee.id == id) else {
            return Vec::new();
        };
        let target = DeleteTarget {
            id: employee.id.clone(),
            name: employee.full_name(),
        };
        self.pending_delete = Some(target.clone());
        let event = OverviewEvent::DeletePrompted {
            id: target.id,
            name: target.name,
        };
        self.events.emit(&event);
        vec![event]
    }

    /// Closes the confirmation unless a delete is already running.
    pub fn cancel_delete(&mut self) -> Vec<OverviewEvent> {
        if self.deleting || self.pending_delete.take().is_none() {
            return Vec::new();
        }
        self.events.emit(&OverviewEvent::DeleteCancelled);
        vec![OverviewEvent::DeleteCancelled]
    }

    /// Deletes the confirmed employee, notifies, and reloads the list on
    /// success. On failure the confirmation stays open.
    pub fn confirm_delete(
        &mut self,
        repo: &dyn Repository,
        notifier: &dyn Notifier,
    ) -> Vec<OverviewEvent> {
        let Some(target) = self.pending_delete.clone() else {
            return Vec::new();
        };
        self.deleting = true;
        let result = repo.delete_employee(&target.id);
        self.deleting = false;

        match result {
            Ok(()) => {
                notifier.notify(Notification::success("employee deleted"));
                self.pending_delete = None;
                let deleted = OverviewEvent::EmployeeDeleted(target.id);
                self.events.emit(&deleted);
                let mut events = vec![deleted];
                events.extend(self.refresh(repo));
                events
            }
            Err(error) => {
                tracing::warn!(employee = %target.id, error = %error, "employee delete failed");
                notifier.notify(Notification::error("delete failed", error.to_string()));
                Vec::new()
            }
        }
    }

    /// Stops timers and drops any in-flight load.
    pub fn teardown(&mut self) {
        self.text_filters.cancel_all();
        self.load.teardown();
    }
}
