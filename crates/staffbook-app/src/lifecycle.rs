// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::{Employee, EmployeeId, RepoResult, Repository};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket(u64);

/// Guards async responses: only the latest ticket of a live owner may apply
/// its result.
#[derive(Debug, Clone, Default)]
pub struct LoadTracker {
    issued: u64,
    in_flight: Option<LoadTicket>,
    torn_down: bool,
}

impl LoadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) -> LoadTicket {
        self.issued += 1;
        let ticket = LoadTicket(self.issued);
        self.in_flight = Some(ticket);
        ticket
    }

    /// True when `ticket` is the outstanding load and the owner is still
    /// active. Accepting clears the in-flight marker.
    pub fn accept(&mut self, ticket: LoadTicket) -> bool {
        if self.torn_down || self.in_flight != Some(ticket) {
            tracing::debug!(ticket = ticket.0, "dropping stale load response");
            return false;
        }
        self.in_flight = None;
        true
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn is_active(&self) -> bool {
        !self.torn_down
    }

    pub fn teardown(&mut self) {
        self.torn_down = true;
        self.in_flight = None;
    }
}

type Listener<T> = Box<dyn FnMut(&T)>;

struct HubInner<T> {
    next_id: u64,
    listeners: Vec<(u64, Listener<T>)>,
    released: Vec<u64>,
}

/// Listener registry. Each subscription returns a [`Subscription`] that
/// unsubscribes when disposed or dropped.
pub struct EventHub<T> {
    inner: Rc<RefCell<HubInner<T>>>,
}

impl<T> Default for EventHub<T> {
    fn default() -> Self {
        Self {
            inner: Rc::new(RefCell::new(HubInner {
                next_id: 0,
                listeners: Vec::new(),
                released: Vec::new(),
            })),
        }
    }
}

impl<T: 'static> fmt::Debug for EventHub<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHub")
            .field("listeners", &self.len())
            .finish()
    }
}

impl<T: 'static> EventHub<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: impl FnMut(&T) + 'static) -> Subscription {
        let id = {
            let mut inner = self.inner.borrow_mut();
            inner.next_id += 1;
            let id = inner.next_id;
            inner.listeners.push((id, Box::new(listener)));
            id
        };
        let hub: Weak<RefCell<HubInner<T>>> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(hub) = hub.upgrade() {
                let mut inner = hub.borrow_mut();
                let before = inner.listeners.len();
                inner.listeners.retain(|(listener_id, _)| *listener_id != id);
                if inner.listeners.len() == before {
                    // Released mid-emit; pruned when the listeners come back.
                    inner.released.push(id);
                }
            }
        })
    }

    pub fn emit(&self, event: &T) {
        let mut listeners = std::mem::take(&mut self.inner.borrow_mut().listeners);
        for (_, listener) in &mut listeners {
            listener(event);
        }
        let mut inner = self.inner.borrow_mut();
        listeners.append(&mut inner.listeners);
        let released = std::mem::take(&mut inner.released);
        listeners.retain(|(id, _)| !released.contains(id));
        inner.listeners = listeners;
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Runs its release action exactly once, on [`Subscription::dispose`] or on
/// drop.
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    pub fn dispose(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordState {
    Idle,
    Loading,
    Loaded(Employee),
    Missing,
    Failed(String),
}

/// Loads one employee for the detail and edit screens.
#[derive(Debug, Clone)]
pub struct RecordLoader {
    id: EmployeeId,
    tracker: LoadTracker,
    state: RecordState,
}

impl RecordLoader {
    pub fn new(id: EmployeeId) -> Self {
        Self {
            id,
            tracker: LoadTracker::new(),
            state: RecordState::Idle,
        }
    }

    pub fn id(&self) -> &EmployeeId {
        &self.id
    }

    pub fn state(&self) -> &RecordState {
        &self.state
    }

    pub fn employee(&self) -> Option<&Employee> {
        match &self.state {
            RecordState::Loaded(employee) => Some(employee),
            _ => None,
        }
    }

    pub fn begin(&mut self) -> LoadTicket {
        self.state = RecordState::Loading;
        self.tracker.begin()
    }

    pub fn finish(&mut self, ticket: LoadTicket, result: RepoResult<Option<Employee>>) -> bool {
        if !self.tracker.accept(ticket) {
            return false;
        }
        self.state = match result {
            Ok(Some(employee)) => RecordState::Loaded(employee),
            Ok(None) => RecordState::Missing,
            Err(error) => RecordState::Failed(error.to_string()),
        };
        true
    }

    pub fn load(&mut self, repo: &dyn Repository) -> &RecordState {
        let ticket = self.begin();
        let result = repo.get_employee(&self.id);
        self.finish(ticket, result);
        &self.state
    }

    pub fn teardown(&mut self) {
        self.tracker.teardown();
    }
}
