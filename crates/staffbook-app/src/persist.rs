// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::{EmployeeFilters, SortDirection, SortKey};

pub const OVERVIEW_STATE_KEY: &str = "employeeOverview.uiState.v1";

/// String-keyed persistent store for UI state. Writes are best-effort from
/// the caller's point of view; errors are reported but never fatal.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::default();
        store
            .entries
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
        store
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedOverviewState {
    pub filters: EmployeeFilters,
    pub sort_key: Option<SortKey>,
    pub sort_direction: SortDirection,
    pub current_page: usize,
}

impl Default for PersistedOverviewState {
    fn default() -> Self {
        Self {
            filters: EmployeeFilters::default(),
            sort_key: None,
            sort_direction: SortDirection::Asc,
            current_page: 1,
        }
    }
}

impl PersistedOverviewState {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("serialize overview state")
    }

    /// Strict shape check: every field present with the exact expected type.
    /// Anything else is treated as "nothing stored".
    pub fn parse(raw: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(raw).ok()?;
        let object = value.as_object()?;

        let filters = object.get("filters")?.as_object()?;
        let text = |name: &str| filters.get(name)?.as_str().map(str::to_owned);
        let filters = EmployeeFilters {
            first_name: text("vorname")?,
            last_name: text("nachname")?,
            city: text("standort")?,
            qualification: text("qualifikation")?,
        };

        let sort_key = match object.get("sortKey")? {
            Value::Null => None,
            Value::String(key) => Some(SortKey::parse(key)?),
            _ => return None,
        };

        let sort_direction = SortDirection::parse(object.get("sortDirection")?.as_str()?)?;
        let current_page = positive_integer(object.get("currentPage")?)?;

        Some(Self {
            filters,
            sort_key,
            sort_direction,
            current_page,
        })
    }
}

fn positive_integer(value: &Value) -> Option<usize> {
    if let Some(page) = value.as_u64() {
        return (page > 0).then(|| usize::try_from(page).ok()).flatten();
    }
    let page = value.as_f64()?;
    if page.fract() == 0.0 && page >= 1.0 && page <= usize::MAX as f64 {
        return Some(page as usize);
    }
    None
}

pub fn load_persisted_overview_state(store: &dyn KeyValueStore) -> Option<PersistedOverviewState> {
    let raw = match store.get(OVERVIEW_STATE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(error) => {
            tracing::debug!(error = %error, "overview state unreadable; using defaults");
            return None;
        }
    };
    let parsed = PersistedOverviewState::parse(&raw);
    if parsed.is_none() {
        tracing::debug!("stored overview state has an unexpected shape; using defaults");
    }
    parsed
}

pub fn save_persisted_overview_state(
    store: &dyn KeyValueStore,
    state: &PersistedOverviewState,
) -> Result<()> {
    let raw = state.to_json()?;
    store
        .set(OVERVIEW_STATE_KEY, &raw)
        .with_context(|| format!("write {OVERVIEW_STATE_KEY}"))
}
