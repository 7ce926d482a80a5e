// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Pure filter, sort and pagination stages of the employee overview.
//!
//! Each stage takes its input by reference and returns a new view; the
//! source collection is never reordered in place.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::{Employee, EmployeeFilters, FilterChip, FilterKey, SortDirection, SortKey};

pub fn normalize_filter_value(value: &str) -> String {
    value.trim().to_lowercase()
}

pub fn filter_values_equal(left: &str, right: &str) -> bool {
    normalize_filter_value(left) == normalize_filter_value(right)
}

/// A record passes when every active filter matches: substring containment
/// for names and city, exact label equality for the qualification.
pub fn matches_filters(employee: &Employee, filters: &EmployeeFilters) -> bool {
    let contains = |field: &str, needle: &str| {
        let needle = normalize_filter_value(needle);
        needle.is_empty() || field.to_lowercase().contains(&needle)
    };

    let qualification = normalize_filter_value(&filters.qualification);
    let matches_qualification = qualification.is_empty()
        || employee
            .qualifications
            .iter()
            .any(|label| label.to_lowercase() == qualification);

    contains(&employee.first_name, &filters.first_name)
        && contains(&employee.last_name, &filters.last_name)
        && contains(&employee.city, &filters.city)
        && matches_qualification
}

pub fn filter_employees<'a>(
    employees: &'a [Employee],
    filters: &EmployeeFilters,
) -> Vec<&'a Employee> {
    employees
        .iter()
        .filter(|employee| matches_filters(employee, filters))
        .collect()
}

/// Base-strength collation for German-language data: case and accents are
/// ignored, `ß` sorts as `ss`. Letters with no decomposition fold by hand.
pub fn collation_key(value: &str) -> String {
    let mut key = String::with_capacity(value.len());
    for ch in value.nfd().filter(|ch| !is_combining_mark(*ch)) {
        for lower in ch.to_lowercase() {
            match lower {
                'ß' => key.push_str("ss"),
                'æ' => key.push_str("ae"),
                'œ' => key.push_str("oe"),
                'ł' => key.push('l'),
                'ø' => key.push('o'),
                'đ' | 'ð' => key.push('d'),
                'ı' => key.push('i'),
                'ħ' => key.push('h'),
                other => key.push(other),
            }
        }
    }
    key
}

pub fn locale_compare(left: &str, right: &str) -> Ordering {
    collation_key(left).cmp(&collation_key(right))
}

pub fn compare_employees(
    left: &Employee,
    right: &Employee,
    key: SortKey,
    direction: SortDirection,
) -> Ordering {
    let ordering = locale_compare(left.sort_field(key), right.sort_field(key));
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

/// Stable sort; ties keep their filtered order. `None` keeps the input order.
pub fn sort_employees<'a>(
    mut employees: Vec<&'a Employee>,
    key: Option<SortKey>,
    direction: SortDirection,
) -> Vec<&'a Employee> {
    if let Some(key) = key {
        employees.sort_by(|left, right| compare_employees(left, right, key, direction));
    }
    employees
}

pub fn total_pages(total_items: usize, items_per_page: usize) -> usize {
    total_items.div_ceil(items_per_page.max(1)).max(1)
}

pub fn paginate<T>(items: &[T], page: usize, items_per_page: usize) -> &[T] {
    let per_page = items_per_page.max(1);
    let start = page.saturating_sub(1).saturating_mul(per_page);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(per_page).min(items.len());
    &items[start..end]
}

/// Page buttons to show: every page when they fit, otherwise a window of
/// `window_size` pages around `current_page` that slides to stay in range.
pub fn visible_page_numbers(
    total_pages: usize,
    current_page: usize,
    window_size: usize,
) -> Vec<usize> {
    if total_pages <= window_size {
        return (1..=total_pages).collect();
    }
    if window_size == 0 {
        return Vec::new();
    }

    let current = current_page.clamp(1, total_pages);
    let half = window_size / 2;
    let mut start = current.saturating_sub(half).max(1);
    let mut end = start + window_size - 1;
    if end > total_pages {
        end = total_pages;
        start = end + 1 - window_size;
    }
    (start..=end).collect()
}

pub fn active_filter_chips(filters: &EmployeeFilters) -> Vec<FilterChip> {
    FilterKey::ALL
        .into_iter()
        .filter_map(|key| {
            let value = filters.get(key).trim();
            (!value.is_empty()).then(|| FilterChip {
                key,
                label: key.label(),
                value: value.to_owned(),
            })
        })
        .collect()
}

/// Distinct, trimmed qualification labels across all employees.
pub fn qualification_options(employees: &[Employee]) -> Vec<String> {
    let distinct: BTreeSet<&str> = employees
        .iter()
        .flat_map(|employee| employee.qualifications.iter())
        .map(|label| label.trim())
        .filter(|label| !label.is_empty())
        .collect();
    let mut options: Vec<String> = distinct.into_iter().map(str::to_owned).collect();
    options.sort_by(|left, right| locale_compare(left, right));
    options
}
