// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::time::Instant;

use thiserror::Error;

use crate::debounce::{Debounced, FILTER_DEBOUNCE};
use crate::{Employee, EmployeeId, Qualification, QualificationId, RepoError, RepoResult, Repository};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnsureError {
    #[error("enter a qualification")]
    EmptyLabel,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnsuredQualification {
    pub qualification: Qualification,
    pub created: bool,
}

pub fn normalize_label(label: &str) -> &str {
    label.trim()
}

pub fn labels_match(left: &str, right: &str) -> bool {
    left.trim().to_lowercase() == right.trim().to_lowercase()
}

/// Appends `label` unless a case-insensitive duplicate is already assigned.
/// Returns whether the list changed.
pub fn assign_label(assigned: &mut Vec<String>, label: &str) -> bool {
    let label = normalize_label(label);
    if label.is_empty() || assigned.iter().any(|existing| labels_match(existing, label)) {
        return false;
    }
    assigned.push(label.to_owned());
    true
}

/// Local copy of the remote qualification catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QualificationCatalog {
    items: Vec<Qualification>,
}

impl QualificationCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<Qualification>) -> Self {
        Self { items }
    }

    pub fn load(repo: &dyn Repository) -> RepoResult<Self> {
        Ok(Self::from_items(repo.list_qualifications()?))
    }

    pub fn items(&self) -> &[Qualification] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.skill.as_str())
    }

    pub fn find(&self, label: &str) -> Option<&Qualification> {
        let wanted = normalize_label(label);
        if wanted.is_empty() {
            return None;
        }
        self.items.iter().find(|item| labels_match(&item.skill, wanted))
    }

    pub fn get(&self, id: QualificationId) -> Option<&Qualification> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn refresh(&mut self, repo: &dyn Repository) -> RepoResult<()> {
        self.items = repo.list_qualifications()?;
        tracing::debug!(count = self.items.len(), "qualification catalog refreshed");
        Ok(())
    }

    /// Adds `qualification` unless an entry with the same id exists.
    pub fn merge(&mut self, qualification: Qualification) -> bool {
        if self.get(qualification.id).is_some() {
            return false;
        }
        self.items.push(qualification);
        true
    }

    /// Find-or-create. The lookup path performs no write; the create path
    /// refreshes the catalog and falls back to merging the created record
    /// when the refreshed listing does not contain it yet.
    pub fn ensure(
        &mut self,
        repo: &dyn Repository,
        label: &str,
    ) -> Result<EnsuredQualification, EnsureError> {
        let label = normalize_label(label);
        if label.is_empty() {
            return Err(EnsureError::EmptyLabel);
        }

        if let Some(existing) = self.find(label) {
            return Ok(EnsuredQualification {
                qualification: existing.clone(),
                created: false,
            });
        }

        let created = repo.create_qualification(label)?;
        tracing::debug!(id = %created.id, skill = %created.skill, "qualification created");

        if let Err(error) = self.refresh(repo) {
            tracing::warn!(error = %error, "catalog refresh after create failed");
        }
        if let Some(found) = self.find(label) {
            return Ok(EnsuredQualification {
                qualification: found.clone(),
                created: true,
            });
        }

        tracing::debug!(id = %created.id, "created qualification missing from refreshed catalog");
        self.merge(created.clone());
        Ok(EnsuredQualification {
            qualification: created,
            created: true,
        })
    }

    /// Creates the trimmed label remotely and adds the result locally.
    pub fn create(&mut self, repo: &dyn Repository, label: &str) -> RepoResult<Qualification> {
        let created = repo.create_qualification(normalize_label(label))?;
        self.merge(created.clone());
        Ok(created)
    }

    /// Renames remotely and replaces the local entry with the same id.
    pub fn rename(
        &mut self,
        repo: &dyn Repository,
        id: QualificationId,
        label: &str,
    ) -> RepoResult<Qualification> {
        let updated = repo.update_qualification(id, normalize_label(label))?;
        match self.items.iter_mut().find(|item| item.id == id) {
            Some(item) => *item = updated.clone(),
            None => self.items.push(updated.clone()),
        }
        Ok(updated)
    }

    /// Detaches the qualification from every employee that carries its
    /// label, then deletes it. Detach failures are collected, not fatal.
    pub fn delete_cascade(
        &mut self,
        repo: &dyn Repository,
        id: QualificationId,
        employees: &[Employee],
    ) -> RepoResult<CascadeReport> {
        let skill = match self.get(id) {
            Some(qualification) => qualification.skill.clone(),
            None => repo
                .list_qualifications()?
                .into_iter()
                .find(|qualification| qualification.id == id)
                .map(|qualification| qualification.skill)
                .unwrap_or_default(),
        };

        let mut report = CascadeReport::default();
        if !skill.is_empty() {
            for employee in employees.iter().filter(|e| e.has_qualification(&skill)) {
                match repo.detach_qualification(&employee.id, id) {
                    Ok(()) => report.detached.push(employee.id.clone()),
                    Err(error) => {
                        tracing::warn!(
                            employee = %employee.id,
                            qualification = %id,
                            error = %error,
                            "detach failed; deleting anyway"
                        );
                        report.failed.push((employee.id.clone(), error));
                    }
                }
            }
        }

        repo.delete_qualification(id)?;
        self.items.retain(|item| item.id != id);
        if let Err(error) = self.refresh(repo) {
            tracing::warn!(error = %error, "catalog refresh after delete failed");
        }
        Ok(report)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeReport {
    pub detached: Vec<EmployeeId>,
    pub failed: Vec<(EmployeeId, RepoError)>,
}

impl CascadeReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Case-insensitive substring match over catalog labels; a blank query
/// keeps everything.
pub fn search_qualifications<'a>(items: &'a [Qualification], query: &str) -> Vec<&'a Qualification> {
    let needle = query.trim().to_lowercase();
    items
        .iter()
        .filter(|item| needle.is_empty() || item.skill.to_lowercase().contains(&needle))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogMode {
    Add,
    Edit,
    Delete,
}

impl DialogMode {
    pub const fn title(self) -> &'static str {
        match self {
            Self::Add => "New qualification",
            Self::Edit => "Edit qualification",
            Self::Delete => "Delete qualification",
        }
    }

    pub const fn confirm_label(self) -> &'static str {
        match self {
            Self::Delete => "Delete",
            Self::Add | Self::Edit => "Save",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualificationDialog {
    pub mode: DialogMode,
    pub input: String,
    pub selected: Option<Qualification>,
}

/// Qualification management screen: catalog, debounced search and the
/// add/edit/delete dialog.
#[derive(Debug, Clone)]
pub struct QualificationManager {
    catalog: QualificationCatalog,
    search: Debounced<String>,
    search_input: String,
    dialog: Option<QualificationDialog>,
    error: Option<String>,
}

impl Default for QualificationManager {
    fn default() -> Self {
        Self::new(QualificationCatalog::new())
    }
}

impl QualificationManager {
    pub fn new(catalog: QualificationCatalog) -> Self {
        Self {
            catalog,
            search: Debounced::new(String::new(), FILTER_DEBOUNCE),
            search_input: String::new(),
            dialog: None,
            error: None,
        }
    }

    pub fn catalog(&self) -> &QualificationCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut QualificationCatalog {
        &mut self.catalog
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn reload(&mut self, repo: &dyn Repository) -> RepoResult<()> {
        match self.catalog.refresh(repo) {
            Ok(()) => {
                self.error = None;
                Ok(())
            }
            Err(error) => {
                self.error = Some(error.to_string());
                Err(error)
            }
        }
    }

    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    pub fn set_search(&mut self, query: impl Into<String>, now: Instant) {
        self.search_input = query.into();
        self.search.schedule(self.search_input.clone(), now);
    }

    /// Returns true when the applied search changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.search.poll(now).is_some()
    }

    pub fn applied_search(&self) -> &str {
        self.search.value()
    }

    pub fn visible(&self) -> Vec<&Qualification> {
        search_qualifications(self.catalog.items(), self.search.value())
    }

    pub fn dialog(&self) -> Option<&QualificationDialog> {
        self.dialog.as_ref()
    }

    pub fn open_add(&mut self) {
        self.dialog = Some(QualificationDialog {
            mode: DialogMode::Add,
            input: String::new(),
            selected: None,
        });
    }

    pub fn open_edit(&mut self, qualification: Qualification) {
        self.dialog = Some(QualificationDialog {
            mode: DialogMode::Edit,
            input: qualification.skill.clone(),
            selected: Some(qualification),
        });
    }

    pub fn open_delete(&mut self, qualification: Qualification) {
        self.dialog = Some(QualificationDialog {
            mode: DialogMode::Delete,
            input: String::new(),
            selected: Some(qualification),
        });
    }

    pub fn set_dialog_input(&mut self, value: impl Into<String>) {
        if let Some(dialog) = self.dialog.as_mut() {
            dialog.input = value.into();
        }
    }

    pub fn close_dialog(&mut self) {
        self.dialog = None;
    }

    /// Applies the open dialog. On success the dialog closes and the catalog
    /// is reloaded; on failure the dialog stays open with the error recorded.
    pub fn save(&mut self, repo: &dyn Repository, employees: &[Employee]) -> RepoResult<()> {
        let Some(dialog) = self.dialog.clone() else {
            return Ok(());
        };
        let label = normalize_label(&dialog.input);

        let outcome = match (dialog.mode, dialog.selected.as_ref()) {
            (DialogMode::Add, _) => self.catalog.create(repo, label).map(drop),
            (DialogMode::Edit, Some(selected)) => {
                self.catalog.rename(repo, selected.id, label).map(drop)
            }
            (DialogMode::Delete, Some(selected)) => self
                .catalog
                .delete_cascade(repo, selected.id, employees)
                .map(drop),
            (DialogMode::Edit | DialogMode::Delete, None) => Ok(()),
        };
        if let Err(error) = outcome {
            self.error = Some(error.to_string());
            return Err(error);
        }

        self.close_dialog();
        self.reload(repo)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        DialogMode, QualificationCatalog, assign_label, labels_match, search_qualifications,
    };
    use crate::{Qualification, QualificationId};

    fn skill(id: i64, label: &str) -> Qualification {
        Qualification {
            id: QualificationId::new(id),
            skill: label.to_owned(),
        }
    }

    #[test]
    fn assign_label_ignores_case_insensitive_duplicates() {
        let mut assigned = vec!["Java".to_owned(), "SQL".to_owned()];
        assert!(!assign_label(&mut assigned, "java"));
        assert!(!assign_label(&mut assigned, "  SQL "));
        assert!(!assign_label(&mut assigned, "   "));
        assert_eq!(assigned, vec!["Java", "SQL"]);

        assert!(assign_label(&mut assigned, " Rust "));
        assert_eq!(assigned, vec!["Java", "SQL", "Rust"]);
    }

    #[test]
    fn labels_match_trims_and_folds_case() {
        assert!(labels_match(" Java", "JAVA "));
        assert!(!labels_match("Java", "JavaScript"));
    }

    #[test]
    fn find_is_case_insensitive_and_rejects_blank() {
        let catalog = QualificationCatalog::from_items(vec![skill(1, "Java"), skill(2, "SQL")]);
        assert_eq!(catalog.find("sql").map(|q| q.id.get()), Some(2));
        assert_eq!(catalog.find("  "), None);
        assert_eq!(catalog.find("Go"), None);
    }

    #[test]
    fn merge_is_idempotent_by_id() {
        let mut catalog = QualificationCatalog::from_items(vec![skill(1, "Java")]);
        assert!(!catalog.merge(skill(1, "Java")));
        assert!(catalog.merge(skill(2, "Go")));
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn search_filters_by_substring() {
        let items = vec![skill(1, "Java"), skill(2, "JavaScript"), skill(3, "SQL")];
        let hits: Vec<&str> = search_qualifications(&items, "  JAVA")
            .into_iter()
            .map(|q| q.skill.as_str())
            .collect();
        assert_eq!(hits, vec!["Java", "JavaScript"]);
        assert_eq!(search_qualifications(&items, "").len(), 3);
    }

    #[test]
    fn dialog_modes_carry_titles_and_labels() {
        assert_eq!(DialogMode::Add.title(), "New qualification");
        assert_eq!(DialogMode::Edit.confirm_label(), "Save");
        assert_eq!(DialogMode::Delete.confirm_label(), "Delete");
    }
}
