// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::qualifications::{QualificationCatalog, assign_label, labels_match, normalize_label};
use crate::{Employee, Notification, Notifier, Repository};

static POSTCODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{5}$").expect("valid regex"));
static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9+()\-/\s]{6,20}$").expect("valid regex"));

pub const FORM_ERROR_SUMMARY: &str = "fix the highlighted fields";
pub const ALREADY_ASSIGNED: &str = "already assigned to this employee";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EmployeeField {
    FirstName,
    LastName,
    Phone,
    City,
    Street,
    Postcode,
}

impl EmployeeField {
    pub const ALL: [Self; 6] = [
        Self::FirstName,
        Self::LastName,
        Self::Phone,
        Self::City,
        Self::Street,
        Self::Postcode,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FirstName => "vorname",
            Self::LastName => "nachname",
            Self::Phone => "telefonnummer",
            Self::City => "standort",
            Self::Street => "street",
            Self::Postcode => "postcode",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::FirstName => "first name",
            Self::LastName => "last name",
            Self::Phone => "phone",
            Self::City => "city",
            Self::Street => "street",
            Self::Postcode => "postcode",
        }
    }
}

pub type FieldErrors = BTreeMap<EmployeeField, &'static str>;

/// An employee without its id. The default value is the blank form: every
/// field present, every string empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeFormData {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub city: String,
    pub street: String,
    pub postcode: String,
    pub qualifications: Vec<String>,
}

impl From<&Employee> for EmployeeFormData {
    fn from(employee: &Employee) -> Self {
        Self {
            first_name: employee.first_name.clone(),
            last_name: employee.last_name.clone(),
            phone: employee.phone.clone(),
            city: employee.city.clone(),
            street: employee.street.clone(),
            postcode: employee.postcode.clone(),
            qualifications: employee.qualifications.clone(),
        }
    }
}

impl EmployeeFormData {
    pub fn get(&self, field: EmployeeField) -> &str {
        match field {
            EmployeeField::FirstName => &self.first_name,
            EmployeeField::LastName => &self.last_name,
            EmployeeField::Phone => &self.phone,
            EmployeeField::City => &self.city,
            EmployeeField::Street => &self.street,
            EmployeeField::Postcode => &self.postcode,
        }
    }

    pub fn set(&mut self, field: EmployeeField, value: impl Into<String>) {
        let value = value.into();
        match field {
            EmployeeField::FirstName => self.first_name = value,
            EmployeeField::LastName => self.last_name = value,
            EmployeeField::Phone => self.phone = value,
            EmployeeField::City => self.city = value,
            EmployeeField::Street => self.street = value,
            EmployeeField::Postcode => self.postcode = value,
        }
    }

    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.first_name.trim().is_empty() {
            errors.insert(EmployeeField::FirstName, "enter a first name");
        }
        if self.last_name.trim().is_empty() {
            errors.insert(EmployeeField::LastName, "enter a last name");
        }
        if self.city.trim().is_empty() {
            errors.insert(EmployeeField::City, "enter a city");
        }
        if self.street.trim().is_empty() {
            errors.insert(EmployeeField::Street, "enter a street");
        }
        if !POSTCODE_PATTERN.is_match(self.postcode.trim()) {
            errors.insert(EmployeeField::Postcode, "enter a 5-digit postcode");
        }
        if !PHONE_PATTERN.is_match(self.phone.trim()) {
            errors.insert(EmployeeField::Phone, "enter a valid phone number");
        }
        errors
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum QualificationChoice {
    #[default]
    None,
    Existing(String),
    CreateNew,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome<T> {
    Busy,
    Blocked,
    Submitted(T),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    Ignored,
    Leave,
    ConfirmRequired,
}

/// Edit state for one employee form.
#[derive(Debug, Clone, Default)]
pub struct EmployeeForm {
    baseline: EmployeeFormData,
    data: EmployeeFormData,
    touched: BTreeSet<EmployeeField>,
    submit_attempted: bool,
    submitting: bool,
    creating_qualification: bool,
    confirm_cancel: bool,
    choice: QualificationChoice,
    new_qualification: String,
    qualification_error: Option<String>,
}

impl EmployeeForm {
    pub fn new(baseline: EmployeeFormData) -> Self {
        Self {
            data: baseline.clone(),
            baseline,
            ..Self::default()
        }
    }

    pub fn for_employee(employee: &Employee) -> Self {
        Self::new(EmployeeFormData::from(employee))
    }

    /// Replaces the baseline and discards every edit.
    pub fn reset(&mut self, baseline: EmployeeFormData) {
        *self = Self::new(baseline);
    }

    pub fn data(&self) -> &EmployeeFormData {
        &self.data
    }

    pub fn baseline(&self) -> &EmployeeFormData {
        &self.baseline
    }

    pub fn set_field(&mut self, field: EmployeeField, value: impl Into<String>) {
        self.data.set(field, value);
    }

    pub fn touch(&mut self, field: EmployeeField) {
        self.touched.insert(field);
    }

    pub fn is_touched(&self, field: EmployeeField) -> bool {
        self.touched.contains(&field)
    }

    pub fn errors(&self) -> FieldErrors {
        self.data.validate()
    }

    /// The error for `field`, once the field was touched or a submit was tried.
    pub fn visible_error(&self, field: EmployeeField) -> Option<&'static str> {
        if !(self.submit_attempted || self.is_touched(field)) {
            return None;
        }
        self.errors().get(&field).copied()
    }

    pub fn summary(&self) -> Option<&'static str> {
        (self.submit_attempted && !self.errors().is_empty()).then_some(FORM_ERROR_SUMMARY)
    }

    /// Order-sensitive: reordering qualifications makes the form dirty.
    pub fn is_dirty(&self) -> bool {
        self.data != self.baseline
    }

    pub fn is_busy(&self) -> bool {
        self.submitting || self.creating_qualification
    }

    pub fn submit_attempted(&self) -> bool {
        self.submit_attempted
    }

    /// Marks the attempt and, when the data is valid, hands it to `handler`.
    pub fn submit<T>(&mut self, handler: impl FnOnce(&EmployeeFormData) -> T) -> SubmitOutcome<T> {
        if self.is_busy() {
            return SubmitOutcome::Busy;
        }
        self.submit_attempted = true;
        let errors = self.errors();
        if !errors.is_empty() {
            tracing::debug!(fields = errors.len(), "submit blocked by validation");
            return SubmitOutcome::Blocked;
        }
        self.submitting = true;
        let result = handler(&self.data);
        self.submitting = false;
        SubmitOutcome::Submitted(result)
    }

    pub fn request_cancel(&mut self) -> CancelOutcome {
        if self.is_busy() {
            return CancelOutcome::Ignored;
        }
        if !self.is_dirty() {
            return CancelOutcome::Leave;
        }
        self.confirm_cancel = true;
        CancelOutcome::ConfirmRequired
    }

    pub fn is_confirming_cancel(&self) -> bool {
        self.confirm_cancel
    }

    pub fn confirm_cancel(&mut self) -> CancelOutcome {
        self.confirm_cancel = false;
        CancelOutcome::Leave
    }

    pub fn keep_editing(&mut self) {
        self.confirm_cancel = false;
    }

    pub fn remove_qualification(&mut self, label: &str) {
        self.data.qualifications.retain(|assigned| assigned != label);
    }

    pub fn choice(&self) -> &QualificationChoice {
        &self.choice
    }

    pub fn choose(&mut self, choice: QualificationChoice) {
        if choice != QualificationChoice::CreateNew {
            self.new_qualification.clear();
        }
        self.choice = choice;
        self.qualification_error = None;
    }

    pub fn set_new_qualification(&mut self, value: impl Into<String>) {
        self.new_qualification = value.into();
    }

    pub fn new_qualification(&self) -> &str {
        &self.new_qualification
    }

    pub fn qualification_error(&self) -> Option<&str> {
        self.qualification_error.as_deref()
    }

    /// Catalog labels not already assigned (exact comparison).
    pub fn selectable_qualifications<'a>(&self, catalog: &'a QualificationCatalog) -> Vec<&'a str> {
        catalog
            .labels()
            .filter(|label| !self.data.qualifications.iter().any(|assigned| assigned == label))
            .collect()
    }

    pub fn can_add_qualification(&self) -> bool {
        if self.is_busy() {
            return false;
        }
        match &self.choice {
            QualificationChoice::None => false,
            QualificationChoice::Existing(_) => true,
            QualificationChoice::CreateNew => !self.new_qualification.trim().is_empty(),
        }
    }

    /// Adds the picked qualification. A "create new" pick goes through
    /// [`QualificationCatalog::ensure`] and reports the outcome through
    /// `notifier`. Returns whether the assigned list changed.
    pub fn add_qualification(
        &mut self,
        catalog: &mut QualificationCatalog,
        repo: &dyn Repository,
        notifier: &dyn Notifier,
    ) -> bool {
        if self.is_busy() {
            return false;
        }

        let label = match &self.choice {
            QualificationChoice::None => return false,
            QualificationChoice::Existing(label) => {
                let label = label.clone();
                let changed = assign_label(&mut self.data.qualifications, &label);
                self.clear_picker();
                return changed;
            }
            QualificationChoice::CreateNew => normalize_label(&self.new_qualification).to_owned(),
        };

        if label.is_empty() {
            self.qualification_error = Some("enter a qualification".to_owned());
            return false;
        }
        if self
            .data
            .qualifications
            .iter()
            .any(|assigned| labels_match(assigned, &label))
        {
            self.qualification_error = Some(ALREADY_ASSIGNED.to_owned());
            return false;
        }

        self.creating_qualification = true;
        self.qualification_error = None;
        let ensured = catalog.ensure(repo, &label);
        self.creating_qualification = false;

        match ensured {
            Ok(ensured) => {
                let skill = ensured.qualification.skill;
                let changed = assign_label(&mut self.data.qualifications, &skill);
                self.clear_picker();
                let title = if ensured.created {
                    "qualification created and added"
                } else {
                    "existing qualification added"
                };
                notifier.notify(Notification::success(title).with_message(skill));
                changed
            }
            Err(error) => {
                let message = error.to_string();
                tracing::warn!(label = %label, error = %message, "qualification could not be ensured");
                self.qualification_error = Some(message.clone());
                notifier.notify(Notification::error(
                    "qualification could not be created",
                    message,
                ));
                false
            }
        }
    }

    fn clear_picker(&mut self) {
        self.choice = QualificationChoice::None;
        self.new_qualification.clear();
        self.qualification_error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::{
        CancelOutcome, EmployeeField, EmployeeForm, EmployeeFormData, FORM_ERROR_SUMMARY,
        QualificationChoice, SubmitOutcome,
    };
    use crate::QualificationCatalog;
    use crate::{Qualification, QualificationId};

    fn valid_data() -> EmployeeFormData {
        EmployeeFormData {
            first_name: "Anna".to_owned(),
            last_name: "Becker".to_owned(),
            phone: "+49 30 123456".to_owned(),
            city: "Berlin".to_owned(),
            street: "Hauptstr. 1".to_owned(),
            postcode: "10115".to_owned(),
            qualifications: vec!["Java".to_owned(), "SQL".to_owned()],
        }
    }

    #[test]
    fn blank_form_reports_every_field() {
        let errors = EmployeeFormData::default().validate();
        assert_eq!(errors.len(), EmployeeField::ALL.len());
        assert!(valid_data().validate().is_empty());
    }

    #[test]
    fn postcode_and_phone_patterns() {
        let mut data = valid_data();
        for (postcode, ok) in [("1234", false), ("123456", false), ("12a45", false), (" 12345 ", true)] {
            data.postcode = postcode.to_owned();
            assert_eq!(
                !data.validate().contains_key(&EmployeeField::Postcode),
                ok,
                "postcode {postcode:?}"
            );
        }
        for (phone, ok) in [
            ("12345", false),
            ("(030) 123-45/6", true),
            ("+49 170 1234567", true),
            ("0301234567890123456789", false),
            ("030 call me", false),
        ] {
            data.phone = phone.to_owned();
            assert_eq!(
                !data.validate().contains_key(&EmployeeField::Phone),
                ok,
                "phone {phone:?}"
            );
        }
    }

    #[test]
    fn required_fields_reject_whitespace() {
        let mut data = valid_data();
        data.street = "   ".to_owned();
        assert_eq!(
            data.validate().get(&EmployeeField::Street).copied(),
            Some("enter a street")
        );
    }

    #[test]
    fn errors_stay_hidden_until_touched_or_submitted() {
        let mut form = EmployeeForm::new(EmployeeFormData::default());
        assert_eq!(form.visible_error(EmployeeField::FirstName), None);

        form.touch(EmployeeField::FirstName);
        assert_eq!(
            form.visible_error(EmployeeField::FirstName),
            Some("enter a first name")
        );
        assert_eq!(form.visible_error(EmployeeField::City), None);

        assert_eq!(form.submit(|_| ()), SubmitOutcome::Blocked);
        assert!(form.visible_error(EmployeeField::City).is_some());
        assert_eq!(form.summary(), Some(FORM_ERROR_SUMMARY));
    }

    #[test]
    fn valid_submit_reaches_handler() {
        let mut form = EmployeeForm::new(valid_data());
        let outcome = form.submit(|data| data.first_name.clone());
        assert_eq!(outcome, SubmitOutcome::Submitted("Anna".to_owned()));
        assert_eq!(form.summary(), None);
    }

    #[test]
    fn dirty_is_order_sensitive() {
        let mut form = EmployeeForm::new(valid_data());
        assert!(!form.is_dirty());

        form.set_field(EmployeeField::City, "Berlin");
        assert!(!form.is_dirty());

        form.remove_qualification("Java");
        assert!(form.is_dirty());

        form.reset(valid_data());
        assert!(!form.is_dirty());
        let mut reordered = valid_data();
        reordered.qualifications.reverse();
        let form = EmployeeForm {
            data: reordered,
            ..EmployeeForm::new(valid_data())
        };
        assert!(form.is_dirty());
    }

    #[test]
    fn cancel_needs_confirmation_only_when_dirty() {
        let mut form = EmployeeForm::new(valid_data());
        assert_eq!(form.request_cancel(), CancelOutcome::Leave);

        form.set_field(EmployeeField::LastName, "Braun");
        assert_eq!(form.request_cancel(), CancelOutcome::ConfirmRequired);
        assert!(form.is_confirming_cancel());

        form.keep_editing();
        assert!(!form.is_confirming_cancel());
        assert_eq!(form.data().last_name, "Braun");

        form.request_cancel();
        assert_eq!(form.confirm_cancel(), CancelOutcome::Leave);
    }

    #[test]
    fn reset_clears_touched_and_picker() {
        let mut form = EmployeeForm::new(valid_data());
        form.touch(EmployeeField::Street);
        form.choose(QualificationChoice::CreateNew);
        form.set_new_qualification("Rust");
        form.submit(|_| ());

        form.reset(EmployeeFormData::default());
        assert!(!form.is_touched(EmployeeField::Street));
        assert!(!form.submit_attempted());
        assert_eq!(form.choice(), &QualificationChoice::None);
        assert_eq!(form.new_qualification(), "");
    }

    #[test]
    fn selectable_excludes_assigned_labels() {
        let catalog = QualificationCatalog::from_items(
            ["Java", "SQL", "Rust"]
                .into_iter()
                .enumerate()
                .map(|(index, skill)| Qualification {
                    id: QualificationId::new(index as i64 + 1),
                    skill: skill.to_owned(),
                })
                .collect(),
        );
        let form = EmployeeForm::new(valid_data());
        assert_eq!(form.selectable_qualifications(&catalog), vec!["Rust"]);
    }

    #[test]
    fn can_add_requires_a_choice_and_a_name() {
        let mut form = EmployeeForm::new(valid_data());
        assert!(!form.can_add_qualification());

        form.choose(QualificationChoice::CreateNew);
        assert!(!form.can_add_qualification());
        form.set_new_qualification("  ");
        assert!(!form.can_add_qualification());
        form.set_new_qualification("Go");
        assert!(form.can_add_qualification());

        form.choose(QualificationChoice::Existing("Rust".to_owned()));
        assert!(form.can_add_qualification());
        assert_eq!(form.new_qualification(), "");
    }
}
