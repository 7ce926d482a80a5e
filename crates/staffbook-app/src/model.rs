// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

use crate::ids::*;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub city: String,
    pub street: String,
    pub postcode: String,
    /// Qualification labels in assignment order. Related to the catalog by
    /// label, not by id.
    pub qualifications: Vec<String>,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn sort_field(&self, key: SortKey) -> &str {
        match key {
            SortKey::FirstName => &self.first_name,
            SortKey::LastName => &self.last_name,
            SortKey::City => &self.city,
        }
    }

    pub fn has_qualification(&self, label: &str) -> bool {
        let wanted = label.trim().to_lowercase();
        self.qualifications
            .iter()
            .any(|assigned| assigned.to_lowercase() == wanted)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Qualification {
    pub id: QualificationId,
    pub skill: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FilterKey {
    FirstName,
    LastName,
    City,
    Qualification,
}

impl FilterKey {
    pub const ALL: [Self; 4] = [
        Self::FirstName,
        Self::LastName,
        Self::City,
        Self::Qualification,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FirstName => "vorname",
            Self::LastName => "nachname",
            Self::City => "standort",
            Self::Qualification => "qualifikation",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::FirstName => "first name",
            Self::LastName => "last name",
            Self::City => "city",
            Self::Qualification => "qualification",
        }
    }

    /// Free-text filters wait for typing to settle; the qualification filter
    /// is a closed choice and applies at once.
    pub const fn is_debounced(self) -> bool {
        !matches!(self, Self::Qualification)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortKey {
    #[serde(rename = "vorname")]
    FirstName,
    #[serde(rename = "nachname")]
    LastName,
    #[serde(rename = "standort")]
    City,
}

impl SortKey {
    pub const ALL: [Self; 3] = [Self::FirstName, Self::LastName, Self::City];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FirstName => "vorname",
            Self::LastName => "nachname",
            Self::City => "standort",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "vorname" => Some(Self::FirstName),
            "nachname" => Some(Self::LastName),
            "standort" => Some(Self::City),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::FirstName => "first name",
            Self::LastName => "last name",
            Self::City => "city",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    pub const fn indicator(self) -> &'static str {
        match self {
            Self::Asc => " ▲",
            Self::Desc => " ▼",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EmployeeFilters {
    #[serde(rename = "vorname")]
    pub first_name: String,
    #[serde(rename = "nachname")]
    pub last_name: String,
    #[serde(rename = "standort")]
    pub city: String,
    #[serde(rename = "qualifikation")]
    pub qualification: String,
}

impl EmployeeFilters {
    pub fn get(&self, key: FilterKey) -> &str {
        match key {
            FilterKey::FirstName => &self.first_name,
            FilterKey::LastName => &self.last_name,
            FilterKey::City => &self.city,
            FilterKey::Qualification => &self.qualification,
        }
    }

    pub fn set(&mut self, key: FilterKey, value: impl Into<String>) {
        let value = value.into();
        match key {
            FilterKey::FirstName => self.first_name = value,
            FilterKey::LastName => self.last_name = value,
            FilterKey::City => self.city = value,
            FilterKey::Qualification => self.qualification = value,
        }
    }

    pub fn has_active(&self) -> bool {
        FilterKey::ALL
            .iter()
            .any(|key| !self.get(*key).trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterChip {
    pub key: FilterKey,
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub tone: Tone,
    pub title: String,
    pub message: Option<String>,
}

impl Notification {
    pub fn success(title: impl Into<String>) -> Self {
        Self {
            tone: Tone::Success,
            title: title.into(),
            message: None,
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tone: Tone::Error,
            title: title.into(),
            message: Some(message.into()),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
