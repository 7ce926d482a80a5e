// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use staffbook_app::{Employee, EmployeeFormData, EmployeeId, Qualification, QualificationId};

/// The backend hands out numeric ids but some deployments quote them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum WireId {
    Number(i64),
    Text(String),
}

impl WireId {
    fn into_employee_id(self) -> EmployeeId {
        match self {
            Self::Number(value) => EmployeeId::from(value),
            Self::Text(value) => EmployeeId::new(value),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct QualificationDto {
    pub id: i64,
    #[serde(default)]
    pub skill: String,
}

impl From<QualificationDto> for Qualification {
    fn from(dto: QualificationDto) -> Self {
        Self {
            id: QualificationId::new(dto.id),
            skill: dto.skill,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EmployeeDto {
    pub id: WireId,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub postcode: Option<String>,
    #[serde(default)]
    pub skill_set: Option<Vec<QualificationDto>>,
}

impl From<EmployeeDto> for Employee {
    fn from(dto: EmployeeDto) -> Self {
        Self {
            id: dto.id.into_employee_id(),
            first_name: dto.first_name.unwrap_or_default(),
            last_name: dto.last_name.unwrap_or_default(),
            phone: dto.phone.unwrap_or_default(),
            city: dto.city.unwrap_or_default(),
            street: dto.street.unwrap_or_default(),
            postcode: dto.postcode.unwrap_or_default(),
            qualifications: dto
                .skill_set
                .unwrap_or_default()
                .into_iter()
                .map(|qualification| qualification.skill)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EmployeePayload<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub phone: &'a str,
    pub city: &'a str,
    pub street: &'a str,
    pub postcode: &'a str,
    pub skill_set: Vec<i64>,
}

impl<'a> EmployeePayload<'a> {
    /// Labels resolve to ids by exact match; labels the catalog does not
    /// know are dropped.
    pub fn new(data: &'a EmployeeFormData, lookup: &HashMap<String, i64>) -> Self {
        Self {
            first_name: &data.first_name,
            last_name: &data.last_name,
            phone: &data.phone,
            city: &data.city,
            street: &data.street,
            postcode: &data.postcode,
            skill_set: data
                .qualifications
                .iter()
                .filter_map(|label| lookup.get(label).copied())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct SkillPayload<'a> {
    pub skill: &'a str,
}
