// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use staffbook_app::{
    Employee, EmployeeFormData, EmployeeId, ErrorCategory, Notification, Notifier, Qualification,
    QualificationId, RepoError, RepoResult, Repository,
};
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

const FIRST_NAMES: [&str; 16] = [
    "Anna", "Jonas", "Lena", "Felix", "Marie", "Paul", "Sophie", "Lukas", "Emma", "Leon", "Mia",
    "Elias", "Hannah", "Noah", "Clara", "Finn",
];
const LAST_NAMES: [&str; 18] = [
    "Müller",
    "Schmidt",
    "Schneider",
    "Fischer",
    "Weber",
    "Meyer",
    "Wagner",
    "Becker",
    "Schulz",
    "Hoffmann",
    "Koch",
    "Richter",
    "Klein",
    "Wolf",
    "Schröder",
    "Neumann",
    "Zimmermann",
    "Braun",
];
const CITIES: [&str; 10] = [
    "Berlin",
    "Hamburg",
    "München",
    "Köln",
    "Frankfurt",
    "Stuttgart",
    "Düsseldorf",
    "Leipzig",
    "Bremen",
    "Dresden",
];
const STREET_NAMES: [&str; 12] = [
    "Hauptstraße",
    "Schulstraße",
    "Gartenstraße",
    "Bahnhofstraße",
    "Dorfstraße",
    "Bergstraße",
    "Lindenstraße",
    "Kirchstraße",
    "Waldstraße",
    "Ringstraße",
    "Am Markt",
    "Birkenweg",
];
const SKILLS: [&str; 12] = [
    "Java",
    "SQL",
    "Angular",
    "TypeScript",
    "Spring",
    "Docker",
    "Kubernetes",
    "Python",
    "Scrum",
    "Linux",
    "Git",
    "Rust",
];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Seeded generator for plausible personnel records.
#[derive(Debug, Clone)]
pub struct StaffFaker {
    rng: DeterministicRng,
    next_id: i64,
}

impl StaffFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            next_id: 1,
        }
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn skill(&mut self) -> &'static str {
        self.pick(&SKILLS)
    }

    pub fn form_data(&mut self) -> EmployeeFormData {
        let skill_count = self.int_n(4);
        let mut qualifications = Vec::with_capacity(skill_count);
        for _ in 0..skill_count {
            let skill = self.skill();
            if !qualifications.iter().any(|assigned: &String| assigned == skill) {
                qualifications.push(skill.to_owned());
            }
        }

        EmployeeFormData {
            first_name: self.pick(&FIRST_NAMES).to_owned(),
            last_name: self.pick(&LAST_NAMES).to_owned(),
            phone: format!(
                "0{} {}",
                self.int_range(30, 999),
                self.int_range(100_000, 9_999_999)
            ),
            city: self.pick(&CITIES).to_owned(),
            street: format!("{} {}", self.pick(&STREET_NAMES), self.int_range(1, 120)),
            postcode: format!("{:05}", self.int_range(1_067, 99_998)),
            qualifications,
        }
    }

    pub fn employee(&mut self) -> Employee {
        let id = self.next_id;
        self.next_id += 1;
        employee_from_form(EmployeeId::from(id), self.form_data())
    }

    pub fn employees(&mut self, count: usize) -> Vec<Employee> {
        (0..count).map(|_| self.employee()).collect()
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn int_range(&mut self, min: u64, max: u64) -> u64 {
        if max <= min {
            return min;
        }
        min + self.rng.next_u64() % (max - min + 1)
    }
}

pub fn employee_from_form(id: EmployeeId, data: EmployeeFormData) -> Employee {
    Employee {
        id,
        first_name: data.first_name,
        last_name: data.last_name,
        phone: data.phone,
        city: data.city,
        street: data.street,
        postcode: data.postcode,
        qualifications: data.qualifications,
    }
}

/// Bare employee with just the fields the list view reads.
pub fn employee(id: &str, first_name: &str, last_name: &str, city: &str) -> Employee {
    Employee {
        id: EmployeeId::new(id),
        first_name: first_name.to_owned(),
        last_name: last_name.to_owned(),
        phone: String::new(),
        city: city.to_owned(),
        street: String::new(),
        postcode: String::new(),
        qualifications: Vec::new(),
    }
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("staffbook.db");
    Ok((dir, db_path))
}

/// Repository operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListEmployees,
    GetEmployee,
    CreateEmployee,
    UpdateEmployee,
    DeleteEmployee,
    ListQualifications,
    CreateQualification,
    UpdateQualification,
    DeleteQualification,
    DetachQualification,
}

/// One recorded repository call, in the order it was made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoCall {
    ListEmployees,
    GetEmployee(EmployeeId),
    CreateEmployee(String),
    UpdateEmployee(EmployeeId),
    DeleteEmployee(EmployeeId),
    ListQualifications,
    CreateQualification(String),
    UpdateQualification(QualificationId, String),
    DeleteQualification(QualificationId),
    DetachQualification(EmployeeId, QualificationId),
}

#[derive(Debug, Default)]
struct FakeState {
    employees: Vec<Employee>,
    qualifications: Vec<Qualification>,
    hidden: BTreeSet<QualificationId>,
    hide_created: bool,
    next_employee: i64,
    next_qualification: i64,
    failures: HashMap<Operation, RepoError>,
    detach_failures: HashMap<EmployeeId, RepoError>,
    calls: Vec<RepoCall>,
}

/// In-memory backend that records calls and fails on request.
#[derive(Debug, Default)]
pub struct FakeRepository {
    state: RefCell<FakeState>,
}

impl FakeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(employees: Vec<Employee>, skills: &[&str]) -> Self {
        let repo = Self::new();
        {
            let mut state = repo.state.borrow_mut();
            state.next_employee = employees
                .iter()
                .filter_map(|employee| employee.id.as_str().parse::<i64>().ok())
                .max()
                .unwrap_or(0);
            state.employees = employees;
            for skill in skills {
                state.next_qualification += 1;
                let id = QualificationId::new(state.next_qualification);
                state.qualifications.push(Qualification {
                    id,
                    skill: (*skill).to_owned(),
                });
            }
        }
        repo
    }

    /// Every later call of `operation` fails with `error` until `recover`.
    pub fn fail(&self, operation: Operation, error: RepoError) {
        self.state.borrow_mut().failures.insert(operation, error);
    }

    pub fn recover(&self, operation: Operation) {
        self.state.borrow_mut().failures.remove(&operation);
    }

    pub fn fail_detach_for(&self, employee_id: &EmployeeId, error: RepoError) {
        self.state
            .borrow_mut()
            .detach_failures
            .insert(employee_id.clone(), error);
    }

    /// Newly created qualifications stay out of listings, like a lagging
    /// read replica.
    pub fn hide_created_qualifications(&self, hide: bool) {
        self.state.borrow_mut().hide_created = hide;
    }

    pub fn calls(&self) -> Vec<RepoCall> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn count(&self, matches: impl Fn(&RepoCall) -> bool) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|call| matches(call))
            .count()
    }

    pub fn employees(&self) -> Vec<Employee> {
        self.state.borrow().employees.clone()
    }

    pub fn qualifications(&self) -> Vec<Qualification> {
        self.state.borrow().qualifications.clone()
    }

    fn record(&self, call: RepoCall, operation: Operation) -> RepoResult<()> {
        let mut state = self.state.borrow_mut();
        state.calls.push(call);
        match state.failures.get(&operation) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

fn remote(category: ErrorCategory, message: &str) -> RepoError {
    RepoError::Remote {
        category,
        message: message.to_owned(),
    }
}

impl Repository for FakeRepository {
    fn list_employees(&self) -> RepoResult<Vec<Employee>> {
        self.record(RepoCall::ListEmployees, Operation::ListEmployees)?;
        Ok(self.state.borrow().employees.clone())
    }

    fn get_employee(&self, id: &EmployeeId) -> RepoResult<Option<Employee>> {
        self.record(RepoCall::GetEmployee(id.clone()), Operation::GetEmployee)?;
        Ok(self
            .state
            .borrow()
            .employees
            .iter()
            .find(|employee| &employee.id == id)
            .cloned())
    }

    fn create_employee(&self, data: &EmployeeFormData) -> RepoResult<Employee> {
        self.record(
            RepoCall::CreateEmployee(data.last_name.clone()),
            Operation::CreateEmployee,
        )?;
        let mut state = self.state.borrow_mut();
        state.next_employee += 1;
        let employee = employee_from_form(EmployeeId::from(state.next_employee), data.clone());
        state.employees.push(employee.clone());
        Ok(employee)
    }

    fn update_employee(&self, id: &EmployeeId, data: &EmployeeFormData) -> RepoResult<Employee> {
        self.record(RepoCall::UpdateEmployee(id.clone()), Operation::UpdateEmployee)?;
        let mut state = self.state.borrow_mut();
        let slot = state
            .employees
            .iter_mut()
            .find(|employee| &employee.id == id)
            .ok_or_else(|| remote(ErrorCategory::NotFound, "record not found"))?;
        *slot = employee_from_form(id.clone(), data.clone());
        Ok(slot.clone())
    }

    fn delete_employee(&self, id: &EmployeeId) -> RepoResult<()> {
        self.record(RepoCall::DeleteEmployee(id.clone()), Operation::DeleteEmployee)?;
        let mut state = self.state.borrow_mut();
        let before = state.employees.len();
        state.employees.retain(|employee| &employee.id != id);
        if state.employees.len() == before {
            return Err(remote(ErrorCategory::NotFound, "record not found"));
        }
        Ok(())
    }

    fn list_qualifications(&self) -> RepoResult<Vec<Qualification>> {
        self.record(RepoCall::ListQualifications, Operation::ListQualifications)?;
        let state = self.state.borrow();
        Ok(state
            .qualifications
            .iter()
            .filter(|qualification| !state.hidden.contains(&qualification.id))
            .cloned()
            .collect())
    }

    fn create_qualification(&self, skill: &str) -> RepoResult<Qualification> {
        self.record(
            RepoCall::CreateQualification(skill.to_owned()),
            Operation::CreateQualification,
        )?;
        let mut state = self.state.borrow_mut();
        let wanted = skill.to_lowercase();
        if state
            .qualifications
            .iter()
            .any(|qualification| qualification.skill.to_lowercase() == wanted)
        {
            return Err(remote(
                ErrorCategory::Conflict,
                "this qualification already exists",
            ));
        }

        state.next_qualification += 1;
        let created = Qualification {
            id: QualificationId::new(state.next_qualification),
            skill: skill.to_owned(),
        };
        state.qualifications.push(created.clone());
        if state.hide_created {
            state.hidden.insert(created.id);
        }
        Ok(created)
    }

    fn update_qualification(&self, id: QualificationId, skill: &str) -> RepoResult<Qualification> {
        self.record(
            RepoCall::UpdateQualification(id, skill.to_owned()),
            Operation::UpdateQualification,
        )?;
        let mut state = self.state.borrow_mut();
        let slot = state
            .qualifications
            .iter_mut()
            .find(|qualification| qualification.id == id)
            .ok_or_else(|| remote(ErrorCategory::NotFound, "qualification not found"))?;
        let previous = std::mem::replace(&mut slot.skill, skill.to_owned());
        let renamed = slot.clone();
        for employee in &mut state.employees {
            for label in &mut employee.qualifications {
                if *label == previous {
                    *label = skill.to_owned();
                }
            }
        }
        Ok(renamed)
    }

    fn delete_qualification(&self, id: QualificationId) -> RepoResult<()> {
        self.record(RepoCall::DeleteQualification(id), Operation::DeleteQualification)?;
        let mut state = self.state.borrow_mut();
        let before = state.qualifications.len();
        state.qualifications.retain(|qualification| qualification.id != id);
        state.hidden.remove(&id);
        if state.qualifications.len() == before {
            return Err(remote(ErrorCategory::NotFound, "qualification not found"));
        }
        Ok(())
    }

    fn detach_qualification(
        &self,
        employee_id: &EmployeeId,
        qualification_id: QualificationId,
    ) -> RepoResult<()> {
        self.record(
            RepoCall::DetachQualification(employee_id.clone(), qualification_id),
            Operation::DetachQualification,
        )?;
        let mut state = self.state.borrow_mut();
        if let Some(error) = state.detach_failures.get(employee_id) {
            return Err(error.clone());
        }

        let skill = state
            .qualifications
            .iter()
            .find(|qualification| qualification.id == qualification_id)
            .map(|qualification| qualification.skill.to_lowercase())
            .ok_or_else(|| remote(ErrorCategory::NotFound, "qualification not found"))?;
        let employee = state
            .employees
            .iter_mut()
            .find(|employee| &employee.id == employee_id)
            .ok_or_else(|| remote(ErrorCategory::NotFound, "record not found"))?;
        employee
            .qualifications
            .retain(|label| label.to_lowercase() != skill);
        Ok(())
    }
}

/// Keeps every notification for later inspection.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: RefCell<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.borrow().clone()
    }

    pub fn last(&self) -> Option<Notification> {
        self.sent.borrow().last().cloned()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.sent.borrow_mut().push(notification);
    }
}
