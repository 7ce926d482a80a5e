// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod wire;

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use staffbook_app::{
    AuthState, Employee, EmployeeFormData, EmployeeId, ErrorCategory, Qualification,
    QualificationId, RepoError, RepoResult, Repository,
};
use url::Url;

use crate::wire::{EmployeeDto, EmployeePayload, QualificationDto, SkillPayload};

/// What a request is about; decides the not-found and conflict wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    Employee,
    Qualification,
}

/// User-facing text for a failed response.
pub fn status_message(status: u16, action: &str, subject: Subject) -> String {
    match (ErrorCategory::from_status(status), subject) {
        (ErrorCategory::BadRequest, _) => format!("{action} failed -- check the input"),
        (ErrorCategory::Unauthorized, _) => {
            "session expired or permission denied -- sign in again".to_owned()
        }
        (ErrorCategory::NotFound, Subject::Employee) => "record not found".to_owned(),
        (ErrorCategory::NotFound, Subject::Qualification) => "qualification not found".to_owned(),
        (ErrorCategory::Conflict, Subject::Employee) => {
            "record conflicts with existing data".to_owned()
        }
        (ErrorCategory::Conflict, Subject::Qualification) => {
            "this qualification already exists".to_owned()
        }
        (ErrorCategory::ServerUnavailable, _) => {
            "server unavailable -- try again later".to_owned()
        }
        (ErrorCategory::Other, _) => format!("{action} failed"),
    }
}

/// Blocking REST client for the personnel backend.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    timeout: Duration,
    auth: AuthState,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration, auth: AuthState) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("api.base_url must not be empty");
        }
        let parsed = Url::parse(&base_url)
            .with_context(|| format!("api.base_url {base_url:?} is not a valid URL"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!(
                "api.base_url must use http or https, got {:?} -- fix the URL and retry",
                parsed.scheme()
            );
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            auth,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn auth(&self) -> &AuthState {
        &self.auth
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorized(&self, builder: RequestBuilder) -> RepoResult<RequestBuilder> {
        let token = self.auth.bearer()?;
        Ok(builder.bearer_auth(token))
    }

    fn send(&self, builder: RequestBuilder, action: &str, subject: Subject) -> RepoResult<Response> {
        let response = self
            .authorized(builder)?
            .send()
            .map_err(|error| connection_error(&self.base_url, &error))?;

        let status = response.status();
        if !status.is_success() {
            return Err(remote_error(status, action, subject));
        }
        Ok(response)
    }

    fn json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        action: &str,
        subject: Subject,
    ) -> RepoResult<T> {
        let response = self.send(builder, action, subject)?;
        response.json::<T>().map_err(|error| {
            tracing::warn!(action, error = %error, "undecodable response body");
            RepoError::Decode(format!("{action} returned an unreadable response"))
        })
    }

    /// Exact label → id map used to build employee payloads.
    fn qualification_lookup(&self) -> RepoResult<HashMap<String, i64>> {
        let items: Vec<QualificationDto> = self.json(
            self.http.get(self.url("/qualifications")),
            "loading qualifications",
            Subject::Qualification,
        )?;
        Ok(items.into_iter().map(|item| (item.skill, item.id)).collect())
    }

    fn employee_payload<'a>(&self, data: &'a EmployeeFormData) -> RepoResult<EmployeePayload<'a>> {
        let lookup = if data.qualifications.is_empty() {
            HashMap::new()
        } else {
            self.qualification_lookup()?
        };
        Ok(EmployeePayload::new(data, &lookup))
    }
}

impl Repository for Client {
    fn list_employees(&self) -> RepoResult<Vec<Employee>> {
        tracing::debug!("GET /employees");
        let items: Vec<EmployeeDto> = self.json(
            self.http.get(self.url("/employees")),
            "loading employees",
            Subject::Employee,
        )?;
        Ok(items.into_iter().map(Employee::from).collect())
    }

    fn get_employee(&self, id: &EmployeeId) -> RepoResult<Option<Employee>> {
        let result: RepoResult<EmployeeDto> = self.json(
            self.http.get(self.url(&format!("/employees/{id}"))),
            "loading the employee",
            Subject::Employee,
        );
        match result {
            Ok(dto) => Ok(Some(Employee::from(dto))),
            Err(error) if error.category() == Some(ErrorCategory::NotFound) => Ok(None),
            Err(error) => Err(error),
        }
    }

    fn create_employee(&self, data: &EmployeeFormData) -> RepoResult<Employee> {
        self.auth.bearer()?;
        let payload = self.employee_payload(data)?;
        let dto: EmployeeDto = self.json(
            self.http.post(self.url("/employees")).json(&payload),
            "adding the employee",
            Subject::Employee,
        )?;
        Ok(Employee::from(dto))
    }

    fn update_employee(&self, id: &EmployeeId, data: &EmployeeFormData) -> RepoResult<Employee> {
        self.auth.bearer()?;
        let payload = self.employee_payload(data)?;
        let dto: EmployeeDto = self.json(
            self.http
                .put(self.url(&format!("/employees/{id}")))
                .json(&payload),
            "saving changes",
            Subject::Employee,
        )?;
        Ok(Employee::from(dto))
    }

    fn delete_employee(&self, id: &EmployeeId) -> RepoResult<()> {
        self.send(
            self.http.delete(self.url(&format!("/employees/{id}"))),
            "deleting the employee",
            Subject::Employee,
        )?;
        Ok(())
    }

    fn list_qualifications(&self) -> RepoResult<Vec<Qualification>> {
        let items: Vec<QualificationDto> = self.json(
            self.http.get(self.url("/qualifications")),
            "loading qualifications",
            Subject::Qualification,
        )?;
        Ok(items.into_iter().map(Qualification::from).collect())
    }

    fn create_qualification(&self, skill: &str) -> RepoResult<Qualification> {
        let dto: QualificationDto = self.json(
            self.http
                .post(self.url("/qualifications"))
                .json(&SkillPayload { skill }),
            "creating the qualification",
            Subject::Qualification,
        )?;
        Ok(Qualification::from(dto))
    }

    fn update_qualification(&self, id: QualificationId, skill: &str) -> RepoResult<Qualification> {
        let dto: QualificationDto = self.json(
            self.http
                .put(self.url(&format!("/qualifications/{id}")))
                .json(&SkillPayload { skill }),
            "updating the qualification",
            Subject::Qualification,
        )?;
        Ok(Qualification::from(dto))
    }

    fn delete_qualification(&self, id: QualificationId) -> RepoResult<()> {
        self.send(
            self.http.delete(self.url(&format!("/qualifications/{id}"))),
            "deleting the qualification",
            Subject::Qualification,
        )?;
        Ok(())
    }

    fn detach_qualification(
        &self,
        employee_id: &EmployeeId,
        qualification_id: QualificationId,
    ) -> RepoResult<()> {
        self.send(
            self.http.delete(self.url(&format!(
                "/employees/{employee_id}/qualifications/{qualification_id}"
            ))),
            "removing the qualification from the employee",
            Subject::Employee,
        )?;
        Ok(())
    }
}

fn connection_error(base_url: &str, error: &reqwest::Error) -> RepoError {
    tracing::warn!(base_url, error = %error, "request failed");
    if error.is_timeout() {
        return RepoError::Transport(format!("{base_url} did not answer in time -- try again"));
    }
    RepoError::Transport(format!(
        "cannot reach {base_url} -- check that the server is running ({error})"
    ))
}

fn remote_error(status: StatusCode, action: &str, subject: Subject) -> RepoError {
    let code = status.as_u16();
    tracing::debug!(status = code, action, "request rejected");
    RepoError::Remote {
        category: ErrorCategory::from_status(code),
        message: status_message(code, action, subject),
    }
}
