// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use thiserror::Error;

use crate::{Employee, EmployeeFormData, EmployeeId, Notification, Qualification, QualificationId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    BadRequest,
    Unauthorized,
    NotFound,
    Conflict,
    ServerUnavailable,
    Other,
}

impl ErrorCategory {
    pub const fn from_status(status: u16) -> Self {
        match status {
            400 => Self::BadRequest,
            401 | 403 => Self::Unauthorized,
            404 => Self::NotFound,
            409 => Self::Conflict,
            500.. => Self::ServerUnavailable,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepoError {
    #[error("not authenticated -- sign in again")]
    Unauthenticated,
    #[error("no authentication token available")]
    MissingCredential,
    #[error("{message}")]
    Remote {
        category: ErrorCategory,
        message: String,
    },
    #[error("{0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl RepoError {
    pub fn category(&self) -> Option<ErrorCategory> {
        match self {
            Self::Remote { category, .. } => Some(*category),
            _ => None,
        }
    }
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Snapshot of the authentication provider. The provider itself (login
/// redirect, token refresh) lives outside this crate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub credential: Option<String>,
}

impl AuthState {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            is_authenticated: true,
            is_loading: false,
            credential: Some(token.into()),
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }

    /// Gate for every repository call.
    pub fn bearer(&self) -> RepoResult<&str> {
        if !self.is_authenticated {
            return Err(RepoError::Unauthenticated);
        }
        match self.credential.as_deref() {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(RepoError::MissingCredential),
        }
    }
}

pub trait Repository {
    fn list_employees(&self) -> RepoResult<Vec<Employee>>;
    fn get_employee(&self, id: &EmployeeId) -> RepoResult<Option<Employee>>;
    fn create_employee(&self, data: &EmployeeFormData) -> RepoResult<Employee>;
    fn update_employee(&self, id: &EmployeeId, data: &EmployeeFormData) -> RepoResult<Employee>;
    fn delete_employee(&self, id: &EmployeeId) -> RepoResult<()>;
    fn list_qualifications(&self) -> RepoResult<Vec<Qualification>>;
    fn create_qualification(&self, skill: &str) -> RepoResult<Qualification>;
    fn update_qualification(&self, id: QualificationId, skill: &str)
    -> RepoResult<Qualification>;
    fn delete_qualification(&self, id: QualificationId) -> RepoResult<()>;
    fn detach_qualification(
        &self,
        employee_id: &EmployeeId,
        qualification_id: QualificationId,
    ) -> RepoResult<()>;
}

/// Fire-and-forget toast sink.
pub trait Notifier {
    fn notify(&self, notification: Notification);
}
