use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::User;

/// The backend has been observed to answer auth requests both as a flat
/// `{token, user}` object and wrapped as `{data: {token, user}}`. Both must
/// populate the session identically, flat taking precedence. Do not extend
/// this tolerance to other endpoints.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AuthResponse {
    Flat(AuthPayload),
    Nested { data: AuthPayload },
}

#[derive(Debug, Deserialize)]
pub struct AuthPayload {
    pub token: String,
    pub user: User,
}

impl AuthResponse {
    pub fn into_payload(self) -> AuthPayload {
        match self {
            AuthResponse::Flat(payload) => payload,
            AuthResponse::Nested { data } => data,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Course writes rename `title` to `courseTitle` at the wire boundary.
#[derive(Debug, Serialize)]
pub struct CoursePayload<'a> {
    #[serde(rename = "courseTitle")]
    pub course_title: &'a str,
    pub description: &'a str,
}

#[derive(Debug, Serialize)]
pub struct CreateTaskRequest<'a> {
    pub goal: &'a str,
    pub deadline: DateTime<Utc>,
    pub course: &'a str,
}

#[derive(Debug, Serialize)]
pub struct UpdateTaskRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}
