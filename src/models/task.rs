use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "_id")]
    pub id: String,
    pub goal: String,
    pub deadline: DateTime<Utc>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, rename = "course")]
    pub course_id: String,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub goal: String,
    pub deadline: DateTime<Utc>,
    pub course_id: String,
}

/// Partial update; absent fields are left out of the request body.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub goal: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub completed: Option<bool>,
}
