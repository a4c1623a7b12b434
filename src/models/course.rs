use serde::{Deserialize, Serialize};

/// A course as the gateway returns it. The task counters are denormalized
/// server-side aggregates; on the dashboard they may lag the course-detail
/// view until the next full fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "taskCount")]
    pub task_count: u32,
    #[serde(default, rename = "completedTasks")]
    pub completed_tasks: u32,
}

impl Course {
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "Untitled"
        } else {
            &self.title
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewCourse {
    pub title: String,
    pub description: String,
}
