use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A job posting created by an employer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub completed: bool,
    /// Set when the task is marked completed, cleared when it is reopened.
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// The employer who created the task.
    pub employer_id: i32,
}

/// Body of `POST /employer/tasks/`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub description: String,
}

/// Body of `PUT /employer/tasks/{id}`. Only fields that are `Some` change.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct TaskUpdate {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub completed: Option<bool>,
}

impl TaskUpdate {
    /// Applies the update in place. Completing a task stamps `completed_at`
    /// (keeping an existing stamp); reopening clears it.
    pub fn apply(&self, task: &mut Task, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        match self.completed {
            Some(true) => {
                task.completed = true;
                task.completed_at.get_or_insert(now);
            }
            Some(false) => {
                task.completed = false;
                task.completed_at = None;
            }
            None => {}
        }
        task.updated_at = now;
    }

    /// True when this update closes a task that was open.
    pub fn completes(&self, before: &Task) -> bool {
        self.completed == Some(true) && !before.completed
    }
}

/// Restricts task listings. An empty filter matches every task.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskFilter {
    pub employer_id: Option<i32>,
}

impl TaskFilter {
    pub fn owned_by(employer_id: i32) -> Self {
        Self {
            employer_id: Some(employer_id),
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.employer_id.map_or(true, |id| task.employer_id == id)
    }
}

/// Body of `POST /employer/tasks/{id}/assign/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentInput {
    pub developer_id: i32,
}

/// A developer assigned to a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub task_id: i32,
    pub developer_id: i32,
}
