use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Status {
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
    Backlog,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Pending,
        Status::InProgress,
        Status::Completed,
        Status::Backlog,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Status::Pending => "Pending",
            Status::InProgress => "In Progress",
            Status::Completed => "Completed",
            Status::Backlog => "Backlog",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,

    pub title: String,

    #[serde(default)]
    pub description: String,

    pub priority: Priority,

    pub status: Status,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,

    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub completed_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_id: Option<String>,
}

/// Fields the caller supplies when creating a task; identity and
/// timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: Status,
    pub theme_id: Option<String>,
}

/// Partial update merged over an existing task. `theme_id` is doubly
/// optional so a patch can distinguish "leave alone" from "clear".
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub theme_id: Option<Option<String>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.status.is_none()
            && self.theme_id.is_none()
    }
}

impl Task {
    pub fn new(id: String, data: NewTask, now: DateTime<Utc>) -> Self {
        let completed_at = (data.status == Status::Completed).then_some(now);
        Self {
            id,
            title: data.title,
            description: data.description,
            priority: data.priority,
            status: data.status,
            created_at: now,
            updated_at: now,
            completed_at,
            theme_id: data.theme_id,
        }
    }

    /// Merges `patch` over the task and refreshes `updated_at`.
    ///
    /// `completed_at` tracks the status transition: entering
    /// `Completed` stamps it once (idempotent on re-complete),
    /// leaving `Completed` clears it.
    pub fn apply(&mut self, patch: TaskPatch, now: DateTime<Utc>) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(status) = patch.status {
            self.status = status;
            self.completed_at = if status == Status::Completed {
                self.completed_at.or(Some(now))
            } else {
                None
            };
        }
        if let Some(theme_id) = patch.theme_id {
            self.theme_id = theme_id;
        }
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::{NewTask, Priority, Status, Task, TaskPatch};

    fn sample(now: chrono::DateTime<Utc>) -> Task {
        Task::new(
            "SLT-1".to_string(),
            NewTask {
                title: "Write spec".to_string(),
                description: String::new(),
                priority: Priority::High,
                status: Status::Pending,
                theme_id: None,
            },
            now,
        )
    }

    #[test]
    fn new_task_stamps_both_timestamps() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single().expect("valid now");
        let task = sample(now);
        assert_eq!(task.created_at, task.updated_at);
        assert_eq!(task.completed_at, None);
    }

    #[test]
    fn completing_sets_completed_at_once() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single().expect("valid now");
        let mut task = sample(now);

        let t1 = now + Duration::minutes(5);
        task.apply(
            TaskPatch {
                status: Some(Status::Completed),
                ..TaskPatch::default()
            },
            t1,
        );
        assert_eq!(task.completed_at, Some(t1));
        assert_eq!(task.updated_at, t1);

        // Re-completing must not move the completion time.
        let t2 = now + Duration::minutes(10);
        task.apply(
            TaskPatch {
                status: Some(Status::Completed),
                ..TaskPatch::default()
            },
            t2,
        );
        assert_eq!(task.completed_at, Some(t1));
        assert_eq!(task.updated_at, t2);
    }

    #[test]
    fn leaving_completed_clears_completed_at() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single().expect("valid now");
        let mut task = sample(now);
        task.apply(
            TaskPatch {
                status: Some(Status::Completed),
                ..TaskPatch::default()
            },
            now + Duration::minutes(1),
        );
        task.apply(
            TaskPatch {
                status: Some(Status::Pending),
                ..TaskPatch::default()
            },
            now + Duration::minutes(2),
        );
        assert_eq!(task.completed_at, None);
        assert_eq!(task.status, Status::Pending);
    }

    #[test]
    fn status_serializes_with_display_labels() {
        let json = serde_json::to_string(&Status::InProgress).expect("serialize status");
        assert_eq!(json, "\"In Progress\"");
        let back: Status = serde_json::from_str("\"In Progress\"").expect("parse status");
        assert_eq!(back, Status::InProgress);
    }

    #[test]
    fn task_serializes_timestamps_as_epoch_millis() {
        let now = Utc.timestamp_millis_opt(1_767_225_600_000).single().expect("valid ts");
        let task = sample(now);
        let value = serde_json::to_value(&task).expect("serialize task");
        assert_eq!(value["createdAt"], 1_767_225_600_000_i64);
        assert_eq!(value["completedAt"], serde_json::Value::Null);
        assert!(value.get("themeId").is_none());
    }
}
