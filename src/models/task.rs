//! Task models

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Task as returned by `/tasks/get.php`. Only `id` is always present; the
/// rest depends on the `fields` that were requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<i64>,
    /// Completion timestamp, 0 when incomplete
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    /// Due date as a GMT timestamp at noon, 0 when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duedate: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub star: Option<i64>,
    /// 0 none, 1 next action, 2 active, ...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl Task {
    pub fn is_starred(&self) -> bool {
        self.star == Some(1)
    }

    pub fn is_next_action(&self) -> bool {
        self.status == Some(1)
    }

    pub fn title_or_untitled(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled")
    }

    /// Due date rendered as `YYYY-MM-DD`, if set.
    pub fn due_date_string(&self) -> Option<String> {
        self.duedate
            .filter(|&ts| ts > 0)
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .map(|dt| dt.format("%Y-%m-%d").to_string())
    }
}

/// Payload for `/tasks/add.php`. Unset fields are left off the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewTask {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duedate: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub star: Option<i64>,
}

impl NewTask {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Payload for `/tasks/edit.php`: the id plus whichever fields change.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskEdit {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duedate: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub star: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<i64>,
    /// Completion timestamp; 0 marks the task incomplete again
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<i64>,
}

/// -1 negative, 0 low, 1 medium, 2 high, 3 top
pub fn validate_priority(priority: i64) -> Result<i64> {
    if (-1..=3).contains(&priority) {
        Ok(priority)
    } else {
        Err(Error::InvalidArguments(format!(
            "priority must be between -1 and 3, got {}",
            priority
        )))
    }
}

/// Parse a `YYYY-MM-DD` due date into Toodledo's timestamp form (noon GMT).
pub fn parse_due_date(input: &str) -> Result<i64> {
    let invalid = || {
        Error::InvalidArguments(format!(
            "duedate must be in format YYYY-MM-DD, got '{}'",
            input
        ))
    };

    let shape_ok = input.len() == 10
        && input.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shape_ok {
        return Err(invalid());
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(12, 0, 0))
        .map(|noon| noon.and_utc().timestamp())
        .ok_or_else(invalid)
}
