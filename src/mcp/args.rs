//! Typed tool arguments, checked against the catalog schemas before dispatch

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::api::tasks::MAX_PAGE_SIZE;
use crate::api::Completion;
use crate::error::{Error, Result};
use crate::models::{parse_due_date, validate_priority, NewTask};

const DEFAULT_TASK_LIMIT: i64 = 100;

/// Deserialize a tool's argument object; type, enum and required-field
/// violations become `InvalidArguments`.
pub fn parse<T: DeserializeOwned>(arguments: &Map<String, Value>) -> Result<T> {
    serde_json::from_value(Value::Object(arguments.clone()))
        .map_err(|e| Error::InvalidArguments(e.to_string()))
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetTasksArgs {
    #[serde(default)]
    pub status: Completion,
    #[serde(default)]
    pub starred_only: bool,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    DEFAULT_TASK_LIMIT
}

impl GetTasksArgs {
    pub fn validated(self) -> Result<Self> {
        if !(1..=MAX_PAGE_SIZE as i64).contains(&self.limit) {
            return Err(Error::InvalidArguments(format!(
                "limit must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, self.limit
            )));
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTaskArgs {
    pub title: String,
    pub folder: Option<i64>,
    pub context: Option<i64>,
    pub priority: Option<i64>,
    pub duedate: Option<String>,
    pub note: Option<String>,
}

impl CreateTaskArgs {
    pub fn into_new_task(self) -> Result<NewTask> {
        let priority = self.priority.map(validate_priority).transpose()?;
        let duedate = self.duedate.as_deref().map(parse_due_date).transpose()?;

        Ok(NewTask {
            title: self.title,
            folder: self.folder,
            context: self.context,
            priority,
            duedate,
            note: self.note,
            ..NewTask::default()
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthorizeArgs {
    pub code: String,
}
