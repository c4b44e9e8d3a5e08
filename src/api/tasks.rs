//! Task endpoints

use serde::{Deserialize, Serialize};

use super::client::ToodledoClient;
use crate::error::{Error, Result};
use crate::models::{ListHeader, NewTask, Task, TaskEdit};

/// Toodledo accepts at most this many tasks per add/edit request.
pub const MAX_TASKS_PER_REQUEST: usize = 50;
/// Page size ceiling for `/tasks/get.php`.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Optional fields requested on every task listing.
const DEFAULT_FIELDS: &str = "folder,context,goal,location,priority,duedate,star,status,note,tag";

/// Which tasks to return by completion state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Completion {
    #[default]
    Incomplete,
    Complete,
    All,
}

impl Completion {
    /// Value of the `comp` query parameter
    pub fn comp(self) -> i64 {
        match self {
            Completion::Incomplete => 0,
            Completion::Complete => 1,
            Completion::All => -1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Completion::Incomplete => "incomplete",
            Completion::Complete => "complete",
            Completion::All => "all",
        }
    }
}

/// Parameters for `/tasks/get.php`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskQuery {
    pub completion: Completion,
    /// Modified before this timestamp
    pub before: Option<i64>,
    /// Modified after this timestamp
    pub after: Option<i64>,
    pub start: u32,
    pub num: u32,
}

impl Default for TaskQuery {
    fn default() -> Self {
        Self {
            completion: Completion::Incomplete,
            before: None,
            after: None,
            start: 0,
            num: MAX_PAGE_SIZE,
        }
    }
}

impl TaskQuery {
    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("comp", self.completion.comp().to_string()),
            ("start", self.start.to_string()),
            ("num", self.num.min(MAX_PAGE_SIZE).to_string()),
            ("fields", DEFAULT_FIELDS.to_string()),
        ];
        if let Some(before) = self.before {
            params.push(("before", before.to_string()));
        }
        if let Some(after) = self.after {
            params.push(("after", after.to_string()));
        }
        params
    }
}

/// One page of tasks plus the list metadata, when Toodledo sent it.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskList {
    pub header: Option<ListHeader>,
    pub tasks: Vec<Task>,
}

#[derive(Serialize)]
struct TasksBody<'a, T: Serialize> {
    tasks: &'a [T],
}

impl ToodledoClient {
    pub async fn tasks(&self, query: &TaskQuery) -> Result<TaskList> {
        let (header, tasks) = self.get_list("/tasks/get.php", &query.params()).await?;
        Ok(TaskList { header, tasks })
    }

    pub async fn add_task(&self, task: NewTask) -> Result<Vec<Task>> {
        self.add_tasks(vec![task]).await
    }

    pub async fn add_tasks(&self, tasks: Vec<NewTask>) -> Result<Vec<Task>> {
        check_batch(tasks.len())?;
        self.post("/tasks/add.php", &TasksBody { tasks: &tasks })
            .await
    }

    pub async fn edit_task(&self, edit: TaskEdit) -> Result<Vec<Task>> {
        self.post("/tasks/edit.php", &TasksBody { tasks: &[edit] })
            .await
    }

    /// Returns the ids Toodledo confirmed as deleted.
    pub async fn delete_task(&self, id: i64) -> Result<Vec<i64>> {
        self.post("/tasks/delete.php", &TasksBody { tasks: &[id] })
            .await
    }
}

fn check_batch(len: usize) -> Result<()> {
    if len == 0 {
        return Err(Error::InvalidArguments("no tasks given".to_string()));
    }
    if len > MAX_TASKS_PER_REQUEST {
        return Err(Error::InvalidArguments(format!(
            "cannot create more than {} tasks at once, got {}",
            MAX_TASKS_PER_REQUEST, len
        )));
    }
    Ok(())
}

/// Starred tasks marked "Next Action".
pub fn hot_list(tasks: &[Task]) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|t| t.is_starred() && t.is_next_action())
        .collect()
}
