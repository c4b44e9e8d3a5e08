//! Account model

use serde::{Deserialize, Serialize};

/// Account info from `/account/get.php`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// 1 for Pro subscribers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pro: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dateformat: Option<i64>,
    /// Offset from server time in half hours
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotlistpriority: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotlistduedate: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastedit_folder: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastedit_context: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastedit_goal: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastedit_location: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastedit_task: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastdelete_task: Option<i64>,
}

impl Account {
    pub fn alias_or_unknown(&self) -> &str {
        self.alias.as_deref().unwrap_or("Unknown")
    }

    pub fn email_or_unknown(&self) -> &str {
        self.email.as_deref().unwrap_or("Unknown")
    }

    pub fn is_pro(&self) -> bool {
        self.pro.unwrap_or(0) != 0
    }
}
