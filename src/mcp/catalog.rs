//! Fixed tool catalog: names, descriptions, input schemas

use serde_json::{json, Map, Value};

/// Every tool the server exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolName {
    GetTasks,
    GetFolders,
    GetContexts,
    GetAccountInfo,
    CreateTask,
    GetGoals,
    GetLocations,
    HealthCheck,
    AuthorizeMcp,
}

impl ToolName {
    /// Listing order
    pub const ALL: [ToolName; 9] = [
        ToolName::GetTasks,
        ToolName::GetFolders,
        ToolName::GetContexts,
        ToolName::GetAccountInfo,
        ToolName::CreateTask,
        ToolName::GetGoals,
        ToolName::GetLocations,
        ToolName::HealthCheck,
        ToolName::AuthorizeMcp,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ToolName::GetTasks => "get_tasks",
            ToolName::GetFolders => "get_folders",
            ToolName::GetContexts => "get_contexts",
            ToolName::GetAccountInfo => "get_account_info",
            ToolName::CreateTask => "create_task",
            ToolName::GetGoals => "get_goals",
            ToolName::GetLocations => "get_locations",
            ToolName::HealthCheck => "health_check",
            ToolName::AuthorizeMcp => "authorize_mcp",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ToolName::GetTasks => {
                "Get tasks from Toodledo with optional filtering by completion status or starred status"
            }
            ToolName::GetFolders => "Get your Toodledo folders to see how tasks are organized",
            ToolName::GetContexts => "Get your Toodledo contexts (like @Work, @Home, etc.)",
            ToolName::GetAccountInfo => "Get your account information from Toodledo",
            ToolName::CreateTask => "Create a new task in Toodledo",
            ToolName::GetGoals => "Get Toodledo goals",
            ToolName::GetLocations => "Get Toodledo locations",
            ToolName::HealthCheck => {
                "Check if authorization is needed or if the MCP server is ready"
            }
            ToolName::AuthorizeMcp => {
                "Authorize the MCP server with Toodledo using an authorization code"
            }
        }
    }

    /// JSON Schema of the tool's arguments
    pub fn input_schema(self) -> Map<String, Value> {
        let schema = match self {
            ToolName::GetTasks => json!({
                "type": "object",
                "properties": {
                    "status": {
                        "type": "string",
                        "enum": ["incomplete", "complete", "all"],
                        "default": "incomplete",
                        "description": "Filter by completion status"
                    },
                    "starred_only": {
                        "type": "boolean",
                        "default": false,
                        "description": "If true, only return starred tasks"
                    },
                    "limit": {
                        "type": "integer",
                        "default": 100,
                        "minimum": 1,
                        "maximum": 1000,
                        "description": "Maximum tasks to return"
                    }
                },
                "required": []
            }),
            ToolName::CreateTask => json!({
                "type": "object",
                "properties": {
                    "title": {
                        "type": "string",
                        "description": "Task title"
                    },
                    "folder": {
                        "type": "integer",
                        "description": "Folder ID (optional)"
                    },
                    "context": {
                        "type": "integer",
                        "description": "Context ID (optional)"
                    },
                    "priority": {
                        "type": "integer",
                        "minimum": -1,
                        "maximum": 3,
                        "description": "Priority (-1=negative, 0=low, 1=medium, 2=high, 3=top)"
                    },
                    "duedate": {
                        "type": "string",
                        "pattern": "^\\d{4}-\\d{2}-\\d{2}$",
                        "description": "Due date in format YYYY-MM-DD"
                    },
                    "note": {
                        "type": "string",
                        "description": "Task notes"
                    }
                },
                "required": ["title"]
            }),
            ToolName::AuthorizeMcp => json!({
                "type": "object",
                "properties": {
                    "code": {
                        "type": "string",
                        "description": "Authorization code from the callback URL"
                    }
                },
                "required": ["code"]
            }),
            _ => json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        };

        match schema {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for tool in ToolName::ALL {
            assert_eq!(ToolName::parse(tool.as_str()), Some(tool));
        }
        assert_eq!(ToolName::parse("delete_everything"), None);
    }

    #[test]
    fn test_catalog_order() {
        let names: Vec<_> = ToolName::ALL.iter().map(|t| t.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "get_tasks",
                "get_folders",
                "get_contexts",
                "get_account_info",
                "create_task",
                "get_goals",
                "get_locations",
                "health_check",
                "authorize_mcp",
            ]
        );
    }

    #[test]
    fn test_schemas() {
        let create = ToolName::CreateTask.input_schema();
        assert_eq!(create["required"], json!(["title"]));
        assert_eq!(create["properties"]["priority"]["minimum"], json!(-1));
        assert_eq!(
            create["properties"]["duedate"]["pattern"],
            json!(r"^\d{4}-\d{2}-\d{2}$")
        );

        let tasks = ToolName::GetTasks.input_schema();
        assert_eq!(tasks["properties"]["limit"]["maximum"], json!(1000));
        assert_eq!(tasks["required"], json!([]));

        let empty = ToolName::GetFolders.input_schema();
        assert_eq!(empty["properties"], json!({}));
        assert_eq!(empty["type"], json!("object"));
    }
}
