//! Tool dispatch and the `{success, ...}` response envelope

use oauth2::AuthorizationCode;
use serde_json::{json, Map, Value};

use super::args::{self, AuthorizeArgs, CreateTaskArgs, GetTasksArgs};
use super::catalog::ToolName;
use crate::api::tasks::MAX_PAGE_SIZE;
use crate::api::{TaskQuery, ToodledoClient};
use crate::error::{Error, Result};
use crate::models::Task;

const AUTHORIZATION_STEPS: &str = "1. Visit the authorization URL\n\
     2. Click 'Allow' to authorize the application\n\
     3. You'll be redirected to a callback URL\n\
     4. Copy the 'code' parameter from the redirect URL\n\
     5. Provide the code to authorize_mcp tool";

/// Dispatches tool calls to the API client. Never fails: every outcome is
/// an envelope.
#[derive(Clone)]
pub struct ToolGateway {
    client: ToodledoClient,
}

impl ToolGateway {
    pub fn new(client: ToodledoClient) -> Self {
        Self { client }
    }

    pub async fn call(&self, name: &str, arguments: Map<String, Value>) -> Value {
        let Some(tool) = ToolName::parse(name) else {
            tracing::warn!("Unknown tool requested: {}", name);
            return json!({
                "success": false,
                "error": format!("Unknown tool: {}", name),
            });
        };

        tracing::info!("Calling tool: {}", name);
        let result = match tool {
            ToolName::GetTasks => self.get_tasks(&arguments).await,
            ToolName::GetFolders => self.get_folders().await,
            ToolName::GetContexts => self.get_contexts().await,
            ToolName::GetAccountInfo => self.get_account_info().await,
            ToolName::CreateTask => self.create_task(&arguments).await,
            ToolName::GetGoals => self.get_goals().await,
            ToolName::GetLocations => self.get_locations().await,
            ToolName::HealthCheck => Ok(self.health_check().await),
            ToolName::AuthorizeMcp => self.authorize(&arguments).await,
        };

        result.unwrap_or_else(|e| {
            tracing::error!("Tool {} failed: {}", name, e);
            json!({
                "success": false,
                "error": e.to_string(),
            })
        })
    }

    async fn get_tasks(&self, arguments: &Map<String, Value>) -> Result<Value> {
        let args = args::parse::<GetTasksArgs>(arguments)?.validated()?;
        let limit = args.limit as usize;

        // Starring is filtered here, so fetch a full page before trimming.
        let num = if args.starred_only {
            MAX_PAGE_SIZE
        } else {
            limit as u32
        };
        let list = self
            .client
            .tasks(&TaskQuery {
                completion: args.status,
                num,
                ..TaskQuery::default()
            })
            .await?;

        let tasks: Vec<Task> = list
            .tasks
            .into_iter()
            .filter(|t| !args.starred_only || t.is_starred())
            .take(limit)
            .collect();

        Ok(json!({
            "success": true,
            "status": args.status.as_str(),
            "starred_only": args.starred_only,
            "count": tasks.len(),
            "tasks": tasks,
        }))
    }

    async fn get_folders(&self) -> Result<Value> {
        let folders = self.client.folders().await?;
        Ok(json!({"success": true, "count": folders.len(), "folders": folders}))
    }

    async fn get_contexts(&self) -> Result<Value> {
        let contexts = self.client.contexts().await?;
        Ok(json!({"success": true, "count": contexts.len(), "contexts": contexts}))
    }

    async fn get_goals(&self) -> Result<Value> {
        let goals = self.client.goals().await?;
        Ok(json!({"success": true, "count": goals.len(), "goals": goals}))
    }

    async fn get_locations(&self) -> Result<Value> {
        let locations = self.client.locations().await?;
        Ok(json!({"success": true, "count": locations.len(), "locations": locations}))
    }

    async fn get_account_info(&self) -> Result<Value> {
        let account = self.client.account().await?;
        Ok(json!({"success": true, "account": account}))
    }

    async fn create_task(&self, arguments: &Map<String, Value>) -> Result<Value> {
        let args: CreateTaskArgs = args::parse(arguments)?;
        let title = args.title.clone();
        let created = self.client.add_task(args.into_new_task()?).await?;

        Ok(json!({
            "success": true,
            "message": format!("Task '{}' created successfully", title),
            "data": created,
        }))
    }

    /// Ready when a live account probe succeeds; otherwise explains how to
    /// authorize.
    async fn health_check(&self) -> Value {
        if !self.client.tokens().has_valid_credentials() {
            return self.needs_authorization();
        }

        match self.client.account().await {
            Ok(account) => json!({
                "success": true,
                "status": "ready",
                "message": "MCP server is ready",
                "user": account.alias_or_unknown(),
                "email": account.email_or_unknown(),
            }),
            Err(Error::NotAuthorized(reason)) => {
                tracing::warn!("Health check: {}", reason);
                self.needs_authorization()
            }
            Err(e) => {
                tracing::error!("Health check failed: {}", e);
                json!({
                    "success": false,
                    "status": "error",
                    "error": e.to_string(),
                })
            }
        }
    }

    fn needs_authorization(&self) -> Value {
        json!({
            "success": false,
            "status": "needs_authorization",
            "message": "Authorization required",
            "auth_url": self.client.tokens().authorization_url(),
            "instructions": AUTHORIZATION_STEPS,
        })
    }

    async fn authorize(&self, arguments: &Map<String, Value>) -> Result<Value> {
        let args: AuthorizeArgs = args::parse(arguments)?;
        self.client
            .tokens()
            .exchange_authorization_code(&AuthorizationCode::new(args.code))
            .await?;

        let account = self.client.account().await?;
        Ok(json!({
            "success": true,
            "message": "Authorization successful",
            "user": account.alias_or_unknown(),
            "email": account.email_or_unknown(),
        }))
    }
}
