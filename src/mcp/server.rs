//! MCP server handler, stdio transport

use std::sync::Arc;

use rmcp::model::*;
use rmcp::service::RequestContext;
use rmcp::transport::io::stdio;
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler, ServiceExt};

use super::catalog::ToolName;
use super::gateway::ToolGateway;

const SERVER_INSTRUCTIONS: &str = "Toodledo task access. Call health_check first; \
     if it reports needs_authorization, follow its instructions and pass the \
     code to authorize_mcp.";

#[derive(Clone)]
pub struct ToodledoServer {
    gateway: ToolGateway,
}

impl ToodledoServer {
    pub fn new(gateway: ToolGateway) -> Self {
        Self { gateway }
    }
}

/// The fixed catalog as protocol tool descriptors.
pub fn tools() -> Vec<Tool> {
    ToolName::ALL
        .into_iter()
        .map(|tool| {
            Tool::new(
                tool.as_str(),
                tool.description(),
                Arc::new(tool.input_schema()),
            )
        })
        .collect()
}

impl ServerHandler for ToodledoServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build())
            .with_protocol_version(ProtocolVersion::V_2024_11_05)
            .with_server_info(Implementation::from_build_env())
            .with_instructions(SERVER_INSTRUCTIONS)
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult::with_all_items(tools()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!("call_tool: {}", request.name);
        let arguments = request.arguments.unwrap_or_default();
        let envelope = self.gateway.call(&request.name, arguments).await;

        let text = serde_json::to_string_pretty(&envelope)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }
}

/// Serve the catalog on stdin/stdout until the client disconnects.
pub async fn serve(gateway: ToolGateway) -> anyhow::Result<()> {
    tracing::info!("Starting Toodledo MCP server on stdio");
    let service = ToodledoServer::new(gateway).serve(stdio()).await?;
    service.waiting().await?;
    tracing::info!("MCP client disconnected");
    Ok(())
}
