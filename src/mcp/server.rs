use std::future::Future;
use std::sync::{Arc, OnceLock};

use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, Implementation, ListToolsResult,
    PaginatedRequestParam, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::{Error as McpError, ServerHandler, ServiceExt};
use tokio_util::sync::CancellationToken;

use crate::error::OpenFdaMcpError;
use crate::query::SearchFilters;
use crate::sources::openfda::OpenFdaClient;
use crate::tools;

#[derive(Debug, Clone)]
pub struct OpenFdaMcpServer {
    client: OpenFdaClient,
}

impl OpenFdaMcpServer {
    pub fn new() -> Result<Self, OpenFdaMcpError> {
        Ok(Self {
            client: OpenFdaClient::new()?,
        })
    }
}

type JsonObject = serde_json::Map<String, serde_json::Value>;

static FILTER_SCHEMA: OnceLock<Arc<JsonObject>> = OnceLock::new();

/// JSON schema for the filter parameter set every tool accepts.
fn filter_schema() -> Arc<JsonObject> {
    FILTER_SCHEMA
        .get_or_init(|| {
            let schema = serde_json::json!({
                "type": "object",
                "properties": {
                    "drug_name": {
                        "type": "string",
                        "description": "Brand, generic, or substance name"
                    },
                    "manufacturer": {
                        "type": "string",
                        "description": "Manufacturer name"
                    },
                    "dosage_form": {
                        "type": "string",
                        "description": "Dosage form, e.g. TABLET"
                    },
                    "route": {
                        "type": "string",
                        "description": "Route of administration, e.g. ORAL"
                    },
                    "ndc": {
                        "type": "string",
                        "description": "National Drug Code, hyphenated or digits only"
                    },
                    "limit": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": 10,
                        "default": 3,
                        "description": "Maximum number of label records to read"
                    },
                    "exact_match": {
                        "type": "boolean",
                        "default": false,
                        "description": "Match the drug name exactly instead of as a substring"
                    }
                }
            });
            Arc::new(schema.as_object().cloned().unwrap_or_default())
        })
        .clone()
}

impl ServerHandler for OpenFdaMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "openfda-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: Some(
                "Query FDA drug-label data in real time. Seven tools cover indications, \
                 dosage, specific populations, storage and handling, warnings and \
                 precautions, clinical pharmacology, and product descriptions. All of \
                 them accept drug name, NDC, manufacturer, dosage form, and route filters."
                    .to_string(),
            ),
            ..Default::default()
        }
    }

    fn list_tools(
        &self,
        _request: PaginatedRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult {
            next_cursor: None,
            tools: tools::TOOLS
                .iter()
                .map(|spec| Tool::new(spec.name, spec.description, filter_schema()))
                .collect(),
        }))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move {
            let Some(spec) = tools::find_tool(&request.name) else {
                return Err(McpError::invalid_params(
                    format!("Unknown tool: {}", request.name),
                    None,
                ));
            };

            let arguments = request.arguments.unwrap_or_default();
            let filters: SearchFilters =
                serde_json::from_value(serde_json::Value::Object(arguments)).map_err(|e| {
                    McpError::invalid_params(format!("Invalid arguments for {}: {e}", spec.name), None)
                })?;

            let result = tools::run_tool(&self.client, spec, &filters)
                .await
                .map_err(|e| {
                    McpError::internal_error(format!("{} failed: {e}", spec.name), None)
                })?;
            let text = serde_json::to_string(&result).map_err(|e| {
                McpError::internal_error(
                    format!("Failed to serialize {} result: {e}", spec.name),
                    None,
                )
            })?;

            Ok(CallToolResult::success(vec![Content::text(text)]))
        }
    }
}

pub async fn run_stdio() -> anyhow::Result<()> {
    let server = OpenFdaMcpServer::new()?;

    let shutdown = CancellationToken::new();
    let cancel = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let running = server
        .serve_with_ct(rmcp::transport::stdio(), shutdown)
        .await?;
    let _reason = running.waiting().await?;
    Ok(())
}

pub async fn run_http(host: &str, port: u16) -> anyhow::Result<()> {
    use rmcp::transport::sse_server::SseServer;

    let server = OpenFdaMcpServer::new()?;

    let ip: std::net::IpAddr = host
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid host address: {e}"))?;
    let bind = std::net::SocketAddr::new(ip, port);

    tracing::info!("openFDA MCP server listening on http://{bind}");
    tracing::info!("  SSE endpoint:  GET  http://{bind}/sse");
    tracing::info!("  Post endpoint: POST http://{bind}/message");

    let ct = SseServer::serve(bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind HTTP server: {e}"))?
        .with_service(move || server.clone());

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down…");
    ct.cancel();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::filter_schema;

    #[test]
    fn filter_schema_declares_all_filter_parameters() {
        let schema = filter_schema();
        assert_eq!(
            schema.get("type").and_then(serde_json::Value::as_str),
            Some("object")
        );

        let properties = schema
            .get("properties")
            .and_then(serde_json::Value::as_object)
            .unwrap();
        for key in [
            "drug_name",
            "manufacturer",
            "dosage_form",
            "route",
            "ndc",
            "limit",
            "exact_match",
        ] {
            assert!(properties.contains_key(key), "missing property {key}");
        }
    }
}
