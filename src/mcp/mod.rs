//! MCP server exposing EDAM mapping, suggestion and catalog lookup via the
//! Model Context Protocol.
//!
//! Tools: 2 engine + 4 catalog = 6 total.

pub mod params;

use params::*;
use crate::api::EdamApi;
use crate::config::Settings;
use crate::ontology::ConceptType;
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

const DEFAULT_NEIGHBOR_DISTANCE: usize = 2;
const MAX_NEIGHBOR_DISTANCE: usize = 5;
const DEFAULT_SEARCH_RESULTS: usize = 10;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ok_text(text: String) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

fn err_text(msg: String) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::error(vec![Content::text(msg)]))
}

fn ok_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    match serde_json::to_string_pretty(value) {
        Ok(text) => ok_text(text),
        Err(e) => err_text(format!("failed to serialize result: {}", e)),
    }
}

// ---------------------------------------------------------------------------
// EdamMcpServer
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct EdamMcpServer {
    api: Arc<EdamApi>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl EdamMcpServer {
    pub fn new(api: Arc<EdamApi>) -> Self {
        Self {
            api,
            tool_router: Self::tool_router(),
        }
    }

    // ── Engine tools ────────────────────────────────────────────────────

    #[tool(description = "Map a description of a tool, dataset or workflow step to existing EDAM ontology concepts, ranked by confidence")]
    async fn map_to_edam_concept(
        &self,
        Parameters(p): Parameters<MapParams>,
    ) -> Result<CallToolResult, McpError> {
        let mut request = self.api.match_request(p.description);
        request.context = p.context;
        if let Some(max_results) = p.max_results {
            request.max_results = max_results;
        }
        if let Some(min_confidence) = p.min_confidence {
            request.min_confidence = min_confidence;
        }
        match self.api.map(&request).await {
            Ok(outcome) => ok_json(&outcome),
            Err(e) => err_text(e.to_string()),
        }
    }

    #[tool(description = "Propose new EDAM concepts (label, type, parent, definition) when no existing concept fits the description")]
    async fn suggest_new_concept(
        &self,
        Parameters(p): Parameters<SuggestParams>,
    ) -> Result<CallToolResult, McpError> {
        let mut request = self.api.suggestion_request(p.description);
        if let Some(raw) = p.concept_type.as_deref() {
            match raw.parse::<ConceptType>() {
                Ok(concept_type) => request.concept_type = Some(concept_type),
                Err(e) => return err_text(e),
            }
        }
        request.parent_concept = p.parent_concept;
        request.rationale = p.rationale;
        if let Some(max_suggestions) = p.max_suggestions {
            request.max_suggestions = max_suggestions;
        }
        match self.api.suggest(&request).await {
            Ok(outcome) => ok_json(&outcome),
            Err(e) => err_text(e.to_string()),
        }
    }

    // ── Catalog tools ───────────────────────────────────────────────────

    #[tool(description = "Get an EDAM concept by URI, short id (e.g. operation_0296) or label")]
    fn get_concept(
        &self,
        Parameters(p): Parameters<ConceptRefParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.api.concept(&p.concept) {
            Ok(concept) => ok_json(&concept),
            Err(e) => err_text(e.to_string()),
        }
    }

    #[tool(description = "List concepts near a concept in the EDAM hierarchy, with distance-decayed confidence")]
    fn concept_neighbors(
        &self,
        Parameters(p): Parameters<NeighborsParams>,
    ) -> Result<CallToolResult, McpError> {
        let max_distance = p.max_distance.unwrap_or(DEFAULT_NEIGHBOR_DISTANCE);
        if !(1..=MAX_NEIGHBOR_DISTANCE).contains(&max_distance) {
            return err_text(format!(
                "max_distance must be between 1 and {}, got {}",
                MAX_NEIGHBOR_DISTANCE, max_distance
            ));
        }
        match self.api.neighbors(&p.concept, max_distance) {
            Ok(neighbors) => ok_json(&neighbors),
            Err(e) => err_text(e.to_string()),
        }
    }

    #[tool(description = "Get the label path from the EDAM root down to a concept")]
    fn concept_lineage(
        &self,
        Parameters(p): Parameters<ConceptRefParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.api.lineage(&p.concept) {
            Ok(path) => ok_json(&path),
            Err(e) => err_text(e.to_string()),
        }
    }

    #[tool(description = "Search EDAM concepts by text in labels, definitions and synonyms")]
    fn search_concepts(
        &self,
        Parameters(p): Parameters<SearchParams>,
    ) -> Result<CallToolResult, McpError> {
        let max_results = p.max_results.unwrap_or(DEFAULT_SEARCH_RESULTS);
        match self.api.search(&p.query, max_results) {
            Ok(concepts) => ok_json(&concepts),
            Err(e) => err_text(e.to_string()),
        }
    }
}

#[tool_handler]
impl ServerHandler for EdamMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "EDAM MCP server: map descriptions to EDAM ontology concepts, propose new concepts, and browse the concept hierarchy"
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run_mcp_server(settings: Settings) -> i32 {
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to create tokio runtime: {}", e);
            return 1;
        }
    };

    rt.block_on(async {
        let api = match EdamApi::from_settings(settings) {
            Ok(api) => api,
            Err(e) => {
                error!(error = %e, "failed to load ontology");
                return 1;
            }
        };

        match api.warm_up().await {
            Ok(report) => info!(embedded = report.embedded, failed = report.failed, "catalog embedded"),
            Err(e) => error!(error = %e, "catalog warm-up failed"),
        }

        let server = EdamMcpServer::new(Arc::new(api));

        info!("edam-mcp server starting on stdio");

        let service = match server.serve(rmcp::transport::stdio()).await {
            Ok(s) => s,
            Err(e) => {
                error!(error = %e, "failed to start MCP server");
                return 1;
            }
        };

        if let Err(e) = service.waiting().await {
            error!(error = %e, "MCP server error");
            return 1;
        }

        0
    })
}
