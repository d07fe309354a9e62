//! MCP (Model Context Protocol) server for the biodiversity dashboard.
//!
//! Exposes every dashboard payload in `ops` as an MCP tool so that AI
//! assistants can query the loaded dataset over stdio JSON-RPC.
//!
//! Start with: `bellybutton --data samples.json --mcp`

use std::sync::Arc;

use rmcp::{
    handler::server::tool::{ToolCallContext, ToolRouter},
    handler::server::wrapper::Parameters,
    model::*,
    service::RequestContext,
    tool, tool_router, ErrorData as McpError, RoleServer, ServerHandler, ServiceExt,
};
use schemars::JsonSchema;
use serde::Deserialize;

use crate::algo::aggregate::UnknownPolicy;
use crate::algo::dataset::Dataset;
use crate::error::DashboardError;
use crate::ops;

// ── Parameter structs ───────────────────────────────────────────────────────
// Each struct maps 1:1 with a CLI subcommand. `JsonSchema` is required by
// rmcp so that the tool's input schema is auto-generated for the AI client.

#[derive(Debug, Deserialize, JsonSchema)]
pub struct NormalizeParams {
    /// Raw field value (string, number, or null).
    pub value: serde_json::Value,
    /// Feature: "ethnicity", "gender", "age", "location", "bbtype", "wfreq".
    pub feature: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FrequencyParams {
    /// Values to count.
    pub values: Vec<serde_json::Value>,
    /// Normalize values for this feature before counting.
    pub feature: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DistributionParams {
    /// Feature to plot (default: "ethnicity").
    #[serde(default = "default_feature")]
    pub feature: String,
    /// Keep "Unknown" entries in histogram series.
    #[serde(default)]
    pub keep_unknown: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TopSpeciesParams {
    /// Sample name, e.g. "940".
    pub sample: String,
    /// Number of OTUs (default: 10).
    #[serde(default = "default_count")]
    pub count: usize,
    /// Sort observations by count before ranking.
    #[serde(default)]
    pub sort: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SampleParams {
    /// Sample name, e.g. "940".
    pub sample: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DashboardParams {
    /// Sample name, e.g. "940".
    pub sample: String,
    /// Feature for the distribution chart (default: "ethnicity").
    #[serde(default = "default_feature")]
    pub feature: String,
    /// Number of OTUs in the top-species chart (default: 10).
    #[serde(default = "default_count")]
    pub count: usize,
    /// Keep "Unknown" entries in histogram series.
    #[serde(default)]
    pub keep_unknown: bool,
    /// Sort observations by count before ranking.
    #[serde(default)]
    pub sort: bool,
}

// ── Default helpers ─────────────────────────────────────────────────────────

fn default_feature() -> String {
    "ethnicity".into()
}
fn default_count() -> usize {
    ops::DEFAULT_TOP_N
}

// ── Shared helpers ──────────────────────────────────────────────────────────

fn json_text(v: &serde_json::Value) -> String {
    serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
}

fn invalid(e: DashboardError) -> McpError {
    McpError::invalid_params(e.to_string(), None)
}

fn success(v: &serde_json::Value) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(json_text(v))]))
}

// ── MCP Server ──────────────────────────────────────────────────────────────

/// The MCP server struct: the read-only dataset plus the tool router.
#[derive(Clone)]
pub struct BiodiversityMcp {
    dataset: Arc<Dataset>,
    #[allow(dead_code)] // accessed at runtime by the #[tool_router] macro
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl BiodiversityMcp {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset: Arc::new(dataset),
            tool_router: Self::tool_router(),
        }
    }

    // ── names ───────────────────────────────────────────────────────────

    #[tool(
        name = "names",
        description = "List the sample names available in the loaded dataset. These are the options of the sample selector."
    )]
    async fn names(&self) -> Result<CallToolResult, McpError> {
        success(&ops::op_names(&self.dataset))
    }

    // ── features ────────────────────────────────────────────────────────

    #[tool(
        name = "features",
        description = "List the six demographic features (id, display label, numeric flag). These are the options of the metadata selector."
    )]
    async fn features(&self) -> Result<CallToolResult, McpError> {
        success(&ops::op_features())
    }

    // ── normalize ───────────────────────────────────────────────────────

    #[tool(
        name = "normalize",
        description = "Normalize one raw demographic value for display. Absent/empty/zero becomes \"Unknown\"; gender and bbtype get a capitalized first letter; ethnicity drops parentheticals and multi-valued entries become \"Mixed\"; location reduces to its two-letter code when present."
    )]
    async fn normalize(
        &self,
        params: Parameters<NormalizeParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = params.0;
        let feature = ops::parse_feature(&p.feature).map_err(invalid)?;
        success(&ops::op_normalize(Some(&p.value), feature))
    }

    // ── frequency ───────────────────────────────────────────────────────

    #[tool(
        name = "frequency",
        description = "Count occurrences of values. Numbers and their string forms share a key. Pass `feature` to normalize raw values first. Returns keys, counts, total and a key→count table."
    )]
    async fn frequency(
        &self,
        params: Parameters<FrequencyParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = params.0;
        let feature = p
            .feature
            .as_deref()
            .map(ops::parse_feature)
            .transpose()
            .map_err(invalid)?;
        success(&ops::op_frequency(&p.values, feature))
    }

    // ── distribution ────────────────────────────────────────────────────

    #[tool(
        name = "distribution",
        description = "Distribution of one feature across every volunteer. Numeric features (age, wfreq) return a histogram series with a summary; categorical features return category counts for a bar chart."
    )]
    async fn distribution(
        &self,
        params: Parameters<DistributionParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = params.0;
        let feature = ops::parse_feature(&p.feature).map_err(invalid)?;
        let dataset = Arc::clone(&self.dataset);
        let result = tokio::task::spawn_blocking(move || {
            ops::op_distribution(&dataset, feature, UnknownPolicy::from_keep(p.keep_unknown))
        })
        .await
        .map_err(|e| McpError::internal_error(format!("task join error: {e}"), None))?;
        success(&result)
    }

    // ── top_species ─────────────────────────────────────────────────────

    #[tool(
        name = "top_species",
        description = "Top-N OTUs of one sample for a horizontal bar chart: x = counts, y = \"OID <id>\" labels, text = taxonomy. Ordered lowest-first so the largest bar renders on top."
    )]
    async fn top_species(
        &self,
        params: Parameters<TopSpeciesParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = params.0;
        let result =
            ops::op_top_species(&self.dataset, &p.sample, p.count, p.sort).map_err(invalid)?;
        success(&result)
    }

    // ── bubble ──────────────────────────────────────────────────────────

    #[tool(
        name = "bubble",
        description = "Every OTU of one sample as a bubble-chart series: x = OTU id, y and size = count, color = OTU id, text = taxonomy."
    )]
    async fn bubble(&self, params: Parameters<SampleParams>) -> Result<CallToolResult, McpError> {
        let result = ops::op_bubble(&self.dataset, &params.0.sample).map_err(invalid)?;
        success(&result)
    }

    // ── gauge ───────────────────────────────────────────────────────────

    #[tool(
        name = "gauge",
        description = "Washing-frequency gauge (0-9 scrubs per week) for one volunteer. `value` is null when the frequency is unknown."
    )]
    async fn gauge(&self, params: Parameters<SampleParams>) -> Result<CallToolResult, McpError> {
        let result = ops::op_gauge(&self.dataset, &params.0.sample).map_err(invalid)?;
        success(&result)
    }

    // ── info_card ───────────────────────────────────────────────────────

    #[tool(
        name = "info_card",
        description = "The six normalized demographic fields of one volunteer."
    )]
    async fn info_card(
        &self,
        params: Parameters<SampleParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = ops::op_info_card(&self.dataset, &params.0.sample).map_err(invalid)?;
        success(&result)
    }

    // ── dashboard ───────────────────────────────────────────────────────

    #[tool(
        name = "dashboard",
        description = "Everything a sample/feature selection renders, in one call: info card, feature distribution, top-species bar, bubble series and wash-frequency gauge."
    )]
    async fn dashboard(
        &self,
        params: Parameters<DashboardParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = params.0;
        let feature = ops::parse_feature(&p.feature).map_err(invalid)?;
        let dataset = Arc::clone(&self.dataset);
        let result = tokio::task::spawn_blocking(move || {
            ops::op_dashboard(
                &dataset,
                &p.sample,
                feature,
                p.count,
                UnknownPolicy::from_keep(p.keep_unknown),
                p.sort,
            )
        })
        .await
        .map_err(|e| McpError::internal_error(format!("task join error: {e}"), None))?
        .map_err(invalid)?;
        success(&result)
    }
}

// ── ServerHandler glue ──────────────────────────────────────────────────────

impl ServerHandler for BiodiversityMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Belly-button biodiversity dashboard. Tools: names, features, normalize, \
                 frequency, distribution, top_species, bubble, gauge, info_card, dashboard. \
                 Call `names` first to discover sample ids."
                    .into(),
            ),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: None }),
                ..Default::default()
            },
            server_info: Implementation {
                name: "bellybutton".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: Some("Belly Button Biodiversity".into()),
                description: Some(
                    "Demographic normalization and OTU ranking for the biodiversity dashboard"
                        .into(),
                ),
                icons: None,
                website_url: None,
            },
            ..Default::default()
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult {
            tools: self.tool_router.list_all(),
            next_cursor: None,
            meta: Default::default(),
        }))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        let tool_context = ToolCallContext::new(self, request, context);
        async move { self.tool_router.call(tool_context).await }
    }

    fn get_tool(&self, name: &str) -> Option<Tool> {
        self.tool_router.get(name).cloned()
    }
}

// ── Entry point ─────────────────────────────────────────────────────────────

/// Start the MCP server on stdio. Called from `cli.rs` when `--mcp` is passed.
pub async fn serve_stdio(dataset: Dataset) -> Result<(), Box<dyn std::error::Error>> {
    let server = BiodiversityMcp::new(dataset);
    let transport = rmcp::transport::io::stdio();
    let service = server.serve(transport).await.inspect_err(|e| {
        log::error!("MCP serve error: {e}");
    })?;
    service.waiting().await?;
    Ok(())
}
