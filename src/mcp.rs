use std::sync::{Arc, Mutex, MutexGuard};

use rmcp::{
    ServerHandler,
    ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolResult,
        Content,
        Implementation,
        ServerCapabilities,
        ServerInfo,
    },
    tool,
    tool_handler,
    tool_router,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    doc_id::DocumentId,
    error,
    filter::{Trace, View},
    session::{
        Banner,
        BannerKind,
        Effect,
        Event,
        InspectorState,
        Session,
        SessionSummary,
    },
};

const DEFAULT_VIEW_LIMIT: usize = 200;

#[derive(Clone)]
pub struct DoclabelMcpServer {
    session: Arc<Mutex<Session>>,
    tool_router: ToolRouter<Self>,
}

impl DoclabelMcpServer {
    pub fn new(session: Session) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            tool_router: Self::tool_router(),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Session>, rmcp::ErrorData> {
        self.session.lock().map_err(|_| {
            rmcp::ErrorData::internal_error("session lock poisoned", None)
        })
    }

    /// Dispatch `events` in order and report what they changed.
    fn apply(
        &self,
        events: Vec<Event>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let mut session = self.lock()?;
        let mut outcome = EventOutcome::default();

        for event in events {
            for effect in session.dispatch(event) {
                match effect {
                    Effect::Banner(banner) => outcome.banners.push(banner),
                    Effect::Inspector(state) => outcome.inspector = Some(state),
                    Effect::Exported(path) => {
                        outcome.exported = Some(path.display().to_string());
                    }
                    Effect::Redraw => outcome.redraw = true,
                    Effect::RegistriesChanged => {
                        outcome.registries_changed = true;
                    }
                    Effect::ClearInput(_) => {}
                }
            }
        }
        outcome.state = Some(session.summary());

        let is_error = outcome
            .banners
            .iter()
            .any(|b| b.kind == BannerKind::Error);
        let text = format_outcome(&outcome);
        let structured = serde_json::to_value(&outcome)
            .map_err(|e| mcp_error("failed to serialize outcome", e))?;

        let mut result = CallToolResult::structured(structured);
        result.content = vec![Content::text(text)];
        result.is_error = Some(is_error);
        Ok(result)
    }
}

#[tool_router(router = tool_router)]
impl DoclabelMcpServer {
    #[tool(
        name = "doclabel_view",
        description = "Show the documents visible under the current label and keyword filters, with their ids, coordinates and labels."
    )]
    pub async fn doclabel_view(
        &self,
        params: Parameters<ViewParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let limit = params.0.limit.unwrap_or(DEFAULT_VIEW_LIMIT);
        let session = self.lock()?;
        let view = session.view();
        let visible = view.len();
        let (view, truncated) = truncate_view(view, limit);

        let summary = if visible == 0 {
            "No documents match the current filters.".to_string()
        } else if truncated {
            format!("{visible} documents visible (showing first {limit})")
        } else {
            format!("{visible} documents visible")
        };

        let structured = serde_json::to_value(ViewResponse {
            visible,
            truncated,
            view,
            state: session.summary(),
        })
        .map_err(|e| mcp_error("failed to serialize view", e))?;

        let mut result = CallToolResult::structured(structured);
        result.content = vec![Content::text(summary)];
        Ok(result)
    }

    #[tool(
        name = "doclabel_filter_labels",
        description = "Show only documents with one of these labels. An empty list shows all labels."
    )]
    pub async fn doclabel_filter_labels(
        &self,
        params: Parameters<LabelFilterParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        self.apply(vec![Event::LabelFilterChanged(params.0.labels)])
    }

    #[tool(
        name = "doclabel_add_keyword",
        description = "Add a case-sensitive substring filter. All keyword filters must match."
    )]
    pub async fn doclabel_add_keyword(
        &self,
        params: Parameters<KeywordParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        self.apply(vec![Event::KeywordSubmitted(params.0.keyword)])
    }

    #[tool(
        name = "doclabel_set_keywords",
        description = "Keep only these of the active keyword filters; the rest are removed."
    )]
    pub async fn doclabel_set_keywords(
        &self,
        params: Parameters<KeywordSetParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        self.apply(vec![Event::KeywordChecklistChanged(params.0.keywords)])
    }

    #[tool(
        name = "doclabel_create_label",
        description = "Register a new label so it can be filtered on and assigned."
    )]
    pub async fn doclabel_create_label(
        &self,
        params: Parameters<CreateLabelParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        self.apply(vec![Event::LabelCreated(params.0.label)])
    }

    #[tool(
        name = "doclabel_assign",
        description = "Select the given document ids and assign them a label."
    )]
    pub async fn doclabel_assign(
        &self,
        params: Parameters<AssignParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let params = params.0;
        self.apply(vec![
            Event::PointsSelected(params.ids),
            Event::AssignLabelChosen(params.label),
            Event::CommitRequested,
        ])
    }

    #[tool(
        name = "doclabel_show",
        description = "Toggle the detail view of a document, showing its full text."
    )]
    pub async fn doclabel_show(
        &self,
        params: Parameters<ShowParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        self.apply(vec![Event::PointClicked(params.0.id)])
    }

    #[tool(
        name = "doclabel_close_detail",
        description = "Close the document detail view."
    )]
    pub async fn doclabel_close_detail(
        &self,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        self.apply(vec![Event::InspectorClosed])
    }

    #[tool(
        name = "doclabel_export",
        description = "Write all documents with their current labels to a new timestamped file."
    )]
    pub async fn doclabel_export(
        &self,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        self.apply(vec![Event::ExportRequested])
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for DoclabelMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build())
            .with_server_info(
                Implementation::new("doclabel", env!("CARGO_PKG_VERSION"))
                    .with_title("doclabel MCP"),
            )
            .with_instructions(
                "Use doclabel_view to inspect points, narrow them with doclabel_filter_labels and doclabel_add_keyword, then doclabel_assign labels and doclabel_export when done.",
            )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ViewParams {
    /// Maximum number of points returned (default: 200).
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabelFilterParams {
    /// Labels to show. Unknown labels are ignored.
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KeywordParams {
    /// Substring that document text must contain.
    pub keyword: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KeywordSetParams {
    /// Keyword filters to keep active.
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLabelParams {
    /// Name of the new label.
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignParams {
    /// Document ids to label.
    pub ids: Vec<DocumentId>,
    /// Label to assign. Omitting it assigns nothing.
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShowParams {
    /// Document id.
    pub id: DocumentId,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventOutcome {
    banners: Vec<Banner>,
    inspector: Option<InspectorState>,
    exported: Option<String>,
    redraw: bool,
    registries_changed: bool,
    state: Option<SessionSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ViewResponse {
    visible: usize,
    truncated: bool,
    view: View,
    state: SessionSummary,
}

fn format_outcome(outcome: &EventOutcome) -> String {
    let mut lines: Vec<String> =
        outcome.banners.iter().map(|b| b.message.clone()).collect();

    if let Some(inspector) = &outcome.inspector {
        match (inspector.is_open, inspector.document, &inspector.text) {
            (true, Some(id), Some(text)) => {
                lines.push(format!("Document {id}:\n{text}"));
            }
            _ => lines.push("Detail closed".to_string()),
        }
    }

    if let Some(state) = &outcome.state
        && (outcome.redraw || lines.is_empty())
    {
        lines.push(format!(
            "{} of {} documents visible",
            state.visible, state.documents
        ));
    }

    lines.join("\n")
}

fn truncate_view(view: View, limit: usize) -> (View, bool) {
    if view.len() <= limit {
        return (view, false);
    }

    let mut remaining = limit;
    let mut traces = Vec::new();
    for trace in view.traces {
        if remaining == 0 {
            break;
        }
        let take = trace.points.len().min(remaining);
        remaining -= take;
        traces.push(Trace {
            name: trace.name,
            points: trace.points.into_iter().take(take).collect(),
        });
    }

    (
        View {
            color_by_label: view.color_by_label,
            traces,
        },
        true,
    )
}

fn mcp_error(message: &str, error: impl std::fmt::Display) -> rmcp::ErrorData {
    rmcp::ErrorData::internal_error(
        message.to_string(),
        Some(json!({ "error": error.to_string() })),
    )
}

pub fn run_mcp(session: Session) -> error::Result<()> {
    let server = DoclabelMcpServer::new(session);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| {
            error::Error::Config(format!("failed to start tokio runtime: {e}"))
        })?;

    runtime.block_on(async move {
        let transport = rmcp::transport::stdio();
        let running = server.serve(transport).await.map_err(|e| {
            error::Error::Config(format!(
                "MCP server initialization failed: {e}"
            ))
        })?;
        running.waiting().await.map_err(|e| {
            error::Error::Config(format!("MCP server error: {e}"))
        })?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{session::tests::session_in, store::tests::sample_store};

    fn text_of(result: &CallToolResult) -> String {
        result
            .content
            .first()
            .and_then(|c| c.as_text())
            .map(|t| t.text.clone())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn assign_labels_selected_ids() {
        let tmp = tempfile::tempdir().unwrap();
        let server =
            DoclabelMcpServer::new(session_in(tmp.path(), sample_store()));

        let result = server
            .doclabel_assign(Parameters(AssignParams {
                ids: vec![DocumentId(0), DocumentId(1), DocumentId(3)],
                label: Some("cat".to_string()),
            }))
            .await
            .unwrap();

        assert_eq!(result.is_error, Some(false));
        assert!(text_of(&result).contains("3 documents labeled as \"cat\""));

        let structured = result.structured_content.expect("structured");
        let banners = structured
            .get("banners")
            .and_then(|v| v.as_array())
            .expect("banners array");
        assert_eq!(
            banners[0].get("kind").and_then(|v| v.as_str()),
            Some("success")
        );

        let session = server.session.lock().unwrap();
        assert_eq!(session.store().get(DocumentId(1)).unwrap().label, "cat");
        assert_eq!(session.store().get(DocumentId(4)).unwrap().label, "dog");
    }

    #[tokio::test]
    async fn assign_without_label_is_inert() {
        let tmp = tempfile::tempdir().unwrap();
        let server =
            DoclabelMcpServer::new(session_in(tmp.path(), sample_store()));

        let result = server
            .doclabel_assign(Parameters(AssignParams {
                ids: vec![DocumentId(0)],
                label: None,
            }))
            .await
            .unwrap();

        assert!(text_of(&result).contains("no label selected"));
        let session = server.session.lock().unwrap();
        assert_eq!(session.store().get(DocumentId(0)).unwrap().label, "cat");
    }

    #[tokio::test]
    async fn view_respects_filters_and_limit() {
        let tmp = tempfile::tempdir().unwrap();
        let server =
            DoclabelMcpServer::new(session_in(tmp.path(), sample_store()));

        server
            .doclabel_add_keyword(Parameters(KeywordParams {
                keyword: "foo".to_string(),
            }))
            .await
            .unwrap();

        let result = server
            .doclabel_view(Parameters(ViewParams { limit: Some(1) }))
            .await
            .unwrap();

        assert!(text_of(&result).contains("2 documents visible (showing first 1)"));
        let structured = result.structured_content.expect("structured");
        assert_eq!(structured.get("visible").and_then(|v| v.as_u64()), Some(2));
        assert_eq!(
            structured.get("truncated").and_then(|v| v.as_bool()),
            Some(true)
        );
        let points = structured["view"]["traces"][0]["points"]
            .as_array()
            .expect("points");
        assert_eq!(points.len(), 1);
        assert_eq!(points[0]["meta"]["id"], 2);
    }

    #[tokio::test]
    async fn show_returns_full_text() {
        let tmp = tempfile::tempdir().unwrap();
        let server =
            DoclabelMcpServer::new(session_in(tmp.path(), sample_store()));

        let result = server
            .doclabel_show(Parameters(ShowParams { id: DocumentId(1) }))
            .await
            .unwrap();
        assert!(text_of(&result).contains("a dog barked"));

        let closed = server.doclabel_close_detail().await.unwrap();
        assert!(text_of(&closed).contains("Detail closed"));
    }

    #[tokio::test]
    async fn export_reports_path() {
        let tmp = tempfile::tempdir().unwrap();
        let server =
            DoclabelMcpServer::new(session_in(tmp.path(), sample_store()));

        let result = server.doclabel_export().await.unwrap();
        let structured = result.structured_content.expect("structured");
        let exported = structured
            .get("exported")
            .and_then(|v| v.as_str())
            .expect("exported path");
        assert!(std::path::Path::new(exported).exists());
    }

    #[test]
    fn truncate_view_spans_traces() {
        let store = sample_store();
        let view = crate::filter::compute_view(
            &store,
            &["cat".to_string(), "dog".to_string()],
            &[],
        );
        let (cut, truncated) = truncate_view(view, 3);
        assert!(truncated);
        assert_eq!(cut.len(), 3);
        assert_eq!(cut.traces.len(), 2);
    }
}
