//! Session controller: owns the caches and answers UI requests.
//!
//! Handler failures never end the session. They are turned into an
//! `error` response plus a host notification, and the next request is
//! served normally.

pub mod protocol;

use std::sync::Arc;

use crate::bind::{fix_issues, revert_scope};
use crate::config::LintConfig;
use crate::detect::IssueDetector;
use crate::host::{HostBackend, HostCapabilities, MemoryHost};
use crate::markers::MarkerAnnotator;
use crate::model::Category;
use crate::tokens::{Clock, SystemClock, TokenAggregator, TokenCache};
use crate::Result;

pub use protocol::{UiRequest, UiResponse};

/// One plugin session against one host document.
pub struct Session<H: HostBackend> {
    host: H,
    capabilities: HostCapabilities,
    cache: TokenCache,
    annotator: MarkerAnnotator,
}

impl<H: HostBackend> Session<H> {
    pub fn new(host: H) -> Self {
        Self::with_config(host, &LintConfig::default())
    }

    pub fn with_config(host: H, config: &LintConfig) -> Self {
        Self::with_clock(host, config, Arc::new(SystemClock))
    }

    /// Capabilities are probed here, once, and fixed for the session.
    pub fn with_clock(host: H, config: &LintConfig, clock: Arc<dyn Clock>) -> Self {
        let capabilities = host.capabilities();
        tracing::info!(
            variables_api = capabilities.has_variables_api(),
            library_api = capabilities.has_library_api(),
            "session opened"
        );
        let aggregator = TokenAggregator::new(capabilities, config.batch_pool());
        Self {
            host,
            capabilities,
            cache: TokenCache::with_clock(aggregator, config.cache_ttl(), clock),
            annotator: config.annotator(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    pub fn capabilities(&self) -> HostCapabilities {
        self.capabilities
    }

    /// The startup broadcast.
    pub fn api_check(&self) -> UiResponse {
        UiResponse::api_check(&self.capabilities)
    }

    /// Answer one request. Always produces a response.
    pub async fn handle(&self, request: UiRequest) -> UiResponse {
        let kind = request.kind();
        tracing::debug!(request = kind, "handling request");
        match self.dispatch(request).await {
            Ok(response) => response,
            Err(err) => self.fail(kind, err.to_string()).await,
        }
    }

    /// Parse and answer one JSON request. Malformed input is reported like
    /// any other handler failure.
    pub async fn handle_json(&self, json: &str) -> UiResponse {
        match serde_json::from_str::<UiRequest>(json) {
            Ok(request) => self.handle(request).await,
            Err(err) => self.fail("invalid", format!("invalid request: {err}")).await,
        }
    }

    async fn fail(&self, kind: &str, message: String) -> UiResponse {
        tracing::error!(request = kind, %message, "request failed");
        if let Err(err) = self.host.notify(&message).await {
            tracing::warn!(%err, "host notification failed");
        }
        UiResponse::Error { message }
    }

    async fn dispatch(&self, request: UiRequest) -> Result<UiResponse> {
        match request {
            UiRequest::GetCollections => {
                let collections = self.cache.get_collections(&self.host, false).await;
                Ok(UiResponse::CollectionsLoaded { collections: collections.as_ref().clone() })
            }

            UiRequest::FindSpacingIssues { spacing_collection_id } => {
                let report = self
                    .detector()
                    .with_markers(&self.annotator)
                    .detect(Category::Spacing, scope_filter(&spacing_collection_id))
                    .await?;
                Ok(UiResponse::SpacingIssuesFound {
                    count: report.count(),
                    fixable_count: report.fixable_count(),
                    unfixable_count: report.unfixable_count(),
                    node_count: report.node_count(),
                })
            }

            UiRequest::FindAllIssues { spacing_collection_id, border_radius_collection_id } => {
                let (spacing, radius) = self
                    .detector()
                    .with_markers(&self.annotator)
                    .detect_all(
                        scope_filter(&spacing_collection_id),
                        scope_filter(&border_radius_collection_id),
                    )
                    .await?;
                let mut nodes = spacing.affected_nodes();
                nodes.extend(radius.affected_nodes());
                Ok(UiResponse::AllIssuesFound {
                    total_count: spacing.count() + radius.count(),
                    spacing_count: spacing.count(),
                    border_radius_count: radius.count(),
                    fixable_count: spacing.fixable_count() + radius.fixable_count(),
                    unfixable_count: spacing.unfixable_count() + radius.unfixable_count(),
                    node_count: nodes.len(),
                })
            }

            UiRequest::FixSpacingIssues { spacing_collection_id } => {
                let report = self
                    .detector()
                    .detect(Category::Spacing, scope_filter(&spacing_collection_id))
                    .await?;
                let fixed = fix_issues(&self.host, &report.issues).await;
                Ok(UiResponse::SpacingIssuesFixed {
                    fixed_count: fixed.fixed,
                    unfixable_count: fixed.unfixable,
                })
            }

            UiRequest::FixBorderRadiusIssues { border_radius_collection_id } => {
                let report = self
                    .detector()
                    .detect(Category::BorderRadius, scope_filter(&border_radius_collection_id))
                    .await?;
                let fixed = fix_issues(&self.host, &report.issues).await;
                Ok(UiResponse::BorderRadiusIssuesFixed {
                    fixed_count: fixed.fixed,
                    unfixable_count: fixed.unfixable,
                })
            }

            UiRequest::ClearMarkers => {
                let count = self.annotator.clear_all(&self.host).await?;
                Ok(UiResponse::MarkersCleared { count })
            }

            UiRequest::RevertAllBindings => {
                let report = revert_scope(&self.host, &[Category::Spacing, Category::BorderRadius]).await?;
                Ok(UiResponse::AllBindingsReverted {
                    spacing_count: report.spacing,
                    border_radius_count: report.border_radius,
                    total_count: report.total(),
                })
            }

            UiRequest::RevertSpacingBindings => {
                let report = revert_scope(&self.host, &[Category::Spacing]).await?;
                Ok(UiResponse::SpacingBindingsReverted { count: report.spacing })
            }

            UiRequest::RefreshVariables => {
                let summary = self.cache.refresh_all(&self.host).await;
                Ok(UiResponse::VariablesRefreshed {
                    spacing_token_count: summary.spacing_tokens,
                    border_radius_token_count: summary.border_radius_tokens,
                    collection_count: summary.collections,
                })
            }
        }
    }

    fn detector(&self) -> IssueDetector<'_, H> {
        IssueDetector::new(&self.host, &self.cache)
    }
}

/// In-memory session for testing and embedding.
impl Session<MemoryHost> {
    pub fn open_memory(host: MemoryHost) -> Self {
        Self::new(host)
    }
}

/// The UI sends an empty id for "all collections".
fn scope_filter(id: &Option<String>) -> Option<&str> {
    id.as_deref().filter(|id| !id.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostCapabilities;
    use crate::model::{AutoLayout, LayoutMode, NodeKind, SceneNode, TokenRecord};

    fn host() -> MemoryHost {
        let host = MemoryHost::new();
        host.add_variable(TokenRecord::float("v:1", "k1", "space-md", "c:1", 16.0));
        let mut frame = SceneNode::new("n1", NodeKind::frame(AutoLayout {
            layout_mode: LayoutMode::Horizontal,
            item_spacing: 16.0,
            ..Default::default()
        }));
        frame.name = "Card".into();
        host.add_page_node(frame);
        host
    }

    #[test]
    fn test_scope_filter_treats_empty_as_all() {
        assert_eq!(scope_filter(&None), None);
        assert_eq!(scope_filter(&Some(String::new())), None);
        assert_eq!(scope_filter(&Some("c:1".into())), Some("c:1"));
    }

    #[tokio::test]
    async fn test_find_then_fix() {
        let session = Session::open_memory(host());
        let found = session
            .handle(UiRequest::FindSpacingIssues { spacing_collection_id: None })
            .await;
        assert_eq!(
            found,
            UiResponse::SpacingIssuesFound { count: 1, fixable_count: 1, unfixable_count: 0, node_count: 1 }
        );
        assert_eq!(session.host().markers().len(), 1);

        let fixed = session
            .handle(UiRequest::FixSpacingIssues { spacing_collection_id: Some(String::new()) })
            .await;
        assert_eq!(fixed, UiResponse::SpacingIssuesFixed { fixed_count: 1, unfixable_count: 0 });
    }

    #[tokio::test]
    async fn test_api_check_reflects_capabilities() {
        let host = host();
        host.set_capabilities(HostCapabilities { library_collections: false, ..HostCapabilities::full() });
        let session = Session::new(host);
        match session.api_check() {
            UiResponse::ApiCheck { variables_api, library_api, library_collections, .. } => {
                assert!(variables_api);
                assert!(!library_api);
                assert!(!library_collections);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_json_is_an_error_response() {
        let session = Session::open_memory(host());
        let resp = session.handle_json("{\"type\": 42}").await;
        assert!(resp.is_error());
        assert_eq!(session.host().notifications().len(), 1);
    }
}
