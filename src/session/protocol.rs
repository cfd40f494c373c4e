//! UI bridge messages. Both directions are JSON objects discriminated by `type`.

use serde::{Deserialize, Serialize};

use crate::host::HostCapabilities;
use crate::model::CollectionDescriptor;

/// Requests from the UI panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum UiRequest {
    GetCollections,
    FindSpacingIssues {
        #[serde(default)]
        spacing_collection_id: Option<String>,
    },
    FindAllIssues {
        #[serde(default)]
        spacing_collection_id: Option<String>,
        #[serde(default)]
        border_radius_collection_id: Option<String>,
    },
    FixSpacingIssues {
        #[serde(default)]
        spacing_collection_id: Option<String>,
    },
    FixBorderRadiusIssues {
        #[serde(default)]
        border_radius_collection_id: Option<String>,
    },
    ClearMarkers,
    RevertAllBindings,
    RevertSpacingBindings,
    RefreshVariables,
}

impl UiRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            UiRequest::GetCollections => "get-collections",
            UiRequest::FindSpacingIssues { .. } => "find-spacing-issues",
            UiRequest::FindAllIssues { .. } => "find-all-issues",
            UiRequest::FixSpacingIssues { .. } => "fix-spacing-issues",
            UiRequest::FixBorderRadiusIssues { .. } => "fix-border-radius-issues",
            UiRequest::ClearMarkers => "clear-markers",
            UiRequest::RevertAllBindings => "revert-all-bindings",
            UiRequest::RevertSpacingBindings => "revert-spacing-bindings",
            UiRequest::RefreshVariables => "refresh-variables",
        }
    }
}

/// Replies and broadcasts to the UI panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum UiResponse {
    /// Sent once at startup.
    ApiCheck {
        local_variables: bool,
        local_collections: bool,
        library_collections: bool,
        library_variables: bool,
        import_by_key: bool,
        variables_api: bool,
        library_api: bool,
    },
    CollectionsLoaded {
        collections: Vec<CollectionDescriptor>,
    },
    SpacingIssuesFound {
        count: usize,
        fixable_count: usize,
        unfixable_count: usize,
        node_count: usize,
    },
    AllIssuesFound {
        total_count: usize,
        spacing_count: usize,
        border_radius_count: usize,
        fixable_count: usize,
        unfixable_count: usize,
        node_count: usize,
    },
    SpacingIssuesFixed {
        fixed_count: usize,
        unfixable_count: usize,
    },
    BorderRadiusIssuesFixed {
        fixed_count: usize,
        unfixable_count: usize,
    },
    MarkersCleared {
        count: usize,
    },
    AllBindingsReverted {
        spacing_count: usize,
        border_radius_count: usize,
        total_count: usize,
    },
    SpacingBindingsReverted {
        count: usize,
    },
    VariablesRefreshed {
        spacing_token_count: usize,
        border_radius_token_count: usize,
        collection_count: usize,
    },
    Error {
        message: String,
    },
}

impl UiResponse {
    pub fn api_check(caps: &HostCapabilities) -> Self {
        UiResponse::ApiCheck {
            local_variables: caps.local_variables,
            local_collections: caps.local_collections,
            library_collections: caps.library_collections,
            library_variables: caps.library_variables,
            import_by_key: caps.import_by_key,
            variables_api: caps.has_variables_api(),
            library_api: caps.has_library_api(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, UiResponse::Error { .. })
    }
}
