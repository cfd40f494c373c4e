//! Binding issues to tokens, and reverting bindings back to static values.
//!
//! Binding is verified by re-reading the node. Failures never propagate:
//! they come back as `false` and show up as unfixable in the counts.
//! Composite properties bind all-or-nothing; when one member fails, it and
//! the members bound earlier in the same call are restored.

use crate::host::{HostBackend, ScopeWalk};
use crate::model::{Category, Issue, NodeField, NodeId, Token, VariableId};
use crate::Result;

/// Counts from a fix run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FixReport {
    pub fixed: usize,
    pub unfixable: usize,
}

/// Counts from a revert sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RevertReport {
    pub spacing: usize,
    pub border_radius: usize,
}

impl RevertReport {
    pub fn total(&self) -> usize {
        self.spacing + self.border_radius
    }
}

/// Bind one field and confirm the host now reports the token's id.
pub async fn bind_field<H: HostBackend>(
    host: &H,
    node_id: &NodeId,
    field: NodeField,
    token: &Token,
) -> bool {
    if let Err(err) = host.set_bound_variable(node_id, field, Some(&token.id)).await {
        tracing::warn!(node = %node_id, %field, token = %token.name, %err, "binding failed");
        return false;
    }
    match host.get_node(node_id).await {
        Ok(Some(node)) if node.bound_variable(field) == Some(&token.id) => true,
        Ok(Some(node)) => {
            tracing::warn!(
                node = %node_id,
                %field,
                expected = %token.id,
                actual = ?node.bound_variable(field),
                "binding did not stick"
            );
            false
        }
        Ok(None) => {
            tracing::warn!(node = %node_id, "node vanished while binding");
            false
        }
        Err(err) => {
            tracing::warn!(node = %node_id, %field, %err, "could not verify binding");
            false
        }
    }
}

/// Field state captured before a composite bind, for rollback.
struct Prior {
    field: NodeField,
    binding: Option<VariableId>,
    value: Option<f64>,
}

/// Bind every field an issue covers to its matching token.
///
/// Returns false for issues without a token.
pub async fn bind_issue<H: HostBackend>(host: &H, issue: &Issue) -> bool {
    let Some(token) = issue.matching_token.as_ref() else {
        return false;
    };
    let fields = issue.property.fields();
    if let [field] = fields {
        return bind_field(host, &issue.node_id, *field, token).await;
    }

    let priors: Vec<Prior> = match host.get_node(&issue.node_id).await {
        Ok(Some(node)) => fields
            .iter()
            .map(|&field| Prior {
                field,
                binding: node.bound_variable(field).cloned(),
                value: node.field_value(field),
            })
            .collect(),
        Ok(None) => {
            tracing::warn!(node = %issue.node_id, "node vanished before binding");
            return false;
        }
        Err(err) => {
            tracing::warn!(node = %issue.node_id, %err, "could not read node before binding");
            return false;
        }
    };

    for (at, prior) in priors.iter().enumerate() {
        if !bind_field(host, &issue.node_id, prior.field, token).await {
            tracing::warn!(
                node = %issue.node_id,
                property = %issue.property,
                failed = %prior.field,
                "composite binding failed; restoring"
            );
            // The failed member may have been written before its check failed.
            restore(host, &issue.node_id, &priors[..=at]).await;
            return false;
        }
    }
    true
}

async fn restore<H: HostBackend>(host: &H, node_id: &NodeId, priors: &[Prior]) {
    for prior in priors {
        let result = async {
            host.set_bound_variable(node_id, prior.field, prior.binding.as_ref()).await?;
            if let (None, Some(value)) = (&prior.binding, prior.value) {
                host.set_field_value(node_id, prior.field, value).await?;
            }
            Ok::<_, crate::Error>(())
        }
        .await;
        if let Err(err) = result {
            tracing::warn!(node = %node_id, field = %prior.field, %err, "rollback failed");
        }
    }
}

/// Bind every fixable issue. Issues without a token, and failed binds,
/// count as unfixable.
pub async fn fix_issues<H: HostBackend>(host: &H, issues: &[Issue]) -> FixReport {
    let mut report = FixReport::default();
    for issue in issues {
        if issue.is_fixable() && bind_issue(host, issue).await {
            report.fixed += 1;
        } else {
            report.unfixable += 1;
        }
    }
    tracing::info!(fixed = report.fixed, unfixable = report.unfixable, "fix finished");
    report
}

/// Replace a live binding with its current computed value.
///
/// No-op (false) when the field is not bound.
pub async fn revert_field<H: HostBackend>(host: &H, node_id: &NodeId, field: NodeField) -> Result<bool> {
    let Some(node) = host.get_node(node_id).await? else {
        return Ok(false);
    };
    if !node.is_bound(field) {
        return Ok(false);
    }
    let Some(value) = node.field_value(field) else {
        return Ok(false);
    };
    host.set_bound_variable(node_id, field, None).await?;
    host.set_field_value(node_id, field, value).await?;
    Ok(true)
}

/// Revert every bound field of the given categories in the
/// selection-or-page scope, flagged as an issue or not.
pub async fn revert_scope<H: HostBackend>(host: &H, categories: &[Category]) -> Result<RevertReport> {
    let mut report = RevertReport::default();
    let mut walk = ScopeWalk::start(host).await?;

    while let Some(node) = walk.next().await? {
        for &category in categories {
            let fields: &[NodeField] = match category {
                Category::Spacing => &NodeField::SPACING,
                Category::BorderRadius => &NodeField::RADIUS,
            };
            for &field in fields {
                if node.field_value(field).is_none() || !node.is_bound(field) {
                    continue;
                }
                match revert_field(host, &node.id, field).await {
                    Ok(true) => match category {
                        Category::Spacing => report.spacing += 1,
                        Category::BorderRadius => report.border_radius += 1,
                    },
                    Ok(false) => {}
                    Err(err) => tracing::warn!(node = %node.id, %field, %err, "revert failed"),
                }
            }
        }
    }

    tracing::info!(spacing = report.spacing, border_radius = report.border_radius, "reverted bindings");
    Ok(report)
}
