use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use fieldgate_core::{AppResult, Subject};
use fieldgate_domain::{EntityDescriptor, RlsPolicy};
use serde_json::Value;
use tracing::warn;

use crate::{MetadataRegistry, RowLookup};

/// Parent-derivation chains deeper than this are treated as broken metadata.
const MAX_PARENT_DEPTH: usize = 4;

/// Outcome of a row-level-security check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowVisibility {
    /// The subject may see and target the row.
    Visible,
    /// The row exists but the subject's policy hides it.
    Hidden,
    /// The row's polymorphic parent could not be resolved. Denied like
    /// `Hidden`, but flagged for operational follow-up.
    Orphaned,
}

/// Evaluates row-level-security tags, resolving polymorphic parents through
/// the injected row lookup.
#[derive(Clone)]
pub struct RlsEvaluator {
    row_lookup: Arc<dyn RowLookup>,
}

impl RlsEvaluator {
    /// Creates an evaluator over a row-lookup collaborator.
    #[must_use]
    pub fn new(row_lookup: Arc<dyn RowLookup>) -> Self {
        Self { row_lookup }
    }

    /// Returns whether a row is visible to the subject under the entity's
    /// RLS policy for the subject's role.
    pub async fn is_row_visible(
        &self,
        registry: &MetadataRegistry,
        descriptor: &EntityDescriptor,
        subject: &Subject,
        row: &Value,
    ) -> AppResult<RowVisibility> {
        self.visible_at_depth(registry, descriptor, subject, row, 0)
            .await
    }

    fn visible_at_depth<'a>(
        &'a self,
        registry: &'a MetadataRegistry,
        descriptor: &'a EntityDescriptor,
        subject: &'a Subject,
        row: &'a Value,
        depth: usize,
    ) -> Pin<Box<dyn Future<Output = AppResult<RowVisibility>> + Send + 'a>> {
        Box::pin(async move {
            if subject.is_internal() {
                return Ok(RowVisibility::Visible);
            }

            match descriptor.rls_for(subject.role_name()) {
                RlsPolicy::AllRecords | RlsPolicy::PublicResource => Ok(RowVisibility::Visible),
                RlsPolicy::DenyAll => Ok(RowVisibility::Hidden),
                RlsPolicy::OwnRecordOnly => {
                    let column = descriptor.rls_filter().own_record_field.as_str();
                    let matches = row
                        .get(column)
                        .is_some_and(|value| subject.id().matches_value(value));
                    Ok(if matches {
                        RowVisibility::Visible
                    } else {
                        RowVisibility::Hidden
                    })
                }
                RlsPolicy::ParentEntityAccess => {
                    self.parent_visibility(registry, descriptor, subject, row, depth)
                        .await
                }
            }
        })
    }

    async fn parent_visibility(
        &self,
        registry: &MetadataRegistry,
        descriptor: &EntityDescriptor,
        subject: &Subject,
        row: &Value,
        depth: usize,
    ) -> AppResult<RowVisibility> {
        let entity_key = descriptor.entity_key();

        if depth >= MAX_PARENT_DEPTH {
            warn!(entity = entity_key, depth, "parent-derivation chain exceeded depth bound");
            return Ok(RowVisibility::Orphaned);
        }

        let Some(anchor) = descriptor.polymorphic_anchor() else {
            warn!(entity = entity_key, "parent_entity_access without a polymorphic anchor");
            return Ok(RowVisibility::Orphaned);
        };

        let Some(parent_key) = row.get(&anchor.type_field).and_then(Value::as_str) else {
            warn!(entity = entity_key, column = anchor.type_field.as_str(), "row is missing its parent type column");
            return Ok(RowVisibility::Orphaned);
        };

        if !anchor.allowed_parents.iter().any(|key| key == parent_key) {
            warn!(entity = entity_key, parent = parent_key, "parent type is outside the anchor's allowed set");
            return Ok(RowVisibility::Orphaned);
        }

        let Some(parent_descriptor) = registry.descriptor(parent_key) else {
            warn!(entity = entity_key, parent = parent_key, "parent type is not a registered entity");
            return Ok(RowVisibility::Orphaned);
        };

        let parent_id = match row.get(&anchor.id_field) {
            Some(Value::String(text)) if !text.trim().is_empty() => text.clone(),
            Some(Value::Number(number)) => number.to_string(),
            _ => {
                warn!(entity = entity_key, column = anchor.id_field.as_str(), "row is missing its parent id column");
                return Ok(RowVisibility::Orphaned);
            }
        };

        let parent_row = self
            .row_lookup
            .fetch_row(parent_descriptor.table_name(), &parent_id)
            .await?;
        let Some(parent_row) = parent_row else {
            warn!(
                entity = entity_key,
                parent = parent_key,
                parent_id = parent_id.as_str(),
                "dangling polymorphic parent reference"
            );
            return Ok(RowVisibility::Orphaned);
        };

        self.visible_at_depth(registry, parent_descriptor, subject, &parent_row, depth + 1)
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use fieldgate_core::Subject;
    use serde_json::json;

    use crate::catalog;
    use crate::ports::InMemoryRowStore;

    use super::{RlsEvaluator, RowVisibility};

    fn attachment_for_work_order(id: i64) -> serde_json::Value {
        json!({
            "id": 900,
            "file_name": "site-photo.jpg",
            "entity_type": "work_orders",
            "entity_id": id,
        })
    }

    #[tokio::test]
    async fn own_record_only_matches_the_linkage_column() {
        let registry = catalog::registry().unwrap_or_else(|_| unreachable!());
        let descriptor = registry
            .descriptor("customers")
            .unwrap_or_else(|| unreachable!());
        let evaluator = RlsEvaluator::new(Arc::new(InMemoryRowStore::new()));
        let subject = Subject::new(7, "customer");

        let own = evaluator
            .is_row_visible(&registry, descriptor, &subject, &json!({"id": 7}))
            .await;
        assert!(own.is_ok_and(|visibility| visibility == RowVisibility::Visible));

        let other = evaluator
            .is_row_visible(&registry, descriptor, &subject, &json!({"id": 8}))
            .await;
        assert!(other.is_ok_and(|visibility| visibility == RowVisibility::Hidden));
    }

    #[tokio::test]
    async fn internal_subject_bypasses_row_policies() {
        let registry = catalog::registry().unwrap_or_else(|_| unreachable!());
        let descriptor = registry
            .descriptor("audit_logs")
            .unwrap_or_else(|| unreachable!());
        let evaluator = RlsEvaluator::new(Arc::new(InMemoryRowStore::new()));

        let visibility = evaluator
            .is_row_visible(&registry, descriptor, &Subject::internal(), &json!({"id": 1}))
            .await;
        assert!(visibility.is_ok_and(|value| value == RowVisibility::Visible));
    }

    #[tokio::test]
    async fn parent_access_follows_the_parent_policy() {
        let registry = catalog::registry().unwrap_or_else(|_| unreachable!());
        let descriptor = registry
            .descriptor("file_attachments")
            .unwrap_or_else(|| unreachable!());

        let store = Arc::new(InMemoryRowStore::new());
        store
            .insert_row(
                "work_orders",
                "42",
                json!({"id": 42, "assigned_technician_id": 2}),
            )
            .await;
        let evaluator = RlsEvaluator::new(store);

        let assigned = Subject::new(2, "technician");
        let visibility = evaluator
            .is_row_visible(&registry, descriptor, &assigned, &attachment_for_work_order(42))
            .await;
        assert!(visibility.is_ok_and(|value| value == RowVisibility::Visible));

        let unassigned = Subject::new(9, "technician");
        let visibility = evaluator
            .is_row_visible(&registry, descriptor, &unassigned, &attachment_for_work_order(42))
            .await;
        assert!(visibility.is_ok_and(|value| value == RowVisibility::Hidden));
    }

    #[tokio::test]
    async fn dangling_parent_is_orphaned_not_visible() {
        let registry = catalog::registry().unwrap_or_else(|_| unreachable!());
        let descriptor = registry
            .descriptor("file_attachments")
            .unwrap_or_else(|| unreachable!());
        let evaluator = RlsEvaluator::new(Arc::new(InMemoryRowStore::new()));

        let visibility = evaluator
            .is_row_visible(
                &registry,
                descriptor,
                &Subject::new(5, "admin"),
                &attachment_for_work_order(404),
            )
            .await;
        assert!(visibility.is_ok_and(|value| value == RowVisibility::Orphaned));
    }

    #[tokio::test]
    async fn parent_type_outside_the_anchor_is_orphaned() {
        let registry = catalog::registry().unwrap_or_else(|_| unreachable!());
        let descriptor = registry
            .descriptor("file_attachments")
            .unwrap_or_else(|| unreachable!());
        let evaluator = RlsEvaluator::new(Arc::new(InMemoryRowStore::new()));

        let row = json!({
            "id": 901,
            "file_name": "note.txt",
            "entity_type": "audit_logs",
            "entity_id": 1,
        });
        let visibility = evaluator
            .is_row_visible(&registry, descriptor, &Subject::new(5, "admin"), &row)
            .await;
        assert!(visibility.is_ok_and(|value| value == RowVisibility::Orphaned));
    }
}
