use std::sync::Arc;

use fieldgate_core::{AppError, AppResult, Subject};
use fieldgate_domain::{AccessDecision, DenyReason, EntityDescriptor, Operation};
use serde_json::Value;
use tracing::debug;

use crate::field_access::can_access_field;
use crate::mutation::{MutationCheck, validate_mutation};
use crate::rls::{RlsEvaluator, RowVisibility};
use crate::{MetadataRegistry, RowLookup};

mod create;
mod delete;
mod read;
mod update;

#[cfg(test)]
mod tests;

/// One entry point per operation, composing the entity, row, field, and
/// mutation gates into a single decision.
///
/// Side-effect-free: the service never touches storage (the row lookup is
/// read-only and only consulted for polymorphic parents) and caches nothing
/// across calls.
#[derive(Clone)]
pub struct AccessDecisionService {
    registry: Arc<MetadataRegistry>,
    rls: RlsEvaluator,
}

impl AccessDecisionService {
    /// Creates a decision service over a loaded registry and a row lookup.
    #[must_use]
    pub fn new(registry: Arc<MetadataRegistry>, row_lookup: Arc<dyn RowLookup>) -> Self {
        Self {
            registry,
            rls: RlsEvaluator::new(row_lookup),
        }
    }

    /// Returns the registry decisions are evaluated against.
    #[must_use]
    pub fn registry(&self) -> &MetadataRegistry {
        &self.registry
    }

    fn descriptor(&self, entity_key: &str) -> AppResult<&EntityDescriptor> {
        self.registry
            .descriptor(entity_key)
            .ok_or_else(|| AppError::NotFound(format!("unknown entity '{entity_key}'")))
    }

    /// Coarse per-operation minimum, checked before anything row- or
    /// field-shaped.
    fn entity_gate(
        &self,
        descriptor: &EntityDescriptor,
        subject: &Subject,
        operation: Operation,
    ) -> Option<AccessDecision> {
        let requirement = descriptor.entity_permissions().requirement_for(operation);
        if self.registry.hierarchy().satisfies(subject, requirement) {
            return None;
        }

        debug!(
            entity = descriptor.entity_key(),
            operation = operation.as_str(),
            role = subject.role_name(),
            "entity permission gate denied"
        );
        Some(AccessDecision::denied(DenyReason::EntityPermissionDenied))
    }

    /// Row-level gate. A missing row, a hidden row, and an orphaned row all
    /// produce the same denial so callers cannot infer existence.
    async fn rls_gate(
        &self,
        descriptor: &EntityDescriptor,
        subject: &Subject,
        row: Option<&Value>,
    ) -> AppResult<Option<AccessDecision>> {
        let Some(row) = row else {
            return Ok(Some(AccessDecision::denied(DenyReason::RowNotFound)));
        };

        match self
            .rls
            .is_row_visible(&self.registry, descriptor, subject, row)
            .await?
        {
            RowVisibility::Visible => Ok(None),
            RowVisibility::Hidden | RowVisibility::Orphaned => {
                debug!(
                    entity = descriptor.entity_key(),
                    role = subject.role_name(),
                    "row-level gate denied"
                );
                Ok(Some(AccessDecision::denied(DenyReason::RowNotFound)))
            }
        }
    }

    /// Per-field gate over a write payload. Any single denied field fails the
    /// whole operation; silently dropping it would let the client believe the
    /// full write succeeded.
    fn payload_gate(
        &self,
        descriptor: &EntityDescriptor,
        subject: &Subject,
        operation: Operation,
        payload: &Value,
    ) -> AppResult<Option<AccessDecision>> {
        let object = payload.as_object().ok_or_else(|| {
            AppError::Validation(format!(
                "{} payload for '{}' must be a JSON object",
                operation.as_str(),
                descriptor.entity_key()
            ))
        })?;

        for (field_name, value) in object {
            if !can_access_field(
                descriptor,
                self.registry.hierarchy(),
                field_name,
                operation,
                subject,
            ) {
                debug!(
                    entity = descriptor.entity_key(),
                    field = field_name.as_str(),
                    operation = operation.as_str(),
                    role = subject.role_name(),
                    "field permission gate denied"
                );
                return Ok(Some(AccessDecision::denied_for_field(
                    DenyReason::FieldPermissionDenied,
                    field_name,
                )));
            }

            if let Some(definition) = descriptor.field_definition(field_name) {
                definition.validate_runtime_value(value).map_err(|error| {
                    AppError::Validation(format!(
                        "field '{field_name}' on '{}': {error}",
                        descriptor.entity_key()
                    ))
                })?;
            }
        }

        Ok(None)
    }

    fn mutation_gate(
        descriptor: &EntityDescriptor,
        operation: Operation,
        existing_row: Option<&Value>,
        proposed_changes: Option<&Value>,
    ) -> Option<AccessDecision> {
        match validate_mutation(descriptor, operation, existing_row, proposed_changes) {
            MutationCheck::Permitted => None,
            MutationCheck::Rejected {
                reason,
                field: Some(field),
            } => Some(AccessDecision::denied_for_field(reason, field)),
            MutationCheck::Rejected {
                reason,
                field: None,
            } => Some(AccessDecision::denied(reason)),
        }
    }
}
