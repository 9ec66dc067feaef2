use fieldgate_domain::{DenyReason, EntityDescriptor, Operation};
use serde_json::Value;

/// Outcome of the immutability and system-protection checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationCheck {
    /// No rule vetoes the mutation; role and row gates still apply.
    Permitted,
    /// The mutation is vetoed regardless of role.
    Rejected {
        /// Stable reason for the veto.
        reason: DenyReason,
        /// Offending field, when a single field triggered it.
        field: Option<String>,
    },
}

/// Applies immutable-field and system-protection rules to a proposed write.
///
/// Role-independent by design: these vetoes hold for every subject, the
/// internal pseudo-subject and the highest role included.
#[must_use]
pub fn validate_mutation(
    descriptor: &EntityDescriptor,
    operation: Operation,
    existing_row: Option<&Value>,
    proposed_changes: Option<&Value>,
) -> MutationCheck {
    if operation == Operation::Update {
        if let Some(changes) = proposed_changes.and_then(Value::as_object) {
            for field_name in changes.keys() {
                if descriptor.immutable_fields().contains(field_name.as_str()) {
                    return MutationCheck::Rejected {
                        reason: DenyReason::ImmutableField,
                        field: Some(field_name.clone()),
                    };
                }
            }
        }
    }

    let Some(protection) = descriptor.system_protection() else {
        return MutationCheck::Permitted;
    };
    let Some(existing_row) = existing_row else {
        return MutationCheck::Permitted;
    };

    let protected_column = protection
        .protected_by_field()
        .unwrap_or_else(|| descriptor.identity_field());
    let is_protected_row = existing_row
        .get(protected_column)
        .and_then(Value::as_str)
        .is_some_and(|value| protection.protected_values().contains(value));
    if !is_protected_row {
        return MutationCheck::Permitted;
    }

    match operation {
        Operation::Delete if protection.prevent_delete() => MutationCheck::Rejected {
            reason: DenyReason::SystemProtected,
            field: None,
        },
        Operation::Update => {
            if let Some(changes) = proposed_changes.and_then(Value::as_object) {
                for field_name in changes.keys() {
                    if protection.immutable_fields().contains(field_name.as_str()) {
                        return MutationCheck::Rejected {
                            reason: DenyReason::SystemProtected,
                            field: Some(field_name.clone()),
                        };
                    }
                }
            }
            MutationCheck::Permitted
        }
        _ => MutationCheck::Permitted,
    }
}
