use fieldgate_core::Subject;
use fieldgate_domain::{EntityDescriptor, Operation, RoleHierarchy};

/// Returns whether the subject may perform the operation on one field.
///
/// Pure lookup into the materialized matrix. Registry-built descriptors have
/// a rule for every field, so the missing-rule branch only matters for rows
/// carrying undeclared keys; those fail closed.
#[must_use]
pub fn can_access_field(
    descriptor: &EntityDescriptor,
    hierarchy: &RoleHierarchy,
    field_name: &str,
    operation: Operation,
    subject: &Subject,
) -> bool {
    descriptor
        .access_rule(field_name)
        .is_some_and(|rule| hierarchy.satisfies(subject, rule.requirement_for(operation)))
}
