//! Policy vocabulary and entity metadata types for the access engine.

#![forbid(unsafe_code)]

mod decision;
mod descriptor;
mod field;
mod operation;
mod rls;
mod role;

pub use decision::{AccessDecision, DenyReason};
pub use descriptor::{
    AccessSpec, DependentEntity, EntityDescriptor, EntityDescriptorInput, EntityDescriptorParts,
    PolymorphicAnchor, Relationship, SystemProtection, SystemProtectionInput,
};
pub use field::{FieldAccessRule, FieldDefinition, FieldType};
pub use operation::Operation;
pub use rls::{RlsFilterConfig, RlsPolicy};
pub use role::{AccessRequirement, RoleHierarchy, RoleName};
