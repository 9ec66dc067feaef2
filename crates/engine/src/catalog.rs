//! Default metadata for the field-service installation.
//!
//! One canonical descriptor per product entity, expressed as plain data and
//! loaded through the registry like any host-supplied configuration. Seeded
//! role names are injected as the protected value set for the `roles` entity
//! instead of being fetched by the descriptor.

use std::collections::{BTreeMap, BTreeSet};

use fieldgate_core::AppResult;
use fieldgate_domain::{
    FieldDefinition, FieldType, RlsFilterConfig, RlsPolicy, RoleHierarchy, RoleName,
};
use serde_json::json;

use crate::MetadataRegistry;

mod operations;
mod people;
mod platform;

/// Installation roles ordered by priority.
const SEEDED_ROLES: &[(&str, i32)] = &[
    ("customer", 1),
    ("technician", 2),
    ("dispatcher", 3),
    ("manager", 4),
    ("admin", 5),
];

/// Builds the default role hierarchy.
pub fn default_role_hierarchy() -> AppResult<RoleHierarchy> {
    let mut entries = Vec::with_capacity(SEEDED_ROLES.len());
    for (name, priority) in SEEDED_ROLES {
        entries.push((RoleName::new(*name)?, *priority));
    }
    RoleHierarchy::new(entries)
}

/// Returns the seeded role names protected on the `roles` entity.
#[must_use]
pub fn seeded_role_names() -> BTreeSet<String> {
    SEEDED_ROLES
        .iter()
        .map(|(name, _)| (*name).to_owned())
        .collect()
}

/// Returns every descriptor input in the default catalog.
pub fn descriptor_inputs() -> AppResult<Vec<fieldgate_domain::EntityDescriptorInput>> {
    Ok(vec![
        people::users()?,
        people::customers()?,
        people::technicians()?,
        operations::work_orders()?,
        operations::contracts()?,
        operations::invoices()?,
        operations::inventory_items()?,
        platform::roles()?,
        platform::user_preferences()?,
        platform::saved_views()?,
        platform::file_attachments()?,
        platform::notifications()?,
        platform::audit_logs()?,
    ])
}

/// Builds a validated registry over the default catalog.
pub fn registry() -> AppResult<MetadataRegistry> {
    let injected = BTreeMap::from([("roles".to_owned(), seeded_role_names())]);
    MetadataRegistry::load(default_role_hierarchy()?, descriptor_inputs()?, injected)
}

fn text() -> FieldDefinition {
    FieldDefinition::plain(FieldType::Text)
}

fn number() -> FieldDefinition {
    FieldDefinition::plain(FieldType::Number)
}

fn boolean() -> FieldDefinition {
    FieldDefinition::plain(FieldType::Boolean)
}

fn date() -> FieldDefinition {
    FieldDefinition::plain(FieldType::Date)
}

fn datetime() -> FieldDefinition {
    FieldDefinition::plain(FieldType::DateTime)
}

fn json_blob() -> FieldDefinition {
    FieldDefinition::plain(FieldType::Json)
}

fn reference() -> FieldDefinition {
    FieldDefinition::plain(FieldType::Reference)
}

fn required(field_type: FieldType) -> AppResult<FieldDefinition> {
    FieldDefinition::new(field_type, true, false, None, None, None)
}

fn choice(values: &[&str], default: &str) -> AppResult<FieldDefinition> {
    FieldDefinition::new(
        FieldType::Text,
        false,
        false,
        None,
        Some(values.iter().map(|value| (*value).to_owned()).collect()),
        Some(json!(default)),
    )
}

/// Conventional columns every table carries; access comes from the
/// universal defaults.
fn standard_fields() -> BTreeMap<String, FieldDefinition> {
    BTreeMap::from([
        ("id".to_owned(), number()),
        ("created_at".to_owned(), datetime()),
        ("updated_at".to_owned(), datetime()),
    ])
}

fn names(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|value| (*value).to_owned()).collect()
}

fn rls_map(entries: &[(&str, RlsPolicy)]) -> BTreeMap<String, RlsPolicy> {
    entries
        .iter()
        .map(|(role, policy)| ((*role).to_owned(), *policy))
        .collect()
}

fn own_by(field: &str) -> RlsFilterConfig {
    RlsFilterConfig {
        own_record_field: field.to_owned(),
    }
}
