use std::collections::{BTreeMap, BTreeSet};

use fieldgate_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::{FieldAccessRule, FieldDefinition, RlsFilterConfig, RlsPolicy};

/// Declarative foreign-key relationship to another entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    /// Stable relationship name.
    pub name: String,
    /// Entity key of the referenced parent.
    pub target_entity: String,
    /// Local column holding the parent id.
    pub local_field: String,
}

/// Polymorphic parent reference resolved at decision time.
///
/// The type column names which parent entity a row belongs to; the id column
/// names the parent row. Both the column names and the closed set of valid
/// parents are fixed at registry load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolymorphicAnchor {
    /// Column naming the parent entity key.
    #[serde(default = "PolymorphicAnchor::default_type_field")]
    pub type_field: String,
    /// Column naming the parent row id.
    #[serde(default = "PolymorphicAnchor::default_id_field")]
    pub id_field: String,
    /// Entity keys this child may attach to.
    pub allowed_parents: Vec<String>,
}

impl PolymorphicAnchor {
    fn default_type_field() -> String {
        "entity_type".to_owned()
    }

    fn default_id_field() -> String {
        "entity_id".to_owned()
    }
}

/// Cascade-delete instruction surfaced to the storage layer after an allowed
/// delete decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependentEntity {
    /// Entity key of the dependent rows.
    pub entity_key: String,
    /// Column on the dependent entity referencing this one.
    pub foreign_key_field: String,
}

/// Row-level protection for structurally required records.
///
/// Protection only restricts: it can veto deletes and key-field edits, never
/// grant anything role checks would deny.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemProtection {
    protected_values: BTreeSet<String>,
    protected_by_field: Option<String>,
    immutable_fields: BTreeSet<String>,
    prevent_delete: bool,
}

impl SystemProtection {
    /// Creates a protection rule over a set of identity values.
    #[must_use]
    pub fn new(
        protected_values: BTreeSet<String>,
        protected_by_field: Option<String>,
        immutable_fields: BTreeSet<String>,
        prevent_delete: bool,
    ) -> Self {
        Self {
            protected_values,
            protected_by_field,
            immutable_fields,
            prevent_delete,
        }
    }

    /// Returns the protected identity values.
    #[must_use]
    pub fn protected_values(&self) -> &BTreeSet<String> {
        &self.protected_values
    }

    /// Returns the column checked against the protected values, when it is
    /// not the entity identity field.
    #[must_use]
    pub fn protected_by_field(&self) -> Option<&str> {
        self.protected_by_field.as_deref()
    }

    /// Returns the fields frozen on protected rows.
    #[must_use]
    pub fn immutable_fields(&self) -> &BTreeSet<String> {
        &self.immutable_fields
    }

    /// Returns whether protected rows may never be deleted.
    #[must_use]
    pub fn prevent_delete(&self) -> bool {
        self.prevent_delete
    }

    /// Returns a copy with additional protected values merged in.
    #[must_use]
    pub fn with_injected_values(mut self, values: &BTreeSet<String>) -> Self {
        self.protected_values.extend(values.iter().cloned());
        self
    }
}

/// Per-operation access values as they appear in metadata inputs.
///
/// Values are role names or the sentinels `none` / `system`; the registry
/// parses them into typed requirements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessSpec {
    /// Minimum access for create.
    pub create: String,
    /// Minimum access for read.
    pub read: String,
    /// Minimum access for update.
    pub update: String,
    /// Minimum access for delete.
    pub delete: String,
}

impl AccessSpec {
    /// Creates a spec from per-operation values.
    #[must_use]
    pub fn new(
        create: impl Into<String>,
        read: impl Into<String>,
        update: impl Into<String>,
        delete: impl Into<String>,
    ) -> Self {
        Self {
            create: create.into(),
            read: read.into(),
            update: update.into(),
            delete: delete.into(),
        }
    }
}

/// System-protection rule as it appears in metadata inputs.
///
/// The value set here is static configuration; values sourced from live data
/// (seeded role names) are injected at registry construction instead of being
/// fetched by the descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemProtectionInput {
    /// Statically protected identity values.
    #[serde(default)]
    pub values: BTreeSet<String>,
    /// Column checked against the values; defaults to the identity field.
    #[serde(default)]
    pub protected_by_field: Option<String>,
    /// Fields frozen on protected rows.
    #[serde(default)]
    pub immutable_fields: BTreeSet<String>,
    /// Whether protected rows may never be deleted.
    #[serde(default)]
    pub prevent_delete: bool,
}

/// Raw metadata for one entity, as loaded from configuration.
///
/// This is the registry's input shape; nothing evaluates it directly. The
/// registry validates it against the role hierarchy and the other entities,
/// applies universal field-access defaults, and materializes an
/// [`EntityDescriptor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDescriptorInput {
    /// Stable entity key used by callers.
    pub entity_key: String,
    /// Backing table name handed to the row-lookup collaborator.
    pub table_name: String,
    /// Human-readable unique-ish field (not the primary key).
    pub identity_field: String,
    /// Field definitions keyed by field name.
    pub fields: BTreeMap<String, FieldDefinition>,
    /// Explicit per-field access values; omitted fields fall back to the
    /// universal defaults.
    #[serde(default)]
    pub field_access: BTreeMap<String, AccessSpec>,
    /// Coarse per-operation minimum access, checked before field rules.
    pub entity_permissions: AccessSpec,
    /// Row-level-security tag per role; omitted roles deny all rows.
    #[serde(default)]
    pub rls: BTreeMap<String, RlsPolicy>,
    /// Own-record matching configuration.
    #[serde(default)]
    pub rls_filter: RlsFilterConfig,
    /// Fields that can never be updated once set.
    #[serde(default)]
    pub immutable_fields: BTreeSet<String>,
    /// Fields stripped from every read projection unconditionally.
    #[serde(default)]
    pub sensitive_fields: BTreeSet<String>,
    /// Plain foreign-key relationships.
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    /// Polymorphic parent anchor, required for parent-derived RLS.
    #[serde(default)]
    pub polymorphic_anchor: Option<PolymorphicAnchor>,
    /// System-protection rule for seeded rows.
    #[serde(default)]
    pub system_protection: Option<SystemProtectionInput>,
    /// Cascade-delete instructions for dependents without DB-level cascade.
    #[serde(default)]
    pub dependents: Vec<DependentEntity>,
}

/// Typed parts consumed by [`EntityDescriptor::new`].
///
/// Built by the registry once sentinel parsing, defaulting, and role
/// validation have happened.
#[derive(Debug, Clone)]
pub struct EntityDescriptorParts {
    /// Stable entity key.
    pub entity_key: NonEmptyString,
    /// Backing table name.
    pub table_name: NonEmptyString,
    /// Identity field name.
    pub identity_field: String,
    /// Field definitions keyed by field name.
    pub fields: BTreeMap<String, FieldDefinition>,
    /// Fully-materialized access rule for every field.
    pub field_access: BTreeMap<String, FieldAccessRule>,
    /// Entity-level per-operation requirements.
    pub entity_permissions: FieldAccessRule,
    /// RLS tag for every hierarchy role.
    pub rls: BTreeMap<String, RlsPolicy>,
    /// Own-record matching configuration.
    pub rls_filter: RlsFilterConfig,
    /// Globally immutable fields.
    pub immutable_fields: BTreeSet<String>,
    /// Unconditionally redacted fields.
    pub sensitive_fields: BTreeSet<String>,
    /// Plain foreign-key relationships.
    pub relationships: Vec<Relationship>,
    /// Polymorphic parent anchor.
    pub polymorphic_anchor: Option<PolymorphicAnchor>,
    /// Materialized system protection.
    pub system_protection: Option<SystemProtection>,
    /// Cascade-delete instructions.
    pub dependents: Vec<DependentEntity>,
}

/// Fully-materialized, validated metadata for one entity.
///
/// Instances only come out of registry load; every field carries a complete
/// access rule and every hierarchy role carries an RLS tag, so decision-time
/// evaluation is pure lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDescriptor {
    entity_key: NonEmptyString,
    table_name: NonEmptyString,
    identity_field: String,
    fields: BTreeMap<String, FieldDefinition>,
    field_access: BTreeMap<String, FieldAccessRule>,
    entity_permissions: FieldAccessRule,
    rls: BTreeMap<String, RlsPolicy>,
    rls_filter: RlsFilterConfig,
    immutable_fields: BTreeSet<String>,
    sensitive_fields: BTreeSet<String>,
    relationships: Vec<Relationship>,
    polymorphic_anchor: Option<PolymorphicAnchor>,
    system_protection: Option<SystemProtection>,
    dependents: Vec<DependentEntity>,
}

impl EntityDescriptor {
    /// Creates a descriptor, checking every per-entity invariant.
    ///
    /// Cross-entity invariants (parent registration, dependent registration)
    /// belong to the registry, which sees all descriptors at once.
    pub fn new(parts: EntityDescriptorParts) -> AppResult<Self> {
        let entity_key = parts.entity_key.as_str().to_owned();
        let field_error = |message: String| {
            AppError::Validation(format!("entity '{entity_key}': {message}"))
        };

        if !parts.fields.contains_key(&parts.identity_field) {
            return Err(field_error(format!(
                "identity field '{}' is not a declared field",
                parts.identity_field
            )));
        }

        for field_name in parts.fields.keys() {
            if !parts.field_access.contains_key(field_name) {
                return Err(field_error(format!(
                    "field '{field_name}' has no access rule after defaulting"
                )));
            }
        }
        for field_name in parts.field_access.keys() {
            if !parts.fields.contains_key(field_name) {
                return Err(field_error(format!(
                    "access rule names undeclared field '{field_name}'"
                )));
            }
        }

        for field_name in &parts.immutable_fields {
            if !parts.fields.contains_key(field_name) {
                return Err(field_error(format!(
                    "immutable field '{field_name}' is not a declared field"
                )));
            }
        }
        for field_name in &parts.sensitive_fields {
            if !parts.fields.contains_key(field_name) {
                return Err(field_error(format!(
                    "sensitive field '{field_name}' is not a declared field"
                )));
            }
        }

        let uses_parent_access = parts
            .rls
            .values()
            .any(|tag| matches!(tag, RlsPolicy::ParentEntityAccess));
        if uses_parent_access {
            let Some(anchor) = &parts.polymorphic_anchor else {
                return Err(field_error(
                    "parent_entity_access requires a polymorphic anchor".to_owned(),
                ));
            };
            if anchor.allowed_parents.is_empty() {
                return Err(field_error(
                    "polymorphic anchor must allow at least one parent entity".to_owned(),
                ));
            }
            if !parts.fields.contains_key(&anchor.type_field) {
                return Err(field_error(format!(
                    "anchor type column '{}' is not a declared field",
                    anchor.type_field
                )));
            }
            if !parts.fields.contains_key(&anchor.id_field) {
                return Err(field_error(format!(
                    "anchor id column '{}' is not a declared field",
                    anchor.id_field
                )));
            }
            if parts
                .rls
                .values()
                .any(|tag| matches!(tag, RlsPolicy::OwnRecordOnly))
            {
                return Err(field_error(
                    "parent-derived entities must not mix in own_record_only policies".to_owned(),
                ));
            }
        }

        let uses_own_record = parts
            .rls
            .values()
            .any(|tag| matches!(tag, RlsPolicy::OwnRecordOnly));
        if uses_own_record && !parts.fields.contains_key(&parts.rls_filter.own_record_field) {
            return Err(field_error(format!(
                "own-record column '{}' is not a declared field",
                parts.rls_filter.own_record_field
            )));
        }

        if let Some(protection) = &parts.system_protection {
            if let Some(column) = protection.protected_by_field() {
                if !parts.fields.contains_key(column) {
                    return Err(field_error(format!(
                        "protected-by column '{column}' is not a declared field"
                    )));
                }
            }
            for field_name in protection.immutable_fields() {
                if !parts.fields.contains_key(field_name) {
                    return Err(field_error(format!(
                        "protected immutable field '{field_name}' is not a declared field"
                    )));
                }
            }
        }

        for relationship in &parts.relationships {
            if !parts.fields.contains_key(&relationship.local_field) {
                return Err(field_error(format!(
                    "relationship '{}' references undeclared column '{}'",
                    relationship.name, relationship.local_field
                )));
            }
        }

        Ok(Self {
            entity_key: parts.entity_key,
            table_name: parts.table_name,
            identity_field: parts.identity_field,
            fields: parts.fields,
            field_access: parts.field_access,
            entity_permissions: parts.entity_permissions,
            rls: parts.rls,
            rls_filter: parts.rls_filter,
            immutable_fields: parts.immutable_fields,
            sensitive_fields: parts.sensitive_fields,
            relationships: parts.relationships,
            polymorphic_anchor: parts.polymorphic_anchor,
            system_protection: parts.system_protection,
            dependents: parts.dependents,
        })
    }

    /// Returns the stable entity key.
    #[must_use]
    pub fn entity_key(&self) -> &str {
        self.entity_key.as_str()
    }

    /// Returns the backing table name.
    #[must_use]
    pub fn table_name(&self) -> &str {
        self.table_name.as_str()
    }

    /// Returns the identity field name.
    #[must_use]
    pub fn identity_field(&self) -> &str {
        self.identity_field.as_str()
    }

    /// Returns all field definitions.
    #[must_use]
    pub fn fields(&self) -> &BTreeMap<String, FieldDefinition> {
        &self.fields
    }

    /// Returns one field definition, when declared.
    #[must_use]
    pub fn field_definition(&self, field_name: &str) -> Option<&FieldDefinition> {
        self.fields.get(field_name)
    }

    /// Returns the materialized access rule for one field.
    #[must_use]
    pub fn access_rule(&self, field_name: &str) -> Option<&FieldAccessRule> {
        self.field_access.get(field_name)
    }

    /// Returns the entity-level per-operation requirements.
    #[must_use]
    pub fn entity_permissions(&self) -> &FieldAccessRule {
        &self.entity_permissions
    }

    /// Returns the RLS tag for a role, failing closed for unknown roles.
    #[must_use]
    pub fn rls_for(&self, role_name: &str) -> RlsPolicy {
        self.rls
            .get(role_name)
            .copied()
            .unwrap_or(RlsPolicy::DenyAll)
    }

    /// Returns the own-record matching configuration.
    #[must_use]
    pub fn rls_filter(&self) -> &RlsFilterConfig {
        &self.rls_filter
    }

    /// Returns the globally immutable fields.
    #[must_use]
    pub fn immutable_fields(&self) -> &BTreeSet<String> {
        &self.immutable_fields
    }

    /// Returns the unconditionally redacted fields.
    #[must_use]
    pub fn sensitive_fields(&self) -> &BTreeSet<String> {
        &self.sensitive_fields
    }

    /// Returns the plain foreign-key relationships.
    #[must_use]
    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    /// Returns the polymorphic parent anchor, when declared.
    #[must_use]
    pub fn polymorphic_anchor(&self) -> Option<&PolymorphicAnchor> {
        self.polymorphic_anchor.as_ref()
    }

    /// Returns the system-protection rule, when declared.
    #[must_use]
    pub fn system_protection(&self) -> Option<&SystemProtection> {
        self.system_protection.as_ref()
    }

    /// Returns the cascade-delete instructions.
    #[must_use]
    pub fn dependents(&self) -> &[DependentEntity] {
        &self.dependents
    }
}
