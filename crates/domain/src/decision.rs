use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stable denial reasons surfaced to the hosting layer.
///
/// Row-level denial, a truly missing row, and a dangling polymorphic parent
/// all surface as [`Self::RowNotFound`]: the decision shape must not reveal
/// whether a hidden row exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// The entity-level permission gate rejected the operation.
    EntityPermissionDenied,
    /// The row is not visible to the subject, or does not exist.
    RowNotFound,
    /// A payload field failed its per-field access check.
    FieldPermissionDenied,
    /// The update touched a globally immutable field.
    ImmutableField,
    /// The row is system-protected against this mutation.
    SystemProtected,
}

impl DenyReason {
    /// Returns a stable storage value for this reason.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EntityPermissionDenied => "entity_permission_denied",
            Self::RowNotFound => "row_not_found",
            Self::FieldPermissionDenied => "field_permission_denied",
            Self::ImmutableField => "immutable_field",
            Self::SystemProtected => "system_protected",
        }
    }
}

/// Outcome of one authorization request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessDecision {
    allowed: bool,
    reason: Option<DenyReason>,
    denied_field: Option<String>,
    projected_row: Option<Value>,
}

impl AccessDecision {
    /// An allowed decision with no payload.
    #[must_use]
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            reason: None,
            denied_field: None,
            projected_row: None,
        }
    }

    /// An allowed read decision carrying the redacted projection.
    #[must_use]
    pub fn allowed_with_projection(projected_row: Value) -> Self {
        Self {
            allowed: true,
            reason: None,
            denied_field: None,
            projected_row: Some(projected_row),
        }
    }

    /// A denied decision.
    #[must_use]
    pub fn denied(reason: DenyReason) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
            denied_field: None,
            projected_row: None,
        }
    }

    /// A denied decision naming the offending field.
    #[must_use]
    pub fn denied_for_field(reason: DenyReason, field: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
            denied_field: Some(field.into()),
            projected_row: None,
        }
    }

    /// Returns whether the operation is permitted.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        self.allowed
    }

    /// Returns the denial reason, when denied.
    #[must_use]
    pub fn reason(&self) -> Option<DenyReason> {
        self.reason
    }

    /// Returns the field that failed a write gate, when one did.
    #[must_use]
    pub fn denied_field(&self) -> Option<&str> {
        self.denied_field.as_deref()
    }

    /// Returns the redacted projection for allowed reads.
    #[must_use]
    pub fn projected_row(&self) -> Option<&Value> {
        self.projected_row.as_ref()
    }
}
