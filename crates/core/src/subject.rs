use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stable principal identifier compared against row linkage columns.
///
/// Rows arrive as JSON objects, so the identifier matches both string and
/// integer representations of the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectId(String);

impl SubjectId {
    /// Creates a subject identifier from its canonical string form.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the canonical string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns whether a row column value refers to this subject.
    #[must_use]
    pub fn matches_value(&self, value: &Value) -> bool {
        match value {
            Value::String(text) => text == &self.0,
            Value::Number(number) => number.to_string() == self.0,
            _ => false,
        }
    }
}

impl From<i64> for SubjectId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

/// The principal a decision is evaluated for.
///
/// Identity verification happens upstream; the engine only consumes the
/// resulting id and role. The internal pseudo-subject represents in-process
/// jobs (seeding, cascades) and is the only subject satisfying system-only
/// access requirements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    id: SubjectId,
    role_name: String,
    is_internal: bool,
}

impl Subject {
    /// Creates an externally-authenticated subject.
    #[must_use]
    pub fn new(id: impl Into<SubjectId>, role_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role_name: role_name.into(),
            is_internal: false,
        }
    }

    /// Creates the internal-process pseudo-subject.
    #[must_use]
    pub fn internal() -> Self {
        Self {
            id: SubjectId::new("system"),
            role_name: "system".to_owned(),
            is_internal: true,
        }
    }

    /// Returns the principal identifier.
    #[must_use]
    pub fn id(&self) -> &SubjectId {
        &self.id
    }

    /// Returns the role name carried by the authenticated session.
    #[must_use]
    pub fn role_name(&self) -> &str {
        self.role_name.as_str()
    }

    /// Returns whether this is the internal-process pseudo-subject.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        self.is_internal
    }
}

impl From<String> for SubjectId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SubjectId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}
