use std::str::FromStr;

use fieldgate_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{AccessRequirement, Operation};

/// Supported metadata field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// UTF-8 string field.
    Text,
    /// Numeric field.
    Number,
    /// Boolean field.
    Boolean,
    /// Date-only string field.
    Date,
    /// Date-time string field.
    DateTime,
    /// Arbitrary JSON field.
    Json,
    /// Foreign-key reference to another entity's row.
    Reference,
}

impl FieldType {
    /// Returns a stable storage value for the field type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Json => "json",
            Self::Reference => "reference",
        }
    }

    fn validate_value(self, value: &Value) -> AppResult<()> {
        let is_valid = match self {
            Self::Text | Self::Date | Self::DateTime => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Json => true,
            Self::Reference => {
                value.is_number()
                    || value
                        .as_str()
                        .map(|text| !text.trim().is_empty())
                        .unwrap_or(false)
            }
        };

        if !is_valid {
            return Err(AppError::Validation(format!(
                "value does not match field type '{}'",
                self.as_str()
            )));
        }

        Ok(())
    }
}

impl FromStr for FieldType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "text" => Ok(Self::Text),
            "number" => Ok(Self::Number),
            "boolean" => Ok(Self::Boolean),
            "date" => Ok(Self::Date),
            "datetime" => Ok(Self::DateTime),
            "json" => Ok(Self::Json),
            "reference" => Ok(Self::Reference),
            _ => Err(AppError::Validation(format!("unknown field type '{value}'"))),
        }
    }
}

/// Metadata definition for a single entity field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    field_type: FieldType,
    is_required: bool,
    is_readonly: bool,
    max_length: Option<usize>,
    allowed_values: Option<Vec<String>>,
    default_value: Option<Value>,
}

impl FieldDefinition {
    /// Creates a validated field definition.
    pub fn new(
        field_type: FieldType,
        is_required: bool,
        is_readonly: bool,
        max_length: Option<usize>,
        allowed_values: Option<Vec<String>>,
        default_value: Option<Value>,
    ) -> AppResult<Self> {
        if max_length.is_some() && !matches!(field_type, FieldType::Text) {
            return Err(AppError::Validation(
                "max_length is only supported for text fields".to_owned(),
            ));
        }

        if let Some(allowed_values) = &allowed_values {
            if !matches!(field_type, FieldType::Text) {
                return Err(AppError::Validation(
                    "allowed_values is only supported for text fields".to_owned(),
                ));
            }
            if allowed_values.is_empty() {
                return Err(AppError::Validation(
                    "allowed_values must not be empty when given".to_owned(),
                ));
            }
        }

        if let Some(default_value) = &default_value {
            field_type.validate_value(default_value)?;
            if let (Some(allowed_values), Some(text)) = (&allowed_values, default_value.as_str()) {
                if !allowed_values.iter().any(|candidate| candidate == text) {
                    return Err(AppError::Validation(format!(
                        "default value '{text}' is not in allowed_values"
                    )));
                }
            }
        }

        Ok(Self {
            field_type,
            is_required,
            is_readonly,
            max_length,
            allowed_values,
            default_value,
        })
    }

    /// Convenience constructor for a plain optional field of the given type.
    #[must_use]
    pub fn plain(field_type: FieldType) -> Self {
        Self {
            field_type,
            is_required: false,
            is_readonly: false,
            max_length: None,
            allowed_values: None,
            default_value: None,
        }
    }

    /// Returns the field type.
    #[must_use]
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Returns whether the field is required on create.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.is_required
    }

    /// Returns whether the field is read-only after creation.
    #[must_use]
    pub fn is_readonly(&self) -> bool {
        self.is_readonly
    }

    /// Returns the maximum text length, when constrained.
    #[must_use]
    pub fn max_length(&self) -> Option<usize> {
        self.max_length
    }

    /// Returns the closed value set, when constrained.
    #[must_use]
    pub fn allowed_values(&self) -> Option<&[String]> {
        self.allowed_values.as_deref()
    }

    /// Returns the default value.
    #[must_use]
    pub fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }

    /// Validates a runtime value against this field definition.
    pub fn validate_runtime_value(&self, value: &Value) -> AppResult<()> {
        self.field_type.validate_value(value)?;

        if let (Some(max_length), Some(text)) = (self.max_length, value.as_str()) {
            if text.chars().count() > max_length {
                return Err(AppError::Validation(format!(
                    "value exceeds max_length {max_length}"
                )));
            }
        }

        if let (Some(allowed_values), Some(text)) = (&self.allowed_values, value.as_str()) {
            if !allowed_values.iter().any(|candidate| candidate == text) {
                return Err(AppError::Validation(format!(
                    "value '{text}' is not in allowed_values"
                )));
            }
        }

        Ok(())
    }
}

/// Per-operation minimum-access rule for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldAccessRule {
    create: AccessRequirement,
    read: AccessRequirement,
    update: AccessRequirement,
    delete: AccessRequirement,
}

impl FieldAccessRule {
    /// Creates a rule from per-operation requirements.
    #[must_use]
    pub fn new(
        create: AccessRequirement,
        read: AccessRequirement,
        update: AccessRequirement,
        delete: AccessRequirement,
    ) -> Self {
        Self {
            create,
            read,
            update,
            delete,
        }
    }

    /// Returns the requirement governing one operation.
    #[must_use]
    pub fn requirement_for(&self, operation: Operation) -> &AccessRequirement {
        match operation {
            Operation::Create => &self.create,
            Operation::Read => &self.read,
            Operation::Update => &self.update,
            Operation::Delete => &self.delete,
        }
    }
}
