use std::str::FromStr;

use fieldgate_core::AppError;
use serde::{Deserialize, Serialize};

/// CRUD operations the engine authorizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Inserting a new row.
    Create,
    /// Fetching one or more rows.
    Read,
    /// Mutating fields of an existing row.
    Update,
    /// Removing an existing row.
    Delete,
}

impl Operation {
    /// Returns a stable storage value for this operation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Returns all operations in matrix order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Operation] = &[
            Operation::Create,
            Operation::Read,
            Operation::Update,
            Operation::Delete,
        ];

        ALL
    }

    /// Returns whether the operation mutates row state.
    #[must_use]
    pub fn is_write(&self) -> bool {
        !matches!(self, Self::Read)
    }
}

impl FromStr for Operation {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "create" => Ok(Self::Create),
            "read" => Ok(Self::Read),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            _ => Err(AppError::Validation(format!("unknown operation '{value}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::Operation;

    #[test]
    fn operation_roundtrip_storage_value() {
        for operation in Operation::all() {
            let restored = Operation::from_str(operation.as_str());
            assert!(restored.is_ok_and(|value| value == *operation));
        }
    }

    #[test]
    fn unknown_operation_is_rejected() {
        assert!(Operation::from_str("upsert").is_err());
    }

    #[test]
    fn read_is_the_only_non_write() {
        assert!(!Operation::Read.is_write());
        assert!(Operation::Create.is_write());
        assert!(Operation::Update.is_write());
        assert!(Operation::Delete.is_write());
    }
}
