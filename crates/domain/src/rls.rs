use std::str::FromStr;

use fieldgate_core::AppError;
use serde::{Deserialize, Serialize};

/// Symbolic row-level-security policy assigned to one (entity, role) pair.
///
/// Each role holds exactly one tag per entity; there is no most-permissive
/// merging across tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RlsPolicy {
    /// Row is visible iff its linkage column matches the subject id.
    OwnRecordOnly,
    /// Every row is visible to this role.
    AllRecords,
    /// No row is visible to this role.
    DenyAll,
    /// Visible to every authenticated role without a row check.
    PublicResource,
    /// Visibility is derived from the polymorphic parent row's own policy.
    ParentEntityAccess,
}

impl RlsPolicy {
    /// Returns a stable storage value for this policy tag.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OwnRecordOnly => "own_record_only",
            Self::AllRecords => "all_records",
            Self::DenyAll => "deny_all",
            Self::PublicResource => "public_resource",
            Self::ParentEntityAccess => "parent_entity_access",
        }
    }
}

impl FromStr for RlsPolicy {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "own_record_only" => Ok(Self::OwnRecordOnly),
            "all_records" => Ok(Self::AllRecords),
            "deny_all" => Ok(Self::DenyAll),
            "public_resource" => Ok(Self::PublicResource),
            "parent_entity_access" => Ok(Self::ParentEntityAccess),
            _ => Err(AppError::Validation(format!(
                "unknown rls policy tag '{value}'"
            ))),
        }
    }
}

/// Row-matching configuration for [`RlsPolicy::OwnRecordOnly`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RlsFilterConfig {
    /// Column compared against the subject id.
    pub own_record_field: String,
}

impl RlsFilterConfig {
    /// Default linkage column for user-owned rows.
    pub const DEFAULT_OWN_RECORD_FIELD: &'static str = "user_id";
}

impl Default for RlsFilterConfig {
    fn default() -> Self {
        Self {
            own_record_field: Self::DEFAULT_OWN_RECORD_FIELD.to_owned(),
        }
    }
}
