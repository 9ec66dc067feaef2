use std::collections::BTreeMap;

use fieldgate_core::{AppError, AppResult, NonEmptyString, Subject};
use serde::{Deserialize, Serialize};

/// Validated role name referenced by descriptors and subjects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleName(NonEmptyString);

impl RoleName {
    /// Creates a validated role name.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value == AccessRequirement::NOBODY || value == AccessRequirement::SYSTEM {
            return Err(AppError::Validation(format!(
                "'{value}' is a reserved access sentinel and cannot name a role"
            )));
        }

        Ok(Self(NonEmptyString::new(value)?))
    }

    /// Returns the role name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Minimum-access requirement attached to a field or entity operation.
///
/// Parsed once at registry load; decision-time evaluation never sees the raw
/// sentinel strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessRequirement {
    /// Allowed for the named role and every higher-priority role.
    MinimumRole(RoleName),
    /// Categorically disallowed through the normal request path.
    Nobody,
    /// Allowed only for the internal-process pseudo-subject.
    SystemOnly,
}

impl AccessRequirement {
    /// Sentinel spelling for [`Self::Nobody`] in metadata inputs.
    pub const NOBODY: &'static str = "none";
    /// Sentinel spelling for [`Self::SystemOnly`] in metadata inputs.
    pub const SYSTEM: &'static str = "system";

    /// Parses a metadata input value into a typed requirement.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            Self::NOBODY => Ok(Self::Nobody),
            Self::SYSTEM => Ok(Self::SystemOnly),
            other => Ok(Self::MinimumRole(RoleName::new(other)?)),
        }
    }

    /// Returns the stable metadata spelling for this requirement.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::MinimumRole(role) => role.as_str(),
            Self::Nobody => Self::NOBODY,
            Self::SystemOnly => Self::SYSTEM,
        }
    }
}

/// Total order over the installation's role names.
///
/// Built once alongside the registry; access checks accumulate upward, so a
/// higher-priority role satisfies every requirement a lower one does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleHierarchy {
    priorities: BTreeMap<String, i32>,
    lowest: RoleName,
}

impl RoleHierarchy {
    /// Creates a hierarchy from `(role, priority)` pairs.
    pub fn new(entries: Vec<(RoleName, i32)>) -> AppResult<Self> {
        if entries.is_empty() {
            return Err(AppError::Validation(
                "role hierarchy must contain at least one role".to_owned(),
            ));
        }

        let mut priorities = BTreeMap::new();
        let mut seen_priorities = BTreeMap::new();
        let mut lowest: Option<(RoleName, i32)> = None;

        for (role, priority) in entries {
            if priorities.insert(role.as_str().to_owned(), priority).is_some() {
                return Err(AppError::Validation(format!(
                    "duplicate role '{}' in hierarchy",
                    role.as_str()
                )));
            }
            if let Some(existing) = seen_priorities.insert(priority, role.as_str().to_owned()) {
                return Err(AppError::Validation(format!(
                    "roles '{existing}' and '{}' share priority {priority}",
                    role.as_str()
                )));
            }
            if lowest.as_ref().is_none_or(|(_, p)| priority < *p) {
                lowest = Some((role, priority));
            }
        }

        let Some((lowest, _)) = lowest else {
            return Err(AppError::Internal(
                "non-empty hierarchy produced no lowest role".to_owned(),
            ));
        };

        Ok(Self { priorities, lowest })
    }

    /// Returns the priority for a role, if the role is defined.
    #[must_use]
    pub fn priority_of(&self, role_name: &str) -> Option<i32> {
        self.priorities.get(role_name).copied()
    }

    /// Returns whether a role name is defined in the hierarchy.
    #[must_use]
    pub fn contains(&self, role_name: &str) -> bool {
        self.priorities.contains_key(role_name)
    }

    /// Returns the lowest-priority role (every authenticated subject's floor).
    #[must_use]
    pub fn lowest(&self) -> &RoleName {
        &self.lowest
    }

    /// Returns all role names in the hierarchy.
    pub fn role_names(&self) -> impl Iterator<Item = &str> {
        self.priorities.keys().map(String::as_str)
    }

    /// Returns whether the subject meets an access requirement.
    ///
    /// Unknown subject roles fail closed. The internal pseudo-subject passes
    /// system-only and minimum-role requirements but never `Nobody`, which
    /// disallows the operation through every path.
    #[must_use]
    pub fn satisfies(&self, subject: &Subject, requirement: &AccessRequirement) -> bool {
        match requirement {
            AccessRequirement::Nobody => false,
            AccessRequirement::SystemOnly => subject.is_internal(),
            AccessRequirement::MinimumRole(required) => {
                if subject.is_internal() {
                    return true;
                }

                let Some(subject_priority) = self.priority_of(subject.role_name()) else {
                    return false;
                };
                let Some(required_priority) = self.priority_of(required.as_str()) else {
                    return false;
                };

                subject_priority >= required_priority
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use fieldgate_core::Subject;
    use proptest::prelude::*;

    use super::{AccessRequirement, RoleHierarchy, RoleName};

    fn hierarchy() -> RoleHierarchy {
        let entries = ["customer", "technician", "dispatcher", "manager", "admin"]
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let role = RoleName::new(*name).unwrap_or_else(|_| unreachable!());
                (role, i32::try_from(index).unwrap_or(0) + 1)
            })
            .collect();
        RoleHierarchy::new(entries).unwrap_or_else(|_| unreachable!())
    }

    fn minimum(role: &str) -> AccessRequirement {
        AccessRequirement::MinimumRole(RoleName::new(role).unwrap_or_else(|_| unreachable!()))
    }

    #[test]
    fn role_name_rejects_sentinels() {
        assert!(RoleName::new("none").is_err());
        assert!(RoleName::new("system").is_err());
    }

    #[test]
    fn hierarchy_rejects_duplicate_roles_and_priorities() {
        let admin = RoleName::new("admin").unwrap_or_else(|_| unreachable!());
        let manager = RoleName::new("manager").unwrap_or_else(|_| unreachable!());

        let duplicated_name = RoleHierarchy::new(vec![(admin.clone(), 1), (admin.clone(), 2)]);
        assert!(duplicated_name.is_err());

        let duplicated_priority = RoleHierarchy::new(vec![(admin, 5), (manager, 5)]);
        assert!(duplicated_priority.is_err());
    }

    #[test]
    fn unknown_subject_role_fails_closed() {
        let hierarchy = hierarchy();
        let subject = Subject::new(1, "bogus_role");
        assert!(!hierarchy.satisfies(&subject, &minimum("customer")));
    }

    #[test]
    fn nobody_denies_every_subject_including_internal() {
        let hierarchy = hierarchy();
        assert!(!hierarchy.satisfies(&Subject::new(1, "admin"), &AccessRequirement::Nobody));
        assert!(!hierarchy.satisfies(&Subject::internal(), &AccessRequirement::Nobody));
    }

    #[test]
    fn system_only_admits_only_the_internal_subject() {
        let hierarchy = hierarchy();
        assert!(!hierarchy.satisfies(&Subject::new(1, "admin"), &AccessRequirement::SystemOnly));
        assert!(hierarchy.satisfies(&Subject::internal(), &AccessRequirement::SystemOnly));
    }

    #[test]
    fn lowest_role_is_the_floor() {
        assert_eq!(hierarchy().lowest().as_str(), "customer");
    }

    proptest! {
        #[test]
        fn satisfaction_accumulates_upward(
            subject_index in 0usize..5,
            required_index in 0usize..5,
        ) {
            let hierarchy = hierarchy();
            let names = ["customer", "technician", "dispatcher", "manager", "admin"];
            let subject = Subject::new(1, names[subject_index]);
            let requirement = minimum(names[required_index]);

            let allowed = hierarchy.satisfies(&subject, &requirement);
            prop_assert_eq!(allowed, subject_index >= required_index);

            // Every higher role keeps the grant.
            if allowed {
                for higher in names.iter().skip(subject_index) {
                    prop_assert!(hierarchy.satisfies(&Subject::new(1, *higher), &requirement));
                }
            }
        }
    }
}
