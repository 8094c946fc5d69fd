//! Task eligibility.
//!
//! A record is eligible for a task when it holds every required skill and
//! falls inside the task's department and user-type scope. A failed check
//! lists each unmet requirement.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::record::{IdentityRecord, UserType, ALL_DEPARTMENTS};

/// What a task asks of the worker assigned to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRequirements {
    /// Skill tags the worker must hold.
    #[serde(default)]
    pub skills: BTreeSet<String>,
    /// Required department. `None` or `"All"` matches any department.
    #[serde(default)]
    pub department: Option<String>,
    /// Required user type. `None` matches any.
    #[serde(default)]
    pub user_type: Option<UserType>,
}

impl TaskRequirements {
    /// No requirements: every record is eligible.
    pub fn new() -> Self {
        TaskRequirements::default()
    }

    /// Add required skills.
    pub fn skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skills.extend(skills.into_iter().map(Into::into));
        self
    }

    /// Restrict to a department.
    pub fn department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    /// Restrict to a user type.
    pub fn user_type(mut self, user_type: UserType) -> Self {
        self.user_type = Some(user_type);
        self
    }
}

/// A requirement the record did not meet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "requirement", rename_all = "snake_case")]
pub enum UnmetRequirement {
    /// A required skill the record lacks.
    Skill {
        /// The missing tag.
        tag: String,
    },
    /// The record is outside the required department.
    Department {
        /// Department the task requires.
        required: String,
        /// The record's department.
        actual: String,
    },
    /// The record has a different user type.
    UserType {
        /// User type the task requires.
        required: UserType,
        /// The record's user type.
        actual: UserType,
    },
}

/// The result of an eligibility check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EligibilityDecision {
    /// The record checked.
    pub user_id: String,
    /// `true` iff nothing is unmet.
    pub eligible: bool,
    /// Missing skills in tag order, then department, then user type.
    pub unmet: Vec<UnmetRequirement>,
}

impl EligibilityDecision {
    /// The required skills the record lacks.
    pub fn missing_skills(&self) -> BTreeSet<&str> {
        self.unmet
            .iter()
            .filter_map(|u| match u {
                UnmetRequirement::Skill { tag } => Some(tag.as_str()),
                _ => None,
            })
            .collect()
    }
}

fn department_matches(required: &str, actual: &str) -> bool {
    required == ALL_DEPARTMENTS || actual == ALL_DEPARTMENTS || required == actual
}

/// Check a record against a task's requirements.
pub fn evaluate_eligibility(
    record: &IdentityRecord,
    requirements: &TaskRequirements,
) -> EligibilityDecision {
    let mut unmet: Vec<UnmetRequirement> = requirements
        .skills
        .difference(&record.skill_set)
        .map(|tag| UnmetRequirement::Skill { tag: tag.clone() })
        .collect();

    if let Some(required) = &requirements.department {
        if !department_matches(required, &record.department) {
            unmet.push(UnmetRequirement::Department {
                required: required.clone(),
                actual: record.department.clone(),
            });
        }
    }

    if let Some(required) = requirements.user_type {
        if required != record.user_type {
            unmet.push(UnmetRequirement::UserType {
                required,
                actual: record.user_type,
            });
        }
    }

    EligibilityDecision {
        user_id: record.id.clone(),
        eligible: unmet.is_empty(),
        unmet,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::test_record;

    fn skilled(skills: &[&str]) -> IdentityRecord {
        test_record("w-5").with_skills(skills.iter().copied())
    }

    #[test]
    fn test_superset_required() {
        let record = skilled(&["A", "B"]);

        let ok = evaluate_eligibility(&record, &TaskRequirements::new().skills(["A"]));
        assert!(ok.eligible);
        assert!(ok.unmet.is_empty());

        let missing = evaluate_eligibility(&record, &TaskRequirements::new().skills(["A", "C"]));
        assert!(!missing.eligible);
        assert_eq!(missing.missing_skills(), BTreeSet::from(["C"]));
        assert_eq!(
            missing.unmet,
            vec![UnmetRequirement::Skill { tag: "C".into() }]
        );
    }

    #[test]
    fn test_no_requirements_always_eligible() {
        let record = skilled(&[]);
        assert!(evaluate_eligibility(&record, &TaskRequirements::new()).eligible);
    }

    #[test]
    fn test_department_scope() {
        let record = skilled(&[]);
        assert!(evaluate_eligibility(&record, &TaskRequirements::new().department("Maintenance")).eligible);
        assert!(evaluate_eligibility(&record, &TaskRequirements::new().department(ALL_DEPARTMENTS)).eligible);

        let d = evaluate_eligibility(&record, &TaskRequirements::new().department("Logistics"));
        assert_eq!(
            d.unmet,
            vec![UnmetRequirement::Department {
                required: "Logistics".into(),
                actual: "Maintenance".into(),
            }]
        );
    }

    #[test]
    fn test_cross_department_record() {
        let record = skilled(&[]).with_scope("hq", ALL_DEPARTMENTS);
        assert!(evaluate_eligibility(&record, &TaskRequirements::new().department("Logistics")).eligible);
    }

    #[test]
    fn test_user_type_scope() {
        let record = skilled(&[]);
        assert!(evaluate_eligibility(&record, &TaskRequirements::new().user_type(UserType::Worker)).eligible);

        let d = evaluate_eligibility(&record, &TaskRequirements::new().user_type(UserType::Manager));
        assert!(!d.eligible);
        assert_eq!(
            d.unmet,
            vec![UnmetRequirement::UserType {
                required: UserType::Manager,
                actual: UserType::Worker,
            }]
        );
    }

    #[test]
    fn test_all_unmet_reported_in_order() {
        let record = skilled(&["B"]);
        let req = TaskRequirements::new()
            .skills(["C", "A", "B"])
            .department("Logistics")
            .user_type(UserType::Technicians);
        let d = evaluate_eligibility(&record, &req);
        assert_eq!(d.unmet.len(), 4);
        assert_eq!(d.unmet[0], UnmetRequirement::Skill { tag: "A".into() });
        assert_eq!(d.unmet[1], UnmetRequirement::Skill { tag: "C".into() });
        assert!(matches!(d.unmet[2], UnmetRequirement::Department { .. }));
        assert!(matches!(d.unmet[3], UnmetRequirement::UserType { .. }));
    }
}
