//! Workforce identity records.
//!
//! Records are read-only to the engine. They change only through the
//! store's `insert`, `replace` and `update` operations.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::InputFault;
use crate::gate::{GateKind, GateSet};
use crate::temporal::WorkTiming;

/// Department value meaning "every department".
pub const ALL_DEPARTMENTS: &str = "All";

/// A user's role. Only used as a viewer privilege when masking.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Role {
    /// System administrator.
    Admin,
    /// Runs day-to-day operations.
    OperationManager,
    /// Field technician.
    Technician,
    /// Line or site worker.
    Worker,
    /// Creates and assigns tasks.
    TaskManager,
    /// Owns a product line.
    ProductManager,
    /// Executive staff.
    Executive,
}

/// The category a record is grouped under for task scoping.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum UserType {
    /// Executive staff.
    Executives,
    /// Managers of any kind.
    Manager,
    /// Technicians.
    Technicians,
    /// Workers.
    Worker,
}

/// One worker's identity record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    /// Unique, immutable identifier.
    pub id: String,
    /// Display name.
    pub full_name: String,
    /// Contact email.
    pub email: String,
    /// Contact mobile number.
    pub mobile: String,
    /// Empty when no contact is designated.
    #[serde(default)]
    pub emergency_contact: String,
    /// Role, used as viewer privilege when masking.
    pub role: Role,
    /// Category for task scoping.
    pub user_type: UserType,
    /// Organizational unit. Keys the unit's geofence.
    pub unit: String,
    /// May be `ALL_DEPARTMENTS`.
    pub department: String,
    /// Redact `mobile` on display.
    #[serde(default)]
    pub mask_mobile: bool,
    /// Active access gates.
    #[serde(default)]
    pub gates: GateSet,
    /// Skill tags held.
    #[serde(default)]
    pub skill_set: BTreeSet<String>,
    /// Permitted shift window.
    pub work_timing: WorkTiming,
}

impl IdentityRecord {
    /// Create a record with no gates, no skills and empty contact fields.
    pub fn new(
        id: impl Into<String>,
        full_name: impl Into<String>,
        role: Role,
        user_type: UserType,
        work_timing: WorkTiming,
    ) -> Self {
        IdentityRecord {
            id: id.into(),
            full_name: full_name.into(),
            email: String::new(),
            mobile: String::new(),
            emergency_contact: String::new(),
            role,
            user_type,
            unit: String::new(),
            department: String::new(),
            mask_mobile: false,
            gates: GateSet::new(),
            skill_set: BTreeSet::new(),
            work_timing,
        }
    }

    /// Set the contact email.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    /// Set the mobile number and whether it is masked on display.
    pub fn with_mobile(mut self, mobile: impl Into<String>, masked: bool) -> Self {
        self.mobile = mobile.into();
        self.mask_mobile = masked;
        self
    }

    /// Set the emergency contact.
    pub fn with_emergency_contact(mut self, contact: impl Into<String>) -> Self {
        self.emergency_contact = contact.into();
        self
    }

    /// Set the unit and department.
    pub fn with_scope(mut self, unit: impl Into<String>, department: impl Into<String>) -> Self {
        self.unit = unit.into();
        self.department = department.into();
        self
    }

    /// Enable or disable one gate.
    pub fn with_gate(mut self, kind: GateKind, enabled: bool) -> Self {
        self.gates.set(kind, enabled);
        self
    }

    /// Replace the gate settings from the three per-gate toggles.
    pub fn with_access_flags(mut self, ip_based: bool, time_based: bool, geo: bool) -> Self {
        self.gates = GateSet::from_flags(ip_based, time_based, geo);
        self
    }

    /// Add skill tags.
    pub fn with_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skill_set.extend(skills.into_iter().map(Into::into));
        self
    }

    /// Check the record is well formed.
    ///
    /// The id must be non-blank, skill tags must be non-blank and the gate
    /// list must not name a gate twice.
    pub fn validate(&self) -> Result<(), InputFault> {
        if self.id.trim().is_empty() {
            return Err(InputFault::malformed_record(&self.id, "id must not be empty"));
        }
        if self.skill_set.iter().any(|s| s.trim().is_empty()) {
            return Err(InputFault::malformed_record(
                &self.id,
                "skill tags must not be empty",
            ));
        }
        if let Some(kind) = self.gates.first_duplicate() {
            return Err(InputFault::malformed_record(
                &self.id,
                format!("gate {kind} is configured more than once"),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn test_record(id: &str) -> IdentityRecord {
    IdentityRecord::new(
        id,
        "Test Worker",
        Role::Worker,
        UserType::Worker,
        WorkTiming::from_hm((9, 0), (17, 0)).unwrap(),
    )
    .with_scope("north-depot", "Maintenance")
}
