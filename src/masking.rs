//! Display-time masking of sensitive contact fields.
//!
//! Masking never touches the stored record. Viewer roles can be given an
//! override in a `MaskingPolicy`; with an empty policy every viewer sees the
//! same projection.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::record::{IdentityRecord, Role, UserType};

/// Replacement character for hidden digits.
pub const MASK_CHAR: char = 'X';
/// Trailing digits left visible.
pub const VISIBLE_DIGITS: usize = 4;
/// Marker shown for a field with no data.
pub const NOT_PROVIDED: &str = "Not provided";

/// Redact every digit except the last four.
///
/// Non-digit characters keep their position. A value with fewer than four
/// digits is masked in full.
pub fn mask_mobile(value: &str) -> String {
    let digits = value.chars().filter(|c| c.is_numeric()).count();
    if digits < VISIBLE_DIGITS {
        return value.chars().map(|_| MASK_CHAR).collect();
    }

    let mut hidden = digits - VISIBLE_DIGITS;
    value
        .chars()
        .map(|c| {
            if hidden > 0 && c.is_numeric() {
                hidden -= 1;
                MASK_CHAR
            } else {
                c
            }
        })
        .collect()
}

/// Per-role change to the default masking rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskOverride {
    /// Show raw values even if the record asks for masking.
    Reveal,
    /// Mask even if the record does not ask for it.
    Enforce,
}

/// Role to masking override table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaskingPolicy {
    overrides: BTreeMap<Role, MaskOverride>,
}

impl MaskingPolicy {
    /// No overrides.
    pub fn new() -> Self {
        MaskingPolicy::default()
    }

    /// Add or replace the override for a role.
    pub fn with_override(mut self, role: Role, mask: MaskOverride) -> Self {
        self.overrides.insert(role, mask);
        self
    }

    /// The override for a role, if any.
    pub fn override_for(&self, role: Role) -> Option<MaskOverride> {
        self.overrides.get(&role).copied()
    }

    /// Whether `viewer` sees the record's mobile number masked.
    pub fn masks_mobile(&self, record: &IdentityRecord, viewer: Role) -> bool {
        match self.override_for(viewer) {
            Some(MaskOverride::Reveal) => false,
            Some(MaskOverride::Enforce) => true,
            None => record.mask_mobile,
        }
    }
}

/// A field as shown to a viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DisplayValue {
    /// Shown as stored.
    Plain(String),
    /// Redacted.
    Masked(String),
    /// No data stored.
    NotProvided,
}

impl DisplayValue {
    /// Returns `true` if the value was redacted.
    pub fn is_masked(&self) -> bool {
        matches!(self, DisplayValue::Masked(_))
    }
}

impl fmt::Display for DisplayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayValue::Plain(v) | DisplayValue::Masked(v) => f.write_str(v),
            DisplayValue::NotProvided => f.write_str(NOT_PROVIDED),
        }
    }
}

/// A record projected for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayRecord {
    /// Record id.
    pub id: String,
    /// Name as stored.
    pub full_name: String,
    /// Email as stored.
    pub email: String,
    /// Mobile number, masked or as stored.
    pub mobile: DisplayValue,
    /// Emergency contact, or `NotProvided` when blank.
    pub emergency_contact: DisplayValue,
    /// The record's role.
    pub role: Role,
    /// The record's user type.
    pub user_type: UserType,
    /// Organizational unit.
    pub unit: String,
    /// Department, possibly `"All"`.
    pub department: String,
    /// Skill tags in sorted order.
    pub skill_set: Vec<String>,
}

fn present(value: &str) -> Option<&str> {
    Some(value).filter(|v| !v.trim().is_empty())
}

/// Project a record for a viewer.
pub fn project_for_display(
    record: &IdentityRecord,
    viewer: Role,
    policy: &MaskingPolicy,
) -> DisplayRecord {
    let mobile = if policy.masks_mobile(record, viewer) {
        DisplayValue::Masked(mask_mobile(&record.mobile))
    } else {
        DisplayValue::Plain(record.mobile.clone())
    };
    let emergency_contact = match present(&record.emergency_contact) {
        None => DisplayValue::NotProvided,
        Some(c) => DisplayValue::Plain(c.to_string()),
    };

    DisplayRecord {
        id: record.id.clone(),
        full_name: record.full_name.clone(),
        email: record.email.clone(),
        mobile,
        emergency_contact,
        role: record.role,
        user_type: record.user_type,
        unit: record.unit.clone(),
        department: record.department.clone(),
        skill_set: record.skill_set.iter().cloned().collect(),
    }
}
