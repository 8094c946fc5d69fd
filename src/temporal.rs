//! Temporal gate.
//!
//! A shift window is a pair of times-of-day. When `check_in <= check_out`
//! it is a closed interval within one day; otherwise it wraps midnight and
//! covers `[check_in, 24:00) ∪ [00:00, check_out]`. Both ends are inclusive.
//!
//! Attempt instants are reduced to whole seconds before comparison.

use chrono::{DateTime, FixedOffset, NaiveTime, Offset, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::attempt::AttemptContext;
use crate::config::ReferenceConfiguration;
use crate::error::InputFault;
use crate::gate::{Gate, GateKind, GateResult};
use crate::record::IdentityRecord;
use crate::types::DenialReason;

/// A user's permitted shift window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkTiming {
    /// Start of the window.
    #[serde(with = "time_of_day")]
    pub check_in: NaiveTime,
    /// End of the window.
    #[serde(with = "time_of_day")]
    pub check_out: NaiveTime,
}

impl WorkTiming {
    /// Create a window.
    pub const fn new(check_in: NaiveTime, check_out: NaiveTime) -> Self {
        WorkTiming {
            check_in,
            check_out,
        }
    }

    /// Build a window from `(hour, minute)` pairs.
    pub fn from_hm(check_in: (u32, u32), check_out: (u32, u32)) -> Result<Self, InputFault> {
        let time = |(h, m): (u32, u32)| {
            NaiveTime::from_hms_opt(h, m, 0).ok_or_else(|| {
                InputFault::malformed_record("", format!("invalid time of day {h:02}:{m:02}"))
            })
        };
        Ok(WorkTiming::new(time(check_in)?, time(check_out)?))
    }

    /// Returns `true` if the window crosses midnight.
    pub fn wraps_midnight(&self) -> bool {
        self.check_in > self.check_out
    }

    /// Check if a time of day falls within the window.
    pub fn contains(&self, t: NaiveTime) -> bool {
        if self.wraps_midnight() {
            t >= self.check_in || t <= self.check_out
        } else {
            t >= self.check_in && t <= self.check_out
        }
    }
}

/// How the organization turns an attempt instant into a local time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TimezoneSpec", into = "TimezoneSpec")]
pub enum TimezonePolicy {
    /// Convert to the organization's fixed offset.
    Organization(FixedOffset),
    /// Use the offset the attempt was observed in.
    AttemptLocal,
}

impl Default for TimezonePolicy {
    fn default() -> Self {
        TimezonePolicy::Organization(Utc.fix())
    }
}

impl TimezonePolicy {
    /// A fixed organization offset in minutes east of UTC.
    pub fn organization_offset_minutes(minutes: i32) -> Result<Self, InputFault> {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(TimezonePolicy::Organization)
            .ok_or_else(|| {
                InputFault::MalformedConfiguration(format!(
                    "utc offset of {minutes} minutes is out of range"
                ))
            })
    }

    /// Local time of day of `instant`, truncated to whole seconds.
    pub fn local_time(&self, instant: &DateTime<FixedOffset>) -> NaiveTime {
        let t = match self {
            TimezonePolicy::Organization(offset) => instant.with_timezone(offset).time(),
            TimezonePolicy::AttemptLocal => instant.time(),
        };
        t.with_nanosecond(0).unwrap_or(t)
    }
}

/// Serialized shape of `TimezonePolicy`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
enum TimezoneSpec {
    Organization { utc_offset_minutes: i32 },
    AttemptLocal,
}

impl TryFrom<TimezoneSpec> for TimezonePolicy {
    type Error = InputFault;

    fn try_from(spec: TimezoneSpec) -> Result<Self, Self::Error> {
        match spec {
            TimezoneSpec::Organization { utc_offset_minutes } => {
                TimezonePolicy::organization_offset_minutes(utc_offset_minutes)
            }
            TimezoneSpec::AttemptLocal => Ok(TimezonePolicy::AttemptLocal),
        }
    }
}

impl From<TimezonePolicy> for TimezoneSpec {
    fn from(policy: TimezonePolicy) -> Self {
        match policy {
            TimezonePolicy::Organization(offset) => TimezoneSpec::Organization {
                utc_offset_minutes: offset.local_minus_utc() / 60,
            },
            TimezonePolicy::AttemptLocal => TimezoneSpec::AttemptLocal,
        }
    }
}

/// Evaluate the temporal gate.
pub fn evaluate_temporal(
    record: &IdentityRecord,
    attempt: &AttemptContext,
    timezone: &TimezonePolicy,
) -> GateResult {
    if !record.gates.is_enabled(GateKind::Temporal) {
        return GateResult::Skipped;
    }
    check_shift(record, attempt, timezone)
}

fn check_shift(
    record: &IdentityRecord,
    attempt: &AttemptContext,
    timezone: &TimezonePolicy,
) -> GateResult {
    if record.work_timing.contains(timezone.local_time(&attempt.timestamp)) {
        GateResult::Passed
    } else {
        GateResult::Failed(DenialReason::OutsideShiftWindow)
    }
}

/// The temporal gate as a registered `Gate`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemporalGate;

impl Gate for TemporalGate {
    fn kind(&self) -> GateKind {
        GateKind::Temporal
    }

    fn check(
        &self,
        record: &IdentityRecord,
        attempt: &AttemptContext,
        config: &ReferenceConfiguration,
    ) -> GateResult {
        check_shift(record, attempt, &config.timezone)
    }
}

/// Serde for times of day as `"HH:MM"` or `"HH:MM:SS"`.
pub(crate) mod time_of_day {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&t.format("%H:%M:%S"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid time of day {raw:?}")))
    }

    pub fn parse(raw: &str) -> Option<NaiveTime> {
        let raw = raw.trim();
        NaiveTime::parse_from_str(raw, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
            .ok()
    }
}
