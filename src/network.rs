//! Network gate.
//!
//! Trusted ranges are either a single address or a CIDR block.
//! IPv4-mapped IPv6 origins are canonicalised to IPv4 before matching.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::attempt::AttemptContext;
use crate::config::ReferenceConfiguration;
use crate::error::InputFault;
use crate::gate::{Gate, GateKind, GateResult};
use crate::record::IdentityRecord;
use crate::types::DenialReason;

/// A trusted address range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum NetworkRange {
    /// Matches exactly one address.
    Exact(IpAddr),
    /// Matches every address sharing the first `prefix` bits of `network`.
    Cidr {
        /// Base address of the block.
        network: IpAddr,
        /// Prefix length in bits.
        prefix: u8,
    },
}

impl NetworkRange {
    /// Parse `"10.0.0.7"` or `"10.0.0.0/8"` style ranges.
    pub fn parse(s: &str) -> Result<Self, InputFault> {
        let invalid = || InputFault::MalformedConfiguration(format!("invalid network range {s:?}"));
        let s = s.trim();

        match s.split_once('/') {
            None => s
                .parse::<IpAddr>()
                .map(|ip| NetworkRange::Exact(ip.to_canonical()))
                .map_err(|_| invalid()),
            Some((addr, prefix)) => {
                let network: IpAddr = addr.parse().map_err(|_| invalid())?;
                let prefix: u8 = prefix.parse().map_err(|_| invalid())?;
                let max = match network {
                    IpAddr::V4(_) => 32,
                    IpAddr::V6(_) => 128,
                };
                if prefix > max {
                    return Err(invalid());
                }
                // An IPv4-mapped block is stored as the IPv4 block it covers.
                match network.to_canonical() {
                    IpAddr::V4(v4) if network.is_ipv6() && prefix >= 96 => Ok(NetworkRange::Cidr {
                        network: IpAddr::V4(v4),
                        prefix: prefix - 96,
                    }),
                    IpAddr::V4(_) if network.is_ipv6() => Err(invalid()),
                    _ => Ok(NetworkRange::Cidr { network, prefix }),
                }
            }
        }
    }

    /// Check if the address falls within this range.
    pub fn contains(&self, addr: IpAddr) -> bool {
        let addr = addr.to_canonical();
        match self {
            NetworkRange::Exact(ip) => *ip == addr,
            NetworkRange::Cidr { network, prefix } => match (network, addr) {
                (IpAddr::V4(net), IpAddr::V4(a)) => {
                    let mask = u32::MAX.checked_shl(32 - u32::from(*prefix)).unwrap_or(0);
                    u32::from(*net) & mask == u32::from(a) & mask
                }
                (IpAddr::V6(net), IpAddr::V6(a)) => {
                    let mask = u128::MAX.checked_shl(128 - u32::from(*prefix)).unwrap_or(0);
                    u128::from(*net) & mask == u128::from(a) & mask
                }
                _ => false,
            },
        }
    }
}

impl FromStr for NetworkRange {
    type Err = InputFault;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NetworkRange::parse(s)
    }
}

impl TryFrom<String> for NetworkRange {
    type Error = InputFault;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        NetworkRange::parse(&s)
    }
}

impl From<NetworkRange> for String {
    fn from(range: NetworkRange) -> Self {
        range.to_string()
    }
}

impl fmt::Display for NetworkRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkRange::Exact(ip) => write!(f, "{ip}"),
            NetworkRange::Cidr { network, prefix } => write!(f, "{network}/{prefix}"),
        }
    }
}

/// Parse a reported source address. Accepts a bare address or `addr:port`.
fn parse_source(raw: &str) -> Option<IpAddr> {
    let raw = raw.trim();
    raw.parse::<IpAddr>()
        .ok()
        .or_else(|| raw.parse::<SocketAddr>().ok().map(|s| s.ip()))
}

/// Evaluate the network gate.
///
/// A missing or unparseable source address fails the gate.
pub fn evaluate_network(
    record: &IdentityRecord,
    attempt: &AttemptContext,
    trusted_ranges: &[NetworkRange],
) -> GateResult {
    if !record.gates.is_enabled(GateKind::Network) {
        return GateResult::Skipped;
    }
    check_origin(attempt, trusted_ranges)
}

fn check_origin(attempt: &AttemptContext, trusted_ranges: &[NetworkRange]) -> GateResult {
    match attempt.source_address.as_deref().and_then(parse_source) {
        Some(addr) if trusted_ranges.iter().any(|r| r.contains(addr)) => GateResult::Passed,
        _ => GateResult::Failed(DenialReason::OriginOutsideTrustedNetwork),
    }
}

/// The network gate as a registered `Gate`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkGate;

impl Gate for NetworkGate {
    fn kind(&self) -> GateKind {
        GateKind::Network
    }

    fn check(
        &self,
        _record: &IdentityRecord,
        attempt: &AttemptContext,
        config: &ReferenceConfiguration,
    ) -> GateResult {
        check_origin(attempt, &config.trusted_ranges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::test_record;
    use chrono::DateTime;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    fn attempt_from(addr: Option<&str>) -> AttemptContext {
        let ts = DateTime::parse_from_rfc3339("2024-03-01T10:00:00Z").unwrap();
        let mut attempt = AttemptContext::new(ts);
        attempt.source_address = addr.map(str::to_string);
        attempt
    }

    fn ranges() -> Vec<NetworkRange> {
        vec![
            NetworkRange::parse("10.0.0.0/8").unwrap(),
            NetworkRange::parse("203.0.113.7").unwrap(),
            NetworkRange::parse("2001:db8::/32").unwrap(),
        ]
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!(
            NetworkRange::parse("192.168.1.0/24").unwrap().to_string(),
            "192.168.1.0/24"
        );
        assert_eq!(NetworkRange::parse(" 127.0.0.1 ").unwrap().to_string(), "127.0.0.1");
        assert!(NetworkRange::parse("10.0.0.0/33").is_err());
        assert!(NetworkRange::parse("not-an-ip").is_err());
        assert!(NetworkRange::parse("10.0.0.0/x").is_err());
        assert!(NetworkRange::parse("::/129").is_err());
    }

    #[test]
    fn test_cidr_containment() {
        let r = NetworkRange::parse("192.168.1.0/24").unwrap();
        assert!(r.contains(ip("192.168.1.0")));
        assert!(r.contains(ip("192.168.1.255")));
        assert!(!r.contains(ip("192.168.2.1")));
        assert!(!r.contains(ip("::1")));
    }

    #[test]
    fn test_zero_prefix_matches_family() {
        let r = NetworkRange::parse("0.0.0.0/0").unwrap();
        assert!(r.contains(ip("8.8.8.8")));
        assert!(!r.contains(ip("2001:db8::1")));
    }

    #[test]
    fn test_full_prefix_is_exact() {
        let r = NetworkRange::parse("10.1.1.1/32").unwrap();
        assert!(r.contains(ip("10.1.1.1")));
        assert!(!r.contains(ip("10.1.1.2")));
    }

    #[test]
    fn test_ipv4_mapped_origin() {
        let r = NetworkRange::parse("10.0.0.0/8").unwrap();
        assert!(r.contains(ip("::ffff:10.2.3.4")));

        let mapped = NetworkRange::parse("::ffff:10.0.0.0/104").unwrap();
        assert_eq!(mapped, r);
        assert!(mapped.contains(ip("::ffff:10.1.2.3")));
        assert!(mapped.contains(ip("10.1.2.3")));
        assert!(!mapped.contains(ip("11.1.2.3")));

        assert_eq!(
            NetworkRange::parse("::ffff:192.168.1.7").unwrap(),
            NetworkRange::parse("192.168.1.7").unwrap()
        );
        assert!(NetworkRange::parse("::ffff:0.0.0.0/80").is_err());
    }

    #[test]
    fn test_gate_skipped_when_disabled() {
        let record = test_record("w-1");
        assert_eq!(
            evaluate_network(&record, &attempt_from(None), &ranges()),
            GateResult::Skipped
        );
    }

    #[test]
    fn test_gate_pass_and_fail() {
        let mut record = test_record("w-1");
        record.gates.set(GateKind::Network, true);
        let trusted = ranges();

        assert_eq!(
            evaluate_network(&record, &attempt_from(Some("10.20.30.40")), &trusted),
            GateResult::Passed
        );
        assert_eq!(
            evaluate_network(&record, &attempt_from(Some("203.0.113.7:51234")), &trusted),
            GateResult::Passed
        );
        assert_eq!(
            evaluate_network(&record, &attempt_from(Some("2001:db8:1::9")), &trusted),
            GateResult::Passed
        );
        assert_eq!(
            evaluate_network(&record, &attempt_from(Some("198.51.100.1")), &trusted),
            GateResult::Failed(DenialReason::OriginOutsideTrustedNetwork)
        );
    }

    #[test]
    fn test_missing_or_malformed_origin_fails() {
        let mut record = test_record("w-1");
        record.gates.set(GateKind::Network, true);
        let trusted = ranges();

        for addr in [None, Some(""), Some("garbage"), Some("10.0.0.300")] {
            assert_eq!(
                evaluate_network(&record, &attempt_from(addr), &trusted),
                GateResult::Failed(DenialReason::OriginOutsideTrustedNetwork),
                "address {addr:?}"
            );
        }
    }

    #[test]
    fn test_no_trusted_ranges_fails_closed() {
        let mut record = test_record("w-1");
        record.gates.set(GateKind::Network, true);
        assert!(evaluate_network(&record, &attempt_from(Some("10.0.0.1")), &[]).is_failed());
    }

    #[test]
    fn test_serde_as_string() {
        let ranges: Vec<NetworkRange> =
            serde_json::from_str(r#"["10.0.0.0/8","203.0.113.7"]"#).unwrap();
        assert_eq!(ranges.len(), 2);
        assert_eq!(
            serde_json::to_string(&ranges).unwrap(),
            r#"["10.0.0.0/8","203.0.113.7"]"#
        );
        assert!(serde_json::from_str::<NetworkRange>(r#""10.0.0.0/40""#).is_err());
    }
}
