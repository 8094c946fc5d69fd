//! YAML loading for reference configuration and record seed files.
//!
//! Everything loaded here is validated before it is returned.

use std::path::Path;

use tracing::debug;

use crate::config::ReferenceConfiguration;
use crate::error::InputFault;
use crate::record::IdentityRecord;

/// Load a reference configuration file from disk.
pub fn load_reference_file(path: &Path) -> Result<ReferenceConfiguration, InputFault> {
    let contents = read(path)?;
    parse_reference(&contents)
}

/// Parse a reference configuration from a YAML string.
pub fn parse_reference(yaml: &str) -> Result<ReferenceConfiguration, InputFault> {
    let config: ReferenceConfiguration =
        serde_yaml::from_str(yaml).map_err(|e| InputFault::Parse(e.to_string()))?;
    config.validate()?;
    debug!(
        trusted_ranges = config.trusted_ranges.len(),
        geofences = config.geofences.len(),
        "reference configuration loaded"
    );
    Ok(config)
}

/// Load a list of identity records from disk.
pub fn load_records_file(path: &Path) -> Result<Vec<IdentityRecord>, InputFault> {
    let contents = read(path)?;
    parse_records(&contents)
}

/// Parse a YAML list of identity records.
pub fn parse_records(yaml: &str) -> Result<Vec<IdentityRecord>, InputFault> {
    let records: Vec<IdentityRecord> =
        serde_yaml::from_str(yaml).map_err(|e| InputFault::Parse(e.to_string()))?;
    for record in &records {
        record.validate()?;
    }
    debug!(records = records.len(), "identity records loaded");
    Ok(records)
}

fn read(path: &Path) -> Result<String, InputFault> {
    std::fs::read_to_string(path).map_err(|e| InputFault::Io(format!("{}: {e}", path.display())))
}
