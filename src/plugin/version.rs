use std::cmp::Ordering;
use std::fmt;

use crate::plugin::error::VersionError;

/// One dot-separated component, kept as its decimal digits so any length
/// compares exactly. Leading zeros are stripped on parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Segment(String);

impl Segment {
    fn parse(raw: &str) -> Option<Self> {
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let digits = raw.trim_start_matches('0');
        let digits = if digits.is_empty() { "0" } else { digits };
        Some(Self(digits.to_string()))
    }
}

impl Ord for Segment {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for Segment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A version made of dot-separated non-negative integers, e.g. `1.10.2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DottedVersion(Vec<Segment>);

impl DottedVersion {
    pub fn parse(raw: &str) -> Result<Self, VersionError> {
        let trimmed = raw.trim();
        let segments = trimmed
            .split('.')
            .map(Segment::parse)
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| VersionError::Malformed(trimmed.to_string()))?;

        Ok(Self(segments))
    }

    pub fn segment_count(&self) -> usize {
        self.0.len()
    }

    /// Tuple order, but only between versions with the same segment count.
    pub fn compare(&self, other: &Self) -> Result<Ordering, VersionError> {
        if self.segment_count() != other.segment_count() {
            return Err(VersionError::SegmentMismatch {
                left: self.to_string(),
                right: other.to_string(),
            });
        }

        Ok(self.0.cmp(&other.0))
    }
}

impl fmt::Display for DottedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self
            .0
            .iter()
            .map(|segment| segment.0.as_str())
            .collect::<Vec<_>>()
            .join(".");
        f.write_str(&text)
    }
}

/// True when `remote` is strictly greater than `local`.
pub fn is_newer(remote: &str, local: &str) -> Result<bool, VersionError> {
    let remote = DottedVersion::parse(remote)?;
    let local = DottedVersion::parse(local)?;
    Ok(remote.compare(&local)? == Ordering::Greater)
}
