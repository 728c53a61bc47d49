//! Launchpad timestamps (`2014-03-21 10:15:30.123456+00:00`) to the compact
//! `yyyyMMddHHmmss` form the Jira CSV importer expects by default.

use std::fmt;

use chrono::{DateTime, TimeZone};

use crate::error::ExportError;

const COMPONENTS: usize = 6;

/// A 14-digit `yyyyMMddHHmmss` timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompactTimestamp(String);

impl CompactTimestamp {
    /// Formats an instant (used for the synthetic self-attachment).
    pub fn from_datetime<Tz>(value: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        Self(value.format("%Y%m%d%H%M%S").to_string())
    }

    /// The underlying digits.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CompactTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Converts a source timestamp into a [`CompactTimestamp`].
///
/// The value is split on `-`, space, `:` and `.`; the first six components
/// are concatenated. A sub-second fraction is dropped with the seventh
/// component, and a timezone suffix glued to the seconds (`30+00`, `30Z`) is
/// cut off. Callers replace a `T` separator with a space beforehand.
pub fn normalize(value: &str) -> Result<CompactTimestamp, ExportError> {
    let malformed = || ExportError::MalformedTimestamp {
        value: value.to_string(),
    };

    let parts: Vec<&str> = value
        .trim()
        .split(['-', ' ', ':', '.'])
        .take(COMPONENTS)
        .collect();
    if parts.len() < COMPONENTS {
        return Err(malformed());
    }

    let mut compact = String::with_capacity(14);
    for (index, part) in parts.iter().enumerate() {
        let digits = if index == COMPONENTS - 1 {
            let end = part
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(part.len());
            &part[..end]
        } else {
            part
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        compact.push_str(digits);
    }

    Ok(CompactTimestamp(compact))
}

/// Replaces the ISO `T` date/time separator with a space.
pub fn strip_iso_separator(value: &str) -> String {
    value.replace('T', " ")
}
