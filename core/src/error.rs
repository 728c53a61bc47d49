//! Error type shared by every conversion stage.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while converting an export directory.
///
/// Name-resolution failures never show up here; the resolver folds them into
/// an absent result.
#[derive(Debug, Error)]
pub enum ExportError {
    /// A timestamp with fewer than the six date/time components.
    #[error("malformed timestamp `{value}`: expected `YYYY-MM-DD HH:MM:SS`")]
    MalformedTimestamp {
        /// The offending source value.
        value: String,
    },
    /// A bug document that lacks an element or attribute the mapping needs.
    #[error("malformed record {record}: {field}")]
    MalformedRecord {
        /// Bug id when known, otherwise the file name.
        record: String,
        /// What was missing or unreadable.
        field: String,
    },
    /// A record needs more slots than the discovered schema provides.
    #[error("bug {record} needs {needed} {group} slots but the schema has {available}")]
    SchemaOverflow {
        /// Bug id.
        record: String,
        /// `comment` or `attachment`.
        group: &'static str,
        /// Slot number that was requested.
        needed: usize,
        /// Slots available in the schema.
        available: usize,
    },
    /// Directory, input file or output file could not be accessed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    pub(crate) fn malformed(record: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MalformedRecord {
            record: record.into(),
            field: field.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error only concerns a single record, as opposed to the
    /// whole run.
    pub fn is_record_error(&self) -> bool {
        !matches!(self, Self::Io { .. })
    }
}
