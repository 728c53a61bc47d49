//! Conversion engine that turns a directory of Launchpad bug exports (one
//! XML document per bug) into a single Jira CSV bulk-import file.
//!
//! The pipeline runs in fixed stages: every document is parsed into a
//! [`record::BugRecord`], [`schema::discover`] fixes the column layout, each
//! record is flattened by [`mapper::RecordMapper`], and
//! [`writer::write_table`] serializes the rows once at the end.

pub mod date;
pub mod error;
pub mod export;
pub mod mapper;
pub mod mapping;
pub mod record;
pub mod resolver;
pub mod schema;
pub mod writer;
mod xml;

pub use error::ExportError;
