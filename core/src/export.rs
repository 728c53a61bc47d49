//! Whole-directory conversion: parse, size the schema, map, write.

use std::{
    fs,
    io::BufWriter,
    path::{Path, PathBuf},
};

use chrono::Local;

use crate::{
    date::CompactTimestamp,
    error::ExportError,
    mapper::{MapperSettings, OutputRow, RecordMapper},
    record::BugRecord,
    resolver::NameResolver,
    schema::{self, Schema},
    writer::write_table,
};

/// Default output file name, written into the input directory.
pub const DEFAULT_OUTPUT_NAME: &str = "launchpad-bugs-export.csv";

/// What to do with a bug document that cannot be converted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum MalformedPolicy {
    /// Stop the run with the record's error.
    #[default]
    Abort,
    /// Log it, leave it out of the output and go on.
    Skip,
}

/// Inputs of one conversion run.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Directory holding the `*.xml` bug exports.
    pub input_dir: PathBuf,
    /// Output file name inside `input_dir`.
    pub output_name: String,
    /// Project name, key and attachments URL.
    pub settings: MapperSettings,
    /// Malformed-record handling.
    pub on_malformed: MalformedPolicy,
    /// Only emit the first `limit` bugs (the schema still covers all).
    pub limit: Option<usize>,
}

/// A document left out of the output.
#[derive(Debug)]
pub struct SkippedRecord {
    /// The document.
    pub path: PathBuf,
    /// Why it was skipped.
    pub error: ExportError,
}

/// Outcome of a run.
#[derive(Debug)]
pub struct ExportSummary {
    /// `*.xml` files found.
    pub files: usize,
    /// Rows written.
    pub rows: usize,
    /// Column layout used.
    pub schema: Schema,
    /// Documents left out under [`MalformedPolicy::Skip`].
    pub skipped: Vec<SkippedRecord>,
    /// Display names that could not be resolved, sorted.
    pub unmatched_names: Vec<String>,
    /// Path of the written file.
    pub output: PathBuf,
}

/// `*.xml` files directly inside `dir`, sorted by name.
pub fn collect_xml_files(dir: &Path) -> Result<Vec<PathBuf>, ExportError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(|err| ExportError::io(dir, err))? {
        let entry = entry.map_err(|err| ExportError::io(dir, err))?;
        let path = entry.path();
        if path.is_file()
            && path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("xml"))
                .unwrap_or(false)
        {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Converts every bug export in `options.input_dir` into one import file.
pub async fn run(
    options: &ExportOptions,
    resolver: &mut NameResolver,
) -> Result<ExportSummary, ExportError> {
    let files = collect_xml_files(&options.input_dir)?;
    tracing::info!("Found {} bug exports in {}", files.len(), options.input_dir.display());

    let mut skipped = Vec::new();
    let mut records = Vec::with_capacity(files.len());
    for path in &files {
        match BugRecord::load(path) {
            Ok(record) => records.push((path, record)),
            Err(err) => reject(options.on_malformed, path, err, &mut skipped)?,
        }
    }

    let schema = schema::discover(records.iter().map(|(_, record)| record));
    tracing::info!(
        "Schema: {} comment slots, {} attachment slots",
        schema.comment_slots(),
        schema.attachment_slots()
    );

    let processed_at = CompactTimestamp::from_datetime(&Local::now());
    let mut mapper = RecordMapper::new(resolver, &options.settings, processed_at);
    let limit = options.limit.unwrap_or(usize::MAX);
    let mut rows: Vec<OutputRow> = Vec::with_capacity(records.len().min(limit));
    for (path, record) in records.iter().take(limit) {
        tracing::info!("Processing bug {}", record.id);
        match mapper.map(record, &schema).await {
            Ok(row) => rows.push(row),
            Err(err) => reject(options.on_malformed, path, err, &mut skipped)?,
        }
    }
    tracing::info!("Table row count: {}", rows.len());
    tracing::info!("File amount: {}", files.len());

    let output = options.input_dir.join(&options.output_name);
    let file = fs::File::create(&output).map_err(|err| ExportError::io(&output, err))?;
    let mut writer = BufWriter::new(file);
    write_table(&mut writer, &schema, &rows).map_err(|err| ExportError::io(&output, err))?;

    Ok(ExportSummary {
        files: files.len(),
        rows: rows.len(),
        schema,
        skipped,
        unmatched_names: resolver.unmatched_names(),
        output,
    })
}

fn reject(
    policy: MalformedPolicy,
    path: &Path,
    error: ExportError,
    skipped: &mut Vec<SkippedRecord>,
) -> Result<(), ExportError> {
    if policy == MalformedPolicy::Abort || !error.is_record_error() {
        return Err(error);
    }
    tracing::warn!("Skipping {}: {error}", path.display());
    skipped.push(SkippedRecord {
        path: path.to_path_buf(),
        error,
    });
    Ok(())
}
