//! `convert`: one directory of bug exports to one CSV file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use lp2jira_core::{
    export::{self, ExportOptions, MalformedPolicy},
    mapper::MapperSettings,
};

use super::build_resolver;
use crate::cli::JiraArgs;

/// Arguments of the `convert` subcommand.
pub struct ConvertOptions {
    /// Input directory, also the output location.
    pub dir: PathBuf,
    /// Output file name.
    pub output: String,
    /// Jira project name.
    pub project_name: String,
    /// Jira project key.
    pub project_key: String,
    /// Base URL attachments are served from during the import.
    pub attachments_url: String,
    /// Skip malformed records instead of aborting.
    pub skip_malformed: bool,
    /// Maximum number of rows to emit.
    pub limit: Option<usize>,
    /// Account lookup settings.
    pub jira: JiraArgs,
}

/// Runs the conversion and prints the unmatched-name report.
pub async fn run(options: ConvertOptions) -> Result<()> {
    let ConvertOptions {
        dir,
        output,
        project_name,
        project_key,
        attachments_url,
        skip_malformed,
        limit,
        jira,
    } = options;

    let mut resolver = build_resolver(&jira)?;
    let options = ExportOptions {
        input_dir: dir,
        output_name: output,
        settings: MapperSettings::new(project_name, project_key, &attachments_url),
        on_malformed: if skip_malformed {
            MalformedPolicy::Skip
        } else {
            MalformedPolicy::Abort
        },
        limit,
    };

    let summary = export::run(&options, &mut resolver)
        .await
        .with_context(|| format!("failed to convert {}", options.input_dir.display()))?;

    for skipped in &summary.skipped {
        tracing::warn!("Skipped {}: {}", skipped.path.display(), skipped.error);
    }

    let stats = resolver.stats();
    tracing::info!(
        "Wrote {} rows ({} files, {} skipped) to {}; {} user searches, {} cache hits.",
        summary.rows,
        summary.files,
        summary.skipped.len(),
        summary.output.display(),
        stats.lookups,
        stats.cache_hits
    );

    if !summary.unmatched_names.is_empty() {
        println!("The following Launchpad names were not matched. You may want to create");
        println!("dummy accounts on Jira to improve the import process.");
        println!();
        for name in &summary.unmatched_names {
            println!(" * {name}");
        }
    }

    Ok(())
}
