//! Subcommand dispatch and shared setup.

pub mod convert;
pub mod resolve;

use std::time::Duration;

use anyhow::{Context, Result};
use lp2jira_core::{
    mapping::load_mapping,
    resolver::{JiraUserDirectory, NameResolver, OfflineDirectory},
};

use crate::cli::{Cli, Commands, JiraArgs};

/// Runs the parsed subcommand.
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Convert {
            dir,
            output,
            project_name,
            project_key,
            attachments_url,
            skip_malformed,
            limit,
            jira,
        } => {
            convert::run(convert::ConvertOptions {
                dir,
                output,
                project_name,
                project_key,
                attachments_url,
                skip_malformed,
                limit,
                jira,
            })
            .await
        },
        Commands::Resolve {
            names,
            jira,
        } => resolve::run(&names, &jira).await,
    }
}

/// Builds the name resolver: remote Jira search when a user is given,
/// offline otherwise, seeded from the mapping file either way.
pub fn build_resolver(jira: &JiraArgs) -> Result<NameResolver> {
    let mut resolver = match jira.username.as_deref() {
        Some(username) => {
            let password = jira.password.as_deref().unwrap_or_default();
            let directory = JiraUserDirectory::new(
                &jira.jira_url,
                username,
                password,
                Duration::from_secs(jira.lookup_timeout_secs),
            )
            .context("failed to build Jira client")?;
            tracing::info!("Looking up unknown names on {}", jira.jira_url);
            NameResolver::new(directory)
        },
        None => {
            tracing::warn!("No Jira username given; resolving names from the mapping file only");
            NameResolver::new(OfflineDirectory)
        },
    };

    if let Some(path) = &jira.mapping_file {
        let entries = load_mapping(path)
            .with_context(|| format!("failed to read mapping file {}", path.display()))?;
        tracing::info!("Loaded {} name mappings from {}", entries.len(), path.display());
        resolver.preload(entries);
    }

    Ok(resolver)
}
