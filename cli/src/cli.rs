use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use lp2jira_core::export::DEFAULT_OUTPUT_NAME;

/// Parsed command line.
#[derive(Parser)]
#[command(
    name = "lp2jira",
    version,
    about = "Convert Launchpad bug exports into a Jira CSV import file"
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Where and how to look up Jira accounts.
#[derive(Args, Debug, Clone)]
pub struct JiraArgs {
    /// Jira server base URL.
    #[arg(long, env = "LP2JIRA_JIRA_URL", default_value = "http://jira.example.org/")]
    pub jira_url: String,
    /// Jira user for the user search. Without it no remote lookups are made
    /// and only the mapping file resolves names.
    #[arg(long, env = "LP2JIRA_USERNAME")]
    pub username: Option<String>,
    /// Jira password.
    #[arg(long, env = "LP2JIRA_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
    /// `display name,account` file for names the user search cannot match.
    #[arg(long)]
    pub mapping_file: Option<PathBuf>,
    /// Timeout of a single user search, in seconds.
    #[arg(long, default_value_t = 30)]
    pub lookup_timeout_secs: u64,
}

/// `lp2jira` subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Convert a directory of bug exports into one CSV file.
    Convert {
        /// Directory with one `<bug>.xml` export per bug. The CSV is written
        /// here too.
        #[arg(long)]
        dir: PathBuf,
        /// Output file name inside `--dir`.
        #[arg(long, default_value = DEFAULT_OUTPUT_NAME)]
        output: String,
        /// Jira project name.
        #[arg(long, default_value = "JIRA Project")]
        project_name: String,
        /// Jira project key.
        #[arg(long, default_value = "JIP")]
        project_key: String,
        /// URL where attachments and the export files are temporarily
        /// served during the import.
        #[arg(long, default_value = "http://tmp.example.org/")]
        attachments_url: String,
        /// Leave malformed bug exports out instead of aborting.
        #[arg(long)]
        skip_malformed: bool,
        /// Only emit the first N bugs (for trial imports).
        #[arg(long)]
        limit: Option<usize>,
        /// Jira account lookup settings.
        #[command(flatten)]
        jira: JiraArgs,
    },
    /// Resolve display names to Jira accounts and print the result as JSON.
    Resolve {
        /// Display names to look up.
        #[arg(required = true)]
        names: Vec<String>,
        /// Jira account lookup settings.
        #[command(flatten)]
        jira: JiraArgs,
    },
}
