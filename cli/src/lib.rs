//! Command-line front end of the Launchpad to Jira CSV converter.

/// Argument definitions.
pub mod cli;
pub mod commands;
