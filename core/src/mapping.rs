//! Preload file for names the Jira user search cannot match, one
//! `display name,account` pair per line.

use std::path::Path;

use crate::error::ExportError;

/// Reads a mapping file.
pub fn load_mapping(path: &Path) -> Result<Vec<(String, String)>, ExportError> {
    let text = std::fs::read_to_string(path).map_err(|err| ExportError::io(path, err))?;
    Ok(parse_mapping(&text))
}

/// Parses mapping lines. The line is split at its first comma; blank lines
/// are ignored and lines without both sides are skipped with a warning.
pub fn parse_mapping(text: &str) -> Vec<(String, String)> {
    let mut entries = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((display_name, account)) = line.split_once(',') else {
            tracing::warn!("Skipping mapping line {}: no comma in {line:?}", index + 1);
            continue;
        };
        let (display_name, account) = (display_name.trim(), account.trim());
        if display_name.is_empty() || account.is_empty() {
            tracing::warn!("Skipping mapping line {}: empty side in {line:?}", index + 1);
            continue;
        }
        entries.push((display_name.to_string(), account.to_string()));
    }
    entries
}
