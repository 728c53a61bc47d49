//! `resolve`: look names up without converting anything.

use anyhow::Result;
use serde::Serialize;

use super::build_resolver;
use crate::cli::JiraArgs;

#[derive(Debug, Serialize)]
struct Resolution {
    name: String,
    account: Option<String>,
}

/// Resolves each name and prints `{ name, account }` pairs as JSON.
pub async fn run(names: &[String], jira: &JiraArgs) -> Result<()> {
    let mut resolver = build_resolver(jira)?;

    let mut results = Vec::with_capacity(names.len());
    for name in names {
        let account = resolver.resolve(name).await;
        results.push(Resolution {
            name: name.clone(),
            account,
        });
    }

    print_json(&results)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
