//! Display name to Jira account resolution.
//!
//! Launchpad only exports free-text display names. Jira needs account names
//! to link comments, owners and assignees to real users, so every name goes
//! through [`NameResolver`]: the preload mapping and earlier answers are
//! consulted first, the Jira user search only once per distinct name.

use std::{
    collections::{BTreeSet, HashMap},
    time::Duration,
};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use thiserror::Error;

/// Default per-request timeout for the Jira user search.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(30);

const USER_SEARCH_PATH: &str = "rest/api/latest/user/search";

/// One candidate returned by the user search.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryUser {
    /// Account name, the value the importer understands.
    pub name: String,
    /// Full display name.
    #[serde(default)]
    pub display_name: Option<String>,
    /// E-mail address.
    #[serde(default)]
    pub email_address: Option<String>,
    /// Whether the account is enabled.
    #[serde(default)]
    pub active: Option<bool>,
}

/// Failure of a single remote lookup.
#[derive(Debug, Error)]
pub enum LookupError {
    /// Connection, timeout or body read failure.
    #[error("user search request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// Non-success HTTP status.
    #[error("user search returned HTTP {0}")]
    Status(reqwest::StatusCode),
    /// Body is not a JSON array of users.
    #[error("user search returned an unexpected body: {0}")]
    Decode(#[from] serde_json::Error),
    /// Credentials cannot be put into a header.
    #[error("credentials cannot be encoded into an Authorization header")]
    Credentials,
}

/// Remote user directory searched by display name.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Candidates for `display_name`, best match first. An empty list means
    /// no match.
    async fn search(&self, display_name: &str) -> Result<Vec<DirectoryUser>, LookupError>;
}

/// Jira's `user/search` REST endpoint with Basic authentication.
pub struct JiraUserDirectory {
    client: reqwest::Client,
    search_url: String,
}

impl JiraUserDirectory {
    /// Builds a client for the Jira server at `base_url`. The Authorization
    /// header is computed once here and sent with every search.
    pub fn new(
        base_url: &str,
        username: &str,
        password: &str,
        timeout: Duration,
    ) -> Result<Self, LookupError> {
        let credentials = STANDARD.encode(format!("{username}:{password}"));
        let mut authorization = HeaderValue::from_str(&format!("Basic {credentials}"))
            .map_err(|_| LookupError::Credentials)?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            search_url: format!("{}/{USER_SEARCH_PATH}", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl UserDirectory for JiraUserDirectory {
    async fn search(&self, display_name: &str) -> Result<Vec<DirectoryUser>, LookupError> {
        let response = self
            .client
            .get(&self.search_url)
            .query(&[("username", display_name)])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status));
        }
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Directory that never matches. Runs without credentials rely on the
/// preload mapping alone.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineDirectory;

#[async_trait]
impl UserDirectory for OfflineDirectory {
    async fn search(&self, _display_name: &str) -> Result<Vec<DirectoryUser>, LookupError> {
        Ok(Vec::new())
    }
}

/// Counters for one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResolverStats {
    /// Remote searches issued.
    pub lookups: usize,
    /// Answers served from the positive or negative cache.
    pub cache_hits: usize,
}

/// Resolves display names to account names, caching every outcome.
///
/// Both caches only grow during a run and are never written back anywhere.
/// A name that failed once, for whatever reason, is not searched again.
pub struct NameResolver {
    directory: Box<dyn UserDirectory>,
    resolved: HashMap<String, String>,
    unmatched: BTreeSet<String>,
    stats: ResolverStats,
}

impl NameResolver {
    /// Resolver backed by `directory`, with empty caches.
    pub fn new(directory: impl UserDirectory + 'static) -> Self {
        Self {
            directory: Box::new(directory),
            resolved: HashMap::new(),
            unmatched: BTreeSet::new(),
            stats: ResolverStats::default(),
        }
    }

    /// Seeds the positive cache. Later entries win.
    pub fn preload<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (display_name, account) in entries {
            tracing::debug!("Mapping {display_name} to {account}");
            self.resolved.insert(display_name, account);
        }
    }

    /// Account name for `display_name`, or `None` when it cannot be
    /// resolved. Never fails: empty results, bad responses and transport
    /// errors all end up as `None`.
    pub async fn resolve(&mut self, display_name: &str) -> Option<String> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return None;
        }

        if self.unmatched.contains(display_name) {
            self.stats.cache_hits += 1;
            return None;
        }
        if let Some(account) = self.resolved.get(display_name) {
            self.stats.cache_hits += 1;
            return Some(account.clone());
        }

        self.stats.lookups += 1;
        match self.directory.search(display_name).await {
            Ok(candidates) => {
                if let Some(best) = candidates.into_iter().next() {
                    tracing::debug!("Resolved {display_name} to {}", best.name);
                    self.resolved
                        .insert(display_name.to_string(), best.name.clone());
                    return Some(best.name);
                }
            },
            Err(err) => {
                tracing::warn!("User search for {display_name} failed: {err}");
            },
        }

        tracing::info!("... unmatched {display_name}");
        self.unmatched.insert(display_name.to_string());
        None
    }

    /// Every name that could not be resolved, sorted.
    pub fn unmatched_names(&self) -> Vec<String> {
        self.unmatched.iter().cloned().collect()
    }

    /// Number of names in the positive cache.
    pub fn resolved_count(&self) -> usize {
        self.resolved.len()
    }

    /// Lookup and cache-hit counters.
    pub fn stats(&self) -> ResolverStats {
        self.stats
    }
}
