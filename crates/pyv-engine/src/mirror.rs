//! Version discovery against the release mirror.
//!
//! The mirror root is an HTML directory listing; versions are scraped out
//! of the raw body with a pattern match rather than a structured parse.
//! That is fragile against mirror layout changes, but the contract is only
//! "extract, dedupe, filter by minimum, order".

use log::debug;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use pyv_core::{EngineError, MIN_LEGAL_VERSION, PythonVersion, STABLE_CUTOVER};

static VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+\.[0-9]+\.[0-9]+").expect("version pattern is valid"));

/// Fetches and orders the set of publishable versions from the mirror.
#[derive(Debug, Clone)]
pub struct RemoteIndex {
    client: reqwest::Client,
    mirror: String,
}

impl RemoteIndex {
    #[must_use]
    pub fn new(client: reqwest::Client, mirror: String) -> Self {
        Self { client, mirror }
    }

    /// Fetch the catalog: ordered ascending, deduplicated, and filtered to
    /// versions at or above the minimum legal version.
    ///
    /// # Errors
    /// Returns an error when the listing request fails or the mirror
    /// responds with a non-success status.
    pub async fn fetch(&self) -> Result<Vec<PythonVersion>, EngineError> {
        debug!("fetching version listing from {}", self.mirror);
        let response = self
            .client
            .get(&self.mirror)
            .send()
            .await
            .map_err(|error| EngineError::network_from("mirror listing", error))?;

        if !response.status().is_success() {
            return Err(EngineError::network(
                "mirror listing",
                format!("HTTP {}", response.status()),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|error| EngineError::network_from("mirror listing", error))?;

        Ok(scrape_versions(&body))
    }

    /// # Errors
    /// Returns an error when the listing fails or contains no versions.
    pub async fn latest(&self) -> Result<PythonVersion, EngineError> {
        let catalog = self.fetch().await?;
        catalog.last().copied().ok_or_else(|| {
            EngineError::network("mirror listing", "listing contained no versions")
        })
    }

    /// # Errors
    /// Returns an error when the listing fails or every entry is at or
    /// above the feature cutover.
    pub async fn stable(&self) -> Result<PythonVersion, EngineError> {
        let catalog = self.fetch().await?;
        stable_of(&catalog)
    }
}

fn scrape_versions(body: &str) -> Vec<PythonVersion> {
    let mut versions = BTreeSet::new();
    for found in VERSION_PATTERN.find_iter(body) {
        let Ok(version) = found.as_str().parse::<PythonVersion>() else {
            continue;
        };
        if version >= MIN_LEGAL_VERSION {
            versions.insert(version);
        }
    }
    versions.into_iter().collect()
}

/// The greatest catalog entry strictly below the feature cutover.
fn stable_of(catalog: &[PythonVersion]) -> Result<PythonVersion, EngineError> {
    catalog
        .iter()
        .rev()
        .find(|version| **version < STABLE_CUTOVER)
        .copied()
        .ok_or(EngineError::NoStableVersion)
}
