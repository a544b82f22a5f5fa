//! Loading policy documents from configured locations
//!
//! Documents are fetched concurrently: `file` locations with `tokio::fs`,
//! `url` locations with `reqwest`. Turning bytes into a policy tree is the
//! job of an external [`PolicyLoader`].

use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::StdPolicyFinder;
use crate::config::{PdpConfig, PolicyLocation};
use crate::error::{PdpError, Result};
use crate::policy::{ParseMode, PolicyDef};
use crate::status::Status;

/// Parses a serialized policy document into a policy tree
pub trait PolicyLoader: Send + Sync {
    fn load(&self, document: &[u8], mode: ParseMode) -> Result<PolicyDef>;
}

/// Root and referenced policies loaded from configuration
#[derive(Debug, Default)]
pub struct PolicyRepository {
    pub roots: Vec<Arc<PolicyDef>>,
    pub referenced: Vec<Arc<PolicyDef>>,
}

impl PolicyRepository {
    /// Load every configured policy.
    ///
    /// A policy whose locations all fail is logged and skipped. A document
    /// the loader rejects becomes a placeholder that evaluates to
    /// Indeterminate with a syntax-error status.
    pub async fn load(config: &PdpConfig, loader: &dyn PolicyLoader) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder().timeout(config.http_timeout()).build()?;

        let (roots, referenced) = futures::join!(
            load_all(&config.root_policies, config, &client, loader),
            load_all(&config.referenced_policies, config, &client, loader),
        );

        info!(
            "Loaded {} root and {} referenced policies",
            roots.len(),
            referenced.len()
        );
        Ok(Self { roots, referenced })
    }

    /// Finder over the loaded policies
    pub fn into_finder(self) -> StdPolicyFinder {
        StdPolicyFinder::new(self.roots, self.referenced)
    }
}

async fn load_all(
    ids: &[String],
    config: &PdpConfig,
    client: &reqwest::Client,
    loader: &dyn PolicyLoader,
) -> Vec<Arc<PolicyDef>> {
    let fetches = ids.iter().map(|id| async move {
        let locations = config.locations.get(id).map(Vec::as_slice).unwrap_or_default();
        (id, fetch_first(id, locations, client).await)
    });

    join_all(fetches)
        .await
        .into_iter()
        .filter_map(|(id, document)| match document {
            Ok(bytes) => Some(Arc::new(parse_document(id, &bytes, config.parse_mode, loader))),
            Err(e) => {
                warn!("Skipping policy {}: {}", id, e);
                None
            }
        })
        .collect()
}

fn parse_document(id: &str, bytes: &[u8], mode: ParseMode, loader: &dyn PolicyLoader) -> PolicyDef {
    match loader.load(bytes, mode) {
        Ok(policy) => {
            debug!("Loaded policy {} as {}", id, policy.id());
            policy
        }
        Err(e) => {
            warn!("Policy {} failed to load: {}", id, e);
            PolicyDef::placeholder(id, Status::syntax_error(e.to_string()))
        }
    }
}

/// Fetch the first location that yields a document
async fn fetch_first(id: &str, locations: &[PolicyLocation], client: &reqwest::Client) -> Result<Vec<u8>> {
    let mut last_error = None;
    for location in locations {
        match fetch(location, client).await {
            Ok(bytes) => return Ok(bytes),
            Err(e) => {
                debug!("Location {:?} for {} failed: {}", location, id, e);
                last_error = Some(e);
            }
        }
    }
    Err(last_error.unwrap_or_else(|| PdpError::PolicyLocation(format!("No location for policy \"{}\"", id))))
}

async fn fetch(location: &PolicyLocation, client: &reqwest::Client) -> Result<Vec<u8>> {
    match location {
        PolicyLocation::File(path) => Ok(tokio::fs::read(path).await?),
        PolicyLocation::Url(url) => {
            // The response body is consumed or dropped before returning,
            // which releases the connection.
            let response = client.get(url).send().await?.error_for_status()?;
            Ok(response.bytes().await?.to_vec())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::PolicyBuilder;
    use std::io::Write;

    struct IdLoader;

    impl PolicyLoader for IdLoader {
        fn load(&self, document: &[u8], mode: ParseMode) -> Result<PolicyDef> {
            let text = std::str::from_utf8(document).map_err(|e| PdpError::Load(e.to_string()))?;
            if text.trim().is_empty() {
                return Err(PdpError::Syntax("empty document".to_string()));
            }
            Ok(PolicyBuilder::new(text.trim(), mode).build()?.into())
        }
    }

    #[tokio::test]
    async fn test_load_from_files() {
        let mut good = tempfile::NamedTempFile::new().unwrap();
        write!(good, "urn:test:root").unwrap();
        let empty = tempfile::NamedTempFile::new().unwrap();

        let mut config = PdpConfig {
            root_policies: vec!["root".to_string(), "broken".to_string()],
            ..PdpConfig::default()
        };
        config.add_location("root", PolicyLocation::File(good.path().to_path_buf()));
        config.add_location("broken", PolicyLocation::File(empty.path().to_path_buf()));

        let repository = PolicyRepository::load(&config, &IdLoader).await.unwrap();
        assert_eq!(repository.roots.len(), 2);
        assert_eq!(repository.roots[0].id().as_str(), "urn:test:root");
        assert!(repository.roots[0].load_status().is_none());
        assert!(repository.roots[1].load_status().is_some());
    }

    #[tokio::test]
    async fn test_unreadable_location_is_skipped() {
        let mut config = PdpConfig {
            root_policies: vec!["missing".to_string()],
            ..PdpConfig::default()
        };
        config.add_location("missing", PolicyLocation::File("/nonexistent/policy.json".into()));

        let repository = PolicyRepository::load(&config, &IdLoader).await.unwrap();
        assert!(repository.roots.is_empty());
    }
}
