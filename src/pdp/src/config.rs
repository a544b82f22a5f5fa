//! Decision point configuration loading and validation
//!
//! Configuration can be written as TOML:
//!
//! ```toml
//! root_policies = ["urn:example:root"]
//! referenced_policies = ["urn:example:shared"]
//! parse_mode = "lenient"
//!
//! [[locations."urn:example:root"]]
//! file = "policies/root.json"
//!
//! [[locations."urn:example:shared"]]
//! url = "https://policies.example.com/shared.json"
//! ```
//!
//! or as the flat property surface (`xacml.rootPolicies`, `<id>.file`,
//! `<id>.url`, `xacml.pdp.lenient`), see [`PdpConfig::from_properties`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{PdpError, Result};
use crate::policy::ParseMode;

const PROPERTY_ROOT_POLICIES: &str = "xacml.rootPolicies";
const PROPERTY_REFERENCED_POLICIES: &str = "xacml.referencedPolicies";
const PROPERTY_LENIENT: &str = "xacml.pdp.lenient";

/// Where a policy document can be read from
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyLocation {
    File(PathBuf),
    Url(String),
}

/// Trace sink selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceMode {
    #[default]
    None,
    /// Forward trace events to `tracing`
    Log,
}

/// Complete decision point configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PdpConfig {
    #[serde(default)]
    pub root_policies: Vec<String>,

    #[serde(default)]
    pub referenced_policies: Vec<String>,

    /// Candidate locations per policy id, tried in order
    #[serde(default)]
    pub locations: BTreeMap<String, Vec<PolicyLocation>>,

    #[serde(default)]
    pub parse_mode: ParseMode,

    #[serde(default)]
    pub trace: TraceMode,

    /// Enforced by `PdpEngine::decide_async` only
    #[serde(default)]
    pub decision_timeout_ms: Option<u64>,

    #[serde(default = "default_http_timeout")]
    pub http_timeout_ms: u64,
}

fn default_http_timeout() -> u64 { 10_000 }

impl Default for PdpConfig {
    fn default() -> Self {
        Self {
            root_policies: Vec::new(),
            referenced_policies: Vec::new(),
            locations: BTreeMap::new(),
            parse_mode: ParseMode::default(),
            trace: TraceMode::default(),
            decision_timeout_ms: None,
            http_timeout_ms: default_http_timeout(),
        }
    }
}

impl PdpConfig {
    /// Parse TOML configuration
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: PdpConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    /// Parse the flat `key=value` property surface.
    ///
    /// Blank lines and lines starting with `#` or `!` are ignored. For an id
    /// with both a `.file` and a `.url` property the file is tried first.
    pub fn from_properties(contents: &str) -> Result<Self> {
        let mut config = PdpConfig::default();

        for (number, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            // Key ends at the first '=' or ':'
            let separator = line
                .find(['=', ':'])
                .ok_or_else(|| PdpError::Config(format!("Line {}: expected key=value", number + 1)))?;
            let key = line[..separator].trim();
            let value = line[separator + 1..].trim();

            match key {
                PROPERTY_ROOT_POLICIES => config.root_policies = split_list(value),
                PROPERTY_REFERENCED_POLICIES => config.referenced_policies = split_list(value),
                PROPERTY_LENIENT => {
                    let lenient: bool = value.parse().map_err(|_| {
                        PdpError::Config(format!("{} must be true or false, got \"{}\"", PROPERTY_LENIENT, value))
                    })?;
                    config.parse_mode = if lenient { ParseMode::Lenient } else { ParseMode::Strict };
                }
                _ => {
                    if let Some(id) = key.strip_suffix(".file") {
                        config.add_location(id, PolicyLocation::File(PathBuf::from(value)));
                    } else if let Some(id) = key.strip_suffix(".url") {
                        config.add_location(id, PolicyLocation::Url(value.to_string()));
                    }
                }
            }
        }

        // File before URL
        for locations in config.locations.values_mut() {
            locations.sort();
        }
        Ok(config)
    }

    pub fn add_location(&mut self, id: &str, location: PolicyLocation) {
        self.locations.entry(id.to_string()).or_default().push(location);
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        for id in self.root_policies.iter().chain(self.referenced_policies.iter()) {
            if self.locations.get(id).map_or(true, Vec::is_empty) {
                return Err(PdpError::Config(format!("No location configured for policy \"{}\"", id)));
            }
        }

        if self.decision_timeout_ms == Some(0) {
            return Err(PdpError::Config("decision_timeout_ms must be greater than zero".to_string()));
        }

        if self.http_timeout_ms == 0 {
            return Err(PdpError::Config("http_timeout_ms must be greater than zero".to_string()));
        }

        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    pub fn decision_timeout(&self) -> Option<Duration> {
        self.decision_timeout_ms.map(Duration::from_millis)
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_properties() {
        let config = PdpConfig::from_properties(
            "# policies\n\
             xacml.rootPolicies = root, other\n\
             xacml.referencedPolicies=shared\n\
             root.url=https://example.com/root.json\n\
             root.file=/etc/pdp/root.json\n\
             other.file=other.json\n\
             shared.file=shared.json\n\
             xacml.pdp.lenient=true\n",
        )
        .unwrap();

        assert_eq!(config.root_policies, vec!["root", "other"]);
        assert_eq!(config.referenced_policies, vec!["shared"]);
        assert_eq!(config.parse_mode, ParseMode::Lenient);
        assert_eq!(
            config.locations["root"],
            vec![
                PolicyLocation::File(PathBuf::from("/etc/pdp/root.json")),
                PolicyLocation::Url("https://example.com/root.json".to_string()),
            ]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_missing_location() {
        let config = PdpConfig {
            root_policies: vec!["root".to_string()],
            ..PdpConfig::default()
        };
        assert!(matches!(config.validate(), Err(PdpError::Config(_))));
    }

    #[test]
    fn test_from_toml() {
        let config = PdpConfig::from_toml_str(
            r#"
            root_policies = ["root"]
            parse_mode = "lenient"
            trace = "log"
            decision_timeout_ms = 250

            [[locations.root]]
            file = "root.json"
            "#,
        )
        .unwrap();

        assert_eq!(config.parse_mode, ParseMode::Lenient);
        assert_eq!(config.trace, TraceMode::Log);
        assert_eq!(config.decision_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(config.http_timeout_ms, 10_000);
        assert_eq!(config.locations["root"], vec![PolicyLocation::File(PathBuf::from("root.json"))]);
    }

    #[test]
    fn test_properties_split_on_first_separator() {
        let config = PdpConfig::from_properties(
            "xacml.rootPolicies:root\n\
             root.file:policies/a=b.json\n\
             root.url=https://example.com/root.json\n\
             xacml.referencedPolicies:shared=v2\n",
        )
        .unwrap();

        assert_eq!(config.root_policies, vec!["root"]);
        assert_eq!(config.referenced_policies, vec!["shared=v2"]);
        assert_eq!(
            config.locations["root"],
            vec![
                PolicyLocation::File(PathBuf::from("policies/a=b.json")),
                PolicyLocation::Url("https://example.com/root.json".to_string()),
            ]
        );
    }

    #[test]
    fn test_invalid_lenient_flag() {
        assert!(PdpConfig::from_properties("xacml.pdp.lenient=maybe").is_err());
    }
}
