//! Configuration and policy repository tests over real files

use cretoai_pdp::config::{PolicyLocation, TraceMode};
use cretoai_pdp::error::{PdpError, Result};
use cretoai_pdp::finder::PolicyLoader;
use cretoai_pdp::identifier::{POLICY_FIRST_APPLICABLE, RULE_DENY_OVERRIDES};
use cretoai_pdp::policy::{IdReference, PolicyBuilder, PolicySetBuilder, RuleBuilder};
use cretoai_pdp::status::StatusCode;
use cretoai_pdp::{Decision, Effect, ParseMode, PdpConfig, PdpEngine, PolicyDef, Request};
use std::io::Write;
use std::path::Path;
use tempfile::{NamedTempFile, TempDir};

/// Line format:
/// - `policy <id> <permit|deny>`
/// - `set <id> <referenced-policy-id>`
struct LineLoader;

impl PolicyLoader for LineLoader {
    fn load(&self, document: &[u8], mode: ParseMode) -> Result<PolicyDef> {
        let text = std::str::from_utf8(document).map_err(|e| PdpError::Load(e.to_string()))?;
        let parts: Vec<&str> = text.split_whitespace().collect();
        match parts.as_slice() {
            ["policy", id, effect] => {
                let effect = match *effect {
                    "permit" => Effect::Permit,
                    "deny" => Effect::Deny,
                    other => return Err(PdpError::Syntax(format!("Unknown effect \"{}\"", other))),
                };
                let rule = RuleBuilder::new("only", effect, mode).build()?;
                Ok(PolicyBuilder::new(*id, mode)
                    .combining_algorithm(&RULE_DENY_OVERRIDES)?
                    .rule(rule)
                    .build()?
                    .into())
            }
            ["set", id, reference] => Ok(PolicySetBuilder::new(*id, mode)
                .combining_algorithm(&POLICY_FIRST_APPLICABLE)?
                .policy_reference(IdReference::new(*reference))
                .build()?
                .into()),
            _ => Err(PdpError::Syntax(format!("Unrecognized document \"{}\"", text.trim()))),
        }
    }
}

fn write_document(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

// ============================================================================
// ENGINE FROM CONFIGURATION
// ============================================================================

#[tokio::test]
async fn test_engine_from_file_locations() {
    let dir = TempDir::new().unwrap();
    let root = write_document(dir.path(), "root.policy", "set urn:test:root urn:test:shared");
    let shared = write_document(dir.path(), "shared.policy", "policy urn:test:shared permit");

    let mut config = PdpConfig {
        root_policies: vec!["root".to_string()],
        referenced_policies: vec!["shared".to_string()],
        ..PdpConfig::default()
    };
    config.add_location("root", PolicyLocation::File(root));
    config.add_location("shared", PolicyLocation::File(shared));

    let engine = PdpEngine::from_config(&config, &LineLoader).await.unwrap();
    let response = engine.decide(&Request::new().with_return_policy_id_list(true));

    assert_eq!(response.decision(), Decision::Permit);
    let ids: Vec<&str> = response
        .result
        .policy_identifiers
        .iter()
        .map(|identifier| identifier.id.as_str())
        .collect();
    assert_eq!(ids, vec!["urn:test:root", "urn:test:shared"]);
}

#[tokio::test]
async fn test_rejected_root_document_is_indeterminate() {
    let dir = TempDir::new().unwrap();
    let root = write_document(dir.path(), "root.policy", "policy urn:test:root maybe");

    let mut config = PdpConfig {
        root_policies: vec!["root".to_string()],
        ..PdpConfig::default()
    };
    config.add_location("root", PolicyLocation::File(root));

    let engine = PdpEngine::from_config(&config, &LineLoader).await.unwrap();
    let response = engine.decide(&Request::new());

    assert_eq!(response.decision(), Decision::Indeterminate);
    assert_eq!(response.status().code, StatusCode::SyntaxError);
}

#[tokio::test]
async fn test_no_loadable_root_fails() {
    let mut config = PdpConfig {
        root_policies: vec!["root".to_string()],
        ..PdpConfig::default()
    };
    config.add_location("root", PolicyLocation::File("/nonexistent/root.policy".into()));

    let result = PdpEngine::from_config(&config, &LineLoader).await;
    assert!(matches!(result, Err(PdpError::PolicyNotFound(_))));
}

#[tokio::test]
async fn test_first_readable_location_wins() {
    let dir = TempDir::new().unwrap();
    let fallback = write_document(dir.path(), "fallback.policy", "policy urn:test:root deny");

    let mut config = PdpConfig {
        root_policies: vec!["root".to_string()],
        ..PdpConfig::default()
    };
    config.add_location("root", PolicyLocation::File(dir.path().join("missing.policy")));
    config.add_location("root", PolicyLocation::File(fallback));

    let engine = PdpEngine::from_config(&config, &LineLoader).await.unwrap();
    assert_eq!(engine.decide(&Request::new()).decision(), Decision::Deny);
}

#[tokio::test]
async fn test_missing_location_rejected() {
    let config = PdpConfig {
        root_policies: vec!["root".to_string()],
        ..PdpConfig::default()
    };

    let result = PdpEngine::from_config(&config, &LineLoader).await;
    assert!(matches!(result, Err(PdpError::Config(_))));
}

// ============================================================================
// CONFIGURATION FILES
// ============================================================================

#[tokio::test]
async fn test_properties_surface_end_to_end() {
    let dir = TempDir::new().unwrap();
    let root = write_document(dir.path(), "root.policy", "policy urn:test:root permit");

    let properties = format!(
        "# decision point\nxacml.rootPolicies=root\nxacml.pdp.lenient=true\nroot.url=http://127.0.0.1:9/root\nroot.file={}\n",
        root.display()
    );
    let config = PdpConfig::from_properties(&properties).unwrap();
    assert_eq!(config.parse_mode, ParseMode::Lenient);
    assert!(matches!(config.locations["root"][0], PolicyLocation::File(_)));

    let engine = PdpEngine::from_config(&config, &LineLoader).await.unwrap();
    assert_eq!(engine.decide(&Request::new()).decision(), Decision::Permit);
}

#[test]
fn test_toml_config_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
root_policies = ["root"]
trace = "log"
decision_timeout_ms = 250

[[locations.root]]
file = "policies/root.policy"
"#
    )
    .unwrap();

    let config = PdpConfig::from_file(file.path()).unwrap();
    assert_eq!(config.root_policies, vec!["root"]);
    assert_eq!(config.trace, TraceMode::Log);
    assert_eq!(config.decision_timeout(), Some(std::time::Duration::from_millis(250)));
    assert_eq!(config.http_timeout_ms, 10_000);
    assert!(config.validate().is_ok());
}
