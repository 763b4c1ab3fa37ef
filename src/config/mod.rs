pub mod rules;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::rules::policy::Policy;

pub use rules::{
    InsecureRecoveryConfig, MassAssignmentConfig, PlaintextSecretConfig, RulesConfig,
    UnsafeMarkupConfig,
};

/// Top-level configuration from `.lintshield.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub policy: Policy,
    #[serde(default)]
    pub rules: RulesConfig,
}

impl Config {
    /// Load config from a TOML file. Returns default if file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.rules.validate()?;
        Ok(config)
    }

    /// Generate a starter config file.
    pub fn starter_toml() -> &'static str {
        r#"# lintshield configuration

[policy]
# Minimum severity to fail the scan (info, low, medium, high, critical).
fail_on = "high"

# Rule keys to ignore entirely.
# ignore_rules = ["unsafe-markup"]

# Drop potential findings below this confidence (low, medium, high).
# min_confidence = "medium"

# Per-rule severity overrides.
# [policy.overrides]
# "insecure-recovery" = "low"

# Every name list below replaces the built-in default when set.

[rules.mass_assignment]
enabled = true
# persistence_methods = ["create", "fill", "update"]

[rules.plaintext_secret]
enabled = true
# secret_pattern = '\botp\b|one[-_\s]?time[-_\s]?password|verification[-_\s]?code'
# storage_functions = ["setcookie", "file_put_contents"]
# cookie_targets = ["document.cookie"]

[rules.unsafe_markup]
enabled = true
# sanitizers = ["sanitize", "DOMPurify", "htmlspecialchars"]

[rules.insecure_recovery]
enabled = true
# secure_libraries = ["totp", "googleauthenticator", "webauthn"]
"#
    }
}
