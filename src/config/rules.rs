//! Name lists and patterns used by the built-in rules.
//!
//! These are data: every field can be overridden from `.lintshield.toml`
//! to tune false-positive rates without touching rule logic. Regex fields
//! are compiled case-insensitively.

use serde::{Deserialize, Serialize};

use crate::error::{LintError, Result};

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Per-rule settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub mass_assignment: MassAssignmentConfig,
    pub plaintext_secret: PlaintextSecretConfig,
    pub unsafe_markup: UnsafeMarkupConfig,
    pub insecure_recovery: InsecureRecoveryConfig,
}

impl RulesConfig {
    /// Reject enabled rules whose core pattern or list was overridden empty.
    pub fn validate(&self) -> Result<()> {
        let required = [
            (
                self.mass_assignment.enabled && self.mass_assignment.persistence_methods.is_empty(),
                "rules.mass_assignment.persistence_methods",
            ),
            (
                self.plaintext_secret.enabled && self.plaintext_secret.secret_pattern.trim().is_empty(),
                "rules.plaintext_secret.secret_pattern",
            ),
            (
                self.unsafe_markup.enabled && self.unsafe_markup.svg_pattern.trim().is_empty(),
                "rules.unsafe_markup.svg_pattern",
            ),
            (
                self.insecure_recovery.enabled
                    && self.insecure_recovery.recovery_pattern.trim().is_empty(),
                "rules.insecure_recovery.recovery_pattern",
            ),
        ];
        match required.iter().find(|(missing, _)| *missing) {
            Some((_, key)) => Err(LintError::Config(format!(
                "{key} must not be empty while the rule is enabled"
            ))),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MassAssignmentConfig {
    pub enabled: bool,
    /// Model methods that bind an attribute array.
    pub persistence_methods: Vec<String>,
    /// Request methods that return the whole input bag.
    pub bulk_input_methods: Vec<String>,
    /// Variable-name fragments that suggest an unfiltered request.
    pub input_variable_hints: Vec<String>,
}

impl Default for MassAssignmentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            persistence_methods: words(&["create", "fill", "update"]),
            bulk_input_methods: words(&["all", "input"]),
            input_variable_hints: words(&["request", "input"]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaintextSecretConfig {
    pub enabled: bool,
    /// Regex for secret keys and variable names.
    pub secret_pattern: String,
    pub orm_methods: Vec<String>,
    pub storage_methods: Vec<String>,
    /// Receiver fragments naming a sensitive store (`Cache::put`, `$session->set`).
    pub sensitive_receivers: Vec<String>,
    /// Bare functions that persist their arguments (`setcookie`, `file_put_contents`).
    pub storage_functions: Vec<String>,
    /// Assignment targets that persist the assigned value (`document.cookie`).
    pub cookie_targets: Vec<String>,
    pub log_methods: Vec<String>,
    /// Fragments marking an indexed session write (`$_SESSION['otp']`).
    pub session_indicators: Vec<String>,
    /// Callee fragments marking a raw query call.
    pub query_callees: Vec<String>,
    /// SQL fragments marking a write statement.
    pub sql_write_markers: Vec<String>,
    /// Callee fragments that mean the value is protected.
    pub hash_functions: Vec<String>,
    /// SQL fragments that mean the stored value is hashed in the query.
    pub sql_hash_functions: Vec<String>,
    /// Also check array literals that are not a storage call argument.
    pub check_standalone_arrays: bool,
}

impl Default for PlaintextSecretConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            secret_pattern:
                r"\botp\b|one[-_\s]?time[-_\s]?password|verification[-_\s]?code|auth[-_\s]?code"
                    .into(),
            orm_methods: words(&["create", "insert", "save", "update", "execute"]),
            storage_methods: words(&[
                "put", "set", "add", "remember", "forever", "store", "setItem",
            ]),
            sensitive_receivers: words(&[
                "db", "database", "session", "cache", "redis", "cookie", "storage", "log",
            ]),
            storage_functions: words(&["setcookie", "file_put_contents"]),
            cookie_targets: words(&["document.cookie"]),
            log_methods: words(&["log", "info", "error", "debug", "warning", "error_log"]),
            session_indicators: words(&["_session", "session"]),
            query_callees: words(&["query", "exec", "execute"]),
            sql_write_markers: words(&["insert into", "update"]),
            hash_functions: words(&["hash", "bcrypt", "password_hash", "encrypt", "make"]),
            sql_hash_functions: words(&["hash", "bcrypt", "crypt"]),
            check_standalone_arrays: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UnsafeMarkupConfig {
    pub enabled: bool,
    pub svg_pattern: String,
    pub dangerous_svg_pattern: String,
    /// Methods that output their argument without escaping.
    pub unsafe_output_methods: Vec<String>,
    /// Templating render entry points.
    pub render_methods: Vec<String>,
    pub sanitizers: Vec<String>,
    /// Fragments that mark a value as user-controlled.
    pub user_input_hints: Vec<String>,
    /// Assignment-target fragments that render markup.
    pub markup_targets: Vec<String>,
    /// Markers of embedded dynamic content inside raw markup.
    pub dynamic_content_markers: Vec<String>,
}

impl Default for UnsafeMarkupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            svg_pattern: r"<\s*svg|\bsvg\b|image/svg\+xml|\.svg\b".into(),
            dangerous_svg_pattern:
                r"<\s*script|<\s*foreignObject|<\s*use\s+xlink:href|<\s*handler|<\s*event".into(),
            unsafe_output_methods: words(&[
                "html",
                "rawSvg",
                "raw",
                "unescape",
                "dangerouslySetInnerHTML",
                "innerHTML",
            ]),
            render_methods: words(&["render"]),
            sanitizers: words(&[
                "sanitize",
                "DOMPurify",
                "purify",
                "clean",
                "escape",
                "htmlspecialchars",
                "strip_tags",
            ]),
            user_input_hints: words(&["$_", "request", "input", "props", "param", "event.target"]),
            markup_targets: words(&["innerhtml", "html", "svg"]),
            dynamic_content_markers: words(&["<?php", "<?=", "{"]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InsecureRecoveryConfig {
    pub enabled: bool,
    pub recovery_pattern: String,
    /// Fragments that put a class or method in scope.
    pub recovery_names: Vec<String>,
    /// Extra fragments that put only a method in scope.
    pub recovery_method_names: Vec<String>,
    pub security_question_pattern: String,
    /// Matched against identifier words (`generateTOTP` reads as `generate TOTP`).
    pub secure_mechanism_pattern: String,
    pub secure_libraries: Vec<String>,
    /// Method-name fragments of plain "email a link" resets.
    pub simple_email_reset_indicators: Vec<String>,
}

impl Default for InsecureRecoveryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            recovery_pattern: r"reset[\s_]*password|forgot[\s_]*password|recover[\s_]*password|password[\s_]*recovery".into(),
            recovery_names: words(&[
                "forgotpassword",
                "resetpassword",
                "passwordreset",
                "accountrecovery",
            ]),
            recovery_method_names: words(&["sendrecovery"]),
            security_question_pattern:
                r"security[\s_]*question|secret[\s_]*question|mother[\s_]*maiden|birth[\s_]*place|first[\s_]*pet"
                    .into(),
            secure_mechanism_pattern:
                r"\b(?:two\s?factor|2\s?fa|mfa|multi\s?factor|otp|totp|hotp|authenticator|time\s?based?)"
                    .into(),
            secure_libraries: words(&[
                "totp",
                "googleauthenticator",
                "totputils",
                "otputil",
                "twofactorauthentication",
                "webauthn",
                "pushnotification",
                "timebased",
                "speakeasy",
            ]),
            simple_email_reset_indicators: words(&[
                "sendpasswordresetemail",
                "forgotpasswordemail",
                "resetlink",
                "passwordresettoken",
                "generateresettoken",
            ]),
        }
    }
}
