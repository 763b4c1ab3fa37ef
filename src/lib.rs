//! LintShield: security lint rules over a language-neutral syntax tree.
//!
//! Parser front-ends (PHP/Blade, Java, JavaScript/TypeScript) hand over a
//! [`tree::SyntaxTree`]; the rule engine walks it once and reports
//! mass assignment, plaintext one-time secrets, unsanitized SVG/HTML output
//! and weak password recovery.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use lintshield::{config::Config, Scanner};
//!
//! let scanner = Scanner::new(&Config::load(Path::new(".lintshield.toml")).unwrap()).unwrap();
//! let report = scanner.scan_file(Path::new("build/UserController.tree.json")).unwrap();
//! println!("Pass: {}, Findings: {}", report.verdict.pass, report.findings.len());
//! ```

pub mod config;
pub mod error;
pub mod matchers;
pub mod rules;
pub mod tree;

use std::path::Path;

use serde::Serialize;

use config::Config;
use error::Result;
use rules::policy::{Policy, PolicyVerdict};
use rules::{Diagnostic, Finding, RuleEngine};
use tree::SyntaxTree;

/// Result of scanning one tree.
#[derive(Debug, Serialize)]
pub struct ScanReport {
    /// Findings left after the policy, in traversal order.
    pub findings: Vec<Finding>,
    pub diagnostics: Vec<Diagnostic>,
    pub verdict: PolicyVerdict,
}

/// Compiled rules plus the policy they are judged by.
///
/// Built once per configuration and shared freely; scanning takes `&self`.
pub struct Scanner {
    engine: RuleEngine,
    policy: Policy,
}

impl Scanner {
    pub fn new(config: &Config) -> Result<Self> {
        let engine = RuleEngine::from_config(&config.rules)?;
        let known: Vec<String> = engine.list_rules().into_iter().map(|m| m.id).collect();
        let policy_keys = config
            .policy
            .ignore_rules
            .iter()
            .chain(config.policy.overrides.keys());
        for key in policy_keys.filter(|k| !known.contains(k)) {
            tracing::warn!(rule = %key, "policy names a rule that is not registered, ignoring");
        }
        Ok(Self {
            engine,
            policy: config.policy.clone(),
        })
    }

    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    pub fn scan(&self, tree: &SyntaxTree) -> ScanReport {
        let outcome = self.engine.scan(tree);
        let verdict = self.policy.evaluate(&outcome.findings);
        let findings = self.policy.apply(&outcome.findings);

        tracing::info!(
            path = %tree.path.as_deref().map(|p| p.display().to_string()).unwrap_or_default(),
            nodes = tree.len(),
            findings = findings.len(),
            diagnostics = outcome.diagnostics.len(),
            pass = verdict.pass,
            "scan complete"
        );

        ScanReport {
            findings,
            diagnostics: outcome.diagnostics,
            verdict,
        }
    }

    /// Load a JSON tree exported by a parser front-end and scan it.
    pub fn scan_file(&self, path: &Path) -> Result<ScanReport> {
        let tree = SyntaxTree::load(path)?;
        Ok(self.scan(&tree))
    }
}

/// Scan with the built-in rules and the default policy.
pub fn scan(tree: &SyntaxTree) -> Result<ScanReport> {
    Ok(Scanner::new(&Config::default())?.scan(tree))
}
