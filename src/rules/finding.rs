use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::tree::{NodeId, NodeRef, SourceLocation};

/// Longest snippet copied from the anchor node.
const SNIPPET_MAX_CHARS: usize = 160;

/// A security finding produced by a rule check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Stable rule key (e.g., "mass-assignment").
    pub rule_id: String,
    /// Human-readable rule name.
    pub rule_name: String,
    pub severity: Severity,
    /// How certain we are this is a real issue.
    pub confidence: Confidence,
    pub category: RuleCategory,
    pub message: String,
    /// Node the finding is attached to, in the scanned tree.
    pub anchor: NodeId,
    /// Primary source location (when the parser recorded spans).
    pub location: Option<SourceLocation>,
    /// Rendered text of the anchor, truncated.
    pub snippet: Option<String>,
    /// Related nodes supporting the finding.
    pub evidence: Vec<Evidence>,
    /// Suggested remediation.
    pub remediation: Option<String>,
    pub cwe_id: Option<String>,
}

impl Finding {
    /// Start a finding for `meta` anchored on `anchor`.
    pub fn new(meta: &RuleMetadata, anchor: NodeRef<'_>, message: impl Into<String>) -> Self {
        Self {
            rule_id: meta.id.clone(),
            rule_name: meta.name.clone(),
            severity: meta.default_severity,
            confidence: Confidence::High,
            category: meta.category,
            message: message.into(),
            anchor: anchor.id(),
            location: anchor.tree().location(anchor.id()),
            snippet: snippet(anchor.text()),
            evidence: Vec::new(),
            remediation: None,
            cwe_id: meta.cwe_id.clone(),
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_remediation(mut self, remediation: impl Into<String>) -> Self {
        self.remediation = Some(remediation.into());
        self
    }

    pub fn with_evidence(mut self, description: impl Into<String>, node: NodeRef<'_>) -> Self {
        self.evidence.push(Evidence {
            description: description.into(),
            node: node.id(),
            location: node.tree().location(node.id()),
            snippet: snippet(node.text()),
        });
        self
    }

    /// Hex SHA-256 over rule, file, anchor and message. Stable across runs
    /// on an unchanged tree, so hosts can deduplicate.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.rule_id.as_bytes());
        hasher.update([0]);
        if let Some(loc) = &self.location {
            hasher.update(loc.file.to_string_lossy().as_bytes());
        }
        hasher.update([0]);
        hasher.update(self.anchor.index().to_le_bytes());
        hasher.update(self.message.as_bytes());
        hex::encode(hasher.finalize())
    }
}

fn snippet(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.chars().count() <= SNIPPET_MAX_CHARS {
        return Some(trimmed.to_string());
    }
    let mut cut: String = trimmed.chars().take(SNIPPET_MAX_CHARS).collect();
    cut.push_str("...");
    Some(cut)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCategory {
    MassAssignment,
    SensitiveDataExposure,
    CrossSiteScripting,
    WeakAuthentication,
}

impl std::fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MassAssignment => write!(f, "Mass Assignment"),
            Self::SensitiveDataExposure => write!(f, "Sensitive Data Exposure"),
            Self::CrossSiteScripting => write!(f, "Cross-Site Scripting"),
            Self::WeakAuthentication => write!(f, "Weak Authentication"),
        }
    }
}

/// Evidence supporting a finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub description: String,
    pub node: NodeId,
    pub location: Option<SourceLocation>,
    pub snippet: Option<String>,
}

/// Metadata about a rule, handed to the host for registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleMetadata {
    pub id: String,
    pub name: String,
    pub description: String,
    pub default_severity: Severity,
    pub category: RuleCategory,
    pub cwe_id: Option<String>,
}
