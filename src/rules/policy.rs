use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::{Confidence, Finding, Severity};

/// Policy verdict: the pass/fail decision after applying the ignore list,
/// confidence floor and severity overrides to raw findings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyVerdict {
    pub pass: bool,
    pub total_findings: usize,
    pub effective_findings: usize,
    pub highest_severity: Option<Severity>,
    pub fail_threshold: Severity,
    /// Effective findings per rule key.
    pub by_rule: BTreeMap<String, usize>,
}

/// Policy section of `.lintshield.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    /// Minimum severity to fail the scan.
    #[serde(default = "default_fail_on")]
    pub fail_on: Severity,
    /// Rule keys to ignore entirely.
    #[serde(default)]
    pub ignore_rules: HashSet<String>,
    /// Per-rule severity overrides.
    #[serde(default)]
    pub overrides: HashMap<String, Severity>,
    /// Drop findings below this confidence.
    #[serde(default)]
    pub min_confidence: Option<Confidence>,
}

fn default_fail_on() -> Severity {
    Severity::High
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            fail_on: default_fail_on(),
            ignore_rules: HashSet::new(),
            overrides: HashMap::new(),
            min_confidence: None,
        }
    }
}

impl Policy {
    fn keeps(&self, finding: &Finding) -> bool {
        !self.ignore_rules.contains(&finding.rule_id)
            && self
                .min_confidence
                .map_or(true, |floor| finding.confidence >= floor)
    }

    fn effective_severity(&self, finding: &Finding) -> Severity {
        self.overrides
            .get(&finding.rule_id)
            .copied()
            .unwrap_or(finding.severity)
    }

    /// Evaluate findings against this policy and produce a verdict.
    pub fn evaluate(&self, findings: &[Finding]) -> PolicyVerdict {
        let mut by_rule = BTreeMap::new();
        let mut highest = None;
        let mut effective = 0;
        for finding in findings.iter().filter(|f| self.keeps(f)) {
            effective += 1;
            *by_rule.entry(finding.rule_id.clone()).or_insert(0) += 1;
            highest = highest.max(Some(self.effective_severity(finding)));
        }

        PolicyVerdict {
            pass: highest.map_or(true, |sev| sev < self.fail_on),
            total_findings: findings.len(),
            effective_findings: effective,
            highest_severity: highest,
            fail_threshold: self.fail_on,
            by_rule,
        }
    }

    /// Filter findings and apply overrides, keeping traversal order.
    pub fn apply(&self, findings: &[Finding]) -> Vec<Finding> {
        findings
            .iter()
            .filter(|f| self.keeps(f))
            .map(|f| {
                let mut f = f.clone();
                f.severity = self.effective_severity(&f);
                f
            })
            .collect()
    }
}
