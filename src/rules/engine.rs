use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::{Deserialize, Serialize};

use super::{builtin, BuiltinRule, EngineContext, Finding, FindingSink, RuleCheck, RuleMetadata};
use crate::config::RulesConfig;
use crate::error::Result;
use crate::tree::{Kind, NodeId, SyntaxTree};

/// A rule failure on one node. Not a finding; the scan carries on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub rule_id: String,
    pub node: NodeId,
    pub message: String,
}

/// Findings and diagnostics of one tree, in traversal order.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub findings: Vec<Finding>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Walks a tree once and routes every node to the rules subscribed to its
/// kind.
pub struct RuleEngine<R: RuleCheck = BuiltinRule> {
    rules: Vec<R>,
    dispatch: HashMap<Kind, Vec<usize>>,
}

impl RuleEngine<BuiltinRule> {
    /// Engine with every built-in rule and default patterns.
    pub fn new() -> Self {
        Self::with_rules(builtin::default_rules())
    }

    /// Engine with the built-in rules enabled in `config`.
    pub fn from_config(config: &RulesConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_rules(BuiltinRule::from_config(config)?))
    }
}

impl Default for RuleEngine<BuiltinRule> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RuleCheck> RuleEngine<R> {
    pub fn with_rules(rules: Vec<R>) -> Self {
        let mut dispatch: HashMap<Kind, Vec<usize>> = HashMap::new();
        for (idx, rule) in rules.iter().enumerate() {
            for &kind in rule.interested_kinds() {
                let slot = dispatch.entry(kind).or_default();
                if !slot.contains(&idx) {
                    slot.push(idx);
                }
            }
        }
        Self { rules, dispatch }
    }

    /// Run all rules over `tree`.
    pub fn scan(&self, tree: &SyntaxTree) -> ScanOutcome {
        let mut findings = Vec::new();
        let diagnostics = self.scan_into(tree, &mut findings);
        ScanOutcome {
            findings,
            diagnostics,
        }
    }

    /// Run all rules over `tree`, streaming findings into `sink` in document
    /// order. Returns the diagnostics of rules that failed.
    pub fn scan_into(&self, tree: &SyntaxTree, sink: &mut dyn FindingSink) -> Vec<Diagnostic> {
        let ctx = EngineContext::new(tree);
        let mut diagnostics = Vec::new();

        for node in tree.preorder() {
            let Some(subscribed) = self.dispatch.get(&node.kind()) else {
                continue;
            };
            for &idx in subscribed {
                let rule = &self.rules[idx];
                match catch_unwind(AssertUnwindSafe(|| rule.visit(node, &ctx))) {
                    Ok(found) => {
                        for finding in found {
                            sink.report(finding);
                        }
                    }
                    Err(payload) => {
                        let rule_id = rule.metadata().id;
                        let message = panic_message(payload.as_ref());
                        tracing::warn!(
                            rule = %rule_id,
                            node = %node.id(),
                            error = %message,
                            "rule failed on node, continuing"
                        );
                        diagnostics.push(Diagnostic {
                            rule_id,
                            node: node.id(),
                            message,
                        });
                    }
                }
            }
        }

        diagnostics
    }

    /// List metadata for all registered rules.
    pub fn list_rules(&self) -> Vec<RuleMetadata> {
        self.rules.iter().map(|r| r.metadata()).collect()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "rule panicked".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{RuleCategory, Severity};
    use crate::tree::{Language, NodeRef, TreeBuilder};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    /// Flags every identifier; panics on `$boom`.
    struct IdentRule;

    impl RuleCheck for IdentRule {
        fn metadata(&self) -> RuleMetadata {
            RuleMetadata {
                id: "ident".into(),
                name: "Ident".into(),
                description: "test".into(),
                default_severity: Severity::Low,
                category: RuleCategory::MassAssignment,
                cwe_id: None,
            }
        }

        fn interested_kinds(&self) -> &'static [Kind] {
            &[Kind::Identifier]
        }

        fn visit(&self, node: NodeRef<'_>, _ctx: &EngineContext<'_>) -> Vec<Finding> {
            if node.text() == "$boom" {
                panic!("malformed identifier");
            }
            vec![Finding::new(&self.metadata(), node, node.text())]
        }
    }

    fn idents(names: &[&str]) -> SyntaxTree {
        let mut b = TreeBuilder::new(Language::Php);
        let ids: Vec<_> = names.iter().map(|n| b.ident(n)).collect();
        let stmts: Vec<_> = ids.into_iter().map(|id| b.statement(id)).collect();
        let root = b.file(stmts);
        b.finish(root).unwrap()
    }

    #[test]
    fn visits_in_document_order() {
        let tree = idents(&["$a", "$b", "$c"]);
        let engine = RuleEngine::with_rules(vec![IdentRule]);
        let out = engine.scan(&tree);
        let messages: Vec<_> = out.findings.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(messages, vec!["$a", "$b", "$c"]);
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn rule_panic_becomes_diagnostic() {
        let tree = idents(&["$a", "$boom", "$c"]);
        let engine = RuleEngine::with_rules(vec![IdentRule]);
        let out = engine.scan(&tree);
        let messages: Vec<_> = out.findings.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(messages, vec!["$a", "$c"]);
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].rule_id, "ident");
        assert_eq!(out.diagnostics[0].message, "malformed identifier");
    }

    #[test]
    fn unsubscribed_kinds_are_not_visited() {
        let mut b = TreeBuilder::new(Language::Php);
        let lit = b.string("x");
        let root = b.file(vec![lit]);
        let tree = b.finish(root).unwrap();
        let out = RuleEngine::with_rules(vec![IdentRule]).scan(&tree);
        assert!(out.findings.is_empty());
    }

    #[test]
    fn default_engine_lists_builtin_rules() {
        let ids: Vec<_> = RuleEngine::new()
            .list_rules()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(
            ids,
            vec![
                "mass-assignment",
                "plaintext-secret",
                "unsafe-markup",
                "insecure-recovery"
            ]
        );
    }

    #[test]
    fn disabled_rules_are_not_registered() {
        let mut config = RulesConfig::default();
        config.unsafe_markup.enabled = false;
        let engine = RuleEngine::from_config(&config).unwrap();
        assert_eq!(engine.list_rules().len(), 3);
    }

    #[test]
    fn emptied_secret_pattern_is_rejected() {
        let mut config = RulesConfig::default();
        config.plaintext_secret.secret_pattern = String::new();
        assert!(matches!(
            RuleEngine::from_config(&config),
            Err(crate::error::LintError::Config(_))
        ));

        config.plaintext_secret.enabled = false;
        assert_eq!(RuleEngine::from_config(&config).unwrap().list_rules().len(), 3);
    }

    #[test]
    fn engine_is_shareable_across_threads() {
        let engine = &RuleEngine::with_rules(vec![IdentRule]);
        let trees = vec![idents(&["$a"]), idents(&["$b", "$c"])];
        let counts: Vec<usize> = std::thread::scope(|s| {
            let handles: Vec<_> = trees
                .iter()
                .map(|t| s.spawn(move || engine.scan(t).findings.len()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(counts, vec![1, 2]);
    }

    proptest! {
        #[test]
        fn rescanning_is_idempotent(names in proptest::collection::vec("\\$v[a-z]{0,5}", 0..12)) {
            let refs: Vec<&str> = names.iter().map(String::as_str).collect();
            let tree = idents(&refs);
            let engine = RuleEngine::with_rules(vec![IdentRule]);
            let first = engine.scan(&tree).findings;
            let second = engine.scan(&tree).findings;
            prop_assert_eq!(first.len(), names.len());
            prop_assert_eq!(first, second);
        }
    }
}
