pub mod builtin;
pub mod context;
pub mod engine;
pub mod finding;
pub mod policy;

use crate::tree::{Kind, NodeRef};

pub use builtin::BuiltinRule;
pub use context::EngineContext;
pub use engine::{Diagnostic, RuleEngine, ScanOutcome};
pub use finding::{Confidence, Evidence, Finding, RuleCategory, RuleMetadata, Severity};

/// A rule check subscribes to node kinds and inspects each matching node.
pub trait RuleCheck: Send + Sync {
    /// Metadata about this rule (key, name, severity, CWE).
    fn metadata(&self) -> RuleMetadata;

    /// Node kinds this rule wants to visit.
    fn interested_kinds(&self) -> &'static [Kind];

    /// Inspect one node. Must not retain state between calls.
    fn visit(&self, node: NodeRef<'_>, ctx: &EngineContext<'_>) -> Vec<Finding>;
}

/// Receives findings in traversal order.
pub trait FindingSink {
    fn report(&mut self, finding: Finding);
}

impl FindingSink for Vec<Finding> {
    fn report(&mut self, finding: Finding) {
        self.push(finding);
    }
}
