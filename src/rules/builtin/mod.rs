mod insecure_recovery;
mod mass_assignment;
mod plaintext_secret;
mod unsafe_markup;

use super::{EngineContext, Finding, RuleCheck, RuleMetadata};
use crate::config::RulesConfig;
use crate::error::Result;
use crate::tree::{Kind, NodeRef};

pub use insecure_recovery::InsecureRecoveryRule;
pub use mass_assignment::MassAssignmentRule;
pub use plaintext_secret::PlaintextSecretRule;
pub use unsafe_markup::UnsafeMarkupRule;

/// The closed set of built-in rules.
pub enum BuiltinRule {
    MassAssignment(MassAssignmentRule),
    PlaintextSecret(PlaintextSecretRule),
    UnsafeMarkup(UnsafeMarkupRule),
    InsecureRecovery(InsecureRecoveryRule),
}

impl BuiltinRule {
    /// Compile the rules enabled in `config`, in registration order.
    pub fn from_config(config: &RulesConfig) -> Result<Vec<Self>> {
        let mut rules = Vec::new();
        if config.mass_assignment.enabled {
            rules.push(Self::MassAssignment(MassAssignmentRule::from_config(
                &config.mass_assignment,
            )));
        }
        if config.plaintext_secret.enabled {
            rules.push(Self::PlaintextSecret(PlaintextSecretRule::from_config(
                &config.plaintext_secret,
            )?));
        }
        if config.unsafe_markup.enabled {
            rules.push(Self::UnsafeMarkup(UnsafeMarkupRule::from_config(
                &config.unsafe_markup,
            )?));
        }
        if config.insecure_recovery.enabled {
            rules.push(Self::InsecureRecovery(InsecureRecoveryRule::from_config(
                &config.insecure_recovery,
            )?));
        }
        Ok(rules)
    }
}

impl RuleCheck for BuiltinRule {
    fn metadata(&self) -> RuleMetadata {
        match self {
            Self::MassAssignment(r) => r.metadata(),
            Self::PlaintextSecret(r) => r.metadata(),
            Self::UnsafeMarkup(r) => r.metadata(),
            Self::InsecureRecovery(r) => r.metadata(),
        }
    }

    fn interested_kinds(&self) -> &'static [Kind] {
        match self {
            Self::MassAssignment(r) => r.interested_kinds(),
            Self::PlaintextSecret(r) => r.interested_kinds(),
            Self::UnsafeMarkup(r) => r.interested_kinds(),
            Self::InsecureRecovery(r) => r.interested_kinds(),
        }
    }

    fn visit(&self, node: NodeRef<'_>, ctx: &EngineContext<'_>) -> Vec<Finding> {
        match self {
            Self::MassAssignment(r) => r.visit(node, ctx),
            Self::PlaintextSecret(r) => r.visit(node, ctx),
            Self::UnsafeMarkup(r) => r.visit(node, ctx),
            Self::InsecureRecovery(r) => r.visit(node, ctx),
        }
    }
}

/// All built-in rules with their default patterns.
pub fn default_rules() -> Vec<BuiltinRule> {
    BuiltinRule::from_config(&RulesConfig::default())
        .expect("built-in default patterns are valid regexes")
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::rules::{Finding, RuleEngine};
    use crate::tree::SyntaxTree;

    /// Findings of the default engine restricted to one rule key.
    pub fn findings_for(tree: &SyntaxTree, rule_id: &str) -> Vec<Finding> {
        RuleEngine::new()
            .scan(tree)
            .findings
            .into_iter()
            .filter(|f| f.rule_id == rule_id)
            .collect()
    }
}
