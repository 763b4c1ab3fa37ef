use crate::config::MassAssignmentConfig;
use crate::matchers::{member_call, Keywords};
use crate::rules::{
    Confidence, EngineContext, Finding, RuleCategory, RuleCheck, RuleMetadata, Severity,
};
use crate::tree::{Kind, NodeRef};

const RULE_ID: &str = "mass-assignment";

/// mass-assignment: Unsafe Mass Assignment
///
/// Flags model persistence calls (`create`, `fill`, `update`) whose first
/// argument is the whole request bag:
/// - `User::create($request->all())` → High confidence
/// - `$user->update($request)`       → Low confidence (variable name only)
///
/// `$request->only([...])` and validated arrays are the safe idiom and are
/// never flagged.
pub struct MassAssignmentRule {
    persistence_methods: Keywords,
    bulk_input_methods: Keywords,
    input_variable_hints: Keywords,
}

impl MassAssignmentRule {
    pub fn from_config(config: &MassAssignmentConfig) -> Self {
        Self {
            persistence_methods: Keywords::new(&config.persistence_methods),
            bulk_input_methods: Keywords::new(&config.bulk_input_methods),
            input_variable_hints: Keywords::new(&config.input_variable_hints),
        }
    }
}

impl RuleCheck for MassAssignmentRule {
    fn metadata(&self) -> RuleMetadata {
        RuleMetadata {
            id: RULE_ID.into(),
            name: "Unsafe Mass Assignment".into(),
            description: "Binds the whole request input onto a model without an allow-list"
                .into(),
            default_severity: Severity::High,
            category: RuleCategory::MassAssignment,
            cwe_id: Some("CWE-915".into()),
        }
    }

    fn interested_kinds(&self) -> &'static [Kind] {
        &[Kind::FunctionCall]
    }

    fn visit(&self, node: NodeRef<'_>, _ctx: &EngineContext<'_>) -> Vec<Finding> {
        let Some(outer) = member_call(node) else {
            return Vec::new();
        };
        if !self.persistence_methods.contains_name(outer.method_name) {
            return Vec::new();
        }
        let Some(first) = node.first_argument() else {
            tracing::debug!(node = %node.id(), method = outer.method_name, "persistence call without arguments");
            return Vec::new();
        };

        let meta = self.metadata();
        let remediation = "Pass an explicit allow-list ($request->only([...]) or validated data) \
                           and make sure $fillable or $guarded is set on the model.";

        if first.is(Kind::FunctionCall) {
            if let Some(inner) = member_call(first) {
                if self.bulk_input_methods.contains_name(inner.method_name) {
                    let finding = Finding::new(
                        &meta,
                        node,
                        format!(
                            "Unsafe mass assignment via {}() + {}(): the whole request input is bound to the model",
                            outer.method_name, inner.method_name
                        ),
                    )
                    .with_evidence(
                        format!("Bulk input extraction '{}()'", inner.method_name),
                        first,
                    )
                    .with_remediation(remediation);
                    return vec![finding];
                }
            }
            return Vec::new();
        }

        if first.is(Kind::Identifier) {
            let var_name = first.name().unwrap_or_else(|| first.text());
            if self.input_variable_hints.occurs_in(var_name) {
                let finding = Finding::new(
                    &meta,
                    node,
                    format!(
                        "Potential unsafe mass assignment via {}() with {}",
                        outer.method_name, var_name
                    ),
                )
                .with_severity(Severity::Medium)
                .with_confidence(Confidence::Low)
                .with_remediation(remediation);
                return vec![finding];
            }
        }

        Vec::new()
    }
}
