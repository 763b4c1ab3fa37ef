use crate::config::InsecureRecoveryConfig;
use crate::error::Result;
use crate::matchers::{member_call, split_identifier_words, Keywords, NamePattern};
use crate::rules::{
    Confidence, EngineContext, Finding, RuleCategory, RuleCheck, RuleMetadata, Severity,
};
use crate::tree::{Kind, NodeRef};

const RULE_ID: &str = "insecure-recovery";

const ASVS_NOTE: &str = "OWASP ASVS v2.5.6 requires a secure recovery mechanism such as TOTP, \
                         a soft token, mobile push, or another offline factor.";

const REMEDIATION: &str = "Require a second factor (TOTP, authenticator app, WebAuthn or push \
                           approval) before allowing the password to be reset.";

/// insecure-recovery: Weak Password Recovery
///
/// Looks at password-recovery classes, methods and calls and reports the
/// ones that rely on knowledge questions or an emailed link alone. Anything
/// inside a class that already mentions a secure mechanism is left alone.
pub struct InsecureRecoveryRule {
    recovery: NamePattern,
    recovery_names: Keywords,
    recovery_method_names: Keywords,
    security_question: NamePattern,
    secure: NamePattern,
    secure_libraries: Keywords,
    email_reset: Keywords,
}

impl InsecureRecoveryRule {
    pub fn from_config(config: &InsecureRecoveryConfig) -> Result<Self> {
        Ok(Self {
            recovery: NamePattern::compile("recovery_pattern", &config.recovery_pattern)?,
            recovery_names: Keywords::new(&config.recovery_names),
            recovery_method_names: Keywords::new(&config.recovery_method_names),
            security_question: NamePattern::compile(
                "security_question_pattern",
                &config.security_question_pattern,
            )?,
            secure: NamePattern::compile(
                "secure_mechanism_pattern",
                &config.secure_mechanism_pattern,
            )?,
            secure_libraries: Keywords::new(&config.secure_libraries),
            email_reset: Keywords::new(&config.simple_email_reset_indicators),
        })
    }

    fn is_recovery_class(&self, name: &str) -> bool {
        self.recovery.matches(name) || self.recovery_names.occurs_in(name)
    }

    fn is_recovery_method(&self, name: &str) -> bool {
        if self.is_recovery_class(name) || self.recovery_method_names.occurs_in(name) {
            return true;
        }
        let lower = name.to_lowercase();
        lower.contains("generatetoken") && (lower.contains("reset") || lower.contains("recovery"))
    }

    fn contains_secure_mechanism(&self, text: &str) -> bool {
        self.secure.matches(&split_identifier_words(text)) || self.secure_libraries.occurs_in(text)
    }

    /// The enclosing class names a secure mechanism or has a member that
    /// mentions one.
    fn in_secure_context(&self, node: NodeRef<'_>, ctx: &EngineContext<'_>) -> bool {
        let Some(class) = ctx.enclosing_class(node) else {
            return false;
        };
        if class
            .name()
            .is_some_and(|name| self.secure.matches(&split_identifier_words(name)))
        {
            return true;
        }
        class
            .children()
            .any(|member| self.contains_secure_mechanism(member.text()))
    }

    fn check_class(&self, class: NodeRef<'_>) -> Option<Finding> {
        let name = class.name()?;
        if !self.is_recovery_class(name) {
            return None;
        }
        let fields: Vec<NodeRef<'_>> = class
            .children()
            .filter(|member| member.is(Kind::FieldDecl))
            .collect();

        let question = fields
            .iter()
            .copied()
            .find(|field| self.security_question.matches(field_name(*field)))?;
        if fields
            .iter()
            .any(|field| self.secure.matches(&split_identifier_words(field_name(*field))))
        {
            return None;
        }

        let finding = Finding::new(
            &self.metadata(),
            class,
            format!(
                "Password recovery in '{name}' appears to rely on security questions \
                 (knowledge-based verification). {ASVS_NOTE}"
            ),
        )
        .with_evidence(
            format!("Security question field '{}'", field_name(question)),
            question,
        )
        .with_remediation(REMEDIATION);
        Some(finding)
    }

    fn check_method(&self, method: NodeRef<'_>, ctx: &EngineContext<'_>) -> Option<Finding> {
        let name = method.name()?;
        if !self.is_recovery_method(name) {
            return None;
        }
        if method
            .statements()
            .any(|stmt| self.contains_secure_mechanism(stmt.text()))
        {
            return None;
        }
        if self.in_secure_context(method, ctx) {
            tracing::trace!(method = name, "recovery method inside secure class, skipping");
            return None;
        }

        let message = if self.email_reset.occurs_in(name) {
            format!(
                "Password reset method '{name}' appears to only send an email with a reset link \
                 without additional verification. {ASVS_NOTE}"
            )
        } else {
            format!(
                "Password recovery method '{name}' does not appear to implement a secure \
                 recovery mechanism. {ASVS_NOTE}"
            )
        };
        let finding = Finding::new(&self.metadata(), method, message)
            .with_severity(Severity::Medium)
            .with_confidence(Confidence::Medium)
            .with_remediation(REMEDIATION);
        Some(finding)
    }

    fn check_call(&self, node: NodeRef<'_>, ctx: &EngineContext<'_>) -> Option<Finding> {
        let call = member_call(node)?;
        let method = call.method_name.to_lowercase();
        let receiver = call.receiver_text.to_lowercase();
        let email_reset = receiver.contains("email")
            && (method.contains("send") || method.contains("reset"));
        if !self.is_recovery_method(&method) && !email_reset {
            return None;
        }

        if node
            .arguments()
            .any(|arg| self.contains_secure_mechanism(arg.text()))
        {
            return None;
        }
        if ctx.enclosing_method(node).is_some_and(|m| {
            m.statements()
                .any(|stmt| self.contains_secure_mechanism(stmt.text()))
        }) {
            return None;
        }
        if self.in_secure_context(node, ctx) {
            return None;
        }

        let finding = Finding::new(
            &self.metadata(),
            node,
            format!(
                "Password recovery call '{}' appears to use an email-only reset without \
                 additional security factors. {ASVS_NOTE}",
                call.method_name
            ),
        )
        .with_severity(Severity::Medium)
        .with_confidence(Confidence::Low)
        .with_remediation(REMEDIATION);
        Some(finding)
    }
}

fn field_name(field: NodeRef<'_>) -> &str {
    field.name().unwrap_or_else(|| field.text())
}

impl RuleCheck for InsecureRecoveryRule {
    fn metadata(&self) -> RuleMetadata {
        RuleMetadata {
            id: RULE_ID.into(),
            name: "Weak Password Recovery".into(),
            description: "Password recovery relies on security questions or an emailed link alone"
                .into(),
            default_severity: Severity::High,
            category: RuleCategory::WeakAuthentication,
            cwe_id: Some("CWE-640".into()),
        }
    }

    fn interested_kinds(&self) -> &'static [Kind] {
        &[Kind::ClassDecl, Kind::MethodDecl, Kind::FunctionCall]
    }

    fn visit(&self, node: NodeRef<'_>, ctx: &EngineContext<'_>) -> Vec<Finding> {
        let finding = match node.kind() {
            Kind::ClassDecl => self.check_class(node),
            Kind::MethodDecl => self.check_method(node, ctx),
            Kind::FunctionCall => self.check_call(node, ctx),
            _ => None,
        };
        finding.into_iter().collect()
    }
}
