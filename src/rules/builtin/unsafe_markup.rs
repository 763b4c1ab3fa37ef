use crate::config::UnsafeMarkupConfig;
use crate::error::Result;
use crate::matchers::{callee_name, Keywords, NamePattern, SanitizerSet};
use crate::rules::{EngineContext, Finding, RuleCategory, RuleCheck, RuleMetadata, Severity};
use crate::tree::{Kind, NodeRef};

const RULE_ID: &str = "unsafe-markup";

const SANITIZE_REMEDIATION: &str =
    "Run the SVG through a sanitizer (DOMPurify.sanitize, enshrined/svg-sanitize) or serve it as <img src>.";

/// unsafe-markup: Unsanitized SVG Rendering
///
/// "Contains SVG" and "comes from user input" are reported independently:
/// either one alone is enough for a finding. Any node whose text already
/// goes through a sanitizer is skipped as a whole.
pub struct UnsafeMarkupRule {
    svg: NamePattern,
    dangerous: NamePattern,
    output_methods: Keywords,
    sanitizers: SanitizerSet,
    user_input: Keywords,
    markup_targets: Keywords,
    dynamic_markers: Keywords,
}

impl UnsafeMarkupRule {
    pub fn from_config(config: &UnsafeMarkupConfig) -> Result<Self> {
        let output: Vec<&String> = config
            .unsafe_output_methods
            .iter()
            .chain(&config.render_methods)
            .collect();
        Ok(Self {
            svg: NamePattern::compile("unsafe_markup.svg_pattern", &config.svg_pattern)?,
            dangerous: NamePattern::compile(
                "unsafe_markup.dangerous_svg_pattern",
                &config.dangerous_svg_pattern,
            )?,
            output_methods: Keywords::new(&output),
            sanitizers: SanitizerSet::compile(&config.sanitizers)?,
            user_input: Keywords::new(&config.user_input_hints),
            markup_targets: Keywords::new(&config.markup_targets),
            dynamic_markers: Keywords::new(&config.dynamic_content_markers),
        })
    }

    /// High-severity finding for dangerous constructs, medium otherwise.
    fn svg_finding(&self, anchor: NodeRef<'_>, text: &str, dangerous: &str, plain: &str) -> Finding {
        let meta = self.metadata();
        let finding = if self.dangerous.matches(text) {
            Finding::new(&meta, anchor, dangerous).with_severity(Severity::High)
        } else {
            Finding::new(&meta, anchor, plain)
        };
        finding.with_remediation(SANITIZE_REMEDIATION)
    }

    fn check_call(&self, call: NodeRef<'_>) -> Vec<Finding> {
        let Some(name) = callee_name(call) else {
            return Vec::new();
        };
        if !self.output_methods.contains_name(name) {
            return Vec::new();
        }

        let mut findings = Vec::new();
        for arg in call.arguments() {
            let text = arg.text();
            if self.svg.matches(text) {
                findings.push(self.svg_finding(
                    arg,
                    text,
                    &format!("Potentially unsafe SVG content with script/foreignObject elements passed to {name}(). Sanitize SVG before rendering."),
                    &format!("SVG content passed to {name}() should be sanitized before rendering to prevent XSS attacks."),
                ));
            }
            if self.user_input.occurs_in(text) {
                findings.push(
                    Finding::new(
                        &self.metadata(),
                        arg,
                        format!("User input passed to {name}() could contain unsafe SVG content. Use an SVG sanitizer library."),
                    )
                    .with_remediation(SANITIZE_REMEDIATION),
                );
            }
        }
        findings
    }

    fn check_assignment(&self, assignment: NodeRef<'_>) -> Vec<Finding> {
        let (Some(target), Some(value)) = (assignment.child(0), assignment.child(1)) else {
            tracing::debug!(node = %assignment.id(), "assignment without target and value");
            return Vec::new();
        };
        let target_text = target.text().trim();
        if !self.markup_targets.occurs_in(target_text) {
            return Vec::new();
        }

        let mut findings = Vec::new();
        let value_text = value.text();
        if self.svg.matches(value_text) {
            findings.push(self.svg_finding(
                assignment,
                value_text,
                &format!("Assignment to {target_text} contains SVG with script/foreignObject elements. Sanitize before rendering."),
                &format!("Assignment to {target_text} contains SVG content without proper sanitization. Use a sanitizer library."),
            ));
        }
        if self.user_input.occurs_in(value_text) {
            findings.push(
                Finding::new(
                    &self.metadata(),
                    assignment,
                    format!("Assignment to {target_text} with user input could contain unsafe SVG. Use DOMPurify or another sanitizer."),
                )
                .with_remediation(SANITIZE_REMEDIATION),
            );
        }
        findings
    }

    fn check_inline_markup(&self, markup: NodeRef<'_>) -> Option<Finding> {
        let text = markup.text();
        if !self.svg.matches(text) || !self.dynamic_markers.occurs_in(text) {
            return None;
        }
        Some(self.svg_finding(
            markup,
            text,
            "Inline SVG with dynamic content contains potentially dangerous elements (script/foreignObject). Sanitize user input.",
            "Dynamic content in inline SVG should be properly sanitized to prevent XSS attacks.",
        ))
    }

    fn check_echo(&self, echo: NodeRef<'_>) -> Option<Finding> {
        let text = echo.text();
        if !self.svg.matches(text) {
            return None;
        }
        Some(self.svg_finding(
            echo,
            text,
            "Unescaped output emits SVG with script/foreignObject elements. Sanitize before output.",
            "Echo statement may output unsanitized SVG content. Use htmlspecialchars() or a dedicated SVG sanitizer.",
        ))
    }
}

impl RuleCheck for UnsafeMarkupRule {
    fn metadata(&self) -> RuleMetadata {
        RuleMetadata {
            id: RULE_ID.into(),
            name: "Unsanitized SVG Rendering".into(),
            description: "Renders user-supplied SVG markup without sanitization".into(),
            default_severity: Severity::Medium,
            category: RuleCategory::CrossSiteScripting,
            cwe_id: Some("CWE-79".into()),
        }
    }

    fn interested_kinds(&self) -> &'static [Kind] {
        &[
            Kind::FunctionCall,
            Kind::Assignment,
            Kind::InlineMarkup,
            Kind::EchoTag,
        ]
    }

    fn visit(&self, node: NodeRef<'_>, _ctx: &EngineContext<'_>) -> Vec<Finding> {
        if self.sanitizers.is_sanitizer_call(node.text()) {
            return Vec::new();
        }
        match node.kind() {
            Kind::FunctionCall => self.check_call(node),
            Kind::Assignment => self.check_assignment(node),
            Kind::InlineMarkup => self.check_inline_markup(node).into_iter().collect(),
            Kind::EchoTag => self.check_echo(node).into_iter().collect(),
            _ => Vec::new(),
        }
    }
}
