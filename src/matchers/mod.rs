//! Pure predicates shared by the rule checks.
//!
//! Everything here looks at a single node (or its text) and never walks the
//! tree. Unexpected shapes are treated as "no match".

use regex::{Regex, RegexBuilder};

use crate::error::{LintError, Result};
use crate::tree::{Kind, LiteralKind, NodeRef};

/// Case-insensitive regex over identifiers, keys and rendered text.
#[derive(Debug, Clone)]
pub struct NamePattern {
    regex: Regex,
}

impl NamePattern {
    pub fn compile(name: &str, pattern: &str) -> Result<Self> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| LintError::InvalidPattern {
                name: name.to_string(),
                source,
            })?;
        Ok(Self { regex })
    }

    /// Empty text never matches, even for patterns that accept it.
    pub fn matches(&self, text: &str) -> bool {
        !text.is_empty() && self.regex.is_match(text)
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

/// Lowercased word list used for substring and exact-name tests.
#[derive(Debug, Clone, Default)]
pub struct Keywords {
    words: Vec<String>,
}

impl Keywords {
    pub fn new<S: AsRef<str>>(words: &[S]) -> Self {
        Self {
            words: words
                .iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    /// True if `name` equals one of the words, ignoring ASCII case.
    pub fn contains_name(&self, name: &str) -> bool {
        self.words.iter().any(|w| w.eq_ignore_ascii_case(name))
    }

    /// First word occurring anywhere in `text`, ignoring case.
    pub fn find_in(&self, text: &str) -> Option<&str> {
        if text.is_empty() {
            return None;
        }
        let lower = text.to_lowercase();
        self.words
            .iter()
            .find(|w| lower.contains(w.as_str()))
            .map(String::as_str)
    }

    pub fn occurs_in(&self, text: &str) -> bool {
        self.find_in(text).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Sanitizer names found anywhere in a text, ignoring case. An occurrence
/// directly negated by an `un` prefix (`unescape`, `$view->unescape`,
/// `htmlUnescape`) does not count.
#[derive(Debug, Clone)]
pub struct SanitizerSet {
    regex: Option<Regex>,
}

impl SanitizerSet {
    pub fn compile<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let alternatives: Vec<String> = names
            .iter()
            .map(|n| n.as_ref().trim())
            .filter(|n| !n.is_empty())
            .map(regex::escape)
            .collect();
        if alternatives.is_empty() {
            return Ok(Self { regex: None });
        }
        let pattern = alternatives.join("|");
        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| LintError::InvalidPattern {
                name: "sanitizers".into(),
                source,
            })?;
        Ok(Self { regex: Some(regex) })
    }

    pub fn is_sanitizer_call(&self, text: &str) -> bool {
        let Some(re) = &self.regex else {
            return false;
        };
        re.find_iter(text)
            .any(|m| !negated_by_un(&text.as_bytes()[..m.start()]))
    }
}

/// `prefix` ends in an `un` that starts a word: at the beginning, after a
/// non-letter, or as a camelCase `Un`.
fn negated_by_un(prefix: &[u8]) -> bool {
    let Some(at) = prefix.len().checked_sub(2) else {
        return false;
    };
    if !prefix[at..].eq_ignore_ascii_case(b"un") {
        return false;
    }
    prefix[at].is_ascii_uppercase() || at == 0 || !prefix[at - 1].is_ascii_alphabetic()
}

/// A call whose callee is a member access, split into its parts.
#[derive(Debug, Clone, Copy)]
pub struct MemberCall<'t> {
    pub call: NodeRef<'t>,
    pub receiver: NodeRef<'t>,
    pub receiver_text: &'t str,
    pub method_name: &'t str,
}

/// Decompose `recv->method(...)`, `Class::method(...)` or `recv.method(...)`.
pub fn member_call(node: NodeRef<'_>) -> Option<MemberCall<'_>> {
    let callee = node.callee()?;
    if !callee.is(Kind::MemberAccess) {
        return None;
    }
    let receiver = callee.child(0)?;
    let member = callee.child(1)?;
    if !member.is(Kind::Identifier) {
        tracing::debug!(
            node = %node.id(),
            member_kind = ?member.kind(),
            "member access without identifier member, skipping"
        );
        return None;
    }
    let method_name = member.name().unwrap_or_else(|| member.text());
    Some(MemberCall {
        call: node,
        receiver,
        receiver_text: receiver.text(),
        method_name,
    })
}

/// Invoked method or function name: the member of a member call, or the
/// identifier of a plain function call.
pub fn callee_name(node: NodeRef<'_>) -> Option<&str> {
    if let Some(mc) = member_call(node) {
        return Some(mc.method_name);
    }
    let callee = node.callee()?;
    if callee.is(Kind::Identifier) {
        Some(callee.name().unwrap_or_else(|| callee.text()))
    } else {
        None
    }
}

/// Break camelCase, snake_case and letter/digit runs apart with spaces so
/// `\b`-anchored patterns see identifier words: `generateTOTP` becomes
/// `generate TOTP`, `forgotPassword` becomes `forgot Password`.
pub fn split_identifier_words(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 8);
    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' {
            out.push(' ');
            continue;
        }
        if let Some(&prev) = i.checked_sub(1).and_then(|p| chars.get(p)) {
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let boundary = (c.is_uppercase()
                && (prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower)))
                || (c.is_ascii_digit() && prev.is_alphabetic());
            if boundary {
                out.push(' ');
            }
        }
        out.push(c);
    }
    out
}

/// A call whose callee text mentions one of the hashing/encryption words.
pub fn is_hash_or_encrypt_call(node: NodeRef<'_>, hashers: &Keywords) -> bool {
    node.callee()
        .is_some_and(|callee| hashers.occurs_in(callee.text()))
}

/// Coarse origin of a value expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueClass {
    Literal,
    Variable,
    Other,
}

pub fn classify_literal_or_var(node: NodeRef<'_>) -> ValueClass {
    match node.kind() {
        Kind::Literal => ValueClass::Literal,
        Kind::Identifier => ValueClass::Variable,
        _ => ValueClass::Other,
    }
}

/// Unquoted value of a string literal.
pub fn string_literal_value(node: NodeRef<'_>) -> Option<&str> {
    if !node.is(Kind::Literal) {
        return None;
    }
    match node.literal() {
        Some(LiteralKind::String) | None => Some(
            node.text()
                .trim()
                .trim_matches(|c| c == '\'' || c == '"' || c == '`'),
        ),
        _ => None,
    }
}
