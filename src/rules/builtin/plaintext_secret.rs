use crate::config::PlaintextSecretConfig;
use crate::error::Result;
use crate::matchers::{
    callee_name, classify_literal_or_var, is_hash_or_encrypt_call, member_call,
    string_literal_value, Keywords, NamePattern, ValueClass,
};
use crate::rules::{
    Confidence, EngineContext, Finding, RuleCategory, RuleCheck, RuleMetadata, Severity,
};
use crate::tree::{Kind, NodeRef};

const RULE_ID: &str = "plaintext-secret";

const HASH_REMEDIATION: &str =
    "Store only a salted hash of the code (Hash::make / password_hash) and compare with Hash::check.";

/// plaintext-secret: Plaintext One-Time Password
///
/// Independent checks, each reporting at most once per visited node:
/// 1. ORM/storage calls whose attribute array puts a secret key next to a
///    raw or unhashed value (`User::create(['otp' => $otp])`,
///    `Cache::put(['otp' => $otp])`), or that take the key and value
///    positionally (`Cache::put('otp', $otp)`, `localStorage.setItem('otp', otp)`,
///    `setcookie('otp', $otp)`, `file_put_contents($path, $otp)`).
/// 2. Log calls mentioning a secret at all, hashed or not.
/// 3. Indexed session writes (`$_SESSION['otp'] = ...`) and cookie
///    assignments (`document.cookie = 'otp=' + otp`).
/// 4. Raw INSERT/UPDATE SQL naming a secret column without hashing.
///
/// Array literals outside a storage call are checked like (1) when
/// `check_standalone_arrays` is on.
pub struct PlaintextSecretRule {
    secret: NamePattern,
    orm_methods: Keywords,
    storage_methods: Keywords,
    sensitive_receivers: Keywords,
    storage_functions: Keywords,
    cookie_targets: Keywords,
    log_methods: Keywords,
    session_indicators: Keywords,
    query_callees: Keywords,
    sql_write_markers: Keywords,
    hash_functions: Keywords,
    sql_hash_functions: Keywords,
    check_standalone_arrays: bool,
}

/// A secret-keyed pair whose value does not look protected.
struct PlainPair<'t> {
    pair: NodeRef<'t>,
    key: &'t str,
    raw_value: bool,
}

impl PlaintextSecretRule {
    pub fn from_config(config: &PlaintextSecretConfig) -> Result<Self> {
        Ok(Self {
            secret: NamePattern::compile("plaintext_secret.secret_pattern", &config.secret_pattern)?,
            orm_methods: Keywords::new(&config.orm_methods),
            storage_methods: Keywords::new(&config.storage_methods),
            sensitive_receivers: Keywords::new(&config.sensitive_receivers),
            storage_functions: Keywords::new(&config.storage_functions),
            cookie_targets: Keywords::new(&config.cookie_targets),
            log_methods: Keywords::new(&config.log_methods),
            session_indicators: Keywords::new(&config.session_indicators),
            query_callees: Keywords::new(&config.query_callees),
            sql_write_markers: Keywords::new(&config.sql_write_markers),
            hash_functions: Keywords::new(&config.hash_functions),
            sql_hash_functions: Keywords::new(&config.sql_hash_functions),
            check_standalone_arrays: config.check_standalone_arrays,
        })
    }

    /// Method or function name if `call` persists its arguments somewhere
    /// sensitive.
    fn storage_method<'t>(&self, call: NodeRef<'t>) -> Option<&'t str> {
        let Some(mc) = member_call(call) else {
            return callee_name(call).filter(|name| self.storage_functions.contains_name(name));
        };
        if self.orm_methods.contains_name(mc.method_name) {
            return Some(mc.method_name);
        }
        if self.storage_methods.contains_name(mc.method_name)
            && self.sensitive_receivers.occurs_in(mc.receiver_text)
        {
            return Some(mc.method_name);
        }
        None
    }

    fn plain_pairs<'t>(&self, array: NodeRef<'t>) -> Vec<PlainPair<'t>> {
        let mut found = Vec::new();
        for pair in array.children().filter(|c| c.is(Kind::KeyValuePair)) {
            let (Some(key_node), Some(value)) = (pair.child(0), pair.child(1)) else {
                tracing::debug!(node = %pair.id(), "key/value pair without two children");
                continue;
            };
            let Some(key) = string_literal_value(key_node) else {
                continue;
            };
            if let Some(plain) = self.plain_pair(pair, key, value) {
                found.push(plain);
            }
        }
        found
    }

    /// `key` names a secret and `value` is raw or not run through a hasher.
    fn plain_pair<'t>(
        &self,
        anchor: NodeRef<'t>,
        key: &'t str,
        value: NodeRef<'t>,
    ) -> Option<PlainPair<'t>> {
        if !self.secret.matches(key) {
            return None;
        }
        let raw_value = matches!(
            classify_literal_or_var(value),
            ValueClass::Literal | ValueClass::Variable
        );
        (raw_value || !is_hash_or_encrypt_call(value, &self.hash_functions)).then_some(PlainPair {
            pair: anchor,
            key,
            raw_value,
        })
    }

    /// Positional stores: `('otp', $value)`, or a secret-named variable
    /// passed after the first argument (`set('user:1', $otp)`).
    fn positional_pair<'t>(&self, call: NodeRef<'t>) -> Option<PlainPair<'t>> {
        let first = call.first_argument()?;
        let mut rest = call.arguments().skip(1);
        if let Some(key) = string_literal_value(first) {
            if self.secret.matches(key) {
                let value = rest.next()?;
                return self.plain_pair(value, key, value);
            }
        }
        rest.find(|arg| {
            arg.is(Kind::Identifier) && self.secret.matches(arg.name().unwrap_or_else(|| arg.text()))
        })
        .map(|arg| PlainPair {
            pair: arg,
            key: arg.name().unwrap_or_else(|| arg.text()),
            raw_value: true,
        })
    }

    fn report_pairs(&self, pairs: &[PlainPair<'_>], context: &str) -> Option<Finding> {
        let first = pairs.first()?;
        let keys = pairs
            .iter()
            .map(|p| format!("'{}'", p.key))
            .collect::<Vec<_>>()
            .join(", ");
        let definite = pairs.iter().any(|p| p.raw_value);
        let message = if definite {
            format!("OTP should not be stored in plaintext {context} (key {keys}). Use a secure hashing function with a salt.")
        } else {
            format!("Potential plaintext OTP detected {context} (key {keys}). Use a secure hashing function.")
        };
        let mut finding = Finding::new(&self.metadata(), first.pair, message)
            .with_confidence(if definite {
                Confidence::High
            } else {
                Confidence::Medium
            })
            .with_remediation(HASH_REMEDIATION);
        for extra in pairs.iter().skip(1) {
            finding = finding.with_evidence(format!("Plaintext key '{}'", extra.key), extra.pair);
        }
        Some(finding)
    }

    fn check_storage_call(&self, call: NodeRef<'_>) -> Option<Finding> {
        let method = self.storage_method(call)?;
        let first = call.first_argument()?;
        let pairs = if first.is(Kind::ArrayLiteral) {
            self.plain_pairs(first)
        } else {
            self.positional_pair(call).into_iter().collect()
        };
        self.report_pairs(&pairs, &format!("when using {method}()"))
    }

    fn check_log_call(&self, call: NodeRef<'_>) -> Option<Finding> {
        let name = callee_name(call)?;
        if !self.log_methods.contains_name(name) {
            return None;
        }
        let arg = call.arguments().find(|a| self.secret.matches(a.text()))?;
        Some(
            Finding::new(
                &self.metadata(),
                arg,
                format!(
                    "OTP values should never be logged; {name}() receives '{}'. Logs expose authentication codes.",
                    arg.text().trim()
                ),
            )
            .with_remediation("Remove the code from the log statement or log a masked marker instead."),
        )
    }

    fn check_raw_query(&self, call: NodeRef<'_>) -> Option<Finding> {
        let callee = call.callee()?;
        if !self.query_callees.occurs_in(callee.text()) {
            return None;
        }
        let arg = call.arguments().find(|a| {
            let is_sql_text = string_literal_value(*a).is_some() || a.is(Kind::Concatenation);
            let text = a.text();
            is_sql_text
                && self.sql_write_markers.occurs_in(text)
                && self.secret.matches(text)
                && !self.sql_hash_functions.occurs_in(text)
        })?;
        Some(
            Finding::new(
                &self.metadata(),
                arg,
                "SQL query appears to store OTP in plaintext. OTP values should be securely hashed before storage.",
            )
            .with_confidence(Confidence::Medium)
            .with_remediation(HASH_REMEDIATION),
        )
    }

    fn check_session_assignment(&self, assignment: NodeRef<'_>) -> Option<Finding> {
        let target = assignment.child(0)?;
        if !target.is(Kind::ArrayAccess) {
            return None;
        }
        let text = target.text();
        if !self.session_indicators.occurs_in(text) || !self.secret.matches(text) {
            return None;
        }
        Some(
            Finding::new(
                &self.metadata(),
                target,
                "OTP should not be stored in plaintext in session variables. Use hashing with a salt.",
            )
            .with_remediation(HASH_REMEDIATION),
        )
    }

    fn check_cookie_assignment(&self, assignment: NodeRef<'_>) -> Option<Finding> {
        let target = assignment.child(0)?;
        let value = assignment.child(1)?;
        if !self.cookie_targets.occurs_in(target.text()) || !self.secret.matches(value.text()) {
            return None;
        }
        Some(
            Finding::new(
                &self.metadata(),
                value,
                format!(
                    "OTP should not be stored in plaintext in {}. Cookies are readable by the client.",
                    target.text().trim()
                ),
            )
            .with_remediation(HASH_REMEDIATION),
        )
    }

    fn check_standalone_array(&self, array: NodeRef<'_>) -> Option<Finding> {
        if !self.check_standalone_arrays {
            return None;
        }
        if let Some(parent) = array.parent() {
            let is_first_arg = parent
                .first_argument()
                .is_some_and(|a| a.id() == array.id());
            if is_first_arg && self.storage_method(parent).is_some() {
                // already reported by the storage-call check
                return None;
            }
        }
        let pairs = self.plain_pairs(array);
        self.report_pairs(&pairs, "in array literal")
    }
}

impl RuleCheck for PlaintextSecretRule {
    fn metadata(&self) -> RuleMetadata {
        RuleMetadata {
            id: RULE_ID.into(),
            name: "Plaintext One-Time Password".into(),
            description: "Stores or logs one-time passwords without hashing".into(),
            default_severity: Severity::High,
            category: RuleCategory::SensitiveDataExposure,
            cwe_id: Some("CWE-312".into()),
        }
    }

    fn interested_kinds(&self) -> &'static [Kind] {
        &[Kind::FunctionCall, Kind::Assignment, Kind::ArrayLiteral]
    }

    fn visit(&self, node: NodeRef<'_>, _ctx: &EngineContext<'_>) -> Vec<Finding> {
        match node.kind() {
            Kind::FunctionCall => [
                self.check_storage_call(node),
                self.check_log_call(node),
                self.check_raw_query(node),
            ]
            .into_iter()
            .flatten()
            .collect(),
            Kind::Assignment => [
                self.check_session_assignment(node),
                self.check_cookie_assignment(node),
            ]
            .into_iter()
            .flatten()
            .collect(),
            Kind::ArrayLiteral => self.check_standalone_array(node).into_iter().collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::builtin::test_support::findings_for;
    use crate::tree::{Language, NodeId, SyntaxTree, TreeBuilder};

    fn finish(mut b: TreeBuilder, items: Vec<NodeId>) -> SyntaxTree {
        let stmts = items.into_iter().map(|i| b.statement(i)).collect();
        let root = b.file(stmts);
        b.finish(root).unwrap()
    }

    fn otp_array(b: &mut TreeBuilder, value: NodeId) -> NodeId {
        let email_key = b.string("email");
        let email = b.ident("$email");
        let email_pair = b.pair(email_key, email);
        let key = b.string("otp");
        let pair = b.pair(key, value);
        b.array(vec![email_pair, pair])
    }

    #[test]
    fn flags_plain_variable_in_create() {
        for method in ["create", "insert", "save", "update"] {
            let mut b = TreeBuilder::new(Language::Php);
            let value = b.ident("$otp");
            let arr = otp_array(&mut b, value);
            let call = b.static_call("OtpCode", method, vec![arr]);
            let tree = finish(b, vec![call]);
            let findings = findings_for(&tree, RULE_ID);
            assert_eq!(findings.len(), 1, "method {method}");
            assert_eq!(findings[0].confidence, Confidence::High);
            assert!(findings[0].message.contains(&format!("{method}()")));
            assert!(tree.node(findings[0].anchor).is(Kind::KeyValuePair));
        }
    }

    #[test]
    fn passes_hashed_value() {
        let mut b = TreeBuilder::new(Language::Php);
        let raw = b.ident("$otp");
        let hashed = b.static_call("Hash", "make", vec![raw]);
        let arr = otp_array(&mut b, hashed);
        let call = b.static_call("OtpCode", "create", vec![arr]);
        let tree = finish(b, vec![call]);
        assert!(findings_for(&tree, RULE_ID).is_empty());
    }

    #[test]
    fn unknown_value_is_potential() {
        let mut b = TreeBuilder::new(Language::Php);
        let req = b.ident("$request");
        let value = b.member(req, "otp");
        let arr = otp_array(&mut b, value);
        let call = b.static_call("OtpCode", "create", vec![arr]);
        let tree = finish(b, vec![call]);
        let findings = findings_for(&tree, RULE_ID);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].confidence, Confidence::Medium);
        assert!(findings[0].message.starts_with("Potential plaintext OTP"));
    }

    #[test]
    fn multiple_secret_keys_yield_one_finding() {
        let mut b = TreeBuilder::new(Language::Php);
        let k1 = b.string("otp");
        let v1 = b.ident("$otp");
        let p1 = b.pair(k1, v1);
        let k2 = b.string("verification_code");
        let v2 = b.number("123456");
        let p2 = b.pair(k2, v2);
        let arr = b.array(vec![p1, p2]);
        let call = b.static_call("User", "create", vec![arr]);
        let tree = finish(b, vec![call]);
        let findings = findings_for(&tree, RULE_ID);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("'otp', 'verification_code'"));
        assert_eq!(findings[0].evidence.len(), 1);
    }

    #[test]
    fn storage_call_requires_sensitive_receiver() {
        let mut b = TreeBuilder::new(Language::Php);
        let v = b.ident("$otp");
        let arr = otp_array(&mut b, v);
        let cache = b.static_call("Cache", "put", vec![arr]);
        let tree = finish(b, vec![cache]);
        let findings = findings_for(&tree, RULE_ID);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("put()"));

        // `put` on a non-storage receiver is left to the standalone array check
        let mut b = TreeBuilder::new(Language::Php);
        let v = b.ident("$otp");
        let arr = otp_array(&mut b, v);
        let bag = b.ident("$bag");
        let call = b.method_call(bag, "put", vec![arr]);
        let tree = finish(b, vec![call]);
        let findings = findings_for(&tree, RULE_ID);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("in array literal"));
    }

    #[test]
    fn standalone_arrays_can_be_disabled() {
        let config = PlaintextSecretConfig {
            check_standalone_arrays: false,
            ..Default::default()
        };
        let rule = PlaintextSecretRule::from_config(&config).unwrap();
        let mut b = TreeBuilder::new(Language::Php);
        let v = b.ident("$otp");
        let arr = otp_array(&mut b, v);
        let tree = finish(b, vec![arr]);
        let ctx = EngineContext::new(&tree);
        let array = tree.preorder().find(|n| n.is(Kind::ArrayLiteral)).unwrap();
        assert!(rule.visit(array, &ctx).is_empty());
    }

    #[test]
    fn flags_logged_otp_even_when_hashed() {
        let mut b = TreeBuilder::new(Language::Php);
        let plain = b.ident("$otp");
        let log_plain = b.static_call("Log", "info", vec![plain]);
        let raw = b.ident("$otp");
        let hashed = b.static_call("Hash", "make", vec![raw]);
        let log_hashed = b.static_call("Log", "debug", vec![hashed]);
        let tree = finish(b, vec![log_plain, log_hashed]);
        let findings = findings_for(&tree, RULE_ID);
        assert_eq!(findings.len(), 2);
        assert!(findings[0].message.contains("info()"));
        assert!(findings[1].message.contains("debug()"));
    }

    #[test]
    fn java_logger_with_otp_argument() {
        let mut b = TreeBuilder::new(Language::Java);
        let log = b.ident("log");
        let msg = b.string("Generated code {}");
        let otp = b.ident("otp");
        let call = b.method_call(log, "info", vec![msg, otp]);
        let tree = finish(b, vec![call]);
        let findings = findings_for(&tree, RULE_ID);
        assert_eq!(findings.len(), 1);
        assert_eq!(tree.node(findings[0].anchor).text(), "otp");
    }

    #[test]
    fn log_without_secret_passes() {
        let mut b = TreeBuilder::new(Language::Php);
        let user = b.ident("$userId");
        let call = b.static_call("Log", "info", vec![user]);
        let tree = finish(b, vec![call]);
        assert!(findings_for(&tree, RULE_ID).is_empty());
    }

    #[test]
    fn flags_session_superglobal_write() {
        let mut b = TreeBuilder::new(Language::Php);
        let session = b.ident("$_SESSION");
        let key = b.string("otp");
        let target = b.array_access(session, key);
        let value = b.ident("$code");
        let assign = b.assign(target, value);
        let tree = finish(b, vec![assign]);
        let findings = findings_for(&tree, RULE_ID);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("session"));
        assert!(tree.node(findings[0].anchor).is(Kind::ArrayAccess));
    }

    #[test]
    fn unrelated_array_write_passes() {
        let mut b = TreeBuilder::new(Language::Php);
        let cart = b.ident("$cart");
        let key = b.string("otp");
        let target = b.array_access(cart, key);
        let value = b.ident("$x");
        let assign = b.assign(target, value);
        let tree = finish(b, vec![assign]);
        assert!(findings_for(&tree, RULE_ID).is_empty());
    }

    #[test]
    fn flags_raw_insert_query() {
        let mut b = TreeBuilder::new(Language::Php);
        let sql = b.string("INSERT INTO users (email, otp) VALUES ('");
        let var = b.ident("$otp");
        let tail = b.string("')");
        let query = b.concat(vec![sql, var, tail]);
        let call = b.static_call("DB", "statement", vec![query]);
        let pdo = b.ident("$pdo");
        let sql2 = b.string("UPDATE users SET otp = ? WHERE id = ?");
        let exec = b.method_call(pdo, "exec", vec![sql2]);
        let tree = finish(b, vec![call, exec]);
        let findings = findings_for(&tree, RULE_ID);
        // DB::statement is not a query callee; $pdo->exec is.
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.starts_with("SQL query"));
    }

    #[test]
    fn hashed_sql_passes() {
        let mut b = TreeBuilder::new(Language::Php);
        let db = b.ident("$db");
        let sql = b.string("UPDATE users SET otp = SHA2(?, 256) WHERE id = ?");
        let hashed = b.string("UPDATE users SET otp = password_hash(?) WHERE id = ?");
        let q1 = b.method_call(db, "query", vec![sql]);
        let db2 = b.ident("$db");
        let q2 = b.method_call(db2, "query", vec![hashed]);
        let tree = finish(b, vec![q1, q2]);
        let findings = findings_for(&tree, RULE_ID);
        // SHA2 is not in the hash list; password_hash is.
        assert_eq!(findings.len(), 1);
        assert!(tree.node(findings[0].anchor).text().contains("SHA2"));
    }

    fn strip_literal_classes(value: &mut serde_json::Value) {
        match value {
            serde_json::Value::Object(map) => {
                map.remove("literal");
                map.values_mut().for_each(strip_literal_classes);
            }
            serde_json::Value::Array(items) => items.iter_mut().for_each(strip_literal_classes),
            _ => {}
        }
    }

    #[test]
    fn json_trees_without_literal_classes_are_checked() {
        let mut b = TreeBuilder::new(Language::Php);
        let v = b.ident("$otp");
        let arr = otp_array(&mut b, v);
        let create = b.static_call("User", "create", vec![arr]);
        let pdo = b.ident("$pdo");
        let sql = b.string("UPDATE users SET otp = ? WHERE id = ?");
        let exec = b.method_call(pdo, "exec", vec![sql]);
        let tree = finish(b, vec![create, exec]);

        let mut json: serde_json::Value = serde_json::from_str(&tree.to_json().unwrap()).unwrap();
        assert!(tree.to_json().unwrap().contains("\"literal\""));
        strip_literal_classes(&mut json);
        let loaded = SyntaxTree::from_json(&json.to_string()).unwrap();
        assert!(loaded.preorder().all(|n| n.literal().is_none()));

        let findings = findings_for(&loaded, RULE_ID);
        assert_eq!(findings.len(), 2);
        assert!(findings[0].message.contains("create()"));
        assert!(findings[1].message.starts_with("SQL query"));
    }

    fn php(build: impl FnOnce(&mut TreeBuilder) -> NodeId) -> SyntaxTree {
        let mut b = TreeBuilder::new(Language::Php);
        let call = build(&mut b);
        finish(b, vec![call])
    }

    #[test]
    fn flags_positional_key_value_stores() {
        let cases: Vec<(&str, SyntaxTree)> = vec![
            (
                "put()",
                php(|b| {
                    let key = b.string("otp");
                    let v = b.ident("$otp");
                    b.static_call("Cache", "put", vec![key, v])
                }),
            ),
            (
                "set()",
                php(|b| {
                    let key = b.string("otp");
                    let v = b.ident("$otp");
                    b.static_call("Redis", "set", vec![key, v])
                }),
            ),
            (
                "setcookie()",
                php(|b| {
                    let key = b.string("otp");
                    let v = b.ident("$otp");
                    b.function_call("setcookie", vec![key, v])
                }),
            ),
            (
                "file_put_contents()",
                php(|b| {
                    let path = b.ident("$path");
                    let v = b.ident("$otp");
                    b.function_call("file_put_contents", vec![path, v])
                }),
            ),
            (
                "set()",
                php(|b| {
                    let cache = b.ident("$cache");
                    let prefix = b.string("user:");
                    let id = b.ident("$id");
                    let key = b.concat(vec![prefix, id]);
                    let v = b.ident("$otp");
                    b.method_call(cache, "set", vec![key, v])
                }),
            ),
        ];
        for (method, tree) in cases {
            let findings = findings_for(&tree, RULE_ID);
            assert_eq!(findings.len(), 1, "{method}");
            assert!(findings[0].message.contains(method), "{method}");
            assert_eq!(findings[0].confidence, Confidence::High);
        }
    }

    #[test]
    fn flags_local_storage_set_item() {
        let mut b = TreeBuilder::new(Language::JavaScript);
        let storage = b.ident("localStorage");
        let key = b.string("otp");
        let v = b.ident("otp");
        let call = b.method_call(storage, "setItem", vec![key, v]);
        let tree = finish(b, vec![call]);
        let findings = findings_for(&tree, RULE_ID);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].anchor, v);
    }

    #[test]
    fn positional_hashed_value_passes() {
        let mut b = TreeBuilder::new(Language::Php);
        let key = b.string("otp");
        let raw = b.ident("$otp");
        let hashed = b.static_call("Hash", "make", vec![raw]);
        let call = b.static_call("Cache", "put", vec![key, hashed]);
        let tree = finish(b, vec![call]);
        assert!(findings_for(&tree, RULE_ID).is_empty());
    }

    #[test]
    fn flags_error_log_and_cookie_assignment() {
        let mut b = TreeBuilder::new(Language::Php);
        let v = b.ident("$otp");
        let call = b.function_call("error_log", vec![v]);
        let tree = finish(b, vec![call]);
        let findings = findings_for(&tree, RULE_ID);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("error_log()"));

        let mut b = TreeBuilder::new(Language::JavaScript);
        let document = b.ident("document");
        let cookie = b.member(document, "cookie");
        let prefix = b.string("otp=");
        let otp = b.ident("otp");
        let value = b.concat(vec![prefix, otp]);
        let assign = b.assign(cookie, value);
        let tree = finish(b, vec![assign]);
        let findings = findings_for(&tree, RULE_ID);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].anchor, value);
        assert!(findings[0].message.contains("document.cookie"));
    }

    #[test]
    fn flags_concatenated_raw_query() {
        let mut b = TreeBuilder::new(Language::Php);
        let db = b.ident("$db");
        let head = b.string("INSERT INTO users (email, otp) VALUES ('");
        let var = b.ident("$otp");
        let tail = b.string("')");
        let sql = b.concat(vec![head, var, tail]);
        let call = b.method_call(db, "query", vec![sql]);
        let tree = finish(b, vec![call]);
        let findings = findings_for(&tree, RULE_ID);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].anchor, sql);
        assert!(tree.node(sql).is(Kind::Concatenation));
    }

    #[test]
    fn flags_execute_and_session_set_arrays() {
        let mut b = TreeBuilder::new(Language::Php);
        let stmt = b.ident("$stmt");
        let v = b.ident("$otp");
        let arr = otp_array(&mut b, v);
        let exec = b.method_call(stmt, "execute", vec![arr]);
        let session = b.ident("$session");
        let v2 = b.ident("$otp");
        let arr2 = otp_array(&mut b, v2);
        let set = b.method_call(session, "set", vec![arr2]);
        let tree = finish(b, vec![exec, set]);
        let findings = findings_for(&tree, RULE_ID);
        assert_eq!(findings.len(), 2);
        assert!(findings[0].message.contains("execute()"));
        assert!(findings[1].message.contains("set()"));
    }
}
