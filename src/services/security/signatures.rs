//! Attack signatures for the URL surface.
//!
//! Heuristic, case-insensitive pattern matching. This is a defense layer in
//! front of parameterized queries and output escaping, not a parser.
//! Built once at startup and shared read-only (`Arc<AttackSignatures>`).

use regex::RegexSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureCategory {
    SqlInjection,
    ScriptInjection,
    SuspiciousEscaping,
}

const SQL_INJECTION: &[&str] = &[
    r"(?i)\bunion\b.*\bselect\b",
    r"(?i)\bselect\b.*\bfrom\b",
    r"(?i)\binsert\b.*\binto\b",
    r"(?i)\bupdate\b.*\bset\b",
    r"(?i)\bdelete\b.*\bfrom\b",
    r"(?i)\bdrop\b.*\btable\b",
    r"(?i)\bexec\b|\bexecute\b",
    // comment delimiters
    r"--|#|/\*|\*/",
    r"(?i)\bor\b.*=",
    r"(?i)\band\b.*=",
    // quote closing a statement
    r#"';|";"#,
];

const SCRIPT_INJECTION: &[&str] = &[
    r"(?is)<script[^>]*>.*?</script>",
    r"(?is)<iframe[^>]*>.*?</iframe>",
    r"(?i)javascript:",
    // inline event handlers: onclick=, onerror = ...
    r"(?i)on\w+\s*=",
    r"(?i)<img[^>]*onerror[^>]*>",
];

#[derive(Debug)]
pub struct AttackSignatures {
    sql: RegexSet,
    script: RegexSet,
}

impl AttackSignatures {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            sql: RegexSet::new(SQL_INJECTION)?,
            script: RegexSet::new(SCRIPT_INJECTION)?,
        })
    }

    /// First matching category, if any.
    pub fn classify(&self, input: &str) -> Option<SignatureCategory> {
        if self.sql.is_match(input) {
            return Some(SignatureCategory::SqlInjection);
        }
        if self.script.is_match(input) {
            return Some(SignatureCategory::ScriptInjection);
        }
        if input.contains("''") || input.contains("\"\"") {
            return Some(SignatureCategory::SuspiciousEscaping);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sigs() -> AttackSignatures {
        AttackSignatures::new().unwrap()
    }

    #[test]
    fn rejects_known_payloads() {
        let sigs = sigs();
        for input in [
            "1' OR '1'='1",
            "<script>alert(1)</script>",
            "1; DROP TABLE users;--",
            "1\" OR \"\"=\"",
            "Robert'); DROP TABLE students;--",
            "x UNION ALL SELECT password",
            "javascript:alert(1)",
            "<img src=x onerror=alert(1)>",
            "a/*b*/",
            "exec xp_cmdshell",
        ] {
            assert!(sigs.classify(input).is_some(), "should reject {input:?}");
        }
    }

    #[test]
    fn accepts_ordinary_literals() {
        let sigs = sigs();
        for input in ["alice", "42", "2024-01-01", "O'Brien", "hello world", "a-b"] {
            assert_eq!(sigs.classify(input), None, "should accept {input:?}");
        }
    }

    #[test]
    fn matching_ignores_case() {
        let sigs = sigs();
        assert_eq!(
            sigs.classify("DrOp TaBlE x"),
            Some(SignatureCategory::SqlInjection)
        );
        assert_eq!(
            sigs.classify("<SCRIPT>x</SCRIPT>"),
            Some(SignatureCategory::ScriptInjection)
        );
    }

    #[test]
    fn doubled_quotes_are_suspicious() {
        assert_eq!(
            sigs().classify("it''s"),
            Some(SignatureCategory::SuspiciousEscaping)
        );
    }
}
