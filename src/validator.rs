//! Content validation for generated scripts.
//!
//! The validator is a pure check: it never fails as a function and it always
//! evaluates every rule, so a caller sees the full list of issues in one pass.
//! A validation failure is permanent for the orchestrator; the text-generation
//! call is not retried for it.

use once_cell::sync::Lazy;
use regex::Regex;

/// Minimum acceptable script length, in words.
pub const MIN_WORDS: usize = 30;
/// Maximum acceptable script length, in words.
pub const MAX_WORDS: usize = 250;

/// Terms that disqualify a script outright (case-insensitive substring match).
static DENYLIST: &[&str] = &[
    "fuck", "shit", "bitch", "asshole", "bastard", "dickhead", "goddamn",
];

static SENTENCE_TERMINATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]").expect("terminator pattern is valid"));

/// Outcome of a content check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    issues: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn issues(&self) -> &[String] {
        &self.issues
    }

    pub fn into_issues(self) -> Vec<String> {
        self.issues
    }
}

/// Validates generated text against length and appropriateness rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentValidator;

impl ContentValidator {
    pub fn new() -> Self {
        Self
    }

    /// Check `text` against all rules. Rules are evaluated unconditionally so
    /// every issue is reported, not just the first.
    pub fn validate(&self, text: &str) -> ValidationReport {
        let mut issues = Vec::new();

        let word_count = text.split_whitespace().count();
        if word_count < MIN_WORDS {
            issues.push(format!(
                "word count {word_count} below minimum length of {MIN_WORDS} words"
            ));
        } else if word_count > MAX_WORDS {
            issues.push(format!(
                "word count {word_count} above maximum length of {MAX_WORDS} words"
            ));
        }

        let lowered = text.to_lowercase();
        for term in DENYLIST {
            if lowered.contains(term) {
                issues.push(format!("contains disallowed term \"{term}\""));
            }
        }

        if !SENTENCE_TERMINATOR.is_match(text) {
            issues.push("no sentence terminator found".to_string());
        }

        ValidationReport { issues }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_script() -> String {
        // inside the word window, clean, properly punctuated
        "Today is the day you promised yourself. Lace up, step outside, and \
         take the first stride. Every minute of this workout belongs to you, \
         and future you is already grateful. Go earn that feeling now."
            .to_string()
    }

    #[test]
    fn accepts_well_formed_script() {
        let report = ContentValidator::new().validate(&valid_script());
        assert!(report.is_valid(), "issues: {:?}", report.issues());
    }

    #[test]
    fn rejects_short_text_with_length_issue() {
        let report = ContentValidator::new().validate("Bad");
        assert!(!report.is_valid());
        assert!(
            report.issues().iter().any(|i| i.contains("length")),
            "expected a length issue, got {:?}",
            report.issues()
        );
    }

    #[test]
    fn rejects_overlong_text() {
        let long = "word ".repeat(251) + ".";
        let report = ContentValidator::new().validate(&long);
        assert!(report
            .issues()
            .iter()
            .any(|i| i.contains("maximum length")));
    }

    #[test]
    fn denylist_is_case_insensitive() {
        let text = valid_script().replace("Go earn", "Go FuCk around and earn");
        let report = ContentValidator::new().validate(&text);
        assert!(report
            .issues()
            .iter()
            .any(|i| i.contains("disallowed term")));
    }

    #[test]
    fn requires_sentence_terminator() {
        let text = "no punctuation here ".repeat(20);
        let report = ContentValidator::new().validate(&text);
        assert!(report
            .issues()
            .iter()
            .any(|i| i.contains("terminator")));
    }

    #[test]
    fn reports_all_issues_not_just_first() {
        // Too short, profane, and unterminated in one string.
        let report = ContentValidator::new().validate("shit happens");
        assert_eq!(report.issues().len(), 3, "issues: {:?}", report.issues());
    }
}
