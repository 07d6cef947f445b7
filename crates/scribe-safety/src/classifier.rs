//! Heuristic safety classifier.
//!
//! A cheap, explainable gate layered in front of (not instead of) the
//! language model: it catches obviously unsafe output deterministically
//! regardless of model behavior. Scores text for spam/urgency/phishing
//! vocabulary, shouting, and excessive punctuation.

use regex::Regex;
use scribe_types::content::SafetyAssessment;
use scribe_types::traits::ContentClassifier;

/// Default safety score at or above which content is considered safe.
pub const SAFETY_THRESHOLD: f64 = 0.8;

/// Risk added per matched prohibited-phrase pattern.
const PATTERN_RISK: f64 = 0.3;
/// Risk added when capitalization exceeds half the text.
const CAPS_RISK: f64 = 0.2;
/// Risk added for more than three exclamation marks.
const EXCLAMATION_RISK: f64 = 0.1;

/// Default implementation of the [`ContentClassifier`] trait.
///
/// All regex patterns are compiled once at construction time. Assessment is
/// deterministic, performs no I/O, and tolerates any input including the
/// empty string.
pub struct HeuristicClassifier {
    threshold: f64,
    patterns: Vec<Regex>,
}

impl HeuristicClassifier {
    /// Create a classifier with a custom safety threshold.
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            patterns: Self::compile_patterns(),
        }
    }

    /// Compile the fixed prohibited-phrase list.
    ///
    /// Spam/urgency/phishing/fraud vocabulary. Each entry that matches adds
    /// 0.3 risk once, regardless of how often it occurs.
    fn compile_patterns() -> Vec<Regex> {
        [
            r"(?i)\bact\s+(now|fast|immediately)\b",
            r"(?i)\bclick\s+here\b",
            r"(?i)\bfree\s+(money|cash|gift)\b",
            r"(?i)\burgent\b",
            r"(?i)\blimited\s+time\b",
            r"(?i)\bbuy\s+now\b",
            r"(?i)\bdon'?t\s+miss\s+out\b",
            r"(?i)\bonce\s+in\s+a\s+lifetime\b",
            r"(?i)\bguaranteed\s+(winnings?|returns?|income)\b",
            r"(?i)\bcongratulations[,!]?\s+you('ve|\s+have)?\s+won\b",
            r"(?i)\bverify\s+your\s+(account|password|identity)\b",
            r"(?i)\bwire\s+transfer\b",
            r"(?i)\bno\s+risk\b",
            r"(?i)\bclaim\s+your\b",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("prohibited-phrase pattern must compile"))
        .collect()
    }
}

impl Default for HeuristicClassifier {
    fn default() -> Self {
        Self::new(SAFETY_THRESHOLD)
    }
}

impl ContentClassifier for HeuristicClassifier {
    fn assess(&self, text: &str) -> SafetyAssessment {
        let mut risk = 0.0;
        let mut issues = Vec::new();

        for pattern in &self.patterns {
            if let Some(m) = pattern.find(text) {
                issues.push(format!("Prohibited pattern detected: \"{}\"", m.as_str()));
                risk += PATTERN_RISK;
            }
        }

        let total_chars = text.chars().count();
        if total_chars > 0 {
            let caps = text.chars().filter(|c| c.is_uppercase()).count();
            let caps_ratio = caps as f64 / total_chars as f64;
            if caps_ratio > 0.5 {
                issues.push("Excessive capitalization detected".to_string());
                risk += CAPS_RISK;
            }
        }

        let exclamations = text.chars().filter(|&c| c == '!').count();
        if exclamations > 3 {
            issues.push("Excessive exclamation marks".to_string());
            risk += EXCLAMATION_RISK;
        }

        let score = (1.0 - risk).max(0.0);
        SafetyAssessment::new(score, issues, self.threshold)
    }
}
