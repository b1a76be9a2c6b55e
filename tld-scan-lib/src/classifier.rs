//! Registry output classification.
//!
//! Registries disagree wildly on how they phrase "this name is free", so the
//! classifier works on plain substring markers rather than parsing. The
//! markers live in ordered rule tables that are evaluated in two tiers:
//!
//! - availability is checked line by line: any single line containing an
//!   availability marker makes the domain available;
//! - activity is checked against the whole text: a suppressing marker
//!   ("available", "free") anywhere vetoes activity, otherwise the first
//!   matching activity rule wins.
//!
//! Both predicates lowercase their input, so callers may pass raw tool output.

/// Where a rule looks for its markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchScope {
    /// Every marker must appear on the same line
    Line,
    /// Markers may appear anywhere in the text
    WholeText,
}

/// What a matching rule decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleEffect {
    /// The domain can be registered
    Available,
    /// Activity is ruled out, regardless of later rules
    Suppress,
    /// The domain has a live registry record
    Active,
}

/// One entry of a rule table: all `markers` must match within `scope`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerRule {
    pub markers: Vec<String>,
    pub scope: MatchScope,
    pub effect: RuleEffect,
}

impl MarkerRule {
    pub fn new(markers: &[&str], scope: MatchScope, effect: RuleEffect) -> Self {
        Self {
            markers: markers.iter().map(|m| m.to_lowercase()).collect(),
            scope,
            effect,
        }
    }

    fn matches(&self, haystack: &str) -> bool {
        !self.markers.is_empty() && self.markers.iter().all(|m| haystack.contains(m.as_str()))
    }
}

/// Coarse outcome of classifying one registry response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Available,
    Active,
    /// Neither availability nor activity markers matched; nothing is logged
    Indeterminate,
}

/// Maps raw registry text to a verdict.
///
/// Implementations must be pure and must never fail.
pub trait ResponseClassifier: Send + Sync {
    fn classify_availability(&self, text: &str) -> bool;

    fn classify_activity(&self, text: &str) -> bool;

    /// Availability takes precedence over activity.
    fn classify(&self, text: &str) -> Classification {
        if self.classify_availability(text) {
            Classification::Available
        } else if self.classify_activity(text) {
            Classification::Active
        } else {
            Classification::Indeterminate
        }
    }
}

const AVAILABLE_MARKERS: &[&str] = &[
    "no data found",
    "no match",
    "not found",
    "no object found",
    "domain not exist",
    "is available for registration",
    "available for registration",
    "free",
    "available",
];

const SUPPRESS_MARKERS: &[&str] = &["available", "free"];

const ACTIVE_MARKERS: &[&str] = &[
    "domain:",
    "status: active",
    "eppstatus: active",
    "domain status",
];

/// Data-driven classifier built from marker rule tables.
#[derive(Debug, Clone)]
pub struct MarkerClassifier {
    availability_rules: Vec<MarkerRule>,
    activity_rules: Vec<MarkerRule>,
}

impl MarkerClassifier {
    /// Classifier with the built-in marker tables.
    pub fn new() -> Self {
        let availability_rules = AVAILABLE_MARKERS
            .iter()
            .map(|m| MarkerRule::new(&[*m], MatchScope::Line, RuleEffect::Available))
            .collect();

        // Order matters: suppressors first, then the explicit record pair,
        // then the single markers.
        let mut activity_rules: Vec<MarkerRule> = SUPPRESS_MARKERS
            .iter()
            .map(|m| MarkerRule::new(&[*m], MatchScope::WholeText, RuleEffect::Suppress))
            .collect();
        activity_rules.push(MarkerRule::new(
            &["domain:", "status: active"],
            MatchScope::WholeText,
            RuleEffect::Active,
        ));
        activity_rules.extend(
            ACTIVE_MARKERS
                .iter()
                .map(|m| MarkerRule::new(&[*m], MatchScope::WholeText, RuleEffect::Active)),
        );

        Self {
            availability_rules,
            activity_rules,
        }
    }

    /// Classifier from explicit rule tables.
    ///
    /// Rules with the wrong scope for their table are still honoured: an
    /// availability rule with `WholeText` scope matches across lines.
    pub fn from_rules(availability_rules: Vec<MarkerRule>, activity_rules: Vec<MarkerRule>) -> Self {
        Self {
            availability_rules,
            activity_rules,
        }
    }

    /// Append an extra line-scoped availability marker.
    pub fn with_available_marker(mut self, marker: &str) -> Self {
        let marker = marker.trim();
        if !marker.is_empty() {
            self.availability_rules
                .push(MarkerRule::new(&[marker], MatchScope::Line, RuleEffect::Available));
        }
        self
    }

    /// Append an extra whole-text activity marker, evaluated after the built-in ones.
    pub fn with_active_marker(mut self, marker: &str) -> Self {
        let marker = marker.trim();
        if !marker.is_empty() {
            self.activity_rules
                .push(MarkerRule::new(&[marker], MatchScope::WholeText, RuleEffect::Active));
        }
        self
    }

    pub fn availability_rules(&self) -> &[MarkerRule] {
        &self.availability_rules
    }

    pub fn activity_rules(&self) -> &[MarkerRule] {
        &self.activity_rules
    }
}

impl Default for MarkerClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseClassifier for MarkerClassifier {
    fn classify_availability(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        let text = text.trim();

        let whole_text_hit = self
            .availability_rules
            .iter()
            .filter(|rule| rule.scope == MatchScope::WholeText)
            .any(|rule| rule.matches(text));
        if whole_text_hit {
            return true;
        }

        text.lines().map(str::trim).any(|line| {
            self.availability_rules
                .iter()
                .filter(|rule| rule.scope == MatchScope::Line)
                .any(|rule| rule.matches(line))
        })
    }

    fn classify_activity(&self, text: &str) -> bool {
        let text = text.to_lowercase();

        for rule in &self.activity_rules {
            let hit = match rule.scope {
                MatchScope::WholeText => rule.matches(&text),
                MatchScope::Line => text.lines().any(|line| rule.matches(line)),
            };
            if hit {
                return match rule.effect {
                    RuleEffect::Active => true,
                    RuleEffect::Suppress | RuleEffect::Available => false,
                };
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_match_line_is_available() {
        let classifier = MarkerClassifier::new();
        assert!(classifier.classify_availability("No match"));
        assert!(classifier.classify_availability("NO MATCH"));
        assert!(classifier.classify_availability("% header\n\nNo match\n>>> footer"));
        assert!(classifier.classify_availability("No match for domain \"EXAMPLE.ZZ\"."));
    }

    #[test]
    fn test_availability_markers() {
        let classifier = MarkerClassifier::new();
        for text in [
            "%% NOT FOUND",
            "No Data Found",
            "Status: free",
            "Domain example.xyz is available for registration",
            "The queried object does not exist: domain not exist",
            "no object found",
        ] {
            assert!(classifier.classify_availability(text), "{text}");
        }
    }

    #[test]
    fn test_registered_record_is_not_available() {
        let classifier = MarkerClassifier::new();
        let text = "Domain Name: EXAMPLE.COM\nRegistrar: RESERVED-Internet Assigned Numbers Authority\nDomain Status: clientDeleteProhibited";
        assert!(!classifier.classify_availability(text));
        assert!(classifier.classify_activity(text));
    }

    #[test]
    fn test_available_substring_suppresses_activity() {
        let classifier = MarkerClassifier::new();
        assert!(!classifier.classify_activity("domain: example.com\nstatus: active\navailable"));
        assert!(!classifier.classify_activity("Domain status: ok (free text)"));
        assert!(!classifier.classify_activity("unavailable"));
        assert!(!classifier.classify_activity("DOMAIN: x\nSTATUS: ACTIVE\nAVAILABLE"));
    }

    #[test]
    fn test_domain_and_active_on_separate_lines() {
        let classifier = MarkerClassifier::new();
        let text = "domain: example.se\nholder: redacted\nstatus: active";
        assert!(classifier.classify_activity(text));
        assert_eq!(classifier.classify(text), Classification::Active);
    }

    #[test]
    fn test_secondary_active_markers() {
        let classifier = MarkerClassifier::new();
        assert!(classifier.classify_activity("eppStatus: active"));
        assert!(classifier.classify_activity("Domain Status: ok"));
        assert!(classifier.classify_activity("Status: Active"));
    }

    #[test]
    fn test_unrecognized_text_is_indeterminate() {
        let classifier = MarkerClassifier::new();
        let text = "connect: Connection refused";
        assert!(!classifier.classify_availability(text));
        assert!(!classifier.classify_activity(text));
        assert_eq!(classifier.classify(text), Classification::Indeterminate);
        assert_eq!(classifier.classify(""), Classification::Indeterminate);
    }

    #[test]
    fn test_availability_wins_over_activity() {
        let classifier = MarkerClassifier::new();
        let text = "Domain: example.zz\nStatus: active\nNot found";
        assert_eq!(classifier.classify(text), Classification::Available);
    }

    #[test]
    fn test_extra_markers_extend_defaults() {
        let classifier = MarkerClassifier::new()
            .with_available_marker("Object does not exist")
            .with_active_marker("registrar:")
            .with_active_marker("   ");

        assert!(classifier.classify_availability("object does not exist"));
        assert!(classifier.classify_activity("Registrar: Example Registrar, Inc."));
        assert!(classifier.classify_availability("no match"));
        assert_eq!(
            classifier.activity_rules().len(),
            MarkerClassifier::new().activity_rules().len() + 1
        );
    }

    #[test]
    fn test_line_scope_requires_same_line() {
        let rule = MarkerRule::new(&["quota", "exceeded"], MatchScope::Line, RuleEffect::Available);
        let classifier = MarkerClassifier::from_rules(vec![rule], Vec::new());
        assert!(classifier.classify_availability("Quota exceeded"));
        assert!(!classifier.classify_availability("quota\nexceeded"));
        assert!(!classifier.classify_activity("anything"));
    }
}
