//! Content compliance scanner: flags regulated-language violations in
//! free-text advertising copy and rewrites it to safe wording.

use crate::phrases::{
    PhraseCatalogue, ViolationCategory, ViolationSeverity, WarningCategory, ELECTRICAL_KEYWORDS,
    GAS_KEYWORDS,
};
use crate::dedup_in_order;
use regex::{Captures, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tradeguard_core::{CertificationKind, GuardError, GuardResult, UserCertifications};

/// Upper bound on replacement passes; a valid catalogue settles in one.
const MAX_REPLACEMENT_PASSES: usize = 8;

/// A blocking finding against banned or regulated language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceViolation {
    pub category: ViolationCategory,
    pub phrase: String,
    pub reason: String,
    pub severity: ViolationSeverity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// An advisory finding. Never affects approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceWarning {
    pub category: WarningCategory,
    pub phrase: String,
    pub concern: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub approved: bool,
    pub violations: Vec<ComplianceViolation>,
    pub warnings: Vec<ComplianceWarning>,
    pub suggestions: Vec<String>,
}

impl ScanResult {
    pub fn has_critical(&self) -> bool {
        self.violations
            .iter()
            .any(|v| v.severity == ViolationSeverity::Critical)
    }

    pub fn violations_by_category(&self) -> HashMap<ViolationCategory, usize> {
        let mut counts = HashMap::new();
        for v in &self.violations {
            *counts.entry(v.category).or_insert(0) += 1;
        }
        counts
    }

    fn finalize(mut self) -> Self {
        self.approved = self.violations.is_empty();
        dedup_in_order(&mut self.suggestions);
        self
    }
}

/// Every replaceable phrase compiled into one alternation, one capture group
/// per phrase, longest phrase first.
struct SafeReplacements {
    pattern: Regex,
    replacements: Vec<String>,
}

impl SafeReplacements {
    fn compile(catalogue: &PhraseCatalogue) -> GuardResult<Option<Self>> {
        let mut pairs: Vec<(&str, &str)> = catalogue
            .banned
            .iter()
            .flat_map(|c| &c.phrases)
            .filter_map(|p| p.replacement.as_deref().map(|r| (p.phrase.as_str(), r)))
            .collect();
        if pairs.is_empty() {
            return Ok(None);
        }
        // Alternation is leftmost-first, so the longest phrase must come first.
        pairs.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        let alternation = pairs
            .iter()
            .map(|(phrase, _)| format!("({})", regex::escape(phrase)))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = RegexBuilder::new(&alternation)
            .case_insensitive(true)
            .build()
            .map_err(|e| GuardError::Config(format!("safe replacement pattern: {e}")))?;

        Ok(Some(Self {
            pattern,
            replacements: pairs.into_iter().map(|(_, r)| r.to_string()).collect(),
        }))
    }

    fn replace_once(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, |caps: &Captures| {
                (1..caps.len())
                    .find(|i| caps.get(*i).is_some())
                    .map(|i| self.replacements[i - 1].clone())
                    .unwrap_or_default()
            })
            .into_owned()
    }
}

/// Content checking as the gate consumes it.
pub trait ContentCheck: Send + Sync {
    /// Scan `text`. Input the checker cannot accept is a `Validation` fault;
    /// any other error is an internal fault of the checker.
    fn check(&self, text: &str) -> GuardResult<ScanResult>;

    fn validate_certification_requirements(
        &self,
        text: &str,
        certs: &UserCertifications,
    ) -> Vec<ComplianceViolation>;
}

/// Stateless scanner over an immutable phrase catalogue.
pub struct ContentComplianceScanner {
    catalogue: PhraseCatalogue,
    replacements: Option<SafeReplacements>,
    max_content_bytes: usize,
}

impl ContentComplianceScanner {
    pub fn new(catalogue: PhraseCatalogue, max_content_bytes: usize) -> GuardResult<Self> {
        catalogue.validate()?;
        let replacements = SafeReplacements::compile(&catalogue)?;

        Ok(Self {
            catalogue,
            replacements,
            max_content_bytes,
        })
    }

    /// Scanner over the UK trades catalogue with the given input limit.
    pub fn uk_trades(max_content_bytes: usize) -> GuardResult<Self> {
        Self::new(PhraseCatalogue::uk_trades(), max_content_bytes)
    }

    pub fn catalogue(&self) -> &PhraseCatalogue {
        &self.catalogue
    }

    /// Scan text for banned and warned phrases. Empty input is approved.
    pub fn scan(&self, text: &str) -> ScanResult {
        let lowered = text.to_lowercase();
        let mut result = ScanResult::default();

        for category in &self.catalogue.banned {
            for entry in &category.phrases {
                let phrase = entry.phrase.to_lowercase();
                if !lowered.contains(&phrase) {
                    continue;
                }
                if let Some(replacement) = &entry.replacement {
                    result
                        .suggestions
                        .push(format!("Replace \"{phrase}\" with \"{replacement}\""));
                }
                result.violations.push(ComplianceViolation {
                    category: category.category,
                    phrase,
                    reason: category.reason.clone(),
                    severity: category.severity,
                    suggestion: entry.replacement.clone(),
                });
            }
        }

        for category in &self.catalogue.warned {
            for phrase in &category.phrases {
                let phrase = phrase.to_lowercase();
                if !lowered.contains(&phrase) {
                    continue;
                }
                result.suggestions.push(category.recommendation.clone());
                result.warnings.push(ComplianceWarning {
                    category: category.category,
                    phrase,
                    concern: category.concern.clone(),
                    recommendation: category.recommendation.clone(),
                });
            }
        }

        result.finalize()
    }

    /// Scan several copy fragments as one piece of content.
    pub fn scan_many<'a, I>(&self, fragments: I) -> ScanResult
    where
        I: IntoIterator<Item = &'a str>,
    {
        let joined = fragments.into_iter().collect::<Vec<_>>().join("\n");
        self.scan(&joined)
    }

    /// Like [`scan`](Self::scan) but rejects input the scanner is not sized for.
    pub fn check(&self, text: &str) -> GuardResult<ScanResult> {
        if text.len() > self.max_content_bytes {
            return Err(GuardError::Validation(format!(
                "content is {} bytes, limit is {}",
                text.len(),
                self.max_content_bytes
            )));
        }
        Ok(self.scan(text))
    }

    /// Substitute every banned phrase that has a catalogue replacement.
    /// Matching is case-insensitive and global. The output is a fixpoint, so
    /// it contains no replaceable banned phrase; text that does not settle
    /// within the pass limit is an `Internal` fault.
    pub fn apply_safe_replacements(&self, text: &str) -> GuardResult<String> {
        let Some(replacements) = &self.replacements else {
            return Ok(text.to_string());
        };
        let mut current = text.to_string();
        for _ in 0..MAX_REPLACEMENT_PASSES {
            if !replacements.pattern.is_match(&current) {
                return Ok(current);
            }
            current = replacements.replace_once(&current);
        }
        if replacements.pattern.is_match(&current) {
            return Err(GuardError::Internal(anyhow::anyhow!(
                "safe replacement did not settle after {MAX_REPLACEMENT_PASSES} passes"
            )));
        }
        Ok(current)
    }

    /// Flag gas or notifiable electrical work mentioned without the matching
    /// certification, and always flag unverified public liability insurance.
    pub fn validate_certification_requirements(
        &self,
        text: &str,
        certs: &UserCertifications,
    ) -> Vec<ComplianceViolation> {
        let lowered = text.to_lowercase();
        let mut violations = Vec::new();

        if certs.status(CertificationKind::GasSafe).is_blocking() {
            if let Some(keyword) = GAS_KEYWORDS.iter().find(|k| lowered.contains(*k)) {
                violations.push(ComplianceViolation {
                    category: ViolationCategory::MissingCertification,
                    phrase: keyword.to_string(),
                    reason: "Gas work is advertised without a verified Gas Safe registration"
                        .to_string(),
                    severity: ViolationSeverity::Critical,
                    suggestion: Some(
                        "Remove gas work from the advert until Gas Safe registration is verified"
                            .to_string(),
                    ),
                });
            }
        }

        if certs.status(CertificationKind::PartP).is_blocking() {
            if let Some(keyword) = ELECTRICAL_KEYWORDS.iter().find(|k| lowered.contains(*k)) {
                violations.push(ComplianceViolation {
                    category: ViolationCategory::MissingCertification,
                    phrase: keyword.to_string(),
                    reason: "Notifiable electrical work is advertised without Part P certification"
                        .to_string(),
                    severity: ViolationSeverity::Critical,
                    suggestion: Some(
                        "Remove notifiable electrical work until Part P certification is verified"
                            .to_string(),
                    ),
                });
            }
        }

        if !certs.status(CertificationKind::Insurance).is_verified() {
            violations.push(ComplianceViolation {
                category: ViolationCategory::MissingCertification,
                phrase: "public liability insurance".to_string(),
                reason: "Public liability insurance has not been verified".to_string(),
                severity: ViolationSeverity::High,
                suggestion: Some("Upload a current public liability insurance certificate".to_string()),
            });
        }

        violations
    }
}

impl ContentCheck for ContentComplianceScanner {
    fn check(&self, text: &str) -> GuardResult<ScanResult> {
        ContentComplianceScanner::check(self, text)
    }

    fn validate_certification_requirements(
        &self,
        text: &str,
        certs: &UserCertifications,
    ) -> Vec<ComplianceViolation> {
        ContentComplianceScanner::validate_certification_requirements(self, text, certs)
    }
}
