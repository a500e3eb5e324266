//! Compliance evaluators for regulated-trade advertising: the content
//! scanner, the certification requirement engine and the regulatory rule
//! validator. All three are stateless over catalogues fixed at construction,
//! so a single instance can be shared across threads without locking.

pub mod certification;
pub mod phrases;
pub mod rules;
pub mod scanner;

pub use certification::{
    BlockedService, CertificationCheckResult, CertificationRequirementEngine, ServiceCatalogue,
    ServiceRequirement,
};
pub use phrases::{
    BannedCategory, BannedPhrase, PhraseCatalogue, ViolationCategory, ViolationSeverity,
    WarningCategory,
};
pub use rules::{
    ComplianceCheck, ComplianceRule, ComplianceRuleValidator, RuleCategory, RuleKind,
    RuleSeverity, ValidationSummary,
};
pub use scanner::{
    ComplianceViolation, ComplianceWarning, ContentCheck, ContentComplianceScanner, ScanResult,
};

/// Drop repeated entries, keeping the first occurrence of each.
pub(crate) fn dedup_in_order(items: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    items.retain(|item| seen.insert(item.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_in_order_keeps_first_occurrence() {
        let mut items: Vec<String> = ["b", "a", "b", "c", "a"].iter().map(|s| s.to_string()).collect();
        dedup_in_order(&mut items);
        assert_eq!(items, vec!["b", "a", "c"]);
    }
}
