//! Structured regulatory rule validation over a campaign's full data.
//!
//! Every rule applicable to the campaign's trade produces exactly one
//! [`ComplianceCheck`]; rules whose trigger is absent pass as "not applicable".

use serde::{Deserialize, Serialize};
use tradeguard_core::{CampaignData, TradeType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleSeverity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleCategory {
    Legal,
    Safety,
    Advertising,
    Location,
}

/// Which predicate a rule runs. Closed so the catalogue cannot name a check
/// the validator does not implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    GasSafeMention,
    PartPCompliance,
    AbsoluteClaims,
    LondonLowEmissionZone,
    ServiceAreaDefined,
    FreeOfferTerms,
    EmergencyQualification,
    TradeBodyClaims,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceRule {
    pub id: String,
    pub kind: RuleKind,
    pub title: String,
    pub description: String,
    pub severity: RuleSeverity,
    pub category: RuleCategory,
    pub trade_types: Vec<TradeType>,
}

impl ComplianceRule {
    pub fn applies_to(&self, trade: TradeType) -> bool {
        self.trade_types.contains(&trade)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceCheck {
    pub rule: ComplianceRule,
    pub passed: bool,
    /// False when the rule's trigger was absent from the campaign.
    pub applicable: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
}

/// Counts a caller can show next to a list of checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSummary {
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
    pub passed: usize,
}

impl ValidationSummary {
    pub fn from_checks(checks: &[ComplianceCheck]) -> Self {
        let mut summary = Self::default();
        for check in checks {
            if check.passed {
                summary.passed += 1;
            }
            match check.rule.severity {
                RuleSeverity::Error if !check.passed => summary.errors += 1,
                RuleSeverity::Warning if !check.passed => summary.warnings += 1,
                RuleSeverity::Info if check.applicable => summary.info += 1,
                _ => {}
            }
        }
        summary
    }

    pub fn is_compliant(&self) -> bool {
        self.errors == 0
    }
}

const GAS_TRIGGERS: &[&str] = &["gas", "boiler", "heating"];
const NOTIFIABLE_TRIGGERS: &[&str] = &[
    "rewiring",
    "consumer unit",
    "electrical installation",
    "fuse box",
];
const PART_P_MENTIONS: &[&str] = &["part p", "building regulations", "compliant", "compliance"];
const ABSOLUTE_CLAIMS: &[&str] = &[
    "cheapest",
    "best in uk",
    "guaranteed lowest",
    "always available",
    "instant",
    "100% guaranteed",
];
const FREE_TRIGGERS: &[&str] = &["free"];
const FREE_QUALIFIERS: &[&str] = &["terms", "conditions", "no obligation", "no-obligation", "t&c"];
const EMERGENCY_TRIGGERS: &[&str] = &["emergency"];
const EMERGENCY_QUALIFIERS: &[&str] = &["subject to availability", "where possible", "when available"];
const TRADE_BODY_TRIGGERS: &[&str] = &["niceic", "napit", "checkatrade", "trustmark", "which? trusted"];

fn found<'a>(text: &str, needles: &[&'a str]) -> Vec<&'a str> {
    needles.iter().copied().filter(|n| text.contains(n)).collect()
}

fn rule(
    id: &str,
    kind: RuleKind,
    title: &str,
    description: &str,
    severity: RuleSeverity,
    category: RuleCategory,
    trade_types: &[TradeType],
) -> ComplianceRule {
    ComplianceRule {
        id: id.to_string(),
        kind,
        title: title.to_string(),
        description: description.to_string(),
        severity,
        category,
        trade_types: trade_types.to_vec(),
    }
}

/// Stateless validator over an immutable rule catalogue.
pub struct ComplianceRuleValidator {
    rules: Vec<ComplianceRule>,
}

impl ComplianceRuleValidator {
    pub fn new(rules: Vec<ComplianceRule>) -> Self {
        Self { rules }
    }

    /// UK regulatory catalogue for plumbing, heating and electrical advertising.
    pub fn uk_trades() -> Self {
        use TradeType::{Electrical, General, Heating, Plumbing};
        let all = &TradeType::ALL;

        Self::new(vec![
            rule(
                "gas-safe-mention",
                RuleKind::GasSafeMention,
                "Gas Safe registration must be stated",
                "Adverts for gas work must state Gas Safe registration",
                RuleSeverity::Error,
                RuleCategory::Safety,
                &[Plumbing, Heating, General],
            ),
            rule(
                "part-p-compliance",
                RuleKind::PartPCompliance,
                "Part P compliance must be stated",
                "Adverts for notifiable electrical work must reference Part P compliance",
                RuleSeverity::Error,
                RuleCategory::Safety,
                &[Electrical, General],
            ),
            rule(
                "absolute-claims",
                RuleKind::AbsoluteClaims,
                "No unsubstantiated absolute claims",
                "Superlative and absolute claims must be substantiated under the CAP Code",
                RuleSeverity::Error,
                RuleCategory::Advertising,
                all,
            ),
            rule(
                "london-lez",
                RuleKind::LondonLowEmissionZone,
                "London Low Emission Zone notice",
                "Vans operating in London may incur ULEZ charges that affect call-out pricing",
                RuleSeverity::Info,
                RuleCategory::Location,
                all,
            ),
            rule(
                "service-area-defined",
                RuleKind::ServiceAreaDefined,
                "Service area must be defined",
                "Location-targeted adverts need a concrete service area",
                RuleSeverity::Warning,
                RuleCategory::Location,
                all,
            ),
            rule(
                "free-offer-terms",
                RuleKind::FreeOfferTerms,
                "Free offers must state their terms",
                "Anything described as free must make its conditions clear",
                RuleSeverity::Warning,
                RuleCategory::Legal,
                all,
            ),
            rule(
                "emergency-qualification",
                RuleKind::EmergencyQualification,
                "Emergency response must be qualified",
                "Emergency call-out claims must not promise unconditional availability",
                RuleSeverity::Warning,
                RuleCategory::Advertising,
                all,
            ),
            rule(
                "trade-body-claims",
                RuleKind::TradeBodyClaims,
                "Trade body membership must be verifiable",
                "Named trade body memberships must be current and verifiable",
                RuleSeverity::Warning,
                RuleCategory::Legal,
                all,
            ),
        ])
    }

    pub fn rules(&self) -> &[ComplianceRule] {
        &self.rules
    }

    pub fn rules_for(&self, trade: TradeType) -> impl Iterator<Item = &ComplianceRule> {
        self.rules.iter().filter(move |r| r.applies_to(trade))
    }

    /// One check per rule applicable to the campaign's trade, in catalogue order.
    pub fn validate(&self, campaign: &CampaignData) -> Vec<ComplianceCheck> {
        let text = campaign.searchable_text();
        self.rules_for(campaign.trade_type)
            .map(|rule| evaluate(rule, campaign, &text))
            .collect()
    }
}

impl Default for ComplianceRuleValidator {
    fn default() -> Self {
        Self::uk_trades()
    }
}

struct Outcome {
    passed: bool,
    applicable: bool,
    message: String,
    suggestions: Vec<String>,
}

impl Outcome {
    fn not_applicable(what: &str) -> Self {
        Self {
            passed: true,
            applicable: false,
            message: format!("Not applicable: {what}"),
            suggestions: Vec::new(),
        }
    }

    fn pass(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            applicable: true,
            message: message.into(),
            suggestions: Vec::new(),
        }
    }

    fn fail(message: impl Into<String>, suggestions: Vec<String>) -> Self {
        Self {
            passed: false,
            applicable: true,
            message: message.into(),
            suggestions,
        }
    }
}

fn evaluate(rule: &ComplianceRule, campaign: &CampaignData, text: &str) -> ComplianceCheck {
    let outcome = match rule.kind {
        RuleKind::GasSafeMention => {
            if found(text, GAS_TRIGGERS).is_empty() {
                Outcome::not_applicable("no gas work advertised")
            } else if text.contains("gas safe") {
                Outcome::pass("Gas work advertised with Gas Safe registration stated")
            } else {
                Outcome::fail(
                    "Gas work is advertised without mentioning Gas Safe registration",
                    vec![
                        "Add \"Gas Safe registered\" to a headline or description".to_string(),
                        "Include your Gas Safe registration number".to_string(),
                    ],
                )
            }
        }
        RuleKind::PartPCompliance => {
            if found(text, NOTIFIABLE_TRIGGERS).is_empty() {
                Outcome::not_applicable("no notifiable electrical work advertised")
            } else if !found(text, PART_P_MENTIONS).is_empty() {
                Outcome::pass("Notifiable electrical work advertised with Part P compliance stated")
            } else {
                Outcome::fail(
                    "Notifiable electrical work is advertised without Part P compliance",
                    vec![
                        "Mention \"Part P compliant\" in the advert".to_string(),
                        "State that work is certified under Building Regulations".to_string(),
                    ],
                )
            }
        }
        RuleKind::AbsoluteClaims => {
            let claims = found(text, ABSOLUTE_CLAIMS);
            if claims.is_empty() {
                Outcome::pass("No absolute claims found")
            } else {
                Outcome::fail(
                    format!("Unsubstantiated absolute claims: {}", claims.join(", ")),
                    vec![
                        "Use \"competitive pricing\" instead of price superlatives".to_string(),
                        "Use \"fast response where possible\" instead of instant or always-on promises"
                            .to_string(),
                        "Use \"highly rated\" with a cited source instead of \"best\"".to_string(),
                    ],
                )
            }
        }
        RuleKind::LondonLowEmissionZone => {
            if campaign
                .service_area
                .location
                .to_lowercase()
                .contains("london")
            {
                Outcome {
                    passed: true,
                    applicable: true,
                    message: "Service area is inside London; ULEZ charges may apply to call-outs"
                        .to_string(),
                    suggestions: vec![
                        "Confirm your vans are ULEZ compliant or factor charges into call-out fees"
                            .to_string(),
                    ],
                }
            } else {
                Outcome::not_applicable("service area is outside London")
            }
        }
        RuleKind::ServiceAreaDefined => {
            if campaign.service_area.is_defined() {
                Outcome::pass("Service area is defined")
            } else {
                Outcome::fail(
                    "No service area is defined for this campaign",
                    vec!["Set a town, city or list of postcodes you cover".to_string()],
                )
            }
        }
        RuleKind::FreeOfferTerms => {
            if found(text, FREE_TRIGGERS).is_empty() {
                Outcome::not_applicable("no free offers advertised")
            } else if !found(text, FREE_QUALIFIERS).is_empty() {
                Outcome::pass("Free offer is qualified with terms")
            } else {
                Outcome::fail(
                    "A free offer is advertised without stating its terms",
                    vec!["Add \"no obligation\" or a short note of the conditions".to_string()],
                )
            }
        }
        RuleKind::EmergencyQualification => {
            if found(text, EMERGENCY_TRIGGERS).is_empty() {
                Outcome::not_applicable("no emergency service advertised")
            } else if !found(text, EMERGENCY_QUALIFIERS).is_empty() {
                Outcome::pass("Emergency service claims are qualified")
            } else {
                Outcome::fail(
                    "Emergency service is advertised without qualifying availability",
                    vec!["Add \"subject to availability\" to emergency call-out claims".to_string()],
                )
            }
        }
        RuleKind::TradeBodyClaims => {
            let bodies = found(text, TRADE_BODY_TRIGGERS);
            if bodies.is_empty() {
                Outcome::not_applicable("no trade bodies named")
            } else {
                Outcome::fail(
                    format!("Trade body membership claimed: {}", bodies.join(", ")),
                    vec!["Confirm membership is current and keep the certificate on file".to_string()],
                )
            }
        }
    };

    ComplianceCheck {
        rule: rule.clone(),
        passed: outcome.passed,
        applicable: outcome.applicable,
        message: outcome.message,
        suggestions: if outcome.suggestions.is_empty() {
            None
        } else {
            Some(outcome.suggestions)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradeguard_core::{AdCopy, ServiceArea};

    fn campaign(trade: TradeType, location: &str, headlines: &[&str]) -> CampaignData {
        CampaignData {
            trade_type: trade,
            service_area: ServiceArea {
                location: location.to_string(),
                radius_miles: Some(10),
                postcodes: vec![],
            },
            services: vec![],
            ad_copy: AdCopy {
                headlines: headlines.iter().map(|s| s.to_string()).collect(),
                descriptions: vec![],
            },
            keywords: vec![],
        }
    }

    fn check<'a>(checks: &'a [ComplianceCheck], kind: RuleKind) -> &'a ComplianceCheck {
        checks.iter().find(|c| c.rule.kind == kind).unwrap()
    }

    #[test]
    fn test_one_check_per_applicable_rule() {
        let validator = ComplianceRuleValidator::uk_trades();
        let plumbing = validator.validate(&campaign(TradeType::Plumbing, "Leeds", &["Local plumber"]));
        assert_eq!(plumbing.len(), 7);
        assert!(plumbing.iter().all(|c| c.rule.kind != RuleKind::PartPCompliance));

        let electrical =
            validator.validate(&campaign(TradeType::Electrical, "Leeds", &["Local electrician"]));
        assert_eq!(electrical.len(), 7);
        assert!(electrical.iter().all(|c| c.rule.kind != RuleKind::GasSafeMention));

        let general = validator.validate(&campaign(TradeType::General, "Leeds", &["Handyman"]));
        assert_eq!(general.len(), 8);
    }

    #[test]
    fn test_gas_content_requires_gas_safe_mention() {
        let validator = ComplianceRuleValidator::uk_trades();
        let checks = validator.validate(&campaign(TradeType::Heating, "York", &["Boiler servicing"]));
        let gas = check(&checks, RuleKind::GasSafeMention);
        assert!(!gas.passed);
        assert_eq!(gas.suggestions.as_ref().map(Vec::len), Some(2));

        let checks = validator.validate(&campaign(
            TradeType::Heating,
            "York",
            &["Boiler servicing", "Gas Safe registered"],
        ));
        assert!(check(&checks, RuleKind::GasSafeMention).passed);
    }

    #[test]
    fn test_notifiable_electrical_requires_part_p() {
        let validator = ComplianceRuleValidator::uk_trades();
        let checks =
            validator.validate(&campaign(TradeType::Electrical, "York", &["Consumer unit upgrades"]));
        assert!(!check(&checks, RuleKind::PartPCompliance).passed);

        let checks = validator.validate(&campaign(
            TradeType::Electrical,
            "York",
            &["Consumer unit upgrades", "Part P compliant"],
        ));
        assert!(check(&checks, RuleKind::PartPCompliance).passed);
    }

    #[test]
    fn test_absent_trigger_passes_as_not_applicable() {
        let validator = ComplianceRuleValidator::uk_trades();
        let checks = validator.validate(&campaign(TradeType::Plumbing, "York", &["Leaking taps fixed"]));
        let gas = check(&checks, RuleKind::GasSafeMention);
        assert!(gas.passed);
        assert!(!gas.applicable);
        assert!(gas.message.starts_with("Not applicable"));
    }

    #[test]
    fn test_absolute_claims_fail_hard() {
        let validator = ComplianceRuleValidator::uk_trades();
        let checks = validator.validate(&campaign(
            TradeType::Plumbing,
            "York",
            &["Cheapest plumber", "Instant quotes"],
        ));
        let claims = check(&checks, RuleKind::AbsoluteClaims);
        assert!(!claims.passed);
        assert_eq!(claims.rule.severity, RuleSeverity::Error);
        assert_eq!(claims.message, "Unsubstantiated absolute claims: cheapest, instant");
    }

    #[test]
    fn test_london_notice_is_informational() {
        let validator = ComplianceRuleValidator::uk_trades();
        let checks = validator.validate(&campaign(TradeType::Plumbing, "North London", &["Plumber"]));
        let lez = check(&checks, RuleKind::LondonLowEmissionZone);
        assert!(lez.passed);
        assert!(lez.applicable);
        assert!(lez.message.contains("ULEZ"));

        let summary = ValidationSummary::from_checks(&checks);
        assert_eq!(summary.info, 1);
        assert_eq!(summary.errors, 0);
        assert!(summary.is_compliant());
    }

    #[test]
    fn test_summary_counts_failures_by_severity() {
        let validator = ComplianceRuleValidator::uk_trades();
        let checks = validator.validate(&campaign(
            TradeType::Plumbing,
            "",
            &["Free boiler quotes", "Cheapest in town", "Emergency call outs"],
        ));
        let summary = ValidationSummary::from_checks(&checks);
        // gas-safe + absolute claims
        assert_eq!(summary.errors, 2);
        // service area + free offer + emergency
        assert_eq!(summary.warnings, 3);
        assert_eq!(summary.info, 0);
        assert_eq!(summary.passed, 2);
        assert!(!summary.is_compliant());
    }
}
