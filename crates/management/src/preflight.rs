//! Pre-approval checks on a campaign's structure and budget.
//!
//! Advisory: callers should refuse to approve when `errors` is non-empty,
//! but the workflow itself does not enforce it.

use crate::models::{Campaign, ComplianceLevel};
use serde::{Deserialize, Serialize};
use tradeguard_core::config::ApprovalConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

pub fn validate_for_approval(campaign: &Campaign, config: &ApprovalConfig) -> ApprovalValidation {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if campaign.compliance_level == ComplianceLevel::Low {
        errors.push("Campaign compliance level is too low for approval".to_string());
    }

    if campaign.ad_groups.is_empty() {
        errors.push("Campaign must have at least one ad group".to_string());
    }

    for group in &campaign.ad_groups {
        let headlines = group.headlines.len();
        if headlines == 0 {
            errors.push(format!(
                "Ad group '{}' must have at least one headline",
                group.name
            ));
        } else if headlines < config.min_headlines_per_group {
            warnings.push(format!(
                "Ad group '{}' has fewer than {} headlines",
                group.name, config.min_headlines_per_group
            ));
        }
    }

    let monthly = campaign.budget.monthly_equivalent(config.days_per_month);
    if monthly < config.min_monthly_budget {
        warnings.push(format!(
            "Monthly budget of £{:.2} is below the recommended minimum of £{:.2}",
            monthly, config.min_monthly_budget
        ));
    }

    let keywords = campaign.total_keywords();
    if keywords < config.min_total_keywords {
        warnings.push(format!(
            "Campaign has {} keywords; at least {} are recommended",
            keywords, config.min_total_keywords
        ));
    }

    ApprovalValidation {
        is_valid: errors.is_empty(),
        errors,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AdGroup, CampaignBudget};
    use chrono::Utc;
    use tradeguard_core::TradeType;
    use uuid::Uuid;

    fn group(name: &str, headlines: usize, keywords: usize) -> AdGroup {
        AdGroup {
            name: name.to_string(),
            headlines: (0..headlines).map(|i| format!("Headline {i}")).collect(),
            descriptions: vec!["Local, friendly plumbers".to_string()],
            keywords: (0..keywords).map(|i| format!("keyword {i}")).collect(),
        }
    }

    fn campaign(groups: Vec<AdGroup>, budget: CampaignBudget, level: ComplianceLevel) -> Campaign {
        Campaign {
            id: Uuid::new_v4(),
            name: "Leak repairs".to_string(),
            trade_type: TradeType::Plumbing,
            service_area: Default::default(),
            services: vec![],
            budget,
            ad_groups: groups,
            compliance_level: level,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_draft_without_ad_groups_is_invalid() {
        let c = campaign(vec![], CampaignBudget::monthly(500.0), ComplianceLevel::High);
        let result = validate_for_approval(&c, &ApprovalConfig::default());
        assert!(!result.is_valid);
        assert!(result
            .errors
            .contains(&"Campaign must have at least one ad group".to_string()));
    }

    #[test]
    fn test_low_compliance_and_empty_headlines_are_errors() {
        let c = campaign(
            vec![group("Taps", 0, 6)],
            CampaignBudget::monthly(500.0),
            ComplianceLevel::Low,
        );
        let result = validate_for_approval(&c, &ApprovalConfig::default());
        assert_eq!(
            result.errors,
            vec![
                "Campaign compliance level is too low for approval",
                "Ad group 'Taps' must have at least one headline"
            ]
        );
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_warnings_do_not_invalidate() {
        let c = campaign(
            vec![group("Leaks", 2, 3)],
            CampaignBudget::daily(3.0),
            ComplianceLevel::Medium,
        );
        let result = validate_for_approval(&c, &ApprovalConfig::default());
        assert!(result.is_valid);
        assert_eq!(
            result.warnings,
            vec![
                "Ad group 'Leaks' has fewer than 3 headlines",
                "Monthly budget of £91.20 is below the recommended minimum of £100.00",
                "Campaign has 3 keywords; at least 5 are recommended"
            ]
        );
    }

    #[test]
    fn test_well_formed_campaign_is_clean() {
        let c = campaign(
            vec![group("Leaks", 3, 3), group("Drains", 4, 2)],
            CampaignBudget::daily(5.0),
            ComplianceLevel::High,
        );
        let result = validate_for_approval(&c, &ApprovalConfig::default());
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }
}
