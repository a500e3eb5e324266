//! Management domain types: campaigns, ad groups, approval status and the
//! append-only approval action log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tradeguard_core::{AdCopy, CampaignData, GuardError, GuardResult, ServiceArea, TradeType};
use uuid::Uuid;

// ─── Campaign ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: Uuid,
    pub name: String,
    pub trade_type: TradeType,
    #[serde(default)]
    pub service_area: ServiceArea,
    #[serde(default)]
    pub services: Vec<String>,
    pub budget: CampaignBudget,
    #[serde(default)]
    pub ad_groups: Vec<AdGroup>,
    #[serde(default)]
    pub compliance_level: ComplianceLevel,
    pub created_at: DateTime<Utc>,
}

impl Campaign {
    /// Flatten ad groups into the structure the rule validator checks.
    pub fn to_campaign_data(&self) -> CampaignData {
        let mut ad_copy = AdCopy::default();
        let mut keywords = Vec::new();
        for group in &self.ad_groups {
            ad_copy.headlines.extend(group.headlines.iter().cloned());
            ad_copy.descriptions.extend(group.descriptions.iter().cloned());
            keywords.extend(group.keywords.iter().cloned());
        }
        CampaignData {
            trade_type: self.trade_type,
            service_area: self.service_area.clone(),
            services: self.services.clone(),
            ad_copy,
            keywords,
        }
    }

    /// All headlines and descriptions, for the content scanner.
    pub fn copy_fragments(&self) -> impl Iterator<Item = &str> {
        self.ad_groups.iter().flat_map(|g| {
            g.headlines
                .iter()
                .chain(&g.descriptions)
                .map(String::as_str)
        })
    }

    pub fn total_keywords(&self) -> usize {
        self.ad_groups.iter().map(|g| g.keywords.len()).sum()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdGroup {
    pub name: String,
    #[serde(default)]
    pub headlines: Vec<String>,
    #[serde(default)]
    pub descriptions: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BudgetPeriod {
    Daily,
    Weekly,
    Monthly,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CampaignBudget {
    pub amount: f64,
    pub period: BudgetPeriod,
}

impl CampaignBudget {
    pub fn monthly(amount: f64) -> Self {
        Self {
            amount,
            period: BudgetPeriod::Monthly,
        }
    }

    pub fn daily(amount: f64) -> Self {
        Self {
            amount,
            period: BudgetPeriod::Daily,
        }
    }

    /// Budget normalised to a month of `days_per_month` days.
    pub fn monthly_equivalent(&self, days_per_month: f64) -> f64 {
        match self.period {
            BudgetPeriod::Daily => self.amount * days_per_month,
            BudgetPeriod::Weekly => self.amount * days_per_month / 7.0,
            BudgetPeriod::Monthly => self.amount,
        }
    }
}

/// Overall compliance rating of a campaign's content.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ComplianceLevel {
    #[default]
    Low,
    Medium,
    High,
}

// ─── Approval state machine ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalState {
    #[default]
    Draft,
    PendingReview,
    PendingChanges,
    Approved,
    Rejected,
    Live,
}

impl ApprovalState {
    pub fn as_str(self) -> &'static str {
        match self {
            ApprovalState::Draft => "draft",
            ApprovalState::PendingReview => "pending_review",
            ApprovalState::PendingChanges => "pending_changes",
            ApprovalState::Approved => "approved",
            ApprovalState::Rejected => "rejected",
            ApprovalState::Live => "live",
        }
    }

    /// Draft and pending review accept every decision.
    pub fn is_awaiting_decision(self) -> bool {
        matches!(self, ApprovalState::Draft | ApprovalState::PendingReview)
    }

    /// Decided campaigns never leave these states through the workflow.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ApprovalState::Approved | ApprovalState::Rejected | ApprovalState::Live
        )
    }

    pub fn is_pending(self) -> bool {
        !self.is_terminal()
    }

    /// Target state for `action`, or `InvalidTransition` when the move is illegal.
    pub fn next(self, action: ApprovalActionKind, go_live: bool) -> GuardResult<ApprovalState> {
        match (self, action) {
            (s, ApprovalActionKind::Approve) if s.is_awaiting_decision() => Ok(if go_live {
                ApprovalState::Live
            } else {
                ApprovalState::Approved
            }),
            (s, ApprovalActionKind::Reject) if s.is_awaiting_decision() => {
                Ok(ApprovalState::Rejected)
            }
            (s, ApprovalActionKind::RequestChanges) if s.is_awaiting_decision() => {
                Ok(ApprovalState::PendingChanges)
            }
            (
                ApprovalState::Draft | ApprovalState::PendingReview | ApprovalState::PendingChanges,
                ApprovalActionKind::Revise,
            ) => Ok(ApprovalState::PendingReview),
            (from, action) => Err(GuardError::InvalidTransition {
                from: from.to_string(),
                action: action.to_string(),
            }),
        }
    }

    pub fn can_transition(self, action: ApprovalActionKind) -> bool {
        self.next(action, false).is_ok()
    }
}

impl fmt::Display for ApprovalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalActionKind {
    Approve,
    Reject,
    RequestChanges,
    Revise,
}

impl fmt::Display for ApprovalActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ApprovalActionKind::Approve => "approve",
            ApprovalActionKind::Reject => "reject",
            ApprovalActionKind::RequestChanges => "request_changes",
            ApprovalActionKind::Revise => "revise",
        })
    }
}

/// One immutable entry in a campaign's approval audit trail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CampaignApprovalAction {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub action: ApprovalActionKind,
    pub acting_user_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CampaignApprovalStatus {
    pub status: ApprovalState,
    #[serde(default)]
    pub approved_by: Option<String>,
    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rejected_by: Option<String>,
    #[serde(default)]
    pub rejected_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub changes_requested: Vec<String>,
    #[serde(default)]
    pub revision_count: u32,
    pub last_modified: DateTime<Utc>,
    #[serde(default)]
    pub history: Vec<CampaignApprovalAction>,
}

impl CampaignApprovalStatus {
    pub fn draft(now: DateTime<Utc>) -> Self {
        Self {
            status: ApprovalState::Draft,
            approved_by: None,
            approved_at: None,
            rejected_by: None,
            rejected_at: None,
            rejection_reason: None,
            changes_requested: Vec::new(),
            revision_count: 0,
            last_modified: now,
            history: Vec::new(),
        }
    }
}

/// A campaign with its approval status; the workflow's unit of mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignWithApproval {
    pub campaign: Campaign,
    pub approval: CampaignApprovalStatus,
}

impl CampaignWithApproval {
    pub fn id(&self) -> Uuid {
        self.campaign.id
    }

    pub fn status(&self) -> ApprovalState {
        self.approval.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_table() {
        use ApprovalActionKind::*;
        use ApprovalState::*;

        for from in [Draft, PendingReview] {
            assert_eq!(from.next(Approve, false).unwrap(), Approved);
            assert_eq!(from.next(Approve, true).unwrap(), Live);
            assert_eq!(from.next(Reject, false).unwrap(), Rejected);
            assert_eq!(from.next(RequestChanges, false).unwrap(), PendingChanges);
            assert_eq!(from.next(Revise, false).unwrap(), PendingReview);
        }

        assert_eq!(PendingChanges.next(Revise, false).unwrap(), PendingReview);
        for action in [Approve, Reject, RequestChanges] {
            assert!(!PendingChanges.can_transition(action));
        }

        for terminal in [Approved, Rejected, Live] {
            for action in [Approve, Reject, RequestChanges, Revise] {
                assert!(terminal.next(action, false).is_err());
            }
        }
    }

    #[test]
    fn test_monthly_equivalent() {
        let days = 30.4;
        assert!((CampaignBudget::daily(5.0).monthly_equivalent(days) - 152.0).abs() < 1e-9);
        assert!((CampaignBudget::monthly(80.0).monthly_equivalent(days) - 80.0).abs() < 1e-9);
        let weekly = CampaignBudget {
            amount: 70.0,
            period: BudgetPeriod::Weekly,
        };
        assert!((weekly.monthly_equivalent(days) - 304.0).abs() < 1e-9);
    }

    #[test]
    fn test_state_serializes_snake_case() {
        let value = serde_json::to_value(ApprovalState::PendingChanges).unwrap();
        assert_eq!(value, serde_json::json!("pending_changes"));
        let value = serde_json::to_value(ApprovalActionKind::RequestChanges).unwrap();
        assert_eq!(value, serde_json::json!("request_changes"));
    }
}
