//! Campaign approval workflow.
//!
//! Every operation is copy-on-write: it takes the current
//! [`CampaignWithApproval`], appends one [`CampaignApprovalAction`] to the
//! history and returns a new record. The input is never mutated, so readers
//! holding the old record never observe a partial update. Whether a campaign
//! *should* be approved is decided elsewhere (see [`crate::gate`]); this
//! module only enforces which transitions are legal.

use crate::models::{
    ApprovalActionKind, ApprovalState, Campaign, CampaignApprovalAction, CampaignApprovalStatus,
    CampaignWithApproval,
};
use crate::preflight::{self, ApprovalValidation};
use crate::reporting::{self, ApprovalMetrics};
use chrono::Utc;
use serde_json::json;
use std::collections::HashMap;
use tracing::info;
use tradeguard_core::config::ApprovalConfig;
use tradeguard_core::{GuardError, GuardResult};
use uuid::Uuid;

/// Options for [`CampaignApprovalWorkflow::approve_campaign`].
#[derive(Debug, Clone, Default)]
pub struct ApproveOptions {
    /// Publish immediately: the campaign goes to `live` instead of `approved`.
    pub go_live: bool,
    /// Reviewer notes, recorded in the action metadata.
    pub notes: Option<String>,
}

/// Input to [`CampaignApprovalWorkflow::revise_campaign`].
#[derive(Debug, Clone, Default)]
pub struct Revision {
    /// Replacement campaign content. Must keep the same campaign id.
    pub campaign: Option<Campaign>,
    pub notes: Option<String>,
}

struct ActionInput {
    reason: Option<String>,
    changes: Option<Vec<String>>,
    metadata: HashMap<String, serde_json::Value>,
}

/// Finite-state approval lifecycle over caller-owned campaign records.
pub struct CampaignApprovalWorkflow {
    config: ApprovalConfig,
}

impl CampaignApprovalWorkflow {
    pub fn new(config: ApprovalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ApprovalConfig {
        &self.config
    }

    /// Wrap a freshly generated campaign in a `draft` approval status.
    pub fn create_draft(&self, campaign: Campaign) -> CampaignWithApproval {
        info!(campaign_id = %campaign.id, name = %campaign.name, "campaign draft created");
        CampaignWithApproval {
            campaign,
            approval: CampaignApprovalStatus::draft(Utc::now()),
        }
    }

    pub fn approve_campaign(
        &self,
        record: &CampaignWithApproval,
        acting_user_id: &str,
        options: ApproveOptions,
    ) -> GuardResult<CampaignWithApproval> {
        let mut metadata = HashMap::new();
        if let Some(notes) = options.notes {
            metadata.insert("notes".to_string(), json!(notes));
        }
        metadata.insert("goLive".to_string(), json!(options.go_live));

        self.transition(
            record,
            acting_user_id,
            ApprovalActionKind::Approve,
            options.go_live,
            ActionInput {
                reason: None,
                changes: None,
                metadata,
            },
            |status, action| {
                status.approved_by = Some(action.acting_user_id.clone());
                status.approved_at = Some(action.timestamp);
            },
        )
    }

    pub fn reject_campaign(
        &self,
        record: &CampaignWithApproval,
        acting_user_id: &str,
        reason: &str,
    ) -> GuardResult<CampaignWithApproval> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(GuardError::Validation(
                "a rejection reason is required".to_string(),
            ));
        }

        self.transition(
            record,
            acting_user_id,
            ApprovalActionKind::Reject,
            false,
            ActionInput {
                reason: Some(reason.to_string()),
                changes: None,
                metadata: HashMap::new(),
            },
            |status, action| {
                status.rejected_by = Some(action.acting_user_id.clone());
                status.rejected_at = Some(action.timestamp);
                status.rejection_reason = action.reason.clone();
            },
        )
    }

    pub fn request_changes(
        &self,
        record: &CampaignWithApproval,
        acting_user_id: &str,
        changes: Vec<String>,
    ) -> GuardResult<CampaignWithApproval> {
        let changes: Vec<String> = changes
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        if changes.is_empty() {
            return Err(GuardError::Validation(
                "at least one requested change is required".to_string(),
            ));
        }

        self.transition(
            record,
            acting_user_id,
            ApprovalActionKind::RequestChanges,
            false,
            ActionInput {
                reason: None,
                changes: Some(changes),
                metadata: HashMap::new(),
            },
            |status, action| {
                status.changes_requested = action.changes.clone().unwrap_or_default();
            },
        )
    }

    /// Submit (or resubmit) a campaign for review. Increments the revision
    /// count and clears any outstanding change requests.
    pub fn revise_campaign(
        &self,
        record: &CampaignWithApproval,
        acting_user_id: &str,
        revision: Revision,
    ) -> GuardResult<CampaignWithApproval> {
        if let Some(updated) = &revision.campaign {
            if updated.id != record.campaign.id {
                return Err(GuardError::Validation(format!(
                    "revision targets campaign {} but record is {}",
                    updated.id, record.campaign.id
                )));
            }
        }

        let mut metadata = HashMap::new();
        metadata.insert(
            "revision".to_string(),
            json!(record.approval.revision_count + 1),
        );
        metadata.insert(
            "contentChanged".to_string(),
            json!(revision.campaign.is_some()),
        );

        let mut next = self.transition(
            record,
            acting_user_id,
            ApprovalActionKind::Revise,
            false,
            ActionInput {
                reason: revision.notes,
                changes: None,
                metadata,
            },
            |status, _| {
                status.revision_count += 1;
                status.changes_requested.clear();
            },
        )?;

        if let Some(updated) = revision.campaign {
            // Creation time is part of the audit trail, not editable content.
            next.campaign = Campaign {
                created_at: record.campaign.created_at,
                ..updated
            };
        }
        Ok(next)
    }

    /// Advisory pre-approval checks; the workflow does not enforce them.
    pub fn validate_for_approval(&self, campaign: &Campaign) -> ApprovalValidation {
        preflight::validate_for_approval(campaign, &self.config)
    }

    pub fn get_approval_metrics(&self, records: &[CampaignWithApproval]) -> ApprovalMetrics {
        reporting::approval_metrics(records, self.config.top_rejection_reasons)
    }

    fn transition<F>(
        &self,
        record: &CampaignWithApproval,
        acting_user_id: &str,
        kind: ApprovalActionKind,
        go_live: bool,
        input: ActionInput,
        apply: F,
    ) -> GuardResult<CampaignWithApproval>
    where
        F: FnOnce(&mut CampaignApprovalStatus, &CampaignApprovalAction),
    {
        let acting_user_id = acting_user_id.trim();
        if acting_user_id.is_empty() {
            return Err(GuardError::Validation(
                "an acting user id is required".to_string(),
            ));
        }

        let from = record.approval.status;
        let to = from.next(kind, go_live)?;
        let now = Utc::now();

        let mut metadata = input.metadata;
        metadata.insert("fromStatus".to_string(), json!(from.as_str()));
        metadata.insert("toStatus".to_string(), json!(to.as_str()));

        let action = CampaignApprovalAction {
            id: Uuid::new_v4(),
            campaign_id: record.campaign.id,
            action: kind,
            acting_user_id: acting_user_id.to_string(),
            timestamp: now,
            reason: input.reason,
            changes: input.changes,
            metadata,
        };

        let mut next = record.clone();
        next.approval.status = to;
        next.approval.last_modified = now;
        apply(&mut next.approval, &action);
        next.approval.history.push(action);

        metrics::counter!("approval.transitions").increment(1);
        info!(
            campaign_id = %record.campaign.id,
            action = %kind,
            from = %from,
            to = %to,
            acting_user_id,
            "campaign approval transition"
        );
        Ok(next)
    }
}

impl Default for CampaignApprovalWorkflow {
    fn default() -> Self {
        Self::new(ApprovalConfig::default())
    }
}
