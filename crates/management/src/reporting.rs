//! Read-only aggregate metrics over a collection of campaign approval records.

use crate::models::{ApprovalActionKind, ApprovalState, CampaignWithApproval};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectionReasonCount {
    pub reason: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalMetrics {
    pub total_campaigns: usize,
    pub approved: usize,
    pub live: usize,
    pub rejected: usize,
    /// Draft, pending review and pending changes.
    pub pending: usize,
    /// Approved or live, over all campaigns.
    pub approval_rate: f64,
    pub rejection_rate: f64,
    pub pending_rate: f64,
    /// Mean hours from creation to approval. `None` when nothing was approved.
    pub average_approval_time_hours: Option<f64>,
    pub revision_rate: f64,
    pub top_rejection_reasons: Vec<RejectionReasonCount>,
}

fn rate(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

pub fn approval_metrics(records: &[CampaignWithApproval], top_reasons: usize) -> ApprovalMetrics {
    let total = records.len();
    let mut metrics = ApprovalMetrics {
        total_campaigns: total,
        ..Default::default()
    };

    let mut approval_hours = Vec::new();
    let mut revised = 0usize;
    // reason -> (count, first seen)
    let mut reasons: HashMap<&str, (usize, usize)> = HashMap::new();

    for record in records {
        match record.approval.status {
            ApprovalState::Approved => metrics.approved += 1,
            ApprovalState::Live => metrics.live += 1,
            ApprovalState::Rejected => metrics.rejected += 1,
            ApprovalState::Draft | ApprovalState::PendingReview | ApprovalState::PendingChanges => {
                metrics.pending += 1
            }
        }

        if let Some(approved_at) = record.approval.approved_at {
            let elapsed = approved_at - record.campaign.created_at;
            approval_hours.push(elapsed.num_milliseconds() as f64 / 3_600_000.0);
        }

        if record.approval.revision_count > 0 {
            revised += 1;
        }

        for action in &record.approval.history {
            if action.action != ApprovalActionKind::Reject {
                continue;
            }
            if let Some(reason) = action.reason.as_deref() {
                let seen = reasons.len();
                reasons.entry(reason).or_insert((0, seen)).0 += 1;
            }
        }
    }

    metrics.approval_rate = rate(metrics.approved + metrics.live, total);
    metrics.rejection_rate = rate(metrics.rejected, total);
    metrics.pending_rate = rate(metrics.pending, total);
    metrics.revision_rate = rate(revised, total);
    if !approval_hours.is_empty() {
        metrics.average_approval_time_hours =
            Some(approval_hours.iter().sum::<f64>() / approval_hours.len() as f64);
    }

    let mut ranked: Vec<(&str, usize, usize)> = reasons
        .into_iter()
        .map(|(reason, (count, first))| (reason, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    metrics.top_rejection_reasons = ranked
        .into_iter()
        .take(top_reasons)
        .map(|(reason, count, _)| RejectionReasonCount {
            reason: reason.to_string(),
            count,
        })
        .collect();

    metrics
}
