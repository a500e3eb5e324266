//! Compliance gate: runs every evaluator over a campaign, fulfils the audit
//! logging obligations, and only then lets the workflow approve it.
//!
//! Evaluators stay pure; every event emission and every identity lookup
//! happens here.

use crate::models::{Campaign, CampaignWithApproval, ComplianceLevel};
use crate::preflight::{self, ApprovalValidation};
use crate::workflows::{ApproveOptions, CampaignApprovalWorkflow, Revision};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};
use tradeguard_compliance::{
    CertificationCheckResult, CertificationRequirementEngine, ComplianceCheck,
    ComplianceRuleValidator, ComplianceViolation, ContentCheck, ContentComplianceScanner,
    RuleSeverity, ScanResult, ValidationSummary,
};
use tradeguard_core::event_bus::make_event;
use tradeguard_core::{
    ActorSource, AppConfig, ComplianceEventSink, ComplianceEventType, FaultPolicy, GuardError,
    GuardResult, UserCertifications,
};
use uuid::Uuid;

/// Everything the evaluators found for one campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateReport {
    pub campaign_id: Uuid,
    pub content: ScanResult,
    /// Set when the content checker faulted internally and the fault policy
    /// decided the outcome.
    pub scan_fault: Option<String>,
    pub certification_claims: Vec<ComplianceViolation>,
    pub eligibility: CertificationCheckResult,
    pub checks: Vec<ComplianceCheck>,
    pub summary: ValidationSummary,
    pub compliance_level: ComplianceLevel,
    pub approval: ApprovalValidation,
    pub blocking_reasons: Vec<String>,
}

impl GateReport {
    pub fn can_approve(&self) -> bool {
        self.blocking_reasons.is_empty()
    }
}

pub struct ComplianceGate {
    scanner: Arc<dyn ContentCheck>,
    certifications: Arc<CertificationRequirementEngine>,
    validator: Arc<ComplianceRuleValidator>,
    workflow: Arc<CampaignApprovalWorkflow>,
    sink: Arc<dyn ComplianceEventSink>,
    actor: Arc<dyn ActorSource>,
    fault_policy: FaultPolicy,
}

impl ComplianceGate {
    /// Gate over the UK trades catalogues.
    pub fn new(
        config: &AppConfig,
        sink: Arc<dyn ComplianceEventSink>,
        actor: Arc<dyn ActorSource>,
    ) -> GuardResult<Self> {
        Ok(Self {
            scanner: Arc::new(ContentComplianceScanner::uk_trades(
                config.scanner.max_content_bytes,
            )?),
            certifications: Arc::new(CertificationRequirementEngine::default()),
            validator: Arc::new(ComplianceRuleValidator::uk_trades()),
            workflow: Arc::new(CampaignApprovalWorkflow::new(config.approval.clone())),
            sink,
            actor,
            fault_policy: config.scanner.fault_policy,
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        scanner: Arc<dyn ContentCheck>,
        certifications: Arc<CertificationRequirementEngine>,
        validator: Arc<ComplianceRuleValidator>,
        workflow: Arc<CampaignApprovalWorkflow>,
        sink: Arc<dyn ComplianceEventSink>,
        actor: Arc<dyn ActorSource>,
        fault_policy: FaultPolicy,
    ) -> Self {
        Self {
            scanner,
            certifications,
            validator,
            workflow,
            sink,
            actor,
            fault_policy,
        }
    }

    pub fn workflow(&self) -> &CampaignApprovalWorkflow {
        &self.workflow
    }

    /// Run every evaluator over `campaign` and emit the owed compliance events.
    /// Copy the checker cannot accept, such as copy over the size limit, is a
    /// `Validation` fault and is returned as such.
    pub fn screen(
        &self,
        campaign: &Campaign,
        certs: &UserCertifications,
    ) -> GuardResult<GateReport> {
        let text = campaign.copy_fragments().collect::<Vec<_>>().join("\n");

        let (content, scan_fault) = self.scan_content(campaign.id, &text)?;
        if !content.violations.is_empty() {
            metrics::counter!("compliance.content.flagged").increment(1);
            self.sink.log_event(make_event(
                ComplianceEventType::ContentFlagged,
                json!({
                    "campaignId": campaign.id,
                    "phrases": content.violations.iter().map(|v| v.phrase.as_str()).collect::<Vec<_>>(),
                }),
            ));
        }

        let certification_claims = self
            .scanner
            .validate_certification_requirements(&text, certs);

        let eligibility = self
            .certifications
            .check_eligibility(&campaign.services, certs);
        for blocked in &eligibility.blocked {
            metrics::counter!("compliance.services.blocked").increment(1);
            self.sink.log_event(make_event(
                ComplianceEventType::ServiceBlocked,
                json!({
                    "campaignId": campaign.id,
                    "serviceId": blocked.service_id,
                    "service": blocked.description,
                    "missingCertifications": blocked.missing.iter().map(|k| k.display_name()).collect::<Vec<_>>(),
                }),
            ));
        }

        let checks = self.validator.validate(&campaign.to_campaign_data());
        let summary = ValidationSummary::from_checks(&checks);

        let content_blocked = !content.approved;
        let compliance_level = if content_blocked
            || !certification_claims.is_empty()
            || !eligibility.can_advertise
            || summary.errors > 0
        {
            ComplianceLevel::Low
        } else if !content.warnings.is_empty()
            || !eligibility.warnings.is_empty()
            || summary.warnings > 0
        {
            ComplianceLevel::Medium
        } else {
            ComplianceLevel::High
        };

        let rated = Campaign {
            compliance_level,
            ..campaign.clone()
        };
        let approval = preflight::validate_for_approval(&rated, self.workflow.config());

        let mut blocking_reasons = Vec::new();
        if content_blocked && content.violations.is_empty() {
            if let Some(fault) = &scan_fault {
                blocking_reasons.push(format!("Content could not be scanned: {fault}"));
            }
        }
        blocking_reasons.extend(
            content
                .violations
                .iter()
                .map(|v| format!("Banned phrase \"{}\": {}", v.phrase, v.reason)),
        );
        blocking_reasons.extend(certification_claims.iter().map(|v| v.reason.clone()));
        blocking_reasons.extend(
            eligibility
                .blocked_services
                .iter()
                .map(|s| format!("Service not permitted: {s}")),
        );
        blocking_reasons.extend(
            checks
                .iter()
                .filter(|c| !c.passed && c.rule.severity == RuleSeverity::Error)
                .map(|c| c.message.clone()),
        );
        blocking_reasons.extend(approval.errors.iter().cloned());

        info!(
            campaign_id = %campaign.id,
            level = ?compliance_level,
            blocking = blocking_reasons.len(),
            "campaign screened"
        );

        Ok(GateReport {
            campaign_id: campaign.id,
            content,
            scan_fault,
            certification_claims,
            eligibility,
            checks,
            summary,
            compliance_level,
            approval,
            blocking_reasons,
        })
    }

    /// Screen the campaign and approve it only if nothing blocks.
    pub fn approve(
        &self,
        record: &CampaignWithApproval,
        certs: &UserCertifications,
        options: ApproveOptions,
    ) -> GuardResult<CampaignWithApproval> {
        let report = self.screen(&record.campaign, certs)?;
        if !report.can_approve() {
            self.sink.log_event(make_event(
                ComplianceEventType::ApprovalBlocked,
                json!({
                    "campaignId": record.id(),
                    "reasons": report.blocking_reasons,
                }),
            ));
            return Err(GuardError::ApprovalBlocked(report.blocking_reasons));
        }

        let mut next = self.workflow.approve_campaign(
            record,
            &self.actor.current_acting_user_id(),
            options,
        )?;
        next.campaign.compliance_level = report.compliance_level;
        self.log_transition(record, &next);
        Ok(next)
    }

    pub fn reject(&self, record: &CampaignWithApproval, reason: &str) -> GuardResult<CampaignWithApproval> {
        let next = self
            .workflow
            .reject_campaign(record, &self.actor.current_acting_user_id(), reason)?;
        self.log_transition(record, &next);
        Ok(next)
    }

    pub fn request_changes(
        &self,
        record: &CampaignWithApproval,
        changes: Vec<String>,
    ) -> GuardResult<CampaignWithApproval> {
        let next = self.workflow.request_changes(
            record,
            &self.actor.current_acting_user_id(),
            changes,
        )?;
        self.log_transition(record, &next);
        Ok(next)
    }

    pub fn revise(
        &self,
        record: &CampaignWithApproval,
        revision: Revision,
    ) -> GuardResult<CampaignWithApproval> {
        let next = self.workflow.revise_campaign(
            record,
            &self.actor.current_acting_user_id(),
            revision,
        )?;
        self.log_transition(record, &next);
        Ok(next)
    }

    /// Scan under the configured fault policy. Input faults propagate. Under
    /// fail-open an internal fault yields an approved result plus a
    /// `scan_failed_open` event.
    fn scan_content(
        &self,
        campaign_id: Uuid,
        text: &str,
    ) -> GuardResult<(ScanResult, Option<String>)> {
        let err = match self.scanner.check(text) {
            Ok(result) => return Ok((result, None)),
            Err(err @ GuardError::Validation(_)) => {
                warn!(%campaign_id, error = %err, "content rejected by scanner");
                return Err(err);
            }
            Err(err) => err,
        };

        let fault = err.to_string();
        let approved = self.fault_policy == FaultPolicy::FailOpen;
        if approved {
            warn!(%campaign_id, error = %fault, "content scan failed; failing open and treating content as approved");
            self.sink.log_event(make_event(
                ComplianceEventType::ScanFailedOpen,
                json!({ "campaignId": campaign_id, "error": fault }),
            ));
        } else {
            warn!(%campaign_id, error = %fault, "content scan failed; failing closed");
        }
        Ok((
            ScanResult {
                approved,
                ..Default::default()
            },
            Some(fault),
        ))
    }

    fn log_transition(&self, previous: &CampaignWithApproval, next: &CampaignWithApproval) {
        let Some(action) = next.approval.history.last() else {
            return;
        };
        self.sink.log_event(make_event(
            ComplianceEventType::CampaignTransitioned,
            json!({
                "campaignId": next.id(),
                "actionId": action.id,
                "action": action.action,
                "actingUserId": action.acting_user_id,
                "from": previous.status(),
                "to": next.status(),
            }),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AdGroup, ApprovalState, CampaignBudget};
    use chrono::Utc;
    use tradeguard_core::event_bus::{capture_sink, CaptureSink, StaticActor};
    use tradeguard_compliance::{
        BannedCategory, BannedPhrase, PhraseCatalogue, ViolationCategory, ViolationSeverity,
    };
    use tradeguard_core::{CertificationKind, CertificationStatus, ServiceArea, TradeType};

    fn gate_with(config: &AppConfig) -> (ComplianceGate, Arc<CaptureSink>) {
        let sink = capture_sink();
        let gate = ComplianceGate::new(
            config,
            sink.clone(),
            Arc::new(StaticActor("reviewer-7".to_string())),
        )
        .unwrap();
        (gate, sink)
    }

    fn clean_campaign() -> Campaign {
        Campaign {
            id: Uuid::new_v4(),
            name: "Boiler care".to_string(),
            trade_type: TradeType::Heating,
            service_area: ServiceArea {
                location: "Leeds".to_string(),
                radius_miles: Some(15),
                postcodes: vec!["LS1".to_string()],
            },
            services: vec!["boiler_repair".to_string()],
            budget: CampaignBudget::monthly(400.0),
            ad_groups: vec![AdGroup {
                name: "Boiler repair".to_string(),
                headlines: vec![
                    "Gas Safe registered engineers".to_string(),
                    "Boiler repairs in Leeds".to_string(),
                    "Book a boiler service".to_string(),
                ],
                descriptions: vec!["Friendly local heating engineers".to_string()],
                keywords: ["boiler repair", "boiler service", "heating engineer", "leeds boiler", "gas engineer"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            }],
            compliance_level: ComplianceLevel::Low,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_clean_campaign_screens_high() {
        let (gate, sink) = gate_with(&AppConfig::default());
        let certs = UserCertifications::all(CertificationStatus::Verified);
        let report = gate.screen(&clean_campaign(), &certs).unwrap();

        assert!(report.can_approve(), "{:?}", report.blocking_reasons);
        assert_eq!(report.compliance_level, ComplianceLevel::High);
        assert!(report.approval.is_valid);
        assert_eq!(sink.count(), 0);
    }

    #[test]
    fn test_blocked_service_emits_one_event_per_service() {
        let (gate, sink) = gate_with(&AppConfig::default());
        let certs = UserCertifications::all(CertificationStatus::Verified)
            .with(CertificationKind::GasSafe, CertificationStatus::Expired);
        let mut campaign = clean_campaign();
        campaign.services.push("central_heating".to_string());

        let report = gate.screen(&campaign, &certs).unwrap();
        assert!(!report.can_approve());
        assert_eq!(report.compliance_level, ComplianceLevel::Low);
        assert_eq!(sink.count_type(ComplianceEventType::ServiceBlocked), 2);
        assert!(report
            .blocking_reasons
            .contains(&"Service not permitted: Boiler repair and maintenance".to_string()));
    }

    #[test]
    fn test_banned_copy_blocks_approval() {
        let (gate, sink) = gate_with(&AppConfig::default());
        let certs = UserCertifications::all(CertificationStatus::Verified);
        let mut campaign = clean_campaign();
        campaign.ad_groups[0]
            .headlines
            .push("Boiler engineers available 24/7".to_string());

        let workflow = gate.workflow();
        let record = workflow.create_draft(campaign);
        let err = gate
            .approve(&record, &certs, ApproveOptions::default())
            .unwrap_err();
        match err {
            GuardError::ApprovalBlocked(reasons) => {
                assert!(reasons.iter().any(|r| r.contains("\"24/7\"")));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(sink.count_type(ComplianceEventType::ContentFlagged), 1);
        assert_eq!(sink.count_type(ComplianceEventType::ApprovalBlocked), 1);
    }

    #[test]
    fn test_approve_uses_actor_identity() {
        let (gate, sink) = gate_with(&AppConfig::default());
        let certs = UserCertifications::all(CertificationStatus::Verified);
        let record = gate.workflow().create_draft(clean_campaign());

        let approved = gate
            .approve(&record, &certs, ApproveOptions::default())
            .unwrap();
        assert_eq!(approved.status(), ApprovalState::Approved);
        assert_eq!(approved.approval.approved_by.as_deref(), Some("reviewer-7"));
        assert_eq!(approved.campaign.compliance_level, ComplianceLevel::High);
        assert_eq!(sink.count_type(ComplianceEventType::CampaignTransitioned), 1);
    }

    #[test]
    fn test_oversize_copy_is_rejected_not_approved() {
        let config = AppConfig::default();
        let (gate, sink) = gate_with(&config);
        let certs = UserCertifications::all(CertificationStatus::Verified);
        let mut campaign = clean_campaign();
        campaign.ad_groups[0].headlines[0] = "Plumbers 24/7, round the clock".to_string();
        campaign.ad_groups[0]
            .descriptions
            .push("x".repeat(config.scanner.max_content_bytes + 1));

        assert!(matches!(
            gate.screen(&campaign, &certs),
            Err(GuardError::Validation(_))
        ));
        let record = gate.workflow().create_draft(campaign);
        assert!(matches!(
            gate.approve(&record, &certs, ApproveOptions::default()),
            Err(GuardError::Validation(_))
        ));
        assert_eq!(sink.count_type(ComplianceEventType::ScanFailedOpen), 0);
        assert_eq!(sink.count_type(ComplianceEventType::CampaignTransitioned), 0);
    }

    /// Checker whose scan always fails internally.
    struct BrokenChecker(ContentComplianceScanner);

    impl ContentCheck for BrokenChecker {
        fn check(&self, _text: &str) -> GuardResult<ScanResult> {
            Err(GuardError::Internal(anyhow::anyhow!("phrase matcher unavailable")))
        }

        fn validate_certification_requirements(
            &self,
            text: &str,
            certs: &UserCertifications,
        ) -> Vec<ComplianceViolation> {
            self.0.validate_certification_requirements(text, certs)
        }
    }

    fn gate_from_checker(
        scanner: Arc<dyn ContentCheck>,
        policy: FaultPolicy,
    ) -> (ComplianceGate, Arc<CaptureSink>) {
        let sink = capture_sink();
        let gate = ComplianceGate::from_parts(
            scanner,
            Arc::new(CertificationRequirementEngine::default()),
            Arc::new(ComplianceRuleValidator::uk_trades()),
            Arc::new(CampaignApprovalWorkflow::default()),
            sink.clone(),
            Arc::new(StaticActor("reviewer-7".to_string())),
            policy,
        );
        (gate, sink)
    }

    #[test]
    fn test_internal_scan_fault_fails_open_by_default() {
        let broken = BrokenChecker(ContentComplianceScanner::uk_trades(20_000).unwrap());
        let (gate, sink) = gate_from_checker(Arc::new(broken), FaultPolicy::default());
        let certs = UserCertifications::all(CertificationStatus::Verified);

        let report = gate.screen(&clean_campaign(), &certs).unwrap();
        assert!(report.content.approved);
        assert!(report
            .scan_fault
            .as_deref()
            .is_some_and(|f| f.contains("phrase matcher unavailable")));
        assert!(report.can_approve());
        assert_eq!(sink.count_type(ComplianceEventType::ScanFailedOpen), 1);
    }

    #[test]
    fn test_internal_scan_fault_fails_closed_when_configured() {
        let broken = BrokenChecker(ContentComplianceScanner::uk_trades(20_000).unwrap());
        let (gate, sink) = gate_from_checker(Arc::new(broken), FaultPolicy::FailClosed);
        let certs = UserCertifications::all(CertificationStatus::Verified);

        let report = gate.screen(&clean_campaign(), &certs).unwrap();
        assert!(!report.content.approved);
        assert!(!report.can_approve());
        assert!(report.blocking_reasons[0].starts_with("Content could not be scanned"));
        assert_eq!(sink.count_type(ComplianceEventType::ScanFailedOpen), 0);
    }

    #[test]
    fn test_custom_phrase_catalogue_is_enforced() {
        let mut catalogue = PhraseCatalogue::uk_trades();
        catalogue.banned.push(BannedCategory {
            category: ViolationCategory::PriceClaims,
            severity: ViolationSeverity::Medium,
            reason: "Free call-out claims must state their conditions".to_string(),
            phrases: vec![BannedPhrase {
                phrase: "no call-out fee".to_string(),
                replacement: Some("call-out charges on request".to_string()),
            }],
        });
        let scanner = ContentComplianceScanner::new(catalogue, 20_000).unwrap();
        let (gate, sink) = gate_from_checker(Arc::new(scanner), FaultPolicy::FailClosed);
        let certs = UserCertifications::all(CertificationStatus::Verified);
        let mut campaign = clean_campaign();
        campaign.ad_groups[0].descriptions[0] = "No call-out fee in Leeds".to_string();

        let report = gate.screen(&campaign, &certs).unwrap();
        assert!(!report.can_approve());
        assert_eq!(report.content.violations[0].phrase, "no call-out fee");
        assert_eq!(sink.count_type(ComplianceEventType::ContentFlagged), 1);
    }
}
