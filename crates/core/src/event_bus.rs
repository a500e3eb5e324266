//! Compliance event sink and acting-user identity seams.
//!
//! Components that owe an audit trail accept an `Arc<dyn ComplianceEventSink>`.
//! Emission is fire-and-forget: a sink must never fail the caller's decision.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceEventType {
    ServiceBlocked,
    ContentFlagged,
    ScanFailedOpen,
    ApprovalBlocked,
    CampaignTransitioned,
}

impl ComplianceEventType {
    pub fn as_str(self) -> &'static str {
        match self {
            ComplianceEventType::ServiceBlocked => "service_blocked",
            ComplianceEventType::ContentFlagged => "content_flagged",
            ComplianceEventType::ScanFailedOpen => "scan_failed_open",
            ComplianceEventType::ApprovalBlocked => "approval_blocked",
            ComplianceEventType::CampaignTransitioned => "campaign_transitioned",
        }
    }
}

impl fmt::Display for ComplianceEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceEvent {
    pub event_id: Uuid,
    pub event_type: ComplianceEventType,
    pub data: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

/// Receives compliance events. Implementations route them to an audit table,
/// a message bus, or the log.
pub trait ComplianceEventSink: Send + Sync {
    fn log_event(&self, event: ComplianceEvent);
}

/// Source of the acting user's identity for approval actions.
pub trait ActorSource: Send + Sync {
    fn current_acting_user_id(&self) -> String;
}

/// Fixed identity, for batch jobs and tests.
#[derive(Debug, Clone)]
pub struct StaticActor(pub String);

impl ActorSource for StaticActor {
    fn current_acting_user_id(&self) -> String {
        self.0.clone()
    }
}

/// No-op sink for callers that don't keep an audit trail.
pub struct NoOpSink;

impl ComplianceEventSink for NoOpSink {
    fn log_event(&self, _event: ComplianceEvent) {}
}

/// Writes every event to the `compliance_audit` tracing target.
pub struct TracingSink;

impl ComplianceEventSink for TracingSink {
    fn log_event(&self, event: ComplianceEvent) {
        tracing::info!(
            target: "compliance_audit",
            event_id = %event.event_id,
            event_type = %event.event_type,
            data = %event.data,
            "compliance event"
        );
    }
}

/// In-memory sink that captures events for testing.
#[derive(Default)]
pub struct CaptureSink {
    events: Mutex<Vec<ComplianceEvent>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<ComplianceEvent> {
        self.events.lock().expect("event sink mutex poisoned").clone()
    }

    pub fn count(&self) -> usize {
        self.events.lock().expect("event sink mutex poisoned").len()
    }

    pub fn count_type(&self, event_type: ComplianceEventType) -> usize {
        self.events
            .lock()
            .expect("event sink mutex poisoned")
            .iter()
            .filter(|e| e.event_type == event_type)
            .count()
    }
}

impl ComplianceEventSink for CaptureSink {
    fn log_event(&self, event: ComplianceEvent) {
        self.events
            .lock()
            .expect("event sink mutex poisoned")
            .push(event);
    }
}

pub fn make_event(event_type: ComplianceEventType, data: serde_json::Value) -> ComplianceEvent {
    ComplianceEvent {
        event_id: Uuid::new_v4(),
        event_type,
        data,
        timestamp: Utc::now(),
    }
}

pub fn noop_sink() -> Arc<dyn ComplianceEventSink> {
    Arc::new(NoOpSink)
}

pub fn capture_sink() -> Arc<CaptureSink> {
    Arc::new(CaptureSink::new())
}
