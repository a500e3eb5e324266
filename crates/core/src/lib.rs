//! Shared foundation for the TradeGuard compliance core: configuration,
//! the fault type, domain types shared by every evaluator, and the audit
//! event seams.

pub mod config;
pub mod error;
pub mod event_bus;
pub mod types;

pub use config::{AppConfig, FaultPolicy};
pub use error::{GuardError, GuardResult};
pub use event_bus::{ActorSource, ComplianceEvent, ComplianceEventSink, ComplianceEventType};
pub use types::{
    AdCopy, CampaignData, CertificationKind, CertificationRecord, CertificationStatus,
    ServiceArea, TradeType, UserCertifications,
};
