//! Campaign approval management: the approval state machine, pre-approval
//! checks, aggregate reporting, and the compliance gate that runs every
//! evaluator before a campaign may be approved.
//!
//! Records are held in DashMap (development); swap to an ACID store for production.

pub mod gate;
pub mod models;
pub mod preflight;
pub mod reporting;
pub mod store;
pub mod workflows;

pub use gate::{ComplianceGate, GateReport};
pub use models::{
    AdGroup, ApprovalActionKind, ApprovalState, BudgetPeriod, Campaign, CampaignApprovalAction,
    CampaignApprovalStatus, CampaignBudget, CampaignWithApproval, ComplianceLevel,
};
pub use preflight::ApprovalValidation;
pub use reporting::{ApprovalMetrics, RejectionReasonCount};
pub use store::ApprovalStore;
pub use workflows::{ApproveOptions, CampaignApprovalWorkflow, Revision};
