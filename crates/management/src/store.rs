//! In-memory approval store backed by DashMap.
//!
//! Reference implementation of the persistence contract: writes are
//! optimistic and keyed on the record the caller started from, so two
//! reviewers acting on the same campaign cannot both win.
//! Production: replace with an ACID store that applies the same check.

use crate::models::CampaignWithApproval;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{info, warn};
use tradeguard_core::{GuardError, GuardResult};
use uuid::Uuid;

pub struct ApprovalStore {
    records: DashMap<Uuid, CampaignWithApproval>,
}

impl ApprovalStore {
    pub fn new() -> Self {
        info!("Approval store initialized (in-memory)");
        Self {
            records: DashMap::new(),
        }
    }

    /// Store a new record. Fails if the campaign id is already present.
    pub fn insert(&self, record: CampaignWithApproval) -> GuardResult<()> {
        match self.records.entry(record.id()) {
            Entry::Occupied(_) => Err(GuardError::Conflict {
                campaign_id: record.id(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    pub fn get(&self, id: Uuid) -> Option<CampaignWithApproval> {
        self.records.get(&id).map(|r| r.value().clone())
    }

    /// All records, newest campaign first.
    pub fn list(&self) -> Vec<CampaignWithApproval> {
        let mut records: Vec<CampaignWithApproval> =
            self.records.iter().map(|r| r.value().clone()).collect();
        records.sort_by(|a, b| b.campaign.created_at.cmp(&a.campaign.created_at));
        records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Replace `previous` with `next`, provided nobody else has written since
    /// `previous` was read. Stale writes fail with [`GuardError::Conflict`].
    pub fn commit(
        &self,
        previous: &CampaignWithApproval,
        next: CampaignWithApproval,
    ) -> GuardResult<()> {
        let id = previous.id();
        if next.id() != id {
            return Err(GuardError::Validation(format!(
                "cannot commit campaign {} over campaign {}",
                next.id(),
                id
            )));
        }

        let mut entry = self.records.get_mut(&id).ok_or(GuardError::NotFound(id))?;
        let stored = &entry.value().approval;
        if stored.last_modified != previous.approval.last_modified
            || stored.history.len() != previous.approval.history.len()
        {
            metrics::counter!("approval.store.conflicts").increment(1);
            warn!(campaign_id = %id, "rejected stale approval write");
            return Err(GuardError::Conflict { campaign_id: id });
        }

        *entry.value_mut() = next;
        Ok(())
    }
}

impl Default for ApprovalStore {
    fn default() -> Self {
        Self::new()
    }
}
