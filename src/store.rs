// 🗂️ Mutation Layer - the one owner of the bill collection
//
// Create / update / delete / mark-all-read, all in memory. Every other
// component only ever sees borrowed, derived views.

use crate::bill::{Bill, BillDraft, BillPatch};
use crate::error::{BillError, Result};
use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};

// ============================================================================
// CLOCK
// ============================================================================

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hand-driven clock for deterministic timestamps
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        ManualClock { now: Mutex::new(start) }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// ============================================================================
// BILL STORE
// ============================================================================

pub struct BillStore {
    bills: Vec<Bill>,
    clock: Arc<dyn Clock>,
}

impl BillStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        BillStore {
            bills: Vec::new(),
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn all(&self) -> &[Bill] {
        &self.bills
    }

    pub fn len(&self) -> usize {
        self.bills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bills.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Bill> {
        self.bills.iter().find(|b| b.id == id)
    }

    /// Swap in a freshly fetched collection
    pub fn replace_all(&mut self, bills: Vec<Bill>) {
        self.bills = bills;
    }

    /// Append a client-side bill: fresh UUID, flagged new, both timestamps now
    pub fn create(&mut self, draft: BillDraft) -> &Bill {
        let now = self.clock.now();
        let bill = Bill {
            id: uuid::Uuid::new_v4().to_string(),
            bill_id: draft.bill_id,
            description: draft.description,
            patron_name: draft.patron_name,
            house_action: draft.house_action,
            senate_action: draft.senate_action,
            governor_action: draft.governor_action,
            status: draft.status,
            is_new: true,
            created_at: now,
            updated_at: now,
        };

        tracing::info!(id = %bill.id, bill_id = %bill.bill_id, "bill created");
        self.bills.push(bill);
        &self.bills[self.bills.len() - 1]
    }

    /// Merge the patch onto the bill. updated_at always moves forward,
    /// even when the clock has not ticked since the last stamp.
    pub fn update(&mut self, id: &str, patch: BillPatch) -> Result<&Bill> {
        let now = self.clock.now();
        let bill = self
            .bills
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| BillError::NotFound(id.to_string()))?;

        bill.apply(patch);
        bill.updated_at = now.max(bill.updated_at + Duration::microseconds(1));

        tracing::info!(id, bill_id = %bill.bill_id, "bill updated");
        Ok(bill)
    }

    pub fn delete(&mut self, id: &str) -> Result<Bill> {
        let pos = self
            .bills
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| BillError::NotFound(id.to_string()))?;

        let removed = self.bills.remove(pos);
        tracing::info!(id, bill_id = %removed.bill_id, "bill deleted");
        Ok(removed)
    }

    /// Clear the new flag everywhere; returns how many bills changed
    pub fn mark_all_read(&mut self) -> usize {
        let mut cleared = 0;
        for bill in self.bills.iter_mut().filter(|b| b.is_new) {
            bill.is_new = false;
            cleared += 1;
        }
        cleared
    }

    pub fn new_count(&self) -> usize {
        self.bills.iter().filter(|b| b.is_new).count()
    }
}

impl Default for BillStore {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
