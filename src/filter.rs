// 🔍 Filter Engine - search text AND status set AND new-only

use crate::bill::{Bill, BillStatus};
use serde::{Deserialize, Serialize};

/// Transient query state for the session. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillFilters {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub statuses: Vec<BillStatus>,
    #[serde(default)]
    pub show_new_only: bool,
}

impl BillFilters {
    /// Add the status if absent, remove it if present
    pub fn toggle_status(&mut self, status: BillStatus) {
        if let Some(pos) = self.statuses.iter().position(|s| *s == status) {
            self.statuses.remove(pos);
        } else {
            self.statuses.push(status);
        }
    }

    pub fn is_active(&self) -> bool {
        !self.search.trim().is_empty() || !self.statuses.is_empty() || self.show_new_only
    }

    pub fn clear(&mut self) {
        *self = BillFilters::default();
    }

    pub fn matches(&self, bill: &Bill) -> bool {
        let term = self.search.trim();
        if !term.is_empty() {
            let term = term.to_lowercase();
            let matches_search = bill.bill_id.to_lowercase().contains(&term)
                || bill.description.to_lowercase().contains(&term)
                || bill.patron_name.to_lowercase().contains(&term);
            if !matches_search {
                return false;
            }
        }

        if !self.statuses.is_empty() && !self.statuses.contains(&bill.status) {
            return false;
        }

        if self.show_new_only && !bill.is_new {
            return false;
        }

        true
    }
}

/// Stable filter: matching bills keep their relative order.
pub fn filter_bills<'a, I>(bills: I, filters: &BillFilters) -> Vec<&'a Bill>
where
    I: IntoIterator<Item = &'a Bill>,
{
    bills.into_iter().filter(|bill| filters.matches(bill)).collect()
}
