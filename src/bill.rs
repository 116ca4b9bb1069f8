// 📜 Bill Model - the entity every view is derived from
// Identity (id) never changes; everything else is a value that can be edited

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// BILL STATUS
// ============================================================================

/// Exactly one status per bill, derived from the source flags on load
/// or picked by hand in the add/edit form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BillStatus {
    Passed,
    Vetoed,
    Failed,
    Approved,
    #[default]
    Pending,
    CarriedOver,
}

impl BillStatus {
    /// Filter-menu order
    pub const ALL: [BillStatus; 6] = [
        BillStatus::Passed,
        BillStatus::Vetoed,
        BillStatus::Failed,
        BillStatus::Approved,
        BillStatus::Pending,
        BillStatus::CarriedOver,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BillStatus::Passed => "passed",
            BillStatus::Vetoed => "vetoed",
            BillStatus::Failed => "failed",
            BillStatus::Approved => "approved",
            BillStatus::Pending => "pending",
            BillStatus::CarriedOver => "carried-over",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BillStatus::Passed => "Passed",
            BillStatus::Vetoed => "Vetoed",
            BillStatus::Failed => "Failed",
            BillStatus::Approved => "Approved",
            BillStatus::Pending => "Pending",
            BillStatus::CarriedOver => "Carried Over",
        }
    }

    /// Next status in filter-menu order, wrapping around
    pub fn next(&self) -> Self {
        let idx = Self::ALL.iter().position(|s| s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn previous(&self) -> Self {
        let idx = Self::ALL.iter().position(|s| s == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for BillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown bill status '{}'", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for BillStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BillStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

// ============================================================================
// BILL ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    /// Stable identity - never changes once assigned
    pub id: String,

    /// Human-facing code such as "HB 1234"
    pub bill_id: String,

    pub description: String,
    pub patron_name: String,

    #[serde(default)]
    pub house_action: String,
    #[serde(default)]
    pub senate_action: String,
    #[serde(default)]
    pub governor_action: String,

    pub status: BillStatus,

    /// Set on client-side creation, cleared by mark-all-read
    #[serde(default)]
    pub is_new: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bill {
    /// Apply a partial update. Identity and timestamps are left to the caller.
    pub fn apply(&mut self, patch: BillPatch) {
        if let Some(bill_id) = patch.bill_id {
            self.bill_id = bill_id;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(patron_name) = patch.patron_name {
            self.patron_name = patron_name;
        }
        if let Some(house_action) = patch.house_action {
            self.house_action = house_action;
        }
        if let Some(senate_action) = patch.senate_action {
            self.senate_action = senate_action;
        }
        if let Some(governor_action) = patch.governor_action {
            self.governor_action = governor_action;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
    }

    /// Form payload pre-filled from this bill (edit dialog)
    pub fn to_draft(&self) -> BillDraft {
        BillDraft {
            bill_id: self.bill_id.clone(),
            description: self.description.clone(),
            patron_name: self.patron_name.clone(),
            house_action: self.house_action.clone(),
            senate_action: self.senate_action.clone(),
            governor_action: self.governor_action.clone(),
            status: self.status,
        }
    }
}

// ============================================================================
// FORM PAYLOADS
// ============================================================================

/// Every bill field except identity and bookkeeping
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillDraft {
    pub bill_id: String,
    pub description: String,
    pub patron_name: String,
    #[serde(default)]
    pub house_action: String,
    #[serde(default)]
    pub senate_action: String,
    #[serde(default)]
    pub governor_action: String,
    #[serde(default)]
    pub status: BillStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillPatch {
    pub bill_id: Option<String>,
    pub description: Option<String>,
    pub patron_name: Option<String>,
    pub house_action: Option<String>,
    pub senate_action: Option<String>,
    pub governor_action: Option<String>,
    pub status: Option<BillStatus>,
}

impl From<BillDraft> for BillPatch {
    fn from(draft: BillDraft) -> Self {
        BillPatch {
            bill_id: Some(draft.bill_id),
            description: Some(draft.description),
            patron_name: Some(draft.patron_name),
            house_action: Some(draft.house_action),
            senate_action: Some(draft.senate_action),
            governor_action: Some(draft.governor_action),
            status: Some(draft.status),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    /// Fixture shared by the pipeline tests
    pub(crate) fn create_test_bill(bill_id: &str, patron: &str, status: BillStatus) -> Bill {
        let created = Utc.with_ymd_and_hms(2025, 1, 8, 12, 0, 0).unwrap();
        Bill {
            id: bill_id.to_string(),
            bill_id: bill_id.to_string(),
            description: format!("Description of {}", bill_id),
            patron_name: patron.to_string(),
            house_action: String::new(),
            senate_action: String::new(),
            governor_action: String::new(),
            status,
            is_new: false,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn test_status_text_round_trip() {
        for status in BillStatus::ALL {
            assert_eq!(status.as_str().parse::<BillStatus>().unwrap(), status);
        }
        assert!("unknown".parse::<BillStatus>().is_err());
        assert_eq!(BillStatus::CarriedOver.label(), "Carried Over");
    }

    #[test]
    fn test_status_serializes_kebab_case() {
        let json = serde_json::to_string(&BillStatus::CarriedOver).unwrap();
        assert_eq!(json, "\"carried-over\"");
    }

    #[test]
    fn test_status_cycles() {
        assert_eq!(BillStatus::Passed.next(), BillStatus::Vetoed);
        assert_eq!(BillStatus::CarriedOver.next(), BillStatus::Passed);
        assert_eq!(BillStatus::Passed.previous(), BillStatus::CarriedOver);
    }

    #[test]
    fn test_bill_serializes_camel_case() {
        let bill = create_test_bill("HB 1234", "Delegate Smith", BillStatus::Pending);
        let value = serde_json::to_value(&bill).unwrap();

        assert_eq!(value["billId"], "HB 1234");
        assert_eq!(value["patronName"], "Delegate Smith");
        assert_eq!(value["isNew"], false);
        assert_eq!(value["status"], "pending");
        assert!(value["createdAt"].as_str().unwrap().starts_with("2025-01-08T12:00:00"));
    }

    #[test]
    fn test_apply_patch_only_touches_given_fields() {
        let mut bill = create_test_bill("HB 1", "Smith", BillStatus::Pending);
        bill.apply(BillPatch {
            status: Some(BillStatus::Passed),
            governor_action: Some("Signed".to_string()),
            ..Default::default()
        });

        assert_eq!(bill.status, BillStatus::Passed);
        assert_eq!(bill.governor_action, "Signed");
        assert_eq!(bill.bill_id, "HB 1");
        assert_eq!(bill.patron_name, "Smith");
    }

    #[test]
    fn test_draft_to_patch_sets_every_field() {
        let bill = create_test_bill("SB 7", "Jones", BillStatus::Vetoed);
        let patch = BillPatch::from(bill.to_draft());

        assert_eq!(patch.bill_id.as_deref(), Some("SB 7"));
        assert_eq!(patch.status, Some(BillStatus::Vetoed));
        assert_eq!(patch.house_action.as_deref(), Some(""));
    }
}
