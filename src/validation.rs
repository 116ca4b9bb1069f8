// 📐 Form Validation - field-level rules for the add/edit form
// Errors block submission; every failing field is reported at once

use crate::bill::{Bill, BillDraft, BillStatus};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const BILL_ID_MAX: usize = 50;
pub const DESCRIPTION_MAX: usize = 1000;
pub const PATRON_NAME_MAX: usize = 100;
pub const ACTION_MAX: usize = 200;

// ============================================================================
// FIELD ERROR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        FieldError {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for FieldError {}

// ============================================================================
// FORM INPUT
// ============================================================================

/// Raw form values exactly as typed; status is still text here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillForm {
    pub bill_id: String,
    pub description: String,
    pub patron_name: String,
    #[serde(default)]
    pub house_action: String,
    #[serde(default)]
    pub senate_action: String,
    #[serde(default)]
    pub governor_action: String,
    #[serde(default = "default_status_text")]
    pub status: String,
}

fn default_status_text() -> String {
    BillStatus::Pending.as_str().to_string()
}

impl Default for BillForm {
    fn default() -> Self {
        BillForm {
            bill_id: String::new(),
            description: String::new(),
            patron_name: String::new(),
            house_action: String::new(),
            senate_action: String::new(),
            governor_action: String::new(),
            status: default_status_text(),
        }
    }
}

impl From<&Bill> for BillForm {
    fn from(bill: &Bill) -> Self {
        BillForm {
            bill_id: bill.bill_id.clone(),
            description: bill.description.clone(),
            patron_name: bill.patron_name.clone(),
            house_action: bill.house_action.clone(),
            senate_action: bill.senate_action.clone(),
            governor_action: bill.governor_action.clone(),
            status: bill.status.as_str().to_string(),
        }
    }
}

impl BillForm {
    /// Check every rule and hand back a trimmed draft, or all field errors.
    pub fn validate(&self) -> Result<BillDraft, Vec<FieldError>> {
        let mut errors = Vec::new();

        let bill_id = required(&mut errors, "billId", "Bill ID", &self.bill_id, BILL_ID_MAX);
        let description = required(
            &mut errors,
            "description",
            "Description",
            &self.description,
            DESCRIPTION_MAX,
        );
        let patron_name = required(
            &mut errors,
            "patronName",
            "Patron name",
            &self.patron_name,
            PATRON_NAME_MAX,
        );

        max_length(&mut errors, "houseAction", "House action", &self.house_action, ACTION_MAX);
        max_length(&mut errors, "senateAction", "Senate action", &self.senate_action, ACTION_MAX);
        max_length(
            &mut errors,
            "governorAction",
            "Governor action",
            &self.governor_action,
            ACTION_MAX,
        );

        let status = match self.status.parse::<BillStatus>() {
            Ok(status) => Some(status),
            Err(_) => {
                errors.push(FieldError::new(
                    "status",
                    format!("Status must be one of: {}", status_choices()),
                ));
                None
            }
        };

        match (errors.is_empty(), status) {
            (true, Some(status)) => Ok(BillDraft {
                bill_id,
                description,
                patron_name,
                house_action: self.house_action.clone(),
                senate_action: self.senate_action.clone(),
                governor_action: self.governor_action.clone(),
                status,
            }),
            _ => Err(errors),
        }
    }
}

fn required(
    errors: &mut Vec<FieldError>,
    field: &str,
    label: &str,
    value: &str,
    max: usize,
) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.push(FieldError::new(field, format!("{} is required", label)));
    } else if trimmed.chars().count() > max {
        errors.push(FieldError::new(
            field,
            format!("{} must be less than {} characters", label, max),
        ));
    }
    trimmed.to_string()
}

fn max_length(errors: &mut Vec<FieldError>, field: &str, label: &str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.push(FieldError::new(
            field,
            format!("{} must be less than {} characters", label, max),
        ));
    }
}

fn status_choices() -> String {
    BillStatus::ALL
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
