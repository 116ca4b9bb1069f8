// ↕️ Sort Engine - comparator dispatch over the orderable columns

use crate::bill::Bill;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    BillId,
    PatronName,
    Status,
    CreatedAt,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::BillId => "billId",
            SortField::PatronName => "patronName",
            SortField::Status => "status",
            SortField::CreatedAt => "createdAt",
        }
    }

    /// Column header shown in the table
    pub fn title(&self) -> &'static str {
        match self {
            SortField::BillId => "Bill ID",
            SortField::PatronName => "Patron",
            SortField::Status => "Status",
            SortField::CreatedAt => "Introduced",
        }
    }

    pub fn compare(&self, a: &Bill, b: &Bill) -> Ordering {
        match self {
            SortField::BillId => collate(&a.bill_id, &b.bill_id),
            SortField::PatronName => collate(&a.patron_name, &b.patron_name),
            SortField::Status => collate(a.status.as_str(), b.status.as_str()),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "billId" | "bill-id" | "bill_id" => Ok(SortField::BillId),
            "patronName" | "patron-name" | "patron_name" | "patron" => Ok(SortField::PatronName),
            "status" => Ok(SortField::Status),
            "createdAt" | "created-at" | "created_at" | "introduced" => Ok(SortField::CreatedAt),
            other => Err(format!("unknown sort field '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flip(&self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Asc => "▲",
            SortDirection::Desc => "▼",
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(format!("unknown sort direction '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    /// Newest bills first
    fn default() -> Self {
        SortSpec {
            field: SortField::CreatedAt,
            direction: SortDirection::Desc,
        }
    }
}

impl SortSpec {
    /// Clicking the active column flips direction; another column starts ascending.
    pub fn toggle(&mut self, field: SortField) {
        if self.field == field {
            self.direction = self.direction.flip();
        } else {
            self.field = field;
            self.direction = SortDirection::Asc;
        }
    }

    pub fn compare(&self, a: &Bill, b: &Bill) -> Ordering {
        self.direction.apply(self.field.compare(a, b))
    }
}

/// Stable in-place sort; equal keys keep their incoming order in both directions.
pub fn sort_bills(bills: &mut [&Bill], spec: SortSpec) {
    bills.sort_by(|a, b| spec.compare(a, b));
}

/// Case-insensitive collation in the spirit of a locale compare:
/// "apple" < "Banana" < "banana2", and "a" sorts before "A" on a tie.
pub fn collate(a: &str, b: &str) -> Ordering {
    let primary = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));

    // Code points put uppercase first, so compare reversed
    primary.then_with(|| b.cmp(a))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bill::tests::create_test_bill;
    use crate::bill::BillStatus;
    use chrono::{Duration, TimeZone, Utc};

    fn bill_ids(bills: &[&Bill]) -> Vec<String> {
        bills.iter().map(|b| b.bill_id.clone()).collect()
    }

    #[test]
    fn test_collate_is_case_insensitive() {
        assert_eq!(collate("apple", "Banana"), Ordering::Less);
        assert_eq!(collate("Banana", "apple"), Ordering::Greater);
        assert_eq!(collate("a", "A"), Ordering::Less);
        assert_eq!(collate("same", "same"), Ordering::Equal);
    }

    #[test]
    fn test_sort_by_status_example() {
        let bills = vec![
            create_test_bill("A", "x", BillStatus::Vetoed),
            create_test_bill("B", "x", BillStatus::Pending),
            create_test_bill("C", "x", BillStatus::Passed),
        ];
        let mut view: Vec<&Bill> = bills.iter().collect();

        sort_bills(&mut view, SortSpec { field: SortField::Status, direction: SortDirection::Asc });
        let statuses: Vec<BillStatus> = view.iter().map(|b| b.status).collect();
        assert_eq!(statuses, vec![BillStatus::Passed, BillStatus::Pending, BillStatus::Vetoed]);

        sort_bills(&mut view, SortSpec { field: SortField::Status, direction: SortDirection::Desc });
        let statuses: Vec<BillStatus> = view.iter().map(|b| b.status).collect();
        assert_eq!(statuses, vec![BillStatus::Vetoed, BillStatus::Pending, BillStatus::Passed]);
    }

    #[test]
    fn test_desc_reverses_asc_without_ties() {
        let bills = vec![
            create_test_bill("HB 3", "Carter", BillStatus::Pending),
            create_test_bill("hb 1", "adams", BillStatus::Pending),
            create_test_bill("SB 2", "Baker", BillStatus::Pending),
        ];

        for field in [SortField::BillId, SortField::PatronName] {
            let mut asc: Vec<&Bill> = bills.iter().collect();
            sort_bills(&mut asc, SortSpec { field, direction: SortDirection::Asc });

            let mut desc: Vec<&Bill> = bills.iter().collect();
            sort_bills(&mut desc, SortSpec { field, direction: SortDirection::Desc });

            let mut reversed = asc.clone();
            reversed.reverse();
            assert_eq!(bill_ids(&desc), bill_ids(&reversed), "{:?}", field);
        }
    }

    #[test]
    fn test_ties_keep_input_order_both_directions() {
        let bills = vec![
            create_test_bill("HB 1", "x", BillStatus::Passed),
            create_test_bill("HB 2", "x", BillStatus::Pending),
            create_test_bill("HB 3", "x", BillStatus::Passed),
            create_test_bill("HB 4", "x", BillStatus::Passed),
        ];

        let mut asc: Vec<&Bill> = bills.iter().collect();
        sort_bills(&mut asc, SortSpec { field: SortField::Status, direction: SortDirection::Asc });
        assert_eq!(bill_ids(&asc), vec!["HB 1", "HB 3", "HB 4", "HB 2"]);

        let mut desc: Vec<&Bill> = bills.iter().collect();
        sort_bills(&mut desc, SortSpec { field: SortField::Status, direction: SortDirection::Desc });
        assert_eq!(bill_ids(&desc), vec!["HB 2", "HB 1", "HB 3", "HB 4"]);
    }

    #[test]
    fn test_sort_by_created_at() {
        let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let mut bills = vec![
            create_test_bill("late", "x", BillStatus::Pending),
            create_test_bill("early", "x", BillStatus::Pending),
            create_test_bill("middle", "x", BillStatus::Pending),
        ];
        bills[0].created_at = base + Duration::days(10);
        bills[1].created_at = base;
        bills[2].created_at = base + Duration::days(5);

        let mut view: Vec<&Bill> = bills.iter().collect();
        sort_bills(&mut view, SortSpec::default());
        assert_eq!(bill_ids(&view), vec!["late", "middle", "early"]);
    }

    #[test]
    fn test_toggle() {
        let mut spec = SortSpec::default();
        spec.toggle(SortField::CreatedAt);
        assert_eq!(spec.direction, SortDirection::Asc);

        spec.toggle(SortField::BillId);
        assert_eq!(spec, SortSpec { field: SortField::BillId, direction: SortDirection::Asc });

        spec.toggle(SortField::BillId);
        assert_eq!(spec.direction, SortDirection::Desc);
    }

    #[test]
    fn test_parse_field_and_direction() {
        assert_eq!("billId".parse::<SortField>().unwrap(), SortField::BillId);
        assert_eq!("introduced".parse::<SortField>().unwrap(), SortField::CreatedAt);
        assert!("amount".parse::<SortField>().is_err());
        assert_eq!("DESC".parse::<SortDirection>().unwrap(), SortDirection::Desc);
    }
}
