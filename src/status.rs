// 🚦 Status Normalizer - collapse the source flags into one BillStatus
//
// Precedence, first match wins:
//   passed (house, senate or overall) > vetoed > failed > approved > carried-over > pending

use crate::bill::BillStatus;

/// The boolean-ish columns of an upstream bill record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusFlags {
    pub passed_house: bool,
    pub passed_senate: bool,
    pub passed: bool,
    pub vetoed: bool,
    pub failed: bool,
    pub approved: bool,
    pub carried_over: bool,
}

/// Upstream flags are the literal string "Yes"; anything else is false.
pub fn is_yes(value: Option<&str>) -> bool {
    value == Some("Yes")
}

impl StatusFlags {
    pub fn derive(&self) -> BillStatus {
        if self.passed_house || self.passed_senate || self.passed {
            BillStatus::Passed
        } else if self.vetoed {
            BillStatus::Vetoed
        } else if self.failed {
            BillStatus::Failed
        } else if self.approved {
            BillStatus::Approved
        } else if self.carried_over {
            BillStatus::CarriedOver
        } else {
            BillStatus::Pending
        }
    }

    /// True when more than one precedence group is set, i.e. the
    /// precedence order actually had to break a tie.
    pub fn is_ambiguous(&self) -> bool {
        let groups = [
            self.passed_house || self.passed_senate || self.passed,
            self.vetoed,
            self.failed,
            self.approved,
            self.carried_over,
        ];
        groups.iter().filter(|set| **set).count() > 1
    }
}

/// Derive the status for one bill, tracing overlapping flags so the
/// precedence assumption can be audited against real data.
pub fn derive_status(bill_id: &str, flags: &StatusFlags) -> BillStatus {
    let status = flags.derive();
    if flags.is_ambiguous() {
        tracing::debug!(bill_id, ?flags, status = status.as_str(), "overlapping status flags");
    }
    status
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags_from_bits(bits: u8) -> StatusFlags {
        StatusFlags {
            passed_house: bits & 0b000_0001 != 0,
            passed_senate: bits & 0b000_0010 != 0,
            passed: bits & 0b000_0100 != 0,
            vetoed: bits & 0b000_1000 != 0,
            failed: bits & 0b001_0000 != 0,
            approved: bits & 0b010_0000 != 0,
            carried_over: bits & 0b100_0000 != 0,
        }
    }

    #[test]
    fn test_no_flags_is_pending() {
        assert_eq!(StatusFlags::default().derive(), BillStatus::Pending);
    }

    #[test]
    fn test_each_single_flag() {
        let cases = [
            (StatusFlags { passed_house: true, ..Default::default() }, BillStatus::Passed),
            (StatusFlags { passed_senate: true, ..Default::default() }, BillStatus::Passed),
            (StatusFlags { passed: true, ..Default::default() }, BillStatus::Passed),
            (StatusFlags { vetoed: true, ..Default::default() }, BillStatus::Vetoed),
            (StatusFlags { failed: true, ..Default::default() }, BillStatus::Failed),
            (StatusFlags { approved: true, ..Default::default() }, BillStatus::Approved),
            (StatusFlags { carried_over: true, ..Default::default() }, BillStatus::CarriedOver),
        ];

        for (flags, expected) in cases {
            assert_eq!(flags.derive(), expected, "{:?}", flags);
            assert!(!flags.is_ambiguous());
        }
    }

    #[test]
    fn test_passed_beats_vetoed() {
        let flags = StatusFlags {
            passed_house: true,
            vetoed: true,
            ..Default::default()
        };
        assert_eq!(flags.derive(), BillStatus::Passed);
        assert!(flags.is_ambiguous());
    }

    #[test]
    fn test_precedence_over_every_combination() {
        for bits in 0u8..128 {
            let flags = flags_from_bits(bits);
            let expected = if bits & 0b000_0111 != 0 {
                BillStatus::Passed
            } else if bits & 0b000_1000 != 0 {
                BillStatus::Vetoed
            } else if bits & 0b001_0000 != 0 {
                BillStatus::Failed
            } else if bits & 0b010_0000 != 0 {
                BillStatus::Approved
            } else if bits & 0b100_0000 != 0 {
                BillStatus::CarriedOver
            } else {
                BillStatus::Pending
            };
            assert_eq!(derive_status("HB 1", &flags), expected, "bits {:07b}", bits);
        }
    }

    #[test]
    fn test_is_yes_is_exact() {
        assert!(is_yes(Some("Yes")));
        assert!(!is_yes(Some("yes")));
        assert!(!is_yes(Some("No")));
        assert!(!is_yes(Some("")));
        assert!(!is_yes(None));
    }
}
