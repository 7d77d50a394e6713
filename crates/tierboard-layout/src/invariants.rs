//! Structured invariant findings for layouts, placement tables and snapshots.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable code for invariant findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvariantCode {
    EmptyTier,
    RowsNotContiguous,
    RowsOutOfRankOrder,
    TotalRowsMismatch,
    ControlRowMismatch,
    StagingRowCount,
    StagingOverCapacity,
    OverCapacity,
    ExcessRows,
    ItemCountMismatch,
    DuplicateItem,
    StalePosition,
}

impl fmt::Display for InvariantCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::EmptyTier => "empty_tier",
            Self::RowsNotContiguous => "rows_not_contiguous",
            Self::RowsOutOfRankOrder => "rows_out_of_rank_order",
            Self::TotalRowsMismatch => "total_rows_mismatch",
            Self::ControlRowMismatch => "control_row_mismatch",
            Self::StagingRowCount => "staging_row_count",
            Self::StagingOverCapacity => "staging_over_capacity",
            Self::OverCapacity => "over_capacity",
            Self::ExcessRows => "excess_rows",
            Self::ItemCountMismatch => "item_count_mismatch",
            Self::DuplicateItem => "duplicate_item",
            Self::StalePosition => "stale_position",
        };
        f.write_str(name)
    }
}

/// One actionable invariant finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvariantIssue {
    pub code: InvariantCode,
    pub tier: Option<usize>,
    pub message: String,
}

/// Ordered list of findings. Empty means every checked invariant holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvariantReport {
    pub issues: Vec<InvariantIssue>,
}

impl InvariantReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    #[must_use]
    pub fn has(&self, code: InvariantCode) -> bool {
        self.issues.iter().any(|issue| issue.code == code)
    }

    #[must_use]
    pub fn first(&self) -> Option<&InvariantIssue> {
        self.issues.first()
    }

    pub(crate) fn push(&mut self, code: InvariantCode, tier: Option<usize>, message: String) {
        self.issues.push(InvariantIssue {
            code,
            tier,
            message,
        });
    }

    /// Short summary used in error payloads: `"<count> issue(s), first: <code>"`.
    #[must_use]
    pub fn summary(&self) -> String {
        match self.first() {
            Some(issue) => format!(
                "{} issue(s), first: {} ({})",
                self.issues.len(),
                issue.code,
                issue.message
            ),
            None => "no issues".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_is_clean() {
        let report = InvariantReport::default();
        assert!(report.is_clean());
        assert_eq!(report.summary(), "no issues");
    }

    #[test]
    fn summary_names_first_issue() {
        let mut report = InvariantReport::default();
        report.push(InvariantCode::EmptyTier, Some(3), "tier 3 has no rows".into());
        report.push(InvariantCode::OverCapacity, Some(1), "too many".into());
        assert!(report.has(InvariantCode::OverCapacity));
        assert_eq!(
            report.summary(),
            "2 issue(s), first: empty_tier (tier 3 has no rows)"
        );
    }
}
