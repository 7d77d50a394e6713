//! Tier-to-row allocation for the board grid.
//!
//! A [`TierLayout`] owns, for every tier, the ordered list of absolute grid
//! rows currently allocated to it. Tiers are stacked in rank order starting
//! at row 0; the last tier is the staging tier, whose single row doubles as
//! the control row at the bottom of the board.
//!
//! ```text
//! row 0 | tier 0 |
//! row 1 | tier 0 |   <- grown: 19+ items with 18 item columns
//! row 2 | tier 1 |
//! row 3 | staging / controls |
//! ```
//!
//! Rows are only ever added or removed one at a time by [`TierLayout::rebalance`],
//! which shifts every lower tier by the same delta.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::invariants::{InvariantCode, InvariantReport};
use crate::position::RESERVED_LABEL_COLUMNS;

const TRACE_TARGET: &str = "tierboard.layout";

/// Smallest grid width that leaves room for two item columns past the labels,
/// so the staging slot and the discard column never coincide.
pub const MIN_GRID_COLUMNS: u16 = RESERVED_LABEL_COLUMNS + 2;

/// Smallest tier count: one ranking tier plus the staging tier.
pub const MIN_TIER_COUNT: usize = 2;

/// Rows owned by one tier.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TierRows {
    rows: Vec<u32>,
}

/// Outcome of one rebalance step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum RowChange {
    Unchanged,
    Grew { tier: usize, row: u32 },
    Shrank { tier: usize, row: u32 },
}

impl RowChange {
    #[must_use]
    pub const fn is_change(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Tier layout construction failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutConfigError {
    #[error("a board needs at least {} tiers including staging (got {tier_count})", MIN_TIER_COUNT)]
    TooFewTiers { tier_count: usize },
    #[error("a board needs at least {} columns (got {columns})", MIN_GRID_COLUMNS)]
    TooFewColumns { columns: u16 },
    #[error("tier rows violate layout invariants: {summary}")]
    InvariantViolation { summary: String },
}

/// Row allocation for every tier of one board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierLayout {
    columns: u16,
    tiers: Vec<TierRows>,
    total_rows: u32,
    dirty: bool,
}

impl TierLayout {
    /// Fresh layout: one row per tier, tier `t` on row `t`.
    pub fn new(tier_count: usize, columns: u16) -> Result<Self, LayoutConfigError> {
        check_dimensions(tier_count, columns)?;
        let tiers = (0..tier_count)
            .map(|tier| TierRows {
                rows: vec![tier as u32],
            })
            .collect();
        Ok(Self {
            columns,
            tiers,
            total_rows: tier_count as u32,
            dirty: true,
        })
    }

    /// Rebuild a layout from explicit per-tier rows, rejecting any invariant
    /// violation.
    pub fn from_rows(columns: u16, rows: Vec<Vec<u32>>) -> Result<Self, LayoutConfigError> {
        check_dimensions(rows.len(), columns)?;
        let total_rows = rows.iter().map(|tier_rows| tier_rows.len() as u32).sum();
        let layout = Self {
            columns,
            tiers: rows.into_iter().map(|rows| TierRows { rows }).collect(),
            total_rows,
            dirty: true,
        };
        let report = layout.invariant_report();
        if !report.is_clean() {
            return Err(LayoutConfigError::InvariantViolation {
                summary: report.summary(),
            });
        }
        Ok(layout)
    }

    #[must_use]
    pub fn tier_count(&self) -> usize {
        self.tiers.len()
    }

    /// Full grid width, label columns included.
    #[must_use]
    pub const fn columns(&self) -> u16 {
        self.columns
    }

    /// Item slots per row.
    #[must_use]
    pub const fn columns_per_row(&self) -> u16 {
        self.columns - RESERVED_LABEL_COLUMNS
    }

    #[must_use]
    pub fn staging_tier(&self) -> usize {
        self.tiers.len() - 1
    }

    #[must_use]
    pub fn is_staging(&self, tier: usize) -> bool {
        tier == self.staging_tier()
    }

    #[must_use]
    pub const fn total_rows(&self) -> u32 {
        self.total_rows
    }

    /// Bottom row hosting the intake slot and the discard column.
    #[must_use]
    pub const fn control_row(&self) -> u32 {
        self.total_rows - 1
    }

    /// Column of the control row that discards the selected item.
    #[must_use]
    pub const fn discard_column(&self) -> u16 {
        self.columns - 1
    }

    #[must_use]
    pub fn row_count(&self, tier: usize) -> Option<u32> {
        self.tiers.get(tier).map(|t| t.rows.len() as u32)
    }

    #[must_use]
    pub fn occupied_rows(&self, tier: usize) -> Option<&[u32]> {
        self.tiers.get(tier).map(|t| t.rows.as_slice())
    }

    /// Item capacity of a tier at its current row count.
    #[must_use]
    pub fn capacity(&self, tier: usize) -> Option<usize> {
        self.tiers
            .get(tier)
            .map(|t| t.rows.len() * usize::from(self.columns_per_row()))
    }

    /// Tier owning an absolute row, if the row lies on the board.
    #[must_use]
    pub fn tier_for_row(&self, row: u32) -> Option<usize> {
        if row >= self.total_rows {
            return None;
        }
        // Tiers are stacked in rank order, so the owner is the last tier
        // starting at or above `row`.
        let idx = self
            .tiers
            .partition_point(|t| t.rows.first().is_some_and(|&first| first <= row));
        idx.checked_sub(1)
    }

    /// Whether the layout changed since the last [`TierLayout::take_dirty`].
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Read and clear the redraw flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    /// Grow or shrink `tier` by at most one row so that `item_count` fits
    /// with less than one full row of slack.
    ///
    /// The staging tier and unknown tiers are never resized.
    pub fn rebalance(&mut self, tier: usize, item_count: usize) -> RowChange {
        if tier >= self.tiers.len() || self.is_staging(tier) {
            return RowChange::Unchanged;
        }
        let per_row = usize::from(self.columns_per_row());
        let row_count = self.tiers[tier].rows.len();
        let capacity = row_count * per_row;

        if item_count > capacity {
            let Some(&last) = self.tiers[tier].rows.last() else {
                return RowChange::Unchanged;
            };
            let row = last + 1;
            self.shift_below(tier, 1);
            self.tiers[tier].rows.push(row);
            self.total_rows += 1;
            self.dirty = true;
            tracing::info!(
                target: TRACE_TARGET,
                tier,
                row,
                item_count,
                row_count = row_count + 1,
                total_rows = self.total_rows,
                "tier grew by one row"
            );
            RowChange::Grew { tier, row }
        } else if row_count > 1 && capacity - item_count >= per_row {
            let Some(row) = self.tiers[tier].rows.pop() else {
                return RowChange::Unchanged;
            };
            self.shift_below(tier, -1);
            self.total_rows -= 1;
            self.dirty = true;
            tracing::info!(
                target: TRACE_TARGET,
                tier,
                row,
                item_count,
                row_count = row_count - 1,
                total_rows = self.total_rows,
                "tier shrank by one row"
            );
            RowChange::Shrank { tier, row }
        } else {
            RowChange::Unchanged
        }
    }

    fn shift_below(&mut self, tier: usize, delta: i32) {
        for lower in &mut self.tiers[tier + 1..] {
            for row in &mut lower.rows {
                *row = row.saturating_add_signed(delta);
            }
        }
    }

    /// Check row ownership, ordering and the staging shape. Capacity checks
    /// need item counts and live in the placement table's report.
    #[must_use]
    pub fn invariant_report(&self) -> InvariantReport {
        let mut report = InvariantReport::default();
        let mut expected_start = 0u64;

        for (tier, tier_rows) in self.tiers.iter().enumerate() {
            let rows = &tier_rows.rows;
            let Some(&first) = rows.first() else {
                report.push(
                    InvariantCode::EmptyTier,
                    Some(tier),
                    format!("tier {tier} owns no rows"),
                );
                continue;
            };
            if u64::from(first) != expected_start {
                report.push(
                    InvariantCode::RowsOutOfRankOrder,
                    Some(tier),
                    format!("tier {tier} starts at row {first}, expected row {expected_start}"),
                );
            }
            if rows
                .windows(2)
                .any(|pair| pair[0].checked_add(1) != Some(pair[1]))
            {
                report.push(
                    InvariantCode::RowsNotContiguous,
                    Some(tier),
                    format!("tier {tier} rows {rows:?} are not contiguous"),
                );
            }
            expected_start = u64::from(first) + rows.len() as u64;
        }

        let sum: u64 = self.tiers.iter().map(|t| t.rows.len() as u64).sum();
        if sum != u64::from(self.total_rows) {
            report.push(
                InvariantCode::TotalRowsMismatch,
                None,
                format!("tiers own {sum} rows but total_rows is {}", self.total_rows),
            );
        }

        if let Some(staging) = self.tiers.last() {
            if staging.rows.len() != 1 {
                report.push(
                    InvariantCode::StagingRowCount,
                    Some(self.tiers.len() - 1),
                    format!("staging tier owns {} rows, expected 1", staging.rows.len()),
                );
            } else if self.total_rows > 0 && staging.rows[0] != self.control_row() {
                report.push(
                    InvariantCode::ControlRowMismatch,
                    Some(self.tiers.len() - 1),
                    format!(
                        "staging row {} is not the control row {}",
                        staging.rows[0],
                        self.control_row()
                    ),
                );
            }
        }

        report
    }
}

impl fmt::Display for TierLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (tier, tier_rows) in self.tiers.iter().enumerate() {
            let label = if tier + 1 == self.tiers.len() {
                "staging".to_string()
            } else {
                format!("tier {tier}")
            };
            writeln!(f, "{label}: rows {:?}", tier_rows.rows)?;
        }
        write!(
            f,
            "total rows {}, control row {}",
            self.total_rows,
            self.control_row()
        )
    }
}

fn check_dimensions(tier_count: usize, columns: u16) -> Result<(), LayoutConfigError> {
    if tier_count < MIN_TIER_COUNT {
        return Err(LayoutConfigError::TooFewTiers { tier_count });
    }
    if columns < MIN_GRID_COLUMNS {
        return Err(LayoutConfigError::TooFewColumns { columns });
    }
    Ok(())
}
