//! Per-tier item placement on top of a [`TierLayout`].
//!
//! The table keeps, for every tier, the ordered list of items assigned to it
//! together with each item's cached grid [`Position`]. Order is the only
//! ground truth: positions are re-derived left-to-right, top-to-bottom over
//! the tier's occupied rows after every structural change.
//!
//! Every mutation validates its inputs before touching any state, so a
//! rejected call leaves the table exactly as it was.

use std::collections::BTreeSet;
use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::invariants::{InvariantCode, InvariantReport};
use crate::item::ItemId;
use crate::position::{FIRST_ITEM_COLUMN, Position};
use crate::tier_layout::{LayoutConfigError, RowChange, TierLayout};

const TRACE_TARGET: &str = "tierboard.placement";

/// One item and its cached grid position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlacedItem {
    pub id: ItemId,
    pub position: Position,
}

/// Why a move target was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidTargetReason {
    /// The target tier already owns the item's current row.
    SameTier,
    /// Items only enter staging through intake.
    StagingTier,
}

impl fmt::Display for InvalidTargetReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SameTier => f.write_str("the item already belongs to that tier"),
            Self::StagingTier => f.write_str("the staging tier only accepts new items"),
        }
    }
}

/// Coarse classification of [`PlacementError`] for user-facing reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementErrorKind {
    Capacity,
    InvalidTarget,
    NotFound,
}

/// Recoverable placement failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    #[error("the staging tier already holds item {occupant}; place it before drawing another")]
    Capacity { occupant: ItemId },
    #[error("item {item} cannot move to tier {tier}: {reason}")]
    InvalidTarget {
        item: ItemId,
        tier: usize,
        reason: InvalidTargetReason,
    },
    #[error("tier {tier} does not exist")]
    TierNotFound { tier: usize },
    #[error("item {item} is not in tier {tier}")]
    ItemNotFound { item: ItemId, tier: usize },
    #[error("item {item} is already on the board in tier {tier}")]
    AlreadyPlaced { item: ItemId, tier: usize },
}

impl PlacementError {
    #[must_use]
    pub const fn kind(&self) -> PlacementErrorKind {
        match self {
            Self::Capacity { .. } => PlacementErrorKind::Capacity,
            Self::InvalidTarget { .. } | Self::AlreadyPlaced { .. } => {
                PlacementErrorKind::InvalidTarget
            }
            Self::TierNotFound { .. } | Self::ItemNotFound { .. } => PlacementErrorKind::NotFound,
        }
    }
}

/// Accumulated changes since the last [`PlacementTable::take_changes`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlacementChanges {
    /// At least one tier gained or lost a row.
    pub layout_changed: bool,
    /// Tiers whose item list or item positions changed.
    pub tiers: BTreeSet<usize>,
}

impl PlacementChanges {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.layout_changed && self.tiers.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct TierSlots {
    items: Vec<PlacedItem>,
    item_count: usize,
}

/// Item assignment for every tier of one board.
#[derive(Debug, Clone)]
pub struct PlacementTable {
    layout: TierLayout,
    tiers: Vec<TierSlots>,
    locations: FxHashMap<ItemId, usize>,
    changes: PlacementChanges,
}

impl PartialEq for PlacementTable {
    fn eq(&self, other: &Self) -> bool {
        self.layout == other.layout && self.tiers == other.tiers
    }
}

impl Eq for PlacementTable {}

impl PlacementTable {
    /// Empty table over a fresh layout.
    pub fn new(tier_count: usize, columns: u16) -> Result<Self, LayoutConfigError> {
        Ok(Self::with_layout(TierLayout::new(tier_count, columns)?))
    }

    /// Empty table over an existing layout.
    #[must_use]
    fn with_layout(layout: TierLayout) -> Self {
        let tiers = vec![TierSlots::default(); layout.tier_count()];
        Self {
            layout,
            tiers,
            locations: FxHashMap::default(),
            changes: PlacementChanges {
                layout_changed: true,
                tiers: BTreeSet::new(),
            },
        }
    }

    /// Rebuild a table from a layout and per-tier item lists, rejecting any
    /// state that violates the layout or placement invariants (including
    /// positions that disagree with the canonical slot order).
    pub fn from_parts(
        layout: TierLayout,
        tier_items: Vec<Vec<PlacedItem>>,
    ) -> Result<Self, LayoutConfigError> {
        if tier_items.len() != layout.tier_count() {
            return Err(LayoutConfigError::InvariantViolation {
                summary: format!(
                    "{} item lists for {} tiers",
                    tier_items.len(),
                    layout.tier_count()
                ),
            });
        }
        let mut locations = FxHashMap::default();
        for (tier, items) in tier_items.iter().enumerate() {
            for placed in items {
                locations.entry(placed.id).or_insert(tier);
            }
        }
        let tiers = tier_items
            .into_iter()
            .map(|items| TierSlots {
                item_count: items.len(),
                items,
            })
            .collect();
        let table = Self {
            layout,
            tiers,
            locations,
            changes: PlacementChanges {
                layout_changed: true,
                tiers: BTreeSet::new(),
            },
        };
        let report = table.invariant_report();
        if !report.is_clean() {
            return Err(LayoutConfigError::InvariantViolation {
                summary: report.summary(),
            });
        }
        Ok(table)
    }

    #[must_use]
    pub const fn layout(&self) -> &TierLayout {
        &self.layout
    }

    #[must_use]
    pub fn tier_count(&self) -> usize {
        self.tiers.len()
    }

    #[must_use]
    pub fn staging_tier(&self) -> usize {
        self.layout.staging_tier()
    }

    /// Ordered items of a tier.
    #[must_use]
    pub fn items(&self, tier: usize) -> Option<&[PlacedItem]> {
        self.tiers.get(tier).map(|slots| slots.items.as_slice())
    }

    #[must_use]
    pub fn item_count(&self, tier: usize) -> Option<usize> {
        self.tiers.get(tier).map(|slots| slots.item_count)
    }

    /// Total number of items on the board, staging included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// The item waiting in the staging tier, if any.
    #[must_use]
    pub fn staged_item(&self) -> Option<PlacedItem> {
        self.tiers[self.staging_tier()].items.first().copied()
    }

    /// Tier and current position of an item.
    #[must_use]
    pub fn locate(&self, item: ItemId) -> Option<(usize, Position)> {
        let tier = *self.locations.get(&item)?;
        self.tiers[tier]
            .items
            .iter()
            .find(|placed| placed.id == item)
            .map(|placed| (tier, placed.position))
    }

    /// Tier and item occupying a cell.
    #[must_use]
    pub fn item_at(&self, position: Position) -> Option<(usize, ItemId)> {
        let tier = self.layout.tier_for_row(position.row)?;
        self.tiers[tier]
            .items
            .iter()
            .find(|placed| placed.position == position)
            .map(|placed| (tier, placed.id))
    }

    /// Put a new item into the empty staging tier at the first item column
    /// of the control row.
    pub fn add_to_staging(&mut self, item: ItemId) -> Result<Position, PlacementError> {
        if let Some(&tier) = self.locations.get(&item) {
            return Err(PlacementError::AlreadyPlaced { item, tier });
        }
        let staging = self.staging_tier();
        if let Some(occupant) = self.tiers[staging].items.first() {
            return Err(PlacementError::Capacity {
                occupant: occupant.id,
            });
        }

        let position = Position::new(self.layout.control_row(), FIRST_ITEM_COLUMN);
        let slots = &mut self.tiers[staging];
        slots.items.push(PlacedItem { id: item, position });
        slots.item_count += 1;
        self.locations.insert(item, staging);
        self.rebalance_tiers([staging]);

        tracing::debug!(target: TRACE_TARGET, item = item.get(), %position, "item staged");
        Ok(position)
    }

    /// Move an item from one tier to the end of another and return its new
    /// position.
    pub fn move_item(
        &mut self,
        item: ItemId,
        from_tier: usize,
        to_tier: usize,
    ) -> Result<Position, PlacementError> {
        self.check_tier(from_tier)?;
        self.check_tier(to_tier)?;
        let index = self.index_in(item, from_tier)?;
        let current = self.tiers[from_tier].items[index].position;

        if self.layout.is_staging(to_tier) {
            return Err(PlacementError::InvalidTarget {
                item,
                tier: to_tier,
                reason: InvalidTargetReason::StagingTier,
            });
        }
        if self
            .layout
            .occupied_rows(to_tier)
            .is_some_and(|rows| rows.contains(&current.row))
        {
            return Err(PlacementError::InvalidTarget {
                item,
                tier: to_tier,
                reason: InvalidTargetReason::SameTier,
            });
        }

        let placed = self.tiers[from_tier].items.remove(index);
        self.tiers[from_tier].item_count -= 1;
        self.tiers[to_tier].items.push(placed);
        self.tiers[to_tier].item_count += 1;
        self.locations.insert(item, to_tier);
        self.rebalance_tiers([from_tier, to_tier]);

        let position = self
            .locate(item)
            .map_or(current, |(_, position)| position);
        tracing::debug!(
            target: TRACE_TARGET,
            item = item.get(),
            from_tier,
            to_tier,
            %position,
            "item moved"
        );
        Ok(position)
    }

    /// Take an item off the board.
    pub fn remove(&mut self, item: ItemId, from_tier: usize) -> Result<(), PlacementError> {
        self.check_tier(from_tier)?;
        let index = self.index_in(item, from_tier)?;

        self.tiers[from_tier].items.remove(index);
        self.tiers[from_tier].item_count -= 1;
        self.locations.remove(&item);
        self.rebalance_tiers([from_tier]);

        tracing::debug!(target: TRACE_TARGET, item = item.get(), from_tier, "item removed");
        Ok(())
    }

    /// Rebalance each listed tier once, in ascending rank order, then
    /// re-derive positions for the listed tiers and for every tier whose
    /// rows shifted.
    pub fn rebalance_tiers(&mut self, tiers: impl IntoIterator<Item = usize>) -> Vec<RowChange> {
        let touched: BTreeSet<usize> = tiers
            .into_iter()
            .filter(|&tier| tier < self.tiers.len())
            .collect();

        let mut row_changes = Vec::new();
        for &tier in &touched {
            let change = self.layout.rebalance(tier, self.tiers[tier].item_count);
            if change.is_change() {
                row_changes.push(change);
            }
        }

        let first_shifted = row_changes
            .iter()
            .filter_map(|change| match *change {
                RowChange::Grew { tier, .. } | RowChange::Shrank { tier, .. } => Some(tier),
                RowChange::Unchanged => None,
            })
            .min();
        if first_shifted.is_some() {
            self.changes.layout_changed = true;
        }

        for tier in 0..self.tiers.len() {
            let shifted = first_shifted.is_some_and(|first| tier >= first);
            if touched.contains(&tier) {
                self.recompute_positions(tier);
                self.changes.tiers.insert(tier);
            } else if shifted {
                self.recompute_positions(tier);
            }
        }

        self.debug_check();
        row_changes
    }

    /// Re-derive every item position of a tier from its slot order.
    ///
    /// Returns `true` if any cached position changed.
    pub fn recompute_positions(&mut self, tier: usize) -> bool {
        let Some(rows) = self.layout.occupied_rows(tier) else {
            return false;
        };
        let per_row = usize::from(self.layout.columns_per_row());
        let mut changed = false;
        for (index, placed) in self.tiers[tier].items.iter_mut().enumerate() {
            let Some(expected) = slot_position(rows, per_row, index) else {
                tracing::warn!(
                    target: TRACE_TARGET,
                    tier,
                    index,
                    "item slot exceeds tier capacity"
                );
                continue;
            };
            if placed.position != expected {
                placed.position = expected;
                changed = true;
            }
        }
        if changed {
            self.changes.tiers.insert(tier);
        }
        changed
    }

    /// Drain the accumulated change set.
    pub fn take_changes(&mut self) -> PlacementChanges {
        self.layout.take_dirty();
        std::mem::take(&mut self.changes)
    }

    /// Layout invariants plus per-tier capacity, count and position checks.
    #[must_use]
    pub fn invariant_report(&self) -> InvariantReport {
        let mut report = self.layout.invariant_report();
        let per_row = usize::from(self.layout.columns_per_row());
        let staging = self.staging_tier();
        let mut seen = FxHashSet::default();

        for (tier, slots) in self.tiers.iter().enumerate() {
            if slots.item_count != slots.items.len() {
                report.push(
                    InvariantCode::ItemCountMismatch,
                    Some(tier),
                    format!(
                        "tier {tier} counts {} items but lists {}",
                        slots.item_count,
                        slots.items.len()
                    ),
                );
            }

            if tier == staging {
                if slots.items.len() > 1 {
                    report.push(
                        InvariantCode::StagingOverCapacity,
                        Some(tier),
                        format!("staging tier holds {} items", slots.items.len()),
                    );
                }
            } else if let Some(capacity) = self.layout.capacity(tier) {
                let held = slots.items.len();
                if held > capacity {
                    report.push(
                        InvariantCode::OverCapacity,
                        Some(tier),
                        format!("tier {tier} holds {held} items but fits {capacity}"),
                    );
                } else if per_row > 0 {
                    let needed = held.div_ceil(per_row).max(1);
                    let owned = capacity / per_row;
                    if owned > needed {
                        report.push(
                            InvariantCode::ExcessRows,
                            Some(tier),
                            format!("tier {tier} owns {owned} rows but {held} items need {needed}"),
                        );
                    }
                }
            }

            let rows = self.layout.occupied_rows(tier).unwrap_or_default();
            for (index, placed) in slots.items.iter().enumerate() {
                if !seen.insert(placed.id) || self.locations.get(&placed.id) != Some(&tier) {
                    report.push(
                        InvariantCode::DuplicateItem,
                        Some(tier),
                        format!("item {} is listed more than once", placed.id),
                    );
                }
                if slot_position(rows, per_row, index).is_some_and(|p| p != placed.position) {
                    report.push(
                        InvariantCode::StalePosition,
                        Some(tier),
                        format!(
                            "item {} cached at {} but slot {index} is elsewhere",
                            placed.id, placed.position
                        ),
                    );
                }
            }
        }

        if self.locations.len() != seen.len() {
            report.push(
                InvariantCode::DuplicateItem,
                None,
                format!(
                    "{} indexed items but {} listed",
                    self.locations.len(),
                    seen.len()
                ),
            );
        }

        report
    }

    fn check_tier(&self, tier: usize) -> Result<(), PlacementError> {
        if tier < self.tiers.len() {
            Ok(())
        } else {
            Err(PlacementError::TierNotFound { tier })
        }
    }

    fn index_in(&self, item: ItemId, tier: usize) -> Result<usize, PlacementError> {
        self.tiers[tier]
            .items
            .iter()
            .position(|placed| placed.id == item)
            .ok_or(PlacementError::ItemNotFound { item, tier })
    }

    fn debug_check(&self) {
        if cfg!(debug_assertions) {
            let report = self.invariant_report();
            debug_assert!(report.is_clean(), "placement invariants: {}", report.summary());
        }
    }
}

/// Grid cell of the `index`-th item of a tier occupying `rows`.
fn slot_position(rows: &[u32], per_row: usize, index: usize) -> Option<Position> {
    if per_row == 0 {
        return None;
    }
    let row = *rows.get(index / per_row)?;
    let column = FIRST_ITEM_COLUMN + u16::try_from(index % per_row).ok()?;
    Some(Position::new(row, column))
}
