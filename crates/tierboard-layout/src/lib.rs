#![forbid(unsafe_code)]

//! Tierboard layout engine
//!
//! Grid layout and placement for tier-list boards: items are ranked by
//! clicking a source cell and then a target tier, and tiers grow or shrink
//! one row at a time as their item counts cross row-capacity thresholds.
//!
//! # Key Components
//!
//! - [`Position`] - `(row, column)` grid cell and pixel click resolution
//! - [`TierLayout`] - tier-to-row allocation with one-step rebalancing
//! - [`PlacementTable`] - ordered items per tier with cached positions
//! - [`SelectionController`] - two-phase source/target click machine
//! - [`BoardSession`] - the owned session tying the above to a template,
//!   item metadata, intake and a renderer observer
//! - [`BoardSnapshot`] - versioned save format
//!
//! # Grid shape
//!
//! Tiers are stacked in rank order from row 0. The last tier is the staging
//! tier; its single row is also the control row at the bottom of the board,
//! holding the intake slot at column 2 and the discard cell in the last
//! column. Columns 0 and 1 of every row are reserved for the tier label.

pub mod invariants;
pub mod item;
pub mod placement;
pub mod position;
pub mod selection;
pub mod session;
pub mod snapshot;
pub mod template;
pub mod tier_layout;

pub use invariants::{InvariantCode, InvariantIssue, InvariantReport};
pub use item::{ItemDraft, ItemId, ItemIdError, ItemRecord, ItemSource, QueueItemSource};
pub use placement::{
    InvalidTargetReason, PlacedItem, PlacementChanges, PlacementError, PlacementErrorKind,
    PlacementTable,
};
pub use position::{FIRST_ITEM_COLUMN, Position, RESERVED_LABEL_COLUMNS};
pub use selection::{
    BoardClick, DEFAULT_CELL_SIZE, PointerButton, SelectionConfig, SelectionConfigError,
    SelectionController, SelectionEffect, SelectionNoopReason, SelectionState,
    SelectionTransition,
};
pub use session::{BoardObserver, BoardSession, IntakeOutcome, SessionError};
pub use snapshot::{
    BOARD_SNAPSHOT_SCHEMA_VERSION, BoardSnapshot, MigrationResult, PlacedItemRecord,
    SnapshotError, SnapshotMigrationError, TierRecord, migrate_snapshot, needs_migration,
};
pub use template::{
    DEFAULT_GRID_COLUMNS, TemplateCatalog, TemplateConfigError, TierStyle, TierTemplate,
};
pub use tier_layout::{LayoutConfigError, MIN_GRID_COLUMNS, MIN_TIER_COUNT, RowChange, TierLayout};
