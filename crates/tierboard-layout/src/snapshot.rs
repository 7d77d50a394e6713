//! Versioned, serializable board state.
//!
//! A [`BoardSnapshot`] captures everything needed to rebuild a session's
//! board: the template id, per-tier rows, per-tier item lists with metadata
//! and cached positions, and the intake counters. Snapshots are plain data;
//! [`BoardSnapshot::to_table`] re-checks every layout and placement invariant
//! before any of it becomes live state.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::item::{ItemId, ItemRecord};
use crate::placement::{PlacedItem, PlacementTable};
use crate::position::Position;
use crate::tier_layout::{LayoutConfigError, TierLayout};

/// Current board snapshot schema version.
pub const BOARD_SNAPSHOT_SCHEMA_VERSION: u16 = 1;

/// One placed item with its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedItemRecord {
    pub id: ItemId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_key: Option<String>,
    pub position: Position,
}

impl PlacedItemRecord {
    #[must_use]
    pub fn to_item_record(&self) -> ItemRecord {
        ItemRecord {
            id: self.id,
            title: self.title.clone(),
            image_key: self.image_key.clone(),
        }
    }
}

/// Persisted rows and items of one tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierRecord {
    pub row_count: u32,
    pub occupied_rows: Vec<u32>,
    #[serde(default)]
    pub items: Vec<PlacedItemRecord>,
}

/// Persisted board state.
///
/// Forward-compatible: unknown keys can be carried in `extensions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    /// Schema version for migration detection.
    #[serde(default = "default_schema_version")]
    pub schema_version: u16,
    pub template_id: String,
    pub tier_count: usize,
    pub columns: u16,
    pub total_rows: u32,
    pub control_row: u32,
    pub tiers: Vec<TierRecord>,
    /// Items still waiting in the intake source.
    #[serde(default)]
    pub remaining: usize,
    /// Whether any item has been drawn; locks the template.
    #[serde(default)]
    pub intake_started: bool,
    /// Forward-compatible extension bag.
    #[serde(default)]
    pub extensions: BTreeMap<String, String>,
}

fn default_schema_version() -> u16 {
    BOARD_SNAPSHOT_SCHEMA_VERSION
}

/// Errors from snapshot validation and persistence.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("unsupported board snapshot schema version {found} (expected {expected})")]
    UnsupportedVersion { found: u16, expected: u16 },
    #[error(transparent)]
    Migration(#[from] SnapshotMigrationError),
    #[error("snapshot declares {declared} tiers but records {recorded}")]
    TierCountMismatch { declared: usize, recorded: usize },
    #[error("tier {tier} declares {declared} rows but lists {listed}")]
    RowCountMismatch {
        tier: usize,
        declared: u32,
        listed: usize,
    },
    #[error("snapshot {field} is {recorded} but its rows imply {derived}")]
    HeaderMismatch {
        field: &'static str,
        recorded: u32,
        derived: u32,
    },
    #[error("invalid board state: {0}")]
    Layout(#[from] LayoutConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BoardSnapshot {
    /// Capture a placement table. Items without metadata in `records` are
    /// saved with their id as title.
    #[must_use]
    pub fn capture(
        template_id: impl Into<String>,
        table: &PlacementTable,
        records: &BTreeMap<ItemId, ItemRecord>,
    ) -> Self {
        let layout = table.layout();
        let tiers = (0..table.tier_count())
            .map(|tier| {
                let occupied_rows = layout.occupied_rows(tier).unwrap_or_default().to_vec();
                let items = table
                    .items(tier)
                    .unwrap_or_default()
                    .iter()
                    .map(|placed| {
                        let record = records.get(&placed.id);
                        PlacedItemRecord {
                            id: placed.id,
                            title: record
                                .map_or_else(|| placed.id.to_string(), |r| r.title.clone()),
                            image_key: record.and_then(|r| r.image_key.clone()),
                            position: placed.position,
                        }
                    })
                    .collect();
                TierRecord {
                    row_count: occupied_rows.len() as u32,
                    occupied_rows,
                    items,
                }
            })
            .collect();

        Self {
            schema_version: BOARD_SNAPSHOT_SCHEMA_VERSION,
            template_id: template_id.into(),
            tier_count: table.tier_count(),
            columns: layout.columns(),
            total_rows: layout.total_rows(),
            control_row: layout.control_row(),
            tiers,
            remaining: 0,
            intake_started: false,
            extensions: BTreeMap::new(),
        }
    }

    /// Set intake counters.
    #[must_use]
    pub fn with_intake(mut self, remaining: usize, intake_started: bool) -> Self {
        self.remaining = remaining;
        self.intake_started = intake_started;
        self
    }

    /// Validate the snapshot against schema and structural invariants.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        self.to_table().map(|_| ())
    }

    /// Rebuild the placement table this snapshot describes.
    pub fn to_table(&self) -> Result<PlacementTable, SnapshotError> {
        if self.schema_version != BOARD_SNAPSHOT_SCHEMA_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: self.schema_version,
                expected: BOARD_SNAPSHOT_SCHEMA_VERSION,
            });
        }
        if self.tier_count != self.tiers.len() {
            return Err(SnapshotError::TierCountMismatch {
                declared: self.tier_count,
                recorded: self.tiers.len(),
            });
        }
        for (tier, record) in self.tiers.iter().enumerate() {
            if record.row_count as usize != record.occupied_rows.len() {
                return Err(SnapshotError::RowCountMismatch {
                    tier,
                    declared: record.row_count,
                    listed: record.occupied_rows.len(),
                });
            }
        }

        let rows = self
            .tiers
            .iter()
            .map(|record| record.occupied_rows.clone())
            .collect();
        let layout = TierLayout::from_rows(self.columns, rows)?;
        check_header("total_rows", self.total_rows, layout.total_rows())?;
        check_header("control_row", self.control_row, layout.control_row())?;

        let items = self
            .tiers
            .iter()
            .map(|record| {
                record
                    .items
                    .iter()
                    .map(|item| PlacedItem {
                        id: item.id,
                        position: item.position,
                    })
                    .collect()
            })
            .collect();
        Ok(PlacementTable::from_parts(layout, items)?)
    }

    /// Metadata of every saved item, in tier order.
    pub fn item_records(&self) -> impl Iterator<Item = ItemRecord> + '_ {
        self.tiers
            .iter()
            .flat_map(|record| record.items.iter().map(PlacedItemRecord::to_item_record))
    }

    /// Number of items on the board, staging included.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.tiers.iter().map(|record| record.items.len()).sum()
    }

    /// Deterministic hash for state diagnostics.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.schema_version.hash(&mut hasher);
        self.template_id.hash(&mut hasher);
        self.tier_count.hash(&mut hasher);
        self.columns.hash(&mut hasher);
        self.total_rows.hash(&mut hasher);
        for record in &self.tiers {
            record.occupied_rows.hash(&mut hasher);
            for item in &record.items {
                item.id.hash(&mut hasher);
                item.title.hash(&mut hasher);
                item.image_key.hash(&mut hasher);
                item.position.hash(&mut hasher);
            }
        }
        self.remaining.hash(&mut hasher);
        self.intake_started.hash(&mut hasher);
        for (k, v) in &self.extensions {
            k.hash(&mut hasher);
            v.hash(&mut hasher);
        }
        hasher.finish()
    }

    pub fn to_json_pretty(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and migrate a snapshot. Structural validation is left to
    /// [`validate`](Self::validate).
    pub fn from_json_str(s: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(s)?;
        Ok(migrate_snapshot(snapshot)?.snapshot)
    }

    pub fn write_to_path(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        std::fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }

    pub fn read_from_path(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }
}

fn check_header(field: &'static str, recorded: u32, derived: u32) -> Result<(), SnapshotError> {
    if recorded == derived {
        Ok(())
    } else {
        Err(SnapshotError::HeaderMismatch {
            field,
            recorded,
            derived,
        })
    }
}

/// Result of attempting to migrate a snapshot from an older schema version.
#[derive(Debug, Clone)]
pub struct MigrationResult {
    pub snapshot: BoardSnapshot,
    pub from_version: u16,
    pub to_version: u16,
    pub warnings: Vec<String>,
}

/// Errors from snapshot migration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotMigrationError {
    #[error("unsupported schema version {version} for migration")]
    UnsupportedVersion { version: u16 },
    #[error("no migration path from v{from} to v{to}")]
    NoMigrationPath { from: u16, to: u16 },
}

/// Migrate a snapshot to the current schema version.
///
/// v1 is current, so this is the identity for v1 and an error otherwise.
pub fn migrate_snapshot(snapshot: BoardSnapshot) -> Result<MigrationResult, SnapshotMigrationError> {
    match snapshot.schema_version {
        BOARD_SNAPSHOT_SCHEMA_VERSION => Ok(MigrationResult {
            from_version: BOARD_SNAPSHOT_SCHEMA_VERSION,
            to_version: BOARD_SNAPSHOT_SCHEMA_VERSION,
            warnings: Vec::new(),
            snapshot,
        }),
        v if v > BOARD_SNAPSHOT_SCHEMA_VERSION => {
            Err(SnapshotMigrationError::UnsupportedVersion { version: v })
        }
        v => Err(SnapshotMigrationError::NoMigrationPath {
            from: v,
            to: BOARD_SNAPSHOT_SCHEMA_VERSION,
        }),
    }
}

#[must_use]
pub fn needs_migration(snapshot: &BoardSnapshot) -> bool {
    snapshot.schema_version != BOARD_SNAPSHOT_SCHEMA_VERSION
}
