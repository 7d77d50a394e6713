//! The owned board session: template, placement table, selection machine,
//! item metadata and intake counters in one value.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::invariants::InvariantReport;
use crate::item::{ItemId, ItemIdError, ItemRecord, ItemSource};
use crate::placement::{PlacementError, PlacementTable};
use crate::position::Position;
use crate::selection::{
    BoardClick, SelectionConfig, SelectionConfigError, SelectionController, SelectionEffect,
    SelectionTransition,
};
use crate::snapshot::{BoardSnapshot, SnapshotError};
use crate::template::{TemplateCatalog, TierTemplate};
use crate::tier_layout::LayoutConfigError;

const TRACE_TARGET: &str = "tierboard.session";

/// Renderer hooks. The renderer pulls state from the session when notified.
pub trait BoardObserver {
    /// Rows were added or removed; labels and backgrounds need redrawing.
    fn notify_layout_changed(&mut self) {}

    /// Items of `tier` were added, removed or repositioned.
    fn notify_positions_changed(&mut self, _tier: usize) {}

    /// An item was selected as a move source.
    fn notify_item_selected(&mut self, _item: ItemId, _position: Position) {}

    /// The pending selection ended.
    fn notify_selection_cleared(&mut self) {}
}

/// Result of an intake request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeOutcome {
    Staged { item: ItemId, position: Position },
    /// The staging tier still holds the previous item.
    StagingBusy { occupant: ItemId },
    /// A source is selected; finish or cancel it first.
    SelectionPending,
    /// The item source has nothing left.
    Exhausted,
}

/// Session-level failures.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Layout(#[from] LayoutConfigError),
    #[error(transparent)]
    Placement(#[from] PlacementError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Selection(#[from] SelectionConfigError),
    #[error(transparent)]
    ItemId(#[from] ItemIdError),
    #[error("template {current:?} is locked once intake has started")]
    TemplateLocked { current: String },
    #[error("unknown template {id:?}")]
    UnknownTemplate { id: String },
    #[error(
        "snapshot for template {found:?} ({found_tiers} tiers, {found_columns} columns) does not fit template {expected:?} ({expected_tiers} tiers, {expected_columns} columns)"
    )]
    TemplateMismatch {
        expected: String,
        expected_tiers: usize,
        expected_columns: u16,
        found: String,
        found_tiers: usize,
        found_columns: u16,
    },
}

/// One tier board being ranked.
pub struct BoardSession {
    template: TierTemplate,
    table: PlacementTable,
    selection: SelectionController,
    records: BTreeMap<ItemId, ItemRecord>,
    next_id: ItemId,
    remaining: usize,
    intake_started: bool,
    observer: Option<Box<dyn BoardObserver>>,
}

impl fmt::Debug for BoardSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoardSession")
            .field("template", &self.template.id)
            .field("table", &self.table)
            .field("selection", &self.selection.state())
            .field("items", &self.records.len())
            .field("remaining", &self.remaining)
            .field("intake_started", &self.intake_started)
            .finish_non_exhaustive()
    }
}

impl BoardSession {
    pub fn new(template: TierTemplate, config: SelectionConfig) -> Result<Self, SessionError> {
        let table = PlacementTable::new(template.tier_count(), template.columns)?;
        let selection = SelectionController::new(config)?;
        tracing::info!(
            target: TRACE_TARGET,
            template = %template.id,
            tier_count = template.tier_count(),
            columns = template.columns,
            "board session created"
        );
        Ok(Self {
            template,
            table,
            selection,
            records: BTreeMap::new(),
            next_id: ItemId::default(),
            remaining: 0,
            intake_started: false,
            observer: None,
        })
    }

    /// Create a session from a catalog entry.
    pub fn from_catalog(
        catalog: &TemplateCatalog,
        template_id: &str,
        config: SelectionConfig,
    ) -> Result<Self, SessionError> {
        let template = catalog
            .get(template_id)
            .cloned()
            .ok_or_else(|| SessionError::UnknownTemplate {
                id: template_id.to_string(),
            })?;
        Self::new(template, config)
    }

    /// Rebuild a session from a snapshot whose template is in `catalog`.
    pub fn restore(
        snapshot: BoardSnapshot,
        catalog: &TemplateCatalog,
        config: SelectionConfig,
    ) -> Result<Self, SessionError> {
        let mut session = Self::from_catalog(catalog, &snapshot.template_id, config)?;
        session.import_state(snapshot)?;
        Ok(session)
    }

    pub fn set_observer(&mut self, observer: Box<dyn BoardObserver>) {
        self.observer = Some(observer);
    }

    pub fn clear_observer(&mut self) -> Option<Box<dyn BoardObserver>> {
        self.observer.take()
    }

    #[must_use]
    pub const fn template(&self) -> &TierTemplate {
        &self.template
    }

    #[must_use]
    pub const fn table(&self) -> &PlacementTable {
        &self.table
    }

    #[must_use]
    pub const fn selection(&self) -> &SelectionController {
        &self.selection
    }

    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.remaining
    }

    /// Record how many items the attached source still holds.
    pub fn set_remaining(&mut self, remaining: usize) {
        self.remaining = remaining;
    }

    #[must_use]
    pub const fn intake_started(&self) -> bool {
        self.intake_started
    }

    /// Switch to another template, discarding the board.
    pub fn choose_template(&mut self, template: TierTemplate) -> Result<(), SessionError> {
        if self.intake_started {
            return Err(SessionError::TemplateLocked {
                current: self.template.id.clone(),
            });
        }
        let table = PlacementTable::new(template.tier_count(), template.columns)?;
        tracing::info!(
            target: TRACE_TARGET,
            from = %self.template.id,
            to = %template.id,
            "template changed"
        );
        self.template = template;
        self.table = table;
        self.records.clear();
        self.next_id = ItemId::default();
        self.selection.force_cancel();
        self.publish_changes();
        Ok(())
    }

    /// Move the next source item into the staging slot.
    pub fn draw_next(&mut self, source: &mut dyn ItemSource) -> Result<IntakeOutcome, SessionError> {
        if self.selection.is_active() {
            return Ok(IntakeOutcome::SelectionPending);
        }
        if let Some(occupant) = self.table.staged_item() {
            return Ok(IntakeOutcome::StagingBusy {
                occupant: occupant.id,
            });
        }
        let Some(draft) = source.next_item() else {
            self.remaining = 0;
            return Ok(IntakeOutcome::Exhausted);
        };

        let item = self.next_id;
        let following = item.checked_next()?;
        let position = self.table.add_to_staging(item)?;
        tracing::debug!(
            target: TRACE_TARGET,
            item = item.get(),
            title = %draft.title,
            remaining = source.remaining(),
            "item drawn"
        );
        self.records.insert(item, ItemRecord::from_draft(item, draft));
        self.next_id = following;
        self.remaining = source.remaining();
        self.intake_started = true;
        self.publish_changes();
        Ok(IntakeOutcome::Staged { item, position })
    }

    /// Feed one click to the selection machine.
    pub fn click(&mut self, click: BoardClick) -> Result<SelectionTransition, SessionError> {
        let transition = self.selection.apply_click(&mut self.table, click)?;
        if let SelectionEffect::Discarded { item, .. } = transition.effect {
            self.records.remove(&item);
        }
        self.publish_changes();
        if let Some(observer) = self.observer.as_mut() {
            match transition.effect {
                SelectionEffect::Selected { item, position, .. } => {
                    observer.notify_item_selected(item, position);
                }
                SelectionEffect::Moved { .. }
                | SelectionEffect::Discarded { .. }
                | SelectionEffect::Canceled { .. } => observer.notify_selection_cleared(),
                SelectionEffect::Noop { .. } => {}
            }
        }
        Ok(transition)
    }

    /// Drop a pending selection without touching the board.
    pub fn cancel_selection(&mut self) -> Option<SelectionTransition> {
        let transition = self.selection.force_cancel()?;
        if let Some(observer) = self.observer.as_mut() {
            observer.notify_selection_cleared();
        }
        Some(transition)
    }

    #[must_use]
    pub fn item(&self, id: ItemId) -> Option<&ItemRecord> {
        self.records.get(&id)
    }

    /// Full title of the item occupying a cell.
    #[must_use]
    pub fn label_at(&self, position: Position) -> Option<&str> {
        let (_, item) = self.table.item_at(position)?;
        self.records.get(&item).map(|record| record.title.as_str())
    }

    /// Metadata of the selected source item.
    #[must_use]
    pub fn selected_item(&self) -> Option<&ItemRecord> {
        let (item, _, _) = self.selection.pending_source()?;
        self.records.get(&item)
    }

    #[must_use]
    pub fn invariant_report(&self) -> InvariantReport {
        self.table.invariant_report()
    }

    #[must_use]
    pub fn export_state(&self) -> BoardSnapshot {
        BoardSnapshot::capture(self.template.id.clone(), &self.table, &self.records)
            .with_intake(self.remaining, self.intake_started)
    }

    /// Replace the board with a snapshot of the same template. Nothing
    /// changes unless the whole snapshot is valid.
    pub fn import_state(&mut self, snapshot: BoardSnapshot) -> Result<(), SessionError> {
        if snapshot.template_id != self.template.id
            || snapshot.tier_count != self.template.tier_count()
            || snapshot.columns != self.template.columns
        {
            return Err(SessionError::TemplateMismatch {
                expected: self.template.id.clone(),
                expected_tiers: self.template.tier_count(),
                expected_columns: self.template.columns,
                found: snapshot.template_id,
                found_tiers: snapshot.tier_count,
                found_columns: snapshot.columns,
            });
        }

        let table = snapshot.to_table()?;
        let records: BTreeMap<ItemId, ItemRecord> = snapshot
            .item_records()
            .map(|record| (record.id, record))
            .collect();
        let next_id = match records.keys().next_back() {
            Some(last) => last.checked_next()?,
            None => ItemId::default(),
        };

        self.table = table;
        self.records = records;
        self.next_id = next_id;
        self.remaining = snapshot.remaining;
        self.intake_started = snapshot.intake_started || !self.records.is_empty();
        self.selection.force_cancel();
        tracing::info!(
            target: TRACE_TARGET,
            template = %self.template.id,
            items = self.records.len(),
            total_rows = self.table.layout().total_rows(),
            "board state imported"
        );
        self.publish_changes();
        Ok(())
    }

    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<(), SessionError> {
        let path = path.as_ref();
        let snapshot = self.export_state();
        snapshot.write_to_path(path)?;
        tracing::info!(
            target: TRACE_TARGET,
            path = %path.display(),
            items = snapshot.item_count(),
            state_hash = snapshot.state_hash(),
            "board saved"
        );
        Ok(())
    }

    pub fn load_from_path(
        path: impl AsRef<Path>,
        catalog: &TemplateCatalog,
        config: SelectionConfig,
    ) -> Result<Self, SessionError> {
        let path = path.as_ref();
        let snapshot = BoardSnapshot::read_from_path(path)?;
        tracing::info!(
            target: TRACE_TARGET,
            path = %path.display(),
            state_hash = snapshot.state_hash(),
            "board loaded"
        );
        Self::restore(snapshot, catalog, config)
    }

    fn publish_changes(&mut self) {
        let changes = self.table.take_changes();
        let Some(observer) = self.observer.as_mut() else {
            return;
        };
        if changes.layout_changed {
            observer.notify_layout_changed();
        }
        for tier in changes.tiers {
            observer.notify_positions_changed(tier);
        }
    }
}
