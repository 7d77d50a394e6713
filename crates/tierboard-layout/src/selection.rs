//! Two-phase source/target selection over a [`PlacementTable`].
//!
//! ```text
//! Idle --primary on item--> SourceChosen
//! SourceChosen --primary on another tier's row--> Idle   (move)
//! SourceChosen --primary on discard column-----> Idle   (remove)
//! SourceChosen --secondary on the source cell--> Idle   (cancel)
//! ```
//!
//! Every click produces a [`SelectionTransition`]; clicks that change
//! nothing carry an explicit [`SelectionNoopReason`].

use serde::{Deserialize, Serialize};

use crate::item::ItemId;
use crate::placement::{PlacementError, PlacementTable};
use crate::position::Position;

const TRACE_TARGET: &str = "tierboard.selection";

/// Default edge length of one grid cell in pixels.
pub const DEFAULT_CELL_SIZE: u32 = 63;

/// Pointer button of a board click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerButton {
    Primary,
    Secondary,
}

/// One raw click in board pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardClick {
    pub x: u32,
    pub y: u32,
    pub button: PointerButton,
}

impl BoardClick {
    #[must_use]
    pub const fn primary(x: u32, y: u32) -> Self {
        Self {
            x,
            y,
            button: PointerButton::Primary,
        }
    }

    #[must_use]
    pub const fn secondary(x: u32, y: u32) -> Self {
        Self {
            x,
            y,
            button: PointerButton::Secondary,
        }
    }

    /// Click at the centre of a cell.
    #[must_use]
    pub const fn at_cell(position: Position, cell_size: u32, button: PointerButton) -> Self {
        Self {
            x: (position.column as u32)
                .saturating_mul(cell_size)
                .saturating_add(cell_size / 2),
            y: position.row.saturating_mul(cell_size).saturating_add(cell_size / 2),
            button,
        }
    }
}

/// Selection controller tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Edge length of one grid cell in pixels.
    pub cell_size: u32,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
        }
    }
}

/// Invalid selection configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SelectionConfigError {
    #[error("cell size must be > 0 (got {cell_size})")]
    InvalidCellSize { cell_size: u32 },
}

impl SelectionConfig {
    pub fn validate(self) -> Result<Self, SelectionConfigError> {
        if self.cell_size == 0 {
            return Err(SelectionConfigError::InvalidCellSize {
                cell_size: self.cell_size,
            });
        }
        Ok(self)
    }
}

/// Selection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SelectionState {
    Idle,
    SourceChosen {
        item: ItemId,
        position: Position,
        tier: usize,
    },
}

/// Explicit diagnostics for clicks that are safely ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionNoopReason {
    /// The cell lies outside the board grid.
    OutsideBoard,
    /// Label columns never hold items.
    LabelColumn,
    /// Nothing occupies the clicked cell.
    EmptyCell,
    /// The control row only reacts to the staging slot and the discard column.
    ControlRow,
    /// Reordering within a tier is unsupported.
    SameTier,
    /// Secondary clicks only cancel on the selected cell.
    NotSourcePosition,
    /// Secondary clicks do nothing without a selection.
    IdleSecondaryClick,
}

/// Effect of one click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum SelectionEffect {
    Selected {
        item: ItemId,
        position: Position,
        tier: usize,
    },
    Moved {
        item: ItemId,
        from_tier: usize,
        to_tier: usize,
        position: Position,
    },
    Discarded {
        item: ItemId,
        tier: usize,
    },
    Canceled {
        item: ItemId,
    },
    Noop {
        reason: SelectionNoopReason,
    },
}

impl SelectionEffect {
    /// Whether the click changed the placement table.
    #[must_use]
    pub const fn mutates_board(&self) -> bool {
        matches!(self, Self::Moved { .. } | Self::Discarded { .. })
    }
}

/// One state-machine transition with deterministic telemetry fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionTransition {
    pub transition_id: u64,
    pub cell: Position,
    pub from: SelectionState,
    pub to: SelectionState,
    pub effect: SelectionEffect,
}

/// Runtime selection machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionController {
    state: SelectionState,
    config: SelectionConfig,
    transition_counter: u64,
}

impl Default for SelectionController {
    fn default() -> Self {
        Self {
            state: SelectionState::Idle,
            config: SelectionConfig::default(),
            transition_counter: 0,
        }
    }
}

impl SelectionController {
    pub fn new(config: SelectionConfig) -> Result<Self, SelectionConfigError> {
        Ok(Self {
            state: SelectionState::Idle,
            config: config.validate()?,
            transition_counter: 0,
        })
    }

    #[must_use]
    pub const fn state(&self) -> SelectionState {
        self.state
    }

    #[must_use]
    pub const fn config(&self) -> SelectionConfig {
        self.config
    }

    #[must_use]
    pub const fn cell_size(&self) -> u32 {
        self.config.cell_size
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        !matches!(self.state, SelectionState::Idle)
    }

    /// The pending source item, if one is selected.
    #[must_use]
    pub const fn pending_source(&self) -> Option<(ItemId, Position, usize)> {
        match self.state {
            SelectionState::Idle => None,
            SelectionState::SourceChosen {
                item,
                position,
                tier,
            } => Some((item, position, tier)),
        }
    }

    /// Resolve a click to its grid cell.
    #[must_use]
    pub fn resolve(&self, click: BoardClick) -> Position {
        Position::resolve(click.x, click.y, self.config.cell_size)
    }

    /// Drop any pending selection without touching the board.
    ///
    /// Returns `None` if the machine was already idle.
    pub fn force_cancel(&mut self) -> Option<SelectionTransition> {
        let SelectionState::SourceChosen { item, position, .. } = self.state else {
            return None;
        };
        let from = self.state;
        self.state = SelectionState::Idle;
        Some(self.record(position, from, SelectionEffect::Canceled { item }))
    }

    /// Apply one click to the machine, mutating `table` for moves and
    /// discards. On error the selection is left unchanged.
    pub fn apply_click(
        &mut self,
        table: &mut PlacementTable,
        click: BoardClick,
    ) -> Result<SelectionTransition, PlacementError> {
        let cell = self.resolve(click);
        let from = self.state;
        let layout = table.layout();
        let on_board = cell.row < layout.total_rows() && cell.column < layout.columns();
        let on_control_row = cell.row == layout.control_row();
        let on_discard = on_control_row && cell.column == layout.discard_column();
        let target_tier = layout.tier_for_row(cell.row);

        let effect = match (self.state, click.button) {
            (SelectionState::Idle, PointerButton::Secondary) => SelectionEffect::Noop {
                reason: SelectionNoopReason::IdleSecondaryClick,
            },
            (SelectionState::Idle, PointerButton::Primary) => {
                if !on_board {
                    noop(SelectionNoopReason::OutsideBoard)
                } else if !cell.is_item_column() {
                    noop(SelectionNoopReason::LabelColumn)
                } else if let Some((tier, item)) = table.item_at(cell) {
                    self.state = SelectionState::SourceChosen {
                        item,
                        position: cell,
                        tier,
                    };
                    SelectionEffect::Selected {
                        item,
                        position: cell,
                        tier,
                    }
                } else if on_control_row {
                    noop(SelectionNoopReason::ControlRow)
                } else {
                    noop(SelectionNoopReason::EmptyCell)
                }
            }
            (SelectionState::SourceChosen { item, position, .. }, PointerButton::Secondary) => {
                if cell == position {
                    self.state = SelectionState::Idle;
                    SelectionEffect::Canceled { item }
                } else {
                    noop(SelectionNoopReason::NotSourcePosition)
                }
            }
            (SelectionState::SourceChosen { item, tier, .. }, PointerButton::Primary) => {
                if !on_board {
                    noop(SelectionNoopReason::OutsideBoard)
                } else if on_control_row {
                    if on_discard {
                        table.remove(item, tier)?;
                        self.state = SelectionState::Idle;
                        SelectionEffect::Discarded { item, tier }
                    } else {
                        noop(SelectionNoopReason::ControlRow)
                    }
                } else {
                    match target_tier {
                        Some(target) if target != tier => {
                            let position = table.move_item(item, tier, target)?;
                            self.state = SelectionState::Idle;
                            SelectionEffect::Moved {
                                item,
                                from_tier: tier,
                                to_tier: target,
                                position,
                            }
                        }
                        Some(_) => noop(SelectionNoopReason::SameTier),
                        None => noop(SelectionNoopReason::OutsideBoard),
                    }
                }
            }
        };

        Ok(self.record(cell, from, effect))
    }

    fn record(
        &mut self,
        cell: Position,
        from: SelectionState,
        effect: SelectionEffect,
    ) -> SelectionTransition {
        self.transition_counter = self.transition_counter.saturating_add(1);
        let transition = SelectionTransition {
            transition_id: self.transition_counter,
            cell,
            from,
            to: self.state,
            effect,
        };
        tracing::debug!(
            target: TRACE_TARGET,
            transition_id = transition.transition_id,
            %cell,
            effect = ?transition.effect,
            "selection transition"
        );
        transition
    }
}

const fn noop(reason: SelectionNoopReason) -> SelectionEffect {
    SelectionEffect::Noop { reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CELL: u32 = DEFAULT_CELL_SIZE;

    fn id(raw: u64) -> ItemId {
        ItemId::new(raw).expect("test ID must be non-zero")
    }

    fn click(row: u32, column: u16, button: PointerButton) -> BoardClick {
        BoardClick::at_cell(Position::new(row, column), CELL, button)
    }

    fn primary(row: u32, column: u16) -> BoardClick {
        click(row, column, PointerButton::Primary)
    }

    fn secondary(row: u32, column: u16) -> BoardClick {
        click(row, column, PointerButton::Secondary)
    }

    /// Five tiers (four ranking + staging), one item staged.
    fn staged_board() -> (SelectionController, PlacementTable) {
        let mut table = PlacementTable::new(5, 20).expect("valid dimensions");
        table.add_to_staging(id(1)).expect("staging is free");
        (SelectionController::default(), table)
    }

    #[test]
    fn at_cell_targets_the_cell_centre() {
        let click = BoardClick::at_cell(Position::new(3, 5), CELL, PointerButton::Primary);
        assert_eq!((click.x, click.y), (5 * CELL + CELL / 2, 3 * CELL + CELL / 2));
        assert_eq!(Position::resolve(click.x, click.y, CELL), Position::new(3, 5));
    }

    #[test]
    fn at_cell_saturates_far_coordinates() {
        let click = BoardClick::at_cell(
            Position::new(u32::MAX, u16::MAX),
            u32::MAX,
            PointerButton::Secondary,
        );
        assert_eq!((click.x, click.y), (u32::MAX, u32::MAX));
        let edge =
            BoardClick::at_cell(Position::new(u32::MAX / CELL, 0), CELL, PointerButton::Primary);
        assert_eq!(edge.y, u32::MAX);
    }

    #[test]
    fn zero_cell_size_is_rejected() {
        assert_eq!(
            SelectionController::new(SelectionConfig { cell_size: 0 }),
            Err(SelectionConfigError::InvalidCellSize { cell_size: 0 })
        );
    }

    #[test]
    fn selecting_staged_item_then_placing_it() {
        let (mut machine, mut table) = staged_board();

        let selected = machine.apply_click(&mut table, primary(4, 2)).expect("click");
        assert_eq!(
            selected.effect,
            SelectionEffect::Selected {
                item: id(1),
                position: Position::new(4, 2),
                tier: 4,
            }
        );
        assert!(machine.is_active());

        let placed = machine.apply_click(&mut table, primary(2, 9)).expect("click");
        assert_eq!(
            placed.effect,
            SelectionEffect::Moved {
                item: id(1),
                from_tier: 4,
                to_tier: 2,
                position: Position::new(2, 2),
            }
        );
        assert_eq!(placed.to, SelectionState::Idle);
        assert_eq!(table.item_count(4), Some(0));
        assert_eq!(table.item_count(2), Some(1));
    }

    #[test]
    fn right_click_on_source_cancels_without_mutation() {
        let (mut machine, mut table) = staged_board();
        machine.apply_click(&mut table, primary(4, 2)).expect("click");
        let before = table.clone();

        let off_target = machine.apply_click(&mut table, secondary(4, 3)).expect("click");
        assert_eq!(
            off_target.effect,
            noop(SelectionNoopReason::NotSourcePosition)
        );
        assert!(machine.is_active());

        let canceled = machine.apply_click(&mut table, secondary(4, 2)).expect("click");
        assert_eq!(canceled.effect, SelectionEffect::Canceled { item: id(1) });
        assert_eq!(machine.state(), SelectionState::Idle);
        assert_eq!(table, before);
    }

    #[test]
    fn discard_column_removes_selected_item() {
        let (mut machine, mut table) = staged_board();
        machine.apply_click(&mut table, primary(4, 2)).expect("click");
        machine.apply_click(&mut table, primary(0, 5)).expect("click");
        assert_eq!(table.item_count(0), Some(1));

        machine.apply_click(&mut table, primary(0, 2)).expect("click");
        let discarded = machine.apply_click(&mut table, primary(4, 19)).expect("click");
        assert_eq!(
            discarded.effect,
            SelectionEffect::Discarded { item: id(1), tier: 0 }
        );
        assert!(table.is_empty());
    }

    #[test]
    fn same_tier_click_is_a_noop() {
        let (mut machine, mut table) = staged_board();
        machine.apply_click(&mut table, primary(4, 2)).expect("click");
        machine.apply_click(&mut table, primary(1, 2)).expect("click");
        machine.apply_click(&mut table, primary(1, 2)).expect("click");

        let same = machine.apply_click(&mut table, primary(1, 7)).expect("click");
        assert_eq!(same.effect, noop(SelectionNoopReason::SameTier));
        assert!(machine.is_active());
    }

    #[test]
    fn idle_clicks_on_empty_or_reserved_cells_are_noops() {
        let mut table = PlacementTable::new(4, 20).expect("valid dimensions");
        let mut machine = SelectionController::default();
        let cases = [
            (primary(0, 5), SelectionNoopReason::EmptyCell),
            (primary(0, 1), SelectionNoopReason::LabelColumn),
            (primary(3, 2), SelectionNoopReason::ControlRow),
            (primary(3, 19), SelectionNoopReason::ControlRow),
            (primary(9, 2), SelectionNoopReason::OutsideBoard),
            (primary(0, 25), SelectionNoopReason::OutsideBoard),
            (secondary(0, 5), SelectionNoopReason::IdleSecondaryClick),
        ];
        for (input, reason) in cases {
            let transition = machine.apply_click(&mut table, input).expect("click");
            assert_eq!(transition.effect, noop(reason), "{input:?}");
            assert_eq!(machine.state(), SelectionState::Idle);
        }
        assert!(table.is_empty());
    }

    #[test]
    fn control_row_off_discard_keeps_selection() {
        let (mut machine, mut table) = staged_board();
        machine.apply_click(&mut table, primary(4, 2)).expect("click");
        let transition = machine.apply_click(&mut table, primary(4, 10)).expect("click");
        assert_eq!(transition.effect, noop(SelectionNoopReason::ControlRow));
        assert!(machine.is_active());
    }

    #[test]
    fn force_cancel_reports_pending_item() {
        let (mut machine, mut table) = staged_board();
        assert_eq!(machine.force_cancel(), None);
        machine.apply_click(&mut table, primary(4, 2)).expect("click");
        let transition = machine.force_cancel().expect("was active");
        assert_eq!(transition.effect, SelectionEffect::Canceled { item: id(1) });
        assert!(!machine.is_active());
    }

    #[test]
    fn transition_ids_are_monotonic() {
        let (mut machine, mut table) = staged_board();
        let a = machine.apply_click(&mut table, primary(0, 5)).expect("click");
        let b = machine.apply_click(&mut table, primary(0, 6)).expect("click");
        assert_eq!(a.transition_id + 1, b.transition_id);
    }

    #[test]
    fn pixel_clicks_resolve_with_configured_cell_size() {
        let machine = SelectionController::new(SelectionConfig { cell_size: 10 }).expect("valid");
        assert_eq!(
            machine.resolve(BoardClick::primary(25, 39)),
            Position::new(3, 2)
        );
    }
}
