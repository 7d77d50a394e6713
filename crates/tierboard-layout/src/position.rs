//! Grid coordinates and pixel-to-cell resolution.
//!
//! Positions use matrix convention: `(0, 0)` is the top-left cell, rows grow
//! downward and columns grow to the right. Any pair of integers is a valid
//! [`Position`]; whether it lies inside the active board is a question for
//! the layout, never for the position itself.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of leading columns reserved for the tier label and score swatch.
pub const RESERVED_LABEL_COLUMNS: u16 = 2;

/// First column that may hold an item.
pub const FIRST_ITEM_COLUMN: u16 = RESERVED_LABEL_COLUMNS;

/// A `(row, column)` cell on the board grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: u32,
    pub column: u16,
}

impl Position {
    #[must_use]
    pub const fn new(row: u32, column: u16) -> Self {
        Self { row, column }
    }

    /// Resolve a pixel coordinate to the cell under it.
    ///
    /// Both coordinates are floor-divided by `cell_size`. Nothing is
    /// bounds-checked here. A `cell_size` of zero is treated as one pixel per
    /// cell so this function stays total; configured controllers reject zero
    /// before it can reach here.
    #[must_use]
    pub fn resolve(pixel_x: u32, pixel_y: u32, cell_size: u32) -> Self {
        let cell = cell_size.max(1);
        let column = pixel_x / cell;
        Self {
            row: pixel_y / cell,
            column: u16::try_from(column).unwrap_or(u16::MAX),
        }
    }

    /// True when the column lies past the reserved label columns.
    #[must_use]
    pub const fn is_item_column(self) -> bool {
        self.column >= FIRST_ITEM_COLUMN
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}
