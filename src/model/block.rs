//! Positioned text fragments and the structures derived from them.

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in viewport coordinates (origin top-left,
/// y grows downward). Coordinates are rounded to 2 decimal places on
/// construction so identical input always serializes identically.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BBox {
    /// Create a bounding box, rounding all coordinates to 2 decimals.
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x1: round2(x1),
            y1: round2(y1),
            x2: round2(x2),
            y2: round2(y2),
        }
    }

    /// Box width.
    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    /// Box height.
    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    /// Horizontal center, the clustering key for column detection.
    pub fn center_x(&self) -> f32 {
        (self.x1 + self.x2) / 2.0
    }
}

fn round2(v: f32) -> f32 {
    (v * 100.0).round() / 100.0
}

/// One positioned text fragment on a page, as emitted by the structural
/// extractor. Column/line assignment and the heading flag are filled in by
/// layout reconstruction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBlock {
    /// Block id, unique within a page.
    pub id: u32,
    /// Fragment text.
    pub text: String,
    /// Bounding box in viewport coordinates.
    pub bbox: BBox,
    /// Index of the column this block was assigned to.
    pub column: Option<usize>,
    /// Index of the line this block was assigned to.
    pub line: Option<usize>,
    /// Whether the containing line was classified as a heading.
    pub heading: bool,
}

impl TextBlock {
    /// Create an unassigned block.
    pub fn new(id: u32, text: impl Into<String>, bbox: BBox) -> Self {
        Self {
            id,
            text: text.into(),
            bbox,
            column: None,
            line: None,
            heading: false,
        }
    }
}

/// A horizontal cluster of blocks sharing a Y-band, in left-to-right order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Line {
    /// Line index within the page, top to bottom.
    pub id: usize,
    /// Top of the Y-band.
    pub y_top: f32,
    /// Bottom of the Y-band.
    pub y_bottom: f32,
    /// Ids of member blocks, ordered by X.
    pub block_ids: Vec<u32>,
    /// Member texts concatenated in X order.
    pub text: String,
    /// Whether the line was classified as a heading.
    pub heading: bool,
}

/// A vertical text band inferred from block-center clustering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    /// Column index, leftmost first.
    pub id: usize,
    /// Left bound (padded).
    pub start_x: f32,
    /// Right bound (padded).
    pub end_x: f32,
    /// Mean of member block centers.
    pub center_x: f32,
    /// Number of blocks assigned to this column.
    pub block_count: usize,
}

impl Column {
    /// Whether an X coordinate falls inside this column's band.
    pub fn contains(&self, x: f32) -> bool {
        x >= self.start_x && x <= self.end_x
    }
}

/// One cell of a detected table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableCell {
    pub text: String,
    pub bbox: BBox,
}

/// Consecutive aligned lines collapsed into a table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableRegion {
    /// Table index within the page.
    pub id: usize,
    /// Rows in reading order; each row's cells are sorted by X.
    pub rows: Vec<Vec<TableCell>>,
}

impl TableRegion {
    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}
