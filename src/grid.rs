//! Mapping between a section's pixel box and its logical placement grid.
//!
//! All functions here are pure and depend only on the active [`IconScale`].

use crate::model::{Cell, Point};
use std::collections::HashSet;

/// Height of the section title bar.
pub const SECTION_HEADER_HEIGHT: f32 = 36.0;
/// Padding between the section border and the grid, on every side.
pub const SECTION_PADDING: f32 = 8.0;

/// Named icon-size preset shared by every section.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum IconScale {
    Small,
    #[default]
    Medium,
    Large,
}

/// Pixel sizes derived from an [`IconScale`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleMetrics {
    /// Side of one grid cell.
    pub cell: f32,
    /// Side of the icon slot drawn inside a cell.
    pub icon: f32,
    /// Side of the icon image drawn inside a slot.
    pub img: f32,
}

impl IconScale {
    pub const ALL: [IconScale; 3] = [IconScale::Small, IconScale::Medium, IconScale::Large];

    pub fn metrics(self) -> ScaleMetrics {
        match self {
            IconScale::Small => ScaleMetrics {
                cell: 48.0,
                icon: 42.0,
                img: 32.0,
            },
            IconScale::Medium => ScaleMetrics {
                cell: 62.0,
                icon: 56.0,
                img: 44.0,
            },
            IconScale::Large => ScaleMetrics {
                cell: 78.0,
                icon: 72.0,
                img: 58.0,
            },
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            IconScale::Small => "small",
            IconScale::Medium => "medium",
            IconScale::Large => "large",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "small" => Some(IconScale::Small),
            "medium" => Some(IconScale::Medium),
            "large" => Some(IconScale::Large),
            _ => None,
        }
    }
}

/// Logical grid capacity of a section.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridSize {
    pub cols: u32,
    pub rows: u32,
}

impl GridSize {
    pub fn contains(self, cell: Cell) -> bool {
        cell.row < self.rows && cell.col < self.cols
    }

    pub fn cells(self) -> impl Iterator<Item = Cell> {
        (0..self.rows).flat_map(move |row| (0..self.cols).map(move |col| Cell::new(row, col)))
    }
}

/// Columns and rows that fit in a section box of the given pixel size.
/// Never smaller than one cell in either axis.
pub fn grid_dimensions(scale: IconScale, section_width: f32, section_height: f32) -> GridSize {
    let cell = scale.metrics().cell;
    let inner_w = section_width - 2.0 * SECTION_PADDING;
    let inner_h = section_height - SECTION_HEADER_HEIGHT - 2.0 * SECTION_PADDING;
    GridSize {
        cols: axis_capacity(inner_w, cell),
        rows: axis_capacity(inner_h, cell),
    }
}

fn axis_capacity(inner: f32, cell: f32) -> u32 {
    let n = (inner / cell).floor();
    if n.is_finite() && n >= 1.0 { n as u32 } else { 1 }
}

/// Top-left pixel of the grid for a section whose box starts at `section_origin`.
pub fn grid_origin(section_origin: Point) -> Point {
    Point::new(
        section_origin.x + SECTION_PADDING,
        section_origin.y + SECTION_HEADER_HEIGHT + SECTION_PADDING,
    )
}

/// Cell under `pointer`, measured from `grid_origin`.
///
/// Clamped at zero, but not from above: callers decide whether a cell past
/// the current capacity is acceptable.
pub fn pixel_to_cell(scale: IconScale, pointer: Point, grid_origin: Point) -> Cell {
    let cell = scale.metrics().cell;
    Cell::new(
        axis_index(pointer.y - grid_origin.y, cell),
        axis_index(pointer.x - grid_origin.x, cell),
    )
}

fn axis_index(offset: f32, cell: f32) -> u32 {
    let n = (offset / cell).floor();
    if n.is_finite() && n > 0.0 { n as u32 } else { 0 }
}

/// Top-left pixel of `cell`, relative to the grid origin.
pub fn cell_offset(scale: IconScale, cell: Cell) -> Point {
    let size = scale.metrics().cell;
    Point::new(cell.col as f32 * size, cell.row as f32 * size)
}

/// First cell not in `occupied`, scanning row-major from `(0, 0)` across `cols` columns.
pub fn first_free_cell(occupied: &HashSet<Cell>, cols: u32) -> Cell {
    let cols = cols.max(1);
    let mut index: u32 = 0;
    loop {
        let cell = Cell::new(index / cols, index % cols);
        if !occupied.contains(&cell) {
            return cell;
        }
        index += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_subtract_insets_and_floor() {
        // 300 - 16 = 284 / 62 = 4.58 ; 250 - 36 - 16 = 198 / 62 = 3.19
        let size = grid_dimensions(IconScale::Medium, 300.0, 250.0);
        assert_eq!(size, GridSize { cols: 4, rows: 3 });
    }

    #[test]
    fn dimensions_never_below_one() {
        let size = grid_dimensions(IconScale::Large, 10.0, 10.0);
        assert_eq!(size, GridSize { cols: 1, rows: 1 });
    }

    #[test]
    fn smaller_scale_fits_more_cells() {
        let small = grid_dimensions(IconScale::Small, 400.0, 300.0);
        let large = grid_dimensions(IconScale::Large, 400.0, 300.0);
        assert!(small.cols > large.cols);
        assert!(small.rows > large.rows);
    }

    #[test]
    fn pixel_to_cell_clamps_only_below() {
        let origin = Point::new(100.0, 100.0);
        let cell = scale_cell();
        assert_eq!(
            pixel_to_cell(IconScale::Medium, Point::new(50.0, 20.0), origin),
            Cell::ORIGIN
        );
        assert_eq!(
            pixel_to_cell(
                IconScale::Medium,
                Point::new(100.0 + cell * 2.5, 100.0 + cell * 1.1),
                origin
            ),
            Cell::new(1, 2)
        );
        assert_eq!(
            pixel_to_cell(
                IconScale::Medium,
                Point::new(100.0 + cell * 40.0, 100.0),
                origin
            ),
            Cell::new(0, 40)
        );
    }

    fn scale_cell() -> f32 {
        IconScale::Medium.metrics().cell
    }

    #[test]
    fn first_free_cell_scans_row_major() {
        let mut occupied = HashSet::new();
        assert_eq!(first_free_cell(&occupied, 3), Cell::ORIGIN);
        occupied.insert(Cell::new(0, 0));
        occupied.insert(Cell::new(0, 1));
        occupied.insert(Cell::new(0, 2));
        assert_eq!(first_free_cell(&occupied, 3), Cell::new(1, 0));
        occupied.insert(Cell::new(1, 0));
        occupied.insert(Cell::new(1, 2));
        assert_eq!(first_free_cell(&occupied, 3), Cell::new(1, 1));
    }

    #[test]
    fn scale_names_round_trip() {
        for scale in IconScale::ALL {
            assert_eq!(IconScale::from_name(scale.name()), Some(scale));
        }
        assert_eq!(IconScale::from_name("huge"), None);
    }

    #[test]
    fn grid_cells_cover_capacity() {
        let size = GridSize { cols: 3, rows: 2 };
        let cells: Vec<Cell> = size.cells().collect();
        assert_eq!(cells.len(), 6);
        assert_eq!(cells[3], Cell::new(1, 0));
        assert!(size.contains(Cell::new(1, 2)));
        assert!(!size.contains(Cell::new(2, 0)));
    }
}
