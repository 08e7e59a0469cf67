//! Layout builder: catalog items onto the angular grid.
//!
//! The grid has `S` columns. Column `i` sits at `-(S - 1) + 2i`, so the columns
//! are evenly spaced and symmetric about zero. Rows alternate between two
//! five-row patterns by column index, which staggers neighbouring columns
//! like brickwork.

use std::sync::Arc;

use catalog::{Catalog, MediaItem};
use serde::Serialize;

pub const ROWS_PER_COLUMN: usize = 5;
pub const ROWS_EVEN: [i32; ROWS_PER_COLUMN] = [-4, -2, 0, 2, 4];
pub const ROWS_ODD: [i32; ROWS_PER_COLUMN] = [-3, -1, 1, 3, 5];

/// Every slot covers 2×2 grid cells.
pub const SLOT_SPAN: u8 = 2;

/// Position of a slot in flattened layout order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SlotId(pub u32);

impl SlotId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct GridCoordinate {
    pub column: i32,
    pub row: i32,
    pub span_columns: u8,
    pub span_rows: u8,
}

impl GridCoordinate {
    pub fn new(column: i32, row: i32) -> Self {
        Self {
            column,
            row,
            span_columns: SLOT_SPAN,
            span_rows: SLOT_SPAN,
        }
    }

    /// Column multiplier for the yaw step, centred on the footprint.
    pub fn yaw_units(&self) -> f64 {
        self.column as f64 + (self.span_columns as f64 - 1.0) / 2.0
    }

    /// Row multiplier for the pitch step, centred on the footprint.
    pub fn pitch_units(&self) -> f64 {
        self.row as f64 - (self.span_rows as f64 - 1.0) / 2.0
    }
}

/// Degrees per grid unit: `360 / S / 2`, or `0` when there are no columns.
pub fn angular_step_deg(segment_count: usize) -> f64 {
    if segment_count == 0 {
        return 0.0;
    }
    360.0 / segment_count as f64 / 2.0
}

pub fn column_values(segment_count: usize) -> impl Iterator<Item = i32> {
    let first = 1 - segment_count as i64;
    (0..segment_count as i64).map(move |i| (first + 2 * i) as i32)
}

pub fn rows_for_column(column_index: usize) -> &'static [i32; ROWS_PER_COLUMN] {
    if column_index % 2 == 0 {
        &ROWS_EVEN
    } else {
        &ROWS_ODD
    }
}

/// All coordinates in flattened order: column by column, rows top to bottom.
pub fn grid_coordinates(segment_count: usize) -> Vec<GridCoordinate> {
    let mut out = Vec::with_capacity(segment_count * ROWS_PER_COLUMN);
    for (i, column) in column_values(segment_count).enumerate() {
        for &row in rows_for_column(i) {
            out.push(GridCoordinate::new(column, row));
        }
    }
    out
}

/// One coordinate joined with its media.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedItem {
    pub slot: SlotId,
    pub coord: GridCoordinate,
    pub media: Arc<MediaItem>,
    /// Index into the catalog, `None` for an empty slot.
    pub catalog_index: Option<usize>,
}

impl PlacedItem {
    pub fn has_media(&self) -> bool {
        self.catalog_index.is_some()
    }
}

/// Assigns `catalog[i mod len]` to the `i`-th coordinate.
///
/// An empty catalog still yields one item per coordinate, each holding the same
/// empty media reference.
pub fn build_layout(catalog: &[MediaItem], segment_count: usize) -> Vec<PlacedItem> {
    let coords = grid_coordinates(segment_count);
    let pool: Vec<Arc<MediaItem>> = catalog.iter().cloned().map(Arc::new).collect();
    let empty = Arc::new(MediaItem::default());

    coords
        .into_iter()
        .enumerate()
        .map(|(i, coord)| {
            let (media, catalog_index) = if pool.is_empty() {
                (Arc::clone(&empty), None)
            } else {
                let k = i % pool.len();
                (Arc::clone(&pool[k]), Some(k))
            };
            PlacedItem {
                slot: SlotId(i as u32),
                coord,
                media,
                catalog_index,
            }
        })
        .collect()
}

/// A built layout together with the inputs it was built from.
#[derive(Debug, Clone)]
pub struct Layout {
    segment_count: usize,
    catalog_hash: String,
    items: Vec<PlacedItem>,
}

impl Layout {
    pub fn build(catalog: &Catalog, segment_count: usize) -> Self {
        Self {
            segment_count,
            catalog_hash: catalog.content_hash(),
            items: build_layout(catalog.items(), segment_count),
        }
    }

    pub fn is_current_for(&self, catalog: &Catalog, segment_count: usize) -> bool {
        self.segment_count == segment_count && self.catalog_hash == catalog.content_hash()
    }

    /// Rebuilds only when the segment count or catalog content changed.
    pub fn rebuild_if_needed(&mut self, catalog: &Catalog, segment_count: usize) -> bool {
        if self.is_current_for(catalog, segment_count) {
            return false;
        }
        *self = Self::build(catalog, segment_count);
        true
    }

    pub fn segment_count(&self) -> usize {
        self.segment_count
    }

    pub fn angular_step_deg(&self) -> f64 {
        angular_step_deg(self.segment_count)
    }

    pub fn items(&self) -> &[PlacedItem] {
        &self.items
    }

    pub fn get(&self, slot: SlotId) -> Option<&PlacedItem> {
        self.items.get(slot.index())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn items(n: usize) -> Vec<MediaItem> {
        (0..n)
            .map(|i| MediaItem::new(format!("img{i}.jpg"), format!("item {i}"), ""))
            .collect()
    }

    #[test]
    fn columns_are_symmetric_and_evenly_spaced() {
        assert_eq!(column_values(1).collect::<Vec<_>>(), vec![0]);
        assert_eq!(column_values(4).collect::<Vec<_>>(), vec![-3, -1, 1, 3]);
        let cols: Vec<i32> = column_values(35).collect();
        assert_eq!(cols.first(), Some(&-34));
        assert_eq!(cols.last(), Some(&34));
        assert!(cols.windows(2).all(|w| w[1] - w[0] == 2));
    }

    #[test]
    fn adjacent_columns_are_staggered() {
        let coords = grid_coordinates(3);
        let rows: Vec<Vec<i32>> = coords
            .chunks(ROWS_PER_COLUMN)
            .map(|c| c.iter().map(|g| g.row).collect())
            .collect();
        assert_eq!(rows[0], ROWS_EVEN.to_vec());
        assert_eq!(rows[1], ROWS_ODD.to_vec());
        assert_eq!(rows[2], ROWS_EVEN.to_vec());
        assert!(coords.iter().all(|g| g.span_columns == 2 && g.span_rows == 2));
    }

    #[test]
    fn degenerate_segment_counts() {
        assert!(build_layout(&items(3), 0).is_empty());
        assert_eq!(angular_step_deg(0), 0.0);
        assert_eq!(build_layout(&items(3), 1).len(), ROWS_PER_COLUMN);
        assert_eq!(angular_step_deg(1), 180.0);
    }

    #[test]
    fn empty_catalog_yields_empty_slots() {
        let placed = build_layout(&[], 4);
        assert_eq!(placed.len(), 20);
        assert!(placed.iter().all(|p| !p.has_media() && p.media.is_empty()));
    }

    #[test]
    fn footprint_offsets() {
        let g = GridCoordinate::new(-3, 1);
        assert_eq!(g.yaw_units(), -2.5);
        assert_eq!(g.pitch_units(), 0.5);
    }

    #[test]
    fn layout_rebuilds_only_on_change() {
        let catalog = Catalog::new(items(4));
        let mut layout = Layout::build(&catalog, 6);
        assert!(!layout.rebuild_if_needed(&catalog, 6));
        assert!(layout.rebuild_if_needed(&catalog, 7));
        assert_eq!(layout.len(), 35);

        let other = Catalog::new(items(5));
        assert!(layout.rebuild_if_needed(&other, 7));
        assert_eq!(layout.get(SlotId(5)).and_then(|p| p.catalog_index), Some(0));
        assert!(layout.get(SlotId(35)).is_none());
    }
}
