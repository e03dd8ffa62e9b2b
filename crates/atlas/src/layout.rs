//! Page grid geometry for the terrain atlas.
//!
//! A page holds a fixed grid of `TILES_IN_PAGE_COLUMN` x `TILES_IN_PAGE_ROW`
//! square tiles. The texture backing a page is padded up to a power of two on
//! each axis, so the usable region (the grid) may be smaller than the page.
//! Tiles are placed in raster order by [`RasterCursor`].

/// Tile dimension before any device or user driven downgrade.
pub const BASE_TILE_SIZE: u32 = 512;
/// Mip levels generated for a page at [`BASE_TILE_SIZE`].
pub const BASE_MIP_LEVELS: u32 = 6;
pub const TILES_IN_PAGE_COLUMN: u32 = 4;
pub const TILES_IN_PAGE_ROW: u32 = 4;
pub const TILES_IN_PAGE: u32 = TILES_IN_PAGE_COLUMN * TILES_IN_PAGE_ROW;

static_assertions::const_assert!(BASE_TILE_SIZE.is_power_of_two());
// Every mip level of a tile must still be at least one texel wide.
static_assertions::const_assert!(BASE_TILE_SIZE >> (BASE_MIP_LEVELS - 1) >= 1);
static_assertions::const_assert!(TILES_IN_PAGE > 1);

/// Slot index of the page holding `tile_ordinal`.
///
/// The `+ 1` is intentional: page selection happens right after the last tile
/// of a page has been placed, keyed by that tile's ordinal, so the result rolls
/// over exactly when `tile_ordinal + 1` reaches a multiple of `tiles_per_page`.
pub const fn page_index(first_page: u32, tile_ordinal: u32, tiles_per_page: u32) -> u32 {
    first_page + (tile_ordinal + 1) / tiles_per_page
}

/// Smallest power of two that is `>= limit`, never below 2.
pub const fn pad_to_pow2(limit: u32) -> u32 {
    let mut size = 2;
    while limit > size {
        size *= 2;
    }
    size
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageGrid {
    pub tile_size: u32,
    pub columns: u32,
    pub rows: u32,
}

impl PageGrid {
    pub const fn new(tile_size: u32) -> Self {
        Self::with_dimensions(tile_size, TILES_IN_PAGE_COLUMN, TILES_IN_PAGE_ROW)
    }

    pub const fn with_dimensions(tile_size: u32, columns: u32, rows: u32) -> Self {
        assert!(columns > 0 && rows > 0, "page grid must hold at least one tile");
        Self {
            tile_size,
            columns,
            rows,
        }
    }

    pub const fn usable_width(self) -> u32 {
        self.columns * self.tile_size
    }

    pub const fn usable_height(self) -> u32 {
        self.rows * self.tile_size
    }

    pub const fn tiles_per_page(self) -> u32 {
        self.columns * self.rows
    }

    pub const fn page_width(self) -> u32 {
        pad_to_pow2(self.usable_width())
    }

    pub const fn page_height(self) -> u32 {
        pad_to_pow2(self.usable_height())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorStep {
    SamePage,
    PageFull,
}

/// Placement cursor inside the current page, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RasterCursor {
    pub x: u32,
    pub y: u32,
}

impl RasterCursor {
    pub const fn origin() -> Self {
        Self { x: 0, y: 0 }
    }

    pub const fn is_origin(self) -> bool {
        self.x == 0 && self.y == 0
    }

    /// Moves past the tile just placed. Returns [`CursorStep::PageFull`] and
    /// rewinds to the origin when the next tile no longer fits in the page.
    pub fn advance(&mut self, grid: PageGrid) -> CursorStep {
        let tile_size = grid.tile_size;
        self.x += tile_size;
        if self.x + tile_size > grid.usable_width() {
            self.y += tile_size;
            self.x = 0;
        }
        if self.y + tile_size > grid.usable_height() {
            *self = Self::origin();
            return CursorStep::PageFull;
        }
        CursorStep::SamePage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_index_rolls_over_at_capacity_boundary() {
        let per_page = TILES_IN_PAGE;
        assert_eq!(page_index(5, 0, per_page), 5);
        assert_eq!(page_index(5, per_page - 2, per_page), 5);
        // Called after placing the last tile of page 0.
        assert_eq!(page_index(5, per_page - 1, per_page), 6);
        assert_eq!(page_index(5, 2 * per_page - 2, per_page), 6);
        assert_eq!(page_index(5, 2 * per_page - 1, per_page), 7);
    }

    #[test]
    fn pad_to_pow2_never_returns_one() {
        assert_eq!(pad_to_pow2(0), 2);
        assert_eq!(pad_to_pow2(1), 2);
        assert_eq!(pad_to_pow2(3), 4);
        assert_eq!(pad_to_pow2(2048), 2048);
        assert_eq!(pad_to_pow2(2049), 4096);
    }

    #[test]
    fn default_grid_fills_power_of_two_page() {
        let grid = PageGrid::new(BASE_TILE_SIZE);
        assert_eq!(grid.tiles_per_page(), 16);
        assert_eq!(grid.usable_width(), 2048);
        assert_eq!(grid.page_width(), 2048);
        assert_eq!(grid.page_height(), 2048);
    }

    #[test]
    fn odd_grid_pads_page_beyond_usable_region() {
        let grid = PageGrid::with_dimensions(16, 3, 2);
        assert_eq!(grid.usable_width(), 48);
        assert_eq!(grid.page_width(), 64);
        assert_eq!(grid.usable_height(), 32);
        assert_eq!(grid.page_height(), 32);
    }

    #[test]
    fn cursor_walks_rows_then_reports_full_page() {
        let grid = PageGrid::with_dimensions(8, 2, 2);
        let mut cursor = RasterCursor::origin();

        assert_eq!(cursor.advance(grid), CursorStep::SamePage);
        assert_eq!(cursor, RasterCursor { x: 8, y: 0 });
        assert_eq!(cursor.advance(grid), CursorStep::SamePage);
        assert_eq!(cursor, RasterCursor { x: 0, y: 8 });
        assert_eq!(cursor.advance(grid), CursorStep::SamePage);
        assert_eq!(cursor, RasterCursor { x: 8, y: 8 });
        assert_eq!(cursor.advance(grid), CursorStep::PageFull);
        assert!(cursor.is_origin());
    }

    #[test]
    fn cursor_fills_exactly_tiles_per_page() {
        let grid = PageGrid::new(64);
        let mut cursor = RasterCursor::origin();
        let mut placed = 0;
        loop {
            placed += 1;
            if cursor.advance(grid) == CursorStep::PageFull {
                break;
            }
        }
        assert_eq!(placed, grid.tiles_per_page());
    }
}
