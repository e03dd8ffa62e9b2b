//! Device independent pieces of the terrain texture atlas: page geometry,
//! capability negotiation, auxiliary layer policy and the tile table the
//! renderer reads.

pub mod format;
pub mod key;
pub mod layer;
pub mod layout;
pub mod negotiate;
pub mod registry;

pub use format::{PixelFormat, expand_to_rgba8};
pub use key::{Id, PageId};
pub use layer::{DEGENERATE_NORMAL_TEXEL, DegeneratePage, LayerSet, TerrainLayer};
pub use layout::{
    BASE_MIP_LEVELS, BASE_TILE_SIZE, CursorStep, PageGrid, RasterCursor, TILES_IN_PAGE,
    TILES_IN_PAGE_COLUMN, TILES_IN_PAGE_ROW, pad_to_pow2, page_index,
};
pub use negotiate::{NegotiationError, TilesetConfiguration, negotiate};
pub use registry::{MAX_TILES, RegistryError, TileTextureInfo, TileTextureTable};
