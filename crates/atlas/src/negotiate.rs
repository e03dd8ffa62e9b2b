use std::fmt;

use log::{debug, error};

use crate::layout::{PageGrid, TILES_IN_PAGE_COLUMN};

/// Tile size and mip chain length picked for one tileset load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilesetConfiguration {
    pub tile_size: u32,
    pub mip_levels: u32,
}

impl TilesetConfiguration {
    pub const fn grid(self) -> PageGrid {
        PageGrid::new(self.tile_size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationError {
    MipChainExhausted { max_texture_size: u32 },
}

impl fmt::Display for NegotiationError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NegotiationError::MipChainExhausted { max_texture_size } => write!(
                formatter,
                "supported texture size {max_texture_size} is too low to load any mipmap levels"
            ),
        }
    }
}

impl std::error::Error for NegotiationError {}

/// Picks the working tile size and mip count.
///
/// The device bound is strict: a page row of tiles must fit in
/// `min(device_max_texture_size, user_max_texture_size)`, and running out of
/// mip levels while shrinking is an error. The user bound is a preference and
/// only ever downgrades while at least one mip level remains.
pub fn negotiate(
    device_max_texture_size: u32,
    user_max_texture_size: u32,
    base_tile_size: u32,
    base_mip_levels: u32,
) -> Result<TilesetConfiguration, NegotiationError> {
    let max_texture_size = device_max_texture_size.min(user_max_texture_size);
    let mut tile_size = base_tile_size;
    let mut mip_levels = base_mip_levels;
    if mip_levels == 0 {
        return Err(NegotiationError::MipChainExhausted { max_texture_size });
    }

    while max_texture_size < tile_size.saturating_mul(TILES_IN_PAGE_COLUMN) {
        tile_size /= 2;
        mip_levels -= 1;
        error!(
            target: "texture",
            "max supported texture size {max_texture_size}x{max_texture_size} is too low, reducing texture detail to {tile_size}x{tile_size}"
        );
        if mip_levels == 0 || tile_size == 0 {
            return Err(NegotiationError::MipChainExhausted { max_texture_size });
        }
    }

    while user_max_texture_size < tile_size && mip_levels > 1 {
        tile_size /= 2;
        mip_levels -= 1;
        debug!(
            target: "texture",
            "downgrading texture quality to {tile_size} due to user setting {user_max_texture_size}"
        );
    }

    Ok(TilesetConfiguration {
        tile_size,
        mip_levels,
    })
}
