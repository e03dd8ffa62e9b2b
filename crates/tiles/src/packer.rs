use std::path::Path;

use atlas::{
    CursorStep, DegeneratePage, LayerSet, PageId, RasterCursor, TerrainLayer, TileTextureInfo,
    TileTextureTable, TilesetConfiguration,
};
use log::debug;

use crate::asset::{AssetSource, RasterImage, TilesetPaths};
use crate::device::{DeviceContext, UploadRegion};
use crate::page_allocator::{PAGE_FORMAT, PageAllocator};
use crate::{FatalConfigurationError, LOG_TARGET, TilesetLoadError};

/// Mip pass that registers tile coordinates. Only this pass runs.
const PRIMARY_LEVEL: u32 = 0;

/// Device pages written by one load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedPages {
    pub terrain: Vec<PageId>,
    pub current: PageId,
    pub layers: LayerSet<PageId>,
    /// Auxiliary layers that kept their full size page.
    pub layers_found: LayerSet<bool>,
    pub slots: std::ops::Range<u32>,
}

#[derive(Debug)]
pub struct PackOutcome {
    pub table: TileTextureTable,
    pub pages: LoadedPages,
    pub tiles_loaded: u32,
}

fn load_tile(
    source: &impl AssetSource,
    path: &Path,
    tile_size: u32,
) -> Result<Option<RasterImage>, TilesetLoadError> {
    let decode_error = |error| TilesetLoadError::AssetDecode {
        path: path.to_path_buf(),
        error,
    };
    let Some(image) = source.load_image(path).map_err(decode_error)? else {
        return Ok(None);
    };
    image.fit_to_tile(tile_size).map(Some).map_err(decode_error)
}

/// Packs every tile of the tileset into terrain pages plus one page per
/// auxiliary layer, and records where each diffuse tile landed.
pub fn pack<D: DeviceContext>(
    device: &mut D,
    source: &impl AssetSource,
    paths: &TilesetPaths,
    configuration: TilesetConfiguration,
    allocator: &mut PageAllocator,
) -> Result<PackOutcome, TilesetLoadError> {
    let grid = configuration.grid();
    let tile_size = configuration.tile_size;
    let (page_width, page_height) = (grid.page_width(), grid.page_height());
    let base_name = paths.slot_name();
    let level = PRIMARY_LEVEL;

    let layers = LayerSet::try_from_fn(|layer| {
        allocator
            .reserve_page(device, &paths.layer_slot_name(layer), page_width, page_height)
            .map(|page| page.id)
    })?;
    let mut page = allocator.ensure_page(device, &base_name, level, page_width, page_height, 0)?;

    let mut table = TileTextureTable::new();
    let mut cursor = RasterCursor::origin();
    let mut layers_found = LayerSet::splat(false);
    let mut ordinal: u32 = 0;

    while (ordinal as usize) < table.capacity() {
        let diffuse_path = paths.diffuse(ordinal);
        let Some(diffuse) = load_tile(source, &diffuse_path, tile_size)? else {
            if ordinal == 0 {
                return Err(FatalConfigurationError::MissingFirstTile { path: diffuse_path }.into());
            }
            break;
        };

        let region = UploadRegion::tile(cursor.x, cursor.y, tile_size);
        device.upload_and_generate_mips(page, region, PAGE_FORMAT, diffuse.pixels())?;
        drop(diffuse);
        if level == PRIMARY_LEVEL {
            let info =
                TileTextureInfo::from_pixel_offset(page, cursor.x, cursor.y, page_width, page_height);
            table.insert(ordinal, info)?;
            debug!(
                target: LOG_TARGET,
                "registering tile {ordinal}: u={} v={} offset=({}, {}) page={page} ({})",
                info.u_offset,
                info.v_offset,
                cursor.x,
                cursor.y,
                diffuse_path.display()
            );
        }

        for layer in TerrainLayer::AUXILIARY {
            let layer_path = paths.auxiliary(layer, ordinal);
            let pixels = match load_tile(source, &layer_path, tile_size)? {
                Some(image) => {
                    debug!(
                        target: LOG_TARGET,
                        "found {} map {}",
                        layer.label(),
                        layer_path.display()
                    );
                    *layers_found.get_mut(layer) = true;
                    image.into_pixels()
                }
                None => layer.fallback_buffer(tile_size),
            };
            device.upload_and_generate_mips(*layers.get(layer), region, PAGE_FORMAT, &pixels)?;
        }

        if cursor.advance(grid) == CursorStep::PageFull {
            let previous = page;
            page = allocator.ensure_page(
                device,
                &base_name,
                level,
                page_width,
                page_height,
                ordinal,
            )?;
            debug!(
                target: LOG_TARGET,
                "extra page added at tile {ordinal} for {}, was page {previous}, now page {page}",
                paths.tile_dir().display()
            );
        }
        ordinal += 1;
    }
    debug!(
        target: LOG_TARGET,
        "found {ordinal} textures for {} at {tile_size}px, last page {page}",
        paths.tile_dir().display()
    );

    for (layer, found) in layers_found.iter() {
        if *found {
            continue;
        }
        debug!(target: LOG_TARGET, "{} maps not found", layer.label());
        let layer_page = *layers.get(layer);
        match layer.degenerate_page() {
            DegeneratePage::ConstantTexel(texel) => {
                allocator.replace_with_constant(device, layer_page, texel)?
            }
            DegeneratePage::Unbound => allocator.unbind(device, layer_page)?,
        }
    }

    let current = allocator.current_page().unwrap_or(page);
    Ok(PackOutcome {
        table,
        pages: LoadedPages {
            terrain: allocator.terrain_pages().iter().map(|page| page.id).collect(),
            current,
            layers,
            layers_found,
            slots: allocator.claimed_slots(),
        },
        tiles_loaded: ordinal,
    })
}
