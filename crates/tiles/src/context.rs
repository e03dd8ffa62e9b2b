use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use atlas::{
    BASE_MIP_LEVELS, BASE_TILE_SIZE, LayerSet, PageId, TileTextureTable, TilesetConfiguration,
    negotiate,
};
use log::{debug, info};

use crate::asset::{AssetSource, TilesetPaths};
use crate::config::TextureSizeConfig;
use crate::device::DeviceContext;
use crate::packer::{LoadedPages, pack};
use crate::page_allocator::PageAllocator;
use crate::radar::RadarPalette;
use crate::{FatalConfigurationError, LOG_TARGET, TilesetLoadError};

#[derive(Debug, Clone)]
pub struct LoadSummary {
    pub configuration: TilesetConfiguration,
    pub tiles_loaded: u32,
    pub tile_dir: PathBuf,
    pub pages: LoadedPages,
    pub palette: RadarPalette,
}

/// Owns the device and everything one tileset load leaves behind: the
/// stored tileset path, the pages in use and the published tile table.
///
/// Every load or reload first releases the textures on the slots claimed by
/// the previous attempt, successful or not, then reuses those slots when
/// nothing else reserved one since.
///
/// Loads are synchronous and must not overlap. Renderers read the table
/// through [`AtlasLoadContext::tile_table`], which only ever observes a fully
/// built table.
pub struct AtlasLoadContext<D: DeviceContext> {
    device: D,
    config: TextureSizeConfig,
    tileset: Option<PathBuf>,
    loaded: Option<LoadedPages>,
    claimed: Range<u32>,
    active: ArcSwap<TileTextureTable>,
}

impl<D: DeviceContext> AtlasLoadContext<D> {
    pub fn new(device: D, config: TextureSizeConfig) -> Self {
        Self {
            device,
            config,
            tileset: None,
            loaded: None,
            claimed: 0..0,
            active: ArcSwap::from_pointee(TileTextureTable::new()),
        }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn config(&self) -> &TextureSizeConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut TextureSizeConfig {
        &mut self.config
    }

    pub fn tileset(&self) -> Option<&Path> {
        self.tileset.as_deref()
    }

    pub fn tile_table(&self) -> Arc<TileTextureTable> {
        self.active.load_full()
    }

    pub fn loaded_pages(&self) -> Option<&LoadedPages> {
        self.loaded.as_ref()
    }

    pub fn terrain_page(&self) -> Option<PageId> {
        self.loaded.as_ref().map(|pages| pages.current)
    }

    pub fn layer_pages(&self) -> Option<LayerSet<PageId>> {
        self.loaded.as_ref().map(|pages| pages.layers)
    }

    /// Loads the tileset at `base`, replacing the pages of the previous load.
    pub fn load(
        &mut self,
        source: &impl AssetSource,
        base: impl Into<PathBuf>,
    ) -> Result<LoadSummary, TilesetLoadError> {
        let base = base.into();
        self.tileset = Some(base.clone());
        self.load_into(source, &base)
    }

    /// Releases the textures of the last load and loads the same tileset again.
    ///
    /// When nothing else reserved device slots since the last load, its slots
    /// are reused so page ids stay stable.
    pub fn reload(&mut self, source: &impl AssetSource) -> Result<LoadSummary, TilesetLoadError> {
        let Some(base) = self.tileset.clone() else {
            return Err(FatalConfigurationError::NoTilesetLoaded.into());
        };
        debug!(
            target: LOG_TARGET,
            "reloading tile textures for {}",
            base.display()
        );
        self.load_into(source, &base)
    }

    /// Unbinds every claimed slot and returns the range the next allocator
    /// may recycle.
    fn release_claimed(&mut self) -> Result<Range<u32>, TilesetLoadError> {
        self.loaded = None;
        for slot in self.claimed.clone() {
            self.device.assign_texture(PageId::new(slot), None)?;
        }
        let end = self.device.page_count();
        if self.claimed.end == end {
            debug!(target: LOG_TARGET, "recycling texture slots {:?}", self.claimed);
            Ok(self.claimed.clone())
        } else {
            Ok(end..end)
        }
    }

    fn load_into(
        &mut self,
        source: &impl AssetSource,
        base: &Path,
    ) -> Result<LoadSummary, TilesetLoadError> {
        let slots = self.release_claimed()?;
        let configuration = negotiate(
            self.device.max_texture_dimension(),
            self.config.texture_size(),
            BASE_TILE_SIZE,
            BASE_MIP_LEVELS,
        )
        .map_err(FatalConfigurationError::from)?;

        let paths = TilesetPaths::resolve(source, base, configuration.tile_size);
        let radar_path = paths.radar();
        let radar = source
            .read_file(&radar_path)
            .map_err(|error| TilesetLoadError::AssetDecode {
                path: radar_path.clone(),
                error,
            })?
            .ok_or(FatalConfigurationError::MissingRadarPalette { path: radar_path })?;
        let palette = RadarPalette::parse(&radar);

        let mut allocator = PageAllocator::recycling(
            slots,
            configuration.grid().tiles_per_page(),
            configuration.mip_levels,
        );
        let packed = pack(
            &mut self.device,
            source,
            &paths,
            configuration,
            &mut allocator,
        );
        self.claimed = allocator.claimed_slots();
        let outcome = packed?;

        self.active.store(Arc::new(outcome.table));
        self.loaded = Some(outcome.pages.clone());
        info!(
            target: LOG_TARGET,
            "loaded {} tiles from {} into {} terrain pages ({}px, {} mip levels)",
            outcome.tiles_loaded,
            paths.tile_dir().display(),
            outcome.pages.terrain.len(),
            configuration.tile_size,
            configuration.mip_levels
        );
        Ok(LoadSummary {
            configuration,
            tiles_loaded: outcome.tiles_loaded,
            tile_dir: paths.tile_dir().to_path_buf(),
            pages: outcome.pages,
            palette,
        })
    }
}
