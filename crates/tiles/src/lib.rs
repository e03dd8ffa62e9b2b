use std::fmt;
use std::path::PathBuf;

use atlas::{NegotiationError, RegistryError};

pub mod asset;
pub mod config;
pub mod context;
pub mod device;
mod mip;
pub mod packer;
pub mod page_allocator;
pub mod radar;


pub use asset::{AssetError, AssetSource, DirectoryAssetSource, RasterImage, TilesetPaths};
pub use config::{DEFAULT_TEXTURE_SIZE, MIN_TEXTURE_SIZE, TextureSizeConfig};
pub use context::{AtlasLoadContext, LoadSummary};
#[cfg(feature = "atlas-gpu")]
pub use device::{WgpuDeviceContext, WgpuPageTexture};
pub use device::{CpuDeviceContext, CpuPageTexture, DeviceContext, DeviceError, UploadRegion};
pub use packer::{LoadedPages, PackOutcome, pack};
pub use page_allocator::{PAGE_FORMAT, PageAllocator, TexturePage};
pub use radar::RadarPalette;

pub(crate) const LOG_TARGET: &str = "texture";

/// Conditions under which no usable atlas can exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FatalConfigurationError {
    MipChainExhausted { max_texture_size: u32 },
    MissingRadarPalette { path: PathBuf },
    MissingFirstTile { path: PathBuf },
    NoTilesetLoaded,
}

impl From<NegotiationError> for FatalConfigurationError {
    fn from(value: NegotiationError) -> Self {
        match value {
            NegotiationError::MipChainExhausted { max_texture_size } => {
                Self::MipChainExhausted { max_texture_size }
            }
        }
    }
}

impl fmt::Display for FatalConfigurationError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FatalConfigurationError::MipChainExhausted { max_texture_size } => write!(
                formatter,
                "supported texture size {max_texture_size} is too low to load any mipmap levels"
            ),
            FatalConfigurationError::MissingRadarPalette { path } => {
                write!(formatter, "could not find radar colours at {}", path.display())
            }
            FatalConfigurationError::MissingFirstTile { path } => {
                write!(formatter, "could not find {}", path.display())
            }
            FatalConfigurationError::NoTilesetLoaded => {
                write!(formatter, "no tileset has been loaded yet")
            }
        }
    }
}

impl std::error::Error for FatalConfigurationError {}

/// Outcome of a failed load or reload.
///
/// `Fatal` means the tileset or device cannot produce an atlas at all. The
/// other variants are single load failures the caller may retry or abort on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TilesetLoadError {
    Fatal(FatalConfigurationError),
    AssetDecode { path: PathBuf, error: AssetError },
    Device(DeviceError),
    Registry(RegistryError),
}

impl TilesetLoadError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, TilesetLoadError::Fatal(_))
    }
}

impl From<FatalConfigurationError> for TilesetLoadError {
    fn from(value: FatalConfigurationError) -> Self {
        Self::Fatal(value)
    }
}

impl From<DeviceError> for TilesetLoadError {
    fn from(value: DeviceError) -> Self {
        Self::Device(value)
    }
}

impl From<RegistryError> for TilesetLoadError {
    fn from(value: RegistryError) -> Self {
        Self::Registry(value)
    }
}

impl fmt::Display for TilesetLoadError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TilesetLoadError::Fatal(error) => write!(formatter, "fatal tileset error: {error}"),
            TilesetLoadError::AssetDecode { path, error } => {
                write!(formatter, "could not load {}: {error}", path.display())
            }
            TilesetLoadError::Device(error) => write!(formatter, "device error: {error}"),
            TilesetLoadError::Registry(error) => write!(formatter, "tile table error: {error}"),
        }
    }
}

impl std::error::Error for TilesetLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TilesetLoadError::Fatal(error) => Some(error),
            TilesetLoadError::AssetDecode { error, .. } => Some(error),
            TilesetLoadError::Device(error) => Some(error),
            TilesetLoadError::Registry(error) => Some(error),
        }
    }
}
