use std::fmt;

use atlas::{PageId, PixelFormat};

#[cfg(feature = "atlas-gpu")]
mod gpu_runtime;
mod headless;

#[cfg(feature = "atlas-gpu")]
pub use gpu_runtime::{WgpuDeviceContext, WgpuPageTexture};
pub use headless::{CpuDeviceContext, CpuPageTexture, CpuSlot};

/// Destination rectangle of an upload, in level 0 texels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl UploadRegion {
    pub const fn tile(x: u32, y: u32, tile_size: u32) -> Self {
        Self {
            x,
            y,
            width: tile_size,
            height: tile_size,
        }
    }

    /// Region covered at `level`, every axis clamped to at least one texel.
    pub fn at_level(self, level: u32) -> Self {
        Self {
            x: self.x >> level,
            y: self.y >> level,
            width: (self.width >> level).max(1),
            height: (self.height >> level).max(1),
        }
    }

    pub(crate) fn fits_within(self, width: u32, height: u32) -> bool {
        self.x
            .checked_add(self.width)
            .is_some_and(|right| right <= width)
            && self
                .y
                .checked_add(self.height)
                .is_some_and(|bottom| bottom <= height)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    AdapterUnavailable(String),
    CreateTexture(String),
    InvalidExtent { width: u32, height: u32 },
    UnknownPage(PageId),
    PageUnbound(PageId),
    UploadOutOfBounds { page: PageId, region: UploadRegion },
    BufferLengthMismatch { expected: usize, actual: usize },
}

impl fmt::Display for DeviceError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::AdapterUnavailable(reason) => {
                write!(formatter, "no graphics adapter available: {reason}")
            }
            DeviceError::CreateTexture(reason) => {
                write!(formatter, "texture creation failed: {reason}")
            }
            DeviceError::InvalidExtent { width, height } => {
                write!(formatter, "texture extent {width}x{height} is not supported")
            }
            DeviceError::UnknownPage(page) => write!(formatter, "texture page {page} does not exist"),
            DeviceError::PageUnbound(page) => {
                write!(formatter, "texture page {page} has no texture bound")
            }
            DeviceError::UploadOutOfBounds { page, region } => write!(
                formatter,
                "upload {}x{} at ({}, {}) exceeds texture page {page}",
                region.width, region.height, region.x, region.y
            ),
            DeviceError::BufferLengthMismatch { expected, actual } => write!(
                formatter,
                "pixel buffer holds {actual} bytes, expected {expected}"
            ),
        }
    }
}

impl std::error::Error for DeviceError {}

/// Texture table and upload path of the graphics device.
///
/// Slots are reserved once and keep their id for the device lifetime. The
/// texture bound to a slot can be swapped or cleared with
/// [`DeviceContext::assign_texture`]; dropping the previous texture releases
/// its memory.
pub trait DeviceContext {
    type Texture;

    fn max_texture_dimension(&self) -> u32;

    fn create_texture(
        &mut self,
        mip_levels: u32,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<Self::Texture, DeviceError>;

    /// Appends an empty slot and returns its id, always `page_count()` before the call.
    fn reserve_slot(&mut self, name: &str, width: u32, height: u32) -> PageId;

    fn assign_texture(
        &mut self,
        page: PageId,
        texture: Option<Self::Texture>,
    ) -> Result<(), DeviceError>;

    /// Writes `pixels` into level 0 of the page texture and regenerates the
    /// region in every further mip level the texture has.
    fn upload_and_generate_mips(
        &mut self,
        page: PageId,
        region: UploadRegion,
        format: PixelFormat,
        pixels: &[u8],
    ) -> Result<(), DeviceError>;

    fn page_count(&self) -> u32;
}

pub(crate) fn validate_upload(
    page: PageId,
    region: UploadRegion,
    texture_extent: (u32, u32),
    format: PixelFormat,
    pixels: &[u8],
) -> Result<(), DeviceError> {
    let expected = format
        .buffer_len(region.width, region.height)
        .ok_or(DeviceError::InvalidExtent {
            width: region.width,
            height: region.height,
        })?;
    if pixels.len() != expected {
        return Err(DeviceError::BufferLengthMismatch {
            expected,
            actual: pixels.len(),
        });
    }
    if !region.fits_within(texture_extent.0, texture_extent.1) {
        return Err(DeviceError::UploadOutOfBounds { page, region });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_shrinks_per_level_but_keeps_one_texel() {
        let region = UploadRegion::tile(64, 32, 32);
        assert_eq!(region.at_level(1), UploadRegion::tile(32, 16, 16));
        assert_eq!(
            region.at_level(6),
            UploadRegion {
                x: 1,
                y: 0,
                width: 1,
                height: 1
            }
        );
    }

    #[test]
    fn upload_validation_checks_length_and_bounds() {
        let page = PageId::new(0);
        let region = UploadRegion::tile(8, 8, 8);
        let pixels = vec![0; 8 * 8 * 4];
        assert!(validate_upload(page, region, (16, 16), PixelFormat::Rgba8Unorm, &pixels).is_ok());
        assert_eq!(
            validate_upload(page, region, (12, 16), PixelFormat::Rgba8Unorm, &pixels),
            Err(DeviceError::UploadOutOfBounds { page, region })
        );
        assert_eq!(
            validate_upload(page, region, (16, 16), PixelFormat::Rgba8Unorm, &pixels[1..]),
            Err(DeviceError::BufferLengthMismatch {
                expected: 256,
                actual: 255
            })
        );
    }
}
