use atlas::{PageId, PixelFormat, expand_to_rgba8};
use image::RgbaImage;

use super::{DeviceContext, DeviceError, UploadRegion, validate_upload};
use crate::mip::mip_chain;

const DEFAULT_MAX_TEXTURE_DIMENSION: u32 = 8192;

/// Texture kept in host memory, every mip level stored as RGBA8.
#[derive(Debug, Clone, PartialEq)]
pub struct CpuPageTexture {
    pub width: u32,
    pub height: u32,
    pub mip_levels: u32,
    pub format: PixelFormat,
    levels: Vec<RgbaImage>,
}

impl CpuPageTexture {
    pub fn level(&self, level: u32) -> Option<&RgbaImage> {
        self.levels.get(level as usize)
    }

    /// RGBA of a level 0 texel.
    pub fn texel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let level0 = self.levels.first()?;
        (x < level0.width() && y < level0.height()).then(|| level0.get_pixel(x, y).0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CpuSlot {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub texture: Option<CpuPageTexture>,
}

/// Device context without a GPU. Useful for baking and for tests that need
/// to read uploaded pixels back.
#[derive(Debug, Clone)]
pub struct CpuDeviceContext {
    max_texture_dimension: u32,
    slots: Vec<CpuSlot>,
    textures_created: u32,
}

impl Default for CpuDeviceContext {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TEXTURE_DIMENSION)
    }
}

impl CpuDeviceContext {
    pub fn new(max_texture_dimension: u32) -> Self {
        Self {
            max_texture_dimension,
            slots: Vec::new(),
            textures_created: 0,
        }
    }

    pub fn slot(&self, page: PageId) -> Option<&CpuSlot> {
        self.slots.get(page.index())
    }

    pub fn texture(&self, page: PageId) -> Option<&CpuPageTexture> {
        self.slot(page)?.texture.as_ref()
    }

    pub fn bound_pages(&self) -> usize {
        self.slots.iter().filter(|slot| slot.texture.is_some()).count()
    }

    pub fn textures_created(&self) -> u32 {
        self.textures_created
    }
}

impl DeviceContext for CpuDeviceContext {
    type Texture = CpuPageTexture;

    fn max_texture_dimension(&self) -> u32 {
        self.max_texture_dimension
    }

    fn create_texture(
        &mut self,
        mip_levels: u32,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<Self::Texture, DeviceError> {
        if width == 0
            || height == 0
            || width > self.max_texture_dimension
            || height > self.max_texture_dimension
        {
            return Err(DeviceError::InvalidExtent { width, height });
        }
        if mip_levels == 0 {
            return Err(DeviceError::CreateTexture(
                "mip level count must be at least 1".to_owned(),
            ));
        }
        let mut levels = Vec::with_capacity(mip_levels as usize);
        for level in 0..mip_levels {
            levels.push(RgbaImage::new(
                (width >> level).max(1),
                (height >> level).max(1),
            ));
        }
        self.textures_created += 1;
        Ok(CpuPageTexture {
            width,
            height,
            mip_levels,
            format,
            levels,
        })
    }

    fn reserve_slot(&mut self, name: &str, width: u32, height: u32) -> PageId {
        let page = PageId::new(self.slots.len() as u32);
        self.slots.push(CpuSlot {
            name: name.to_owned(),
            width,
            height,
            texture: None,
        });
        page
    }

    fn assign_texture(
        &mut self,
        page: PageId,
        texture: Option<Self::Texture>,
    ) -> Result<(), DeviceError> {
        let slot = self
            .slots
            .get_mut(page.index())
            .ok_or(DeviceError::UnknownPage(page))?;
        slot.texture = texture;
        Ok(())
    }

    fn upload_and_generate_mips(
        &mut self,
        page: PageId,
        region: UploadRegion,
        format: PixelFormat,
        pixels: &[u8],
    ) -> Result<(), DeviceError> {
        let slot = self
            .slots
            .get_mut(page.index())
            .ok_or(DeviceError::UnknownPage(page))?;
        let texture = slot
            .texture
            .as_mut()
            .ok_or(DeviceError::PageUnbound(page))?;
        validate_upload(
            page,
            region,
            (texture.width, texture.height),
            format,
            pixels,
        )?;

        let level0 = RgbaImage::from_raw(region.width, region.height, expand_to_rgba8(format, pixels))
            .ok_or(DeviceError::InvalidExtent {
                width: region.width,
                height: region.height,
            })?;
        for (level, source) in mip_chain(level0, texture.mip_levels).iter().enumerate() {
            let target = region.at_level(level as u32);
            let destination = &mut texture.levels[level];
            image::imageops::replace(destination, source, target.x.into(), target.y.into());
        }
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.slots.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_are_numbered_in_reservation_order() {
        let mut device = CpuDeviceContext::default();
        assert_eq!(device.reserve_slot("a", 4, 4), PageId::new(0));
        assert_eq!(device.reserve_slot("b", 4, 4), PageId::new(1));
        assert_eq!(device.page_count(), 2);
        assert_eq!(device.slot(PageId::new(1)).unwrap().name, "b");
    }

    #[test]
    fn upload_fills_every_mip_level() {
        let mut device = CpuDeviceContext::default();
        let page = device.reserve_slot("page", 8, 8);
        let texture = device
            .create_texture(3, 8, 8, PixelFormat::Rgba8Unorm)
            .unwrap();
        device.assign_texture(page, Some(texture)).unwrap();

        let pixels = [9, 8, 7, 255].repeat(16);
        device
            .upload_and_generate_mips(
                page,
                UploadRegion::tile(4, 4, 4),
                PixelFormat::Rgba8Unorm,
                &pixels,
            )
            .unwrap();

        let texture = device.texture(page).unwrap();
        assert_eq!(texture.texel(4, 4), Some([9, 8, 7, 255]));
        assert_eq!(texture.texel(7, 7), Some([9, 8, 7, 255]));
        assert_eq!(texture.texel(3, 3), Some([0, 0, 0, 0]));
        assert_eq!(texture.level(1).unwrap().get_pixel(2, 2).0, [9, 8, 7, 255]);
        assert_eq!(texture.level(2).unwrap().get_pixel(1, 1).0, [9, 8, 7, 255]);
    }

    #[test]
    fn upload_into_unbound_slot_fails() {
        let mut device = CpuDeviceContext::default();
        let page = device.reserve_slot("page", 4, 4);
        let error = device
            .upload_and_generate_mips(
                page,
                UploadRegion::tile(0, 0, 1),
                PixelFormat::Rgba8Unorm,
                &[0; 4],
            )
            .unwrap_err();
        assert_eq!(error, DeviceError::PageUnbound(page));
    }

    #[test]
    fn oversized_texture_is_rejected() {
        let mut device = CpuDeviceContext::new(64);
        assert_eq!(
            device.create_texture(1, 128, 64, PixelFormat::Rgba8Unorm),
            Err(DeviceError::InvalidExtent {
                width: 128,
                height: 64
            })
        );
    }
}
