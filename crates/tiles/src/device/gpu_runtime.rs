use atlas::{PageId, PixelFormat, expand_to_rgba8};
use image::RgbaImage;

use super::{DeviceContext, DeviceError, UploadRegion, validate_upload};
use crate::mip::mip_chain;

#[derive(Debug)]
pub struct WgpuPageTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
    mip_levels: u32,
    format: PixelFormat,
}

impl WgpuPageTexture {
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }
}

#[derive(Debug)]
struct WgpuSlot {
    name: String,
    texture: Option<WgpuPageTexture>,
}

/// Texture page table on a `wgpu` device.
#[derive(Debug)]
pub struct WgpuDeviceContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    slots: Vec<WgpuSlot>,
}

impl WgpuDeviceContext {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self {
            device,
            queue,
            slots: Vec::new(),
        }
    }

    /// Opens the default adapter without a surface, requesting its full limits.
    pub fn request_headless() -> Result<Self, DeviceError> {
        pollster::block_on(async {
            let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
                backends: wgpu::Backends::all(),
                ..Default::default()
            });
            let adapter = instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::HighPerformance,
                    compatible_surface: None,
                    force_fallback_adapter: false,
                })
                .await
                .map_err(|error| DeviceError::AdapterUnavailable(error.to_string()))?;
            let limits = adapter.limits();
            let (device, queue) = adapter
                .request_device(&wgpu::DeviceDescriptor {
                    label: Some("terrain atlas"),
                    required_features: wgpu::Features::empty(),
                    required_limits: limits,
                    experimental_features: wgpu::ExperimentalFeatures::disabled(),
                    memory_hints: wgpu::MemoryHints::Performance,
                    trace: wgpu::Trace::Off,
                })
                .await
                .map_err(|error| DeviceError::AdapterUnavailable(error.to_string()))?;
            Ok(Self::new(device, queue))
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn page_texture(&self, page: PageId) -> Option<&WgpuPageTexture> {
        self.slots.get(page.index())?.texture.as_ref()
    }

    pub fn slot_name(&self, page: PageId) -> Option<&str> {
        self.slots.get(page.index()).map(|slot| slot.name.as_str())
    }
}

// No three-channel 8-bit format exists in wgpu; RGB pages are stored as RGBA.
fn pixel_format_to_wgpu(_format: PixelFormat) -> wgpu::TextureFormat {
    wgpu::TextureFormat::Rgba8Unorm
}

impl DeviceContext for WgpuDeviceContext {
    type Texture = WgpuPageTexture;

    fn max_texture_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    fn create_texture(
        &mut self,
        mip_levels: u32,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<Self::Texture, DeviceError> {
        let max_dimension = self.max_texture_dimension();
        if width == 0 || height == 0 || width > max_dimension || height > max_dimension {
            return Err(DeviceError::InvalidExtent { width, height });
        }
        let wgpu_format = pixel_format_to_wgpu(format);
        let error_scope = self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("terrain.page"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: mip_levels,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu_format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        if let Some(error) = pollster::block_on(error_scope.pop()) {
            return Err(DeviceError::CreateTexture(error.to_string()));
        }
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("terrain.page.view"),
            format: Some(wgpu_format),
            dimension: Some(wgpu::TextureViewDimension::D2),
            usage: None,
            aspect: wgpu::TextureAspect::All,
            base_mip_level: 0,
            mip_level_count: Some(mip_levels),
            base_array_layer: 0,
            array_layer_count: Some(1),
        });
        Ok(WgpuPageTexture {
            texture,
            view,
            width,
            height,
            mip_levels,
            format,
        })
    }

    fn reserve_slot(&mut self, name: &str, _width: u32, _height: u32) -> PageId {
        let page = PageId::new(self.slots.len() as u32);
        self.slots.push(WgpuSlot {
            name: name.to_owned(),
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
        if let Some(previous) = slot.texture.take() {
            previous.texture.destroy();
        }
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
        let texture = self
            .slots
            .get(page.index())
            .ok_or(DeviceError::UnknownPage(page))?
            .texture
            .as_ref()
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
            self.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture.texture,
                    mip_level: level as u32,
                    origin: wgpu::Origin3d {
                        x: target.x,
                        y: target.y,
                        z: 0,
                    },
                    aspect: wgpu::TextureAspect::All,
                },
                source.as_raw(),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(source.width() * 4),
                    rows_per_image: Some(source.height()),
                },
                wgpu::Extent3d {
                    width: source.width(),
                    height: source.height(),
                    depth_or_array_layers: 1,
                },
            );
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
    fn uploads_into_gpu_page_when_adapter_is_present() {
        let Ok(mut context) = WgpuDeviceContext::request_headless() else {
            return;
        };
        let page = context.reserve_slot("terrain", 64, 64);
        let texture = context
            .create_texture(3, 64, 64, PixelFormat::Rgba8Unorm)
            .expect("create terrain page");
        context.assign_texture(page, Some(texture)).unwrap();

        let pixels = [1, 2, 3, 255].repeat(16 * 16);
        context
            .upload_and_generate_mips(
                page,
                UploadRegion::tile(16, 16, 16),
                PixelFormat::Rgba8Unorm,
                &pixels,
            )
            .unwrap();
        assert_eq!(context.page_texture(page).unwrap().format(), PixelFormat::Rgba8Unorm);

        context.assign_texture(page, None).unwrap();
        assert!(context.page_texture(page).is_none());
        assert_eq!(context.slot_name(page), Some("terrain"));
    }
}
