use std::ops::Range;

use atlas::{PageId, PixelFormat, page_index};
use log::debug;

use crate::LOG_TARGET;
use crate::device::{DeviceContext, DeviceError, UploadRegion};

/// Format of every full size atlas page.
pub const PAGE_FORMAT: PixelFormat = PixelFormat::Rgba8Unorm;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TexturePage {
    pub id: PageId,
    pub width: u32,
    pub height: u32,
    pub mip_levels: u32,
    pub format: PixelFormat,
}

/// Hands out device texture pages for one tileset load.
///
/// Slots are taken in order starting at `slots.start`. Slots below
/// `recycle_end` belong to a previous load of the same tileset and get a
/// fresh texture; past it, new slots are reserved on the device. Auxiliary
/// pages come first, terrain pages follow from `first_page`.
#[derive(Debug)]
pub struct PageAllocator {
    slot_start: u32,
    next_slot: u32,
    recycle_end: u32,
    first_page: u32,
    tiles_per_page: u32,
    mip_levels: u32,
    pages: Vec<TexturePage>,
    current: Option<PageId>,
}

impl PageAllocator {
    /// Appends every page after the slots already on the device.
    pub fn new(device: &impl DeviceContext, tiles_per_page: u32, mip_levels: u32) -> Self {
        let start = device.page_count();
        Self::recycling(start..start, tiles_per_page, mip_levels)
    }

    /// Reuses `slots` before reserving new ones.
    pub fn recycling(slots: Range<u32>, tiles_per_page: u32, mip_levels: u32) -> Self {
        assert!(tiles_per_page > 0, "tiles_per_page must be at least 1");
        Self {
            slot_start: slots.start,
            next_slot: slots.start,
            recycle_end: slots.end,
            first_page: slots.start,
            tiles_per_page,
            mip_levels,
            pages: Vec::new(),
            current: None,
        }
    }

    fn acquire_slot<D: DeviceContext>(
        &mut self,
        device: &mut D,
        name: &str,
        width: u32,
        height: u32,
    ) -> Result<PageId, DeviceError> {
        let slot = self.next_slot;
        let page = if slot < self.recycle_end {
            if slot >= device.page_count() {
                return Err(DeviceError::UnknownPage(PageId::new(slot)));
            }
            PageId::new(slot)
        } else {
            if slot != device.page_count() {
                return Err(DeviceError::UnknownPage(PageId::new(slot)));
            }
            device.reserve_slot(name, width, height)
        };
        self.next_slot += 1;
        Ok(page)
    }

    fn bind_texture<D: DeviceContext>(
        &self,
        device: &mut D,
        id: PageId,
        width: u32,
        height: u32,
    ) -> Result<TexturePage, DeviceError> {
        let texture = device.create_texture(self.mip_levels, width, height, PAGE_FORMAT)?;
        device.assign_texture(id, Some(texture))?;
        Ok(TexturePage {
            id,
            width,
            height,
            mip_levels: self.mip_levels,
            format: PAGE_FORMAT,
        })
    }

    /// Reserves a page outside the terrain sequence. Must happen before the
    /// first [`PageAllocator::ensure_page`] call.
    pub fn reserve_page<D: DeviceContext>(
        &mut self,
        device: &mut D,
        name: &str,
        width: u32,
        height: u32,
    ) -> Result<TexturePage, DeviceError> {
        assert!(
            self.pages.is_empty(),
            "auxiliary pages must be reserved before terrain pages"
        );
        let id = self.acquire_slot(device, name, width, height)?;
        let page = self.bind_texture(device, id, width, height)?;
        self.first_page = self.next_slot;
        Ok(page)
    }

    /// Page holding `tile_ordinal`, created on first use. Also becomes the
    /// current terrain page.
    pub fn ensure_page<D: DeviceContext>(
        &mut self,
        device: &mut D,
        base_name: &str,
        level: u32,
        width: u32,
        height: u32,
        tile_ordinal: u32,
    ) -> Result<PageId, DeviceError> {
        let index = page_index(self.first_page, tile_ordinal, self.tiles_per_page);
        if let Some(page) = self.pages.iter().find(|page| page.id.raw() == index) {
            self.current = Some(page.id);
            return Ok(page.id);
        }
        if index != self.next_slot {
            return Err(DeviceError::UnknownPage(PageId::new(index)));
        }

        let id = self.acquire_slot(device, base_name, width, height)?;
        let page = self.bind_texture(device, id, width, height)?;
        debug!(
            target: LOG_TARGET,
            "texture page {id} for {base_name} level {level}: {width}x{height}, {} mip levels",
            self.mip_levels
        );
        self.pages.push(page);
        self.current = Some(id);
        Ok(id)
    }

    /// Swaps the page's texture for a single constant texel.
    pub fn replace_with_constant<D: DeviceContext>(
        &mut self,
        device: &mut D,
        page: PageId,
        texel: [u8; 3],
    ) -> Result<(), DeviceError> {
        let texture = device.create_texture(1, 1, 1, PixelFormat::Rgb8Unorm)?;
        device.assign_texture(page, Some(texture))?;
        device.upload_and_generate_mips(
            page,
            UploadRegion::tile(0, 0, 1),
            PixelFormat::Rgb8Unorm,
            &texel,
        )
    }

    pub fn unbind<D: DeviceContext>(&mut self, device: &mut D, page: PageId) -> Result<(), DeviceError> {
        device.assign_texture(page, None)
    }

    pub fn current_page(&self) -> Option<PageId> {
        self.current
    }

    pub fn first_page(&self) -> u32 {
        self.first_page
    }

    pub fn terrain_pages(&self) -> &[TexturePage] {
        &self.pages
    }

    /// Every slot this allocator has used so far.
    pub fn slot_range(&self) -> Range<u32> {
        self.slot_start..self.next_slot
    }

    /// Slots this allocator answers for: the ones it used plus any recycled
    /// slots it was handed but did not reach.
    pub fn claimed_slots(&self) -> Range<u32> {
        self.slot_start..self.next_slot.max(self.recycle_end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::CpuDeviceContext;

    const PER_PAGE: u32 = 4;

    #[test]
    fn terrain_pages_follow_auxiliary_pages() {
        let mut device = CpuDeviceContext::default();
        device.reserve_slot("unrelated", 1, 1);
        let mut allocator = PageAllocator::new(&device, PER_PAGE, 2);

        let aux = allocator.reserve_page(&mut device, "set-nm", 32, 32).unwrap();
        assert_eq!(aux.id, PageId::new(1));
        assert_eq!(allocator.first_page(), 2);

        let first = allocator
            .ensure_page(&mut device, "set", 0, 32, 32, 0)
            .unwrap();
        assert_eq!(first, PageId::new(2));
        assert_eq!(allocator.current_page(), Some(first));
        assert_eq!(device.page_count(), 3);
        assert_eq!(device.texture(first).unwrap().mip_levels, 2);
    }

    #[test]
    fn rollover_creates_strictly_greater_page() {
        let mut device = CpuDeviceContext::default();
        let mut allocator = PageAllocator::new(&device, PER_PAGE, 1);
        let first = allocator
            .ensure_page(&mut device, "set", 0, 16, 16, 0)
            .unwrap();
        // Same page until the last tile of the page has been placed.
        for ordinal in 0..PER_PAGE - 1 {
            let page = allocator
                .ensure_page(&mut device, "set", 0, 16, 16, ordinal)
                .unwrap();
            assert_eq!(page, first);
        }
        let second = allocator
            .ensure_page(&mut device, "set", 0, 16, 16, PER_PAGE - 1)
            .unwrap();
        assert!(second > first);
        assert_eq!(allocator.current_page(), Some(second));
        assert_eq!(allocator.terrain_pages().len(), 2);
        assert_eq!(allocator.slot_range(), 0..2);
    }

    #[test]
    fn recycled_slots_get_fresh_textures() {
        let mut device = CpuDeviceContext::default();
        let mut allocator = PageAllocator::new(&device, PER_PAGE, 1);
        allocator.reserve_page(&mut device, "set-nm", 16, 16).unwrap();
        let page = allocator
            .ensure_page(&mut device, "set", 0, 16, 16, 0)
            .unwrap();
        let slots = allocator.slot_range();
        device.assign_texture(page, None).unwrap();

        let mut recycler = PageAllocator::recycling(slots.clone(), PER_PAGE, 1);
        recycler.reserve_page(&mut device, "set-nm", 16, 16).unwrap();
        let reused = recycler
            .ensure_page(&mut device, "set", 0, 16, 16, 0)
            .unwrap();
        assert_eq!(reused, page);
        assert!(device.texture(reused).is_some());
        assert_eq!(device.page_count(), slots.end);
    }

    #[test]
    fn claimed_slots_cover_unreached_recycled_slots() {
        let mut device = CpuDeviceContext::default();
        for name in ["a", "b", "c", "d"] {
            device.reserve_slot(name, 16, 16);
        }
        let mut allocator = PageAllocator::recycling(0..4, PER_PAGE, 1);
        allocator
            .ensure_page(&mut device, "set", 0, 16, 16, 0)
            .unwrap();
        assert_eq!(allocator.slot_range(), 0..1);
        assert_eq!(allocator.claimed_slots(), 0..4);
    }

    #[test]
    fn constant_page_is_single_rgb_texel() {
        let mut device = CpuDeviceContext::default();
        let mut allocator = PageAllocator::new(&device, PER_PAGE, 3);
        let page = allocator.reserve_page(&mut device, "set-nm", 64, 64).unwrap();
        allocator
            .replace_with_constant(&mut device, page.id, [0x7f, 0x7f, 0xff])
            .unwrap();
        let texture = device.texture(page.id).unwrap();
        assert_eq!((texture.width, texture.height), (1, 1));
        assert_eq!(texture.format, PixelFormat::Rgb8Unorm);
        assert_eq!(texture.texel(0, 0), Some([0x7f, 0x7f, 0xff, 0xff]));

        allocator.unbind(&mut device, page.id).unwrap();
        assert!(device.texture(page.id).is_none());
    }
}
