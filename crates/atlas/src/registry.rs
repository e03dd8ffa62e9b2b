use std::fmt;

use serde::Serialize;

use crate::key::PageId;

/// Capacity of the tile table; ordinals at or past it are never loaded.
pub const MAX_TILES: usize = 512;

/// Where a tile's diffuse texture lives: page plus normalized top-left offset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TileTextureInfo {
    pub page: PageId,
    pub u_offset: f32,
    pub v_offset: f32,
}

impl TileTextureInfo {
    pub fn from_pixel_offset(
        page: PageId,
        x_offset: u32,
        y_offset: u32,
        page_width: u32,
        page_height: u32,
    ) -> Self {
        assert!(page_width > 0, "page_width must be at least 1");
        assert!(page_height > 0, "page_height must be at least 1");
        Self {
            page,
            u_offset: x_offset as f32 / page_width as f32,
            v_offset: y_offset as f32 / page_height as f32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    OrdinalOutOfRange { ordinal: u32, capacity: usize },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::OrdinalOutOfRange { ordinal, capacity } => write!(
                formatter,
                "tile ordinal {ordinal} exceeds tile table capacity {capacity}"
            ),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Tile ordinal -> texture placement, sized once and bounds checked.
#[derive(Debug, Clone, PartialEq)]
pub struct TileTextureTable {
    entries: Box<[Option<TileTextureInfo>]>,
}

impl Default for TileTextureTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TileTextureTable {
    pub fn new() -> Self {
        Self::with_capacity(MAX_TILES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: vec![None; capacity].into_boxed_slice(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, ordinal: u32) -> Option<&TileTextureInfo> {
        self.entries.get(ordinal as usize)?.as_ref()
    }

    pub fn insert(&mut self, ordinal: u32, info: TileTextureInfo) -> Result<(), RegistryError> {
        let capacity = self.capacity();
        let Some(slot) = self.entries.get_mut(ordinal as usize) else {
            return Err(RegistryError::OrdinalOutOfRange { ordinal, capacity });
        };
        *slot = Some(info);
        Ok(())
    }

    pub fn populated(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.populated() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &TileTextureInfo)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(ordinal, entry)| Some((ordinal as u32, entry.as_ref()?)))
    }
}
