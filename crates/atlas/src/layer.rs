/// Auxiliary per-tile maps packed alongside the diffuse atlas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerrainLayer {
    Normal,
    Specular,
    Height,
}

/// Flat-up normal `(0, 0, 1)` used when a tileset ships no normal maps at all.
pub const DEGENERATE_NORMAL_TEXEL: [u8; 3] = [0x7f, 0x7f, 0xff];

/// What replaces a layer's page when no tile in the tileset supplied that map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegeneratePage {
    ConstantTexel([u8; 3]),
    Unbound,
}

impl TerrainLayer {
    pub const AUXILIARY: [TerrainLayer; 3] = [
        TerrainLayer::Normal,
        TerrainLayer::Specular,
        TerrainLayer::Height,
    ];

    /// File and slot name suffix.
    pub const fn suffix(self) -> &'static str {
        match self {
            TerrainLayer::Normal => "nm",
            TerrainLayer::Specular => "sm",
            TerrainLayer::Height => "hm",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            TerrainLayer::Normal => "normal",
            TerrainLayer::Specular => "specular",
            TerrainLayer::Height => "height",
        }
    }

    pub const fn fallback_texel(self) -> [u8; 4] {
        match self {
            TerrainLayer::Normal => [0x7f, 0x7f, 0xff, 0xff],
            TerrainLayer::Specular | TerrainLayer::Height => [0; 4],
        }
    }

    /// RGBA8 buffer covering one `tile_size` x `tile_size` tile.
    pub fn fallback_buffer(self, tile_size: u32) -> Vec<u8> {
        let texels = tile_size as usize * tile_size as usize;
        match self {
            TerrainLayer::Normal => self.fallback_texel().repeat(texels),
            TerrainLayer::Specular | TerrainLayer::Height => vec![0; texels * 4],
        }
    }

    pub const fn degenerate_page(self) -> DegeneratePage {
        match self {
            TerrainLayer::Normal => DegeneratePage::ConstantTexel(DEGENERATE_NORMAL_TEXEL),
            TerrainLayer::Specular | TerrainLayer::Height => DegeneratePage::Unbound,
        }
    }
}

/// One value per auxiliary layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayerSet<T> {
    pub normal: T,
    pub specular: T,
    pub height: T,
}

impl<T> LayerSet<T> {
    pub fn splat(value: T) -> Self
    where
        T: Clone,
    {
        Self {
            normal: value.clone(),
            specular: value.clone(),
            height: value,
        }
    }

    pub fn try_from_fn<E>(mut build: impl FnMut(TerrainLayer) -> Result<T, E>) -> Result<Self, E> {
        Ok(Self {
            normal: build(TerrainLayer::Normal)?,
            specular: build(TerrainLayer::Specular)?,
            height: build(TerrainLayer::Height)?,
        })
    }

    pub fn get(&self, layer: TerrainLayer) -> &T {
        match layer {
            TerrainLayer::Normal => &self.normal,
            TerrainLayer::Specular => &self.specular,
            TerrainLayer::Height => &self.height,
        }
    }

    pub fn get_mut(&mut self, layer: TerrainLayer) -> &mut T {
        match layer {
            TerrainLayer::Normal => &mut self.normal,
            TerrainLayer::Specular => &mut self.specular,
            TerrainLayer::Height => &mut self.height,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (TerrainLayer, &T)> + '_ {
        TerrainLayer::AUXILIARY
            .into_iter()
            .map(move |layer| (layer, self.get(layer)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_fallback_points_straight_up() {
        let buffer = TerrainLayer::Normal.fallback_buffer(4);
        assert_eq!(buffer.len(), 4 * 4 * 4);
        for texel in buffer.chunks_exact(4) {
            assert_eq!(&texel[..3], &[127, 127, 255]);
        }
    }

    #[test]
    fn specular_and_height_fallbacks_are_zero() {
        for layer in [TerrainLayer::Specular, TerrainLayer::Height] {
            let buffer = layer.fallback_buffer(8);
            assert_eq!(buffer.len(), 8 * 8 * 4);
            assert!(buffer.iter().all(|&byte| byte == 0));
        }
    }

    #[test]
    fn only_normal_layer_keeps_a_constant_page() {
        assert_eq!(
            TerrainLayer::Normal.degenerate_page(),
            DegeneratePage::ConstantTexel([0x7f, 0x7f, 0xff])
        );
        assert_eq!(
            TerrainLayer::Specular.degenerate_page(),
            DegeneratePage::Unbound
        );
        assert_eq!(TerrainLayer::Height.degenerate_page(), DegeneratePage::Unbound);
    }

    #[test]
    fn layer_set_indexes_by_layer() {
        let mut found = LayerSet::splat(false);
        *found.get_mut(TerrainLayer::Specular) = true;
        let flags: Vec<_> = found.iter().map(|(layer, flag)| (layer, *flag)).collect();
        assert_eq!(
            flags,
            vec![
                (TerrainLayer::Normal, false),
                (TerrainLayer::Specular, true),
                (TerrainLayer::Height, false),
            ]
        );
    }
}
