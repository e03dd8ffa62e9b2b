#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Rgba8Unorm,
    Rgb8Unorm,
}

impl PixelFormat {
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgba8Unorm => 4,
            PixelFormat::Rgb8Unorm => 3,
        }
    }

    /// Byte length of a tightly packed `width` x `height` buffer, `None` on overflow.
    pub fn buffer_len(self, width: u32, height: u32) -> Option<usize> {
        (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(self.bytes_per_pixel())
    }
}

/// Widens a tightly packed buffer to RGBA8, filling alpha with `0xff`.
pub fn expand_to_rgba8(format: PixelFormat, pixels: &[u8]) -> Vec<u8> {
    match format {
        PixelFormat::Rgba8Unorm => pixels.to_vec(),
        PixelFormat::Rgb8Unorm => pixels
            .chunks_exact(3)
            .flat_map(|texel| [texel[0], texel[1], texel[2], 0xff])
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_len_accounts_for_texel_size() {
        assert_eq!(PixelFormat::Rgba8Unorm.buffer_len(4, 2), Some(32));
        assert_eq!(PixelFormat::Rgb8Unorm.buffer_len(1, 1), Some(3));
        assert_eq!(PixelFormat::Rgba8Unorm.buffer_len(u32::MAX, u32::MAX), None);
    }

    #[test]
    fn rgb_expands_with_opaque_alpha() {
        let expanded = expand_to_rgba8(PixelFormat::Rgb8Unorm, &[0x7f, 0x7f, 0xff, 1, 2, 3]);
        assert_eq!(expanded, vec![0x7f, 0x7f, 0xff, 0xff, 1, 2, 3, 0xff]);
    }
}
