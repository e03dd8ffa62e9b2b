use log::{debug, error};
use serde::{Deserialize, Serialize};

use crate::LOG_TARGET;

pub const DEFAULT_TEXTURE_SIZE: u32 = 2048;
pub const MIN_TEXTURE_SIZE: u32 = 16;
const TEXTURE_SIZE_STEP: u32 = 16;

#[derive(Debug, Default, Deserialize)]
struct RawTextureSizeConfig {
    texture_size: Option<u32>,
}

/// User cap on the texture size the atlas may create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawTextureSizeConfig")]
pub struct TextureSizeConfig {
    texture_size: u32,
}

impl Default for TextureSizeConfig {
    fn default() -> Self {
        Self {
            texture_size: DEFAULT_TEXTURE_SIZE,
        }
    }
}

impl From<RawTextureSizeConfig> for TextureSizeConfig {
    fn from(raw: RawTextureSizeConfig) -> Self {
        let mut config = Self::default();
        if let Some(texture_size) = raw.texture_size {
            config.set_texture_size(texture_size);
        }
        config
    }
}

impl TextureSizeConfig {
    pub fn texture_size(&self) -> u32 {
        self.texture_size
    }

    /// Accepts multiples of 16 that are at least 16; anything else is logged
    /// and leaves the current value in place.
    pub fn set_texture_size(&mut self, texture_size: u32) -> bool {
        if texture_size < MIN_TEXTURE_SIZE || texture_size % TEXTURE_SIZE_STEP != 0 {
            error!(target: LOG_TARGET, "attempted to set bad texture size {texture_size}, ignored");
            return false;
        }
        self.texture_size = texture_size;
        debug!(target: LOG_TARGET, "texture size set to {texture_size}");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_sizes_keep_previous_value() {
        let mut config = TextureSizeConfig::default();
        assert!(config.set_texture_size(1024));
        assert!(!config.set_texture_size(8));
        assert!(!config.set_texture_size(1000));
        assert!(!config.set_texture_size(0));
        assert_eq!(config.texture_size(), 1024);
        assert!(config.set_texture_size(16));
        assert_eq!(config.texture_size(), 16);
    }

    #[test]
    fn deserialized_values_are_validated() {
        let config: TextureSizeConfig = serde_json::from_str(r#"{"texture_size": 512}"#).unwrap();
        assert_eq!(config.texture_size(), 512);

        let config: TextureSizeConfig = serde_json::from_str(r#"{"texture_size": 100}"#).unwrap();
        assert_eq!(config.texture_size(), DEFAULT_TEXTURE_SIZE);

        let config: TextureSizeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, TextureSizeConfig::default());
    }

    #[test]
    fn serializes_current_value() {
        let mut config = TextureSizeConfig::default();
        config.set_texture_size(256);
        assert_eq!(
            serde_json::to_string(&config).unwrap(),
            r#"{"texture_size":256}"#
        );
    }
}
