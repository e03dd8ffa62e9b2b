use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use atlas::{BASE_TILE_SIZE, TerrainLayer};
use image::RgbaImage;
use image::imageops::{self, FilterType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    Io(String),
    Decode(String),
    InvalidDimensions {
        width: u32,
        height: u32,
        tile_size: u32,
    },
}

impl fmt::Display for AssetError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::Io(reason) => write!(formatter, "read failed: {reason}"),
            AssetError::Decode(reason) => write!(formatter, "decode failed: {reason}"),
            AssetError::InvalidDimensions {
                width,
                height,
                tile_size,
            } => write!(
                formatter,
                "image is {width}x{height}, expected a square of at least {tile_size}x{tile_size}"
            ),
        }
    }
}

impl std::error::Error for AssetError {}

/// Decoded RGBA8 raster.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    image: RgbaImage,
}

impl RasterImage {
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        RgbaImage::from_raw(width, height, pixels).map(|image| Self { image })
    }

    pub fn filled(width: u32, height: u32, texel: [u8; 4]) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, image::Rgba(texel)),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.image.into_raw()
    }

    /// Validates a tile image and downsamples it to `tile_size` when larger.
    pub fn fit_to_tile(self, tile_size: u32) -> Result<Self, AssetError> {
        let (width, height) = self.image.dimensions();
        if width != height || width < tile_size {
            return Err(AssetError::InvalidDimensions {
                width,
                height,
                tile_size,
            });
        }
        if width == tile_size {
            return Ok(self);
        }
        Ok(Self {
            image: imageops::resize(&self.image, tile_size, tile_size, FilterType::Triangle),
        })
    }
}

impl From<RgbaImage> for RasterImage {
    fn from(image: RgbaImage) -> Self {
        Self { image }
    }
}

/// Read access to tileset files.
pub trait AssetSource {
    fn exists(&self, path: &Path) -> bool;

    /// `Ok(None)` when the file is absent; decode failures are errors.
    fn load_image(&self, path: &Path) -> Result<Option<RasterImage>, AssetError>;

    fn read_file(&self, path: &Path) -> Result<Option<Vec<u8>>, AssetError>;
}

/// Tileset files on disk, relative paths resolved against `root`.
#[derive(Debug, Clone)]
pub struct DirectoryAssetSource {
    root: PathBuf,
}

impl DirectoryAssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

impl AssetSource for DirectoryAssetSource {
    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).is_file()
    }

    fn load_image(&self, path: &Path) -> Result<Option<RasterImage>, AssetError> {
        let full_path = self.resolve(path);
        if !full_path.is_file() {
            return Ok(None);
        }
        let image = image::open(&full_path).map_err(|error| AssetError::Decode(error.to_string()))?;
        Ok(Some(RasterImage::from(image.into_rgba8())))
    }

    fn read_file(&self, path: &Path) -> Result<Option<Vec<u8>>, AssetError> {
        match fs::read(self.resolve(path)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(AssetError::Io(error.to_string())),
        }
    }
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = base.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// File naming of one tileset.
///
/// ```text
/// <base>.radar
/// <base>-<tile size>/tile-07.png
/// <base>-<tile size>/tile-07_nm.png   (_sm, _hm)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilesetPaths {
    base: PathBuf,
    tile_dir: PathBuf,
}

impl TilesetPaths {
    pub fn new(base: impl Into<PathBuf>, tile_size: u32) -> Self {
        let base = base.into();
        let tile_dir = Self::tile_dir_for(&base, tile_size);
        Self { base, tile_dir }
    }

    /// Uses the first of `<base>-<tile_size>`, `<base>-<2 * tile_size>`, ...
    /// up to `<base>-BASE_TILE_SIZE` that holds tile 0, falling back to the
    /// exact size directory.
    pub fn resolve(source: &impl AssetSource, base: impl Into<PathBuf>, tile_size: u32) -> Self {
        let base = base.into();
        let mut candidate_size = tile_size;
        while candidate_size <= BASE_TILE_SIZE && candidate_size > 0 {
            let candidate = Self {
                tile_dir: Self::tile_dir_for(&base, candidate_size),
                base: base.clone(),
            };
            if source.exists(&candidate.diffuse(0)) {
                return candidate;
            }
            candidate_size *= 2;
        }
        Self::new(base, tile_size)
    }

    fn tile_dir_for(base: &Path, tile_size: u32) -> PathBuf {
        with_suffix(base, &format!("-{tile_size}"))
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn tile_dir(&self) -> &Path {
        &self.tile_dir
    }

    pub fn radar(&self) -> PathBuf {
        with_suffix(&self.base, ".radar")
    }

    pub fn diffuse(&self, ordinal: u32) -> PathBuf {
        self.tile_dir.join(format!("tile-{ordinal:02}.png"))
    }

    pub fn auxiliary(&self, layer: TerrainLayer, ordinal: u32) -> PathBuf {
        self.tile_dir
            .join(format!("tile-{ordinal:02}_{}.png", layer.suffix()))
    }

    pub fn slot_name(&self) -> String {
        self.base.display().to_string()
    }

    pub fn layer_slot_name(&self, layer: TerrainLayer) -> String {
        format!("{}-{}", self.base.display(), layer.suffix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_paths_follow_tileset_layout() {
        let paths = TilesetPaths::new("texpages/tertilesc1hw", 128);
        assert_eq!(paths.radar(), PathBuf::from("texpages/tertilesc1hw.radar"));
        assert_eq!(
            paths.diffuse(7),
            PathBuf::from("texpages/tertilesc1hw-128/tile-07.png")
        );
        assert_eq!(
            paths.diffuse(123),
            PathBuf::from("texpages/tertilesc1hw-128/tile-123.png")
        );
        assert_eq!(
            paths.auxiliary(TerrainLayer::Height, 0),
            PathBuf::from("texpages/tertilesc1hw-128/tile-00_hm.png")
        );
        assert_eq!(paths.layer_slot_name(TerrainLayer::Normal), "texpages/tertilesc1hw-nm");
    }

    #[test]
    fn larger_tiles_are_downsampled() {
        let image = RasterImage::filled(64, 64, [200, 100, 50, 255]);
        let fitted = image.fit_to_tile(16).unwrap();
        assert_eq!((fitted.width(), fitted.height()), (16, 16));
        assert_eq!(&fitted.pixels()[..4], &[200, 100, 50, 255]);
    }

    #[test]
    fn non_square_or_small_tiles_are_rejected() {
        let error = RasterImage::filled(32, 16, [0; 4]).fit_to_tile(16).unwrap_err();
        assert_eq!(
            error,
            AssetError::InvalidDimensions {
                width: 32,
                height: 16,
                tile_size: 16
            }
        );
        assert!(RasterImage::filled(8, 8, [0; 4]).fit_to_tile(16).is_err());
        assert!(RasterImage::filled(16, 16, [0; 4]).fit_to_tile(16).is_ok());
    }

    #[test]
    fn directory_source_reports_absence_and_decode_errors() {
        let root = std::env::temp_dir().join(format!("tiles-asset-test-{}", std::process::id()));
        fs::create_dir_all(&root).unwrap();
        RgbaImage::from_pixel(4, 4, image::Rgba([1, 2, 3, 4]))
            .save(root.join("tile.png"))
            .unwrap();
        fs::write(root.join("broken.png"), b"not a png").unwrap();

        let source = DirectoryAssetSource::new(&root);
        let loaded = source.load_image(Path::new("tile.png")).unwrap().unwrap();
        assert_eq!((loaded.width(), loaded.height()), (4, 4));
        assert_eq!(&loaded.pixels()[..4], &[1, 2, 3, 4]);
        assert!(source.load_image(Path::new("missing.png")).unwrap().is_none());
        assert!(matches!(
            source.load_image(Path::new("broken.png")),
            Err(AssetError::Decode(_))
        ));
        assert!(source.read_file(Path::new("missing.radar")).unwrap().is_none());

        fs::remove_dir_all(&root).unwrap();
    }
}
