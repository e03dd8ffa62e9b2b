use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use atlas::{PageId, TileTextureInfo};
use clap::Parser;
use log::{info, warn};
use serde::Serialize;
use tiles::{
    AtlasLoadContext, CpuDeviceContext, DeviceContext, DirectoryAssetSource, LoadSummary,
    TextureSizeConfig,
};

#[derive(Parser)]
#[command(author, version, about = "Pack a terrain tileset into texture atlas pages")]
struct Arguments {
    /// Tileset base path relative to the asset root, e.g. `tiles/arizona`.
    #[arg(long, short = 't')]
    tileset: Option<PathBuf>,
    /// Asset root directory.
    #[arg(long, short = 'r', value_parser, default_value = ".")]
    root: PathBuf,
    /// Preferred maximum texture size.
    #[arg(long)]
    texture_size: Option<u32>,
    /// JSON file holding `{"texture_size": ...}`.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Pack into host memory instead of a GPU device.
    #[arg(long)]
    cpu: bool,
    /// Device texture limit used with `--cpu`.
    #[arg(long, default_value_t = 8192)]
    max_texture_dimension: u32,
    /// Load the tileset a second time and check the tile table is unchanged.
    #[arg(long)]
    reload: bool,
    /// Write the tile table as JSON.
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
    /// Pretty-print JSON output.
    #[arg(long)]
    pretty: bool,
    /// Print the wgpu adapters and their texture limits, then exit.
    #[cfg(feature = "gpu")]
    #[arg(long)]
    list_adapters: bool,
}

#[derive(Serialize)]
struct TileEntry {
    ordinal: u32,
    #[serde(flatten)]
    info: TileTextureInfo,
}

#[derive(Serialize)]
struct AtlasReport {
    tileset: PathBuf,
    tile_dir: PathBuf,
    tile_size: u32,
    mip_levels: u32,
    tiles_loaded: u32,
    terrain_pages: Vec<PageId>,
    normal_page: PageId,
    specular_page: PageId,
    height_page: PageId,
    tiles: Vec<TileEntry>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let arguments = Arguments::parse();

    #[cfg(feature = "gpu")]
    if arguments.list_adapters {
        list_adapters();
        return Ok(());
    }

    let config = load_config(&arguments)?;
    #[cfg(feature = "gpu")]
    if !arguments.cpu {
        let device = tiles::WgpuDeviceContext::request_headless()
            .context("request wgpu device, pass --cpu to pack without a GPU")?;
        return run(AtlasLoadContext::new(device, config), &arguments);
    }
    if !cfg!(feature = "gpu") && !arguments.cpu {
        warn!("built without gpu support, packing into host memory");
    }
    let device = CpuDeviceContext::new(arguments.max_texture_dimension);
    run(AtlasLoadContext::new(device, config), &arguments)
}

fn load_config(arguments: &Arguments) -> Result<TextureSizeConfig> {
    let mut config = match &arguments.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("read config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parse config {}", path.display()))?
        }
        None => TextureSizeConfig::default(),
    };
    if let Some(texture_size) = arguments.texture_size {
        if !config.set_texture_size(texture_size) {
            warn!(
                "keeping texture size {} instead of {texture_size}",
                config.texture_size()
            );
        }
    }
    Ok(config)
}

fn run<D: DeviceContext>(mut context: AtlasLoadContext<D>, arguments: &Arguments) -> Result<()> {
    let tileset = arguments
        .tileset
        .clone()
        .context("missing --tileset")?;
    let source = DirectoryAssetSource::new(&arguments.root);

    let mut summary = context
        .load(&source, tileset.clone())
        .with_context(|| format!("load tileset {}", tileset.display()))?;
    if arguments.reload {
        let before = context.tile_table();
        summary = context.reload(&source).context("reload tileset")?;
        anyhow::ensure!(
            *before == *context.tile_table(),
            "tile table changed across reload"
        );
        info!("reload reproduced {} tile entries", before.populated());
    }

    let report = build_report(&tileset, &summary, &context);
    match &arguments.output {
        Some(path) => write_report(path, &report, arguments.pretty)?,
        None => info!(
            "{} tiles at {}px in {} terrain pages",
            report.tiles_loaded,
            report.tile_size,
            report.terrain_pages.len()
        ),
    }
    Ok(())
}

fn build_report<D: DeviceContext>(
    tileset: &Path,
    summary: &LoadSummary,
    context: &AtlasLoadContext<D>,
) -> AtlasReport {
    let table = context.tile_table();
    let layers = summary.pages.layers;
    AtlasReport {
        tileset: tileset.to_path_buf(),
        tile_dir: summary.tile_dir.clone(),
        tile_size: summary.configuration.tile_size,
        mip_levels: summary.configuration.mip_levels,
        tiles_loaded: summary.tiles_loaded,
        terrain_pages: summary.pages.terrain.clone(),
        normal_page: layers.normal,
        specular_page: layers.specular,
        height_page: layers.height,
        tiles: table
            .iter()
            .map(|(ordinal, info)| TileEntry {
                ordinal,
                info: *info,
            })
            .collect(),
    }
}

fn write_report(path: &Path, report: &AtlasReport, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };
    fs::write(path, text).with_context(|| format!("write report {}", path.display()))?;
    info!("wrote tile table to {}", path.display());
    Ok(())
}

#[cfg(feature = "gpu")]
fn list_adapters() {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });

    let adapters: Vec<wgpu::Adapter> =
        pollster::block_on(instance.enumerate_adapters(wgpu::Backends::all()));
    if adapters.is_empty() {
        println!("No wgpu adapters found");
        return;
    }

    for (index, adapter) in adapters.iter().enumerate() {
        let info = adapter.get_info();
        let limits = adapter.limits();
        println!("Adapter #{index}: {} ({:?})", info.name, info.backend);
        println!(
            "  max_texture_dimension_2d: {}",
            limits.max_texture_dimension_2d
        );
    }
}
