use image::RgbaImage;
use image::imageops::{self, FilterType};

/// Level 0 followed by successively halved copies, `levels` images in total.
pub(crate) fn mip_chain(level0: RgbaImage, levels: u32) -> Vec<RgbaImage> {
    let mut chain = Vec::with_capacity(levels.max(1) as usize);
    chain.push(level0);
    for _ in 1..levels {
        let Some(previous) = chain.last() else {
            break;
        };
        let width = (previous.width() / 2).max(1);
        let height = (previous.height() / 2).max(1);
        let next = imageops::resize(previous, width, height, FilterType::Triangle);
        chain.push(next);
    }
    chain
}
