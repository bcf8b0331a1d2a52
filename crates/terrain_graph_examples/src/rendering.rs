//! PNG import and export for the example binaries.
use std::path::Path;

use anyhow::Context;
use glam::DVec4;
use image::{GrayImage, Luma, Rgba, RgbaImage};
use terrain_graph::maps::{IntensityMap, MapSize, VectorMap};
use tracing_subscriber::EnvFilter;

/// Installs a `fmt` subscriber. `RUST_LOG` overrides the default `info` level.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn dimensions(size: MapSize) -> anyhow::Result<(u32, u32)> {
    Ok((
        u32::try_from(size.width()).context("map too wide for PNG")?,
        u32::try_from(size.height()).context("map too tall for PNG")?,
    ))
}

#[inline]
fn to_byte(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Writes an intensity map as 8-bit greyscale, stretched to its observed range.
pub fn intensity_to_png(map: &IntensityMap, path: impl AsRef<Path>) -> anyhow::Result<()> {
    let path = path.as_ref();
    let (w, h) = dimensions(map.size())?;
    let (lo, hi) = map.min_max();
    let range = if hi - lo > f64::EPSILON { hi - lo } else { 1.0 };
    let img = GrayImage::from_fn(w, h, |x, y| {
        let v = map.get(x as usize, y as usize).unwrap_or(lo);
        Luma([to_byte((v - lo) / range)])
    });
    img.save(path)
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

/// Writes a vector map as RGBA. Signed normals are remapped from `[-1, 1]` when `signed` is set.
pub fn vector_to_png(map: &VectorMap, path: impl AsRef<Path>, signed: bool) -> anyhow::Result<()> {
    let path = path.as_ref();
    let (w, h) = dimensions(map.size())?;
    let img = RgbaImage::from_fn(w, h, |x, y| {
        let mut v = map.get(x as usize, y as usize).unwrap_or(DVec4::ZERO);
        if signed {
            v = (v.truncate() * 0.5 + 0.5).extend(v.w);
        }
        Rgba([to_byte(v.x), to_byte(v.y), to_byte(v.z), to_byte(v.w)])
    });
    img.save(path)
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

/// Decodes an image file into a vector map with components in `[0, 1]`.
pub fn load_png_texture(path: impl AsRef<Path>) -> anyhow::Result<VectorMap> {
    let path = path.as_ref();
    let img = image::open(path)
        .with_context(|| format!("reading {}", path.display()))?
        .to_rgba8();
    let (w, h) = img.dimensions();
    let size = MapSize::new(w as usize, h as usize)?;
    Ok(VectorMap::from_fn(size, |x, y| {
        let [r, g, b, a] = img.get_pixel(x as u32, y as u32).0;
        DVec4::new(r as f64, g as f64, b as f64, a as f64) / 255.0
    }))
}
