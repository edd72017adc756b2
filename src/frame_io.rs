//! Frame and parameter-file I/O.
//!
//! Images cross the clip boundary as 8-bit RGBA with y=0 at the
//! bottom, so files are flipped vertically on both read and write.
//! JPEG output drops the alpha channel.

use anyhow::{Context, Result, anyhow, bail};
use image::{DynamicImage, RgbaImage, imageops};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Decode an image file to bottom-up RGBA bytes.
pub fn read_image(path: &Path) -> Result<(u32, u32, Vec<u8>)> {
    let img = image::open(path)
        .with_context(|| format!("Reading image \"{}\"", path.display()))?;
    let rgba = imageops::flip_vertical(&img.to_rgba8());
    let (width, height) = rgba.dimensions();
    Ok((width, height, rgba.into_raw()))
}

/// Encode bottom-up RGBA bytes to a PNG or JPEG file.
pub fn write_image(path: &Path, width: u32, height: u32, rgba: &[u8]) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    let buffer = RgbaImage::from_raw(width, height, rgba.to_vec()).ok_or(anyhow!(
        "Pixel buffer does not match {}x{}",
        width,
        height
    ))?;
    let flipped = imageops::flip_vertical(&buffer);
    match ext.as_str() {
        "png" => flipped.save(path),
        "jpg" | "jpeg" => DynamicImage::ImageRgba8(flipped).to_rgb8().save(path),
        _ => bail!("Output filetype needs to be PNG or JPG: \"{}\"", path.display()),
    }
    .with_context(|| format!("Writing image \"{}\"", path.display()))
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ImagePaths {
    pub required: BTreeMap<String, Option<String>>,
    pub optional: BTreeMap<String, Option<String>>,
}

/// A render job: which plugin to run, parameter values, the frame
/// size, and the image path per clip. The `Output` clip is always
/// listed in `required` and names the file to write.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct RenderJob {
    pub bundle: String,
    pub plugin: String,
    pub context: String,
    pub parameters: BTreeMap<String, serde_json::Value>,
    pub frame_size: FrameSize,
    pub image_paths: ImagePaths,
}

pub fn read_params(path: &Path) -> Result<RenderJob> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Reading file \"{}\"", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Parsing JSON \"{}\"", path.display()))
}

pub fn write_params(path: &Path, job: &RenderJob) -> Result<()> {
    fs::write(path, serde_json::to_string_pretty(job)?)
        .with_context(|| format!("Writing file \"{}\"", path.display()))
}
