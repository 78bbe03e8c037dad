//! PNG loading, tile decoding, and model rendering

use std::path::Path;

use image::{ImageBuffer, RgbaImage};

use crate::io::error::{GenerationError, Result};
use crate::io::manifest::TileDef;
use crate::model::tiled::TilePixels;
use crate::model::Model;

/// Load an image file and convert it to RGBA
///
/// # Errors
///
/// Returns an error if the file cannot be opened or decoded.
pub fn load_rgba(path: &Path) -> Result<RgbaImage> {
    let img = image::open(path).map_err(|e| GenerationError::ImageLoad {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(img.to_rgba8())
}

/// Decode every image file a tile declares into flat pixel grids
///
/// # Errors
///
/// Returns an error if a file cannot be decoded or its dimensions disagree
/// with the declared tile size.
pub fn load_tile_images(dir: &Path, tile: &TileDef, size: usize) -> Result<Vec<TilePixels>> {
    let mut images = Vec::with_capacity(tile.files.len());

    for file in &tile.files {
        let path = dir.join(file);
        let img = load_rgba(&path)?;
        if img.width() as usize != size || img.height() as usize != size {
            return Err(GenerationError::InvalidSourceData {
                reason: format!(
                    "tile image '{}' is {}x{}, expected {size}x{size}",
                    path.display(),
                    img.width(),
                    img.height()
                ),
            });
        }

        let mut pixels = Vec::with_capacity(size * size);
        for y in 0..size {
            for x in 0..size {
                pixels.push(*img.get_pixel(x as u32, y as u32));
            }
        }
        images.push(pixels);
    }

    Ok(images)
}

/// Render a model's current state into an image buffer
pub fn render(model: &dyn Model) -> RgbaImage {
    let width = model.width() as u32;
    let height = model.height() as u32;

    let mut img = ImageBuffer::new(width, height);
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        *pixel = model.color_at(x as usize, y as usize);
    }
    img
}

/// Render a model and save it as PNG, creating parent directories as needed
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created or the image
/// cannot be written.
pub fn export_png(model: &dyn Model, output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| GenerationError::FileSystem {
                path: parent.to_path_buf(),
                operation: "create directory",
                source: e,
            })?;
        }
    }

    render(model)
        .save(output_path)
        .map_err(|e| GenerationError::ImageExport {
            path: output_path.to_path_buf(),
            source: e,
        })
}
