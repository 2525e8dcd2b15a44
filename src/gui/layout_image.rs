// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the mfc-control project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Gas line layout picture shown next to the controllers

use anyhow::{Context, Result};
use eframe::egui;
use image::imageops::FilterType;
use log::{debug, warn};
use std::path::Path;

/// Size of `(width, height)` scaled to fit a `max_size` square, keeping the
/// aspect ratio. The longer side becomes `max_size`.
pub fn fit_within(width: u32, height: u32, max_size: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width, height);
    }
    let (width, height, max) = (u64::from(width), u64::from(height), u64::from(max_size));
    let (w, h) = if width > height {
        (max, height * max / width)
    } else {
        (width * max / height, max)
    };
    (w.max(1) as u32, h.max(1) as u32)
}

/// Decode and resize the picture at `path` with Lanczos3 filtering
pub fn load_layout_image(path: &Path, max_size: u32) -> Result<egui::ColorImage> {
    let picture = image::open(path)
        .with_context(|| format!("Failed to open layout image {}", path.display()))?;
    let (width, height) = fit_within(picture.width(), picture.height(), max_size);
    debug!(
        "Resizing layout image from {}x{} to {}x{}",
        picture.width(),
        picture.height(),
        width,
        height
    );
    let resized = picture
        .resize_exact(width, height, FilterType::Lanczos3)
        .to_rgba8();
    let size = [resized.width() as usize, resized.height() as usize];
    Ok(egui::ColorImage::from_rgba_unmultiplied(
        size,
        resized.as_raw(),
    ))
}

/// Load the optional layout picture, logging and skipping any failure
pub fn try_load_layout_image(path: Option<&Path>, max_size: u32) -> Option<egui::ColorImage> {
    let path = path?;
    match load_layout_image(path, max_size) {
        Ok(image) => Some(image),
        Err(e) => {
            warn!("Layout image skipped: {:#}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_fit_within_keeps_aspect_ratio() {
        assert_eq!(fit_within(800, 400, 400), (400, 200));
        assert_eq!(fit_within(300, 600, 400), (200, 400));
        assert_eq!(fit_within(100, 100, 400), (400, 400));
    }

    #[test]
    fn test_missing_image_is_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.png");
        assert!(try_load_layout_image(Some(&path), 400).is_none());
        assert!(try_load_layout_image(None, 400).is_none());
    }

    #[test]
    fn test_png_is_resized() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("layout.png");
        image::RgbaImage::from_pixel(80, 40, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();
        let image = load_layout_image(&path, 400).unwrap();
        assert_eq!(image.size, [400, 200]);
    }
}
