//! # Image Block Renderer
//!
//! Draws a caption line, then the image scaled to the largest size that fits
//! the configured box with its aspect ratio intact, centred horizontally.
//! An image that could not be loaded becomes a fixed-height placeholder box
//! that says why.

use super::{LayoutElement, Stroke};
use crate::config::ReportConfig;
use crate::fetch::ImageSet;
use crate::font::StandardFont;
use crate::image_loader::ImageError;
use crate::model::ImageBlock;

/// Drawn size and horizontal offset of an aspect-fitted image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fit {
    pub width: f64,
    pub height: f64,
    /// Offset from the content-area left edge that centres the image.
    pub offset_x: f64,
}

/// Scale an intrinsic `(image_w, image_h)` into `(max_w, max_h)`.
pub fn aspect_fit(image_w: f64, image_h: f64, max_w: f64, max_h: f64, content_width: f64) -> Fit {
    if image_w <= 0.0 || image_h <= 0.0 {
        return Fit {
            width: 0.0,
            height: 0.0,
            offset_x: content_width / 2.0,
        };
    }
    let scale = (max_w / image_w).min(max_h / image_h);
    let width = image_w * scale;
    let height = image_h * scale;
    Fit {
        width,
        height,
        offset_x: (content_width - width) / 2.0,
    }
}

fn caption_height(config: &ReportConfig) -> f64 {
    config.typography.caption_size * config.typography.line_height + 4.0
}

fn bounding_box(width: f64, config: &ReportConfig) -> (f64, f64) {
    (config.image.max_width.min(width), config.image.max_height)
}

fn fit_for(block: &ImageBlock, images: &ImageSet, width: f64, config: &ReportConfig) -> Option<Fit> {
    let image = images.get(&block.source_url).ok()?;
    let (max_w, max_h) = bounding_box(width, config);
    Some(aspect_fit(
        image.width_px as f64,
        image.height_px as f64,
        max_w,
        max_h,
        width,
    ))
}

/// Caption plus the fitted image, or plus the placeholder box.
pub fn measure(block: &ImageBlock, images: &ImageSet, width: f64, config: &ReportConfig) -> f64 {
    let body = match fit_for(block, images, width, config) {
        Some(fit) => fit.height,
        None => config.image.placeholder_height,
    };
    caption_height(config) + body
}

pub fn draw(
    block: &ImageBlock,
    images: &ImageSet,
    x: f64,
    y: f64,
    width: f64,
    config: &ReportConfig,
) -> Vec<LayoutElement> {
    let typo = &config.typography;
    let caption_h = caption_height(config);
    let font = StandardFont::HelveticaBold;
    let caption = font.truncate_to_width(&block.caption, width, typo.caption_size);
    let mut elements = vec![LayoutElement::text(
        x,
        y,
        caption_h,
        caption,
        font,
        typo.caption_size,
        typo.text_color,
    )];
    let body_y = y + caption_h;

    match images.get(&block.source_url) {
        Ok(image) => {
            let (max_w, max_h) = bounding_box(width, config);
            let fit = aspect_fit(
                image.width_px as f64,
                image.height_px as f64,
                max_w,
                max_h,
                width,
            );
            elements.push(LayoutElement {
                x: x + fit.offset_x,
                y: body_y,
                width: fit.width,
                height: fit.height,
                draw: super::DrawCommand::Image { image },
                children: Vec::new(),
            });
        }
        Err(reason) => elements.extend(placeholder(&reason, x, body_y, width, config)),
    }
    elements
}

fn placeholder(
    reason: &ImageError,
    x: f64,
    y: f64,
    width: f64,
    config: &ReportConfig,
) -> Vec<LayoutElement> {
    let style = &config.image;
    let typo = &config.typography;
    let (box_w, _) = bounding_box(width, config);
    let box_x = x + (width - box_w) / 2.0;
    let h = style.placeholder_height;
    let line_h = typo.caption_size * typo.line_height;
    let mid = y + h / 2.0;

    let detail = StandardFont::Helvetica.truncate_to_width(
        &reason.to_string(),
        box_w - 20.0,
        typo.caption_size,
    );
    vec![
        LayoutElement::rect(
            box_x,
            y,
            box_w,
            h,
            Some(style.placeholder_fill),
            Some(Stroke {
                color: config.table.border_color,
                width: config.table.border_width,
            }),
        ),
        LayoutElement::centered_text(
            box_x,
            box_w,
            mid - line_h,
            line_h,
            "Map image unavailable".to_string(),
            StandardFont::HelveticaBold,
            typo.caption_size,
            typo.text_color,
        ),
        LayoutElement::centered_text(
            box_x,
            box_w,
            mid,
            line_h,
            detail,
            StandardFont::Helvetica,
            typo.caption_size,
            typo.text_color,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_loader::{ImagePixelData, LoadedImage};
    use crate::layout::DrawCommand;
    use proptest::prelude::*;

    fn loaded(w: u32, h: u32) -> LoadedImage {
        LoadedImage {
            pixel_data: ImagePixelData::Decoded {
                rgb: vec![0; (w * h * 3) as usize],
                alpha: None,
            },
            width_px: w,
            height_px: h,
        }
    }

    fn block(url: &str) -> ImageBlock {
        ImageBlock {
            source_url: url.to_string(),
            caption: "Satellite View".to_string(),
        }
    }

    #[test]
    fn wide_image_is_width_bound() {
        let fit = aspect_fit(1600.0, 400.0, 460.0, 270.0, 480.0);
        assert!((fit.width - 460.0).abs() < 1e-9);
        assert!((fit.height - 115.0).abs() < 1e-9);
        assert!((fit.offset_x - 10.0).abs() < 1e-9);
    }

    #[test]
    fn tall_image_is_height_bound_and_centred() {
        let fit = aspect_fit(300.0, 600.0, 460.0, 270.0, 480.0);
        assert!((fit.height - 270.0).abs() < 1e-9);
        assert!((fit.width - 135.0).abs() < 1e-9);
        assert!((fit.offset_x - 172.5).abs() < 1e-9);
    }

    #[test]
    fn loaded_image_draws_below_caption() {
        let config = ReportConfig::default();
        let mut images = ImageSet::new();
        images.insert("map.png", Ok(loaded(640, 320)));
        let b = block("map.png");

        let elements = draw(&b, &images, 50.0, 100.0, 480.0, &config);
        assert_eq!(elements.len(), 2);
        let img = &elements[1];
        assert!(matches!(img.draw, DrawCommand::Image { .. }));
        assert!((img.y - (100.0 + caption_height(&config))).abs() < 1e-9);

        let total = img.y + img.height - 100.0;
        assert!((measure(&b, &images, 480.0, &config) - total).abs() < 1e-9);
    }

    #[test]
    fn failed_image_becomes_placeholder() {
        let config = ReportConfig::default();
        let mut images = ImageSet::new();
        images.insert("down.png", Err(ImageError::Status(404)));
        let b = block("down.png");

        let h = measure(&b, &images, 480.0, &config);
        assert!((h - (caption_height(&config) + config.image.placeholder_height)).abs() < 1e-9);

        let elements = draw(&b, &images, 50.0, 100.0, 480.0, &config);
        let texts: Vec<&str> = elements
            .iter()
            .filter_map(|el| match &el.draw {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert!(texts.contains(&"Map image unavailable"));
        assert!(texts.iter().any(|t| t.contains("404")));
    }

    proptest! {
        #[test]
        fn fit_preserves_aspect_and_bounds(
            w in 1u32..5000,
            h in 1u32..5000,
            max_w in 10.0f64..600.0,
            max_h in 10.0f64..600.0,
        ) {
            let fit = aspect_fit(w as f64, h as f64, max_w, max_h, 600.0);
            prop_assert!(fit.width <= max_w + 1e-9);
            prop_assert!(fit.height <= max_h + 1e-9);
            let ratio = w as f64 / h as f64;
            prop_assert!((fit.width / fit.height - ratio).abs() <= ratio * 1e-9);
            // One side touches the box.
            prop_assert!((fit.width - max_w).abs() < 1e-6 || (fit.height - max_h).abs() < 1e-6);
        }
    }
}
