//! # Image Loading and Decoding
//!
//! Turns map snapshot bytes into embeddable images. JPEG snapshots are
//! embedded as-is; PNG snapshots are decoded to RGB with a separate alpha
//! plane for the soft mask. Local sources (data URIs, paths, bare base64)
//! are read here too.

use std::io::Cursor;

use thiserror::Error;

/// Why a map image could not be used. Never aborts a render.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ImageError {
    #[error("request failed: {0}")]
    Fetch(String),
    #[error("server responded with status {0}")]
    Status(u16),
    #[error("could not decode image: {0}")]
    Decode(String),
    #[error("unsupported image format (expected JPEG or PNG)")]
    Unsupported,
}

/// A map snapshot, ready to embed.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedImage {
    pub pixel_data: ImagePixelData,
    pub width_px: u32,
    pub height_px: u32,
}

/// Pixel payload in the shape the PDF writer embeds.
#[derive(Debug, Clone, PartialEq)]
pub enum ImagePixelData {
    /// Untouched JPEG stream (DCTDecode).
    Jpeg {
        data: Vec<u8>,
        color_space: JpegColorSpace,
    },
    Decoded {
        /// Three bytes per pixel, row-major.
        rgb: Vec<u8>,
        /// One byte per pixel, present only for translucent images.
        alpha: Option<Vec<u8>>,
    },
}

/// JPEG color space for the PDF /ColorSpace entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JpegColorSpace {
    DeviceRGB,
    DeviceGray,
}

/// True when `src` names a network location rather than local data.
pub fn is_remote(src: &str) -> bool {
    src.starts_with("http://") || src.starts_with("https://")
}

/// Bytes for a source that needs no network: a `data:image/...;base64,`
/// URI, a path starting with `/`, `./` or `../`, or bare base64.
pub fn read_local_bytes(src: &str) -> Result<Vec<u8>, ImageError> {
    if let Some(uri) = src.strip_prefix("data:image/") {
        let (_, payload) = uri
            .split_once(',')
            .ok_or_else(|| ImageError::Decode("data URI has no payload".to_string()))?;
        return base64_decode(payload);
    }

    // Base64 may contain '/', so a path must carry an explicit prefix.
    let is_path = ["/", "./", "../"].iter().any(|p| src.starts_with(p));
    if is_path {
        return std::fs::read(src).map_err(|e| ImageError::Fetch(format!("{}: {}", src, e)));
    }

    base64_decode(src)
}

fn base64_decode(input: &str) -> Result<Vec<u8>, ImageError> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(input.trim())
        .map_err(|e| ImageError::Decode(format!("base64: {}", e)))
}

/// Container formats a map snapshot may arrive in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sniffed {
    Jpeg,
    Png,
}

fn sniff(data: &[u8]) -> Option<Sniffed> {
    if is_jpeg(data) {
        Some(Sniffed::Jpeg)
    } else if is_png(data) {
        Some(Sniffed::Png)
    } else {
        None
    }
}

fn is_jpeg(data: &[u8]) -> bool {
    data.starts_with(&[0xFF, 0xD8])
}

fn is_png(data: &[u8]) -> bool {
    data.starts_with(&[0x89, b'P', b'N', b'G'])
}

/// Sniff the container and decode it into something the PDF writer embeds.
///
/// JPEG bytes are kept as they are; only the header is read. PNG is decoded
/// to pixels.
pub fn decode_image_bytes(data: &[u8]) -> Result<LoadedImage, ImageError> {
    if data.len() < 4 {
        return Err(ImageError::Decode("image data too short".to_string()));
    }

    let image = match sniff(data).ok_or(ImageError::Unsupported)? {
        Sniffed::Jpeg => jpeg_passthrough(data)?,
        Sniffed::Png => png_pixels(data)?,
    };

    if image.width_px == 0 || image.height_px == 0 {
        return Err(ImageError::Decode("image has zero size".to_string()));
    }
    Ok(image)
}

fn reader(data: &[u8], format: image::ImageFormat) -> image::io::Reader<Cursor<&[u8]>> {
    let mut reader = image::io::Reader::new(Cursor::new(data));
    reader.set_format(format);
    reader
}

fn jpeg_passthrough(data: &[u8]) -> Result<LoadedImage, ImageError> {
    let (width_px, height_px) = reader(data, image::ImageFormat::Jpeg)
        .into_dimensions()
        .map_err(|e| ImageError::Decode(format!("JPEG header: {}", e)))?;

    Ok(LoadedImage {
        pixel_data: ImagePixelData::Jpeg {
            data: data.to_vec(),
            color_space: jpeg_color_space(data),
        },
        width_px,
        height_px,
    })
}

/// Walk the marker segments up to the first start-of-frame and read its
/// component count. One component is grayscale, anything else RGB.
fn jpeg_color_space(data: &[u8]) -> JpegColorSpace {
    let mut pos = 2;
    while let (Some(&0xFF), Some(&marker)) = (data.get(pos), data.get(pos + 1)) {
        let start_of_frame =
            matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF);
        if start_of_frame {
            // marker(2) length(2) precision(1) height(2) width(2) components(1)
            return match data.get(pos + 9) {
                Some(1) => JpegColorSpace::DeviceGray,
                _ => JpegColorSpace::DeviceRGB,
            };
        }
        match (data.get(pos + 2), data.get(pos + 3)) {
            (Some(&hi), Some(&lo)) => pos += 2 + usize::from(u16::from_be_bytes([hi, lo])),
            _ => break,
        }
    }
    JpegColorSpace::DeviceRGB
}

/// Decode to RGBA, then split into an RGB plane and an alpha plane. The alpha
/// plane is dropped when every pixel is opaque.
fn png_pixels(data: &[u8]) -> Result<LoadedImage, ImageError> {
    let rgba = reader(data, image::ImageFormat::Png)
        .decode()
        .map_err(|e| ImageError::Decode(format!("PNG: {}", e)))?
        .to_rgba8();
    let (width_px, height_px) = rgba.dimensions();

    let raw = rgba.into_raw();
    let mut rgb = Vec::with_capacity(raw.len() / 4 * 3);
    let mut alpha = Vec::with_capacity(raw.len() / 4);
    for px in raw.chunks_exact(4) {
        rgb.extend_from_slice(&px[..3]);
        alpha.push(px[3]);
    }
    let alpha = alpha.iter().any(|&a| a != u8::MAX).then_some(alpha);

    Ok(LoadedImage {
        pixel_data: ImagePixelData::Decoded { rgb, alpha },
        width_px,
        height_px,
    })
}
