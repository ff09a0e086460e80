//! # PDF Serializer
//!
//! Takes stamped layout pages and writes a PDF 1.7 file by hand.
//!
//! Text is set in the standard Type1 Helvetica faces with WinAnsi encoding,
//! so no font program is embedded. Content streams are Flate-compressed.
//! JPEG images pass through with DCTDecode; decoded images are written as
//! Flate RGB with an optional SMask.
//!
//! ## PDF Structure (simplified)
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- catalog
//! 2 0 obj ... endobj  <- page tree
//! ...                 <- fonts, images, content streams, pages, info
//! xref                <- byte offsets of each object
//! trailer             <- points to the root object
//! %%EOF
//! ```

use std::fmt::Write as FmtWrite;
use std::io::Write as IoWrite;
use std::sync::Arc;

use chrono::NaiveDateTime;
use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::error::FolioError;
use crate::font::StandardFont;
use crate::image_loader::{ImagePixelData, JpegColorSpace, LoadedImage};
use crate::layout::{DrawCommand, LayoutElement, LayoutPage};
use crate::model::Color;

const FLATE_LEVEL: u8 = 6;

const PRODUCER: &str = concat!("folio ", env!("CARGO_PKG_VERSION"));

/// Document information dictionary entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PdfMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creation_date: Option<NaiveDateTime>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PdfWriter;

/// Tracks allocated PDF objects during writing.
struct PdfBuilder {
    objects: Vec<PdfObject>,
    /// Object id of each font in [`StandardFont::ALL`] order.
    font_objects: Vec<usize>,
    /// One XObject per distinct image, in first-use order (/Im0, /Im1, ...).
    images: Vec<RegisteredImage>,
}

struct PdfObject {
    data: Vec<u8>,
}

struct RegisteredImage {
    source: *const LoadedImage,
    obj_id: usize,
}

impl PdfBuilder {
    fn image_index(&self, image: &Arc<LoadedImage>) -> Option<usize> {
        let ptr = Arc::as_ptr(image);
        self.images.iter().position(|img| img.source == ptr)
    }

    fn push(&mut self, data: Vec<u8>) -> usize {
        let id = self.objects.len();
        self.objects.push(PdfObject { data });
        id
    }

    /// Push a stream object. `entries` is everything in the stream
    /// dictionary except `/Length`.
    fn push_stream(&mut self, entries: &str, payload: &[u8]) -> usize {
        let mut data = format!("<< {} /Length {} >>\nstream\n", entries, payload.len()).into_bytes();
        data.extend_from_slice(payload);
        data.extend_from_slice(b"\nendstream");
        self.push(data)
    }
}

/// Dictionary entries shared by every image XObject.
fn image_entries(image: &LoadedImage, color_space: &str, filter: &str) -> String {
    format!(
        "/Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace /{} \
         /BitsPerComponent 8 /Filter /{}",
        image.width_px, image.height_px, color_space, filter
    )
}

impl PdfWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write stamped pages to a PDF byte vector.
    pub fn write(&self, pages: &[LayoutPage], metadata: &PdfMetadata) -> Result<Vec<u8>, FolioError> {
        if pages.is_empty() {
            return Err(FolioError::RenderSink("no pages to write".to_string()));
        }

        let mut builder = PdfBuilder {
            objects: Vec::new(),
            font_objects: Vec::new(),
            images: Vec::new(),
        };

        // 0 = placeholder (PDF objects are 1-indexed), 1 = Catalog, 2 = Pages
        builder.push(Vec::new());
        builder.push(Vec::new());
        builder.push(Vec::new());

        for font in StandardFont::ALL {
            let dict = format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                font.pdf_name()
            );
            let id = builder.push(dict.into_bytes());
            builder.font_objects.push(id);
        }

        for page in pages {
            self.register_images(&mut builder, &page.elements)?;
        }

        let mut page_obj_ids: Vec<usize> = Vec::new();
        for page in pages {
            let content = self.build_content_stream(page, &builder);
            let compressed = compress_to_vec_zlib(content.as_bytes(), FLATE_LEVEL);
            let content_obj_id = builder.push_stream("/Filter /FlateDecode", &compressed);

            let resources = self.build_resources(page, &builder);
            let page_dict = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << {} >> >>",
                page.width, page.height, content_obj_id, resources
            );
            page_obj_ids.push(builder.push(page_dict.into_bytes()));
        }

        builder.objects[1].data = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();

        let kids: String = page_obj_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        builder.objects[2].data = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            page_obj_ids.len()
        )
        .into_bytes();

        let info = Self::build_info(metadata);
        let info_obj_id = builder.push(info.into_bytes());

        self.serialize(&builder, info_obj_id)
    }

    fn build_info(metadata: &PdfMetadata) -> String {
        let mut info = String::from("<< ");
        let entries = [
            ("Title", &metadata.title),
            ("Author", &metadata.author),
            ("Subject", &metadata.subject),
        ];
        for (key, value) in entries {
            if let Some(value) = value {
                let _ = write!(info, "/{} ({}) ", key, Self::encode_text(value));
            }
        }
        if let Some(date) = metadata.creation_date {
            let _ = write!(info, "/CreationDate (D:{}) ", date.format("%Y%m%d%H%M%S"));
        }
        let _ = write!(info, "/Producer ({}) >>", PRODUCER);
        info
    }

    /// Resource dictionary for one page: every font, plus the images it uses.
    fn build_resources(&self, page: &LayoutPage, builder: &PdfBuilder) -> String {
        let fonts = builder
            .font_objects
            .iter()
            .enumerate()
            .map(|(i, id)| format!("/F{} {} 0 R", i, id))
            .collect::<Vec<_>>()
            .join(" ");

        let mut used: Vec<usize> = Vec::new();
        collect_image_indices(&page.elements, builder, &mut used);
        used.sort_unstable();
        used.dedup();

        if used.is_empty() {
            format!("/Font << {} >>", fonts)
        } else {
            let xobjects = used
                .iter()
                .map(|idx| format!("/Im{} {} 0 R", idx, builder.images[*idx].obj_id))
                .collect::<Vec<_>>()
                .join(" ");
            format!("/Font << {} >> /XObject << {} >>", fonts, xobjects)
        }
    }

    /// Content first, then the footer band on top.
    fn build_content_stream(&self, page: &LayoutPage, builder: &PdfBuilder) -> String {
        let mut stream = String::new();
        for element in page.elements.iter().chain(&page.footer) {
            self.write_element(&mut stream, element, page.height, builder);
        }
        stream
    }

    /// Write a single layout element as PDF operators.
    fn write_element(
        &self,
        stream: &mut String,
        element: &LayoutElement,
        page_height: f64,
        builder: &PdfBuilder,
    ) {
        // PDF's origin is bottom-left; layout y grows downward.
        let x = element.x;
        let y = page_height - element.y - element.height;
        let w = element.width;
        let h = element.height;

        match &element.draw {
            DrawCommand::Rect { fill, stroke } => {
                if let Some(fill) = fill {
                    let _ = write!(
                        stream,
                        "q\n{} rg\n{:.2} {:.2} {:.2} {:.2} re\nf\nQ\n",
                        color_operands(fill),
                        x,
                        y,
                        w,
                        h
                    );
                }
                if let Some(stroke) = stroke {
                    if stroke.width > 0.0 {
                        let _ = write!(
                            stream,
                            "q\n{} RG\n{:.2} w\n{:.2} {:.2} {:.2} {:.2} re\nS\nQ\n",
                            color_operands(&stroke.color),
                            stroke.width,
                            x,
                            y,
                            w,
                            h
                        );
                    }
                }
            }

            DrawCommand::Text {
                text,
                font,
                size,
                color,
                baseline,
            } => {
                let _ = write!(
                    stream,
                    "BT\n{} rg\n/F{} {:.2} Tf\n{:.2} {:.2} Td\n({}) Tj\nET\n",
                    color_operands(color),
                    font.resource_index(),
                    size,
                    x,
                    page_height - baseline,
                    Self::encode_text(text)
                );
            }

            DrawCommand::Image { image } => {
                if let Some(idx) = builder.image_index(image) {
                    let _ = write!(
                        stream,
                        "q\n{:.2} 0 0 {:.2} {:.2} {:.2} cm\n/Im{} Do\nQ\n",
                        w, h, x, y, idx
                    );
                }
            }

            DrawCommand::Clip => {
                let _ = write!(stream, "q\n{:.2} {:.2} {:.2} {:.2} re\nW n\n", x, y, w, h);
                for child in &element.children {
                    self.write_element(stream, child, page_height, builder);
                }
                let _ = write!(stream, "Q\n");
            }
        }
    }

    /// Create one XObject per distinct image referenced by `elements`.
    fn register_images(
        &self,
        builder: &mut PdfBuilder,
        elements: &[LayoutElement],
    ) -> Result<(), FolioError> {
        for element in elements {
            match &element.draw {
                DrawCommand::Image { image } => {
                    if builder.image_index(image).is_none() {
                        let obj_id = Self::write_image_xobject(builder, image)?;
                        builder.images.push(RegisteredImage {
                            source: Arc::as_ptr(image),
                            obj_id,
                        });
                    }
                }
                DrawCommand::Clip => self.register_images(builder, &element.children)?,
                _ => {}
            }
        }
        Ok(())
    }

    /// One XObject for the image, plus a soft-mask XObject when it carries
    /// alpha. Returns the id the page resources refer to.
    fn write_image_xobject(builder: &mut PdfBuilder, image: &LoadedImage) -> Result<usize, FolioError> {
        if image.width_px == 0 || image.height_px == 0 {
            return Err(FolioError::RenderSink("image has zero size".to_string()));
        }

        match &image.pixel_data {
            ImagePixelData::Jpeg { data, color_space } => {
                let space = match color_space {
                    JpegColorSpace::DeviceRGB => "DeviceRGB",
                    JpegColorSpace::DeviceGray => "DeviceGray",
                };
                Ok(builder.push_stream(&image_entries(image, space, "DCTDecode"), data))
            }

            ImagePixelData::Decoded { rgb, alpha } => {
                let expected = image.width_px as usize * image.height_px as usize * 3;
                if rgb.len() != expected {
                    return Err(FolioError::RenderSink(format!(
                        "image data holds {} bytes, expected {}",
                        rgb.len(),
                        expected
                    )));
                }

                // The soft mask goes first so the colour image can point at it.
                let mut entries = image_entries(image, "DeviceRGB", "FlateDecode");
                if let Some(alpha) = alpha {
                    let mask = compress_to_vec_zlib(alpha, FLATE_LEVEL);
                    let mask_entries = image_entries(image, "DeviceGray", "FlateDecode");
                    let mask_id = builder.push_stream(&mask_entries, &mask);
                    let _ = write!(entries, " /SMask {} 0 R", mask_id);
                }
                let pixels = compress_to_vec_zlib(rgb, FLATE_LEVEL);
                Ok(builder.push_stream(&entries, &pixels))
            }
        }
    }

    /// Encode text as the body of a PDF literal string in WinAnsiEncoding.
    ///
    /// Characters outside WinAnsi become `?`. Bytes outside printable ASCII
    /// are written as octal escapes.
    fn encode_text(s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        for ch in s.chars() {
            // Tabs are measured as spaces, so they are written as spaces.
            let ch = if ch == '\t' { ' ' } else { ch };
            let b = Self::unicode_to_winansi(ch).unwrap_or(b'?');
            match b {
                b'\\' => out.push_str("\\\\"),
                b'(' => out.push_str("\\("),
                b')' => out.push_str("\\)"),
                0x20..=0x7E => out.push(b as char),
                _ => {
                    let _ = write!(out, "\\{:03o}", b);
                }
            }
        }
        out
    }

    /// WinAnsi (Windows-1252) byte for `ch`. Latin-1 maps to itself; the
    /// 0x80..=0x9F block is looked up.
    fn unicode_to_winansi(ch: char) -> Option<u8> {
        match u32::from(ch) {
            cp @ (0x20..=0x7E | 0xA0..=0xFF) => Some(cp as u8),
            _ => WINANSI_HIGH
                .iter()
                .find(|(c, _)| *c == ch)
                .map(|(_, byte)| *byte),
        }
    }

    /// Serialize all objects into the final PDF byte stream.
    fn serialize(&self, builder: &PdfBuilder, info_obj_id: usize) -> Result<Vec<u8>, FolioError> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; builder.objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, obj) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            write!(output, "{} 0 obj\n", i)?;
            output.extend_from_slice(&obj.data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        write!(output, "xref\n0 {}\n", builder.objects.len())?;
        write!(output, "0000000000 65535 f \n")?;
        for offset in offsets.iter().skip(1) {
            write!(output, "{:010} 00000 n \n", offset)?;
        }

        write!(
            output,
            "trailer\n<< /Size {} /Root 1 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            builder.objects.len(),
            info_obj_id,
            xref_offset
        )?;

        Ok(output)
    }
}

/// Windows-1252 code points 0x80..=0x9F that differ from Latin-1.
const WINANSI_HIGH: [(char, u8); 27] = [
    ('€', 0x80),
    ('‚', 0x82),
    ('ƒ', 0x83),
    ('„', 0x84),
    ('…', 0x85),
    ('†', 0x86),
    ('‡', 0x87),
    ('ˆ', 0x88),
    ('‰', 0x89),
    ('Š', 0x8A),
    ('‹', 0x8B),
    ('Œ', 0x8C),
    ('Ž', 0x8E),
    ('\u{2018}', 0x91),
    ('\u{2019}', 0x92),
    ('\u{201C}', 0x93),
    ('\u{201D}', 0x94),
    ('•', 0x95),
    ('\u{2013}', 0x96),
    ('\u{2014}', 0x97),
    ('˜', 0x98),
    ('™', 0x99),
    ('š', 0x9A),
    ('›', 0x9B),
    ('œ', 0x9C),
    ('ž', 0x9E),
    ('Ÿ', 0x9F),
];

fn color_operands(c: &Color) -> String {
    format!("{:.3} {:.3} {:.3}", c.r, c.g, c.b)
}

fn collect_image_indices(elements: &[LayoutElement], builder: &PdfBuilder, out: &mut Vec<usize>) {
    for element in elements {
        match &element.draw {
            DrawCommand::Image { image } => {
                if let Some(idx) = builder.image_index(image) {
                    out.push(idx);
                }
            }
            DrawCommand::Clip => collect_image_indices(&element.children, builder, out),
            _ => {}
        }
    }
}
