//! Printable document model and the PDF writer

use printpdf::image_crate::ImageDecoder;
use printpdf::image_crate::codecs::png::PngDecoder;
use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Point,
};
use std::io::Cursor;

use crate::error::{Result, SipocError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Title(String),
    /// Right-aligned note such as the report date
    Stamp(String),
    Heading(String),
    Line(String),
    /// PNG bytes
    Image(Vec<u8>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintableDocument {
    pub title: String,
    pub pages: Vec<Page>,
}

impl PrintableDocument {
    pub fn has_image(&self) -> bool {
        self.pages
            .iter()
            .flat_map(|p| &p.blocks)
            .any(|b| matches!(b, Block::Image(_)))
    }
}

pub trait PrintableWriter: Send + Sync {
    /// File extension without the dot
    fn extension(&self) -> &'static str;

    fn write(&self, document: &PrintableDocument) -> Result<Vec<u8>>;
}

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 10.0;
const IMAGE_WIDTH: f32 = 180.0;
const IMAGE_DPI: f32 = 300.0;
const WRAP_COLUMNS: usize = 90;
const CELL_HEIGHT: f32 = 10.0;
const PT_TO_MM: f32 = 0.3528;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Center,
    Right,
}

/// A4 PDF with the built-in Helvetica faces
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfWriter;

impl PrintableWriter for PdfWriter {
    fn extension(&self) -> &'static str {
        "pdf"
    }

    fn write(&self, document: &PrintableDocument) -> Result<Vec<u8>> {
        let (doc, page, layer) = PdfDocument::new(
            latin1(&document.title),
            Mm(PAGE_WIDTH),
            Mm(PAGE_HEIGHT),
            "Layer 1",
        );
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;

        let mut cursor = PageCursor {
            layer: doc.get_page(page).get_layer(layer),
            doc: &doc,
            y: PAGE_HEIGHT - MARGIN,
        };

        for (index, page) in document.pages.iter().enumerate() {
            if index > 0 {
                cursor.new_page();
            }
            for block in &page.blocks {
                match block {
                    Block::Title(text) => cursor.cell(text, 14.0, &bold, Align::Center, true),
                    Block::Stamp(text) => cursor.cell(text, 12.0, &regular, Align::Right, false),
                    Block::Heading(text) => {
                        cursor.cell(text, 12.0, &regular, Align::Center, true)
                    }
                    Block::Line(text) => {
                        cursor.gap(3.0);
                        for wrapped in textwrap::wrap(&latin1(text), WRAP_COLUMNS) {
                            cursor.text(&wrapped, 12.0, &regular, 6.0);
                        }
                    }
                    Block::Image(png) => cursor.image(png)?,
                }
            }
        }

        drop(cursor);
        Ok(doc.save_to_bytes()?)
    }
}

struct PageCursor<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
}

impl PageCursor<'_> {
    fn new_page(&mut self) {
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn gap(&mut self, height: f32) {
        self.y -= height;
    }

    fn text(&mut self, text: &str, size: f32, font: &IndirectFontRef, line_height: f32) {
        if self.y - line_height < MARGIN {
            self.new_page();
        }
        self.y -= line_height;
        self.layer
            .use_text(latin1(text), size, Mm(MARGIN), Mm(self.y), font);
    }

    /// One full-width row of height `CELL_HEIGHT`, optionally boxed
    fn cell(&mut self, text: &str, size: f32, font: &IndirectFontRef, align: Align, border: bool) {
        if self.y - CELL_HEIGHT < MARGIN {
            self.new_page();
        }
        let text = latin1(text);
        let width = PAGE_WIDTH - 2.0 * MARGIN;
        let text_width = text_width_mm(&text, size);
        let x = match align {
            Align::Center => MARGIN + (width - text_width) / 2.0,
            Align::Right => MARGIN + width - 1.0 - text_width,
        }
        .max(MARGIN + 1.0);

        let top = self.y;
        self.y -= CELL_HEIGHT;
        let baseline = self.y + (CELL_HEIGHT - size * PT_TO_MM * 0.7) / 2.0;
        self.layer.use_text(text, size, Mm(x), Mm(baseline), font);

        if border {
            self.layer.set_outline_thickness(0.5);
            self.layer.add_line(Line {
                points: vec![
                    (Point::new(Mm(MARGIN), Mm(top)), false),
                    (Point::new(Mm(MARGIN + width), Mm(top)), false),
                    (Point::new(Mm(MARGIN + width), Mm(self.y)), false),
                    (Point::new(Mm(MARGIN), Mm(self.y)), false),
                ],
                is_closed: true,
            });
        }
    }

    fn image(&mut self, png: &[u8]) -> Result<()> {
        let decoder = PngDecoder::new(Cursor::new(png)).map_err(image_err)?;
        let (width_px, height_px) = decoder.dimensions();
        let image = Image::try_from(decoder).map_err(image_err)?;

        let natural_width = width_px as f32 / IMAGE_DPI * 25.4;
        let natural_height = height_px as f32 / IMAGE_DPI * 25.4;
        if natural_width <= 0.0 || natural_height <= 0.0 {
            return Err(SipocError::ExportIo {
                message: "diagram image has zero size".into(),
            });
        }

        let available = self.y - MARGIN - 5.0;
        let scale = (IMAGE_WIDTH / natural_width).min(available / natural_height);
        let height = natural_height * scale;
        self.y -= 5.0 + height;

        image.add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(MARGIN)),
                translate_y: Some(Mm(self.y)),
                scale_x: Some(scale),
                scale_y: Some(scale),
                dpi: Some(IMAGE_DPI),
                ..Default::default()
            },
        );
        Ok(())
    }
}

fn image_err(err: printpdf::image_crate::ImageError) -> SipocError {
    SipocError::ExportIo {
        message: format!("cannot embed diagram image: {}", err),
    }
}

/// Approximate Helvetica advance width in mm
fn text_width_mm(text: &str, size: f32) -> f32 {
    let units: u32 = text
        .chars()
        .map(|c| match c {
            ' ' | 'i' | 'j' | 'l' | '.' | ',' | ':' | ';' | '\'' | '!' | '|' => 278,
            'f' | 't' | 'r' | '-' | '(' | ')' | '/' => 333,
            'm' | 'M' | 'W' => 833,
            'w' => 722,
            'A'..='Z' => 667,
            _ => 556,
        })
        .sum();
    units as f32 / 1000.0 * size * PT_TO_MM
}

/// Built-in PDF fonts only cover Latin-1; anything else becomes '?'
fn latin1(text: &str) -> String {
    text.chars()
        .map(|c| if (c as u32) <= 0xFF { c } else { '?' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_only() -> PrintableDocument {
        PrintableDocument {
            title: "Six Sigma Project Charter".into(),
            pages: vec![Page {
                blocks: vec![
                    Block::Title("Six Sigma Project Charter".into()),
                    Block::Stamp("Report Date: 2024-05-01".into()),
                    Block::Line("- Scope: Gepäck → Förderband".into()),
                ],
            }],
        }
    }

    #[test]
    fn test_pdf_header() {
        let bytes = PdfWriter.write(&text_only()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_long_documents_paginate() {
        let mut doc = text_only();
        doc.pages[0]
            .blocks
            .extend((0..200).map(|i| Block::Line(format!("- Line {i}: {}", "word ".repeat(40)))));
        let bytes = PdfWriter.write(&doc).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        use printpdf::image_crate::codecs::png::PngEncoder;
        use printpdf::image_crate::{ColorType, ImageEncoder};

        let pixels = vec![200u8; (width * height * 4) as usize];
        let mut bytes = Vec::new();
        PngEncoder::new(&mut bytes)
            .write_image(&pixels, width, height, ColorType::Rgba8)
            .unwrap();
        bytes
    }

    #[test]
    fn test_diagram_page_embeds_png() {
        let mut doc = text_only();
        doc.pages.push(Page {
            blocks: vec![
                Block::Heading("SIPOC Diagram".into()),
                Block::Image(png(40, 30)),
            ],
        });
        let with_image = PdfWriter.write(&doc).unwrap();
        let without = PdfWriter.write(&text_only()).unwrap();
        assert!(with_image.starts_with(b"%PDF"));
        assert!(with_image.len() > without.len());
    }

    #[test]
    fn test_tall_image_fits_remaining_page() {
        let doc = PrintableDocument {
            title: "t".into(),
            pages: vec![Page {
                blocks: vec![Block::Title("t".into()), Block::Image(png(10, 400))],
            }],
        };
        assert!(PdfWriter.write(&doc).is_ok());
    }

    #[test]
    fn test_invalid_png_is_export_error() {
        let doc = PrintableDocument {
            title: "t".into(),
            pages: vec![Page {
                blocks: vec![Block::Image(b"not a png".to_vec())],
            }],
        };
        let err = PdfWriter.write(&doc).unwrap_err();
        assert!(matches!(err, SipocError::ExportIo { .. }));
    }

    #[test]
    fn test_text_width_estimate() {
        assert!(text_width_mm("", 12.0) == 0.0);
        assert!(text_width_mm("Report Date: 2024-05-01", 12.0) < PAGE_WIDTH - 2.0 * MARGIN);
        assert!(text_width_mm("WWW", 12.0) > text_width_mm("iii", 12.0));
    }

    #[test]
    fn test_latin1_replacement() {
        assert_eq!(latin1("Gepäck → belt"), "Gepäck ? belt");
        assert!(!text_only().has_image());
    }
}
