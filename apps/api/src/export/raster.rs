//! Strategy B: raster capture.
//!
//! The placed layout is painted into an RGB bitmap at 4× and embedded as a
//! single full-bleed image whose page height follows the capture's aspect
//! ratio.

use std::path::{Path, PathBuf};

use image::RgbImage;
use printpdf::{
    ColorBits, ColorSpace, Image, ImageTransform, ImageXObject, Mm, PdfDocument, Px,
};
use rusttype::{point, Font, Scale};
use tracing::warn;

use crate::export::place::{Item, PlacedPage};
use crate::export::text_flow::{save, LETTER_HEIGHT_PT, LETTER_WIDTH_PT, PT_TO_MM};
use crate::export::ExportError;
use crate::render::layout::Rgb;

/// Device pixel ratio used for the capture.
pub const CAPTURE_SCALE: f32 = 4.0;

/// Largest bitmap a capture may allocate, about ten letter pages at 4×.
pub const MAX_CAPTURE_PIXELS: u64 = 3264 * 4224 * 10;

/// Bitmap dimensions for `page` at `scale`, checked against
/// `MAX_CAPTURE_PIXELS` before anything is allocated.
pub fn capture_size(page: &PlacedPage, scale: f32) -> Result<(u32, u32), ExportError> {
    let width = (f64::from(page.width) * f64::from(scale)).round();
    let height = (f64::from(page.height) * f64::from(scale)).round();
    if !(width >= 1.0 && height >= 1.0) {
        return Err(ExportError::EmptyCapture);
    }
    if width * height > MAX_CAPTURE_PIXELS as f64 {
        return Err(ExportError::CaptureTooLarge {
            width: width as u64,
            height: height as u64,
        });
    }
    Ok((width as u32, height as u32))
}

/// Paints a placed layout into a bitmap. `left` is the horizontal offset of
/// the surface in CSS px; `scale` multiplies every coordinate.
pub trait Rasterizer: Send + Sync {
    fn rasterize(&self, page: &PlacedPage, left: f32, scale: f32) -> Result<RgbImage, ExportError>;
}

struct RasterFonts {
    regular: Font<'static>,
    bold: Font<'static>,
}

/// Default rasterizer backed by `rusttype` glyph coverage.
///
/// Fonts are read once at startup. When they cannot be loaded the service
/// still starts; raster exports then fail with `ExportError::FontUnavailable`.
pub struct RusttypeRasterizer {
    fonts: Result<RasterFonts, String>,
}

fn read_font(path: &Path) -> Result<Font<'static>, String> {
    let data = std::fs::read(path).map_err(|e| format!("{}: {e}", path.display()))?;
    Font::try_from_vec(data).ok_or_else(|| format!("{}: not a TrueType font", path.display()))
}

impl RusttypeRasterizer {
    pub fn load(regular: &Path, bold: &Path) -> Self {
        let fonts = read_font(regular).and_then(|regular| {
            let bold = read_font(bold)?;
            Ok(RasterFonts { regular, bold })
        });
        if let Err(reason) = &fonts {
            warn!(%reason, "raster fonts unavailable, modern and creative exports will fail");
        }
        Self { fonts }
    }

    pub fn is_ready(&self) -> bool {
        self.fonts.is_ok()
    }
}

impl Rasterizer for RusttypeRasterizer {
    fn rasterize(&self, page: &PlacedPage, left: f32, scale: f32) -> Result<RgbImage, ExportError> {
        capture_size(page, scale)?;
        let fonts = self
            .fonts
            .as_ref()
            .map_err(|reason| ExportError::FontUnavailable(reason.clone()))?;

        let mut canvas = Canvas::new(page, scale)?;
        for item in &page.items {
            match item {
                Item::Fill(fill) => canvas.fill_rect(
                    (fill.x + left) * scale,
                    fill.y * scale,
                    fill.width * scale,
                    fill.height * scale,
                    fill.color,
                ),
                Item::Icon(icon) => canvas.fill_circle(
                    (icon.x + left + icon.size / 2.0) * scale,
                    (icon.y + icon.size / 2.0) * scale,
                    icon.size * scale / 2.0,
                    icon.color,
                ),
                Item::Line(line) => {
                    for word in &line.words {
                        let font = if word.bold { &fonts.bold } else { &fonts.regular };
                        canvas.draw_text(
                            font,
                            &word.text,
                            (word.x + left) * scale,
                            line.baseline * scale,
                            line.size * scale,
                            word.color,
                        );
                    }
                }
            }
        }
        Ok(canvas.into_image())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Canvas
// ────────────────────────────────────────────────────────────────────────────

pub(crate) struct Canvas {
    image: RgbImage,
}

impl Canvas {
    fn new(page: &PlacedPage, scale: f32) -> Result<Self, ExportError> {
        let (width, height) = capture_size(page, scale)?;
        let Rgb(r, g, b) = page.background;
        Ok(Self {
            image: RgbImage::from_pixel(width, height, image::Rgb([r, g, b])),
        })
    }

    fn blend(&mut self, x: i64, y: i64, color: Rgb, coverage: f32) {
        if x < 0 || y < 0 || x >= self.image.width() as i64 || y >= self.image.height() as i64 {
            return;
        }
        let coverage = coverage.clamp(0.0, 1.0);
        let pixel = self.image.get_pixel_mut(x as u32, y as u32);
        let Rgb(r, g, b) = color;
        for (channel, target) in pixel.0.iter_mut().zip([r, g, b]) {
            *channel = (*channel as f32 * (1.0 - coverage) + target as f32 * coverage).round() as u8;
        }
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgb) {
        let x0 = x.round() as i64;
        let y0 = y.round() as i64;
        let x1 = (x + width).round() as i64;
        let y1 = (y + height).round().max(y0 as f32 + 1.0) as i64;
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend(px, py, color, 1.0);
            }
        }
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Rgb) {
        let r = radius.ceil() as i64;
        let (cx_i, cy_i) = (cx.round() as i64, cy.round() as i64);
        for py in cy_i - r..=cy_i + r {
            for px in cx_i - r..=cx_i + r {
                let dx = px as f32 + 0.5 - cx;
                let dy = py as f32 + 0.5 - cy;
                let coverage = radius + 0.5 - (dx * dx + dy * dy).sqrt();
                if coverage > 0.0 {
                    self.blend(px, py, color, coverage);
                }
            }
        }
    }

    fn draw_text(
        &mut self,
        font: &Font<'static>,
        text: &str,
        x: f32,
        baseline: f32,
        size: f32,
        color: Rgb,
    ) {
        for glyph in font.layout(text, Scale::uniform(size), point(x, baseline)) {
            if let Some(bb) = glyph.pixel_bounding_box() {
                glyph.draw(|gx, gy, coverage| {
                    self.blend(
                        bb.min.x as i64 + gx as i64,
                        bb.min.y as i64 + gy as i64,
                        color,
                        coverage,
                    );
                });
            }
        }
    }

    fn into_image(self) -> RgbImage {
        self.image
    }
}

// ────────────────────────────────────────────────────────────────────────────
// PDF
// ────────────────────────────────────────────────────────────────────────────

/// Page size for a capture of `width × height` pixels: letter width, and
/// the taller of letter height and the image's proportional height.
pub fn capture_page_mm(width: u32, height: u32) -> (f32, f32) {
    let page_width = LETTER_WIDTH_PT * PT_TO_MM;
    let image_height = height as f32 * page_width / width.max(1) as f32;
    (page_width, image_height.max(LETTER_HEIGHT_PT * PT_TO_MM))
}

pub fn image_pdf(capture: &RgbImage, title: &str) -> Result<Vec<u8>, ExportError> {
    let (width, height) = capture.dimensions();
    if width == 0 || height == 0 {
        return Err(ExportError::EmptyCapture);
    }
    let (page_width, page_height) = capture_page_mm(width, height);
    let image_height = height as f32 * page_width / width as f32;

    let (doc, page, layer) = PdfDocument::new(title, Mm(page_width), Mm(page_height), "Layer 1");
    let layer = doc.get_page(page).get_layer(layer);

    let image = Image::from(ImageXObject {
        width: Px(width as usize),
        height: Px(height as usize),
        color_space: ColorSpace::Rgb,
        bits_per_component: ColorBits::Bit8,
        interpolate: true,
        image_data: capture.as_raw().clone(),
        image_filter: None,
        clipping_bbox: None,
        smask: None,
    });

    // DPI = pixels / (mm / 25.4)
    let dpi = width as f32 / (page_width / 25.4);
    image.add_to_layer(
        layer,
        ImageTransform {
            translate_x: Some(Mm(0.0)),
            translate_y: Some(Mm(page_height - image_height)),
            dpi: Some(dpi),
            ..Default::default()
        },
    );
    save(doc)
}

/// Paths the default rasterizer tries when none are configured.
pub fn default_font_paths() -> (PathBuf, PathBuf) {
    const CANDIDATES: [(&str, &str); 3] = [
        (
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
        ),
        (
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
        ),
        (
            "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
            "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans-Bold.ttf",
        ),
    ];
    let (regular, bold) = CANDIDATES
        .iter()
        .find(|(regular, _)| Path::new(regular).exists())
        .unwrap_or(&CANDIDATES[0]);
    (PathBuf::from(regular), PathBuf::from(bold))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::surface::PreviewSurface;
    use crate::models::document::{Document, ExperienceEntry};
    use crate::render::{render, Template};
    use std::io::Write;

    fn blank_page(height: f32) -> PlacedPage {
        PlacedPage {
            width: 816.0,
            height,
            background: Rgb::WHITE,
            items: Vec::new(),
        }
    }

    #[test]
    fn test_letter_capture_fills_one_letter_page() {
        let (w, h) = capture_page_mm(3264, 4224);
        assert!((w - 215.9).abs() < 0.1);
        assert!((h - 279.4).abs() < 0.1);
    }

    #[test]
    fn test_tall_capture_grows_the_page() {
        let (w, h) = capture_page_mm(3264, 6000);
        assert!((h - 6000.0 * w / 3264.0).abs() < 1e-3);
        assert!(h > 279.4);
    }

    #[test]
    fn test_short_capture_keeps_letter_height() {
        let (_, h) = capture_page_mm(3264, 1000);
        assert!((h - 279.4).abs() < 0.1);
    }

    #[test]
    fn test_missing_font_is_export_error() {
        let rasterizer = RusttypeRasterizer::load(
            Path::new("/nonexistent/regular.ttf"),
            Path::new("/nonexistent/bold.ttf"),
        );
        assert!(!rasterizer.is_ready());
        let err = rasterizer
            .rasterize(&blank_page(1056.0), 0.0, CAPTURE_SCALE)
            .unwrap_err();
        assert!(matches!(err, ExportError::FontUnavailable(_)));
    }

    #[test]
    fn test_garbage_font_file_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not a font").unwrap();
        let rasterizer = RusttypeRasterizer::load(file.path(), file.path());
        assert!(!rasterizer.is_ready());
    }

    #[test]
    fn test_canvas_fill_is_clipped_and_opaque() {
        let mut canvas = Canvas::new(&blank_page(10.0), 1.0).unwrap();
        canvas.fill_rect(-5.0, 2.0, 20.0, 3.0, Rgb::BLACK);
        canvas.fill_rect(810.0, 8.0, 50.0, 50.0, Rgb::BLACK);
        let image = canvas.into_image();
        assert_eq!(image.dimensions(), (816, 10));
        assert_eq!(image.get_pixel(0, 3).0, [0, 0, 0]);
        assert_eq!(image.get_pixel(15, 3).0, [255, 255, 255]);
        assert_eq!(image.get_pixel(815, 9).0, [0, 0, 0]);
    }

    #[test]
    fn test_capture_size_is_bounded() {
        assert_eq!(capture_size(&blank_page(1056.0), CAPTURE_SCALE).unwrap(), (3264, 4224));
        assert!(matches!(
            capture_size(&blank_page(0.0), CAPTURE_SCALE),
            Err(ExportError::EmptyCapture)
        ));
        let err = capture_size(&blank_page(f32::MAX), CAPTURE_SCALE).unwrap_err();
        assert!(matches!(err, ExportError::CaptureTooLarge { .. }));
    }

    #[test]
    fn test_oversized_document_is_refused_before_painting() {
        let mut doc = Document::default();
        doc.experience.push(ExperienceEntry {
            company: "Acme".into(),
            description: "tarea\n".repeat(3_000),
            ..Default::default()
        });
        let placed = PreviewSurface::new(render(&doc, Template::Modern), Template::Modern).place();
        assert!(f64::from(placed.height) * 16.0 * 816.0 > MAX_CAPTURE_PIXELS as f64);

        // Fonts are missing too; the size check still wins.
        let rasterizer = RusttypeRasterizer::load(
            Path::new("/nonexistent/regular.ttf"),
            Path::new("/nonexistent/bold.ttf"),
        );
        let err = rasterizer.rasterize(&placed, 0.0, CAPTURE_SCALE).unwrap_err();
        assert!(matches!(err, ExportError::CaptureTooLarge { .. }));
        assert!(matches!(
            Canvas::new(&placed, CAPTURE_SCALE),
            Err(ExportError::CaptureTooLarge { .. })
        ));
    }

    #[test]
    fn test_image_pdf_produces_pdf_bytes() {
        let capture = RgbImage::from_pixel(40, 52, image::Rgb([255, 255, 255]));
        let bytes = image_pdf(&capture, "CV").unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
