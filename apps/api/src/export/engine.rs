//! Export orchestration.
//!
//! The preview surface is switched to its natural layout and the template's
//! transient override is installed for the duration of one export. Both are
//! guards, so every exit path (success, error, panic in the blocking task)
//! leaves the surface exactly as it was.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::export::place::PlacedPage;
use crate::export::raster::{self, Rasterizer, CAPTURE_SCALE};
use crate::export::surface::{PreviewSurface, StyleOverride};
use crate::export::text_flow;
use crate::export::ExportError;
use crate::render::{ExportStrategy, Template};

/// Turns a person's name into a file-name stem: whitespace, control
/// characters, quotes and path separators become `_`. Blank names give
/// `CV`.
pub fn file_stem(name: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        return "CV".to_string();
    }
    name.chars()
        .map(|c| match c {
            '"' | '\\' | '/' => '_',
            c if c.is_whitespace() || c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// `CV_<sanitized name>.pdf`, or `CV_CV.pdf`.
pub fn cv_file_name(name: &str) -> String {
    format!("CV_{}.pdf", file_stem(name))
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportedPdf {
    pub file_name: String,
    pub template: Template,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

/// Layout state captured under the export overrides, owned so it can move
/// into a blocking task.
struct Snapshot {
    strategy: ExportStrategy,
    placed: PlacedPage,
    left: f32,
}

#[derive(Clone)]
pub struct ExportEngine {
    rasterizer: Arc<dyn Rasterizer>,
}

impl ExportEngine {
    pub fn new(rasterizer: Arc<dyn Rasterizer>) -> Self {
        Self { rasterizer }
    }

    /// Exports the surface's current layout. `name` is the person's name and
    /// only feeds the file name and PDF title.
    pub async fn export(
        &self,
        surface: &mut PreviewSurface,
        name: &str,
    ) -> Result<ExportedPdf, ExportError> {
        let template = surface.template();
        let file_name = cv_file_name(name);

        let mut natural = surface.acquire_natural();
        let styled = natural.install(StyleOverride::for_template(template));
        let snapshot = Snapshot {
            strategy: template.strategy(),
            placed: styled.place(),
            left: styled.presentation().left,
        };

        let title = file_name.clone();
        let rasterizer = Arc::clone(&self.rasterizer);
        let bytes = tokio::task::spawn_blocking(move || draw(snapshot, rasterizer.as_ref(), &title))
            .await
            .map_err(|e| ExportError::Task(e.to_string()))??;

        // Explicit order: override out first, then the presentation.
        drop(styled);
        drop(natural);

        info!(%file_name, ?template, size = bytes.len(), "CV exported");
        Ok(ExportedPdf {
            file_name,
            template,
            bytes,
        })
    }
}

fn draw(snapshot: Snapshot, rasterizer: &dyn Rasterizer, title: &str) -> Result<Vec<u8>, ExportError> {
    match snapshot.strategy {
        ExportStrategy::TextFlow => {
            let plan = text_flow::plan(&snapshot.placed, snapshot.left);
            text_flow::draw(&plan, title)
        }
        ExportStrategy::RasterCapture => {
            let capture = rasterizer.rasterize(&snapshot.placed, snapshot.left, CAPTURE_SCALE)?;
            raster::image_pdf(&capture, title)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::place::Item;
    use crate::export::surface::{Position, Presentation, EXPORT_LEFT_OFFSET_PX};
    use crate::export::RusttypeRasterizer;
    use crate::models::document::{Document, ExperienceEntry};
    use crate::render::render;
    use image::RgbImage;
    use std::sync::Mutex;

    struct FailingRasterizer;

    impl Rasterizer for FailingRasterizer {
        fn rasterize(&self, _: &PlacedPage, _: f32, _: f32) -> Result<RgbImage, ExportError> {
            Err(ExportError::Capture("boom".into()))
        }
    }

    struct PanickingRasterizer;

    impl Rasterizer for PanickingRasterizer {
        fn rasterize(&self, _: &PlacedPage, _: f32, _: f32) -> Result<RgbImage, ExportError> {
            panic!("capture crashed");
        }
    }

    /// Records what it was asked to paint and returns a small white bitmap.
    #[derive(Default)]
    struct RecordingRasterizer {
        seen: Mutex<Vec<(PlacedPage, f32, f32)>>,
    }

    impl Rasterizer for RecordingRasterizer {
        fn rasterize(&self, page: &PlacedPage, left: f32, scale: f32) -> Result<RgbImage, ExportError> {
            self.seen.lock().unwrap().push((page.clone(), left, scale));
            Ok(RgbImage::from_pixel(8, 11, image::Rgb([255, 255, 255])))
        }
    }

    fn previewed(template: Template) -> PreviewSurface {
        let mut doc = Document::default();
        doc.personal.name = "Ana Pérez".into();
        doc.personal.email = "ana@example.com".into();
        doc.summary = "Ingeniera con experiencia.".into();
        let mut surface = PreviewSurface::new(render(&doc, template), template);
        surface.set_presentation(Presentation {
            scale: 0.6,
            offset_x: 20.0,
            position: Position::Static,
            left: 0.0,
            container_height: Some(633.6),
        });
        surface
    }

    #[test]
    fn test_cv_file_name() {
        assert_eq!(cv_file_name("Ana María Pérez"), "CV_Ana_María_Pérez.pdf");
        assert_eq!(cv_file_name(""), "CV_CV.pdf");
        assert_eq!(cv_file_name("   "), "CV_CV.pdf");
    }

    #[test]
    fn test_file_name_is_header_safe() {
        assert_eq!(cv_file_name("Ana\nPérez"), "CV_Ana_Pérez.pdf");
        assert_eq!(cv_file_name("Ana \"Pérez\""), "CV_Ana__Pérez_.pdf");
        assert_eq!(cv_file_name("Ana/Pérez\\x"), "CV_Ana_Pérez_x.pdf");
        assert_eq!(cv_file_name("Ana\u{7f}\tPérez"), "CV_Ana__Pérez.pdf");
        for name in ["Ana\r\nPérez", "\"\"", "a\u{0}b"] {
            let value = format!("attachment; filename=\"{}\"", cv_file_name(name));
            assert!(axum::http::HeaderValue::from_str(&value).is_ok(), "{value}");
        }
    }

    #[tokio::test]
    async fn test_failed_capture_restores_surface_once() {
        let engine = ExportEngine::new(Arc::new(FailingRasterizer));
        let mut surface = previewed(Template::Modern);
        let before = surface.presentation();

        let err = engine.export(&mut surface, "Ana Pérez").await.unwrap_err();
        assert!(matches!(err, ExportError::Capture(_)));
        assert_eq!(surface.presentation(), before);
        assert!(surface.stylesheet().is_empty());
        assert_eq!(surface.override_removals(), 1);
    }

    #[tokio::test]
    async fn test_oversized_capture_fails_cleanly() {
        let rasterizer = RusttypeRasterizer::load(
            std::path::Path::new("/nonexistent/regular.ttf"),
            std::path::Path::new("/nonexistent/bold.ttf"),
        );
        let engine = ExportEngine::new(Arc::new(rasterizer));
        let mut doc = Document::default();
        doc.experience.push(ExperienceEntry {
            company: "Acme".into(),
            description: "tarea\n".repeat(3_000),
            ..Default::default()
        });
        let mut surface = PreviewSurface::new(render(&doc, Template::Creative), Template::Creative);
        let before = surface.presentation();

        let err = engine.export(&mut surface, "Ana").await.unwrap_err();
        assert!(matches!(err, ExportError::CaptureTooLarge { .. }));
        assert_eq!(surface.presentation(), before);
        assert_eq!(surface.override_removals(), 1);
    }

    #[tokio::test]
    async fn test_panicking_capture_restores_surface() {
        let engine = ExportEngine::new(Arc::new(PanickingRasterizer));
        let mut surface = previewed(Template::Creative);
        let before = surface.presentation();

        let err = engine.export(&mut surface, "Ana").await.unwrap_err();
        assert!(matches!(err, ExportError::Task(_)));
        assert_eq!(surface.presentation(), before);
        assert_eq!(surface.override_removals(), 1);
    }

    #[tokio::test]
    async fn test_raster_export_sees_natural_nudged_layout() {
        let recorder = Arc::new(RecordingRasterizer::default());
        let engine = ExportEngine::new(recorder.clone());
        let mut surface = previewed(Template::Modern);
        let unstyled = surface.place();

        let pdf = engine.export(&mut surface, "Ana Pérez").await.unwrap();
        assert_eq!(pdf.file_name, "CV_Ana_Pérez.pdf");
        assert!(pdf.bytes.starts_with(b"%PDF"));

        let seen = recorder.seen.lock().unwrap();
        let (placed, left, scale) = &seen[0];
        assert!((left - EXPORT_LEFT_OFFSET_PX).abs() < 1e-4);
        assert_eq!(*scale, CAPTURE_SCALE);

        // Every adjusted text line moved up by 6 px, icons down by 2 px.
        let name_line = |page: &PlacedPage| {
            page.lines()
                .find(|l| l.words.iter().any(|w| w.text == "ana@example.com"))
                .map(|l| l.baseline)
                .unwrap()
        };
        assert!((name_line(placed) - (name_line(&unstyled) - 6.0)).abs() < 1e-3);
        let icon_y = |page: &PlacedPage| {
            page.items
                .iter()
                .find_map(|item| match item {
                    Item::Icon(icon) => Some(icon.y),
                    _ => None,
                })
                .unwrap()
        };
        assert!((icon_y(placed) - (icon_y(&unstyled) + 2.0)).abs() < 1e-3);
        assert_eq!(surface.presentation().scale, 0.6);
    }

    #[tokio::test]
    async fn test_classic_export_is_text_flow() {
        let engine = ExportEngine::new(Arc::new(FailingRasterizer));
        let mut surface = previewed(Template::Classic);
        let pdf = engine.export(&mut surface, "").await.unwrap();
        assert_eq!(pdf.file_name, "CV_CV.pdf");
        assert!(pdf.bytes.starts_with(b"%PDF"));
        assert!(surface.stylesheet().is_empty());
        assert_eq!(surface.override_removals(), 1);
    }
}
