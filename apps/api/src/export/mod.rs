// CV PDF export.
// Two strategies share one placement pass: Classic flows real text across
// letter pages, Modern and Creative are captured as a single bitmap page.
// CPU-bound drawing runs inside tokio::task::spawn_blocking on owned snapshots.

pub mod engine;
pub mod font_metrics;
pub mod place;
pub mod raster;
pub mod surface;
pub mod text_flow;

pub use engine::{cv_file_name, file_stem, ExportEngine, ExportedPdf};
pub use raster::{Rasterizer, RusttypeRasterizer};
pub use surface::{PreviewSurface, Presentation};

use thiserror::Error;

/// The one message users see when an export fails.
pub const EXPORT_FAILED_MESSAGE: &str = "Ocurrió un error al generar el PDF.";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("PDF writer error: {0}")]
    Pdf(String),

    #[error("raster font unavailable: {0}")]
    FontUnavailable(String),

    #[error("capture produced an empty image")]
    EmptyCapture,

    #[error("capture of {width}x{height} px exceeds the pixel budget")]
    CaptureTooLarge { width: u64, height: u64 },

    #[error("raster capture failed: {0}")]
    Capture(String),

    #[error("export task failed: {0}")]
    Task(String),
}
