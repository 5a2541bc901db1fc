//! Preview scaling: shrink the fixed-size page to fit the viewport.
//!
//! The scale is a visual transform only. It is stored on the preview
//! surface's presentation and never touches the layout used for export.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::export::surface::Presentation;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Viewport {
    pub container_width: f32,
    #[serde(default)]
    pub horizontal_padding: f32,
}

impl Viewport {
    pub fn available_width(&self) -> f32 {
        self.container_width - self.horizontal_padding
    }
}

/// `scale = min(1, available / natural)`, centered horizontally. Returns
/// `current` untouched when either width is unusable.
pub fn fit(
    natural_width: f32,
    natural_height: f32,
    viewport: Viewport,
    current: Presentation,
) -> Presentation {
    let available = viewport.available_width();
    if natural_width <= 0.0 || available <= 0.0 {
        return current;
    }
    let scale = (available / natural_width).min(1.0);
    Presentation {
        scale,
        offset_x: (available - natural_width * scale) / 2.0,
        container_height: Some(natural_height * scale),
        ..current
    }
}

/// Latest-wins debounce. Each call to `settle` waits the delay and reports
/// whether it is still the most recent request.
#[derive(Debug, Clone)]
pub struct Debouncer {
    generation: Arc<AtomicU64>,
    delay: Duration,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            generation: Arc::new(AtomicU64::new(0)),
            delay,
        }
    }

    pub async fn settle(&self) -> bool {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;
        self.generation.load(Ordering::SeqCst) == ticket
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::layout::{PAGE_HEIGHT_PX, PAGE_WIDTH_PX};

    fn viewport(width: f32, padding: f32) -> Viewport {
        Viewport {
            container_width: width,
            horizontal_padding: padding,
        }
    }

    #[test]
    fn test_narrow_viewport_shrinks_and_centers() {
        let p = fit(PAGE_WIDTH_PX, PAGE_HEIGHT_PX, viewport(440.0, 32.0), Presentation::default());
        assert!((p.scale - 0.5).abs() < 1e-6);
        assert!(p.offset_x.abs() < 1e-4);
        assert_eq!(p.container_height, Some(528.0));
    }

    #[test]
    fn test_wide_viewport_never_enlarges() {
        let p = fit(PAGE_WIDTH_PX, PAGE_HEIGHT_PX, viewport(1216.0, 0.0), Presentation::default());
        assert_eq!(p.scale, 1.0);
        assert!((p.offset_x - 200.0).abs() < 1e-4);
        assert_eq!(p.container_height, Some(PAGE_HEIGHT_PX));
    }

    #[test]
    fn test_unusable_widths_leave_transform_untouched() {
        let current = Presentation {
            scale: 0.7,
            ..Default::default()
        };
        assert_eq!(fit(0.0, PAGE_HEIGHT_PX, viewport(500.0, 0.0), current), current);
        assert_eq!(fit(PAGE_WIDTH_PX, PAGE_HEIGHT_PX, viewport(20.0, 20.0), current), current);
        assert_eq!(fit(PAGE_WIDTH_PX, PAGE_HEIGHT_PX, viewport(10.0, 30.0), current), current);
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_latest_request_wins() {
        let debouncer = Debouncer::default();
        let first = tokio::spawn({
            let d = debouncer.clone();
            async move { d.settle().await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        let second = tokio::spawn({
            let d = debouncer.clone();
            async move { d.settle().await }
        });
        assert!(!first.await.unwrap());
        assert!(second.await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_lone_request_settles_after_delay() {
        let debouncer = Debouncer::new(Duration::from_millis(50));
        let start = tokio::time::Instant::now();
        assert!(debouncer.settle().await);
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
