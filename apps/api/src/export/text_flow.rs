//! Strategy A: paginated text flow.
//!
//! The placed layout is scaled from CSS px to PDF points by a fixed 0.72,
//! split across letter pages so that no text line straddles a page break,
//! and drawn as real Helvetica text.

use std::io::{BufWriter, Cursor};

use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Point, Polygon,
};

use crate::export::place::{Item, PlacedPage};
use crate::export::ExportError;
use crate::render::layout::{Rgb, TextRole};

/// CSS px → PDF pt factor used by the text flow.
pub const TEXT_FLOW_SCALE: f32 = 0.72;
pub const LETTER_WIDTH_PT: f32 = 612.0;
pub const LETTER_HEIGHT_PT: f32 = 792.0;
pub const PT_TO_MM: f32 = 0.352_777_78;

#[derive(Debug, Clone, PartialEq)]
pub struct FlowText {
    pub x: f32,
    /// Distance from the top of the page to the baseline, in pt.
    pub baseline: f32,
    pub size: f32,
    pub line_height: f32,
    pub role: TextRole,
    pub bold: bool,
    pub italic: bool,
    pub color: Rgb,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlowFill {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub color: Rgb,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowPage {
    pub texts: Vec<FlowText>,
    pub fills: Vec<FlowFill>,
}

/// Pages of positioned text and fills in pt, top-left origin.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowPlan {
    pub pages: Vec<FlowPage>,
}

/// Vertical pushes inserted so lines never cross a page boundary. Each entry
/// is `(source_y, delta)`; everything at or below `source_y` moves by `delta`.
fn page_breaks(placed: &PlacedPage, page_px: f32) -> Vec<(f32, f32)> {
    let mut boxes: Vec<(f32, f32)> = placed.lines().map(|l| (l.top, l.height)).collect();
    boxes.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut breaks = Vec::new();
    let mut shift = 0.0_f32;
    for (top, height) in boxes {
        if height >= page_px {
            continue;
        }
        let shifted = top + shift;
        let page_end = ((shifted / page_px).floor() + 1.0) * page_px;
        if shifted + height > page_end + 0.01 {
            let delta = page_end - shifted;
            breaks.push((top, delta));
            shift += delta;
        }
    }
    breaks
}

fn shift_at(breaks: &[(f32, f32)], y: f32) -> f32 {
    breaks
        .iter()
        .take_while(|(at, _)| *at <= y + 0.01)
        .map(|(_, delta)| delta)
        .sum()
}

/// Lays the placed page out on letter pages. `left` is the surface's
/// horizontal offset in px.
pub fn plan(placed: &PlacedPage, left: f32) -> FlowPlan {
    let page_px = LETTER_HEIGHT_PT / TEXT_FLOW_SCALE;
    let breaks = page_breaks(placed, page_px);
    let total_shift: f32 = breaks.iter().map(|(_, d)| d).sum();
    let page_count = (((placed.height + total_shift) / page_px).ceil() as usize).max(1);
    let mut pages = vec![FlowPage::default(); page_count];

    let to_page = |y: f32| -> (usize, f32) {
        let index = (((y + 0.01) / page_px).floor().max(0.0) as usize).min(page_count - 1);
        (index, (y - index as f32 * page_px) * TEXT_FLOW_SCALE)
    };

    for item in &placed.items {
        match item {
            Item::Line(line) => {
                let top = line.top + shift_at(&breaks, line.top);
                let (index, top_pt) = to_page(top);
                let baseline_pt = top_pt + (line.baseline - line.top) * TEXT_FLOW_SCALE;
                for word in &line.words {
                    pages[index].texts.push(FlowText {
                        x: (word.x + left) * TEXT_FLOW_SCALE,
                        baseline: baseline_pt,
                        size: line.size * TEXT_FLOW_SCALE,
                        line_height: line.height * TEXT_FLOW_SCALE,
                        role: line.role,
                        bold: word.bold,
                        italic: word.italic,
                        color: word.color,
                        text: word.text.clone(),
                    });
                }
            }
            Item::Fill(fill) => {
                let y = fill.y + shift_at(&breaks, fill.y);
                let (index, y_pt) = to_page(y);
                pages[index].fills.push(FlowFill {
                    x: (fill.x + left) * TEXT_FLOW_SCALE,
                    y: y_pt,
                    width: fill.width * TEXT_FLOW_SCALE,
                    height: fill.height * TEXT_FLOW_SCALE,
                    color: fill.color,
                });
            }
            Item::Icon(icon) => {
                let y = icon.y + shift_at(&breaks, icon.y);
                let (index, y_pt) = to_page(y);
                pages[index].fills.push(FlowFill {
                    x: (icon.x + left) * TEXT_FLOW_SCALE,
                    y: y_pt,
                    width: icon.size * TEXT_FLOW_SCALE,
                    height: icon.size * TEXT_FLOW_SCALE,
                    color: icon.color,
                });
            }
        }
    }
    FlowPlan { pages }
}

// ────────────────────────────────────────────────────────────────────────────
// PDF drawing
// ────────────────────────────────────────────────────────────────────────────

pub(crate) struct Fonts {
    pub regular: IndirectFontRef,
    pub bold: IndirectFontRef,
    pub italic: IndirectFontRef,
    pub bold_italic: IndirectFontRef,
}

fn builtin(
    doc: &printpdf::PdfDocumentReference,
    font: BuiltinFont,
) -> Result<IndirectFontRef, ExportError> {
    doc.add_builtin_font(font).map_err(|e| ExportError::Pdf(e.to_string()))
}

impl Fonts {
    pub fn load(doc: &printpdf::PdfDocumentReference) -> Result<Self, ExportError> {
        Ok(Self {
            regular: builtin(doc, BuiltinFont::Helvetica)?,
            bold: builtin(doc, BuiltinFont::HelveticaBold)?,
            italic: builtin(doc, BuiltinFont::HelveticaOblique)?,
            bold_italic: builtin(doc, BuiltinFont::HelveticaBoldOblique)?,
        })
    }

    pub fn pick(&self, bold: bool, italic: bool) -> &IndirectFontRef {
        match (bold, italic) {
            (false, false) => &self.regular,
            (true, false) => &self.bold,
            (false, true) => &self.italic,
            (true, true) => &self.bold_italic,
        }
    }
}

pub(crate) fn pdf_color(color: Rgb) -> Color {
    let (r, g, b) = color.unit();
    Color::Rgb(printpdf::Rgb::new(r, g, b, None))
}

/// Fills a rectangle given in pt with a top-left origin.
pub(crate) fn fill_rect(layer: &PdfLayerReference, x: f32, y: f32, w: f32, h: f32, page_h: f32) {
    let bottom = page_h - y - h;
    let points = vec![
        (Point::new(Mm(x * PT_TO_MM), Mm(bottom * PT_TO_MM)), false),
        (Point::new(Mm((x + w) * PT_TO_MM), Mm(bottom * PT_TO_MM)), false),
        (Point::new(Mm((x + w) * PT_TO_MM), Mm((bottom + h) * PT_TO_MM)), false),
        (Point::new(Mm(x * PT_TO_MM), Mm((bottom + h) * PT_TO_MM)), false),
    ];
    layer.add_polygon(Polygon {
        rings: vec![points],
        mode: PaintMode::Fill,
        winding_order: WindingOrder::NonZero,
    });
}

pub(crate) fn save(doc: printpdf::PdfDocumentReference) -> Result<Vec<u8>, ExportError> {
    let mut buf = Vec::new();
    {
        let cursor = Cursor::new(&mut buf);
        let mut writer = BufWriter::new(cursor);
        doc.save(&mut writer)
            .map_err(|e| ExportError::Pdf(e.to_string()))?;
    }
    Ok(buf)
}

pub fn draw(plan: &FlowPlan, title: &str) -> Result<Vec<u8>, ExportError> {
    let width = Mm(LETTER_WIDTH_PT * PT_TO_MM);
    let height = Mm(LETTER_HEIGHT_PT * PT_TO_MM);
    let (doc, first_page, first_layer) = PdfDocument::new(title, width, height, "Layer 1");
    let fonts = Fonts::load(&doc)?;

    for (i, page) in plan.pages.iter().enumerate() {
        let layer = if i == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_index, layer_index) = doc.add_page(width, height, "Layer 1");
            doc.get_page(page_index).get_layer(layer_index)
        };

        for fill in &page.fills {
            layer.set_fill_color(pdf_color(fill.color));
            fill_rect(&layer, fill.x, fill.y, fill.width, fill.height, LETTER_HEIGHT_PT);
        }
        for text in &page.texts {
            layer.set_fill_color(pdf_color(text.color));
            layer.use_text(
                text.text.as_str(),
                text.size,
                Mm(text.x * PT_TO_MM),
                Mm((LETTER_HEIGHT_PT - text.baseline) * PT_TO_MM),
                fonts.pick(text.bold, text.italic),
            );
        }
    }
    save(doc)
}
