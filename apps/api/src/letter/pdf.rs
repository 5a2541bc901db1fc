use printpdf::{Mm, PdfDocument};

use crate::export::text_flow::{pdf_color, save, Fonts, LETTER_HEIGHT_PT, LETTER_WIDTH_PT, PT_TO_MM};
use crate::export::ExportError;
use crate::letter::flow::LetterLayout;
use crate::render::layout::Rgb;

/// Draws a laid-out letter with the standard Helvetica faces.
pub fn draw_letter(layout: &LetterLayout, title: &str) -> Result<Vec<u8>, ExportError> {
    let width = Mm(LETTER_WIDTH_PT * PT_TO_MM);
    let height = Mm(LETTER_HEIGHT_PT * PT_TO_MM);
    let (doc, first_page, first_layer) = PdfDocument::new(title, width, height, "Layer 1");
    let fonts = Fonts::load(&doc)?;

    for (i, page) in layout.pages.iter().enumerate() {
        let layer = if i == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_index, layer_index) = doc.add_page(width, height, "Layer 1");
            doc.get_page(page_index).get_layer(layer_index)
        };
        layer.set_fill_color(pdf_color(Rgb::BLACK));
        for run in &page.runs {
            layer.use_text(
                run.text.as_str(),
                run.size,
                Mm(run.x * PT_TO_MM),
                Mm((LETTER_HEIGHT_PT - run.baseline) * PT_TO_MM),
                fonts.pick(run.bold, false),
            );
        }
    }
    save(doc)
}
