//! Cover-letter text flow.
//!
//! Lines are placed by baseline on letter pages in pt. Mixed bold/plain
//! lines are packed word by word, each word measured in its own weight.
//! Plain lines wrap and justify. The person's name on the first or last
//! line is set as a larger bold header or signature.

use serde::Serialize;

use crate::export::font_metrics::{get_metrics, FontWeight};
use crate::export::text_flow::{LETTER_HEIGHT_PT, LETTER_WIDTH_PT};
use crate::letter::markup::{strip_markup, tagged_words, Segment};

pub const PT_PER_CM: f32 = 28.35;
pub const BODY_SIZE: f32 = 12.0;
pub const NAME_SIZE: f32 = 14.0;
pub const LINE_SPACING: f32 = 1.5;
pub const BODY_LINE_HEIGHT: f32 = BODY_SIZE * LINE_SPACING;
pub const NAME_LINE_HEIGHT: f32 = NAME_SIZE * LINE_SPACING;
pub const MARGIN_TOP: f32 = 2.0 * PT_PER_CM;
pub const MARGIN_BOTTOM: f32 = 2.0 * PT_PER_CM;
pub const MARGIN_SIDE: f32 = 2.5 * PT_PER_CM;
pub const CONTENT_WIDTH: f32 = LETTER_WIDTH_PT - 2.0 * MARGIN_SIDE;

/// Plain lines longer than this are justified even when they fit.
pub const PARAGRAPH_THRESHOLD: usize = 65;

const STRENGTHS_TITLE: &str = "fortalezas destacadas:";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Run {
    pub x: f32,
    pub baseline: f32,
    pub size: f32,
    pub bold: bool,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LetterPage {
    pub runs: Vec<Run>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LetterLayout {
    pub pages: Vec<LetterPage>,
    /// Sum of every vertical advance, in pt.
    pub total_advance: f32,
}

struct Cursor {
    pages: Vec<LetterPage>,
    y: f32,
    total_advance: f32,
}

impl Cursor {
    fn push(&mut self, x: f32, size: f32, bold: bool, text: impl Into<String>) {
        let baseline = self.y;
        if let Some(page) = self.pages.last_mut() {
            page.runs.push(Run {
                x,
                baseline,
                size,
                bold,
                text: text.into(),
            });
        }
    }

    fn advance(&mut self, dy: f32) {
        self.y += dy;
        self.total_advance += dy;
    }
}

pub fn layout_letter(content: &str, person_name: &str) -> LetterLayout {
    let mut cursor = Cursor {
        pages: vec![LetterPage::default()],
        y: MARGIN_TOP + NAME_SIZE,
        total_advance: 0.0,
    };
    let name = person_name.trim().to_uppercase();
    let lines: Vec<&str> = content.split('\n').collect();
    let last = lines.len().saturating_sub(1);

    for (index, line) in lines.iter().enumerate() {
        if cursor.y > LETTER_HEIGHT_PT - MARGIN_BOTTOM {
            cursor.pages.push(LetterPage::default());
            cursor.y = MARGIN_TOP;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            cursor.advance(BODY_LINE_HEIGHT / 2.0);
            continue;
        }

        let cleaned = strip_markup(line).trim().to_uppercase();
        let is_name = (index == 0 || index == last) && !name.is_empty() && cleaned == name;

        if is_name {
            cursor.push(MARGIN_SIDE, NAME_SIZE, true, cleaned);
            cursor.advance(NAME_LINE_HEIGHT);
        } else if trimmed.to_lowercase() == STRENGTHS_TITLE {
            cursor.push(MARGIN_SIDE, BODY_SIZE, true, trimmed);
            cursor.advance(BODY_LINE_HEIGHT);
        } else if line.contains("**") {
            mixed_line(&mut cursor, line);
        } else {
            plain_line(&mut cursor, line);
        }
    }

    LetterLayout {
        pages: cursor.pages,
        total_advance: cursor.total_advance,
    }
}

fn mixed_line(cursor: &mut Cursor, line: &str) {
    let space = get_metrics(FontWeight::Regular).width(" ", BODY_SIZE);
    let mut current: Vec<(Segment, f32)> = Vec::new();
    let mut current_width = 0.0_f32;

    let flush = |cursor: &mut Cursor, words: &mut Vec<(Segment, f32)>| {
        let mut x = MARGIN_SIDE;
        for (word, width) in words.drain(..) {
            cursor.push(x, BODY_SIZE, word.bold, word.text);
            x += width + space;
        }
        cursor.advance(BODY_LINE_HEIGHT);
    };

    for word in tagged_words(line) {
        let width = get_metrics(FontWeight::from_bold(word.bold)).width(&word.text, BODY_SIZE);
        if current_width > 0.0 && current_width + space + width > CONTENT_WIDTH {
            flush(cursor, &mut current);
            current_width = width;
        } else {
            if !current.is_empty() {
                current_width += space;
            }
            current_width += width;
        }
        current.push((word, width));
    }
    if !current.is_empty() {
        flush(cursor, &mut current);
    }
}

fn plain_line(cursor: &mut Cursor, line: &str) {
    let metrics = get_metrics(FontWeight::Regular);
    let wrapped = metrics.wrap(line, BODY_SIZE, CONTENT_WIDTH);
    let justify = wrapped.len() > 1 || line.chars().count() > PARAGRAPH_THRESHOLD;
    let base = cursor.y;
    let count = wrapped.len();

    for (i, sub) in wrapped.iter().enumerate() {
        cursor.y = base + i as f32 * BODY_LINE_HEIGHT;
        let words: Vec<&str> = sub.split(' ').collect();
        if justify && i + 1 < count && words.len() > 1 {
            let natural: f32 = words.iter().map(|w| metrics.width(w, BODY_SIZE)).sum();
            let gap = (CONTENT_WIDTH - natural) / (words.len() - 1) as f32;
            let mut x = MARGIN_SIDE;
            for word in words {
                cursor.push(x, BODY_SIZE, false, word);
                x += metrics.width(word, BODY_SIZE) + gap;
            }
        } else {
            cursor.push(MARGIN_SIDE, BODY_SIZE, false, sub.as_str());
        }
    }
    cursor.y = base;
    cursor.advance(count as f32 * BODY_LINE_HEIGHT);
}
