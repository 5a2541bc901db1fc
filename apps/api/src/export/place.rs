//! Box placement: turns a layout tree into absolutely positioned words,
//! fills and icons, measured with the Helvetica tables.
//!
//! Both export strategies draw from this output, so the transient style
//! overrides installed on the preview surface are applied here.

use crate::export::font_metrics::{get_metrics, FontWeight};
use crate::render::layout::{
    AdjustClass, Align, Bar, Block, IconKind, Node, Page, Rgb, Row, Rule, TextBlock, TextRole,
};

/// Ascent of Helvetica relative to the font size, used to put the baseline
/// inside a line box.
const ASCENT: f32 = 0.8;

/// Style adjustments in effect while placing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlacementStyle {
    /// `line-height: calc(<em>em + <px>px)` for h1/h2.
    pub heading_line_height: Option<(f32, f32)>,
    /// Vertical shift for text marked `pdf-text-adjust`.
    pub text_nudge: f32,
    /// Vertical shift for icons marked `pdf-icon-adjust`.
    pub icon_nudge: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedWord {
    pub x: f32,
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub color: Rgb,
    pub href: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub top: f32,
    pub height: f32,
    pub baseline: f32,
    pub size: f32,
    pub role: TextRole,
    pub words: Vec<PlacedWord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedIcon {
    pub kind: IconKind,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Fill(Fill),
    Line(PlacedLine),
    Icon(PlacedIcon),
}

impl Item {
    fn shift(&mut self, dy: f32) {
        match self {
            Item::Fill(fill) => fill.y += dy,
            Item::Line(line) => {
                line.top += dy;
                line.baseline += dy;
            }
            Item::Icon(icon) => icon.y += dy,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedPage {
    pub width: f32,
    /// Natural height: the content height, never below the page minimum.
    pub height: f32,
    pub background: Rgb,
    pub items: Vec<Item>,
}

impl PlacedPage {
    pub fn lines(&self) -> impl Iterator<Item = &PlacedLine> {
        self.items.iter().filter_map(|item| match item {
            Item::Line(line) => Some(line),
            _ => None,
        })
    }
}

pub fn place(page: &Page, style: &PlacementStyle) -> PlacedPage {
    let mut items = Vec::new();
    let height = place_node(&page.root, 0.0, 0.0, page.width, 0.0, style, &mut items);
    PlacedPage {
        width: page.width,
        height: height.max(page.min_height),
        background: page.background,
        items,
    }
}

fn place_node(
    node: &Node,
    x: f32,
    y: f32,
    width: f32,
    stretch: f32,
    style: &PlacementStyle,
    out: &mut Vec<Item>,
) -> f32 {
    match node {
        Node::Block(block) => place_block(block, x, y, width, stretch, style, out),
        Node::Row(row) => place_row(row, x, y, width, style, out),
        Node::Text(text) => place_text(text, x, y, width, style, out),
        Node::Rule(rule) => place_rule(rule, x, y, width, out),
        Node::Bar(bar) => place_bar(bar, x, y, width, out),
        Node::Spacer { height } => *height,
    }
}

fn place_block(
    block: &Block,
    x: f32,
    y: f32,
    width: f32,
    stretch: f32,
    style: &PlacementStyle,
    out: &mut Vec<Item>,
) -> f32 {
    let start = out.len();
    let pad = block.padding;
    let inner_x = x + pad.left;
    let inner_width = (width - pad.left - pad.right).max(0.0);
    let min_height = block.min_height.max(stretch);
    let mut cursor = y + pad.top;

    let last = block.children.len().saturating_sub(1);
    for (i, child) in block.children.iter().enumerate() {
        if i > 0 {
            cursor += block.gap;
        }
        if block.anchor_last_bottom && i == last && i > 0 {
            let mut scratch = Vec::new();
            let child_height =
                place_node(child, inner_x, cursor, inner_width, 0.0, style, &mut scratch);
            let target = cursor.max(y + min_height - pad.bottom - child_height);
            let dy = target - cursor;
            for mut item in scratch {
                item.shift(dy);
                out.push(item);
            }
            cursor = target + child_height;
        } else {
            cursor += place_node(child, inner_x, cursor, inner_width, 0.0, style, out);
        }
    }

    let mut height = cursor - y + pad.bottom;
    if let Some(border) = block.border_bottom {
        out.push(Item::Fill(Fill {
            x,
            y: y + height,
            width,
            height: border.width,
            color: border.color,
        }));
        height += border.width;
    }
    let height = height.max(min_height);
    if let Some(border) = block.border_right {
        out.push(Item::Fill(Fill {
            x: x + width - border.width,
            y,
            width: border.width,
            height,
            color: border.color,
        }));
    }
    if let Some(color) = block.background {
        out.insert(
            start,
            Item::Fill(Fill {
                x,
                y,
                width,
                height,
                color,
            }),
        );
    }
    height
}

// Columns stretch to the tallest one, so each is placed twice: once to
// measure and once with the final row height.
fn place_row(
    row: &Row,
    x: f32,
    y: f32,
    width: f32,
    style: &PlacementStyle,
    out: &mut Vec<Item>,
) -> f32 {
    let gaps = row.gap * row.columns.len().saturating_sub(1) as f32;
    let available = (width - gaps).max(0.0);

    let mut height = 0.0_f32;
    let mut scratch = Vec::new();
    let mut column_x = x;
    for column in &row.columns {
        let column_width = available * column.fraction;
        scratch.clear();
        let h = place_node(&column.node, column_x, y, column_width, 0.0, style, &mut scratch);
        height = height.max(h);
        column_x += column_width + row.gap;
    }

    let mut column_x = x;
    for column in &row.columns {
        let column_width = available * column.fraction;
        place_node(&column.node, column_x, y, column_width, height, style, out);
        column_x += column_width + row.gap;
    }
    height
}

fn place_rule(rule: &Rule, x: f32, y: f32, width: f32, out: &mut Vec<Item>) -> f32 {
    let rule_width = width * rule.width_fraction;
    let rule_x = if rule.align_right {
        x + width - rule_width
    } else {
        x
    };
    out.push(Item::Fill(Fill {
        x: rule_x,
        y,
        width: rule_width,
        height: rule.thickness,
        color: rule.color,
    }));
    rule.thickness
}

fn place_bar(bar: &Bar, x: f32, y: f32, width: f32, out: &mut Vec<Item>) -> f32 {
    out.push(Item::Fill(Fill {
        x,
        y,
        width,
        height: bar.height,
        color: bar.track,
    }));
    out.push(Item::Fill(Fill {
        x,
        y,
        width: width * bar.fraction.clamp(0.0, 1.0),
        height: bar.height,
        color: bar.fill,
    }));
    bar.height
}

// ────────────────────────────────────────────────────────────────────────────
// Text
// ────────────────────────────────────────────────────────────────────────────

struct Piece {
    text: String,
    bold: bool,
    italic: bool,
    color: Rgb,
    href: Option<String>,
    width: f32,
}

/// Pieces glued together without whitespace; wrapping never breaks inside.
struct Word {
    pieces: Vec<Piece>,
    width: f32,
}

fn words_of(text: &TextBlock) -> Vec<Word> {
    let mut words: Vec<Word> = Vec::new();
    let mut glue = false;
    for span in &text.spans {
        let bold = span.bold || text.bold;
        let italic = span.italic || text.italic;
        let color = span.color.unwrap_or(text.color);
        let metrics = get_metrics(FontWeight::from_bold(bold));

        let mut rest = span.text.as_str();
        while !rest.is_empty() {
            let trimmed = rest.trim_start();
            if trimmed.len() != rest.len() {
                glue = false;
            }
            if trimmed.is_empty() {
                break;
            }
            let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
            let token = &trimmed[..end];
            let piece = Piece {
                text: token.to_string(),
                bold,
                italic,
                color,
                href: span.href.clone(),
                width: metrics.width(token, text.size),
            };
            match words.last_mut() {
                Some(word) if glue => {
                    word.width += piece.width;
                    word.pieces.push(piece);
                }
                _ => words.push(Word {
                    width: piece.width,
                    pieces: vec![piece],
                }),
            }
            glue = true;
            rest = &trimmed[end..];
        }
    }
    words
}

fn wrap_words(words: Vec<Word>, space: f32, max_width: f32) -> Vec<Vec<Word>> {
    let mut lines: Vec<Vec<Word>> = Vec::new();
    let mut current: Vec<Word> = Vec::new();
    let mut current_width = 0.0_f32;
    for word in words {
        if !current.is_empty() && current_width + space + word.width > max_width {
            lines.push(std::mem::take(&mut current));
            current_width = 0.0;
        }
        if !current.is_empty() {
            current_width += space;
        }
        current_width += word.width;
        current.push(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn line_height(text: &TextBlock, style: &PlacementStyle) -> f32 {
    match style.heading_line_height {
        Some((em, px)) if text.role.is_heading() => em * text.size + px,
        _ => text.size * text.line_height,
    }
}

fn place_text(
    text: &TextBlock,
    x: f32,
    y: f32,
    width: f32,
    style: &PlacementStyle,
    out: &mut Vec<Item>,
) -> f32 {
    let margin = text.margin;
    let mut left = x + margin.left + text.indent;
    let mut available = (width - margin.left - margin.right - text.indent).max(0.0);
    let top = y + margin.top;
    let lh = line_height(text, style);

    let nudge = match text.adjust {
        Some(AdjustClass::TextAdjust) => style.text_nudge,
        _ => 0.0,
    };

    if let Some(icon) = text.icon {
        let icon_nudge = match icon.adjust {
            Some(AdjustClass::IconAdjust) => style.icon_nudge,
            Some(AdjustClass::TextAdjust) => style.text_nudge,
            None => 0.0,
        };
        out.push(Item::Icon(PlacedIcon {
            kind: icon.kind,
            x: left,
            y: top + (lh - icon.size) / 2.0 + icon_nudge,
            size: icon.size,
            color: icon.color,
        }));
        left += icon.size + icon.gap;
        available = (available - icon.size - icon.gap).max(0.0);
    }

    let space = get_metrics(FontWeight::Regular).space_width * text.size;
    let lines = wrap_words(words_of(text), space, available);
    let highlight_at = out.len();
    let line_count = lines.len();
    let (mut min_x, mut max_x) = (f32::MAX, f32::MIN);

    for (i, line) in lines.into_iter().enumerate() {
        let line_top = top + i as f32 * lh;
        let natural: f32 =
            line.iter().map(|w| w.width).sum::<f32>() + space * line.len().saturating_sub(1) as f32;
        let last_line = i + 1 == line_count;
        let (start_x, gap) = match text.align {
            Align::Left => (left, space),
            Align::Center => (left + (available - natural) / 2.0, space),
            Align::Right => (left + available - natural, space),
            Align::Justify if !last_line && line.len() > 1 => {
                (left, space + (available - natural) / (line.len() - 1) as f32)
            }
            Align::Justify => (left, space),
        };

        let mut words = Vec::new();
        if text.bullet && i == 0 {
            words.push(PlacedWord {
                x: left - text.indent * 0.75,
                text: "\u{2022}".to_string(),
                bold: false,
                italic: false,
                color: text.color,
                href: None,
            });
        }
        let mut cursor = start_x;
        min_x = min_x.min(start_x);
        for word in line {
            for piece in word.pieces {
                words.push(PlacedWord {
                    x: cursor,
                    text: piece.text,
                    bold: piece.bold,
                    italic: piece.italic,
                    color: piece.color,
                    href: piece.href,
                });
                cursor += piece.width;
            }
            max_x = max_x.max(cursor);
            cursor += gap;
        }

        out.push(Item::Line(PlacedLine {
            top: line_top + nudge,
            height: lh,
            baseline: line_top + (lh - text.size) / 2.0 + text.size * ASCENT + nudge,
            size: text.size,
            role: text.role,
            words,
        }));
    }

    let text_height = line_count as f32 * lh;
    if let Some(highlight) = text.highlight {
        if line_count > 0 {
            let pad = highlight.padding;
            out.insert(
                highlight_at,
                Item::Fill(Fill {
                    x: min_x - pad.left,
                    y: top - pad.top,
                    width: max_x - min_x + pad.left + pad.right,
                    height: text_height + pad.top + pad.bottom,
                    color: highlight.color,
                }),
            );
        }
    }

    margin.top + text_height + margin.bottom
}
