//! The rendered layout tree.
//!
//! All lengths are CSS pixels at 96 dpi. The tree is rebuilt from scratch on
//! every document change and never patched in place.

use serde::Serialize;

use crate::models::document::AccentColor;

/// Letter width in CSS px (215.9 mm).
pub const PAGE_WIDTH_PX: f32 = 816.0;
/// Letter height in CSS px (279.4 mm).
pub const PAGE_HEIGHT_PX: f32 = 1056.0;

pub const PX_PER_CM: f32 = 37.795_277;
pub const PX_PER_REM: f32 = 16.0;

pub fn pt(value: f32) -> f32 {
    value * 4.0 / 3.0
}

pub fn cm(value: f32) -> f32 {
    value * PX_PER_CM
}

pub fn rem(value: f32) -> f32 {
    value * PX_PER_REM
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(0xFF, 0xFF, 0xFF);
    pub const BLACK: Rgb = Rgb(0x00, 0x00, 0x00);

    /// From a `0xRRGGBB` literal.
    pub const fn hex(value: u32) -> Rgb {
        Rgb((value >> 16) as u8, (value >> 8) as u8, value as u8)
    }

    pub fn unit(self) -> (f32, f32, f32) {
        (
            self.0 as f32 / 255.0,
            self.1 as f32 / 255.0,
            self.2 as f32 / 255.0,
        )
    }
}

impl From<&AccentColor> for Rgb {
    fn from(color: &AccentColor) -> Self {
        let (r, g, b) = color.rgb();
        Rgb(r, g, b)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Edges {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Edges {
    pub const ZERO: Edges = Edges {
        top: 0.0,
        right: 0.0,
        bottom: 0.0,
        left: 0.0,
    };

    pub fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub fn all(value: f32) -> Self {
        Self::new(value, value, value, value)
    }

    pub fn symmetric(vertical: f32, horizontal: f32) -> Self {
        Self::new(vertical, horizontal, vertical, horizontal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Border {
    pub width: f32,
    pub color: Rgb,
}

// ────────────────────────────────────────────────────────────────────────────
// Nodes
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Block(Block),
    Row(Row),
    Text(TextBlock),
    Rule(Rule),
    Bar(Bar),
    Spacer { height: f32 },
}

/// A vertical stack of children.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Block {
    pub padding: Edges,
    pub background: Option<Rgb>,
    pub border_bottom: Option<Border>,
    pub border_right: Option<Border>,
    /// Vertical gap inserted between consecutive children.
    pub gap: f32,
    pub min_height: f32,
    /// Pins the last child to the bottom of the block when there is room.
    pub anchor_last_bottom: bool,
    pub children: Vec<Node>,
}

/// Columns laid side by side. Fractions are of the row width minus gaps.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Row {
    pub gap: f32,
    pub columns: Vec<Column>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub fraction: f32,
    pub node: Node,
}

/// A horizontal line, optionally only spanning part of the width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rule {
    pub thickness: f32,
    pub color: Rgb,
    pub width_fraction: f32,
    pub align_right: bool,
}

/// A horizontal progress bar (skill levels).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bar {
    pub height: f32,
    pub fraction: f32,
    pub track: Rgb,
    pub fill: Rgb,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

/// Semantic role of a text block. Headings are what the text-flow export's
/// line-height override targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextRole {
    #[default]
    Body,
    Heading1,
    Heading2,
    Heading3,
    ListItem,
}

impl TextRole {
    pub fn is_heading(self) -> bool {
        matches!(self, TextRole::Heading1 | TextRole::Heading2)
    }
}

/// Classes targeted by the raster export's baseline nudges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AdjustClass {
    #[serde(rename = "pdf-text-adjust")]
    TextAdjust,
    #[serde(rename = "pdf-icon-adjust")]
    IconAdjust,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IconKind {
    Location,
    Phone,
    Email,
    Linkedin,
    Website,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Icon {
    pub kind: IconKind,
    pub size: f32,
    pub gap: f32,
    pub color: Rgb,
    pub adjust: Option<AdjustClass>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Span {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub color: Option<Rgb>,
    pub href: Option<String>,
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
            italic: false,
            color: None,
            href: None,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            bold: true,
            ..Self::plain(text)
        }
    }

    pub fn with_href(mut self, href: Option<String>) -> Self {
        self.href = href;
        self
    }

    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = Some(color);
        self
    }
}

/// Pill background drawn behind the text's own width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Highlight {
    pub color: Rgb,
    pub padding: Edges,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextBlock {
    pub spans: Vec<Span>,
    pub size: f32,
    /// Multiple of the font size.
    pub line_height: f32,
    pub color: Rgb,
    pub bold: bool,
    pub italic: bool,
    pub align: Align,
    pub role: TextRole,
    pub adjust: Option<AdjustClass>,
    pub icon: Option<Icon>,
    pub highlight: Option<Highlight>,
    pub bullet: bool,
    pub indent: f32,
    pub margin: Edges,
}

impl TextBlock {
    pub fn new(text: impl Into<String>, size: f32) -> Self {
        Self::from_spans(vec![Span::plain(text)], size)
    }

    pub fn from_spans(spans: Vec<Span>, size: f32) -> Self {
        Self {
            spans,
            size,
            line_height: 1.15,
            color: Rgb::BLACK,
            bold: false,
            italic: false,
            align: Align::Left,
            role: TextRole::Body,
            adjust: None,
            icon: None,
            highlight: None,
            bullet: false,
            indent: 0.0,
            margin: Edges::ZERO,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn line_height(mut self, factor: f32) -> Self {
        self.line_height = factor;
        self
    }

    pub fn role(mut self, role: TextRole) -> Self {
        self.role = role;
        self
    }

    pub fn adjust(mut self, class: AdjustClass) -> Self {
        self.adjust = Some(class);
        self
    }

    pub fn icon(mut self, icon: Icon) -> Self {
        self.icon = Some(icon);
        self
    }

    pub fn highlight(mut self, color: Rgb, padding: Edges) -> Self {
        self.highlight = Some(Highlight { color, padding });
        self
    }

    /// Renders as a list item with a disc bullet in the left indent.
    pub fn bullet(mut self, indent: f32) -> Self {
        self.bullet = true;
        self.indent = indent;
        self.role = TextRole::ListItem;
        self
    }

    pub fn margin(mut self, margin: Edges) -> Self {
        self.margin = margin;
        self
    }

    pub fn plain_text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn padding(mut self, padding: Edges) -> Self {
        self.padding = padding;
        self
    }

    pub fn background(mut self, color: Rgb) -> Self {
        self.background = Some(color);
        self
    }

    pub fn border_bottom(mut self, width: f32, color: Rgb) -> Self {
        self.border_bottom = Some(Border { width, color });
        self
    }

    pub fn border_right(mut self, width: f32, color: Rgb) -> Self {
        self.border_right = Some(Border { width, color });
        self
    }

    pub fn gap(mut self, gap: f32) -> Self {
        self.gap = gap;
        self
    }

    pub fn min_height(mut self, height: f32) -> Self {
        self.min_height = height;
        self
    }

    pub fn anchor_last_bottom(mut self) -> Self {
        self.anchor_last_bottom = true;
        self
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn children(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(nodes);
        self
    }
}

impl Row {
    pub fn new(gap: f32) -> Self {
        Self {
            gap,
            columns: Vec::new(),
        }
    }

    pub fn column(mut self, fraction: f32, node: impl Into<Node>) -> Self {
        self.columns.push(Column {
            fraction,
            node: node.into(),
        });
        self
    }
}

impl Rule {
    pub fn full(thickness: f32, color: Rgb) -> Self {
        Self {
            thickness,
            color,
            width_fraction: 1.0,
            align_right: false,
        }
    }

    pub fn partial(thickness: f32, color: Rgb, width_fraction: f32, align_right: bool) -> Self {
        Self {
            thickness,
            color,
            width_fraction,
            align_right,
        }
    }
}

impl From<Block> for Node {
    fn from(block: Block) -> Self {
        Node::Block(block)
    }
}

impl From<Row> for Node {
    fn from(row: Row) -> Self {
        Node::Row(row)
    }
}

impl From<TextBlock> for Node {
    fn from(text: TextBlock) -> Self {
        Node::Text(text)
    }
}

impl From<Rule> for Node {
    fn from(rule: Rule) -> Self {
        Node::Rule(rule)
    }
}

impl From<Bar> for Node {
    fn from(bar: Bar) -> Self {
        Node::Bar(bar)
    }
}

pub fn spacer(height: f32) -> Node {
    Node::Spacer { height }
}

/// The rendered page: a fixed-width root at letter size whose content may
/// flow below the fold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub width: f32,
    pub min_height: f32,
    pub background: Rgb,
    pub root: Node,
}

impl Page {
    pub fn letter(root: impl Into<Node>) -> Self {
        Self {
            width: PAGE_WIDTH_PX,
            min_height: PAGE_HEIGHT_PX,
            background: Rgb::WHITE,
            root: root.into(),
        }
    }

    /// Every text block in document order.
    pub fn texts(&self) -> Vec<&TextBlock> {
        let mut out = Vec::new();
        collect_texts(&self.root, &mut out);
        out
    }
}

fn collect_texts<'a>(node: &'a Node, out: &mut Vec<&'a TextBlock>) {
    match node {
        Node::Text(text) => out.push(text),
        Node::Block(block) => block.children.iter().for_each(|c| collect_texts(c, out)),
        Node::Row(row) => row.columns.iter().for_each(|c| collect_texts(&c.node, out)),
        Node::Rule(_) | Node::Bar(_) | Node::Spacer { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_conversions() {
        assert!((pt(12.0) - 16.0).abs() < 1e-4);
        assert!((cm(2.54) - 96.0).abs() < 0.01);
        assert!((rem(0.5) - 8.0).abs() < 1e-4);
    }

    #[test]
    fn test_texts_walks_rows_and_blocks() {
        let page = Page::letter(
            Block::new()
                .child(TextBlock::new("a", 12.0))
                .child(Row::new(0.0).column(0.5, TextBlock::new("b", 12.0)).column(
                    0.5,
                    Block::new().child(TextBlock::new("c", 12.0)),
                )),
        );
        let texts: Vec<String> = page.texts().iter().map(|t| t.plain_text()).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_rgb_hex() {
        assert_eq!(Rgb::hex(0x171D8C), Rgb(0x17, 0x1D, 0x8C));
    }
}
