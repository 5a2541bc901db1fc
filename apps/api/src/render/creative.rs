//! Creative template: right-aligned title-case name over double rules, a
//! tinted contact box, a 7/12 | 5/12 body and a footer rule pinned to the
//! bottom of the page.

use crate::models::document::Document;
use crate::render::format::{
    capitalize_words, format_exp_date, format_url, license_line, link_target, or_placeholder,
    sort_by_date, split_bullets, tel_target, title_case,
};
use crate::render::layout::{
    cm, rem, spacer, AdjustClass, Align, Block, Edges, Icon, IconKind, Node, Page, Rgb, Row, Rule,
    Span, TextBlock, PAGE_HEIGHT_PX,
};
use crate::render::split_row;

const ACCENT_LIGHT: Rgb = Rgb::hex(0xFCE8EC);
const ACCENT_DARK: Rgb = Rgb::hex(0xE9B3BF);
const TEXT_DARK: Rgb = Rgb::hex(0x334155);
const TEXT_LIGHT: Rgb = Rgb::hex(0x64748B);
const SLATE_200: Rgb = Rgb::hex(0xE2E8F0);
const SLATE_300: Rgb = Rgb::hex(0xCBD5E1);
const SLATE_600: Rgb = Rgb::hex(0x475569);

const TEXT_BASE: f32 = 16.0;
const TEXT_SM: f32 = 14.0;

pub fn render(doc: &Document) -> Page {
    let accent = Rgb::from(&doc.accent_color);

    let content = Block::new()
        .child(header(doc, accent))
        .child(spacer(rem(2.0)))
        .child(contact_box(doc))
        .child(spacer(rem(2.0)))
        .child(body(doc, accent));

    let footer = Block::new()
        .padding(Edges::new(rem(1.0), 0.0, 0.0, 0.0))
        .gap(rem(0.75))
        .child(Rule::partial(3.0, ACCENT_DARK, 0.5, false))
        .child(Rule::full(3.0, ACCENT_DARK));

    let root = Block::new()
        .padding(Edges::new(cm(0.5), cm(1.75), rem(3.0), cm(1.75)))
        .min_height(PAGE_HEIGHT_PX)
        .anchor_last_bottom()
        .child(content)
        .child(footer);
    Page::letter(root)
}

fn adjusted(text: impl Into<String>, size: f32) -> TextBlock {
    TextBlock::new(text, size).adjust(AdjustClass::TextAdjust)
}

fn header(doc: &Document, accent: Rgb) -> Block {
    let name = title_case(doc.personal.name.trim());
    let name = if name.is_empty() {
        "Tu Nombre".to_string()
    } else {
        name
    };
    Block::new()
        .padding(Edges::new(rem(1.0), 0.0, 0.0, 0.0))
        .child(
            TextBlock::new(name, 60.0)
                .bold()
                .color(accent)
                .align(Align::Right)
                .line_height(1.0),
        )
        .child(spacer(rem(1.5)))
        .child(
            Block::new()
                .gap(rem(0.75))
                .child(Rule::full(3.0, ACCENT_DARK))
                .child(Rule::partial(3.0, ACCENT_DARK, 0.5, true)),
        )
}

fn contact_box(doc: &Document) -> Block {
    let personal = &doc.personal;
    let phone = personal.full_phone();
    let email = personal.email.trim().to_string();

    let candidates = [
        (IconKind::Email, email.clone(), Some(format!("mailto:{email}"))),
        (IconKind::Phone, phone.clone(), Some(tel_target(&phone))),
        (IconKind::Location, personal.city_and_country.trim().to_string(), None),
        (
            IconKind::Linkedin,
            format_url(&personal.linkedin),
            link_target(&personal.linkedin),
        ),
        (
            IconKind::Website,
            format_url(&personal.website),
            link_target(&personal.website),
        ),
    ];
    let items: Vec<Node> = candidates
        .into_iter()
        .filter(|(_, text, _)| !text.is_empty())
        .map(|(kind, text, href)| {
            TextBlock::from_spans(vec![Span::plain(text).with_href(href)], TEXT_SM)
                .color(TEXT_DARK)
                .adjust(AdjustClass::TextAdjust)
                .icon(Icon {
                    kind,
                    size: 20.0,
                    gap: 12.0,
                    color: ACCENT_DARK,
                    adjust: None,
                })
                .into()
        })
        .collect();

    let per_row = contact_columns(items.len());
    let mut grid = Block::new().gap(rem(1.0));
    let mut items = items.into_iter().peekable();
    while items.peek().is_some() {
        let mut row = Row::new(rem(2.0));
        for _ in 0..per_row {
            let cell = items.next().unwrap_or_else(|| spacer(0.0));
            row = row.column(1.0 / per_row as f32, cell);
        }
        grid = grid.child(row);
    }

    Block::new()
        .padding(Edges::all(rem(1.0)))
        .background(ACCENT_LIGHT)
        .child(
            adjusted("Información de contacto", TEXT_BASE)
                .bold()
                .color(TEXT_DARK)
                .align(Align::Center),
        )
        .child(spacer(rem(0.75)))
        .child(grid)
}

/// Three columns, except exactly four items which sit two by two.
fn contact_columns(count: usize) -> usize {
    if count == 4 {
        2
    } else {
        3
    }
}

fn section(title: &str, accent: Rgb, children: Vec<Node>) -> Node {
    let pill = Edges::symmetric(rem(0.5), rem(1.0));
    Block::new()
        .child(
            adjusted(title, TEXT_BASE)
                .bold()
                .color(accent)
                .highlight(ACCENT_LIGHT, pill)
                .margin(pill),
        )
        .child(spacer(rem(1.0)))
        .child(Block::new().gap(rem(1.0)).children(children))
        .into()
}

fn entry_header(title: &str, dates: String) -> Node {
    let title = adjusted(capitalize_words(title), TEXT_BASE)
        .bold()
        .color(TEXT_DARK);
    if dates.is_empty() {
        title.into()
    } else {
        split_row(title, adjusted(dates, TEXT_SM).bold().color(TEXT_LIGHT))
    }
}

fn subtitle(text: &str) -> TextBlock {
    adjusted(text.to_uppercase(), TEXT_SM).bold().color(TEXT_LIGHT)
}

fn bullets(text: &str) -> Option<Node> {
    let items = split_bullets(text);
    if items.is_empty() {
        return None;
    }
    Some(
        Block::new()
            .padding(Edges::new(rem(0.25), 0.0, 0.0, 0.0))
            .gap(rem(0.25))
            .children(items.into_iter().map(|item| {
                adjusted(item, TEXT_SM)
                    .color(SLATE_600)
                    .line_height(1.375)
                    .bullet(rem(0.75))
                    .into()
            }))
            .into(),
    )
}

fn body(doc: &Document, accent: Rgb) -> Row {
    let mut left: Vec<Node> = Vec::new();
    if !doc.summary.trim().is_empty() {
        left.push(section(
            "Perfil profesional",
            accent,
            vec![adjusted(doc.summary.trim(), TEXT_SM)
                .color(TEXT_DARK)
                .align(Align::Justify)
                .line_height(1.625)
                .into()],
        ));
    }
    if !doc.experience.is_empty() {
        let entries = sort_by_date(&doc.experience)
            .into_iter()
            .map(|exp| {
                let dates = format!(
                    "{} - {}",
                    format_exp_date(&exp.start_month, &exp.start_date, " "),
                    format_exp_date(&exp.end_month, &exp.end_date, " ")
                );
                let mut block = Block::new()
                    .child(entry_header(or_placeholder(&exp.position, "Cargo"), dates))
                    .child(subtitle(or_placeholder(&exp.company, "Empresa")));
                if let Some(list) = bullets(&exp.description) {
                    block = block.child(list);
                }
                block.into()
            })
            .collect();
        left.push(section("Experiencia", accent, entries));
    }

    let mut right: Vec<Node> = Vec::new();
    if !doc.education.is_empty() {
        let entries = sort_by_date(&doc.education)
            .into_iter()
            .map(|edu| {
                let dates = if edu.end_date.trim().is_empty() {
                    edu.start_date.clone()
                } else {
                    format!("{} - {}", edu.start_date, edu.end_date)
                };
                Block::new()
                    .child(entry_header(or_placeholder(&edu.degree, "Título"), dates))
                    .child(subtitle(or_placeholder(&edu.institution, "Institución")))
                    .into()
            })
            .collect();
        right.push(section("Estudios", accent, entries));
    }
    if !doc.skills.is_empty() {
        let items: Vec<Node> = doc
            .skills
            .iter()
            .map(|skill| {
                TextBlock::from_spans(
                    vec![
                        Span::plain(format!("{}: ", capitalize_words(&skill.skill))),
                        Span::bold(skill.level.label()),
                    ],
                    TEXT_SM,
                )
                .color(TEXT_DARK)
                .adjust(AdjustClass::TextAdjust)
                .bullet(rem(1.0))
                .into()
            })
            .collect();
        right.push(section(
            "Habilidades Técnicas",
            accent,
            vec![Block::new().gap(rem(0.25)).children(items).into()],
        ));
    }
    let license = license_line(&doc.license_classes());
    if !doc.complementary_training.is_empty() || license.is_some() {
        let mut entries: Vec<Node> = doc
            .complementary_training
            .iter()
            .map(|course| {
                let mut block = Block::new()
                    .child(entry_header(
                        or_placeholder(&course.course, "Curso"),
                        course.year.trim().to_string(),
                    ))
                    .child(subtitle(or_placeholder(&course.institution, "Institución")));
                if let Some(list) = bullets(&course.description) {
                    block = block.child(list);
                }
                block.into()
            })
            .collect();
        if let Some(line) = license {
            let mut block = Block::new();
            if !entries.is_empty() {
                block = block
                    .child(Rule::full(1.0, SLATE_200))
                    .child(spacer(rem(1.0)));
            }
            block = block
                .child(
                    adjusted("Licencia de Conducir", TEXT_BASE)
                        .bold()
                        .color(TEXT_DARK),
                )
                .child(
                    adjusted(line, TEXT_SM)
                        .color(SLATE_600)
                        .margin(Edges::new(rem(0.25), 0.0, 0.0, 0.0)),
                );
            entries.push(block.into());
        }
        right.push(section("Información Adicional", accent, entries));
    }

    Row::new(0.0)
        .column(
            7.0 / 12.0,
            Block::new()
                .padding(Edges::new(0.0, rem(1.0), 0.0, 0.0))
                .border_right(1.0, SLATE_300)
                .gap(rem(1.5))
                .children(left),
        )
        .column(
            5.0 / 12.0,
            Block::new()
                .padding(Edges::new(0.0, 0.0, 0.0, rem(1.0)))
                .gap(rem(1.5))
                .children(right),
        )
}
