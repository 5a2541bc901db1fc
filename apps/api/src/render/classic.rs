//! Classic / ATS template: one column, centered header, real headings.

use crate::models::document::Document;
use crate::render::format::{
    capitalize_words, format_exp_date, format_location, format_url, license_line, link_target,
    or_placeholder, sort_by_date, split_bullets,
};
use crate::render::layout::{
    cm, pt, rem, spacer, Align, Block, Edges, Node, Page, Rgb, Row, Span, TextBlock, TextRole,
};
use crate::render::split_row;

const RULE_COLOR: Rgb = Rgb::hex(0x1F2937);
const LINK_COLOR: Rgb = Rgb::hex(0x1D4ED8);
const BODY_PT: f32 = 10.0;
const DATE_PT: f32 = 11.0;
const NAME_PLACEHOLDER: &str = "TU NOMBRE COMPLETO";

pub fn render(doc: &Document) -> Page {
    let accent = Rgb::from(&doc.accent_color);

    let mut main = Block::new().padding(Edges::new(8.0, 0.0, 0.0, 0.0));
    if !doc.summary.trim().is_empty() {
        main = main.child(
            TextBlock::new(doc.summary.trim(), pt(BODY_PT))
                .align(Align::Justify)
                .line_height(1.625),
        );
    }
    if !doc.experience.is_empty() {
        main = main.child(section("Experiencia Profesional", accent, experience(doc)));
    }
    if !doc.education.is_empty() {
        main = main.child(section("Educación", accent, education(doc)));
    }
    if !doc.skills.is_empty() {
        main = main.child(section("Habilidades Técnicas", accent, vec![skills(doc)]));
    }
    let license = license_line(&doc.license_classes());
    if !doc.complementary_training.is_empty() || license.is_some() {
        main = main.child(section(
            "Formación Complementaria",
            accent,
            additional(doc, license),
        ));
    }

    let root = Block::new()
        .padding(Edges::new(cm(1.5), cm(1.75), cm(2.0), cm(2.0)))
        .child(header(doc, accent))
        .child(main);
    Page::letter(root)
}

fn header(doc: &Document, accent: Rgb) -> Block {
    let personal = &doc.personal;
    let name = or_placeholder(&personal.name, NAME_PLACEHOLDER).to_uppercase();
    let phone = personal.full_phone();

    let mut details: Vec<Span> = Vec::new();
    if !personal.city_and_country.trim().is_empty() {
        details.push(Span::plain(capitalize_words(personal.city_and_country.trim())));
    }
    if !personal.email.trim().is_empty() {
        details.push(Span::plain(personal.email.trim()));
    }
    if !phone.is_empty() {
        details.push(Span::plain(phone));
    }
    for link in [&personal.linkedin, &personal.website] {
        if let Some(target) = link_target(link) {
            details.push(
                Span::plain(format_url(link))
                    .with_color(LINK_COLOR)
                    .with_href(Some(target)),
            );
        }
    }

    let mut spans = Vec::with_capacity(details.len() * 2);
    for (i, detail) in details.into_iter().enumerate() {
        if i > 0 {
            spans.push(Span::plain(" \u{2022} "));
        }
        spans.push(detail);
    }

    let mut block = Block::new()
        .padding(Edges::new(0.0, 0.0, 12.0, 0.0))
        .border_bottom(2.0, RULE_COLOR)
        .child(
            TextBlock::new(name, pt(doc.font_sizes.name as f32))
                .bold()
                .color(accent)
                .align(Align::Center)
                .role(TextRole::Heading1),
        );
    if !spans.is_empty() {
        block = block.child(
            TextBlock::from_spans(spans, pt(doc.font_sizes.personal as f32))
                .align(Align::Center)
                .margin(Edges::new(rem(0.5), 0.0, 0.0, 0.0)),
        );
    }
    block
}

fn section(title: &str, accent: Rgb, body: Vec<Node>) -> Block {
    Block::new()
        .padding(Edges::new(12.0, 0.0, 0.0, 0.0))
        .child(
            Block::new()
                .padding(Edges::new(0.0, 0.0, 4.0, 0.0))
                .border_bottom(2.0, RULE_COLOR)
                .child(
                    TextBlock::new(title.to_uppercase(), pt(12.0))
                        .bold()
                        .color(accent)
                        .align(Align::Center)
                        .role(TextRole::Heading2),
                ),
        )
        .child(spacer(12.0))
        .children(body)
}

fn entry_title(text: &str) -> TextBlock {
    TextBlock::new(capitalize_words(text), pt(BODY_PT))
        .bold()
        .role(TextRole::Heading3)
}

fn entry_date(text: String) -> TextBlock {
    TextBlock::new(text, pt(DATE_PT))
}

fn organization_line(name: &str, city: &str, country: &str) -> TextBlock {
    TextBlock::from_spans(
        vec![
            Span::plain(name.to_uppercase()),
            Span::plain(capitalize_words(&format_location(city, country))),
        ],
        pt(BODY_PT),
    )
    .italic()
}

fn bullets(text: &str) -> Option<Block> {
    let items = split_bullets(text);
    if items.is_empty() {
        return None;
    }
    let list = Block::new()
        .padding(Edges::new(rem(0.25), 0.0, 0.0, 0.0))
        .gap(4.0)
        .children(items.into_iter().map(|item| {
            TextBlock::new(item, pt(BODY_PT))
                .line_height(1.375)
                .bullet(rem(1.0))
                .into()
        }));
    Some(list)
}

fn experience(doc: &Document) -> Vec<Node> {
    let entries = sort_by_date(&doc.experience);
    let last = entries.len().saturating_sub(1);
    entries
        .iter()
        .enumerate()
        .map(|(i, exp)| {
            let dates = format!(
                "{} - {}",
                format_exp_date(&exp.start_month, &exp.start_date, ", "),
                format_exp_date(&exp.end_month, &exp.end_date, ", ")
            );
            let mut block = Block::new()
                .child(split_row(
                    entry_title(or_placeholder(&exp.position, "Cargo")),
                    entry_date(dates),
                ))
                .child(organization_line(
                    or_placeholder(&exp.company, "Empresa"),
                    &exp.city,
                    &exp.country,
                ));
            if let Some(list) = bullets(&exp.description) {
                block = block.child(list);
            }
            if i < last {
                block = block.padding(Edges::new(0.0, 0.0, 12.0, 0.0));
            }
            block.into()
        })
        .collect()
}

fn education(doc: &Document) -> Vec<Node> {
    let entries = sort_by_date(&doc.education);
    let last = entries.len().saturating_sub(1);
    entries
        .iter()
        .enumerate()
        .map(|(i, edu)| {
            let mut block = Block::new()
                .child(split_row(
                    entry_title(or_placeholder(&edu.degree, "Título")),
                    entry_date(format!("{} - {}", edu.start_date, edu.end_date)),
                ))
                .child(organization_line(
                    or_placeholder(&edu.institution, "Institución"),
                    &edu.city,
                    &edu.country,
                ));
            if i < last {
                block = block.padding(Edges::new(0.0, 0.0, 8.0, 0.0));
            }
            block.into()
        })
        .collect()
}

// CSS multi-column flow: the first column takes the larger half.
fn skills(doc: &Document) -> Node {
    let items: Vec<Node> = doc
        .skills
        .iter()
        .map(|skill| {
            TextBlock::new(
                capitalize_words(&format!("{}: {}", skill.skill, skill.level.label())),
                pt(BODY_PT),
            )
            .bullet(rem(1.0))
            .margin(Edges::new(0.0, 0.0, 4.0, 0.0))
            .into()
        })
        .collect();
    let split = items.len().div_ceil(2);
    let mut left = items;
    let right = left.split_off(split);
    Row::new(40.0)
        .column(0.5, Block::new().children(left))
        .column(0.5, Block::new().children(right))
        .into()
}

fn additional(doc: &Document, license: Option<String>) -> Vec<Node> {
    let mut nodes: Vec<Node> = Vec::new();
    for course in &doc.complementary_training {
        let title = match course.course.trim() {
            "" => "Curso.".to_string(),
            text if text.ends_with('.') => text.to_string(),
            text => format!("{text}."),
        };
        let mut block = Block::new()
            .child(split_row(
                entry_title(&title),
                entry_date(or_placeholder(&course.year, "Año").to_string()),
            ))
            .child(organization_line(
                or_placeholder(&course.institution, "Institución"),
                &course.city,
                &course.country,
            ));
        if let Some(list) = bullets(&course.description) {
            block = block.child(list);
        }
        nodes.push(block.into());
    }
    if let Some(line) = license {
        nodes.push(
            Block::new()
                .padding(Edges::new(rem(0.5), 0.0, 0.0, 0.0))
                .child(
                    TextBlock::new("Licencia de Conducir", pt(12.0))
                        .bold()
                        .role(TextRole::Heading3),
                )
                .child(TextBlock::new(line, pt(BODY_PT)).margin(Edges::new(
                    rem(0.25),
                    0.0,
                    0.0,
                    0.0,
                )))
                .into(),
        );
    }
    vec![Block::new().gap(12.0).children(nodes).into()]
}
