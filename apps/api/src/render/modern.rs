//! Modern template: dark one-third sidebar with contact details, education
//! and training; two-thirds main column with name, summary, experience and
//! skill bars.

use crate::models::document::Document;
use crate::render::format::{
    capitalize_words, format_exp_date, format_location, format_url, license_line, link_target,
    or_placeholder, sort_by_date, split_bullets, tel_target,
};
use crate::render::layout::{
    cm, pt, rem, spacer, AdjustClass, Align, Bar, Block, Edges, Icon, IconKind, Node, Page, Rgb,
    Row, Span, TextBlock, PAGE_HEIGHT_PX,
};
use crate::render::split_row;

const SIDEBAR_BG: Rgb = Rgb::hex(0x171D8C);
const SIDEBAR_RULE: Rgb = Rgb::hex(0x475569);
const SLATE_200: Rgb = Rgb::hex(0xE2E8F0);
const SLATE_300: Rgb = Rgb::hex(0xCBD5E1);
const SLATE_400: Rgb = Rgb::hex(0x94A3B8);
const SLATE_500: Rgb = Rgb::hex(0x64748B);
const SLATE_600: Rgb = Rgb::hex(0x475569);
const SLATE_700: Rgb = Rgb::hex(0x334155);
const SLATE_800: Rgb = Rgb::hex(0x1E293B);
const SIDEBAR_PT: f32 = 9.0;

pub fn render(doc: &Document) -> Page {
    let accent = Rgb::from(&doc.accent_color);
    let root = Row::new(0.0)
        .column(1.0 / 3.0, sidebar(doc, accent))
        .column(2.0 / 3.0, main_column(doc, accent));
    Page::letter(root)
}

fn adjusted(text: impl Into<String>, size: f32) -> TextBlock {
    TextBlock::new(text, size).adjust(AdjustClass::TextAdjust)
}

fn sidebar_heading(title: &str, accent: Rgb) -> Node {
    Block::new()
        .padding(Edges::new(0.0, 0.0, 4.0, 0.0))
        .border_bottom(1.0, SIDEBAR_RULE)
        .child(adjusted(title.to_uppercase(), pt(12.0)).bold().color(accent))
        .into()
}

fn contact_item(kind: IconKind, text: String, href: Option<String>) -> Option<Node> {
    if text.trim().is_empty() {
        return None;
    }
    let icon = Icon {
        kind,
        size: rem(1.0),
        gap: rem(0.75),
        color: Rgb::WHITE,
        adjust: Some(AdjustClass::IconAdjust),
    };
    Some(
        TextBlock::from_spans(vec![Span::plain(text).with_href(href)], pt(SIDEBAR_PT))
            .color(Rgb::WHITE)
            .adjust(AdjustClass::TextAdjust)
            .icon(icon)
            .into(),
    )
}

fn sidebar(doc: &Document, accent: Rgb) -> Block {
    let personal = &doc.personal;
    let phone = personal.full_phone();
    let email = personal.email.trim().to_string();

    let mut contact = Block::new()
        .gap(rem(1.0))
        .child(sidebar_heading("Contacto", accent));
    let items = [
        contact_item(
            IconKind::Location,
            capitalize_words(personal.city_and_country.trim()),
            None,
        ),
        contact_item(IconKind::Phone, phone.clone(), Some(tel_target(&phone))),
        contact_item(IconKind::Email, email.clone(), Some(format!("mailto:{email}"))),
        contact_item(
            IconKind::Linkedin,
            format_url(&personal.linkedin),
            link_target(&personal.linkedin),
        ),
        contact_item(
            IconKind::Website,
            format_url(&personal.website),
            link_target(&personal.website),
        ),
    ];
    contact = contact.children(items.into_iter().flatten());

    let mut column = Block::new()
        .padding(Edges::new(cm(1.5), rem(2.0), rem(2.0), cm(1.75)))
        .background(SIDEBAR_BG)
        .min_height(PAGE_HEIGHT_PX)
        .child(contact);

    if !doc.education.is_empty() {
        let entries = sort_by_date(&doc.education).into_iter().map(|edu| {
            Block::new()
                .child(
                    adjusted(capitalize_words(or_placeholder(&edu.degree, "Título")), pt(SIDEBAR_PT))
                        .bold()
                        .color(Rgb::WHITE),
                )
                .child(organization(
                    or_placeholder(&edu.institution, "Institución"),
                    &edu.city,
                    &edu.country,
                ))
                .child(
                    adjusted(format!("{} - {}", edu.start_date, edu.end_date), pt(SIDEBAR_PT))
                        .color(SLATE_400),
                )
                .into()
        });
        column = column.child(sidebar_section("Educación", accent, entries.collect()));
    }

    let license = license_line(&doc.license_classes());
    if !doc.complementary_training.is_empty() || license.is_some() {
        let mut entries: Vec<Node> = doc
            .complementary_training
            .iter()
            .map(|course| {
                let mut block = Block::new()
                    .child(
                        adjusted(capitalize_words(or_placeholder(&course.course, "Curso")), pt(SIDEBAR_PT))
                            .bold()
                            .color(Rgb::WHITE),
                    )
                    .child(organization(&course.institution, &course.city, &course.country));
                if !course.year.trim().is_empty() {
                    block = block.child(
                        adjusted(course.year.trim(), pt(SIDEBAR_PT)).color(SLATE_400),
                    );
                }
                block.into()
            })
            .collect();
        if let Some(line) = license {
            entries.push(
                Block::new()
                    .child(
                        adjusted("Licencia de Conducir", pt(SIDEBAR_PT))
                            .bold()
                            .color(Rgb::WHITE),
                    )
                    .child(adjusted(line, pt(SIDEBAR_PT)).color(SLATE_300))
                    .into(),
            );
        }
        column = column.child(sidebar_section("Formación Complementaria", accent, entries));
    }
    column
}

fn sidebar_section(title: &str, accent: Rgb, entries: Vec<Node>) -> Block {
    Block::new()
        .padding(Edges::new(rem(2.0), 0.0, 0.0, 0.0))
        .child(sidebar_heading(title, accent))
        .child(spacer(rem(0.75)))
        .child(Block::new().gap(rem(1.0)).children(entries))
}

fn organization(name: &str, city: &str, country: &str) -> TextBlock {
    TextBlock::from_spans(
        vec![
            Span::plain(name.to_uppercase()),
            Span::plain(capitalize_words(&format_location(city, country))),
        ],
        pt(SIDEBAR_PT),
    )
    .color(SLATE_300)
    .adjust(AdjustClass::TextAdjust)
}

fn main_heading(title: &str) -> Node {
    Block::new()
        .padding(Edges::new(0.0, 0.0, 4.0, 0.0))
        .border_bottom(2.0, SLATE_200)
        .child(adjusted(title.to_uppercase(), pt(14.0)).bold().color(SLATE_800))
        .into()
}

fn main_column(doc: &Document, accent: Rgb) -> Block {
    let mut column = Block::new()
        .padding(Edges::new(cm(1.5), cm(1.75), rem(2.0), rem(2.0)))
        .child(
            TextBlock::new(
                capitalize_words(or_placeholder(&doc.personal.name, "Tu Nombre")),
                pt(28.0),
            )
            .bold()
            .color(SLATE_800)
            .line_height(1.25),
        )
        .child(spacer(rem(2.0)));

    if !doc.summary.trim().is_empty() {
        column = column.child(
            adjusted(doc.summary.trim(), pt(10.0))
                .color(SLATE_700)
                .align(Align::Justify)
                .line_height(1.625),
        );
    }

    if !doc.experience.is_empty() {
        let entries = sort_by_date(&doc.experience).into_iter().map(|exp| {
            let dates = format!(
                "{} - {}",
                format_exp_date(&exp.start_month, &exp.start_date, ", "),
                format_exp_date(&exp.end_month, &exp.end_date, ", ")
            );
            let mut block = Block::new()
                .child(split_row(
                    adjusted(capitalize_words(or_placeholder(&exp.position, "Cargo")), pt(11.0))
                        .bold()
                        .color(SLATE_700),
                    adjusted(dates, pt(10.0)).color(SLATE_500),
                ))
                .child(
                    TextBlock::from_spans(
                        vec![
                            Span::plain(or_placeholder(&exp.company, "Empresa").to_uppercase()),
                            Span::plain(capitalize_words(&format_location(&exp.city, &exp.country))),
                        ],
                        pt(10.5),
                    )
                    .bold()
                    .color(accent)
                    .adjust(AdjustClass::TextAdjust),
                );
            let items = split_bullets(&exp.description);
            if !items.is_empty() {
                block = block.child(
                    Block::new()
                        .padding(Edges::new(rem(0.25), 0.0, 0.0, 0.0))
                        .gap(rem(0.25))
                        .children(items.into_iter().map(|item| {
                            adjusted(item, pt(10.0))
                                .color(SLATE_600)
                                .line_height(1.375)
                                .bullet(rem(1.0))
                                .into()
                        })),
                );
            }
            block.into()
        });
        column = column.child(
            Block::new()
                .padding(Edges::new(rem(1.5), 0.0, 0.0, 0.0))
                .child(main_heading("Experiencia Profesional"))
                .child(spacer(rem(1.25)))
                .child(Block::new().gap(rem(1.25)).children(entries)),
        );
    }

    if !doc.skills.is_empty() {
        let cells: Vec<Node> = doc
            .skills
            .iter()
            .map(|skill| {
                Block::new()
                    .child(split_row(
                        adjusted(capitalize_words(&skill.skill), pt(10.0))
                            .bold()
                            .color(SLATE_700),
                        adjusted(skill.level.label(), pt(9.0)).color(SLATE_500),
                    ))
                    .child(spacer(rem(0.25)))
                    .child(Bar {
                        height: 8.0,
                        fraction: skill.level.bar_fraction(),
                        track: SLATE_200,
                        fill: accent,
                    })
                    .into()
            })
            .collect();
        let mut grid = Block::new().gap(rem(1.0));
        let mut cells = cells.into_iter();
        while let Some(first) = cells.next() {
            let second = cells.next().unwrap_or_else(|| spacer(0.0));
            grid = grid.child(
                Row::new(rem(2.0))
                    .column(0.5, first)
                    .column(0.5, second),
            );
        }
        column = column.child(
            Block::new()
                .padding(Edges::new(rem(1.5), 0.0, 0.0, 0.0))
                .child(main_heading("Habilidades Técnicas"))
                .child(spacer(rem(1.25)))
                .child(grid),
        );
    }
    column
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::{SkillEntry, SkillLevel};
    use crate::render::layout::Node;

    fn bars(node: &Node, out: &mut Vec<f32>) {
        match node {
            Node::Bar(bar) => out.push(bar.fraction),
            Node::Block(b) => b.children.iter().for_each(|c| bars(c, out)),
            Node::Row(r) => r.columns.iter().for_each(|c| bars(&c.node, out)),
            _ => {}
        }
    }

    #[test]
    fn test_skill_bars_follow_levels() {
        let mut doc = Document::default();
        for level in [SkillLevel::Basico, SkillLevel::Intermedio, SkillLevel::Avanzado] {
            doc.skills.push(SkillEntry {
                skill: "x".into(),
                level,
                ..Default::default()
            });
        }
        let page = render(&doc);
        let mut fractions = Vec::new();
        bars(&page.root, &mut fractions);
        assert_eq!(fractions, vec![0.33, 0.66, 1.0]);
    }

    #[test]
    fn test_contact_links_and_adjust_classes() {
        let mut doc = Document::default();
        doc.personal.phone_number = "9 1234 5678".into();
        doc.personal.email = "ana@example.cl".into();
        let page = render(&doc);
        let phone = page
            .texts()
            .into_iter()
            .find(|t| t.plain_text() == "+56 9 1234 5678")
            .unwrap();
        assert_eq!(phone.spans[0].href.as_deref(), Some("tel:+56912345678"));
        assert_eq!(phone.adjust, Some(AdjustClass::TextAdjust));
        assert_eq!(phone.icon.unwrap().adjust, Some(AdjustClass::IconAdjust));
        let email = page
            .texts()
            .into_iter()
            .find(|t| t.plain_text() == "ana@example.cl")
            .unwrap();
        assert_eq!(email.spans[0].href.as_deref(), Some("mailto:ana@example.cl"));
    }

    #[test]
    fn test_font_size_overrides_are_ignored() {
        let mut doc = Document::default();
        doc.personal.name = "Ana".into();
        doc.font_sizes.name = 32;
        let page = render(&doc);
        let name = page
            .texts()
            .into_iter()
            .find(|t| t.plain_text() == "Ana")
            .unwrap();
        assert!((name.size - pt(28.0)).abs() < 1e-4);
    }
}
