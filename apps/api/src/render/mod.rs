//! Template renderer: a pure function from `(Document, Template)` to a
//! letter-size layout tree.

pub mod classic;
pub mod creative;
pub mod format;
pub mod layout;
pub mod modern;

use serde::{Deserialize, Serialize};

use crate::models::document::Document;
use crate::render::layout::{Node, Page, Row, TextBlock};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Template {
    /// Single-column ATS-friendly layout.
    #[default]
    Classic,
    /// One-third sidebar plus main column.
    Modern,
    /// Header, contact box and a 7/12 | 5/12 body.
    Creative,
}

/// How a template's layout is turned into PDF pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStrategy {
    /// Paginated text flow with real PDF text.
    TextFlow,
    /// One full-bleed raster image.
    RasterCapture,
}

impl Template {
    pub fn strategy(self) -> ExportStrategy {
        match self {
            Template::Classic => ExportStrategy::TextFlow,
            Template::Modern | Template::Creative => ExportStrategy::RasterCapture,
        }
    }
}

pub fn render(doc: &Document, template: Template) -> Page {
    match template {
        Template::Classic => classic::render(doc),
        Template::Modern => modern::render(doc),
        Template::Creative => creative::render(doc),
    }
}

/// Left/right pair with the right side flush right, as used for
/// "title ........ dates" entry headers.
pub(crate) fn split_row(left: TextBlock, right: TextBlock) -> Node {
    Row::new(8.0)
        .column(0.66, left)
        .column(0.34, right.align(layout::Align::Right))
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::{
        EducationEntry, ExperienceEntry, LicenseClass, PRESENT_SENTINEL,
    };

    fn ana_perez() -> Document {
        let mut doc = Document::default();
        doc.personal.name = "Ana Pérez".into();
        doc.experience.push(ExperienceEntry {
            position: "Analista".into(),
            company: "Acme".into(),
            start_month: "Marzo".into(),
            start_date: "2020".into(),
            end_month: String::new(),
            end_date: PRESENT_SENTINEL.into(),
            is_current: true,
            ..Default::default()
        });
        doc.education.push(EducationEntry {
            degree: "Ingeniería".into(),
            institution: "Universidad de Chile".into(),
            start_date: "2013".into(),
            end_date: "2018".into(),
            ..Default::default()
        });
        doc
    }

    fn texts(page: &Page) -> Vec<String> {
        page.texts().iter().map(|t| t.plain_text()).collect()
    }

    fn index_of(texts: &[String], needle: &str) -> usize {
        texts
            .iter()
            .position(|t| t.contains(needle))
            .unwrap_or_else(|| panic!("'{needle}' not rendered in {texts:?}"))
    }

    #[test]
    fn test_ana_perez_scenario_across_templates() {
        let doc = ana_perez();
        for template in [Template::Classic, Template::Modern] {
            let texts = texts(&render(&doc, template));
            let date = index_of(&texts, "Marzo, 2020 - Presente");
            let education = index_of(&texts, "2013 - 2018");
            assert_eq!(texts[date], "Marzo, 2020 - Presente", "{template:?}");
            // Classic renders experience above education; Modern puts
            // education in the sidebar, which comes first in document order.
            if template == Template::Classic {
                assert!(date < education, "experience must precede education");
            }
        }
        let texts = texts(&render(&doc, Template::Creative));
        assert!(texts.iter().any(|t| t == "Marzo 2020 - Presente"));
        assert!(texts.iter().any(|t| t == "Ana Pérez"));
    }

    #[test]
    fn test_license_only_renders_additional_section() {
        let mut doc = Document::default();
        doc.has_driving_license = true;
        doc.driving_license.set(LicenseClass::B, true);
        for (template, title) in [
            (Template::Classic, "FORMACIÓN COMPLEMENTARIA"),
            (Template::Modern, "FORMACIÓN COMPLEMENTARIA"),
            (Template::Creative, "Información Adicional"),
        ] {
            let texts = texts(&render(&doc, template));
            assert!(texts.iter().any(|t| t == title), "{template:?}: {texts:?}");
            let licenses: Vec<&String> = texts.iter().filter(|t| t.starts_with("Clase")).collect();
            assert_eq!(licenses, vec!["Clase B, Chile"], "{template:?}");
        }
    }

    #[test]
    fn test_license_flag_without_classes_hides_section() {
        let mut doc = Document::default();
        doc.has_driving_license = true;
        for template in [Template::Classic, Template::Modern, Template::Creative] {
            let texts = texts(&render(&doc, template));
            assert!(!texts.iter().any(|t| t.starts_with("Clase")));
            assert!(!texts.iter().any(|t| t.contains("Licencia de Conducir")));
        }
    }

    #[test]
    fn test_empty_sections_are_hidden() {
        let doc = Document::default();
        let texts = texts(&render(&doc, Template::Classic));
        assert!(!texts.iter().any(|t| t == "EXPERIENCIA PROFESIONAL"));
        assert!(!texts.iter().any(|t| t == "EDUCACIÓN"));
        assert!(!texts.iter().any(|t| t == "HABILIDADES TÉCNICAS"));
    }

    #[test]
    fn test_render_is_pure() {
        let doc = ana_perez();
        for template in [Template::Classic, Template::Modern, Template::Creative] {
            assert_eq!(render(&doc, template), render(&doc, template));
        }
    }

    #[test]
    fn test_strategy_mapping() {
        assert_eq!(Template::Classic.strategy(), ExportStrategy::TextFlow);
        assert_eq!(Template::Modern.strategy(), ExportStrategy::RasterCapture);
        assert_eq!(Template::Creative.strategy(), ExportStrategy::RasterCapture);
    }
}
