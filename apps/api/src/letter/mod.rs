// Cover letters: generated text with `**bold**` markup, shown as rich text
// and laid out onto letter pages by a dedicated text flow.

pub mod flow;
pub mod markup;
pub mod pdf;

use serde::{Deserialize, Serialize};

use crate::export::{file_stem, ExportError};
use markup::{rich_lines, strip_markup, RichLine};

/// What the user is applying for. Free-text fields are uppercased on submit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationContext {
    pub job_title: String,
    pub is_general_application: bool,
    pub company_name: String,
    pub is_company_unknown: bool,
    pub recipient_name: String,
    pub is_recipient_unknown: bool,
}

impl ApplicationContext {
    pub fn normalized(mut self) -> Self {
        self.job_title = self.job_title.trim().to_uppercase();
        self.company_name = self.company_name.trim().to_uppercase();
        self.recipient_name = self.recipient_name.trim().to_uppercase();
        self
    }

    pub fn salutation(&self) -> String {
        if !self.is_recipient_unknown && !self.recipient_name.is_empty() {
            format!("Estimado/a {}:", self.recipient_name)
        } else {
            "Estimados/as señores/as:".to_string()
        }
    }

    /// The specific position, unless this is a general application.
    pub fn position(&self) -> Option<&str> {
        (!self.is_general_application && !self.job_title.is_empty()).then_some(self.job_title.as_str())
    }

    pub fn company(&self) -> Option<&str> {
        (!self.is_company_unknown && !self.company_name.is_empty()).then_some(self.company_name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverLetterView {
    pub lines: Vec<RichLine>,
    pub plain_text: String,
}

impl CoverLetterView {
    pub fn new(content: &str) -> Self {
        Self {
            lines: rich_lines(content),
            plain_text: strip_markup(content),
        }
    }
}

/// `Carta_Presentacion_<sanitized name>.pdf`.
pub fn letter_file_name(name: &str) -> String {
    format!("Carta_Presentacion_{}.pdf", file_stem(name))
}

/// Lays out and draws a letter. CPU-bound; callers run it off the runtime.
pub fn render_letter_pdf(content: &str, person_name: &str) -> Result<Vec<u8>, ExportError> {
    let layout = flow::layout_letter(content, person_name);
    pdf::draw_letter(&layout, &letter_file_name(person_name))
}
