//! Structured CV data returned by the extraction call, and how it becomes a
//! fresh document.

use serde::Deserialize;

use crate::assistant::AssistantError;
use crate::models::document::{
    Document, EducationEntry, ExperienceEntry, SkillEntry, TrainingEntry,
};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExtractedPersonal {
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(alias = "phoneNumber")]
    pub phone_number: Option<String>,
    #[serde(alias = "cityAndCountry")]
    pub city_and_country: Option<String>,
    pub linkedin: Option<String>,
    pub website: Option<String>,
}

/// Partial document as understood by the model. Entry ids are assigned on
/// arrival.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExtractedCv {
    pub personal: Option<ExtractedPersonal>,
    pub summary: Option<String>,
    pub experience: Vec<ExperienceEntry>,
    pub education: Vec<EducationEntry>,
    pub skills: Vec<SkillEntry>,
    #[serde(alias = "complementaryTraining")]
    pub complementary_training: Vec<TrainingEntry>,
}

fn merge(slot: &mut String, value: Option<String>) {
    if let Some(value) = value.map(|v| v.trim().to_string()) {
        if !value.is_empty() {
            *slot = value;
        }
    }
}

impl ExtractedCv {
    /// A new document: defaults, overlaid with whatever was extracted.
    pub fn into_document(self) -> Document {
        let mut doc = Document::default();
        if let Some(personal) = self.personal {
            merge(&mut doc.personal.name, personal.name);
            merge(&mut doc.personal.email, personal.email);
            merge(&mut doc.personal.phone_number, personal.phone_number);
            merge(&mut doc.personal.city_and_country, personal.city_and_country);
            merge(&mut doc.personal.linkedin, personal.linkedin);
            merge(&mut doc.personal.website, personal.website);
        }
        merge(&mut doc.summary, self.summary);
        doc.experience = self.experience;
        doc.education = self.education;
        doc.skills = self.skills;
        doc.complementary_training = self.complementary_training;
        doc.normalized()
    }
}

/// Text layer of an uploaded PDF.
pub fn pdf_to_text(bytes: &[u8]) -> Result<String, AssistantError> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| AssistantError::PdfText(e.to_string()))?;
    if text.trim().is_empty() {
        return Err(AssistantError::Validation(
            "El PDF no contiene texto legible.".to_string(),
        ));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::{SkillLevel, DEFAULT_PHONE_COUNTRY_CODE, PRESENT_SENTINEL};

    const SAMPLE: &str = r#"{
        "personal": {"name": "Ana Pérez", "email": "ana@example.cl", "phone_number": "912345678",
                     "city_and_country": "Santiago, Chile", "linkedin": "", "website": ""},
        "summary": "Ingeniera civil.",
        "experience": [{"position": "Analista", "company": "ACME", "start_month": "Marzo",
                        "start_date": "2020", "end_month": "", "end_date": "Presente",
                        "description": "Gestioné proyectos"}],
        "education": [{"institution": "UChile", "degree": "Ingeniería", "end_date": "2018"}],
        "skills": [{"skill": "Excel"}, {"skill": "SQL", "level": "Avanzado"}],
        "complementaryTraining": [{"course": "Scrum", "institution": "Coursera", "year": "2021"}]
    }"#;

    #[test]
    fn test_extracted_cv_becomes_normalized_document() {
        let extracted: ExtractedCv = serde_json::from_str(SAMPLE).unwrap();
        let doc = extracted.into_document();
        assert_eq!(doc.personal.name, "Ana Pérez");
        assert_eq!(doc.personal.phone_country_code, DEFAULT_PHONE_COUNTRY_CODE);
        assert_eq!(doc.experience.len(), 1);
        assert!(doc.experience[0].is_current);
        assert_eq!(doc.experience[0].end_date, PRESENT_SENTINEL);
        assert_eq!(doc.skills[0].level, SkillLevel::Intermedio);
        assert_eq!(doc.skills[1].level, SkillLevel::Avanzado);
        assert_eq!(doc.complementary_training[0].course, "Scrum");
        assert_ne!(doc.experience[0].id, doc.education[0].id);
    }

    #[test]
    fn test_missing_sections_keep_defaults() {
        let extracted: ExtractedCv = serde_json::from_str(r#"{"summary": "  "}"#).unwrap();
        let doc = extracted.into_document();
        assert!(doc.summary.is_empty());
        assert!(doc.personal.name.is_empty());
        assert!(doc.experience.is_empty() && doc.skills.is_empty());
        assert_eq!(doc.accent_color, Document::default().accent_color);
    }

    #[test]
    fn test_garbage_pdf_is_rejected() {
        assert!(pdf_to_text(b"not a pdf").is_err());
    }
}
