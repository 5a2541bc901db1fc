// CV assistant: summary, entry descriptions, CV import and cover letters.
// `CvAssistant` is the raw collaborator (one model call per method); the free
// functions below apply the rules around it: fixed defaults that skip the
// call, input validation, output cleanup and empty-output rejection.

pub mod extract;
pub mod prompts;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::letter::ApplicationContext;
use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, WRITER_SYSTEM};
use crate::llm_client::{LlmClient, LlmClientCache, LlmError};
use crate::models::document::{Document, EducationEntry, ExperienceEntry, SkillEntry};
use extract::ExtractedCv;

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("the assistant returned no text")]
    EmptyOutput,

    #[error("{0}")]
    Validation(String),

    #[error("PDF text extraction failed: {0}")]
    PdfText(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptionKind {
    Experience,
    ComplementaryTraining,
}

/// The fields a description is generated from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptionSubject {
    Experience { position: String, company: String },
    Training { course: String, institution: String },
}

impl DescriptionSubject {
    pub fn kind(&self) -> DescriptionKind {
        match self {
            DescriptionSubject::Experience { .. } => DescriptionKind::Experience,
            DescriptionSubject::Training { .. } => DescriptionKind::ComplementaryTraining,
        }
    }

    fn validate(&self) -> Result<(), AssistantError> {
        match self {
            DescriptionSubject::Experience { position, company }
                if position.trim().is_empty() || company.trim().is_empty() =>
            {
                Err(AssistantError::Validation(
                    "Por favor, introduce el cargo y la empresa para poder generar una descripción."
                        .to_string(),
                ))
            }
            DescriptionSubject::Training {
                course,
                institution,
            } if course.trim().is_empty() || institution.trim().is_empty() => {
                Err(AssistantError::Validation(
                    "Por favor, introduce el curso y la institución para poder generar una descripción."
                        .to_string(),
                ))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
pub trait CvAssistant: Send + Sync {
    async fn generate_summary(
        &self,
        experience: &[ExperienceEntry],
        education: &[EducationEntry],
        skills: &[SkillEntry],
        existing: &str,
    ) -> Result<String, AssistantError>;

    async fn extract_data_from_cv(&self, cv_text: &str) -> Result<ExtractedCv, AssistantError>;

    async fn generate_description(
        &self,
        subject: &DescriptionSubject,
    ) -> Result<String, AssistantError>;

    async fn improve_description(
        &self,
        text: &str,
        kind: DescriptionKind,
    ) -> Result<String, AssistantError>;

    async fn generate_cover_letter(
        &self,
        document: &Document,
        application: &ApplicationContext,
    ) -> Result<String, AssistantError>;
}

/// Hands out an assistant for the caller's credential.
pub trait AssistantProvider: Send + Sync {
    fn assistant(&self, api_key: Option<&str>) -> Result<Arc<dyn CvAssistant>, AssistantError>;
}

// ────────────────────────────────────────────────────────────────────────────
// LLM-backed implementation
// ────────────────────────────────────────────────────────────────────────────

pub struct LlmAssistant {
    client: LlmClient,
}

impl LlmAssistant {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CvAssistant for LlmAssistant {
    async fn generate_summary(
        &self,
        experience: &[ExperienceEntry],
        education: &[EducationEntry],
        skills: &[SkillEntry],
        existing: &str,
    ) -> Result<String, AssistantError> {
        let prompt = prompts::summary_prompt(experience, education, skills, existing);
        Ok(self
            .client
            .call_text(&prompt, WRITER_SYSTEM, prompts::SUMMARY_TEMPERATURE)
            .await?)
    }

    async fn extract_data_from_cv(&self, cv_text: &str) -> Result<ExtractedCv, AssistantError> {
        let prompt = prompts::extract_prompt(cv_text);
        Ok(self.client.call_json(&prompt, JSON_ONLY_SYSTEM).await?)
    }

    async fn generate_description(
        &self,
        subject: &DescriptionSubject,
    ) -> Result<String, AssistantError> {
        let prompt = match subject {
            DescriptionSubject::Experience { position, company } => {
                prompts::experience_description_prompt(position, company)
            }
            DescriptionSubject::Training {
                course,
                institution,
            } => prompts::training_description_prompt(course, institution),
        };
        Ok(self
            .client
            .call_text(&prompt, WRITER_SYSTEM, prompts::DESCRIPTION_TEMPERATURE)
            .await?)
    }

    async fn improve_description(
        &self,
        text: &str,
        kind: DescriptionKind,
    ) -> Result<String, AssistantError> {
        let prompt = match kind {
            DescriptionKind::Experience => prompts::improve_experience_prompt(text),
            DescriptionKind::ComplementaryTraining => prompts::improve_training_prompt(text),
        };
        Ok(self
            .client
            .call_text(&prompt, WRITER_SYSTEM, prompts::DESCRIPTION_TEMPERATURE)
            .await?)
    }

    async fn generate_cover_letter(
        &self,
        document: &Document,
        application: &ApplicationContext,
    ) -> Result<String, AssistantError> {
        let today = chrono::Local::now().date_naive();
        let prompt = prompts::cover_letter_prompt(document, application, today);
        Ok(self
            .client
            .call_text(&prompt, WRITER_SYSTEM, prompts::COVER_LETTER_TEMPERATURE)
            .await?)
    }
}

/// Builds `LlmAssistant`s from a shared client cache. A request key wins
/// over the configured default.
pub struct LlmAssistantProvider {
    cache: LlmClientCache,
    default_key: Option<String>,
}

impl LlmAssistantProvider {
    pub fn new(default_key: Option<String>) -> Self {
        Self {
            cache: LlmClientCache::new(),
            default_key,
        }
    }
}

impl AssistantProvider for LlmAssistantProvider {
    fn assistant(&self, api_key: Option<&str>) -> Result<Arc<dyn CvAssistant>, AssistantError> {
        let key = api_key
            .filter(|k| !k.trim().is_empty())
            .or(self.default_key.as_deref())
            .ok_or(LlmError::MissingApiKey)?;
        let client = self.cache.get(key)?;
        debug!(clients_built = self.cache.builds(), "assistant ready");
        Ok(Arc::new(LlmAssistant::new(client)))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Rules around the collaborator
// ────────────────────────────────────────────────────────────────────────────

fn non_empty(text: String) -> Result<String, AssistantError> {
    let text = text.trim();
    if text.is_empty() {
        Err(AssistantError::EmptyOutput)
    } else {
        Ok(text.to_string())
    }
}

/// Trims each line, strips a leading `-`, `•` or `*` bullet and drops
/// empty lines.
pub fn clean_description_lines(text: &str) -> String {
    text.lines()
        .map(|line| {
            let line = line.trim();
            line.strip_prefix(['-', '•', '*'])
                .map(str::trim_start)
                .unwrap_or(line)
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// New or improved summary for the document.
pub async fn summary_for(
    assistant: &dyn CvAssistant,
    doc: &Document,
) -> Result<String, AssistantError> {
    if doc.experience.is_empty() && doc.education.is_empty() && doc.summary.is_empty() {
        return Ok(prompts::DEFAULT_SUMMARY.to_string());
    }
    let summary = assistant
        .generate_summary(&doc.experience, &doc.education, &doc.skills, &doc.summary)
        .await?;
    non_empty(summary)
}

/// Improves `existing` when it has text, otherwise generates from `subject`.
pub async fn description_for(
    assistant: &dyn CvAssistant,
    subject: &DescriptionSubject,
    existing: &str,
) -> Result<String, AssistantError> {
    let kind = subject.kind();
    if !existing.trim().is_empty() {
        let improved = non_empty(assistant.improve_description(existing, kind).await?)?;
        return Ok(match kind {
            DescriptionKind::Experience => non_empty(clean_description_lines(&improved))?,
            DescriptionKind::ComplementaryTraining => improved,
        });
    }
    subject.validate()?;
    let generated = assistant.generate_description(subject).await?;
    non_empty(clean_description_lines(&generated))
}

/// Improvement of a bare text. Empty input comes back empty without a call.
pub async fn improve_text(
    assistant: &dyn CvAssistant,
    text: &str,
    kind: DescriptionKind,
) -> Result<String, AssistantError> {
    if text.trim().is_empty() {
        return Ok(String::new());
    }
    let improved = non_empty(assistant.improve_description(text, kind).await?)?;
    Ok(match kind {
        DescriptionKind::Experience => clean_description_lines(&improved),
        DescriptionKind::ComplementaryTraining => improved,
    })
}

/// Extracts a whole new document from pasted CV text.
pub async fn document_from_text(
    assistant: &dyn CvAssistant,
    cv_text: &str,
) -> Result<Document, AssistantError> {
    if cv_text.trim().is_empty() {
        return Err(AssistantError::Validation(
            "Pega el texto de tu CV para poder analizarlo.".to_string(),
        ));
    }
    let extracted = assistant.extract_data_from_cv(cv_text).await?;
    let doc = extracted.into_document();
    info!(
        experience = doc.experience.len(),
        education = doc.education.len(),
        "CV data extracted"
    );
    Ok(doc)
}

pub async fn cover_letter_for(
    assistant: &dyn CvAssistant,
    doc: &Document,
    application: &ApplicationContext,
) -> Result<String, AssistantError> {
    non_empty(assistant.generate_cover_letter(doc, application).await?)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use tokio::sync::Notify;

    use super::*;

    /// Replies with canned text and counts the calls it receives. A gated
    /// assistant holds every reply until the gate is notified.
    #[derive(Default)]
    pub struct ScriptedAssistant {
        pub reply: String,
        pub calls: AtomicUsize,
        pub fail: bool,
        pub gate: Option<Arc<Notify>>,
    }

    impl ScriptedAssistant {
        pub fn replying(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                ..Default::default()
            }
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        pub fn gated(reply: &str, gate: Arc<Notify>) -> Self {
            Self {
                gate: Some(gate),
                ..Self::replying(reply)
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        async fn answer(&self) -> Result<String, AssistantError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.fail {
                Err(AssistantError::Llm(LlmError::EmptyContent))
            } else {
                Ok(self.reply.clone())
            }
        }
    }

    #[async_trait]
    impl CvAssistant for ScriptedAssistant {
        async fn generate_summary(
            &self,
            _: &[ExperienceEntry],
            _: &[EducationEntry],
            _: &[SkillEntry],
            _: &str,
        ) -> Result<String, AssistantError> {
            self.answer().await
        }

        async fn extract_data_from_cv(&self, _: &str) -> Result<ExtractedCv, AssistantError> {
            let reply = self.answer().await?;
            serde_json::from_str(&reply).map_err(|e| AssistantError::Llm(LlmError::Parse(e)))
        }

        async fn generate_description(
            &self,
            _: &DescriptionSubject,
        ) -> Result<String, AssistantError> {
            self.answer().await
        }

        async fn improve_description(
            &self,
            _: &str,
            _: DescriptionKind,
        ) -> Result<String, AssistantError> {
            self.answer().await
        }

        async fn generate_cover_letter(
            &self,
            _: &Document,
            _: &ApplicationContext,
        ) -> Result<String, AssistantError> {
            self.answer().await
        }
    }

    /// Always hands out the same assistant.
    pub struct FixedProvider(pub Arc<ScriptedAssistant>);

    impl AssistantProvider for FixedProvider {
        fn assistant(&self, _: Option<&str>) -> Result<Arc<dyn CvAssistant>, AssistantError> {
            Ok(self.0.clone())
        }
    }
}
