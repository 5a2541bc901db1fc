// Prompts for the CV assistant. All output is requested in Spanish.

use chrono::{Datelike, NaiveDate};

use crate::letter::ApplicationContext;
use crate::models::document::{Document, EducationEntry, ExperienceEntry, SkillEntry};

/// Returned without calling the model when there is nothing to summarize.
pub const DEFAULT_SUMMARY: &str = "Profesional proactivo y con gran capacidad de aprendizaje, \
    buscando una oportunidad para aplicar mis habilidades y crecer profesionalmente. \
    Listo para contribuir al éxito del equipo y de la empresa.";

pub const SUMMARY_TEMPERATURE: f32 = 0.7;
pub const DESCRIPTION_TEMPERATURE: f32 = 0.7;
pub const COVER_LETTER_TEMPERATURE: f32 = 0.6;

const SUMMARY_STRUCTURE: &str = "\
**Estructura OBLIGATORIA:**
El resumen DEBE ser un párrafo único y fluido que contenga estas partes en orden:
1. **Profesión y Formación Actual:** Define el perfil profesional basándote en el título académico más reciente. Si en \"Educación\" una carrera está en curso (\"Presente\"), añade una frase final que lo destaque, mostrando el deseo de crecimiento y actualización.
2. **Experiencia:** Menciona la experiencia de forma general y cualitativa, sin especificar un número exacto de años.
3. **Herramientas y Habilidades Blandas:** Finaliza mencionando una o dos herramientas de software clave si las hay, y añade habilidades blandas relevantes como \"responsable\", \"proactivo\", \"resolución de conflictos\" y \"trabajo en equipo\".

**Reglas Estrictas:**
- Redacta SIEMPRE en primera persona (\"Soy\", \"Poseo\", \"Tengo experiencia\").
- El resultado debe ser un único párrafo conciso, de no más de 3 líneas.
- Idioma: Español.";

const DESCRIPTION_EXAMPLE: &str = "\
**Ejemplo de una buena descripción:**
\"Colaboración en el montaje de estructuras metálicas para proyectos de edificación.\"
\"Gestión y supervisión de equipos en terreno para asegurar la calidad del trabajo.\"";

fn or_unspecified(text: String, fallback: &str) -> String {
    if text.trim().is_empty() {
        fallback.to_string()
    } else {
        text
    }
}

fn summary_context(
    experience: &[ExperienceEntry],
    education: &[EducationEntry],
    skills: &[SkillEntry],
) -> String {
    let experience_text = experience
        .iter()
        .map(|e| format!("- Cargo: {} en {}. Descripción: {}", e.position, e.company, e.description))
        .collect::<Vec<_>>()
        .join("\n");
    let education_text = education
        .iter()
        .map(|e| format!("- Título: {} en {}. Año fin: {}", e.degree, e.institution, e.end_date))
        .collect::<Vec<_>>()
        .join("\n");
    let skills_text = skills
        .iter()
        .map(|s| format!("- {} (Nivel: {})", s.skill, s.level.label()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "**Experiencia Laboral:**\n{}\n\n**Educación:**\n{}\n\n**Habilidades Técnicas:**\n{}",
        or_unspecified(experience_text, "No especificada."),
        or_unspecified(education_text, "No especificada."),
        or_unspecified(skills_text, "No especificadas."),
    )
}

pub fn summary_prompt(
    experience: &[ExperienceEntry],
    education: &[EducationEntry],
    skills: &[SkillEntry],
    existing: &str,
) -> String {
    let context = summary_context(experience, education, skills);
    if existing.trim().is_empty() {
        format!(
            "Tu única tarea es redactar un resumen profesional desde cero, basándote \
             estrictamente en el contexto proporcionado.\n\n{SUMMARY_STRUCTURE}\n\n\
             **Contexto (Formación Profesional y Académica):**\n{context}\n\n\
             Genera únicamente el texto del resumen profesional, sin encabezados ni introducciones."
        )
    } else {
        format!(
            "Tu única tarea es mejorar y reescribir el \"Resumen Original\" para que se ajuste \
             estrictamente a la estructura indicada, usando la información del contexto. \
             Prioriza la estructura y corrige el original para que el texto final sea más general \
             y profesional.\n\n{SUMMARY_STRUCTURE}\n\n\
             **Contexto (Formación Profesional y Académica):**\n{context}\n\n\
             **Resumen Original a Mejorar:**\n---\n{existing}\n---\n\n\
             Genera únicamente el texto del resumen profesional mejorado, sin encabezados ni introducciones."
        )
    }
}

pub fn extract_prompt(cv_text: &str) -> String {
    format!(
        "Analiza el siguiente texto de un currículum vitae y extrae la información en un objeto JSON \
         con exactamente esta forma (claves en snake_case, todos los valores como strings):\n\
         {{\n\
           \"personal\": {{\"name\", \"email\", \"phone_number\" (sin código de país), \
         \"city_and_country\" (ej: \"Santiago, Chile\"), \"linkedin\" (solo el perfil, ej: \
         \"linkedin.com/in/usuario\"), \"website\"}},\n\
           \"summary\": string,\n\
           \"experience\": [{{\"position\", \"company\", \"city\", \"country\", \"start_month\" \
         (ej: \"Marzo\"), \"start_date\" (año), \"end_month\" (vacío si sigue trabajando), \
         \"end_date\" (año, o \"Presente\" si sigue trabajando), \"description\"}}],\n\
           \"education\": [{{\"institution\", \"degree\", \"city\", \"country\", \"start_date\", \"end_date\"}}],\n\
           \"skills\": [{{\"skill\", \"level\" (\"Básico\", \"Intermedio\" o \"Avanzado\")}}],\n\
           \"complementary_training\": [{{\"course\", \"institution\", \"year\", \"description\", \"city\", \"country\"}}]\n\
         }}\n\n\
         Si alguna información no está presente, usa un string vacío o un array vacío.\n\
         Asegúrate de que los meses y años estén en los campos correctos.\n\
         Para las descripciones de experiencia, separa los puntos con saltos de línea (\\n).\n\
         Si el nivel de una habilidad no se especifica, usa \"Intermedio\".\n\n\
         Texto del CV:\n---\n{cv_text}\n---"
    )
}

pub fn experience_description_prompt(position: &str, company: &str) -> String {
    format!(
        "Para un currículum vitae, genera una lista de 1 o 2 responsabilidades o contribuciones \
         clave para el cargo de \"{position}\" en la empresa \"{company}\".\n\n\
         **Instrucciones clave:**\n\
         1. Describe las tareas principales y los aportes más significativos del puesto. Evita \
         métricas agresivas o porcentajes exagerados.\n\
         2. Utiliza verbos de acción al inicio de cada punto (ej: \"Colaboré en...\", \"Gestioné...\").\n\
         3. Cada punto debe empezar en una nueva línea. No utilices viñetas como '-' o '•'.\n\
         4. Usa mayúsculas solo al inicio de cada punto y para nombres propios.\n\
         5. El idioma debe ser español.\n\n{DESCRIPTION_EXAMPLE}\n\n\
         Genera únicamente la lista de responsabilidades, sin encabezados ni texto introductorio."
    )
}

pub fn training_description_prompt(course: &str, institution: &str) -> String {
    format!(
        "Para un currículum vitae, genera una descripción concisa (2-3 frases) para el curso \
         \"{course}\" impartido por \"{institution}\". Destaca las habilidades y conocimientos más \
         importantes adquiridos, con un tono profesional y en español.\n\
         Genera únicamente el texto de la descripción, sin encabezados ni texto introductorio."
    )
}

pub fn improve_experience_prompt(text: &str) -> String {
    format!(
        "Mejora y reescribe la siguiente descripción de un puesto de trabajo para que sea más \
         clara, concisa y profesional.\n\n\
         **Instrucciones clave para la mejora:**\n\
         1. Describe las contribuciones y responsabilidades principales.\n\
         2. Limita la descripción a un máximo de 2 puntos clave.\n\
         3. Evita porcentajes o métricas exageradas.\n\
         4. Comienza cada punto con un verbo de acción (ej: \"Gestioné\", \"Desarrollé\").\n\
         5. Usa mayúsculas solo al inicio de cada punto y para nombres propios.\n\
         6. Cada punto en una nueva línea, sin viñetas como '-' o '•'.\n\
         7. Mantén el idioma original del texto (español).\n\n{DESCRIPTION_EXAMPLE}\n\n\
         Genera únicamente el texto mejorado, sin encabezados ni introducciones.\n\n\
         **Texto Original a Mejorar:**\n---\n{text}\n---"
    )
}

pub fn improve_training_prompt(text: &str) -> String {
    format!(
        "Mejora y reescribe la siguiente descripción de un curso o certificación para que sea más \
         profesional, clara y concisa, destacando las habilidades y conocimientos clave adquiridos. \
         Mantén el idioma original del texto (español).\n\
         Genera únicamente el texto mejorado, sin encabezados ni introducciones.\n\n\
         **Texto Original a Mejorar:**\n---\n{text}\n---"
    )
}

const MONTHS_ES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// `18 de octubre de 2026`
pub fn spanish_date(date: NaiveDate) -> String {
    format!("{} de {} de {}", date.day(), MONTHS_ES[date.month0() as usize], date.year())
}

pub fn cover_letter_prompt(doc: &Document, application: &ApplicationContext, today: NaiveDate) -> String {
    let personal = &doc.personal;
    let phone = personal.full_phone();
    let experience_text = doc
        .experience
        .iter()
        .map(|e| format!("- {} en {}.", e.position, e.company))
        .collect::<Vec<_>>()
        .join("\n");
    let skills_text = doc
        .skills
        .iter()
        .map(|s| s.skill.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let city = personal.city_and_country.split(',').next().unwrap_or_default().trim();
    let candidate = if personal.name.trim().is_empty() {
        "el candidato"
    } else {
        personal.name.trim()
    };

    let opening = match application.position() {
        Some(job) => {
            let at_company = application
                .company()
                .map(|c| format!(" en {c}"))
                .unwrap_or_default();
            format!(
                "- Comienza presentándote y expresando tu gran interés en la vacante de \"{job}\"{at_company}. \
                 Basa la introducción en tu perfil y cómo encaja con el puesto."
            )
        }
        None => "- Comienza presentándote e indicando tu interés en formar parte de su organización. \
                 Basa la introducción en el \"Resumen Profesional del CV\"."
            .to_string(),
    };

    format!(
        "Tu tarea es generar una carta de presentación profesional para {candidate}, basándote en \
         los datos de su CV y la información de la postulación.\n\n\
         **Datos de la Postulación:**\n\
         - Cargo: {job}\n- Empresa: {company}\n- Reclutador: {recruiter}\n\n\
         **Datos del CV:**\n\
         - Nombre: {name}\n- Email: {email}\n- Teléfono: {phone}\n- Ciudad y País: {place}\n\
         - Resumen Profesional del CV: {summary}\n\
         - Experiencia Laboral (resumida): {experience}\n\
         - Habilidades Clave: {skills}\n\n\
         **Formato y Estructura OBLIGATORIOS:**\n\
         Usa **texto en negrita** para los nombres y guiones (-) para las listas.\n\n\
         1. Encabezado:\n**{name}**\n{email} | {phone}\n{city}, {date}\n\n\
         2. Saludo (después de dos saltos de línea):\n{salutation}\n\n\
         3. Párrafo inicial (presentación y motivación):\n{opening}\n\
         - Destaca tu actitud profesional: proactividad, responsabilidad y capacidad de adaptación.\n\n\
         4. Trayectoria: resume tu trayectoria de forma amplia, sin nombrar empresas específicas.\n\n\
         5. Fortalezas: empieza con la frase \"Fortalezas destacadas:\" y debajo crea una lista de 3 \
         puntos con guiones (-), con negrita en las palabras clave de cada fortaleza.\n\n\
         6. Cierre: interés en integrarte a la institución, agradecimiento y disponibilidad para una entrevista.\n\n\
         7. Despedida (después de dos saltos de línea):\nAtentamente,\n\n\
         8. Firma (después de un salto de línea):\n**{name}**\n\n\
         **Reglas Finales:**\n\
         - Párrafos fluidos para que se vean bien justificados.\n\
         - Máximo 1 página (3-4 párrafos principales).\n\
         - Idioma: Español.\n\
         - Genera únicamente el texto de la carta, sin comentarios ni encabezados adicionales.",
        job = application.position().unwrap_or("General"),
        company = application.company().unwrap_or("No especificada"),
        recruiter = if application.is_recipient_unknown || application.recipient_name.is_empty() {
            "No especificado"
        } else {
            application.recipient_name.as_str()
        },
        name = personal.name.trim(),
        email = personal.email.trim(),
        place = personal.city_and_country.trim(),
        summary = doc.summary.trim(),
        experience = or_unspecified(experience_text, "No especificada."),
        skills = or_unspecified(skills_text, "No especificadas."),
        date = spanish_date(today),
        salutation = application.salutation(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spanish_date() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        assert_eq!(spanish_date(date), "18 de octubre de 2026");
    }

    #[test]
    fn test_summary_prompt_switches_on_existing_text() {
        let fresh = summary_prompt(&[], &[], &[], "");
        assert!(fresh.contains("desde cero"));
        assert!(fresh.contains("No especificada."));
        let improve = summary_prompt(&[], &[], &[], "Soy ingeniera.");
        assert!(improve.contains("Resumen Original a Mejorar"));
        assert!(improve.contains("Soy ingeniera."));
    }

    #[test]
    fn test_cover_letter_prompt_uses_application_context() {
        let mut doc = Document::default();
        doc.personal.name = "Ana Pérez".into();
        doc.personal.city_and_country = "Valparaíso, Chile".into();
        let ctx = ApplicationContext {
            job_title: "ANALISTA".into(),
            company_name: "ACME".into(),
            ..Default::default()
        };
        let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let prompt = cover_letter_prompt(&doc, &ctx, today);
        assert!(prompt.contains("vacante de \"ANALISTA\" en ACME"));
        assert!(prompt.contains("Valparaíso, 2 de marzo de 2026"));
        assert!(prompt.contains("Estimados/as señores/as:"));
        assert!(prompt.contains("Fortalezas destacadas:"));
    }
}
