//! The CV document model.
//!
//! Pure data plus the invariants that must hold after every mutation:
//! unique entry ids per collection, `is_current` pinning the end date to the
//! "Presente" sentinel, a valid accent color and clamped font sizes.

use std::collections::HashSet;
use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// End-date value stored while an entry is marked as ongoing.
pub const PRESENT_SENTINEL: &str = "Presente";

/// Words (lowercase) that mean "ongoing" in a free-text end date.
pub const PRESENT_WORDS: [&str; 3] = ["presente", "actualmente", "present"];

pub const DEFAULT_ACCENT_COLOR: &str = "#003366";
pub const DEFAULT_PHONE_COUNTRY_CODE: &str = "+56";

pub const NAME_FONT_RANGE: RangeInclusive<u8> = 22..=32;
pub const PERSONAL_FONT_RANGE: RangeInclusive<u8> = 9..=15;
pub const DEFAULT_NAME_FONT_PT: u8 = 25;
pub const DEFAULT_PERSONAL_FONT_PT: u8 = 12;

/// True when `value` is one of the "ongoing" words, ignoring case and padding.
pub fn is_present_word(value: &str) -> bool {
    let normalized = value.trim().to_lowercase();
    PRESENT_WORDS.contains(&normalized.as_str())
}

// ────────────────────────────────────────────────────────────────────────────
// Scalar value types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{0}' is not a #RRGGBB color")]
pub struct InvalidColor(pub String);

/// A validated `#RRGGBB` accent color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccentColor(String);

impl AccentColor {
    pub fn parse(raw: &str) -> Result<Self, InvalidColor> {
        let trimmed = raw.trim();
        let hex = trimmed
            .strip_prefix('#')
            .ok_or_else(|| InvalidColor(raw.to_string()))?;
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(InvalidColor(raw.to_string()));
        }
        Ok(Self(format!("#{}", hex.to_ascii_uppercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The color as 8-bit RGB components.
    pub fn rgb(&self) -> (u8, u8, u8) {
        let channel = |i: usize| u8::from_str_radix(&self.0[i..i + 2], 16).unwrap_or(0);
        (channel(1), channel(3), channel(5))
    }
}

impl Default for AccentColor {
    fn default() -> Self {
        Self(DEFAULT_ACCENT_COLOR.to_string())
    }
}

impl TryFrom<String> for AccentColor {
    type Error = InvalidColor;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AccentColor> for String {
    fn from(color: AccentColor) -> Self {
        color.0
    }
}

impl fmt::Display for AccentColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Font-size overrides in points. Always within their allowed ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawFontSizes")]
pub struct FontSizes {
    pub name: u8,
    pub personal: u8,
}

#[derive(Deserialize)]
struct RawFontSizes {
    #[serde(default = "default_name_size")]
    name: i64,
    #[serde(default = "default_personal_size")]
    personal: i64,
}

fn default_name_size() -> i64 {
    DEFAULT_NAME_FONT_PT as i64
}

fn default_personal_size() -> i64 {
    DEFAULT_PERSONAL_FONT_PT as i64
}

impl From<RawFontSizes> for FontSizes {
    fn from(raw: RawFontSizes) -> Self {
        let mut sizes = FontSizes::default();
        sizes.set(FontSizeField::Name, raw.name);
        sizes.set(FontSizeField::Personal, raw.personal);
        sizes
    }
}

impl Default for FontSizes {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME_FONT_PT,
            personal: DEFAULT_PERSONAL_FONT_PT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontSizeField {
    Name,
    Personal,
}

impl FontSizes {
    /// Stores `size` clamped to the field's range. Returns the stored value.
    pub fn set(&mut self, field: FontSizeField, size: i64) -> u8 {
        let range = match field {
            FontSizeField::Name => NAME_FONT_RANGE,
            FontSizeField::Personal => PERSONAL_FONT_RANGE,
        };
        let clamped = size.clamp(*range.start() as i64, *range.end() as i64) as u8;
        match field {
            FontSizeField::Name => self.name = clamped,
            FontSizeField::Personal => self.personal = clamped,
        }
        clamped
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SkillLevel {
    Basico,
    Intermedio,
    Avanzado,
}

impl SkillLevel {
    pub fn label(self) -> &'static str {
        match self {
            SkillLevel::Basico => "Básico",
            SkillLevel::Intermedio => "Intermedio",
            SkillLevel::Avanzado => "Avanzado",
        }
    }

    /// Fraction of the level bar filled in the Modern template.
    pub fn bar_fraction(self) -> f32 {
        match self {
            SkillLevel::Basico => 0.33,
            SkillLevel::Intermedio => 0.66,
            SkillLevel::Avanzado => 1.0,
        }
    }
}

impl Default for SkillLevel {
    fn default() -> Self {
        SkillLevel::Intermedio
    }
}

impl From<String> for SkillLevel {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "básico" | "basico" => SkillLevel::Basico,
            "avanzado" => SkillLevel::Avanzado,
            _ => SkillLevel::Intermedio,
        }
    }
}

impl From<SkillLevel> for String {
    fn from(level: SkillLevel) -> Self {
        level.label().to_string()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Driving license
// ────────────────────────────────────────────────────────────────────────────

/// Chilean driving-license classes in display order
/// (professional A1–A5, non-professional B–C, special D–F).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LicenseClass {
    A1,
    A2,
    A3,
    A4,
    A5,
    B,
    C,
    D,
    E,
    F,
}

impl LicenseClass {
    pub const ALL: [LicenseClass; 10] = [
        LicenseClass::A1,
        LicenseClass::A2,
        LicenseClass::A3,
        LicenseClass::A4,
        LicenseClass::A5,
        LicenseClass::B,
        LicenseClass::C,
        LicenseClass::D,
        LicenseClass::E,
        LicenseClass::F,
    ];

    pub fn code(self) -> &'static str {
        match self {
            LicenseClass::A1 => "A1",
            LicenseClass::A2 => "A2",
            LicenseClass::A3 => "A3",
            LicenseClass::A4 => "A4",
            LicenseClass::A5 => "A5",
            LicenseClass::B => "B",
            LicenseClass::C => "C",
            LicenseClass::D => "D",
            LicenseClass::E => "E",
            LicenseClass::F => "F",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrivingLicense {
    #[serde(rename = "A1")]
    pub a1: bool,
    #[serde(rename = "A2")]
    pub a2: bool,
    #[serde(rename = "A3")]
    pub a3: bool,
    #[serde(rename = "A4")]
    pub a4: bool,
    #[serde(rename = "A5")]
    pub a5: bool,
    #[serde(rename = "B")]
    pub b: bool,
    #[serde(rename = "C")]
    pub c: bool,
    #[serde(rename = "D")]
    pub d: bool,
    #[serde(rename = "E")]
    pub e: bool,
    #[serde(rename = "F")]
    pub f: bool,
}

impl DrivingLicense {
    fn slot(&mut self, class: LicenseClass) -> &mut bool {
        match class {
            LicenseClass::A1 => &mut self.a1,
            LicenseClass::A2 => &mut self.a2,
            LicenseClass::A3 => &mut self.a3,
            LicenseClass::A4 => &mut self.a4,
            LicenseClass::A5 => &mut self.a5,
            LicenseClass::B => &mut self.b,
            LicenseClass::C => &mut self.c,
            LicenseClass::D => &mut self.d,
            LicenseClass::E => &mut self.e,
            LicenseClass::F => &mut self.f,
        }
    }

    pub fn get(&self, class: LicenseClass) -> bool {
        let mut copy = *self;
        *copy.slot(class)
    }

    pub fn set(&mut self, class: LicenseClass, enabled: bool) {
        *self.slot(class) = enabled;
    }

    pub fn clear(&mut self) {
        *self = DrivingLicense::default();
    }

    /// Checked classes in display order.
    pub fn selected(&self) -> Vec<LicenseClass> {
        LicenseClass::ALL
            .into_iter()
            .filter(|class| self.get(*class))
            .collect()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Entries
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalData {
    pub name: String,
    pub email: String,
    pub phone_country_code: String,
    pub phone_number: String,
    pub city_and_country: String,
    pub linkedin: String,
    pub website: String,
}

impl Default for PersonalData {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            phone_country_code: DEFAULT_PHONE_COUNTRY_CODE.to_string(),
            phone_number: String::new(),
            city_and_country: String::new(),
            linkedin: String::new(),
            website: String::new(),
        }
    }
}

impl PersonalData {
    /// `"<country code> <number>"`, skipping whichever part is empty.
    pub fn full_phone(&self) -> String {
        [self.phone_country_code.trim(), self.phone_number.trim()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EducationEntry {
    pub id: Uuid,
    pub institution: String,
    pub degree: String,
    pub city: String,
    pub country: String,
    pub start_date: String,
    pub end_date: String,
    pub is_current: bool,
}

impl Default for EducationEntry {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            institution: String::new(),
            degree: String::new(),
            city: String::new(),
            country: String::new(),
            start_date: String::new(),
            end_date: String::new(),
            is_current: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceEntry {
    pub id: Uuid,
    pub company: String,
    pub city: String,
    pub country: String,
    pub position: String,
    pub start_month: String,
    pub start_date: String,
    pub end_month: String,
    pub end_date: String,
    pub description: String,
    pub is_current: bool,
}

impl Default for ExperienceEntry {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            company: String::new(),
            city: String::new(),
            country: String::new(),
            position: String::new(),
            start_month: String::new(),
            start_date: String::new(),
            end_month: String::new(),
            end_date: String::new(),
            description: String::new(),
            is_current: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillEntry {
    pub id: Uuid,
    pub skill: String,
    pub level: SkillLevel,
}

impl Default for SkillEntry {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            skill: String::new(),
            level: SkillLevel::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingEntry {
    pub id: Uuid,
    pub course: String,
    pub institution: String,
    pub year: String,
    pub description: String,
    pub city: String,
    pub country: String,
}

impl Default for TrainingEntry {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            course: String::new(),
            institution: String::new(),
            year: String::new(),
            description: String::new(),
            city: String::new(),
            country: String::new(),
        }
    }
}

/// Entries that carry a date range and therefore take part in date sorting.
pub trait Dated {
    fn start_date(&self) -> &str;
    fn end_date(&self) -> &str;
}

impl Dated for EducationEntry {
    fn start_date(&self) -> &str {
        &self.start_date
    }
    fn end_date(&self) -> &str {
        &self.end_date
    }
}

impl Dated for ExperienceEntry {
    fn start_date(&self) -> &str {
        &self.start_date
    }
    fn end_date(&self) -> &str {
        &self.end_date
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Document root
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    pub personal: PersonalData,
    pub summary: String,
    pub education: Vec<EducationEntry>,
    pub experience: Vec<ExperienceEntry>,
    pub skills: Vec<SkillEntry>,
    pub complementary_training: Vec<TrainingEntry>,
    pub has_driving_license: bool,
    pub driving_license: DrivingLicense,
    pub accent_color: AccentColor,
    pub font_sizes: FontSizes,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            personal: PersonalData::default(),
            summary: String::new(),
            education: Vec::new(),
            experience: Vec::new(),
            skills: Vec::new(),
            complementary_training: Vec::new(),
            has_driving_license: false,
            driving_license: DrivingLicense::default(),
            accent_color: AccentColor::default(),
            font_sizes: FontSizes::default(),
        }
    }
}

impl Document {
    /// Selected license classes, or nothing when the license flag is off.
    pub fn license_classes(&self) -> Vec<LicenseClass> {
        if self.has_driving_license {
            self.driving_license.selected()
        } else {
            Vec::new()
        }
    }

    /// Re-establishes the invariants on a document that arrived from outside
    /// (client payload, stored draft, AI extraction).
    pub fn normalized(mut self) -> Self {
        dedupe_ids(&mut self.education, |e| &mut e.id);
        dedupe_ids(&mut self.experience, |e| &mut e.id);
        dedupe_ids(&mut self.skills, |e| &mut e.id);
        dedupe_ids(&mut self.complementary_training, |e| &mut e.id);

        for entry in &mut self.experience {
            if entry.is_current || is_present_word(&entry.end_date) {
                entry.is_current = true;
                entry.end_date = PRESENT_SENTINEL.to_string();
                entry.end_month.clear();
            }
        }
        for entry in &mut self.education {
            if entry.is_current || is_present_word(&entry.end_date) {
                entry.is_current = true;
                entry.end_date = PRESENT_SENTINEL.to_string();
            }
        }
        if !self.has_driving_license {
            self.driving_license.clear();
        }
        self
    }
}

fn dedupe_ids<T>(entries: &mut [T], id: impl Fn(&mut T) -> &mut Uuid) {
    let mut seen = HashSet::new();
    for entry in entries.iter_mut() {
        let slot = id(entry);
        if slot.is_nil() || !seen.insert(*slot) {
            *slot = Uuid::new_v4();
            seen.insert(*slot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accent_color_accepts_six_hex_digits() {
        let color = AccentColor::parse("#4b0082").unwrap();
        assert_eq!(color.as_str(), "#4B0082");
        assert_eq!(color.rgb(), (0x4B, 0x00, 0x82));
    }

    #[test]
    fn test_accent_color_rejects_malformed_values() {
        for raw in ["003366", "#03366", "#00336G", "", "#0033667"] {
            assert!(AccentColor::parse(raw).is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn test_accent_color_deserialization_enforces_format() {
        let ok: Result<AccentColor, _> = serde_json::from_str("\"#800000\"");
        assert!(ok.is_ok());
        let bad: Result<AccentColor, _> = serde_json::from_str("\"red\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_font_sizes_are_clamped() {
        let mut sizes = FontSizes::default();
        assert_eq!(sizes.set(FontSizeField::Name, 99), 32);
        assert_eq!(sizes.set(FontSizeField::Name, 5), 22);
        assert_eq!(sizes.set(FontSizeField::Personal, 20), 15);
        assert_eq!(sizes.set(FontSizeField::Personal, -3), 9);
        assert_eq!(sizes.set(FontSizeField::Personal, 11), 11);
    }

    #[test]
    fn test_font_sizes_deserialize_clamped() {
        let sizes: FontSizes = serde_json::from_str(r#"{"name": 40, "personal": 2}"#).unwrap();
        assert_eq!(sizes, FontSizes { name: 32, personal: 9 });
    }

    #[test]
    fn test_skill_level_unknown_defaults_to_intermedio() {
        let level: SkillLevel = serde_json::from_str("\"Experto\"").unwrap();
        assert_eq!(level, SkillLevel::Intermedio);
        let level: SkillLevel = serde_json::from_str("\"Básico\"").unwrap();
        assert_eq!(level, SkillLevel::Basico);
        assert_eq!(serde_json::to_string(&SkillLevel::Avanzado).unwrap(), "\"Avanzado\"");
    }

    #[test]
    fn test_license_selection_keeps_display_order() {
        let mut license = DrivingLicense::default();
        license.set(LicenseClass::D, true);
        license.set(LicenseClass::A2, true);
        license.set(LicenseClass::B, true);
        assert_eq!(
            license.selected(),
            vec![LicenseClass::A2, LicenseClass::B, LicenseClass::D]
        );
    }

    #[test]
    fn test_licenses_ignored_when_flag_off() {
        let mut doc = Document::default();
        doc.driving_license.set(LicenseClass::B, true);
        assert!(doc.license_classes().is_empty());
        doc.has_driving_license = true;
        assert!(!doc.license_classes().is_empty());
    }

    #[test]
    fn test_full_phone_skips_empty_parts() {
        let mut personal = PersonalData::default();
        assert_eq!(personal.full_phone(), "+56");
        personal.phone_number = "9 1234 5678".to_string();
        assert_eq!(personal.full_phone(), "+56 9 1234 5678");
        personal.phone_country_code.clear();
        assert_eq!(personal.full_phone(), "9 1234 5678");
    }

    #[test]
    fn test_normalized_enforces_present_sentinel_and_unique_ids() {
        let shared = Uuid::new_v4();
        let mut doc = Document::default();
        doc.experience.push(ExperienceEntry {
            id: shared,
            end_date: "actualmente".to_string(),
            end_month: "Mayo".to_string(),
            ..Default::default()
        });
        doc.experience.push(ExperienceEntry {
            id: shared,
            end_date: "2019".to_string(),
            ..Default::default()
        });

        let doc = doc.normalized();
        assert_ne!(doc.experience[0].id, doc.experience[1].id);
        assert!(doc.experience[0].is_current);
        assert_eq!(doc.experience[0].end_date, PRESENT_SENTINEL);
        assert!(doc.experience[0].end_month.is_empty());
        assert!(!doc.experience[1].is_current);
    }

    #[test]
    fn test_document_deserializes_from_partial_json() {
        let doc: Document = serde_json::from_str(r#"{"personal": {"name": "Ana"}}"#).unwrap();
        assert_eq!(doc.personal.name, "Ana");
        assert_eq!(doc.personal.phone_country_code, "+56");
        assert_eq!(doc.accent_color.as_str(), DEFAULT_ACCENT_COLOR);
        assert_eq!(doc.font_sizes, FontSizes::default());
    }
}
