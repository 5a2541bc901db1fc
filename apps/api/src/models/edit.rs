//! Typed document edits.
//!
//! Every mutation a client can make is one `Edit` variant. List entries are
//! updated through an exhaustive match on the collection tag so the
//! `is_current` side effects live in one transition function per variant.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::document::{
    is_present_word, AccentColor, Document, EducationEntry, ExperienceEntry, FontSizeField,
    InvalidColor, LicenseClass, SkillEntry, SkillLevel, TrainingEntry, PRESENT_SENTINEL,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("no {collection} entry with id {id}")]
    UnknownEntry { collection: Collection, id: Uuid },

    #[error("end date is fixed to \"{PRESENT_SENTINEL}\" while the entry is current")]
    EndDateLocked,

    #[error(transparent)]
    InvalidColor(#[from] InvalidColor),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Education,
    Experience,
    Skills,
    ComplementaryTraining,
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Collection::Education => "education",
            Collection::Experience => "experience",
            Collection::Skills => "skills",
            Collection::ComplementaryTraining => "complementary_training",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonalField {
    Name,
    Email,
    PhoneCountryCode,
    PhoneNumber,
    CityAndCountry,
    Linkedin,
    Website,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum EducationChange {
    Institution(String),
    Degree(String),
    City(String),
    Country(String),
    StartDate(String),
    EndDate(String),
    IsCurrent(bool),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum ExperienceChange {
    Company(String),
    City(String),
    Country(String),
    Position(String),
    StartMonth(String),
    StartDate(String),
    EndMonth(String),
    EndDate(String),
    Description(String),
    IsCurrent(bool),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum SkillChange {
    Skill(String),
    Level(SkillLevel),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum TrainingChange {
    Course(String),
    Institution(String),
    Year(String),
    Description(String),
    City(String),
    Country(String),
}

/// A named-field change addressed to one variant of list entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "collection", content = "change", rename_all = "snake_case")]
pub enum EntryChange {
    Education(EducationChange),
    Experience(ExperienceChange),
    Skills(SkillChange),
    ComplementaryTraining(TrainingChange),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Edit {
    SetPersonal { field: PersonalField, value: String },
    SetSummary { value: String },
    SetAccentColor { value: String },
    SetFontSize { field: FontSizeField, value: i64 },
    SetHasDrivingLicense { value: bool },
    SetLicenseClass { class: LicenseClass, value: bool },
    AddEntry { collection: Collection },
    RemoveEntry { collection: Collection, id: Uuid },
    UpdateEntry { id: Uuid, change: EntryChange },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "result", content = "id", rename_all = "snake_case")]
pub enum Applied {
    Updated,
    Added(Uuid),
    Removed(Uuid),
}

impl Edit {
    /// Applies the edit in place. On error the document is left untouched.
    pub fn apply(self, doc: &mut Document) -> Result<Applied, EditError> {
        match self {
            Edit::SetPersonal { field, value } => {
                let personal = &mut doc.personal;
                let slot = match field {
                    PersonalField::Name => &mut personal.name,
                    PersonalField::Email => &mut personal.email,
                    PersonalField::PhoneCountryCode => &mut personal.phone_country_code,
                    PersonalField::PhoneNumber => &mut personal.phone_number,
                    PersonalField::CityAndCountry => &mut personal.city_and_country,
                    PersonalField::Linkedin => &mut personal.linkedin,
                    PersonalField::Website => &mut personal.website,
                };
                *slot = value;
            }
            Edit::SetSummary { value } => doc.summary = value,
            Edit::SetAccentColor { value } => doc.accent_color = AccentColor::parse(&value)?,
            Edit::SetFontSize { field, value } => {
                doc.font_sizes.set(field, value);
            }
            Edit::SetHasDrivingLicense { value } => {
                doc.has_driving_license = value;
                if !value {
                    doc.driving_license.clear();
                }
            }
            Edit::SetLicenseClass { class, value } => doc.driving_license.set(class, value),
            Edit::AddEntry { collection } => return Ok(Applied::Added(add_entry(doc, collection))),
            Edit::RemoveEntry { collection, id } => {
                remove_entry(doc, collection, id)?;
                return Ok(Applied::Removed(id));
            }
            Edit::UpdateEntry { id, change } => update_entry(doc, id, change)?,
        }
        Ok(Applied::Updated)
    }
}

fn add_entry(doc: &mut Document, collection: Collection) -> Uuid {
    match collection {
        Collection::Education => {
            let entry = EducationEntry::default();
            let id = entry.id;
            doc.education.push(entry);
            id
        }
        Collection::Experience => {
            let entry = ExperienceEntry::default();
            let id = entry.id;
            doc.experience.push(entry);
            id
        }
        Collection::Skills => {
            let entry = SkillEntry::default();
            let id = entry.id;
            doc.skills.push(entry);
            id
        }
        Collection::ComplementaryTraining => {
            let entry = TrainingEntry::default();
            let id = entry.id;
            doc.complementary_training.push(entry);
            id
        }
    }
}

fn remove_entry(doc: &mut Document, collection: Collection, id: Uuid) -> Result<(), EditError> {
    let removed = match collection {
        Collection::Education => remove_by_id(&mut doc.education, id, |e| e.id),
        Collection::Experience => remove_by_id(&mut doc.experience, id, |e| e.id),
        Collection::Skills => remove_by_id(&mut doc.skills, id, |e| e.id),
        Collection::ComplementaryTraining => {
            remove_by_id(&mut doc.complementary_training, id, |e| e.id)
        }
    };
    if removed {
        Ok(())
    } else {
        Err(EditError::UnknownEntry { collection, id })
    }
}

fn remove_by_id<T>(entries: &mut Vec<T>, id: Uuid, key: impl Fn(&T) -> Uuid) -> bool {
    let before = entries.len();
    entries.retain(|entry| key(entry) != id);
    entries.len() != before
}

fn update_entry(doc: &mut Document, id: Uuid, change: EntryChange) -> Result<(), EditError> {
    match change {
        EntryChange::Education(change) => {
            let entry = find(&mut doc.education, id, |e| e.id, Collection::Education)?;
            apply_education(entry, change)
        }
        EntryChange::Experience(change) => {
            let entry = find(&mut doc.experience, id, |e| e.id, Collection::Experience)?;
            apply_experience(entry, change)
        }
        EntryChange::Skills(change) => {
            let entry = find(&mut doc.skills, id, |e| e.id, Collection::Skills)?;
            match change {
                SkillChange::Skill(v) => entry.skill = v,
                SkillChange::Level(v) => entry.level = v,
            }
            Ok(())
        }
        EntryChange::ComplementaryTraining(change) => {
            let entry = find(
                &mut doc.complementary_training,
                id,
                |e| e.id,
                Collection::ComplementaryTraining,
            )?;
            match change {
                TrainingChange::Course(v) => entry.course = v,
                TrainingChange::Institution(v) => entry.institution = v,
                TrainingChange::Year(v) => entry.year = v,
                TrainingChange::Description(v) => entry.description = v,
                TrainingChange::City(v) => entry.city = v,
                TrainingChange::Country(v) => entry.country = v,
            }
            Ok(())
        }
    }
}

fn find<T>(
    entries: &mut [T],
    id: Uuid,
    key: impl Fn(&T) -> Uuid,
    collection: Collection,
) -> Result<&mut T, EditError> {
    entries
        .iter_mut()
        .find(|entry| key(entry) == id)
        .ok_or(EditError::UnknownEntry { collection, id })
}

fn apply_education(entry: &mut EducationEntry, change: EducationChange) -> Result<(), EditError> {
    match change {
        EducationChange::Institution(v) => entry.institution = v,
        EducationChange::Degree(v) => entry.degree = v,
        EducationChange::City(v) => entry.city = v,
        EducationChange::Country(v) => entry.country = v,
        EducationChange::StartDate(v) => entry.start_date = v,
        EducationChange::EndDate(v) => {
            if entry.is_current {
                return Err(EditError::EndDateLocked);
            }
            if is_present_word(&v) {
                set_education_current(entry, true);
            } else {
                entry.end_date = v;
            }
        }
        EducationChange::IsCurrent(current) => set_education_current(entry, current),
    }
    Ok(())
}

fn apply_experience(entry: &mut ExperienceEntry, change: ExperienceChange) -> Result<(), EditError> {
    match change {
        ExperienceChange::Company(v) => entry.company = v,
        ExperienceChange::City(v) => entry.city = v,
        ExperienceChange::Country(v) => entry.country = v,
        ExperienceChange::Position(v) => entry.position = v,
        ExperienceChange::StartMonth(v) => entry.start_month = v,
        ExperienceChange::StartDate(v) => entry.start_date = v,
        ExperienceChange::EndMonth(_) | ExperienceChange::EndDate(_) if entry.is_current => {
            return Err(EditError::EndDateLocked);
        }
        ExperienceChange::EndMonth(v) => entry.end_month = v,
        ExperienceChange::EndDate(v) if is_present_word(&v) => set_experience_current(entry, true),
        ExperienceChange::EndDate(v) => entry.end_date = v,
        ExperienceChange::Description(v) => entry.description = v,
        ExperienceChange::IsCurrent(current) => set_experience_current(entry, current),
    }
    Ok(())
}

/// `is_current` transition for education entries.
pub fn set_education_current(entry: &mut EducationEntry, current: bool) {
    entry.is_current = current;
    entry.end_date = if current {
        PRESENT_SENTINEL.to_string()
    } else {
        String::new()
    };
}

/// `is_current` transition for experience entries. Both directions clear the end month.
pub fn set_experience_current(entry: &mut ExperienceEntry, current: bool) {
    entry.is_current = current;
    entry.end_month.clear();
    entry.end_date = if current {
        PRESENT_SENTINEL.to_string()
    } else {
        String::new()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_experience() -> (Document, Uuid) {
        let mut doc = Document::default();
        let id = match (Edit::AddEntry {
            collection: Collection::Experience,
        })
        .apply(&mut doc)
        .unwrap()
        {
            Applied::Added(id) => id,
            other => panic!("unexpected {other:?}"),
        };
        (doc, id)
    }

    fn experience_change(id: Uuid, change: ExperienceChange) -> Edit {
        Edit::UpdateEntry {
            id,
            change: EntryChange::Experience(change),
        }
    }

    #[test]
    fn test_is_current_toggle_sets_and_clears_sentinel() {
        let (mut doc, id) = doc_with_experience();
        experience_change(id, ExperienceChange::EndMonth("Mayo".into()))
            .apply(&mut doc)
            .unwrap();
        experience_change(id, ExperienceChange::IsCurrent(true))
            .apply(&mut doc)
            .unwrap();
        assert_eq!(doc.experience[0].end_date, PRESENT_SENTINEL);
        assert!(doc.experience[0].end_month.is_empty());

        experience_change(id, ExperienceChange::IsCurrent(false))
            .apply(&mut doc)
            .unwrap();
        assert_eq!(doc.experience[0].end_date, "", "end date must be editable and empty");
        assert!(!doc.experience[0].is_current);
    }

    #[test]
    fn test_end_date_locked_while_current() {
        let (mut doc, id) = doc_with_experience();
        experience_change(id, ExperienceChange::IsCurrent(true))
            .apply(&mut doc)
            .unwrap();
        let err = experience_change(id, ExperienceChange::EndDate("2021".into()))
            .apply(&mut doc)
            .unwrap_err();
        assert_eq!(err, EditError::EndDateLocked);
        assert_eq!(doc.experience[0].end_date, PRESENT_SENTINEL);
    }

    #[test]
    fn test_present_word_end_date_marks_entry_current() {
        let (mut doc, id) = doc_with_experience();
        experience_change(id, ExperienceChange::EndMonth("Mayo".into()))
            .apply(&mut doc)
            .unwrap();
        experience_change(id, ExperienceChange::EndDate(" presente ".into()))
            .apply(&mut doc)
            .unwrap();
        let entry = &doc.experience[0];
        assert!(entry.is_current);
        assert_eq!(entry.end_date, PRESENT_SENTINEL);
        assert!(entry.end_month.is_empty());

        let education = match (Edit::AddEntry {
            collection: Collection::Education,
        })
        .apply(&mut doc)
        .unwrap()
        {
            Applied::Added(id) => id,
            other => panic!("unexpected {other:?}"),
        };
        Edit::UpdateEntry {
            id: education,
            change: EntryChange::Education(EducationChange::EndDate("Actualmente".into())),
        }
        .apply(&mut doc)
        .unwrap();
        assert!(doc.education[0].is_current);

        assert_eq!(doc.clone().normalized(), doc);
    }

    #[test]
    fn test_education_current_toggle() {
        let mut entry = EducationEntry {
            end_date: "2018".into(),
            ..Default::default()
        };
        set_education_current(&mut entry, true);
        assert_eq!(entry.end_date, PRESENT_SENTINEL);
        set_education_current(&mut entry, false);
        assert_eq!(entry.end_date, "");
    }

    #[test]
    fn test_added_ids_are_unique_and_not_reused() {
        let mut doc = Document::default();
        let mut ids = Vec::new();
        for _ in 0..3 {
            if let Applied::Added(id) = (Edit::AddEntry {
                collection: Collection::Skills,
            })
            .apply(&mut doc)
            .unwrap()
            {
                ids.push(id);
            }
        }
        let removed = ids[1];
        Edit::RemoveEntry {
            collection: Collection::Skills,
            id: removed,
        }
        .apply(&mut doc)
        .unwrap();
        let Applied::Added(fresh) = (Edit::AddEntry {
            collection: Collection::Skills,
        })
        .apply(&mut doc)
        .unwrap() else {
            panic!("expected an added id");
        };
        assert!(!ids.contains(&fresh));
        assert_eq!(doc.skills.len(), 3);
    }

    #[test]
    fn test_update_unknown_entry_is_rejected() {
        let mut doc = Document::default();
        let err = experience_change(Uuid::new_v4(), ExperienceChange::Company("X".into()))
            .apply(&mut doc)
            .unwrap_err();
        assert!(matches!(err, EditError::UnknownEntry { .. }));
    }

    #[test]
    fn test_invalid_accent_color_leaves_document_unchanged() {
        let mut doc = Document::default();
        let before = doc.accent_color.clone();
        let result = Edit::SetAccentColor {
            value: "blue".into(),
        }
        .apply(&mut doc);
        assert!(result.is_err());
        assert_eq!(doc.accent_color, before);
    }

    #[test]
    fn test_turning_license_off_clears_classes() {
        let mut doc = Document::default();
        Edit::SetHasDrivingLicense { value: true }.apply(&mut doc).unwrap();
        Edit::SetLicenseClass {
            class: LicenseClass::B,
            value: true,
        }
        .apply(&mut doc)
        .unwrap();
        Edit::SetHasDrivingLicense { value: false }.apply(&mut doc).unwrap();
        assert!(doc.driving_license.selected().is_empty());
    }

    #[test]
    fn test_edit_deserializes_from_tagged_json() {
        let id = Uuid::new_v4();
        let json = format!(
            r#"{{"op":"update_entry","id":"{id}","change":{{"collection":"experience","change":{{"field":"is_current","value":true}}}}}}"#
        );
        let edit: Edit = serde_json::from_str(&json).unwrap();
        assert_eq!(
            edit,
            experience_change(id, ExperienceChange::IsCurrent(true))
        );
    }
}
