//! Record Collection Manager: append-or-update, add and remove over the repeatable sections.
//!
//! Each record travels with its own field errors inside an [`Entry`], so removing
//! a row removes its errors in the same operation and indices cannot drift apart.

use std::collections::BTreeMap;
use std::fmt::Debug;

use serde::Serialize;
use uuid::Uuid;

use crate::wizard::models::{
    EducationField, EducationRecord, ExperienceField, ExperienceRecord, SectionKind, SkillDegree,
    SkillField, SkillRecord, SocialLinkField, SocialLinkRecord, SocialPlatform,
};
use crate::wizard::validation::{
    check_education, check_experience, check_skill, check_social_link, AGGREGATE_MESSAGE,
};
use crate::wizard::WizardError;

/// A record shape belonging to one repeatable section.
pub trait SectionRecord: Clone + Debug + Serialize {
    type Field: Copy + Ord + Debug + Serialize + 'static;

    const KIND: SectionKind;
    const FIELDS: &'static [Self::Field];

    /// The record a fresh row starts from.
    fn blank() -> Self;

    fn set_field(&mut self, field: Self::Field, value: &str) -> Result<(), WizardError>;

    fn is_blank(&self, field: Self::Field) -> bool;

    fn check_field(&self, field: Self::Field) -> Option<String>;

    /// Fields whose verdict depends on `field`.
    fn dependents(_field: Self::Field) -> &'static [Self::Field] {
        &[]
    }
}

impl SectionRecord for EducationRecord {
    type Field = EducationField;

    const KIND: SectionKind = SectionKind::Education;
    const FIELDS: &'static [EducationField] = &[
        EducationField::Institution,
        EducationField::Diploma,
        EducationField::StartDate,
        EducationField::EndDate,
        EducationField::Description,
        EducationField::Location,
    ];

    fn blank() -> Self {
        Self::default()
    }

    fn set_field(&mut self, field: EducationField, value: &str) -> Result<(), WizardError> {
        let slot = match field {
            EducationField::Institution => &mut self.institution,
            EducationField::Diploma => &mut self.diploma,
            EducationField::StartDate => &mut self.start_date,
            EducationField::EndDate => &mut self.end_date,
            EducationField::Description => &mut self.description,
            EducationField::Location => &mut self.location,
        };
        *slot = value.to_string();
        Ok(())
    }

    fn is_blank(&self, field: EducationField) -> bool {
        let value = match field {
            EducationField::Institution => &self.institution,
            EducationField::Diploma => &self.diploma,
            EducationField::StartDate => &self.start_date,
            EducationField::EndDate => &self.end_date,
            EducationField::Description => &self.description,
            EducationField::Location => &self.location,
        };
        value.trim().is_empty()
    }

    fn check_field(&self, field: EducationField) -> Option<String> {
        check_education(field, self)
    }

    fn dependents(field: EducationField) -> &'static [EducationField] {
        match field {
            EducationField::StartDate => &[EducationField::EndDate],
            _ => &[],
        }
    }
}

impl SectionRecord for ExperienceRecord {
    type Field = ExperienceField;

    const KIND: SectionKind = SectionKind::Experience;
    const FIELDS: &'static [ExperienceField] = &[
        ExperienceField::Position,
        ExperienceField::Enterprise,
        ExperienceField::StartDate,
        ExperienceField::EndDate,
        ExperienceField::Description,
        ExperienceField::Location,
    ];

    fn blank() -> Self {
        Self::default()
    }

    fn set_field(&mut self, field: ExperienceField, value: &str) -> Result<(), WizardError> {
        let slot = match field {
            ExperienceField::Position => &mut self.position,
            ExperienceField::Enterprise => &mut self.enterprise,
            ExperienceField::StartDate => &mut self.start_date,
            ExperienceField::EndDate => &mut self.end_date,
            ExperienceField::Description => &mut self.description,
            ExperienceField::Location => &mut self.location,
        };
        *slot = value.to_string();
        Ok(())
    }

    fn is_blank(&self, field: ExperienceField) -> bool {
        let value = match field {
            ExperienceField::Position => &self.position,
            ExperienceField::Enterprise => &self.enterprise,
            ExperienceField::StartDate => &self.start_date,
            ExperienceField::EndDate => &self.end_date,
            ExperienceField::Description => &self.description,
            ExperienceField::Location => &self.location,
        };
        value.trim().is_empty()
    }

    fn check_field(&self, field: ExperienceField) -> Option<String> {
        check_experience(field, self)
    }

    fn dependents(field: ExperienceField) -> &'static [ExperienceField] {
        match field {
            ExperienceField::StartDate => &[ExperienceField::EndDate],
            _ => &[],
        }
    }
}

impl SectionRecord for SkillRecord {
    type Field = SkillField;

    const KIND: SectionKind = SectionKind::Skills;
    const FIELDS: &'static [SkillField] = &[SkillField::Name, SkillField::Degree];

    /// Manually entered skills start at NOVICE.
    fn blank() -> Self {
        Self {
            name: String::new(),
            degree: Some(SkillDegree::Novice),
        }
    }

    fn set_field(&mut self, field: SkillField, value: &str) -> Result<(), WizardError> {
        match field {
            SkillField::Name => self.name = value.to_string(),
            SkillField::Degree if value.trim().is_empty() => self.degree = None,
            SkillField::Degree => {
                let degree = value.parse::<SkillDegree>().map_err(|_| WizardError::InvalidChoice {
                    field: "skill degree",
                    value: value.to_string(),
                })?;
                self.degree = Some(degree);
            }
        }
        Ok(())
    }

    fn is_blank(&self, field: SkillField) -> bool {
        match field {
            SkillField::Name => self.name.trim().is_empty(),
            SkillField::Degree => self.degree.is_none(),
        }
    }

    fn check_field(&self, field: SkillField) -> Option<String> {
        check_skill(field, self)
    }
}

impl SectionRecord for SocialLinkRecord {
    type Field = SocialLinkField;

    const KIND: SectionKind = SectionKind::SocialLinks;
    const FIELDS: &'static [SocialLinkField] = &[SocialLinkField::Platform, SocialLinkField::Link];

    fn blank() -> Self {
        Self {
            platform: SocialPlatform::Other,
            link: String::new(),
        }
    }

    fn set_field(&mut self, field: SocialLinkField, value: &str) -> Result<(), WizardError> {
        match field {
            SocialLinkField::Link => self.link = value.to_string(),
            SocialLinkField::Platform => {
                self.platform =
                    value
                        .parse::<SocialPlatform>()
                        .map_err(|_| WizardError::InvalidChoice {
                            field: "social platform",
                            value: value.to_string(),
                        })?;
            }
        }
        Ok(())
    }

    fn is_blank(&self, field: SocialLinkField) -> bool {
        match field {
            SocialLinkField::Platform => false,
            SocialLinkField::Link => self.link.trim().is_empty(),
        }
    }

    fn check_field(&self, field: SocialLinkField) -> Option<String> {
        check_social_link(field, self)
    }

    fn dependents(field: SocialLinkField) -> &'static [SocialLinkField] {
        match field {
            SocialLinkField::Platform => &[SocialLinkField::Link],
            SocialLinkField::Link => &[],
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Entry
// ────────────────────────────────────────────────────────────────────────────

/// One row of a section: a stable id, the record, and the record's field errors.
#[derive(Debug, Clone, Serialize)]
pub struct Entry<T: SectionRecord> {
    pub id: Uuid,
    #[serde(flatten)]
    pub data: T,
    #[serde(skip)]
    errors: BTreeMap<T::Field, String>,
}

impl<T: SectionRecord> Entry<T> {
    pub fn new(data: T) -> Self {
        Self {
            id: Uuid::new_v4(),
            data,
            errors: BTreeMap::new(),
        }
    }

    pub fn errors(&self) -> &BTreeMap<T::Field, String> {
        &self.errors
    }

    #[cfg(test)]
    pub fn error(&self, field: T::Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    /// Present exactly when at least one field error is.
    pub fn aggregate_error(&self) -> Option<&'static str> {
        if self.errors.is_empty() {
            None
        } else {
            Some(AGGREGATE_MESSAGE)
        }
    }

    fn recheck(&mut self, field: T::Field) {
        match self.data.check_field(field) {
            Some(message) => {
                self.errors.insert(field, message);
            }
            None => {
                self.errors.remove(&field);
            }
        }
    }

    /// Live validation after `field` changed. Dependent fields are re-checked
    /// only once the user has filled them or they already show an error.
    fn revalidate(&mut self, field: T::Field) {
        self.recheck(field);
        for &dependent in T::dependents(field) {
            if !self.data.is_blank(dependent) || self.errors.contains_key(&dependent) {
                self.recheck(dependent);
            }
        }
    }

    /// Full validation of every field. Returns the number of failing fields.
    pub fn validate_all(&mut self) -> usize {
        for &field in T::FIELDS {
            self.recheck(field);
        }
        self.errors.len()
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Collection
// ────────────────────────────────────────────────────────────────────────────

/// Ordered rows of one section.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct RecordCollection<T: SectionRecord> {
    entries: Vec<Entry<T>>,
}

impl<T: SectionRecord> Default for RecordCollection<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: SectionRecord> RecordCollection<T> {
    /// A collection holding a single blank row.
    pub fn with_blank() -> Self {
        let mut collection = Self::default();
        collection.add();
        collection
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry<T>> {
        self.entries.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Entry<T>> {
        self.entries.get(index)
    }

    pub fn push(&mut self, data: T) -> Uuid {
        let entry = Entry::new(data);
        let id = entry.id;
        self.entries.push(entry);
        id
    }

    /// Appends a blank row with a fresh id.
    pub fn add(&mut self) -> Uuid {
        self.push(T::blank())
    }

    /// Sets `field` on row `index` and re-validates it.
    ///
    /// `index == len` appends a blank row first, so the trailing "next row"
    /// and existing rows share one entry point. Anything past `len` would leave
    /// a gap and is rejected.
    pub fn update_field(
        &mut self,
        index: usize,
        field: T::Field,
        value: &str,
    ) -> Result<&Entry<T>, WizardError> {
        let len = self.len();
        if index > len {
            return Err(WizardError::IndexOutOfRange {
                section: T::KIND,
                index,
                len,
            });
        }

        // Apply on a copy so a rejected value leaves neither a new row nor a
        // half-written record behind.
        let mut entry = match self.get(index) {
            Some(existing) => existing.clone(),
            None => Entry::new(T::blank()),
        };
        entry.data.set_field(field, value)?;
        entry.revalidate(field);

        if index == len {
            self.entries.push(entry);
        } else {
            self.entries[index] = entry;
        }
        Ok(&self.entries[index])
    }

    /// Removes row `index` together with its errors; later rows shift down by one.
    pub fn remove(&mut self, index: usize) -> Result<Entry<T>, WizardError> {
        let len = self.len();
        if index >= len {
            return Err(WizardError::IndexOutOfRange {
                section: T::KIND,
                index,
                len,
            });
        }
        Ok(self.entries.remove(index))
    }

    /// Discards every row and installs `records` as fresh rows.
    pub fn replace(&mut self, records: Vec<T>) {
        self.entries = records.into_iter().map(Entry::new).collect();
    }

    /// Validates every field of every row. Empty collections pass.
    pub fn validate_all(&mut self) -> usize {
        self.entries.iter_mut().map(Entry::validate_all).sum()
    }

    pub fn clear_errors(&mut self) {
        self.entries.iter_mut().for_each(Entry::clear_errors);
    }
}
