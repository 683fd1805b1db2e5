use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::wizard::records::RecordCollection;

// ────────────────────────────────────────────────────────────────────────────
// Enumerations
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkillDegree {
    Novice,
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl FromStr for SkillDegree {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NOVICE" => Ok(SkillDegree::Novice),
            "BEGINNER" => Ok(SkillDegree::Beginner),
            "INTERMEDIATE" => Ok(SkillDegree::Intermediate),
            "ADVANCED" => Ok(SkillDegree::Advanced),
            "EXPERT" => Ok(SkillDegree::Expert),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SocialPlatform {
    Linkedin,
    Github,
    Portfolio,
    Other,
}

impl SocialPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            SocialPlatform::Linkedin => "LINKEDIN",
            SocialPlatform::Github => "GITHUB",
            SocialPlatform::Portfolio => "PORTFOLIO",
            SocialPlatform::Other => "OTHER",
        }
    }
}

impl FromStr for SocialPlatform {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LINKEDIN" => Ok(SocialPlatform::Linkedin),
            "GITHUB" => Ok(SocialPlatform::Github),
            "PORTFOLIO" => Ok(SocialPlatform::Portfolio),
            "OTHER" => Ok(SocialPlatform::Other),
            _ => Err(()),
        }
    }
}

/// The repeatable sections of the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionKind {
    Education,
    Experience,
    Skills,
    SocialLinks,
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SectionKind::Education => "education",
            SectionKind::Experience => "experience",
            SectionKind::Skills => "skills",
            SectionKind::SocialLinks => "socialLinks",
        };
        f.write_str(name)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Field identifiers
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PersonalField {
    FirstName,
    LastName,
    Email,
    Password,
    ConfirmPassword,
    PhoneNumber,
    Address,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FileSlot {
    ProfileImage,
    Cv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EducationField {
    Institution,
    Diploma,
    StartDate,
    EndDate,
    Description,
    Location,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExperienceField {
    Position,
    Enterprise,
    StartDate,
    EndDate,
    Description,
    Location,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SkillField {
    Name,
    Degree,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SocialLinkField {
    Platform,
    Link,
}

// ────────────────────────────────────────────────────────────────────────────
// Records
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationRecord {
    pub institution: String,
    pub diploma: String,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
    pub location: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceRecord {
    pub position: String,
    pub enterprise: String,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillRecord {
    pub name: String,
    pub degree: Option<SkillDegree>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SocialLinkRecord {
    pub platform: SocialPlatform,
    pub link: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Scalars and files
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(skip_serializing)]
    pub confirm_password: String,
    pub phone_number: String,
    pub address: String,
}

impl PersonalInfo {
    pub fn get(&self, field: PersonalField) -> &str {
        match field {
            PersonalField::FirstName => &self.first_name,
            PersonalField::LastName => &self.last_name,
            PersonalField::Email => &self.email,
            PersonalField::Password => &self.password,
            PersonalField::ConfirmPassword => &self.confirm_password,
            PersonalField::PhoneNumber => &self.phone_number,
            PersonalField::Address => &self.address,
        }
    }

    pub fn set(&mut self, field: PersonalField, value: String) {
        let slot = match field {
            PersonalField::FirstName => &mut self.first_name,
            PersonalField::LastName => &mut self.last_name,
            PersonalField::Email => &mut self.email,
            PersonalField::Password => &mut self.password,
            PersonalField::ConfirmPassword => &mut self.confirm_password,
            PersonalField::PhoneNumber => &mut self.phone_number,
            PersonalField::Address => &mut self.address,
        };
        *slot = value;
    }
}

/// An uploaded document or image. Only the declared metadata is inspected;
/// the bytes are forwarded untouched.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: usize,
    #[serde(skip)]
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            size_bytes: bytes.len(),
            bytes,
        }
    }

    /// Lower-cased file extension, if any.
    pub fn extension(&self) -> Option<String> {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
    }

    pub fn mime(&self) -> String {
        self.content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
    }
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size_bytes", &self.size_bytes)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardFiles {
    pub profile_image: Option<UploadedFile>,
    pub cv: Option<UploadedFile>,
}

impl WizardFiles {
    pub fn get(&self, slot: FileSlot) -> Option<&UploadedFile> {
        match slot {
            FileSlot::ProfileImage => self.profile_image.as_ref(),
            FileSlot::Cv => self.cv.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, slot: FileSlot) -> &mut Option<UploadedFile> {
        match slot {
            FileSlot::ProfileImage => &mut self.profile_image,
            FileSlot::Cv => &mut self.cv,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Aggregate
// ────────────────────────────────────────────────────────────────────────────

/// Everything the candidate has entered so far.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardState {
    pub personal: PersonalInfo,
    pub files: WizardFiles,
    pub education: RecordCollection<EducationRecord>,
    pub experience: RecordCollection<ExperienceRecord>,
    pub skills: RecordCollection<SkillRecord>,
    pub social_links: RecordCollection<SocialLinkRecord>,
    pub agree_to_terms: bool,
}

impl WizardState {
    /// A fresh form: one blank row per repeatable section, and the LinkedIn
    /// and GitHub link rows pre-seeded.
    pub fn new() -> Self {
        let mut social_links = RecordCollection::default();
        social_links.push(SocialLinkRecord {
            platform: SocialPlatform::Linkedin,
            link: String::new(),
        });
        social_links.push(SocialLinkRecord {
            platform: SocialPlatform::Github,
            link: String::new(),
        });

        Self {
            personal: PersonalInfo::default(),
            files: WizardFiles::default(),
            education: RecordCollection::with_blank(),
            experience: RecordCollection::with_blank(),
            skills: RecordCollection::with_blank(),
            social_links,
            agree_to_terms: false,
        }
    }
}

impl Default for WizardState {
    fn default() -> Self {
        Self::new()
    }
}
