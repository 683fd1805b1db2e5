//! Validation Rule Engine: pure field checkers shared by live validation and the step gate.
//!
//! Every checker maps `(field, value, sibling state)` to an error message or `None`.
//! The step gate in `steps.rs` evaluates the same checkers over every field of a
//! step, so a rule can never exist in one path and not in the other.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;

use crate::wizard::models::{
    EducationField, EducationRecord, ExperienceField, ExperienceRecord, FileSlot, PersonalField,
    PersonalInfo, SkillField, SkillRecord, SocialLinkField, SocialLinkRecord, SocialPlatform,
    UploadedFile,
};

/// Shown on a record whenever any of its fields fails.
pub const AGGREGATE_MESSAGE: &str = "Please fix the errors below";

/// Size ceiling for both the CV and the profile image.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

const NAME_MIN_CHARS: usize = 2;
const NAME_MAX_CHARS: usize = 50;
const PASSWORD_MIN_CHARS: usize = 8;
const PHONE_DIGITS: usize = 8;

const CV_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];
const CV_EXTENSIONS: &[&str] = &["pdf", "doc", "docx"];

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

// Tunisian numbering: 8 digits, leading digit in {2,3,4,5,7}.
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[23457][0-9]{7}$").expect("phone pattern compiles"));

// ────────────────────────────────────────────────────────────────────────────
// Primitive rules
// ────────────────────────────────────────────────────────────────────────────

fn required(value: &str, message: &str) -> Option<String> {
    if value.trim().is_empty() {
        Some(message.to_string())
    } else {
        None
    }
}

fn person_name(value: &str, label: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Some(format!("{label} is required"));
    }
    let len = trimmed.chars().count();
    if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&len) {
        return Some(format!(
            "{label} must be between {NAME_MIN_CHARS} and {NAME_MAX_CHARS} characters"
        ));
    }
    None
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value.trim())
}

/// At least eight characters with one lowercase letter, one uppercase letter and one digit.
pub fn is_strong_password(value: &str) -> bool {
    value.chars().count() >= PASSWORD_MIN_CHARS
        && value.chars().any(|c| c.is_lowercase())
        && value.chars().any(|c| c.is_uppercase())
        && value.chars().any(|c| c.is_ascii_digit())
}

/// Strips everything but digits and keeps the last eight, so international
/// prefixes such as `+216` fall away.
pub fn normalize_phone(value: &str) -> String {
    let digits: Vec<char> = value.chars().filter(|c| c.is_ascii_digit()).collect();
    let start = digits.len().saturating_sub(PHONE_DIGITS);
    digits[start..].iter().collect()
}

pub fn is_valid_phone(value: &str) -> bool {
    PHONE_RE.is_match(&normalize_phone(value))
}

/// Parses a form date. Accepts `YYYY-MM-DD` and ISO date-times (the date prefix is used).
pub fn parse_form_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok().or_else(|| {
        value
            .get(..10)
            .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
    })
}

fn start_date(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        return Some("Start date is required".to_string());
    }
    if parse_form_date(value).is_none() {
        return Some("Please enter a valid start date".to_string());
    }
    None
}

/// End date is required, must parse, and may not precede a parseable start date.
/// Equal dates are accepted.
fn end_date(start: &str, end: &str) -> Option<String> {
    if end.trim().is_empty() {
        return Some("End date is required".to_string());
    }
    let Some(end) = parse_form_date(end) else {
        return Some("Please enter a valid end date".to_string());
    };
    match parse_form_date(start) {
        Some(start) if end < start => Some("End date must be after start date".to_string()),
        _ => None,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Personal step
// ────────────────────────────────────────────────────────────────────────────

pub fn check_personal(field: PersonalField, personal: &PersonalInfo) -> Option<String> {
    let value = personal.get(field);
    match field {
        PersonalField::FirstName => person_name(value, "First name"),
        PersonalField::LastName => person_name(value, "Last name"),
        PersonalField::Email => {
            if value.trim().is_empty() {
                Some("Email is required".to_string())
            } else if !is_valid_email(value) {
                Some("Please enter a valid email address".to_string())
            } else {
                None
            }
        }
        PersonalField::Password => {
            if value.is_empty() {
                Some("Password is required".to_string())
            } else if !is_strong_password(value) {
                Some(
                    "Password must be at least 8 characters and include an uppercase letter, a lowercase letter and a number"
                        .to_string(),
                )
            } else {
                None
            }
        }
        PersonalField::ConfirmPassword => {
            if value.is_empty() {
                Some("Please confirm your password".to_string())
            } else if value != personal.password {
                Some("Passwords do not match".to_string())
            } else {
                None
            }
        }
        PersonalField::PhoneNumber => {
            if value.trim().is_empty() {
                Some("Phone number is required".to_string())
            } else if !is_valid_phone(value) {
                Some("Please enter a valid phone number".to_string())
            } else {
                None
            }
        }
        PersonalField::Address => required(value, "Address is required"),
    }
}

/// Fields whose verdict depends on `field`, re-checked when it changes.
pub fn personal_dependents(field: PersonalField) -> &'static [PersonalField] {
    match field {
        PersonalField::Password => &[PersonalField::ConfirmPassword],
        _ => &[],
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Professional step: files and social links
// ────────────────────────────────────────────────────────────────────────────

fn is_cv_type(file: &UploadedFile) -> bool {
    CV_MIME_TYPES.contains(&file.mime().as_str())
        || file
            .extension()
            .is_some_and(|ext| CV_EXTENSIONS.contains(&ext.as_str()))
}

pub fn check_file(slot: FileSlot, file: Option<&UploadedFile>) -> Option<String> {
    match (slot, file) {
        (FileSlot::Cv, None) => Some("CV is required".to_string()),
        (FileSlot::ProfileImage, None) => None,
        (FileSlot::Cv, Some(file)) => {
            if !is_cv_type(file) {
                Some("CV must be a PDF, DOC or DOCX file".to_string())
            } else if file.size_bytes > MAX_UPLOAD_BYTES {
                Some("CV must be smaller than 5MB".to_string())
            } else {
                None
            }
        }
        (FileSlot::ProfileImage, Some(file)) => {
            if !file.mime().starts_with("image/") {
                Some("Profile image must be an image file".to_string())
            } else if file.size_bytes > MAX_UPLOAD_BYTES {
                Some("Profile image must be smaller than 5MB".to_string())
            } else {
                None
            }
        }
    }
}

/// An empty link is allowed. A filled one must be an absolute URL with a host,
/// and LinkedIn/GitHub rows must point at their own site.
pub fn check_social_link(field: SocialLinkField, record: &SocialLinkRecord) -> Option<String> {
    if field == SocialLinkField::Platform {
        return None;
    }
    let link = record.link.trim();
    if link.is_empty() {
        return None;
    }

    let url = match Url::parse(link) {
        Ok(url) if url.has_host() => url,
        _ => return Some("Please enter a valid URL".to_string()),
    };

    let host_and_path = format!(
        "{}{}",
        url.host_str().unwrap_or_default(),
        url.path()
    )
    .to_ascii_lowercase();

    match record.platform {
        SocialPlatform::Linkedin if !host_and_path.contains("linkedin.com") => {
            Some("Please enter a valid LinkedIn URL".to_string())
        }
        SocialPlatform::Github if !host_and_path.contains("github.com") => {
            Some("Please enter a valid GitHub URL".to_string())
        }
        _ => None,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Repeatable sections
// ────────────────────────────────────────────────────────────────────────────

pub fn check_education(field: EducationField, record: &EducationRecord) -> Option<String> {
    match field {
        EducationField::Institution => required(&record.institution, "Institution is required"),
        EducationField::Diploma => required(&record.diploma, "Diploma is required"),
        EducationField::StartDate => start_date(&record.start_date),
        EducationField::EndDate => end_date(&record.start_date, &record.end_date),
        EducationField::Description => required(&record.description, "Description is required"),
        EducationField::Location => required(&record.location, "Location is required"),
    }
}

pub fn check_experience(field: ExperienceField, record: &ExperienceRecord) -> Option<String> {
    match field {
        ExperienceField::Position => required(&record.position, "Position is required"),
        ExperienceField::Enterprise => required(&record.enterprise, "Company is required"),
        ExperienceField::StartDate => start_date(&record.start_date),
        ExperienceField::EndDate => end_date(&record.start_date, &record.end_date),
        ExperienceField::Description => required(&record.description, "Description is required"),
        ExperienceField::Location => required(&record.location, "Location is required"),
    }
}

pub fn check_skill(field: SkillField, record: &SkillRecord) -> Option<String> {
    match field {
        SkillField::Name => required(&record.name, "Skill name is required"),
        SkillField::Degree => match record.degree {
            Some(_) => None,
            None => Some("Skill level is required".to_string()),
        },
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Terms step
// ────────────────────────────────────────────────────────────────────────────

pub fn check_terms(agree_to_terms: bool) -> Option<String> {
    if agree_to_terms {
        None
    } else {
        Some("You must agree to the terms and conditions".to_string())
    }
}
