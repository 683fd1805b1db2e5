//! Submission Assembler: flattens a validated wizard into the registration contract.

use serde::Serialize;

use crate::wizard::models::{SkillDegree, UploadedFile, WizardState};
use crate::wizard::steps::Step;
use crate::wizard::validation::normalize_phone;
use crate::wizard::WizardError;

/// Every self-registered account is an applicant.
pub const APPLICANT_ROLE: &str = "CANDIDATE";

/// The registration request: scalar text fields, JSON-encoded sections and file parts.
#[derive(Debug, Clone)]
pub struct RegistrationPayload {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub phone_number: String,
    pub role: &'static str,
    pub address: String,
    pub education: String,
    pub experience: String,
    pub skills: String,
    pub social_links: String,
    pub profile_image: Option<UploadedFile>,
    pub cv: UploadedFile,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EducationItem<'a> {
    institution: &'a str,
    diploma: &'a str,
    start_date: &'a str,
    end_date: &'a str,
    description: &'a str,
    location: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExperienceItem<'a> {
    position: &'a str,
    enterprise: &'a str,
    start_date: &'a str,
    end_date: &'a str,
    description: &'a str,
    location: &'a str,
}

#[derive(Serialize)]
struct SkillItem<'a> {
    name: &'a str,
    degree: Option<SkillDegree>,
}

#[derive(Serialize)]
struct SocialLinkItem<'a> {
    #[serde(rename = "type")]
    platform: &'a str,
    link: &'a str,
}

/// Builds the payload. Callers validate every step first; the only check left
/// here is the CV handle, which the payload cannot be built without.
pub fn assemble(state: &WizardState) -> Result<RegistrationPayload, WizardError> {
    let cv = state
        .files
        .cv
        .clone()
        .ok_or(WizardError::SubmissionBlocked {
            step: Step::Professional,
        })?;

    let education: Vec<EducationItem> = state
        .education
        .iter()
        .map(|entry| {
            let r = &entry.data;
            EducationItem {
                institution: r.institution.trim(),
                diploma: r.diploma.trim(),
                start_date: r.start_date.trim(),
                end_date: r.end_date.trim(),
                description: r.description.trim(),
                location: r.location.trim(),
            }
        })
        .collect();

    let experience: Vec<ExperienceItem> = state
        .experience
        .iter()
        .map(|entry| {
            let r = &entry.data;
            ExperienceItem {
                position: r.position.trim(),
                enterprise: r.enterprise.trim(),
                start_date: r.start_date.trim(),
                end_date: r.end_date.trim(),
                description: r.description.trim(),
                location: r.location.trim(),
            }
        })
        .collect();

    let skills: Vec<SkillItem> = state
        .skills
        .iter()
        .map(|entry| SkillItem {
            name: entry.data.name.trim(),
            degree: entry.data.degree,
        })
        .collect();

    // Blank link rows are placeholders, not links.
    let social_links: Vec<SocialLinkItem> = state
        .social_links
        .iter()
        .filter(|entry| !entry.data.link.trim().is_empty())
        .map(|entry| SocialLinkItem {
            platform: entry.data.platform.as_str(),
            link: entry.data.link.trim(),
        })
        .collect();

    let personal = &state.personal;
    Ok(RegistrationPayload {
        first_name: personal.first_name.trim().to_string(),
        last_name: personal.last_name.trim().to_string(),
        email: personal.email.trim().to_string(),
        password: personal.password.clone(),
        phone_number: normalize_phone(&personal.phone_number),
        role: APPLICANT_ROLE,
        address: personal.address.trim().to_string(),
        education: serde_json::to_string(&education)?,
        experience: serde_json::to_string(&experience)?,
        skills: serde_json::to_string(&skills)?,
        social_links: serde_json::to_string(&social_links)?,
        profile_image: state.files.profile_image.clone(),
        cv,
    })
}
