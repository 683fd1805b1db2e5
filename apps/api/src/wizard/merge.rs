//! CV-Extraction Merge: applies a parsed CV onto the wizard state.
//!
//! Scalars merge conservatively: a parsed value only fills an empty field.
//! Collections replace aggressively: a non-empty parsed list overwrites the
//! whole section, since merging rows one by one has no well-defined meaning.

use crate::cv_client::ExtractedProfile;
use crate::wizard::models::{
    EducationRecord, ExperienceRecord, PersonalField, SkillDegree, SkillRecord, WizardState,
};

const ROLE_SEPARATOR: &str = " at ";

/// What a merge changed.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MergeReport {
    /// Human-readable names of merged fields, in merge order.
    pub merged: Vec<&'static str>,
    /// Personal fields that received a value and need re-validation.
    pub personal_fields: Vec<PersonalField>,
}

impl MergeReport {
    pub fn is_empty(&self) -> bool {
        self.merged.is_empty()
    }

    /// The single message shown to the user after extraction.
    pub fn summary(&self) -> String {
        if self.is_empty() {
            "No relevant information found in your CV.".to_string()
        } else {
            format!(
                "Information extracted from your CV: {}.",
                self.merged.join(", ")
            )
        }
    }

    fn fill(&mut self, state: &mut WizardState, field: PersonalField, value: &str) -> bool {
        if value.is_empty() || !state.personal.get(field).trim().is_empty() {
            return false;
        }
        state.personal.set(field, value.to_string());
        self.personal_fields.push(field);
        true
    }
}

/// Splits a full name into first name and the rest. Single tokens are ambiguous
/// and yield `None`.
pub fn split_name(name: &str) -> Option<(String, String)> {
    let mut tokens = name.split_whitespace();
    let first = tokens.next()?;
    let rest: Vec<&str> = tokens.collect();
    if rest.is_empty() {
        return None;
    }
    Some((first.to_string(), rest.join(" ")))
}

/// Splits `"<role> at <org>"`; without the separator the whole string is the role.
fn split_role(line: &str) -> (String, String) {
    match line.split_once(ROLE_SEPARATOR) {
        Some((role, org)) => (role.trim().to_string(), org.trim().to_string()),
        None => (line.trim().to_string(), String::new()),
    }
}

fn non_blank(items: &[String]) -> impl Iterator<Item = &str> {
    items.iter().map(|s| s.trim()).filter(|s| !s.is_empty())
}

pub fn merge_extracted(state: &mut WizardState, profile: &ExtractedProfile) -> MergeReport {
    let mut report = MergeReport::default();

    if let Some((first, last)) = profile.name.as_deref().and_then(split_name) {
        let first_set = report.fill(state, PersonalField::FirstName, &first);
        let last_set = report.fill(state, PersonalField::LastName, &last);
        if first_set || last_set {
            report.merged.push("name");
        }
    }

    let scalars = [
        (PersonalField::Email, profile.email.as_deref(), "email"),
        (PersonalField::PhoneNumber, profile.phone.as_deref(), "phone number"),
        (PersonalField::Address, profile.address.as_deref(), "address"),
    ];
    for (field, value, label) in scalars {
        if let Some(value) = value.map(str::trim) {
            if report.fill(state, field, value) {
                report.merged.push(label);
            }
        }
    }

    let skills: Vec<SkillRecord> = non_blank(&profile.skills)
        .map(|name| SkillRecord {
            name: name.to_string(),
            degree: Some(SkillDegree::Intermediate),
        })
        .collect();
    if !skills.is_empty() {
        state.skills.replace(skills);
        report.merged.push("skills");
    }

    let education: Vec<EducationRecord> = non_blank(&profile.education)
        .map(|line| {
            let (diploma, institution) = split_role(line);
            EducationRecord {
                diploma,
                institution,
                ..Default::default()
            }
        })
        .collect();
    if !education.is_empty() {
        state.education.replace(education);
        report.merged.push("education");
    }

    let experience: Vec<ExperienceRecord> = non_blank(&profile.work_experience)
        .map(|line| {
            let (position, enterprise) = split_role(line);
            ExperienceRecord {
                position,
                enterprise,
                ..Default::default()
            }
        })
        .collect();
    if !experience.is_empty() {
        state.experience.replace(experience);
        report.merged.push("work experience");
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> ExtractedProfile {
        ExtractedProfile::default()
    }

    #[test]
    fn test_existing_email_is_not_overwritten() {
        let mut state = WizardState::new();
        state.personal.email = "a@b.com".to_string();

        let report = merge_extracted(
            &mut state,
            &ExtractedProfile {
                email: Some("c@d.com".to_string()),
                ..profile()
            },
        );

        assert_eq!(state.personal.email, "a@b.com");
        assert!(report.is_empty());
    }

    #[test]
    fn test_empty_email_is_filled() {
        let mut state = WizardState::new();
        let report = merge_extracted(
            &mut state,
            &ExtractedProfile {
                email: Some(" c@d.com ".to_string()),
                ..profile()
            },
        );
        assert_eq!(state.personal.email, "c@d.com");
        assert_eq!(report.merged, vec!["email"]);
        assert_eq!(report.personal_fields, vec![PersonalField::Email]);
    }

    #[test]
    fn test_single_token_name_is_not_merged() {
        let mut state = WizardState::new();
        let report = merge_extracted(
            &mut state,
            &ExtractedProfile {
                name: Some("Madonna".to_string()),
                ..profile()
            },
        );
        assert!(state.personal.first_name.is_empty());
        assert!(state.personal.last_name.is_empty());
        assert!(report.is_empty());
    }

    #[test]
    fn test_two_token_name_is_split() {
        let mut state = WizardState::new();
        merge_extracted(
            &mut state,
            &ExtractedProfile {
                name: Some("Ada Lovelace".to_string()),
                ..profile()
            },
        );
        assert_eq!(state.personal.first_name, "Ada");
        assert_eq!(state.personal.last_name, "Lovelace");
    }

    #[test]
    fn test_name_split_keeps_remaining_tokens_in_last_name() {
        assert_eq!(
            split_name("  Ada   King Lovelace "),
            Some(("Ada".to_string(), "King Lovelace".to_string()))
        );
        assert_eq!(split_name("   "), None);
    }

    #[test]
    fn test_name_fills_only_the_empty_half() {
        let mut state = WizardState::new();
        state.personal.first_name = "Augusta".to_string();
        let report = merge_extracted(
            &mut state,
            &ExtractedProfile {
                name: Some("Ada Lovelace".to_string()),
                ..profile()
            },
        );
        assert_eq!(state.personal.first_name, "Augusta");
        assert_eq!(state.personal.last_name, "Lovelace");
        assert_eq!(report.merged, vec!["name"]);
    }

    #[test]
    fn test_skills_replace_blank_row_at_intermediate() {
        let mut state = WizardState::new();
        assert_eq!(state.skills.len(), 1);

        merge_extracted(
            &mut state,
            &ExtractedProfile {
                skills: vec!["Go".to_string(), "Rust".to_string()],
                ..profile()
            },
        );

        let skills: Vec<_> = state.skills.iter().map(|e| e.data.clone()).collect();
        assert_eq!(
            skills,
            vec![
                SkillRecord {
                    name: "Go".to_string(),
                    degree: Some(SkillDegree::Intermediate)
                },
                SkillRecord {
                    name: "Rust".to_string(),
                    degree: Some(SkillDegree::Intermediate)
                },
            ]
        );
    }

    #[test]
    fn test_empty_parsed_collections_leave_sections_alone() {
        let mut state = WizardState::new();
        let before = state.education.get(0).unwrap().id;
        merge_extracted(
            &mut state,
            &ExtractedProfile {
                education: vec!["  ".to_string()],
                ..profile()
            },
        );
        assert_eq!(state.education.len(), 1);
        assert_eq!(state.education.get(0).unwrap().id, before);
    }

    #[test]
    fn test_role_at_org_is_split() {
        let mut state = WizardState::new();
        merge_extracted(
            &mut state,
            &ExtractedProfile {
                education: vec!["MSc Computer Science at ENIT".to_string()],
                work_experience: vec![
                    "Backend Engineer at Acme".to_string(),
                    "Freelance consultant".to_string(),
                ],
                ..profile()
            },
        );

        let edu = &state.education.get(0).unwrap().data;
        assert_eq!(edu.diploma, "MSc Computer Science");
        assert_eq!(edu.institution, "ENIT");

        let first = &state.experience.get(0).unwrap().data;
        assert_eq!(first.position, "Backend Engineer");
        assert_eq!(first.enterprise, "Acme");

        let second = &state.experience.get(1).unwrap().data;
        assert_eq!(second.position, "Freelance consultant");
        assert!(second.enterprise.is_empty());
    }

    #[test]
    fn test_summary_lists_merged_fields() {
        let mut state = WizardState::new();
        let report = merge_extracted(
            &mut state,
            &ExtractedProfile {
                name: Some("Ada Lovelace".to_string()),
                phone: Some("+216 70 250 000".to_string()),
                skills: vec!["Rust".to_string()],
                ..profile()
            },
        );
        assert_eq!(
            report.summary(),
            "Information extracted from your CV: name, phone number, skills."
        );
    }

    #[test]
    fn test_summary_when_nothing_merged() {
        let report = MergeReport::default();
        assert_eq!(report.summary(), "No relevant information found in your CV.");
    }
}
