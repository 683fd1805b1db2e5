//! WizardFormEngine: the registration form aggregate.
//!
//! Owns the wizard state, the scalar validation errors, the step sequencer and
//! the banner. Every mutating method validates what it touched before it returns.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::cv_client::{ExtractedProfile, ExtractionError};
use crate::wizard::merge::{merge_extracted, MergeReport};
use crate::wizard::models::{
    EducationField, ExperienceField, FileSlot, PersonalField, SectionKind, SkillField,
    SocialLinkField, UploadedFile, WizardState,
};
use crate::wizard::records::{RecordCollection, SectionRecord};
use crate::wizard::steps::{Direction, Rule, Step, StepSequencer};
use crate::wizard::submission::{assemble, RegistrationPayload};
use crate::wizard::validation::{check_file, check_personal, check_terms, personal_dependents};
use crate::wizard::WizardError;

// ────────────────────────────────────────────────────────────────────────────
// Inputs
// ────────────────────────────────────────────────────────────────────────────

/// A single field edit in one of the repeatable sections.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "section", rename_all = "camelCase")]
pub enum RecordUpdate {
    Education {
        index: usize,
        field: EducationField,
        value: String,
    },
    Experience {
        index: usize,
        field: ExperienceField,
        value: String,
    },
    Skills {
        index: usize,
        field: SkillField,
        value: String,
    },
    SocialLinks {
        index: usize,
        field: SocialLinkField,
        value: String,
    },
}

// ────────────────────────────────────────────────────────────────────────────
// Outputs
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BannerKind {
    Info,
    Error,
}

/// A dismissible form-level message, separate from field errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Banner {
    pub kind: BannerKind,
    pub message: String,
}

impl Banner {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Error,
            message: message.into(),
        }
    }
}

/// Result of pressing "next".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextOutcome {
    Advanced(Step),
    Blocked { step: Step, violations: usize },
    /// The terms step passed; the caller submits.
    ReadyToSubmit,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordErrorsView<F: Ord + Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<&'static str>,
    pub fields: BTreeMap<F, String>,
}

/// Mirror of the state shape holding only error messages.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorsView {
    pub personal: BTreeMap<PersonalField, String>,
    pub files: BTreeMap<FileSlot, String>,
    pub education: Vec<RecordErrorsView<EducationField>>,
    pub experience: Vec<RecordErrorsView<ExperienceField>>,
    pub skills: Vec<RecordErrorsView<SkillField>>,
    pub social_links: Vec<RecordErrorsView<SocialLinkField>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agree_to_terms: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardView<'a> {
    pub id: Uuid,
    pub step: Step,
    pub direction: Direction,
    pub state: &'a WizardState,
    pub errors: ErrorsView,
    pub banner: Option<&'a Banner>,
    pub extraction_pending: bool,
    pub submission_pending: bool,
}

fn record_errors<T: SectionRecord>(
    collection: &RecordCollection<T>,
) -> Vec<RecordErrorsView<T::Field>> {
    collection
        .iter()
        .map(|entry| RecordErrorsView {
            entry: entry.aggregate_error(),
            fields: entry.errors().clone(),
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Engine
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct WizardFormEngine {
    id: Uuid,
    state: WizardState,
    personal_errors: BTreeMap<PersonalField, String>,
    file_errors: BTreeMap<FileSlot, String>,
    terms_error: Option<String>,
    sequencer: StepSequencer,
    banner: Option<Banner>,
    extraction_pending: bool,
    submission_pending: bool,
    touched_at: DateTime<Utc>,
}

impl Default for WizardFormEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardFormEngine {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: WizardState::new(),
            personal_errors: BTreeMap::new(),
            file_errors: BTreeMap::new(),
            terms_error: None,
            sequencer: StepSequencer::default(),
            banner: None,
            extraction_pending: false,
            submission_pending: false,
            touched_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    #[cfg(test)]
    pub fn state(&self) -> &WizardState {
        &self.state
    }

    #[cfg(test)]
    pub fn current_step(&self) -> Step {
        self.sequencer.current()
    }

    #[cfg(test)]
    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    #[cfg(test)]
    pub fn extraction_pending(&self) -> bool {
        self.extraction_pending
    }

    pub fn touched_at(&self) -> DateTime<Utc> {
        self.touched_at
    }

    fn touch(&mut self) {
        self.touched_at = Utc::now();
    }

    // ── field mutation ──────────────────────────────────────────────────────

    fn recheck_personal(&mut self, field: PersonalField) {
        match check_personal(field, &self.state.personal) {
            Some(message) => {
                self.personal_errors.insert(field, message);
            }
            None => {
                self.personal_errors.remove(&field);
            }
        }
    }

    /// Live validation of a personal field plus the fields that depend on it.
    /// A dependent is only re-checked once the user has filled it.
    fn revalidate_personal(&mut self, field: PersonalField) {
        self.recheck_personal(field);
        for &dependent in personal_dependents(field) {
            if !self.state.personal.get(dependent).is_empty() {
                self.recheck_personal(dependent);
            }
        }
    }

    pub fn set_personal(&mut self, field: PersonalField, value: String) {
        debug!("Wizard {}: set {:?}", self.id, field);
        self.state.personal.set(field, value);
        self.revalidate_personal(field);
        self.touch();
    }

    pub fn update_record(&mut self, update: RecordUpdate) -> Result<(), WizardError> {
        match update {
            RecordUpdate::Education {
                index,
                field,
                value,
            } => self.state.education.update_field(index, field, &value).map(drop),
            RecordUpdate::Experience {
                index,
                field,
                value,
            } => self.state.experience.update_field(index, field, &value).map(drop),
            RecordUpdate::Skills {
                index,
                field,
                value,
            } => self.state.skills.update_field(index, field, &value).map(drop),
            RecordUpdate::SocialLinks {
                index,
                field,
                value,
            } => self.state.social_links.update_field(index, field, &value).map(drop),
        }?;
        self.touch();
        Ok(())
    }

    pub fn add_record(&mut self, section: SectionKind) -> Uuid {
        self.touch();
        match section {
            SectionKind::Education => self.state.education.add(),
            SectionKind::Experience => self.state.experience.add(),
            SectionKind::Skills => self.state.skills.add(),
            SectionKind::SocialLinks => self.state.social_links.add(),
        }
    }

    pub fn remove_record(&mut self, section: SectionKind, index: usize) -> Result<(), WizardError> {
        match section {
            SectionKind::Education => self.state.education.remove(index).map(drop),
            SectionKind::Experience => self.state.experience.remove(index).map(drop),
            SectionKind::Skills => self.state.skills.remove(index).map(drop),
            SectionKind::SocialLinks => self.state.social_links.remove(index).map(drop),
        }?;
        self.touch();
        Ok(())
    }

    pub fn set_terms(&mut self, agree: bool) {
        self.state.agree_to_terms = agree;
        self.terms_error = check_terms(agree);
        self.touch();
    }

    fn recheck_file(&mut self, slot: FileSlot) {
        match check_file(slot, self.state.files.get(slot)) {
            Some(message) => {
                self.file_errors.insert(slot, message);
            }
            None => {
                self.file_errors.remove(&slot);
            }
        }
    }

    pub fn attach_file(&mut self, slot: FileSlot, file: UploadedFile) {
        debug!("Wizard {}: attach {:?} '{}'", self.id, slot, file.file_name);
        *self.state.files.slot_mut(slot) = Some(file);
        self.recheck_file(slot);
        self.touch();
    }

    pub fn detach_file(&mut self, slot: FileSlot) {
        *self.state.files.slot_mut(slot) = None;
        self.recheck_file(slot);
        self.touch();
    }

    pub fn dismiss_banner(&mut self) {
        self.banner = None;
    }

    // ── validation ──────────────────────────────────────────────────────────

    fn apply_rule(&mut self, rule: Rule) -> usize {
        match rule {
            Rule::Personal(field) => {
                self.recheck_personal(field);
                usize::from(self.personal_errors.contains_key(&field))
            }
            Rule::File(slot) => {
                self.recheck_file(slot);
                usize::from(self.file_errors.contains_key(&slot))
            }
            Rule::Records(SectionKind::Education) => self.state.education.validate_all(),
            Rule::Records(SectionKind::Experience) => self.state.experience.validate_all(),
            Rule::Records(SectionKind::Skills) => self.state.skills.validate_all(),
            Rule::Records(SectionKind::SocialLinks) => self.state.social_links.validate_all(),
            Rule::Terms => {
                self.terms_error = check_terms(self.state.agree_to_terms);
                usize::from(self.terms_error.is_some())
            }
        }
    }

    /// Runs every rule of `step`, records the errors, and returns how many fields failed.
    pub fn validate_step(&mut self, step: Step) -> usize {
        step.rules().iter().map(|&rule| self.apply_rule(rule)).sum()
    }

    fn clear_step_errors(&mut self, step: Step) {
        for &rule in step.rules() {
            match rule {
                Rule::Personal(field) => {
                    self.personal_errors.remove(&field);
                }
                Rule::File(slot) => {
                    self.file_errors.remove(&slot);
                }
                Rule::Records(SectionKind::Education) => self.state.education.clear_errors(),
                Rule::Records(SectionKind::Experience) => self.state.experience.clear_errors(),
                Rule::Records(SectionKind::Skills) => self.state.skills.clear_errors(),
                Rule::Records(SectionKind::SocialLinks) => self.state.social_links.clear_errors(),
                Rule::Terms => self.terms_error = None,
            }
        }
    }

    // ── step transitions ────────────────────────────────────────────────────

    /// The step gate: never leaves a step that has any violation.
    pub fn next(&mut self) -> NextOutcome {
        self.touch();
        let step = self.sequencer.current();
        let violations = self.validate_step(step);
        if violations > 0 {
            info!(
                "Wizard {}: step {} blocked by {} violation(s)",
                self.id, step, violations
            );
            return NextOutcome::Blocked { step, violations };
        }

        match self.sequencer.advance() {
            Some(next) => {
                info!("Wizard {}: step {} -> {}", self.id, step, next);
                NextOutcome::Advanced(next)
            }
            None => NextOutcome::ReadyToSubmit,
        }
    }

    /// Steps back, discarding the displayed errors of the step being left.
    /// Returns `None` on the first step.
    pub fn previous(&mut self) -> Option<Step> {
        self.touch();
        let leaving = self.sequencer.current();
        let previous = self.sequencer.retreat()?;
        self.clear_step_errors(leaving);
        debug!("Wizard {}: step {} -> {}", self.id, leaving, previous);
        Some(previous)
    }

    // ── extraction ──────────────────────────────────────────────────────────

    /// Marks an extraction as in flight. A second one is refused until it settles.
    pub fn begin_extraction(&mut self) -> Result<(), WizardError> {
        if self.extraction_pending {
            return Err(WizardError::ExtractionPending);
        }
        self.extraction_pending = true;
        self.touch();
        Ok(())
    }

    /// Settles an extraction. On success the profile is merged and the merged
    /// personal fields are re-validated; on failure nothing but the banner changes.
    pub fn finish_extraction(
        &mut self,
        result: Result<ExtractedProfile, ExtractionError>,
    ) -> Option<MergeReport> {
        self.extraction_pending = false;
        self.touch();
        match result {
            Ok(profile) => {
                let report = merge_extracted(&mut self.state, &profile);
                for &field in &report.personal_fields {
                    self.revalidate_personal(field);
                }
                info!("Wizard {}: merged {:?} from CV", self.id, report.merged);
                self.banner = Some(Banner::info(report.summary()));
                Some(report)
            }
            Err(err) => {
                info!("Wizard {}: CV extraction failed: {}", self.id, err);
                self.banner = Some(Banner::error(err.user_message()));
                None
            }
        }
    }

    // ── submission ──────────────────────────────────────────────────────────

    /// Re-validates every step and assembles the payload. The first failing
    /// step becomes current so its errors are visible.
    ///
    /// A successful call marks the submission in flight; a second one is
    /// refused until `submission_failed` settles it.
    pub fn prepare_submission(&mut self) -> Result<RegistrationPayload, WizardError> {
        if self.submission_pending {
            return Err(WizardError::SubmissionPending);
        }
        self.touch();
        for step in Step::ALL {
            if self.validate_step(step) > 0 {
                self.sequencer.jump_to(step);
                return Err(WizardError::SubmissionBlocked { step });
            }
        }
        self.banner = None;
        let payload = assemble(&self.state)?;
        self.submission_pending = true;
        Ok(payload)
    }

    /// Records a failed submission as a form-level banner. Nothing else is reset.
    pub fn submission_failed(&mut self, message: impl Into<String>) {
        self.submission_pending = false;
        self.banner = Some(Banner::error(message));
    }

    // ── views ───────────────────────────────────────────────────────────────

    pub fn errors_view(&self) -> ErrorsView {
        ErrorsView {
            personal: self.personal_errors.clone(),
            files: self.file_errors.clone(),
            education: record_errors(&self.state.education),
            experience: record_errors(&self.state.experience),
            skills: record_errors(&self.state.skills),
            social_links: record_errors(&self.state.social_links),
            agree_to_terms: self.terms_error.clone(),
        }
    }

    pub fn view(&self) -> WizardView<'_> {
        WizardView {
            id: self.id,
            step: self.sequencer.current(),
            direction: self.sequencer.direction(),
            state: &self.state,
            errors: self.errors_view(),
            banner: self.banner.as_ref(),
            extraction_pending: self.extraction_pending,
            submission_pending: self.submission_pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    use crate::wizard::validation::AGGREGATE_MESSAGE;

    fn fill_personal(engine: &mut WizardFormEngine) {
        let values = [
            (PersonalField::FirstName, "Ada"),
            (PersonalField::LastName, "Lovelace"),
            (PersonalField::Email, "ada@example.com"),
            (PersonalField::Password, "Analytical1"),
            (PersonalField::ConfirmPassword, "Analytical1"),
            (PersonalField::PhoneNumber, "+216 70 250 000"),
            (PersonalField::Address, "Tunis"),
        ];
        for (field, value) in values {
            engine.set_personal(field, value.to_string());
        }
    }

    fn cv() -> UploadedFile {
        UploadedFile::new("cv.pdf", "application/pdf", Bytes::from_static(b"%PDF-1.7"))
    }

    fn education(index: usize) -> Vec<RecordUpdate> {
        let values = [
            (EducationField::Institution, "ENIT"),
            (EducationField::Diploma, "Engineering"),
            (EducationField::StartDate, "2015-09-01"),
            (EducationField::EndDate, "2018-06-30"),
            (EducationField::Description, "Software engineering"),
            (EducationField::Location, "Tunis"),
        ];
        values
            .into_iter()
            .map(|(field, value)| RecordUpdate::Education {
                index,
                field,
                value: value.to_string(),
            })
            .collect()
    }

    fn experience(index: usize) -> Vec<RecordUpdate> {
        let values = [
            (ExperienceField::Position, "Engineer"),
            (ExperienceField::Enterprise, "Acme"),
            (ExperienceField::StartDate, "2018-09-01"),
            (ExperienceField::EndDate, "2022-06-30"),
            (ExperienceField::Description, "Backend services"),
            (ExperienceField::Location, "Sfax"),
        ];
        values
            .into_iter()
            .map(|(field, value)| RecordUpdate::Experience {
                index,
                field,
                value: value.to_string(),
            })
            .collect()
    }

    fn complete_engine() -> WizardFormEngine {
        let mut engine = WizardFormEngine::new();
        fill_personal(&mut engine);
        engine.attach_file(FileSlot::Cv, cv());
        for update in education(0).into_iter().chain(experience(0)) {
            engine.update_record(update).unwrap();
        }
        engine
            .update_record(RecordUpdate::Skills {
                index: 0,
                field: SkillField::Name,
                value: "Rust".to_string(),
            })
            .unwrap();
        engine
    }

    #[test]
    fn test_personal_gate_stays_closed_until_last_field_filled() {
        let mut engine = WizardFormEngine::new();
        let values = [
            (PersonalField::FirstName, "Ada"),
            (PersonalField::LastName, "Lovelace"),
            (PersonalField::Email, "ada@example.com"),
            (PersonalField::Password, "Analytical1"),
            (PersonalField::ConfirmPassword, "Analytical1"),
            (PersonalField::PhoneNumber, "70250000"),
            (PersonalField::Address, "Tunis"),
        ];

        for (filled, (field, value)) in values.iter().enumerate() {
            let outcome = engine.next();
            assert_eq!(
                outcome,
                NextOutcome::Blocked {
                    step: Step::Personal,
                    violations: values.len() - filled
                }
            );
            engine.set_personal(*field, value.to_string());
        }

        assert_eq!(engine.next(), NextOutcome::Advanced(Step::Professional));
    }

    #[test]
    fn test_education_gate_stays_closed_until_last_field_filled() {
        let mut engine = WizardFormEngine::new();
        engine.sequencer.jump_to(Step::Education);
        let values = [
            (EducationField::Institution, "ENIT"),
            (EducationField::Diploma, "Engineering degree"),
            (EducationField::StartDate, "2019-09-01"),
            (EducationField::EndDate, "2022-06-30"),
            (EducationField::Description, "Software engineering"),
            (EducationField::Location, "Tunis"),
        ];

        for (filled, (field, value)) in values.iter().enumerate() {
            assert_eq!(
                engine.next(),
                NextOutcome::Blocked {
                    step: Step::Education,
                    violations: values.len() - filled
                }
            );
            engine
                .update_record(RecordUpdate::Education {
                    index: 0,
                    field: *field,
                    value: value.to_string(),
                })
                .unwrap();
        }

        assert_eq!(engine.next(), NextOutcome::Advanced(Step::Experience));
    }

    #[test]
    fn test_password_change_flags_confirm_immediately() {
        let mut engine = WizardFormEngine::new();
        engine.set_personal(PersonalField::Password, "Analytical1".to_string());
        engine.set_personal(PersonalField::ConfirmPassword, "Analytical1".to_string());
        assert!(engine.errors_view().personal.is_empty());

        engine.set_personal(PersonalField::Password, "Analytical2".to_string());
        assert_eq!(
            engine
                .errors_view()
                .personal
                .get(&PersonalField::ConfirmPassword)
                .map(String::as_str),
            Some("Passwords do not match")
        );

        engine.set_personal(PersonalField::ConfirmPassword, "Analytical2".to_string());
        assert!(engine.errors_view().personal.is_empty());
    }

    #[test]
    fn test_password_change_does_not_flag_empty_confirm() {
        let mut engine = WizardFormEngine::new();
        engine.set_personal(PersonalField::Password, "Analytical1".to_string());
        assert!(!engine
            .errors_view()
            .personal
            .contains_key(&PersonalField::ConfirmPassword));
    }

    #[test]
    fn test_professional_step_requires_cv() {
        let mut engine = WizardFormEngine::new();
        fill_personal(&mut engine);
        engine.next();

        assert_eq!(
            engine.next(),
            NextOutcome::Blocked {
                step: Step::Professional,
                violations: 1
            }
        );
        engine.attach_file(FileSlot::Cv, cv());
        assert_eq!(engine.next(), NextOutcome::Advanced(Step::Education));
    }

    #[test]
    fn test_professional_step_checks_social_links() {
        let mut engine = WizardFormEngine::new();
        fill_personal(&mut engine);
        engine.next();
        engine.attach_file(FileSlot::Cv, cv());
        engine
            .update_record(RecordUpdate::SocialLinks {
                index: 0,
                field: SocialLinkField::Link,
                value: "https://example.com/ada".to_string(),
            })
            .unwrap();

        assert!(matches!(engine.next(), NextOutcome::Blocked { .. }));
        let errors = engine.errors_view();
        assert_eq!(errors.social_links[0].entry, Some(AGGREGATE_MESSAGE));
        assert!(errors.social_links[1].entry.is_none());
    }

    #[test]
    fn test_blank_seeded_row_blocks_but_empty_section_passes() {
        let mut engine = WizardFormEngine::new();
        fill_personal(&mut engine);
        engine.next();
        engine.attach_file(FileSlot::Cv, cv());
        engine.next();
        assert_eq!(engine.current_step(), Step::Education);

        assert!(matches!(
            engine.next(),
            NextOutcome::Blocked {
                step: Step::Education,
                violations: 6
            }
        ));

        engine.remove_record(SectionKind::Education, 0).unwrap();
        assert_eq!(engine.next(), NextOutcome::Advanced(Step::Experience));
    }

    #[test]
    fn test_previous_clears_errors_of_step_left() {
        let mut engine = WizardFormEngine::new();
        fill_personal(&mut engine);
        engine.next();
        engine.next();
        assert!(engine.errors_view().files.contains_key(&FileSlot::Cv));

        assert_eq!(engine.previous(), Some(Step::Personal));
        assert!(engine.errors_view().files.is_empty());
        assert_eq!(engine.view().direction, Direction::Prev);
    }

    #[test]
    fn test_previous_on_first_step_is_a_no_op() {
        let mut engine = WizardFormEngine::new();
        assert_eq!(engine.previous(), None);
        assert_eq!(engine.current_step(), Step::Personal);
    }

    #[test]
    fn test_full_walk_reaches_submission() {
        let mut engine = complete_engine();
        for expected in [
            Step::Professional,
            Step::Education,
            Step::Experience,
            Step::Skills,
            Step::Terms,
        ] {
            assert_eq!(engine.next(), NextOutcome::Advanced(expected));
        }

        assert!(matches!(
            engine.next(),
            NextOutcome::Blocked {
                step: Step::Terms,
                ..
            }
        ));
        engine.set_terms(true);
        assert_eq!(engine.next(), NextOutcome::ReadyToSubmit);

        let payload = engine.prepare_submission().unwrap();
        assert_eq!(payload.role, "CANDIDATE");
        assert_eq!(payload.email, "ada@example.com");
    }

    #[test]
    fn test_prepare_submission_jumps_to_first_failing_step() {
        let mut engine = complete_engine();
        engine.set_terms(true);
        engine.set_personal(PersonalField::Email, "not-an-email".to_string());
        engine.sequencer.jump_to(Step::Terms);

        let err = engine.prepare_submission().unwrap_err();
        assert!(matches!(
            err,
            WizardError::SubmissionBlocked {
                step: Step::Personal
            }
        ));
        assert_eq!(engine.current_step(), Step::Personal);
    }

    #[test]
    fn test_submission_failure_keeps_state_and_step() {
        let mut engine = complete_engine();
        engine.sequencer.jump_to(Step::Terms);
        engine.set_terms(true);

        engine.submission_failed("Email already exists");

        assert_eq!(engine.current_step(), Step::Terms);
        assert_eq!(engine.state().personal.first_name, "Ada");
        assert_eq!(
            engine.banner(),
            Some(&Banner::error("Email already exists"))
        );
    }

    #[test]
    fn test_second_submission_is_refused_until_first_settles() {
        let mut engine = complete_engine();
        engine.sequencer.jump_to(Step::Terms);
        engine.set_terms(true);

        engine.prepare_submission().unwrap();
        assert!(matches!(
            engine.prepare_submission(),
            Err(WizardError::SubmissionPending)
        ));

        engine.submission_failed("Registration failed. Please try again.");
        assert!(engine.prepare_submission().is_ok());
    }

    #[test]
    fn test_second_extraction_is_refused_while_pending() {
        let mut engine = WizardFormEngine::new();
        engine.begin_extraction().unwrap();
        assert!(matches!(
            engine.begin_extraction(),
            Err(WizardError::ExtractionPending)
        ));
        engine.finish_extraction(Ok(ExtractedProfile::default()));
        assert!(engine.begin_extraction().is_ok());
    }

    #[test]
    fn test_extraction_merge_validates_merged_fields() {
        let mut engine = WizardFormEngine::new();
        engine.begin_extraction().unwrap();
        let report = engine
            .finish_extraction(Ok(ExtractedProfile {
                phone: Some("+1 555 0100".to_string()),
                ..Default::default()
            }))
            .unwrap();

        assert_eq!(report.merged, vec!["phone number"]);
        assert!(engine
            .errors_view()
            .personal
            .contains_key(&PersonalField::PhoneNumber));
        assert_eq!(engine.banner().unwrap().kind, BannerKind::Info);
    }

    #[test]
    fn test_extraction_failure_keeps_file_and_state() {
        let mut engine = WizardFormEngine::new();
        engine.set_personal(PersonalField::Email, "a@b.com".to_string());
        engine.attach_file(FileSlot::Cv, cv());
        engine.begin_extraction().unwrap();

        let report = engine.finish_extraction(Err(ExtractionError::Service {
            status: 500,
            message: "Failed to load PDF".to_string(),
        }));

        assert!(report.is_none());
        assert!(engine.state().files.cv.is_some());
        assert_eq!(engine.state().personal.email, "a@b.com");
        assert_eq!(engine.state().skills.len(), 1);
        assert!(!engine.extraction_pending());
        assert_eq!(engine.banner().unwrap().kind, BannerKind::Error);
    }

    #[test]
    fn test_record_update_rejects_gaps() {
        let mut engine = WizardFormEngine::new();
        let err = engine
            .update_record(RecordUpdate::Skills {
                index: 5,
                field: SkillField::Name,
                value: "Go".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, WizardError::IndexOutOfRange { .. }));
    }

    #[test]
    fn test_record_update_deserializes_from_tagged_json() {
        let update: RecordUpdate = serde_json::from_str(
            r#"{"section":"skills","index":1,"field":"name","value":"Go"}"#,
        )
        .unwrap();
        let mut engine = WizardFormEngine::new();
        engine.update_record(update).unwrap();
        assert_eq!(engine.state().skills.len(), 2);
    }

    #[test]
    fn test_view_omits_aggregate_for_clean_rows() {
        let engine = WizardFormEngine::new();
        let json = serde_json::to_value(engine.view()).unwrap();
        assert_eq!(json["step"], 1);
        assert_eq!(json["direction"], "next");
        assert!(json["errors"]["skills"][0].get("entry").is_none());
        assert!(json["state"]["personal"].get("password").is_none());
        assert_eq!(json["state"]["socialLinks"][0]["platform"], "LINKEDIN");
    }
}
