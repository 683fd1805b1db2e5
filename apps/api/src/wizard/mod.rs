// Candidate registration wizard: form state, validation, CV autofill and submission.
// All calls to the extraction and registration services go through cv_client / registration.

pub mod engine;
pub mod handlers;
pub mod merge;
pub mod models;
pub mod records;
pub mod session;
pub mod steps;
pub mod submission;
pub mod validation;

use thiserror::Error;
use uuid::Uuid;

use crate::wizard::models::SectionKind;
use crate::wizard::steps::Step;

/// Contract violations at the engine boundary. Field validation failures are
/// never errors; they live in the error view.
#[derive(Debug, Error)]
pub enum WizardError {
    #[error("Wizard session {0} not found")]
    SessionNotFound(Uuid),

    #[error("Record index {index} is out of range for {section} (length {len})")]
    IndexOutOfRange {
        section: SectionKind,
        index: usize,
        len: usize,
    },

    #[error("'{value}' is not a valid {field}")]
    InvalidChoice { field: &'static str, value: String },

    #[error("A CV is already being analysed")]
    ExtractionPending,

    #[error("The registration is already being submitted")]
    SubmissionPending,

    #[error("Step {step} has unresolved errors")]
    SubmissionBlocked { step: Step },

    #[error("Failed to encode submission: {0}")]
    Encoding(#[from] serde_json::Error),
}
