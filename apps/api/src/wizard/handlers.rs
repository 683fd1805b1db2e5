//! Axum route handlers for the registration wizard API.

use std::sync::Arc;

use anyhow::anyhow;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cv_client::ensure_extractable;
use crate::errors::AppError;
use crate::registration::Registrar;
use crate::state::AppState;
use crate::wizard::engine::{NextOutcome, RecordUpdate, WizardFormEngine};
use crate::wizard::models::{FileSlot, PersonalField, SectionKind, UploadedFile};
use crate::wizard::session::WizardSessions;
use crate::wizard::submission::RegistrationPayload;
use crate::wizard::WizardError;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PersonalUpdate {
    pub field: PersonalField,
    pub value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermsUpdate {
    pub agree_to_terms: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StepOutcome {
    Advanced,
    Retreated,
    Blocked,
    Unchanged,
    Submitted,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResponse {
    pub outcome: StepOutcome,
    /// The session after the transition; absent once submitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wizard: Option<Value>,
    /// Auth token issued by the registration service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

fn render(engine: &WizardFormEngine) -> Result<Value, AppError> {
    serde_json::to_value(engine.view()).map_err(|e| AppError::Internal(e.into()))
}

async fn read_upload(mut multipart: Multipart) -> Result<UploadedFile, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") && field.file_name().is_none() {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await?;
        return Ok(UploadedFile::new(file_name, content_type, bytes));
    }
    Err(AppError::Validation("No file was uploaded".to_string()))
}

// ────────────────────────────────────────────────────────────────────────────
// Session lifecycle
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/wizard
pub async fn handle_create(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let minutes = state.config.session_idle_minutes;
    let max_idle = Duration::try_minutes(minutes)
        .ok_or_else(|| anyhow!("Session idle window of {minutes} minutes is out of range"))?;
    let view = state.sessions.create(max_idle, render).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/v1/wizard/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let view = state.sessions.with_session(id, |e| render(e)).await??;
    Ok(Json(view))
}

/// DELETE /api/v1/wizard/:id
pub async fn handle_discard(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ────────────────────────────────────────────────────────────────────────────
// Field mutation
// ────────────────────────────────────────────────────────────────────────────

/// PATCH /api/v1/wizard/:id/personal
pub async fn handle_set_personal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<PersonalUpdate>,
) -> Result<Json<Value>, AppError> {
    let view = state
        .sessions
        .with_session(id, |e| {
            e.set_personal(req.field, req.value);
            render(e)
        })
        .await??;
    Ok(Json(view))
}

/// PATCH /api/v1/wizard/:id/records
///
/// Appends when `index` equals the section length, edits in place below it.
pub async fn handle_update_record(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<RecordUpdate>,
) -> Result<Json<Value>, AppError> {
    let view = state
        .sessions
        .with_session(id, |e| {
            e.update_record(req)?;
            render(e)
        })
        .await??;
    Ok(Json(view))
}

/// POST /api/v1/wizard/:id/records/:section
pub async fn handle_add_record(
    State(state): State<AppState>,
    Path((id, section)): Path<(Uuid, SectionKind)>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let view = state
        .sessions
        .with_session(id, |e| {
            e.add_record(section);
            render(e)
        })
        .await??;
    Ok((StatusCode::CREATED, Json(view)))
}

/// DELETE /api/v1/wizard/:id/records/:section/:index
pub async fn handle_remove_record(
    State(state): State<AppState>,
    Path((id, section, index)): Path<(Uuid, SectionKind, usize)>,
) -> Result<Json<Value>, AppError> {
    let view = state
        .sessions
        .with_session(id, |e| {
            e.remove_record(section, index)?;
            render(e)
        })
        .await??;
    Ok(Json(view))
}

/// PUT /api/v1/wizard/:id/terms
pub async fn handle_set_terms(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<TermsUpdate>,
) -> Result<Json<Value>, AppError> {
    let view = state
        .sessions
        .with_session(id, |e| {
            e.set_terms(req.agree_to_terms);
            render(e)
        })
        .await??;
    Ok(Json(view))
}

// ────────────────────────────────────────────────────────────────────────────
// Files
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/wizard/:id/files/:slot
///
/// Attaches the uploaded file. A CV is additionally sent for extraction and the
/// result merged; the file stays attached whatever the extraction outcome.
pub async fn handle_upload(
    State(state): State<AppState>,
    Path((id, slot)): Path<(Uuid, FileSlot)>,
    multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let file = read_upload(multipart).await?;

    if slot == FileSlot::ProfileImage {
        let view = state
            .sessions
            .with_session(id, |e| {
                e.attach_file(slot, file);
                render(e)
            })
            .await??;
        return Ok(Json(view));
    }

    state
        .sessions
        .with_session(id, |e| -> Result<(), WizardError> {
            e.begin_extraction()?;
            e.attach_file(FileSlot::Cv, file.clone());
            Ok(())
        })
        .await??;

    info!(
        "Wizard {}: extracting '{}' ({} bytes)",
        id, file.file_name, file.size_bytes
    );

    // Extraction and merge run detached so the pending flag is always settled,
    // even when the client goes away mid-request.
    let sessions = state.sessions.clone();
    let extractor = state.extractor.clone();
    let task = tokio::spawn(async move {
        let result = match ensure_extractable(&file) {
            Ok(_) => extractor.extract(&file).await,
            Err(e) => Err(e),
        };
        sessions
            .with_session(id, |e| {
                e.finish_extraction(result);
                render(e)
            })
            .await
    });

    let view = task.await.map_err(anyhow::Error::from)???;
    Ok(Json(view))
}

/// DELETE /api/v1/wizard/:id/files/:slot
pub async fn handle_detach(
    State(state): State<AppState>,
    Path((id, slot)): Path<(Uuid, FileSlot)>,
) -> Result<Json<Value>, AppError> {
    let view = state
        .sessions
        .with_session(id, |e| {
            e.detach_file(slot);
            render(e)
        })
        .await??;
    Ok(Json(view))
}

/// DELETE /api/v1/wizard/:id/banner
pub async fn handle_dismiss_banner(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let view = state
        .sessions
        .with_session(id, |e| {
            e.dismiss_banner();
            render(e)
        })
        .await??;
    Ok(Json(view))
}

// ────────────────────────────────────────────────────────────────────────────
// Steps and submission
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/wizard/:id/previous
pub async fn handle_previous(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StepResponse>, AppError> {
    let response = state
        .sessions
        .with_session(id, |e| -> Result<StepResponse, AppError> {
            let outcome = match e.previous() {
                Some(_) => StepOutcome::Retreated,
                None => StepOutcome::Unchanged,
            };
            Ok(StepResponse {
                outcome,
                wizard: Some(render(e)?),
                token: None,
            })
        })
        .await??;
    Ok(Json(response))
}

/// POST /api/v1/wizard/:id/next
///
/// Gates on the current step. On the terms step a passing gate submits the
/// registration; a rejected submission keeps every field and the current step.
pub async fn handle_next(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StepResponse>, AppError> {
    let prepared = state
        .sessions
        .with_session(id, |e| -> Result<Result<RegistrationPayload, StepResponse>, AppError> {
            let outcome = match e.next() {
                NextOutcome::Advanced(_) => StepOutcome::Advanced,
                NextOutcome::Blocked { .. } => StepOutcome::Blocked,
                NextOutcome::ReadyToSubmit => match e.prepare_submission() {
                    Ok(payload) => return Ok(Ok(payload)),
                    Err(WizardError::SubmissionBlocked { .. }) => StepOutcome::Blocked,
                    Err(other) => return Err(other.into()),
                },
            };
            Ok(Err(StepResponse {
                outcome,
                wizard: Some(render(e)?),
                token: None,
            }))
        })
        .await??;

    let payload = match prepared {
        Ok(payload) => payload,
        Err(response) => return Ok(Json(response)),
    };

    // Registration runs detached so the session is settled whether or not
    // the caller is still waiting.
    let task = tokio::spawn(submit(
        state.sessions.clone(),
        state.registrar.clone(),
        id,
        payload,
    ));
    let response = task.await.map_err(anyhow::Error::from)??;
    Ok(Json(response))
}

async fn submit(
    sessions: WizardSessions,
    registrar: Arc<dyn Registrar>,
    id: Uuid,
    payload: RegistrationPayload,
) -> Result<StepResponse, AppError> {
    match registrar.register(payload).await {
        Ok(receipt) => {
            if let Err(e) = sessions.remove(id).await {
                warn!("Wizard {}: registered but session already closed: {}", id, e);
            }
            info!("Wizard {}: registration submitted", id);
            Ok(StepResponse {
                outcome: StepOutcome::Submitted,
                wizard: None,
                token: Some(receipt.token),
            })
        }
        Err(err) => {
            let message = err.user_message();
            warn!("Wizard {}: registration failed: {}", id, err);
            sessions
                .with_session(id, |e| e.submission_failed(message.clone()))
                .await?;
            Err(AppError::Upstream(message))
        }
    }
}
