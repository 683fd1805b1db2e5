//! CV-extraction client: the single point of entry for calls to the CV parsing service.
//!
//! The wizard only ever talks to the service through the `CvExtractor` trait,
//! so handlers and tests can swap in an in-process implementation.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client, StatusCode};
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tracing::{debug, warn};

use crate::wizard::models::UploadedFile;
use crate::wizard::validation::MAX_UPLOAD_BYTES;

/// Best-effort structured fields parsed from a CV. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExtractedProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub education: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub work_experience: Vec<String>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("File type '{0}' cannot be analysed")]
    UnsupportedType(String),

    #[error("File of {0} bytes exceeds the extraction limit")]
    TooLarge(usize),

    #[error("Extraction service error (status {status}): {message}")]
    Service { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ExtractionError {
    /// The hint shown in the wizard banner.
    pub fn user_message(&self) -> String {
        match self {
            ExtractionError::UnsupportedType(_) => {
                "This file type cannot be analysed. Upload a PDF, DOCX, TXT, CSV, HTML, XML or RTF file to autofill your profile.".to_string()
            }
            ExtractionError::TooLarge(_) => {
                "The file is too large to analyse. The maximum size is 5MB.".to_string()
            }
            ExtractionError::Service { status, .. } if *status == 413 => {
                "The file is too large to analyse. The maximum size is 5MB.".to_string()
            }
            ExtractionError::Service { message, .. } if message.contains("Failed to load PDF") => {
                "We could not read this PDF. Make sure it is not password-protected or damaged.".to_string()
            }
            ExtractionError::Service { message, .. } if message.contains("Failed to load DOCX") => {
                "We could not read this DOCX file. Try saving it again or upload a PDF instead.".to_string()
            }
            ExtractionError::Service { .. } | ExtractionError::Http(_) => {
                "We could not extract information from your CV. You can still fill in the form manually.".to_string()
            }
        }
    }
}

/// Document formats the extraction service accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    Txt,
    Csv,
    Html,
    Xml,
    Rtf,
}

impl DocumentKind {
    /// Detects the format from the declared MIME type, falling back to the extension.
    pub fn detect(file: &UploadedFile) -> Option<DocumentKind> {
        let by_mime = match file.mime().as_str() {
            "application/pdf" => Some(DocumentKind::Pdf),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(DocumentKind::Docx)
            }
            "text/plain" => Some(DocumentKind::Txt),
            "text/csv" => Some(DocumentKind::Csv),
            "text/html" => Some(DocumentKind::Html),
            "application/xml" | "text/xml" => Some(DocumentKind::Xml),
            "application/rtf" | "text/rtf" => Some(DocumentKind::Rtf),
            _ => None,
        };
        by_mime.or_else(|| match file.extension()?.as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "docx" => Some(DocumentKind::Docx),
            "txt" => Some(DocumentKind::Txt),
            "csv" => Some(DocumentKind::Csv),
            "html" | "htm" => Some(DocumentKind::Html),
            "xml" => Some(DocumentKind::Xml),
            "rtf" => Some(DocumentKind::Rtf),
            _ => None,
        })
    }
}

/// Checks the locally knowable preconditions before a file is sent out.
pub fn ensure_extractable(file: &UploadedFile) -> Result<DocumentKind, ExtractionError> {
    let kind = DocumentKind::detect(file)
        .ok_or_else(|| ExtractionError::UnsupportedType(file.content_type.clone()))?;
    if file.size_bytes > MAX_UPLOAD_BYTES {
        return Err(ExtractionError::TooLarge(file.size_bytes));
    }
    Ok(kind)
}

#[async_trait]
pub trait CvExtractor: Send + Sync {
    async fn extract(&self, file: &UploadedFile) -> Result<ExtractedProfile, ExtractionError>;
}

#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    #[serde(alias = "error", alias = "detail")]
    message: String,
}

/// Calls the CV-extraction service over HTTP (multipart part `file`).
#[derive(Clone)]
pub struct HttpCvExtractor {
    client: Client,
    endpoint: String,
}

impl HttpCvExtractor {
    pub fn new(endpoint: String, timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            endpoint,
        })
    }
}

#[async_trait]
impl CvExtractor for HttpCvExtractor {
    async fn extract(&self, file: &UploadedFile) -> Result<ExtractedProfile, ExtractionError> {
        let kind = ensure_extractable(file)?;
        debug!(
            "Sending {:?} '{}' ({} bytes) for extraction",
            kind, file.file_name, file.size_bytes
        );

        let mime = match file.mime() {
            m if m.is_empty() => "application/octet-stream".to_string(),
            m => m,
        };
        let part = multipart::Part::bytes(file.bytes.to_vec())
            .file_name(file.file_name.clone())
            .mime_str(&mime)?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Extraction service returned {}: {}", status, body);
            let message = if status == StatusCode::PAYLOAD_TOO_LARGE {
                "file too large".to_string()
            } else {
                parse_error_message(&body)
            };
            return Err(ExtractionError::Service {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<ExtractedProfile>().await?)
    }
}

/// Pulls `message`/`error`/`detail` out of a JSON error body, or returns the raw text.
pub(crate) fn parse_error_message(body: &str) -> String {
    serde_json::from_str::<ServiceErrorBody>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| body.trim().to_string())
}
