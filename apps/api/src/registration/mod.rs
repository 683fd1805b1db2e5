//! Registration client: hands an assembled wizard payload to the account service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::cv_client::parse_error_message;
use crate::wizard::models::UploadedFile;
use crate::wizard::submission::RegistrationPayload;

#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The service refused the registration; the message is shown verbatim.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl RegistrationError {
    /// The text placed in the form-level banner.
    pub fn user_message(&self) -> String {
        match self {
            RegistrationError::Rejected { message, .. } if !message.is_empty() => message.clone(),
            RegistrationError::Rejected { .. } | RegistrationError::Http(_) => {
                "Registration failed. Please try again.".to_string()
            }
        }
    }
}

/// Successful registration: the auth token the client persists.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationReceipt {
    pub token: String,
}

#[async_trait]
pub trait Registrar: Send + Sync {
    async fn register(
        &self,
        payload: RegistrationPayload,
    ) -> Result<RegistrationReceipt, RegistrationError>;
}

fn file_part(file: UploadedFile) -> reqwest::Result<multipart::Part> {
    let mime = match file.mime() {
        m if m.is_empty() => "application/octet-stream".to_string(),
        m => m,
    };
    multipart::Part::bytes(file.bytes.to_vec())
        .file_name(file.file_name)
        .mime_str(&mime)
}

/// Encodes the payload as the multipart form the registration endpoint expects.
pub fn into_form(payload: RegistrationPayload) -> reqwest::Result<multipart::Form> {
    let mut form = multipart::Form::new()
        .text("firstName", payload.first_name)
        .text("lastName", payload.last_name)
        .text("email", payload.email)
        .text("password", payload.password)
        .text("phoneNumber", payload.phone_number)
        .text("role", payload.role)
        .text("address", payload.address)
        .text("education", payload.education)
        .text("experience", payload.experience)
        .text("skills", payload.skills)
        .text("socialLinks", payload.social_links)
        .part("cv", file_part(payload.cv)?);

    if let Some(image) = payload.profile_image {
        form = form.part("profileImage", file_part(image)?);
    }
    Ok(form)
}

#[derive(Clone)]
pub struct HttpRegistrar {
    client: Client,
    endpoint: String,
}

impl HttpRegistrar {
    pub fn new(endpoint: String, timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            endpoint,
        })
    }
}

#[async_trait]
impl Registrar for HttpRegistrar {
    async fn register(
        &self,
        payload: RegistrationPayload,
    ) -> Result<RegistrationReceipt, RegistrationError> {
        let email = payload.email.clone();
        let form = into_form(payload)?;

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Registration for {} rejected with {}", email, status);
            return Err(RegistrationError::Rejected {
                status: status.as_u16(),
                message: parse_error_message(&body),
            });
        }

        let receipt = response.json::<RegistrationReceipt>().await?;
        info!("Registration for {} accepted", email);
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_message_is_verbatim() {
        let err = RegistrationError::Rejected {
            status: 409,
            message: "Email already exists".to_string(),
        };
        assert_eq!(err.user_message(), "Email already exists");
    }

    #[test]
    fn test_empty_rejection_falls_back_to_generic_message() {
        let err = RegistrationError::Rejected {
            status: 500,
            message: String::new(),
        };
        assert_eq!(err.user_message(), "Registration failed. Please try again.");
    }

    #[test]
    fn test_receipt_parses_token() {
        let receipt: RegistrationReceipt =
            serde_json::from_str(r#"{"token":"abc.def","user":{"id":1}}"#).unwrap();
        assert_eq!(receipt.token, "abc.def");
    }
}
