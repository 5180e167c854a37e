use base64::Engine;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::AppError;

/// A generation request: prompt text plus the reference images forwarded to
/// the external model. Immutable once submission begins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub image_inputs: Vec<String>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, image_inputs: Vec<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image_inputs,
        }
    }

    /// Client-side validation, performed before any network call.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.prompt.trim().is_empty() {
            return Err(AppError::Validation("prompt is required".to_string()));
        }
        if self.image_inputs.is_empty() {
            return Err(AppError::Validation(
                "at least one reference image is required".to_string(),
            ));
        }
        for (index, input) in self.image_inputs.iter().enumerate() {
            validate_image_input(input).map_err(|reason| {
                AppError::Validation(format!("reference image {index}: {reason}"))
            })?;
        }
        Ok(())
    }
}

/// A reference image is either an image data URL with a decodable base64
/// payload, or an http(s) URL the generation API can fetch itself.
fn validate_image_input(input: &str) -> Result<(), String> {
    if input.trim().is_empty() {
        return Err("must not be empty".to_string());
    }

    if let Some(rest) = input.strip_prefix("data:") {
        if !rest.starts_with("image/") {
            return Err("data URL must carry an image media type".to_string());
        }
        let Some((_, payload)) = rest.split_once(";base64,") else {
            return Err("data URL must be base64-encoded".to_string());
        };
        if payload.is_empty() {
            return Err("data URL payload is empty".to_string());
        }
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| format!("data URL payload is not valid base64: {e}"))?;
        return Ok(());
    }

    match Url::parse(input) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        Ok(url) => Err(format!("unsupported URL scheme {}", url.scheme())),
        Err(e) => Err(format!("not a data URL or an absolute URL: {e}")),
    }
}

/// Status strings reported by the external generation API.
///
/// Only the values below are recognized; anything else is carried through as
/// `Other` and treated as non-terminal, so an unknown status keeps the poll
/// loop alive instead of wedging or failing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GenerationStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    Other(String),
}

impl GenerationStatus {
    pub fn as_str(&self) -> &str {
        match self {
            GenerationStatus::Starting => "starting",
            GenerationStatus::Processing => "processing",
            GenerationStatus::Succeeded => "succeeded",
            GenerationStatus::Failed => "failed",
            GenerationStatus::Canceled => "canceled",
            GenerationStatus::Other(s) => s,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GenerationStatus::Succeeded | GenerationStatus::Failed | GenerationStatus::Canceled
        )
    }
}

impl From<String> for GenerationStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "starting" | "submitting" => GenerationStatus::Starting,
            "processing" => GenerationStatus::Processing,
            "succeeded" => GenerationStatus::Succeeded,
            "failed" => GenerationStatus::Failed,
            "canceled" => GenerationStatus::Canceled,
            _ => GenerationStatus::Other(value),
        }
    }
}

impl From<GenerationStatus> for String {
    fn from(value: GenerationStatus) -> Self {
        value.as_str().to_string()
    }
}

/// Returned by the generation API when a submission is accepted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub id: String,
    pub status: GenerationStatus,
}

/// The upstream `output` field arrives either as a single URL or an array.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum PredictionOutput {
    Many(Vec<String>),
    One(String),
}

impl PredictionOutput {
    /// First non-empty output URL, if any.
    pub fn first_url(&self) -> Option<&str> {
        match self {
            PredictionOutput::One(url) if !url.trim().is_empty() => Some(url),
            PredictionOutput::One(_) => None,
            PredictionOutput::Many(urls) => urls
                .iter()
                .map(String::as_str)
                .find(|url| !url.trim().is_empty()),
        }
    }
}

/// One poll's view of a prediction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PollResponse {
    pub status: GenerationStatus,
    #[serde(default)]
    pub output: Option<PredictionOutput>,
    #[serde(default)]
    pub error: Option<String>,
}

/// A durably stored generation result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersistedArtifact {
    pub image_id: String,
    pub storage_path: String,
    pub public_url: String,
    pub download_url: String,
}
