use common::{
    error::AppError,
    types::generation::{GenerationRequest, PollResponse, SubmitReceipt},
    utils::config::AppConfig,
};
use serde_json::json;

/// Client for the hosted image-generation API.
///
/// One outbound call per operation, no retry at this layer: any transport
/// error or non-2xx response surfaces as a single failure to the caller.
#[derive(Clone)]
pub struct GenerationApiClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    model: String,
}

impl GenerationApiClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config
                .generation_api_base_url
                .trim_end_matches('/')
                .to_string(),
            token: config.generation_api_token.clone(),
            model: config.generation_model.clone(),
        }
    }

    /// Submit a generation request, returning the upstream job identifier
    /// and initial status. Input is validated before any network call.
    pub async fn submit(&self, request: &GenerationRequest) -> Result<SubmitReceipt, AppError> {
        request.validate()?;

        let body = json!({
            "model": self.model,
            "input": {
                "prompt": request.prompt,
                "image_input": request.image_inputs,
                "output_format": "jpg",
            }
        });

        let response = self
            .http
            .post(format!("{}/predictions", self.base_url))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Submission(format!("generation API unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = upstream_detail(response).await;
            return Err(AppError::Submission(format!(
                "generation API returned {status}: {detail}"
            )));
        }

        let receipt: SubmitReceipt = response
            .json()
            .await
            .map_err(|e| AppError::Submission(format!("malformed submission response: {e}")))?;

        if receipt.id.trim().is_empty() {
            return Err(AppError::Submission(
                "generation API returned an empty job identifier".to_string(),
            ));
        }

        tracing::info!(
            prediction_id = %receipt.id,
            status = receipt.status.as_str(),
            "generation submitted"
        );
        Ok(receipt)
    }

    /// Fetch the current status of a prediction.
    pub async fn get_status(&self, prediction_id: &str) -> Result<PollResponse, AppError> {
        let response = self
            .http
            .get(format!("{}/predictions/{prediction_id}", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| AppError::Poll(format!("generation API unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = upstream_detail(response).await;
            return Err(AppError::Poll(format!(
                "status check failed ({status}): {detail}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Poll(format!("malformed status response: {e}")))
    }
}

/// Best-effort extraction of the upstream error message from a failed
/// response body.
async fn upstream_detail(response: reqwest::Response) -> String {
    const DETAIL_LIMIT: usize = 300;

    let Ok(body) = response.text().await else {
        return "no response body".to_string();
    };

    let detail = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|value| {
            ["detail", "error", "title"].iter().copied().find_map(|key| {
                value
                    .get(key)
                    .and_then(|v| v.as_str())
                    .map(ToString::to_string)
            })
        })
        .unwrap_or(body);

    let trimmed = detail.trim();
    if trimmed.is_empty() {
        return "no response body".to_string();
    }
    trimmed.chars().take(DETAIL_LIMIT).collect()
}
