use std::{env, error, fmt, sync::Arc};

use model::risk::{
    ChatPrompt, ChatReply, LocationQuery, LocationReport, PredictionReport,
    PredictionRequest,
};

pub const RISK_API_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone)]
pub enum ApiError {
    RequestError(Arc<reqwest::Error>),
    InvalidResponse {
        status_code: reqwest::StatusCode,
        url: String,
        response: Option<String>,
    },
}

impl error::Error for ApiError {}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ApiError::RequestError(why) => {
                write!(f, "HTTP request error: {}", why)
            }
            ApiError::InvalidResponse {
                status_code,
                url,
                response,
            } => match response {
                Some(text) => write!(
                    f,
                    "'{}' answered with status code {}: {}",
                    url, status_code, text
                ),
                None => {
                    write!(f, "'{}' answered with status code {}", url, status_code)
                }
            },
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(why: reqwest::Error) -> Self {
        ApiError::RequestError(Arc::new(why))
    }
}

/// Stateless relay to the remote risk-prediction and chat service. No local
/// interpretation happens here; responses are passed through as received.
#[derive(Debug, Clone)]
pub struct RiskApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl RiskApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Base URL from `RISK_API_URL`, defaulting to a local instance.
    pub fn from_env() -> Self {
        let base_url =
            env::var("RISK_API_URL").unwrap_or_else(|_| RISK_API_URL.to_owned());
        Self::new(base_url)
    }

    pub async fn predict(
        &self,
        request: &PredictionRequest,
    ) -> Result<PredictionReport, ApiError> {
        self.post_json("/predict", request).await
    }

    pub async fn chat(&self, prompt: &str) -> Result<ChatReply, ApiError> {
        self.post_json(
            "/gemini-chat",
            &ChatPrompt {
                prompt: prompt.to_owned(),
            },
        )
        .await
    }

    /// Location-specific landslide background information for a region.
    pub async fn location_info(
        &self,
        location: &str,
    ) -> Result<LocationReport, ApiError> {
        self.post_json(
            "/generate-response",
            &LocationQuery {
                location: location.to_owned(),
            },
        )
        .await
    }

    async fn post_json<I, O>(&self, path: &str, body: &I) -> Result<O, ApiError>
    where
        I: serde::Serialize,
        O: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self.http.post(&url).json(body).send().await?;
        let status_code = response.status();
        if !status_code.is_success() {
            return Err(ApiError::InvalidResponse {
                status_code,
                url,
                response: response.text().await.ok(),
            });
        }
        Ok(response.json().await?)
    }
}
