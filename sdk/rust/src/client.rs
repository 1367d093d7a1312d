use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// One entry in the `issues` array of a validation failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    #[serde(default)]
    pub path: Vec<String>,
    pub message: String,
}

/// Error body returned by the gateway on any failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issues: Option<Vec<Issue>>,
}

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("gateway returned {status}: {} ({})", body.message, body.code)]
    Gateway { status: StatusCode, body: ErrorBody },
    #[error("unexpected response with status {status}: {text}")]
    Malformed { status: StatusCode, text: String },
}

pub struct GatewayClient {
    client: Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Use a preconfigured reqwest client (custom timeouts, proxy rules).
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Call a query procedure. Input fields go in the query string.
    pub async fn query(&self, path: &str, params: &[(&str, &str)]) -> Result<Value, SdkError> {
        let resp = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .query(params)
            .send()
            .await?;
        Self::decode(resp).await
    }

    /// Call a mutation procedure. Input fields go in the JSON body.
    pub async fn mutate(&self, path: &str, body: &Value) -> Result<Value, SdkError> {
        let resp = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn decode(resp: reqwest::Response) -> Result<Value, SdkError> {
        let status = resp.status();
        let text = resp.text().await?;

        if status.is_success() {
            return serde_json::from_str(&text).map_err(|_| SdkError::Malformed { status, text });
        }

        match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => Err(SdkError::Gateway { status, body }),
            Err(_) => Err(SdkError::Malformed { status, text }),
        }
    }
}
