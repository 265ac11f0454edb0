//! Inference provider client
//!
//! `ProviderClient` is the seam between the orchestrator and the external
//! image API. `WavespeedClient` is the production implementation; tests
//! substitute scripted fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::config::ProviderConfig;

/// Failure taxonomy shared by creation calls and status probes
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Network failure, timeout, or unreadable body
    #[error("provider transport error: {0}")]
    Transport(String),

    /// Provider answered with a non-success HTTP status
    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body did not match the expected schema
    #[error("provider response could not be decoded: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Transport(err.to_string())
    }
}

/// Prediction payload inside the provider envelope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionData {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub outputs: Option<Vec<String>>,
}

/// Provider response envelope: `{code, message, data: {id, status, outputs}}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionEnvelope {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<PredictionData>,
}

impl PredictionEnvelope {
    /// Output references, empty when absent.
    pub fn outputs(&self) -> &[String] {
        self.data
            .as_ref()
            .and_then(|d| d.outputs.as_deref())
            .unwrap_or(&[])
    }

    /// Task handle, if present and non-empty.
    pub fn task_id(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|d| d.id.as_deref())
            .filter(|id| !id.is_empty())
    }

    pub fn status(&self) -> Option<&str> {
        self.data.as_ref().and_then(|d| d.status.as_deref())
    }

    /// Decode an envelope from a raw response body.
    pub fn parse(body: &str) -> Result<Self, ProviderError> {
        serde_json::from_str(body).map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

/// Raw response of a creation call
pub type RawCreateResponse = PredictionEnvelope;
/// Raw response of a status probe
pub type RawStatusResponse = PredictionEnvelope;

/// Calls to the external inference API. Implementations hold no
/// per-generation state.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Submit a prompt with the fixed generation parameters.
    async fn create(&self, prompt: &str) -> Result<RawCreateResponse, ProviderError>;

    /// Probe a task handle once.
    async fn check_status(&self, task_id: &str) -> Result<RawStatusResponse, ProviderError>;
}

/// reqwest-backed client for the WaveSpeed prediction API
pub struct WavespeedClient {
    config: ProviderConfig,
    http_client: reqwest::Client,
}

impl WavespeedClient {
    /// Create a new client
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("imagegen/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout)
            .build()?;

        Ok(WavespeedClient {
            config,
            http_client,
        })
    }

    /// Read the body, mapping non-2xx statuses and undecodable payloads.
    async fn read_envelope(
        response: reqwest::Response,
    ) -> Result<PredictionEnvelope, ProviderError> {
        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), body = %body, "provider response");

        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }
        PredictionEnvelope::parse(&body)
    }
}

#[async_trait]
impl ProviderClient for WavespeedClient {
    async fn create(&self, prompt: &str) -> Result<RawCreateResponse, ProviderError> {
        let params = &self.config.params;
        let body = json!({
            "prompt": prompt,
            "size": params.size,
            "num_inference_steps": params.num_inference_steps,
            "guidance_scale": params.guidance_scale,
            "enable_safety_checker": params.enable_safety_checker,
        });

        let response = self
            .http_client
            .post(&self.config.create_url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        Self::read_envelope(response).await
    }

    async fn check_status(&self, task_id: &str) -> Result<RawStatusResponse, ProviderError> {
        let url = self
            .config
            .status_url_for(task_id)
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        let response = self
            .http_client
            .get(url)
            .bearer_auth(&self.config.api_key)
            .send()
            .await?;

        Self::read_envelope(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> WavespeedClient {
        WavespeedClient::new(ProviderConfig::new("mock_api_key").with_base_url(&server.uri()))
            .expect("client builds")
    }

    #[tokio::test]
    async fn create_sends_fixed_parameters_with_bearer_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/create"))
            .and(header("authorization", "Bearer mock_api_key"))
            .and(body_json(json!({
                "prompt": "a red fox",
                "size": "1024*1024",
                "num_inference_steps": 28,
                "guidance_scale": 3.5,
                "enable_safety_checker": true,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 200,
                "message": "success",
                "data": { "id": "task-1", "status": "created" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let resp = client_for(&server).create("a red fox").await.unwrap();
        assert_eq!(resp.task_id(), Some("task-1"));
        assert!(resp.outputs().is_empty());
    }

    #[tokio::test]
    async fn non_success_status_carries_code_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/create"))
            .respond_with(ResponseTemplate::new(402).set_body_string("insufficient credits"))
            .mount(&server)
            .await;

        let err = client_for(&server).create("p").await.unwrap_err();
        assert_eq!(
            err,
            ProviderError::Status {
                status: 402,
                body: "insufficient credits".to_string()
            }
        );
    }

    #[tokio::test]
    async fn non_json_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/create"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).create("p").await.unwrap_err();
        assert!(matches!(err, ProviderError::Decode(_)));
    }

    #[tokio::test]
    async fn check_status_uses_task_id_as_path_parameter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/predictions/task-9/result"))
            .and(header("authorization", "Bearer mock_api_key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 200,
                "data": { "id": "task-9", "status": "completed", "outputs": ["http://x/9.png"] }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let resp = client_for(&server).check_status("task-9").await.unwrap();
        assert_eq!(resp.status(), Some("completed"));
        assert_eq!(resp.outputs(), ["http://x/9.png".to_string()]);
    }

    #[tokio::test]
    async fn check_status_keeps_task_id_in_one_path_segment() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/predictions/a%2Fb%3Fx/result"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "status": "processing" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let resp = client_for(&server).check_status("a/b?x").await.unwrap();
        assert_eq!(resp.status(), Some("processing"));
    }

    #[tokio::test]
    async fn unreachable_provider_is_a_transport_error() {
        let config = ProviderConfig::new("k").with_base_url("http://127.0.0.1:1");
        let err = WavespeedClient::new(config)
            .unwrap()
            .check_status("t")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Transport(_)));
    }

    #[test]
    fn envelope_tolerates_null_and_missing_fields() {
        let env = PredictionEnvelope::parse(r#"{"data":{"id":"","outputs":null}}"#).unwrap();
        assert!(env.outputs().is_empty());
        assert_eq!(env.task_id(), None);
        assert_eq!(PredictionEnvelope::parse("{}").unwrap(), PredictionEnvelope::default());
    }
}
