use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder};
use serde_json::Value;
use shared::conversation::{AgentStats, EncodedImage, ModelInfo, Workspace};
use shared::settings::{AppSettings, OcrTransport, DEFAULT_BACKEND_URL};
use std::sync::LazyLock;
use std::time::Duration;
use zeroize::Zeroizing;

use crate::backend::Backend;
use crate::error::BackendError;
use crate::wire::{
    self, AgentGenerateRequest, AgentGenerateResponse, ChatCompletionRequest,
    ChatCompletionResponse, CreateWorkspaceRequest, OcrRequest, SegmentRequest, SegmentResponse,
};

static SHARED_HTTP: LazyLock<Client> = LazyLock::new(|| {
    Client::builder()
        .pool_max_idle_per_host(2)
        .build()
        .unwrap_or_else(|_| Client::new())
});

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// reqwest client for the backend's REST API.
pub struct HttpBackend {
    http: Client,
    base_url: String,
    api_key: Option<Zeroizing<String>>,
    timeout: Duration,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: SHARED_HTTP.clone(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn from_settings(settings: &AppSettings) -> Self {
        let base = if settings.backend_url.trim().is_empty() {
            DEFAULT_BACKEND_URL
        } else {
            settings.backend_url.as_str()
        };
        let mut backend = Self::new(base).with_timeout(Duration::from_secs(
            settings.request_timeout_secs.max(1),
        ));
        if let Some(key) = &settings.api_key {
            backend = backend.with_api_key(key.clone());
        }
        backend
    }

    pub fn with_api_key(mut self, key: String) -> Self {
        self.api_key = Some(Zeroizing::new(key));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.http.request(method, url).timeout(self.timeout);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.as_str());
        }
        builder
    }

    /// Send and read the body leniently. Non-success statuses become
    /// `BackendError::Status` carrying whatever body came back.
    async fn exchange(&self, builder: RequestBuilder, what: &str) -> Result<Value, BackendError> {
        let resp = builder.send().await.map_err(|e| {
            tracing::warn!("{} request failed: {}", what, e);
            BackendError::Transport(e)
        })?;
        let status = resp.status();
        let text = resp.text().await?;
        let body = wire::lenient_json(&text);
        tracing::debug!("{} -> {}", what, status);

        if !status.is_success() {
            tracing::warn!("{} returned {}", what, status);
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    async fn get(&self, path: &str, what: &str) -> Result<Value, BackendError> {
        self.exchange(self.request(Method::GET, path), what).await
    }

    async fn post_json<T: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
        what: &str,
    ) -> Result<Value, BackendError> {
        self.exchange(self.request(Method::POST, path).json(body), what)
            .await
    }

    async fn ocr_json(&self, request: &OcrRequest) -> Result<Value, BackendError> {
        let image = EncodedImage::from_data_url(request.image_data.clone());
        let body = serde_json::json!({
            "image_data": image.base64_payload(),
            "language": request.language,
            "auto_fix": request.auto_fix,
            "invoice": request.invoice,
        });
        self.post_json("/ocr", &body, "ocr").await
    }

    async fn ocr_form(&self, request: &OcrRequest) -> Result<Value, BackendError> {
        let image = EncodedImage::from_data_url(request.image_data.clone());
        let mime = image.mime().to_string();
        let bytes = image
            .decode()
            .map_err(|e| BackendError::Decode(format!("image is not valid base64: {}", e)))?;

        let part = Part::bytes(bytes)
            .file_name(format!("image.{}", extension_for_mime(&mime)))
            .mime_str(&mime)?;
        let form = Form::new()
            .part("image", part)
            .text("language", request.language.clone())
            .text("invoice", request.invoice.to_string());

        self.exchange(
            self.request(Method::POST, "/ocr/form").multipart(form),
            "ocr form",
        )
        .await
    }
}

/// File extension used for the multipart upload name.
pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "image/bmp" => "bmp",
        "image/gif" => "gif",
        _ => "png",
    }
}

#[async_trait::async_trait]
impl Backend for HttpBackend {
    async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, BackendError> {
        let body = self
            .post_json("/v1/chat/completions", request, "chat completion")
            .await?;
        wire::decode(body)
    }

    async fn agent_generate(
        &self,
        request: &AgentGenerateRequest,
    ) -> Result<AgentGenerateResponse, BackendError> {
        let body = self
            .post_json("/v1/agent/generate", request, "agent generate")
            .await?;
        wire::decode_wrapped(body, "data")
    }

    async fn segment(&self, request: &SegmentRequest) -> Result<SegmentResponse, BackendError> {
        let body = self
            .post_json("/v1/segment/base64", request, "segment")
            .await?;
        wire::decode(body)
    }

    async fn ocr(&self, request: &OcrRequest, transport: OcrTransport) -> Result<Value, BackendError> {
        match transport {
            OcrTransport::Form => self.ocr_form(request).await,
            OcrTransport::Json => self.ocr_json(request).await,
        }
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, BackendError> {
        let body = self.get("/v1/models", "list models").await?;
        wire::decode_models(body)
    }

    async fn list_workspaces(&self) -> Result<Vec<Workspace>, BackendError> {
        let body = self.get("/v1/workspaces", "list workspaces").await?;
        wire::decode_workspaces(body)
    }

    async fn create_workspace(
        &self,
        request: &CreateWorkspaceRequest,
    ) -> Result<Workspace, BackendError> {
        let body = self
            .post_json("/v1/workspaces", request, "create workspace")
            .await?;
        wire::decode_wrapped(body, "workspace")
    }

    async fn delete_workspace(&self, workspace_id: &str) -> Result<(), BackendError> {
        let path = format!("/v1/workspaces/{}", workspace_id);
        self.exchange(self.request(Method::DELETE, &path), "delete workspace")
            .await?;
        Ok(())
    }

    async fn agent_tools(&self) -> Result<Vec<String>, BackendError> {
        let body = self.get("/v1/agent/tools", "agent tools").await?;
        wire::decode_list(body, "tools")
    }

    async fn agent_stats(&self) -> Result<AgentStats, BackendError> {
        let body = self.get("/v1/agent/stats", "agent stats").await?;
        wire::decode(body)
    }

    async fn detect_health(&self) -> Result<Value, BackendError> {
        self.get("/v1/detect/health", "detect health").await
    }

    async fn detect_stats(&self) -> Result<Value, BackendError> {
        self.get("/v1/detect/stats", "detect stats").await
    }
}
