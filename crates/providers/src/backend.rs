use serde_json::Value;
use shared::conversation::{AgentStats, ModelInfo, Workspace};
use shared::settings::OcrTransport;

use crate::error::BackendError;
use crate::wire::{
    AgentGenerateRequest, AgentGenerateResponse, ChatCompletionRequest, ChatCompletionResponse,
    CreateWorkspaceRequest, OcrRequest, SegmentRequest, SegmentResponse,
};

/// The external service behind the chat window.
///
/// Every call is a single request/response exchange. Implementations must
/// not retry; the caller decides what a failure means for the conversation.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, BackendError>;

    async fn agent_generate(
        &self,
        request: &AgentGenerateRequest,
    ) -> Result<AgentGenerateResponse, BackendError>;

    async fn segment(&self, request: &SegmentRequest) -> Result<SegmentResponse, BackendError>;

    /// OCR results come back in too many shapes to type; callers classify the raw JSON.
    async fn ocr(&self, request: &OcrRequest, transport: OcrTransport) -> Result<Value, BackendError>;

    async fn list_models(&self) -> Result<Vec<ModelInfo>, BackendError>;

    async fn list_workspaces(&self) -> Result<Vec<Workspace>, BackendError>;

    async fn create_workspace(
        &self,
        request: &CreateWorkspaceRequest,
    ) -> Result<Workspace, BackendError>;

    async fn delete_workspace(&self, workspace_id: &str) -> Result<(), BackendError>;

    async fn agent_tools(&self) -> Result<Vec<String>, BackendError>;

    async fn agent_stats(&self) -> Result<AgentStats, BackendError>;

    async fn detect_health(&self) -> Result<Value, BackendError>;

    async fn detect_stats(&self) -> Result<Value, BackendError>;
}
