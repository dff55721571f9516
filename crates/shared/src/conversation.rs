//! Conversation data model shared by the dispatcher, the session and the UI.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::agent_api::ChatMessage as ApiChatMessage;

pub const GREETING: &str = "Hello! I'm your AI Agent. Select a workspace and tools to get started!";
pub const CLEARED_GREETING: &str = "Chat cleared! How can I help you?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// An image held as a `data:<mime>;base64,<payload>` URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedImage(String);

impl EncodedImage {
    pub fn from_bytes(mime: &str, bytes: &[u8]) -> Self {
        Self(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
    }

    /// Wrap a bare base64 payload returned by the backend.
    pub fn from_base64(mime: &str, payload: &str) -> Self {
        Self(format!("data:{};base64,{}", mime, payload))
    }

    /// Accepts either a data URL or a bare payload (treated as PNG).
    pub fn from_data_url(url: impl Into<String>) -> Self {
        let url = url.into();
        if url.starts_with("data:") {
            Self(url)
        } else {
            Self::from_base64("image/png", &url)
        }
    }

    pub fn data_url(&self) -> &str {
        &self.0
    }

    /// The part after the first comma.
    pub fn base64_payload(&self) -> &str {
        match self.0.split_once(',') {
            Some((_, payload)) => payload,
            None => &self.0,
        }
    }

    pub fn mime(&self) -> &str {
        self.0
            .strip_prefix("data:")
            .and_then(|rest| rest.split(';').next())
            .filter(|m| !m.is_empty())
            .unwrap_or("image/png")
    }

    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(self.base64_payload())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Attached (user) or annotated (assistant) image for display
    pub image: Option<EncodedImage>,
    pub timestamp: String,
}

impl Message {
    pub fn user(content: impl Into<String>, image: Option<EncodedImage>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            image,
            timestamp: now_stamp(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            image: None,
            timestamp: now_stamp(),
        }
    }

    pub fn with_image(mut self, image: Option<EncodedImage>) -> Self {
        self.image = image;
        self
    }

    pub fn to_api(&self) -> ApiChatMessage {
        ApiChatMessage {
            role: self.role.as_str().to_string(),
            content: self.content.clone(),
        }
    }
}

fn now_stamp() -> String {
    chrono::Local::now().format("%H:%M").to_string()
}

/// Conversation mode - selects the backend endpoint family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Chat,
    Agent,
    Detect,
    Ocr,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Chat, Mode::Agent, Mode::Detect, Mode::Ocr];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Chat => "chat",
            Mode::Agent => "agent",
            Mode::Detect => "detect",
            Mode::Ocr => "ocr",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Mode::Chat => "Chat",
            Mode::Agent => "Agent",
            Mode::Detect => "Detect",
            Mode::Ocr => "OCR",
        }
    }

    /// Image modes cannot run without a staged image.
    pub fn requires_image(&self) -> bool {
        matches!(self, Mode::Detect | Mode::Ocr)
    }

    pub fn placeholder(&self) -> &'static str {
        match self {
            Mode::Chat => "Type a message...",
            Mode::Agent => "Ask the agent...",
            Mode::Detect => "Objects to find, comma separated (optional)",
            Mode::Ocr => "Attach an image to extract its text",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default = "default_workspace_type")]
    pub workspace_type: String,
}

fn default_workspace_type() -> String {
    "personal".to_string()
}

/// Agent-mode memory entry, echoed back to the backend on every turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    #[serde(rename = "type")]
    pub kind: String,
    pub content: Option<String>,
    pub name: Option<String>,
    pub arguments: Option<String>,
}

impl HistoryItem {
    pub fn user(content: impl Into<String>) -> Self {
        Self::message("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::message("assistant", content)
    }

    fn message(kind: &str, content: impl Into<String>) -> Self {
        Self {
            kind: kind.to_string(),
            content: Some(content.into()),
            name: None,
            arguments: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolSpec {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

/// Tools the agent can be given
pub const TOOL_CATALOG: [ToolSpec; 3] = [
    ToolSpec {
        id: "web_search",
        name: "Web Search",
        description: "Search the web",
    },
    ToolSpec {
        id: "code_interpreter",
        name: "Code Interpreter",
        description: "Execute code",
    },
    ToolSpec {
        id: "file_browser",
        name: "File Browser",
        description: "Browse files",
    },
];

pub fn tool_spec(id: &str) -> Option<&'static ToolSpec> {
    TOOL_CATALOG.iter().find(|t| t.id == id)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    pub input: f64,
    pub output: f64,
    pub currency: String,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub pricing: Option<Pricing>,
    #[serde(default)]
    pub context_size: Option<u64>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

impl ModelInfo {
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentCounters {
    #[serde(default)]
    pub active_streams: u64,
    #[serde(default)]
    pub failed_requests: u64,
    #[serde(default)]
    pub success_rate: f64,
    #[serde(default)]
    pub successful_requests: u64,
    #[serde(default)]
    pub total_requests: u64,
    #[serde(default)]
    pub total_tokens_processed: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentStats {
    #[serde(default)]
    pub healthy: bool,
    #[serde(default)]
    pub stats: AgentCounters,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoded_image_parts() {
        let img = EncodedImage::from_bytes("image/jpeg", b"abc");
        assert_eq!(img.data_url(), "data:image/jpeg;base64,YWJj");
        assert_eq!(img.mime(), "image/jpeg");
        assert_eq!(img.base64_payload(), "YWJj");
        assert_eq!(img.decode().unwrap(), b"abc");
    }

    #[test]
    fn test_bare_payload_is_png() {
        let img = EncodedImage::from_data_url("YWJj");
        assert_eq!(img.mime(), "image/png");
        assert_eq!(img.data_url(), "data:image/png;base64,YWJj");
    }

    #[test]
    fn test_history_item_wire_shape() {
        let value = serde_json::to_value(HistoryItem::user("hi")).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"type": "user", "content": "hi", "name": null, "arguments": null})
        );
    }

    #[test]
    fn test_model_info_camel_case() {
        let model: ModelInfo = serde_json::from_value(serde_json::json!({
            "id": "m1",
            "name": "Model One",
            "contextSize": 8192,
            "lastUpdated": "2025-01-01"
        }))
        .unwrap();
        assert_eq!(model.context_size, Some(8192));
        assert_eq!(model.display_name(), "Model One");
    }

    #[test]
    fn test_workspace_defaults() {
        let ws: Workspace = serde_json::from_value(serde_json::json!({"id": "w", "name": "W"})).unwrap();
        assert_eq!(ws.workspace_type, "personal");
        assert!(!ws.is_active);
    }

    #[test]
    fn test_mode_image_requirement() {
        assert!(Mode::Detect.requires_image());
        assert!(Mode::Ocr.requires_image());
        assert!(!Mode::Chat.requires_image());
        assert!(!Mode::Agent.requires_image());
    }
}
