//! Request and response bodies exchanged with the backend.
//!
//! Responses are decoded leniently: every field the UI does not strictly
//! need has a default, and list endpoints accept both a bare array and an
//! object wrapping it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::agent_api::ChatMessage;
use shared::conversation::{HistoryItem, ModelInfo, Workspace};

use crate::error::BackendError;

// ── Chat ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub model: String,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// Content of the first choice, if any and non-empty.
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .filter(|c| !c.is_empty())
    }
}

// ── Agent ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct AgentGenerateRequest {
    pub input: String,
    pub model: String,
    pub workspace_id: String,
    pub tools: Vec<String>,
    pub history: Vec<HistoryItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentGenerateResponse {
    #[serde(default)]
    pub output: Option<String>,
}

// ── Detection ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct SegmentRequest {
    /// Bare base64 payload, no data URL prefix
    pub image: String,
    pub prompts: Vec<String>,
    pub return_annotated: bool,
    pub return_masks: bool,
    pub threshold: f32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Detection {
    /// Missing for some detectors; such entries are left out of summaries
    #[serde(default, alias = "label")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SegmentResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<Detection>,
    /// Base64 PNG with the detections drawn on it
    #[serde(default)]
    pub annotated_image: Option<String>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub detail: Option<Value>,
}

impl SegmentResponse {
    /// In-body error report (some failures come back with a 200).
    pub fn reported_error(&self) -> Option<String> {
        let text = |v: &Value| match v {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        };
        self.error.as_ref().and_then(text)?;
        self.detail
            .as_ref()
            .and_then(text)
            .or_else(|| self.error.as_ref().and_then(text))
    }
}

// ── OCR ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct OcrRequest {
    /// Full data URL; the transport strips or decodes it as needed
    pub image_data: String,
    pub language: String,
    pub auto_fix: bool,
    pub invoice: bool,
}

impl OcrRequest {
    pub fn new(image_data: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            image_data: image_data.into(),
            language: language.into(),
            auto_fix: true,
            invoice: false,
        }
    }
}

// ── Workspaces ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct CreateWorkspaceRequest {
    pub name: String,
    pub description: Option<String>,
    pub workspace_type: String,
    pub settings: Value,
}

impl CreateWorkspaceRequest {
    pub fn personal(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            workspace_type: "personal".to_string(),
            settings: Value::Object(Default::default()),
        }
    }
}

// ── Lenient decoding helpers ─────────────────────────────────────────

/// `null` decodes like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parse a response body as JSON, wrapping non-JSON text as `{"error": text}`.
pub fn lenient_json(text: &str) -> Value {
    match serde_json::from_str::<Value>(text) {
        Ok(v) => v,
        Err(_) => {
            let msg = if text.trim().is_empty() {
                "Unknown error"
            } else {
                text
            };
            serde_json::json!({ "error": msg })
        }
    }
}

pub(crate) fn decode<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, BackendError> {
    serde_json::from_value(value).map_err(|e| BackendError::Decode(e.to_string()))
}

/// Decode a list that may be bare or wrapped as `{key: [...]}` (optionally under `data`).
pub(crate) fn decode_list<T: serde::de::DeserializeOwned>(
    value: Value,
    key: &str,
) -> Result<Vec<T>, BackendError> {
    let list = match value {
        Value::Array(items) => Value::Array(items),
        Value::Object(mut map) => match map.remove(key) {
            Some(inner) => inner,
            None => match map.remove("data") {
                Some(data) => return decode_list(data, key),
                None => return Ok(Vec::new()),
            },
        },
        _ => return Ok(Vec::new()),
    };
    decode(list)
}

/// Decode an object that may be bare or wrapped as `{key: {...}}`.
pub(crate) fn decode_wrapped<T: serde::de::DeserializeOwned>(
    value: Value,
    key: &str,
) -> Result<T, BackendError> {
    match value {
        Value::Object(mut map) => match map.remove(key) {
            Some(inner) => decode(inner),
            None => decode(Value::Object(map)),
        },
        other => decode(other),
    }
}

pub(crate) fn decode_models(value: Value) -> Result<Vec<ModelInfo>, BackendError> {
    decode_list(value, "models")
}

pub(crate) fn decode_workspaces(value: Value) -> Result<Vec<Workspace>, BackendError> {
    decode_list(value, "workspaces")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lenient_json_wraps_text() {
        assert_eq!(lenient_json("Bad Gateway"), json!({"error": "Bad Gateway"}));
        assert_eq!(lenient_json(""), json!({"error": "Unknown error"}));
        assert_eq!(lenient_json(r#"{"ok":true}"#), json!({"ok": true}));
    }

    #[test]
    fn test_decode_list_shapes() {
        let bare: Vec<Workspace> = decode_workspaces(json!([{"id": "a", "name": "A"}])).unwrap();
        assert_eq!(bare.len(), 1);

        let wrapped = decode_workspaces(json!({"workspaces": [{"id": "a", "name": "A"}, {"id": "b", "name": "B"}]})).unwrap();
        assert_eq!(wrapped[1].id, "b");

        let nested = decode_workspaces(json!({"data": {"workspaces": [{"id": "c", "name": "C"}]}})).unwrap();
        assert_eq!(nested[0].id, "c");

        assert!(decode_workspaces(json!({"count": 0})).unwrap().is_empty());
    }

    #[test]
    fn test_segment_reported_error() {
        let resp: SegmentResponse =
            decode(json!({"error": "Invalid file type", "detail": "Supported: jpeg, png"})).unwrap();
        assert_eq!(resp.reported_error().as_deref(), Some("Supported: jpeg, png"));

        let ok: SegmentResponse = decode(json!({"results": [{"name": "cat", "confidence": 0.9}]})).unwrap();
        assert!(ok.reported_error().is_none());
        assert_eq!(ok.results[0].name.as_deref(), Some("cat"));
    }

    #[test]
    fn test_segment_tolerates_null_and_nameless_results() {
        let null: SegmentResponse = decode(json!({"results": null})).unwrap();
        assert!(null.results.is_empty());

        let labelled: SegmentResponse =
            decode(json!({"results": [{"label": "cat"}, {"score": 0.4}]})).unwrap();
        assert_eq!(labelled.results.len(), 2);
        assert_eq!(labelled.results[0].name.as_deref(), Some("cat"));
        assert_eq!(labelled.results[1].name, None);
    }

    #[test]
    fn test_first_content() {
        let resp: ChatCompletionResponse =
            decode(json!({"choices": [{"message": {"role": "assistant", "content": "Hi"}}]})).unwrap();
        assert_eq!(resp.first_content(), Some("Hi"));

        let empty: ChatCompletionResponse = decode(json!({"choices": []})).unwrap();
        assert_eq!(empty.first_content(), None);
    }
}
