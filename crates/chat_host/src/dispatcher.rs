//! Mode dispatch: one backend call per send, normalized to display text.
//!
//! Nothing here returns an error to the caller. Backend failures become
//! assistant text so the conversation always stays usable.

use providers::wire::{AgentGenerateRequest, ChatCompletionRequest, OcrRequest, SegmentRequest};
use providers::Backend;
use shared::conversation::{EncodedImage, HistoryItem, Mode};
use shared::settings::{AppSettings, OcrTransport};
use std::sync::Arc;

use crate::detect;
use crate::ocr;
use crate::session::SendTicket;

pub const EMPTY_REPLY: &str = "Sorry, I couldn't process that.";
pub const FAILED_REPLY: &str = "Sorry, there was an error. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    /// Append the whole message at once.
    Immediate,
    /// Append an empty message and reveal the text into it.
    Reveal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub text: String,
    pub image: Option<EncodedImage>,
    /// Entries to append to the agent history log
    pub history: Vec<HistoryItem>,
    pub presentation: Presentation,
}

impl Outcome {
    pub fn immediate(text: impl Into<String>, image: Option<EncodedImage>) -> Self {
        Self {
            text: text.into(),
            image,
            history: Vec::new(),
            presentation: Presentation::Immediate,
        }
    }

    pub fn reveal(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image: None,
            history: Vec::new(),
            presentation: Presentation::Reveal,
        }
    }

    pub fn with_history(mut self, history: Vec<HistoryItem>) -> Self {
        self.history = history;
        self
    }
}

pub struct Dispatcher<B: Backend + ?Sized> {
    backend: Arc<B>,
    threshold: f32,
    ocr_language: String,
    ocr_transport: OcrTransport,
}

impl<B: Backend + ?Sized> Dispatcher<B> {
    pub fn new(backend: Arc<B>, settings: &AppSettings) -> Self {
        Self {
            backend,
            threshold: settings.detect_threshold,
            ocr_language: settings.ocr_language.clone(),
            ocr_transport: settings.ocr_transport,
        }
    }

    pub async fn dispatch(&self, ticket: &SendTicket) -> Outcome {
        tracing::info!(session = %ticket.session_id, "dispatch {}", ticket.route.as_str());
        match (ticket.route, ticket.image.as_ref()) {
            (Mode::Detect, Some(image)) => self.detect(ticket, image).await,
            (Mode::Ocr, Some(image)) => self.ocr(image).await,
            (Mode::Agent, _) => match ticket.workspace_id.as_deref() {
                Some(workspace_id) => self.agent(ticket, workspace_id).await,
                None => self.chat(ticket).await,
            },
            _ => self.chat(ticket).await,
        }
    }

    async fn detect(&self, ticket: &SendTicket, image: &EncodedImage) -> Outcome {
        let request = SegmentRequest {
            image: image.base64_payload().to_string(),
            prompts: detect::prompts(&ticket.input),
            return_annotated: true,
            return_masks: true,
            threshold: self.threshold,
        };
        match self.backend.segment(&request).await {
            Ok(response) => {
                let (text, image) = detect::render(&response, &ticket.input);
                tracing::debug!(detections = response.results.len(), "detect done");
                Outcome::immediate(text, image)
            }
            Err(e) => {
                tracing::warn!("detect failed: {}", e);
                Outcome::immediate(detect::error_text(&e.detail()), None)
            }
        }
    }

    async fn ocr(&self, image: &EncodedImage) -> Outcome {
        let request = OcrRequest::new(image.data_url(), self.ocr_language.clone());
        match self.backend.ocr(&request, self.ocr_transport).await {
            Ok(body) => Outcome::immediate(ocr::normalize(&body), None),
            Err(e) => {
                tracing::warn!("ocr failed: {}", e);
                Outcome::immediate(format!("**Error:** {}", e.detail()), None)
            }
        }
    }

    async fn agent(&self, ticket: &SendTicket, workspace_id: &str) -> Outcome {
        let request = AgentGenerateRequest {
            input: ticket.input.clone(),
            model: ticket.model.clone(),
            workspace_id: workspace_id.to_string(),
            tools: ticket.tools.clone(),
            history: ticket.history.clone(),
        };
        match self.backend.agent_generate(&request).await {
            Ok(response) => {
                let text = response
                    .output
                    .filter(|o| !o.is_empty())
                    .unwrap_or_else(|| EMPTY_REPLY.to_string());
                let history = vec![
                    HistoryItem::user(ticket.input.clone()),
                    HistoryItem::assistant(text.clone()),
                ];
                Outcome::reveal(text).with_history(history)
            }
            Err(e) => {
                tracing::warn!("agent generate failed: {}", e);
                Outcome::reveal(FAILED_REPLY)
            }
        }
    }

    async fn chat(&self, ticket: &SendTicket) -> Outcome {
        let request = ChatCompletionRequest {
            messages: ticket.messages.clone(),
            model: ticket.model.clone(),
            max_tokens: ticket.max_tokens,
        };
        match self.backend.chat_completion(&request).await {
            Ok(response) => Outcome::reveal(response.first_content().unwrap_or(EMPTY_REPLY)),
            Err(e) => {
                tracing::warn!("chat completion failed: {}", e);
                Outcome::reveal(FAILED_REPLY)
            }
        }
    }
}
