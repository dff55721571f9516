//! Conversation state for one chat window.
//!
//! `Session` is the single owner of everything the dispatcher and the
//! reveal engine touch. The UI holds it as `Arc<Mutex<Session>>`; every
//! mutation goes through a method here.

use futures::future::AbortHandle;
use shared::agent_api::ChatMessage;
use shared::conversation::{
    AgentStats, EncodedImage, HistoryItem, Message, Mode, ModelInfo, Workspace, CLEARED_GREETING,
    GREETING, TOOL_CATALOG,
};
use shared::settings::AppSettings;
use shared::SendRejected;
use uuid::Uuid;

use crate::dispatcher::{Outcome, Presentation};
use crate::reveal::Reveal;

/// Everything the dispatcher needs for one send, captured at send time.
#[derive(Debug, Clone)]
pub struct SendTicket {
    pub session_id: Uuid,
    /// Session version when the send started. A reply for an older version is dropped.
    pub version: u64,
    pub mode: Mode,
    /// Endpoint family actually used. Differs from `mode` only when agent
    /// mode has no workspace but an image is attached (falls back to chat).
    pub route: Mode,
    pub input: String,
    pub image: Option<EncodedImage>,
    pub model: String,
    pub max_tokens: u32,
    pub workspace_id: Option<String>,
    pub tools: Vec<String>,
    pub history: Vec<HistoryItem>,
    /// Full conversation including the new user message, role + content only
    pub messages: Vec<ChatMessage>,
}

pub struct Session {
    id: Uuid,
    messages: Vec<Message>,
    mode: Mode,
    model: String,
    default_model: String,
    models: Vec<ModelInfo>,
    workspaces: Vec<Workspace>,
    selected_workspace: Option<String>,
    available_tools: Vec<String>,
    selected_tools: Vec<String>,
    agent_stats: Option<AgentStats>,
    history: Vec<HistoryItem>,
    pending_image: Option<EncodedImage>,
    image_error: Option<String>,
    loading: bool,
    typing: bool,
    view_at_bottom: bool,
    scroll_requested: bool,
    version: u64,
    max_tokens: u32,
    chunk_size: usize,
    reveal_abort: Option<AbortHandle>,
}

impl Session {
    pub fn new(settings: &AppSettings) -> Self {
        let id = Uuid::new_v4();
        tracing::info!(session = %id, "new chat session");
        Self {
            id,
            messages: vec![Message::assistant(GREETING)],
            mode: Mode::default(),
            model: settings.default_model.clone(),
            default_model: settings.default_model.clone(),
            models: Vec::new(),
            workspaces: Vec::new(),
            selected_workspace: None,
            available_tools: TOOL_CATALOG.iter().map(|t| t.id.to_string()).collect(),
            selected_tools: Vec::new(),
            agent_stats: None,
            history: Vec::new(),
            pending_image: None,
            image_error: None,
            loading: false,
            typing: false,
            view_at_bottom: true,
            scroll_requested: false,
            version: 0,
            max_tokens: settings.max_tokens,
            chunk_size: settings.chunk_size(),
            reveal_abort: None,
        }
    }

    // ── Read access ──────────────────────────────────────────────────

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn models(&self) -> &[ModelInfo] {
        &self.models
    }

    pub fn workspaces(&self) -> &[Workspace] {
        &self.workspaces
    }

    pub fn selected_workspace_id(&self) -> Option<&str> {
        self.selected_workspace.as_deref()
    }

    pub fn selected_workspace(&self) -> Option<&Workspace> {
        let id = self.selected_workspace.as_deref()?;
        self.workspaces.iter().find(|w| w.id == id)
    }

    pub fn available_tools(&self) -> &[String] {
        &self.available_tools
    }

    pub fn selected_tools(&self) -> &[String] {
        &self.selected_tools
    }

    pub fn is_tool_selected(&self, tool_id: &str) -> bool {
        self.selected_tools.iter().any(|t| t == tool_id)
    }

    pub fn agent_stats(&self) -> Option<&AgentStats> {
        self.agent_stats.as_ref()
    }

    pub fn history(&self) -> &[HistoryItem] {
        &self.history
    }

    pub fn pending_image(&self) -> Option<&EncodedImage> {
        self.pending_image.as_ref()
    }

    pub fn image_error(&self) -> Option<&str> {
        self.image_error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_typing(&self) -> bool {
        self.typing
    }

    /// A request is in flight or a reply is still being revealed.
    pub fn is_busy(&self) -> bool {
        self.loading || self.typing
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    // ── Selectors ────────────────────────────────────────────────────

    pub fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            tracing::debug!(session = %self.id, "mode -> {}", mode.as_str());
            self.mode = mode;
        }
    }

    /// Pick up edited settings. Applies to the next send and the next reveal.
    pub fn apply_settings(&mut self, settings: &AppSettings) {
        self.max_tokens = settings.max_tokens;
        self.chunk_size = settings.chunk_size();
        self.default_model = settings.default_model.clone();
    }

    pub fn select_model(&mut self, model_id: &str) {
        self.model = model_id.to_string();
    }

    /// Replace the model catalog. An empty catalog keeps the configured default.
    pub fn set_models(&mut self, models: Vec<ModelInfo>) {
        if self.model.is_empty() {
            self.model = models
                .first()
                .map(|m| m.id.clone())
                .unwrap_or_else(|| self.default_model.clone());
        }
        self.models = models;
    }

    pub fn set_workspaces(&mut self, workspaces: Vec<Workspace>) {
        self.workspaces = workspaces;
        let still_there = self
            .selected_workspace
            .as_deref()
            .is_some_and(|id| self.workspaces.iter().any(|w| w.id == id));
        if !still_there {
            self.selected_workspace = self.workspaces.first().map(|w| w.id.clone());
        }
    }

    pub fn select_workspace(&mut self, workspace_id: Option<&str>) {
        self.selected_workspace = workspace_id.map(String::from);
    }

    /// Add a freshly created workspace and select it.
    pub fn add_workspace(&mut self, workspace: Workspace) {
        self.selected_workspace = Some(workspace.id.clone());
        self.workspaces.retain(|w| w.id != workspace.id);
        self.workspaces.push(workspace);
    }

    pub fn remove_workspace(&mut self, workspace_id: &str) {
        self.workspaces.retain(|w| w.id != workspace_id);
        if self.selected_workspace.as_deref() == Some(workspace_id) {
            self.selected_workspace = self.workspaces.first().map(|w| w.id.clone());
        }
    }

    pub fn set_available_tools(&mut self, tools: Vec<String>) {
        if !tools.is_empty() {
            self.available_tools = tools;
        }
    }

    pub fn toggle_tool(&mut self, tool_id: &str) {
        if let Some(pos) = self.selected_tools.iter().position(|t| t == tool_id) {
            self.selected_tools.remove(pos);
        } else {
            self.selected_tools.push(tool_id.to_string());
        }
    }

    pub fn set_agent_stats(&mut self, stats: AgentStats) {
        self.agent_stats = Some(stats);
    }

    // ── Image slot ───────────────────────────────────────────────────

    /// Stage an image, replacing any previous one.
    pub fn stage_image(&mut self, image: EncodedImage) {
        self.pending_image = Some(image);
        self.image_error = None;
    }

    pub fn clear_image(&mut self) {
        self.pending_image = None;
        self.image_error = None;
    }

    pub fn set_image_error(&mut self, message: impl Into<String>) {
        self.image_error = Some(message.into());
    }

    // ── Sending ──────────────────────────────────────────────────────

    pub fn can_send(&self, input: &str) -> Result<(), SendRejected> {
        if self.is_busy() {
            return Err(SendRejected::Busy);
        }
        let has_image = self.pending_image.is_some();
        if input.trim().is_empty() && !has_image {
            return Err(SendRejected::EmptyInput);
        }
        if self.mode.requires_image() && !has_image {
            return Err(SendRejected::ImageRequired { mode: self.mode });
        }
        if self.mode == Mode::Agent && self.selected_workspace.is_none() && !has_image {
            return Err(SendRejected::WorkspaceRequired);
        }
        Ok(())
    }

    /// Validate, append the user message, drain the image slot and mark the
    /// session as loading.
    pub fn begin_send(&mut self, input: &str) -> Result<SendTicket, SendRejected> {
        self.can_send(input)?;

        let input = input.trim().to_string();
        let image = self.pending_image.take();
        self.image_error = None;

        let route = match self.mode {
            Mode::Agent if self.selected_workspace.is_none() => Mode::Chat,
            mode => mode,
        };

        self.messages.push(Message::user(input.clone(), image.clone()));
        self.loading = true;
        self.view_at_bottom = true;
        self.scroll_requested = true;

        tracing::info!(
            session = %self.id,
            "send mode={} route={} image={}",
            self.mode.as_str(),
            route.as_str(),
            image.is_some()
        );

        Ok(SendTicket {
            session_id: self.id,
            version: self.version,
            mode: self.mode,
            route,
            input,
            image,
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            workspace_id: self.selected_workspace.clone(),
            tools: self.selected_tools.clone(),
            history: self.history.clone(),
            messages: self.messages.iter().map(Message::to_api).collect(),
        })
    }

    /// Apply a dispatch outcome. Returns the reveal to run when the reply
    /// should be shown progressively.
    pub fn complete_send(&mut self, ticket: &SendTicket, outcome: Outcome) -> Option<Reveal> {
        // a stale reply still releases the send gate
        self.loading = false;
        if ticket.version != self.version {
            tracing::debug!(session = %self.id, "dropping reply for a cleared conversation");
            return None;
        }
        self.history.extend(outcome.history);

        match outcome.presentation {
            Presentation::Immediate => {
                self.messages
                    .push(Message::assistant(outcome.text).with_image(outcome.image));
                if self.view_at_bottom {
                    self.scroll_requested = true;
                }
                None
            }
            Presentation::Reveal => {
                self.messages
                    .push(Message::assistant(String::new()).with_image(outcome.image));
                self.typing = true;
                Some(Reveal::new(
                    self.messages.len() - 1,
                    self.version,
                    &outcome.text,
                    self.chunk_size,
                    self.view_at_bottom,
                ))
            }
        }
    }

    /// Remember the running reveal so a reset can stop it.
    pub fn track_reveal(&mut self, abort: AbortHandle) {
        if let Some(previous) = self.reveal_abort.replace(abort) {
            previous.abort();
        }
    }

    /// Stop the running reveal, leaving whatever text it already appended.
    pub fn cancel_reveal(&mut self) {
        if let Some(handle) = self.reveal_abort.take() {
            handle.abort();
            tracing::debug!(session = %self.id, "reveal cancelled");
        }
        self.typing = false;
    }

    /// Start over: greeting only, no history, no staged image. A running
    /// reveal is stopped. A request still in flight keeps `loading` set
    /// until its reply arrives, and that reply is then dropped.
    pub fn reset(&mut self) {
        self.cancel_reveal();
        self.version += 1;
        self.messages = vec![Message::assistant(CLEARED_GREETING)];
        self.history.clear();
        self.pending_image = None;
        self.image_error = None;
        self.typing = false;
        self.view_at_bottom = true;
        tracing::info!(session = %self.id, version = self.version, "conversation cleared");
    }

    // ── View coupling ────────────────────────────────────────────────

    pub fn set_view_at_bottom(&mut self, at_bottom: bool) {
        self.view_at_bottom = at_bottom;
    }

    /// Returns true once per scroll request.
    pub fn take_scroll_request(&mut self) -> bool {
        std::mem::take(&mut self.scroll_requested)
    }

    // ── Reveal hooks ─────────────────────────────────────────────────

    pub(crate) fn append_to_message(&mut self, index: usize, chunk: &str) -> bool {
        match self.messages.get_mut(index) {
            Some(message) => {
                message.content.push_str(chunk);
                true
            }
            None => false,
        }
    }

    pub(crate) fn finish_typing(&mut self) {
        self.typing = false;
        self.reveal_abort = None;
    }

    pub(crate) fn request_scroll(&mut self) {
        self.scroll_requested = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::conversation::Role;

    fn session() -> Session {
        Session::new(&AppSettings::default())
    }

    fn workspace(id: &str) -> Workspace {
        Workspace {
            id: id.into(),
            name: id.to_uppercase(),
            description: None,
            is_active: true,
            workspace_type: "personal".into(),
        }
    }

    fn png() -> EncodedImage {
        EncodedImage::from_bytes("image/png", b"png")
    }

    #[test]
    fn test_starts_with_greeting() {
        let s = session();
        assert_eq!(s.messages().len(), 1);
        assert_eq!(s.messages()[0].content, GREETING);
        assert_eq!(s.model(), shared::settings::DEFAULT_MODEL);
    }

    #[test]
    fn test_rejects_empty_input_without_image() {
        let mut s = session();
        assert_eq!(s.begin_send("   ").unwrap_err(), SendRejected::EmptyInput);
        assert_eq!(s.messages().len(), 1);
        assert!(!s.is_loading());
    }

    #[test]
    fn test_image_alone_is_enough() {
        let mut s = session();
        s.stage_image(png());
        let ticket = s.begin_send("").unwrap();
        assert_eq!(ticket.route, Mode::Chat);
        assert!(s.pending_image().is_none());
    }

    #[test]
    fn test_agent_needs_workspace_unless_image() {
        let mut s = session();
        s.set_mode(Mode::Agent);
        assert_eq!(s.can_send("hi"), Err(SendRejected::WorkspaceRequired));

        s.stage_image(png());
        let ticket = s.begin_send("hi").unwrap();
        assert_eq!(ticket.route, Mode::Chat);
        assert_eq!(ticket.mode, Mode::Agent);
    }

    #[test]
    fn test_agent_with_workspace_routes_to_agent() {
        let mut s = session();
        s.set_mode(Mode::Agent);
        s.set_workspaces(vec![workspace("w1"), workspace("w2")]);
        s.toggle_tool("web_search");
        let ticket = s.begin_send("  find it  ").unwrap();
        assert_eq!(ticket.route, Mode::Agent);
        assert_eq!(ticket.input, "find it");
        assert_eq!(ticket.workspace_id.as_deref(), Some("w1"));
        assert_eq!(ticket.tools, vec!["web_search".to_string()]);
    }

    #[test]
    fn test_image_modes_require_image() {
        let mut s = session();
        s.set_mode(Mode::Detect);
        assert_eq!(
            s.can_send("cat"),
            Err(SendRejected::ImageRequired { mode: Mode::Detect })
        );
        s.set_mode(Mode::Ocr);
        assert_eq!(
            s.can_send("read"),
            Err(SendRejected::ImageRequired { mode: Mode::Ocr })
        );
    }

    #[test]
    fn test_busy_blocks_second_send() {
        let mut s = session();
        s.begin_send("one").unwrap();
        assert_eq!(s.can_send("two"), Err(SendRejected::Busy));
    }

    #[test]
    fn test_chat_image_is_shown_not_sent() {
        let mut s = session();
        s.stage_image(png());
        let ticket = s.begin_send("what is this").unwrap();
        assert_eq!(ticket.route, Mode::Chat);
        let user = s.messages().last().unwrap();
        assert_eq!(user.role, Role::User);
        assert!(user.image.is_some());
        // the chat wire message carries role and content only
        assert_eq!(ticket.messages.last().unwrap().content, "what is this");
    }

    #[test]
    fn test_ticket_carries_whole_conversation() {
        let mut s = session();
        let ticket = s.begin_send("Hello").unwrap();
        let roles: Vec<&str> = ticket.messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["assistant", "user"]);
    }

    #[test]
    fn test_immediate_outcome_appends_whole_message() {
        let mut s = session();
        s.set_mode(Mode::Detect);
        s.stage_image(png());
        let ticket = s.begin_send("").unwrap();
        let reveal = s.complete_send(
            &ticket,
            Outcome::immediate("No objects detected.", Some(png())),
        );
        assert!(reveal.is_none());
        assert!(!s.is_loading());
        let last = s.messages().last().unwrap();
        assert_eq!(last.content, "No objects detected.");
        assert!(last.image.is_some());
    }

    #[test]
    fn test_reveal_outcome_appends_placeholder() {
        let mut s = session();
        let ticket = s.begin_send("Hello").unwrap();
        let reveal = s.complete_send(&ticket, Outcome::reveal("Hi there!"));
        assert!(reveal.is_some());
        assert!(s.is_typing());
        assert_eq!(s.messages().len(), 3);
        assert_eq!(s.messages()[2].content, "");
    }

    #[test]
    fn test_reply_after_reset_is_dropped() {
        let mut s = session();
        let ticket = s.begin_send("Hello").unwrap();
        s.reset();
        assert!(s.complete_send(&ticket, Outcome::reveal("late")).is_none());
        assert_eq!(s.messages().len(), 1);
        assert_eq!(s.messages()[0].content, CLEARED_GREETING);
    }

    #[test]
    fn test_reset_keeps_send_gate_until_reply_lands() {
        let mut s = session();
        let ticket = s.begin_send("one").unwrap();
        s.reset();
        assert_eq!(s.can_send("two"), Err(SendRejected::Busy));

        assert!(s.complete_send(&ticket, Outcome::reveal("late")).is_none());
        assert!(!s.is_loading());
        assert_eq!(s.can_send("two"), Ok(()));
        assert_eq!(s.messages().len(), 1);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut s = session();
        s.set_mode(Mode::Agent);
        s.set_workspaces(vec![workspace("w1")]);
        let ticket = s.begin_send("hi").unwrap();
        s.complete_send(
            &ticket,
            Outcome::reveal("yo").with_history(vec![HistoryItem::user("hi"), HistoryItem::assistant("yo")]),
        );
        assert_eq!(s.history().len(), 2);
        s.stage_image(png());

        let before = s.version();
        s.reset();
        assert!(s.history().is_empty());
        assert!(s.pending_image().is_none());
        assert!(!s.is_busy());
        assert_eq!(s.version(), before + 1);
        assert_eq!(s.mode(), Mode::Agent);
    }

    #[test]
    fn test_workspace_selection_follows_list() {
        let mut s = session();
        s.set_workspaces(vec![workspace("a"), workspace("b")]);
        assert_eq!(s.selected_workspace_id(), Some("a"));

        s.add_workspace(workspace("c"));
        assert_eq!(s.selected_workspace_id(), Some("c"));

        s.remove_workspace("c");
        assert_eq!(s.selected_workspace_id(), Some("a"));

        s.remove_workspace("a");
        s.remove_workspace("b");
        assert_eq!(s.selected_workspace_id(), None);
    }

    #[test]
    fn test_toggle_tool() {
        let mut s = session();
        s.toggle_tool("code_interpreter");
        assert!(s.is_tool_selected("code_interpreter"));
        s.toggle_tool("code_interpreter");
        assert!(!s.is_tool_selected("code_interpreter"));
    }

    #[test]
    fn test_scroll_request_is_taken_once() {
        let mut s = session();
        s.begin_send("x").unwrap();
        assert!(s.take_scroll_request());
        assert!(!s.take_scroll_request());
    }

    #[test]
    fn test_apply_settings_changes_chunk_size() {
        let mut s = session();
        let settings = AppSettings {
            reveal_chunk_size: 0,
            max_tokens: 256,
            ..AppSettings::default()
        };
        s.apply_settings(&settings);
        assert_eq!(s.chunk_size(), 1);
        assert_eq!(s.begin_send("x").unwrap().max_tokens, 256);
    }
}
