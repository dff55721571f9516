mod bridge;
mod config;
mod simple_md;
mod textures;

use bridge::Bridge;
use chat_host::image as staging;
use chat_host::Session;
use eframe::egui;
use shared::conversation::{tool_spec, EncodedImage, Message, Mode, Role};
use shared::settings::{AppSettings, OcrTransport};
use textures::TextureCache;

/// Distance from the bottom, in points, that still counts as "at the bottom".
const BOTTOM_THRESHOLD: f32 = 100.0;
const THUMBNAIL_SIZE: f32 = 220.0;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let settings = config::load_settings();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 780.0])
            .with_min_inner_size([720.0, 520.0]),
        vsync: true,
        ..Default::default()
    };
    eframe::run_native(
        "Agent Chat",
        options,
        Box::new(move |cc| {
            let bridge = Bridge::new(runtime, cc.egui_ctx.clone(), &settings);
            bridge.load_catalogs();
            Box::new(AgentChatApp::new(bridge, settings))
        }),
    )
    .map_err(|e| anyhow::anyhow!("window failed: {e}"))
}

/// Work collected while the session is locked and run once it is released.
enum UiAction {
    Send,
    CreateWorkspace(String),
    DeleteWorkspace(String),
    PickImage,
    PasteImage,
    RefreshStats,
    CheckDetection,
    SaveSettings,
}

struct AgentChatApp {
    bridge: Bridge,
    settings: AppSettings,
    input: String,
    /// Reason the last send was refused, shown above the composer
    notice: Option<String>,
    new_workspace_name: String,
    focused_image: Option<EncodedImage>,
    textures: TextureCache,
    show_settings: bool,
    settings_draft: AppSettings,
    api_key_input: String,
    settings_status: Option<String>,
}

impl AgentChatApp {
    fn new(bridge: Bridge, settings: AppSettings) -> Self {
        Self {
            bridge,
            settings_draft: settings.clone(),
            api_key_input: settings.api_key.clone().unwrap_or_default(),
            settings,
            input: String::new(),
            notice: None,
            new_workspace_name: String::new(),
            focused_image: None,
            textures: TextureCache::default(),
            show_settings: false,
            settings_status: None,
        }
    }

    fn apply_style(&self, ctx: &egui::Context) {
        let mut style = (*ctx.style()).clone();
        style.visuals = if self.settings.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        };
        style.visuals.window_rounding = egui::Rounding::same(12.0);
        style.spacing.item_spacing = egui::vec2(8.0, 8.0);
        if self.settings.dark_mode {
            style.visuals.panel_fill = egui::Color32::from_rgb(30, 30, 35);
        } else {
            style.visuals.panel_fill = egui::Color32::from_rgb(250, 250, 252);
        }
        ctx.set_style(style);
    }

    fn run(&mut self, action: UiAction) {
        match action {
            UiAction::Send => {
                let input = std::mem::take(&mut self.input);
                match self.bridge.send(input.clone()) {
                    Ok(()) => self.notice = None,
                    Err(rejected) => {
                        self.input = input;
                        self.notice = Some(rejected.to_string());
                    }
                }
            }
            UiAction::CreateWorkspace(name) => self.bridge.create_workspace(name),
            UiAction::DeleteWorkspace(id) => self.bridge.delete_workspace(id),
            UiAction::PickImage => {
                let picked = rfd::FileDialog::new()
                    .add_filter("Images", &["jpg", "jpeg", "png", "webp", "bmp"])
                    .pick_file();
                if let Some(path) = picked {
                    let staged = staging::stage_from_path(&path);
                    self.stage(staged);
                }
            }
            UiAction::PasteImage => {
                let staged = arboard::Clipboard::new()
                    .and_then(|mut clipboard| clipboard.get_image())
                    .map_err(|e| staging::ImageError::Unreadable(e.to_string()))
                    .and_then(|img| {
                        staging::stage_from_rgba(img.width, img.height, img.bytes.into_owned())
                    });
                self.stage(staged);
            }
            UiAction::RefreshStats => self.bridge.refresh_stats(),
            UiAction::CheckDetection => self.bridge.check_detection(),
            UiAction::SaveSettings => self.save_settings(),
        }
    }

    fn stage(&mut self, staged: Result<EncodedImage, staging::ImageError>) {
        let mut s = self.bridge.session.lock();
        match staged {
            Ok(image) => s.stage_image(image),
            Err(e) => {
                tracing::warn!("image rejected: {}", e);
                s.set_image_error(e.to_string());
            }
        }
    }

    fn save_settings(&mut self) {
        let mut draft = self.settings_draft.clone();
        let key = self.api_key_input.trim();
        draft.api_key = (!key.is_empty()).then(|| key.to_string());
        draft.backend_url = draft.backend_url.trim().trim_end_matches('/').to_string();

        self.settings_status = Some(match config::save_settings(&draft) {
            Ok(()) => "Saved".to_string(),
            Err(e) => {
                tracing::error!("saving settings failed: {:#}", e);
                format!("Could not save: {e:#}")
            }
        });
        self.bridge.session.lock().apply_settings(&draft);
        self.bridge.reconfigure(&draft);
        self.settings = draft.clone();
        self.settings_draft = draft;
    }
}

impl eframe::App for AgentChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.bridge.frame_painted();
        self.apply_style(ctx);
        let dark = self.settings.dark_mode;
        let mut actions: Vec<UiAction> = Vec::new();

        let session = self.bridge.session.clone();
        let mut s = session.lock();
        let busy = s.is_busy();

        // ── Header ───────────────────────────────────────────────────
        egui::TopBottomPanel::top("header")
            .frame(egui::Frame::none().fill(if dark {
                egui::Color32::from_rgb(35, 35, 42)
            } else {
                egui::Color32::from_rgb(245, 247, 250)
            }))
            .show(ctx, |ui| {
                ui.add_space(10.0);
                ui.horizontal(|ui| {
                    ui.add_space(16.0);
                    ui.heading(egui::RichText::new("Agent Chat").size(22.0));
                    ui.add_space(24.0);
                    mode_buttons(ui, &mut s);
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.add_space(16.0);
                        if ui.button("⚙ Settings").clicked() {
                            self.show_settings = !self.show_settings;
                        }
                        if ui.button("Clear").on_hover_text("Start over").clicked() {
                            s.reset();
                            self.notice = None;
                            self.focused_image = None;
                            self.textures.clear();
                        }
                    });
                });
                ui.add_space(10.0);
            });

        // ── Selectors ────────────────────────────────────────────────
        egui::SidePanel::left("selectors")
            .resizable(false)
            .exact_width(240.0)
            .show(ctx, |ui| {
                ui.add_space(8.0);
                ui.label(egui::RichText::new("Model").strong());
                let selected_text = s
                    .models()
                    .iter()
                    .find(|m| m.id == s.model())
                    .map(|m| m.display_name().to_string())
                    .unwrap_or_else(|| s.model().to_string());
                let models: Vec<(String, String)> = s
                    .models()
                    .iter()
                    .map(|m| (m.id.clone(), m.display_name().to_string()))
                    .collect();
                ui.add_enabled_ui(!busy, |ui| {
                    egui::ComboBox::from_id_source("model")
                        .width(220.0)
                        .selected_text(selected_text)
                        .show_ui(ui, |ui| {
                            if models.is_empty() {
                                ui.label(s.model().to_string());
                            }
                            for (id, name) in models {
                                if ui.selectable_label(s.model() == id, name).clicked() {
                                    s.select_model(&id);
                                }
                            }
                        });
                });

                ui.separator();
                ui.label(egui::RichText::new("Workspace").strong());
                let workspaces: Vec<(String, String)> = s
                    .workspaces()
                    .iter()
                    .map(|w| (w.id.clone(), w.name.clone()))
                    .collect();
                let selected_name = s
                    .selected_workspace()
                    .map(|w| w.name.clone())
                    .unwrap_or_else(|| "None".to_string());
                ui.horizontal(|ui| {
                    egui::ComboBox::from_id_source("workspace")
                        .width(170.0)
                        .selected_text(selected_name)
                        .show_ui(ui, |ui| {
                            if ui
                                .selectable_label(s.selected_workspace_id().is_none(), "None")
                                .clicked()
                            {
                                s.select_workspace(None);
                            }
                            for (id, name) in &workspaces {
                                let selected = s.selected_workspace_id() == Some(id.as_str());
                                if ui.selectable_label(selected, name).clicked() {
                                    s.select_workspace(Some(id.as_str()));
                                }
                            }
                        });
                    if let Some(id) = s.selected_workspace_id() {
                        if ui.small_button("🗑").on_hover_text("Delete workspace").clicked() {
                            actions.push(UiAction::DeleteWorkspace(id.to_string()));
                        }
                    }
                });
                ui.horizontal(|ui| {
                    let field = ui.add(
                        egui::TextEdit::singleline(&mut self.new_workspace_name)
                            .hint_text("New workspace")
                            .desired_width(170.0),
                    );
                    let submitted =
                        field.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                    if (ui.small_button("＋").clicked() || submitted)
                        && !self.new_workspace_name.trim().is_empty()
                    {
                        actions.push(UiAction::CreateWorkspace(std::mem::take(
                            &mut self.new_workspace_name,
                        )));
                    }
                });

                ui.separator();
                ui.label(egui::RichText::new("Tools").strong());
                tool_checkboxes(ui, &mut s);

                ui.separator();
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new("Agent").strong());
                    if ui.small_button("↻").on_hover_text("Refresh stats").clicked() {
                        actions.push(UiAction::RefreshStats);
                    }
                });
                match s.agent_stats() {
                    Some(stats) => {
                        let (dot, color) = if stats.healthy {
                            ("● healthy", egui::Color32::from_rgb(80, 180, 100))
                        } else {
                            ("● unhealthy", egui::Color32::from_rgb(210, 90, 80))
                        };
                        ui.label(egui::RichText::new(dot).color(color));
                        let c = &stats.stats;
                        ui.small(format!("Requests: {}", c.total_requests));
                        ui.small(format!("Success rate: {:.1}%", c.success_rate));
                        ui.small(format!("Active streams: {}", c.active_streams));
                        ui.small(format!("Tokens: {}", c.total_tokens_processed));
                    }
                    None => {
                        ui.small("No stats yet");
                    }
                }
            });

        // ── Composer ─────────────────────────────────────────────────
        egui::TopBottomPanel::bottom("composer")
            .frame(
                egui::Frame::none()
                    .fill(ctx.style().visuals.panel_fill)
                    .inner_margin(egui::Margin::same(12.0)),
            )
            .show(ctx, |ui| {
                if let Some(image) = s.pending_image().cloned() {
                    ui.horizontal(|ui| {
                        if let Some(texture) = self.textures.get(ctx, &image) {
                            ui.add(
                                egui::Image::new(&texture).max_size(egui::vec2(96.0, 96.0)),
                            );
                        }
                        if ui.small_button("✕").on_hover_text("Remove image").clicked() {
                            s.clear_image();
                        }
                    });
                }
                if let Some(error) = s.image_error() {
                    ui.colored_label(egui::Color32::from_rgb(210, 90, 80), error);
                }
                if let Some(notice) = &self.notice {
                    ui.colored_label(egui::Color32::from_rgb(200, 150, 80), notice.as_str());
                }

                ui.horizontal(|ui| {
                    if ui.button("🖼").on_hover_text("Attach image").clicked() {
                        actions.push(UiAction::PickImage);
                    }
                    if ui.button("📋").on_hover_text("Paste image").clicked() {
                        actions.push(UiAction::PasteImage);
                    }

                    // Enter sends, Shift+Enter keeps typing. The key is taken
                    // out of the event queue before the editor can insert it.
                    let input_id = egui::Id::new("composer_input");
                    let focused = ui.memory(|m| m.has_focus(input_id));
                    let enter = focused && ui.input_mut(take_plain_enter);

                    let send_width = 70.0;
                    ui.add_sized(
                        [ui.available_width() - send_width - 8.0, 40.0],
                        egui::TextEdit::multiline(&mut self.input)
                            .id(input_id)
                            .hint_text(s.mode().placeholder())
                            .desired_rows(2),
                    );

                    let has_content = !self.input.trim().is_empty() || s.pending_image().is_some();
                    let send = ui.add_enabled(
                        !busy && has_content,
                        egui::Button::new("Send")
                            .fill(egui::Color32::from_rgb(70, 130, 180))
                            .min_size(egui::vec2(send_width, 40.0)),
                    );
                    if send.clicked() || (enter && !busy) {
                        actions.push(UiAction::Send);
                    }
                });
            });

        // ── Conversation ─────────────────────────────────────────────
        let messages: Vec<Message> = s.messages().to_vec();
        let loading = s.is_loading();
        let scroll_to_end = s.take_scroll_request();

        egui::CentralPanel::default().show(ctx, |ui| {
            let output = egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    for msg in &messages {
                        ui.add_space(6.0);
                        self.message_bubble(ui, ctx, msg, dark);
                    }
                    if loading {
                        ui.add_space(6.0);
                        thinking_bubble(ui, dark);
                        ctx.request_repaint();
                    }
                    if scroll_to_end {
                        ui.scroll_to_cursor(Some(egui::Align::BOTTOM));
                    }
                });

            let bottom = output.state.offset.y + output.inner_rect.height();
            s.set_view_at_bottom(output.content_size.y - bottom <= BOTTOM_THRESHOLD);
        });

        drop(s);

        self.image_window(ctx);
        if self.show_settings {
            self.settings_window(ctx, &mut actions);
        }

        for action in actions {
            self.run(action);
        }
    }
}

impl AgentChatApp {
    fn message_bubble(&mut self, ui: &mut egui::Ui, ctx: &egui::Context, msg: &Message, dark: bool) {
        let is_user = msg.role == Role::User;
        let (fill, text_color) = match (is_user, dark) {
            (true, _) => (
                egui::Color32::from_rgb(59, 130, 246),
                egui::Color32::WHITE,
            ),
            (false, true) => (
                egui::Color32::from_rgb(50, 50, 58),
                egui::Color32::from_rgb(230, 230, 235),
            ),
            (false, false) => (
                egui::Color32::from_rgb(235, 236, 240),
                egui::Color32::from_rgb(30, 30, 40),
            ),
        };
        let layout = if is_user {
            egui::Layout::right_to_left(egui::Align::TOP)
        } else {
            egui::Layout::left_to_right(egui::Align::TOP)
        };
        let max_width = ui.available_width() * 0.75;

        ui.with_layout(layout, |ui| {
            egui::Frame::none()
                .fill(fill)
                .rounding(egui::Rounding::same(12.0))
                .inner_margin(egui::Margin::same(12.0))
                .show(ui, |ui| {
                    ui.set_max_width(max_width);
                    ui.vertical(|ui| {
                        if let Some(image) = &msg.image {
                            if let Some(texture) = self.textures.get(ctx, image) {
                                let thumb = ui.add(
                                    egui::Image::new(&texture)
                                        .max_size(egui::vec2(THUMBNAIL_SIZE, THUMBNAIL_SIZE))
                                        .sense(egui::Sense::click()),
                                );
                                if thumb.on_hover_text("Click to enlarge").clicked() {
                                    self.focused_image = Some(image.clone());
                                }
                            }
                        }
                        if !msg.content.is_empty() {
                            if is_user {
                                ui.label(egui::RichText::new(&msg.content).color(text_color));
                            } else {
                                simple_md::render_markdown(ui, &msg.content, text_color);
                            }
                        }
                        ui.horizontal(|ui| {
                            ui.label(
                                egui::RichText::new(&msg.timestamp)
                                    .size(10.0)
                                    .color(text_color.gamma_multiply(0.6)),
                            );
                            if !is_user
                                && !msg.content.is_empty()
                                && ui.small_button("Copy").on_hover_text("Copy reply").clicked()
                            {
                                let plain = markdown::plain_text(&markdown::render(&msg.content));
                                ui.output_mut(|o| o.copied_text = plain);
                            }
                        });
                    });
                });
        });
    }

    fn image_window(&mut self, ctx: &egui::Context) {
        let Some(image) = self.focused_image.clone() else {
            return;
        };
        let mut open = true;
        egui::Window::new("Image")
            .collapsible(false)
            .resizable(true)
            .open(&mut open)
            .show(ctx, |ui| {
                match self.textures.get(ctx, &image) {
                    Some(texture) => {
                        egui::ScrollArea::both().show(ui, |ui| {
                            ui.add(egui::Image::new(&texture).max_size(egui::vec2(900.0, 700.0)));
                        });
                    }
                    None => {
                        ui.label("This image cannot be displayed.");
                    }
                }
            });
        if !open {
            self.focused_image = None;
        }
    }

    fn settings_window(&mut self, ctx: &egui::Context, actions: &mut Vec<UiAction>) {
        let mut open = true;
        let detect_status = self.bridge.detect_status.lock().clone();
        egui::Window::new("Settings")
            .collapsible(false)
            .resizable(true)
            .open(&mut open)
            .anchor(egui::Align2::RIGHT_TOP, [-12.0, 12.0])
            .show(ctx, |ui| {
                ui.set_min_width(420.0);
                let draft = &mut self.settings_draft;

                egui::Grid::new("settings_grid")
                    .num_columns(2)
                    .spacing([12.0, 8.0])
                    .show(ui, |ui| {
                        ui.label("Backend URL");
                        ui.text_edit_singleline(&mut draft.backend_url);
                        ui.end_row();

                        ui.label("API key");
                        ui.add(egui::TextEdit::singleline(&mut self.api_key_input).password(true));
                        ui.end_row();

                        ui.label("Default model");
                        ui.text_edit_singleline(&mut draft.default_model);
                        ui.end_row();

                        ui.label("Max tokens");
                        ui.add(egui::DragValue::new(&mut draft.max_tokens).clamp_range(1..=32768));
                        ui.end_row();

                        ui.label("Reveal speed");
                        ui.add(
                            egui::DragValue::new(&mut draft.reveal_chunk_size)
                                .clamp_range(1..=500)
                                .suffix(" chars/frame"),
                        );
                        ui.end_row();

                        ui.label("Request timeout");
                        ui.add(
                            egui::DragValue::new(&mut draft.request_timeout_secs)
                                .clamp_range(5..=600)
                                .suffix(" s"),
                        );
                        ui.end_row();

                        ui.label("Detection threshold");
                        ui.add(egui::Slider::new(&mut draft.detect_threshold, 0.05..=0.95));
                        ui.end_row();

                        ui.label("OCR language");
                        ui.text_edit_singleline(&mut draft.ocr_language);
                        ui.end_row();

                        ui.label("OCR upload");
                        ui.horizontal(|ui| {
                            ui.radio_value(&mut draft.ocr_transport, OcrTransport::Form, "Form");
                            ui.radio_value(&mut draft.ocr_transport, OcrTransport::Json, "JSON");
                        });
                        ui.end_row();

                        ui.label("Dark mode");
                        ui.checkbox(&mut draft.dark_mode, "");
                        ui.end_row();
                    });

                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("Save").clicked() {
                        actions.push(UiAction::SaveSettings);
                    }
                    if ui.button("Check detection service").clicked() {
                        actions.push(UiAction::CheckDetection);
                    }
                    if let Some(status) = &self.settings_status {
                        ui.label(status.as_str());
                    }
                });
                if let Some(status) = detect_status {
                    ui.add_space(6.0);
                    egui::ScrollArea::vertical()
                        .max_height(200.0)
                        .show(ui, |ui| {
                            ui.label(egui::RichText::new(status).monospace().size(11.0));
                        });
                }
            });
        if !open {
            self.show_settings = false;
        }
    }
}

/// Mode switches; locked while a request or reveal is running.
fn mode_buttons(ui: &mut egui::Ui, session: &mut Session) -> Vec<egui::Response> {
    let busy = session.is_busy();
    let current = session.mode();
    let mut responses = Vec::with_capacity(Mode::ALL.len());
    for mode in Mode::ALL {
        let label = egui::SelectableLabel::new(current == mode, mode.label());
        let response = ui.add_enabled(!busy, label);
        if response.clicked() {
            session.set_mode(mode);
        }
        responses.push(response);
    }
    responses
}

fn tool_checkboxes(ui: &mut egui::Ui, session: &mut Session) -> Vec<egui::Response> {
    let busy = session.is_busy();
    let tools = session.available_tools().to_vec();
    let mut responses = Vec::with_capacity(tools.len());
    for tool in tools {
        let (label, hint) = match tool_spec(&tool) {
            Some(spec) => (spec.name.to_string(), spec.description),
            None => (tool.clone(), ""),
        };
        let mut checked = session.is_tool_selected(&tool);
        let mut response = ui.add_enabled(!busy, egui::Checkbox::new(&mut checked, label));
        if !hint.is_empty() {
            response = response.on_hover_text(hint);
        }
        if response.changed() {
            session.toggle_tool(&tool);
        }
        responses.push(response);
    }
    responses
}

/// Remove unshifted Enter presses from this frame's events. Returns whether
/// there was one.
fn take_plain_enter(input: &mut egui::InputState) -> bool {
    let before = input.events.len();
    input.events.retain(|event| {
        !matches!(
            event,
            egui::Event::Key {
                key: egui::Key::Enter,
                pressed: true,
                modifiers,
                ..
            } if !modifiers.shift
        )
    });
    input.events.len() != before
}

fn thinking_bubble(ui: &mut egui::Ui, dark: bool) {
    egui::Frame::none()
        .fill(if dark {
            egui::Color32::from_rgb(50, 50, 58)
        } else {
            egui::Color32::from_rgb(230, 230, 235)
        })
        .rounding(egui::Rounding::same(12.0))
        .inner_margin(egui::Margin::same(12.0))
        .show(ui, |ui| {
            let time = ui.input(|i| i.time);
            let dots = match ((time * 2.0) as i32) % 4 {
                0 => "   ",
                1 => ".  ",
                2 => ".. ",
                _ => "...",
            };
            ui.label(
                egui::RichText::new(format!("Thinking{}", dots))
                    .italics()
                    .color(if dark {
                        egui::Color32::from_rgb(160, 160, 180)
                    } else {
                        egui::Color32::from_rgb(60, 60, 70)
                    }),
            );
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enter(shift: bool) -> egui::Event {
        egui::Event::Key {
            key: egui::Key::Enter,
            physical_key: None,
            pressed: true,
            repeat: false,
            modifiers: egui::Modifiers {
                shift,
                ..Default::default()
            },
        }
    }

    /// Run `f` inside one headless frame.
    fn in_frame<R>(mut f: impl FnMut(&mut egui::Ui) -> R) -> R {
        let ctx = egui::Context::default();
        let mut out = None;
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                out = Some(f(ui));
            });
        });
        out.unwrap()
    }

    #[test]
    fn test_plain_enter_is_taken_from_the_queue() {
        let mut input = egui::InputState::default();
        input.events.push(egui::Event::Text("hi".into()));
        input.events.push(enter(false));
        assert!(take_plain_enter(&mut input));
        assert_eq!(input.events.len(), 1);
        assert!(!take_plain_enter(&mut input));
    }

    #[test]
    fn test_shift_enter_stays_for_the_editor() {
        let mut input = egui::InputState::default();
        input.events.push(enter(true));
        assert!(!take_plain_enter(&mut input));
        assert_eq!(input.events.len(), 1);
    }

    #[test]
    fn test_selectors_locked_while_busy() {
        let mut session = Session::new(&AppSettings::default());
        let idle = in_frame(|ui| {
            let modes = mode_buttons(ui, &mut session);
            let tools = tool_checkboxes(ui, &mut session);
            modes.iter().chain(&tools).all(|r| r.enabled)
        });
        assert!(idle);

        session.begin_send("hello").unwrap();
        let locked = in_frame(|ui| {
            let modes = mode_buttons(ui, &mut session);
            let tools = tool_checkboxes(ui, &mut session);
            modes.len() == Mode::ALL.len() && modes.iter().chain(&tools).all(|r| !r.enabled)
        });
        assert!(locked);
    }
}
