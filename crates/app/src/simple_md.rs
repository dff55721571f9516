//! Draws markdown segments into egui chat bubbles.

use eframe::egui;
use egui::text::LayoutJob;
use markdown::{HeadingLevel, Segment, TokenKind};

const BASE_SIZE: f32 = 14.0;
const CODE_SIZE: f32 = 13.0;
const CODE_BG: egui::Color32 = egui::Color32::from_rgb(30, 30, 30);

/// Render a message body.
pub fn render_markdown(ui: &mut egui::Ui, text: &str, base_color: egui::Color32) {
    let segments = markdown::render(text);
    let inline_code_bg = if base_color.r() > 128 {
        egui::Color32::from_rgb(60, 60, 70)
    } else {
        egui::Color32::from_rgb(230, 232, 236)
    };

    let mut line: Vec<&Segment> = Vec::new();
    for seg in &segments {
        match seg {
            Segment::Text(_) | Segment::InlineCode(_) | Segment::Bold(_) => line.push(seg),
            Segment::LineBreak => {
                flush_line(ui, &mut line, base_color, inline_code_bg);
            }
            Segment::Heading { level, text } => {
                flush_line(ui, &mut line, base_color, inline_code_bg);
                let (size, space) = match level {
                    HeadingLevel::H2 => (16.0, 6.0),
                    HeadingLevel::H3 => (15.0, 4.0),
                };
                ui.add_space(space);
                ui.label(
                    egui::RichText::new(text)
                        .strong()
                        .size(size)
                        .color(base_color),
                );
            }
            Segment::CodeBlock { language, code } => {
                flush_line(ui, &mut line, base_color, inline_code_bg);
                code_block(ui, language, code);
            }
        }
    }
    flush_line(ui, &mut line, base_color, inline_code_bg);
}

fn flush_line(
    ui: &mut egui::Ui,
    line: &mut Vec<&Segment>,
    base_color: egui::Color32,
    code_bg: egui::Color32,
) {
    if line.is_empty() {
        return;
    }
    ui.horizontal_wrapped(|ui| {
        ui.spacing_mut().item_spacing.x = 0.0;
        for seg in line.iter() {
            match seg {
                Segment::Text(t) => {
                    ui.label(egui::RichText::new(t).size(BASE_SIZE).color(base_color));
                }
                Segment::Bold(t) => {
                    ui.label(
                        egui::RichText::new(t)
                            .size(BASE_SIZE)
                            .strong()
                            .color(base_color),
                    );
                }
                Segment::InlineCode(t) => {
                    egui::Frame::none()
                        .fill(code_bg)
                        .rounding(egui::Rounding::same(3.0))
                        .inner_margin(egui::Margin::symmetric(4.0, 1.0))
                        .show(ui, |ui| {
                            ui.label(
                                egui::RichText::new(t)
                                    .size(BASE_SIZE)
                                    .monospace()
                                    .color(egui::Color32::from_rgb(206, 145, 120)),
                            );
                        });
                }
                _ => {}
            }
        }
    });
    line.clear();
}

fn code_block(ui: &mut egui::Ui, language: &str, code: &str) {
    ui.add_space(4.0);
    egui::Frame::none()
        .fill(CODE_BG)
        .rounding(egui::Rounding::same(6.0))
        .inner_margin(egui::Margin::same(8.0))
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(
                    egui::RichText::new(language)
                        .size(11.0)
                        .color(egui::Color32::from_rgb(150, 150, 160)),
                );
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui
                        .small_button("Copy")
                        .on_hover_text("Copy code")
                        .clicked()
                    {
                        ui.output_mut(|o| o.copied_text = code.to_string());
                    }
                });
            });
            ui.add_space(2.0);
            ui.label(highlighted_job(code, language));
        });
    ui.add_space(4.0);
}

fn highlighted_job(code: &str, language: &str) -> LayoutJob {
    let mut job = LayoutJob::default();
    let lines = markdown::highlight(code, language);
    let last = lines.len().saturating_sub(1);
    for (i, line) in lines.iter().enumerate() {
        for token in line {
            job.append(&token.text, 0.0, code_format(token_color(token.kind)));
        }
        if i < last {
            job.append("\n", 0.0, code_format(token_color(TokenKind::Plain)));
        }
    }
    job
}

fn code_format(color: egui::Color32) -> egui::TextFormat {
    egui::TextFormat {
        font_id: egui::FontId::monospace(CODE_SIZE),
        color,
        ..Default::default()
    }
}

fn token_color(kind: TokenKind) -> egui::Color32 {
    match kind {
        TokenKind::Comment => egui::Color32::from_rgb(106, 153, 85),
        TokenKind::String => egui::Color32::from_rgb(206, 145, 120),
        TokenKind::Keyword => egui::Color32::from_rgb(86, 156, 214),
        TokenKind::Builtin => egui::Color32::from_rgb(220, 220, 170),
        TokenKind::Number => egui::Color32::from_rgb(181, 206, 168),
        TokenKind::Bracket => egui::Color32::from_rgb(255, 215, 0),
        TokenKind::Identifier => egui::Color32::from_rgb(156, 220, 254),
        TokenKind::Operator | TokenKind::Plain => egui::Color32::from_rgb(212, 212, 212),
    }
}
