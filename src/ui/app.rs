use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use eframe::egui;
use egui::Layout;
use std::sync::mpsc;
use std::time::Duration;

use crate::engine::engine::Engine;
use crate::engine::protocol::{EngineCommand, EngineResponse, RoomView};
use crate::model::message::{Message, Speaker};
use crate::ui::center_panel::draw_center_panel;
use crate::ui::left_panel::draw_left_panel;
use crate::ui::right_panel::draw_right_panel;
use crate::ui::settings::AppSettings;

/* =========================
   UI State
   ========================= */

#[derive(Default)]
pub struct UiState {
    pub input_text: String,
    pub rendered_messages: Vec<Message>,
    pub room: Option<RoomView>,
    pub should_auto_scroll: bool,

    /// A turn is in flight on the engine thread.
    pub waiting: bool,
    pub connection_status: Option<String>,

    /// Edited in the settings panel, applied on demand.
    pub draft: AppSettings,
}

/* =========================
   App
   ========================= */

pub struct EscapeApp {
    pub ui: UiState,
    pub settings: AppSettings,
    pub room_texture: Option<egui::TextureHandle>,

    cmd_tx: mpsc::Sender<EngineCommand>,
    resp_rx: mpsc::Receiver<EngineResponse>,
}

impl EscapeApp {
    pub fn new(settings: AppSettings) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();

        let session = settings.session.clone();
        let llm = settings.llm.clone();
        std::thread::spawn(move || {
            let mut engine = Engine::new(cmd_rx, resp_tx, session, llm);
            engine.run();
        });

        Self {
            ui: UiState {
                draft: settings.clone(),
                ..Default::default()
            },
            settings,
            room_texture: None,
            cmd_tx,
            resp_rx,
        }
    }

    pub fn send_command(&self, cmd: EngineCommand) {
        if self.cmd_tx.send(cmd).is_err() {
            log::error!("Engine thread is gone");
        }
    }

    /// Make the draft settings current and restart the game with them.
    pub fn apply_settings(&mut self) {
        self.settings = self.ui.draft.clone();
        if let Err(e) = crate::ui::settings_io::save_settings(&self.settings) {
            log::error!("Could not save settings: {:#}", e);
        }
        self.ui.waiting = true;
        self.send_command(EngineCommand::Configure {
            session: self.settings.session.clone(),
            llm: self.settings.llm.clone(),
        });
    }

    pub fn draw_message(&self, ui: &mut egui::Ui, msg: &Message) {
        let (key, right, text) = match msg {
            Message::User(t) => ("User", true, t.clone()),
            Message::Narration {
                speaker,
                text,
                failed,
            } => {
                let key = match (speaker, failed) {
                    (Speaker::Hint, _) => "Hint",
                    (Speaker::Narrator, true) => "Failed",
                    (Speaker::Narrator, false) => "Narrator",
                };
                (key, false, text.clone())
            }
            Message::System(t) => ("System", false, t.clone()),
        };
        let bg = self.ui.draft.color(key);

        ui.add_space(6.0);

        if right {
            ui.with_layout(Layout::right_to_left(egui::Align::TOP), |ui| {
                bubble(ui, bg, &text);
            });
        } else {
            bubble(ui, bg, &text);
        }
    }

    fn handle_response(&mut self, ctx: &egui::Context, resp: EngineResponse) {
        match resp {
            EngineResponse::Turn { messages, room } => {
                self.ui.rendered_messages = messages;
                self.ui.should_auto_scroll = true;
                self.ui.waiting = false;

                self.room_texture = match room.image.as_deref().map(decode_room_image) {
                    Some(Ok(image)) => Some(ctx.load_texture("room", image, egui::TextureOptions::LINEAR)),
                    Some(Err(e)) => {
                        log::warn!("Could not show room image: {:#}", e);
                        None
                    }
                    None => None,
                };
                self.ui.room = Some(room);
            }
            EngineResponse::ConnectionStatus(status) => {
                self.ui.connection_status = Some(status);
            }
        }
    }
}

/// Base64 PNG into pixels egui can upload.
pub fn decode_room_image(data: &str) -> Result<egui::ColorImage> {
    let bytes = STANDARD.decode(data).context("room image is not base64")?;
    let image = image::load_from_memory(&bytes)
        .context("room image is not a readable PNG")?
        .to_rgba8();
    let (w, h) = image.dimensions();
    Ok(egui::ColorImage::from_rgba_unmultiplied(
        [w as usize, h as usize],
        image.as_raw(),
    ))
}

/* =========================
   egui App
   ========================= */

impl eframe::App for EscapeApp {
    fn update(&mut self, ctx: &egui::Context, _: &mut eframe::Frame) {
        ctx.set_pixels_per_point(self.ui.draft.ui_scale);

        while let Ok(resp) = self.resp_rx.try_recv() {
            self.handle_response(ctx, resp);
        }

        draw_left_panel(ctx, self);
        draw_right_panel(ctx, &self.ui, self.room_texture.as_ref());
        draw_center_panel(ctx, self);

        self.ui.should_auto_scroll = false;

        // Engine replies arrive on another thread.
        ctx.request_repaint_after(Duration::from_millis(100));
    }
}

/* =========================
   UI Helpers
   ========================= */

pub fn bubble(ui: &mut egui::Ui, color: egui::Color32, text: &str) {
    egui::Frame::new()
        .fill(color)
        .corner_radius(8)
        .inner_margin(egui::Margin::symmetric(10, 6))
        .show(ui, |ui| {
            ui.label(egui::RichText::new(text).color(egui::Color32::WHITE));
        });
}
