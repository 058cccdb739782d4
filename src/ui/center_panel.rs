use eframe::egui;

use crate::engine::protocol::EngineCommand;
use super::app::EscapeApp;

pub fn draw_center_panel(ctx: &egui::Context, app: &mut EscapeApp) {
    let input_id = egui::Id::new("chat_input_box");

    // ---------- Input bar ----------
    egui::TopBottomPanel::bottom("chat_input").show(ctx, |ui| {
        let mut send_now = false;

        ui.horizontal(|ui| {
            let response = ui.add_enabled(
                !app.ui.waiting,
                egui::TextEdit::singleline(&mut app.ui.input_text)
                    .id(input_id)
                    .hint_text("What do you do?")
                    .desired_width(ui.available_width() - 60.0),
            );

            if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                send_now = true;
            }

            if ui.add_enabled(!app.ui.waiting, egui::Button::new("Send")).clicked() {
                send_now = true;
            }

            if app.ui.waiting {
                ui.spinner();
            }
        });

        if send_now {
            let text = app.ui.input_text.trim().to_string();

            if !text.is_empty() {
                app.ui.waiting = true;
                app.send_command(EngineCommand::PlayerInput(text));
                app.ui.input_text.clear();
            }

            // Keep cursor focused
            ui.memory_mut(|m| m.request_focus(input_id));
        }
    });

    // ---------- Chat history ----------
    egui::CentralPanel::default().show(ctx, |ui| {
        egui::ScrollArea::vertical()
            .stick_to_bottom(app.ui.should_auto_scroll)
            .show(ui, |ui| {
                for msg in &app.ui.rendered_messages {
                    app.draw_message(ui, msg);
                }
            });
    });
}
