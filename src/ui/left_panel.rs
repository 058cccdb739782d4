use eframe::egui;

use crate::engine::machine::AutoCollect;
use crate::engine::protocol::EngineCommand;
use crate::engine::scenario::ScenarioId;
use crate::ui::app::EscapeApp;
use crate::ui::settings::{AppSettings, SPEAKERS};

pub fn draw_left_panel(ctx: &egui::Context, app: &mut EscapeApp) {
    egui::SidePanel::left("left")
        .resizable(false)
        .default_width(220.0)
        .show(ctx, |ui| {
            ui.heading("Settings");
            ui.separator();

            egui::ScrollArea::vertical().show(ui, |ui| {
                draw_game_settings(ui, &mut app.ui.draft);
                ui.separator();
                draw_model_settings(ui, app);
                ui.separator();
                draw_appearance(ui, &mut app.ui.draft);
                ui.separator();

                ui.horizontal(|ui| {
                    let dirty = app.ui.draft != app.settings;
                    if ui
                        .add_enabled(dirty, egui::Button::new("Apply & restart"))
                        .clicked()
                    {
                        app.apply_settings();
                    }
                    if ui.button("Restart").clicked() {
                        app.ui.waiting = true;
                        app.send_command(EngineCommand::Restart);
                    }
                });
            });
        });
}

/* =========================
   Game
   ========================= */

fn draw_game_settings(ui: &mut egui::Ui, draft: &mut AppSettings) {
    egui::ComboBox::from_label("Room")
        .selected_text(draft.session.scenario.title())
        .show_ui(ui, |ui| {
            for id in ScenarioId::ALL {
                ui.selectable_value(&mut draft.session.scenario, id, id.title());
            }
        });

    let mut auto = draft.session.auto_collect == AutoCollect::Enabled;
    if ui.checkbox(&mut auto, "Pick up items automatically").changed() {
        draft.session.auto_collect = if auto {
            AutoCollect::Enabled
        } else {
            AutoCollect::Disabled
        };
    }

    ui.label("Room images");
    ui.horizontal(|ui| {
        ui.label(draft.session.assets_dir.display().to_string());
        if ui.small_button("📁").clicked() {
            if let Some(dir) = rfd::FileDialog::new()
                .set_directory(&draft.session.assets_dir)
                .pick_folder()
            {
                draft.session.assets_dir = dir;
            }
        }
    });
}

/* =========================
   Model
   ========================= */

fn draw_model_settings(ui: &mut egui::Ui, app: &mut EscapeApp) {
    let llm = &mut app.ui.draft.llm;

    ui.label("Endpoint");
    ui.text_edit_singleline(&mut llm.endpoint);

    ui.label("Model");
    ui.text_edit_singleline(&mut llm.model);

    ui.horizontal(|ui| {
        ui.label("Temperature");
        ui.add(egui::DragValue::new(&mut llm.temperature).range(0.0..=2.0).speed(0.05));
    });

    ui.checkbox(&mut llm.narrate, "Narrate results");
    ui.checkbox(&mut llm.debug, "Debug mode")
        .on_hover_text("Show the chosen tool, its arguments and the raw result");

    if ui.button("Test connection").clicked() {
        let llm = llm.clone();
        app.ui.connection_status = Some("Testing…".into());
        app.send_command(EngineCommand::TestConnection(llm));
    }
    if let Some(status) = &app.ui.connection_status {
        ui.label(status);
    }
}

/* =========================
   Appearance
   ========================= */

fn draw_appearance(ui: &mut egui::Ui, draft: &mut AppSettings) {
    ui.label("UI Scale");
    ui.add(egui::Slider::new(&mut draft.ui_scale, 0.75..=2.0));

    ui.collapsing("Colors", |ui| {
        for speaker in SPEAKERS {
            ui.horizontal(|ui| {
                let mut color = draft.color(speaker);
                if ui.color_edit_button_srgba(&mut color).changed() {
                    draft.set_color(speaker, color);
                }
                ui.label(speaker);
            });
        }
    });
}
