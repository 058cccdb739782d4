use eframe::egui;

use crate::engine::protocol::RoomView;
use crate::ui::app::UiState;

pub fn draw_right_panel(
    ctx: &egui::Context,
    ui_state: &UiState,
    texture: Option<&egui::TextureHandle>,
) {
    egui::SidePanel::right("right")
        .resizable(true)
        .default_width(520.0)
        .min_width(320.0)
        .show(ctx, |ui| {
            let Some(room) = &ui_state.room else {
                ui.label("Waiting for the room…");
                return;
            };

            ui.heading(room.scenario.title());
            ui.separator();

            match texture {
                Some(texture) => {
                    ui.add(egui::Image::new(texture).shrink_to_fit());
                }
                None => {
                    ui.label("No room image.");
                }
            }

            if room.state.won {
                ui.add_space(8.0);
                ui.label(
                    egui::RichText::new("You escaped!")
                        .heading()
                        .color(egui::Color32::from_rgb(80, 200, 120)),
                );
            }

            ui.separator();
            egui::ScrollArea::vertical().show(ui, |ui| draw_state(ui, room));
        });
}

/* =========================
   Game state
   ========================= */

fn draw_state(ui: &mut egui::Ui, room: &RoomView) {
    ui.collapsing("Inventory", |ui| {
        let carried = room.state.carried();
        if carried.is_empty() {
            ui.label("Empty hands");
        } else {
            for item in carried {
                ui.label(format!("• {}", item.replace('_', " ")));
            }
        }
    });

    ui.collapsing("Room", |ui| {
        for (flag, set) in &room.state.flags {
            ui.label(format!("{} {}", if *set { "✔" } else { "✘" }, flag));
        }
    });
}
