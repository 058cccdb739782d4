use serde::{Deserialize, Serialize};
use egui::Color32;
use std::collections::HashMap;

use crate::engine::llm_client::LlmSettings;
use crate::engine::session::SessionConfig;

pub const SPEAKERS: [&str; 5] = ["User", "Narrator", "Hint", "Failed", "System"];

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    pub ui_scale: f32,

    // Speaker → color mapping
    pub speaker_colors: HashMap<String, [u8; 4]>,

    pub session: SessionConfig,
    pub llm: LlmSettings,
}

impl Default for AppSettings {
    fn default() -> Self {
        let mut speaker_colors = HashMap::new();

        speaker_colors.insert("User".into(), [40, 70, 120, 255]);
        speaker_colors.insert("Narrator".into(), [40, 90, 60, 255]);
        speaker_colors.insert("Hint".into(), [110, 90, 30, 255]);
        speaker_colors.insert("Failed".into(), [110, 45, 45, 255]);
        speaker_colors.insert("System".into(), [80, 80, 80, 255]);

        Self {
            ui_scale: 1.0,
            speaker_colors,
            session: SessionConfig::default(),
            llm: LlmSettings::default(),
        }
    }
}

impl AppSettings {
    pub fn color(&self, key: &str) -> Color32 {
        self.speaker_colors
            .get(key)
            .map(|c| Color32::from_rgba_unmultiplied(c[0], c[1], c[2], c[3]))
            .unwrap_or(Color32::DARK_GRAY)
    }

    pub fn set_color(&mut self, key: &str, color: Color32) {
        self.speaker_colors.insert(
            key.to_string(),
            [color.r(), color.g(), color.b(), color.a()],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_speaker_has_a_color() {
        let settings = AppSettings::default();
        for speaker in SPEAKERS {
            assert!(settings.speaker_colors.contains_key(speaker), "{}", speaker);
        }
    }

    #[test]
    fn colors_round_trip() {
        let mut settings = AppSettings::default();
        settings.set_color("Hint", Color32::from_rgb(1, 2, 3));
        assert_eq!(settings.color("Hint"), Color32::from_rgb(1, 2, 3));
        assert_eq!(settings.color("Nobody"), Color32::DARK_GRAY);
    }

    #[test]
    fn partial_files_fill_in_defaults() {
        let settings: AppSettings =
            serde_json::from_str(r#"{ "ui_scale": 1.5, "llm": { "model": "qwen" } }"#).unwrap();
        assert_eq!(settings.ui_scale, 1.5);
        assert_eq!(settings.llm.model, "qwen");
        assert_eq!(settings.llm.endpoint, LlmSettings::default().endpoint);
        assert_eq!(settings.session, SessionConfig::default());
    }
}
