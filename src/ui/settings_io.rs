use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ui::settings::AppSettings;

fn settings_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("escape_room");
    path.push("settings.json");
    path
}

/// Saved settings, then environment overrides. Falls back to defaults.
pub fn load_settings() -> AppSettings {
    let path = settings_path();
    let mut settings = load_from(&path);
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    log::info!("Settings loaded from {}", path.display());
    settings
}

pub fn load_from(path: &Path) -> AppSettings {
    match fs::read_to_string(path) {
        Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
            log::warn!("Ignoring malformed {}: {}", path.display(), e);
            AppSettings::default()
        }),
        Err(_) => AppSettings::default(),
    }
}

pub fn save_settings(settings: &AppSettings) -> Result<()> {
    save_to(&settings_path(), settings)
}

pub fn save_to(path: &Path, settings: &AppSettings) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

pub fn apply_env_overrides(settings: &mut AppSettings, var: impl Fn(&str) -> Option<String>) {
    let var = |key: &str| var(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = var("ESCAPE_ROOM_LLM_URL") {
        settings.llm.endpoint = url;
    }
    if let Some(model) = var("ESCAPE_ROOM_LLM_MODEL") {
        settings.llm.model = model;
    }
    if let Some(key) = var("ESCAPE_ROOM_API_KEY").or_else(|| var("OPENAI_API_KEY")) {
        settings.llm.api_key = Some(key);
    }
    if let Some(dir) = var("ESCAPE_ROOM_ASSETS") {
        settings.session.assets_dir = PathBuf::from(dir);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::scenario::ScenarioId;
    use std::collections::HashMap;

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut settings = AppSettings::default();
        settings.session.scenario = ScenarioId::ThreeDoors;
        settings.llm.api_key = Some("secret".into());
        save_to(&path, &settings).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(!written.contains("secret"));

        let loaded = load_from(&path);
        assert_eq!(loaded.session.scenario, ScenarioId::ThreeDoors);
        assert_eq!(loaded.llm.api_key, None);
    }

    #[test]
    fn missing_or_broken_files_give_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_from(&dir.path().join("absent.json")), AppSettings::default());

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ not json").unwrap();
        assert_eq!(load_from(&broken), AppSettings::default());
    }

    #[test]
    fn environment_wins_over_file() {
        let env: HashMap<&str, &str> = [
            ("ESCAPE_ROOM_LLM_URL", "https://api.example.com/v1"),
            ("OPENAI_API_KEY", "sk-fallback"),
            ("ESCAPE_ROOM_ASSETS", "/srv/rooms"),
            ("ESCAPE_ROOM_LLM_MODEL", "  "),
        ]
        .into_iter()
        .collect();

        let mut settings = AppSettings::default();
        apply_env_overrides(&mut settings, |k| env.get(k).map(|v| v.to_string()));

        assert_eq!(settings.llm.endpoint, "https://api.example.com/v1");
        assert_eq!(settings.llm.api_key.as_deref(), Some("sk-fallback"));
        assert_eq!(settings.session.assets_dir, PathBuf::from("/srv/rooms"));
        assert_eq!(settings.llm.model, "local-model", "blank values are ignored");
    }

    #[test]
    fn dedicated_key_beats_openai_key() {
        let mut settings = AppSettings::default();
        apply_env_overrides(&mut settings, |k| match k {
            "ESCAPE_ROOM_API_KEY" => Some("sk-room".into()),
            "OPENAI_API_KEY" => Some("sk-openai".into()),
            _ => None,
        });
        assert_eq!(settings.llm.api_key.as_deref(), Some("sk-room"));
    }
}
