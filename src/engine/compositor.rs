use anyhow::Result;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::engine::scenario::Scenario;
use crate::model::game_state::GameState;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Stacks the room's image layers for a game state.
///
/// Assets are loaded lazily, normalized to the canvas size and kept for the
/// lifetime of the compositor. A missing asset is drawn as nothing.
pub struct RoomCompositor {
    assets: PathBuf,
    canvas: (u32, u32),
    cache: HashMap<String, RgbaImage>,
}

impl RoomCompositor {
    pub fn new(assets: impl Into<PathBuf>, canvas: (u32, u32)) -> Self {
        let assets = assets.into();
        log::info!(
            "Room compositor using {} at {}x{}",
            assets.display(),
            canvas.0,
            canvas.1
        );
        Self {
            assets,
            canvas,
            cache: HashMap::new(),
        }
    }

    pub fn assets_dir(&self) -> &Path {
        &self.assets
    }

    pub fn canvas(&self) -> (u32, u32) {
        self.canvas
    }

    /// Number of assets currently cached.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Asset filenames drawn for `state`, bottom layer first.
    pub fn layers(scenario: &Scenario, state: &GameState) -> Vec<String> {
        let mut names = vec![scenario.base_asset.clone()];

        for region in &scenario.regions {
            match region.pick(state).and_then(|l| l.asset.as_ref()) {
                Some(asset) => names.push(asset.clone()),
                None => log::debug!("{}: nothing to draw", region.name),
            }
        }

        for spec in &scenario.items {
            if state.holds(spec.item) {
                names.push(spec.icon.clone());
            }
        }

        names
    }

    /// Every file the scenario can ask for.
    pub fn required_assets(scenario: &Scenario) -> Vec<String> {
        let mut names = vec![scenario.base_asset.clone()];
        let layers = scenario
            .regions
            .iter()
            .flat_map(|r| r.layers.iter().filter_map(|l| l.asset.clone()));
        let icons = scenario.items.iter().map(|i| i.icon.clone());

        for name in layers.chain(icons) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    pub fn compose(&mut self, scenario: &Scenario, state: &GameState) -> RgbaImage {
        let (width, height) = self.canvas;
        let mut canvas = RgbaImage::from_pixel(width, height, TRANSPARENT);

        for name in Self::layers(scenario, state) {
            if let Some(layer) = self.load(&name) {
                imageops::overlay(&mut canvas, layer, 0, 0);
                log::debug!("Layered {}", name);
            }
        }

        canvas
    }

    /// Compose and encode as base64 PNG. `None` only if encoding fails.
    pub fn render(&mut self, scenario: &Scenario, state: &GameState) -> Option<String> {
        let composed = self.compose(scenario, state);
        match encode_png_base64(&composed) {
            Ok(data) => {
                log::debug!(
                    "Rendered room image ({} chars, {} assets cached)",
                    data.len(),
                    self.cached()
                );
                Some(data)
            }
            Err(e) => {
                log::error!("Failed to encode room image: {:#}", e);
                None
            }
        }
    }

    fn load(&mut self, name: &str) -> Option<&RgbaImage> {
        if !self.cache.contains_key(name) {
            let image = self.read(name)?;
            self.cache.insert(name.to_string(), image);
        }
        self.cache.get(name)
    }

    fn read(&self, name: &str) -> Option<RgbaImage> {
        let path = self.assets.join(name);
        if !path.is_file() {
            log::warn!("Missing asset: {} - using transparent placeholder", path.display());
            return None;
        }

        let image = match image::open(&path) {
            Ok(image) => image.to_rgba8(),
            Err(e) => {
                log::warn!("Unreadable asset {}: {} - using transparent placeholder", path.display(), e);
                return None;
            }
        };

        let (width, height) = self.canvas;
        if image.dimensions() == self.canvas {
            Some(image)
        } else {
            log::warn!(
                "{} is {:?}, resizing to {}x{}",
                name,
                image.dimensions(),
                width,
                height
            );
            Some(imageops::resize(&image, width, height, FilterType::Lanczos3))
        }
    }
}

/// Flatten onto white and encode as base64 PNG.
pub fn encode_png_base64(image: &RgbaImage) -> Result<String> {
    let (width, height) = image.dimensions();
    let mut backing = RgbaImage::from_pixel(width, height, WHITE);
    imageops::overlay(&mut backing, image, 0, 0);
    let rgb = DynamicImage::ImageRgba8(backing).to_rgb8();

    let mut bytes = Vec::new();
    rgb.write_with_encoder(PngEncoder::new_with_quality(
        &mut bytes,
        CompressionType::Best,
        PngFilter::Adaptive,
    ))?;

    Ok(STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::machine::{apply, AutoCollect};
    use crate::model::action::{Action, DoorId};
    use image::Rgb;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const CANVAS: (u32, u32) = (8, 6);

    fn small(scenario: Scenario) -> Scenario {
        Scenario {
            canvas: CANVAS,
            ..scenario
        }
    }

    fn decode(data: &str) -> image::RgbImage {
        let bytes = STANDARD.decode(data).unwrap();
        image::load_from_memory(&bytes).unwrap().to_rgb8()
    }

    fn walk(scenario: &Scenario, actions: &[Action]) -> GameState {
        let mut rng = StdRng::seed_from_u64(1);
        actions.iter().fold(scenario.initial_state(), |state, action| {
            apply(scenario, AutoCollect::Enabled, state, action, &mut rng).state
        })
    }

    #[test]
    fn picks_one_layer_per_region() {
        let scenario = Scenario::behind_bars();
        let start = scenario.initial_state();
        assert_eq!(
            RoomCompositor::layers(&scenario, &start),
            vec!["room_base.png", "door_closed.png", "rug_normal.png", "safe_closed.png"]
        );

        let end = walk(
            &scenario,
            &[Action::LookUnderRug, Action::OpenSafe, Action::OpenDoor, Action::CutBars],
        );
        assert_eq!(
            RoomCompositor::layers(&scenario, &end),
            vec![
                "room_base.png",
                "door_open_bars_cut.png",
                "rug_lifted_empty.png",
                "safe_open_empty.png",
                "inventory_key.png",
                "inventory_bolt_cutter.png",
            ]
        );
    }

    #[test]
    fn hidden_key_layer_only_while_visible() {
        let scenario = Scenario::three_doors();
        let open = walk(&scenario, &[Action::LookBehindDoor { door: DoorId::Two }]);
        assert!(RoomCompositor::layers(&scenario, &open).contains(&"key_behind_door2.png".to_string()));

        let taken = walk(
            &scenario,
            &[Action::LookBehindDoor { door: DoorId::Two }, Action::TakeKey],
        );
        let layers = RoomCompositor::layers(&scenario, &taken);
        assert!(!layers.contains(&"key_behind_door2.png".to_string()));
        assert_eq!(layers.last().map(String::as_str), Some("inventory_key.png"));
    }

    #[test]
    fn missing_assets_render_white() {
        let dir = tempfile::tempdir().unwrap();
        let scenario = small(Scenario::behind_bars());
        let mut compositor = RoomCompositor::new(dir.path(), CANVAS);

        let data = compositor.render(&scenario, &scenario.initial_state()).unwrap();
        let image = decode(&data);
        assert_eq!(image.dimensions(), CANVAS);
        assert!(image.pixels().all(|p| *p == Rgb([255, 255, 255])));
        assert_eq!(compositor.cached(), 0);
    }

    #[test]
    fn layers_stack_in_order_and_are_cached() {
        let dir = tempfile::tempdir().unwrap();
        RgbaImage::from_pixel(CANVAS.0, CANVAS.1, Rgba([200, 0, 0, 255]))
            .save(dir.path().join("room_base.png"))
            .unwrap();
        let mut door = RgbaImage::from_pixel(CANVAS.0, CANVAS.1, TRANSPARENT);
        door.put_pixel(1, 1, Rgba([0, 0, 200, 255]));
        door.save(dir.path().join("door_closed.png")).unwrap();

        let scenario = small(Scenario::behind_bars());
        let mut compositor = RoomCompositor::new(dir.path(), CANVAS);
        let image = decode(&compositor.render(&scenario, &scenario.initial_state()).unwrap());

        assert_eq!(*image.get_pixel(0, 0), Rgb([200, 0, 0]));
        assert_eq!(*image.get_pixel(1, 1), Rgb([0, 0, 200]));
        assert_eq!(compositor.cached(), 2);

        std::fs::remove_file(dir.path().join("room_base.png")).unwrap();
        let again = decode(&compositor.render(&scenario, &scenario.initial_state()).unwrap());
        assert_eq!(*again.get_pixel(0, 0), Rgb([200, 0, 0]), "base came from the cache");
    }

    #[test]
    fn equal_states_encode_identically() {
        let dir = tempfile::tempdir().unwrap();
        let mut icon = RgbaImage::from_pixel(CANVAS.0, CANVAS.1, TRANSPARENT);
        icon.put_pixel(7, 5, Rgba([10, 120, 10, 128]));
        icon.save(dir.path().join("inventory_key.png")).unwrap();

        let scenario = small(Scenario::behind_bars());
        let state = walk(&scenario, &[Action::LookUnderRug, Action::TakeKey]);
        let mut compositor = RoomCompositor::new(dir.path(), CANVAS);

        let first = compositor.render(&scenario, &state).unwrap();
        let second = compositor.render(&scenario, &state.clone()).unwrap();
        assert_eq!(first, second);

        let mut fresh = RoomCompositor::new(dir.path(), CANVAS);
        assert_eq!(fresh.render(&scenario, &state).unwrap(), first);
    }

    #[test]
    fn odd_sized_assets_are_resized() {
        let dir = tempfile::tempdir().unwrap();
        RgbaImage::from_pixel(3, 2, Rgba([0, 90, 0, 255]))
            .save(dir.path().join("room_base.png"))
            .unwrap();

        let scenario = small(Scenario::three_doors());
        let mut compositor = RoomCompositor::new(dir.path(), CANVAS);
        let composed = compositor.compose(&scenario, &scenario.initial_state());
        assert_eq!(composed.dimensions(), CANVAS);
        assert_eq!(composed.get_pixel(4, 3)[3], 255);
    }

    #[test]
    fn undecodable_asset_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("room_base.png"), b"not a png").unwrap();

        let scenario = small(Scenario::behind_bars());
        let mut compositor = RoomCompositor::new(dir.path(), CANVAS);
        assert!(compositor.render(&scenario, &scenario.initial_state()).is_some());
        assert_eq!(compositor.cached(), 0);
    }

    #[test]
    fn required_assets_are_unique() {
        let names = RoomCompositor::required_assets(&Scenario::behind_bars());
        assert_eq!(names.len(), 12);
        let names = RoomCompositor::required_assets(&Scenario::three_doors());
        assert_eq!(names.len(), 12);
    }
}
