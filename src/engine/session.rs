use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

use crate::engine::compositor::RoomCompositor;
use crate::engine::machine::{apply, AutoCollect};
use crate::engine::scenario::{Scenario, ScenarioId};
use crate::model::action::{Action, ActionKind};
use crate::model::action_result::{ActionOutcome, ToolResponse};
use crate::model::game_state::GameState;
use crate::model::llm_decode::ToolCall;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub scenario: ScenarioId,
    pub auto_collect: AutoCollect,
    pub assets_dir: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            scenario: ScenarioId::default(),
            auto_collect: AutoCollect::default(),
            assets_dir: PathBuf::from("assets"),
        }
    }
}

/// One player's game: the state, the rules it runs under and the renderer.
pub struct Session {
    scenario: Scenario,
    policy: AutoCollect,
    state: GameState,
    compositor: RoomCompositor,
    rng: StdRng,
}

impl Session {
    pub fn new(config: &SessionConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn with_rng(config: &SessionConfig, rng: StdRng) -> Self {
        let scenario = config.scenario.load();
        let compositor = RoomCompositor::new(&config.assets_dir, scenario.canvas);
        Self::from_parts(scenario, config.auto_collect, compositor, rng)
    }

    pub fn from_parts(
        scenario: Scenario,
        policy: AutoCollect,
        compositor: RoomCompositor,
        rng: StdRng,
    ) -> Self {
        log::info!("New {} session (auto-collect: {:?})", scenario.id, policy);
        log::info!(
            "Room images: {}",
            RoomCompositor::required_assets(&scenario).join(", ")
        );
        Self {
            state: scenario.initial_state(),
            scenario,
            policy,
            compositor,
            rng,
        }
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Back to the initial state. Cached assets are kept.
    pub fn restart(&mut self) {
        log::info!("Restarting {}", self.scenario.id);
        self.state = self.scenario.initial_state();
    }

    /// Switch to new settings and start over.
    ///
    /// The compositor, and with it the asset cache, survives when the asset
    /// folder and canvas size stay the same.
    pub fn configure(&mut self, config: &SessionConfig) {
        self.switch_to(config.scenario.load(), config);
    }

    fn switch_to(&mut self, scenario: Scenario, config: &SessionConfig) {
        let same_assets = self.compositor.assets_dir() == config.assets_dir.as_path()
            && self.compositor.canvas() == scenario.canvas;
        if same_assets {
            log::info!("Keeping {} cached room images", self.compositor.cached());
        } else {
            self.compositor = RoomCompositor::new(&config.assets_dir, scenario.canvas);
        }

        log::info!("Switching to {} (auto-collect: {:?})", scenario.id, config.auto_collect);
        self.state = scenario.initial_state();
        self.scenario = scenario;
        self.policy = config.auto_collect;
    }

    /// Assets the scenario can draw that are not in the asset folder.
    pub fn missing_assets(&self) -> Vec<String> {
        let dir = self.compositor.assets_dir();
        RoomCompositor::required_assets(&self.scenario)
            .into_iter()
            .filter(|name| !dir.join(name).is_file())
            .collect()
    }

    pub fn invoke_call(&mut self, call: &ToolCall) -> ToolResponse {
        self.invoke(&call.name, &call.arguments)
    }

    /// Run one named action with its JSON arguments and render the result.
    pub fn invoke(&mut self, name: &str, args: &Value) -> ToolResponse {
        log::info!("Tool call: {} {}", name, args);

        let (kind, outcome) = match Action::from_call(name, args) {
            Ok(action) => {
                let outcome = apply(
                    &self.scenario,
                    self.policy,
                    self.state.clone(),
                    &action,
                    &mut self.rng,
                );
                (Some(action.kind()), outcome)
            }
            Err(e) => {
                log::info!("Rejected {}: {}", name, e);
                (None, ActionOutcome::unchanged(self.state.clone(), false, e.to_string()))
            }
        };

        self.respond(kind, outcome)
    }

    fn respond(&mut self, kind: Option<ActionKind>, outcome: ActionOutcome) -> ToolResponse {
        let ActionOutcome {
            succeeded,
            fact,
            state,
            won,
            changed,
            terminal,
        } = outcome;
        self.state = state;
        for problem in self.scenario.invariant_violations(&self.state) {
            log::error!("Inconsistent state after {:?}: {}", kind, problem);
        }

        let dump = changed
            || matches!(kind, Some(ActionKind::DescribeRoom | ActionKind::ResetGame));
        let report_win =
            won && ((terminal && succeeded) || kind == Some(ActionKind::DescribeRoom));

        ToolResponse {
            success: succeeded,
            message: fact,
            image: self.compositor.render(&self.scenario, &self.state),
            state: dump.then(|| self.state.clone()),
            won: report_win.then_some(true),
        }
    }
}
