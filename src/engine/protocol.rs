use crate::engine::llm_client::LlmSettings;
use crate::engine::scenario::ScenarioId;
use crate::engine::session::SessionConfig;
use crate::model::game_state::GameState;
use crate::model::message::Message;

pub enum EngineCommand {
    PlayerInput(String),
    /// Start over in the same scenario.
    Restart,
    /// Replace the session and model settings. Restarts the game.
    Configure {
        session: SessionConfig,
        llm: LlmSettings,
    },
    TestConnection(LlmSettings),
}

/// What the room panel shows after a turn.
#[derive(Debug, Clone)]
pub struct RoomView {
    pub scenario: ScenarioId,
    /// Base64 PNG.
    pub image: Option<String>,
    pub state: GameState,
}

pub enum EngineResponse {
    Turn {
        messages: Vec<Message>,
        room: RoomView,
    },
    ConnectionStatus(String),
}
