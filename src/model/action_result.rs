use serde::{Deserialize, Serialize};

use crate::model::game_state::GameState;

/// Result of applying one action to a game state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub succeeded: bool,
    /// Plain description of what happened, before any narration.
    pub fact: String,
    /// State after the action. Unchanged on failures and no-ops.
    pub state: GameState,
    pub won: bool,
    /// The action mutated state.
    pub changed: bool,
    /// Produced by the scenario's winning rule.
    pub terminal: bool,
}

impl ActionOutcome {
    pub fn unchanged(state: GameState, succeeded: bool, fact: impl Into<String>) -> Self {
        let won = state.won;
        Self {
            succeeded,
            fact: fact.into(),
            state,
            won,
            changed: false,
            terminal: false,
        }
    }
}

/// What a caller gets back for one tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub success: bool,
    pub message: String,

    /// Base64 PNG of the room.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<GameState>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub won: Option<bool>,
}
