pub mod action;
pub mod action_result;
pub mod game_state;
pub mod llm_decode;
pub mod message;
