use serde_json::json;
use std::sync::mpsc::{Receiver, Sender};

use crate::engine::llm_client::{test_connection, LanguageModel, LlmClient, LlmSettings};
use crate::engine::prompt_builder::{NarrationStyle, PromptBuilder};
use crate::engine::protocol::{EngineCommand, EngineResponse, RoomView};
use crate::engine::session::{Session, SessionConfig};
use crate::model::action::ActionKind;
use crate::model::action_result::ToolResponse;
use crate::model::llm_decode::ToolCall;
use crate::model::message::{Message, Speaker};

/// One player turn after both model passes.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub call: ToolCall,
    pub response: ToolResponse,
    pub narration: String,
}

/// Select a tool for `input`, run it, and narrate the result.
///
/// Model failures never abort a turn: selection falls back to
/// `impossible_action` and narration falls back to the plain fact.
pub fn play_turn(
    session: &mut Session,
    model: &dyn LanguageModel,
    narrate: bool,
    input: &str,
) -> TurnOutcome {
    let tools = PromptBuilder::tool_definitions(session.scenario());
    let call = match model.select_tool(&PromptBuilder::tool_selector(), &tools, input) {
        Ok(call) => call,
        Err(e) => {
            log::warn!("Tool selection failed: {}", e);
            ToolCall::impossible(input)
        }
    };

    let response = session.invoke_call(&call);

    let narration = if narrate {
        narrate_result(model, input, &call, &response)
    } else {
        response.message.clone()
    };

    TurnOutcome {
        call,
        response,
        narration,
    }
}

fn narrate_result(
    model: &dyn LanguageModel,
    input: &str,
    call: &ToolCall,
    response: &ToolResponse,
) -> String {
    let style = NarrationStyle::for_call(call);
    let system = PromptBuilder::narration_system(style);
    let request = PromptBuilder::narration_request(style, input, call, response);

    match model.narrate(&system, &request) {
        Ok(text) if !text.is_empty() => text,
        Ok(_) => response.message.clone(),
        Err(e) => {
            log::warn!("Narration failed: {}", e);
            response.message.clone()
        }
    }
}

/// What the model picked and what the game answered, before narration.
fn debug_summary(turn: &TurnOutcome) -> String {
    format!(
        "[debug] tool: {} {}\n[debug] result (success: {}): {}",
        turn.call.name, turn.call.arguments, turn.response.success, turn.response.message
    )
}

pub struct Engine {
    rx: Receiver<EngineCommand>,
    tx: Sender<EngineResponse>,
    messages: Vec<Message>,
    config: SessionConfig,
    llm: LlmSettings,
    session: Session,
    model: Box<dyn LanguageModel>,
    image: Option<String>,
}

impl Engine {
    pub fn new(
        rx: Receiver<EngineCommand>,
        tx: Sender<EngineResponse>,
        config: SessionConfig,
        llm: LlmSettings,
    ) -> Self {
        let session = Session::new(&config);
        let model = Box::new(LlmClient::new(llm.clone()));
        Self::with_parts(rx, tx, config, llm, session, model)
    }

    pub fn with_parts(
        rx: Receiver<EngineCommand>,
        tx: Sender<EngineResponse>,
        config: SessionConfig,
        llm: LlmSettings,
        session: Session,
        model: Box<dyn LanguageModel>,
    ) -> Self {
        Self {
            rx,
            tx,
            messages: Vec::new(),
            config,
            llm,
            session,
            model,
            image: None,
        }
    }

    pub fn run(&mut self) {
        self.start();

        while let Ok(cmd) = self.rx.recv() {
            match cmd {
                EngineCommand::PlayerInput(text) => self.player_turn(&text),

                EngineCommand::Restart => {
                    self.session.restart();
                    self.start();
                }

                EngineCommand::Configure { session, llm } => {
                    log::info!("Applying settings: {:?}, model {}", session.scenario, llm.model);
                    self.session.configure(&session);
                    self.model = Box::new(LlmClient::new(llm.clone()));
                    self.config = session;
                    self.llm = llm;
                    self.start();
                }

                EngineCommand::TestConnection(llm) => {
                    let status = match test_connection(&llm) {
                        Ok(status) => status,
                        Err(e) => {
                            log::warn!("Connection test failed: {:#}", e);
                            format!("Connection failed: {}", e)
                        }
                    };
                    let _ = self.tx.send(EngineResponse::ConnectionStatus(status));
                }
            }
        }

        log::info!("Engine stopped");
    }

    /// Fresh chat opened with a description of the room.
    fn start(&mut self) {
        self.messages.clear();
        self.messages.push(Message::System(format!(
            "{}: you are trapped. Type what you want to do.",
            self.session.scenario().id
        )));

        let missing = self.session.missing_assets();
        if !missing.is_empty() {
            log::warn!("Missing room images in {}: {}", self.config.assets_dir.display(), missing.join(", "));
            self.messages.push(Message::System(format!(
                "{} room images are missing from {}.",
                missing.len(),
                self.config.assets_dir.display()
            )));
        }

        let response = self.session.invoke(ActionKind::DescribeRoom.name(), &json!({}));
        self.messages.push(Message::Narration {
            speaker: Speaker::Narrator,
            text: response.message,
            failed: false,
        });
        self.image = response.image;
        self.publish();
    }

    fn player_turn(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        self.messages.push(Message::User(text.to_string()));

        let was_won = self.session.state().won;
        let turn = play_turn(&mut self.session, self.model.as_ref(), self.llm.narrate, text);

        if self.llm.debug {
            self.messages.push(Message::System(debug_summary(&turn)));
        }

        let speaker = match turn.call.kind() {
            Some(ActionKind::GiveHint) => Speaker::Hint,
            _ => Speaker::Narrator,
        };
        self.messages.push(Message::Narration {
            speaker,
            text: turn.narration,
            failed: !turn.response.success,
        });

        if !was_won && self.session.state().won {
            log::info!("Player escaped");
            self.messages
                .push(Message::System("You escaped! Restart to play again.".into()));
        }

        self.image = turn.response.image;
        self.publish();
    }

    fn publish(&self) {
        let room = RoomView {
            scenario: self.session.scenario().id,
            image: self.image.clone(),
            state: self.session.state().clone(),
        };
        let _ = self.tx.send(EngineResponse::Turn {
            messages: self.messages.clone(),
            room,
        });
    }
}
