use serde_json::{json, Map, Value};

use crate::engine::scenario::{Scenario, ToolSpec};
use crate::model::action::{ActionKind, DoorId};
use crate::model::action_result::ToolResponse;
use crate::model::llm_decode::ToolCall;

/// Which second-pass prompt turns a factual result into prose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrationStyle {
    Story,
    MultipleActions,
    Hint,
}

impl NarrationStyle {
    pub fn for_call(call: &ToolCall) -> Self {
        match call.kind() {
            Some(ActionKind::GiveHint) => NarrationStyle::Hint,
            Some(ActionKind::MultipleActions) => NarrationStyle::MultipleActions,
            _ => NarrationStyle::Story,
        }
    }
}

/// Formats prompts and tool schemas. Only text and JSON, no I/O.
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn tool_selector() -> String {
        let mut prompt = String::new();
        push_selector_rules(&mut prompt);
        prompt
    }

    pub fn narration_system(style: NarrationStyle) -> String {
        let mut prompt = String::new();
        match style {
            NarrationStyle::Story => push_storyteller_rules(&mut prompt),
            NarrationStyle::MultipleActions => push_multiple_actions_rules(&mut prompt),
            NarrationStyle::Hint => push_hint_rules(&mut prompt),
        }
        prompt
    }

    /// The user turn of the narration request.
    pub fn narration_request(
        style: NarrationStyle,
        player_input: &str,
        call: &ToolCall,
        response: &ToolResponse,
    ) -> String {
        let mut prompt = String::new();

        prompt.push_str(&format!("Player tried: {}\n", player_input.trim()));
        if style == NarrationStyle::MultipleActions {
            let primary = call
                .arguments
                .get("primary_action")
                .and_then(Value::as_str)
                .unwrap_or("unknown action");
            prompt.push_str(&format!("Primary action taken: {}\n", primary));
        }
        prompt.push_str(&format!("Game result: {}\n", response.message));
        prompt.push_str(&format!("Success: {}\n\n", response.success));

        prompt.push_str(match style {
            NarrationStyle::Story => "Make this response more engaging and atmospheric:",
            NarrationStyle::MultipleActions => {
                "Explain that we can only do one thing at a time, mention what we did first, and present the result:"
            }
            NarrationStyle::Hint => "Make this hint more encouraging and direct:",
        });
        prompt.push('\n');

        prompt
    }

    /// Chat-completions `tools` array for everything the scenario offers.
    pub fn tool_definitions(scenario: &Scenario) -> Vec<Value> {
        scenario
            .tools
            .iter()
            .map(|tool| tool_definition(scenario, tool))
            .collect()
    }
}

fn tool_definition(scenario: &Scenario, tool: &ToolSpec) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    match tool.kind {
        ActionKind::LookBehindDoor => {
            properties.insert(
                "door_id".into(),
                json!({
                    "type": "string",
                    "enum": DoorId::ALL.map(|d| d.to_string()),
                    "description": "Which door to look behind."
                }),
            );
            required.push("door_id");
        }
        ActionKind::EnterCode => {
            properties.insert(
                "code".into(),
                json!({
                    "type": "string",
                    "pattern": "^[0-9]{4}$",
                    "description": "The 4-digit code to enter."
                }),
            );
            required.push("code");
        }
        ActionKind::ImpossibleAction => {
            properties.insert(
                "action".into(),
                json!({
                    "type": "string",
                    "description": "The player's original phrase."
                }),
            );
            required.push("action");
        }
        ActionKind::MultipleActions => {
            let playable: Vec<&str> = scenario
                .tools
                .iter()
                .filter(|t| !t.kind.is_builtin())
                .map(|t| t.kind.name())
                .collect();
            properties.insert(
                "primary_action".into(),
                json!({
                    "type": "string",
                    "enum": playable,
                    "description": "The first action to execute."
                }),
            );
            required.push("primary_action");
        }
        _ => {}
    }

    json!({
        "type": "function",
        "function": {
            "name": tool.kind.name(),
            "description": tool.description,
            "parameters": {
                "type": "object",
                "properties": properties,
                "required": required,
            }
        }
    })
}

/* =========================
   System prompts
   ========================= */

fn push_selector_rules(prompt: &mut String) {
    prompt.push_str(
        "You are a tool selector for an escape room game. Your only job is to pick which tool to call based on the user's input.\n\n\
Pick the most appropriate tool from the available list. Call exactly ONE tool - never explain or suggest, just pick and call.\n\n\
If the user query corresponds to a single action, call that action.\n\
If the user query corresponds to wanting a hint, call the give_hint tool.\n\
If the user query corresponds to wanting to do multiple actions at once, call the multiple_actions tool.\n\
If the query is not a valid action, call the impossible_action tool.\n",
    );
}

fn push_storyteller_rules(prompt: &mut String) {
    prompt.push_str(
        "You are a creative narrator for an escape room game. You will receive:\n\
1. What the player tried to do\n\
2. The factual result from the game\n\n\
Your job: Rewrite the factual result to be more engaging and atmospheric while keeping all the same information.\n\n\
RULES:\n\
- Keep all factual information exactly the same\n\
- Don't add new game mechanics, items, or rooms\n\
- Don't hint at solutions the player hasn't discovered\n\
- Make it more immersive and story-like\n\
- Keep the same success/failure outcome\n\
- MAXIMUM 2 sentences and under 40 words\n\
- Use vivid but appropriate language\n\n\
Transform dry responses into engaging narrative while preserving all facts.\n",
    );
}

fn push_multiple_actions_rules(prompt: &mut String) {
    prompt.push_str(
        "You are handling a situation where a player tried to do multiple things at once in an escape room game. You will receive:\n\
1. What the player originally tried to do\n\
2. The result from executing just ONE of those actions\n\n\
Your job: Explain that we can only do one thing at a time, mention what we did, and present the result engagingly.\n\n\
RULES:\n\
- Start with something like \"It seems you tried to do multiple things at once. Let's go one step at a time\"\n\
- Clearly state what action you took first\n\
- Then give the engaging result of that action\n\
- Keep it under 40 words total\n\
- Use a helpful, guiding tone\n\n\
Example: \"Let's go one step at a time. For now, I opened the door. Your heart sinks as thick metal bars block your escape!\"\n",
    );
}

fn push_hint_rules(prompt: &mut String) {
    prompt.push_str(
        "You are a helpful assistant providing hints for an escape room game. You will receive a hint from the game.\n\n\
Your job: Make the hint clear, direct, and encouraging while keeping it brief.\n\n\
RULES:\n\
- Keep the exact same hint information\n\
- Use a warm, encouraging tone\n\
- Be straightforward - no dramatic storytelling\n\
- Start with something like \"Everyone gets stuck sometimes\" or \"Here's a hint to help you progress\"\n\
- Keep it under 30 words\n\
- Don't add new information, just make the delivery friendlier\n\n\
Make hints feel supportive and clear, not flowery or dramatic.\n",
    );
}
