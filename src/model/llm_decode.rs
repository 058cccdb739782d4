use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::action::ActionKind;

/// A tool chosen by the model: a name plus its JSON arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    pub arguments: Value,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    /// Catch-all used whenever the model gives us nothing usable.
    pub fn impossible(player_input: &str) -> Self {
        let mut args = Map::new();
        args.insert("action".into(), Value::String(player_input.trim().to_string()));
        Self::new(ActionKind::ImpossibleAction.name(), Value::Object(args))
    }

    pub fn kind(&self) -> Option<ActionKind> {
        ActionKind::from_name(&self.name)
    }
}

/// Decode the raw `arguments` string of a model tool call.
///
/// Empty arguments mean an empty object; anything else must be a JSON object.
pub fn decode_tool_call(name: &str, arguments: &str) -> Result<ToolCall, String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Tool call has no name".to_string());
    }

    if arguments.trim().is_empty() {
        return Ok(ToolCall::new(name, Value::Object(Map::new())));
    }

    let value: Value = serde_json::from_str(arguments)
        .map_err(|e| format!("Invalid tool arguments: {}", e))?;

    let Value::Object(_) = value else {
        return Err("Tool arguments must be a JSON object".to_string());
    };

    Ok(ToolCall::new(name, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_arguments_object() {
        let call = decode_tool_call("look_behind_door", r#"{"door_id":"2"}"#).unwrap();
        assert_eq!(call.kind(), Some(ActionKind::LookBehindDoor));
        assert_eq!(call.arguments, json!({ "door_id": "2" }));
    }

    #[test]
    fn empty_arguments_become_empty_object() {
        let call = decode_tool_call("open_door", "  ").unwrap();
        assert_eq!(call.arguments, json!({}));
    }

    #[test]
    fn rejects_non_object_arguments() {
        assert!(decode_tool_call("enter_code", "[1,2]").is_err());
        assert!(decode_tool_call("enter_code", "{not json").is_err());
        assert!(decode_tool_call("  ", "{}").is_err());
    }

    #[test]
    fn impossible_carries_player_text() {
        let call = ToolCall::impossible("  dance on the ceiling ");
        assert_eq!(call.kind(), Some(ActionKind::ImpossibleAction));
        assert_eq!(call.arguments["action"], "dance on the ceiling");
    }
}
