use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::model::game_state::Flag;

/// Why a tool call could not be turned into an action.
///
/// These are reported to the player as failed actions, never as hard errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("There is no action called '{0}'.")]
    UnknownAction(String),

    #[error("You can't {0} in this room.")]
    Unavailable(String),

    #[error("Missing '{0}' for this action.")]
    MissingArgument(&'static str),

    #[error("Invalid door number '{0}'. Must be 1, 2, or 3.")]
    InvalidDoor(String),

    #[error("'{0}' is not a 4-digit code.")]
    MalformedCode(String),
}

/// The closed set of action names a caller may invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    DescribeRoom,
    OpenDoor,
    LookBehindDoor,
    LookUnderRug,
    TakeKey,
    TakeBoltCutter,
    OpenSafe,
    UseKeyOnSafe,
    EnterCode,
    CutBars,
    UseKeyOnDoor,
    UseBoltCutterOnDoor,
    GiveHint,
    ResetGame,
    ImpossibleAction,
    MultipleActions,
}

impl ActionKind {
    pub const ALL: [ActionKind; 16] = [
        ActionKind::DescribeRoom,
        ActionKind::OpenDoor,
        ActionKind::LookBehindDoor,
        ActionKind::LookUnderRug,
        ActionKind::TakeKey,
        ActionKind::TakeBoltCutter,
        ActionKind::OpenSafe,
        ActionKind::UseKeyOnSafe,
        ActionKind::EnterCode,
        ActionKind::CutBars,
        ActionKind::UseKeyOnDoor,
        ActionKind::UseBoltCutterOnDoor,
        ActionKind::GiveHint,
        ActionKind::ResetGame,
        ActionKind::ImpossibleAction,
        ActionKind::MultipleActions,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ActionKind::DescribeRoom => "describe_room",
            ActionKind::OpenDoor => "open_door",
            ActionKind::LookBehindDoor => "look_behind_door",
            ActionKind::LookUnderRug => "look_under_rug",
            ActionKind::TakeKey => "take_key",
            ActionKind::TakeBoltCutter => "take_bolt_cutter",
            ActionKind::OpenSafe => "open_safe",
            ActionKind::UseKeyOnSafe => "use_key_on_safe",
            ActionKind::EnterCode => "enter_code",
            ActionKind::CutBars => "cut_bars",
            ActionKind::UseKeyOnDoor => "use_key_on_door",
            ActionKind::UseBoltCutterOnDoor => "use_bolt_cutter_on_door",
            ActionKind::GiveHint => "give_hint",
            ActionKind::ResetGame => "reset_game",
            ActionKind::ImpossibleAction => "impossible_action",
            ActionKind::MultipleActions => "multiple_actions",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Handled by the machine itself rather than by a scenario rule.
    pub fn is_builtin(self) -> bool {
        matches!(
            self,
            ActionKind::DescribeRoom
                | ActionKind::GiveHint
                | ActionKind::ResetGame
                | ActionKind::ImpossibleAction
                | ActionKind::MultipleActions
        )
    }

    /// Needs arguments beyond its name.
    pub fn takes_arguments(self) -> bool {
        matches!(
            self,
            ActionKind::LookBehindDoor
                | ActionKind::EnterCode
                | ActionKind::ImpossibleAction
                | ActionKind::MultipleActions
        )
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DoorId {
    One,
    Two,
    Three,
}

impl DoorId {
    pub const ALL: [DoorId; 3] = [DoorId::One, DoorId::Two, DoorId::Three];

    pub fn parse(raw: &str) -> Result<Self, ActionError> {
        match raw.trim() {
            "1" => Ok(DoorId::One),
            "2" => Ok(DoorId::Two),
            "3" => Ok(DoorId::Three),
            other => Err(ActionError::InvalidDoor(other.to_string())),
        }
    }

    pub fn number(self) -> u8 {
        match self {
            DoorId::One => 1,
            DoorId::Two => 2,
            DoorId::Three => 3,
        }
    }

    pub fn opened_flag(self) -> Flag {
        match self {
            DoorId::One => Flag::Door1Opened,
            DoorId::Two => Flag::Door2Opened,
            DoorId::Three => Flag::Door3Opened,
        }
    }
}

impl fmt::Display for DoorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Exactly four ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SafeCode(String);

impl SafeCode {
    pub fn parse(raw: &str) -> Result<Self, ActionError> {
        let code = raw.trim();
        if code.len() == 4 && code.bytes().all(|b| b.is_ascii_digit()) {
            Ok(SafeCode(code.to_string()))
        } else {
            Err(ActionError::MalformedCode(code.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SafeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One validated action with its typed payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    DescribeRoom,
    OpenDoor,
    LookBehindDoor { door: DoorId },
    LookUnderRug,
    TakeKey,
    TakeBoltCutter,
    OpenSafe,
    UseKeyOnSafe,
    EnterCode { code: SafeCode },
    CutBars,
    UseKeyOnDoor,
    UseBoltCutterOnDoor,
    GiveHint,
    ResetGame,
    Impossible { action: String },
    Multiple { primary: String },
}

const DEFAULT_IMPOSSIBLE: &str = "do something impossible";

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::DescribeRoom => ActionKind::DescribeRoom,
            Action::OpenDoor => ActionKind::OpenDoor,
            Action::LookBehindDoor { .. } => ActionKind::LookBehindDoor,
            Action::LookUnderRug => ActionKind::LookUnderRug,
            Action::TakeKey => ActionKind::TakeKey,
            Action::TakeBoltCutter => ActionKind::TakeBoltCutter,
            Action::OpenSafe => ActionKind::OpenSafe,
            Action::UseKeyOnSafe => ActionKind::UseKeyOnSafe,
            Action::EnterCode { .. } => ActionKind::EnterCode,
            Action::CutBars => ActionKind::CutBars,
            Action::UseKeyOnDoor => ActionKind::UseKeyOnDoor,
            Action::UseBoltCutterOnDoor => ActionKind::UseBoltCutterOnDoor,
            Action::GiveHint => ActionKind::GiveHint,
            Action::ResetGame => ActionKind::ResetGame,
            Action::Impossible { .. } => ActionKind::ImpossibleAction,
            Action::Multiple { .. } => ActionKind::MultipleActions,
        }
    }

    /// Door targeted by this action, if any.
    pub fn door(&self) -> Option<DoorId> {
        match self {
            Action::LookBehindDoor { door } => Some(*door),
            _ => None,
        }
    }

    /// Build an action from a tool name and its JSON argument object.
    pub fn from_call(name: &str, args: &Value) -> Result<Self, ActionError> {
        let kind = ActionKind::from_name(name)
            .ok_or_else(|| ActionError::UnknownAction(name.trim().to_string()))?;

        Ok(match kind {
            ActionKind::DescribeRoom => Action::DescribeRoom,
            ActionKind::OpenDoor => Action::OpenDoor,
            ActionKind::LookBehindDoor => {
                let raw = argument(args, "door_id").ok_or(ActionError::MissingArgument("door_id"))?;
                Action::LookBehindDoor {
                    door: DoorId::parse(&raw)?,
                }
            }
            ActionKind::LookUnderRug => Action::LookUnderRug,
            ActionKind::TakeKey => Action::TakeKey,
            ActionKind::TakeBoltCutter => Action::TakeBoltCutter,
            ActionKind::OpenSafe => Action::OpenSafe,
            ActionKind::UseKeyOnSafe => Action::UseKeyOnSafe,
            ActionKind::EnterCode => {
                let raw = argument(args, "code").ok_or(ActionError::MissingArgument("code"))?;
                Action::EnterCode {
                    code: SafeCode::parse(&raw)?,
                }
            }
            ActionKind::CutBars => Action::CutBars,
            ActionKind::UseKeyOnDoor => Action::UseKeyOnDoor,
            ActionKind::UseBoltCutterOnDoor => Action::UseBoltCutterOnDoor,
            ActionKind::GiveHint => Action::GiveHint,
            ActionKind::ResetGame => Action::ResetGame,
            ActionKind::ImpossibleAction => Action::Impossible {
                action: argument(args, "action")
                    .filter(|a| !a.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_IMPOSSIBLE.to_string()),
            },
            ActionKind::MultipleActions => Action::Multiple {
                primary: argument(args, "primary_action")
                    .ok_or(ActionError::MissingArgument("primary_action"))?,
            },
        })
    }
}

/// Read a string argument; numbers are accepted and rendered as text.
fn argument(args: &Value, key: &str) -> Option<String> {
    match args.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
