use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::action::{ActionKind, DoorId};
use crate::model::game_state::{Flag, GameState, Item};

/// A predicate over the game state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Always,
    Set(Flag),
    Unset(Flag),
    Holds(Item),
    Lacks(Item),
    Won,
    All(Vec<Condition>),
    Any(Vec<Condition>),
}

impl Condition {
    pub fn holds(&self, state: &GameState) -> bool {
        match self {
            Condition::Always => true,
            Condition::Set(flag) => state.is_set(*flag),
            Condition::Unset(flag) => !state.is_set(*flag),
            Condition::Holds(item) => state.holds(*item),
            Condition::Lacks(item) => !state.holds(*item),
            Condition::Won => state.won,
            Condition::All(all) => all.iter().all(|c| c.holds(state)),
            Condition::Any(any) => any.iter().any(|c| c.holds(state)),
        }
    }
}

/// Narrative fact text, with an alternative for when an item was auto-collected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fact {
    pub plain: String,
    pub collected: Option<String>,
}

impl Fact {
    pub fn new(plain: &str) -> Self {
        Self {
            plain: plain.to_string(),
            collected: None,
        }
    }

    pub fn or_collected(mut self, text: &str) -> Self {
        self.collected = Some(text.to_string());
        self
    }

    pub fn text(&self, collected: bool) -> &str {
        match (&self.collected, collected) {
            (Some(text), true) => text,
            _ => &self.plain,
        }
    }
}

/// Stops a rule when `when` holds, reporting `fact` without touching state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guard {
    pub when: Condition,
    pub succeeded: bool,
    pub fact: Fact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Set(Flag),
    Take(Item),
    Win,
}

/// A code the action's parameter must match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Secret {
    pub code: String,
    /// Reported on mismatch; `{code}` is replaced by what was entered.
    pub wrong: Fact,
}

/// One entry of the action table: preconditions, effects and narrative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub kind: ActionKind,
    pub door: Option<DoorId>,
    /// Checked first, in order.
    pub guards: Vec<Guard>,
    /// Items picked up on the way when auto-collect is enabled.
    pub collects: Vec<Item>,
    /// Checked after collecting, in order.
    pub requires: Vec<Guard>,
    pub secret: Option<Secret>,
    pub effects: Vec<Effect>,
    pub fact: Fact,
}

impl Rule {
    pub fn new(kind: ActionKind, fact: Fact) -> Self {
        Self {
            kind,
            door: None,
            guards: Vec::new(),
            collects: Vec::new(),
            requires: Vec::new(),
            secret: None,
            effects: Vec::new(),
            fact,
        }
    }

    pub fn door(mut self, door: DoorId) -> Self {
        self.door = Some(door);
        self
    }

    pub fn guard(mut self, when: Condition, succeeded: bool, fact: Fact) -> Self {
        self.guards.push(Guard {
            when,
            succeeded,
            fact,
        });
        self
    }

    pub fn collects(mut self, item: Item) -> Self {
        self.collects.push(item);
        self
    }

    pub fn require(mut self, unless: Condition, fact: Fact) -> Self {
        self.requires.push(Guard {
            when: unless,
            succeeded: false,
            fact,
        });
        self
    }

    pub fn secret(mut self, code: &str, wrong: Fact) -> Self {
        self.secret = Some(Secret {
            code: code.to_string(),
            wrong,
        });
        self
    }

    pub fn effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.effects.contains(&Effect::Win)
    }
}

/// How an item becomes visible and which flag records that it was taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSpec {
    pub item: Item,
    pub taken: Flag,
    pub revealed: Condition,
    /// Inventory tray icon.
    pub icon: String,
}

/// One visual variant of a region. First matching layer wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    pub when: Condition,
    pub asset: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub name: &'static str,
    pub layers: Vec<Layer>,
}

impl Region {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            layers: Vec::new(),
        }
    }

    fn layer(mut self, when: Condition, asset: &str, description: &str) -> Self {
        self.layers.push(Layer {
            when,
            asset: Some(asset.to_string()),
            description: Some(description.to_string()),
        });
        self
    }

    pub fn pick(&self, state: &GameState) -> Option<&Layer> {
        self.layers.iter().find(|l| l.when.holds(state))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hint {
    pub when: Condition,
    pub text: String,
}

/// A tool exposed to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSpec {
    pub kind: ActionKind,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioId {
    #[default]
    BehindBars,
    ThreeDoors,
}

impl ScenarioId {
    pub const ALL: [ScenarioId; 2] = [ScenarioId::BehindBars, ScenarioId::ThreeDoors];

    pub fn title(self) -> &'static str {
        match self {
            ScenarioId::BehindBars => "Behind Bars",
            ScenarioId::ThreeDoors => "Three Doors",
        }
    }

    pub fn load(self) -> Scenario {
        match self {
            ScenarioId::BehindBars => Scenario::behind_bars(),
            ScenarioId::ThreeDoors => Scenario::three_doors(),
        }
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Declarative description of one escape room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub id: ScenarioId,
    pub canvas: (u32, u32),
    pub flags: Vec<Flag>,
    pub items: Vec<ItemSpec>,
    pub rules: Vec<Rule>,
    pub tools: Vec<ToolSpec>,

    pub base_asset: String,
    pub regions: Vec<Region>,

    pub intro: String,
    pub won_description: String,
    pub reset_fact: String,
    pub hints: Vec<Hint>,
    pub fallback_hint: String,
    /// `{action}` is replaced by the player's phrase.
    pub impossible: Vec<String>,
}

impl Scenario {
    pub fn initial_state(&self) -> GameState {
        GameState::new(&self.flags)
    }

    pub fn rule(&self, kind: ActionKind, door: Option<DoorId>) -> Option<&Rule> {
        self.rules.iter().find(|r| r.kind == kind && r.door == door)
    }

    pub fn item(&self, item: Item) -> Option<&ItemSpec> {
        self.items.iter().find(|i| i.item == item)
    }

    pub fn offers(&self, kind: ActionKind) -> bool {
        self.tools.iter().any(|t| t.kind == kind)
    }

    pub fn hint(&self, state: &GameState) -> &str {
        self.hints
            .iter()
            .find(|h| h.when.holds(state))
            .map(|h| h.text.as_str())
            .unwrap_or(&self.fallback_hint)
    }

    /// Items held without their taken flag, or taken without being revealed.
    pub fn invariant_violations(&self, state: &GameState) -> Vec<String> {
        let mut problems = Vec::new();
        for spec in &self.items {
            let taken = state.is_set(spec.taken);
            if taken != state.holds(spec.item) {
                problems.push(format!("{} taken={} held={}", spec.item, taken, state.holds(spec.item)));
            }
            if taken && !spec.revealed.holds(state) {
                problems.push(format!("{} taken before being revealed", spec.item));
            }
        }
        problems
    }

    pub fn behind_bars() -> Self {
        use Condition::*;
        use Flag::*;

        let key_visible = All(vec![Set(RugLifted), Unset(KeyTaken)]);

        Self {
            id: ScenarioId::BehindBars,
            canvas: (1280, 720),
            flags: vec![DoorOpened, RugLifted, KeyTaken, SafeOpened, BoltCutterTaken, BarsCut],
            items: vec![
                ItemSpec {
                    item: Item::Key,
                    taken: KeyTaken,
                    revealed: Set(RugLifted),
                    icon: "inventory_key.png".into(),
                },
                ItemSpec {
                    item: Item::BoltCutter,
                    taken: BoltCutterTaken,
                    revealed: Set(SafeOpened),
                    icon: "inventory_bolt_cutter.png".into(),
                },
            ],
            rules: vec![
                Rule::new(
                    ActionKind::OpenDoor,
                    Fact::new("You open the door, but your heart sinks. Thick metal bars block your escape! You'll need to find another way through."),
                )
                .guard(
                    All(vec![Set(DoorOpened), Set(BarsCut)]),
                    true,
                    Fact::new("The door is already open, and you've cut through the bars. Freedom awaits!"),
                )
                .guard(Set(DoorOpened), true, Fact::new("The door is already open, but metal bars block your path."))
                .effect(Effect::Set(DoorOpened)),
                Rule::new(
                    ActionKind::LookUnderRug,
                    Fact::new("You lift the corner of the rug and discover a small brass key hidden underneath!"),
                )
                .guard(
                    All(vec![Set(RugLifted), Set(KeyTaken)]),
                    true,
                    Fact::new("You've already taken the key from here."),
                )
                .guard(Set(RugLifted), true, Fact::new("The rug is lifted, revealing the key underneath."))
                .effect(Effect::Set(RugLifted)),
                Rule::new(
                    ActionKind::TakeKey,
                    Fact::new("You pick up the brass key. It feels solid and well-made."),
                )
                .guard(Set(KeyTaken), false, Fact::new("You already have the key."))
                .guard(
                    Unset(RugLifted),
                    false,
                    Fact::new("You don't see any key. Maybe you should look under the rug first?"),
                )
                .effect(Effect::Take(Item::Key)),
                Rule::new(
                    ActionKind::OpenSafe,
                    Fact::new("You insert the key into the safe's lock. It turns smoothly! The safe opens with a satisfying click, revealing a heavy-duty bolt cutter inside.")
                        .or_collected("You grab the key from under the rug and use it on the safe. It turns smoothly! The safe opens with a satisfying click, revealing a heavy-duty bolt cutter inside."),
                )
                .guard(
                    All(vec![Set(SafeOpened), Set(BoltCutterTaken)]),
                    true,
                    Fact::new("The safe is already open and empty."),
                )
                .guard(
                    Set(SafeOpened),
                    true,
                    Fact::new("The safe is already open, revealing a heavy-duty bolt cutter inside."),
                )
                .collects(Item::Key)
                .require(Lacks(Item::Key), Fact::new("The safe is locked."))
                .effect(Effect::Set(SafeOpened)),
                Rule::new(
                    ActionKind::TakeBoltCutter,
                    Fact::new("You lift the heavy bolt cutter from the safe. Its weight feels reassuring."),
                )
                .guard(Set(BoltCutterTaken), false, Fact::new("You already have the bolt cutter."))
                .guard(Unset(SafeOpened), false, Fact::new("The safe is locked."))
                .effect(Effect::Take(Item::BoltCutter)),
                Rule::new(
                    ActionKind::CutBars,
                    Fact::new("You position the bolt cutter on the metal bars and squeeze with all your might. SNAP! The bars give way with a satisfying crack. You've created an opening large enough to escape through. Freedom at last!")
                        .or_collected("You grab the bolt cutter from the safe and immediately put it to work on the metal bars. SNAP! The bars give way with a satisfying crack. You've created an opening large enough to escape through. Freedom at last!"),
                )
                .guard(
                    Set(BarsCut),
                    true,
                    Fact::new("You've already cut through the bars. The path to freedom is clear!"),
                )
                .guard(
                    Unset(DoorOpened),
                    false,
                    Fact::new("You need to open the door first to see the bars."),
                )
                .collects(Item::BoltCutter)
                .require(
                    Lacks(Item::BoltCutter),
                    Fact::new("You don't have anything to cut the bars with."),
                )
                .effect(Effect::Set(BarsCut))
                .effect(Effect::Win),
                Rule::new(ActionKind::UseKeyOnDoor, Fact::new(""))
                    .collects(Item::Key)
                    .require(Lacks(Item::Key), Fact::new("You don't have a key yet."))
                    .require(
                        Always,
                        Fact::new("The small brass key doesn't fit the door's heavy lock. It's much too small.")
                            .or_collected("You grab the key from under the rug and try it on the door, but it's much too small for the heavy lock."),
                    ),
                Rule::new(ActionKind::UseBoltCutterOnDoor, Fact::new(""))
                    .collects(Item::BoltCutter)
                    .require(Lacks(Item::BoltCutter), Fact::new("You don't have a bolt cutter."))
                    .require(
                        Unset(DoorOpened),
                        Fact::new("You try to use the bolt cutter on the closed door, but it's solid material. Maybe you should open the door first to see what's behind it?")
                            .or_collected("You grab the bolt cutter from the safe and try to use it on the closed door, but it's solid material. Maybe you should open the door first to see what's behind it?"),
                    )
                    .require(
                        Always,
                        Fact::new("The bolt cutter isn't meant for the door itself. But you notice those metal bars blocking your path - maybe the cutter would work on those?")
                            .or_collected("You grab the bolt cutter from the safe, but it's not meant for the door itself. However, you notice those metal bars blocking your path - maybe the cutter would work on those?"),
                    ),
            ],
            tools: vec![
                tool(ActionKind::DescribeRoom, "Returns a description of the current state of the room. Use when the player asks where they are or seems to have forgotten what they have done."),
                tool(ActionKind::OpenDoor, "Opens/checks the main door. Use when player wants to: open door, check door, look at door, examine door, try door."),
                tool(ActionKind::LookUnderRug, "Lifts/moves the rug to see underneath. Use when player wants to: lift rug, move rug, look under rug, check rug, search rug."),
                tool(ActionKind::TakeKey, "Picks up the brass key from under the rug. Use when player wants to: take key, pick up key, grab key, get key."),
                tool(ActionKind::OpenSafe, "Uses the brass key to unlock the safe. Use when player wants to: open safe, unlock safe, use key on safe, put key in safe."),
                tool(ActionKind::TakeBoltCutter, "Takes the bolt cutter from inside the open safe. Use when player wants to: take bolt cutter, take tool, grab cutter, get item from safe."),
                tool(ActionKind::CutBars, "Uses bolt cutter to cut through metal bars on the door. Use when player wants to: cut bars, use bolt cutter, break bars."),
                tool(ActionKind::UseKeyOnDoor, "Tries to use the brass key on the main door lock. Use when player says: use key on door, unlock door with key, put key in door."),
                tool(ActionKind::UseBoltCutterOnDoor, "Tries to use bolt cutter on the door itself (not bars). Use when player says: cut door, use bolt cutter on door, break door with cutter."),
                tool(ActionKind::GiveHint, "Provides contextual hints when player asks for help. Use when player says: give me a hint, what should I do, I'm stuck, help me."),
                tool(ActionKind::ImpossibleAction, "For actions that don't work or aren't possible. Pass the player's original phrase as the 'action' parameter."),
                tool(ActionKind::MultipleActions, "For when player requests multiple actions at once. Pass the first action to execute as 'primary_action', exactly as it appears in the tool list."),
                tool(ActionKind::ResetGame, "Restarts the escape room game from the beginning."),
            ],
            base_asset: "room_base.png".into(),
            regions: vec![
                Region::new("door")
                    .layer(
                        All(vec![Set(DoorOpened), Set(BarsCut)]),
                        "door_open_bars_cut.png",
                        "The door is open and you've cut through the metal bars - your escape route is clear!",
                    )
                    .layer(Set(DoorOpened), "door_open_bars.png", "The door is open, but thick metal bars block your path.")
                    .layer(Always, "door_closed.png", "A heavy door dominates one wall."),
                Region::new("rug")
                    .layer(
                        All(vec![Set(RugLifted), Set(KeyTaken)]),
                        "rug_lifted_empty.png",
                        "The rug is lifted in one corner, revealing the empty hiding spot where you found the key.",
                    )
                    .layer(key_visible.clone(), "rug_lifted_key.png", "The rug is lifted, revealing a brass key underneath.")
                    .layer(Always, "rug_normal.png", "A worn rug covers part of the floor."),
                Region::new("safe")
                    .layer(
                        All(vec![Set(SafeOpened), Set(BoltCutterTaken)]),
                        "safe_open_empty.png",
                        "The safe stands open and empty - you've taken its contents.",
                    )
                    .layer(Set(SafeOpened), "safe_open_tool.png", "The safe is open, revealing a heavy bolt cutter inside.")
                    .layer(Always, "safe_closed.png", "A metal safe sits against the wall, securely locked."),
            ],
            intro: "You stand in a simple room with concrete walls.".into(),
            won_description: "You have successfully escaped the room!".into(),
            reset_fact: "The game has been reset. You are back in the initial room.".into(),
            hints: vec![
                hint(
                    All(vec![Unset(DoorOpened), Unset(RugLifted)]),
                    "You're in an unfamiliar room. Try exploring what you can see - maybe start with that door or check around the floor.",
                ),
                hint(
                    All(vec![Unset(DoorOpened), key_visible.clone()]),
                    "You've discovered something interesting under the rug! Maybe pick it up, then see what's behind that door.",
                ),
                hint(
                    All(vec![Unset(DoorOpened), Set(KeyTaken)]),
                    "You have a key, but what's behind that door? Better open it and see what you're dealing with.",
                ),
                hint(
                    All(vec![Set(DoorOpened), Unset(RugLifted)]),
                    "The door reveals your challenge, but you'll need tools to solve it. Search the room thoroughly - check under things.",
                ),
                hint(
                    All(vec![Set(DoorOpened), key_visible]),
                    "You can see both your obstacle and a potential solution. Pick up what you found and see what it opens.",
                ),
                hint(
                    All(vec![Set(DoorOpened), Set(KeyTaken), Unset(SafeOpened)]),
                    "The bars block your exit, but that key must open something in this room. What else has a lock?",
                ),
                hint(
                    All(vec![Set(SafeOpened), Unset(BoltCutterTaken)]),
                    "The safe revealed exactly what you need! Take that tool - it looks perfect for your problem.",
                ),
                hint(
                    All(vec![Set(BoltCutterTaken), Unset(BarsCut)]),
                    "You have the perfect tool for those metal bars blocking your escape. Time to put it to work!",
                ),
                hint(Set(BarsCut), "You've already found your way to freedom! The path is clear."),
            ],
            fallback_hint: "You have everything you need. Use your tool on what's blocking your escape!".into(),
            impossible: impossible_phrasings(),
        }
    }

    pub fn three_doors() -> Self {
        use Condition::*;
        use Flag::*;

        let door_rule = |door: DoorId, opened: &str| {
            let flag = door.opened_flag();
            Rule::new(ActionKind::LookBehindDoor, Fact::new(opened))
                .door(door)
                .guard(Set(flag), false, Fact::new(&format!("Door {} is already open.", door)))
                .effect(Effect::Set(flag))
        };
        let door_region = |door: DoorId| {
            let flag = door.opened_flag();
            Region::new(match door {
                DoorId::One => "door1",
                DoorId::Two => "door2",
                DoorId::Three => "door3",
            })
            .layer(
                Set(flag),
                &format!("door{}_open.png", door),
                &format!("Door {} stands open.", door),
            )
            .layer(
                Always,
                &format!("door{}_closed.png", door),
                &format!("Door {} is closed.", door),
            )
        };

        Self {
            id: ScenarioId::ThreeDoors,
            canvas: (1920, 1080),
            flags: vec![Door1Opened, Door2Opened, Door3Opened, KeyTaken, SafeUnlocked, SafeOpened],
            items: vec![ItemSpec {
                item: Item::Key,
                taken: KeyTaken,
                revealed: Set(Door2Opened),
                icon: "inventory_key.png".into(),
            }],
            rules: vec![
                door_rule(DoorId::One, "Door 1 swings open with a creak. Nothing behind it but empty darkness."),
                door_rule(DoorId::Two, "Door 2 opens to reveal a rusty key lying on the ground behind it!"),
                door_rule(DoorId::Three, "Door 3 creaks open. Just shadows and dust behind it."),
                Rule::new(
                    ActionKind::TakeKey,
                    Fact::new("You pick up the rusty key. It feels heavy and cold in your hand."),
                )
                .guard(Set(KeyTaken), false, Fact::new("You already have the key."))
                .guard(
                    Unset(Door2Opened),
                    false,
                    Fact::new("You don't see any key. Try looking behind the doors first."),
                )
                .effect(Effect::Take(Item::Key)),
                Rule::new(
                    ActionKind::UseKeyOnSafe,
                    Fact::new("You insert the key into the safe's lock. Click! The safe unlocks and the keypad lights up green. You notice a piece of paper inside with the code: 5274")
                        .or_collected("You grab the rusty key from behind door 2 and insert it into the safe's lock. Click! The safe unlocks and the keypad lights up green. You notice a piece of paper inside with the code: 5274"),
                )
                .guard(Set(SafeUnlocked), false, Fact::new("The safe is already unlocked."))
                .collects(Item::Key)
                .require(Lacks(Item::Key), Fact::new("You don't have a key to use."))
                .effect(Effect::Set(SafeUnlocked)),
                Rule::new(
                    ActionKind::EnterCode,
                    Fact::new("SUCCESS! The safe door swings open wide, revealing bright daylight beyond. You've escaped!"),
                )
                .guard(
                    Unset(SafeUnlocked),
                    false,
                    Fact::new("The safe is still locked. You need to unlock it with a key first."),
                )
                .guard(
                    Set(SafeOpened),
                    false,
                    Fact::new("The safe is already open! Bright daylight streams in through your escape route."),
                )
                .secret(
                    "5274",
                    Fact::new("You enter {code}. The safe beeps and flashes red. Wrong code!"),
                )
                .effect(Effect::Set(SafeOpened))
                .effect(Effect::Win),
            ],
            tools: vec![
                tool(ActionKind::DescribeRoom, "Get description and image of current room state."),
                tool(ActionKind::LookBehindDoor, "Look behind a specific door (opens it). door_id must be '1', '2', or '3'."),
                tool(ActionKind::TakeKey, "Take the key if it's visible behind an open door."),
                tool(ActionKind::UseKeyOnSafe, "Use the key from your inventory to unlock the safe."),
                tool(ActionKind::EnterCode, "Enter a 4-digit code into the safe. The safe must be unlocked first."),
                tool(ActionKind::GiveHint, "Provides contextual hints when player asks for help."),
                tool(ActionKind::ImpossibleAction, "For actions that don't work or aren't possible. Pass the player's original phrase as the 'action' parameter."),
                tool(ActionKind::MultipleActions, "For when player requests multiple actions at once. Pass the first action to execute as 'primary_action', exactly as it appears in the tool list."),
                tool(ActionKind::ResetGame, "Reset the game to initial state."),
            ],
            base_asset: "room_base.png".into(),
            regions: vec![
                door_region(DoorId::One),
                door_region(DoorId::Two),
                door_region(DoorId::Three),
                Region::new("key").layer(
                    All(vec![Set(Door2Opened), Unset(KeyTaken)]),
                    "key_behind_door2.png",
                    "A rusty key lies behind door 2.",
                ),
                Region::new("safe")
                    .layer(Set(SafeOpened), "safe_open.png", "The safe is wide open, showing your escape route!")
                    .layer(Set(SafeUnlocked), "safe_unlocked.png", "The safe is unlocked and ready for a code.")
                    .layer(Always, "safe_locked.png", "A metal safe sits against the wall, locked tight."),
            ],
            intro: "You stand in a dimly lit escape room.".into(),
            won_description: "You have escaped through the safe!".into(),
            reset_fact: "Game reset! You're back in the escape room.".into(),
            hints: vec![
                hint(Won, "You've already escaped! Enjoy the daylight."),
                hint(
                    All(vec![Unset(Door1Opened), Unset(Door2Opened), Unset(Door3Opened)]),
                    "Three doors, three chances. Try looking behind one of them.",
                ),
                hint(
                    All(vec![Unset(Door2Opened), Lacks(Item::Key)]),
                    "Not every door hides something useful. Keep checking the ones you haven't opened.",
                ),
                hint(Lacks(Item::Key), "Something glints behind door 2. Pick it up!"),
                hint(Unset(SafeUnlocked), "That key must fit the safe. Try using it."),
            ],
            fallback_hint: "The code is on the paper inside the safe's lock. Enter it on the keypad.".into(),
            impossible: impossible_phrasings(),
        }
    }
}

fn tool(kind: ActionKind, description: &str) -> ToolSpec {
    ToolSpec {
        kind,
        description: description.to_string(),
    }
}

fn hint(when: Condition, text: &str) -> Hint {
    Hint {
        when,
        text: text.to_string(),
    }
}

fn impossible_phrasings() -> Vec<String> {
    [
        "You try to {action}, but that's not going to work in this situation.",
        "Yikes! You can't {action} here.",
        "Nice try, but {action} isn't possible right now.",
        "You attempt to {action}, but nothing happens.",
        "That's creative, but {action} won't help you escape.",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all() -> Vec<Scenario> {
        ScenarioId::ALL.into_iter().map(ScenarioId::load).collect()
    }

    #[test]
    fn exactly_one_winning_rule_per_scenario() {
        for scenario in all() {
            let terminal = scenario.rules.iter().filter(|r| r.is_terminal()).count();
            assert_eq!(terminal, 1, "{}", scenario.id);
        }
    }

    #[test]
    fn every_rule_is_offered_as_a_tool() {
        for scenario in all() {
            for rule in &scenario.rules {
                assert!(scenario.offers(rule.kind), "{} does not offer {}", scenario.id, rule.kind);
            }
        }
    }

    #[test]
    fn builtins_are_offered_everywhere() {
        for scenario in all() {
            for kind in ActionKind::ALL.into_iter().filter(|k| k.is_builtin()) {
                assert!(scenario.offers(kind), "{} lacks {}", scenario.id, kind);
            }
        }
    }

    #[test]
    fn rules_only_touch_declared_flags() {
        for scenario in all() {
            for rule in &scenario.rules {
                for effect in &rule.effects {
                    match effect {
                        Effect::Set(flag) => assert!(scenario.flags.contains(flag)),
                        Effect::Take(item) => {
                            let spec = scenario.item(*item).expect("item spec");
                            assert!(scenario.flags.contains(&spec.taken));
                        }
                        Effect::Win => {}
                    }
                }
            }
        }
    }

    #[test]
    fn each_door_has_its_own_rule() {
        let scenario = Scenario::three_doors();
        for door in DoorId::ALL {
            assert!(scenario.rule(ActionKind::LookBehindDoor, Some(door)).is_some());
        }
        assert!(scenario.rule(ActionKind::LookBehindDoor, None).is_none());
    }

    #[test]
    fn initial_state_starts_with_first_hint() {
        let scenario = Scenario::behind_bars();
        let state = scenario.initial_state();
        assert!(scenario.hint(&state).starts_with("You're in an unfamiliar room"));
    }

    #[test]
    fn fact_prefers_collected_text_only_when_asked() {
        let fact = Fact::new("plain").or_collected("grabbed");
        assert_eq!(fact.text(false), "plain");
        assert_eq!(fact.text(true), "grabbed");
        assert_eq!(Fact::new("plain").text(true), "plain");
    }
}
