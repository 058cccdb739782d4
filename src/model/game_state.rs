use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A boolean milestone tracked by a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flag {
    DoorOpened,
    RugLifted,
    KeyTaken,
    SafeUnlocked,
    SafeOpened,
    BoltCutterTaken,
    BarsCut,
    Door1Opened,
    Door2Opened,
    Door3Opened,
}

impl Flag {
    pub fn name(self) -> &'static str {
        match self {
            Flag::DoorOpened => "door_opened",
            Flag::RugLifted => "rug_lifted",
            Flag::KeyTaken => "key_taken",
            Flag::SafeUnlocked => "safe_unlocked",
            Flag::SafeOpened => "safe_opened",
            Flag::BoltCutterTaken => "bolt_cutter_taken",
            Flag::BarsCut => "bars_cut",
            Flag::Door1Opened => "door1_opened",
            Flag::Door2Opened => "door2_opened",
            Flag::Door3Opened => "door3_opened",
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Something the player can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Item {
    Key,
    BoltCutter,
}

impl Item {
    pub fn name(self) -> &'static str {
        match self {
            Item::Key => "key",
            Item::BoltCutter => "bolt_cutter",
        }
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Progress of one game session.
///
/// Only the state machine mutates this; everyone else gets a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameState {
    pub flags: BTreeMap<Flag, bool>,
    pub inventory: BTreeSet<Item>,
    pub won: bool,
}

impl GameState {
    /// All listed flags present and false, nothing carried.
    pub fn new(flags: &[Flag]) -> Self {
        Self {
            flags: flags.iter().map(|f| (*f, false)).collect(),
            inventory: BTreeSet::new(),
            won: false,
        }
    }

    pub fn is_set(&self, flag: Flag) -> bool {
        self.flags.get(&flag).copied().unwrap_or(false)
    }

    pub fn set(&mut self, flag: Flag) {
        self.flags.insert(flag, true);
    }

    pub fn holds(&self, item: Item) -> bool {
        self.inventory.contains(&item)
    }

    /// Names of carried items in inventory order.
    pub fn carried(&self) -> Vec<&'static str> {
        self.inventory.iter().map(|i| i.name()).collect()
    }
}
