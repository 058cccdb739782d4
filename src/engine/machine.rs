use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::scenario::{Effect, Rule, Scenario};
use crate::model::action::{Action, ActionError, ActionKind};
use crate::model::action_result::ActionOutcome;
use crate::model::game_state::{GameState, Item};

/// Whether a dependent action picks up a visible item on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoCollect {
    #[default]
    Enabled,
    Disabled,
}

const NOT_POSSIBLE: &str = "That's not possible right now.";

/// Apply one action to `state` and hand the resulting state back in the outcome.
///
/// Never fails: invalid or premature actions come back with `succeeded == false`
/// and the state untouched.
pub fn apply<R: Rng + ?Sized>(
    scenario: &Scenario,
    policy: AutoCollect,
    state: GameState,
    action: &Action,
    rng: &mut R,
) -> ActionOutcome {
    let kind = action.kind();
    if !scenario.offers(kind) {
        let reason = ActionError::Unavailable(kind.name().replace('_', " "));
        return ActionOutcome::unchanged(state, false, reason.to_string());
    }

    match action {
        Action::DescribeRoom => {
            let text = describe(scenario, &state);
            ActionOutcome::unchanged(state, true, text)
        }
        Action::GiveHint => {
            let text = scenario.hint(&state).to_string();
            ActionOutcome::unchanged(state, true, text)
        }
        Action::ResetGame => reset(scenario, state),
        Action::Impossible { action } => {
            let text = impossible(scenario, action, rng);
            ActionOutcome::unchanged(state, false, text)
        }
        Action::Multiple { primary } => {
            let name = primary.trim();
            let first = resolve_primary(name);
            let mut outcome = apply(scenario, policy, state, &first, rng);
            outcome.fact = format!(
                "We can only do one thing at a time. I executed '{}' first. {}",
                name, outcome.fact
            );
            outcome
        }
        _ => apply_rule(scenario, policy, state, action),
    }
}

fn apply_rule(
    scenario: &Scenario,
    policy: AutoCollect,
    mut state: GameState,
    action: &Action,
) -> ActionOutcome {
    let Some(rule) = scenario.rule(action.kind(), action.door()) else {
        let reason = ActionError::Unavailable(action.kind().name().replace('_', " "));
        return ActionOutcome::unchanged(state, false, reason.to_string());
    };
    let terminal = rule.is_terminal();

    if let Some(guard) = rule.guards.iter().find(|g| g.when.holds(&state)) {
        return ActionOutcome {
            terminal,
            ..ActionOutcome::unchanged(state, guard.succeeded, guard.fact.text(false))
        };
    }

    let collected = match policy {
        AutoCollect::Enabled => collect(scenario, &mut state, rule),
        AutoCollect::Disabled => Vec::new(),
    };
    let auto = !collected.is_empty();

    let entered = match action {
        Action::EnterCode { code } => code.as_str(),
        _ => "",
    };

    let blocked = rule
        .requires
        .iter()
        .find(|g| g.when.holds(&state))
        .map(|g| g.fact.text(auto).to_string())
        .or_else(|| {
            rule.secret
                .as_ref()
                .filter(|s| s.code != entered)
                .map(|s| s.wrong.text(auto).replace("{code}", entered))
        });

    if let Some(fact) = blocked {
        // Anything picked up on the way stays picked up.
        return ActionOutcome {
            changed: auto,
            terminal,
            ..ActionOutcome::unchanged(state, false, fact)
        };
    }

    for effect in &rule.effects {
        match *effect {
            Effect::Set(flag) => state.set(flag),
            Effect::Take(item) => take(scenario, &mut state, item),
            Effect::Win => state.won = true,
        }
    }

    log::info!("{} applied (auto-collected: {:?})", rule.kind, collected);

    let won = state.won;
    ActionOutcome {
        succeeded: true,
        fact: rule.fact.text(auto).replace("{code}", entered),
        state,
        won,
        changed: true,
        terminal,
    }
}

/// Take every item the rule depends on that is visible but not yet held.
fn collect(scenario: &Scenario, state: &mut GameState, rule: &Rule) -> Vec<Item> {
    let mut picked = Vec::new();
    for item in &rule.collects {
        if state.holds(*item) {
            continue;
        }
        if let Some(spec) = scenario.item(*item) {
            if spec.revealed.holds(state) {
                take(scenario, state, *item);
                log::info!("Auto-collected {}", item);
                picked.push(*item);
            }
        }
    }
    picked
}

fn take(scenario: &Scenario, state: &mut GameState, item: Item) {
    match scenario.item(item) {
        Some(spec) => state.set(spec.taken),
        None => log::warn!("{} has no item spec in {}", item, scenario.id),
    }
    state.inventory.insert(item);
}

fn reset(scenario: &Scenario, state: GameState) -> ActionOutcome {
    let fresh = scenario.initial_state();
    let changed = fresh != state;
    log::info!("Game reset");
    ActionOutcome {
        succeeded: true,
        fact: scenario.reset_fact.clone(),
        state: fresh,
        won: false,
        changed,
        terminal: false,
    }
}

/// Plain-text description of the room as it currently looks.
pub fn describe(scenario: &Scenario, state: &GameState) -> String {
    let mut parts = vec![scenario.intro.clone()];

    for region in &scenario.regions {
        if let Some(text) = region.pick(state).and_then(|l| l.description.as_deref()) {
            parts.push(text.to_string());
        }
    }

    if !state.inventory.is_empty() {
        parts.push(format!("You're carrying: {}.", state.carried().join(", ")));
    }

    if state.won {
        parts.push(scenario.won_description.clone());
    }

    parts.join(" ")
}

fn impossible<R: Rng + ?Sized>(scenario: &Scenario, action: &str, rng: &mut R) -> String {
    log::info!("Impossible action attempted: {}", action);
    scenario
        .impossible
        .choose(rng)
        .map(|t| t.replace("{action}", action.trim()))
        .unwrap_or_else(|| NOT_POSSIBLE.to_string())
}

/// The action a `multiple_actions` call runs first.
///
/// Only parameterless game actions qualify; anything else is impossible.
fn resolve_primary(name: &str) -> Action {
    ActionKind::from_name(name)
        .filter(|k| !k.takes_arguments())
        .and_then(|k| Action::from_call(k.name(), &Value::Null).ok())
        .unwrap_or_else(|| Action::Impossible {
            action: name.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::action::{DoorId, SafeCode};
    use crate::model::game_state::Flag;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn run(scenario: &Scenario, policy: AutoCollect, actions: &[Action]) -> (GameState, Vec<ActionOutcome>) {
        let mut rng = rng();
        let mut state = scenario.initial_state();
        let mut outcomes = Vec::new();
        for action in actions {
            let outcome = apply(scenario, policy, state, action, &mut rng);
            state = outcome.state.clone();
            outcomes.push(outcome);
        }
        (state, outcomes)
    }

    fn code(raw: &str) -> Action {
        Action::EnterCode {
            code: SafeCode::parse(raw).unwrap(),
        }
    }

    #[test]
    fn behind_bars_walkthrough_escapes() {
        let scenario = Scenario::behind_bars();
        let (state, outcomes) = run(
            &scenario,
            AutoCollect::Enabled,
            &[
                Action::LookUnderRug,
                Action::TakeKey,
                Action::OpenSafe,
                Action::TakeBoltCutter,
                Action::OpenDoor,
                Action::CutBars,
            ],
        );

        assert!(outcomes.iter().all(|o| o.succeeded));
        assert!(outcomes[0].state.is_set(Flag::RugLifted));
        assert_eq!(outcomes[1].state.carried(), vec!["key"]);
        assert!(outcomes[2].state.is_set(Flag::SafeOpened));
        assert_eq!(outcomes[3].state.carried(), vec!["key", "bolt_cutter"]);
        assert!(outcomes[4].state.is_set(Flag::DoorOpened));
        assert!(outcomes[5].won && outcomes[5].terminal);
        assert!(outcomes[..5].iter().all(|o| !o.won));
        assert!(state.won);
        assert!(scenario.invariant_violations(&state).is_empty());
    }

    #[test]
    fn winning_move_first_is_rejected() {
        let scenario = Scenario::behind_bars();
        let (state, outcomes) = run(&scenario, AutoCollect::Enabled, &[Action::CutBars]);
        assert!(!outcomes[0].succeeded);
        assert!(!outcomes[0].won);
        assert_eq!(state, scenario.initial_state());

        let scenario = Scenario::three_doors();
        let (state, outcomes) = run(&scenario, AutoCollect::Enabled, &[code("5274")]);
        assert!(!outcomes[0].succeeded);
        assert!(!state.won);
    }

    #[test]
    fn auto_collect_grabs_key_and_says_so() {
        let scenario = Scenario::behind_bars();
        let (state, outcomes) = run(
            &scenario,
            AutoCollect::Enabled,
            &[Action::LookUnderRug, Action::OpenSafe],
        );

        let open = &outcomes[1];
        assert!(open.succeeded);
        assert!(open.fact.starts_with("You grab the key from under the rug"));
        assert!(state.holds(Item::Key));
        assert!(state.is_set(Flag::KeyTaken));
        assert!(state.is_set(Flag::SafeOpened));

        let (_, held) = run(
            &scenario,
            AutoCollect::Enabled,
            &[Action::LookUnderRug, Action::TakeKey, Action::OpenSafe],
        );
        assert!(held[2].succeeded);
        assert!(held[2].fact.starts_with("You insert the key"));
        assert_ne!(open.fact, held[2].fact);
    }

    #[test]
    fn auto_collect_disabled_requires_explicit_take() {
        let scenario = Scenario::behind_bars();
        let (state, outcomes) = run(
            &scenario,
            AutoCollect::Disabled,
            &[Action::LookUnderRug, Action::OpenSafe],
        );
        assert!(!outcomes[1].succeeded);
        assert_eq!(outcomes[1].fact, "The safe is locked.");
        assert!(!state.holds(Item::Key));
        assert!(!state.is_set(Flag::SafeOpened));
    }

    #[test]
    fn cut_bars_can_grab_the_cutter() {
        let scenario = Scenario::behind_bars();
        let (state, outcomes) = run(
            &scenario,
            AutoCollect::Enabled,
            &[Action::LookUnderRug, Action::OpenSafe, Action::OpenDoor, Action::CutBars],
        );
        let cut = outcomes.last().unwrap();
        assert!(cut.succeeded && cut.won);
        assert!(cut.fact.starts_with("You grab the bolt cutter"));
        assert!(state.holds(Item::BoltCutter));
    }

    #[test]
    fn failed_action_keeps_what_it_collected() {
        let scenario = Scenario::behind_bars();
        let (state, outcomes) = run(
            &scenario,
            AutoCollect::Enabled,
            &[Action::LookUnderRug, Action::UseKeyOnDoor],
        );
        let attempt = &outcomes[1];
        assert!(!attempt.succeeded);
        assert!(attempt.changed);
        assert!(attempt.fact.starts_with("You grab the key"));
        assert!(state.holds(Item::Key));
    }

    #[test]
    fn repeating_a_satisfied_action_changes_nothing() {
        let scenario = Scenario::behind_bars();
        let steps = [
            Action::LookUnderRug,
            Action::TakeKey,
            Action::OpenSafe,
            Action::TakeBoltCutter,
            Action::OpenDoor,
            Action::CutBars,
        ];
        let mut rng = rng();
        let mut state = scenario.initial_state();
        for action in &steps {
            state = apply(&scenario, AutoCollect::Enabled, state, action, &mut rng).state;
            let again = apply(&scenario, AutoCollect::Enabled, state.clone(), action, &mut rng);
            assert_eq!(again.state, state, "{:?} mutated on repeat", action);
            assert!(!again.changed);
        }

        let repeat = apply(&scenario, AutoCollect::Enabled, state.clone(), &Action::OpenDoor, &mut rng);
        assert!(repeat.succeeded);
        let repeat = apply(&scenario, AutoCollect::Enabled, state.clone(), &Action::TakeKey, &mut rng);
        assert!(!repeat.succeeded);
        assert_eq!(repeat.fact, "You already have the key.");
        let repeat = apply(&scenario, AutoCollect::Enabled, state, &Action::CutBars, &mut rng);
        assert!(repeat.succeeded && repeat.won && repeat.terminal);
    }

    #[test]
    fn three_doors_walkthrough_and_codes() {
        let scenario = Scenario::three_doors();
        let (state, outcomes) = run(
            &scenario,
            AutoCollect::Enabled,
            &[
                Action::LookBehindDoor { door: DoorId::One },
                Action::LookBehindDoor { door: DoorId::Two },
                Action::TakeKey,
                Action::UseKeyOnSafe,
                code("1234"),
                code("5274"),
                code("5274"),
                code("0000"),
            ],
        );

        assert!(outcomes[..4].iter().all(|o| o.succeeded));
        assert!(outcomes[1].fact.contains("rusty key"));

        let wrong = &outcomes[4];
        assert!(!wrong.succeeded && !wrong.won);
        assert_eq!(wrong.fact, "You enter 1234. The safe beeps and flashes red. Wrong code!");

        assert!(outcomes[5].succeeded && outcomes[5].won && outcomes[5].changed);
        for repeat in &outcomes[6..] {
            assert!(!repeat.succeeded && !repeat.changed);
            assert!(repeat.fact.starts_with("The safe is already open!"));
            assert!(repeat.won, "a later code never clears won");
        }
        assert!(state.won);
    }

    #[test]
    fn each_door_routes_to_its_own_logic() {
        let scenario = Scenario::three_doors();
        for door in DoorId::ALL {
            let (state, outcomes) = run(
                &scenario,
                AutoCollect::Enabled,
                &[Action::LookBehindDoor { door }],
            );
            assert!(outcomes[0].fact.starts_with(&format!("Door {}", door)));
            for other in DoorId::ALL {
                assert_eq!(state.is_set(other.opened_flag()), other == door);
            }
        }
    }

    #[test]
    fn unoffered_actions_fail_softly() {
        let scenario = Scenario::three_doors();
        let (state, outcomes) = run(&scenario, AutoCollect::Enabled, &[Action::CutBars]);
        assert!(!outcomes[0].succeeded);
        assert_eq!(outcomes[0].fact, "You can't cut bars in this room.");
        assert_eq!(state, scenario.initial_state());
    }

    #[test]
    fn reset_always_returns_initial_state() {
        let scenario = Scenario::behind_bars();
        let (state, outcomes) = run(
            &scenario,
            AutoCollect::Enabled,
            &[Action::LookUnderRug, Action::OpenSafe, Action::ResetGame],
        );
        assert_eq!(state, scenario.initial_state());
        assert!(outcomes[2].succeeded && outcomes[2].changed);

        let (_, fresh) = run(&scenario, AutoCollect::Enabled, &[Action::ResetGame]);
        assert!(!fresh[0].changed);
    }

    #[test]
    fn describe_mentions_inventory_and_escape() {
        let scenario = Scenario::behind_bars();
        let (state, _) = run(
            &scenario,
            AutoCollect::Enabled,
            &[Action::LookUnderRug, Action::OpenSafe, Action::OpenDoor, Action::CutBars],
        );
        let text = describe(&scenario, &state);
        assert!(text.starts_with("You stand in a simple room"));
        assert!(text.contains("You're carrying: key, bolt_cutter."));
        assert!(text.ends_with("You have successfully escaped the room!"));
    }

    #[test]
    fn hints_follow_progress() {
        let scenario = Scenario::behind_bars();
        let (_, outcomes) = run(
            &scenario,
            AutoCollect::Enabled,
            &[
                Action::GiveHint,
                Action::LookUnderRug,
                Action::OpenSafe,
                Action::GiveHint,
                Action::OpenDoor,
                Action::GiveHint,
            ],
        );
        assert!(outcomes[0].fact.starts_with("You're in an unfamiliar room"));
        assert!(outcomes[3].fact.starts_with("You have a key, but what's behind that door?"));
        assert!(outcomes[5].fact.starts_with("The safe revealed exactly what you need"));
    }

    #[test]
    fn impossible_actions_quote_the_player() {
        let scenario = Scenario::behind_bars();
        let (state, outcomes) = run(
            &scenario,
            AutoCollect::Enabled,
            &[Action::Impossible {
                action: "fly through the ceiling".into(),
            }],
        );
        assert!(!outcomes[0].succeeded);
        assert!(outcomes[0].fact.contains("fly through the ceiling"));
        assert_eq!(state, scenario.initial_state());
    }

    #[test]
    fn multiple_actions_runs_only_the_first() {
        let scenario = Scenario::behind_bars();
        let (state, outcomes) = run(
            &scenario,
            AutoCollect::Enabled,
            &[Action::Multiple {
                primary: "open_door".into(),
            }],
        );
        assert!(outcomes[0].succeeded);
        assert!(outcomes[0]
            .fact
            .starts_with("We can only do one thing at a time. I executed 'open_door' first."));
        assert!(state.is_set(Flag::DoorOpened));
    }

    #[test]
    fn multiple_actions_with_unusable_primary_is_impossible() {
        let scenario = Scenario::behind_bars();
        for primary in ["dance", "multiple_actions", "enter_code"] {
            let (state, outcomes) = run(
                &scenario,
                AutoCollect::Enabled,
                &[Action::Multiple {
                    primary: primary.into(),
                }],
            );
            assert!(!outcomes[0].succeeded, "{}", primary);
            assert_eq!(state, scenario.initial_state());
        }
    }

    fn behind_bars_pool() -> Vec<Action> {
        vec![
            Action::DescribeRoom,
            Action::OpenDoor,
            Action::LookUnderRug,
            Action::TakeKey,
            Action::OpenSafe,
            Action::TakeBoltCutter,
            Action::CutBars,
            Action::UseKeyOnDoor,
            Action::UseBoltCutterOnDoor,
            Action::GiveHint,
            Action::Impossible { action: "sing".into() },
            Action::Multiple { primary: "take_key".into() },
        ]
    }

    fn three_doors_pool() -> Vec<Action> {
        vec![
            Action::DescribeRoom,
            Action::LookBehindDoor { door: DoorId::One },
            Action::LookBehindDoor { door: DoorId::Two },
            Action::LookBehindDoor { door: DoorId::Three },
            Action::TakeKey,
            Action::UseKeyOnSafe,
            code("5274"),
            code("1111"),
            Action::GiveHint,
            Action::OpenDoor,
        ]
    }

    proptest! {
        #[test]
        fn random_walks_keep_invariants(
            picks in prop::collection::vec(0usize..64, 0..48),
            three_doors in any::<bool>(),
            auto in any::<bool>(),
        ) {
            let (scenario, pool) = if three_doors {
                (Scenario::three_doors(), three_doors_pool())
            } else {
                (Scenario::behind_bars(), behind_bars_pool())
            };
            let policy = if auto { AutoCollect::Enabled } else { AutoCollect::Disabled };

            let mut rng = rng();
            let mut state = scenario.initial_state();
            for pick in picks {
                let action = &pool[pick % pool.len()];
                let before = state.clone();
                let outcome = apply(&scenario, policy, state, action, &mut rng);

                prop_assert!(scenario.invariant_violations(&outcome.state).is_empty());
                prop_assert!(before.inventory.is_subset(&outcome.state.inventory));
                prop_assert!(!before.won || outcome.state.won);
                prop_assert_eq!(outcome.won, outcome.state.won);
                prop_assert_eq!(outcome.changed, outcome.state != before);
                if outcome.state.won && !before.won {
                    prop_assert!(outcome.terminal);
                }

                state = outcome.state;
            }

            let reset = apply(&scenario, policy, state, &Action::ResetGame, &mut rng);
            prop_assert_eq!(reset.state, scenario.initial_state());
        }
    }
}
