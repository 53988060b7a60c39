//! Integration tests for input buffering in the handle-weapon module
//!
//! These tests verify that:
//! - A start request made while the weapon is busy fires once it is idle
//! - Requests expire after their window
//! - Extending refreshes the window, otherwise the first expiry stands
//! - Weapon swaps drop any pending request

use actionsim::abilities::{AbilityKind, HandleWeapon, HandleWeaponConfig};
use actionsim::character::{Actor, ActorConfig, ActorId};
use actionsim::combat::events::ActorEvent;
use actionsim::input::{ButtonState, InputState};
use actionsim::weapon::{TriggerMode, WeaponConfig, WeaponState};

fn buffered_gunner(weapon: WeaponConfig, config: HandleWeaponConfig) -> Actor {
    Actor::with_defaults(ActorId(0), ActorConfig::named("Gunner", 0))
        .with_ability(HandleWeapon::new(config).with_initial_weapon(weapon))
}

fn buffering(maximum_buffer_duration: f32, extend: bool) -> HandleWeaponConfig {
    HandleWeaponConfig {
        buffer_input: true,
        new_input_extends_buffer: extend,
        maximum_buffer_duration,
        ..Default::default()
    }
}

fn slow_pistol(time_between_uses: f32) -> WeaponConfig {
    WeaponConfig {
        time_between_uses,
        time_between_uses_release_interruption: false,
        ..WeaponConfig::named("Pistol")
    }
}

fn press(state: ButtonState) -> InputState {
    InputState {
        shoot: state,
        ..Default::default()
    }
}

fn run(actor: &mut Actor, inputs: &[ButtonState]) {
    for state in inputs {
        actor.tick(0.25, &press(*state));
    }
}

fn module(actor: &Actor) -> &HandleWeapon {
    actor
        .ability::<HandleWeapon>(AbilityKind::HandleWeapon)
        .expect("handle weapon registered")
}

fn shots_fired(actor: &Actor) -> usize {
    actor
        .state()
        .events
        .pending()
        .iter()
        .filter(|e| matches!(e, ActorEvent::WeaponUsed { .. }))
        .count()
}

fn weapon_state(actor: &Actor) -> Option<WeaponState> {
    actor.state().equipment.get(0).map(|w| w.state())
}

#[test]
fn test_buffered_press_fires_when_weapon_goes_idle() {
    let pistol = WeaponConfig {
        time_between_uses: 0.5,
        ..WeaponConfig::named("Pistol")
    };
    let mut actor = buffered_gunner(pistol, buffering(1.0, false));

    run(
        &mut actor,
        &[ButtonState::Down, ButtonState::Up, ButtonState::Down],
    );
    assert!(module(&actor).buffer().pending().is_some());
    assert_eq!(weapon_state(&actor), Some(WeaponState::Stop));

    // A release does not clear the buffer
    run(&mut actor, &[ButtonState::Up]);
    assert_eq!(
        weapon_state(&actor),
        Some(WeaponState::Start),
        "Fired in the tick the weapon reached Idle"
    );
    assert!(module(&actor).buffer().is_empty());

    run(&mut actor, &[ButtonState::Off]);
    assert_eq!(shots_fired(&actor), 2);
}

#[test]
fn test_press_while_busy_is_dropped_without_buffering() {
    let pistol = WeaponConfig {
        time_between_uses: 0.5,
        ..WeaponConfig::named("Pistol")
    };
    let mut actor = buffered_gunner(pistol, HandleWeaponConfig::default());

    run(
        &mut actor,
        &[
            ButtonState::Down,
            ButtonState::Up,
            ButtonState::Down,
            ButtonState::Up,
            ButtonState::Off,
        ],
    );
    assert!(module(&actor).buffer().is_empty());
    assert_eq!(weapon_state(&actor), Some(WeaponState::Idle));
    assert_eq!(shots_fired(&actor), 1);
}

#[test]
fn test_buffered_press_expires() {
    let mut actor = buffered_gunner(slow_pistol(2.0), buffering(0.25, false));

    run(
        &mut actor,
        &[ButtonState::Down, ButtonState::Up, ButtonState::Down],
    );
    assert_eq!(
        module(&actor).buffer().pending().map(|p| p.expires_at),
        Some(1.0)
    );

    run(&mut actor, &[ButtonState::Off]);
    assert!(module(&actor).buffer().pending().is_some(), "Expiry is inclusive");
    run(&mut actor, &[ButtonState::Off]);
    assert!(module(&actor).buffer().is_empty());

    run(&mut actor, &[ButtonState::Off; 9]);
    assert_eq!(weapon_state(&actor), Some(WeaponState::Idle));
    assert_eq!(shots_fired(&actor), 1, "The expired request never fired");
}

#[test]
fn test_new_press_extends_buffer_window() {
    let mut actor = buffered_gunner(slow_pistol(2.0), buffering(0.5, true));

    run(
        &mut actor,
        &[
            ButtonState::Down,
            ButtonState::Up,
            ButtonState::Down,
            ButtonState::Up,
            ButtonState::Down,
        ],
    );
    assert_eq!(
        module(&actor).buffer().pending().map(|p| p.expires_at),
        Some(1.75)
    );

    run(&mut actor, &[ButtonState::Up, ButtonState::Off]);
    assert!(module(&actor).buffer().pending().is_some());
    run(&mut actor, &[ButtonState::Off]);
    assert!(module(&actor).buffer().is_empty());
}

#[test]
fn test_first_expiry_stands_without_extend() {
    let mut actor = buffered_gunner(slow_pistol(2.0), buffering(0.5, false));

    run(
        &mut actor,
        &[
            ButtonState::Down,
            ButtonState::Up,
            ButtonState::Down,
            ButtonState::Up,
            ButtonState::Down,
        ],
    );
    assert_eq!(
        module(&actor).buffer().pending().map(|p| p.expires_at),
        Some(1.25)
    );
    run(&mut actor, &[ButtonState::Up]);
    assert!(module(&actor).buffer().is_empty());
}

#[test]
fn test_weapon_swap_clears_buffer() {
    let mut actor = buffered_gunner(slow_pistol(2.0), buffering(1.0, false));
    run(
        &mut actor,
        &[ButtonState::Down, ButtonState::Up, ButtonState::Down],
    );
    assert!(module(&actor).buffer().pending().is_some());

    actor.with_ability_state::<HandleWeapon, _>(AbilityKind::HandleWeapon, |module, state| {
        module.change_weapon(state, Some(WeaponConfig::named("Knife")))
    });

    assert!(module(&actor).buffer().is_empty());
    assert_eq!(weapon_state(&actor), Some(WeaponState::Idle));
    assert_eq!(
        actor.state().equipment.get(0).map(|w| w.name().to_string()).as_deref(),
        Some("Knife")
    );
}

#[test]
fn test_buffered_tap_on_auto_weapon_fires_once() {
    let rifle = WeaponConfig {
        trigger_mode: TriggerMode::Auto,
        time_between_uses: 0.5,
        time_between_uses_release_interruption: false,
        ..WeaponConfig::named("Rifle")
    };
    let mut actor = buffered_gunner(rifle, buffering(1.0, false));

    for state in [
        ButtonState::Down,
        ButtonState::Up,
        ButtonState::Down,
        ButtonState::Up,
    ] {
        actor.tick(0.1, &press(state));
    }
    assert!(!module(&actor).buffer().is_empty(), "Second tap buffered");

    for _ in 0..60 {
        actor.tick(0.1, &InputState::default());
    }
    assert_eq!(shots_fired(&actor), 2, "Two taps, two shots");
    assert_eq!(weapon_state(&actor), Some(WeaponState::Idle));
}

#[test]
fn test_buffered_press_still_held_keeps_auto_firing() {
    let rifle = WeaponConfig {
        trigger_mode: TriggerMode::Auto,
        time_between_uses: 0.5,
        time_between_uses_release_interruption: false,
        ..WeaponConfig::named("Rifle")
    };
    let mut actor = buffered_gunner(rifle, buffering(1.0, false));

    actor.tick(0.1, &press(ButtonState::Down));
    actor.tick(0.1, &press(ButtonState::Up));
    actor.tick(0.1, &press(ButtonState::Down));
    for _ in 0..20 {
        actor.tick(0.1, &press(ButtonState::Pressed));
    }
    assert!(shots_fired(&actor) > 2, "Held trigger keeps the buffered shot going");
}
