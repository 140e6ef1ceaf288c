//! End-to-end tests for the full knobhub stack.
//!
//! Each test loads apps from a JSON slot list into a real registry wired to
//! a recording motor that drives a virtual knob, then turns the knob the way
//! the hardware would. No stdin, no runtime threads.

use std::sync::Arc;
use std::thread;

use knobhub_adapter_virtual::{RecordingMotor, VirtualKnob};
use knobhub_app::ports::StatePublisher;
use knobhub_app::registry::AppRegistry;
use knobhub_app::report_bus::InProcessReportBus;
use knobhub_domain::app_kind::AppKind;
use knobhub_domain::id::AppId;
use knobhub_domain::knob::KnobState;
use knobhub_domain::setting::SettingKind;
use knobhub_domain::slot::{AppSlot, parse_json_slots};

struct Stack {
    registry: AppRegistry<Arc<RecordingMotor>>,
    motor: Arc<RecordingMotor>,
    knob: Arc<VirtualKnob>,
}

fn slots() -> Vec<AppSlot> {
    let json = serde_json::json!([
        {
            "position": 0,
            "app_slug": "climate",
            "app_id": "living_room",
            "friendly_name": "Living Room",
            "entity_id": "climate.living_room"
        },
        {
            "position": 1,
            "app_slug": "blinds",
            "app_id": "blinds",
            "entity_id": "cover.office"
        },
        {
            "position": 2,
            "app_slug": "light_dimmer",
            "app_id": "dimmer",
            "entity_id": "light.desk"
        },
        { "position": 3, "app_slug": "toaster", "app_id": "kitchen" },
        { "position": "four", "app_slug": "blinds", "app_id": "broken" }
    ]);
    parse_json_slots(&json)
        .unwrap()
        .into_iter()
        .filter_map(Result::ok)
        .collect()
}

fn stack() -> Stack {
    let knob = Arc::new(VirtualKnob::new());
    let motor = Arc::new(RecordingMotor::driving(Arc::clone(&knob)));
    let registry = AppRegistry::new(Arc::clone(&motor));
    registry.reload(&slots());
    Stack {
        registry,
        motor,
        knob,
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[test]
fn should_load_only_valid_slots() {
    let stack = stack();
    let ids: Vec<_> = stack
        .registry
        .menu()
        .into_iter()
        .map(|entry| entry.app_id.to_string())
        .collect();
    assert_eq!(ids, ["living_room", "blinds", "dimmer"]);
    assert_eq!(stack.registry.active_id(), None);
    assert_eq!(stack.motor.count(), 0);
}

// ---------------------------------------------------------------------------
// Knob input
// ---------------------------------------------------------------------------

#[test]
fn should_round_temperature_to_nearest_half_degree() {
    let stack = stack();
    stack.registry.set_active("living_room");

    let changed = stack
        .registry
        .apply_entity_state("living_room", &serde_json::json!({"temperature": 20.3}))
        .unwrap();

    assert!(changed);
    let report = stack.registry.active_report().unwrap();
    assert_eq!(report.state_json().unwrap()["temperature"], 20.5);
    assert_eq!(stack.knob.state().current_position, 9);
}

#[test]
fn should_clamp_fan_speed_and_report_each_change_once() {
    let stack = stack();
    stack.registry.set_active("living_room");
    stack.registry.navigation_next();
    assert_eq!(stack.registry.navigation_next(), Some(SettingKind::FanSpeed));

    let low = stack.registry.update(&KnobState::at(-5)).unwrap();
    assert!(low.changed);
    assert_eq!(low.state_json().unwrap()["fan_speed"], 0);
    assert!(stack.registry.update(&KnobState::at(-5)).is_none());

    let high = stack.registry.update(&KnobState::at(99)).unwrap();
    assert!(high.changed);
    assert_eq!(high.state_json().unwrap()["fan_speed"], 2);
    assert!(stack.registry.update(&KnobState::at(99)).is_none());
}

#[test]
fn should_follow_knob_rotation_through_motor_profiles() {
    let stack = stack();
    stack.registry.set_active("dimmer");

    for _ in 0..3 {
        stack.registry.update(&stack.knob.rotate(2));
    }

    let report = stack.registry.active_report().unwrap();
    assert_eq!(report.app_slug, AppKind::LightDimmer);
    assert_eq!(report.state_json().unwrap()["brightness"], 30.0);
    assert_eq!(stack.knob.profile().position, 6);
    assert_eq!(stack.motor.count_for("dimmer"), 4);
}

#[test]
fn should_ignore_knob_report_taken_before_app_switch() {
    let stack = stack();
    stack.registry.set_active("blinds");
    let stale = stack.knob.rotate(5);

    stack.registry.set_active("dimmer");

    assert!(stack.registry.update(&stale).is_none());
    let report = stack.registry.active_report().unwrap();
    assert_eq!(report.state_json().unwrap()["brightness"], 0.0);
}

// ---------------------------------------------------------------------------
// Switching
// ---------------------------------------------------------------------------

#[test]
fn should_keep_active_app_when_opening_missing_one() {
    let stack = stack();
    assert!(stack.registry.set_active("dimmer"));
    assert!(!stack.registry.set_active("missing"));

    assert_eq!(stack.registry.active_id(), Some(AppId::new("dimmer")));
    assert_eq!(stack.knob.profile().id.as_str(), "dimmer");
}

#[test]
fn should_restore_each_app_value_when_switching_back() {
    let stack = stack();
    stack.registry.set_active("blinds");
    stack.registry.update(&stack.knob.rotate(8));
    stack.registry.set_active("dimmer");
    stack.registry.update(&stack.knob.rotate(2));

    stack.registry.set_active("blinds");

    assert_eq!(stack.knob.profile().position, 8);
    assert_eq!(stack.knob.rotate(1).current_position, 9);
}

#[test]
fn should_deactivate_app_removed_by_reload() {
    let stack = stack();
    stack.registry.set_active("dimmer");

    let loaded = stack.registry.reload(&slots()[..2]);

    assert_eq!(loaded, 2);
    assert_eq!(stack.registry.active_id(), None);
    assert!(stack.registry.render_active().is_empty());
    assert!(stack.registry.update(&KnobState::at(3)).is_none());
}

// ---------------------------------------------------------------------------
// Reporting
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_publish_state_updates_to_subscribers() {
    let stack = stack();
    let bus = InProcessReportBus::new(16);
    let mut rx = bus.subscribe();
    stack.registry.set_active("blinds");

    let update = stack.registry.update(&stack.knob.rotate(10)).unwrap();
    bus.publish(update).await.unwrap();

    let received = rx.recv().await.unwrap();
    assert_eq!(received.entity_id.as_str(), "cover.office");
    assert_eq!(
        received.state_json().unwrap(),
        serde_json::json!({"position": 50.0, "current_setting": 0})
    );
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[test]
fn should_render_consistent_frames_while_knob_entity_and_switches_race() {
    let stack = Arc::new(stack());
    stack.registry.set_active("living_room");

    let control = {
        let stack = Arc::clone(&stack);
        thread::spawn(move || {
            for round in 0..1_500 {
                stack.registry.update(&stack.knob.rotate(if round % 3 == 0 { -1 } else { 1 }));
                if round % 11 == 0 {
                    stack.registry.navigation_next();
                }
                if round % 97 == 0 {
                    let target = if round % 2 == 0 { "dimmer" } else { "living_room" };
                    stack.registry.set_active(target);
                }
            }
        })
    };

    let entity = {
        let stack = Arc::clone(&stack);
        thread::spawn(move || {
            for round in 0..1_500 {
                let temperature = 18.0 + f64::from(round % 8) * 0.5;
                stack
                    .registry
                    .apply_entity_state("living_room", &serde_json::json!({"temperature": temperature}))
                    .unwrap();
            }
        })
    };

    let render = {
        let stack = Arc::clone(&stack);
        thread::spawn(move || {
            for _ in 0..1_500 {
                let frame = stack.registry.render_active();
                let (Some(app_id), Some(setting), Some(value), Some(gauge)) =
                    (&frame.app_id, frame.setting, frame.value, &frame.gauge)
                else {
                    panic!("an app is always active");
                };
                assert_eq!(&frame.profile.id, app_id);
                assert_eq!(value.setting(), setting);
                assert_eq!(gauge.setting, setting);
                assert_eq!(frame.profile.max_position, setting.spec().max_position());
                assert_eq!(frame.profile.position, value.position());
            }
        })
    };

    control.join().unwrap();
    entity.join().unwrap();
    render.join().unwrap();

    for id in ["living_room", "dimmer"] {
        let nonces: Vec<_> = stack
            .motor
            .pushes()
            .into_iter()
            .filter(|p| p.id.as_str() == id)
            .map(|p| p.nonce)
            .collect();
        for pair in nonces.windows(2) {
            assert!(pair[1].is_newer_than(pair[0]));
        }
    }
}
