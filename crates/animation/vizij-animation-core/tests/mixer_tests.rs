use glam::{Quat, Vec3};
use vizij_animation_core::{
    AnimationTarget, Clip, ClipError, Keypoint, LoopMode, Mixer, MixerEvent, TargetHandle,
    Track, TrackTarget, Value, ValueKind,
};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

/// Slot table keyed by track target; counts writes.
#[derive(Default)]
struct Probe {
    slots: Vec<(TrackTarget, Value)>,
    writes: usize,
}

impl Probe {
    fn with(mut self, target: TrackTarget, value: Value) -> Self {
        self.slots.push((target, value));
        self
    }

    fn get(&self, target: &TrackTarget) -> Value {
        self.slots
            .iter()
            .find(|(t, _)| t == target)
            .map(|(_, v)| *v)
            .expect("slot exists")
    }
}

impl AnimationTarget for Probe {
    fn resolve(&self, target: &TrackTarget) -> Option<TargetHandle> {
        self.slots
            .iter()
            .position(|(t, _)| t == target)
            .map(|i| TargetHandle(i as u32))
    }

    fn read(&self, handle: TargetHandle) -> Option<Value> {
        self.slots.get(handle.0 as usize).map(|(_, v)| *v)
    }

    fn write(&mut self, handle: TargetHandle, value: Value) {
        if let Some(slot) = self.slots.get_mut(handle.0 as usize) {
            slot.1 = value;
            self.writes += 1;
        }
    }
}

fn bone_clip(name: &str, bone: &str, end: f32) -> Clip {
    Clip::new(
        name,
        vec![Track::new(
            TrackTarget::bone_position(bone),
            vec![
                Keypoint::new(0.0, Vec3::ZERO),
                Keypoint::new(end, Vec3::new(end, 0.0, 0.0)),
            ],
        )],
    )
}

#[test]
fn advance_writes_sampled_values() {
    let target = TrackTarget::bone_position("center");
    let mut probe = Probe::default().with(target.clone(), Value::Vec3(Vec3::ZERO));
    let mut mixer = Mixer::new();
    mixer.play(bone_clip("walk", "center", 2.0));

    let events = mixer.advance(0.5, &mut probe).to_vec();
    assert!(events.is_empty());
    let v = probe.get(&target).as_vec3().unwrap();
    approx(v.x, 0.5, 1e-6);
}

#[test]
fn loop_wraps_time_and_reports_bone_loop() {
    let mut probe =
        Probe::default().with(TrackTarget::bone_position("center"), Value::Vec3(Vec3::ZERO));
    let mut mixer = Mixer::new();
    let id = mixer.play(bone_clip("walk", "center", 1.0));

    mixer.advance(0.75, &mut probe);
    let events = mixer.advance(0.5, &mut probe).to_vec();
    assert_eq!(events.len(), 1);
    assert!(events[0].is_bone_loop());
    assert_eq!(events[0].action(), id);
    let action = mixer.action(id).unwrap();
    approx(action.time(), 0.25, 1e-6);
    assert_eq!(action.loop_count(), 1);

    // Several wraps in one tick collapse into one event.
    let events = mixer.advance(2.0, &mut probe).to_vec();
    assert!(matches!(events[0], MixerEvent::Loop { loop_delta: 2, .. }));
}

#[test]
fn camera_loop_is_not_a_bone_loop() {
    let mut probe = Probe::default().with(TrackTarget::CameraFov, Value::Float(45.0));
    let mut mixer = Mixer::new();
    mixer.play(Clip::new(
        "cam",
        vec![Track::new(
            TrackTarget::CameraFov,
            vec![Keypoint::new(0.0, 30.0_f32), Keypoint::new(1.0, 60.0_f32)],
        )],
    ));
    let events = mixer.advance(1.0, &mut probe).to_vec();
    assert_eq!(events.len(), 1);
    assert!(!events[0].is_bone_loop());
}

#[test]
fn stretched_duration_holds_last_key() {
    let target = TrackTarget::bone_position("center");
    let mut probe = Probe::default().with(target.clone(), Value::Vec3(Vec3::ZERO));
    let mut mixer = Mixer::new();
    let id = mixer.play(bone_clip("walk", "center", 1.0));
    mixer.action_mut(id).unwrap().set_duration(3.0);

    let events = mixer.advance(2.0, &mut probe).to_vec();
    assert!(events.is_empty());
    approx(probe.get(&target).as_vec3().unwrap().x, 1.0, 1e-6);
    assert_eq!(mixer.action(id).unwrap().authored_duration(), 1.0);
}

#[test]
fn once_mode_finishes_once() {
    let mut probe =
        Probe::default().with(TrackTarget::bone_position("center"), Value::Vec3(Vec3::ZERO));
    let mut mixer = Mixer::new();
    let id = mixer.play(bone_clip("jump", "center", 1.0));
    mixer.action_mut(id).unwrap().mode = LoopMode::Once;

    let first = mixer.advance(1.5, &mut probe).to_vec();
    assert!(matches!(first.as_slice(), [MixerEvent::Finished { .. }]));
    assert!(mixer.advance(1.0, &mut probe).is_empty());
    assert_eq!(mixer.action(id).unwrap().time(), 1.0);
}

#[test]
fn two_full_weight_actions_average_rotations() {
    let target = TrackTarget::bone_rotation("arm");
    let mut probe = Probe::default().with(target.clone(), Value::Quat(Quat::IDENTITY));
    let mut mixer = Mixer::new();
    mixer.play(Clip::new(
        "a",
        vec![Track::new(
            target.clone(),
            vec![Keypoint::new(0.0, Quat::from_rotation_y(0.2))],
        )],
    ));
    mixer.play(Clip::new(
        "b",
        vec![Track::new(
            target.clone(),
            vec![Keypoint::new(0.0, Quat::from_rotation_y(0.6))],
        )],
    ));
    mixer.advance(0.0, &mut probe);
    let q = probe.get(&target).as_quat().unwrap();
    assert!(q.angle_between(Quat::from_rotation_y(0.4)) < 1e-3);
}

#[test]
fn unbound_tracks_are_skipped() {
    let mut probe = Probe::default();
    let mut mixer = Mixer::new();
    mixer.play(bone_clip("walk", "missing", 1.0));
    mixer.advance(0.5, &mut probe);
    assert_eq!(probe.writes, 0);
}

#[test]
fn fixture_clips_validate_and_report_bone_use() {
    for name in vizij_test_fixtures::clips::keys() {
        let clip: Clip = vizij_test_fixtures::clips::load(&name).expect("clip fixture");
        clip.validate_basic().expect("valid clip");
        assert_eq!(clip.affects_bones(), name != "camera-pan", "{name}");
    }
}

#[test]
fn json_clip_with_wrong_value_kind_fails_validation() {
    let clip: Clip = serde_json::from_str(
        r#"{
            "name": "zoom",
            "duration": 1.0,
            "tracks": [{
                "target": { "kind": "camera_fov" },
                "points": [
                    { "time": 0.0, "value": { "type": "Float", "data": 30.0 } },
                    { "time": 1.0, "value": { "type": "Vec3", "data": [1.0, 2.0, 3.0] },
                      "curve": { "x1": 0.2, "y1": 0.0, "x2": 0.8, "y2": 1.0 } }
                ]
            }]
        }"#,
    )
    .expect("clip json");
    assert!(!clip.affects_bones());
    assert!(matches!(
        clip.validate_basic(),
        Err(ClipError::KindMismatch {
            expected: ValueKind::Float,
            found: ValueKind::Vec3,
            ..
        })
    ));
}
