//! The per-frame pipeline:
//!   audio -> meshes (registration order) -> shared physics -> camera

use indexmap::IndexMap;

use crate::controllers::mesh::MeshPass;
use crate::controllers::MeshController;
use crate::diagnostics::{Frame, FrameEvent};
use crate::objects::ObjectId;
use crate::AnimationHelper;

pub(crate) fn run_frame(helper: &mut AnimationHelper, delta: f32) -> Frame {
    let mut events = Vec::new();
    let AnimationHelper {
        config,
        enabled,
        epoch,
        meshes,
        camera,
        audio,
        resolver,
        before_physics,
        ..
    } = helper;

    if let Some(audio) = audio.as_mut() {
        let id = ObjectId::from(audio.track());
        let step = audio.control(delta);
        if step.stopped {
            events.push(FrameEvent::AudioStopped { audio: id });
        }
        if step.started {
            events.push(FrameEvent::AudioStarted { audio: id });
        }
    }

    let mut pass = MeshPass {
        config,
        enabled,
        resolver,
        before_physics: before_physics.as_mut(),
        events: &mut events,
    };
    for (id, mesh) in meshes.iter_mut() {
        mesh.animate(*id, delta, &mut pass);
    }

    if config.shared_physics && enabled.physics {
        step_shared_physics(meshes, delta);
    }

    if let Some(camera) = camera.as_mut() {
        if enabled.camera_animation {
            camera.animate(delta);
        }
    }

    Frame {
        epoch: *epoch,
        delta,
        events,
    }
}

/// One world step for every mesh: all push body state, the master (first mesh
/// with physics) steps, all pull bone state.
fn step_shared_physics(meshes: &mut IndexMap<ObjectId, MeshController>, delta: f32) {
    let Some(master) = meshes.values().position(|m| m.physics.is_some()) else {
        return;
    };
    for entry in meshes.values_mut() {
        if let Some(physics) = entry.physics.as_mut() {
            physics.push_body_state(&entry.mesh.skeleton);
        }
    }
    if let Some((_, entry)) = meshes.get_index_mut(master) {
        if let Some(physics) = entry.physics.as_mut() {
            physics.step_world(delta);
        }
    }
    for entry in meshes.values_mut() {
        if let Some(physics) = entry.physics.as_mut() {
            physics.pull_bone_state(&mut entry.mesh.skeleton);
        }
    }
}
