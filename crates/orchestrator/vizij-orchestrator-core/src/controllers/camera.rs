use glam::Vec3;
use vizij_animation_core::{Clip, Mixer};

use crate::objects::Camera;

/// The managed camera and its optional sampler.
#[derive(Debug)]
pub struct CameraController {
    pub(crate) camera: Camera,
    pub(crate) mixer: Option<Mixer>,
}

impl CameraController {
    pub fn new(camera: Camera, animations: Vec<Clip>) -> Self {
        let mixer = (!animations.is_empty()).then(|| {
            let mut mixer = Mixer::new();
            for clip in animations {
                mixer.play(clip);
            }
            mixer
        });
        Self { camera, mixer }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn mixer(&self) -> Option<&Mixer> {
        self.mixer.as_ref()
    }

    /// Sample the camera clips, then roll `up` with the sampled orientation and
    /// aim at the sampled target.
    pub(crate) fn animate(&mut self, delta: f32) {
        let Some(mixer) = self.mixer.as_mut() else {
            return;
        };
        mixer.advance(delta, &mut self.camera);
        let camera = &mut self.camera;
        camera.update_projection_matrix();
        camera.up = camera.rotation * Vec3::Y;
        let target = camera.target;
        camera.look_at(target);
    }
}
