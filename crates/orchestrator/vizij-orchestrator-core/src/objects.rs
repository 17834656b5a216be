//! Objects the helper manages: skinned meshes, a camera and an audio track.

use std::fmt;

use glam::{Mat3, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vizij_animation_core::{AnimationTarget, TargetHandle, TrackTarget, Value};
use vizij_rig_core::SkinnedMesh;

use crate::config::{AudioParams, CameraParams, MeshParams};

/// Caller-visible identity of a managed object (its UUID).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub Uuid);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&SkinnedMesh> for ObjectId {
    fn from(mesh: &SkinnedMesh) -> Self {
        ObjectId(mesh.id())
    }
}

impl From<&Camera> for ObjectId {
    fn from(camera: &Camera) -> Self {
        ObjectId(camera.id)
    }
}

impl From<&AudioTrack> for ObjectId {
    fn from(track: &AudioTrack) -> Self {
        ObjectId(track.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Mesh,
    Camera,
    Audio,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ObjectKind::Mesh => "mesh",
            ObjectKind::Camera => "camera",
            ObjectKind::Audio => "audio",
        })
    }
}

/// What `register` accepts: the object plus its kind-specific parameters.
#[derive(Debug)]
pub enum Registration {
    Mesh(SkinnedMesh, MeshParams),
    Camera(Camera, CameraParams),
    Audio(AudioTrack, AudioParams),
}

impl Registration {
    pub fn id(&self) -> ObjectId {
        match self {
            Registration::Mesh(mesh, _) => mesh.into(),
            Registration::Camera(camera, _) => camera.into(),
            Registration::Audio(track, _) => track.into(),
        }
    }

    pub fn kind(&self) -> ObjectKind {
        match self {
            Registration::Mesh(..) => ObjectKind::Mesh,
            Registration::Camera(..) => ObjectKind::Camera,
            Registration::Audio(..) => ObjectKind::Audio,
        }
    }
}

/// An object handed back by `unregister`.
#[derive(Debug)]
pub enum ManagedObject {
    Mesh(SkinnedMesh),
    Camera(Camera),
    Audio(AudioTrack),
}

impl ManagedObject {
    pub fn id(&self) -> ObjectId {
        match self {
            ManagedObject::Mesh(mesh) => mesh.into(),
            ManagedObject::Camera(camera) => camera.into(),
            ManagedObject::Audio(track) => track.into(),
        }
    }

    pub fn kind(&self) -> ObjectKind {
        match self {
            ManagedObject::Mesh(_) => ObjectKind::Mesh,
            ManagedObject::Camera(_) => ObjectKind::Camera,
            ManagedObject::Audio(_) => ObjectKind::Audio,
        }
    }

    pub fn into_mesh(self) -> Option<SkinnedMesh> {
        match self {
            ManagedObject::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }
}

const CAMERA_POSITION: TargetHandle = TargetHandle(0);
const CAMERA_ROTATION: TargetHandle = TargetHandle(1);
const CAMERA_FOV: TargetHandle = TargetHandle(2);
const CAMERA_TARGET: TargetHandle = TargetHandle(3);

/// Perspective camera with an animatable aim point. The camera looks down its
/// local -Z axis; `fov` is the vertical field of view in degrees.
#[derive(Debug, Clone)]
pub struct Camera {
    id: Uuid,
    pub name: String,
    pub position: Vec3,
    pub rotation: Quat,
    pub up: Vec3,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// Point the camera is re-aimed at after each animation step.
    pub target: Vec3,
    projection: Mat4,
}

impl Camera {
    pub fn new(name: impl Into<String>, fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            id: Uuid::new_v4(),
            name: name.into(),
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            up: Vec3::Y,
            fov,
            aspect,
            near,
            far,
            target: Vec3::ZERO,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera
    }

    #[inline]
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    pub fn update_projection_matrix(&mut self) {
        self.projection = Mat4::perspective_rh_gl(
            self.fov.to_radians(),
            self.aspect.max(0.0001),
            self.near,
            self.far,
        );
    }

    /// Orient the camera so -Z points at `point`, keeping `up` as close to
    /// vertical as possible. A camera sitting on the point keeps its rotation.
    pub fn look_at(&mut self, point: Vec3) {
        let mut z = self.position - point;
        if z.length_squared() == 0.0 {
            return;
        }
        z = z.normalize();
        let mut x = self.up.cross(z);
        if x.length_squared() == 0.0 {
            // up is parallel to the view direction; nudge the direction.
            if (self.up.z.abs() - 1.0).abs() < f32::EPSILON {
                z.x += 0.0001;
            } else {
                z.z += 0.0001;
            }
            z = z.normalize();
            x = self.up.cross(z);
        }
        x = x.normalize();
        let y = z.cross(x);
        self.rotation = Quat::from_mat3(&Mat3::from_cols(x, y, z)).normalize();
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position).inverse()
    }
}

impl AnimationTarget for Camera {
    fn resolve(&self, target: &TrackTarget) -> Option<TargetHandle> {
        match target {
            TrackTarget::CameraPosition => Some(CAMERA_POSITION),
            TrackTarget::CameraRotation => Some(CAMERA_ROTATION),
            TrackTarget::CameraFov => Some(CAMERA_FOV),
            TrackTarget::CameraTarget => Some(CAMERA_TARGET),
            TrackTarget::BonePosition { .. } | TrackTarget::BoneRotation { .. } => None,
        }
    }

    fn read(&self, handle: TargetHandle) -> Option<Value> {
        match handle {
            CAMERA_POSITION => Some(Value::Vec3(self.position)),
            CAMERA_ROTATION => Some(Value::Quat(self.rotation)),
            CAMERA_FOV => Some(Value::Float(self.fov)),
            CAMERA_TARGET => Some(Value::Vec3(self.target)),
            _ => None,
        }
    }

    fn write(&mut self, handle: TargetHandle, value: Value) {
        match (handle, value) {
            (CAMERA_POSITION, Value::Vec3(v)) => self.position = v,
            (CAMERA_ROTATION, Value::Quat(q)) => self.rotation = q.normalize(),
            (CAMERA_FOV, Value::Float(f)) => self.fov = f,
            (CAMERA_TARGET, Value::Vec3(v)) => self.target = v,
            _ => log::trace!("camera '{}': ignoring write to {:?}", self.name, handle),
        }
    }
}

/// Host-side audio handle. The helper only decides when it plays; decoding
/// and output belong to the host, which reads `is_playing`.
#[derive(Debug, Clone)]
pub struct AudioTrack {
    id: Uuid,
    pub name: String,
    buffer_duration: f32,
    playing: bool,
    play_count: u32,
}

impl AudioTrack {
    /// `buffer_duration` is the length of the decoded audio in seconds.
    pub fn new(name: impl Into<String>, buffer_duration: f32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            buffer_duration: buffer_duration.max(0.0),
            playing: false,
            play_count: 0,
        }
    }

    #[inline]
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn buffer_duration(&self) -> f32 {
        self.buffer_duration
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Times playback has started.
    pub fn play_count(&self) -> u32 {
        self.play_count
    }

    pub fn play(&mut self) {
        if !self.playing {
            self.playing = true;
            self.play_count += 1;
        }
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }
}
