//! vizij-orchestrator
//!
//! The [`AnimationHelper`] owns skinned meshes, at most one camera and at most
//! one audio track, and advances them together each frame. Per mesh it samples
//! keyframes, resolves IK and grant bones (legacy or dependency order) and
//! steps physics; the camera is re-aimed after sampling and the audio track is
//! started and stopped against the shared timeline.

pub mod config;
pub mod controllers;
pub mod diagnostics;
pub mod error;
pub mod objects;
pub mod scheduler;
mod sync;

use indexmap::IndexMap;
use vizij_animation_core::Mixer;
use vizij_rig_core::{
    resolve_legacy, BoneOrder, BoneResolver, CcdIkFactory, GrantSolver, IkSolver,
    IkSolverFactory, PhysicsFactory, PoseData, ResolveContext, SkinnedMesh,
};

pub use crate::config::{
    AudioParams, CameraParams, ConfigError, Feature, FeatureToggles, HelperConfig, MeshParams,
    PoseOptions,
};
pub use crate::controllers::mesh::BeforePhysicsHook;
pub use crate::controllers::{AudioController, AudioState, CameraController, MeshController};
pub use crate::diagnostics::{Frame, FrameEvent};
pub use crate::error::{Collaborator, HelperError};
pub use crate::objects::{AudioTrack, Camera, ManagedObject, ObjectId, ObjectKind, Registration};

use crate::controllers::mesh::MeshPass;

pub struct AnimationHelper {
    pub(crate) config: HelperConfig,
    pub(crate) enabled: FeatureToggles,
    pub(crate) epoch: u64,
    /// Registration order is the per-frame mesh order.
    pub(crate) meshes: IndexMap<ObjectId, MeshController>,
    pub(crate) camera: Option<CameraController>,
    pub(crate) audio: Option<AudioController>,
    pub(crate) resolver: BoneResolver,
    ik_factory: Option<Box<dyn IkSolverFactory>>,
    physics_factory: Option<Box<dyn PhysicsFactory>>,
    pub(crate) before_physics: Option<BeforePhysicsHook>,
}

impl std::fmt::Debug for AnimationHelper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationHelper")
            .field("config", &self.config)
            .field("enabled", &self.enabled)
            .field("epoch", &self.epoch)
            .field("meshes", &self.meshes)
            .field("camera", &self.camera)
            .field("audio", &self.audio)
            .field("ik_factory", &self.ik_factory.is_some())
            .field("physics_factory", &self.physics_factory.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for AnimationHelper {
    fn default() -> Self {
        Self::with_config(HelperConfig::default())
    }
}

impl AnimationHelper {
    /// Validate `config` and build a helper with the CCD IK factory installed
    /// and no physics factory.
    pub fn new(config: HelperConfig) -> Result<Self, HelperError> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    fn with_config(config: HelperConfig) -> Self {
        Self {
            config,
            enabled: FeatureToggles::default(),
            epoch: 0,
            meshes: IndexMap::new(),
            camera: None,
            audio: None,
            resolver: BoneResolver::new(),
            ik_factory: Some(Box::new(CcdIkFactory)),
            physics_factory: None,
            before_physics: None,
        }
    }

    pub fn with_ik_factory(mut self, factory: impl IkSolverFactory + 'static) -> Self {
        self.ik_factory = Some(Box::new(factory));
        self
    }

    /// Remove the IK factory; registering animated meshes then fails.
    pub fn without_ik_factory(mut self) -> Self {
        self.ik_factory = None;
        self
    }

    pub fn with_physics_factory(mut self, factory: impl PhysicsFactory + 'static) -> Self {
        self.physics_factory = Some(Box::new(factory));
        self
    }

    /// Install the hook run on each mesh right before its own physics step.
    pub fn on_before_physics(
        &mut self,
        hook: impl FnMut(ObjectId, &mut SkinnedMesh) + Send + 'static,
    ) {
        self.before_physics = Some(Box::new(hook));
    }

    pub fn config(&self) -> &HelperConfig {
        &self.config
    }

    /// Number of completed `advance` calls.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn features(&self) -> FeatureToggles {
        self.enabled
    }

    pub fn is_enabled(&self, feature: Feature) -> bool {
        self.enabled.get(feature)
    }

    /// Managed objects of every kind.
    pub fn len(&self) -> usize {
        self.meshes.len() + usize::from(self.camera.is_some()) + usize::from(self.audio.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.kind_of(id).is_some()
    }

    pub fn kind_of(&self, id: ObjectId) -> Option<ObjectKind> {
        if self.meshes.contains_key(&id) {
            Some(ObjectKind::Mesh)
        } else if self.camera_id() == Some(id) {
            Some(ObjectKind::Camera)
        } else if self.audio_id() == Some(id) {
            Some(ObjectKind::Audio)
        } else {
            None
        }
    }

    fn camera_id(&self) -> Option<ObjectId> {
        self.camera.as_ref().map(|c| ObjectId::from(&c.camera))
    }

    fn audio_id(&self) -> Option<ObjectId> {
        self.audio.as_ref().map(|a| ObjectId::from(a.track()))
    }

    pub fn mesh(&self, id: ObjectId) -> Option<&SkinnedMesh> {
        self.meshes.get(&id).map(MeshController::mesh)
    }

    pub fn mesh_mut(&mut self, id: ObjectId) -> Option<&mut SkinnedMesh> {
        self.meshes.get_mut(&id).map(|m| &mut m.mesh)
    }

    pub fn mesh_controller(&self, id: ObjectId) -> Option<&MeshController> {
        self.meshes.get(&id)
    }

    /// Mesh ids in registration order.
    pub fn mesh_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.meshes.keys().copied()
    }

    pub fn camera(&self) -> Option<&Camera> {
        self.camera.as_ref().map(CameraController::camera)
    }

    pub fn camera_controller(&self) -> Option<&CameraController> {
        self.camera.as_ref()
    }

    pub fn audio(&self) -> Option<&AudioController> {
        self.audio.as_ref()
    }

    /// Sampler of a mesh or the camera.
    pub fn mixer(&self, id: ObjectId) -> Option<&Mixer> {
        match self.kind_of(id)? {
            ObjectKind::Mesh => self.meshes.get(&id)?.mixer.as_ref(),
            ObjectKind::Camera => self.camera.as_ref()?.mixer.as_ref(),
            ObjectKind::Audio => None,
        }
    }

    pub fn mixer_mut(&mut self, id: ObjectId) -> Option<&mut Mixer> {
        match self.kind_of(id)? {
            ObjectKind::Mesh => self.meshes.get_mut(&id)?.mixer.as_mut(),
            ObjectKind::Camera => self.camera.as_mut()?.mixer.as_mut(),
            ObjectKind::Audio => None,
        }
    }

    pub fn register(&mut self, registration: Registration) -> Result<ObjectId, HelperError> {
        match registration {
            Registration::Mesh(mesh, params) => self.register_mesh(mesh, params),
            Registration::Camera(camera, params) => self.register_camera(camera, params),
            Registration::Audio(track, params) => self.register_audio(track, params),
        }
    }

    /// Register a mesh. Animated meshes get an IK solver from the factory and a
    /// grant solver; meshes with physics parameters get an engine from the
    /// physics factory, warmed up before the call returns.
    pub fn register_mesh(
        &mut self,
        mesh: SkinnedMesh,
        params: MeshParams,
    ) -> Result<ObjectId, HelperError> {
        let id = ObjectId::from(&mesh);
        if self.meshes.contains_key(&id) {
            return Err(HelperError::RegistrationConflict {
                kind: ObjectKind::Mesh,
                id,
                reason: "already registered",
            });
        }
        for clip in &params.animations {
            clip.validate_basic()?;
        }
        let ik_factory = if params.animations.is_empty() {
            None
        } else {
            Some(
                self.ik_factory
                    .as_deref()
                    .ok_or(HelperError::MissingCollaborator(Collaborator::IkSolver))?,
            )
        };
        let physics_factory = match &params.physics {
            Some(_) => Some(
                self.physics_factory
                    .as_deref()
                    .ok_or(HelperError::MissingCollaborator(Collaborator::Physics))?,
            ),
            None => None,
        };

        let mut controller = MeshController::new(mesh);
        if let Some(factory) = ik_factory {
            controller.ik = Some(factory.create(&controller.mesh));
            controller.grant = Some(GrantSolver::for_model(&controller.mesh.model));
            controller.play_all(params.animations);
        }

        if let (Some(factory), Some(physics_params)) = (physics_factory, &params.physics) {
            controller.physics = Some(factory.create(&controller.mesh, physics_params));
            if controller.mixer.is_some() && physics_params.animation_warmup {
                let mut discarded = Vec::new();
                let mut pass = MeshPass {
                    config: &self.config,
                    enabled: &self.enabled,
                    resolver: &mut self.resolver,
                    before_physics: self.before_physics.as_mut(),
                    events: &mut discarded,
                };
                controller.animate(id, 0.0, &mut pass);
                if let Some(physics) = controller.physics.as_mut() {
                    physics.reset(&controller.mesh.skeleton);
                }
            }
            if let Some(physics) = controller.physics.as_mut() {
                physics.warmup(&mut controller.mesh.skeleton, physics_params.warmup);
            }
            let disabled = controller
                .mesh
                .model
                .apply_physics_ik_policy(self.enabled.physics);
            log::debug!(
                "mesh '{}': physics ready after {} warmup frames, {} ik links handed to physics",
                controller.mesh.name,
                physics_params.warmup,
                disabled
            );
        }

        log::debug!(
            "registered mesh '{}' ({id}): {} bones, sampler={}, physics={}",
            controller.mesh.name,
            controller.mesh.skeleton.len(),
            controller.mixer.is_some(),
            controller.physics.is_some()
        );
        self.meshes.insert(id, controller);
        if self.config.sync {
            sync::sync_durations(self);
        }
        Ok(id)
    }

    pub fn register_camera(
        &mut self,
        camera: Camera,
        params: CameraParams,
    ) -> Result<ObjectId, HelperError> {
        let id = ObjectId::from(&camera);
        if self.camera.is_some() {
            return Err(HelperError::RegistrationConflict {
                kind: ObjectKind::Camera,
                id,
                reason: if self.camera_id() == Some(id) {
                    "already registered"
                } else {
                    "another camera is registered"
                },
            });
        }
        for clip in &params.animations {
            clip.validate_basic()?;
        }
        log::debug!("registered camera '{}' ({id})", camera.name);
        self.camera = Some(CameraController::new(camera, params.animations));
        if self.config.sync {
            sync::sync_durations(self);
        }
        Ok(id)
    }

    pub fn register_audio(
        &mut self,
        track: AudioTrack,
        params: AudioParams,
    ) -> Result<ObjectId, HelperError> {
        let id = ObjectId::from(&track);
        if self.audio.is_some() {
            return Err(HelperError::RegistrationConflict {
                kind: ObjectKind::Audio,
                id,
                reason: if self.audio_id() == Some(id) {
                    "already registered"
                } else {
                    "another audio track is registered"
                },
            });
        }
        log::debug!(
            "registered audio '{}' ({id}): {:.3}s after {:.3}s delay",
            track.name,
            track.buffer_duration(),
            params.delay
        );
        self.audio = Some(AudioController::new(track, &params));
        if self.config.sync {
            sync::sync_durations(self);
        }
        Ok(id)
    }

    /// Drop the object's state and hand the object back.
    pub fn unregister(&mut self, id: ObjectId) -> Result<ManagedObject, HelperError> {
        let object = if let Some(controller) = self.meshes.shift_remove(&id) {
            ManagedObject::Mesh(controller.into_mesh())
        } else if self.camera_id() == Some(id) {
            let controller = self.camera.take().ok_or(HelperError::UnregisteredObject(id))?;
            ManagedObject::Camera(controller.camera)
        } else if self.audio_id() == Some(id) {
            let controller = self.audio.take().ok_or(HelperError::UnregisteredObject(id))?;
            ManagedObject::Audio(controller.track)
        } else {
            return Err(HelperError::UnregisteredObject(id));
        };
        log::debug!("unregistered {} {id}", object.kind());
        if self.config.sync {
            sync::sync_durations(self);
        }
        Ok(object)
    }

    /// Advance every managed object by `delta` seconds.
    pub fn advance(&mut self, delta: f32) -> Frame {
        self.epoch = self.epoch.wrapping_add(1);
        scheduler::run_frame(self, delta)
    }

    /// Pose a registered mesh; see [`apply_static_pose_to`](Self::apply_static_pose_to).
    pub fn apply_static_pose(
        &mut self,
        id: ObjectId,
        pose: &PoseData,
        options: PoseOptions,
    ) -> Result<(), HelperError> {
        let controller = self
            .meshes
            .get_mut(&id)
            .ok_or(HelperError::UnregisteredObject(id))?;
        static_pose(
            &mut controller.mesh,
            pose,
            options,
            &self.config,
            self.ik_factory.as_deref(),
            &mut self.resolver,
        )
    }

    /// Pose any skinned mesh from static deltas, then run IK and grant once
    /// with fresh solvers. The mesh need not be registered; for a registered
    /// one the sampler and pose backup are left untouched.
    pub fn apply_static_pose_to(
        &mut self,
        mesh: &mut SkinnedMesh,
        pose: &PoseData,
        options: PoseOptions,
    ) -> Result<(), HelperError> {
        static_pose(
            mesh,
            pose,
            options,
            &self.config,
            self.ik_factory.as_deref(),
            &mut self.resolver,
        )
    }

    /// Toggle a pipeline stage. Toggling physics re-derives which IK links may
    /// run on every mesh that has physics.
    pub fn enable(&mut self, feature: Feature, enabled: bool) {
        self.enabled.set(feature, enabled);
        log::debug!("feature {feature} -> {enabled}");
        if feature == Feature::Physics {
            for controller in self.meshes.values_mut().filter(|m| m.physics.is_some()) {
                controller.mesh.model.apply_physics_ik_policy(enabled);
            }
        }
    }

    /// [`enable`](Self::enable) by name.
    pub fn set_feature_enabled(&mut self, name: &str, enabled: bool) -> Result<(), HelperError> {
        let feature = name.parse::<Feature>().map_err(HelperError::UnknownFeature)?;
        self.enable(feature, enabled);
        Ok(())
    }

    /// A grant solver over the mesh's grant descriptors.
    pub fn create_grant_solver(&self, id: ObjectId) -> Result<GrantSolver, HelperError> {
        self.meshes
            .get(&id)
            .map(|m| GrantSolver::for_model(&m.mesh.model))
            .ok_or(HelperError::UnregisteredObject(id))
    }
}

fn static_pose(
    mesh: &mut SkinnedMesh,
    pose: &PoseData,
    options: PoseOptions,
    config: &HelperConfig,
    ik_factory: Option<&dyn IkSolverFactory>,
    resolver: &mut BoneResolver,
) -> Result<(), HelperError> {
    let mut ik_solver = if options.ik {
        let factory =
            ik_factory.ok_or(HelperError::MissingCollaborator(Collaborator::IkSolver))?;
        Some(factory.create(mesh))
    } else {
        None
    };
    let grant = options.grant.then(|| GrantSolver::for_model(&mesh.model));

    if options.reset_pose {
        mesh.skeleton.reset_to_bind_pose();
    }
    let applied = pose.apply_to(&mut mesh.skeleton);
    mesh.skeleton.update_world_matrices();
    log::debug!(
        "pose {:?} on '{}': {applied} of {} bones applied",
        pose.name,
        mesh.name,
        pose.bones.len()
    );

    let order = (config.dependency_order && mesh.model.format.supports_dependency_order())
        .then(|| BoneOrder::new(&mesh.model.bones));
    let ik: Option<&mut dyn IkSolver> = match ik_solver.as_mut() {
        Some(ik) => Some(&mut **ik),
        None => None,
    };
    let mut ctx = ResolveContext {
        skeleton: &mut mesh.skeleton,
        model: &mesh.model,
        ik,
        grant: grant.as_ref(),
    };
    match &order {
        Some(order) => resolver.resolve_all(&mut ctx, order.indices()),
        None => resolve_legacy(&mut ctx),
    }
    Ok(())
}
