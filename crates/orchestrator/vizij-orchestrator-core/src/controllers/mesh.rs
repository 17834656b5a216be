//! Per-mesh state and the per-frame mesh pass.

use vizij_animation_core::{Clip, Mixer, MixerEvent};
use vizij_rig_core::{
    resolve_legacy, BoneOrder, BoneResolver, GrantSolver, IkSolver, PhysicsEngine, PoseBackup,
    ResolveContext, SkinnedMesh,
};

use crate::config::{FeatureToggles, HelperConfig};
use crate::diagnostics::FrameEvent;
use crate::objects::ObjectId;

/// Caller hook run on each mesh right before its physics step.
pub type BeforePhysicsHook = Box<dyn FnMut(ObjectId, &mut SkinnedMesh) + Send>;

/// Shared inputs of one mesh pass.
pub(crate) struct MeshPass<'a> {
    pub config: &'a HelperConfig,
    pub enabled: &'a FeatureToggles,
    pub resolver: &'a mut BoneResolver,
    pub before_physics: Option<&'a mut BeforePhysicsHook>,
    pub events: &'a mut Vec<FrameEvent>,
}

/// A registered mesh with its sampler, solver and physics handles.
pub struct MeshController {
    pub(crate) mesh: SkinnedMesh,
    pub(crate) mixer: Option<Mixer>,
    pub(crate) ik: Option<Box<dyn IkSolver>>,
    pub(crate) grant: Option<GrantSolver>,
    pub(crate) physics: Option<Box<dyn PhysicsEngine>>,
    order: Option<BoneOrder>,
    backup: Option<PoseBackup>,
    looped: bool,
}

impl std::fmt::Debug for MeshController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeshController")
            .field("mesh", &self.mesh.name)
            .field("mixer", &self.mixer.as_ref().map(|m| m.actions().len()))
            .field("ik", &self.ik.is_some())
            .field("grant", &self.grant.is_some())
            .field("physics", &self.physics.is_some())
            .field("looped", &self.looped)
            .finish_non_exhaustive()
    }
}

impl MeshController {
    pub(crate) fn new(mesh: SkinnedMesh) -> Self {
        Self {
            mesh,
            mixer: None,
            ik: None,
            grant: None,
            physics: None,
            order: None,
            backup: None,
            looped: false,
        }
    }

    pub(crate) fn play_all(&mut self, animations: Vec<Clip>) {
        let mixer = self.mixer.get_or_insert_with(Mixer::new);
        for clip in animations {
            mixer.play(clip);
        }
    }

    pub fn mesh(&self) -> &SkinnedMesh {
        &self.mesh
    }

    pub fn mixer(&self) -> Option<&Mixer> {
        self.mixer.as_ref()
    }

    pub fn grant_solver(&self) -> Option<&GrantSolver> {
        self.grant.as_ref()
    }

    pub fn has_ik(&self) -> bool {
        self.ik.is_some()
    }

    pub fn has_physics(&self) -> bool {
        self.physics.is_some()
    }

    pub fn backup(&self) -> Option<&PoseBackup> {
        self.backup.as_ref()
    }

    /// Bone order cached for the dependency-ordered resolver, once built.
    pub fn bone_order(&self) -> Option<&BoneOrder> {
        self.order.as_ref()
    }

    /// A bone-affecting loop has been seen and not yet consumed.
    pub fn is_looped(&self) -> bool {
        self.looped
    }

    pub(crate) fn into_mesh(self) -> SkinnedMesh {
        self.mesh
    }

    /// Restore, sample and snapshot, resolve bones, honor loops, then step physics.
    pub(crate) fn animate(&mut self, id: ObjectId, delta: f32, pass: &mut MeshPass<'_>) {
        if pass.enabled.animation {
            if let Some(mixer) = self.mixer.as_mut() {
                if let Some(backup) = &self.backup {
                    backup.restore(&mut self.mesh.skeleton);
                }
                for event in mixer.advance(delta, &mut self.mesh) {
                    if let MixerEvent::Loop {
                        clip,
                        affects_bones: true,
                        ..
                    } = event
                    {
                        self.looped = true;
                        pass.events.push(FrameEvent::MeshLooped {
                            mesh: id,
                            clip: clip.clone(),
                        });
                    }
                }
                self.backup
                    .get_or_insert_with(PoseBackup::default)
                    .save(&self.mesh.skeleton);
                self.resolve_bones(pass);
            }
        }

        if self.looped {
            if pass.enabled.physics && pass.config.reset_physics_on_loop {
                if let Some(physics) = self.physics.as_mut() {
                    log::debug!("mesh '{}': loop boundary, resetting physics", self.mesh.name);
                    physics.reset(&self.mesh.skeleton);
                    pass.events.push(FrameEvent::PhysicsReset { mesh: id });
                }
            }
            self.looped = false;
        }

        if pass.enabled.physics && !pass.config.shared_physics {
            if let Some(physics) = self.physics.as_mut() {
                if let Some(hook) = pass.before_physics.as_deref_mut() {
                    hook(id, &mut self.mesh);
                }
                physics.update(&mut self.mesh.skeleton, delta);
            }
        }
    }

    fn resolve_bones(&mut self, pass: &mut MeshPass<'_>) {
        let dependency =
            pass.config.dependency_order && self.mesh.model.format.supports_dependency_order();
        if dependency
            && !self
                .order
                .as_ref()
                .is_some_and(|order| order.is_current(&self.mesh.model.bones))
        {
            self.order = Some(BoneOrder::new(&self.mesh.model.bones));
        }

        let ik: Option<&mut dyn IkSolver> = match self.ik.as_mut() {
            Some(ik) if pass.enabled.ik => Some(&mut **ik),
            _ => None,
        };
        let grant = self.grant.as_ref().filter(|_| pass.enabled.grant);
        let mut ctx = ResolveContext {
            skeleton: &mut self.mesh.skeleton,
            model: &self.mesh.model,
            ik,
            grant,
        };
        match self.order.as_ref().filter(|_| dependency) {
            Some(order) => pass.resolver.resolve_all(&mut ctx, order.indices()),
            None => resolve_legacy(&mut ctx),
        }
    }
}
