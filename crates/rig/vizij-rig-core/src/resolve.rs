//! Per-frame bone resolution after sampling.
//!
//! Two modes:
//! - Dependency order ([`BoneResolver`]): bones visit in [`BoneOrder`] and each
//!   bone resolves its grant source before applying its grant, then runs its own
//!   IK chain. A provisional entry is recorded before recursing, so grant cycles
//!   terminate; values inside a cycle depend on visit order.
//! - Legacy ([`resolve_legacy`]): all IK chains, then all grants.
//!
//! [`BoneOrder`]: crate::order::BoneOrder

use glam::Quat;

use crate::grant::GrantSolver;
use crate::ik::IkSolver;
use crate::mesh::bone_rotation;
use crate::model::ModelData;
use crate::scratch::{RotationPool, RotationSlot};
use crate::skeleton::Skeleton;

/// Everything one resolution pass touches. A `None` solver disables that stage.
pub struct ResolveContext<'a> {
    pub skeleton: &'a mut Skeleton,
    pub model: &'a ModelData,
    pub ik: Option<&'a mut dyn IkSolver>,
    pub grant: Option<&'a GrantSolver>,
}

/// Memoized dependency-ordered evaluator. Reusable across meshes and frames;
/// every pass starts from a cleared map.
#[derive(Debug, Default)]
pub struct BoneResolver {
    pool: RotationPool,
    resolved: Vec<Option<RotationSlot>>,
}

impl BoneResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve every bone in `order`, then refresh world matrices once.
    pub fn resolve_all(&mut self, ctx: &mut ResolveContext<'_>, order: &[usize]) {
        self.pool.begin_frame();
        self.resolved.clear();
        self.resolved.resize(ctx.skeleton.len(), None);
        for &bone in order {
            self.resolve(ctx, bone);
        }
        ctx.skeleton.update_world_matrices();
    }

    /// Rotation recorded for `bone` by the last pass.
    pub fn resolved_rotation(&self, bone: usize) -> Option<Quat> {
        self.resolved
            .get(bone)
            .copied()
            .flatten()
            .map(|slot| self.pool.get(slot))
    }

    fn resolve(&mut self, ctx: &mut ResolveContext<'_>, bone: usize) {
        match self.resolved.get(bone) {
            Some(None) => {}
            _ => return,
        }
        let slot = self.pool.acquire(bone_rotation(ctx.skeleton, bone));
        self.resolved[bone] = Some(slot);

        let model = ctx.model;
        let Some(desc) = model.bones.get(bone) else {
            return;
        };

        if let Some(solver) = ctx.grant {
            let grant = desc.grant.and_then(|g| solver.grants().get(g));
            if let Some(grant) = grant.filter(|g| g.is_effective()) {
                self.resolve(ctx, grant.source);
                let source = self
                    .resolved_rotation(grant.source)
                    .unwrap_or_else(|| bone_rotation(ctx.skeleton, grant.source));
                if let Some(target) = ctx.skeleton.bone_mut(bone) {
                    GrantSolver::add_grant_rotation(&mut target.rotation, source, grant.ratio);
                }
            }
        }

        if let (Some(ik), Some(chain)) = (
            ctx.ik.as_deref_mut(),
            desc.ik.and_then(|k| model.iks.get(k)),
        ) {
            ctx.skeleton.update_world_matrices();
            ik.solve_chain(ctx.skeleton, chain);
            for link in chain.links.iter().filter(|l| l.enabled) {
                if let Some(Some(link_slot)) = self.resolved.get(link.index).copied() {
                    self.pool
                        .set(link_slot, bone_rotation(ctx.skeleton, link.index));
                }
            }
        }

        self.pool.set(slot, bone_rotation(ctx.skeleton, bone));
    }
}

/// Legacy evaluation: refresh world matrices, solve every IK chain, then apply
/// every grant in descriptor order and refresh once more.
pub fn resolve_legacy(ctx: &mut ResolveContext<'_>) {
    ctx.skeleton.update_world_matrices();
    if let Some(ik) = ctx.ik.as_deref_mut() {
        ik.solve_all(ctx.skeleton, &ctx.model.iks);
    }
    if let Some(grant) = ctx.grant {
        grant.solve_all(ctx.skeleton);
        ctx.skeleton.update_world_matrices();
    }
}
