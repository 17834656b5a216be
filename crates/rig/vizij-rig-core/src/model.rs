//! Per-model rig descriptors: bones, grants, IK chains, rigid bodies, constraints.
//!
//! Descriptors are read-only to the frame pipeline, with one exception: the
//! `enabled` flag on IK links, which follows the physics toggle.

use std::sync::Arc;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::RigError;

fn default_true() -> bool {
    true
}

fn default_iteration() -> u32 {
    1
}

/// Source format of the model. Only PMX carries the transformation classes the
/// dependency-ordered resolver relies on.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModelFormat {
    #[default]
    Pmd,
    Pmx,
}

impl ModelFormat {
    #[inline]
    pub fn supports_dependency_order(self) -> bool {
        matches!(self, ModelFormat::Pmx)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BoneDescriptor {
    pub index: usize,
    /// Evaluation rank; lower classes resolve first.
    #[serde(default)]
    pub transformation_class: i32,
    /// Index into [`ModelData::iks`] of the chain this bone drives.
    #[serde(default)]
    pub ik: Option<usize>,
    /// Index into [`ModelData::grants`] of the grant targeting this bone.
    #[serde(default)]
    pub grant: Option<usize>,
}

impl BoneDescriptor {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            transformation_class: 0,
            ik: None,
            grant: None,
        }
    }
}

/// Rotation (and, in the format, position) propagation from `source` onto `target`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GrantDescriptor {
    pub target: usize,
    pub source: usize,
    #[serde(default)]
    pub is_local: bool,
    #[serde(default)]
    pub affects_position: bool,
    #[serde(default = "default_true")]
    pub affects_rotation: bool,
    pub ratio: f32,
}

impl GrantDescriptor {
    /// Non-local rotation grant, the only variant that has an effect.
    pub fn rotation(target: usize, source: usize, ratio: f32) -> Self {
        Self {
            target,
            source,
            is_local: false,
            affects_position: false,
            affects_rotation: true,
            ratio,
        }
    }

    #[inline]
    pub fn is_effective(&self) -> bool {
        !self.is_local && self.affects_rotation
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct IkLink {
    pub index: usize,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Hinge axis; when set the link may only rotate about it.
    #[serde(default)]
    pub limitation: Option<Vec3>,
    /// Euler XYZ lower bound (radians).
    #[serde(default)]
    pub rotation_min: Option<Vec3>,
    /// Euler XYZ upper bound (radians).
    #[serde(default)]
    pub rotation_max: Option<Vec3>,
}

impl IkLink {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            enabled: true,
            limitation: None,
            rotation_min: None,
            rotation_max: None,
        }
    }
}

/// Links are ordered from the effector's parent towards the chain root.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct IkChain {
    /// Bone whose world position is the goal (the IK bone).
    pub target: usize,
    /// Bone pulled towards the goal.
    pub effector: usize,
    pub links: Vec<IkLink>,
    #[serde(default = "default_iteration")]
    pub iteration: u32,
    #[serde(default)]
    pub min_angle: Option<f32>,
    #[serde(default)]
    pub max_angle: Option<f32>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RigidBodyKind {
    /// Follows the bone; physics never writes the bone back.
    Kinematic,
    /// Simulated; drives the bone's rotation and position.
    Dynamic,
    /// Simulated rotation, position kept from the bone.
    DynamicWithBone,
}

impl RigidBodyKind {
    /// Whether physics owns the attached bone's rotation.
    #[inline]
    pub fn overrides_rotation(self) -> bool {
        !matches!(self, RigidBodyKind::Kinematic)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RigidBodyShape {
    Sphere { radius: f32 },
    Box { half_extents: Vec3 },
    Capsule { radius: f32, height: f32 },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RigidBodyDescriptor {
    pub name: String,
    /// Attached bone; `None` for free bodies.
    #[serde(default)]
    pub bone: Option<usize>,
    pub kind: RigidBodyKind,
    pub shape: RigidBodyShape,
    #[serde(default)]
    pub mass: f32,
    #[serde(default)]
    pub position: Vec3,
    /// Euler XYZ (radians).
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default)]
    pub group: u8,
    #[serde(default)]
    pub mask: u16,
    #[serde(default)]
    pub linear_damping: f32,
    #[serde(default)]
    pub angular_damping: f32,
    #[serde(default)]
    pub restitution: f32,
    #[serde(default)]
    pub friction: f32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ConstraintDescriptor {
    pub name: String,
    pub body_a: usize,
    pub body_b: usize,
    #[serde(default)]
    pub position: Vec3,
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default)]
    pub translation_min: Vec3,
    #[serde(default)]
    pub translation_max: Vec3,
    #[serde(default)]
    pub rotation_min: Vec3,
    #[serde(default)]
    pub rotation_max: Vec3,
    #[serde(default)]
    pub spring_position: Vec3,
    #[serde(default)]
    pub spring_rotation: Vec3,
}

/// Everything the pipeline knows about a model beyond its skeleton.
///
/// `bones[i]` describes skeleton bone `i`.
/// `bones` sits behind an `Arc` so caches derived from it (the bone order) can
/// detect a replaced descriptor list by pointer identity.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ModelData {
    #[serde(default)]
    pub format: ModelFormat,
    pub bones: Arc<[BoneDescriptor]>,
    #[serde(default)]
    pub grants: Vec<GrantDescriptor>,
    #[serde(default)]
    pub iks: Vec<IkChain>,
    #[serde(default)]
    pub rigid_bodies: Vec<RigidBodyDescriptor>,
    #[serde(default)]
    pub constraints: Vec<ConstraintDescriptor>,
}

impl ModelData {
    pub fn new(format: ModelFormat, bones: Vec<BoneDescriptor>) -> Self {
        Self {
            format,
            bones: bones.into(),
            grants: Vec::new(),
            iks: Vec::new(),
            rigid_bodies: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// Descriptors for `count` bones with no grant, IK or class information.
    pub fn plain(format: ModelFormat, count: usize) -> Self {
        Self::new(format, (0..count).map(BoneDescriptor::new).collect())
    }

    /// Swap in a new descriptor list (invalidates cached bone orders).
    pub fn set_bones(&mut self, bones: Vec<BoneDescriptor>) {
        self.bones = bones.into();
    }

    /// Kind of the rigid body attached to `bone`; the last attached body wins.
    pub fn rigid_body_kind(&self, bone: usize) -> Option<RigidBodyKind> {
        self.rigid_bodies
            .iter()
            .rev()
            .find(|rb| rb.bone == Some(bone))
            .map(|rb| rb.kind)
    }

    /// Enable or disable IK links according to the physics toggle: with physics
    /// on, links on bones whose rotation physics owns are disabled; with physics
    /// off every link is enabled. Returns the number of disabled links.
    pub fn apply_physics_ik_policy(&mut self, physics_enabled: bool) -> usize {
        let owned: Vec<bool> = if physics_enabled {
            let len = self
                .iks
                .iter()
                .flat_map(|ik| ik.links.iter().map(|l| l.index + 1))
                .max()
                .unwrap_or(0);
            (0..len)
                .map(|i| self.rigid_body_kind(i).is_some_and(RigidBodyKind::overrides_rotation))
                .collect()
        } else {
            Vec::new()
        };
        let mut disabled = 0;
        for link in self.iks.iter_mut().flat_map(|ik| ik.links.iter_mut()) {
            link.enabled = !owned.get(link.index).copied().unwrap_or(false);
            if !link.enabled {
                disabled += 1;
            }
        }
        disabled
    }

    /// Check references against a skeleton of `bone_count` bones.
    pub fn validate(&self, bone_count: usize) -> Result<(), RigError> {
        if self.bones.len() != bone_count {
            return Err(RigError::DescriptorCount {
                descriptors: self.bones.len(),
                bones: bone_count,
            });
        }
        let check = |what: &'static str, index: usize, bone: usize| {
            if bone < bone_count {
                Ok(())
            } else {
                Err(RigError::BoneOutOfRange {
                    what,
                    index,
                    bone,
                    len: bone_count,
                })
            }
        };
        for (i, grant) in self.grants.iter().enumerate() {
            if grant.source == grant.target {
                return Err(RigError::SelfGrant {
                    grant: i,
                    bone: grant.target,
                });
            }
            check("grant", i, grant.target)?;
            check("grant", i, grant.source)?;
        }
        for (i, ik) in self.iks.iter().enumerate() {
            check("ik chain", i, ik.target)?;
            check("ik chain", i, ik.effector)?;
            for link in &ik.links {
                check("ik chain", i, link.index)?;
            }
        }
        for (i, desc) in self.bones.iter().enumerate() {
            if desc.index != i {
                return Err(RigError::DescriptorIndex {
                    position: i,
                    index: desc.index,
                });
            }
            if let Some(ik) = desc.ik.filter(|ik| *ik >= self.iks.len()) {
                return Err(RigError::DanglingReference {
                    index: i,
                    what: "ik chain",
                    reference: ik,
                });
            }
            if let Some(grant) = desc.grant.filter(|g| *g >= self.grants.len()) {
                return Err(RigError::DanglingReference {
                    index: i,
                    what: "grant",
                    reference: grant,
                });
            }
            let mismatch = |what, reference, target| RigError::MismatchedReference {
                bone: i,
                what,
                reference,
                target,
            };
            if let Some(k) = desc.ik.filter(|k| self.iks[*k].target != i) {
                return Err(mismatch("ik chain", k, self.iks[k].target));
            }
            if let Some(g) = desc.grant.filter(|g| self.grants[*g].target != i) {
                return Err(mismatch("grant", g, self.grants[g].target));
            }
        }
        // Both resolve modes must see the same grants and chains: every entry
        // is reachable from its target bone's descriptor.
        for (i, grant) in self.grants.iter().enumerate() {
            if self.bones[grant.target].grant != Some(i) {
                return Err(RigError::UnreferencedTarget {
                    what: "grant",
                    index: i,
                    target: grant.target,
                });
            }
        }
        for (i, ik) in self.iks.iter().enumerate() {
            if self.bones[ik.target].ik != Some(i) {
                return Err(RigError::UnreferencedTarget {
                    what: "ik chain",
                    index: i,
                    target: ik.target,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(bone: usize, kind: RigidBodyKind) -> RigidBodyDescriptor {
        RigidBodyDescriptor {
            name: format!("rb{bone}"),
            bone: Some(bone),
            kind,
            shape: RigidBodyShape::Sphere { radius: 0.5 },
            mass: 1.0,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            group: 0,
            mask: 0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            restitution: 0.0,
            friction: 0.0,
        }
    }

    #[test]
    fn physics_policy_toggles_owned_links() {
        let mut model = ModelData::plain(ModelFormat::Pmx, 4);
        model.iks.push(IkChain {
            target: 3,
            effector: 2,
            links: vec![IkLink::new(1), IkLink::new(0)],
            iteration: 4,
            min_angle: None,
            max_angle: None,
        });
        model.rigid_bodies.push(body(0, RigidBodyKind::Kinematic));
        model.rigid_bodies.push(body(1, RigidBodyKind::DynamicWithBone));

        assert_eq!(model.apply_physics_ik_policy(true), 1);
        assert!(!model.iks[0].links[0].enabled);
        assert!(model.iks[0].links[1].enabled);

        assert_eq!(model.apply_physics_ik_policy(false), 0);
        assert!(model.iks[0].links.iter().all(|l| l.enabled));
    }

    #[test]
    fn validate_catches_self_grant_and_dangling_refs() {
        let mut model = ModelData::plain(ModelFormat::Pmx, 3);
        model.grants.push(GrantDescriptor::rotation(1, 1, 0.5));
        assert_eq!(
            model.validate(3),
            Err(RigError::SelfGrant { grant: 0, bone: 1 })
        );

        model.grants[0].source = 2;
        let mut bones = model.bones.to_vec();
        bones[1].ik = Some(0);
        model.set_bones(bones);
        assert!(matches!(
            model.validate(3),
            Err(RigError::DanglingReference { what: "ik chain", .. })
        ));

        assert!(matches!(
            ModelData::plain(ModelFormat::Pmd, 2).validate(3),
            Err(RigError::DescriptorCount { .. })
        ));
    }

    #[test]
    fn validate_requires_descriptors_and_entries_to_agree() {
        let mut model = ModelData::plain(ModelFormat::Pmx, 3);
        model.grants.push(GrantDescriptor::rotation(1, 0, 1.0));
        assert_eq!(
            model.validate(3),
            Err(RigError::UnreferencedTarget {
                what: "grant",
                index: 0,
                target: 1
            })
        );

        let mut bones = model.bones.to_vec();
        bones[2].grant = Some(0);
        model.set_bones(bones);
        assert_eq!(
            model.validate(3),
            Err(RigError::MismatchedReference {
                bone: 2,
                what: "grant",
                reference: 0,
                target: 1
            })
        );

        let mut bones = model.bones.to_vec();
        bones[2].grant = None;
        bones[1].grant = Some(0);
        model.set_bones(bones);
        assert_eq!(model.validate(3), Ok(()));
    }

    #[test]
    fn validate_requires_ik_targets_to_own_their_chain() {
        let mut model = ModelData::plain(ModelFormat::Pmx, 3);
        model.iks.push(IkChain {
            target: 2,
            effector: 1,
            links: vec![IkLink::new(0)],
            iteration: 1,
            min_angle: None,
            max_angle: None,
        });
        assert_eq!(
            model.validate(3),
            Err(RigError::UnreferencedTarget {
                what: "ik chain",
                index: 0,
                target: 2
            })
        );

        let mut bones = model.bones.to_vec();
        bones[0].ik = Some(0);
        model.set_bones(bones);
        assert_eq!(
            model.validate(3),
            Err(RigError::MismatchedReference {
                bone: 0,
                what: "ik chain",
                reference: 0,
                target: 2
            })
        );

        let mut bones = model.bones.to_vec();
        bones[0].ik = None;
        bones[2].ik = Some(0);
        model.set_bones(bones);
        assert_eq!(model.validate(3), Ok(()));
    }

    #[test]
    fn deserializes_from_json() {
        let model: ModelData = serde_json::from_str(
            r#"{
                "format": "pmx",
                "bones": [{"index": 0}, {"index": 1, "transformation_class": 1, "grant": 0}],
                "grants": [{"target": 1, "source": 0, "ratio": 0.5}]
            }"#,
        )
        .unwrap();
        assert!(model.format.supports_dependency_order());
        assert!(model.grants[0].is_effective());
        assert_eq!(model.bones[1].transformation_class, 1);
        assert!(model.validate(2).is_ok());
    }
}
