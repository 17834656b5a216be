//! vizij-rig-core
//!
//! Skeleton state and the bone-resolution machinery that runs after keyframe
//! sampling each frame:
//!
//! - [`GrantSolver`]: ratio-weighted rotation propagation between bones.
//! - [`BoneOrder`]: evaluation order by (transformation class, index).
//! - [`BoneResolver`]: memoized per-bone evaluation interleaving grant and IK,
//!   safe against grant cycles.
//! - [`CcdIkSolver`]: cyclic-coordinate-descent IK behind the [`IkSolver`] seam.
//! - [`PhysicsEngine`]: the seam a rigid-body backend plugs into.
//! - [`PoseBackup`] and [`PoseData`]: pose snapshots and static pose deltas.

pub mod backup;
pub mod error;
pub mod grant;
pub mod ik;
pub mod mesh;
pub mod model;
pub mod order;
pub mod physics;
pub mod pose;
pub mod resolve;
pub mod scratch;
pub mod skeleton;

pub use backup::{PoseBackup, POSE_STRIDE};
pub use error::RigError;
pub use grant::GrantSolver;
pub use ik::{CcdIkFactory, CcdIkSolver, IkSolver, IkSolverFactory};
pub use mesh::SkinnedMesh;
pub use model::{
    BoneDescriptor, ConstraintDescriptor, GrantDescriptor, IkChain, IkLink, ModelData,
    ModelFormat, RigidBodyDescriptor, RigidBodyKind, RigidBodyShape,
};
pub use order::BoneOrder;
pub use physics::{PhysicsEngine, PhysicsFactory, PhysicsParams};
pub use pose::{BonePose, PoseData};
pub use resolve::{resolve_legacy, BoneResolver, ResolveContext};
pub use scratch::{RotationPool, RotationSlot};
pub use skeleton::{Bone, Skeleton};
