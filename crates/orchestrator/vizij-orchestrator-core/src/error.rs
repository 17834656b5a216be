use thiserror::Error;
use vizij_animation_core::ClipError;

use crate::config::ConfigError;
use crate::objects::{ObjectId, ObjectKind};

/// Collaborators the helper needs a factory for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collaborator {
    IkSolver,
    Physics,
}

/// Caller errors. Each one is raised before any state changes.
#[derive(Debug, Error)]
pub enum HelperError {
    #[error("{kind} {id} cannot be registered: {reason}")]
    RegistrationConflict {
        kind: ObjectKind,
        id: ObjectId,
        reason: &'static str,
    },
    #[error("object {0} is not registered")]
    UnregisteredObject(ObjectId),
    #[error("unknown feature '{0}'")]
    UnknownFeature(String),
    #[error("no {0:?} factory is installed")]
    MissingCollaborator(Collaborator),
    #[error("invalid clip: {0}")]
    InvalidClip(#[from] ClipError),
    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),
}
