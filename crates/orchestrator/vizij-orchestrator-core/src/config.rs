//! Helper configuration, feature toggles and registration parameters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vizij_animation_core::Clip;
use vizij_rig_core::PhysicsParams;

fn default_true() -> bool {
    true
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("afterglow must be finite and non-negative, got {0}")]
    InvalidAfterglow(f32),
    #[error("failed to parse helper config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Fixed for the helper's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HelperConfig {
    /// Stretch every clip and the audio track to the longest one on register/unregister.
    #[serde(default = "default_true")]
    pub sync: bool,
    /// Seconds appended to the synchronized duration.
    #[serde(default)]
    pub afterglow: f32,
    #[serde(default = "default_true")]
    pub reset_physics_on_loop: bool,
    /// Resolve bones in dependency order for PMX models.
    #[serde(default, alias = "pmx_animation")]
    pub dependency_order: bool,
    /// Step one physics world for all meshes instead of one per mesh.
    #[serde(default)]
    pub shared_physics: bool,
}

impl Default for HelperConfig {
    fn default() -> Self {
        Self {
            sync: true,
            afterglow: 0.0,
            reset_physics_on_loop: true,
            dependency_order: false,
            shared_physics: false,
        }
    }
}

impl HelperConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.afterglow.is_finite() || self.afterglow < 0.0 {
            return Err(ConfigError::InvalidAfterglow(self.afterglow));
        }
        Ok(())
    }

    /// Parse and validate a JSON config; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

/// Pipeline stages that can be switched at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Animation,
    Ik,
    Grant,
    Physics,
    CameraAnimation,
}

impl Feature {
    pub const ALL: [Feature; 5] = [
        Feature::Animation,
        Feature::Ik,
        Feature::Grant,
        Feature::Physics,
        Feature::CameraAnimation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Feature::Animation => "animation",
            Feature::Ik => "ik",
            Feature::Grant => "grant",
            Feature::Physics => "physics",
            Feature::CameraAnimation => "camera_animation",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown names are returned as the error.
impl FromStr for Feature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "animation" => Ok(Feature::Animation),
            "ik" => Ok(Feature::Ik),
            "grant" => Ok(Feature::Grant),
            "physics" => Ok(Feature::Physics),
            "camera_animation" | "cameraAnimation" => Ok(Feature::CameraAnimation),
            other => Err(other.to_string()),
        }
    }
}

/// All stages start enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureToggles {
    pub animation: bool,
    pub ik: bool,
    pub grant: bool,
    pub physics: bool,
    pub camera_animation: bool,
}

impl Default for FeatureToggles {
    fn default() -> Self {
        Self {
            animation: true,
            ik: true,
            grant: true,
            physics: true,
            camera_animation: true,
        }
    }
}

impl FeatureToggles {
    pub fn get(&self, feature: Feature) -> bool {
        match feature {
            Feature::Animation => self.animation,
            Feature::Ik => self.ik,
            Feature::Grant => self.grant,
            Feature::Physics => self.physics,
            Feature::CameraAnimation => self.camera_animation,
        }
    }

    pub fn set(&mut self, feature: Feature, enabled: bool) {
        let slot = match feature {
            Feature::Animation => &mut self.animation,
            Feature::Ik => &mut self.ik,
            Feature::Grant => &mut self.grant,
            Feature::Physics => &mut self.physics,
            Feature::CameraAnimation => &mut self.camera_animation,
        };
        *slot = enabled;
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshParams {
    /// Clips played from registration on; none means no sampler.
    #[serde(default)]
    pub animations: Vec<Clip>,
    /// Physics setup; `None` leaves the mesh without a physics engine.
    #[serde(default)]
    pub physics: Option<PhysicsParams>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CameraParams {
    #[serde(default)]
    pub animations: Vec<Clip>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AudioParams {
    /// Seconds of silence before playback starts in every cycle.
    #[serde(default)]
    pub delay: f32,
}

/// Options for [`AnimationHelper::apply_static_pose`](crate::AnimationHelper::apply_static_pose).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PoseOptions {
    /// Return to the bind pose before applying deltas.
    #[serde(default = "default_true")]
    pub reset_pose: bool,
    #[serde(default = "default_true")]
    pub ik: bool,
    #[serde(default = "default_true")]
    pub grant: bool,
}

impl Default for PoseOptions {
    fn default() -> Self {
        Self {
            reset_pose: true,
            ik: true,
            grant: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_takes_defaults() {
        let cfg = HelperConfig::from_json_str(r#"{"afterglow": 2.5, "pmx_animation": true}"#)
            .unwrap();
        assert!(cfg.sync && cfg.reset_physics_on_loop && !cfg.shared_physics);
        assert!(cfg.dependency_order);
        assert_eq!(cfg.afterglow, 2.5);
    }

    #[test]
    fn negative_afterglow_is_rejected() {
        assert!(matches!(
            HelperConfig::from_json_str(r#"{"afterglow": -1.0}"#),
            Err(ConfigError::InvalidAfterglow(_))
        ));
        assert!(matches!(
            HelperConfig::from_json_str("{"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn feature_names_round_trip() {
        for feature in Feature::ALL {
            assert_eq!(feature.as_str().parse::<Feature>(), Ok(feature));
        }
        assert_eq!("cameraAnimation".parse(), Ok(Feature::CameraAnimation));
        assert_eq!("gravity".parse::<Feature>(), Err("gravity".to_string()));
    }

    #[test]
    fn toggles_get_and_set() {
        let mut toggles = FeatureToggles::default();
        toggles.set(Feature::Grant, false);
        assert!(!toggles.get(Feature::Grant));
        assert!(toggles.get(Feature::Ik));
    }
}
