//! Static pose description: additive per-bone deltas.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::skeleton::Skeleton;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BonePose {
    pub name: String,
    #[serde(default)]
    pub translation: [f32; 3],
    #[serde(default = "identity")]
    pub quaternion: [f32; 4],
}

fn identity() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct PoseData {
    #[serde(default)]
    pub name: Option<String>,
    pub bones: Vec<BonePose>,
}

impl PoseData {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Add each delta onto the named bone: translation is added to the
    /// position and the quaternion right-multiplied into the rotation. Names
    /// missing from the skeleton are skipped. Returns the number applied.
    pub fn apply_to(&self, skeleton: &mut Skeleton) -> usize {
        let mut applied = 0;
        for pose in &self.bones {
            let Some(bone) = skeleton.find(&pose.name).and_then(|i| skeleton.bone_mut(i)) else {
                log::trace!("pose {:?}: no bone named '{}'", self.name, pose.name);
                continue;
            };
            bone.position += Vec3::from_array(pose.translation);
            bone.rotation = (bone.rotation * Quat::from_array(pose.quaternion)).normalize();
            applied += 1;
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::Bone;

    #[test]
    fn deltas_add_and_unknown_names_skip() {
        let mut sk = Skeleton::new(vec![
            Bone::new("center", None, Vec3::new(0.0, 8.0, 0.0)),
            Bone::new("neck", Some(0), Vec3::new(0.0, 5.0, 0.0)),
        ])
        .unwrap();
        sk.bone_mut(1).unwrap().rotation = Quat::from_rotation_y(0.2);

        let pose = PoseData::from_json_str(
            r#"{
                "name": "wave",
                "bones": [
                    {"name": "center", "translation": [1, 0, 0]},
                    {"name": "neck", "quaternion": [0, 0.09983342, 0, 0.99500417]},
                    {"name": "missing", "translation": [5, 5, 5]}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(pose.apply_to(&mut sk), 2);
        assert_eq!(sk.bone(0).unwrap().position, Vec3::new(1.0, 8.0, 0.0));
        assert_eq!(sk.bone(0).unwrap().rotation, Quat::IDENTITY);
        assert!(sk
            .bone(1)
            .unwrap()
            .rotation
            .abs_diff_eq(Quat::from_rotation_y(0.4), 1e-5));
    }
}
