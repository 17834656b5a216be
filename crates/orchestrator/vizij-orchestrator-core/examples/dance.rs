use serde::Deserialize;
use serde_json::to_string_pretty;
use vizij_orchestrator::{
    AnimationHelper, AudioParams, AudioTrack, Camera, CameraParams, HelperConfig, MeshParams,
};
use vizij_rig_core::{ModelData, Skeleton, SkinnedMesh};

#[derive(Deserialize)]
struct Rig {
    skeleton: Skeleton,
    model: ModelData,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = HelperConfig {
        afterglow: 0.5,
        ..HelperConfig::default()
    };
    let mut helper = AnimationHelper::new(config)?;

    let rig: Rig = vizij_test_fixtures::models::load("leg-rig")?;
    let mesh = SkinnedMesh::new("dancer", rig.skeleton, rig.model)?;
    let dancer = helper.register_mesh(
        mesh,
        MeshParams {
            animations: vec![
                vizij_test_fixtures::clips::load("walk")?,
                vizij_test_fixtures::clips::load("sway")?,
            ],
            physics: None,
        },
    )?;
    helper.register_camera(
        Camera::new("main", 30.0, 16.0 / 9.0, 0.1, 1000.0),
        CameraParams {
            animations: vec![vizij_test_fixtures::clips::load("camera-pan")?],
        },
    )?;
    helper.register_audio(AudioTrack::new("bgm", 4.0), AudioParams { delay: 0.5 })?;

    // Two synchronized cycles at 30 fps.
    for _ in 0..330 {
        let frame = helper.advance(1.0 / 30.0);
        if !frame.events.is_empty() {
            println!("{}", to_string_pretty(&frame)?);
        }
    }

    let skeleton = &helper.mesh(dancer).expect("registered").skeleton;
    for (i, bone) in skeleton.bones().iter().enumerate() {
        println!("{:>8}: {:?}", bone.name(), skeleton.world_position(i));
    }
    Ok(())
}
