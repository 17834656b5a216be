pub mod audio;
pub mod camera;
pub mod mesh;

pub use audio::{AudioController, AudioState, AudioStep};
pub use camera::CameraController;
pub use mesh::MeshController;
