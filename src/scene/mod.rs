//! Scene composition: the camera rig and the per-frame stage.

pub mod camera;
pub mod stage;

pub use camera::CameraRig;
pub use stage::Stage;
