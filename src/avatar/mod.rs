//! Avatar model, morph targets and state snapshots.

pub mod model;
pub mod morphs;
pub mod state;

pub use model::{AvatarModel, Skeleton};
pub use state::AvatarState;
