pub mod avatar;
pub mod euler;
pub mod humanoid;
pub mod skeleton;

pub use avatar::{AvatarModel, BasicAvatar, BlendShape};
pub use euler::{Axis, Euler, EulerOrder};
pub use humanoid::{build_humanoid, rest_pose, HumanoidBone, HumanoidMap};
pub use skeleton::{Bone, BoneId, Rig, Skeleton};
