use thiserror::Error;

use crate::rig::HumanoidBone;

#[derive(Debug, Error)]
pub enum RigError {
    #[error("unknown chain: {0} (expected left_hand / right_hand / left_foot / right_foot)")]
    UnknownChain(String),
    #[error("humanoid bone {0:?} is not mapped in this model")]
    MissingBone(HumanoidBone),
    #[error("no IK chain selected")]
    NoChainSelected,
}
