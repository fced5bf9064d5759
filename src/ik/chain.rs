use nalgebra::Point3;
use std::fmt;
use std::str::FromStr;

use super::constraint::JointConstraint;
use crate::error::RigError;
use crate::rig::{AvatarModel, BoneId, HumanoidBone, Rig};

/// チェーン内の1関節
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IkJoint {
    pub bone: BoneId,
    pub constraint: Option<JointConstraint>,
}

/// 末端（エンドエフェクタ）から根元へ並んだ関節列とターゲット
///
/// `joints[i]` の親は `joints[i + 1]`、子は `joints[i - 1]`。
/// 構築後に関節の追加・削除はしない。
#[derive(Debug, Clone)]
pub struct IkChain {
    joints: Vec<IkJoint>,
    target: Point3<f32>,
}

impl IkChain {
    pub fn new(joints: Vec<IkJoint>, target: Point3<f32>) -> Self {
        Self { joints, target }
    }

    pub fn joints(&self) -> &[IkJoint] {
        &self.joints
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    /// 根元側の関節
    pub fn parent(&self, index: usize) -> Option<&IkJoint> {
        self.joints.get(index + 1)
    }

    /// 末端側の関節
    pub fn child(&self, index: usize) -> Option<&IkJoint> {
        index.checked_sub(1).and_then(|i| self.joints.get(i))
    }

    pub fn end_effector(&self) -> Option<&IkJoint> {
        self.joints.first()
    }

    pub fn target(&self) -> &Point3<f32> {
        &self.target
    }

    pub fn set_target(&mut self, target: Point3<f32>) {
        self.target = target;
    }

    /// 親を持つ関節が1つもなければ IK は何もしない
    pub fn is_degenerate(&self) -> bool {
        self.joints.len() < 2
    }
}

/// 標準チェーンの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainRole {
    LeftHand,
    RightHand,
    LeftFoot,
    RightFoot,
}

impl ChainRole {
    pub const ALL: [ChainRole; 4] = [
        ChainRole::LeftHand,
        ChainRole::RightHand,
        ChainRole::LeftFoot,
        ChainRole::RightFoot,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ChainRole::LeftHand => "left_hand",
            ChainRole::RightHand => "right_hand",
            ChainRole::LeftFoot => "left_foot",
            ChainRole::RightFoot => "right_foot",
        }
    }

    /// 末端から根元への (役割, 制限)
    pub fn layout(self) -> &'static [(HumanoidBone, Option<JointConstraint>)] {
        use HumanoidBone as B;
        use JointConstraint as C;
        match self {
            ChainRole::LeftHand => &[
                (B::LeftHand, None),
                (B::LeftLowerArm, Some(C::LeftLowerArm)),
                (B::LeftUpperArm, Some(C::LeftUpperArm)),
                (B::LeftShoulder, Some(C::LeftShoulder)),
            ],
            ChainRole::RightHand => &[
                (B::RightHand, None),
                (B::RightLowerArm, Some(C::RightLowerArm)),
                (B::RightUpperArm, Some(C::RightUpperArm)),
                (B::RightShoulder, Some(C::RightShoulder)),
            ],
            ChainRole::LeftFoot => &[
                (B::LeftFoot, None),
                (B::LeftLowerLeg, Some(C::LowerLeg)),
                (B::LeftUpperLeg, Some(C::LeftUpperLeg)),
            ],
            ChainRole::RightFoot => &[
                (B::RightFoot, None),
                (B::RightLowerLeg, Some(C::LowerLeg)),
                (B::RightUpperLeg, Some(C::RightUpperLeg)),
            ],
        }
    }

    /// モデルのボーンからチェーンを組み、ターゲットを末端の現在位置に置く
    pub fn build<A: AvatarModel>(self, avatar: &A) -> Result<IkChain, RigError> {
        let joints = self
            .layout()
            .iter()
            .map(|&(role, constraint)| {
                avatar
                    .bone(role)
                    .map(|bone| IkJoint { bone, constraint })
                    .ok_or(RigError::MissingBone(role))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let target = avatar.rig().world_position(joints[0].bone);
        Ok(IkChain::new(joints, target))
    }
}

impl fmt::Display for ChainRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChainRole {
    type Err = RigError;

    /// "right_hand" / "RIGHT_HAND" / "right-hand" を受け付ける
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        ChainRole::ALL
            .into_iter()
            .find(|r| r.name() == normalized)
            .ok_or_else(|| RigError::UnknownChain(s.to_string()))
    }
}
