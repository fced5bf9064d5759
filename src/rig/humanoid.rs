use nalgebra::Vector3;
use std::collections::HashMap;
use std::f32::consts::PI;

use super::euler::{Euler, EulerOrder};
use super::skeleton::{BoneId, Skeleton};

/// ヒューマノイドのボーン役割
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HumanoidBone {
    Hips,
    Spine,
    Chest,
    Neck,
    Head,
    LeftShoulder,
    LeftUpperArm,
    LeftLowerArm,
    LeftHand,
    RightShoulder,
    RightUpperArm,
    RightLowerArm,
    RightHand,
    LeftUpperLeg,
    LeftLowerLeg,
    LeftFoot,
    RightUpperLeg,
    RightLowerLeg,
    RightFoot,
}

impl HumanoidBone {
    pub const ALL: [HumanoidBone; 19] = [
        HumanoidBone::Hips,
        HumanoidBone::Spine,
        HumanoidBone::Chest,
        HumanoidBone::Neck,
        HumanoidBone::Head,
        HumanoidBone::LeftShoulder,
        HumanoidBone::LeftUpperArm,
        HumanoidBone::LeftLowerArm,
        HumanoidBone::LeftHand,
        HumanoidBone::RightShoulder,
        HumanoidBone::RightUpperArm,
        HumanoidBone::RightLowerArm,
        HumanoidBone::RightHand,
        HumanoidBone::LeftUpperLeg,
        HumanoidBone::LeftLowerLeg,
        HumanoidBone::LeftFoot,
        HumanoidBone::RightUpperLeg,
        HumanoidBone::RightLowerLeg,
        HumanoidBone::RightFoot,
    ];

    /// VMC / Unity HumanBodyBones 名
    pub fn name(self) -> &'static str {
        match self {
            HumanoidBone::Hips => "Hips",
            HumanoidBone::Spine => "Spine",
            HumanoidBone::Chest => "Chest",
            HumanoidBone::Neck => "Neck",
            HumanoidBone::Head => "Head",
            HumanoidBone::LeftShoulder => "LeftShoulder",
            HumanoidBone::LeftUpperArm => "LeftUpperArm",
            HumanoidBone::LeftLowerArm => "LeftLowerArm",
            HumanoidBone::LeftHand => "LeftHand",
            HumanoidBone::RightShoulder => "RightShoulder",
            HumanoidBone::RightUpperArm => "RightUpperArm",
            HumanoidBone::RightLowerArm => "RightLowerArm",
            HumanoidBone::RightHand => "RightHand",
            HumanoidBone::LeftUpperLeg => "LeftUpperLeg",
            HumanoidBone::LeftLowerLeg => "LeftLowerLeg",
            HumanoidBone::LeftFoot => "LeftFoot",
            HumanoidBone::RightUpperLeg => "RightUpperLeg",
            HumanoidBone::RightLowerLeg => "RightLowerLeg",
            HumanoidBone::RightFoot => "RightFoot",
        }
    }

    fn parent(self) -> Option<HumanoidBone> {
        use HumanoidBone::*;
        match self {
            Hips => None,
            Spine | LeftUpperLeg | RightUpperLeg => Some(Hips),
            Chest => Some(Spine),
            Neck | LeftShoulder | RightShoulder => Some(Chest),
            Head => Some(Neck),
            LeftUpperArm => Some(LeftShoulder),
            LeftLowerArm => Some(LeftUpperArm),
            LeftHand => Some(LeftLowerArm),
            RightUpperArm => Some(RightShoulder),
            RightLowerArm => Some(RightUpperArm),
            RightHand => Some(RightLowerArm),
            LeftLowerLeg => Some(LeftUpperLeg),
            LeftFoot => Some(LeftLowerLeg),
            RightLowerLeg => Some(RightUpperLeg),
            RightFoot => Some(RightLowerLeg),
        }
    }

    /// 身長約1.6mのTポーズでの親からのオフセット（メートル）
    /// 左側が +X
    fn rest_offset(self) -> Vector3<f32> {
        use HumanoidBone::*;
        let (x, y, z) = match self {
            Hips => (0.0, 0.9, 0.0),
            Spine => (0.0, 0.08, 0.0),
            Chest => (0.0, 0.15, 0.0),
            Neck => (0.0, 0.2, 0.0),
            Head => (0.0, 0.08, 0.0),
            LeftShoulder => (0.02, 0.16, 0.0),
            LeftUpperArm => (0.08, 0.0, 0.0),
            LeftLowerArm => (0.24, 0.0, 0.0),
            LeftHand => (0.22, 0.0, 0.0),
            RightShoulder => (-0.02, 0.16, 0.0),
            RightUpperArm => (-0.08, 0.0, 0.0),
            RightLowerArm => (-0.24, 0.0, 0.0),
            RightHand => (-0.22, 0.0, 0.0),
            LeftUpperLeg => (0.08, -0.05, 0.0),
            LeftLowerLeg => (0.0, -0.4, 0.0),
            LeftFoot => (0.0, -0.38, 0.0),
            RightUpperLeg => (-0.08, -0.05, 0.0),
            RightLowerLeg => (0.0, -0.4, 0.0),
            RightFoot => (0.0, -0.38, 0.0),
        };
        Vector3::new(x, y, z)
    }
}

/// 役割 → スケルトン内ボーン番号
#[derive(Debug, Clone, Default)]
pub struct HumanoidMap {
    bones: HashMap<HumanoidBone, BoneId>,
}

impl HumanoidMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, role: HumanoidBone, id: BoneId) {
        self.bones.insert(role, id);
    }

    pub fn get(&self, role: HumanoidBone) -> Option<BoneId> {
        self.bones.get(&role).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (HumanoidBone, BoneId)> + '_ {
        self.bones.iter().map(|(r, id)| (*r, *id))
    }
}

/// 標準的なヒューマノイドのスケルトンを生成する
pub fn build_humanoid() -> (Skeleton, HumanoidMap) {
    let mut skeleton = Skeleton::new();
    let mut map = HumanoidMap::new();
    // ALL は親が先に並んでいる
    for role in HumanoidBone::ALL {
        let parent = role.parent().and_then(|p| map.get(p));
        let id = skeleton.add_bone(role.name(), parent, role.rest_offset());
        map.insert(role, id);
    }
    (skeleton, map)
}

/// 待機ポーズ: 腰を180度回してカメラ正面を向かせ、腕を下ろす
pub fn rest_pose() -> [(HumanoidBone, Euler); 7] {
    let e = |x: f32, y: f32, z: f32| Euler::new(x, y, z, EulerOrder::Xyz);
    [
        (HumanoidBone::Hips, e(0.0, PI, 0.0)),
        (HumanoidBone::LeftShoulder, e(0.0, 0.0, 0.2)),
        (HumanoidBone::RightShoulder, e(0.0, 0.0, -0.2)),
        (HumanoidBone::LeftUpperArm, e(0.0, 0.0, 1.1)),
        (HumanoidBone::RightUpperArm, e(0.0, 0.0, -1.1)),
        (HumanoidBone::LeftLowerArm, e(0.0, 0.0, 0.1)),
        (HumanoidBone::RightLowerArm, e(0.0, 0.0, -0.1)),
    ]
}
