use std::collections::HashMap;

use super::humanoid::{build_humanoid, rest_pose, HumanoidBone, HumanoidMap};
use super::skeleton::{BoneId, Rig, Skeleton};

/// VRM のブレンドシェイププリセット
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendShape {
    A,
    I,
    U,
    E,
    O,
    BlinkL,
    BlinkR,
    Joy,
    Angry,
    Sorrow,
    Fun,
}

impl BlendShape {
    pub fn name(self) -> &'static str {
        match self {
            BlendShape::A => "A",
            BlendShape::I => "I",
            BlendShape::U => "U",
            BlendShape::E => "E",
            BlendShape::O => "O",
            BlendShape::BlinkL => "Blink_L",
            BlendShape::BlinkR => "Blink_R",
            BlendShape::Joy => "Joy",
            BlendShape::Angry => "Angry",
            BlendShape::Sorrow => "Sorrow",
            BlendShape::Fun => "Fun",
        }
    }
}

/// ポーズ合成が操作するアバターモデル
///
/// ボーングラフ・ブレンドシェイプ・二次運動（揺れもの等）の更新は
/// モデル側ランタイムが持つ。
pub trait AvatarModel {
    type Rig: Rig;

    fn rig(&self) -> &Self::Rig;
    fn rig_mut(&mut self) -> &mut Self::Rig;
    fn bone(&self, role: HumanoidBone) -> Option<BoneId>;
    fn set_bone_scale(&mut self, bone: BoneId, scale: f32);
    /// weight は [0, 1]
    fn set_blend_shape(&mut self, shape: BlendShape, weight: f32);
    /// シーン全体のワールド行列を更新
    fn update_world_matrices(&mut self);
    /// フレームの最後に呼ばれる時間ベースの更新
    fn update(&mut self, delta: f32);
    /// 待機ポーズに戻す
    fn reset_pose(&mut self);
}

/// スケルトンとブレンドシェイプ値だけを持つ最小のモデル
#[derive(Debug, Clone)]
pub struct BasicAvatar {
    skeleton: Skeleton,
    humanoid: HumanoidMap,
    blend_shapes: HashMap<BlendShape, f32>,
    elapsed: f32,
}

impl BasicAvatar {
    pub fn new(skeleton: Skeleton, humanoid: HumanoidMap) -> Self {
        Self {
            skeleton,
            humanoid,
            blend_shapes: HashMap::new(),
            elapsed: 0.0,
        }
    }

    /// 標準ヒューマノイドを待機ポーズで生成
    pub fn humanoid() -> Self {
        let (skeleton, humanoid) = build_humanoid();
        let mut avatar = Self::new(skeleton, humanoid);
        avatar.reset_pose();
        avatar
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    pub fn humanoid_map(&self) -> &HumanoidMap {
        &self.humanoid
    }

    /// 未設定のブレンドシェイプは 0
    pub fn blend_shape(&self, shape: BlendShape) -> f32 {
        self.blend_shapes.get(&shape).copied().unwrap_or(0.0)
    }

    pub fn blend_shapes(&self) -> impl Iterator<Item = (BlendShape, f32)> + '_ {
        self.blend_shapes.iter().map(|(s, w)| (*s, *w))
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

impl AvatarModel for BasicAvatar {
    type Rig = Skeleton;

    fn rig(&self) -> &Skeleton {
        &self.skeleton
    }

    fn rig_mut(&mut self) -> &mut Skeleton {
        &mut self.skeleton
    }

    fn bone(&self, role: HumanoidBone) -> Option<BoneId> {
        self.humanoid.get(role)
    }

    fn set_bone_scale(&mut self, bone: BoneId, scale: f32) {
        self.skeleton.set_scale(bone, scale);
    }

    fn set_blend_shape(&mut self, shape: BlendShape, weight: f32) {
        self.blend_shapes.insert(shape, weight);
    }

    fn update_world_matrices(&mut self) {
        self.skeleton.update_all();
    }

    fn update(&mut self, delta: f32) {
        self.elapsed += delta;
        self.skeleton.update_all();
    }

    fn reset_pose(&mut self) {
        for (role, euler) in rest_pose() {
            if let Some(id) = self.humanoid.get(role) {
                self.skeleton.set_local_rotation(id, euler.to_quaternion());
            }
        }
        self.skeleton.update_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_blend_shape_is_zero() {
        let avatar = BasicAvatar::humanoid();
        assert_eq!(avatar.blend_shape(BlendShape::Joy), 0.0);
    }

    #[test]
    fn test_reset_pose_turns_hips() {
        let avatar = BasicAvatar::humanoid();
        let hips = avatar.bone(HumanoidBone::Hips).unwrap();
        let rotation = avatar.rig().local_rotation(hips);
        assert!((rotation.angle() - std::f32::consts::PI).abs() < 1e-3);
        // 腰が反転しているので左手はワールド -X 側に来る
        let left = avatar.rig().world_position(avatar.bone(HumanoidBone::LeftHand).unwrap());
        assert!(left.x < 0.0);
    }

    #[test]
    fn test_update_accumulates_time() {
        let mut avatar = BasicAvatar::humanoid();
        avatar.update(0.016);
        avatar.update(0.016);
        assert!((avatar.elapsed() - 0.032).abs() < 1e-6);
    }
}
