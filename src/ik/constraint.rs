//! 関節ごとの回転制限テーブル
//!
//! 各制限は「指定順でオイラー角に分解 → 主値範囲に正規化 → 軸ごとにクランプ →
//! 再合成」という純粋関数。ボーンオブジェクトには依存しない。

use nalgebra::UnitQuaternion;
use std::f32::consts::{FRAC_PI_2, FRAC_PI_3, FRAC_PI_4, FRAC_PI_6, PI};

use crate::rig::{Axis, BoneId, Euler, EulerOrder, Rig};

const DEG: f32 = PI / 180.0;

/// 1軸分の制限
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AxisLimit {
    Free,
    Range { min: f32, max: f32 },
    /// 入力にかかわらず固定
    Locked(f32),
}

impl AxisLimit {
    fn apply(self, euler: &mut Euler, axis: Axis) {
        match self {
            AxisLimit::Free => {}
            AxisLimit::Range { min, max } => euler.clamp_axis(axis, min, max),
            AxisLimit::Locked(v) => euler.set(axis, v),
        }
    }

    /// 制限後の値が取りうる範囲
    pub fn bounds(self) -> (f32, f32) {
        match self {
            AxisLimit::Free => (-PI, PI),
            AxisLimit::Range { min, max } => (min, max),
            AxisLimit::Locked(v) => (v, v),
        }
    }
}

const fn range(min: f32, max: f32) -> AxisLimit {
    AxisLimit::Range { min, max }
}

/// 制限付き関節の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JointConstraint {
    LeftShoulder,
    RightShoulder,
    LeftUpperArm,
    RightUpperArm,
    LeftLowerArm,
    RightLowerArm,
    LeftUpperLeg,
    RightUpperLeg,
    /// 左右共通
    LowerLeg,
}

impl JointConstraint {
    pub const ALL: [JointConstraint; 9] = [
        JointConstraint::LeftShoulder,
        JointConstraint::RightShoulder,
        JointConstraint::LeftUpperArm,
        JointConstraint::RightUpperArm,
        JointConstraint::LeftLowerArm,
        JointConstraint::RightLowerArm,
        JointConstraint::LeftUpperLeg,
        JointConstraint::RightUpperLeg,
        JointConstraint::LowerLeg,
    ];

    /// 分解に使うオイラー角の順序
    pub fn order(self) -> EulerOrder {
        match self {
            JointConstraint::LeftShoulder | JointConstraint::RightShoulder => EulerOrder::Xzy,
            JointConstraint::LeftUpperArm | JointConstraint::RightUpperArm => EulerOrder::Yxz,
            JointConstraint::LeftLowerArm | JointConstraint::RightLowerArm => EulerOrder::Yzx,
            JointConstraint::LeftUpperLeg | JointConstraint::RightUpperLeg => EulerOrder::Xzy,
            JointConstraint::LowerLeg => EulerOrder::Xyz,
        }
    }

    /// x, y, z の制限
    pub fn limits(self) -> [(Axis, AxisLimit); 3] {
        let (x, y, z) = match self {
            JointConstraint::LeftShoulder => (
                AxisLimit::Locked(0.0),
                range(-FRAC_PI_6, FRAC_PI_6),
                range(-FRAC_PI_4, 0.0),
            ),
            JointConstraint::RightShoulder => (
                AxisLimit::Locked(0.0),
                range(-FRAC_PI_6, FRAC_PI_6),
                range(0.0, FRAC_PI_4),
            ),
            JointConstraint::LeftUpperArm => (
                range(-FRAC_PI_2, FRAC_PI_2),
                range(-160.0 * DEG, 0.0),
                range(-50.0 * DEG, 170.0 * DEG),
            ),
            JointConstraint::RightUpperArm => (
                range(-FRAC_PI_2, FRAC_PI_2),
                range(0.0, 160.0 * DEG),
                range(-170.0 * DEG, 50.0 * DEG),
            ),
            JointConstraint::LeftLowerArm => (
                range(-FRAC_PI_4, FRAC_PI_4),
                range(-170.0 * DEG, 0.0),
                AxisLimit::Locked(0.0),
            ),
            JointConstraint::RightLowerArm => (
                range(-FRAC_PI_4, FRAC_PI_4),
                range(0.0, 170.0 * DEG),
                AxisLimit::Locked(0.0),
            ),
            JointConstraint::LeftUpperLeg => (
                AxisLimit::Free,
                range(-FRAC_PI_2, FRAC_PI_2),
                range(-5.0 * FRAC_PI_6, FRAC_PI_6),
            ),
            JointConstraint::RightUpperLeg => (
                AxisLimit::Free,
                range(-FRAC_PI_2, FRAC_PI_2),
                AxisLimit::Free,
            ),
            JointConstraint::LowerLeg => (
                range(-PI, 0.0),
                AxisLimit::Locked(0.0),
                AxisLimit::Locked(0.0),
            ),
        };
        [(Axis::X, x), (Axis::Y, y), (Axis::Z, z)]
    }

    /// プレゼン用ポーズ: 上腕のひねりを固定し、掌を正面に向ける
    ///
    /// IK の解を上書きするので見た目優先の特例。`presentation_pose = false` で無効化できる。
    pub fn presentation_override(self) -> Option<(Axis, f32)> {
        match self {
            JointConstraint::LeftUpperArm => Some((Axis::X, -FRAC_PI_3)),
            JointConstraint::RightUpperArm => Some((Axis::X, FRAC_PI_3)),
            _ => None,
        }
    }

    /// 制限後のオイラー角
    pub fn clamp_euler(self, rotation: &UnitQuaternion<f32>, presentation: bool) -> Euler {
        let mut euler = Euler::from_quaternion(rotation, self.order());
        euler.canonicalize();
        for (axis, limit) in self.limits() {
            limit.apply(&mut euler, axis);
        }
        if presentation {
            if let Some((axis, value)) = self.presentation_override() {
                euler.set(axis, value);
            }
        }
        euler
    }

    pub fn apply(self, rotation: &UnitQuaternion<f32>, presentation: bool) -> UnitQuaternion<f32> {
        self.clamp_euler(rotation, presentation).to_quaternion()
    }

    /// ボーンのローカル回転をその場で書き換える
    pub fn apply_to<R: Rig + ?Sized>(self, rig: &mut R, bone: BoneId, presentation: bool) {
        let clamped = self.apply(&rig.local_rotation(bone), presentation);
        rig.set_local_rotation(bone, clamped);
    }
}
