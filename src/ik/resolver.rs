use nalgebra::{Unit, UnitQuaternion, Vector3};
use tracing::debug;

use super::chain::IkChain;
use crate::config::IkConfig;
use crate::rig::Rig;

/// 末端に近い関節から順に適用する補正倍率
pub const DEFAULT_DAMPING: [f32; 4] = [1.0, 0.2, 0.05, 0.01];

/// 回転軸の長さがこれ未満なら平行（または逆平行）とみなす
const AXIS_EPS: f32 = 1.0e-9;

/// 1回の resolve で何をしたか
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveReport {
    /// 親を持つ関節の数（= 評価回数）
    pub evaluated: usize,
    pub rotated: usize,
    /// 軸が縮退したか NaN で回転しなかった関節
    pub skipped: usize,
}

/// 1パスの近似 IK ソルバ
///
/// 収束ループは持たない。末端側から1回ずつ親関節を回し、減衰率で根元ほど補正を弱める。
#[derive(Debug, Clone)]
pub struct Resolver {
    damping: Vec<f32>,
    presentation_pose: bool,
}

impl Default for Resolver {
    fn default() -> Self {
        Self {
            damping: DEFAULT_DAMPING.to_vec(),
            presentation_pose: true,
        }
    }
}

impl Resolver {
    pub fn new(damping: Vec<f32>, presentation_pose: bool) -> Self {
        let damping = if damping.is_empty() { DEFAULT_DAMPING.to_vec() } else { damping };
        Self {
            damping,
            presentation_pose,
        }
    }

    pub fn from_config(config: &IkConfig) -> Self {
        Self::new(config.damping.clone(), config.presentation_pose)
    }

    /// テーブルより深い関節は最後の値を使う
    fn damping_at(&self, index: usize) -> f32 {
        self.damping
            .get(index)
            .or_else(|| self.damping.last())
            .copied()
            .unwrap_or(1.0)
    }

    pub fn resolve<R: Rig + ?Sized>(&self, chain: &IkChain, rig: &mut R) -> ResolveReport {
        let mut report = ResolveReport::default();
        let joints = chain.joints();

        for (i, joint) in joints.iter().enumerate() {
            let Some(parent) = chain.parent(i) else {
                continue;
            };
            report.evaluated += 1;

            // 末端側で解決済みのリンク分だけターゲットをずらす
            let mut destination = *chain.target();
            for pair in joints[..=i].windows(2) {
                destination += rig.world_position(pair[1].bone) - rig.world_position(pair[0].bone);
            }

            let dest = rig.world_to_local(parent.bone, &destination).coords;
            let tip = rig
                .world_to_local(parent.bone, &rig.world_position(joint.bone))
                .coords;

            match rotation_between(&tip, &dest) {
                Some((axis, angle)) => {
                    let delta = UnitQuaternion::from_axis_angle(&axis, angle * self.damping_at(i));
                    let rotated = rig.local_rotation(parent.bone) * delta;
                    rig.set_local_rotation(parent.bone, rotated);
                    if let Some(constraint) = parent.constraint {
                        constraint.apply_to(rig, parent.bone, self.presentation_pose);
                    }
                    report.rotated += 1;
                }
                None => {
                    debug!("ik joint {} skipped (degenerate axis)", i);
                    report.skipped += 1;
                }
            }

            rig.update_world(parent.bone);
        }

        report
    }
}

/// `from` を `to` に向ける回転軸と角度。平行・ゼロ長・NaN なら None
fn rotation_between(from: &Vector3<f32>, to: &Vector3<f32>) -> Option<(Unit<Vector3<f32>>, f32)> {
    let axis = Unit::try_new(from.cross(to), AXIS_EPS)?;
    let angle = (from.dot(to) / (from.norm() * to.norm())).clamp(-1.0, 1.0).acos();
    if angle.is_nan() || axis.iter().any(|v| v.is_nan()) {
        return None;
    }
    Some((axis, angle))
}

/// デフォルト設定で1回解く
pub fn resolve<R: Rig + ?Sized>(chain: &IkChain, rig: &mut R) -> ResolveReport {
    Resolver::default().resolve(chain, rig)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ik::chain::IkJoint;
    use crate::rig::{BoneId, Skeleton};
    use nalgebra::{Matrix4, Point3};

    fn approx_eq(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() < eps
    }

    /// root -> upper -> lower -> hand の腕
    fn arm() -> (Skeleton, IkChain) {
        let mut s = Skeleton::new();
        let root = s.add_bone("root", None, Vector3::new(0.0, 1.0, 0.0));
        let upper = s.add_bone("upper", Some(root), Vector3::new(0.0, 0.0, 0.0));
        let lower = s.add_bone("lower", Some(upper), Vector3::new(0.3, 0.0, 0.0));
        let hand = s.add_bone("hand", Some(lower), Vector3::new(0.3, 0.0, 0.0));
        let joints = vec![
            IkJoint { bone: hand, constraint: None },
            IkJoint { bone: lower, constraint: None },
            IkJoint { bone: upper, constraint: None },
        ];
        let target = s.world_position(hand);
        (s, IkChain::new(joints, target))
    }

    /// 呼び出し回数を数える Rig
    struct Counting<'a> {
        inner: &'a mut Skeleton,
        set_calls: usize,
        update_calls: usize,
        touched: Vec<BoneId>,
    }

    impl Rig for Counting<'_> {
        fn parent(&self, bone: BoneId) -> Option<BoneId> {
            self.inner.parent(bone)
        }
        fn local_rotation(&self, bone: BoneId) -> UnitQuaternion<f32> {
            self.inner.local_rotation(bone)
        }
        fn set_local_rotation(&mut self, bone: BoneId, rotation: UnitQuaternion<f32>) {
            self.set_calls += 1;
            self.touched.push(bone);
            self.inner.set_local_rotation(bone, rotation)
        }
        fn world_position(&self, bone: BoneId) -> Point3<f32> {
            self.inner.world_position(bone)
        }
        fn world_to_local(&self, bone: BoneId, point: &Point3<f32>) -> Point3<f32> {
            self.inner.world_to_local(bone, point)
        }
        fn update_world(&mut self, bone: BoneId) {
            self.update_calls += 1;
            self.inner.update_world(bone)
        }
    }

    #[test]
    fn test_target_at_rest_is_noop() {
        let (mut s, chain) = arm();
        let before: Vec<_> = chain.joints().iter().map(|j| s.local_rotation(j.bone)).collect();
        let report = resolve(&chain, &mut s);
        assert_eq!(report.evaluated, 2);
        for (j, q) in chain.joints().iter().zip(before) {
            assert!(s.local_rotation(j.bone).angle_to(&q) < 1e-4);
        }
    }

    #[test]
    fn test_first_joint_reaches_reachable_target() {
        let (mut s, mut chain) = arm();
        // 肘を90度曲げた位置
        chain.set_target(Point3::new(0.3, 1.3, 0.0));
        let report = resolve(&chain, &mut s);
        assert!(report.rotated >= 1);
        let hand = chain.joints()[0].bone;
        let p = s.world_position(hand);
        assert!(approx_eq(p.x, 0.3, 1e-4), "{:?}", p);
        assert!(approx_eq(p.y, 1.3, 1e-4), "{:?}", p);
    }

    #[test]
    fn test_each_parent_visited_once() {
        let (mut s, mut chain) = arm();
        chain.set_target(Point3::new(0.2, 1.4, 0.2));
        let mut rig = Counting {
            inner: &mut s,
            set_calls: 0,
            update_calls: 0,
            touched: Vec::new(),
        };
        let report = Resolver::default().resolve(&chain, &mut rig);
        assert_eq!(report.evaluated, chain.len() - 1);
        assert_eq!(report.rotated + report.skipped, report.evaluated);
        assert_eq!(rig.update_calls, report.evaluated);
        assert_eq!(rig.set_calls, report.rotated);
        let mut touched = rig.touched.clone();
        touched.dedup();
        assert_eq!(touched.len(), rig.touched.len());
    }

    #[test]
    fn test_damping_beyond_table_uses_last() {
        let r = Resolver::new(vec![1.0, 0.5], true);
        assert_eq!(r.damping_at(0), 1.0);
        assert_eq!(r.damping_at(5), 0.5);
        let r = Resolver::new(Vec::new(), true);
        assert_eq!(r.damping_at(0), 1.0);
    }

    #[test]
    fn test_degenerate_geometry_skips() {
        assert!(rotation_between(&Vector3::x(), &(Vector3::x() * 2.0)).is_none());
        assert!(rotation_between(&Vector3::x(), &-Vector3::x()).is_none());
        assert!(rotation_between(&Vector3::zeros(), &Vector3::y()).is_none());
        let (axis, angle) = rotation_between(&Vector3::x(), &Vector3::y()).unwrap();
        assert!(approx_eq(axis.z, 1.0, 1e-6));
        assert!(approx_eq(angle, std::f32::consts::FRAC_PI_2, 1e-6));
    }

    #[test]
    fn test_non_invertible_parent_does_not_panic() {
        let (mut s, mut chain) = arm();
        let lower = chain.joints()[1].bone;
        s.set_scale(lower, 0.0);
        s.update_all();
        assert_eq!(s.bone(lower).world_matrix().try_inverse(), None::<Matrix4<f32>>);
        chain.set_target(Point3::new(0.0, 2.0, 0.0));
        let report = resolve(&chain, &mut s);
        assert_eq!(report.evaluated, 2);
    }
}
