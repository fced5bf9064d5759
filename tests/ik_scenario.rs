use nalgebra::{Point3, UnitQuaternion, Vector3};

use otobe_rig::config::Config;
use otobe_rig::ik::{resolve, ChainRole, IkChain, IkJoint, JointConstraint};
use otobe_rig::rig::{AvatarModel, BasicAvatar, BoneId, Rig, Skeleton};
use otobe_rig::synth::PoseSynthesizer;

/// shoulder -> upper -> hand の2関節チェーン（腕の長さ 0.5）
fn two_joint_arm() -> (Skeleton, IkChain, BoneId, BoneId) {
    let mut s = Skeleton::new();
    let shoulder = s.add_bone("shoulder", None, Vector3::new(0.0, 1.4, 0.0));
    let upper = s.add_bone("upper", Some(shoulder), Vector3::new(0.1, 0.0, 0.0));
    let hand = s.add_bone("hand", Some(upper), Vector3::new(0.5, 0.0, 0.0));
    let joints = vec![
        IkJoint { bone: hand, constraint: None },
        IkJoint { bone: upper, constraint: None },
    ];
    let target = s.world_position(hand);
    (s, IkChain::new(joints, target), upper, hand)
}

fn direction_error(s: &Skeleton, upper: BoneId, hand: BoneId, target: &Point3<f32>) -> f32 {
    let base = s.world_position(upper);
    let tip = s.world_position(hand) - base;
    let want = target - base;
    tip.angle(&want)
}

#[test]
fn target_at_rest_changes_nothing() {
    let (mut s, chain, upper, _hand) = two_joint_arm();
    let before = s.local_rotation(upper);
    for _ in 0..5 {
        let report = resolve(&chain, &mut s);
        assert_eq!(report.evaluated, 1);
    }
    assert!(s.local_rotation(upper).angle_to(&before) < 1e-4);
}

#[test]
fn moved_target_converges_without_growing_corrections() {
    let (mut s, mut chain, upper, hand) = two_joint_arm();
    let rest = s.world_position(hand);
    chain.set_target(rest + Vector3::new(0.0, 0.0, 1.0));

    let mut corrections = Vec::new();
    let mut previous: UnitQuaternion<f32> = s.local_rotation(upper);
    for _ in 0..10 {
        resolve(&chain, &mut s);
        let current = s.local_rotation(upper);
        corrections.push(current.angle_to(&previous));
        previous = current;
    }

    assert!(corrections[0] > 0.1, "first frame should rotate: {:?}", corrections);
    for pair in corrections.windows(2) {
        assert!(pair[1] <= pair[0] + 1e-4, "correction grew: {:?}", corrections);
    }
    assert!(direction_error(&s, upper, hand, chain.target()) < 1e-3);
}

#[test]
fn target_moved_gradually_is_tracked() {
    let (mut s, mut chain, upper, hand) = two_joint_arm();
    let rest = s.world_position(hand);
    for step in 1..=10 {
        let t = step as f32 / 10.0;
        chain.set_target(rest + Vector3::new(0.0, t, 0.0));
        resolve(&chain, &mut s);
        assert!(direction_error(&s, upper, hand, chain.target()) < 1e-3, "step {}", step);
    }
}

#[test]
fn humanoid_hand_chain_stays_within_constraints() {
    let mut avatar = BasicAvatar::humanoid();
    let chain_template = ChainRole::RightHand.build(&avatar).unwrap();
    let start = *chain_template.target();
    let targets = [
        start + Vector3::new(0.2, 0.3, 0.1),
        start + Vector3::new(-0.4, 0.5, 0.3),
        start + Vector3::new(0.0, -0.3, -0.2),
        start + Vector3::new(1.0, 1.0, 1.0),
    ];

    for target in targets {
        let mut chain = chain_template.clone();
        chain.set_target(target);
        for _ in 0..10 {
            avatar.update_world_matrices();
            let report = resolve(&chain, avatar.rig_mut());
            assert_eq!(report.evaluated, 3);
        }
        for joint in chain.joints() {
            let q = avatar.rig().local_rotation(joint.bone);
            if let Some(c) = joint.constraint {
                let clamped = c.apply(&q, true);
                assert!(clamped.angle_to(&q) < 1e-3, "{:?} out of range", c);
            }
            let p = avatar.rig().world_position(joint.bone);
            assert!(p.coords.iter().all(|v| v.is_finite()));
        }
    }
}

#[test]
fn synthesizer_drives_selected_chain() {
    let mut config = Config::default();
    config.ik.enabled = true;
    config.ik.chain = "left_hand".to_string();
    let mut synth = PoseSynthesizer::new(BasicAvatar::humanoid(), &config);

    let hand = synth.selected_chain().unwrap().joints()[0].bone;
    let start = synth.avatar().rig().world_position(hand);
    let target = start + Vector3::new(0.0, 0.25, 0.15);
    synth.set_target(target).unwrap();

    for _ in 0..10 {
        let report = synth.update(1.0 / 30.0, 1.0, None).unwrap();
        assert_eq!(report.evaluated, 3);
    }
    let end = synth.avatar().rig().world_position(hand);
    assert!((end - start).norm() > 1e-3, "hand did not move");
    assert!(end.coords.iter().all(|v| v.is_finite()));

    let shoulder = synth.selected_chain().unwrap().joints()[3];
    let q = synth.avatar().rig().local_rotation(shoulder.bone);
    assert_eq!(shoulder.constraint, Some(JointConstraint::LeftShoulder));
    assert!(JointConstraint::LeftShoulder.apply(&q, true).angle_to(&q) < 1e-3);
}
