use std::net::UdpSocket;
use std::thread;
use std::time::Duration;

use otobe_rig::config::Config;
use otobe_rig::face::{ExpressionChannel, FaceFeed, SampleSlot, TrackerError, TrackerState};
use otobe_rig::rig::{AvatarModel, BasicAvatar, BlendShape, HumanoidBone, Rig};
use otobe_rig::synth::PoseSynthesizer;
use otobe_rig::vmc::{build_bundle, VmcClient, VmcFrame};

fn expression(values: &[(ExpressionChannel, f32)]) -> [f32; ExpressionChannel::COUNT] {
    let mut raw = [0.0; ExpressionChannel::COUNT];
    for &(channel, v) in values {
        raw[channel.index()] = v;
    }
    raw
}

#[test]
fn tracking_sample_flows_to_blend_shapes_and_bones() {
    let config = Config::default();
    let slot = SampleSlot::new();
    let mut feed = FaceFeed::new(&config.filter, slot.clone());
    let mut synth = PoseSynthesizer::new(BasicAvatar::humanoid(), &config);

    feed.on_tracker_ready(Ok(()));
    feed.on_face_detected(true);
    let raw = expression(&[
        (ExpressionChannel::MouthOpen, 0.6),
        (ExpressionChannel::BrowLDown, 0.4),
        (ExpressionChannel::EyeRClose, 1.0),
    ]);
    feed.on_tracking_sample(&raw, &[0.0, 0.3, 0.0]);

    for _ in 0..11 {
        let sample = slot.latest();
        synth.update(1.0 / 30.0, 1.2, sample.as_ref());
    }

    let avatar = synth.avatar();
    assert!((avatar.blend_shape(BlendShape::A) - 0.6).abs() < 1e-6);
    assert!((avatar.blend_shape(BlendShape::Angry) - 0.4).abs() < 1e-6);
    assert!((avatar.blend_shape(BlendShape::Sorrow) - 0.4).abs() < 1e-6);
    // 右目を閉じ続けたのでデバウンス後にモデルの左まばたきが確定
    assert_eq!(avatar.blend_shape(BlendShape::BlinkL), 1.0);
    assert_eq!(avatar.blend_shape(BlendShape::BlinkR), 0.0);

    let neck = avatar.bone(HumanoidBone::Neck).unwrap();
    let angle = avatar.rig().local_rotation(neck).angle();
    assert!((angle - 0.3 * 0.3).abs() < 1e-4);

    let head = avatar.bone(HumanoidBone::Head).unwrap();
    assert_eq!(avatar.skeleton().bone(head).scale, 1.2);
}

#[test]
fn missing_tracker_keeps_pose_synthesis_running() {
    let mut config = Config::default();
    config.ik.enabled = true;
    let slot = SampleSlot::new();
    let mut feed = FaceFeed::new(&config.filter, slot.clone());
    feed.on_tracker_ready(Err(TrackerError::NoTracker));
    assert_eq!(feed.state(), &TrackerState::Unavailable(TrackerError::NoTracker));

    let mut synth = PoseSynthesizer::new(BasicAvatar::humanoid(), &config);
    for _ in 0..5 {
        let report = synth.update(1.0 / 30.0, 1.0, slot.latest().as_ref());
        assert!(report.is_some());
    }
    assert!((synth.avatar().elapsed() - 5.0 / 30.0).abs() < 1e-5);
    assert_eq!(synth.avatar().blend_shapes().count(), 0);
}

#[test]
fn tracker_thread_and_render_loop_share_latest_sample() {
    let config = Config::default();
    let slot = SampleSlot::new();
    let mut feed = FaceFeed::new(&config.filter, slot.clone());

    let writer = thread::spawn(move || {
        let mut i = 0u32;
        while !feed.slot().is_stopped() {
            let v = (i % 10) as f32 / 10.0;
            feed.on_tracking_sample(&expression(&[(ExpressionChannel::MouthOpen, v)]), &[v, 0.0, 0.0]);
            i += 1;
            thread::sleep(Duration::from_millis(1));
        }
        i
    });

    let mut synth = PoseSynthesizer::new(BasicAvatar::humanoid(), &config);
    let mut frames = 0;
    while slot.seq() < 20 {
        let sample = slot.latest();
        if let Some(ref s) = sample {
            // 1回の publish 由来なので表情と回転は同じ値
            assert_eq!(s.expression.mouth_open, s.rotation[0]);
        }
        synth.update(1.0 / 60.0, 1.0, sample.as_ref());
        frames += 1;
        thread::sleep(Duration::from_millis(1));
    }
    slot.stop();
    let published = writer.join().unwrap();
    assert!(published >= 20);
    assert!(frames > 0);
}

#[test]
fn posed_frame_is_sent_over_vmc() {
    let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
    receiver.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
    let client = VmcClient::new(&receiver.local_addr().unwrap().to_string()).unwrap();

    let config = Config::default();
    let mut synth = PoseSynthesizer::new(BasicAvatar::humanoid(), &config);
    let sample = FaceFeed::new(&config.filter, SampleSlot::new())
        .on_tracking_sample(&expression(&[(ExpressionChannel::MouthOpen, 0.9)]), &[0.1, 0.2, 0.3]);
    synth.update(1.0 / 30.0, 1.0, Some(&sample));

    let frame = VmcFrame::from_avatar(synth.avatar());
    assert!(frame.blend_shapes.contains(&(BlendShape::A, 0.9)));
    let sent = client.send_frame(&frame).unwrap();

    let mut buf = vec![0u8; 65536];
    let (len, _) = receiver.recv_from(&mut buf).unwrap();
    assert_eq!(len, sent);
    assert!(build_bundle(&frame).content.len() > HumanoidBone::ALL.len());
}
