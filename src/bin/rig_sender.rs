use anyhow::Result;
use nalgebra::Vector3;
use std::f32::consts::TAU;
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::filter::LevelFilter;

use otobe_rig::config::Config;
use otobe_rig::face::{ExpressionChannel, FaceFeed, SampleSlot};
use otobe_rig::rig::BasicAvatar;
use otobe_rig::synth::PoseSynthesizer;
use otobe_rig::vmc::{VmcClient, VmcFrame};

const CONFIG_PATH: &str = "config.toml";
/// 疑似トラッカーの検出周期
const TRACKER_INTERVAL: Duration = Duration::from_millis(66);
/// ターゲットが末端の周りを回る半径（メートル）
const ORBIT_RADIUS: f32 = 0.15;
const ORBIT_PERIOD_SECS: f32 = 4.0;

/// 顔トラッカーの代わりに正弦波の表情と頭の揺れを流すスレッド
fn spawn_synthetic_tracker(mut feed: FaceFeed) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        feed.on_tracker_ready(Ok(()));
        let start = Instant::now();
        let mut expression = [0.0f32; ExpressionChannel::COUNT];
        while !feed.slot().is_stopped() {
            let t = start.elapsed().as_secs_f32();

            expression[ExpressionChannel::MouthOpen.index()] = (t * 3.0).sin().max(0.0);
            expression[ExpressionChannel::MouthRound.index()] = 0.5 + 0.5 * (t * 0.7).sin();
            expression[ExpressionChannel::SmileR.index()] = 0.5 + 0.5 * (t * 0.5).sin();
            // まばたきは 0/1 の離散値なのでデバウンスの完全一致でも確定する
            let blink = if t % 4.0 < 1.5 { 1.0 } else { 0.0 };
            expression[ExpressionChannel::EyeRClose.index()] = blink;
            expression[ExpressionChannel::EyeLClose.index()] = blink;

            let rotation = [0.2 * (t * 0.8).sin(), 0.4 * (t * 0.5).sin(), 0.1 * (t * 1.1).sin()];

            // 10秒ごとに2秒間見失う
            let detected = t % 10.0 < 8.0;
            feed.on_face_detected(detected);
            if detected {
                feed.on_tracking_sample(&expression, &rotation);
            }

            thread::sleep(TRACKER_INTERVAL);
        }
    })
}

fn main() -> Result<()> {
    let config = Config::load_or_default(CONFIG_PATH);

    let level = config.app.log_level.parse::<LevelFilter>().unwrap_or(LevelFilter::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    println!("Rig Sender ({})", env!("GIT_VERSION"));
    println!("VMC target: {}", if config.vmc.enabled { config.vmc.addr.as_str() } else { "OFF" });
    println!("Target FPS: {}", config.app.target_fps);
    println!("IK: {} (chain={}, presentation_pose={})",
        if config.ik.enabled { "ON" } else { "OFF" },
        config.ik.chain, config.ik.presentation_pose);
    println!("Debounce: frames={}, epsilon={}", config.filter.debounce_frames, config.filter.debounce_epsilon);
    if config.app.run_seconds > 0 {
        println!("Run: {}s", config.app.run_seconds);
    }
    println!();

    let slot = SampleSlot::new();
    let tracker = spawn_synthetic_tracker(FaceFeed::new(&config.filter, slot.clone()));

    let mut synth = PoseSynthesizer::new(BasicAvatar::humanoid(), &config);
    let orbit_center = synth.selected_chain().map(|c| *c.target());

    let vmc = if config.vmc.enabled {
        let client = VmcClient::new(&config.vmc.addr)?;
        println!("VMC client ready");
        Some(client)
    } else {
        None
    };

    let frame_duration = Duration::from_secs_f64(1.0 / config.app.target_fps.max(1) as f64);
    let run_limit = (config.app.run_seconds > 0).then(|| Duration::from_secs(config.app.run_seconds));
    let started = Instant::now();

    // FPS計測
    let mut frame_count = 0u32;
    let mut sample_count = 0u32;
    let mut fps_timer = Instant::now();
    let mut t_synth = 0.0f64;
    let mut t_send = 0.0f64;
    let mut last_seq = 0u64;
    let mut last_frame = Instant::now();

    loop {
        let loop_start = Instant::now();

        if let Some(limit) = run_limit {
            if started.elapsed() >= limit {
                break;
            }
        }

        let seq = slot.seq();
        if seq != last_seq {
            sample_count += 1;
            last_seq = seq;
        }

        // ターゲットを末端の初期位置まわりで回す
        if let Some(center) = orbit_center {
            let phase = started.elapsed().as_secs_f32() / ORBIT_PERIOD_SECS * TAU;
            let offset = Vector3::new(phase.cos(), phase.sin(), 0.0) * ORBIT_RADIUS;
            synth.set_target(center + offset)?;
        }

        let delta = last_frame.elapsed().as_secs_f32();
        last_frame = Instant::now();

        let t0 = Instant::now();
        let sample = slot.latest();
        synth.update(delta, config.pose.head_scale, sample.as_ref());
        let t1 = Instant::now();

        if let Some(ref client) = vmc {
            client.send_frame(&VmcFrame::from_avatar(synth.avatar()))?;
        }
        let t2 = Instant::now();

        t_synth += (t1 - t0).as_secs_f64() * 1000.0;
        t_send += (t2 - t1).as_secs_f64() * 1000.0;

        // FPS表示
        frame_count += 1;
        let elapsed = fps_timer.elapsed().as_secs_f32();
        if elapsed >= 1.0 {
            let n = frame_count as f64;
            println!("FPS: {:.1} (samples: {}) | synth {:.2}ms  send {:.2}ms",
                frame_count as f32 / elapsed, sample_count, t_synth / n, t_send / n);
            frame_count = 0;
            sample_count = 0;
            fps_timer = Instant::now();
            t_synth = 0.0;
            t_send = 0.0;
        }

        // FPS上限制御（spin wait for precision）
        while loop_start.elapsed() < frame_duration {
            std::hint::spin_loop();
        }
    }

    println!("Shutting down...");
    slot.stop();
    if tracker.join().is_err() {
        tracing::warn!("tracker thread panicked");
    }
    Ok(())
}
