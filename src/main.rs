use anyhow::{bail, Result};
use nalgebra::Point3;
use std::io::{self, Write};
use tracing_subscriber::filter::LevelFilter;

use otobe_rig::config::Config;
use otobe_rig::face::{ExpressionChannel, FaceFeed, SampleSlot, TrackerError};
use otobe_rig::ik::ViewCamera;
use otobe_rig::rig::{AvatarModel, BasicAvatar, HumanoidBone, Rig};
use otobe_rig::synth::PoseSynthesizer;
use otobe_rig::vmc::{VmcClient, VmcFrame};

const CONFIG_PATH: &str = "config.toml";

/// 手入力で動かすコンソールの状態
struct Console {
    synth: PoseSynthesizer<BasicAvatar>,
    feed: FaceFeed,
    camera: ViewCamera,
    vmc: Option<VmcClient>,
    expression: [f32; ExpressionChannel::COUNT],
    rotation: [f32; 3],
    head_scale: f32,
    frame_dt: f32,
}

impl Console {
    fn step(&mut self, frames: usize) -> Result<()> {
        for _ in 0..frames {
            let sample = self.feed.slot().latest();
            let report = self.synth.update(self.frame_dt, self.head_scale, sample.as_ref());
            if let Some(r) = report {
                tracing::debug!("ik: evaluated={} rotated={} skipped={}", r.evaluated, r.rotated, r.skipped);
            }
            if let Some(ref vmc) = self.vmc {
                vmc.send_frame(&VmcFrame::from_avatar(self.synth.avatar()))?;
            }
        }
        Ok(())
    }

    fn publish_face(&mut self) {
        let sample = self.feed.on_tracking_sample(&self.expression, &self.rotation);
        println!("顔サンプル: rotation={:?}", sample.rotation);
    }

    fn print_status(&self) {
        println!("IK: {}", if self.synth.ik_enabled() { "ON" } else { "OFF" });
        match self.synth.selected_chain() {
            Some(chain) => {
                let t = chain.target();
                println!("チェーン: {:?}  ターゲット: [{:.3}, {:.3}, {:.3}]",
                    self.synth.selected_role(), t.x, t.y, t.z);
                if let Some(end) = chain.end_effector() {
                    let p = self.synth.avatar().rig().world_position(end.bone);
                    println!("  末端位置: [{:.3}, {:.3}, {:.3}]", p.x, p.y, p.z);
                }
            }
            None => println!("チェーン: なし"),
        }
        println!("表情: {:?}", self.expression);
        println!("回転: {:?}", self.rotation);
    }

    /// false を返したら終了
    fn handle(&mut self, parts: &[&str]) -> Result<bool> {
        match parts[0] {
            "i" => {
                self.synth.toggle_ik();
                self.synth.reset();
                println!("IK: {}", if self.synth.ik_enabled() { "ON" } else { "OFF" });
            }
            "c" if parts.len() == 2 => {
                self.synth.select_chain(parts[1])?;
                println!("チェーン: {}", parts[1]);
            }
            "t" if parts.len() == 4 => {
                let v = parse_floats(&parts[1..])?;
                self.synth.set_target(Point3::new(v[0], v[1], v[2]))?;
                println!("ターゲット: [{}, {}, {}]", v[0], v[1], v[2]);
            }
            "m" if parts.len() == 3 => {
                let v = parse_floats(&parts[1..])?;
                if self.synth.point_at(&self.camera, v[0], v[1])? {
                    if let Some(chain) = self.synth.selected_chain() {
                        let t = chain.target();
                        println!("ターゲット: [{:.3}, {:.3}, {:.3}]", t.x, t.y, t.z);
                    }
                } else {
                    println!("平面に当たりませんでした");
                }
            }
            "e" if parts.len() == 3 => {
                let index: usize = parts[1].parse()?;
                let value: f32 = parts[2].parse()?;
                if index >= ExpressionChannel::COUNT {
                    bail!("チャンネルは 0..{}", ExpressionChannel::COUNT - 1);
                }
                self.expression[index] = value;
                self.publish_face();
            }
            "r" if parts.len() == 4 => {
                let v = parse_floats(&parts[1..])?;
                self.rotation = [v[0], v[1], v[2]];
                self.publish_face();
            }
            "h" if parts.len() == 2 => {
                self.head_scale = parts[1].parse()?;
                println!("頭の倍率: {}", self.head_scale);
            }
            "s" => {
                self.step(1)?;
                self.print_status();
            }
            "n" if parts.len() == 2 => {
                let frames: usize = parts[1].parse()?;
                self.step(frames)?;
                self.print_status();
            }
            "0" => {
                self.synth.reset();
                println!("待機ポーズに戻しました");
            }
            "q" => {
                println!("終了します");
                return Ok(false);
            }
            _ => {
                println!("不明なコマンド: {}", parts.join(" "));
            }
        }
        Ok(true)
    }
}

fn parse_floats(parts: &[&str]) -> Result<Vec<f32>> {
    let mut out = Vec::with_capacity(parts.len());
    for p in parts {
        out.push(p.parse::<f32>()?);
    }
    Ok(out)
}

fn main() -> Result<()> {
    let config = Config::load_or_default(CONFIG_PATH);

    let level = config.app.log_level.parse::<LevelFilter>().unwrap_or(LevelFilter::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    println!("=== Otobe Rig - Console ({}) ===", env!("GIT_VERSION"));
    if config.vmc.enabled {
        println!("VMC送信先: {}", config.vmc.addr);
    } else {
        println!("VMC送信: OFF");
    }
    println!();
    println!("コマンド:");
    println!("  i             - IK の ON/OFF (待機ポーズに戻す)");
    println!("  c name        - チェーン選択 (left_hand / right_hand / left_foot / right_foot)");
    println!("  t x y z       - ターゲット位置を設定");
    println!("  m x y         - 画面上の位置 (NDC, -1..1) をターゲットにする");
    println!("  e idx value   - 表情チャンネルを設定 (0:smileR .. 10:mouthNasty)");
    println!("  r x y z       - 頭の回転を設定 (ラジアン)");
    println!("  h scale       - 頭の倍率");
    println!("  s             - 1フレーム進めて送信");
    println!("  n frames      - 指定フレーム進める");
    println!("  0             - 待機ポーズに戻す");
    println!("  q             - 終了");
    println!();

    let avatar = BasicAvatar::humanoid();
    let head_height = avatar
        .bone(HumanoidBone::Head)
        .map(|id| avatar.rig().world_position(id).y)
        .unwrap_or(1.4);

    let mut feed = FaceFeed::new(&config.filter, SampleSlot::new());
    // コンソールには顔トラッカーがないので手入力で動かす
    feed.on_tracker_ready(Err(TrackerError::NoTracker));

    let vmc = if config.vmc.enabled {
        Some(VmcClient::new(&config.vmc.addr)?)
    } else {
        None
    };

    let mut console = Console {
        synth: PoseSynthesizer::new(avatar, &config),
        feed,
        camera: ViewCamera::bust_up(16.0 / 9.0, head_height),
        vmc,
        expression: [0.0; ExpressionChannel::COUNT],
        rotation: [0.0; 3],
        head_scale: config.pose.head_scale,
        frame_dt: 1.0 / config.app.target_fps.max(1) as f32,
    };

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let parts: Vec<&str> = input.split_whitespace().collect();

        if parts.is_empty() {
            continue;
        }

        match console.handle(&parts) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => println!("エラー: {}", e),
        }
    }

    Ok(())
}
