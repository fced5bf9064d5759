use anyhow::Result;
use nalgebra::{UnitQuaternion, Vector3};
use rosc::{encoder, OscBundle, OscMessage, OscPacket, OscTime, OscType};
use std::net::UdpSocket;

use crate::rig::{BasicAvatar, BlendShape, HumanoidBone, Rig};

/// VMC受信側（VirtualMotionCapture 等）のデフォルトアドレス
pub const VMC_DEFAULT_ADDR: &str = "127.0.0.1:39539";

/// 受信側座標系（左手系）での位置と回転
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VmcPose {
    /// 位置 (x, y, z)
    pub position: [f32; 3],
    /// 回転 (クォータニオン: x, y, z, w)
    pub rotation: [f32; 4],
}

impl VmcPose {
    /// 原点、回転なし
    pub fn identity() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            rotation: [0.0, 0.0, 0.0, 1.0],
        }
    }

    /// 右手系のリグ座標から変換。X を反転する
    pub fn from_rig(position: &Vector3<f32>, rotation: &UnitQuaternion<f32>) -> Self {
        let q = rotation.as_ref();
        Self {
            position: [-position.x, position.y, position.z],
            rotation: [q.i, -q.j, -q.k, q.w],
        }
    }
}

/// 1フレーム分の送信内容
#[derive(Debug, Clone, PartialEq)]
pub struct VmcFrame {
    pub root: VmcPose,
    pub bones: Vec<(HumanoidBone, VmcPose)>,
    pub blend_shapes: Vec<(BlendShape, f32)>,
    /// モデル起動からの経過秒
    pub time: f32,
}

impl VmcFrame {
    /// ヒューマノイドボーンのローカル姿勢とブレンドシェイプを集める
    pub fn from_avatar(avatar: &BasicAvatar) -> Self {
        let skeleton = avatar.skeleton();
        let bones = HumanoidBone::ALL
            .iter()
            .filter_map(|&role| {
                let id = avatar.humanoid_map().get(role)?;
                let bone = skeleton.bone(id);
                Some((role, VmcPose::from_rig(&bone.local_position, &skeleton.local_rotation(id))))
            })
            .collect();
        let mut blend_shapes: Vec<_> = avatar.blend_shapes().collect();
        // HashMap 順だと毎フレーム並びが変わるので名前順にそろえる
        blend_shapes.sort_by_key(|(shape, _)| shape.name());
        Self {
            root: VmcPose::identity(),
            bones,
            blend_shapes,
            time: avatar.elapsed(),
        }
    }
}

fn pose_args(name: &str, pose: &VmcPose) -> Vec<OscType> {
    vec![
        OscType::String(name.to_string()),
        OscType::Float(pose.position[0]),
        OscType::Float(pose.position[1]),
        OscType::Float(pose.position[2]),
        OscType::Float(pose.rotation[0]),
        OscType::Float(pose.rotation[1]),
        OscType::Float(pose.rotation[2]),
        OscType::Float(pose.rotation[3]),
    ]
}

fn message(addr: &str, args: Vec<OscType>) -> OscPacket {
    OscPacket::Message(OscMessage {
        addr: addr.to_string(),
        args,
    })
}

/// VMC プロトコルの OSC バンドルを構築
///
/// Root/Pos → Bone/Pos (ボーン数) → Blend/Val (シェイプ数) → Blend/Apply → T → OK
pub fn build_bundle(frame: &VmcFrame) -> OscBundle {
    let mut content = Vec::with_capacity(frame.bones.len() + frame.blend_shapes.len() + 4);
    content.push(message("/VMC/Ext/Root/Pos", pose_args("root", &frame.root)));
    for (role, pose) in &frame.bones {
        content.push(message("/VMC/Ext/Bone/Pos", pose_args(role.name(), pose)));
    }
    for (shape, weight) in &frame.blend_shapes {
        content.push(message(
            "/VMC/Ext/Blend/Val",
            vec![OscType::String(shape.name().to_string()), OscType::Float(*weight)],
        ));
    }
    content.push(message("/VMC/Ext/Blend/Apply", Vec::new()));
    content.push(message("/VMC/Ext/T", vec![OscType::Float(frame.time)]));
    // 1 = モデル読み込み済み
    content.push(message("/VMC/Ext/OK", vec![OscType::Int(1)]));

    OscBundle {
        // 即時実行
        timetag: OscTime {
            seconds: 0,
            fractional: 1,
        },
        content,
    }
}

/// OSCバンドルをバイト列にエンコード
pub fn encode_bundle(bundle: &OscBundle) -> Result<Vec<u8>> {
    let packet = OscPacket::Bundle(bundle.clone());
    let encoded = encoder::encode(&packet)?;
    Ok(encoded)
}

/// VMCクライアント
pub struct VmcClient {
    socket: UdpSocket,
    target_addr: String,
}

impl VmcClient {
    pub fn new(target_addr: &str) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        Ok(Self {
            socket,
            target_addr: target_addr.to_string(),
        })
    }

    /// デフォルトアドレス(127.0.0.1:39539)で作成
    pub fn with_default_addr() -> Result<Self> {
        Self::new(VMC_DEFAULT_ADDR)
    }

    pub fn target_addr(&self) -> &str {
        &self.target_addr
    }

    /// 1フレーム分を送信し、送信バイト数を返す
    pub fn send_frame(&self, frame: &VmcFrame) -> Result<usize> {
        let data = encode_bundle(&build_bundle(frame))?;
        let sent = self.socket.send_to(&data, &self.target_addr)?;
        Ok(sent)
    }
}
