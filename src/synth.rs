//! フレームごとのポーズ合成
//!
//! IK → 顔（頭・首・背骨の回転とブレンドシェイプ）→ モデルの時間更新 の順に適用する。

use nalgebra::Point3;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::config::{Config, PoseConfig};
use crate::error::RigError;
use crate::face::TrackingSample;
use crate::filter::{log_response, ContinuousFilter, EyeChannel};
use crate::ik::{ChainRole, IkChain, ResolveReport, Resolver, ViewCamera};
use crate::rig::{AvatarModel, BlendShape, Euler, EulerOrder, HumanoidBone, Rig};

pub struct PoseSynthesizer<A: AvatarModel> {
    avatar: A,
    chains: HashMap<ChainRole, IkChain>,
    selected: Option<ChainRole>,
    ik_enabled: bool,
    resolver: Resolver,
    blink: ContinuousFilter<EyeChannel>,
    pose: PoseConfig,
    response_floor: f32,
}

impl<A: AvatarModel> PoseSynthesizer<A> {
    /// 組めるチェーンをすべて組み、設定のチェーンを選択する
    pub fn new(avatar: A, config: &Config) -> Self {
        let mut chains = HashMap::new();
        for role in ChainRole::ALL {
            match role.build(&avatar) {
                Ok(chain) => {
                    chains.insert(role, chain);
                }
                Err(e) => warn!("chain {} unavailable: {}", role, e),
            }
        }

        let mut synth = Self {
            avatar,
            chains,
            selected: None,
            ik_enabled: config.ik.enabled,
            resolver: Resolver::from_config(&config.ik),
            blink: ContinuousFilter::from_config(&config.filter),
            pose: config.pose.clone(),
            response_floor: config.filter.response_floor,
        };
        if let Err(e) = synth.select_chain(&config.ik.chain) {
            warn!("initial chain not selected: {}", e);
        }
        synth
    }

    /// 描画フレームごとに1回呼ぶ。IK が走った場合はその結果を返す
    pub fn update(&mut self, delta: f32, head_scale: f32, sample: Option<&TrackingSample>) -> Option<ResolveReport> {
        let report = self.resolve_ik();
        if let Some(sample) = sample {
            self.apply_face(head_scale, sample);
        }
        self.avatar.update(delta);
        report
    }

    fn resolve_ik(&mut self) -> Option<ResolveReport> {
        if !self.ik_enabled {
            return None;
        }
        let Some(chain) = self.selected.and_then(|role| self.chains.get(&role)) else {
            debug!("ik enabled but no chain selected");
            return None;
        };
        self.avatar.update_world_matrices();
        Some(self.resolver.resolve(chain, self.avatar.rig_mut()))
    }

    fn apply_face(&mut self, head_scale: f32, sample: &TrackingSample) {
        if let Some(head) = self.avatar.bone(HumanoidBone::Head) {
            self.avatar.set_bone_scale(head, head_scale);
        }

        self.rotate_bone(HumanoidBone::Head, &sample.rotation, self.pose.head_amplitude);
        self.rotate_bone(HumanoidBone::Neck, &sample.rotation, self.pose.neck_amplitude);
        self.rotate_bone(HumanoidBone::Spine, &sample.rotation, self.pose.spine_amplitude);

        let e = &sample.expression;
        // トラッカーの左右はモデルから見て反転している
        let blink_l = self.blink.apply(e.eye_r_close, EyeChannel::Right);
        let blink_r = self.blink.apply(e.eye_l_close, EyeChannel::Left);
        let joy = log_response(e.smile_r, self.response_floor);

        let weights = [
            (BlendShape::A, e.mouth_open),
            (BlendShape::I, 1.0 - e.mouth_round),
            (BlendShape::BlinkL, blink_l),
            (BlendShape::BlinkR, blink_r),
            (BlendShape::Joy, joy),
            (BlendShape::Angry, e.brow_l_down),
            (BlendShape::Sorrow, e.brow_l_down * e.eye_r_close),
        ];
        for (shape, weight) in weights {
            self.avatar.set_blend_shape(shape, clamp01(weight));
        }
    }

    /// 回転を置き換える（合成しない）。頷きだけ pitch_gain で強調
    fn rotate_bone(&mut self, role: HumanoidBone, rotation: &[f32; 3], amplitude: f32) {
        let Some(bone) = self.avatar.bone(role) else {
            return;
        };
        let [x, y, z] = *rotation;
        let euler = Euler::new(
            -x * amplitude * self.pose.pitch_gain,
            y * amplitude,
            -z * amplitude,
            EulerOrder::Zxy,
        );
        self.avatar.rig_mut().set_local_rotation(bone, euler.to_quaternion());
    }

    /// "left_hand" / "right_hand" / "left_foot" / "right_foot"
    pub fn select_chain(&mut self, name: &str) -> Result<(), RigError> {
        let role: ChainRole = name.parse()?;
        if !self.chains.contains_key(&role) {
            let chain = role.build(&self.avatar)?;
            self.chains.insert(role, chain);
        }
        self.selected = Some(role);
        info!("ik chain selected: {}", role);
        Ok(())
    }

    /// 新しい状態を返す
    pub fn toggle_ik(&mut self) -> bool {
        self.ik_enabled = !self.ik_enabled;
        info!("ik {}", if self.ik_enabled { "enabled" } else { "disabled" });
        self.ik_enabled
    }

    pub fn ik_enabled(&self) -> bool {
        self.ik_enabled
    }

    pub fn selected_role(&self) -> Option<ChainRole> {
        self.selected
    }

    pub fn selected_chain(&self) -> Option<&IkChain> {
        self.selected.and_then(|role| self.chains.get(&role))
    }

    pub fn set_target(&mut self, target: Point3<f32>) -> Result<(), RigError> {
        let role = self.selected.ok_or(RigError::NoChainSelected)?;
        let chain = self.chains.get_mut(&role).ok_or(RigError::NoChainSelected)?;
        chain.set_target(target);
        Ok(())
    }

    /// ポインタ位置（NDC）を z = 0 平面に投影してターゲットにする。外れたら動かさない
    pub fn point_at(&mut self, camera: &ViewCamera, ndc_x: f32, ndc_y: f32) -> Result<bool, RigError> {
        match camera.pointer_target(ndc_x, ndc_y) {
            Some(p) => self.set_target(p).map(|_| true),
            None => Ok(false),
        }
    }

    /// 待機ポーズに戻し、フィルタの状態も捨てる
    pub fn reset(&mut self) {
        self.avatar.reset_pose();
        self.blink.reset();
    }

    pub fn avatar(&self) -> &A {
        &self.avatar
    }

    pub fn avatar_mut(&mut self) -> &mut A {
        &mut self.avatar
    }
}

fn clamp01(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}
