use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub vmc: VmcConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub pose: PoseConfig,
    #[serde(default)]
    pub ik: IkConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// 描画ループの目標FPS
    #[serde(default = "default_target_fps")]
    pub target_fps: u32,
    /// tracing のログレベル ("error" / "warn" / "info" / "debug" / "trace")
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// 実行時間（秒）。0なら無制限
    #[serde(default)]
    pub run_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct VmcConfig {
    /// VMC受信側のアドレス
    #[serde(default = "default_vmc_addr")]
    pub addr: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FilterConfig {
    /// 頭部回転の変化がこれ以下なら前回値を維持する
    #[serde(default = "default_rotation_threshold")]
    pub rotation_threshold: f32,
    /// まばたきのデバウンスに必要な連続一致フレーム数
    #[serde(default = "default_debounce_frames")]
    pub debounce_frames: u32,
    /// デバウンスの一致判定幅。0.0 は完全一致
    #[serde(default)]
    pub debounce_epsilon: f32,
    /// 対数レスポンスカーブの入力下限
    #[serde(default = "default_response_floor")]
    pub response_floor: f32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PoseConfig {
    #[serde(default = "default_head_amplitude")]
    pub head_amplitude: f32,
    #[serde(default = "default_neck_amplitude")]
    pub neck_amplitude: f32,
    #[serde(default = "default_spine_amplitude")]
    pub spine_amplitude: f32,
    /// 頷き（X軸）だけ追加で強調する倍率
    #[serde(default = "default_pitch_gain")]
    pub pitch_gain: f32,
    /// 頭の拡大率
    #[serde(default = "default_head_scale")]
    pub head_scale: f32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IkConfig {
    #[serde(default)]
    pub enabled: bool,
    /// 起動時に選択するチェーン ("left_hand" / "right_hand" / "left_foot" / "right_foot")
    #[serde(default = "default_chain")]
    pub chain: String,
    /// 末端から数えた関節ごとの補正倍率
    #[serde(default = "default_damping")]
    pub damping: Vec<f32>,
    /// 上腕を掌が正面を向く角度に固定する（プレゼン用）
    #[serde(default = "default_true")]
    pub presentation_pose: bool,
}

fn default_true() -> bool { true }
fn default_target_fps() -> u32 { 30 }
fn default_log_level() -> String { "info".to_string() }
fn default_vmc_addr() -> String { "127.0.0.1:39539".to_string() }
fn default_rotation_threshold() -> f32 { 0.005 }
fn default_debounce_frames() -> u32 { 10 }
fn default_response_floor() -> f32 { 1.0e-4 }
fn default_head_amplitude() -> f32 { 0.5 }
fn default_neck_amplitude() -> f32 { 0.3 }
fn default_spine_amplitude() -> f32 { 0.2 }
fn default_pitch_gain() -> f32 { 1.3 }
fn default_head_scale() -> f32 { 1.0 }
fn default_chain() -> String { "right_hand".to_string() }
fn default_damping() -> Vec<f32> { vec![1.0, 0.2, 0.05, 0.01] }

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            target_fps: default_target_fps(),
            log_level: default_log_level(),
            run_seconds: 0,
        }
    }
}

impl Default for VmcConfig {
    fn default() -> Self {
        Self {
            addr: default_vmc_addr(),
            enabled: true,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            rotation_threshold: default_rotation_threshold(),
            debounce_frames: default_debounce_frames(),
            debounce_epsilon: 0.0,
            response_floor: default_response_floor(),
        }
    }
}

impl Default for PoseConfig {
    fn default() -> Self {
        Self {
            head_amplitude: default_head_amplitude(),
            neck_amplitude: default_neck_amplitude(),
            spine_amplitude: default_spine_amplitude(),
            pitch_gain: default_pitch_gain(),
            head_scale: default_head_scale(),
        }
    }
}

impl Default for IkConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            chain: default_chain(),
            damping: default_damping(),
            presentation_pose: true,
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// 読み込みに失敗した場合はデフォルト設定で続行する
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("config {} not loaded ({}), using defaults", path.display(), e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.app.target_fps, 30);
        assert_eq!(config.filter.debounce_frames, 10);
        assert_eq!(config.filter.debounce_epsilon, 0.0);
        assert_eq!(config.ik.damping, vec![1.0, 0.2, 0.05, 0.01]);
        assert_eq!(config.ik.chain, "right_hand");
        assert!(config.ik.presentation_pose);
        assert!(!config.ik.enabled);
    }

    #[test]
    fn test_partial_section() {
        let config: Config = toml::from_str(
            r#"
            [pose]
            head_scale = 1.5

            [ik]
            enabled = true
            chain = "left_foot"
            "#,
        )
        .unwrap();
        assert_eq!(config.pose.head_scale, 1.5);
        assert_eq!(config.pose.head_amplitude, 0.5);
        assert!(config.ik.enabled);
        assert_eq!(config.ik.chain, "left_foot");
        assert_eq!(config.vmc.addr, "127.0.0.1:39539");
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default("does/not/exist.toml");
        assert_eq!(config.pose.pitch_gain, 1.3);
    }
}
