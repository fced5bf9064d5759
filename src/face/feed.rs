use thiserror::Error;
use tracing::{debug, info, warn};

use super::sample::{ExpressionChannel, TrackingSample};
use super::slot::SampleSlot;
use crate::config::FilterConfig;
use crate::filter::ThresholdFilter;

/// トラッカー起動時の失敗
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackerError {
    #[error("no face tracker available")]
    NoTracker,
    #[error("face tracker failed: {0}")]
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrackerState {
    /// on_tracker_ready がまだ呼ばれていない
    Pending,
    Ready,
    Unavailable(TrackerError),
}

/// トラッカーのコールバック側
///
/// 生の検出結果をフィルタして `SampleSlot` に載せる。トラッカーがなくても
/// 合成側は最後のサンプル（またはニュートラル）で動き続ける。
#[derive(Debug)]
pub struct FaceFeed {
    rotation_filter: ThresholdFilter<3>,
    slot: SampleSlot,
    state: TrackerState,
    face_visible: bool,
}

impl FaceFeed {
    pub fn new(config: &FilterConfig, slot: SampleSlot) -> Self {
        Self {
            rotation_filter: ThresholdFilter::new(config.rotation_threshold),
            slot,
            state: TrackerState::Pending,
            face_visible: false,
        }
    }

    pub fn slot(&self) -> &SampleSlot {
        &self.slot
    }

    /// 検出1回分を入力。回転は閾値フィルタを通し、表情はそのまま使う
    pub fn on_tracking_sample(&mut self, expression: &[f32], rotation: &[f32]) -> TrackingSample {
        if expression.len() < ExpressionChannel::COUNT || rotation.len() < 3 {
            warn!(
                "short tracking sample (expression={}, rotation={}), missing channels set to neutral",
                expression.len(),
                rotation.len()
            );
        }
        let raw = TrackingSample::from_raw(expression, rotation);
        let sample = TrackingSample {
            expression: raw.expression,
            rotation: self.rotation_filter.apply(&raw.rotation),
        };
        self.slot.publish(sample);
        sample
    }

    pub fn on_tracker_ready(&mut self, result: Result<(), TrackerError>) {
        self.state = match result {
            Ok(()) => {
                info!("face tracker ready");
                TrackerState::Ready
            }
            Err(e) => {
                warn!("{}; continuing without face input", e);
                TrackerState::Unavailable(e)
            }
        };
    }

    pub fn on_face_detected(&mut self, detected: bool) {
        if detected != self.face_visible {
            debug!("face {}", if detected { "detected" } else { "lost" });
        }
        self.face_visible = detected;
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    pub fn face_visible(&self) -> bool {
        self.face_visible
    }
}
