use std::collections::HashMap;
use std::hash::Hash;

use crate::config::FilterConfig;

/// デバウンス対象のチャンネル（左右の目）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EyeChannel {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ChannelState {
    /// 確定済みの値
    value: f32,
    /// 連続一致を待っている候補値
    next_value: f32,
    count: u32,
}

impl ChannelState {
    fn new() -> Self {
        Self {
            value: 0.0,
            next_value: 1.0,
            count: 0,
        }
    }
}

/// 同じ値が `frames` 回を超えて連続したときだけ出力を切り替えるフィルタ
///
/// `epsilon == 0.0` のときは浮動小数の完全一致で判定する。
/// 連続値のトラッカー出力ではほぼ一致しないため、正の epsilon を与えると
/// その幅以内を一致とみなす。
#[derive(Debug, Clone)]
pub struct ContinuousFilter<K = EyeChannel> {
    frames: u32,
    epsilon: f32,
    channels: HashMap<K, ChannelState>,
}

impl<K: Copy + Eq + Hash> ContinuousFilter<K> {
    pub fn new(frames: u32, epsilon: f32) -> Self {
        Self {
            frames,
            epsilon: epsilon.max(0.0),
            channels: HashMap::new(),
        }
    }

    pub fn from_config(config: &FilterConfig) -> Self {
        Self::new(config.debounce_frames, config.debounce_epsilon)
    }

    fn matches(&self, a: f32, b: f32) -> bool {
        if self.epsilon == 0.0 {
            a == b
        } else {
            (a - b).abs() <= self.epsilon
        }
    }

    /// 観測値を1つ入力し、確定済みの値を返す（入力値そのものではない）
    pub fn apply(&mut self, value: f32, channel: K) -> f32 {
        let mut state = *self
            .channels
            .entry(channel)
            .or_insert_with(ChannelState::new);

        if self.matches(value, state.next_value) {
            state.count += 1;
            if state.count > self.frames {
                state.value = value;
                state.count = 0;
            }
        } else {
            state.count = 0;
            state.next_value = value;
        }

        self.channels.insert(channel, state);
        state.value
    }

    /// 一度も入力のないチャンネルは None
    pub fn value(&self, channel: K) -> Option<f32> {
        self.channels.get(&channel).map(|s| s.value)
    }

    pub fn reset(&mut self) {
        self.channels.clear();
    }
}
