/// トラッカーが出力する表情ベクトルの並び
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpressionChannel {
    SmileR,
    SmileL,
    BrowLDown,
    BrowRDown,
    BrowLUp,
    BrowRUp,
    MouthOpen,
    MouthRound,
    EyeRClose,
    EyeLClose,
    MouthNasty,
}

impl ExpressionChannel {
    pub const COUNT: usize = 11;

    pub const ALL: [ExpressionChannel; Self::COUNT] = [
        ExpressionChannel::SmileR,
        ExpressionChannel::SmileL,
        ExpressionChannel::BrowLDown,
        ExpressionChannel::BrowRDown,
        ExpressionChannel::BrowLUp,
        ExpressionChannel::BrowRUp,
        ExpressionChannel::MouthOpen,
        ExpressionChannel::MouthRound,
        ExpressionChannel::EyeRClose,
        ExpressionChannel::EyeLClose,
        ExpressionChannel::MouthNasty,
    ];

    /// 生ベクトル内の位置
    pub fn index(self) -> usize {
        self as usize
    }
}

/// 11チャンネルの表情の重み
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Expression {
    pub smile_r: f32,
    pub smile_l: f32,
    pub brow_l_down: f32,
    pub brow_r_down: f32,
    pub brow_l_up: f32,
    pub brow_r_up: f32,
    pub mouth_open: f32,
    pub mouth_round: f32,
    pub eye_r_close: f32,
    pub eye_l_close: f32,
    pub mouth_nasty: f32,
}

impl Expression {
    /// 欠けている要素や非有限値は 0 (ニュートラル) 扱い
    pub fn from_raw(raw: &[f32]) -> Self {
        let mut e = Self::default();
        for channel in ExpressionChannel::ALL {
            let v = raw.get(channel.index()).copied().unwrap_or(0.0);
            e.set(channel, if v.is_finite() { v } else { 0.0 });
        }
        e
    }

    pub fn get(&self, channel: ExpressionChannel) -> f32 {
        match channel {
            ExpressionChannel::SmileR => self.smile_r,
            ExpressionChannel::SmileL => self.smile_l,
            ExpressionChannel::BrowLDown => self.brow_l_down,
            ExpressionChannel::BrowRDown => self.brow_r_down,
            ExpressionChannel::BrowLUp => self.brow_l_up,
            ExpressionChannel::BrowRUp => self.brow_r_up,
            ExpressionChannel::MouthOpen => self.mouth_open,
            ExpressionChannel::MouthRound => self.mouth_round,
            ExpressionChannel::EyeRClose => self.eye_r_close,
            ExpressionChannel::EyeLClose => self.eye_l_close,
            ExpressionChannel::MouthNasty => self.mouth_nasty,
        }
    }

    pub fn set(&mut self, channel: ExpressionChannel, value: f32) {
        let slot = match channel {
            ExpressionChannel::SmileR => &mut self.smile_r,
            ExpressionChannel::SmileL => &mut self.smile_l,
            ExpressionChannel::BrowLDown => &mut self.brow_l_down,
            ExpressionChannel::BrowRDown => &mut self.brow_r_down,
            ExpressionChannel::BrowLUp => &mut self.brow_l_up,
            ExpressionChannel::BrowRUp => &mut self.brow_r_up,
            ExpressionChannel::MouthOpen => &mut self.mouth_open,
            ExpressionChannel::MouthRound => &mut self.mouth_round,
            ExpressionChannel::EyeRClose => &mut self.eye_r_close,
            ExpressionChannel::EyeLClose => &mut self.eye_l_close,
            ExpressionChannel::MouthNasty => &mut self.mouth_nasty,
        };
        *slot = value;
    }

    pub fn to_raw(&self) -> [f32; ExpressionChannel::COUNT] {
        ExpressionChannel::ALL.map(|c| self.get(c))
    }
}

/// 1回の検出結果（フィルタ済み）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrackingSample {
    pub expression: Expression,
    /// 頭部回転 (x, y, z) ラジアン
    pub rotation: [f32; 3],
}

impl TrackingSample {
    /// 生の検出値から組み立てる。回転も欠損・非有限値は 0
    pub fn from_raw(expression: &[f32], rotation: &[f32]) -> Self {
        let mut rot = [0.0; 3];
        for (dst, &src) in rot.iter_mut().zip(rotation.iter()) {
            if src.is_finite() {
                *dst = src;
            }
        }
        Self {
            expression: Expression::from_raw(expression),
            rotation: rot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_indices_match_layout() {
        for (i, channel) in ExpressionChannel::ALL.iter().enumerate() {
            assert_eq!(channel.index(), i);
        }
        assert_eq!(ExpressionChannel::EyeRClose.index(), 8);
    }

    #[test]
    fn test_from_raw_fills_missing_with_zero() {
        let e = Expression::from_raw(&[0.3, 0.4]);
        assert_eq!(e.smile_r, 0.3);
        assert_eq!(e.smile_l, 0.4);
        assert_eq!(e.mouth_open, 0.0);
        assert_eq!(e.mouth_nasty, 0.0);
    }

    #[test]
    fn test_from_raw_replaces_non_finite() {
        let mut raw = [0.5; 11];
        raw[6] = f32::NAN;
        raw[8] = f32::INFINITY;
        let e = Expression::from_raw(&raw);
        assert_eq!(e.mouth_open, 0.0);
        assert_eq!(e.eye_r_close, 0.0);
        assert_eq!(e.eye_l_close, 0.5);
    }

    #[test]
    fn test_raw_layout_preserved() {
        let raw: Vec<f32> = (0..11).map(|i| i as f32 / 10.0).collect();
        let e = Expression::from_raw(&raw);
        assert_eq!(e.brow_l_down, 0.2);
        assert_eq!(e.mouth_round, 0.7);
        assert_eq!(e.to_raw().to_vec(), raw);
    }

    #[test]
    fn test_sample_rotation_defaults() {
        let s = TrackingSample::from_raw(&[], &[0.1, f32::NAN]);
        assert_eq!(s.rotation, [0.1, 0.0, 0.0]);
        assert_eq!(s.expression, Expression::default());
    }
}
