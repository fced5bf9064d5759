/// 前回値との差分が閾値を超えない限り値を据え置くフィルタ
///
/// 顔トラッカーの回転値をそのまま使うと細かく震えるため、
/// 軸ごとに「十分に動いたときだけ」更新する。
#[derive(Debug, Clone)]
pub struct ThresholdFilter<const N: usize> {
    threshold: f32,
    previous: [f32; N],
}

impl<const N: usize> ThresholdFilter<N> {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            previous: [0.0; N],
        }
    }

    /// 足りないチャンネルや NaN は前回値のまま
    pub fn apply(&mut self, current: &[f32]) -> [f32; N] {
        for (prev, &cur) in self.previous.iter_mut().zip(current.iter()) {
            if (cur - *prev).abs() > self.threshold {
                *prev = cur;
            }
        }
        self.previous
    }

    pub fn value(&self) -> [f32; N] {
        self.previous
    }

    pub fn reset(&mut self) {
        self.previous = [0.0; N];
    }
}
