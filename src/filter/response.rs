/// 笑顔の強さを表情の重みに変換する対数カーブ
///
/// `log10(50x) - x + 0.5`。小さい入力を持ち上げ、0.434 (1/ln10) 付近で頭打ちになる。
/// log10 が発散しないよう x は `floor` 以上に切り上げる。結果のクランプは呼び出し側で行う。
pub fn log_response(x: f32, floor: f32) -> f32 {
    let x = if x.is_finite() { x.max(floor) } else { floor };
    (50.0 * x).log10() - x + 0.5
}
