use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use super::sample::TrackingSample;

/// トラッカースレッドと描画ループの間で共有する最新サンプル1枠
///
/// 書き込みは常に上書き（キューなし）。読み手はサンプル全体を一括で取得するため、
/// 書きかけの値を見ることはない。
#[derive(Debug, Clone, Default)]
pub struct SampleSlot {
    latest: Arc<Mutex<Option<TrackingSample>>>,
    seq: Arc<AtomicU64>,
    stopped: Arc<AtomicBool>,
}

impl SampleSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, sample: TrackingSample) {
        *self.latest.lock() = Some(sample);
        self.seq.fetch_add(1, Ordering::Release);
    }

    /// 最新サンプルのコピー。初回の publish 前のみ None
    pub fn latest(&self) -> Option<TrackingSample> {
        *self.latest.lock()
    }

    /// publish のたびにインクリメントされる
    pub fn seq(&self) -> u64 {
        self.seq.load(Ordering::Acquire)
    }

    pub fn clear(&self) {
        *self.latest.lock() = None;
    }

    /// 共有している全ループに停止を通知
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn sample(v: f32) -> TrackingSample {
        TrackingSample::from_raw(&[v], &[v, v, v])
    }

    #[test]
    fn test_empty_until_publish() {
        let slot = SampleSlot::new();
        assert!(slot.latest().is_none());
        assert_eq!(slot.seq(), 0);
    }

    #[test]
    fn test_latest_wins() {
        let slot = SampleSlot::new();
        slot.publish(sample(0.1));
        slot.publish(sample(0.2));
        assert_eq!(slot.latest(), Some(sample(0.2)));
        assert_eq!(slot.seq(), 2);
    }

    #[test]
    fn test_clones_share_state() {
        let slot = SampleSlot::new();
        let writer = slot.clone();
        let handle = thread::spawn(move || {
            for i in 0..100 {
                writer.publish(sample(i as f32));
            }
            writer.stop();
        });
        handle.join().unwrap();
        assert!(slot.is_stopped());
        assert_eq!(slot.seq(), 100);
        // 読み手が見るサンプルは常に同じ publish 由来で一貫している
        let s = slot.latest().unwrap();
        assert_eq!(s.expression.smile_r, s.rotation[0]);
        assert_eq!(s.rotation[0], 99.0);
    }

    #[test]
    fn test_clear() {
        let slot = SampleSlot::new();
        slot.publish(sample(0.5));
        slot.clear();
        assert!(slot.latest().is_none());
        assert_eq!(slot.seq(), 1);
    }
}
