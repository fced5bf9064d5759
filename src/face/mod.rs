pub mod feed;
pub mod sample;
pub mod slot;

pub use feed::{FaceFeed, TrackerError, TrackerState};
pub use sample::{Expression, ExpressionChannel, TrackingSample};
pub use slot::SampleSlot;
