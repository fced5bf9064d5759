pub mod debounce;
pub mod response;
pub mod threshold;

pub use debounce::{ContinuousFilter, EyeChannel};
pub use response::log_response;
pub use threshold::ThresholdFilter;
