mod cancel;
mod config;
mod engine;
mod event;
mod model;
mod sequence;

pub use cancel::CancelToken;
pub use config::{
    IntervalConfig, DEFAULT_LONG_BREAK, DEFAULT_LONG_BREAK_EVERY, DEFAULT_POMODORO,
    DEFAULT_SHORT_BREAK, DEFAULT_TICK,
};
pub use event::{FinishReason, IntervalEvent};
pub use model::{Category, Interval, IntervalState};
pub use sequence::{current_interval, get_interval};
