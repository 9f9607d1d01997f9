//! Reader-screen playback: a single-threaded timer queue, the session value
//! describing what is on stage, the reader coordinator that owns the scroll,
//! elapsed-time and controls timers, and the autoplay timer. [`Performance`]
//! ties them together for one reader session.

mod autoplay;
mod performance;
mod reader;
mod scheduler;
mod session;

pub use autoplay::AutoplayTimer;
pub use performance::Performance;
pub use reader::{
    format_elapsed, scroll_interval, Reader, ScrollMetrics, ScrollState, SetlistPosition,
    CONTROLS_HIDE_DELAY,
};
pub use scheduler::{cancel_slot, Fired, Scheduler, TimerHandle, TimerKind, TimerQueue};
pub use session::{PlaybackSession, ReturnView, SetlistCursor};
