use std::collections::BTreeMap;
use std::time::Duration;

use log::trace;

/// Shortest period a repeating timer may have. Keeps a zero interval from
/// spinning forever inside [`TimerQueue::pop_due`].
const MIN_PERIOD: Duration = Duration::from_micros(1);

/// What a timer is for. The reader and the autoplay timer route fired
/// timers by kind.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Auto-scroll step, one pixel per tick.
    ScrollTick,
    /// One second of setlist elapsed time.
    ElapsedTick,
    /// Hide the reader controls after a quiet period.
    HideControls,
    /// Move on to the next setlist song.
    AutoplayAdvance,
}

/// Opaque token returned by [`Scheduler::schedule`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

/// A timer that came due.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Fired {
    pub handle: TimerHandle,
    pub kind: TimerKind,
    /// Scheduled time the timer was due at.
    pub at: Duration,
}

/// Schedule and cancel timers. Owners keep the handles they create and must
/// cancel them when the condition that created them goes away.
pub trait Scheduler {
    /// Current time on the scheduler's clock.
    fn now(&self) -> Duration;
    /// Arm a timer `delay` from now. Repeating timers fire every `delay`
    /// until cancelled; one-shot timers fire once.
    fn schedule(&mut self, kind: TimerKind, delay: Duration, repeating: bool) -> TimerHandle;
    /// Disarm a timer. Returns `false` if it already fired (one-shot) or was
    /// cancelled before.
    fn cancel(&mut self, handle: TimerHandle) -> bool;
}

#[derive(Debug, Clone)]
struct Timer {
    kind: TimerKind,
    due: Duration,
    period: Option<Duration>,
}

/// Single-threaded timer queue driven by an external clock. Time only moves
/// when the owner calls [`TimerQueue::pop_due`] or [`TimerQueue::settle`], so
/// the same code runs against the wall clock and against simulated time in
/// tests.
#[derive(Debug, Default)]
pub struct TimerQueue {
    now: Duration,
    next_id: u64,
    timers: BTreeMap<TimerHandle, Timer>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pop the earliest timer due at or before `until`, moving the clock to
    /// its due time. Repeating timers are re-armed one period later. Ties
    /// fire in scheduling order.
    pub fn pop_due(&mut self, until: Duration) -> Option<Fired> {
        let (&handle, _) = self
            .timers
            .iter()
            .filter(|(_, timer)| timer.due <= until)
            .min_by_key(|(handle, timer)| (timer.due, **handle))?;

        let timer = self.timers.get_mut(&handle)?;
        let fired = Fired {
            handle,
            kind: timer.kind,
            at: timer.due,
        };
        self.now = self.now.max(timer.due);
        match timer.period {
            Some(period) => timer.due += period,
            None => {
                self.timers.remove(&handle);
            }
        }
        Some(fired)
    }

    /// Move the clock forward to `until` once every due timer was handled.
    pub fn settle(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }

    /// Due time of the next pending timer.
    pub fn next_due(&self) -> Option<Duration> {
        self.timers.values().map(|timer| timer.due).min()
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.timers.contains_key(&handle)
    }

    /// Period of a pending repeating timer.
    pub fn period_of(&self, handle: TimerHandle) -> Option<Duration> {
        self.timers.get(&handle).and_then(|timer| timer.period)
    }

    /// Number of pending timers.
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Drop every pending timer.
    pub fn cancel_all(&mut self) -> usize {
        let count = self.timers.len();
        self.timers.clear();
        count
    }
}

impl Scheduler for TimerQueue {
    fn now(&self) -> Duration {
        self.now
    }

    fn schedule(&mut self, kind: TimerKind, delay: Duration, repeating: bool) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        let period = repeating.then(|| delay.max(MIN_PERIOD));
        let due = self.now + period.unwrap_or(delay);
        trace!("schedule {kind:?} #{} in {delay:?} repeating={repeating}", handle.0);
        self.timers.insert(handle, Timer { kind, due, period });
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        let removed = self.timers.remove(&handle).is_some();
        if removed {
            trace!("cancel #{}", handle.0);
        }
        removed
    }
}

/// Cancel the timer held in `slot`, if any, leaving the slot empty.
pub fn cancel_slot(scheduler: &mut dyn Scheduler, slot: &mut Option<TimerHandle>) {
    if let Some(handle) = slot.take() {
        scheduler.cancel(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn one_shot_fires_once() {
        let mut queue = TimerQueue::new();
        let handle = queue.schedule(TimerKind::HideControls, ms(3000), false);
        assert!(queue.pop_due(ms(2999)).is_none());
        let fired = queue.pop_due(ms(3000)).unwrap();
        assert_eq!(fired.handle, handle);
        assert_eq!(fired.at, ms(3000));
        assert!(queue.pop_due(ms(10_000)).is_none());
        assert!(!queue.is_pending(handle));
    }

    #[test]
    fn repeating_catches_up_in_order() {
        let mut queue = TimerQueue::new();
        queue.schedule(TimerKind::ElapsedTick, ms(1000), true);
        queue.schedule(TimerKind::ScrollTick, ms(400), true);
        let mut kinds = Vec::new();
        while let Some(fired) = queue.pop_due(ms(2000)) {
            kinds.push((fired.kind, fired.at));
        }
        queue.settle(ms(2000));
        assert_eq!(
            kinds,
            vec![
                (TimerKind::ScrollTick, ms(400)),
                (TimerKind::ScrollTick, ms(800)),
                (TimerKind::ElapsedTick, ms(1000)),
                (TimerKind::ScrollTick, ms(1200)),
                (TimerKind::ScrollTick, ms(1600)),
                (TimerKind::ElapsedTick, ms(2000)),
                (TimerKind::ScrollTick, ms(2000)),
            ]
        );
        assert_eq!(queue.now(), ms(2000));
        assert_eq!(queue.next_due(), Some(ms(2400)));
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut queue = TimerQueue::new();
        let handle = queue.schedule(TimerKind::AutoplayAdvance, ms(10), false);
        assert!(queue.cancel(handle));
        assert!(!queue.cancel(handle));
        assert!(queue.pop_due(ms(100)).is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn schedule_is_relative_to_settled_clock() {
        let mut queue = TimerQueue::new();
        queue.settle(ms(500));
        queue.schedule(TimerKind::HideControls, ms(100), false);
        assert_eq!(queue.next_due(), Some(ms(600)));
    }

    #[test]
    fn cancel_slot_empties_slot() {
        let mut queue = TimerQueue::new();
        let mut slot = Some(queue.schedule(TimerKind::ScrollTick, ms(20), true));
        cancel_slot(&mut queue, &mut slot);
        assert!(slot.is_none());
        assert_eq!(queue.len(), 0);
    }
}
