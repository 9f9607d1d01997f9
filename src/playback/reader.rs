//! Lyrics reader coordinator. Owns the auto-scroll, elapsed-time and
//! controls-hide timers of one reader screen and the presentation values the
//! user adjusts while performing.

use std::time::Duration;

use log::debug;

use crate::models::{clamp_font_size, clamp_scroll_speed, Song};

use super::scheduler::{cancel_slot, Fired, Scheduler, TimerHandle, TimerKind};

/// Quiet period before the controls hide while scrolling.
pub const CONTROLS_HIDE_DELAY: Duration = Duration::from_secs(3);
/// Elapsed timer resolution.
const ELAPSED_TICK: Duration = Duration::from_secs(1);

/// Interval between one-pixel scroll steps at `speed` pixels per second.
pub fn scroll_interval(speed: u32) -> Duration {
    Duration::from_micros(1_000_000 / u64::from(speed.max(1)))
}

/// Render seconds as `m:ss`.
pub fn format_elapsed(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollState {
    Idle,
    Scrolling,
}

/// Where the reader is inside the setlist it was opened from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetlistPosition {
    pub setlist_id: String,
    pub name: String,
    /// Zero-based entry index.
    pub index: usize,
    pub len: usize,
}

impl SetlistPosition {
    pub fn has_next(&self) -> bool {
        self.index + 1 < self.len
    }

    pub fn has_previous(&self) -> bool {
        self.index > 0
    }

    /// `Name • Song 2 of 5`.
    pub fn label(&self) -> String {
        format!("{} • Song {} of {}", self.name, self.index + 1, self.len)
    }
}

/// Scroll geometry in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollMetrics {
    pub offset: u32,
    pub content_height: u32,
    pub viewport_height: u32,
}

impl ScrollMetrics {
    pub fn max_offset(&self) -> u32 {
        self.content_height.saturating_sub(self.viewport_height)
    }

    /// Position as a percentage in `[0, 100]`. Content that fits the viewport
    /// reads as 0.
    pub fn progress(&self) -> f64 {
        let max = self.max_offset();
        if max == 0 {
            return 0.0;
        }
        (f64::from(self.offset) * 100.0 / f64::from(max)).clamp(0.0, 100.0)
    }
}

#[derive(Debug)]
pub struct Reader {
    song: Song,
    setlist: Option<SetlistPosition>,
    show_timer: bool,
    state: ScrollState,
    metrics: ScrollMetrics,
    progress: f64,
    elapsed_seconds: u64,
    controls_visible: bool,
    scroll_timer: Option<TimerHandle>,
    elapsed_timer: Option<TimerHandle>,
    hide_timer: Option<TimerHandle>,
}

impl Reader {
    /// Open the reader on `song`. The elapsed timer starts right away when a
    /// timer was requested and a setlist is playing.
    pub fn open(
        song: Song,
        setlist: Option<SetlistPosition>,
        show_timer: bool,
        scheduler: &mut dyn Scheduler,
    ) -> Self {
        let mut reader = Self {
            song,
            setlist,
            show_timer,
            state: ScrollState::Idle,
            metrics: ScrollMetrics::default(),
            progress: 0.0,
            elapsed_seconds: 0,
            controls_visible: true,
            scroll_timer: None,
            elapsed_timer: None,
            hide_timer: None,
        };
        reader.restart_elapsed(scheduler);
        reader
    }

    pub fn song(&self) -> &Song {
        &self.song
    }

    pub fn setlist(&self) -> Option<&SetlistPosition> {
        self.setlist.as_ref()
    }

    pub fn state(&self) -> ScrollState {
        self.state
    }

    pub fn is_scrolling(&self) -> bool {
        self.state == ScrollState::Scrolling
    }

    pub fn metrics(&self) -> ScrollMetrics {
        self.metrics
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn controls_visible(&self) -> bool {
        self.controls_visible
    }

    pub fn scroll_timer(&self) -> Option<TimerHandle> {
        self.scroll_timer
    }

    /// The elapsed timer only runs for a setlist with the timer requested.
    pub fn timer_active(&self) -> bool {
        self.show_timer && self.setlist.is_some()
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    /// Elapsed time as `m:ss`, when the timer is active.
    pub fn elapsed_display(&self) -> Option<String> {
        self.timer_active()
            .then(|| format_elapsed(self.elapsed_seconds))
    }

    pub fn toggle_scrolling(&mut self, scheduler: &mut dyn Scheduler) {
        match self.state {
            ScrollState::Idle => self.start_scrolling(scheduler),
            ScrollState::Scrolling => self.pause(scheduler),
        }
    }

    pub fn start_scrolling(&mut self, scheduler: &mut dyn Scheduler) {
        if self.is_scrolling() {
            return;
        }
        self.state = ScrollState::Scrolling;
        self.restart_scroll_timer(scheduler);
        self.arm_hide(scheduler);
        debug!("scrolling {} at {}px/s", self.song.id, self.song.scroll_speed);
    }

    /// Stop auto-scrolling. Controls come back and stay visible.
    pub fn pause(&mut self, scheduler: &mut dyn Scheduler) {
        if !self.is_scrolling() {
            return;
        }
        self.state = ScrollState::Idle;
        cancel_slot(scheduler, &mut self.scroll_timer);
        cancel_slot(scheduler, &mut self.hide_timer);
        self.controls_visible = true;
    }

    /// Touch or pointer movement: show controls and restart the hide
    /// countdown if still scrolling.
    pub fn interact(&mut self, scheduler: &mut dyn Scheduler) {
        self.controls_visible = true;
        cancel_slot(scheduler, &mut self.hide_timer);
        if self.is_scrolling() {
            self.arm_hide(scheduler);
        }
    }

    /// Manual scroll by `delta` pixels. Counts as an interaction.
    pub fn scroll_by(&mut self, delta: i64, scheduler: &mut dyn Scheduler) {
        self.interact(scheduler);
        let target = (i64::from(self.metrics.offset) + delta).max(0);
        self.scroll_to(u32::try_from(target).unwrap_or(u32::MAX));
    }

    /// Update content and viewport heights after a layout change.
    pub fn set_layout(&mut self, content_height: u32, viewport_height: u32) {
        self.metrics.content_height = content_height;
        self.metrics.viewport_height = viewport_height;
        self.scroll_to(self.metrics.offset);
    }

    fn scroll_to(&mut self, offset: u32) {
        self.metrics.offset = offset.min(self.metrics.max_offset());
        self.progress = self.metrics.progress();
    }

    /// Route a fired timer. Timers this reader does not own are ignored.
    /// Returns whether anything visible changed.
    pub fn on_timer(&mut self, fired: Fired) -> bool {
        match fired.kind {
            TimerKind::ScrollTick if self.scroll_timer == Some(fired.handle) => {
                let before = self.metrics.offset;
                self.scroll_to(before.saturating_add(1));
                self.metrics.offset != before
            }
            TimerKind::ElapsedTick if self.elapsed_timer == Some(fired.handle) => {
                self.elapsed_seconds += 1;
                true
            }
            TimerKind::HideControls if self.hide_timer == Some(fired.handle) => {
                self.hide_timer = None;
                let changed = self.controls_visible;
                self.controls_visible = false;
                changed
            }
            _ => false,
        }
    }

    pub fn adjust_font_size(&mut self, delta: i64) -> Song {
        self.set_font_size(i64::from(self.song.font_size) + delta)
    }

    /// Returns the updated song for the caller to persist.
    pub fn set_font_size(&mut self, value: i64) -> Song {
        self.song.font_size = clamp_font_size(value);
        self.song.clone()
    }

    pub fn adjust_scroll_speed(&mut self, delta: i64, scheduler: &mut dyn Scheduler) -> Song {
        self.set_scroll_speed(i64::from(self.song.scroll_speed) + delta, scheduler)
    }

    /// Change the speed and, if scrolling, re-arm the tick at the new
    /// interval. The scroll offset is untouched. Returns the updated song for
    /// the caller to persist.
    pub fn set_scroll_speed(&mut self, value: i64, scheduler: &mut dyn Scheduler) -> Song {
        let speed = clamp_scroll_speed(value);
        if speed != self.song.scroll_speed {
            self.song.scroll_speed = speed;
            if self.is_scrolling() {
                self.restart_scroll_timer(scheduler);
            }
        }
        self.song.clone()
    }

    /// Switch to another song within the same session. Scroll position and
    /// elapsed time start over; auto-scroll keeps running at the new song's
    /// speed.
    pub fn change_song(
        &mut self,
        song: Song,
        setlist: Option<SetlistPosition>,
        show_timer: bool,
        scheduler: &mut dyn Scheduler,
    ) {
        self.song = song;
        self.setlist = setlist;
        self.show_timer = show_timer;
        self.metrics.offset = 0;
        self.progress = 0.0;
        if self.is_scrolling() {
            self.restart_scroll_timer(scheduler);
        }
        self.restart_elapsed(scheduler);
    }

    /// Cancel every timer this reader owns. Must run before the reader is
    /// dropped.
    pub fn close(&mut self, scheduler: &mut dyn Scheduler) {
        self.state = ScrollState::Idle;
        cancel_slot(scheduler, &mut self.scroll_timer);
        cancel_slot(scheduler, &mut self.elapsed_timer);
        cancel_slot(scheduler, &mut self.hide_timer);
    }

    fn restart_scroll_timer(&mut self, scheduler: &mut dyn Scheduler) {
        cancel_slot(scheduler, &mut self.scroll_timer);
        self.scroll_timer = Some(scheduler.schedule(
            TimerKind::ScrollTick,
            scroll_interval(self.song.scroll_speed),
            true,
        ));
    }

    fn restart_elapsed(&mut self, scheduler: &mut dyn Scheduler) {
        cancel_slot(scheduler, &mut self.elapsed_timer);
        self.elapsed_seconds = 0;
        if self.timer_active() {
            self.elapsed_timer = Some(scheduler.schedule(TimerKind::ElapsedTick, ELAPSED_TICK, true));
        }
    }

    fn arm_hide(&mut self, scheduler: &mut dyn Scheduler) {
        cancel_slot(scheduler, &mut self.hide_timer);
        self.hide_timer =
            Some(scheduler.schedule(TimerKind::HideControls, CONTROLS_HIDE_DELAY, false));
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::playback::scheduler::TimerQueue;

    fn song(speed: u32) -> Song {
        let now = Utc::now();
        Song {
            id: "s".to_string(),
            name: "Test".to_string(),
            author: "A".to_string(),
            lyrics: "**CHORUS**\nLine one\nLine two".to_string(),
            font_size: 18,
            scroll_speed: speed,
            created_at: now,
            updated_at: now,
        }
    }

    fn position(index: usize) -> SetlistPosition {
        SetlistPosition {
            setlist_id: "set".to_string(),
            name: "Gig".to_string(),
            index,
            len: 3,
        }
    }

    fn run(reader: &mut Reader, queue: &mut TimerQueue, until: Duration) {
        while let Some(fired) = queue.pop_due(until) {
            reader.on_timer(fired);
        }
        queue.settle(until);
    }

    #[test]
    fn elapsed_format() {
        assert_eq!(format_elapsed(0), "0:00");
        assert_eq!(format_elapsed(65), "1:05");
        assert_eq!(format_elapsed(125), "2:05");
        assert_eq!(format_elapsed(600), "10:00");
    }

    #[test]
    fn interval_follows_speed() {
        assert_eq!(scroll_interval(50), Duration::from_millis(20));
        assert_eq!(scroll_interval(100), Duration::from_millis(10));
        assert_eq!(scroll_interval(30), Duration::from_micros(33_333));
    }

    #[test]
    fn progress_is_clamped() {
        let metrics = ScrollMetrics {
            offset: 500,
            content_height: 300,
            viewport_height: 100,
        };
        assert_eq!(metrics.progress(), 100.0);
        let fits = ScrollMetrics {
            offset: 10,
            content_height: 50,
            viewport_height: 100,
        };
        assert_eq!(fits.progress(), 0.0);
    }

    #[test]
    fn scrolling_advances_one_pixel_per_tick() {
        let mut queue = TimerQueue::new();
        let mut reader = Reader::open(song(50), None, false, &mut queue);
        reader.set_layout(1100, 100);
        reader.toggle_scrolling(&mut queue);
        run(&mut reader, &mut queue, Duration::from_secs(1));
        assert_eq!(reader.metrics().offset, 50);
        assert_eq!(reader.progress(), 5.0);

        reader.toggle_scrolling(&mut queue);
        run(&mut reader, &mut queue, Duration::from_secs(2));
        assert_eq!(reader.metrics().offset, 50);
        assert!(queue.is_empty());
    }

    #[test]
    fn offset_stops_at_end_of_content() {
        let mut queue = TimerQueue::new();
        let mut reader = Reader::open(song(200), None, false, &mut queue);
        reader.set_layout(130, 100);
        reader.start_scrolling(&mut queue);
        run(&mut reader, &mut queue, Duration::from_secs(1));
        assert_eq!(reader.metrics().offset, 30);
        assert_eq!(reader.progress(), 100.0);
    }

    #[test]
    fn speed_change_restarts_interval_without_losing_offset() {
        let mut queue = TimerQueue::new();
        let mut reader = Reader::open(song(50), None, false, &mut queue);
        reader.set_layout(10_000, 100);
        reader.start_scrolling(&mut queue);
        run(&mut reader, &mut queue, Duration::from_millis(200));
        assert_eq!(reader.metrics().offset, 10);

        let old = reader.scroll_timer().unwrap();
        let updated = reader.set_scroll_speed(100, &mut queue);
        assert_eq!(updated.scroll_speed, 100);
        let new = reader.scroll_timer().unwrap();
        assert_ne!(old, new);
        assert!(!queue.is_pending(old));
        assert_eq!(queue.period_of(new), Some(Duration::from_millis(10)));
        assert_eq!(reader.metrics().offset, 10);

        run(&mut reader, &mut queue, Duration::from_millis(300));
        assert_eq!(reader.metrics().offset, 20);
    }

    #[test]
    fn adjustments_clamp() {
        let mut queue = TimerQueue::new();
        let mut reader = Reader::open(song(195), None, false, &mut queue);
        assert_eq!(reader.adjust_scroll_speed(10, &mut queue).scroll_speed, 200);
        assert_eq!(reader.set_scroll_speed(-40, &mut queue).scroll_speed, 10);
        assert_eq!(reader.adjust_font_size(40).font_size, 48);
        assert_eq!(reader.adjust_font_size(-2).font_size, 46);
        assert_eq!(reader.set_font_size(0).font_size, 12);
    }

    #[test]
    fn controls_hide_after_three_quiet_seconds() {
        let mut queue = TimerQueue::new();
        let mut reader = Reader::open(song(50), None, false, &mut queue);
        reader.set_layout(100_000, 100);
        reader.start_scrolling(&mut queue);
        run(&mut reader, &mut queue, Duration::from_millis(2_000));
        assert!(reader.controls_visible());

        reader.interact(&mut queue);
        run(&mut reader, &mut queue, Duration::from_millis(4_500));
        assert!(reader.controls_visible());
        run(&mut reader, &mut queue, Duration::from_millis(5_000));
        assert!(!reader.controls_visible());

        reader.scroll_by(-5, &mut queue);
        assert!(reader.controls_visible());
        reader.pause(&mut queue);
        run(&mut reader, &mut queue, Duration::from_secs(60));
        assert!(reader.controls_visible());
    }

    #[test]
    fn elapsed_timer_requires_setlist_and_flag() {
        let mut queue = TimerQueue::new();
        let mut reader = Reader::open(song(50), None, true, &mut queue);
        run(&mut reader, &mut queue, Duration::from_secs(5));
        assert_eq!(reader.elapsed_display(), None);

        let mut reader = Reader::open(song(50), Some(position(0)), true, &mut queue);
        run(&mut reader, &mut queue, Duration::from_secs(70));
        assert_eq!(reader.elapsed_display().as_deref(), Some("1:05"));

        reader.change_song(song(50), Some(position(1)), true, &mut queue);
        assert_eq!(reader.elapsed_display().as_deref(), Some("0:00"));

        reader.change_song(song(50), Some(position(2)), false, &mut queue);
        run(&mut reader, &mut queue, Duration::from_secs(80));
        assert_eq!(reader.elapsed_seconds(), 0);
        assert_eq!(reader.elapsed_display(), None);
    }

    #[test]
    fn close_cancels_everything() {
        let mut queue = TimerQueue::new();
        let mut reader = Reader::open(song(50), Some(position(0)), true, &mut queue);
        reader.start_scrolling(&mut queue);
        assert_eq!(queue.len(), 3);
        reader.close(&mut queue);
        assert!(queue.is_empty());
    }

    #[test]
    fn setlist_position_label() {
        let pos = position(1);
        assert_eq!(pos.label(), "Gig • Song 2 of 3");
        assert!(pos.has_next());
        assert!(pos.has_previous());
        assert!(!position(2).has_next());
    }
}
