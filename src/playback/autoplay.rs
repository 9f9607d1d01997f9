use std::time::Duration;

use log::{debug, info};

use crate::models::{Setlist, Settings};

use super::scheduler::{cancel_slot, Fired, Scheduler, TimerHandle, TimerKind};
use super::session::PlaybackSession;

/// One-shot timer that moves a setlist on to its next song. At most one is
/// pending at any time.
#[derive(Debug, Default)]
pub struct AutoplayTimer {
    pending: Option<TimerHandle>,
}

impl AutoplayTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Cancel any pending advance and arm a fresh one for `session`. Call
    /// after every song change, settings change or autoplay toggle. When the
    /// current song is the last one, autoplay is switched off instead and the
    /// returned session reflects that.
    pub fn rearm(
        &mut self,
        session: &PlaybackSession,
        setlist: Option<&Setlist>,
        settings: &Settings,
        scheduler: &mut dyn Scheduler,
    ) -> PlaybackSession {
        cancel_slot(scheduler, &mut self.pending);

        if !settings.autoplay_enabled || !session.autoplay_active {
            return session.clone();
        }
        let (Some(cursor), Some(setlist)) = (session.cursor.as_ref(), setlist) else {
            return session.clone();
        };
        if setlist.is_last(cursor.index) {
            info!("autoplay finished setlist {}", setlist.id);
            return session.with_autoplay(false);
        }

        let delay = Duration::from_secs(u64::from(settings.autoplay_delay));
        self.pending = Some(scheduler.schedule(TimerKind::AutoplayAdvance, delay, false));
        debug!("autoplay armed for {delay:?} at index {}", cursor.index);
        session.clone()
    }

    /// Handle a fired timer. Returns the advanced session when the timer was
    /// ours.
    pub fn on_timer(
        &mut self,
        fired: Fired,
        session: &PlaybackSession,
        setlist: Option<&Setlist>,
    ) -> Option<PlaybackSession> {
        if fired.kind != TimerKind::AutoplayAdvance || self.pending != Some(fired.handle) {
            return None;
        }
        self.pending = None;
        let setlist = setlist?;
        let next = session.advance_autoplay(setlist);
        info!(
            "autoplay advanced to {}",
            next.song_id.as_deref().unwrap_or("-")
        );
        Some(next)
    }

    pub fn cancel(&mut self, scheduler: &mut dyn Scheduler) {
        cancel_slot(scheduler, &mut self.pending);
    }
}
