use std::time::Duration;

use log::{info, warn};

use crate::library::Library;
use crate::models::{Setlist, Song};

use super::autoplay::AutoplayTimer;
use super::reader::{Reader, SetlistPosition};
use super::scheduler::{Scheduler, TimerKind, TimerQueue};
use super::session::{PlaybackSession, ReturnView};

/// Reader-screen orchestrator: owns the timer queue, the current session, the
/// open reader and the autoplay timer. Time is fed in from outside through
/// [`Performance::advance_to`], so the terminal loop and tests drive it the
/// same way.
#[derive(Debug, Default)]
pub struct Performance {
    queue: TimerQueue,
    session: PlaybackSession,
    reader: Option<Reader>,
    autoplay: AutoplayTimer,
}

impl Performance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn reader(&self) -> Option<&Reader> {
        self.reader.as_ref()
    }

    pub fn queue(&self) -> &TimerQueue {
        &self.queue
    }

    pub fn now(&self) -> Duration {
        self.queue.now()
    }

    /// Due time of the next timer, for bounding the input poll.
    pub fn next_due(&self) -> Option<Duration> {
        self.queue.next_due()
    }

    pub fn autoplay_pending(&self) -> bool {
        self.autoplay.is_pending()
    }

    /// Open the reader on a single song. Returns `false` for unknown ids.
    pub fn play_song(&mut self, library: &Library, song_id: &str) -> bool {
        if library.song(song_id).is_none() {
            warn!("cannot play unknown song {song_id}");
            return false;
        }
        self.enter(PlaybackSession::for_song(song_id), library)
    }

    /// Open the reader on the first song of a setlist. Empty or unknown
    /// setlists are refused.
    pub fn play_setlist(&mut self, library: &Library, setlist_id: &str) -> bool {
        let Some(setlist) = library.setlist(setlist_id) else {
            warn!("cannot play unknown setlist {setlist_id}");
            return false;
        };
        let Some(session) = PlaybackSession::for_setlist(setlist, &library.settings) else {
            info!("setlist {setlist_id} is empty");
            return false;
        };
        info!("playing setlist {} ({})", setlist.id, setlist.name);
        self.enter(session, library)
    }

    pub fn next_song(&mut self, library: &Library) -> bool {
        self.step(library, PlaybackSession::next)
    }

    pub fn previous_song(&mut self, library: &Library) -> bool {
        self.step(library, PlaybackSession::previous)
    }

    fn step(
        &mut self,
        library: &Library,
        transition: fn(&PlaybackSession, &Setlist) -> PlaybackSession,
    ) -> bool {
        let Some(setlist) = self.current_setlist(library) else {
            return false;
        };
        let next = transition(&self.session, setlist);
        if next == self.session {
            return false;
        }
        self.enter(next, library)
    }

    /// Close the reader: cancel every timer, empty the session and report
    /// which list to return to.
    pub fn close(&mut self) -> ReturnView {
        if let Some(reader) = self.reader.as_mut() {
            reader.close(&mut self.queue);
        }
        self.reader = None;
        self.autoplay.cancel(&mut self.queue);
        let (session, view) = self.session.closed();
        self.session = session;
        let leftover = self.queue.cancel_all();
        if leftover > 0 {
            warn!("{leftover} timers outlived the reader");
        }
        view
    }

    pub fn toggle_scrolling(&mut self) {
        if let Some(reader) = self.reader.as_mut() {
            reader.toggle_scrolling(&mut self.queue);
        }
    }

    pub fn interact(&mut self) {
        if let Some(reader) = self.reader.as_mut() {
            reader.interact(&mut self.queue);
        }
    }

    pub fn scroll_by(&mut self, delta: i64) {
        if let Some(reader) = self.reader.as_mut() {
            reader.scroll_by(delta, &mut self.queue);
        }
    }

    pub fn set_layout(&mut self, content_height: u32, viewport_height: u32) {
        if let Some(reader) = self.reader.as_mut() {
            reader.set_layout(content_height, viewport_height);
        }
    }

    /// Font size step. Returns the song to persist.
    pub fn adjust_font_size(&mut self, delta: i64) -> Option<Song> {
        let reader = self.reader.as_mut()?;
        reader.interact(&mut self.queue);
        Some(reader.adjust_font_size(delta))
    }

    /// Scroll speed step. Returns the song to persist.
    pub fn adjust_scroll_speed(&mut self, delta: i64) -> Option<Song> {
        let reader = self.reader.as_mut()?;
        reader.interact(&mut self.queue);
        Some(reader.adjust_scroll_speed(delta, &mut self.queue))
    }

    /// Re-evaluate autoplay after the settings changed.
    pub fn settings_changed(&mut self, library: &Library) {
        if self.session.is_open() {
            self.rearm_autoplay(library);
        }
    }

    /// Run every timer due at or before `now`, in due order. Returns whether
    /// anything fired.
    pub fn advance_to(&mut self, now: Duration, library: &Library) -> bool {
        let mut fired_any = false;
        while let Some(fired) = self.queue.pop_due(now) {
            fired_any = true;
            if fired.kind == TimerKind::AutoplayAdvance {
                let setlist = self.current_setlist(library);
                if let Some(next) = self.autoplay.on_timer(fired, &self.session, setlist) {
                    self.enter(next, library);
                }
            } else if let Some(reader) = self.reader.as_mut() {
                reader.on_timer(fired);
            }
        }
        self.queue.settle(now);
        fired_any
    }

    fn current_setlist<'a>(&self, library: &'a Library) -> Option<&'a Setlist> {
        let cursor = self.session.cursor.as_ref()?;
        library.setlist(&cursor.setlist_id)
    }

    /// Swap in a new session and bring the reader and autoplay in line with
    /// it.
    fn enter(&mut self, session: PlaybackSession, library: &Library) -> bool {
        let Some(song) = session
            .song_id
            .as_deref()
            .and_then(|id| library.song(id))
            .cloned()
        else {
            warn!("session points at a missing song, closing reader");
            self.close();
            return false;
        };

        self.session = session;
        let position = self.current_setlist(library).zip(self.session.cursor.as_ref()).map(
            |(setlist, cursor)| SetlistPosition {
                setlist_id: setlist.id.clone(),
                name: setlist.name.clone(),
                index: cursor.index,
                len: setlist.song_ids.len(),
            },
        );
        let show_timer = self.session.show_timer;
        match self.reader.as_mut() {
            Some(reader) => reader.change_song(song, position, show_timer, &mut self.queue),
            None => {
                self.reader = Some(Reader::open(song, position, show_timer, &mut self.queue));
            }
        }
        self.rearm_autoplay(library);
        true
    }

    fn rearm_autoplay(&mut self, library: &Library) {
        let setlist = self.current_setlist(library);
        self.session = self
            .autoplay
            .rearm(&self.session, setlist, &library.settings, &mut self.queue);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SongDraft;

    fn library(names: &[&str]) -> (Library, Vec<String>) {
        let mut library = Library::default();
        let ids = names
            .iter()
            .map(|name| {
                let draft = SongDraft {
                    name: name.to_string(),
                    author: "A".to_string(),
                    lyrics: String::new(),
                    font_size: 18,
                    scroll_speed: 50,
                };
                library.create_song(&draft).unwrap().id.clone()
            })
            .collect();
        (library, ids)
    }

    #[test]
    fn single_song_has_no_setlist_timers() {
        let (library, ids) = library(&["a"]);
        let mut performance = Performance::new();
        assert!(performance.play_song(&library, &ids[0]));
        assert!(performance.queue().is_empty());
        assert!(performance.reader().unwrap().setlist().is_none());
        assert_eq!(performance.close(), ReturnView::Songs);
        assert!(!performance.session().is_open());
    }

    #[test]
    fn unknown_or_empty_targets_are_refused() {
        let (mut library, _) = library(&["a"]);
        let empty = library.create_setlist("Empty", vec![]).unwrap().id.clone();
        let mut performance = Performance::new();
        assert!(!performance.play_song(&library, "nope"));
        assert!(!performance.play_setlist(&library, "nope"));
        assert!(!performance.play_setlist(&library, &empty));
        assert!(performance.reader().is_none());
    }

    #[test]
    fn manual_navigation_rearms_autoplay() {
        let (mut library, ids) = library(&["a", "b", "c"]);
        library.settings.autoplay_enabled = true;
        let setlist = library.create_setlist("Gig", ids.clone()).unwrap().id.clone();
        let mut performance = Performance::new();
        assert!(performance.play_setlist(&library, &setlist));
        performance.advance_to(Duration::from_secs(2), &library);
        assert!(performance.next_song(&library));
        performance.advance_to(Duration::from_secs(4), &library);
        assert_eq!(performance.session().song_id.as_deref(), Some(ids[1].as_str()));
        performance.advance_to(Duration::from_secs(5), &library);
        assert_eq!(performance.session().song_id.as_deref(), Some(ids[2].as_str()));
        assert!(!performance.session().autoplay_active);
        assert!(!performance.autoplay_pending());
    }

    #[test]
    fn settings_change_cancels_pending_advance() {
        let (mut library, ids) = library(&["a", "b"]);
        library.settings.autoplay_enabled = true;
        let setlist = library.create_setlist("Gig", ids.clone()).unwrap().id.clone();
        let mut performance = Performance::new();
        performance.play_setlist(&library, &setlist);
        assert!(performance.autoplay_pending());

        library.settings.autoplay_enabled = false;
        performance.settings_changed(&library);
        assert!(!performance.autoplay_pending());
        performance.advance_to(Duration::from_secs(30), &library);
        assert_eq!(performance.session().song_id.as_deref(), Some(ids[0].as_str()));
    }

    #[test]
    fn close_leaves_no_timers() {
        let (mut library, ids) = library(&["a", "b"]);
        library.settings.autoplay_enabled = true;
        library.settings.show_timer_in_setlists = true;
        let setlist = library.create_setlist("Gig", ids).unwrap().id.clone();
        let mut performance = Performance::new();
        performance.play_setlist(&library, &setlist);
        performance.toggle_scrolling();
        assert_eq!(performance.queue().len(), 4);
        assert_eq!(performance.close(), ReturnView::Setlists);
        assert!(performance.queue().is_empty());
        assert!(performance.reader().is_none());
    }
}
