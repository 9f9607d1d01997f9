//! Reader scenarios driven on simulated time.

use std::time::Duration;

use lyricsflow::playback::{scroll_interval, ReturnView};
use lyricsflow::{format_lyrics, Library, Performance, SongDraft};

fn library_with(names: &[&str]) -> (Library, Vec<String>) {
    let mut library = Library::default();
    let ids = names
        .iter()
        .map(|name| {
            let draft = SongDraft {
                name: name.to_string(),
                author: "Band".to_string(),
                lyrics: "Line".to_string(),
                font_size: 18,
                scroll_speed: 50,
            };
            library
                .create_song(&draft)
                .map(|song| song.id.clone())
                .expect("valid draft")
        })
        .collect();
    (library, ids)
}

fn secs(value: f64) -> Duration {
    Duration::from_secs_f64(value)
}

#[test]
fn test_autoplay_walks_to_the_end_and_stops() {
    let (mut library, ids) = library_with(&["a", "b", "c"]);
    library.settings.autoplay_enabled = true;
    library.settings.autoplay_delay = 3;
    let setlist = library
        .create_setlist("Gig", ids.clone())
        .expect("named setlist")
        .id
        .clone();

    let mut performance = Performance::new();
    assert!(performance.play_setlist(&library, &setlist));
    assert!(performance.session().autoplay_active);

    performance.advance_to(secs(1.0), &library);
    assert!(performance.next_song(&library));
    assert_eq!(performance.session().song_id.as_deref(), Some(ids[1].as_str()));

    performance.advance_to(secs(3.9), &library);
    assert_eq!(performance.session().song_id.as_deref(), Some(ids[1].as_str()));

    performance.advance_to(secs(4.0), &library);
    assert_eq!(performance.session().song_id.as_deref(), Some(ids[2].as_str()));
    assert!(!performance.session().autoplay_active);
    assert!(!performance.autoplay_pending());

    performance.advance_to(secs(60.0), &library);
    assert_eq!(performance.session().song_id.as_deref(), Some(ids[2].as_str()));
    assert_eq!(performance.close(), ReturnView::Setlists);
}

#[test]
fn test_speed_change_keeps_offset() {
    let (library, ids) = library_with(&["a"]);
    let mut performance = Performance::new();
    assert!(performance.play_song(&library, &ids[0]));
    performance.set_layout(10_000, 500);
    performance.toggle_scrolling();

    performance.advance_to(secs(1.0), &library);
    let reader = performance.reader().expect("reader open");
    assert_eq!(reader.metrics().offset, 50);

    let song = performance.adjust_scroll_speed(50).expect("reader open");
    assert_eq!(song.scroll_speed, 100);
    let reader = performance.reader().expect("reader open");
    assert_eq!(reader.metrics().offset, 50);
    let handle = reader.scroll_timer().expect("scrolling");
    assert_eq!(performance.queue().period_of(handle), Some(scroll_interval(100)));
    assert_eq!(scroll_interval(100), Duration::from_millis(10));

    performance.advance_to(secs(1.5), &library);
    assert_eq!(performance.reader().map(|r| r.metrics().offset), Some(100));
}

#[test]
fn test_scrolling_stops_at_the_end() {
    let (library, ids) = library_with(&["a"]);
    let mut performance = Performance::new();
    performance.play_song(&library, &ids[0]);
    performance.set_layout(600, 500);
    performance.toggle_scrolling();

    performance.advance_to(secs(10.0), &library);
    let reader = performance.reader().expect("reader open");
    assert_eq!(reader.metrics().offset, 100);
    assert_eq!(reader.progress(), 100.0);
    assert!(!reader.controls_visible());
}

#[test]
fn test_elapsed_timer_resets_on_song_change() {
    let (mut library, ids) = library_with(&["a", "b"]);
    library.settings.show_timer_in_setlists = true;
    let setlist = library
        .create_setlist("Gig", ids)
        .expect("named setlist")
        .id
        .clone();

    let mut performance = Performance::new();
    performance.play_setlist(&library, &setlist);
    performance.advance_to(secs(65.0), &library);
    assert_eq!(
        performance.reader().and_then(|r| r.elapsed_display()),
        Some("1:05".to_string())
    );

    assert!(performance.next_song(&library));
    assert_eq!(
        performance.reader().and_then(|r| r.elapsed_display()),
        Some("0:00".to_string())
    );
}

#[test]
fn test_chorus_formatting() {
    let lines = format_lyrics("**CHORUS**\nLine one\nLine two");
    assert_eq!(lines.len(), 3);
    assert!(lines[0].section_marker);
    assert_eq!(lines[0].runs.len(), 1);
    assert!(lines[0].runs[0].bold);
    assert_eq!(lines[0].runs[0].text, "CHORUS");
    assert!(!lines[1].section_marker);
    assert_eq!(lines[1].plain_text(), "Line one");
    assert!(lines[1].runs.iter().all(|run| !run.bold));
}
