use std::mem;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::KeyCode;
use log::{debug, info};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use rusqlite::Connection;

use crate::db::{save_settings, save_setlists, save_songs};
use crate::library::Library;
use crate::lyrics::format_lyrics;
use crate::models::{Setlist, Song, FONT_SIZE_STEP, SCROLL_SPEED_STEP};
use crate::playback::{Performance, ReturnView};

use super::forms::{
    ConfirmSetlistDelete, ConfirmSongDelete, SetlistField, SetlistForm, SettingsForm, SongField,
    SongForm, SECTION_SHORTCUTS,
};
use super::helpers::{
    centered_rect, line_height_px, lyric_rows, parse_hex_color, progress_bar, surface_error,
};
use super::screens::{ListCursor, View};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Navigation bar above the list views.
const NAV_HEIGHT: u16 = 2;
/// Rows covered by the reader header and controls overlays.
const OVERLAY_HEIGHT: u16 = 3;
/// Longest the event loop waits for input when no timer is due sooner.
const IDLE_POLL: Duration = Duration::from_millis(250);

/// High-level navigation states.
enum Screen {
    Songs,
    Setlists,
    Settings(SettingsForm),
    Reader,
}

/// Modal states layered over the list views.
enum Mode {
    Normal,
    CreatingSong(SongForm),
    EditingSong { id: String, form: SongForm },
    ConfirmSongDelete(ConfirmSongDelete),
    CreatingSetlist(SetlistForm),
    EditingSetlist { id: String, form: SetlistForm },
    ConfirmSetlistDelete(ConfirmSetlistDelete),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    conn: Connection,
    library: Library,
    songs: ListCursor,
    setlists: ListCursor,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
    performance: Performance,
    /// Origin of the performance clock.
    clock: Instant,
    /// View to show if the reader closes on its own.
    reader_origin: View,
}

impl App {
    pub fn new(conn: Connection, library: Library) -> Self {
        Self {
            conn,
            library,
            songs: ListCursor::default(),
            setlists: ListCursor::default(),
            screen: Screen::Songs,
            mode: Mode::Normal,
            status: None,
            performance: Performance::new(),
            clock: Instant::now(),
            reader_origin: View::Songs,
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        self.tick();
        let mut exit = false;
        let mut mode = mem::replace(&mut self.mode, Mode::Normal);

        mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::CreatingSong(form) => self.handle_song_form(code, None, form)?,
            Mode::EditingSong { id, form } => self.handle_song_form(code, Some(id), form)?,
            Mode::ConfirmSongDelete(confirm) => self.handle_confirm_song_delete(code, confirm)?,
            Mode::CreatingSetlist(form) => self.handle_setlist_form(code, None, form)?,
            Mode::EditingSetlist { id, form } => self.handle_setlist_form(code, Some(id), form)?,
            Mode::ConfirmSetlistDelete(confirm) => {
                self.handle_confirm_setlist_delete(code, confirm)?
            }
        };

        self.mode = mode;
        Ok(exit)
    }

    /// Ctrl+S saves the song editor, Ctrl+R restores default settings.
    pub(crate) fn handle_ctrl(&mut self, ch: char) -> Result<()> {
        let in_song_form = matches!(self.mode, Mode::CreatingSong(_) | Mode::EditingSong { .. });
        match ch {
            's' if in_song_form => {
                self.mode = match mem::replace(&mut self.mode, Mode::Normal) {
                    Mode::CreatingSong(mut form) => match self.save_song(None, &form) {
                        Ok(()) => Mode::Normal,
                        Err(err) => {
                            self.report_form_error(&mut form.error, &err);
                            Mode::CreatingSong(form)
                        }
                    },
                    Mode::EditingSong { id, mut form } => match self.save_song(Some(&id), &form) {
                        Ok(()) => Mode::Normal,
                        Err(err) => {
                            self.report_form_error(&mut form.error, &err);
                            Mode::EditingSong { id, form }
                        }
                    },
                    other => other,
                };
            }
            'r' if matches!(self.mode, Mode::Normal)
                && matches!(self.screen, Screen::Settings(_)) =>
            {
                self.reset_settings();
            }
            _ => {}
        }
        Ok(())
    }

    /// Feed wall-clock time into the reader timers. Runs on every screen so
    /// the timer clock never lags behind the wall clock when a reader opens.
    /// Returns whether anything fired.
    pub(crate) fn tick(&mut self) -> bool {
        let fired = self
            .performance
            .advance_to(self.clock.elapsed(), &self.library);
        if matches!(self.screen, Screen::Reader) && self.performance.reader().is_none() {
            debug!("reader closed while running timers");
            self.show_view(self.reader_origin);
        }
        fired
    }

    /// How long the event loop may block on input before a timer is due.
    pub(crate) fn poll_timeout(&self) -> Duration {
        match self.performance.next_due() {
            Some(due) => due.saturating_sub(self.clock.elapsed()).min(IDLE_POLL),
            None => IDLE_POLL,
        }
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        if code == KeyCode::Tab {
            if let Some(view) = self.current_view() {
                self.show_view(view.next());
                return Ok(Mode::Normal);
            }
        }
        match self.screen {
            Screen::Reader => {
                self.handle_reader_key(code);
                Ok(Mode::Normal)
            }
            Screen::Settings(_) => {
                self.handle_settings_key(code);
                Ok(Mode::Normal)
            }
            Screen::Songs => Ok(self.handle_songs_key(code, exit)),
            Screen::Setlists => Ok(self.handle_setlists_key(code, exit)),
        }
    }

    fn handle_songs_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        let len = self.library.songs.len();
        match code {
            KeyCode::Char('q') => *exit = true,
            KeyCode::Up => self.songs.move_selection(-1, len),
            KeyCode::Down => self.songs.move_selection(1, len),
            KeyCode::Home => self.songs.select_first(),
            KeyCode::End => self.songs.select_last(len),
            KeyCode::Char('+') | KeyCode::Char('a') => {
                self.clear_status();
                return Mode::CreatingSong(SongForm::from_draft(&self.library.new_song_draft()));
            }
            KeyCode::Char('e') => match self.current_song() {
                Some(song) => {
                    return Mode::EditingSong {
                        id: song.id.clone(),
                        form: SongForm::from_song(song),
                    }
                }
                None => self.set_status("No song selected.", StatusKind::Error),
            },
            KeyCode::Char('-') | KeyCode::Char('d') | KeyCode::Delete => {
                match self.current_song().cloned() {
                    Some(song) => {
                        let setlist_count = self
                            .library
                            .setlists
                            .iter()
                            .filter(|setlist| setlist.song_ids.contains(&song.id))
                            .count();
                        return Mode::ConfirmSongDelete(ConfirmSongDelete {
                            song,
                            setlist_count,
                        });
                    }
                    None => self.set_status("No song selected.", StatusKind::Error),
                }
            }
            KeyCode::Enter => match self.current_song().map(|song| song.id.clone()) {
                Some(id) => {
                    if self.performance.play_song(&self.library, &id) {
                        self.enter_reader(View::Songs);
                    }
                }
                None => self.set_status("No song selected.", StatusKind::Error),
            },
            _ => {}
        }
        Mode::Normal
    }

    fn handle_setlists_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        let len = self.library.setlists.len();
        match code {
            KeyCode::Char('q') => *exit = true,
            KeyCode::Up => self.setlists.move_selection(-1, len),
            KeyCode::Down => self.setlists.move_selection(1, len),
            KeyCode::Home => self.setlists.select_first(),
            KeyCode::End => self.setlists.select_last(len),
            KeyCode::Char('+') | KeyCode::Char('a') => {
                self.clear_status();
                return Mode::CreatingSetlist(SetlistForm::default());
            }
            KeyCode::Char('e') => match self.current_setlist() {
                Some(setlist) => {
                    return Mode::EditingSetlist {
                        id: setlist.id.clone(),
                        form: SetlistForm::from_setlist(setlist),
                    }
                }
                None => self.set_status("No setlist selected.", StatusKind::Error),
            },
            KeyCode::Char('-') | KeyCode::Char('d') | KeyCode::Delete => {
                match self.current_setlist().cloned() {
                    Some(setlist) => {
                        return Mode::ConfirmSetlistDelete(ConfirmSetlistDelete { setlist })
                    }
                    None => self.set_status("No setlist selected.", StatusKind::Error),
                }
            }
            KeyCode::Enter => match self.current_setlist().cloned() {
                Some(setlist) if !setlist.is_playable() => {
                    self.set_status(
                        format!("'{}' has no songs to play.", setlist.name),
                        StatusKind::Error,
                    );
                }
                Some(setlist) => {
                    if self.performance.play_setlist(&self.library, &setlist.id) {
                        self.enter_reader(View::Setlists);
                    } else {
                        self.set_status("Setlist songs are missing.", StatusKind::Error);
                    }
                }
                None => self.set_status("No setlist selected.", StatusKind::Error),
            },
            _ => {}
        }
        Mode::Normal
    }

    fn handle_settings_key(&mut self, code: KeyCode) {
        let Screen::Settings(form) = &mut self.screen else {
            return;
        };
        match code {
            KeyCode::Esc => self.show_view(View::Songs),
            KeyCode::Up | KeyCode::BackTab => form.move_focus(-1),
            KeyCode::Down => form.move_focus(1),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Char(' ') => {
                form.toggle();
            }
            KeyCode::Char(ch) => {
                form.push_char(ch);
            }
            KeyCode::Enter => {
                let settings = form.to_settings();
                self.library.replace_settings(settings);
                self.screen = Screen::Settings(SettingsForm::from_settings(&self.library.settings));
                self.performance.settings_changed(&self.library);
                match save_settings(&self.conn, &self.library.settings) {
                    Ok(()) => self.set_status("Settings saved.", StatusKind::Info),
                    Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
                }
            }
            _ => {}
        }
    }

    fn reset_settings(&mut self) {
        self.library.reset_settings();
        self.screen = Screen::Settings(SettingsForm::from_settings(&self.library.settings));
        self.performance.settings_changed(&self.library);
        match save_settings(&self.conn, &self.library.settings) {
            Ok(()) => self.set_status("Settings reset to defaults.", StatusKind::Info),
            Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
        }
    }

    fn handle_reader_key(&mut self, code: KeyCode) {
        let line_px = self
            .performance
            .reader()
            .map(|reader| i64::from(line_height_px(reader.song().font_size)))
            .unwrap_or(1);
        let page_px = self
            .performance
            .reader()
            .map(|reader| i64::from(reader.metrics().viewport_height))
            .unwrap_or(0);

        match code {
            KeyCode::Esc => {
                let view = match self.performance.close() {
                    ReturnView::Songs => View::Songs,
                    ReturnView::Setlists => View::Setlists,
                };
                self.show_view(view);
            }
            KeyCode::Char(' ') => self.performance.toggle_scrolling(),
            KeyCode::Char('+') | KeyCode::Char('=') => {
                let song = self.performance.adjust_font_size(FONT_SIZE_STEP);
                self.store_reader_song(song);
            }
            KeyCode::Char('-') | KeyCode::Char('_') => {
                let song = self.performance.adjust_font_size(-FONT_SIZE_STEP);
                self.store_reader_song(song);
            }
            KeyCode::Char(']') => {
                let song = self
                    .performance
                    .adjust_scroll_speed(SCROLL_SPEED_STEP);
                self.store_reader_song(song);
            }
            KeyCode::Char('[') => {
                let song = self
                    .performance
                    .adjust_scroll_speed(-SCROLL_SPEED_STEP);
                self.store_reader_song(song);
            }
            KeyCode::Up => {
                self.performance.interact();
                self.performance.scroll_by(-line_px);
            }
            KeyCode::Down => {
                self.performance.interact();
                self.performance.scroll_by(line_px);
            }
            KeyCode::PageUp => {
                self.performance.interact();
                self.performance.scroll_by(-page_px);
            }
            KeyCode::PageDown => {
                self.performance.interact();
                self.performance.scroll_by(page_px);
            }
            KeyCode::Char('n') | KeyCode::Right => {
                self.performance.interact();
                self.performance.next_song(&self.library);
            }
            KeyCode::Char('p') | KeyCode::Left => {
                self.performance.interact();
                self.performance.previous_song(&self.library);
            }
            _ => self.performance.interact(),
        }
    }

    /// Persist a font size or scroll speed change made from the reader.
    fn store_reader_song(&mut self, song: Option<Song>) {
        let Some(song) = song else {
            return;
        };
        if !self.library.apply_song_update(&song) {
            return;
        }
        if let Err(err) = save_songs(&self.conn, &self.library.songs) {
            self.set_status(surface_error(&err), StatusKind::Error);
        }
    }

    fn handle_song_form(
        &mut self,
        code: KeyCode,
        id: Option<String>,
        mut form: SongForm,
    ) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Song edit cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab => form.next_field(),
            KeyCode::BackTab => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter if form.active == SongField::Lyrics => {
                form.push_char('\n');
            }
            KeyCode::Enter => match self.save_song(id.as_deref(), &form) {
                Ok(()) => keep_open = false,
                Err(err) => self.report_form_error(&mut form.error, &err),
            },
            KeyCode::F(n) if (1..=SECTION_SHORTCUTS.len() as u8).contains(&n) => {
                form.insert_section(SECTION_SHORTCUTS[usize::from(n) - 1]);
            }
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if !keep_open {
            return Ok(Mode::Normal);
        }
        Ok(match id {
            Some(id) => Mode::EditingSong { id, form },
            None => Mode::CreatingSong(form),
        })
    }

    fn save_song(&mut self, id: Option<&str>, form: &SongForm) -> Result<()> {
        let draft = form.to_draft();
        let saved = match id {
            Some(id) => self.library.update_song(id, &draft)?,
            None => self.library.create_song(&draft)?,
        };
        let saved_id = saved.id.clone();
        let title = saved.display_title();
        save_songs(&self.conn, &self.library.songs)?;
        self.songs.focus(
            self.library.songs.iter().map(|song| song.id.as_str()),
            &saved_id,
        );
        let verb = if id.is_some() { "Updated" } else { "Added" };
        self.set_status(format!("{verb} '{title}'."), StatusKind::Info);
        Ok(())
    }

    fn handle_confirm_song_delete(
        &mut self,
        code: KeyCode,
        confirm: ConfirmSongDelete,
    ) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.library.delete_song(&confirm.song.id);
                let saved = save_songs(&self.conn, &self.library.songs)
                    .and_then(|_| save_setlists(&self.conn, &self.library.setlists));
                self.songs.ensure_in_bounds(self.library.songs.len());
                match saved {
                    Ok(()) => {
                        self.set_status(
                            format!("Deleted '{}'.", confirm.song.display_title()),
                            StatusKind::Info,
                        );
                        Ok(Mode::Normal)
                    }
                    Err(err) => {
                        self.set_status(surface_error(&err), StatusKind::Error);
                        Ok(Mode::Normal)
                    }
                }
            }
            _ => Ok(Mode::ConfirmSongDelete(confirm)),
        }
    }

    fn handle_setlist_form(
        &mut self,
        code: KeyCode,
        id: Option<String>,
        mut form: SetlistForm,
    ) -> Result<Mode> {
        let mut keep_open = true;
        let song_count = self.library.songs.len();
        match code {
            KeyCode::Esc => {
                self.set_status("Setlist edit cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab => form.next_field(),
            KeyCode::BackTab => form.previous_field(),
            KeyCode::Up => form.move_cursor(-1, song_count),
            KeyCode::Down => form.move_cursor(1, song_count),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_setlist(id.as_deref(), &form) {
                Ok(()) => keep_open = false,
                Err(err) => self.report_form_error(&mut form.error, &err),
            },
            KeyCode::Char(' ') if form.active == SetlistField::Songs => {
                if let Some(song) = self.library.songs.get(form.song_cursor) {
                    form.toggle_song(&song.id);
                }
            }
            KeyCode::Char('[') if form.active == SetlistField::Order => form.move_entry(-1),
            KeyCode::Char(']') if form.active == SetlistField::Order => form.move_entry(1),
            KeyCode::Char('x') | KeyCode::Delete if form.active == SetlistField::Order => {
                form.remove_entry()
            }
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if !keep_open {
            return Ok(Mode::Normal);
        }
        Ok(match id {
            Some(id) => Mode::EditingSetlist { id, form },
            None => Mode::CreatingSetlist(form),
        })
    }

    fn save_setlist(&mut self, id: Option<&str>, form: &SetlistForm) -> Result<()> {
        let saved = match id {
            Some(id) => self
                .library
                .update_setlist(id, &form.name, form.selected.clone())?,
            None => self
                .library
                .create_setlist(&form.name, form.selected.clone())?,
        };
        let saved_id = saved.id.clone();
        let name = saved.name.clone();
        save_setlists(&self.conn, &self.library.setlists)?;
        self.setlists.focus(
            self.library.setlists.iter().map(|setlist| setlist.id.as_str()),
            &saved_id,
        );
        let verb = if id.is_some() { "Updated" } else { "Added" };
        self.set_status(format!("{verb} setlist '{name}'."), StatusKind::Info);
        Ok(())
    }

    fn handle_confirm_setlist_delete(
        &mut self,
        code: KeyCode,
        confirm: ConfirmSetlistDelete,
    ) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.library.delete_setlist(&confirm.setlist.id);
                self.setlists.ensure_in_bounds(self.library.setlists.len());
                match save_setlists(&self.conn, &self.library.setlists) {
                    Ok(()) => self.set_status(
                        format!("Deleted setlist '{}'.", confirm.setlist.name),
                        StatusKind::Info,
                    ),
                    Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
                }
                Ok(Mode::Normal)
            }
            _ => Ok(Mode::ConfirmSetlistDelete(confirm)),
        }
    }

    pub(crate) fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        if matches!(self.screen, Screen::Reader) {
            self.draw_reader(frame, area);
            return;
        }

        let footer_height = FOOTER_HEIGHT.min(area.height);
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(NAV_HEIGHT.min(area.height)),
                Constraint::Min(0),
                Constraint::Length(footer_height),
            ])
            .split(area);

        self.draw_navigation(frame, chunks[0]);
        match &self.screen {
            Screen::Songs => self.draw_songs(frame, chunks[1]),
            Screen::Setlists => self.draw_setlists(frame, chunks[1]),
            Screen::Settings(form) => self.draw_settings(frame, chunks[1], form),
            Screen::Reader => {}
        }
        self.draw_footer(frame, chunks[2]);

        match &self.mode {
            Mode::CreatingSong(form) => self.draw_song_form(frame, area, "New Song", form),
            Mode::EditingSong { form, .. } => self.draw_song_form(frame, area, "Edit Song", form),
            Mode::ConfirmSongDelete(confirm) => self.draw_confirm_song_delete(frame, area, confirm),
            Mode::CreatingSetlist(form) => {
                self.draw_setlist_form(frame, area, "New Setlist", form)
            }
            Mode::EditingSetlist { form, .. } => {
                self.draw_setlist_form(frame, area, "Edit Setlist", form)
            }
            Mode::ConfirmSetlistDelete(confirm) => {
                self.draw_confirm_setlist_delete(frame, area, confirm)
            }
            Mode::Normal => {}
        }
    }

    fn draw_navigation(&self, frame: &mut Frame, area: Rect) {
        let active = self.current_view();
        let mut spans = vec![Span::styled(
            "LyricsFlow  ",
            Style::default().add_modifier(Modifier::BOLD),
        )];
        for view in View::ALL {
            let style = if Some(view) == active {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
            } else {
                Style::default().fg(Color::Gray)
            };
            spans.push(Span::styled(view.title(), style));
            spans.push(Span::raw("   "));
        }
        let paragraph = Paragraph::new(Line::from(spans))
            .block(Block::default().borders(Borders::BOTTOM));
        frame.render_widget(paragraph, area);
    }

    fn draw_songs(&self, frame: &mut Frame, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(area);

        if self.library.songs.is_empty() {
            let empty = Paragraph::new("No songs yet. Press + to add one.")
                .block(Block::default().title("Songs").borders(Borders::ALL))
                .wrap(Wrap { trim: true });
            frame.render_widget(empty, columns[0]);
            return;
        }

        let items: Vec<ListItem> = self
            .library
            .songs
            .iter()
            .map(|song| {
                ListItem::new(vec![
                    Line::from(Span::styled(
                        song.name.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    )),
                    Line::from(Span::styled(
                        format!(
                            "{}  ·  {}pt  ·  {} px/s",
                            song.author, song.font_size, song.scroll_speed
                        ),
                        Style::default().fg(Color::Gray),
                    )),
                ])
            })
            .collect();
        self.render_list(frame, columns[0], "Songs", items, self.songs.selected);

        if let Some(song) = self.current_song() {
            let block = Block::default()
                .title(song.display_title())
                .borders(Borders::ALL);
            let inner = block.inner(columns[1]);
            frame.render_widget(block, columns[1]);
            let mut rows = lyric_rows(&format_lyrics(&song.lyrics), inner.width, song.font_size);
            if song.lyrics.is_empty() {
                rows = vec![Line::from(Span::styled(
                    "No lyrics.",
                    Style::default().fg(Color::DarkGray),
                ))];
            }
            frame.render_widget(Paragraph::new(rows), inner);
        }
    }

    fn draw_setlists(&self, frame: &mut Frame, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(area);

        if self.library.setlists.is_empty() {
            let empty = Paragraph::new("No setlists yet. Press + to create one.")
                .block(Block::default().title("Setlists").borders(Borders::ALL))
                .wrap(Wrap { trim: true });
            frame.render_widget(empty, columns[0]);
            return;
        }

        let items: Vec<ListItem> = self
            .library
            .setlists
            .iter()
            .map(|setlist| {
                let count = setlist.song_ids.len();
                let noun = if count == 1 { "song" } else { "songs" };
                ListItem::new(Line::from(vec![
                    Span::styled(
                        setlist.name.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!("  ({count} {noun})"),
                        Style::default().fg(Color::Gray),
                    ),
                ]))
            })
            .collect();
        self.render_list(frame, columns[0], "Setlists", items, self.setlists.selected);

        if let Some(setlist) = self.current_setlist() {
            let lines: Vec<Line> = self
                .library
                .setlist_songs(setlist)
                .enumerate()
                .map(|(idx, song)| Line::from(format!("{}. {}", idx + 1, song.display_title())))
                .collect();
            let paragraph = Paragraph::new(lines)
                .block(
                    Block::default()
                        .title(format!("{} (running order)", setlist.name))
                        .borders(Borders::ALL),
                )
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, columns[1]);
        }
    }

    fn draw_settings(&self, frame: &mut Frame, area: Rect, form: &SettingsForm) {
        let block = Block::default().title("Settings").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut lines = form.build_lines();
        lines.push(Line::from(""));
        let mut preview = Style::default();
        if let Some(color) = parse_hex_color(&form.background_color) {
            preview = preview.bg(color);
        }
        if let Some(color) = parse_hex_color(&form.font_color) {
            preview = preview.fg(color);
        }
        lines.push(Line::from(vec![
            Span::raw("Reader preview: "),
            Span::styled("  Amazing grace, how sweet the sound  ", preview),
        ]));
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn draw_reader(&mut self, frame: &mut Frame, area: Rect) {
        let Some(song) = self.performance.reader().map(|reader| reader.song().clone()) else {
            return;
        };

        let mut base = Style::default();
        if let Some(color) = parse_hex_color(&self.library.settings.background_color) {
            base = base.bg(color);
        }
        if let Some(color) = parse_hex_color(&self.library.settings.font_color) {
            base = base.fg(color);
        }
        frame.render_widget(Block::default().style(base), area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(area);
        let lyrics_area = chunks[1];

        let rows = lyric_rows(&format_lyrics(&song.lyrics), lyrics_area.width, song.font_size);
        let line_px = line_height_px(song.font_size);
        let content_px = rows.len() as u32 * line_px;
        let viewport_px = u32::from(lyrics_area.height) * line_px;
        self.performance.set_layout(content_px, viewport_px);

        let Some(reader) = self.performance.reader() else {
            return;
        };
        let scroll_rows = u16::try_from(reader.metrics().offset / line_px).unwrap_or(u16::MAX);

        frame.render_widget(
            Paragraph::new(progress_bar(reader.progress(), chunks[0].width))
                .style(base.fg(Color::LightBlue)),
            chunks[0],
        );
        frame.render_widget(
            Paragraph::new(rows)
                .alignment(Alignment::Center)
                .style(base)
                .scroll((scroll_rows, 0)),
            lyrics_area,
        );

        if reader.controls_visible() && lyrics_area.height > OVERLAY_HEIGHT * 2 {
            let header = Rect {
                height: OVERLAY_HEIGHT,
                ..lyrics_area
            };
            let footer = Rect {
                y: lyrics_area.y + lyrics_area.height - OVERLAY_HEIGHT,
                height: OVERLAY_HEIGHT,
                ..lyrics_area
            };

            let mut title = vec![
                Span::styled(song.name.clone(), base.add_modifier(Modifier::BOLD)),
                Span::styled(format!("  by {}", song.author), base),
            ];
            if let Some(position) = reader.setlist() {
                title.push(Span::styled(format!("   {}", position.label()), base));
            }
            let state = if reader.is_scrolling() { "Playing" } else { "Paused" };
            let details = Line::from(Span::styled(
                format!(
                    "{state}  ·  Font {}  ·  Speed {} px/s",
                    song.font_size, song.scroll_speed
                ),
                base,
            ));
            frame.render_widget(Clear, header);
            frame.render_widget(
                Paragraph::new(vec![Line::from(title), details])
                    .style(base)
                    .block(Block::default().borders(Borders::BOTTOM).style(base)),
                header,
            );

            let key_style = base.fg(Color::Cyan).add_modifier(Modifier::BOLD);
            let mut controls = Vec::new();
            let has_previous = reader.setlist().is_some_and(|pos| pos.has_previous());
            let has_next = reader.setlist().is_some_and(|pos| pos.has_next());
            if has_previous {
                controls.push(Span::styled("[p]", key_style));
                controls.push(Span::styled(" Previous   ", base));
            }
            controls.push(Span::styled("[Space]", key_style));
            controls.push(Span::styled(
                if reader.is_scrolling() { " Pause   " } else { " Play   " },
                base,
            ));
            if has_next {
                controls.push(Span::styled("[n]", key_style));
                controls.push(Span::styled(" Next   ", base));
            }
            controls.extend([
                Span::styled("[+/-]", key_style),
                Span::styled(" Font   ", base),
                Span::styled("[ [ / ] ]", key_style),
                Span::styled(" Speed   ", base),
                Span::styled("[Esc]", key_style),
                Span::styled(" Close", base),
            ]);
            frame.render_widget(Clear, footer);
            frame.render_widget(
                Paragraph::new(Line::from(controls))
                    .style(base)
                    .wrap(Wrap { trim: true })
                    .block(Block::default().borders(Borders::TOP).style(base)),
                footer,
            );
        }

        if let Some(elapsed) = reader.elapsed_display() {
            let width = (elapsed.len() as u16 + 2).min(area.width);
            let corner = Rect {
                x: area.x + area.width - width,
                y: lyrics_area.y,
                width,
                height: 1.min(lyrics_area.height),
            };
            frame.render_widget(
                Paragraph::new(elapsed)
                    .alignment(Alignment::Right)
                    .style(base.add_modifier(Modifier::BOLD)),
                corner,
            );
        }
    }

    fn render_list(
        &self,
        frame: &mut Frame,
        area: Rect,
        title: &str,
        items: Vec<ListItem>,
        selected: usize,
    ) {
        let list = List::new(items)
            .block(Block::default().title(title.to_string()).borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Yellow))
            .highlight_symbol("▶ ");
        let mut list_state = ListState::default();
        list_state.select(Some(selected));
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let keys: &[(&str, &str)] = match (&self.screen, &self.mode) {
            (_, Mode::CreatingSong(_) | Mode::EditingSong { .. }) => &[
                ("[Tab]", "Next field"),
                ("[F1-F8]", "Insert section"),
                ("[Ctrl+S]", "Save"),
                ("[Esc]", "Cancel"),
            ],
            (_, Mode::CreatingSetlist(_) | Mode::EditingSetlist { .. }) => &[
                ("[Tab]", "Switch pane"),
                ("[Space]", "Toggle song"),
                ("[ [ / ] ]", "Move"),
                ("[x]", "Remove"),
                ("[Enter]", "Save"),
                ("[Esc]", "Cancel"),
            ],
            (_, Mode::ConfirmSongDelete(_) | Mode::ConfirmSetlistDelete(_)) => {
                &[("[y]", "Delete"), ("[n/Esc]", "Keep")]
            }
            (Screen::Settings(_), _) => &[
                ("[↑↓]", "Field"),
                ("[Space]", "Toggle"),
                ("[Enter]", "Save"),
                ("[Ctrl+R]", "Reset defaults"),
                ("[Tab/Esc]", "Back"),
            ],
            (Screen::Songs | Screen::Setlists, _) => &[
                ("[↑↓]", "Navigate"),
                ("[Enter]", "Play"),
                ("[+]", "Add"),
                ("[e]", "Edit"),
                ("[-]", "Delete"),
                ("[Tab]", "Next view"),
                ("[q]", "Quit"),
            ],
            (Screen::Reader, _) => &[],
        };
        let mut spans = Vec::with_capacity(keys.len() * 2);
        for (key, label) in keys {
            spans.push(Span::styled(key.to_string(), key_style));
            spans.push(Span::raw(format!(" {label}   ")));
        }
        Line::from(spans)
    }

    fn draw_song_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &SongForm) {
        let popup_area = centered_rect(80, 80, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title.to_string()).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(inner);

        let lines = vec![
            form.build_line(SongField::Name),
            form.build_line(SongField::Author),
            form.build_line(SongField::FontSize),
            form.build_line(SongField::ScrollSpeed),
        ];
        frame.render_widget(Paragraph::new(lines), chunks[0]);

        let lyrics_style = if form.active == SongField::Lyrics {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let lyrics_block = Block::default()
            .title("Lyrics (**bold**, F1-F8 insert a section)")
            .borders(Borders::ALL)
            .border_style(lyrics_style);
        let lyrics_inner = lyrics_block.inner(chunks[1]);
        let lyric_lines: Vec<&str> = form.lyrics.split('\n').collect();
        let scroll = lyric_lines
            .len()
            .saturating_sub(usize::from(lyrics_inner.height.max(1)));
        frame.render_widget(
            Paragraph::new(form.lyrics.clone())
                .block(lyrics_block)
                .scroll((u16::try_from(scroll).unwrap_or(u16::MAX), 0)),
            chunks[1],
        );

        let hint = if let Some(error) = &form.error {
            Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red)))
        } else {
            Line::from(Span::styled(
                "Enter to save (newline in lyrics) • Ctrl+S to save • Tab to switch • Esc to cancel",
                Style::default().fg(Color::Gray),
            ))
        };
        frame.render_widget(Paragraph::new(hint), chunks[2]);

        let (cursor_x, cursor_y) = match form.cursor_offset() {
            Some((column, row)) => (chunks[0].x + column as u16, chunks[0].y + row),
            None => {
                let last = lyric_lines.last().map(|line| line.chars().count()).unwrap_or(0);
                let column = (last as u16).min(lyrics_inner.width.saturating_sub(1));
                let row = (lyric_lines.len() - 1 - scroll) as u16;
                (lyrics_inner.x + column, lyrics_inner.y + row)
            }
        };
        frame.set_cursor_position((cursor_x, cursor_y));
    }

    fn draw_setlist_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &SetlistForm) {
        let popup_area = centered_rect(80, 80, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title.to_string()).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(inner);
        frame.render_widget(Paragraph::new(form.name_line()), rows[0]);

        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[1]);

        let pane_style = |active: bool| {
            if active {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            }
        };

        let library_items: Vec<ListItem> = self
            .library
            .songs
            .iter()
            .map(|song| {
                let mark = match form.position_of(&song.id) {
                    Some(position) => format!("[{position}]"),
                    None => "[ ]".to_string(),
                };
                let style = if form.is_selected(&song.id) {
                    Style::default().add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                ListItem::new(Line::from(Span::styled(
                    format!("{mark} {}", song.display_title()),
                    style,
                )))
            })
            .collect();
        let library_list = List::new(library_items)
            .block(
                Block::default()
                    .title("Library")
                    .borders(Borders::ALL)
                    .border_style(pane_style(form.active == SetlistField::Songs)),
            )
            .highlight_style(Style::default().fg(Color::Yellow))
            .highlight_symbol("▶ ");
        let mut library_state = ListState::default();
        if form.active == SetlistField::Songs && !self.library.songs.is_empty() {
            library_state.select(Some(form.song_cursor));
        }
        frame.render_stateful_widget(library_list, panes[0], &mut library_state);

        let order_items: Vec<ListItem> = form
            .selected
            .iter()
            .enumerate()
            .map(|(idx, id)| {
                let label = self
                    .library
                    .song(id)
                    .map(Song::display_title)
                    .unwrap_or_else(|| "(missing song)".to_string());
                ListItem::new(format!("{}. {label}", idx + 1))
            })
            .collect();
        let order_list = List::new(order_items)
            .block(
                Block::default()
                    .title("Running order")
                    .borders(Borders::ALL)
                    .border_style(pane_style(form.active == SetlistField::Order)),
            )
            .highlight_style(Style::default().fg(Color::Yellow))
            .highlight_symbol("▶ ");
        let mut order_state = ListState::default();
        if form.active == SetlistField::Order && !form.selected.is_empty() {
            order_state.select(Some(form.order_cursor));
        }
        frame.render_stateful_widget(order_list, panes[1], &mut order_state);

        let hint = if let Some(error) = &form.error {
            Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red)))
        } else {
            Line::from(Span::styled(
                "Enter to save • Tab to switch pane • Esc to cancel",
                Style::default().fg(Color::Gray),
            ))
        };
        frame.render_widget(Paragraph::new(hint), rows[2]);

        if form.active == SetlistField::Name {
            let prefix = "Name: ".len() as u16;
            frame.set_cursor_position((
                rows[0].x + prefix + form.name.chars().count() as u16,
                rows[0].y,
            ));
        }
    }

    fn draw_confirm_song_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmSongDelete) {
        let mut lines = vec![Line::from(format!(
            "Delete '{}' permanently?",
            confirm.song.display_title()
        ))];
        if confirm.setlist_count > 0 {
            let noun = if confirm.setlist_count == 1 {
                "setlist"
            } else {
                "setlists"
            };
            lines.push(Line::from(format!(
                "It will also be removed from {} {noun}.",
                confirm.setlist_count
            )));
        }
        self.draw_confirm(frame, area, "Delete Song", lines);
    }

    fn draw_confirm_setlist_delete(
        &self,
        frame: &mut Frame,
        area: Rect,
        confirm: &ConfirmSetlistDelete,
    ) {
        let lines = vec![
            Line::from(format!("Delete setlist '{}'?", confirm.setlist.name)),
            Line::from("The songs themselves are kept."),
        ];
        self.draw_confirm(frame, area, "Delete Setlist", lines);
    }

    fn draw_confirm(&self, frame: &mut Frame, area: Rect, title: &str, mut lines: Vec<Line>) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title.to_string()).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Press Y to confirm or N / Esc to cancel.",
            Style::default().fg(Color::Gray),
        )));
        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    fn report_form_error(&mut self, slot: &mut Option<String>, err: &anyhow::Error) {
        let message = surface_error(err);
        *slot = Some(message.clone());
        self.set_status(message, StatusKind::Error);
    }

    fn current_view(&self) -> Option<View> {
        match self.screen {
            Screen::Songs => Some(View::Songs),
            Screen::Setlists => Some(View::Setlists),
            Screen::Settings(_) => Some(View::Settings),
            Screen::Reader => None,
        }
    }

    fn show_view(&mut self, view: View) {
        self.screen = match view {
            View::Songs => {
                self.songs.ensure_in_bounds(self.library.songs.len());
                Screen::Songs
            }
            View::Setlists => {
                self.setlists.ensure_in_bounds(self.library.setlists.len());
                Screen::Setlists
            }
            View::Settings => Screen::Settings(SettingsForm::from_settings(&self.library.settings)),
        };
    }

    fn enter_reader(&mut self, origin: View) {
        if let Some(reader) = self.performance.reader() {
            info!("reader opened on {}", reader.song().display_title());
        }
        self.reader_origin = origin;
        self.clear_status();
        self.screen = Screen::Reader;
    }

    fn current_song(&self) -> Option<&Song> {
        self.library.songs.get(self.songs.selected)
    }

    fn current_setlist(&self) -> Option<&Setlist> {
        self.library.setlists.get(self.setlists.selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{load_library, open_in_memory};
    use crate::models::{Settings, SongDraft};
    use crate::ui::forms::SettingsField;

    fn app_with_songs(names: &[&str]) -> App {
        let conn = open_in_memory().unwrap();
        let mut library = Library::default();
        for name in names {
            let draft = SongDraft {
                name: name.to_string(),
                author: "Band".to_string(),
                lyrics: "**CHORUS**\nla la".to_string(),
                font_size: 18,
                scroll_speed: 50,
            };
            library.create_song(&draft).unwrap();
        }
        App::new(conn, library)
    }

    /// Move the app clock origin back, as if the app had been open that long.
    fn rewind_clock(app: &mut App, secs: u64) {
        app.clock = app
            .clock
            .checked_sub(Duration::from_secs(secs))
            .expect("clock origin in range");
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_key(KeyCode::Char(ch)).unwrap();
        }
    }

    #[test]
    fn creating_a_song_persists_it() {
        let mut app = app_with_songs(&[]);
        app.handle_key(KeyCode::Char('+')).unwrap();
        type_text(&mut app, "Hymn");
        app.handle_key(KeyCode::Tab).unwrap();
        type_text(&mut app, "Choir");
        app.handle_key(KeyCode::Enter).unwrap();

        assert!(matches!(app.mode, Mode::Normal));
        let stored = load_library(&app.conn).unwrap();
        assert_eq!(stored.songs.len(), 1);
        assert_eq!(stored.songs[0].name, "Hymn");
        assert_eq!(stored.songs[0].font_size, 18);
    }

    #[test]
    fn missing_author_keeps_form_open() {
        let mut app = app_with_songs(&[]);
        app.handle_key(KeyCode::Char('+')).unwrap();
        type_text(&mut app, "Hymn");
        app.handle_key(KeyCode::Enter).unwrap();
        match &app.mode {
            Mode::CreatingSong(form) => assert!(form.error.is_some()),
            _ => panic!("form should stay open"),
        }
        assert!(app.library.songs.is_empty());
    }

    #[test]
    fn deleting_a_song_updates_setlists() {
        let mut app = app_with_songs(&["a", "b"]);
        let ids: Vec<String> = app.library.songs.iter().map(|s| s.id.clone()).collect();
        app.library.create_setlist("Gig", ids.clone()).unwrap();

        app.handle_key(KeyCode::Char('-')).unwrap();
        assert!(matches!(app.mode, Mode::ConfirmSongDelete(_)));
        app.handle_key(KeyCode::Char('y')).unwrap();

        let stored = load_library(&app.conn).unwrap();
        assert_eq!(stored.songs.len(), 1);
        assert_eq!(stored.setlists[0].song_ids, vec![ids[1].clone()]);
    }

    #[test]
    fn empty_setlist_does_not_open_reader() {
        let mut app = app_with_songs(&["a"]);
        app.library.create_setlist("Empty", vec![]).unwrap();
        app.handle_key(KeyCode::Tab).unwrap();
        app.handle_key(KeyCode::Enter).unwrap();
        assert!(matches!(app.screen, Screen::Setlists));
        assert!(app.performance.reader().is_none());
    }

    #[test]
    fn reader_font_change_is_saved_and_escape_returns() {
        let mut app = app_with_songs(&["a"]);
        app.handle_key(KeyCode::Enter).unwrap();
        assert!(matches!(app.screen, Screen::Reader));
        app.handle_key(KeyCode::Char('+')).unwrap();
        assert_eq!(app.library.songs[0].font_size, 20);
        let stored = load_library(&app.conn).unwrap();
        assert_eq!(stored.songs[0].font_size, 20);

        app.handle_key(KeyCode::Esc).unwrap();
        assert!(matches!(app.screen, Screen::Songs));
        assert!(app.performance.queue().is_empty());
    }

    #[test]
    fn settings_save_and_reset() {
        let mut app = app_with_songs(&[]);
        app.handle_key(KeyCode::Tab).unwrap();
        app.handle_key(KeyCode::Tab).unwrap();
        assert!(matches!(app.screen, Screen::Settings(_)));
        app.handle_key(KeyCode::Backspace).unwrap();
        app.handle_key(KeyCode::Backspace).unwrap();
        type_text(&mut app, "99");
        app.handle_key(KeyCode::Enter).unwrap();
        assert_eq!(app.library.settings.default_font_size, 48);
        assert_eq!(load_library(&app.conn).unwrap().settings.default_font_size, 48);

        app.handle_ctrl('r').unwrap();
        assert_eq!(app.library.settings, Settings::default());
        match &app.screen {
            Screen::Settings(form) => {
                assert!(form.active == SettingsField::DefaultFontSize);
                assert_eq!(form.default_font_size, "18");
            }
            _ => panic!("settings screen expected"),
        }
    }

    #[test]
    fn setlist_opened_after_browsing_starts_from_the_top() {
        let mut app = app_with_songs(&["a", "b", "c"]);
        let ids: Vec<String> = app.library.songs.iter().map(|s| s.id.clone()).collect();
        app.library.create_setlist("Gig", ids.clone()).unwrap();
        app.library.settings.autoplay_enabled = true;
        app.library.settings.autoplay_delay = 3;
        app.library.settings.show_timer_in_setlists = true;
        app.handle_key(KeyCode::Tab).unwrap();

        for _ in 0..2 {
            rewind_clock(&mut app, 60);
            app.handle_key(KeyCode::Enter).unwrap();
            app.tick();

            assert!(matches!(app.screen, Screen::Reader));
            let session = app.performance.session();
            assert_eq!(session.cursor.as_ref().map(|c| c.index), Some(0));
            assert_eq!(session.song_id.as_deref(), Some(ids[0].as_str()));
            assert!(session.autoplay_active);
            assert!(app.performance.autoplay_pending());
            let reader = app.performance.reader().unwrap();
            assert_eq!(reader.elapsed_display().as_deref(), Some("0:00"));
            assert!(app.poll_timeout() > Duration::ZERO);

            app.handle_key(KeyCode::Esc).unwrap();
            assert!(matches!(app.screen, Screen::Setlists));
            assert!(app.performance.queue().is_empty());
        }
    }

    #[test]
    fn song_reader_timers_start_at_open() {
        let mut app = app_with_songs(&["a"]);
        rewind_clock(&mut app, 90);
        app.handle_key(KeyCode::Enter).unwrap();
        assert!(app.performance.now() >= Duration::from_secs(90));
        app.handle_key(KeyCode::Char(' ')).unwrap();
        app.tick();

        let reader = app.performance.reader().unwrap();
        assert!(reader.is_scrolling());
        assert!(reader.controls_visible());
        let next = app.performance.next_due().unwrap();
        assert!(next > app.performance.now());
        assert!(app.poll_timeout() <= IDLE_POLL);
    }
}
